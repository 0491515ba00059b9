//! Arena holding the archive entries and their structural operations.

use std::ops::{Index, IndexMut};

use tracing::{debug, trace};

use crate::entry::{ArchiveEntry, NodeId};
use crate::ArchiveError;

/// Tree of archive entries addressed by [`NodeId`].
///
/// Every method taking a [`NodeId`] indexes the arena directly and panics
/// on a handle past its end. Use [`ArchiveTree::get`] and
/// [`ArchiveTree::get_mut`] to check a handle of unknown origin.
#[derive(Debug, Clone)]
pub struct ArchiveTree {
    entries: Vec<ArchiveEntry>,
    root: NodeId,
}

impl ArchiveTree {
    /// Create a tree whose root is `root`, at hierarchy level 0.
    pub fn new(mut root: ArchiveEntry) -> Self {
        root.parent = None;
        root.children.clear();
        root.order_number = 0;
        root.hierarchy_level = 0;
        Self {
            entries: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of entries in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&ArchiveEntry> {
        self.entries.get(node.0)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut ArchiveEntry> {
        self.entries.get_mut(node.0)
    }

    /// Store `entry` as a detached node. Attach it with [`ArchiveTree::add_child`].
    pub fn insert(&mut self, mut entry: ArchiveEntry) -> NodeId {
        entry.parent = None;
        entry.children.clear();
        self.push(entry)
    }

    pub(crate) fn push(&mut self, entry: ArchiveEntry) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(entry);
        id
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self[node].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self[node].parent
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        self[node].has_children()
    }

    /// Append `child` to the children of `parent`.
    ///
    /// A child attached elsewhere is detached first. Order numbers and
    /// hierarchy levels are left as they are; call
    /// [`ArchiveTree::reorder_children`] and [`ArchiveTree::update_hierarchy`]
    /// when they must be consistent again.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ArchiveError> {
        if child == self.root {
            return Err(ArchiveError::InvalidMove(
                "the root entry cannot become a child".into(),
            ));
        }
        if self.ancestors(parent, true).contains(&child) {
            return Err(ArchiveError::InvalidMove(format!(
                "entry '{}' is an ancestor of '{}'",
                self[child].id, self[parent].id
            )));
        }
        if let Some(old_parent) = self[child].parent {
            self.entries[old_parent.0].children.retain(|c| *c != child);
        }
        self.entries[parent.0].children.push(child);
        self.entries[child.0].parent = Some(parent);
        trace!(parent = %self[parent].id, child = %self[child].id, "attached entry");
        Ok(())
    }

    /// Detach `child` from `parent` and renumber the remaining siblings.
    ///
    /// Returns `false` when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self[parent].children.contains(&child) {
            return false;
        }
        self.entries[parent.0].children.retain(|c| *c != child);
        self.entries[child.0].parent = None;
        self.reorder_children(parent);
        trace!(parent = %self[parent].id, child = %self[child].id, "detached entry");
        true
    }

    /// Set the order number of every child of `node` to its position.
    pub fn reorder_children(&mut self, node: NodeId) {
        let children = self[node].children.clone();
        for (position, child) in children.into_iter().enumerate() {
            self.entries[child.0].order_number = position;
        }
    }

    /// Recompute hierarchy levels below and including `node` from its parent.
    pub fn update_hierarchy(&mut self, node: NodeId) {
        let level = self[node]
            .parent
            .map(|parent| self[parent].hierarchy_level + 1)
            .unwrap_or(0);
        let mut stack = vec![(node, level)];
        while let Some((current, level)) = stack.pop() {
            self.entries[current.0].hierarchy_level = level;
            stack.extend(self[current].children.iter().map(|child| (*child, level + 1)));
        }
    }

    /// Add `offset` to the hierarchy level of `node` and all its descendants.
    pub fn shift_hierarchy(&mut self, node: NodeId, offset: i32) {
        for current in self.flatten(node, true) {
            self.entries[current.0].hierarchy_level += offset;
        }
    }

    /// Pre-order list starting at `node`.
    ///
    /// Descends into the children of an entry only when `ignore_display_children`
    /// is set or the entry has `display_children` enabled.
    pub fn flatten(&self, node: NodeId, ignore_display_children: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            let entry = &self[current];
            if ignore_display_children || entry.display_children {
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }

    /// Ancestors of `node`, root first. `node` itself ends the list when
    /// `include_self` is set.
    pub fn ancestors(&self, node: NodeId, include_self: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        if include_self {
            out.push(node);
        }
        let mut cursor = self[node].parent;
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self[parent].parent;
        }
        out.reverse();
        out
    }

    /// First entry below the root, in pre-order, carrying `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.flatten(self.root, true)
            .into_iter()
            .find(|node| self[*node].id == id)
    }

    /// Like [`ArchiveTree::find_by_id`] but reports a missing entry as an error.
    pub fn require(&self, id: &str) -> Result<NodeId, ArchiveError> {
        self.find_by_id(id).ok_or_else(|| {
            debug!(entry = id, "entry lookup failed");
            ArchiveError::EntryNotFound(id.to_string())
        })
    }
}

impl Index<NodeId> for ArchiveTree {
    type Output = ArchiveEntry;

    fn index(&self, node: NodeId) -> &ArchiveEntry {
        &self.entries[node.0]
    }
}

impl IndexMut<NodeId> for ArchiveTree {
    fn index_mut(&mut self, node: NodeId) -> &mut ArchiveEntry {
        &mut self.entries[node.0]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build `root -> [a -> [a1, a2], b]` with consistent numbering.
    pub(crate) fn sample_tree() -> (ArchiveTree, [NodeId; 5]) {
        let mut tree = ArchiveTree::new(ArchiveEntry::new("root").with_label("Fonds"));
        let root = tree.root();
        let a = tree.insert(ArchiveEntry::new("a").with_label("Series A"));
        let a1 = tree.insert(ArchiveEntry::new("a1").with_label("Letters"));
        let a2 = tree.insert(ArchiveEntry::new("a2").with_label("Photographs"));
        let b = tree.insert(ArchiveEntry::new("b").with_label("Series B"));
        tree.add_child(root, a).unwrap();
        tree.add_child(a, a1).unwrap();
        tree.add_child(a, a2).unwrap();
        tree.add_child(root, b).unwrap();
        tree.reorder_children(root);
        tree.reorder_children(a);
        tree.update_hierarchy(root);
        (tree, [root, a, a1, a2, b])
    }

    fn ids(tree: &ArchiveTree, nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|node| tree[*node].id.clone()).collect()
    }

    #[test]
    fn flatten_is_pre_order() {
        let (tree, [root, a, ..]) = sample_tree();
        assert_eq!(
            ids(&tree, &tree.flatten(root, true)),
            vec!["root", "a", "a1", "a2", "b"]
        );
        assert_eq!(ids(&tree, &tree.flatten(a, true)), vec!["a", "a1", "a2"]);
        assert_eq!(ids(&tree, &tree.flatten(root, false)), vec!["root"]);
    }

    #[test]
    fn flatten_honours_display_children() {
        let (mut tree, [root, a, ..]) = sample_tree();
        tree[root].display_children = true;
        assert_eq!(ids(&tree, &tree.flatten(root, false)), vec!["root", "a", "b"]);
        tree[a].display_children = true;
        assert_eq!(tree.flatten(root, false).len(), 5);
    }

    #[test]
    fn numbering_is_consistent() {
        let (tree, [root, a, a1, a2, b]) = sample_tree();
        assert_eq!(tree[root].hierarchy_level(), 0);
        assert_eq!(tree[a].hierarchy_level(), 1);
        assert_eq!(tree[a2].hierarchy_level(), 2);
        assert_eq!(tree[a1].order_number(), 0);
        assert_eq!(tree[a2].order_number(), 1);
        assert_eq!(tree[b].order_number(), 1);
        assert_eq!(tree.parent(a1), Some(a));
        assert!(tree.has_children(a));
        assert!(!tree.has_children(b));
    }

    #[test]
    fn ancestors_run_root_first() {
        let (tree, [root, a, a1, ..]) = sample_tree();
        assert_eq!(tree.ancestors(a1, false), vec![root, a]);
        assert_eq!(tree.ancestors(a1, true), vec![root, a, a1]);
        assert!(tree.ancestors(root, false).is_empty());
    }

    #[test]
    fn remove_child_renumbers_siblings() {
        let (mut tree, [root, a, a1, a2, b]) = sample_tree();
        assert!(tree.remove_child(a, a1));
        assert_eq!(tree.children(a), &[a2]);
        assert_eq!(tree[a2].order_number(), 0);
        assert_eq!(tree.parent(a1), None);
        assert!(!tree.remove_child(a, a1));
        assert!(!tree.remove_child(root, a2));
        assert_eq!(tree.children(root), &[a, b]);
    }

    #[test]
    fn add_child_moves_without_renumbering() {
        let (mut tree, [root, a, a1, _a2, b]) = sample_tree();
        tree.add_child(b, a1).unwrap();
        assert_eq!(tree.children(b), &[a1]);
        assert!(!tree.children(a).contains(&a1));
        assert_eq!(tree.parent(a1), Some(b));
        // level is stale until update_hierarchy runs
        assert_eq!(tree[a1].hierarchy_level(), 2);
        tree.shift_hierarchy(b, 2);
        assert_eq!(tree[b].hierarchy_level(), 3);
        assert_eq!(tree[a1].hierarchy_level(), 4);
        tree.update_hierarchy(root);
        assert_eq!(tree[a1].hierarchy_level(), 2);
        assert_eq!(tree[b].hierarchy_level(), 1);
    }

    #[test]
    fn add_child_rejects_cycles() {
        let (mut tree, [root, a, a1, ..]) = sample_tree();
        assert!(matches!(tree.add_child(a1, a), Err(ArchiveError::InvalidMove(_))));
        assert!(matches!(tree.add_child(a, a), Err(ArchiveError::InvalidMove(_))));
        assert!(matches!(tree.add_child(a, root), Err(ArchiveError::InvalidMove(_))));
    }

    #[test]
    #[should_panic]
    fn foreign_handles_panic() {
        let (mut tree, [_, a, ..]) = sample_tree();
        let _ = tree.add_child(a, NodeId(99));
    }

    #[test]
    fn get_checks_handles() {
        let (tree, [root, ..]) = sample_tree();
        assert!(tree.get(root).is_some());
        assert!(tree.get(NodeId(99)).is_none());
    }

    #[test]
    fn find_by_id_searches_reachable_entries() {
        let (mut tree, [_, _, a1, a2, _]) = sample_tree();
        assert_eq!(tree.find_by_id("a2"), Some(a2));
        let detached = tree.insert(ArchiveEntry::new("loose"));
        assert_eq!(tree.find_by_id("loose"), None);
        assert_eq!(tree.get(detached).map(|e| e.id.as_str()), Some("loose"));
        assert!(matches!(tree.require("missing"), Err(ArchiveError::EntryNotFound(_))));
        assert_eq!(tree.require("a1").unwrap(), a1);
    }
}
