use tracing::trace;

use crate::entry::NodeId;
use crate::tree::ArchiveTree;

impl ArchiveTree {
    /// Expand `node` and show its children. Does nothing for a leaf.
    ///
    /// Grandchildren are shown only below children that are themselves
    /// expanded, so a previously opened subtree reappears as it was left.
    pub fn expand(&mut self, node: NodeId) {
        if !self.has_children(node) {
            return;
        }
        self[node].expanded = true;
        self.show_children(node);
        trace!(entry = %self[node].id, "expanded");
    }

    /// Collapse `node` and hide its whole subtree. Does nothing for a leaf.
    /// Expansion flags of the descendants are kept.
    pub fn collapse(&mut self, node: NodeId) {
        if !self.has_children(node) {
            return;
        }
        self[node].expanded = false;
        for descendant in self.flatten(node, true).into_iter().skip(1) {
            self[descendant].visible = false;
        }
        trace!(entry = %self[node].id, "collapsed");
    }

    /// Expand every ancestor of `node` so that it becomes reachable.
    ///
    /// Each non-root ancestor takes the visibility of the child it was
    /// reached from; the root keeps its own visibility.
    pub fn expand_up(&mut self, node: NodeId) {
        let mut current = node;
        while let Some(parent) = self[current].parent() {
            if self[parent].parent().is_some() {
                self[parent].visible = self[current].visible;
            }
            self.expand(parent);
            current = parent;
        }
    }

    /// Collapse every entry and hide all but the root.
    pub fn collapse_all(&mut self) {
        let root = self.root();
        for node in self.flatten(root, true) {
            let entry = &mut self[node];
            entry.expanded = false;
            entry.visible = node == root;
        }
    }

    /// Entries with `visible` set, in pre-order below the root.
    pub fn visible_list(&self) -> Vec<NodeId> {
        self.flatten(self.root(), true)
            .into_iter()
            .filter(|node| self[*node].visible)
            .collect()
    }

    fn show_children(&mut self, node: NodeId) {
        let mut stack = self[node].children().to_vec();
        while let Some(child) = stack.pop() {
            let entry = &mut self[child];
            entry.visible = true;
            if entry.expanded && entry.has_children() {
                stack.extend_from_slice(entry.children());
            }
        }
    }
}
