use tracing::debug;

use crate::entry::NodeId;
use crate::tree::ArchiveTree;

impl ArchiveTree {
    /// Highlight every entry whose id equals `query` or whose label contains it,
    /// ignoring case. Previous results are cleared first.
    ///
    /// Matching entries become search hits; their ancestors and descendants
    /// join the search result list. Returns the number of hits.
    pub fn search(&mut self, query: &str) -> usize {
        let root = self.root();
        self.reset_found_list(root);

        let needle = query.to_lowercase();
        let hits: Vec<NodeId> = self
            .flatten(root, true)
            .into_iter()
            .filter(|node| {
                let entry = &self[*node];
                entry.id == query || entry.label.to_lowercase().contains(&needle)
            })
            .collect();
        for node in &hits {
            self.mark_as_found(*node, true);
        }
        debug!(query, hits = hits.len(), "searched archive tree");
        hits.len()
    }

    /// Mark `node` as a hit and add its ancestor chain to the result list.
    ///
    /// The walk up stops at the first ancestor already listed. With
    /// `keep_children_visible` all descendants are listed as well.
    pub fn mark_as_found(&mut self, node: NodeId, keep_children_visible: bool) {
        self[node].display_search = true;
        self[node].search_hit = true;

        let mut cursor = self[node].parent();
        while let Some(parent) = cursor {
            if self[parent].display_search {
                break;
            }
            self[parent].display_search = true;
            cursor = self[parent].parent();
        }

        if keep_children_visible {
            let children = self[node].children().to_vec();
            for child in children {
                self.set_display_search(child, true, true);
            }
        }
    }

    /// Clear search state on `node` and everything below it.
    pub fn reset_found_list(&mut self, node: NodeId) {
        for current in self.flatten(node, true) {
            let entry = &mut self[current];
            entry.display_search = false;
            entry.search_hit = false;
        }
    }

    /// Set `display_search` on `node`, and on its descendants when `recursive`.
    pub fn set_display_search(&mut self, node: NodeId, display: bool, recursive: bool) {
        if recursive {
            for current in self.flatten(node, true) {
                self[current].display_search = display;
            }
        } else {
            self[node].display_search = display;
        }
    }

    /// Search result list in pre-order.
    ///
    /// An entry is listed when it and all its ancestors have `display_search`
    /// set; the walk does not descend below an unlisted entry.
    pub fn search_list(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            let entry = &self[current];
            if !entry.display_search {
                continue;
            }
            out.push(current);
            stack.extend(entry.children().iter().rev().copied());
        }
        out
    }
}
