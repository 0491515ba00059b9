//! Unit of description stored in an [`ArchiveTree`](crate::ArchiveTree).

use serde::Serialize;

use crate::field::{Area, ArchiveMetadataField};

/// Node type used when the finding aid names no level.
pub const DEFAULT_NODE_TYPE: &str = "folder";

/// Handle to an entry stored in an [`ArchiveTree`](crate::ArchiveTree).
///
/// Handles stay valid for the lifetime of the tree; entries are never
/// removed from the arena, only detached. Passing a handle to a tree that
/// did not hand it out is a bug: tree methods panic or address the wrong
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Link between an entry and a digitised record in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "pi")]
pub enum RecordLink {
    /// No lookup has been made yet.
    #[default]
    Unresolved,
    /// A lookup was made. `None` means the index holds no matching record.
    Resolved(Option<String>),
}

impl RecordLink {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RecordLink::Resolved(_))
    }

    /// Persistent identifier of the associated record, if one is known.
    pub fn pi(&self) -> Option<&str> {
        match self {
            RecordLink::Resolved(pi) => pi.as_deref(),
            RecordLink::Unresolved => None,
        }
    }
}

/// One unit of description with its metadata and browser state.
///
/// Structural fields are owned by the tree and exposed read-only; the
/// descriptive fields and state flags are plain public data.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) order_number: usize,
    pub(crate) hierarchy_level: i32,
    pub(crate) areas: [Vec<ArchiveMetadataField>; 7],
    pub id: String,
    pub label: String,
    pub node_type: String,
    pub description_level: Option<String>,
    /// Flattening descends into the children only while set.
    pub display_children: bool,
    pub search_hit: bool,
    /// Entry appears in the search result list.
    pub display_search: bool,
    pub visible: bool,
    pub expanded: bool,
    pub valid: bool,
    pub record: RecordLink,
    pub contains_image: bool,
}

impl ArchiveEntry {
    /// Detached entry with default state: visible, collapsed and valid.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            order_number: 0,
            hierarchy_level: 0,
            areas: Default::default(),
            id: id.into(),
            label: String::new(),
            node_type: DEFAULT_NODE_TYPE.to_string(),
            description_level: None,
            display_children: false,
            search_hit: false,
            display_search: false,
            visible: true,
            expanded: false,
            valid: true,
            record: RecordLink::Unresolved,
            contains_image: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Position among the siblings, starting at 0.
    pub fn order_number(&self) -> usize {
        self.order_number
    }

    /// Depth below the root, which sits at 0.
    pub fn hierarchy_level(&self) -> i32 {
        self.hierarchy_level
    }

    /// Fields filed under `area`, in table order.
    pub fn area(&self, area: Area) -> &[ArchiveMetadataField] {
        &self.areas[area.index()]
    }

    /// File `field` under its area.
    pub fn add_field(&mut self, field: ArchiveMetadataField) {
        self.areas[field.area.index()].push(field);
    }

    /// All fields of all seven areas, area by area.
    pub fn all_area_fields(&self) -> impl Iterator<Item = &ArchiveMetadataField> {
        self.areas.iter().flatten()
    }

    /// First identity statement field labelled `label`.
    pub fn identity_statement_field(&self, label: &str) -> Option<&ArchiveMetadataField> {
        self.area(Area::IdentityStatement)
            .iter()
            .find(|field| field.label == label)
    }

    /// Text a browser shows for the entry: the label, else the node type,
    /// else the identifier.
    pub fn display_label(&self) -> &str {
        if !self.label.trim().is_empty() {
            &self.label
        } else if !self.node_type.trim().is_empty() {
            &self.node_type
        } else {
            &self.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldValue, XPathKind};

    fn field(label: &str, area: Area, value: &str) -> ArchiveMetadataField {
        ArchiveMetadataField {
            label: label.into(),
            area,
            xpath: format!("./ead:{label}"),
            kind: XPathKind::Element,
            values: vec![FieldValue::new(value)],
        }
    }

    #[test]
    fn new_entries_use_default_state() {
        let entry = ArchiveEntry::new("c1");
        assert!(entry.visible);
        assert!(entry.valid);
        assert!(!entry.expanded);
        assert!(!entry.display_children);
        assert!(!entry.search_hit);
        assert_eq!(entry.node_type, DEFAULT_NODE_TYPE);
        assert_eq!(entry.record, RecordLink::Unresolved);
        assert!(entry.all_area_fields().next().is_none());
    }

    #[test]
    fn fields_are_filed_by_area() {
        let mut entry = ArchiveEntry::new("c1");
        entry.add_field(field("unitid", Area::IdentityStatement, "A-1"));
        entry.add_field(field("odd", Area::Notes, "note"));
        entry.add_field(field("unittitle", Area::IdentityStatement, "Letters"));

        assert_eq!(entry.area(Area::IdentityStatement).len(), 2);
        assert_eq!(entry.area(Area::Notes).len(), 1);
        let labels: Vec<_> = entry.all_area_fields().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["unitid", "unittitle", "odd"]);
        assert_eq!(
            entry
                .identity_statement_field("unittitle")
                .and_then(|f| f.first_value()),
            Some("Letters")
        );
        assert!(entry.identity_statement_field("odd").is_none());
    }

    #[test]
    fn display_label_falls_back() {
        let mut entry = ArchiveEntry::new("c1");
        entry.node_type = "file".into();
        assert_eq!(entry.display_label(), "file");
        entry.node_type.clear();
        assert_eq!(entry.display_label(), "c1");
        let entry = entry.with_label("Letters");
        assert_eq!(entry.display_label(), "Letters");
    }

    #[test]
    fn record_link_states() {
        assert!(!RecordLink::Unresolved.is_resolved());
        assert!(RecordLink::Resolved(None).is_resolved());
        assert_eq!(RecordLink::Resolved(None).pi(), None);
        assert_eq!(RecordLink::Resolved(Some("PPN1".into())).pi(), Some("PPN1"));
    }
}
