//! Conversion of EAD documents into archive trees.

use ead_xml::{XmlDocument, XmlNodeId, EAD_NAMESPACE};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::entry::{ArchiveEntry, NodeId, RecordLink, DEFAULT_NODE_TYPE};
use crate::field::{ArchiveMetadataField, FieldDescriptor, FieldTable, FieldValue};
use crate::records::AssociatedRecords;
use crate::tree::ArchiveTree;
use crate::ArchiveError;

const NS: Option<&str> = Some(EAD_NAMESPACE);

/// Builds [`ArchiveTree`]s from EAD documents using a field descriptor table.
#[derive(Debug, Clone, Default)]
pub struct EadParser {
    fields: FieldTable,
    records: AssociatedRecords,
}

impl EadParser {
    pub fn new(fields: FieldTable) -> Self {
        Self {
            fields,
            records: AssociatedRecords::new(),
        }
    }

    /// Attach the record map consulted for every parsed entry.
    pub fn with_records(mut self, records: AssociatedRecords) -> Self {
        self.records = records;
        self
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Parse XML text and build the tree of its `ead` element.
    pub fn parse_str(&self, xml: &str) -> Result<ArchiveTree, ArchiveError> {
        let doc = ead_xml::parse(xml)?;
        self.parse_document(&doc)
    }

    /// Build the tree of the `ead` element of `doc`.
    ///
    /// The element may be the document root or a direct child of it, as in
    /// the collection wrapper returned by tree databases.
    pub fn parse_document(&self, doc: &XmlDocument) -> Result<ArchiveTree, ArchiveError> {
        let ead = locate_ead(doc).ok_or_else(|| {
            ArchiveError::Precondition("document has no <ead> element".into())
        })?;
        let tree = self.parse_element(doc, ead)?;
        debug!(
            entries = tree.len(),
            root = %tree[tree.root()].id,
            "parsed finding aid"
        );
        Ok(tree)
    }

    /// Build the tree rooted at `element`, which becomes the root entry at
    /// level 0 with its children displayed.
    pub fn parse_element(
        &self,
        doc: &XmlDocument,
        element: XmlNodeId,
    ) -> Result<ArchiveTree, ArchiveError> {
        if doc.element(element).is_none() {
            return Err(ArchiveError::Precondition(format!(
                "node {} is not an element",
                element.index()
            )));
        }
        let (entry, children) = self.describe(doc, element);
        let mut tree = ArchiveTree::new(entry);
        let root = tree.root();
        self.attach_children(doc, &mut tree, root, &children);
        self.finish(&mut tree, root);
        tree[root].display_children = true;
        Ok(tree)
    }

    fn parse_child(
        &self,
        doc: &XmlDocument,
        tree: &mut ArchiveTree,
        parent: NodeId,
        element: XmlNodeId,
        order: usize,
    ) -> NodeId {
        let (mut entry, children) = self.describe(doc, element);
        entry.parent = Some(parent);
        entry.order_number = order;
        entry.hierarchy_level = tree[parent].hierarchy_level + 1;
        let node = tree.push(entry);
        tree[parent].children.push(node);
        self.attach_children(doc, tree, node, &children);
        self.finish(tree, node);
        node
    }

    fn attach_children(
        &self,
        doc: &XmlDocument,
        tree: &mut ArchiveTree,
        node: NodeId,
        children: &[XmlNodeId],
    ) {
        for (order, child) in children.iter().enumerate() {
            let child = self.parse_child(doc, tree, node, *child, order);
            if tree[child].contains_image {
                tree[node].contains_image = true;
            }
        }
    }

    /// Entry data that depends on the element alone, plus the `<c>` elements
    /// holding its children.
    fn describe(&self, doc: &XmlDocument, element: XmlNodeId) -> (ArchiveEntry, Vec<XmlNodeId>) {
        let id = doc
            .attribute(element, "id")
            .map(str::trim)
            .unwrap_or_default();
        let mut entry = ArchiveEntry::new(id);

        for descriptor in self.fields.iter() {
            let values = descriptor.extract(doc, element);
            add_field(&mut entry, descriptor, values);
        }

        let title = doc
            .child(element, NS, "eadheader")
            .and_then(|header| doc.child(header, NS, "filedesc"))
            .and_then(|filedesc| doc.child(filedesc, NS, "titlestmt"))
            .and_then(|titlestmt| doc.child_text(titlestmt, NS, "titleproper"));
        if let Some(title) = title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            entry.label = title.to_string();
        }

        let level = non_blank(doc.attribute(element, "level"));
        entry.description_level = level.map(str::to_string);

        let (node_type, children) = match doc.child(element, NS, "archdesc") {
            Some(archdesc) => {
                let node_type = non_blank(doc.attribute(archdesc, "otherlevel"))
                    .or_else(|| non_blank(doc.attribute(archdesc, "level")));
                let children = match doc.child(archdesc, NS, "dsc") {
                    Some(dsc) => doc.children_named(dsc, NS, "c"),
                    None => doc.children_named(element, NS, "c"),
                };
                (node_type, children)
            }
            None => (level, doc.children_named(element, NS, "c")),
        };
        entry.node_type = node_type.unwrap_or(DEFAULT_NODE_TYPE).to_string();

        (entry, children)
    }

    /// Steps that run once the children exist: id synthesis and record lookup.
    fn finish(&self, tree: &mut ArchiveTree, node: NodeId) {
        let entry = &mut tree[node];
        if entry.id.is_empty() {
            entry.id = Uuid::new_v4().to_string();
            trace!(entry = %entry.id, "generated entry id");
        }
        if let Some(record) = self.records.get(&entry.id) {
            let pi = Some(record.pi.clone()).filter(|pi| !pi.is_empty());
            entry.record = RecordLink::Resolved(pi);
            entry.contains_image |= record.has_image;
        }
    }
}

fn add_field(entry: &mut ArchiveEntry, descriptor: &FieldDescriptor, values: Vec<String>) {
    if entry.label.trim().is_empty() && descriptor.xpath().as_str().contains("unittitle") {
        if let Some(first) = values.iter().find(|value| !value.trim().is_empty()) {
            entry.label = first.clone();
        }
    }

    let Some(area) = descriptor.area() else {
        trace!(
            field = descriptor.label(),
            area_type = descriptor.area_type(),
            "field type outside 1..=7, not filed"
        );
        return;
    };
    let values = if values.is_empty() {
        vec![FieldValue::default()]
    } else {
        values.into_iter().map(FieldValue::new).collect()
    };
    entry.add_field(ArchiveMetadataField {
        label: descriptor.label().to_string(),
        area,
        xpath: descriptor.xpath().as_str().to_string(),
        kind: descriptor.kind(),
        values,
    });
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The `ead` element: the root itself or its first `ead` child.
fn locate_ead(doc: &XmlDocument) -> Option<XmlNodeId> {
    let root = doc.root();
    let is_ead = doc
        .element(root)
        .map(|element| element.name.matches(NS, "ead"))
        .unwrap_or(false);
    if is_ead {
        Some(root)
    } else {
        doc.child(root, NS, "ead")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::field::{Area, XPathKind};
    use crate::records::AssociatedRecord;

    const FINDING_AID: &str = r#"<collection>
      <ead xmlns="urn:isbn:1-931666-22-9">
        <eadheader>
          <eadid>DE-1</eadid>
          <filedesc><titlestmt><titleproper>Family papers</titleproper></titlestmt></filedesc>
        </eadheader>
        <archdesc level="fonds">
          <did><unittitle>Ignored archdesc title</unittitle></did>
          <dsc>
            <c id="s1" level="series">
              <did><unittitle>Correspondence</unittitle><unitdate>1900-1910</unitdate></did>
              <c id="f1" level="file">
                <did><unittitle>Letters to Anna</unittitle></did>
                <scopecontent><p>Forty letters.</p></scopecontent>
              </c>
              <c level="file">
                <did><unittitle>Postcards</unittitle></did>
              </c>
            </c>
            <c id="s2" level="otherlevel" otherlevel="subseries">
              <did><unittitle></unittitle><unittitle>Photographs</unittitle></did>
            </c>
          </dsc>
        </archdesc>
      </ead>
    </collection>"#;

    fn parser() -> EadParser {
        EadParser::new(
            FieldTable::from_json(
                r#"[
                    {"label": "unittitle", "type": 1, "xpath": "./ead:did/ead:unittitle"},
                    {"label": "unitdate", "type": 1, "xpath": "./ead:did/ead:unitdate"},
                    {"label": "scope", "type": 3, "xpath": "./ead:scopecontent/ead:p"},
                    {"label": "level", "type": 1, "xpath": "./@level", "xpathType": "attribute"},
                    {"label": "ignored", "type": 9, "xpath": "./ead:did/ead:unittitle"}
                ]"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn builds_tree_from_collection_wrapper() {
        let tree = parser().parse_str(FINDING_AID).expect("parse");
        let root = tree.root();
        assert_eq!(tree[root].label, "Family papers");
        assert_eq!(tree[root].node_type, "fonds");
        assert!(tree[root].display_children);
        assert_eq!(tree[root].hierarchy_level(), 0);

        let labels: Vec<_> = tree
            .flatten(root, true)
            .into_iter()
            .map(|node| tree[node].label.clone())
            .collect();
        assert_eq!(
            labels,
            vec!["Family papers", "Correspondence", "Letters to Anna", "Postcards", "Photographs"]
        );
    }

    #[test]
    fn numbering_and_structure_are_consistent() {
        let tree = parser().parse_str(FINDING_AID).unwrap();
        for node in tree.flatten(tree.root(), true) {
            let entry = &tree[node];
            for (position, child) in entry.children().iter().enumerate() {
                assert_eq!(tree[*child].order_number(), position);
                assert_eq!(tree[*child].hierarchy_level(), entry.hierarchy_level() + 1);
                assert_eq!(tree.parent(*child), Some(node));
            }
        }
    }

    #[test]
    fn node_types_and_levels() {
        let tree = parser().parse_str(FINDING_AID).unwrap();
        let s1 = tree.find_by_id("s1").unwrap();
        let s2 = tree.find_by_id("s2").unwrap();
        assert_eq!(tree[s1].node_type, "series");
        assert_eq!(tree[s1].description_level.as_deref(), Some("series"));
        assert_eq!(tree[s2].node_type, "otherlevel");
        assert_eq!(tree[tree.root()].description_level, None);
    }

    #[test]
    fn fields_are_filed_with_placeholders() {
        let tree = parser().parse_str(FINDING_AID).unwrap();
        let f1 = tree.find_by_id("f1").unwrap();
        let entry = &tree[f1];
        let date = entry.identity_statement_field("unitdate").unwrap();
        assert!(!date.is_filled());
        assert_eq!(date.values, vec![FieldValue::default()]);
        let scope = &entry.area(Area::ContentAndStructure)[0];
        assert_eq!(scope.first_value(), Some("Forty letters."));
        let level = entry.identity_statement_field("level").unwrap();
        assert_eq!(level.kind, XPathKind::Attribute);
        assert_eq!(level.first_value(), Some("file"));
        // type 9 is not filed anywhere
        assert_eq!(entry.all_area_fields().count(), 4);
    }

    #[test]
    fn label_comes_from_first_non_empty_unittitle() {
        let tree = parser().parse_str(FINDING_AID).unwrap();
        let s2 = tree.find_by_id("s2").unwrap();
        assert_eq!(tree[s2].label, "Photographs");
        let titles = tree[s2].identity_statement_field("unittitle").unwrap();
        assert_eq!(titles.values.len(), 2);
    }

    #[test]
    fn missing_ids_are_generated_and_distinct() {
        let tree = parser().parse_str(FINDING_AID).unwrap();
        let ids: Vec<_> = tree
            .flatten(tree.root(), true)
            .into_iter()
            .map(|node| tree[node].id.clone())
            .collect();
        assert!(ids.iter().all(|id| !id.is_empty()));
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(Uuid::parse_str(&ids[3]).is_ok());
    }

    #[test]
    fn record_map_links_entries_and_propagates_images() {
        let mut records = AssociatedRecords::new();
        records.insert(
            "f1".into(),
            AssociatedRecord {
                pi: "PPN42".into(),
                has_image: true,
            },
        );
        records.insert(
            "s2".into(),
            AssociatedRecord {
                pi: "PPN43".into(),
                has_image: false,
            },
        );
        let tree = parser().with_records(records).parse_str(FINDING_AID).unwrap();
        let f1 = tree.find_by_id("f1").unwrap();
        let s1 = tree.find_by_id("s1").unwrap();
        let s2 = tree.find_by_id("s2").unwrap();

        assert_eq!(tree[f1].record.pi(), Some("PPN42"));
        assert!(tree[f1].contains_image);
        assert!(tree[s1].contains_image);
        assert!(tree[tree.root()].contains_image);
        assert_eq!(tree[s2].record.pi(), Some("PPN43"));
        assert!(!tree[s2].contains_image);
        assert_eq!(tree[s1].record, RecordLink::Unresolved);
    }

    #[test]
    fn plain_ead_root_and_missing_dsc() {
        let xml = r#"<ead xmlns="urn:isbn:1-931666-22-9">
            <archdesc otherlevel="bestand" level="otherlevel"><did><unittitle>Bestand</unittitle></did></archdesc>
            <c id="x"><did><unittitle>Loose</unittitle></did></c>
        </ead>"#;
        let tree = parser().parse_str(xml).unwrap();
        let root = tree.root();
        assert_eq!(tree[root].node_type, "bestand");
        // the root has no did of its own and no titleproper
        assert_eq!(tree[root].label, "");
        assert_eq!(tree[root].display_label(), "bestand");
        let x = tree.find_by_id("x").unwrap();
        assert_eq!(tree[x].node_type, DEFAULT_NODE_TYPE);
        assert_eq!(tree[x].label, "Loose");
    }

    #[test]
    fn archdesc_without_level_defaults_to_folder() {
        let xml = r#"<ead xmlns="urn:isbn:1-931666-22-9" level="collection">
            <archdesc><dsc/></archdesc>
        </ead>"#;
        let tree = parser().parse_str(xml).unwrap();
        let root = &tree[tree.root()];
        assert_eq!(root.node_type, DEFAULT_NODE_TYPE);
        assert_eq!(root.description_level.as_deref(), Some("collection"));
        assert!(!root.has_children());
    }

    #[test]
    fn sibling_components_without_ids_get_distinct_ids() {
        let xml = r#"<ead xmlns="urn:isbn:1-931666-22-9">
            <eadheader><eadid>DE-2</eadid></eadheader>
            <archdesc level="fonds"><dsc>
                <c level="file"><did><unittitle>One</unittitle></did></c>
                <c level="file"><did><unittitle>Two</unittitle></did></c>
            </dsc></archdesc>
        </ead>"#;
        let tree = parser().parse_str(xml).unwrap();
        let children = tree.children(tree.root());
        assert_eq!(children.len(), 2);
        let first = &tree[children[0]].id;
        let second = &tree[children[1]].id;
        assert_ne!(first, second);
        assert!(Uuid::parse_str(first).is_ok());
        assert!(Uuid::parse_str(second).is_ok());
    }

    #[test]
    fn rejects_documents_without_ead() {
        let err = parser().parse_str("<collection><other/></collection>").unwrap_err();
        assert!(matches!(err, ArchiveError::Precondition(_)));
        let err = parser().parse_str("<collection>").unwrap_err();
        assert!(matches!(err, ArchiveError::Xml(_)));
    }

    #[test]
    fn default_table_reads_archdesc_identity() {
        let tree = EadParser::new(FieldTable::default_ead())
            .parse_str(FINDING_AID)
            .unwrap();
        let root = &tree[tree.root()];
        assert_eq!(root.label, "Family papers");
        assert_eq!(
            root.identity_statement_field("descriptionLevel")
                .and_then(|f| f.first_value()),
            Some("fonds")
        );
    }
}
