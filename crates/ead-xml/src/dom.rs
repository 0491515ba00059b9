//! Owned, arena backed copy of a roxmltree document.
//!
//! roxmltree borrows the source text; finding aids outlive the response body
//! they were fetched with, so the parsed tree is copied into [`XmlDocument`].

use roxmltree::{Document, Node, NodeType, ParsingOptions};
use tracing::trace;

use crate::XmlError;

/// Handle to a node stored in an [`XmlDocument`].
///
/// Handles are only meaningful for the document that produced them. Node
/// indices follow document order, which the XPath evaluator relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XmlNodeId(usize);

impl XmlNodeId {
    /// Position of the node in document order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Namespace qualified name of an element or attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedName {
    /// Namespace URI the name is bound to, if any.
    pub namespace: Option<String>,
    /// Local part of the name without prefix.
    pub local: String,
}

impl ExpandedName {
    /// Check whether the name equals `{namespace}local`.
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }
}

/// Attribute attached to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: ExpandedName,
    pub value: String,
}

/// Element name and attributes. Children are held by the document.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: ExpandedName,
    pub attributes: Vec<Attribute>,
}

/// Payload of a document node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic parent of the root element, target of absolute paths.
    Document,
    Element(Element),
    /// Character data, including CDATA sections.
    Text(String),
}

#[derive(Debug, Clone)]
struct XmlNode {
    parent: Option<XmlNodeId>,
    children: Vec<XmlNodeId>,
    kind: NodeKind,
}

/// Parsed XML document stored as a flat arena of nodes.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    root: XmlNodeId,
}

impl XmlDocument {
    /// The synthetic document node that owns the root element.
    pub fn document_node(&self) -> XmlNodeId {
        XmlNodeId(0)
    }

    /// The root element.
    pub fn root(&self) -> XmlNodeId {
        self.root
    }

    /// Number of nodes including the document node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn kind(&self, id: XmlNodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Element payload, `None` for text and document nodes.
    pub fn element(&self, id: XmlNodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Character data of a text node.
    pub fn text(&self, id: XmlNodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self, id: XmlNodeId) -> Option<XmlNodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: XmlNodeId) -> &[XmlNodeId] {
        &self.nodes[id.0].children
    }

    /// Element children in document order.
    pub fn child_elements(&self, id: XmlNodeId) -> impl Iterator<Item = XmlNodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.element(*child).is_some())
    }

    /// First child element named `{namespace}local`.
    pub fn child(&self, id: XmlNodeId, namespace: Option<&str>, local: &str) -> Option<XmlNodeId> {
        self.child_elements(id).find(|child| {
            self.element(*child)
                .map(|element| element.name.matches(namespace, local))
                .unwrap_or(false)
        })
    }

    /// All child elements named `{namespace}local`.
    pub fn children_named(
        &self,
        id: XmlNodeId,
        namespace: Option<&str>,
        local: &str,
    ) -> Vec<XmlNodeId> {
        self.child_elements(id)
            .filter(|child| {
                self.element(*child)
                    .map(|element| element.name.matches(namespace, local))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Value of the un-namespaced attribute `local`.
    pub fn attribute(&self, id: XmlNodeId, local: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|attr| attr.name.matches(None, local))
            .map(|attr| attr.value.as_str())
    }

    /// Concatenation of the direct text children only.
    pub fn direct_text(&self, id: XmlNodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| self.text(*child))
            .collect()
    }

    /// Direct text of the first child element named `{namespace}local`.
    pub fn child_text(&self, id: XmlNodeId, namespace: Option<&str>, local: &str) -> Option<String> {
        self.child(id, namespace, local)
            .map(|child| self.direct_text(child))
    }

    /// Concatenation of all descendant text in document order.
    pub fn string_value(&self, id: XmlNodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: XmlNodeId) -> Vec<XmlNodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<XmlNodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }
}

/// Parse an XML string into an [`XmlDocument`].
///
/// Document type declarations are accepted so that exported finding aids
/// carrying an EAD `DOCTYPE` load as well. Comments and processing
/// instructions are dropped.
pub fn parse(xml: &str) -> Result<XmlDocument, XmlError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let source =
        Document::parse_with_options(xml, options).map_err(|err| XmlError::Xml(err.to_string()))?;

    let mut nodes: Vec<XmlNode> = Vec::new();
    let mut root = None;
    let mut stack: Vec<(Node<'_, '_>, Option<XmlNodeId>)> = vec![(source.root(), None)];
    while let Some((node, parent)) = stack.pop() {
        let kind = match node.node_type() {
            NodeType::Root => NodeKind::Document,
            NodeType::Element => NodeKind::Element(convert_element(node)),
            NodeType::Text => NodeKind::Text(node.text().unwrap_or_default().to_string()),
            NodeType::Comment | NodeType::PI => continue,
        };
        let id = XmlNodeId(nodes.len());
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
            if parent.0 == 0 && matches!(kind, NodeKind::Element(_)) {
                root = Some(id);
            }
        }
        nodes.push(XmlNode {
            parent,
            children: Vec::new(),
            kind,
        });
        let children: Vec<Node<'_, '_>> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
    }

    let root = root.ok_or_else(|| XmlError::Invalid("document has no root element".into()))?;
    trace!(nodes = nodes.len(), "parsed xml document");
    Ok(XmlDocument { nodes, root })
}

fn convert_element(node: Node<'_, '_>) -> Element {
    let name = node.tag_name();
    Element {
        name: ExpandedName {
            namespace: name.namespace().map(str::to_string),
            local: name.name().to_string(),
        },
        attributes: node
            .attributes()
            .map(|attr| Attribute {
                name: ExpandedName {
                    namespace: attr.namespace().map(str::to_string),
                    local: attr.name().to_string(),
                },
                value: attr.value().to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EAD_NAMESPACE;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <collection>
            <ead xmlns="urn:isbn:1-931666-22-9" xmlns:xlink="http://www.w3.org/1999/xlink">
                <eadheader><filedesc><titlestmt><titleproper>Estate &amp; papers</titleproper></titlestmt></filedesc></eadheader>
                <archdesc level="collection"><did><unittitle>Top <emph>level</emph></unittitle></did>
                    <dao xlink:href="http://example.org/1" xml:lang="de"/>
                    <note><![CDATA[a < b]]></note>
                </archdesc>
            </ead>
        </collection>"#;

    #[test]
    fn builds_namespaced_tree() {
        let doc = parse(FIXTURE).expect("parse fixture");
        let root = doc.root();
        assert_eq!(doc.element(root).unwrap().name.local, "collection");
        assert_eq!(doc.element(root).unwrap().name.namespace, None);

        let ead = doc.child(root, Some(EAD_NAMESPACE), "ead").expect("ead element");
        assert!(doc.child(root, None, "ead").is_none());
        let attrs = &doc.element(ead).unwrap().attributes;
        assert!(attrs.is_empty(), "xmlns declarations are not attributes");

        let title = doc
            .child(ead, Some(EAD_NAMESPACE), "eadheader")
            .and_then(|e| doc.child(e, Some(EAD_NAMESPACE), "filedesc"))
            .and_then(|e| doc.child(e, Some(EAD_NAMESPACE), "titlestmt"))
            .and_then(|e| doc.child_text(e, Some(EAD_NAMESPACE), "titleproper"));
        assert_eq!(title.as_deref(), Some("Estate & papers"));
    }

    #[test]
    fn text_values_and_attributes() {
        let doc = parse(FIXTURE).expect("parse fixture");
        let ead = doc.child(doc.root(), Some(EAD_NAMESPACE), "ead").unwrap();
        let archdesc = doc.child(ead, Some(EAD_NAMESPACE), "archdesc").unwrap();
        assert_eq!(doc.attribute(archdesc, "level"), Some("collection"));
        assert_eq!(doc.attribute(archdesc, "otherlevel"), None);

        let unittitle = doc
            .child(archdesc, Some(EAD_NAMESPACE), "did")
            .and_then(|did| doc.child(did, Some(EAD_NAMESPACE), "unittitle"))
            .unwrap();
        assert_eq!(doc.string_value(unittitle), "Top level");
        assert_eq!(doc.direct_text(unittitle), "Top ");

        let dao = doc.child(archdesc, Some(EAD_NAMESPACE), "dao").unwrap();
        let attrs = &doc.element(dao).unwrap().attributes;
        assert_eq!(attrs.len(), 2);
        assert!(attrs[0]
            .name
            .matches(Some("http://www.w3.org/1999/xlink"), "href"));
        assert!(attrs[1]
            .name
            .matches(Some("http://www.w3.org/XML/1998/namespace"), "lang"));

        let note = doc.child(archdesc, Some(EAD_NAMESPACE), "note").unwrap();
        assert_eq!(doc.string_value(note), "a < b");
    }

    #[test]
    fn node_ids_follow_document_order() {
        let doc = parse(FIXTURE).expect("parse fixture");
        let all = doc.descendants(doc.document_node());
        assert!(all.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(all.len() + 1, doc.len());
    }

    #[test]
    fn accepts_doctype_and_skips_comments() {
        let doc = parse(
            r#"<?xml version="1.0"?>
            <!DOCTYPE ead PUBLIC "+//ISBN 1-931666-00-8//DTD ead.dtd (EAD Version 2002)//EN" "ead.dtd">
            <ead><!-- exported --><eadheader/></ead>"#,
        )
        .expect("parse with doctype");
        let root = doc.root();
        assert_eq!(doc.element(root).unwrap().name.local, "ead");
        assert_eq!(doc.children(root).len(), 1);
        assert!(doc.child(root, None, "eadheader").is_some());
    }

    #[test]
    fn rejects_broken_documents() {
        for broken in ["<a><b></a>", "<a>", "", "<a/><b/>", "<p:a/>"] {
            assert!(
                matches!(parse(broken), Err(XmlError::Xml(_))),
                "{broken:?} should not parse"
            );
        }
    }
}
