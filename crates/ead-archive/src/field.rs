//! Field descriptor table and the metadata fields extracted for each entry.

use std::fmt;

use ead_xml::{Namespaces, XPath, XPathItem, XmlDocument, XmlNodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ArchiveError;

/// ISAD(G) description area a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Area {
    IdentityStatement,
    Context,
    ContentAndStructure,
    AccessAndUse,
    AlliedMaterials,
    Notes,
    DescriptionControl,
}

impl Area {
    pub const ALL: [Area; 7] = [
        Area::IdentityStatement,
        Area::Context,
        Area::ContentAndStructure,
        Area::AccessAndUse,
        Area::AlliedMaterials,
        Area::Notes,
        Area::DescriptionControl,
    ];

    /// Map the numeric `type` of a descriptor (1..=7) to its area.
    pub fn from_type(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|v| v.checked_sub(1))
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Numeric `type` of the area as used in descriptor tables.
    pub fn number(self) -> i32 {
        self.index() as i32 + 1
    }

    /// Zero based slot of the area.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Area::IdentityStatement => "Identity statement",
            Area::Context => "Context",
            Area::ContentAndStructure => "Content and structure",
            Area::AccessAndUse => "Conditions of access and use",
            Area::AlliedMaterials => "Allied materials",
            Area::Notes => "Notes",
            Area::DescriptionControl => "Description control",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Which kind of XPath result a descriptor keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XPathKind {
    #[default]
    Element,
    Attribute,
    Text,
}

impl XPathKind {
    /// Parse an `xpathType` value, ignoring case. Unknown values fall back
    /// to `element`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "element" | "" => XPathKind::Element,
            "attribute" => XPathKind::Attribute,
            "text" => XPathKind::Text,
            other => {
                warn!(xpath_type = other, "unknown xpathType, evaluating as element");
                XPathKind::Element
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            XPathKind::Element => "element",
            XPathKind::Attribute => "attribute",
            XPathKind::Text => "text",
        }
    }

    fn accepts(self, item: &XPathItem) -> bool {
        match self {
            XPathKind::Element => matches!(item, XPathItem::Element(_)),
            XPathKind::Attribute => matches!(item, XPathItem::Attribute { .. }),
            XPathKind::Text => matches!(item, XPathItem::Text(_)),
        }
    }
}

/// One row of the field descriptor table with its compiled XPath.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    label: String,
    area_type: i32,
    xpath: XPath,
    kind: XPathKind,
}

impl FieldDescriptor {
    /// Build a descriptor, compiling `xpath` against the EAD namespace bindings.
    pub fn new(
        label: impl Into<String>,
        area_type: i32,
        xpath: &str,
        kind: XPathKind,
    ) -> Result<Self, ArchiveError> {
        let label = label.into();
        let xpath = XPath::compile(xpath, &Namespaces::ead()).map_err(|err| {
            ArchiveError::Config(format!("field '{label}': invalid xpath '{xpath}': {err}"))
        })?;
        Ok(Self {
            label,
            area_type,
            xpath,
            kind,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw numeric `type` as configured.
    pub fn area_type(&self) -> i32 {
        self.area_type
    }

    /// Area the descriptor files its values under, if the type is in range.
    pub fn area(&self) -> Option<Area> {
        Area::from_type(self.area_type)
    }

    pub fn xpath(&self) -> &XPath {
        &self.xpath
    }

    pub fn kind(&self) -> XPathKind {
        self.kind
    }

    /// Evaluate the descriptor relative to `element`, keeping only results of
    /// the configured kind, in document order.
    pub fn extract(&self, doc: &XmlDocument, element: XmlNodeId) -> Vec<String> {
        self.xpath
            .evaluate(doc, element)
            .into_iter()
            .filter(|item| self.kind.accepts(item))
            .map(|item| item.value(doc))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct DescriptorRecord {
    label: Option<String>,
    #[serde(rename = "type")]
    area_type: Option<i32>,
    xpath: Option<String>,
    #[serde(rename = "xpathType")]
    xpath_type: Option<String>,
}

impl DescriptorRecord {
    fn into_descriptor(self, index: usize) -> Result<FieldDescriptor, ArchiveError> {
        let missing =
            |what: &str| ArchiveError::Config(format!("metadata entry {index}: missing '{what}'"));
        let label = self.label.ok_or_else(|| missing("label"))?;
        let area_type = self.area_type.ok_or_else(|| missing("type"))?;
        let xpath = self.xpath.ok_or_else(|| missing("xpath"))?;
        let kind = self
            .xpath_type
            .as_deref()
            .map(XPathKind::parse_lenient)
            .unwrap_or_default();
        FieldDescriptor::new(label, area_type, &xpath, kind)
    }
}

/// Ordered list of field descriptors applied to every unit of description.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    fields: Vec<FieldDescriptor>,
}

const DEFAULT_EAD_FIELDS: &[(&str, i32, &str, XPathKind)] = &[
    ("unitid", 1, "./ead:did/ead:unitid | ./ead:archdesc/ead:did/ead:unitid", XPathKind::Element),
    ("unittitle", 1, "./ead:did/ead:unittitle | ./ead:archdesc/ead:did/ead:unittitle", XPathKind::Element),
    ("unitdate", 1, "./ead:did/ead:unitdate | ./ead:archdesc/ead:did/ead:unitdate", XPathKind::Element),
    ("descriptionLevel", 1, "./@level | ./ead:archdesc/@level", XPathKind::Attribute),
    ("physdesc", 1, "./ead:did/ead:physdesc | ./ead:archdesc/ead:did/ead:physdesc", XPathKind::Element),
    ("origination", 2, "./ead:did/ead:origination", XPathKind::Element),
    ("bioghist", 2, "./ead:bioghist", XPathKind::Element),
    ("custodhist", 2, "./ead:custodhist", XPathKind::Element),
    ("acqinfo", 2, "./ead:acqinfo", XPathKind::Element),
    ("scopecontent", 3, "./ead:scopecontent", XPathKind::Element),
    ("appraisal", 3, "./ead:appraisal", XPathKind::Element),
    ("accruals", 3, "./ead:accruals", XPathKind::Element),
    ("arrangement", 3, "./ead:arrangement", XPathKind::Element),
    ("accessrestrict", 4, "./ead:accessrestrict", XPathKind::Element),
    ("userestrict", 4, "./ead:userestrict", XPathKind::Element),
    ("langmaterial", 4, "./ead:did/ead:langmaterial", XPathKind::Element),
    ("phystech", 4, "./ead:phystech", XPathKind::Element),
    ("otherfindaid", 4, "./ead:otherfindaid", XPathKind::Element),
    ("originalsloc", 5, "./ead:originalsloc", XPathKind::Element),
    ("altformavail", 5, "./ead:altformavail", XPathKind::Element),
    ("relatedmaterial", 5, "./ead:relatedmaterial", XPathKind::Element),
    ("bibliography", 5, "./ead:bibliography", XPathKind::Element),
    ("odd", 6, "./ead:odd", XPathKind::Element),
    ("processinfo", 7, "./ead:processinfo", XPathKind::Element),
    ("descrules", 7, "./ead:eadheader/ead:profiledesc/ead:descrules", XPathKind::Element),
    ("creation", 7, "./ead:eadheader/ead:profiledesc/ead:creation/ead:date", XPathKind::Element),
];

impl FieldTable {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Built-in table covering the common ISAD(G) elements of EAD 2002.
    pub fn default_ead() -> Self {
        let fields = DEFAULT_EAD_FIELDS
            .iter()
            .filter_map(|(label, area, xpath, kind)| {
                match FieldDescriptor::new(*label, *area, xpath, *kind) {
                    Ok(descriptor) => Some(descriptor),
                    Err(err) => {
                        warn!(field = label, error = %err, "skipping built-in field");
                        None
                    }
                }
            })
            .collect();
        Self { fields }
    }

    /// Load a table from a JSON array of `{label, type, xpath, xpathType}`.
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        let records: Vec<DescriptorRecord> = serde_json::from_str(json)
            .map_err(|err| ArchiveError::Config(format!("field table: {err}")))?;
        let fields = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_descriptor(index))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(fields = fields.len(), "loaded field table from json");
        Ok(Self { fields })
    }

    /// Load a table from `<metadata label=".." type=".." xpath=".." xpathType=".."/>`
    /// elements. They are taken from the first `basexMetadataList` element when
    /// the document has one, otherwise from the children of the root element.
    pub fn from_xml_config(xml: &str) -> Result<Self, ArchiveError> {
        let doc = ead_xml::parse(xml)?;
        let root = doc.root();
        let container = std::iter::once(root)
            .chain(doc.descendants(root))
            .find(|node| {
                doc.element(*node)
                    .map(|element| element.name.local == "basexMetadataList")
                    .unwrap_or(false)
            })
            .unwrap_or(root);

        let mut fields = Vec::new();
        for (index, node) in doc.children_named(container, None, "metadata").into_iter().enumerate() {
            let missing = |what: &str| {
                ArchiveError::Config(format!("metadata entry {index}: missing '{what}'"))
            };
            let label = doc.attribute(node, "label").ok_or_else(|| missing("label"))?;
            let raw_type = doc.attribute(node, "type").ok_or_else(|| missing("type"))?;
            let area_type = raw_type.trim().parse::<i32>().map_err(|_| {
                ArchiveError::Config(format!(
                    "metadata entry {index}: type '{raw_type}' is not an integer"
                ))
            })?;
            let xpath = doc.attribute(node, "xpath").ok_or_else(|| missing("xpath"))?;
            let kind = doc
                .attribute(node, "xpathType")
                .map(XPathKind::parse_lenient)
                .unwrap_or_default();
            fields.push(FieldDescriptor::new(label, area_type, xpath, kind)?);
        }
        debug!(fields = fields.len(), "loaded field table from xml");
        Ok(Self { fields })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Single value of a metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FieldValue {
    pub value: String,
}

impl FieldValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Labelled metadata field extracted from a unit of description.
///
/// A field always holds at least one value. When the XPath matched nothing the
/// single value is empty, which keeps the field listed in its area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveMetadataField {
    pub label: String,
    pub area: Area,
    pub xpath: String,
    pub kind: XPathKind,
    pub values: Vec<FieldValue>,
}

impl ArchiveMetadataField {
    /// Whether any value carries text.
    pub fn is_filled(&self) -> bool {
        self.values.iter().any(|value| !value.is_empty())
    }

    /// First non-empty value.
    pub fn first_value(&self) -> Option<&str> {
        self.values
            .iter()
            .find(|value| !value.is_empty())
            .map(|value| value.value.as_str())
    }
}
