//! Finding aids stored in a tree database.

use std::future::Future;

use ead_xml::{XmlDocument, XmlError, DATABASE_LISTING_PATH};
use serde::Serialize;
use tracing::{debug, error};

use crate::ArchiveError;

/// One finding aid of a tree database listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveResource {
    pub database_name: String,
    pub resource_name: String,
    pub last_updated: Option<String>,
    pub size: Option<String>,
}

impl ArchiveResource {
    pub fn new(database_name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            resource_name: resource_name.into(),
            last_updated: None,
            size: None,
        }
    }

    /// `"<database> - <resource>"`, the name shown when choosing an archive.
    pub fn combined_name(&self) -> String {
        format!("{} - {}", self.database_name, self.resource_name)
    }

    /// Resource name without its `.xml` suffix.
    pub fn id(&self) -> String {
        id_for_name(&self.resource_name)
    }
}

/// Read a `<databases>` listing.
///
/// Each `<database>` contributes one resource per child of its `<details>`
/// element; the child text is the resource name and the `modified-date` and
/// `size` attributes are copied when present.
pub fn parse_database_listing(doc: &XmlDocument) -> Vec<ArchiveResource> {
    let mut out = Vec::new();
    for database in doc.children_named(doc.root(), None, "database") {
        let Some(name) = doc.child_text(database, None, "name") else {
            continue;
        };
        let name = name.trim();
        let Some(details) = doc.child(database, None, "details") else {
            debug!(database = name, "database without details");
            continue;
        };
        for resource in doc.child_elements(details) {
            out.push(ArchiveResource {
                database_name: name.to_string(),
                resource_name: doc.string_value(resource).trim().to_string(),
                last_updated: doc.attribute(resource, "modified-date").map(str::to_string),
                size: doc.attribute(resource, "size").map(str::to_string),
            });
        }
    }
    out
}

/// Fetch and read the database listing of a tree database.
///
/// An empty body yields an empty list. A body that is not well-formed XML is
/// logged and also yields an empty list; transport failures propagate.
pub async fn list_resources<F, Fut>(mut fetch: F) -> Result<Vec<ArchiveResource>, ArchiveError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, XmlError>>,
{
    let body = fetch(DATABASE_LISTING_PATH.to_string()).await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match ead_xml::parse(&body) {
        Ok(doc) => {
            let resources = parse_database_listing(&doc);
            debug!(resources = resources.len(), "listed archive resources");
            Ok(resources)
        }
        Err(err) => {
            error!(error = %err, "database listing is not readable");
            Ok(Vec::new())
        }
    }
}

/// Database names in first-seen order without duplicates.
pub fn distinct_database_names(resources: &[ArchiveResource]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for resource in resources {
        if !names.contains(&resource.database_name) {
            names.push(resource.database_name.clone());
        }
    }
    names
}

/// Strip every `.xml` from `name`, ignoring case.
pub fn id_for_name(name: &str) -> String {
    const SUFFIX: &str = ".xml";
    let lower = name.to_ascii_lowercase();
    let mut out = String::with_capacity(name.len());
    let mut copied = 0;
    while let Some(pos) = lower[copied..].find(SUFFIX) {
        let start = copied + pos;
        out.push_str(&name[copied..start]);
        copied = start + SUFFIX.len();
    }
    out.push_str(&name[copied..]);
    out
}
