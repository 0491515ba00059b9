//! Load and navigate EAD finding-aid XML parsed with roxmltree.
//!
//! The crate provides a small arena DOM ([`XmlDocument`]), a compiled XPath
//! subset ([`XPath`]) and helpers to retrieve documents from a tree database
//! through a caller supplied fetch closure.

use std::future::Future;

use thiserror::Error;
use tracing::debug;

pub mod dom;
pub mod xpath;

pub use dom::{parse, Attribute, Element, ExpandedName, NodeKind, XmlDocument, XmlNodeId};
pub use xpath::{Namespaces, XPath, XPathError, XPathItem};

/// Namespace of EAD 2002 documents.
pub const EAD_NAMESPACE: &str = "urn:isbn:1-931666-22-9";

/// Path of the database listing relative to the tree database base URL.
pub const DATABASE_LISTING_PATH: &str = "databases";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("invalid document: {0}")]
    Invalid(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("xpath: {0}")]
    XPath(#[from] XPathError),
}

/// Path of a stored finding aid relative to the tree database base URL.
///
/// Both segments are percent-encoded.
pub fn resource_path(database: &str, resource: &str) -> String {
    format!(
        "db/{}/{}",
        urlencoding::encode(database),
        urlencoding::encode(resource)
    )
}

/// Retrieve and parse a finding aid stored as `resource` in `database`.
///
/// The closure receives the path relative to the tree database base URL and
/// must return the response body. It owns the transport; failures should be
/// reported as [`XmlError::Transport`].
pub async fn fetch_document<F, Fut>(
    mut fetch: F,
    database: &str,
    resource: &str,
) -> Result<XmlDocument, XmlError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, XmlError>>,
{
    if database.trim().is_empty() || resource.trim().is_empty() {
        return Err(XmlError::Invalid(
            "database and resource must be provided before loading".into(),
        ));
    }
    let path = resource_path(database, resource);
    debug!(%path, "fetching finding aid");
    let body = fetch(path).await?;
    parse(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths_are_encoded() {
        assert_eq!(resource_path("archive", "fonds.xml"), "db/archive/fonds.xml");
        assert_eq!(
            resource_path("my archive", "a/b.xml"),
            "db/my%20archive/a%2Fb.xml"
        );
    }

    #[tokio::test]
    async fn fetch_document_requests_resource_path() {
        let doc = fetch_document(
            |path| async move {
                if path == "db/archive/fonds.xml" {
                    Ok(r#"<ead xmlns="urn:isbn:1-931666-22-9"/>"#.to_string())
                } else {
                    Err(XmlError::Transport(format!("unexpected path {path}")))
                }
            },
            "archive",
            "fonds.xml",
        )
        .await
        .expect("load document");
        let root = doc.element(doc.root()).unwrap();
        assert!(root.name.matches(Some(EAD_NAMESPACE), "ead"));
    }

    #[tokio::test]
    async fn fetch_document_reports_failures() {
        let err = fetch_document(
            |_| async { Err(XmlError::Transport("connection refused".into())) },
            "archive",
            "fonds.xml",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, XmlError::Transport(_)));

        let err = fetch_document(|_| async { Ok("<broken".to_string()) }, "archive", "x.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, XmlError::Xml(_)));

        let err = fetch_document(|_| async { Ok(String::new()) }, " ", "x.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, XmlError::Invalid(_)));
    }
}
