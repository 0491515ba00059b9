#![cfg_attr(docsrs, feature(doc_cfg))]
//! Archive entry tree built from EAD finding aids.
//!
//! A finding aid is parsed by [`EadParser`] into an [`ArchiveTree`], an arena of
//! [`ArchiveEntry`] values addressed by [`NodeId`]. The tree carries the
//! descriptive metadata of every unit of description together with the UI
//! state used by a hierarchical browser: expansion, visibility and search
//! highlighting.

use ead_xml::XmlError;
use thiserror::Error;

pub mod entry;
pub mod field;
pub mod parser;
pub mod records;
pub mod resource;
mod search;
pub mod tree;
mod visibility;

pub use entry::{ArchiveEntry, NodeId, RecordLink};
pub use field::{
    Area, ArchiveMetadataField, FieldDescriptor, FieldTable, FieldValue, XPathKind,
};
pub use parser::EadParser;
pub use records::{
    load_associated_records, AssociatedRecord, AssociatedRecords, MapResolver, RecordResolver,
    ResolverError,
};
pub use resource::{
    distinct_database_names, id_for_name, list_resources, parse_database_listing,
    ArchiveResource,
};
pub use tree::ArchiveTree;

/// Error type produced by archive tree operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Loading or evaluating XML failed.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// The input does not satisfy the requirements of the operation.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// The field descriptor table or another configuration input is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// The search index backing record lookups failed.
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    /// No entry carries the requested identifier.
    #[error("entry not found: {0}")]
    EntryNotFound(String),
    /// The structural edit would break the tree shape.
    #[error("invalid move: {0}")]
    InvalidMove(String),
}
