//! Links between archive entries and digitised records of the search index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::entry::{NodeId, RecordLink};
use crate::tree::ArchiveTree;
use crate::ArchiveError;

/// Failure reported by a [`RecordResolver`].
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The index could not be reached. Lookups degrade to "no record".
    #[error("search index unreachable: {0}")]
    Unreachable(String),
    /// The index rejected the query.
    #[error("search index query failed: {0}")]
    Query(String),
}

/// Record associated with an archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedRecord {
    pub pi: String,
    #[serde(default)]
    pub has_image: bool,
}

/// Records keyed by archive entry id.
pub type AssociatedRecords = HashMap<String, AssociatedRecord>;

/// Access to the search index holding digitised records.
pub trait RecordResolver {
    /// Every record that references an archive entry.
    fn associated_records(&self) -> Result<AssociatedRecords, ResolverError>;
    /// Persistent identifier of the record referencing `entry_id`.
    fn find_record_pi(&self, entry_id: &str) -> Result<Option<String>, ResolverError>;
}

/// Bulk load the record map used while parsing.
///
/// Without a resolver, or when the index is unreachable, the map is empty so
/// that trees can still be built. Query errors propagate.
pub fn load_associated_records(
    resolver: Option<&dyn RecordResolver>,
) -> Result<AssociatedRecords, ResolverError> {
    let Some(resolver) = resolver else {
        return Ok(AssociatedRecords::new());
    };
    match resolver.associated_records() {
        Ok(records) => {
            debug!(records = records.len(), "loaded associated records");
            Ok(records)
        }
        Err(ResolverError::Unreachable(reason)) => {
            warn!(%reason, "search index unreachable, building trees without records");
            Ok(AssociatedRecords::new())
        }
        Err(err) => Err(err),
    }
}

/// Resolver backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    records: AssociatedRecords,
}

impl MapResolver {
    pub fn new(records: AssociatedRecords) -> Self {
        Self { records }
    }

    /// Load `{"<entry id>": {"pi": "..", "has_image": true}, ..}`.
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        let records: AssociatedRecords = serde_json::from_str(json)
            .map_err(|err| ArchiveError::Config(format!("record map: {err}")))?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &AssociatedRecords {
        &self.records
    }
}

impl RecordResolver for MapResolver {
    fn associated_records(&self) -> Result<AssociatedRecords, ResolverError> {
        Ok(self.records.clone())
    }

    fn find_record_pi(&self, entry_id: &str) -> Result<Option<String>, ResolverError> {
        Ok(self
            .records
            .get(entry_id)
            .map(|record| record.pi.clone())
            .filter(|pi| !pi.is_empty()))
    }
}

impl ArchiveTree {
    /// Persistent identifier of the record associated with `node`.
    ///
    /// The first call asks `resolver` and caches the answer on the entry,
    /// including a negative one. An unreachable index is logged and leaves the
    /// entry unresolved so a later call retries; query errors propagate.
    pub fn associated_record_pi(
        &mut self,
        node: NodeId,
        resolver: &dyn RecordResolver,
    ) -> Result<Option<&str>, ArchiveError> {
        if !self[node].record.is_resolved() {
            let id = self[node].id.clone();
            match resolver.find_record_pi(&id) {
                Ok(pi) => {
                    let pi = pi.filter(|pi| !pi.is_empty());
                    debug!(entry = %id, found = pi.is_some(), "resolved associated record");
                    self[node].record = RecordLink::Resolved(pi);
                }
                Err(ResolverError::Unreachable(reason)) => {
                    error!(entry = %id, %reason, "search index unreachable, record lookup skipped");
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(self[node].record.pi())
    }
}
