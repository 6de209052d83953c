//! Read-only source of enrolled templates.
//!
//! Stores return rows in their base64 transport encoding. Decoding happens
//! in the identify workflow so a corrupt row fails the request as a whole.

mod memory;
mod sqlite;

pub use memory::MemoryTemplateStore;
pub use sqlite::{SqliteTemplateStore, StoreConfig};

use crate::matching::CandidateId;
use thiserror::Error;

/// Errors raised while reading enrolled templates.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("template store is not configured")]
    NotConfigured,
    #[error("cannot open template store {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("template query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("template store unavailable: {0}")]
    Unavailable(String),
}

/// One enrolled row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCandidate {
    /// Store identifier of the enrolled person.
    pub id: CandidateId,
    /// Base64-encoded template.
    pub encoded_template: String,
}

impl StoredCandidate {
    pub fn new(id: CandidateId, encoded_template: impl Into<String>) -> Self {
        Self {
            id,
            encoded_template: encoded_template.into(),
        }
    }
}

/// Read-only, request-scoped access to enrolled templates.
pub trait TemplateStore: Send + Sync {
    /// Loads every enrolled candidate, in store order.
    fn load_candidates(&self) -> Result<Vec<StoredCandidate>, StoreError>;
}
