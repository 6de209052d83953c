//! In-memory template store.

use super::{StoreError, StoredCandidate, TemplateStore};
use crate::device::Template;
use crate::matching::CandidateId;

/// Fixed list of enrolled templates.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    rows: Vec<StoredCandidate>,
}

impl MemoryTemplateStore {
    pub fn new(rows: Vec<StoredCandidate>) -> Self {
        Self { rows }
    }

    /// Adds a template, encoding it for storage.
    pub fn enroll(&mut self, id: CandidateId, template: &Template) {
        self.rows.push(StoredCandidate::new(id, template.to_base64()));
    }

    /// Number of enrolled rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing is enrolled.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn load_candidates(&self) -> Result<Vec<StoredCandidate>, StoreError> {
        Ok(self.rows.clone())
    }
}
