//! Identification against enrolled templates.
//!
//! Candidates are compared one by one with the device family's matching
//! primitive. The default policy accepts the earliest candidate with a
//! strictly positive score; [`MatchPolicy::BestMatch`] keeps scanning for
//! the highest score instead.

mod engine;

pub use engine::{MatchEngine, MatchOutcome, MatchPolicy, MatchScan, TemplateMatcher};

use crate::device::Template;

/// Identifier of an enrolled person in the template store.
pub type CandidateId = i64;

/// An enrolled (id, template) pair.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// Store identifier.
    pub id: CandidateId,
    /// Decoded enrolled template.
    pub template: Template,
}

impl MatchCandidate {
    pub fn new(id: CandidateId, template: Template) -> Self {
        Self { id, template }
    }
}
