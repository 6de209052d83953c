//! 1:N template matching.

use super::{CandidateId, MatchCandidate};
use crate::device::{DeviceError, Template};
use serde::{Deserialize, Serialize};

/// Device-family matching primitive.
pub trait TemplateMatcher {
    /// Compares two templates and returns a similarity score.
    ///
    /// Any strictly positive score is a match.
    fn match_templates(
        &self,
        captured: &Template,
        candidate: &Template,
    ) -> Result<i32, DeviceError>;
}

/// How far the scan goes once a candidate matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Stop at the first candidate with a positive score.
    #[default]
    #[serde(alias = "first")]
    FirstMatch,
    /// Scan every candidate and keep the highest positive score.
    /// Ties go to the earlier candidate.
    #[serde(alias = "best")]
    BestMatch,
}

/// A successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Identifier of the matched candidate.
    pub candidate_id: CandidateId,
    /// Score reported by the matcher.
    pub score: i32,
}

/// Result of scanning a candidate sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchScan {
    /// The accepted match, if any.
    pub outcome: Option<MatchOutcome>,
    /// Candidates handed to the matcher.
    pub compared: usize,
    /// Candidates whose comparison failed and counted as non-matches.
    pub failures: usize,
}

/// Scans candidates with a device matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
    policy: MatchPolicy,
}

impl MatchEngine {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    /// Returns the scan policy.
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Finds the candidate matching `captured`, if any.
    pub fn find_match<M, I>(
        &self,
        matcher: &M,
        captured: &Template,
        candidates: I,
    ) -> Option<MatchOutcome>
    where
        M: TemplateMatcher + ?Sized,
        I: IntoIterator<Item = MatchCandidate>,
    {
        self.scan(matcher, captured, candidates).outcome
    }

    /// Scans candidates in the supplied order.
    ///
    /// A matcher failure on one candidate is logged and treated as a
    /// non-match for that candidate; the scan continues.
    pub fn scan<M, I>(&self, matcher: &M, captured: &Template, candidates: I) -> MatchScan
    where
        M: TemplateMatcher + ?Sized,
        I: IntoIterator<Item = MatchCandidate>,
    {
        let mut scan = MatchScan::default();

        for candidate in candidates {
            scan.compared += 1;

            let score = match matcher.match_templates(captured, &candidate.template) {
                Ok(score) => score,
                Err(e) => {
                    scan.failures += 1;
                    tracing::warn!(
                        candidate = candidate.id,
                        error = %e,
                        "Template comparison failed, treating as non-match"
                    );
                    continue;
                }
            };

            if score <= 0 {
                continue;
            }

            let better = scan.outcome.map_or(true, |best| score > best.score);
            if better {
                scan.outcome = Some(MatchOutcome {
                    candidate_id: candidate.id,
                    score,
                });
            }

            if self.policy == MatchPolicy::FirstMatch {
                break;
            }
        }

        tracing::debug!(
            policy = ?self.policy,
            compared = scan.compared,
            failures = scan.failures,
            matched = scan.outcome.map(|m| m.candidate_id),
            "Candidate scan finished"
        );

        scan
    }
}
