use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approach::{Approach, Candidate};
use crate::quota::{QuotaLimits, QuotaStatus, Severity, classify};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SubmissionLimits {
    #[serde(flatten)]
    pub quota: QuotaLimits,
    /// Characters
    pub text_max_length: usize,
    /// Characters
    pub code_max_length: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Code must not be empty.")]
    EmptyCode,
    #[error("Description is too long: {length}/{max} characters.")]
    TextTooLong { length: usize, max: usize },
    #[error("Code is too long: {length}/{max} characters.")]
    CodeTooLong { length: usize, max: usize },
    #[error("{0}")]
    Quota(String),
}

impl SubmissionError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::Quota(_))
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub errors: Vec<SubmissionError>,
    /// Quota status computed along the way, kept so callers can show warnings
    pub quota: QuotaStatus,
}

impl Verdict {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Runs every submission check and collects all failures.
pub fn validate(
    candidate: &Candidate,
    existing: &[Approach],
    exclude_approach_id: Option<u32>,
    limits: &SubmissionLimits,
) -> Verdict {
    let mut errors = Vec::new();

    if candidate.code_content.trim().is_empty() {
        errors.push(SubmissionError::EmptyCode);
    }

    let text_length = candidate.text_content.chars().count();
    if text_length > limits.text_max_length {
        errors.push(SubmissionError::TextTooLong {
            length: text_length,
            max: limits.text_max_length,
        });
    }

    let code_length = candidate.code_content.chars().count();
    if code_length > limits.code_max_length {
        errors.push(SubmissionError::CodeTooLong {
            length: code_length,
            max: limits.code_max_length,
        });
    }

    let quota = classify(existing, candidate, exclude_approach_id, &limits.quota);
    if quota.severity() == Severity::Error {
        errors.push(SubmissionError::Quota(quota.message()));
    }

    Verdict {
        valid: errors.is_empty(),
        errors,
        quota,
    }
}
