use serde::{Deserialize, Serialize};

use crate::approach::{Approach, Candidate};

fn default_warning_ratio() -> f64 {
    0.8
}

/// Per-user, per-question quota.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct QuotaLimits {
    pub max_approaches: u32,
    /// Bytes, as measured by [`crate::content_size::content_size`]
    pub max_total_size: u64,
    /// Fraction of `max_total_size` at which a warning is issued (inclusive)
    #[serde(default = "default_warning_ratio")]
    pub warning_ratio: f64,
}

impl QuotaLimits {
    pub fn new(max_approaches: u32, max_total_size: u64) -> Self {
        Self {
            max_approaches,
            max_total_size,
            warning_ratio: default_warning_ratio(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Eligibility of a candidate submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaStatus {
    /// Well within limits
    Available {
        used: u32,
        max_approaches: u32,
        available: u64,
    },
    /// Allowed, but the projected size is at or above the warning ratio
    NearSizeLimit { remaining: u64 },
    ApproachLimitReached { max_approaches: u32 },
    SizeLimitExceeded { projected: u64, max_total_size: u64 },
}

impl QuotaStatus {
    pub fn can_submit(&self) -> bool {
        matches!(self, Self::Available { .. } | Self::NearSizeLimit { .. })
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Available { .. } => Severity::Info,
            Self::NearSizeLimit { .. } => Severity::Warning,
            Self::ApproachLimitReached { .. } | Self::SizeLimitExceeded { .. } => Severity::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Available {
                used,
                max_approaches,
                available,
            } => format!("{used}/{max_approaches} approaches used, {available} bytes available."),
            Self::NearSizeLimit { remaining } => {
                format!("Approaching size limit, {remaining} bytes remaining.")
            }
            Self::ApproachLimitReached { max_approaches } => format!(
                "Approach limit reached ({max_approaches}/{max_approaches}). Delete an approach to add a new one."
            ),
            Self::SizeLimitExceeded {
                projected,
                max_total_size,
            } => format!("Size limit exceeded: {projected}/{max_total_size} bytes."),
        }
    }

    pub fn view(&self) -> StatusView {
        StatusView {
            message: self.message(),
            kind: self.severity(),
            can_submit: self.can_submit(),
        }
    }
}

/// What the UI renders next to the submit control.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusView {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Severity,
    pub can_submit: bool,
}

/// Classifies whether `candidate` may be submitted alongside `existing`.
///
/// When `exclude_approach_id` names the approach being edited, that approach's
/// stored size and slot are left out, so an edit is measured as a replacement
/// rather than an addition.
pub fn classify(
    existing: &[Approach],
    candidate: &Candidate,
    exclude_approach_id: Option<u32>,
    limits: &QuotaLimits,
) -> QuotaStatus {
    let others: Vec<&Approach> = existing
        .iter()
        .filter(|a| Some(a.id) != exclude_approach_id)
        .collect();

    let new_count = others.len() + usize::from(exclude_approach_id.is_none());
    if new_count > limits.max_approaches as usize {
        return QuotaStatus::ApproachLimitReached {
            max_approaches: limits.max_approaches,
        };
    }

    let projected: u64 =
        others.iter().map(|a| a.content_size()).sum::<u64>() + candidate.content_size();
    if projected > limits.max_total_size {
        return QuotaStatus::SizeLimitExceeded {
            projected,
            max_total_size: limits.max_total_size,
        };
    }

    let remaining = limits.max_total_size - projected;
    if limits.max_total_size == 0
        || projected as f64 / limits.max_total_size as f64 >= limits.warning_ratio
    {
        return QuotaStatus::NearSizeLimit { remaining };
    }

    QuotaStatus::Available {
        used: new_count as u32,
        max_approaches: limits.max_approaches,
        available: remaining,
    }
}
