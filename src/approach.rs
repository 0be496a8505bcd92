use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content_size::content_size;

/// A user's saved attempt at a question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Approach {
    pub id: u32,
    pub user_id: u32,
    pub question_id: u32,
    pub text_content: String,
    pub code_content: String,
    /// Free-text label as submitted; canonicalized only when resolving.
    pub code_language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Approach {
    /// Derived on every read, never stored.
    pub fn content_size(&self) -> u64 {
        content_size(&self.text_content, &self.code_content)
    }

    pub fn to_record(&self) -> ApproachRecord {
        ApproachRecord {
            id: self.id,
            user_id: self.user_id,
            question_id: self.question_id,
            text_content: self.text_content.clone(),
            code_content: self.code_content.clone(),
            code_language: self.code_language.clone(),
            content_size: self.content_size(),
            created_time: self.created_at,
            updated_time: self.updated_at,
        }
    }
}

/// Content a user intends to submit, either as a new approach or as an edit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub code_content: String,
}

impl Candidate {
    pub fn new(text_content: impl Into<String>, code_content: impl Into<String>) -> Self {
        Self {
            text_content: text_content.into(),
            code_content: code_content.into(),
        }
    }

    pub fn content_size(&self) -> u64 {
        content_size(&self.text_content, &self.code_content)
    }
}

/// Body of create and update requests.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApproachSubmission {
    #[serde(default)]
    pub text_content: String,
    pub code_content: String,
    pub code_language: String,
}

impl ApproachSubmission {
    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.text_content.clone(), self.code_content.clone())
    }
}

/// Wire form of an approach, including its derived size.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApproachRecord {
    pub id: u32,
    pub user_id: u32,
    pub question_id: u32,
    pub text_content: String,
    pub code_content: String,
    pub code_language: String,
    pub content_size: u64,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
}
