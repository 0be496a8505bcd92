mod delete;
mod get;
mod post;
mod put;

pub use delete::delete_approach_handler;
pub use get::get_approaches_handler;
pub use post::post_approach_handler;
pub use put::put_approach_handler;

use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use super::{
    ErrorResponseWithErrors, ErrorResponseWithMessage, Identity, external_error, find_question,
    question_not_found,
};
use crate::approach::{Approach, ApproachRecord, ApproachSubmission};
use crate::config::QuestionConfig;
use crate::database as db;
use crate::quota::StatusView;
use crate::validation::{SubmissionLimits, Verdict};

/// A stored approach with the quota status it leaves behind, so a save that
/// lands near the size limit still carries its warning.
#[derive(Serialize, Debug)]
pub struct SavedApproach {
    #[serde(flatten)]
    pub record: ApproachRecord,
    pub status: StatusView,
}

impl SavedApproach {
    fn new(approach: &Approach, verdict: &Verdict) -> Self {
        Self {
            record: approach.to_record(),
            status: verdict.quota.view(),
        }
    }
}

/// Response for a submission that failed validation.
///
/// Quota problems map to 403 only when they are the sole failure; any shape
/// problem makes the request a plain 400.
fn rejection(verdict: &Verdict) -> HttpResponse {
    let body = |reason: &'static str, code: u32| ErrorResponseWithErrors {
        reason,
        code,
        message: verdict.messages().join(" "),
        errors: verdict.messages(),
    };

    if verdict.errors.iter().all(|e| e.is_quota()) {
        HttpResponse::Forbidden().json(body("ERR_QUOTA_EXCEEDED", 8))
    } else {
        HttpResponse::BadRequest().json(body("ERR_INVALID_ARGUMENT", 1))
    }
}

/// Loads an approach and checks that `identity` owns it.
async fn owned_approach(
    id: u32,
    identity: Identity,
    pool: &web::Data<SqlitePool>,
) -> Result<Approach, HttpResponse> {
    match db::fetch_approach(id, pool.clone().into_inner()).await {
        Ok(approach) if approach.user_id == identity.user_id() => Ok(approach),
        Ok(_) => {
            log::info!("User {} denied access to approach {id}", identity.user_id());
            Err(HttpResponse::Forbidden().json(ErrorResponseWithMessage {
                reason: "ERR_FORBIDDEN",
                code: 4,
                message: format!("Approach {id} belongs to another user."),
            }))
        }
        Err(sqlx::Error::RowNotFound) => Err(HttpResponse::NotFound().json(
            ErrorResponseWithMessage {
                reason: "ERR_NOT_FOUND",
                code: 3,
                message: format!("Approach {id} not found."),
            },
        )),
        Err(e) => {
            log::error!("Failed to fetch approach {id}: {e}");
            Err(external_error())
        }
    }
}
