use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use sqlx::sqlite::SqlitePool;

use super::{Identity, external_error, find_question, question_not_found};
use crate::approach::Candidate;
use crate::config::QuestionConfig;
use crate::database as db;
use crate::language::{LanguageCatalog, resolve_for_language, resolve_initial};
use crate::quota::classify;
use crate::validation::SubmissionLimits;

#[derive(Deserialize, Debug)]
pub struct StatusRequest {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Set when the draft replaces an existing approach
    #[serde(default)]
    pub exclude_approach_id: Option<u32>,
}

/// Quota status for a draft, recomputed by the editor as the user types.
#[post("/questions/{qid}/status")]
pub async fn post_status_handler(
    identity: Identity,
    pool: web::Data<SqlitePool>,
    questions: web::Data<QuestionConfig>,
    limits: web::Data<SubmissionLimits>,
    path: web::Path<(u32,)>,
    body: web::Json<StatusRequest>,
) -> impl Responder {
    let question_id = path.into_inner().0;
    if find_question(&questions, question_id).is_none() {
        return question_not_found(question_id);
    }

    match db::list_approaches(identity.user_id(), question_id, pool.into_inner()).await {
        Ok(existing) => {
            let status = classify(
                &existing,
                &body.candidate,
                body.exclude_approach_id,
                &limits.quota,
            );
            HttpResponse::Ok().json(status.view())
        }
        Err(e) => {
            log::error!("Failed to load approaches for status: {e}");
            external_error()
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct StarterQuery {
    pub language: Option<String>,
}

/// Language and code an editor should open with.
///
/// Without `language` this is the first-load resolution; with it, the code
/// to show after switching. Unknown labels fall back to the default language.
#[get("/questions/{qid}/starter")]
pub async fn get_starter_handler(
    identity: Identity,
    pool: web::Data<SqlitePool>,
    questions: web::Data<QuestionConfig>,
    catalog: web::Data<LanguageCatalog>,
    path: web::Path<(u32,)>,
    query: web::Query<StarterQuery>,
) -> impl Responder {
    let question_id = path.into_inner().0;
    let Some(question) = find_question(&questions, question_id) else {
        return question_not_found(question_id);
    };

    let prior = match db::list_approaches(identity.user_id(), question_id, pool.into_inner()).await
    {
        Ok(prior) => prior,
        Err(e) => {
            log::error!("Failed to load approaches for starter code: {e}");
            return external_error();
        }
    };

    let resolution = match query.language.as_deref() {
        Some(label) => {
            let selected = catalog.canonicalize_or_default(label);
            resolve_for_language(selected, &prior, &question.snippets, &catalog)
        }
        None => resolve_initial(&prior, &question.snippets, &catalog),
    };

    HttpResponse::Ok().json(resolution)
}
