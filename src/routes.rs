mod approaches;
mod questions;
mod run;

pub use approaches::*;
pub use questions::*;
pub use run::*;

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::config::{OneQuestionConfig, QuestionConfig};

/// Header carrying the caller's user id, set by the authenticating proxy.
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Serialize)]
struct ErrorResponse {
    reason: &'static str,
    code: u32,
}

#[derive(Serialize)]
struct ErrorResponseWithMessage {
    reason: &'static str,
    code: u32,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponseWithErrors {
    reason: &'static str,
    code: u32,
    message: String,
    errors: Vec<String>,
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponseWithMessage {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
        message: err.to_string(),
    });
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
    });
    InternalError::from_response(err, response).into()
}

fn external_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        reason: "ERR_EXTERNAL",
        code: 5,
    })
}

fn question_not_found(question_id: u32) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponseWithMessage {
        reason: "ERR_NOT_FOUND",
        code: 3,
        message: format!("Question {question_id} not found."),
    })
}

fn find_question(questions: &QuestionConfig, question_id: u32) -> Option<&OneQuestionConfig> {
    questions.iter().find(|q| q.id == question_id)
}

/// Authenticated caller, taken from the [`USER_ID_HEADER`] header.
///
/// Requests without a well-formed id are answered with 401 before the
/// handler body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub u32);

impl Identity {
    pub fn user_id(&self) -> u32 {
        self.0
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let parsed = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u32>().ok());

        ready(match parsed {
            Some(user_id) => Ok(Identity(user_id)),
            None => {
                log::debug!("Rejected {} {}: no identity", req.method(), req.path());
                let response = HttpResponse::Unauthorized().json(ErrorResponseWithMessage {
                    reason: "ERR_UNAUTHORIZED",
                    code: 7,
                    message: "Sign in to manage approaches.".to_string(),
                });
                Err(InternalError::from_response("missing user identity", response).into())
            }
        })
    }
}
