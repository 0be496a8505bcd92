use actix_web::{HttpResponse, Responder, post, web};
use serde::Deserialize;
use serde_json::json;

use super::ErrorResponseWithMessage;
use crate::language::LanguageCatalog;
use crate::sandbox::{self, SandboxClient, prepare_run};

#[derive(Deserialize, Debug)]
pub struct RunRequest {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub stdin: String,
}

#[post("/run")]
pub async fn post_run_handler(
    catalog: web::Data<LanguageCatalog>,
    client: web::Data<SandboxClient>,
    body: web::Json<RunRequest>,
) -> impl Responder {
    let Some(language) = catalog.canonicalize(&body.language) else {
        return HttpResponse::NotFound().json(ErrorResponseWithMessage {
            reason: "ERR_NOT_FOUND",
            code: 3,
            message: format!("Language {:?} is not supported.", body.language),
        });
    };

    let request = match prepare_run(language, &body.code, &body.stdin) {
        Ok(request) => request,
        Err(required) => {
            log::debug!("Skipped {} run: input required", required.language);
            return HttpResponse::Ok().json(json!({
                "status": "input_required",
                "language": required.language,
                "message": required.message,
            }));
        }
    };

    let outcome = match sandbox::execute(&client, &request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Cannot run {} code: {e}", language.name);
            return HttpResponse::InternalServerError().json(ErrorResponseWithMessage {
                reason: "ERR_EXTERNAL",
                code: 5,
                message: "The code runner is not configured. Contact the administrator."
                    .to_string(),
            });
        }
    };
    log::info!("{} run finished: {}", language.name, outcome.headline());
    HttpResponse::Ok().json(outcome)
}
