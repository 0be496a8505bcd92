use super::*;
use crate::validation::validate;

#[put("/approaches/{id}")]
pub async fn put_approach_handler(
    identity: Identity,
    pool: web::Data<SqlitePool>,
    limits: web::Data<SubmissionLimits>,
    path: web::Path<(u32,)>,
    body: web::Json<ApproachSubmission>,
) -> impl Responder {
    let approach_id = path.into_inner().0;
    let current = match owned_approach(approach_id, identity, &pool).await {
        Ok(approach) => approach,
        Err(response) => return response,
    };

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            log::error!("Failed to begin transaction: {e}");
            return external_error();
        }
    };

    let existing =
        match db::list_approaches_tx(tx.as_mut(), current.user_id, current.question_id).await {
            Ok(existing) => existing,
            Err(e) => {
                log::error!("Failed to load approaches of user {}: {e}", current.user_id);
                return external_error();
            }
        };

    // The approach being edited is replaced, not added
    let verdict = validate(&body.candidate(), &existing, Some(approach_id), &limits);
    if !verdict.valid {
        return rejection(&verdict);
    }

    let approach = match db::update_approach_tx(tx.as_mut(), approach_id, &body).await {
        Ok(approach) => approach,
        Err(sqlx::Error::RowNotFound) => {
            // Deleted between the ownership check and the update
            return HttpResponse::NotFound().json(ErrorResponseWithMessage {
                reason: "ERR_NOT_FOUND",
                code: 3,
                message: format!("Approach {approach_id} not found."),
            });
        }
        Err(e) => {
            log::error!("Failed to update approach {approach_id}: {e}");
            return external_error();
        }
    };

    if let Err(e) = tx.commit().await {
        log::error!("Failed to commit update of approach {approach_id}: {e}");
        return external_error();
    }

    log::info!("Updated approach {approach_id}");
    HttpResponse::Ok().json(SavedApproach::new(&approach, &verdict))
}
