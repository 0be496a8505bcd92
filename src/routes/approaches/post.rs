use super::*;
use crate::validation::validate;

#[post("/questions/{qid}/approaches")]
pub async fn post_approach_handler(
    identity: Identity,
    pool: web::Data<SqlitePool>,
    questions: web::Data<QuestionConfig>,
    limits: web::Data<SubmissionLimits>,
    path: web::Path<(u32,)>,
    body: web::Json<ApproachSubmission>,
) -> impl Responder {
    let question_id = path.into_inner().0;
    let user_id = identity.user_id();
    if find_question(&questions, question_id).is_none() {
        return question_not_found(question_id);
    }

    // Quota check and insert share one transaction so concurrent creates
    // cannot both pass against the same count
    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            log::error!("Failed to begin transaction: {e}");
            return external_error();
        }
    };

    let existing = match db::list_approaches_tx(tx.as_mut(), user_id, question_id).await {
        Ok(existing) => existing,
        Err(e) => {
            log::error!("Failed to load approaches of user {user_id}: {e}");
            return external_error();
        }
    };

    let verdict = validate(&body.candidate(), &existing, None, &limits);
    if !verdict.valid {
        log::info!(
            "Rejected approach from user {user_id} on question {question_id}: {:?}",
            verdict.messages()
        );
        return rejection(&verdict);
    }

    let approach = match db::create_approach_tx(tx.as_mut(), user_id, question_id, &body).await {
        Ok(approach) => approach,
        Err(e) => {
            log::error!("Failed to insert approach into database: {e}");
            return external_error();
        }
    };

    if let Err(e) = tx.commit().await {
        log::error!("Failed to commit approach of user {user_id}: {e}");
        return external_error();
    }

    log::info!("Created approach {} for user {user_id}", approach.id);
    HttpResponse::Ok().json(SavedApproach::new(&approach, &verdict))
}
