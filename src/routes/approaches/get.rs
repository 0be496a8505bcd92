use super::*;

#[get("/questions/{qid}/approaches")]
pub async fn get_approaches_handler(
    identity: Identity,
    pool: web::Data<SqlitePool>,
    questions: web::Data<QuestionConfig>,
    path: web::Path<(u32,)>,
) -> impl Responder {
    let question_id = path.into_inner().0;
    if find_question(&questions, question_id).is_none() {
        return question_not_found(question_id);
    }

    match db::list_approaches(identity.user_id(), question_id, pool.into_inner()).await {
        Ok(approaches) => HttpResponse::Ok().json(
            approaches
                .iter()
                .map(Approach::to_record)
                .collect::<Vec<ApproachRecord>>(),
        ),
        Err(e) => {
            log::error!("Failed to list approaches for question {question_id}: {e}");
            external_error()
        }
    }
}
