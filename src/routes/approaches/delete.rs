use super::*;

#[delete("/approaches/{id}")]
pub async fn delete_approach_handler(
    identity: Identity,
    pool: web::Data<SqlitePool>,
    path: web::Path<(u32,)>,
) -> impl Responder {
    let approach_id = path.into_inner().0;
    if let Err(response) = owned_approach(approach_id, identity, &pool).await {
        return response;
    }

    match db::delete_approach(approach_id, pool.into_inner()).await {
        Ok(()) => {
            log::info!("Deleted approach {approach_id}");
            HttpResponse::Ok().finish()
        }
        Err(e) => {
            log::error!("Failed to delete approach {approach_id}: {e}");
            external_error()
        }
    }
}
