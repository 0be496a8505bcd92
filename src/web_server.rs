use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware, web};
use sqlx::sqlite::SqlitePool;

use crate::config::{QuestionConfig, ServerConfig};
use crate::language::LanguageCatalog;
use crate::routes::{
    delete_approach_handler, get_approaches_handler, get_starter_handler, json_error_handler,
    post_approach_handler, post_run_handler, post_status_handler, put_approach_handler,
    query_error_handler,
};
use crate::sandbox::SandboxClient;
use crate::validation::SubmissionLimits;

/// Registers every route and the JSON/query error handlers.
///
/// Shared state is expected as `app_data` on the enclosing `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(get_approaches_handler)
        .service(post_approach_handler)
        .service(put_approach_handler)
        .service(delete_approach_handler)
        .service(post_status_handler)
        .service(get_starter_handler)
        .service(post_run_handler);
}

pub fn build_server(
    server_config: ServerConfig,
    db_pool: Arc<SqlitePool>,
    catalog: Arc<LanguageCatalog>,
    limits: SubmissionLimits,
    questions: Arc<QuestionConfig>,
    sandbox: Arc<SandboxClient>,
) -> std::io::Result<Server> {
    let db_pool = web::Data::from(db_pool);
    let catalog = web::Data::from(catalog);
    let limits = web::Data::new(limits);
    let questions = web::Data::from(questions);
    let sandbox = web::Data::from(sandbox);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(db_pool.clone())
            .app_data(catalog.clone())
            .app_data(limits.clone())
            .app_data(questions.clone())
            .app_data(sandbox.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((
        server_config
            .bind_address
            .unwrap_or("127.0.0.1".to_string()),
        server_config.bind_port.unwrap_or(12345),
    ))?
    .run();

    Ok(server)
}
