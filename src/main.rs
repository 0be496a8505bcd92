use std::sync::Arc;

use clap::Parser;

use approaches::config::CliArgs;
use approaches::database as db;
use approaches::sandbox::SandboxClient;
use approaches::web_server::build_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let db_path = db::get_db_path()?;
    let cli = CliArgs::parse();

    let config = cli.to_config()?;
    let catalog = config.catalog()?;
    log::info!(
        "Loaded {} languages, default {}",
        catalog.profiles().len(),
        catalog.default_language().name
    );

    if cli.flush_data {
        db::remove_db(&db_path);
    }

    let db_pool = db::init_db(&db_path).await?;
    let sandbox = SandboxClient::new(&config.sandbox)?;

    // ======= PREPARATION END, EXECUTION START =======

    let server = build_server(
        config.server,
        Arc::new(db_pool),
        Arc::new(catalog),
        config.quota,
        Arc::new(config.questions),
        Arc::new(sandbox),
    )?;

    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    // ===== EXECUTION END, WAITING FOR SHUTDOWN ======

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
    }

    server_handle.stop(true).await;

    log::info!("Shutdown complete");
    Ok(())
}
