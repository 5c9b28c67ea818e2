use store_server::{init_logger_with_file, Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    if config.is_production() {
        init_logger_with_file(&config.log_level, config.log_dir());
    } else {
        store_server::init_logger(&config.log_level);
    }

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "store server starting"
    );

    let state = ServerState::initialize(&config)?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
