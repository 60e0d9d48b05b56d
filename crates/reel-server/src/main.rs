use reel_core::{init_logging, init_logging_json, App, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    if config.is_production() {
        init_logging_json();
    } else {
        init_logging();
    }
    tracing::info!(
        environment = %config.environment,
        "Starting Reel with the {:?} store",
        config.store
    );

    let app = App::from_config(config).await?;
    app.run().await?;

    Ok(())
}
