mod config;
mod error;
mod logging;
mod models;
mod resource;
mod rest;

use tracing::info;

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    logging::init_tracing(&config);

    let store = models::connect_store(&config).await?;
    info!(backend = store.backend(), "Opened store");
    let handlers = resource::Handlers::new(store.clone());

    rest::dispatch_server(&config, handlers, store).await?;

    logging::shutdown_tracing();
    Ok(())
}
