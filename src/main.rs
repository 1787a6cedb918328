use serenity::prelude::*;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod credentials;
pub mod discord;
pub mod error;
pub mod event;
pub mod firestore;
pub mod stats;
pub mod store;

use config::Config;
use error::{AppError, ConfigError};

const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let credential = credentials::resolve(&config, &http).await?;
    let project_id = config
        .project_id
        .clone()
        .or_else(|| credential.project_id().map(str::to_string))
        .ok_or(ConfigError::MissingProjectId)?;

    tracing::info!(project = %project_id, "firestore initialised");

    let store = firestore::Firestore::new(
        http.clone(),
        credentials::TokenSource::new(credential, http),
        &project_id,
        config.emulator_host.as_deref(),
    );

    let (writer, events) = stats::Writer::init(store);
    tokio::spawn(async move { writer.listen().await });

    let mut client = Client::builder(&config.discord_token, discord::intents())
        .event_handler(discord::Handler::new(events))
        .await?;

    client.start().await?;

    Ok(())
}
