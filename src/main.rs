use anyhow::Result;
use geoflag::api::rest::RestApi;
use geoflag::config::{self, StoreBackend};
use geoflag::db::DatabaseService;
use geoflag::security::SecurityService;
use geoflag::services::game_codes::WordPairGenerator;
use geoflag::services::{GameService, SystemClock};
use geoflag::store::{GameStore, MemoryStore, PgStore};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

const CONFIG_ENV: &str = "GEOFLAG_CONFIG";

async fn run_app() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from);
    let config = config::load_config(config_path.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Starting geoflag game server");
    match &config_path {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file given, using defaults"),
    }

    let store: Arc<dyn GameStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let database = DatabaseService::new(&config.database).await?;
            Arc::new(PgStore::new(database.pool.clone()))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store, games are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let games = Arc::new(GameService::new(
        store,
        Arc::new(SystemClock),
        SecurityService::new(config.security.clone()),
        Arc::new(WordPairGenerator),
        config.game.clone(),
    ));

    let http_server = RestApi::new(&config.api, games);
    http_server.run().await?;

    info!("Shut down cleanly");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}
