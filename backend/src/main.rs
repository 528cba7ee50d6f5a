//! Service entry-point: loads settings, prepares the database and serves HTTP.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use phonebook::Settings;
use phonebook::outbound::persistence::{DbPool, bootstrap};
use server::{ServerConfig, create_server};

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

/// Run migrations and seeds on a blocking thread before serving.
async fn prepare_database(settings: &Settings) -> io::Result<()> {
    let database_url = settings.database_url().map_err(io::Error::other)?.to_owned();
    let seeders_dir = settings.seeders_dir.clone();
    let report = web::block(move || bootstrap(&database_url, seeders_dir.as_deref()))
        .await
        .map_err(|err| io::Error::other(format!("bootstrap task failed: {err}")))?
        .map_err(|err| io::Error::other(format!("database bootstrap failed: {err}")))?;
    info!(
        migrations = report.migrations.len(),
        seeds = report.seeds.len(),
        "database ready"
    );
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let settings = Settings::load()
        .map_err(|err| io::Error::other(format!("failed to load configuration: {err}")))?;
    info!(environment = settings.environment(), "starting phonebook");

    prepare_database(&settings).await?;

    let pool_config = settings.pool_config().map_err(io::Error::other)?;
    let pool = DbPool::new(pool_config)
        .await
        .map_err(|err| io::Error::other(format!("database pool unavailable: {err}")))?;

    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let config = ServerConfig::new(bind_addr, pool, settings.actor());
    create_server(config)?.await
}
