//! `edubot` binary: serves the WhatsApp webhook or seeds the catalog database.

mod routes;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use edubot_channels::WhatsAppChannel;
use edubot_core::catalog::{CatalogStore, FileCatalog, MySqlCatalog};
use edubot_core::{FallbackResponder, MessageResolver};
use edubot_types::config::BotConfig;
use edubot_types::config_loader::ConfigLoader;
use edubot_types::{CatalogSource, ChannelAdapter};

use crate::routes::AppState;

#[derive(Parser, Debug)]
#[command(name = "edubot")]
#[command(version, about = "WhatsApp course and FAQ assistant", long_about = None)]
struct Cli {
    /// YAML configuration file; environment variables override it.
    #[arg(long, short, global = true, env = "EDUBOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Serve the catalog from a YAML file instead of MySQL.
        #[arg(long)]
        catalog_file: Option<PathBuf>,
    },
    /// Create the catalog tables and load them from a YAML file.
    Seed {
        /// Seed file; defaults to `catalog.seed_file` from the configuration.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edubot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve { catalog_file: None }) {
        Command::Serve { catalog_file } => serve(config, catalog_file).await,
        Command::Seed { file } => seed(config, file).await,
    }
}

async fn serve(config: BotConfig, catalog_file: Option<PathBuf>) -> anyhow::Result<()> {
    info!(
        version = %config.app.version,
        commit = %config.app.short_commit(),
        "starting EduBot"
    );
    let missing = config.missing_settings();
    if !missing.is_empty() {
        warn!(missing = ?missing, "WhatsApp settings missing; replies cannot be delivered");
    }

    let (source, database): (Arc<dyn CatalogSource>, Option<Arc<MySqlCatalog>>) =
        match catalog_file {
            Some(path) => {
                info!(file = %path.display(), "serving catalog from file");
                (Arc::new(FileCatalog::new(path)), None)
            }
            None => {
                let db = Arc::new(
                    MySqlCatalog::connect_lazy(&config.database)
                        .context("invalid database settings")?,
                );
                (db.clone(), Some(db))
            }
        };

    let store = Arc::new(CatalogStore::new(source));
    let ready = Arc::new(AtomicBool::new(false));
    routes::track_readiness(&store, ready.clone());
    if let Err(e) = store.refresh().await {
        warn!(error = %e, "initial catalog load failed; serving with an empty catalog");
    }
    if config.catalog.refresh_interval_secs > 0 {
        store.spawn_refresh_loop(Duration::from_secs(config.catalog.refresh_interval_secs));
    }

    let fallback = FallbackResponder::from_config(&config.llm);
    if !fallback.is_configured() {
        warn!("no LLM provider configured; unmatched messages get a canned reply");
    }
    let resolver = Arc::new(MessageResolver::new(store, fallback));

    let whatsapp = Arc::new(
        WhatsAppChannel::new(config.whatsapp.clone()).context("failed to build WhatsApp client")?,
    );
    let outbound: Arc<dyn ChannelAdapter> = whatsapp.clone();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        resolver,
        whatsapp,
        outbound,
        database,
        ready,
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn seed(config: BotConfig, file: Option<PathBuf>) -> anyhow::Result<()> {
    let file = file.unwrap_or_else(|| config.catalog.seed_file.clone());
    info!(file = %file.display(), "seeding catalog database");

    let database = MySqlCatalog::connect(&config.database)
        .await
        .context("failed to connect to the catalog database")?;
    let snapshot = database
        .seed_from(&FileCatalog::new(file))
        .await
        .context("seeding failed")?;

    info!(
        courses = snapshot.courses.len(),
        faqs = snapshot.faqs.len(),
        "seeding complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
