use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use veggie_bot::api::{self, AppState};
use veggie_bot::bot::{Bot, BotSettings};
use veggie_bot::catalog::PgCatalog;
use veggie_bot::classifier::{Classifier, HttpClassifier};
use veggie_bot::cli::{Cli, Command};
use veggie_bot::config::AppConfig;
use veggie_bot::line::{LineClient, rich_menu};
use veggie_bot::storage::S3Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;
    info!("📋 Configuration loaded");

    match cli.command() {
        Command::Serve => serve(config).await,
        Command::RichMenu { image } => {
            info!("🧩 Provisioning rich menu from {}", image.display());
            let client = LineClient::new(&config.line)?;
            let id = rich_menu::provision(&client, &image).await?;
            info!("✅ Rich menu {} is now the default", id);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("🚀 Starting Vegetable Assistant Server");
    info!("   - Server: {}", config.bind_address());
    info!("   - Website: {}", config.server.web_url);
    info!("   - Bucket: {} via {}", config.storage.bucket, config.storage.endpoint);

    // Database
    info!("🗄️  Connecting catalog...");
    let catalog = Arc::new(
        PgCatalog::connect_lazy(&config.database.url, config.database.max_connections)
            .context("invalid database settings")?,
    );
    info!("✅ Catalog ready (max {} connections)", config.database.max_connections);

    // Object storage
    info!("💾 Initializing object storage...");
    let store = Arc::new(S3Store::new(&config.storage)?);
    info!("✅ Object storage ready");

    // Model service
    let classifier: Option<Arc<dyn Classifier>> = match HttpClassifier::from_config(&config.classifier)? {
        Some(classifier) => {
            info!("🧠 Classifier endpoint configured");
            Some(Arc::new(classifier) as Arc<dyn Classifier>)
        }
        None => {
            warn!("⚠️  No classifier endpoint, photo recognition disabled");
            None
        }
    };

    // Bot
    let settings = BotSettings::from_config(&config);
    let mut bot = Bot::new(
        catalog.clone(),
        Arc::new(LineClient::new(&config.line)?),
        settings.clone(),
    );
    if let Some(classifier) = &classifier {
        bot = bot.with_classifier(classifier.clone());
    }
    info!("🤖 Bot ready");

    // Create application state
    let state = AppState {
        catalog,
        store,
        classifier,
        bot: Arc::new(bot),
        channel_secret: Arc::from(config.line.channel_secret.as_str()),
        links: settings.links,
    };

    let app = api::router(state, &config.server.static_dir);

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET  /health                  - Health check");
    info!("   GET  /api/vegetables          - Vegetable list");
    info!("   GET  /api/vegetables/{{id}}     - Vegetable detail");
    info!("   GET  /api/recipes/{{veg_id}}    - Recipes of a vegetable");
    info!("   GET  /api/image/{{filename}}    - Vegetable photo");
    info!("   GET  /api/csv/{{filename}}      - Data export");
    info!("   POST /predict                 - Classify a photo");
    info!("   POST /callback                - Messaging webhook");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
