use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadflow_core::{
    load_config, validate_config, ActivityTracker, AgentRunner, Coordinator, CsvImporter,
    EntryProvider, LeadStore, OutreachCoordinator, PhoneApiVoiceProvider, PortalEntryProvider,
    RetryPolicy, SqliteLeadStore, SubmissionCoordinator, VoiceProvider, WorkScheduler,
};
use leadflow_server::api::create_router;
use leadflow_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("LEADFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Import directory: {:?}", config.import.directory);

    // Create SQLite lead store
    let store: Arc<dyn LeadStore> = Arc::new(
        SqliteLeadStore::new(&config.database.path).context("Failed to create lead store")?,
    );
    info!("Lead store initialized");

    let importer = Arc::new(CsvImporter::new(Arc::clone(&store), &config.import));
    let activity = ActivityTracker::new();

    // Build a coordinator per configured provider
    let policy = RetryPolicy::new(&config.workflow);
    let mut coordinators: Vec<Arc<dyn Coordinator>> = Vec::new();

    match &config.voice {
        Some(voice_config) => {
            info!("Initializing telephony provider at {}", voice_config.url);
            let provider: Arc<dyn VoiceProvider> =
                Arc::new(PhoneApiVoiceProvider::new(voice_config.clone()));
            coordinators.push(Arc::new(OutreachCoordinator::new(
                Arc::clone(&store),
                provider,
                policy.clone(),
                activity.clone(),
            )));
        }
        None => info!("No voice provider configured"),
    }

    match &config.entry {
        Some(entry_config) => {
            info!("Initializing portal provider at {}", entry_config.url);
            let provider: Arc<dyn EntryProvider> =
                Arc::new(PortalEntryProvider::new(entry_config.clone()));
            coordinators.push(Arc::new(SubmissionCoordinator::new(
                Arc::clone(&store),
                provider,
                policy.clone(),
                activity.clone(),
            )));
        }
        None => info!("No entry provider configured"),
    }

    // Start the background workers if enabled
    let runner = if config.workflow.enabled {
        if coordinators.is_empty() {
            error!("Workflow enabled but no providers configured; workers not started");
            None
        } else {
            let scheduler = Arc::new(WorkScheduler::new(
                Arc::clone(&store),
                config.workflow.clone(),
            ));
            let runner = AgentRunner::new(scheduler, coordinators, config.workflow.clone());
            runner.start();
            Some(runner)
        }
    } else {
        info!("Workflow disabled in config");
        None
    };

    // Build the HTTP server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, store, importer, activity));
    let router = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let in-flight worker actions finish before exiting
    if let Some(runner) = runner {
        runner.stop();
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
