use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::hub::BroadcastHub;
use crate::logging;
use crate::observer::SheetObserver;
use crate::sheet::{HttpSheetSource, SnapshotReader};

pub struct Application {
    pub router: Router,
    pub bind_address: String,
    pub socket_addr: SocketAddr,
}

pub async fn setup() -> Result<Application> {
    // Determine config directory
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_string_lossy().into_owned()))
            .unwrap_or_else(|| ".".to_string())
    });
    let config_base = format!("{}/config", config_dir);

    // Load configuration
    let config = match Config::from_file(&config_base) {
        Ok(cfg) => {
            eprintln!("Configuration loaded successfully from {}", config_base);
            cfg
        }
        Err(e) => {
            eprintln!("Failed to load configuration: {}, using defaults", e);
            Config::default()
        }
    };

    // Initialize logging
    logging::init(&config.logging);

    tracing::info!("Starting Aula Board server...");
    if config.logging.enabled {
        tracing::info!(
            "File logging enabled: directory={}, prefix={}, rotation={}",
            config.logging.directory,
            config.logging.file_prefix,
            config.logging.rotation
        );
    }
    tracing::info!(
        "Watching sheet document '{}' worksheet '{}' every {}s",
        config.sheet.document_id,
        config.sheet.worksheet,
        config.poll.interval_seconds
    );

    // Initialize broadcast hub
    let hub = Arc::new(BroadcastHub::new(config.hub.queue_capacity));
    tracing::info!(
        "Broadcast hub initialized with viewer queue capacity {}",
        config.hub.queue_capacity
    );

    // Spawn the sheet observation loop
    let source = HttpSheetSource::new(&config.sheet)?;
    let observer = SheetObserver::new(
        SnapshotReader::new(source),
        Arc::clone(&hub),
        config.poll.clone(),
    );
    tokio::spawn(observer.run());
    tracing::info!("Sheet observation loop spawned");

    // Create API state and router
    let allowed_origins = config.allowed_origins();
    let cors_disabled = config.cors.disable;
    let app_state = AppState {
        hub,
        allowed_origins: allowed_origins.clone(),
        cors_disabled,
    };

    if cors_disabled {
        tracing::warn!("CORS is DISABLED in config - all origins will be allowed!");
    } else {
        tracing::info!("API state created with CORS origins: {:?}", allowed_origins);
    }

    let router = create_router(app_state);

    let bind_address = config.server_address();
    let socket_addr: SocketAddr = bind_address
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind_address, e))?;

    Ok(Application {
        router,
        bind_address,
        socket_addr,
    })
}
