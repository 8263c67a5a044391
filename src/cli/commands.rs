//! CLI command implementations
//!
//! `serve` boots in a fixed order: load config, install logging, open the
//! storage backend, build the router, bind. Any failure before binding is
//! fatal and nothing is served.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::config::{BackendKind, Config};
use crate::file_storage::{FileService, LocalBackend, MemoryBackend, ObjectStore, SignedUrlGenerator};
use crate::http_server::{HttpServer, StorageState};
use crate::observability::{self, Event};

use super::args::{Cli, Command, DEFAULT_CONFIG_PATH};
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::Check { config } => check(config.as_deref()),
    }
}

/// Load config from an explicit path, or from the default path if present
pub fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = match path {
        Some(explicit) => Config::load(explicit)?,
        None => Config::load_or_default(&PathBuf::from(DEFAULT_CONFIG_PATH))?,
    };
    Ok(config)
}

/// Validate configuration and print it as JSON
pub fn check(config_path: Option<&Path>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if config.signing.secret.is_some() {
        config.signing.secret = Some("<redacted>".to_string());
    }

    let rendered = serde_json::to_string_pretty(&config)
        .map_err(|e| CliError::io_error(format!("JSON error: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Start the HTTP server
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
        config.validate()?;
    }

    observability::init(&config.log).map_err(CliError::config_error)?;
    info!(
        event = %Event::ConfigLoaded,
        backend = ?config.storage.backend,
        port = config.server.port,
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let state = build_state(&config).await?;
        let server = HttpServer::new(config.server.clone(), state);
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Open the configured backend
pub async fn open_store(config: &Config) -> CliResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        BackendKind::Local => {
            let root = config.storage.bucket_root();
            let backend = LocalBackend::open(root.clone())
                .await?
                .with_page_limit(config.storage.page_limit);
            info!(event = %Event::StorageOpened, backend = "local", root = %root.display());
            Arc::new(backend)
        }
        BackendKind::Memory => {
            info!(event = %Event::StorageOpened, backend = "memory");
            Arc::new(MemoryBackend::with_page_limit(config.storage.page_limit))
        }
    };
    Ok(store)
}

/// Build the signed URL generator from config
pub fn build_signer(config: &Config) -> SignedUrlGenerator {
    let signer = match config.signing.secret.as_deref() {
        Some(secret) => SignedUrlGenerator::new(secret.as_bytes(), &config.signing.public_base_url),
        None => {
            warn!("no signing secret configured; signed URLs will not survive a restart");
            SignedUrlGenerator::ephemeral(&config.signing.public_base_url)
        }
    };
    let ttl = i64::try_from(config.signing.url_ttl_secs).unwrap_or(i64::MAX);
    signer.with_expiry(Duration::seconds(ttl))
}

/// Assemble the handler state from config
pub async fn build_state(config: &Config) -> CliResult<StorageState> {
    let store = open_store(config).await?;
    let files = FileService::new(store, build_signer(config), config.file_service_settings());
    Ok(StorageState::new(files).with_partial_delete_reporting(config.deletion.report_partial_count))
}
