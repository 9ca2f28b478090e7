use fingate_auth::store::disk::DiskStore;
use fingate_auth::store::encrypted::EncryptedStore;
use fingate_auth::store::memory::MemoryStore;
use fingate_auth::{AuthState, Store};
use fingate_core::config::{AppConfig, LogFormat};
use fingate_server::{dispatcher, sink};
use fingate_tools::ToolRegistry;
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(error) => {
            eprintln!("fingate: fatal configuration error: {error}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    let store = build_store(&config).await;
    let auth_state = AuthState::new(store, Arc::clone(&config));
    let upstream = Arc::new(sink::UpstreamSink::new(&config));
    let tool_registry = Arc::new(ToolRegistry::with_default_tools(upstream));

    let app = dispatcher::build_router(auth_state, tool_registry);

    tracing::info!(bind_addr = %config.bind_addr, "starting fingate");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|error| panic!("failed to bind {}: {error}", config.bind_addr));

    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(%error, "server exited with an error");
        std::process::exit(1);
    }
}

/// Selects the storage backend from `OAUTH_TOKEN_STORAGE_DIR` / `OAUTH_STORAGE_ENCRYPTION_KEY`:
/// memory by default, disk if a directory is configured, encrypted on top of either if a
/// key is configured.
async fn build_store(config: &AppConfig) -> Arc<dyn Store> {
    match (&config.storage_dir, &config.storage_encryption_key) {
        (Some(dir), Some(passphrase)) => {
            let disk = DiskStore::open(dir).await.expect("failed to open OAUTH_TOKEN_STORAGE_DIR");
            Arc::new(EncryptedStore::new(disk, &derive_encryption_key(passphrase)))
        }
        (Some(dir), None) => {
            let disk = DiskStore::open(dir).await.expect("failed to open OAUTH_TOKEN_STORAGE_DIR");
            Arc::new(disk)
        }
        (None, Some(passphrase)) => Arc::new(EncryptedStore::new(MemoryStore::new(), &derive_encryption_key(passphrase))),
        (None, None) => Arc::new(MemoryStore::new()),
    }
}

fn derive_encryption_key(passphrase: &str) -> [u8; 32] {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
