use anyhow::Context;
use salon_api::{app, state::store_options, worker, AppState};
use salon_checkout::PendingReservationStore;
use salon_core::KeyValueStore;
use salon_store::app_config::{Config, StorageKind};
use salon_store::{HttpReservationBackend, MemoryKv, RedisKv};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "salon_api=debug,salon_checkout=debug,salon_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting salon checkout API on port {}", config.server.port);

    let kv: Arc<dyn KeyValueStore> = match config.storage.kind {
        StorageKind::Memory => Arc::new(MemoryKv::new()),
        StorageKind::Redis => {
            let url = config
                .storage
                .redis_url
                .as_deref()
                .context("storage.redis_url is required when storage.kind = \"redis\"")?;
            Arc::new(RedisKv::new(url).context("Invalid Redis URL")?)
        }
    };

    let backend = HttpReservationBackend::new(&config.backend)
        .context("Failed to build reservation backend client")?;

    let store = Arc::new(PendingReservationStore::new(
        kv,
        Arc::new(backend),
        store_options(&config.storage, &config.checkout),
    ));
    store.load_pending_reservations_from_storage();

    tokio::spawn(worker::start_expiry_worker(
        store.clone(),
        Duration::from_secs(config.checkout.sweep_interval_seconds.max(1)),
    ));

    let app = app(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
