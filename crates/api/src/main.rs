//! API server entry point.

use std::sync::Arc;

use api::AppState;
use api::config::Config;
use application::Mediator;
use application::requests::seed_admin;
use persistence::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
use shared_kernel::AggregateRoot;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, BoxError> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresDocumentStore::connect(url).await?;
            store.run_migrations().await?;
            tracing::info!("using the Postgres document store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, data lives in memory only");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Open the store and build the mediator
    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET is not set, signing tokens with the development secret");
    }
    let store = open_store(&config).await?;
    let mediator = Mediator::new(api::create_context(&config, store)?);

    // 4. Seed the administrator account
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let admin = seed_admin(&mediator, "Administrator", email, password).await?;
        tracing::info!(user_id = %admin.id(), "administrator ready");
    }

    // 5. Build the application
    let app = api::create_app(AppState::new(mediator), metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
