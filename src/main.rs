//! K-Clash Back binary entrypoint wiring the profile REST API to the hosted data store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use kclash_back::{
    auth::{IdentityProvider, StaticIdentityProvider},
    config::AppConfig,
    dao::data_store::{DataStore, memory::MemoryDataStore},
    routes,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Backends = (Arc<dyn DataStore>, Arc<dyn IdentityProvider>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let (store, identity) = build_backends()?;
    let app_state = AppState::new(store, identity, config);

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Connect to the hosted data store and auth service, or fall back to in-memory backends
/// when no store URL is configured.
#[cfg(feature = "rest-store")]
fn build_backends() -> anyhow::Result<Backends> {
    use kclash_back::{
        auth::RestIdentityProvider,
        dao::data_store::rest::{RestDaoError, RestDataStore, RestStoreConfig},
    };

    let config = match RestStoreConfig::from_env() {
        Ok(config) => config,
        Err(RestDaoError::MissingEnvVar {
            var: "KCLASH_STORE_URL",
        }) => return Ok(memory_backends()),
        Err(err) => {
            return Err(anyhow::Error::new(err).context("reading data store configuration"));
        }
    };

    let identity = RestIdentityProvider::new(&config).context("building auth client")?;
    let base_url = config.base_url.clone();
    let store = RestDataStore::new(config).context("building data store client")?;
    info!(%base_url, "using hosted data store");

    Ok((Arc::new(store), Arc::new(identity)))
}

#[cfg(not(feature = "rest-store"))]
fn build_backends() -> anyhow::Result<Backends> {
    Ok(memory_backends())
}

fn memory_backends() -> Backends {
    warn!(
        "no data store configured; profiles live in memory and authenticated routes reject \
         every token"
    );
    (
        Arc::new(MemoryDataStore::new()),
        Arc::new(StaticIdentityProvider::new()),
    )
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
