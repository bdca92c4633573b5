use tokio::time::Instant;
use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

/// Ping the data store and report whether and how fast it answered.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let started = Instant::now();
    let result = state.profiles().health_check().await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let status = match result {
        Ok(()) => HealthStatus::Ok,
        Err(err) => {
            warn!(error = %err, latency_ms, "data store health check failed");
            HealthStatus::Degraded
        }
    };

    HealthResponse {
        status,
        store: state.profiles().backend().to_owned(),
        latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::StaticIdentityProvider,
        config::AppConfig,
        dao::{data_store::memory::MemoryDataStore, models::tables},
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_when_the_store_is_down() {
        let store = MemoryDataStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(StaticIdentityProvider::new()),
            AppConfig::default(),
        );
        let healthy = health_status(&state).await;
        assert_eq!(healthy.status, HealthStatus::Ok);
        assert_eq!(healthy.store, "memory");

        store.fail_table(tables::PROFILES);
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);
    }
}
