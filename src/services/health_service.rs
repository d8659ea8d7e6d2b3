use crate::services::chat_store::ChatStore;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
struct Metrics {
    status: Gauge<i64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("nearlink-chat");
        Self {
            status: meter
                .i64_gauge("nearlink_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    store: Arc<dyn ChatStore>,
    store_timeout: Duration,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>, store_timeout: Duration) -> Self {
        Self { store, store_timeout, metrics: Metrics::new() }
    }

    /// Checks that the store answers within the configured timeout.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store is unreachable.
    pub async fn check_store(&self) -> Result<(), String> {
        let outcome = match timeout(self.store_timeout, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("Store check failed: {e}")),
            Err(_) => Err("Store check timed out".to_string()),
        };

        let value = i64::from(outcome.is_ok());
        self.metrics.status.record(value, &[KeyValue::new("component", "store")]);
        outcome
    }
}
