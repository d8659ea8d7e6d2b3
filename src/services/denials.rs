use crate::domain::policy::{Action, Resource};
use opentelemetry::{KeyValue, global, metrics::Counter};

/// Logs and counts operations the access policy rejected.
#[derive(Clone, Debug)]
pub(crate) struct DenialRecorder {
    denials_total: Counter<u64>,
}

impl DenialRecorder {
    pub(crate) fn new() -> Self {
        let meter = global::meter("nearlink-chat");
        Self {
            denials_total: meter
                .u64_counter("nearlink_policy_denials_total")
                .with_description("Operations rejected by the access policy")
                .build(),
        }
    }

    pub(crate) fn record(&self, resource: Resource, action: Action) {
        tracing::warn!(resource = resource.as_str(), action = action.as_str(), "Access policy denied operation");
        self.denials_total
            .add(1, &[KeyValue::new("resource", resource.as_str()), KeyValue::new("action", action.as_str())]);
    }
}
