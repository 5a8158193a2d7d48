//! Business event sink.
//!
//! Repository operations report what happened (`admission_submitted`,
//! `admission_status_updated`) through [`Telemetry::log_event`]. Delivery is
//! fire-and-forget: a sink never fails the operation that called it.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::info;

use crate::metrics::track_event;

pub trait Telemetry: Send + Sync {
    fn log_event(&self, name: &str, properties: Value);
}

/// Logs the event and counts it in `admitdesk_events_total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsTelemetry;

impl Telemetry for MetricsTelemetry {
    fn log_event(&self, name: &str, properties: Value) {
        info!(event = name, properties = %properties, "Telemetry event");
        track_event(name);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn log_event(&self, _name: &str, _properties: Value) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub name: String,
    pub properties: Value,
}

/// Keeps every event in memory, for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn named(&self, name: &str) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name == name)
            .collect()
    }
}

impl Telemetry for RecordingTelemetry {
    fn log_event(&self, name: &str, properties: Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                name: name.to_string(),
                properties,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_telemetry_keeps_order() {
        let telemetry = RecordingTelemetry::new();
        telemetry.log_event("admission_submitted", json!({"class": "LKG"}));
        telemetry.log_event("admission_status_updated", json!({"newStatus": "approved"}));

        let events = telemetry.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "admission_submitted");
        assert_eq!(telemetry.named("admission_status_updated").len(), 1);
    }

    #[test]
    fn test_clones_share_events() {
        let telemetry = RecordingTelemetry::new();
        let shared: Arc<dyn Telemetry> = Arc::new(telemetry.clone());
        shared.log_event("admission_submitted", json!({}));
        assert_eq!(telemetry.events().len(), 1);
    }

    #[test]
    fn test_metrics_telemetry_without_recorder() {
        // no recorder installed: counting is a no-op
        MetricsTelemetry.log_event("admission_submitted", json!({"class": "1"}));
    }
}
