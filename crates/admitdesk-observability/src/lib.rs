//! admitdesk Observability
//!
//! - Console logging via `tracing-subscriber`
//! - HTTP request logging and Prometheus request metrics middleware
//! - The [`Telemetry`] sink for business events such as `admission_submitted`
//!
//! Metrics can be switched off at runtime with `OBSERVABILITY_ENABLED=false`;
//! console logging always stays on.
//!
//! ```no_run
//! use admitdesk_observability::{init_metrics, init_tracing};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_tracing();
//!     let _handle = init_metrics();
//! }
//! ```

pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use metrics_exporter_prometheus::PrometheusHandle;

pub use logging::{init_tracing, logging_middleware};
pub use self::metrics::{init_metrics, is_observability_enabled, metrics_middleware, track_event};
pub use telemetry::{MetricsTelemetry, NoopTelemetry, RecordedEvent, RecordingTelemetry, Telemetry};
