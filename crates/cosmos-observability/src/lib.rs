//! Cosmos Observability
//!
//! - Console logging through `tracing-subscriber`
//! - HTTP request logging middleware
//! - Authentication metrics exported in the Prometheus format
//!
//! # Examples
//!
//! ```no_run
//! use cosmos_observability::{init_logging, init_metrics};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_logging();
//!     let handle = init_metrics()?;
//!     println!("{}", handle.render());
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod metrics;

pub use metrics_exporter_prometheus::PrometheusHandle;

pub use logging::{init_logging, logging_middleware};
pub use metrics::{
    init_metrics, track_login, track_reauthentication, track_token_issued,
    track_verification_failure,
};
