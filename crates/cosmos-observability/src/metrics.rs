use std::time::Duration;

use anyhow::Context;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const TOKENS_ISSUED: &str = "auth_tokens_issued_total";
pub const VERIFICATION_FAILURES: &str = "auth_verification_failures_total";
pub const REAUTHENTICATIONS: &str = "auth_reauthentications_total";
pub const LOGINS: &str = "auth_logins_total";

/// Installs the global Prometheus recorder and spawns its upkeep task.
///
/// Must be called from within a tokio runtime. Fails if a recorder is
/// already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(handle)
}

pub fn track_token_issued() {
    counter!(TOKENS_ISSUED).increment(1);
}

/// `kind` is the failing check, e.g. "expired" or "signature".
pub fn track_verification_failure(kind: &'static str) {
    counter!(VERIFICATION_FAILURES, "kind" => kind).increment(1);
}

pub fn track_reauthentication(outcome: &'static str) {
    counter!(REAUTHENTICATIONS, "outcome" => outcome).increment(1);
}

pub fn track_login(outcome: &'static str) {
    counter!(LOGINS, "outcome" => outcome).increment(1);
}
