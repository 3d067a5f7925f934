use std::time::Duration;

use serde::Serialize;

pub const STATUS_OK: &str = "ok";
pub const STATUS_MAINTENANCE: &str = "maintenance";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub uptime: String,
    pub version: &'static str,
}

impl StatusResponse {
    pub fn ok(uptime: Duration) -> Self {
        Self::new(STATUS_OK, uptime)
    }

    pub fn maintenance(uptime: Duration) -> Self {
        Self::new(STATUS_MAINTENANCE, uptime)
    }

    fn new(status: &'static str, uptime: Duration) -> Self {
        Self {
            status,
            uptime: format_uptime(uptime),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Whole seconds as e.g. "1h2m3s".
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m{seconds}s"),
        _ => format!("{hours}h{minutes}m{seconds}s"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
}
