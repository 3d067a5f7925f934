use std::env;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// When set, every route except the probes answers 503.
    pub maintenance: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("COSMOS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:10001".to_string()),
            maintenance: env::var("COSMOS_MAINTENANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:10001".to_string(),
            maintenance: false,
        }
    }
}
