use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

use cosmos_auth::{
    AuthError, Clock, CredentialTransport, KeyRing, SystemClock, TokenIssuer, TokenVerifier,
};
use cosmos_config::{AuthConfig, CorsConfig, ServerConfig};
use cosmos_core::permissions;
use cosmos_observability::PrometheusHandle;

use crate::principals::{DEFAULT_ROLE, InMemoryPrincipalStore, PrincipalStore, RoleLookup};

#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub verifier: Arc<TokenVerifier>,
    pub transport: Arc<CredentialTransport>,
    pub principals: Arc<dyn PrincipalStore>,
    pub auth_config: AuthConfig,
    pub server_config: ServerConfig,
    pub cors_config: CorsConfig,
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        keys: KeyRing,
        auth_config: AuthConfig,
        principals: Arc<dyn PrincipalStore>,
    ) -> Result<Self, AuthError> {
        Self::with_clock(keys, auth_config, principals, Arc::new(SystemClock))
    }

    /// Issuer, verifier and cookie transport all read time from `clock`.
    pub fn with_clock(
        keys: KeyRing,
        auth_config: AuthConfig,
        principals: Arc<dyn PrincipalStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let keys = Arc::new(keys);
        let issuer = TokenIssuer::new(keys.clone(), &auth_config)?.with_clock(clock.clone());
        let verifier = TokenVerifier::new(keys).with_clock(clock.clone());
        let transport =
            CredentialTransport::new(auth_config.cookie_domain.clone()).with_clock(clock);

        Ok(Self {
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            transport: Arc::new(transport),
            principals,
            auth_config,
            server_config: ServerConfig::default(),
            cors_config: CorsConfig::default(),
            metrics: None,
            started_at: Instant::now(),
        })
    }
}

/// Builds the application state from the environment. Key files are read
/// here, once; any problem with them stops startup.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let auth_config = AuthConfig::from_env().context("invalid auth configuration")?;
    let keys = KeyRing::load(&auth_config.token_keys, &auth_config.audience)
        .context("could not load token keys")?;

    let principals = init_principal_store().await?;
    let mut state = AppState::new(keys, auth_config, principals)?;
    state.server_config = ServerConfig::from_env();
    state.cors_config = CorsConfig::from_env();
    state.metrics = Some(cosmos_observability::init_metrics()?);

    Ok(state)
}

/// In-memory store holding the administrator and default roles, seeded with
/// one administrator when `COSMOS_DEMO_EMAIL` and `COSMOS_DEMO_PASSWORD` are
/// both set.
async fn init_principal_store() -> anyhow::Result<Arc<dyn PrincipalStore>> {
    let store = InMemoryPrincipalStore::new();
    store.add_role("Admin", &[permissions::KEYS_READ]).await;
    store.add_role(DEFAULT_ROLE, &[]).await;

    if let (Ok(email), Ok(password)) = (
        std::env::var("COSMOS_DEMO_EMAIL"),
        std::env::var("COSMOS_DEMO_PASSWORD"),
    ) {
        store
            .add_account("Demo", &email, &password, &RoleLookup::ByTitle("Admin".to_string()))
            .await?;
        info!(email = %email, "seeded demo account");
    }

    Ok(Arc::new(store))
}
