//! Principal storage seam.
//!
//! Token issuance never touches user storage. Login asks a [`PrincipalStore`]
//! for a fully populated [`Principal`] snapshot (role title and permissions
//! resolved up front) and hands that to the issuer.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use cosmos_auth::Principal;

use crate::utils::password::{hash_password, verify_password};

/// Role assigned to self-registered accounts.
pub const DEFAULT_ROLE: &str = "Player";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleLookup {
    ById(i64),
    ByTitle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: i64,
    pub title: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PrincipalError {
    #[error("user already exists")]
    AlreadyExists,

    #[error("no role matches {0:?}")]
    UnknownRole(RoleLookup),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Creates an account holding the store's default role.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, PrincipalError>;

    /// The principal for `email` if `password` matches. Unknown accounts and
    /// wrong passwords are both `Ok(None)`.
    async fn authenticate(&self, email: &str, password: &str)
    -> anyhow::Result<Option<Principal>>;
}

#[derive(Debug, Clone)]
struct Account {
    id: i64,
    name: String,
    email: String,
    password: String,
    role_id: i64,
}

#[derive(Debug, Default)]
struct Directory {
    accounts: Vec<Account>,
    roles: Vec<Role>,
}

impl Directory {
    fn find_role(&self, lookup: &RoleLookup) -> Option<&Role> {
        self.roles.iter().find(|role| match lookup {
            RoleLookup::ById(id) => role.id == *id,
            RoleLookup::ByTitle(title) => role.title.eq_ignore_ascii_case(title),
        })
    }

    fn find_account(&self, email: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
    }

    fn snapshot(&self, account: &Account) -> Principal {
        let role = self.find_role(&RoleLookup::ById(account.role_id));
        Principal {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: role.map(|r| r.title.clone()).unwrap_or_default(),
            permissions: role.map(|r| r.permissions.clone()).unwrap_or_default(),
        }
    }
}

/// Process-local accounts and roles, for development and tests.
#[derive(Debug)]
pub struct InMemoryPrincipalStore {
    directory: RwLock<Directory>,
    cost: u32,
    default_role: String,
}

impl Default for InMemoryPrincipalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// Store hashing passwords at the given bcrypt cost.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            cost,
            default_role: DEFAULT_ROLE.to_string(),
        }
    }

    pub fn with_default_role(mut self, title: impl Into<String>) -> Self {
        self.default_role = title.into();
        self
    }

    pub async fn add_role(&self, title: &str, permissions: &[&str]) -> Role {
        let mut directory = self.directory.write().await;
        let role = Role {
            id: directory.roles.len() as i64 + 1,
            title: title.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        };
        directory.roles.push(role.clone());
        debug!(role = %role.title, "role added");
        role
    }

    pub async fn add_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &RoleLookup,
    ) -> Result<Principal, PrincipalError> {
        let password = hash_password(password, self.cost).await?;

        let mut directory = self.directory.write().await;
        if directory.find_account(email).is_some() {
            return Err(PrincipalError::AlreadyExists);
        }
        let Some(role_id) = directory.find_role(role).map(|r| r.id) else {
            return Err(PrincipalError::UnknownRole(role.clone()));
        };

        let account = Account {
            id: directory.accounts.len() as i64 + 1,
            name: name.to_string(),
            email: email.to_string(),
            password,
            role_id,
        };
        let principal = directory.snapshot(&account);
        directory.accounts.push(account);

        info!(user_id = principal.id, email = %principal.email, "account added");
        Ok(principal)
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, PrincipalError> {
        let role = RoleLookup::ByTitle(self.default_role.clone());
        self.add_account(name, email, password, &role).await
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Option<Principal>> {
        let (hashed, principal) = {
            let directory = self.directory.read().await;
            match directory.find_account(email) {
                Some(account) => (account.password.clone(), directory.snapshot(account)),
                None => return Ok(None),
            }
        };

        if !verify_password(password, &hashed).await? {
            return Ok(None);
        }
        Ok(Some(principal))
    }
}
