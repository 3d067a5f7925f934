//! Token authentication configuration.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `COSMOS_AUTH_TOKEN_KEYS` | (required) | `kid:path` pairs, comma separated |
//! | `COSMOS_AUTH_AUDIENCE` | `http://localhost:10001` | audience stamped into and required of tokens |
//! | `COSMOS_AUTH_ISSUER` | empty | issuer stamped into tokens, omitted when empty |
//! | `COSMOS_AUTH_ACCESS_TTL` | `3600` | access token lifetime in seconds |
//! | `COSMOS_AUTH_REFRESH_TTL` | `7200` | refresh token lifetime in seconds, counted from issuance |
//! | `COSMOS_AUTH_REFRESH_OVERLAP` | `-900` | refresh `nbf` offset from access `exp`, in seconds |
//! | `COSMOS_AUTH_COOKIE_DOMAIN` | `localhost` | domain the credential cookies are scoped to |

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

/// Upper bound for every token lifetime setting: 10 years.
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: at least one token key is required")]
    NoTokenKeys,

    #[error("invalid configuration: could not parse token key entry {0:?}, expected kid:path")]
    InvalidTokenKey(String),

    #[error("invalid configuration: {name} must be an integer number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    InvalidLifetime(&'static str),
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Key id to PEM private key path. Ordered so the current key is the last entry.
    pub token_keys: BTreeMap<String, PathBuf>,
    pub audience: String,
    pub issuer: String,
    pub access_token_ttl: i64,
    pub refresh_token_ttl: i64,
    /// Must be negative: the refresh token activates this long before the
    /// access token expires.
    pub refresh_overlap: i64,
    pub cookie_domain: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_keys: BTreeMap::new(),
            audience: "http://localhost:10001".to_string(),
            issuer: String::new(),
            access_token_ttl: 3600,  // 1 hour
            refresh_token_ttl: 7200, // 2 hours
            refresh_overlap: -900,   // 15 minutes
            cookie_domain: "localhost".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source, then validates it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let token_keys = match lookup("COSMOS_AUTH_TOKEN_KEYS") {
            Some(raw) => parse_token_keys(&raw)?,
            None => BTreeMap::new(),
        };

        let conf = Self {
            token_keys,
            audience: lookup("COSMOS_AUTH_AUDIENCE").unwrap_or(defaults.audience),
            issuer: lookup("COSMOS_AUTH_ISSUER").unwrap_or(defaults.issuer),
            access_token_ttl: seconds(&lookup, "COSMOS_AUTH_ACCESS_TTL", defaults.access_token_ttl)?,
            refresh_token_ttl: seconds(
                &lookup,
                "COSMOS_AUTH_REFRESH_TTL",
                defaults.refresh_token_ttl,
            )?,
            refresh_overlap: seconds(
                &lookup,
                "COSMOS_AUTH_REFRESH_OVERLAP",
                defaults.refresh_overlap,
            )?,
            cookie_domain: lookup("COSMOS_AUTH_COOKIE_DOMAIN").unwrap_or(defaults.cookie_domain),
        };

        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_keys.is_empty() {
            return Err(ConfigError::NoTokenKeys);
        }
        self.validate_lifetimes()
    }

    /// Checks the timing relationships the issuer depends on: the refresh
    /// token activates after issuance but before the access token expires,
    /// and outlives it.
    pub fn validate_lifetimes(&self) -> Result<(), ConfigError> {
        if self.access_token_ttl <= 0 {
            return Err(ConfigError::InvalidLifetime("access token ttl must be positive"));
        }
        if self.access_token_ttl > MAX_LIFETIME_SECS || self.refresh_token_ttl > MAX_LIFETIME_SECS {
            return Err(ConfigError::InvalidLifetime("token ttls must not exceed 10 years"));
        }
        if self.refresh_overlap >= 0 {
            return Err(ConfigError::InvalidLifetime("refresh overlap must be negative"));
        }
        if self.access_token_ttl + self.refresh_overlap <= 0 {
            return Err(ConfigError::InvalidLifetime(
                "refresh overlap must be shorter than the access token ttl",
            ));
        }
        if self.refresh_token_ttl <= self.access_token_ttl {
            return Err(ConfigError::InvalidLifetime(
                "refresh token ttl must exceed the access token ttl",
            ));
        }
        Ok(())
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_ttl)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_ttl)
    }

    pub fn overlap(&self) -> Duration {
        Duration::seconds(self.refresh_overlap)
    }
}

fn parse_token_keys(raw: &str) -> Result<BTreeMap<String, PathBuf>, ConfigError> {
    let mut keys = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (kid, path) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidTokenKey(entry.to_string()))?;

        let (kid, path) = (kid.trim(), path.trim());
        if kid.is_empty() || path.is_empty() {
            return Err(ConfigError::InvalidTokenKey(entry.to_string()));
        }
        keys.insert(kid.to_string(), PathBuf::from(path));
    }
    Ok(keys)
}

fn seconds<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidSeconds { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_keys() {
        let conf = AuthConfig::from_lookup(lookup(&[(
            "COSMOS_AUTH_TOKEN_KEYS",
            "26eus0rt3e3Abor12Y60VqgCEXR:testdata/a.pem",
        )]))
        .unwrap();

        assert_eq!(conf.token_keys.len(), 1);
        assert_eq!(conf.audience, "http://localhost:10001");
        assert!(conf.issuer.is_empty());
        assert_eq!(conf.access_ttl(), Duration::hours(1));
        assert_eq!(conf.refresh_ttl(), Duration::hours(2));
        assert_eq!(conf.overlap(), Duration::minutes(-15));
    }

    #[test]
    fn test_token_keys_parsed_and_ordered() {
        let conf = AuthConfig::from_lookup(lookup(&[(
            "COSMOS_AUTH_TOKEN_KEYS",
            " kid-b : /keys/b.pem , kid-a:/keys/a.pem,",
        )]))
        .unwrap();

        let kids: Vec<&str> = conf.token_keys.keys().map(String::as_str).collect();
        assert_eq!(kids, vec!["kid-a", "kid-b"]);
        assert_eq!(conf.token_keys["kid-b"], PathBuf::from("/keys/b.pem"));
    }

    #[test]
    fn test_missing_token_keys() {
        let err = AuthConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::NoTokenKeys);
    }

    #[test]
    fn test_malformed_token_key_entry() {
        let err = AuthConfig::from_lookup(lookup(&[("COSMOS_AUTH_TOKEN_KEYS", "no-path")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidTokenKey("no-path".to_string()));

        let err = AuthConfig::from_lookup(lookup(&[("COSMOS_AUTH_TOKEN_KEYS", ":/keys/a.pem")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTokenKey(_)));
    }

    #[test]
    fn test_invalid_seconds() {
        let err = AuthConfig::from_lookup(lookup(&[
            ("COSMOS_AUTH_TOKEN_KEYS", "a:/a.pem"),
            ("COSMOS_AUTH_ACCESS_TTL", "1h"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSeconds {
                name: "COSMOS_AUTH_ACCESS_TTL",
                ..
            }
        ));
    }

    #[test]
    fn test_overrides() {
        let conf = AuthConfig::from_lookup(lookup(&[
            ("COSMOS_AUTH_TOKEN_KEYS", "a:/a.pem"),
            ("COSMOS_AUTH_AUDIENCE", "https://cosmos.example.com"),
            ("COSMOS_AUTH_ISSUER", "https://auth.example.com"),
            ("COSMOS_AUTH_ACCESS_TTL", "600"),
            ("COSMOS_AUTH_REFRESH_TTL", "1800"),
            ("COSMOS_AUTH_REFRESH_OVERLAP", "-120"),
            ("COSMOS_AUTH_COOKIE_DOMAIN", "cosmos.example.com"),
        ]))
        .unwrap();

        assert_eq!(conf.audience, "https://cosmos.example.com");
        assert_eq!(conf.issuer, "https://auth.example.com");
        assert_eq!(conf.access_token_ttl, 600);
        assert_eq!(conf.refresh_token_ttl, 1800);
        assert_eq!(conf.refresh_overlap, -120);
        assert_eq!(conf.cookie_domain, "cosmos.example.com");
    }

    #[test]
    fn test_lifetime_validation() {
        let base = AuthConfig {
            token_keys: BTreeMap::from([("a".to_string(), PathBuf::from("/a.pem"))]),
            ..AuthConfig::default()
        };
        assert!(base.validate().is_ok());

        let conf = AuthConfig {
            refresh_overlap: 0,
            ..base.clone()
        };
        assert!(matches!(conf.validate(), Err(ConfigError::InvalidLifetime(_))));

        let conf = AuthConfig {
            refresh_overlap: -3600,
            ..base.clone()
        };
        assert!(matches!(conf.validate(), Err(ConfigError::InvalidLifetime(_))));

        let conf = AuthConfig {
            refresh_token_ttl: 3600,
            ..base.clone()
        };
        assert!(matches!(conf.validate(), Err(ConfigError::InvalidLifetime(_))));

        let conf = AuthConfig {
            access_token_ttl: 0,
            ..base
        };
        assert!(matches!(conf.validate(), Err(ConfigError::InvalidLifetime(_))));
    }

    #[test]
    fn test_oversized_lifetimes_rejected() {
        let conf = AuthConfig {
            access_token_ttl: 100_000_000_000_000,
            refresh_token_ttl: 200_000_000_000_000,
            ..AuthConfig::default()
        };
        assert_eq!(
            conf.validate_lifetimes(),
            Err(ConfigError::InvalidLifetime("token ttls must not exceed 10 years"))
        );

        let conf = AuthConfig {
            refresh_token_ttl: MAX_LIFETIME_SECS + 1,
            ..AuthConfig::default()
        };
        assert!(conf.validate_lifetimes().is_err());

        let conf = AuthConfig {
            access_token_ttl: MAX_LIFETIME_SECS - 1,
            refresh_token_ttl: MAX_LIFETIME_SECS,
            ..AuthConfig::default()
        };
        assert!(conf.validate_lifetimes().is_ok());

        let err = AuthConfig::from_lookup(lookup(&[
            ("COSMOS_AUTH_TOKEN_KEYS", "a:/a.pem"),
            ("COSMOS_AUTH_REFRESH_TTL", "9223372036854775807"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLifetime(_)));
    }
}
