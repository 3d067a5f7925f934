use thiserror::Error;

/// Failures raised while loading keys, issuing, verifying or transporting tokens.
///
/// Callers map every variant except [`AuthError::Config`] and
/// [`AuthError::Encoding`] to the same client-facing "authentication failed"
/// response; the variant itself is only for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Missing, unreadable or invalid key material. Fatal at startup.
    #[error("invalid key configuration: {0}")]
    Config(String),

    #[error("token signed with unknown key {0:?}")]
    UnknownKey(String),

    /// Cryptographic verification failed. Deliberately carries no detail.
    #[error("token signature is invalid")]
    Signature,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token is expired")]
    Expired,

    #[error("invalid audience {0:?}")]
    InvalidAudience(Vec<String>),

    #[error("token is malformed")]
    Malformed,

    #[error("no access token credentials in request")]
    NoCredentials,

    #[error("authorization header is not a valid bearer token")]
    MalformedHeader,

    #[error("no refresh token in request")]
    NoRefreshToken,

    /// The access and refresh tokens were not issued by the same login.
    #[error("access and refresh tokens do not belong together")]
    TokenMismatch,

    #[error("invalid subject {0:?}")]
    InvalidSubject(String),

    #[error("could not encode token: {0}")]
    Encoding(String),
}

impl AuthError {
    /// Stable label for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Config(_) => "config",
            AuthError::UnknownKey(_) => "unknown_key",
            AuthError::Signature => "signature",
            AuthError::NotYetValid => "not_yet_valid",
            AuthError::Expired => "expired",
            AuthError::InvalidAudience(_) => "invalid_audience",
            AuthError::Malformed => "malformed",
            AuthError::NoCredentials => "no_credentials",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::NoRefreshToken => "no_refresh_token",
            AuthError::TokenMismatch => "token_mismatch",
            AuthError::InvalidSubject(_) => "invalid_subject",
            AuthError::Encoding(_) => "encoding",
        }
    }

    /// True for failures caused by what the client presented, as opposed to
    /// server-side faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Config(_) | AuthError::Encoding(_))
    }
}
