pub mod auth;
pub mod status;

pub use self::auth::model::LoginRequest;
