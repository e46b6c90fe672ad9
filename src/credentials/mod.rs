//! Credential storage abstraction.
//!
//! Provides a unified interface for retrieving login and notification
//! secrets from various backends (environment variables, pass).
//!
//! # Configuration
//!
//! The `[credentials]` section of the config file selects the backend:
//!
//! ```toml
//! [credentials]
//! backend = "env"
//! ```
//!
//! or, for password-store users:
//!
//! ```toml
//! [credentials]
//! backend = "pass"
//! path = "cloud/clawcloud-github"
//!
//! [credentials.fields]
//! totp_secret = "2fa-secret"
//! ```

mod config;
mod env;
mod pass;
mod session;

pub use config::CredentialConfig;
pub use env::{EnvConfig, EnvCredentialStore};
pub use pass::{PassConfig, PassCredentialStore};
pub use session::{SessionCache, SessionData};

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;

/// Logical credential keys the login flow asks for.
///
/// Backends map these to their own locations (environment variable names,
/// pass entry fields).
pub mod keys {
    /// GitHub account name or email.
    pub const USERNAME: &str = "username";
    /// GitHub account password.
    pub const PASSWORD: &str = "password";
    /// Base32 TOTP shared secret for the two-factor prompt.
    pub const TOTP_SECRET: &str = "totp_secret";
    /// Telegram bot token for notifications.
    pub const TELEGRAM_BOT_TOKEN: &str = "telegram_bot_token";
    /// Telegram chat id for notifications.
    pub const TELEGRAM_CHAT_ID: &str = "telegram_chat_id";
}

/// A key-value store for credentials.
///
/// Implementations provide access to credentials from various backends.
/// The interface is intentionally simple - just get by logical key name.
/// The login flow defines what keys it needs, and the backend configuration
/// maps those keys to backend-specific locations.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Retrieve a credential by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist or holds an empty value.
    /// Returns `Err` if there was an error accessing the backend.
    async fn get(&self, key: &str) -> Result<Option<SecretString>>;
}
