//! Environment-variable credential backend.
//!
//! The default backend. Logical keys map to the variable names the
//! deployment environment is expected to export; surrounding whitespace is
//! trimmed and empty values count as unset.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::{keys, CredentialStore};

/// Default environment variable name for a logical key.
fn default_var_name(key: &str) -> Option<&'static str> {
    match key {
        keys::USERNAME => Some("GH_USERNAME"),
        keys::PASSWORD => Some("GH_PASSWORD"),
        keys::TOTP_SECRET => Some("GH_2FA_SECRET"),
        keys::TELEGRAM_BOT_TOKEN => Some("TG_BOT_TOKEN"),
        keys::TELEGRAM_CHAT_ID => Some("TG_CHAT_ID"),
        _ => None,
    }
}

/// Configuration for the environment credential store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Overrides from logical key names to environment variable names.
    /// Keys not listed here use the built-in `GH_*` / `TG_*` names.
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// Credential store backed by process environment variables.
pub struct EnvCredentialStore {
    config: EnvConfig,
}

impl EnvCredentialStore {
    /// Create a new environment credential store with the given configuration.
    pub fn new(config: EnvConfig) -> Self {
        Self { config }
    }

    /// Get the environment variable name for a logical key.
    fn var_name(&self, key: &str) -> Option<String> {
        if let Some(name) = self.config.vars.get(key) {
            return Some(name.clone());
        }
        default_var_name(key).map(|s| s.to_string())
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new(EnvConfig::default())
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let Some(name) = self.var_name(key) else {
            return Ok(None);
        };

        Ok(std::env::var(&name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(SecretString::from))
    }
}
