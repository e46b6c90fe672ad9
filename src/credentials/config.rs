//! Credential backend configuration.
//!
//! Defines the `[credentials]` config section that selects which backend
//! to use and how to configure it.

use serde::{Deserialize, Serialize};

use super::env::{EnvConfig, EnvCredentialStore};
use super::pass::{PassConfig, PassCredentialStore};
use super::CredentialStore;

/// Configuration for a credential store.
///
/// # Example
///
/// ```toml
/// backend = "pass"
/// path = "cloud/clawcloud-github"
///
/// [fields]
/// totp_secret = "2fa-secret"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CredentialConfig {
    /// Environment variable backend (the default).
    Env {
        #[serde(flatten)]
        config: EnvConfig,
    },
    /// Password-store (pass) backend.
    Pass {
        #[serde(flatten)]
        config: PassConfig,
    },
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig::Env {
            config: EnvConfig::default(),
        }
    }
}

impl CredentialConfig {
    /// Build a credential store from this configuration.
    pub fn build(&self) -> Box<dyn CredentialStore> {
        match self {
            CredentialConfig::Env { config } => Box::new(EnvCredentialStore::new(config.clone())),
            CredentialConfig::Pass { config } => Box::new(PassCredentialStore::new(config.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_env_config_with_overrides() -> Result<()> {
        let config: CredentialConfig = toml::from_str(
            r#"
backend = "env"

[vars]
username = "MY_USERNAME"
"#,
        )?;

        match config {
            CredentialConfig::Env { config } => {
                assert_eq!(config.vars.get("username"), Some(&"MY_USERNAME".to_string()));
            }
            other => panic!("expected env backend, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn test_parse_pass_config() -> Result<()> {
        let config: CredentialConfig = toml::from_str(
            r#"
backend = "pass"
path = "cloud/clawcloud-github"

[fields]
totp_secret = "2fa-secret"
"#,
        )?;

        match config {
            CredentialConfig::Pass { config } => {
                assert_eq!(config.path, "cloud/clawcloud-github");
                assert_eq!(
                    config.fields.get("totp_secret"),
                    Some(&"2fa-secret".to_string())
                );
            }
            other => panic!("expected pass backend, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn test_default_is_env() {
        assert!(matches!(
            CredentialConfig::default(),
            CredentialConfig::Env { .. }
        ));
    }
}
