//! Password-store (pass) credential backend.
//!
//! Retrieves credentials from a single pass entry. The first line is the
//! account password; additional fields use the `field-name: value` format.

use std::collections::HashMap;
use std::process::Command;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::CredentialStore;

/// Configuration for a pass credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    /// The pass entry path (e.g., "cloud/clawcloud-github").
    pub path: String,

    /// Mapping from logical key names to field names in the pass entry.
    /// If not specified, the logical key name is used as-is.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// Credential store backed by password-store (pass).
///
/// Reads credentials from a pass entry, parsing fields in the format:
/// ```text
/// field-name: value
/// ```
///
/// The first line of the entry is treated as the "password" field.
pub struct PassCredentialStore {
    config: PassConfig,
}

impl PassCredentialStore {
    /// Create a new pass credential store with the given configuration.
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    /// Create a store for a simple pass entry path, using key names directly as field names.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self::new(PassConfig {
            path: path.into(),
            fields: HashMap::new(),
        })
    }

    /// Get the field name in the pass entry for a logical key.
    fn field_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.config
            .fields
            .get(key)
            .map(|s| s.as_str())
            .unwrap_or(key)
    }

    /// Read and parse the pass entry.
    fn read_entry(&self) -> Result<PassEntry> {
        let output = Command::new("pass")
            .arg("show")
            .arg(&self.config.path)
            .output()
            .context("Failed to run pass command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("pass command failed: {}", stderr.trim());
        }

        let content = String::from_utf8(output.stdout).context("Invalid UTF-8 in pass output")?;

        Ok(PassEntry::parse(&content))
    }
}

#[async_trait]
impl CredentialStore for PassCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let field = self.field_name(key);
        let entry = self.read_entry()?;

        Ok(entry
            .fields
            .get(field)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(SecretString::from))
    }
}

/// Parsed pass entry.
#[derive(Debug, Default)]
struct PassEntry {
    /// Fields in `name: value` format, plus the first line as "password".
    fields: HashMap<String, String>,
}

impl PassEntry {
    /// Parse a pass entry from its raw content.
    fn parse(content: &str) -> Self {
        let mut lines = content.lines();
        let mut fields = HashMap::new();

        // First line is traditionally the password
        if let Some(password) = lines.next() {
            fields.insert("password".to_string(), password.to_string());
        }

        for line in lines {
            if let Some((key, value)) = line.split_once(": ") {
                // Handle escaped newlines in values
                let value = value.replace("\\n", "\n");
                fields.insert(key.to_string(), value);
            }
        }

        Self { fields }
    }
}
