//! Session cache for storing transient authentication state.
//!
//! Cookies captured from a successful console login are stored locally so
//! the next scheduled run can skip the GitHub form walk while they are
//! still fresh. Nothing here is synced or encrypted; it holds the same
//! cookies the browser profile would.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// Cookies captured from a browser session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    /// Session cookies (name -> value).
    #[serde(default)]
    pub cookies: HashMap<String, String>,

    /// When the session was captured (Unix timestamp).
    #[serde(default)]
    pub captured_at: Option<i64>,
}

impl SessionData {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Stamp the capture time.
    pub fn captured_now(mut self, clock: &dyn Clock) -> Self {
        self.captured_at = Some(clock.now().timestamp());
        self
    }

    /// Age of the session, if it carries a capture timestamp.
    pub fn age(&self, clock: &dyn Clock) -> Option<Duration> {
        let captured_at = self.captured_at?;
        let secs = clock.now().timestamp() - captured_at;
        Some(Duration::from_secs(secs.max(0) as u64))
    }

    /// Whether the session holds cookies younger than `max_age`.
    ///
    /// Sessions without a capture timestamp are never fresh.
    pub fn is_fresh(&self, clock: &dyn Clock, max_age: Duration) -> bool {
        if self.cookies.is_empty() {
            return false;
        }
        match self.age(clock) {
            Some(age) => age <= max_age,
            None => false,
        }
    }
}

/// Cache for session data, stored locally (not synced).
pub struct SessionCache {
    cache_dir: PathBuf,
}

impl SessionCache {
    /// Create a session cache rooted at `cache_dir`.
    pub fn with_path(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create session cache dir: {cache_dir:?}"))?;
        Ok(Self { cache_dir })
    }

    fn session_file(&self, profile: &str) -> PathBuf {
        self.cache_dir.join(format!("{profile}.json"))
    }

    /// Load session data for a profile.
    pub fn get(&self, profile: &str) -> Result<Option<SessionData>> {
        let path = self.session_file(profile);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file: {path:?}"))?;

        let session: SessionData = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {path:?}"))?;

        Ok(Some(session))
    }

    /// Save session data for a profile.
    pub fn set(&self, profile: &str, session: &SessionData) -> Result<()> {
        let path = self.session_file(profile);
        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write session file: {path:?}"))?;

        Ok(())
    }

    /// Delete session data for a profile.
    pub fn delete(&self, profile: &str) -> Result<()> {
        let path = self.session_file(profile);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete session file: {path:?}"))?;
        }
        Ok(())
    }
}
