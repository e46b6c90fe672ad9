//! Operator-facing login reports.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::clock::Clock;

/// Mask an account name for logs and notifications.
///
/// `octocat@example.com` becomes `oct***@example.com`; short local parts
/// keep a single character. Anything that doesn't look like an email masks
/// to `unknown`.
pub fn mask_account(account: &str) -> String {
    let Some((name, domain)) = account.split_once('@') else {
        return "unknown".to_string();
    };
    if name.is_empty() || domain.is_empty() {
        return "unknown".to_string();
    }

    let keep = if name.chars().count() <= 3 { 1 } else { 3 };
    let prefix: String = name.chars().take(keep).collect();
    format!("{prefix}***@{domain}")
}

/// Outcome carried by a [`LoginReport`].
#[derive(Debug, Clone)]
pub enum ReportStatus {
    /// The flow ended on an authenticated console page.
    Success { console_url: String },
    /// The flow completed but the console never accepted the login.
    Failure {
        reason: String,
        screenshot: Option<PathBuf>,
    },
    /// The flow cannot proceed at all (e.g. a two-factor prompt with no
    /// TOTP secret configured). Needs operator action, not a retry.
    Fatal {
        reason: String,
        screenshot: Option<PathBuf>,
    },
}

/// A formatted status message for the operator.
#[derive(Debug, Clone)]
pub struct LoginReport {
    /// Account identifier, already masked.
    pub account: String,
    /// When the report was produced.
    pub at: DateTime<Utc>,
    pub status: ReportStatus,
}

impl LoginReport {
    pub fn new(account: &str, clock: &dyn Clock, status: ReportStatus) -> Self {
        Self {
            account: mask_account(account),
            at: clock.now(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ReportStatus::Success { .. })
    }

    /// Render the message body sent to the operator.
    pub fn render(&self) -> String {
        let when = self.at.format("%Y-%m-%d %H:%M:%S");
        let header = format!("👤 Account: {}\n🕒 Time: {}", self.account, when);

        match &self.status {
            ReportStatus::Success { console_url } => {
                format!("🎉 ClawCloud login succeeded\n\n{header}\n🌐 Console:\n{console_url}")
            }
            ReportStatus::Failure { reason, screenshot } => {
                let mut text = format!("❌ ClawCloud login failed\n\n{header}\n⚠️ Reason: {reason}");
                if let Some(path) = screenshot {
                    text.push_str(&format!("\n📸 Screenshot: {}", path.display()));
                }
                text
            }
            ReportStatus::Fatal { reason, screenshot } => {
                let mut text =
                    format!("🚨 ClawCloud login interrupted\n\n{header}\n❌ Reason: {reason}");
                if let Some(path) = screenshot {
                    text.push_str(&format!("\n📸 Screenshot: {}", path.display()));
                }
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn mask_keeps_three_chars_of_long_names() {
        assert_eq!(mask_account("octocat@example.com"), "oct***@example.com");
    }

    #[test]
    fn mask_keeps_one_char_of_short_names() {
        assert_eq!(mask_account("abc@example.com"), "a***@example.com");
        assert_eq!(mask_account("a@example.com"), "a***@example.com");
    }

    #[test]
    fn mask_rejects_non_addresses() {
        assert_eq!(mask_account("not-an-email"), "unknown");
        assert_eq!(mask_account(""), "unknown");
        assert_eq!(mask_account("@example.com"), "unknown");
        assert_eq!(mask_account("name@"), "unknown");
    }

    #[test]
    fn success_report_includes_console_url() {
        let clock = FixedClock::at_unix(1_700_000_000);
        let report = LoginReport::new(
            "octocat@example.com",
            &clock,
            ReportStatus::Success {
                console_url: "https://console.example/workspace".to_string(),
            },
        );

        let text = report.render();
        assert!(text.contains("login succeeded"));
        assert!(text.contains("oct***@example.com"));
        assert!(text.contains("https://console.example/workspace"));
        // Timestamp renders as wall-clock, not epoch
        assert!(text.contains("2023-11-14"));
    }

    #[test]
    fn failure_report_includes_screenshot_path() {
        let clock = FixedClock::at_unix(1_700_000_000);
        let report = LoginReport::new(
            "octocat@example.com",
            &clock,
            ReportStatus::Failure {
                reason: "GitHub sign-in or two-factor not accepted".to_string(),
                screenshot: Some(PathBuf::from("/tmp/result.png")),
            },
        );

        let text = report.render();
        assert!(text.contains("login failed"));
        assert!(text.contains("/tmp/result.png"));
        assert!(!report.is_success());
    }

    #[test]
    fn fatal_report_uses_distinct_wording() {
        let clock = FixedClock::at_unix(1_700_000_000);
        let report = LoginReport::new(
            "octocat@example.com",
            &clock,
            ReportStatus::Fatal {
                reason: "Two-factor prompt but no TOTP secret configured".to_string(),
                screenshot: None,
            },
        );

        let text = report.render();
        assert!(text.contains("login interrupted"));
        assert!(!text.contains("login failed"));
    }
}
