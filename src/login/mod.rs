//! The console login walk.
//!
//! A fixed sequence: navigate to the console, hand off to GitHub OAuth,
//! fill credentials, handle the two-factor prompt and consent page, wait
//! for the redirect back, then classify what the browser ended up on.

mod github;
pub mod outcome;

pub use outcome::{classify, Verdict};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info, warn};

use crate::browser::{settle, BrowserSession};
use crate::clock::{Clock, SystemClock};
use crate::config::ResolvedConfig;
use crate::credentials::{keys, CredentialStore, SessionCache, SessionData};
use crate::duration::format_duration;
use crate::notify::{LoginReport, Notifier, ReportStatus, TelegramNotifier};
use crate::totp::TotpGenerator;

/// Session cache profile used for the console.
const SESSION_PROFILE: &str = "clawcloud";

const RESULT_SCREENSHOT: &str = "result.png";
const ERROR_SCREENSHOT: &str = "error.png";
const TWO_FACTOR_SCREENSHOT: &str = "two-factor-missing-secret.png";

/// Authentication status of the cached session.
#[derive(Debug, Clone)]
pub enum AuthStatus {
    /// Session cookies exist and are fresh.
    Valid,
    /// No session exists.
    Missing,
    /// Session exists but is too old to trust.
    Expired { reason: String },
}

/// Credentials the login walk needs.
pub struct LoginCredentials {
    pub username: String,
    pub password: SecretString,
    pub totp_secret: Option<SecretString>,
}

impl LoginCredentials {
    /// Resolve credentials from a store.
    ///
    /// Returns `Ok(None)` when the username or password is missing; the
    /// TOTP secret is optional at this point and only becomes required if
    /// GitHub actually challenges.
    pub async fn resolve(store: &dyn CredentialStore) -> Result<Option<Self>> {
        let username = store.get(keys::USERNAME).await?;
        let password = store.get(keys::PASSWORD).await?;
        let totp_secret = store.get(keys::TOTP_SECRET).await?;

        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self {
                username: username.expose_secret().to_string(),
                password,
                totp_secret,
            })),
            _ => Ok(None),
        }
    }
}

/// What the browser walk produced.
enum FlowOutcome {
    /// The walk completed and the final page was classified.
    Classified {
        verdict: Verdict,
        final_url: String,
        screenshot: Option<PathBuf>,
    },
    /// GitHub challenged with a two-factor prompt but no TOTP secret is
    /// configured. Needs operator action, not a retry.
    TwoFactorUnavailable { screenshot: Option<PathBuf> },
}

/// Drives the whole login: browser, identity provider, classification,
/// session capture, notification.
pub struct LoginService {
    config: ResolvedConfig,
    store: Box<dyn CredentialStore>,
    notifiers: Vec<Box<dyn Notifier>>,
    session_cache: SessionCache,
    clock: Arc<dyn Clock>,
}

impl LoginService {
    /// Build a service from resolved configuration.
    pub async fn from_config(config: ResolvedConfig) -> Result<Self> {
        let store = config.credentials.build();
        let session_cache = SessionCache::with_path(&config.session_dir)?;

        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        match TelegramNotifier::from_store(store.as_ref(), config.timeouts.notify_request).await? {
            Some(telegram) => notifiers.push(Box::new(telegram)),
            None => info!("Telegram bot token / chat id not configured, skipping notifications"),
        }

        Ok(Self {
            config,
            store,
            notifiers,
            session_cache,
            clock: Arc::new(SystemClock),
        })
    }

    /// Swap the clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Status of the cached session, without launching a browser.
    pub async fn check_auth(&self) -> Result<AuthStatus> {
        match self.session_cache.get(SESSION_PROFILE)? {
            None => Ok(AuthStatus::Missing),
            Some(session) => {
                if session.cookies.is_empty() {
                    return Ok(AuthStatus::Missing);
                }

                if session.is_fresh(self.clock.as_ref(), self.config.session.max_age) {
                    Ok(AuthStatus::Valid)
                } else {
                    let reason = match session.age(self.clock.as_ref()) {
                        Some(age) => format!(
                            "session is {} old, max age {}",
                            format_duration(age),
                            format_duration(self.config.session.max_age)
                        ),
                        None => "session has no capture timestamp".to_string(),
                    };
                    Ok(AuthStatus::Expired { reason })
                }
            }
        }
    }

    /// Run the login flow end to end and return the verdict.
    ///
    /// Always notifies the operator before returning; errors still produce
    /// a failure notification (with a best-effort screenshot) before they
    /// propagate.
    pub async fn run(&self) -> Result<Verdict> {
        info!(console = %self.config.console_url, "Starting console login");

        let Some(creds) = LoginCredentials::resolve(self.store.as_ref()).await? else {
            let report = LoginReport::new(
                "",
                self.clock.as_ref(),
                ReportStatus::Failure {
                    reason: "Missing username or password in credential backend".to_string(),
                    screenshot: None,
                },
            );
            error!("Missing username or password, not launching a browser");
            self.notify(&report).await;
            return Ok(Verdict::LoginFailed);
        };

        info!(account = %crate::notify::mask_account(&creds.username), "Credentials resolved");

        let browser = match BrowserSession::launch(&self.config.browser).await {
            Ok(browser) => browser,
            Err(err) => {
                let report = LoginReport::new(
                    &creds.username,
                    self.clock.as_ref(),
                    ReportStatus::Failure {
                        reason: format!("Browser unavailable: {err:#}"),
                        screenshot: None,
                    },
                );
                self.notify(&report).await;
                return Err(err);
            }
        };

        match self.drive(&browser, &creds).await {
            Ok(FlowOutcome::Classified {
                verdict,
                final_url,
                screenshot,
            }) => {
                if verdict == Verdict::LoggedIn && self.config.session.reuse {
                    self.store_session(&browser).await;
                }
                browser.close();

                let status = match verdict {
                    Verdict::LoggedIn => ReportStatus::Success {
                        console_url: final_url,
                    },
                    Verdict::LoginFailed => ReportStatus::Failure {
                        reason: "GitHub sign-in or two-factor not accepted".to_string(),
                        screenshot,
                    },
                };
                let report = LoginReport::new(&creds.username, self.clock.as_ref(), status);
                self.notify(&report).await;
                Ok(verdict)
            }
            Ok(FlowOutcome::TwoFactorUnavailable { screenshot }) => {
                browser.close();
                let report = LoginReport::new(
                    &creds.username,
                    self.clock.as_ref(),
                    ReportStatus::Fatal {
                        reason: "Two-factor prompt but no TOTP secret configured".to_string(),
                        screenshot,
                    },
                );
                error!("Two-factor prompt but no TOTP secret configured");
                self.notify(&report).await;
                Ok(Verdict::LoginFailed)
            }
            Err(err) => {
                let screenshot = self.capture(&browser, ERROR_SCREENSHOT).await;
                browser.close();
                error!(error = %err, "Login flow errored");

                let report = LoginReport::new(
                    &creds.username,
                    self.clock.as_ref(),
                    ReportStatus::Failure {
                        reason: format!("{err:#}"),
                        screenshot,
                    },
                );
                self.notify(&report).await;
                Err(err)
            }
        }
    }

    /// The browser walk itself: console, OAuth hand-off, classification.
    async fn drive(
        &self,
        browser: &BrowserSession,
        creds: &LoginCredentials,
    ) -> Result<FlowOutcome> {
        let timeouts = &self.config.timeouts;
        let console_url = &self.config.console_url;

        // Apply cached cookies first so a still-valid session skips the
        // whole form walk. Navigation is needed before cookies can be
        // scoped to the console origin.
        if self.config.session.reuse {
            if let Some(cached) = self.session_cache.get(SESSION_PROFILE)? {
                if cached.is_fresh(self.clock.as_ref(), self.config.session.max_age) {
                    browser.goto(console_url).await?;
                    if browser.apply_cookies(&cached, console_url).await.is_ok() {
                        info!(cookies = cached.cookies.len(), "Applied cached session cookies");
                    }
                }
            }
        }

        info!(url = %console_url, "Navigating to console");
        browser.goto(console_url).await?;
        settle(timeouts.settle_min, timeouts.settle_max).await;

        match browser
            .wait_for_button_with_text("github", timeouts.element_wait)
            .await?
        {
            Some(button) => {
                button
                    .click()
                    .await
                    .context("Failed to click GitHub sign-in button")?;
                info!("Clicked GitHub sign-in button");
            }
            None => {
                warn!("GitHub sign-in button not found, the console may have redirected already");
            }
        }
        settle(timeouts.settle_min, timeouts.settle_max).await;

        let url = browser.current_url().await?;
        if github::is_login_page(&url) {
            info!("GitHub login page detected, filling credentials");
            github::submit_credentials(browser, &creds.username, &creds.password, timeouts).await?;
            settle(timeouts.settle_min, timeouts.settle_max).await;
        }

        let url = browser.current_url().await?;
        if github::is_two_factor_page(&url) {
            info!("Two-factor prompt detected");

            let Some(secret) = &creds.totp_secret else {
                let screenshot = self.capture(browser, TWO_FACTOR_SCREENSHOT).await;
                return Ok(FlowOutcome::TwoFactorUnavailable { screenshot });
            };

            let code = TotpGenerator::from_base32(secret)?.generate(self.clock.as_ref());
            github::complete_two_factor(browser, &code, timeouts).await?;
            settle(timeouts.settle_min, timeouts.settle_max).await;
        }

        let url = browser.current_url().await?;
        if github::is_consent_page(&url) {
            info!("OAuth consent page detected");
            github::approve_authorization(browser, timeouts.consent_wait).await?;
            settle(timeouts.settle_min, timeouts.settle_max).await;
        }

        let final_url = self.await_console_return(browser).await?;
        info!(url = %final_url, "Final URL");

        let page_text = browser.page_html().await.unwrap_or_default();
        let screenshot = self.capture(browser, RESULT_SCREENSHOT).await;

        let verdict = classify(&final_url, &page_text);
        Ok(FlowOutcome::Classified {
            verdict,
            final_url,
            screenshot,
        })
    }

    /// Poll until the browser has left GitHub or the redirect wait elapses.
    async fn await_console_return(&self, browser: &BrowserSession) -> Result<String> {
        let timeout = self.config.timeouts.oauth_redirect;
        let start = std::time::Instant::now();

        loop {
            let url = browser.current_url().await?;
            if !url.contains("github.com") && !url.is_empty() {
                return Ok(url);
            }
            if start.elapsed() >= timeout {
                info!("OAuth redirect wait elapsed");
                return Ok(url);
            }
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        }
    }

    /// Capture the page's cookies into the session cache (best-effort).
    async fn store_session(&self, browser: &BrowserSession) {
        match browser.capture_cookies().await {
            Ok(cookies) => {
                let session = SessionData {
                    cookies,
                    captured_at: Some(self.clock.now().timestamp()),
                };
                match self.session_cache.set(SESSION_PROFILE, &session) {
                    Ok(()) => info!(cookies = session.cookies.len(), "Stored session cookies"),
                    Err(err) => warn!(error = %err, "Failed to store session cookies"),
                }
            }
            Err(err) => warn!(error = %err, "Failed to capture session cookies"),
        }
    }

    async fn capture(&self, browser: &BrowserSession, name: &str) -> Option<PathBuf> {
        let path = self.config.screenshot_dir.join(name);
        match browser.save_screenshot(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Saved screenshot");
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "Failed to save screenshot");
                None
            }
        }
    }

    async fn notify(&self, report: &LoginReport) {
        for notifier in &self.notifiers {
            match notifier.send(report).await {
                Ok(()) => info!(channel = notifier.name(), "Notification sent"),
                Err(err) => {
                    warn!(channel = notifier.name(), error = %err, "Notification failed")
                }
            }
        }
    }
}
