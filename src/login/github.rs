//! GitHub identity-provider pages: credential form, two-factor prompt,
//! OAuth consent.
//!
//! Selectors target GitHub's current login DOM and will need updating when
//! it changes.

use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::browser::{settle, BrowserSession};
use crate::config::TimeoutConfig;

const LOGIN_FIELD: &str = "#login_field";
const PASSWORD_FIELD: &str = "#password";
const LOGIN_SUBMIT: &str = "input[name='commit']";
const TOTP_FIELD: &str = "#app_totp";

/// Submit button candidates on the two-factor page, tried in order.
const TWO_FACTOR_SUBMIT: &[&str] = &[
    "button[type='submit']",
    "input[type='submit']",
    "button.btn-primary",
];

/// Pacing between filling individual form fields.
const INTER_FIELD_MIN: Duration = Duration::from_millis(500);
const INTER_FIELD_MAX: Duration = Duration::from_millis(1500);

/// Whether `url` is the GitHub credential form.
pub fn is_login_page(url: &str) -> bool {
    url.contains("github.com") && url.contains("login")
}

/// Whether `url` is the GitHub two-factor prompt.
pub fn is_two_factor_page(url: &str) -> bool {
    url.contains("two-factor") || url.contains("two_factor")
}

/// Whether `url` is the OAuth consent page.
pub fn is_consent_page(url: &str) -> bool {
    url.to_lowercase().contains("authorize")
}

/// Fill and submit the GitHub credential form.
pub async fn submit_credentials(
    session: &BrowserSession,
    username: &str,
    password: &SecretString,
    timeouts: &TimeoutConfig,
) -> Result<()> {
    let login_field = session
        .wait_for_element(LOGIN_FIELD, timeouts.element_wait)
        .await?
        .context("GitHub login form did not appear")?;

    login_field.click().await?;
    login_field.type_str(username).await?;
    settle(INTER_FIELD_MIN, INTER_FIELD_MAX).await;

    let password_field = session
        .page()
        .find_element(PASSWORD_FIELD)
        .await
        .context("GitHub password field not found")?;
    password_field.click().await?;
    password_field.type_str(password.expose_secret()).await?;
    settle(INTER_FIELD_MIN, INTER_FIELD_MAX).await;

    let submit = session
        .page()
        .find_element(LOGIN_SUBMIT)
        .await
        .context("GitHub login submit button not found")?;
    submit.click().await?;
    info!("Submitted GitHub credentials");

    Ok(())
}

/// Enter the TOTP code and submit the two-factor form.
///
/// The code is typed one character at a time; GitHub's field attaches input
/// handlers that drop bulk-inserted text.
pub async fn complete_two_factor(
    session: &BrowserSession,
    code: &str,
    timeouts: &TimeoutConfig,
) -> Result<()> {
    let field = session
        .wait_for_element(TOTP_FIELD, timeouts.element_wait)
        .await?
        .context("Two-factor input did not appear")?;

    // Clear any stale value before typing.
    let _ = session
        .page()
        .evaluate("const f = document.getElementById('app_totp'); if (f) f.value = '';")
        .await;

    field.click().await?;
    for ch in code.chars() {
        field.type_str(ch.to_string()).await?;
        tokio::time::sleep(timeouts.keystroke_delay).await;
    }
    info!("Entered two-factor code");

    for selector in TWO_FACTOR_SUBMIT {
        if let Ok(button) = session.page().find_element(*selector).await {
            if button.click().await.is_ok() {
                info!(selector, "Clicked two-factor submit button");
                return Ok(());
            }
        }
    }

    // No clickable submit button; fall back to Enter, then a script submit.
    if session.press_enter().await.is_ok() {
        info!("Submitted two-factor form with Enter");
        return Ok(());
    }

    warn!("Key dispatch failed, submitting two-factor form via script");
    session
        .page()
        .evaluate("const f = document.getElementById('app_totp'); if (f && f.form) f.form.submit();")
        .await
        .context("Failed to submit two-factor form")?;

    Ok(())
}

/// Click the consent button when the OAuth authorize page shows.
///
/// Returns whether a button was clicked; previously-authorized accounts
/// skip consent entirely.
pub async fn approve_authorization(session: &BrowserSession, timeout: Duration) -> Result<bool> {
    match session.wait_for_button_with_text("authorize", timeout).await? {
        Some(button) => {
            button
                .click()
                .await
                .context("Failed to click authorize button")?;
            info!("Clicked authorize button");
            Ok(true)
        }
        None => {
            warn!("Authorize button not found, assuming consent was already granted");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_detection() {
        assert!(is_login_page("https://github.com/login"));
        assert!(is_login_page(
            "https://github.com/login?return_to=%2Flogin%2Foauth%2Fauthorize"
        ));
        assert!(!is_login_page("https://github.com/"));
        assert!(!is_login_page("https://ap-northeast-1.run.claw.cloud/"));
    }

    #[test]
    fn two_factor_page_detection() {
        assert!(is_two_factor_page("https://github.com/sessions/two-factor"));
        assert!(is_two_factor_page(
            "https://github.com/sessions/two-factor/app"
        ));
        assert!(is_two_factor_page("https://github.com/session/two_factor"));
        assert!(!is_two_factor_page("https://github.com/login"));
    }

    #[test]
    fn consent_page_detection() {
        assert!(is_consent_page("https://github.com/login/oauth/authorize"));
        assert!(is_consent_page("https://github.com/login/oauth/AUTHORIZE"));
        assert!(!is_consent_page("https://github.com/login"));
    }
}
