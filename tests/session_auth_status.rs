use std::sync::Arc;

use anyhow::Result;
use clawkeeper::clock::FixedClock;
use clawkeeper::config::{BrowserOptions, ResolvedConfig, SessionConfig, TimeoutConfig};
use clawkeeper::credentials::{CredentialConfig, SessionCache, SessionData};
use clawkeeper::login::{AuthStatus, LoginService};
use tempfile::TempDir;

const PROFILE: &str = "clawcloud";

fn test_config(dir: &TempDir) -> ResolvedConfig {
    ResolvedConfig {
        data_dir: dir.path().to_path_buf(),
        screenshot_dir: dir.path().join("screenshots"),
        session_dir: dir.path().join("sessions"),
        console_url: "https://ap-northeast-1.run.claw.cloud/".to_string(),
        browser: BrowserOptions::default(),
        timeouts: TimeoutConfig::default(),
        session: SessionConfig::default(),
        credentials: CredentialConfig::default(),
    }
}

fn seed_session(dir: &TempDir, session: &SessionData) -> Result<()> {
    let cache = SessionCache::with_path(dir.path().join("sessions"))?;
    cache.set(PROFILE, session)?;
    Ok(())
}

#[tokio::test]
async fn missing_session_reports_missing() -> Result<()> {
    let dir = TempDir::new()?;
    let service = LoginService::from_config(test_config(&dir)).await?;

    assert!(matches!(service.check_auth().await?, AuthStatus::Missing));

    Ok(())
}

#[tokio::test]
async fn fresh_session_reports_valid() -> Result<()> {
    let dir = TempDir::new()?;
    let captured = FixedClock::at_unix(1_000_000);
    seed_session(
        &dir,
        &SessionData::new()
            .with_cookie("user_session", "abc")
            .captured_now(&captured),
    )?;

    let one_hour_later = FixedClock::at_unix(1_000_000 + 3600);
    let service = LoginService::from_config(test_config(&dir))
        .await?
        .with_clock(Arc::new(one_hour_later));

    assert!(matches!(service.check_auth().await?, AuthStatus::Valid));

    Ok(())
}

#[tokio::test]
async fn stale_session_reports_expired() -> Result<()> {
    let dir = TempDir::new()?;
    let captured = FixedClock::at_unix(0);
    seed_session(
        &dir,
        &SessionData::new()
            .with_cookie("user_session", "abc")
            .captured_now(&captured),
    )?;

    // Default max age is 24h; jump two days ahead.
    let later = FixedClock::at_unix(48 * 3600);
    let service = LoginService::from_config(test_config(&dir))
        .await?
        .with_clock(Arc::new(later));

    match service.check_auth().await? {
        AuthStatus::Expired { reason } => {
            assert!(reason.contains("max age"), "unexpected reason: {reason}");
        }
        other => panic!("expected expired, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn cookieless_session_reports_missing() -> Result<()> {
    let dir = TempDir::new()?;
    seed_session(
        &dir,
        &SessionData::new().captured_now(&FixedClock::at_unix(1_000_000)),
    )?;

    let service = LoginService::from_config(test_config(&dir))
        .await?
        .with_clock(Arc::new(FixedClock::at_unix(1_000_000)));

    assert!(matches!(service.check_auth().await?, AuthStatus::Missing));

    Ok(())
}
