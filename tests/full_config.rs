use std::time::Duration;

use anyhow::Result;
use clawkeeper::config::ResolvedConfig;
use clawkeeper::credentials::CredentialConfig;
use tempfile::TempDir;

#[test]
fn full_config_round_trips_through_resolution() -> Result<()> {
    let dir = TempDir::new()?;
    let config_path = dir.path().join("clawkeeper.toml");

    std::fs::write(
        &config_path,
        r#"
data_dir = "./state"

[console]
region = "us-west-1"

[browser]
headless = false
window_width = 1280
window_height = 720

[timeouts]
element_wait = "15s"
oauth_redirect = "45s"
settle_min = "1s"
settle_max = "2s"
keystroke_delay = "50ms"

[session]
reuse = true
max_age = "12h"

[credentials]
backend = "pass"
path = "cloud/clawcloud-github"

[credentials.fields]
totp_secret = "2fa-secret"
"#,
    )?;

    let resolved = ResolvedConfig::load(&config_path)?;

    assert_eq!(resolved.console_url, "https://us-west-1.run.claw.cloud/");
    assert!(!resolved.browser.headless);
    assert_eq!(resolved.browser.window_width, 1280);
    assert_eq!(resolved.timeouts.element_wait, Duration::from_secs(15));
    assert_eq!(resolved.timeouts.oauth_redirect, Duration::from_secs(45));
    assert_eq!(resolved.timeouts.keystroke_delay, Duration::from_millis(50));
    assert_eq!(resolved.session.max_age, Duration::from_secs(12 * 3600));

    assert!(resolved.data_dir.ends_with("state"));
    assert!(resolved.screenshot_dir.ends_with("state/screenshots"));
    assert!(resolved.session_dir.ends_with("state/sessions"));

    match resolved.credentials {
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
fn empty_config_gets_full_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let config_path = dir.path().join("clawkeeper.toml");
    std::fs::write(&config_path, "")?;

    let resolved = ResolvedConfig::load(&config_path)?;

    assert_eq!(
        resolved.console_url,
        "https://ap-northeast-1.run.claw.cloud/"
    );
    assert!(resolved.browser.headless);
    assert_eq!(resolved.timeouts.element_wait, Duration::from_secs(10));
    assert_eq!(resolved.session.max_age, Duration::from_secs(24 * 3600));
    assert!(matches!(resolved.credentials, CredentialConfig::Env { .. }));

    Ok(())
}
