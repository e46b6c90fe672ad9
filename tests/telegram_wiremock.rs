use std::time::Duration;

use anyhow::Result;
use clawkeeper::clock::FixedClock;
use clawkeeper::notify::{LoginReport, Notifier, ReportStatus, TelegramNotifier};
use secrecy::SecretString;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn success_report() -> LoginReport {
    LoginReport::new(
        "octocat@example.com",
        &FixedClock::at_unix(1_700_000_000),
        ReportStatus::Success {
            console_url: "https://ap-northeast-1.run.claw.cloud/private-team".to_string(),
        },
    )
}

fn notifier(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::new(
        SecretString::from("TEST_TOKEN".to_string()),
        "42".to_string(),
        Duration::from_secs(5),
    )
    .expect("failed to build notifier")
    .with_base_url(server.uri())
}

#[tokio::test]
async fn send_message_posts_to_bot_endpoint() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/botTEST_TOKEN/sendMessage"))
        .and(body_partial_json(serde_json::json!({
            "chat_id": "42",
            "disable_web_page_preview": true,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server).send(&success_report()).await?;

    Ok(())
}

#[tokio::test]
async fn message_text_carries_the_rendered_report() -> Result<()> {
    let server = MockServer::start().await;

    let report = success_report();
    Mock::given(method("POST"))
        .and(path("/botTEST_TOKEN/sendMessage"))
        .and(body_partial_json(serde_json::json!({
            "text": report.render(),
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server).send(&report).await?;

    Ok(())
}

#[tokio::test]
async fn non_success_status_surfaces_as_error() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(
            r#"{"ok":false,"description":"Forbidden: bot was blocked"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let err = notifier(&server)
        .send(&success_report())
        .await
        .expect_err("403 must be an error");

    assert!(err.to_string().contains("403"), "unexpected error: {err}");

    Ok(())
}
