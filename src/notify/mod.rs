//! Operator notification channels.

mod report;
mod telegram;

pub use report::{mask_account, LoginReport, ReportStatus};
pub use telegram::TelegramNotifier;

use anyhow::Result;
use async_trait::async_trait;

/// A channel that can deliver a login report to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable name for this channel.
    fn name(&self) -> &str;

    /// Deliver the report.
    async fn send(&self, report: &LoginReport) -> Result<()>;
}
