use app_error::AppResult;
use async_trait::async_trait;
use tracing::info;

/// Outbound email boundary. Delivery is owned by an external collaborator;
/// the flows only hand over an address, a reset URL, and a display name.
#[async_trait]
pub trait MailDispatch: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str, name: &str) -> AppResult<()>;
}

/// Dispatch that only logs. Stands in wherever real delivery is wired up
/// outside this workspace.
pub struct LogMailer;

#[async_trait]
impl MailDispatch for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str, name: &str) -> AppResult<()> {
        info!(to = to, name = name, url = reset_url, "Password reset email dispatched");
        Ok(())
    }
}
