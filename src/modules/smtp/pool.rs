use crate::modules::error::MaildeskError;
use crate::modules::error::MaildeskResult;
use crate::modules::settings::cli::SETTINGS;
use crate::modules::smtp::client::MaildeskSmtpClient;
use crate::modules::smtp::client::Sender;
use crate::modules::smtp::manager::SmtpClientManager;
use bb8::Pool;
use std::time::Duration;

impl bb8::ManageConnection for SmtpClientManager {
    type Connection = MaildeskSmtpClient;
    type Error = MaildeskError;

    async fn connect(&self) -> MaildeskResult<Self::Connection> {
        self.build().await
    }

    // call this function before using the connection
    async fn is_valid(&self, conn: &mut Self::Connection) -> MaildeskResult<()> {
        conn.send_noop().await?;
        conn.reset().await
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}

pub async fn build_smtp_pool(mailbox_id: u64) -> MaildeskResult<Pool<SmtpClientManager>> {
    let manager = SmtpClientManager::new(mailbox_id);
    let pool = Pool::builder()
        .connection_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(120))
        .retry_connection(true)
        .max_size(SETTINGS.maildesk_smtp_pool_size)
        .test_on_check_out(true)
        .build(manager)
        .await?;
    Ok(pool)
}
