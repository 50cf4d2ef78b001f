// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::modules::mailbox::{Encryption, Mailbox};
use crate::modules::smtp::client::MaildeskSmtpClient;
use crate::{decrypt, raise_error};
use mail_send::{Credentials, SmtpClientBuilder};
use std::time::Duration;

/// Builds authenticated SMTP connections for one mailbox; the mailbox record
/// is re-read per build so credential changes take effect on the next
/// connection.
pub struct SmtpClientManager {
    mailbox_id: u64,
}

impl SmtpClientManager {
    pub fn new(mailbox_id: u64) -> Self {
        Self { mailbox_id }
    }

    pub async fn build(&self) -> MaildeskResult<MaildeskSmtpClient> {
        let mailbox = Mailbox::get(self.mailbox_id).await?;

        let smtp = mailbox.smtp.as_ref().ok_or_else(|| {
            raise_error!(
                "Mailbox has no outbound configuration".into(),
                ErrorCode::MissingConfiguration
            )
        })?;

        let password = smtp.password.as_ref().ok_or_else(|| {
            raise_error!(
                "Mailbox outbound password not set".into(),
                ErrorCode::MissingConfiguration
            )
        })?;
        let credentials = Credentials::new(mailbox.email.clone(), decrypt!(password)?);

        let timeout = Duration::from_secs(30);
        let builder = SmtpClientBuilder::new(smtp.host.clone(), smtp.port)
            .credentials(credentials)
            .timeout(timeout);

        let client = match smtp.encryption {
            Encryption::Ssl => {
                let client = builder.implicit_tls(true).connect().await.map_err(|e| {
                    raise_error!(format!("{:#?}", e), ErrorCode::SmtpConnectionFailed)
                })?;
                MaildeskSmtpClient::Tls(client)
            }
            Encryption::StartTls => {
                let client = builder.implicit_tls(false).connect().await.map_err(|e| {
                    raise_error!(format!("{:#?}", e), ErrorCode::SmtpConnectionFailed)
                })?;
                MaildeskSmtpClient::Tls(client)
            }
            Encryption::None => {
                let client = builder.connect_plain().await.map_err(|e| {
                    raise_error!(format!("{:#?}", e), ErrorCode::SmtpConnectionFailed)
                })?;
                MaildeskSmtpClient::Plain(client)
            }
        };

        Ok(client)
    }
}
