// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::modules::imap::client::Client;
use crate::modules::imap::session::SessionStream;
use crate::modules::mailbox::Mailbox;
use crate::{decrypt, raise_error};
use async_imap::Session;
use tracing::error;

/// Builds one authenticated IMAP session for a mailbox. The mailbox record is
/// re-read on every build so a reconnect picks up credential changes.
#[derive(Debug)]
pub struct ImapConnectionManager {
    pub mailbox_id: u64,
}

impl ImapConnectionManager {
    pub fn new(mailbox_id: u64) -> Self {
        Self { mailbox_id }
    }

    pub async fn fetch_mailbox(&self) -> MaildeskResult<Mailbox> {
        Mailbox::get(self.mailbox_id).await
    }

    async fn create_client(&self, mailbox: &Mailbox) -> MaildeskResult<Client> {
        let imap = mailbox.imap.clone().ok_or_else(|| {
            raise_error!(
                "Mailbox has no inbound configuration".into(),
                ErrorCode::MissingConfiguration
            )
        })?;
        Client::connection(imap.host, imap.encryption, imap.port).await
    }

    async fn authenticate(
        &self,
        client: Client,
        mailbox: &Mailbox,
    ) -> MaildeskResult<Session<Box<dyn SessionStream>>> {
        let imap = mailbox.imap.clone().ok_or_else(|| {
            raise_error!(
                "Mailbox has no inbound configuration".into(),
                ErrorCode::MissingConfiguration
            )
        })?;

        let password = imap.password.clone().ok_or_else(|| {
            raise_error!(
                "Mailbox inbound password not set".into(),
                ErrorCode::MissingConfiguration
            )
        })?;

        let password = decrypt!(&password)?;
        client.login(&mailbox.email, &password).await
    }

    pub async fn build(&self) -> MaildeskResult<Session<Box<dyn SessionStream>>> {
        let mailbox = self.fetch_mailbox().await?;

        let client = match self.create_client(&mailbox).await {
            Ok(client) => client,
            Err(error) => {
                error!(
                    "Failed to create IMAP {}'s client: {:#?}",
                    &mailbox.email, error
                );
                return Err(error);
            }
        };

        match self.authenticate(client, &mailbox).await {
            Ok(session) => Ok(session),
            Err(error) => {
                error!("Failed to authenticate IMAP session: {:#?}", error);
                Err(error)
            }
        }
    }
}
