// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use crate::modules::database::manager::DB_MANAGER;
use crate::modules::database::{
    delete_impl, filter_by_secondary_key_impl, insert_impl, list_all_impl, secondary_find_impl,
    update_impl,
};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::{encrypt, id, raise_error, utc_now, validate_email};

pub mod payload;

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum Encryption {
    #[default]
    Ssl,
    StartTls,
    None,
}

/// Inbound (IMAP) server configuration for one mailbox.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub encryption: Encryption,
    /// Login password, encrypted at rest
    pub password: Option<String>,
}

/// Outbound (SMTP) server configuration for one mailbox.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub encryption: Encryption,
    /// Login password, encrypted at rest
    pub password: Option<String>,
}

impl ImapConfig {
    pub fn try_encrypt_password(mut self) -> MaildeskResult<Self> {
        if let Some(password) = self.password.take() {
            self.password = Some(encrypt!(&password)?);
        }
        Ok(self)
    }
}

impl SmtpConfig {
    pub fn try_encrypt_password(mut self) -> MaildeskResult<Self> {
        if let Some(password) = self.password.take() {
            self.password = Some(encrypt!(&password)?);
        }
        Ok(self)
    }
}

/// A connected mail account owned by a business. At most one live provider
/// session exists per mailbox; the session is owned by its mailbox actor for
/// the lifetime of the mailbox.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[native_model(id = 1, version = 1)]
#[native_db(primary_key(pk -> String))]
pub struct Mailbox {
    /// Unique mailbox identifier
    #[secondary_key(unique)]
    pub id: u64,
    /// Owning business
    #[secondary_key]
    pub business_id: u64,
    /// Address mail is received on and sent from
    pub email: String,
    /// Display name used on outbound mail (optional)
    pub display_name: Option<String>,
    /// IMAP server configuration
    pub imap: Option<ImapConfig>,
    /// SMTP server configuration
    pub smtp: Option<SmtpConfig>,
    /// A disabled mailbox keeps its data but gets no session
    pub enabled: bool,
    /// Creation timestamp (UNIX epoch milliseconds)
    pub created_at: i64,
    /// Last update timestamp (UNIX epoch milliseconds)
    pub updated_at: i64,
}

impl Mailbox {
    fn pk(&self) -> String {
        format!("{}_{}", self.created_at, self.id)
    }

    pub fn create(request: payload::MailboxCreateRequest) -> MaildeskResult<Self> {
        validate_email!(&request.email)?;
        Ok(Self {
            id: id!(64),
            business_id: request.business_id,
            email: request.email,
            display_name: request.display_name,
            imap: request
                .imap
                .map(|imap| imap.try_encrypt_password())
                .transpose()?,
            smtp: request
                .smtp
                .map(|smtp| smtp.try_encrypt_password())
                .transpose()?,
            enabled: request.enabled,
            created_at: utc_now!(),
            updated_at: utc_now!(),
        })
    }

    /// A mailbox without complete inbound credentials is skipped at session
    /// startup, not retried.
    pub fn has_inbound_credentials(&self) -> bool {
        self.imap
            .as_ref()
            .is_some_and(|imap| !imap.host.is_empty() && imap.password.is_some())
    }

    pub fn has_outbound_credentials(&self) -> bool {
        self.smtp
            .as_ref()
            .is_some_and(|smtp| !smtp.host.is_empty() && smtp.password.is_some())
    }

    pub async fn get(mailbox_id: u64) -> MaildeskResult<Mailbox> {
        Self::find(mailbox_id).await?.ok_or_else(|| {
            raise_error!(
                format!("Mailbox with ID '{mailbox_id}' not found"),
                ErrorCode::ResourceNotFound
            )
        })
    }

    pub async fn find(mailbox_id: u64) -> MaildeskResult<Option<Mailbox>> {
        secondary_find_impl::<Mailbox>(DB_MANAGER.meta_db(), MailboxKey::id, mailbox_id).await
    }

    pub async fn list_all() -> MaildeskResult<Vec<Mailbox>> {
        list_all_impl(DB_MANAGER.meta_db()).await
    }

    pub async fn list_by_business(business_id: u64) -> MaildeskResult<Vec<Mailbox>> {
        filter_by_secondary_key_impl(DB_MANAGER.meta_db(), MailboxKey::business_id, business_id)
            .await
    }

    pub async fn save(&self) -> MaildeskResult<()> {
        insert_impl(DB_MANAGER.meta_db(), self.to_owned()).await
    }

    pub async fn set_enabled(mailbox_id: u64, enabled: bool) -> MaildeskResult<Mailbox> {
        update_impl(
            DB_MANAGER.meta_db(),
            move |rw| {
                rw.get()
                    .secondary::<Mailbox>(MailboxKey::id, mailbox_id)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                    .ok_or_else(|| {
                        raise_error!(
                            format!("Mailbox with ID '{mailbox_id}' not found"),
                            ErrorCode::ResourceNotFound
                        )
                    })
            },
            move |current| {
                let mut updated = current.clone();
                updated.enabled = enabled;
                updated.updated_at = utc_now!();
                Ok(updated)
            },
        )
        .await
    }

    pub async fn delete(mailbox_id: u64) -> MaildeskResult<()> {
        delete_impl(DB_MANAGER.meta_db(), move |rw| {
            rw.get()
                .secondary::<Mailbox>(MailboxKey::id, mailbox_id)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                .ok_or_else(|| {
                    raise_error!(
                        format!("Mailbox with ID '{mailbox_id}' not found"),
                        ErrorCode::ResourceNotFound
                    )
                })
        })
        .await
    }
}
