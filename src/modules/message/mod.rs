// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use crate::modules::common::Addr;
use crate::modules::database::manager::DB_MANAGER;
use crate::modules::database::{
    batch_delete_impl, delete_impl, filter_by_secondary_key_impl, insert_impl,
    secondary_find_impl, update_impl,
};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::modules::message::attachment::{EmailAttachment, EmailAttachmentKey};
use crate::raise_error;

pub mod attachment;

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum Folder {
    #[default]
    Inbox,
    Sent,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum Direction {
    #[default]
    Inbound,
    Outbound,
}

/// One persisted message. Immutable once created, except for the read flag.
///
/// The unique `uid_key` ((mailbox, provider sequence number)) is the primary
/// inbound dedup key; the provider message-id is the fallback when no
/// sequence number is available.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[native_model(id = 4, version = 1)]
#[native_db(primary_key(pk -> String))]
pub struct Email {
    /// Unique email identifier
    #[secondary_key(unique)]
    pub id: u64,
    #[secondary_key]
    pub thread_id: u64,
    #[secondary_key]
    pub mailbox_id: u64,
    /// The operator who sent an outbound message; absent on inbound mail
    pub user_id: Option<u64>,
    /// Provider Message-Id header
    #[secondary_key(unique, optional)]
    pub message_id: Option<String>,
    /// Provider-assigned per-folder sequence number (inbound only)
    pub uid: Option<u32>,
    /// Dedup key: "{mailbox_id}:{uid}"
    #[secondary_key(unique, optional)]
    pub uid_key: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
    pub from_addr: Addr,
    pub to_addrs: Vec<Addr>,
    pub cc_addrs: Vec<Addr>,
    pub bcc_addrs: Vec<Addr>,
    pub subject: String,
    /// HTML body; plain-text-only messages are wrapped on ingestion
    pub body_html: String,
    /// Plain-text summary with quoted reply chains stripped
    pub body_text: String,
    pub folder: Folder,
    pub direction: Direction,
    pub read: bool,
    pub sent_at: Option<i64>,
    pub received_at: Option<i64>,
    /// Creation timestamp (UNIX epoch milliseconds)
    pub created_at: i64,
}

impl Email {
    fn pk(&self) -> String {
        format!("{}_{}", self.created_at, self.id)
    }

    pub fn uid_key(mailbox_id: u64, uid: u32) -> String {
        format!("{}:{}", mailbox_id, uid)
    }

    pub async fn save(&self) -> MaildeskResult<()> {
        insert_impl(DB_MANAGER.mail_db(), self.to_owned()).await
    }

    pub async fn find(email_id: u64) -> MaildeskResult<Option<Email>> {
        secondary_find_impl::<Email>(DB_MANAGER.mail_db(), EmailKey::id, email_id).await
    }

    pub async fn get(email_id: u64) -> MaildeskResult<Email> {
        Self::find(email_id).await?.ok_or_else(|| {
            raise_error!(
                format!("Email with ID '{email_id}' not found"),
                ErrorCode::ResourceNotFound
            )
        })
    }

    /// Primary dedup lookup for inbound mail.
    pub async fn find_by_uid(mailbox_id: u64, uid: u32) -> MaildeskResult<Option<Email>> {
        secondary_find_impl::<Email>(
            DB_MANAGER.mail_db(),
            EmailKey::uid_key,
            Some(Self::uid_key(mailbox_id, uid)),
        )
        .await
    }

    /// Secondary dedup lookup, used when no sequence number is available.
    pub async fn find_by_message_id(message_id: &str) -> MaildeskResult<Option<Email>> {
        secondary_find_impl::<Email>(
            DB_MANAGER.mail_db(),
            EmailKey::message_id,
            Some(message_id.to_owned()),
        )
        .await
    }

    pub async fn list_by_thread(thread_id: u64) -> MaildeskResult<Vec<Email>> {
        filter_by_secondary_key_impl(DB_MANAGER.mail_db(), EmailKey::thread_id, thread_id).await
    }

    pub async fn list_by_mailbox(mailbox_id: u64) -> MaildeskResult<Vec<Email>> {
        filter_by_secondary_key_impl(DB_MANAGER.mail_db(), EmailKey::mailbox_id, mailbox_id).await
    }

    pub async fn mark_read(email_id: u64) -> MaildeskResult<Email> {
        update_impl(
            DB_MANAGER.mail_db(),
            move |rw| {
                rw.get()
                    .secondary::<Email>(EmailKey::id, email_id)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                    .ok_or_else(|| {
                        raise_error!(
                            format!("Email with ID '{email_id}' not found"),
                            ErrorCode::ResourceNotFound
                        )
                    })
            },
            |current| {
                let mut updated = current.clone();
                updated.read = true;
                Ok(updated)
            },
        )
        .await
    }

    /// Remove an email together with its attachments. Attachment rows are
    /// exclusively owned by their email, so this is the only delete path.
    pub async fn delete_with_attachments(email_id: u64) -> MaildeskResult<()> {
        batch_delete_impl(DB_MANAGER.mail_db(), move |rw| {
            let attachments: Vec<EmailAttachment> = rw
                .scan()
                .secondary(EmailAttachmentKey::email_id)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                .start_with(email_id)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                .filter_map(Result::ok)
                .collect();
            Ok(attachments)
        })
        .await?;
        delete_impl(DB_MANAGER.mail_db(), move |rw| {
            rw.get()
                .secondary::<Email>(EmailKey::id, email_id)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                .ok_or_else(|| {
                    raise_error!(
                        format!("Email with ID '{email_id}' not found"),
                        ErrorCode::ResourceNotFound
                    )
                })
        })
        .await
    }
}
