// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use crate::modules::database::manager::DB_MANAGER;
use crate::modules::database::{
    filter_by_secondary_key_impl, secondary_find_impl, update_impl, update_or_insert_impl,
};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::{id, raise_error, utc_now};

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub enum ThreadStatus {
    #[default]
    New,
    Opened,
}

/// The single ongoing conversation grouping every email exchanged between one
/// mailbox and one resolved customer. The unique `pair_key` constraint is
/// what guarantees at most one current thread per (mailbox, customer) pair,
/// however many writers race on it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[native_model(id = 3, version = 1)]
#[native_db(primary_key(pk -> String))]
pub struct EmailThread {
    /// Unique thread identifier
    #[secondary_key(unique)]
    pub id: u64,
    #[secondary_key]
    pub business_id: u64,
    #[secondary_key]
    pub mailbox_id: u64,
    /// The resolved counterpart; absent only for threads created outside the
    /// sync engine
    pub customer_id: Option<u64>,
    /// Threading key: "{mailbox_id}:{customer_id}"
    #[secondary_key(unique, optional)]
    pub pair_key: Option<String>,
    /// Subject of the message that opened the conversation
    pub subject: String,
    pub status: ThreadStatus,
    pub starred: bool,
    pub archived: bool,
    pub trashed: bool,
    /// Timestamp of the most recent message in either direction
    pub last_message_at: i64,
    /// Provider message-id of the most recent message; seeds `In-Reply-To`
    /// on the next outbound reply
    pub last_message_id: Option<String>,
    /// Accumulated message-id chain backing the `References` header
    pub reference_ids: Vec<String>,
    /// Creation timestamp (UNIX epoch milliseconds)
    pub created_at: i64,
}

impl EmailThread {
    fn pk(&self) -> String {
        format!("{}_{}", self.created_at, self.id)
    }

    pub fn pair_key(mailbox_id: u64, customer_id: u64) -> String {
        format!("{}:{}", mailbox_id, customer_id)
    }

    /// Find-or-create keyed by (mailbox_id, customer_id), executed in one
    /// transaction. An existing thread is reused regardless of its archive
    /// state; only when none exists is a new one created, seeded with the
    /// triggering message's subject.
    pub async fn find_or_create(
        business_id: u64,
        mailbox_id: u64,
        customer_id: u64,
        subject_hint: &str,
    ) -> MaildeskResult<EmailThread> {
        let pair_key = Self::pair_key(mailbox_id, customer_id);
        let find_key = pair_key.clone();
        let subject = subject_hint.to_owned();
        update_or_insert_impl(
            DB_MANAGER.mail_db(),
            move |rw| {
                rw.get()
                    .secondary::<EmailThread>(EmailThreadKey::pair_key, Some(find_key))
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
            },
            |current| Ok(current.clone()),
            move || {
                Ok(EmailThread {
                    id: id!(64),
                    business_id,
                    mailbox_id,
                    customer_id: Some(customer_id),
                    pair_key: Some(pair_key),
                    subject,
                    status: ThreadStatus::New,
                    starred: false,
                    archived: false,
                    trashed: false,
                    last_message_at: utc_now!(),
                    last_message_id: None,
                    reference_ids: vec![],
                    created_at: utc_now!(),
                })
            },
        )
        .await
    }

    /// Fold a newly persisted message into the thread: bump the last-message
    /// fields and append its message-id to the references chain.
    pub async fn record_message(
        thread_id: u64,
        message_id: Option<String>,
        at: i64,
    ) -> MaildeskResult<EmailThread> {
        update_impl(
            DB_MANAGER.mail_db(),
            move |rw| {
                rw.get()
                    .secondary::<EmailThread>(EmailThreadKey::id, thread_id)
                    .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
                    .ok_or_else(|| {
                        raise_error!(
                            format!("Thread with ID '{thread_id}' not found"),
                            ErrorCode::ResourceNotFound
                        )
                    })
            },
            move |current| {
                let mut updated = current.clone();
                updated.last_message_at = at;
                if let Some(message_id) = message_id {
                    if !updated.reference_ids.contains(&message_id) {
                        updated.reference_ids.push(message_id.clone());
                    }
                    updated.last_message_id = Some(message_id);
                }
                Ok(updated)
            },
        )
        .await
    }

    pub async fn get(thread_id: u64) -> MaildeskResult<EmailThread> {
        Self::find(thread_id).await?.ok_or_else(|| {
            raise_error!(
                format!("Thread with ID '{thread_id}' not found"),
                ErrorCode::ResourceNotFound
            )
        })
    }

    pub async fn find(thread_id: u64) -> MaildeskResult<Option<EmailThread>> {
        secondary_find_impl::<EmailThread>(DB_MANAGER.mail_db(), EmailThreadKey::id, thread_id)
            .await
    }

    pub async fn list_by_mailbox(mailbox_id: u64) -> MaildeskResult<Vec<EmailThread>> {
        filter_by_secondary_key_impl(DB_MANAGER.mail_db(), EmailThreadKey::mailbox_id, mailbox_id)
            .await
    }

    /// The `References` header value for the next outbound reply.
    pub fn references_header(&self) -> Option<String> {
        if self.reference_ids.is_empty() {
            None
        } else {
            Some(self.reference_ids.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_returns_one_thread_per_pair() {
        let business_id = id!(64);
        let mailbox_id = id!(64);
        let customer_id = id!(64);

        let first = EmailThread::find_or_create(business_id, mailbox_id, customer_id, "Order #55")
            .await
            .unwrap();
        let second = EmailThread::find_or_create(business_id, mailbox_id, customer_id, "Other")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        // the reused thread keeps its original subject
        assert_eq!(second.subject, "Order #55");
    }

    #[tokio::test]
    async fn record_message_accumulates_the_reference_chain() {
        let thread = EmailThread::find_or_create(id!(64), id!(64), id!(64), "Hello")
            .await
            .unwrap();

        let updated =
            EmailThread::record_message(thread.id, Some("<m1@acme.com>".into()), utc_now!())
                .await
                .unwrap();
        assert_eq!(updated.last_message_id.as_deref(), Some("<m1@acme.com>"));

        let updated =
            EmailThread::record_message(thread.id, Some("<m2@acme.com>".into()), utc_now!())
                .await
                .unwrap();
        assert_eq!(updated.last_message_id.as_deref(), Some("<m2@acme.com>"));
        assert_eq!(
            updated.references_header().unwrap(),
            "<m1@acme.com> <m2@acme.com>"
        );

        // re-recording the same id does not duplicate it
        let updated =
            EmailThread::record_message(thread.id, Some("<m2@acme.com>".into()), utc_now!())
                .await
                .unwrap();
        assert_eq!(updated.reference_ids.len(), 2);
    }
}
