// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

use crate::modules::database::manager::DB_MANAGER;
use crate::modules::database::{batch_insert_impl, filter_by_secondary_key_impl};
use crate::modules::error::MaildeskResult;

/// Metadata for one stored attachment, exclusively owned by its email.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[native_model(id = 5, version = 1)]
#[native_db(primary_key(pk -> String))]
pub struct EmailAttachment {
    /// Unique attachment identifier
    #[secondary_key(unique)]
    pub id: u64,
    #[secondary_key]
    pub email_id: u64,
    /// Generated collision-resistant file name
    pub file_name: String,
    /// Path relative to the attachment root
    pub stored_path: String,
    pub mime_type: String,
    pub size: u64,
    /// Creation timestamp (UNIX epoch milliseconds)
    pub created_at: i64,
}

impl EmailAttachment {
    fn pk(&self) -> String {
        format!("{}_{}", self.created_at, self.id)
    }

    pub async fn batch_insert(records: Vec<EmailAttachment>) -> MaildeskResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        batch_insert_impl(DB_MANAGER.mail_db(), records).await
    }

    pub async fn list_by_email(email_id: u64) -> MaildeskResult<Vec<EmailAttachment>> {
        filter_by_secondary_key_impl(DB_MANAGER.mail_db(), EmailAttachmentKey::email_id, email_id)
            .await
    }
}
