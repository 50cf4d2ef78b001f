// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::modules::smtp::{executor::SmtpExecutor, pool::build_smtp_pool};
use crate::raise_error;
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};
use tracing::info;

pub static MAIL_TRANSPORTS: LazyLock<MailTransports> = LazyLock::new(MailTransports::new);

/// Lazily created, pooled SMTP transport per mailbox.
pub struct MailTransports {
    smtp: DashMap<u64, Arc<SmtpExecutor>>,
}

impl MailTransports {
    pub fn new() -> Self {
        Self {
            smtp: DashMap::new(),
        }
    }

    pub async fn smtp(&self, mailbox_id: u64) -> MaildeskResult<Arc<SmtpExecutor>> {
        if let Some(executor) = self.smtp.get(&mailbox_id) {
            return Ok(executor.value().clone());
        }

        let pool = build_smtp_pool(mailbox_id).await?;
        let new_executor = Arc::new(SmtpExecutor::new(pool));

        match self.smtp.try_entry(mailbox_id) {
            Some(dashmap::mapref::entry::Entry::Occupied(entry)) => Ok(entry.get().clone()),
            Some(dashmap::mapref::entry::Entry::Vacant(entry)) => {
                entry.insert(new_executor.clone());
                Ok(new_executor)
            }
            None => Err(raise_error!(
                "DashMap locked".into(),
                ErrorCode::InternalError
            )),
        }
    }

    pub fn clean_mailbox(&self, mailbox_id: u64) {
        if self.smtp.remove(&mailbox_id).is_some() {
            info!(mailbox_id, "Closed SMTP pool for mailbox");
        }
    }
}
