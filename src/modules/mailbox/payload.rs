// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use crate::modules::mailbox::{ImapConfig, SmtpConfig};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MailboxCreateRequest {
    /// Owning business
    pub business_id: u64,
    /// Address mail is received on and sent from
    pub email: String,
    /// Display name used on outbound mail (optional)
    pub display_name: Option<String>,
    /// IMAP server configuration; plaintext password, encrypted before storage
    pub imap: Option<ImapConfig>,
    /// SMTP server configuration; plaintext password, encrypted before storage
    pub smtp: Option<SmtpConfig>,
    /// Whether a session should be started for this mailbox
    pub enabled: bool,
}
