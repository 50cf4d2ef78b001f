// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::MaildeskResult;

pub mod periodic;

pub trait Initialize {
    async fn initialize() -> MaildeskResult<()>;
}
