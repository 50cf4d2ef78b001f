// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod actor;
pub mod cycle;
pub mod gate;
pub mod supervisor;
