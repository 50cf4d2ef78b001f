// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod client;
pub mod executor;
pub mod manager;
pub mod pool;
pub mod send;
pub mod transports;
pub mod util;
