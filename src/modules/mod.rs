// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod attachment;
pub mod common;
pub mod context;
pub mod customer;
pub mod database;
pub mod error;
pub mod hook;
pub mod imap;
pub mod ingest;
pub mod logger;
pub mod mailbox;
pub mod message;
pub mod resolver;
pub mod settings;
pub mod smtp;
pub mod sync;
pub mod thread;
pub mod utils;
