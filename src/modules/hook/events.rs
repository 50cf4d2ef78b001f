// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    id,
    modules::{
        common::Addr,
        error::{code::ErrorCode, MaildeskResult},
    },
    raise_error, utc_now,
};

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MaildeskEvent {
    /// Unique identifier for the event.
    pub event_id: u64,
    /// Type of lifecycle event.
    pub event_type: EventType,
    /// Timestamp (in milliseconds) when the event occurred.
    pub timestamp: i64,
    /// Payload containing detailed data associated with the event.
    pub payload: EventPayload,
}

impl MaildeskEvent {
    pub fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self {
            event_id: id!(96),
            event_type,
            timestamp: utc_now!(),
            payload,
        }
    }

    pub fn to_json_value(&self) -> MaildeskResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
    }
}

#[derive(Clone, Debug, Hash, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventType {
    /// A new inbound message was ingested into a thread.
    #[default]
    MessageReceived,
    /// An outbound reply was accepted by the provider and persisted.
    MessageSent,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::MessageReceived => write!(f, "MessageReceived"),
            EventType::MessageSent => write!(f, "MessageSent"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(untagged)]
pub enum EventPayload {
    MessageReceived(MessageReceived),
    MessageSent(MessageSent),
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MessageReceived {
    pub mailbox_id: u64,
    pub thread_id: u64,
    pub email_id: u64,
    pub customer_id: u64,
    pub from: Addr,
    pub subject: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MessageSent {
    pub mailbox_id: u64,
    pub thread_id: u64,
    pub email_id: u64,
    pub message_id: String,
    pub to: Vec<Addr>,
    pub subject: String,
}
