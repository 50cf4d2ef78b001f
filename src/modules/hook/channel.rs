// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::LazyLock;

use tokio::sync::mpsc;
use tracing::error;

use crate::modules::hook::{events::MaildeskEvent, sink::NOTIFICATION_CENTER};

pub static EVENT_CHANNEL: LazyLock<EventChannel> = LazyLock::new(EventChannel::new);

#[derive(Debug)]
pub struct Event {
    mailbox_id: u64,
    event: MaildeskEvent,
}

impl Event {
    pub fn new(mailbox_id: u64, event: MaildeskEvent) -> Self {
        Self { mailbox_id, event }
    }
}

/// Buffered hand-off between the sync/send paths and the notification
/// fan-out, so a slow subscriber can never stall ingestion.
pub struct EventChannel {
    sender: mpsc::Sender<Event>,
}

impl EventChannel {
    pub async fn queue(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("Failed to queue event. Channel error: {:#?}", e);
        }
    }

    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<Event>(1000);
        let instance = EventChannel { sender };

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                NOTIFICATION_CENTER.emit_to_mailbox(event.mailbox_id, event.event);
            }
        });

        instance
    }
}
