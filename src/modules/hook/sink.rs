// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::LazyLock;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::modules::hook::events::MaildeskEvent;

pub static NOTIFICATION_CENTER: LazyLock<NotificationCenter> =
    LazyLock::new(NotificationCenter::new);

const SUBSCRIBER_BUFFER: usize = 256;

/// Realtime fan-out scoped per mailbox. Delivery is fire-and-forget: a
/// mailbox without a live subscriber simply drops the event.
pub struct NotificationCenter {
    channels: DashMap<u64, broadcast::Sender<MaildeskEvent>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn emit_to_mailbox(&self, mailbox_id: u64, event: MaildeskEvent) {
        if let Some(sender) = self.channels.get(&mailbox_id) {
            // a send error only means nobody is listening right now
            if sender.send(event).is_err() {
                debug!(mailbox_id, "No live subscriber for mailbox event");
            }
        } else {
            debug!(mailbox_id, "No subscriber channel for mailbox event");
        }
    }

    pub fn subscribe(&self, mailbox_id: u64) -> broadcast::Receiver<MaildeskEvent> {
        self.channels
            .entry(mailbox_id)
            .or_insert_with(|| broadcast::channel(SUBSCRIBER_BUFFER).0)
            .subscribe()
    }

    /// Drop the channel of a deleted mailbox.
    pub fn remove(&self, mailbox_id: u64) {
        self.channels.remove(&mailbox_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id;
    use crate::modules::common::Addr;
    use crate::modules::hook::events::{EventPayload, EventType, MessageReceived};

    #[tokio::test]
    async fn delivers_to_a_live_subscriber() {
        let mailbox_id = id!(64);
        let mut receiver = NOTIFICATION_CENTER.subscribe(mailbox_id);

        let event = MaildeskEvent::new(
            EventType::MessageReceived,
            EventPayload::MessageReceived(MessageReceived {
                mailbox_id,
                thread_id: 1,
                email_id: 2,
                customer_id: 3,
                from: Addr::parse("jane@acme.com"),
                subject: "hi".into(),
            }),
        );
        NOTIFICATION_CENTER.emit_to_mailbox(mailbox_id, event.clone());

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_id, event.event_id);
        assert_eq!(received.event_type, EventType::MessageReceived);
    }

    #[tokio::test]
    async fn absence_of_a_subscriber_is_not_an_error() {
        let event = MaildeskEvent::new(
            EventType::MessageSent,
            EventPayload::MessageReceived(MessageReceived {
                mailbox_id: 0,
                thread_id: 0,
                email_id: 0,
                customer_id: 0,
                from: Addr::default(),
                subject: String::new(),
            }),
        );
        NOTIFICATION_CENTER.emit_to_mailbox(id!(64), event);
    }
}
