// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::debug;

use crate::modules::attachment::ATTACHMENT_STORE;
use crate::modules::customer::CustomerSource;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::modules::hook::channel::{Event, EVENT_CHANNEL};
use crate::modules::hook::events::{EventPayload, EventType, MaildeskEvent, MessageReceived};
use crate::modules::ingest::content::parse_message;
use crate::modules::ingest::filter::SenderFilter;
use crate::modules::mailbox::Mailbox;
use crate::modules::message::attachment::EmailAttachment;
use crate::modules::message::{Direction, Email, Folder};
use crate::modules::resolver;
use crate::modules::thread::EmailThread;
use crate::{id, raise_error, utc_now};

/// One raw message as handed over by a fetch cycle: the provider sequence
/// number, the server-side receive time and the full RFC 5322 source.
#[derive(Debug, Clone)]
pub struct FetchedMessage {
    pub uid: Option<u32>,
    pub internal_date: Option<i64>,
    pub source: Vec<u8>,
}

/// What became of one ingested message. Duplicates and policy rejections are
/// ordinary outcomes, not errors.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum IngestOutcome {
    Ingested {
        email_id: u64,
        thread_id: u64,
        customer_id: u64,
    },
    Duplicate,
    Filtered,
}

/// Run one inbound message through dedup, parse, admissibility, resolution
/// and persistence. Delivery from the provider is at-least-once; this
/// function is where it becomes exactly-once.
pub async fn ingest_message(
    mailbox: &Mailbox,
    filter: &dyn SenderFilter,
    message: FetchedMessage,
) -> MaildeskResult<IngestOutcome> {
    // Primary dedup key: (mailbox, provider sequence number)
    if let Some(uid) = message.uid {
        if Email::find_by_uid(mailbox.id, uid).await?.is_some() {
            return Ok(IngestOutcome::Duplicate);
        }
    }

    let parsed = parse_message(&message.source)?;

    // Fallback dedup when the provider gave us no sequence number
    if message.uid.is_none() {
        if let Some(message_id) = parsed.message_id.as_deref() {
            if Email::find_by_message_id(message_id).await?.is_some() {
                return Ok(IngestOutcome::Duplicate);
            }
        }
    }

    let sender = parsed.from.address.clone().ok_or_else(|| {
        raise_error!(
            "Message carries no sender address".into(),
            ErrorCode::MessageParseFailed
        )
    })?;

    if !filter.admissible(&sender) {
        debug!(mailbox_id = mailbox.id, sender, "Sender filtered, message dropped");
        return Ok(IngestOutcome::Filtered);
    }

    let resolution = resolver::resolve(
        mailbox.business_id,
        mailbox.id,
        &sender,
        parsed.from.name.clone(),
        &parsed.subject,
        CustomerSource::InboundEmail,
    )
    .await?;

    let received_at = message
        .internal_date
        .or(parsed.date)
        .unwrap_or_else(|| utc_now!());

    let email = Email {
        id: id!(64),
        thread_id: resolution.thread.id,
        mailbox_id: mailbox.id,
        user_id: None,
        message_id: parsed.message_id.clone(),
        uid: message.uid,
        uid_key: message.uid.map(|uid| Email::uid_key(mailbox.id, uid)),
        in_reply_to: parsed.in_reply_to.clone(),
        references: parsed.references.clone(),
        from_addr: parsed.from.clone(),
        to_addrs: parsed.to.clone(),
        cc_addrs: parsed.cc.clone(),
        bcc_addrs: parsed.bcc.clone(),
        subject: parsed.subject.clone(),
        body_html: parsed.body_html.clone(),
        body_text: parsed.body_text.clone(),
        folder: Folder::Inbox,
        direction: Direction::Inbound,
        read: false,
        sent_at: None,
        received_at: Some(received_at),
        created_at: utc_now!(),
    };
    email.save().await?;

    if !parsed.attachments.is_empty() {
        let records = ATTACHMENT_STORE.persist(email.id, &parsed.attachments).await?;
        EmailAttachment::batch_insert(records).await?;
    }

    EmailThread::record_message(resolution.thread.id, parsed.message_id.clone(), received_at)
        .await?;

    EVENT_CHANNEL
        .queue(Event::new(
            mailbox.id,
            MaildeskEvent::new(
                EventType::MessageReceived,
                EventPayload::MessageReceived(MessageReceived {
                    mailbox_id: mailbox.id,
                    thread_id: resolution.thread.id,
                    email_id: email.id,
                    customer_id: resolution.customer.id,
                    from: parsed.from.clone(),
                    subject: parsed.subject.clone(),
                }),
            ),
        ))
        .await;

    Ok(IngestOutcome::Ingested {
        email_id: email.id,
        thread_id: resolution.thread.id,
        customer_id: resolution.customer.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::customer::Customer;
    use crate::modules::ingest::filter::SENDER_FILTER;
    use crate::modules::thread::ThreadStatus;

    fn test_mailbox() -> Mailbox {
        Mailbox {
            id: id!(64),
            business_id: id!(64),
            email: "desk@shop.example".into(),
            enabled: true,
            created_at: utc_now!(),
            updated_at: utc_now!(),
            ..Default::default()
        }
    }

    fn inbound_source(message_id: &str) -> Vec<u8> {
        format!(
            "From: Jane <jane@acme.com>\r\n\
             To: desk@shop.example\r\n\
             Subject: Order #55\r\n\
             Message-ID: <{message_id}>\r\n\
             Date: Tue, 1 Jul 2025 10:00:00 +0000\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             My order arrived damaged.\r\n"
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn ingests_once_and_dedups_redelivery() {
        let mailbox = test_mailbox();
        let message = FetchedMessage {
            uid: Some(101),
            internal_date: None,
            source: inbound_source("order55@acme.com"),
        };

        let outcome = ingest_message(&mailbox, &*SENDER_FILTER, message.clone())
            .await
            .unwrap();
        let IngestOutcome::Ingested {
            email_id,
            thread_id,
            customer_id,
        } = outcome
        else {
            panic!("expected ingestion, got {outcome:?}");
        };

        let email = Email::get(email_id).await.unwrap();
        assert_eq!(email.folder, Folder::Inbox);
        assert_eq!(email.direction, Direction::Inbound);
        assert_eq!(email.uid, Some(101));
        assert_eq!(email.subject, "Order #55");

        let thread = EmailThread::get(thread_id).await.unwrap();
        assert_eq!(thread.subject, "Order #55");
        assert_eq!(thread.status, ThreadStatus::New);
        assert_eq!(thread.last_message_id.as_deref(), Some("order55@acme.com"));

        let customer = Customer::find(customer_id).await.unwrap().unwrap();
        assert_eq!(customer.email, "jane@acme.com");

        // a second fetch cycle redelivering sequence 101 produces no new rows
        let outcome = ingest_message(&mailbox, &*SENDER_FILTER, message)
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Duplicate);
        assert_eq!(Email::list_by_mailbox(mailbox.id).await.unwrap().len(), 1);
        assert_eq!(
            EmailThread::list_by_mailbox(mailbox.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn dedups_by_message_id_without_a_sequence_number() {
        let mailbox = test_mailbox();
        let source = inbound_source("no-seq@acme.com");

        let first = ingest_message(
            &mailbox,
            &*SENDER_FILTER,
            FetchedMessage {
                uid: None,
                internal_date: None,
                source: source.clone(),
            },
        )
        .await
        .unwrap();
        assert!(matches!(first, IngestOutcome::Ingested { .. }));

        let second = ingest_message(
            &mailbox,
            &*SENDER_FILTER,
            FetchedMessage {
                uid: None,
                internal_date: None,
                source,
            },
        )
        .await
        .unwrap();
        assert_eq!(second, IngestOutcome::Duplicate);
    }

    #[tokio::test]
    async fn drops_inadmissible_senders_silently() {
        let mailbox = test_mailbox();
        let source = b"From: no-reply@facebook.com\r\n\
To: desk@shop.example\r\n\
Subject: You have notifications\r\n\
\r\n\
bulk content\r\n"
            .to_vec();

        let outcome = ingest_message(
            &mailbox,
            &*SENDER_FILTER,
            FetchedMessage {
                uid: Some(7),
                internal_date: None,
                source,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, IngestOutcome::Filtered);
        assert!(Email::list_by_mailbox(mailbox.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn successive_messages_from_one_customer_share_a_thread() {
        let mailbox = test_mailbox();

        let first = ingest_message(
            &mailbox,
            &*SENDER_FILTER,
            FetchedMessage {
                uid: Some(1),
                internal_date: None,
                source: inbound_source("first@acme.com"),
            },
        )
        .await
        .unwrap();
        let second = ingest_message(
            &mailbox,
            &*SENDER_FILTER,
            FetchedMessage {
                uid: Some(2),
                internal_date: None,
                source: inbound_source("second@acme.com"),
            },
        )
        .await
        .unwrap();

        let (IngestOutcome::Ingested { thread_id: t1, .. }, IngestOutcome::Ingested { thread_id: t2, .. }) =
            (first, second)
        else {
            panic!("expected two ingestions");
        };
        assert_eq!(t1, t2);

        let thread = EmailThread::get(t1).await.unwrap();
        assert_eq!(
            thread.references_header().unwrap(),
            "first@acme.com second@acme.com"
        );
    }
}
