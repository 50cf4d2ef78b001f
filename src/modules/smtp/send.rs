// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use mail_parser::decoders::html::html_to_text;
use mail_send::mail_builder::headers::address::Address;
use mail_send::mail_builder::MessageBuilder;
use tracing::info;

use crate::modules::common::Addr;
use crate::modules::customer::CustomerSource;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::{MaildeskError, MaildeskResult};
use crate::modules::hook::channel::{Event, EVENT_CHANNEL};
use crate::modules::hook::events::{EventPayload, EventType, MaildeskEvent, MessageSent};
use crate::modules::ingest::content::strip_quoted_reply;
use crate::modules::mailbox::Mailbox;
use crate::modules::message::{Direction, Email, Folder};
use crate::modules::resolver::{self, Resolution};
use crate::modules::smtp::transports::MAIL_TRANSPORTS;
use crate::modules::smtp::util::generate_message_id;
use crate::modules::thread::EmailThread;
use crate::{id, raise_error, utc_now, validate_email};

#[derive(Clone, Debug, Default)]
pub struct SendReplyRequest {
    pub mailbox_id: u64,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html_body: String,
    /// The operator sending the reply
    pub user_id: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SendOutcome {
    pub message_id: String,
    pub thread_id: u64,
    pub email_id: u64,
}

/// Threading material for one outbound reply, derived from the resolved
/// thread's stored state. This is what makes the reply render inside the
/// same conversation in the recipient's client.
#[derive(Clone, Debug)]
pub(crate) struct ReplyDraft {
    pub message_id: String,
    pub subject: String,
    pub in_reply_to: Option<String>,
    pub references: Vec<String>,
}

pub(crate) fn draft_reply(mailbox: &Mailbox, thread: &EmailThread, subject: &str) -> ReplyDraft {
    let sender_domain = mailbox
        .email
        .split_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("maildesk");
    ReplyDraft {
        message_id: generate_message_id(sender_domain),
        subject: with_reply_prefix(subject),
        in_reply_to: thread.last_message_id.clone(),
        references: thread.reference_ids.clone(),
    }
}

pub fn with_reply_prefix(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed.to_lowercase().starts_with("re:") {
        trimmed.to_string()
    } else {
        format!("Re: {}", trimmed)
    }
}

/// Compose and dispatch a reply on the thread resolved from the first
/// recipient, then persist it exactly like inbound mail so the sent message
/// updates the same conversation. Nothing is persisted unless the provider
/// accepted the message.
pub async fn send_reply(request: SendReplyRequest) -> MaildeskResult<SendOutcome> {
    let mailbox = Mailbox::get(request.mailbox_id).await?;
    if !mailbox.has_outbound_credentials() {
        return Err(raise_error!(
            "Mailbox has incomplete outbound credentials".into(),
            ErrorCode::MissingConfiguration
        ));
    }

    let first_recipient = request
        .to
        .first()
        .map(|to| Addr::parse(to))
        .and_then(|addr| addr.address)
        .ok_or_else(|| {
            raise_error!(
                "At least one recipient is required".into(),
                ErrorCode::InvalidParameter
            )
        })?;
    validate_email!(&first_recipient)?;

    let resolution = resolver::resolve(
        mailbox.business_id,
        mailbox.id,
        &first_recipient,
        None,
        request.subject.trim(),
        CustomerSource::OutboundEmail,
    )
    .await?;

    let draft = draft_reply(&mailbox, &resolution.thread, &request.subject);

    let mut builder = MessageBuilder::new()
        .message_id(draft.message_id.clone())
        .from(Address::new_address(
            mailbox.display_name.clone(),
            mailbox.email.clone(),
        ))
        .to(to_address_list(&request.to))
        .subject(draft.subject.clone())
        .html_body(request.html_body.clone())
        .text_body(html_to_text(&request.html_body));
    if !request.cc.is_empty() {
        builder = builder.cc(to_address_list(&request.cc));
    }
    if !request.bcc.is_empty() {
        builder = builder.bcc(to_address_list(&request.bcc));
    }
    if let Some(in_reply_to) = &draft.in_reply_to {
        builder = builder.in_reply_to(in_reply_to.clone());
    }
    if !draft.references.is_empty() {
        builder = builder.references(draft.references.clone());
    }

    // dispatch first; a transport failure surfaces to the caller and leaves
    // no partial email row behind
    let transport = MAIL_TRANSPORTS.smtp(mailbox.id).await?;
    if let Err(MaildeskError::Generic { message, .. }) = transport.send_email(builder).await {
        return Err(raise_error!(
            format!("Delivery failed: {}", message),
            ErrorCode::DeliveryFailed
        ));
    }

    let email = persist_sent_email(&mailbox, &request, &resolution, &draft).await?;

    info!(
        mailbox_id = mailbox.id,
        thread_id = resolution.thread.id,
        email_id = email.id,
        "Outbound reply accepted and persisted"
    );

    Ok(SendOutcome {
        message_id: draft.message_id,
        thread_id: resolution.thread.id,
        email_id: email.id,
    })
}

/// Runs only after a confirmed provider accept: persist the Sent row, fold
/// the message into the thread and fan the event out.
pub(crate) async fn persist_sent_email(
    mailbox: &Mailbox,
    request: &SendReplyRequest,
    resolution: &Resolution,
    draft: &ReplyDraft,
) -> MaildeskResult<Email> {
    let now = utc_now!();
    let to_addrs: Vec<Addr> = request.to.iter().map(|to| Addr::parse(to)).collect();
    let email = Email {
        id: id!(64),
        thread_id: resolution.thread.id,
        mailbox_id: mailbox.id,
        user_id: request.user_id,
        message_id: Some(draft.message_id.clone()),
        uid: None,
        uid_key: None,
        in_reply_to: draft.in_reply_to.clone(),
        references: draft.references.clone(),
        from_addr: Addr {
            name: mailbox.display_name.clone(),
            address: Some(mailbox.email.clone()),
        },
        to_addrs: to_addrs.clone(),
        cc_addrs: request.cc.iter().map(|cc| Addr::parse(cc)).collect(),
        bcc_addrs: request.bcc.iter().map(|bcc| Addr::parse(bcc)).collect(),
        subject: draft.subject.clone(),
        body_html: request.html_body.clone(),
        body_text: strip_quoted_reply(&html_to_text(&request.html_body)),
        folder: Folder::Sent,
        direction: Direction::Outbound,
        read: true,
        sent_at: Some(now),
        received_at: None,
        created_at: now,
    };
    email.save().await?;

    EmailThread::record_message(resolution.thread.id, Some(draft.message_id.clone()), now).await?;

    EVENT_CHANNEL
        .queue(Event::new(
            mailbox.id,
            MaildeskEvent::new(
                EventType::MessageSent,
                EventPayload::MessageSent(MessageSent {
                    mailbox_id: mailbox.id,
                    thread_id: resolution.thread.id,
                    email_id: email.id,
                    message_id: draft.message_id.clone(),
                    to: to_addrs,
                    subject: draft.subject.clone(),
                }),
            ),
        ))
        .await;

    Ok(email)
}

fn to_address_list(addresses: &[String]) -> Address<'static> {
    Address::new_list(
        addresses
            .iter()
            .map(|address| {
                let parsed = Addr::parse(address);
                Address::new_address(parsed.name, parsed.address.unwrap_or_default())
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ingest::filter::SENDER_FILTER;
    use crate::modules::ingest::pipeline::{ingest_message, FetchedMessage, IngestOutcome};

    #[test]
    fn reply_prefix_is_added_once() {
        assert_eq!(with_reply_prefix("Order #55"), "Re: Order #55");
        assert_eq!(with_reply_prefix("Re: Order #55"), "Re: Order #55");
        assert_eq!(with_reply_prefix("RE: Order #55"), "RE: Order #55");
        assert_eq!(with_reply_prefix("  Order #55  "), "Re: Order #55");
    }

    fn test_mailbox() -> Mailbox {
        Mailbox {
            id: id!(64),
            business_id: id!(64),
            email: "desk@shop.example".into(),
            display_name: Some("Shop Desk".into()),
            enabled: true,
            created_at: utc_now!(),
            updated_at: utc_now!(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn outbound_reply_threads_into_the_inbound_conversation() {
        let mailbox = test_mailbox();

        // inbound message opens the thread
        let source = b"From: Jane <jane@acme.com>\r\n\
To: desk@shop.example\r\n\
Subject: Order #55\r\n\
Message-ID: <in1@acme.com>\r\n\
\r\n\
Where is my order?\r\n"
            .to_vec();
        let outcome = ingest_message(
            &mailbox,
            &*SENDER_FILTER,
            FetchedMessage {
                uid: Some(101),
                internal_date: None,
                source,
            },
        )
        .await
        .unwrap();
        let IngestOutcome::Ingested { thread_id, .. } = outcome else {
            panic!("expected ingestion");
        };

        // reply on the same counterpart; the provider accept is simulated,
        // persistence runs exactly as in send_reply
        let request = SendReplyRequest {
            mailbox_id: mailbox.id,
            to: vec!["jane@acme.com".into()],
            subject: "Order #55".into(),
            html_body: "<p>It ships today.</p>".into(),
            ..Default::default()
        };
        let resolution = resolver::resolve(
            mailbox.business_id,
            mailbox.id,
            "jane@acme.com",
            None,
            "Order #55",
            CustomerSource::OutboundEmail,
        )
        .await
        .unwrap();
        assert_eq!(resolution.thread.id, thread_id);

        let draft = draft_reply(&mailbox, &resolution.thread, &request.subject);
        assert_eq!(draft.subject, "Re: Order #55");
        assert_eq!(draft.in_reply_to.as_deref(), Some("in1@acme.com"));

        let email = persist_sent_email(&mailbox, &request, &resolution, &draft)
            .await
            .unwrap();
        assert_eq!(email.folder, Folder::Sent);
        assert_eq!(email.direction, Direction::Outbound);
        assert_eq!(email.thread_id, thread_id);
        assert_eq!(email.in_reply_to.as_deref(), Some("in1@acme.com"));
        assert_eq!(email.body_text, "It ships today.");

        // the thread's chain now carries both message ids
        let thread = EmailThread::get(thread_id).await.unwrap();
        assert_eq!(thread.last_message_id.as_deref(), Some(draft.message_id.as_str()));
        assert!(thread.reference_ids.contains(&"in1@acme.com".to_string()));
        assert!(thread.reference_ids.contains(&draft.message_id));
    }
}
