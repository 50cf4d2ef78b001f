// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::customer::{Customer, CustomerSource};
use crate::modules::error::MaildeskResult;
use crate::modules::thread::EmailThread;

/// The customer and conversation thread a message belongs to.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub customer: Customer,
    pub thread: EmailThread,
}

/// Resolve the counterpart address of a message to its customer and the
/// single ongoing thread for that (mailbox, customer) pair.
///
/// Both inbound ingestion and the outbound send path go through here, so a
/// conversation stays in one thread no matter which side wrote first. Safe
/// under concurrent callers: both steps are storage-layer upserts backed by
/// unique keys, not in-process locks.
pub async fn resolve(
    business_id: u64,
    mailbox_id: u64,
    counterpart_email: &str,
    display_name_hint: Option<String>,
    subject_hint: &str,
    source: CustomerSource,
) -> MaildeskResult<Resolution> {
    let customer =
        Customer::upsert(business_id, counterpart_email, display_name_hint, source).await?;
    let thread =
        EmailThread::find_or_create(business_id, mailbox_id, customer.id, subject_hint).await?;
    Ok(Resolution { customer, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id;

    #[tokio::test]
    async fn inbound_and_outbound_traffic_share_one_thread() {
        let business_id = id!(64);
        let mailbox_id = id!(64);

        let inbound = resolve(
            business_id,
            mailbox_id,
            "jane@acme.com",
            Some("Jane Doe".into()),
            "Order #55",
            CustomerSource::InboundEmail,
        )
        .await
        .unwrap();

        let outbound = resolve(
            business_id,
            mailbox_id,
            "JANE@acme.com",
            None,
            "Re: Order #55",
            CustomerSource::OutboundEmail,
        )
        .await
        .unwrap();

        assert_eq!(inbound.customer.id, outbound.customer.id);
        assert_eq!(inbound.thread.id, outbound.thread.id);
    }

    #[tokio::test]
    async fn distinct_mailboxes_get_distinct_threads() {
        let business_id = id!(64);

        let first = resolve(
            business_id,
            id!(64),
            "sam@corp.example",
            None,
            "Hello",
            CustomerSource::InboundEmail,
        )
        .await
        .unwrap();
        let second = resolve(
            business_id,
            id!(64),
            "sam@corp.example",
            None,
            "Hello",
            CustomerSource::InboundEmail,
        )
        .await
        .unwrap();

        assert_eq!(first.customer.id, second.customer.id);
        assert_ne!(first.thread.id, second.thread.id);
    }
}
