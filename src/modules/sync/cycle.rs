// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use async_imap::types::Fetch;
use async_imap::Session;
use futures::TryStreamExt;
use tracing::{debug, error, warn};

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MaildeskResult;
use crate::modules::imap::session::SessionStream;
use crate::modules::ingest::filter::SENDER_FILTER;
use crate::modules::ingest::pipeline::{ingest_message, FetchedMessage, IngestOutcome};
use crate::modules::mailbox::Mailbox;
use crate::modules::settings::cli::SETTINGS;
use crate::{encode_mailbox_name, raise_error};

/// Everything a fetch needs to reconstruct one message: the sequence number
/// for dedup, the server receive time and the full source.
const MESSAGE_SOURCE_QUERY: &str = "(UID INTERNALDATE BODY.PEEK[])";

#[derive(Debug, Default)]
pub struct CycleStats {
    pub fetched: usize,
    pub ingested: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub failures: usize,
}

/// One bounded fetch cycle over the mailbox's inbound folder: select, fetch
/// the newest window, ingest oldest-to-newest. A single message's failure is
/// logged and does not abort the rest of the batch.
pub async fn run_fetch_cycle(
    session: &mut Session<Box<dyn SessionStream>>,
    mailbox: &Mailbox,
) -> MaildeskResult<CycleStats> {
    let folder = encode_mailbox_name!(&SETTINGS.maildesk_inbound_folder);
    let selected = session
        .select(&folder)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;

    let mut stats = CycleStats::default();
    let exists = selected.exists;
    if exists == 0 {
        return Ok(stats);
    }

    // Bounded window: the most recent K messages, never a full rescan.
    let window = SETTINGS.maildesk_sync_fetch_window;
    let start = exists.saturating_sub(window - 1).max(1);
    let sequence_set = format!("{}:{}", start, exists);
    debug!(
        mailbox_id = mailbox.id,
        sequence_set, "Fetching inbound window"
    );

    let stream = session
        .fetch(sequence_set.as_str(), MESSAGE_SOURCE_QUERY)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
    let mut fetches: Vec<Fetch> = stream
        .try_collect()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;

    // Oldest-to-newest within the window
    fetches.sort_by_key(|fetch| fetch.message);
    stats.fetched = fetches.len();

    for fetch in fetches {
        let Some(source) = fetch.body() else {
            warn!(
                mailbox_id = mailbox.id,
                sequence = fetch.message,
                "Fetch returned no message source, skipping"
            );
            stats.failures += 1;
            continue;
        };
        let message = FetchedMessage {
            uid: fetch.uid,
            internal_date: fetch.internal_date().map(|d| d.timestamp_millis()),
            source: source.to_vec(),
        };
        match ingest_message(mailbox, &*SENDER_FILTER, message).await {
            Ok(IngestOutcome::Ingested { email_id, .. }) => {
                debug!(mailbox_id = mailbox.id, email_id, "Message ingested");
                stats.ingested += 1;
            }
            Ok(IngestOutcome::Duplicate) => stats.duplicates += 1,
            Ok(IngestOutcome::Filtered) => stats.filtered += 1,
            Err(e) => {
                // one bad message must not starve the rest of the batch
                error!(
                    mailbox_id = mailbox.id,
                    sequence = fetch.message,
                    "Failed to ingest message: {:#?}",
                    e
                );
                stats.failures += 1;
            }
        }
    }

    Ok(stats)
}
