// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::LazyLock;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::modules::context::periodic::PeriodicTask;
use crate::modules::context::Initialize;
use crate::modules::error::MaildeskResult;
use crate::modules::mailbox::Mailbox;
use crate::modules::settings::cli::SETTINGS;
use crate::modules::sync::actor::{self, MailboxCommand, SessionState};

pub static MAILBOX_SUPERVISOR: LazyLock<MailboxSupervisor> =
    LazyLock::new(MailboxSupervisor::new);

pub struct MailboxHandle {
    commands: mpsc::Sender<MailboxCommand>,
    state: watch::Receiver<SessionState>,
    join: JoinHandle<()>,
}

impl MailboxHandle {
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn is_usable(&self) -> bool {
        !self.join.is_finished() && !self.commands.is_closed()
    }
}

/// Registry of one session actor per mailbox. Every mailbox with complete
/// inbound credentials gets an actor at process start and on creation;
/// mailboxes without credentials are skipped, logged once, and not retried.
pub struct MailboxSupervisor {
    sessions: DashMap<u64, MailboxHandle>,
}

impl Initialize for MailboxSupervisor {
    async fn initialize() -> MaildeskResult<()> {
        MAILBOX_SUPERVISOR.start_all().await?;
        MailboxSupervisor::start_health_sweep();
        Ok(())
    }
}

impl MailboxSupervisor {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub async fn start_all(&self) -> MaildeskResult<()> {
        let mailboxes = Mailbox::list_all().await?;
        let active: Vec<Mailbox> = mailboxes.into_iter().filter(|m| m.enabled).collect();

        if active.is_empty() {
            info!("No enabled mailboxes found for session startup.");
            return Ok(());
        }
        info!("Starting sessions for {} enabled mailboxes.", active.len());
        for mailbox in active {
            self.start(&mailbox);
        }
        Ok(())
    }

    pub fn start(&self, mailbox: &Mailbox) {
        if !mailbox.has_inbound_credentials() {
            warn!(
                mailbox_id = mailbox.id,
                email = %mailbox.email,
                "Mailbox has incomplete inbound credentials; session skipped"
            );
            return;
        }
        let (commands, state, join) = actor::spawn(mailbox.id, mailbox.email.clone());
        if let Some(previous) = self.sessions.insert(
            mailbox.id,
            MailboxHandle {
                commands,
                state,
                join,
            },
        ) {
            // a replaced actor winds itself down
            let _ = previous.commands.try_send(MailboxCommand::Shutdown);
        }
    }

    pub async fn stop(&self, mailbox_id: u64) {
        if let Some((_, handle)) = self.sessions.remove(&mailbox_id) {
            let _ = handle.commands.send(MailboxCommand::Shutdown).await;
            let _ = handle.join.await;
        } else {
            warn!(mailbox_id, "No live session found for mailbox");
        }
    }

    /// Manual resync entry point for the admin layer; always forced.
    pub async fn request_resync(&self, mailbox_id: u64) -> bool {
        self.request_sync(mailbox_id, true).await
    }

    pub async fn request_sync(&self, mailbox_id: u64, force: bool) -> bool {
        // clone the sender out so no map guard is held across the send
        let sender = match self.sessions.get(&mailbox_id) {
            Some(handle) => handle.commands.clone(),
            None => return false,
        };
        sender.send(MailboxCommand::Sync { force }).await.is_ok()
    }

    pub fn session_state(&self, mailbox_id: u64) -> Option<SessionState> {
        self.sessions.get(&mailbox_id).map(|handle| handle.state())
    }

    /// Close every live session gracefully, ignoring close errors.
    pub async fn shutdown_all(&self) {
        let ids: Vec<u64> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for mailbox_id in ids {
            self.stop(mailbox_id).await;
        }
    }

    /// Periodic sweep covering silently-dead connections: restart any actor
    /// whose task has ended, pick up mailboxes created since the last pass,
    /// and nudge live ones with a non-forced sync.
    fn start_health_sweep() {
        let task = PeriodicTask::new("mailbox-health-sweep");
        task.start(
            |_| async {
                let mailboxes = Mailbox::list_all().await?;
                for mailbox in mailboxes.into_iter().filter(|m| m.enabled) {
                    if !mailbox.has_inbound_credentials() {
                        continue;
                    }
                    let usable = MAILBOX_SUPERVISOR
                        .sessions
                        .get(&mailbox.id)
                        .map(|handle| handle.is_usable())
                        .unwrap_or(false);
                    if usable {
                        MAILBOX_SUPERVISOR.request_sync(mailbox.id, false).await;
                    } else {
                        warn!(
                            mailbox_id = mailbox.id,
                            email = %mailbox.email,
                            "Session not usable, restarting"
                        );
                        MAILBOX_SUPERVISOR.start(&mailbox);
                    }
                }
                Ok(())
            },
            None,
            Duration::from_secs(SETTINGS.maildesk_health_check_interval_secs),
            false,
            false,
        );
    }
}
