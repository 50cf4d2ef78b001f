// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use async_imap::extensions::idle::IdleResponse;
use async_imap::Session;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::modules::common::signal::SIGNAL_MANAGER;
use crate::modules::imap::manager::ImapConnectionManager;
use crate::modules::imap::session::SessionStream;
use crate::modules::mailbox::Mailbox;
use crate::modules::settings::cli::SETTINGS;
use crate::modules::sync::cycle::run_fetch_cycle;
use crate::modules::sync::gate::{SyncGate, SyncPermit};
use crate::utc_now;

const COMMAND_BUFFER: usize = 32;

/// Transport callbacks and external triggers arrive as explicit messages so
/// the actor's single task is the only place session state ever changes.
#[derive(Debug)]
pub enum MailboxCommand {
    Sync { force: bool },
    Shutdown,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Listening,
    Reconnecting,
}

enum ListenExit {
    Reconnect,
    Shutdown,
}

enum Waited {
    Idle(async_imap::error::Result<IdleResponse>),
    Command(Option<MailboxCommand>),
    Shutdown,
}

/// One supervised session per mailbox: connect, watch the inbound folder with
/// IDLE, run gated fetch cycles, and reconnect with a fixed backoff forever.
/// There is no retry cap; giving up on a mailbox is the supervisor's call,
/// never the actor's.
pub struct MailboxActor {
    mailbox_id: u64,
    email: String,
    commands: mpsc::Receiver<MailboxCommand>,
    state_tx: watch::Sender<SessionState>,
    gate: SyncGate,
}

pub fn spawn(
    mailbox_id: u64,
    email: String,
) -> (
    mpsc::Sender<MailboxCommand>,
    watch::Receiver<SessionState>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
    let actor = MailboxActor {
        mailbox_id,
        email,
        commands: command_rx,
        state_tx,
        gate: SyncGate::new(Duration::from_secs(SETTINGS.maildesk_sync_min_interval_secs)),
    };
    let join = tokio::spawn(actor.run());
    (command_tx, state_rx, join)
}

impl MailboxActor {
    async fn run(mut self) {
        info!(
            mailbox_id = self.mailbox_id,
            email = %self.email,
            "Mailbox session actor started"
        );
        let mut shutdown = SIGNAL_MANAGER.subscribe();
        let backoff = Duration::from_secs(SETTINGS.maildesk_reconnect_delay_secs);
        let idle_refresh = Duration::from_secs(SETTINGS.maildesk_idle_refresh_secs);
        let debounce = Duration::from_millis(SETTINGS.maildesk_sync_debounce_ms);

        loop {
            let _ = self.state_tx.send(SessionState::Connecting);
            let mut session = match ImapConnectionManager::new(self.mailbox_id).build().await {
                Ok(session) => session,
                Err(e) => {
                    error!(
                        mailbox_id = self.mailbox_id,
                        "IMAP connect failed: {:#?}", e
                    );
                    let _ = self.state_tx.send(SessionState::Reconnecting);
                    if !self.backoff_or_exit(&mut shutdown, backoff).await {
                        break;
                    }
                    continue;
                }
            };

            info!(
                mailbox_id = self.mailbox_id,
                email = %self.email,
                "IMAP session established"
            );
            let _ = self.state_tx.send(SessionState::Listening);

            // catch up on anything that arrived while we were away
            if !self.try_sync(&mut session, true, None).await {
                let _ = self.state_tx.send(SessionState::Reconnecting);
                if !self.backoff_or_exit(&mut shutdown, backoff).await {
                    break;
                }
                continue;
            }

            match self
                .listen(&mut shutdown, session, idle_refresh, debounce)
                .await
            {
                ListenExit::Shutdown => break,
                ListenExit::Reconnect => {
                    let _ = self.state_tx.send(SessionState::Reconnecting);
                    if !self.backoff_or_exit(&mut shutdown, backoff).await {
                        break;
                    }
                }
            }
        }

        let _ = self.state_tx.send(SessionState::Disconnected);
        info!(
            mailbox_id = self.mailbox_id,
            email = %self.email,
            "Mailbox session actor stopped"
        );
    }

    /// Watch the folder with IDLE until the session breaks or the actor is
    /// told to stop. Commands interrupt the pending IDLE via its stop source.
    async fn listen(
        &mut self,
        shutdown: &mut broadcast::Receiver<()>,
        mut session: Session<Box<dyn SessionStream>>,
        idle_refresh: Duration,
        debounce: Duration,
    ) -> ListenExit {
        loop {
            let mut idle = session.idle();
            if let Err(e) = idle.init().await {
                warn!(mailbox_id = self.mailbox_id, "IDLE init failed: {:#?}", e);
                return ListenExit::Reconnect;
            }

            let waited = {
                let (idle_wait, interrupt) = idle.wait_with_timeout(idle_refresh);
                let waited = tokio::select! {
                    result = idle_wait => Waited::Idle(result),
                    cmd = self.commands.recv() => Waited::Command(cmd),
                    _ = shutdown.recv() => Waited::Shutdown,
                };
                drop(interrupt);
                waited
            };

            session = match idle.done().await {
                Ok(session) => session,
                Err(e) => {
                    warn!(mailbox_id = self.mailbox_id, "Failed to end IDLE: {:#?}", e);
                    return ListenExit::Reconnect;
                }
            };

            match waited {
                Waited::Idle(Ok(response)) => match response {
                    IdleResponse::NewData(data) => {
                        drop(data);
                        debug!(
                            mailbox_id = self.mailbox_id,
                            "New-message notification received"
                        );
                        if !self.try_sync(&mut session, true, Some(debounce)).await {
                            return ListenExit::Reconnect;
                        }
                    }
                    // servers drop long idles; just re-issue the command
                    IdleResponse::Timeout | IdleResponse::ManualInterrupt => {}
                },
                Waited::Idle(Err(e)) => {
                    warn!(mailbox_id = self.mailbox_id, "IDLE wait failed: {:#?}", e);
                    return ListenExit::Reconnect;
                }
                Waited::Command(Some(MailboxCommand::Sync { force })) => {
                    if !self.try_sync(&mut session, force, None).await {
                        return ListenExit::Reconnect;
                    }
                }
                Waited::Command(Some(MailboxCommand::Shutdown)) | Waited::Command(None) => {
                    // graceful close, close errors ignored
                    let _ = session.logout().await;
                    return ListenExit::Shutdown;
                }
                Waited::Shutdown => {
                    let _ = session.logout().await;
                    return ListenExit::Shutdown;
                }
            }
        }
    }

    /// Run one gated fetch cycle. Returns false when the session should be
    /// considered broken and rebuilt.
    async fn try_sync(
        &mut self,
        session: &mut Session<Box<dyn SessionStream>>,
        force: bool,
        settle: Option<Duration>,
    ) -> bool {
        match self.gate.try_begin(force, utc_now!()) {
            SyncPermit::Granted => {}
            SyncPermit::Throttled => {
                debug!(mailbox_id = self.mailbox_id, "Sync request throttled");
                return true;
            }
            SyncPermit::Busy => {
                debug!(mailbox_id = self.mailbox_id, "Sync already in progress");
                return true;
            }
        }

        // let the provider settle after a new-message notification
        if let Some(delay) = settle {
            tokio::time::sleep(delay).await;
        }

        let result = match Mailbox::get(self.mailbox_id).await {
            Ok(mailbox) => run_fetch_cycle(session, &mailbox).await,
            Err(e) => Err(e),
        };
        self.gate.finish(utc_now!());

        match result {
            Ok(stats) => {
                if stats.ingested > 0 || stats.failures > 0 {
                    info!(
                        mailbox_id = self.mailbox_id,
                        fetched = stats.fetched,
                        ingested = stats.ingested,
                        duplicates = stats.duplicates,
                        filtered = stats.filtered,
                        failures = stats.failures,
                        "Fetch cycle finished"
                    );
                }
                true
            }
            Err(e) => {
                error!(mailbox_id = self.mailbox_id, "Fetch cycle failed: {:#?}", e);
                false
            }
        }
    }

    /// Fixed-delay backoff; returns false when the actor should exit instead
    /// of reconnecting.
    async fn backoff_or_exit(
        &mut self,
        shutdown: &mut broadcast::Receiver<()>,
        backoff: Duration,
    ) -> bool {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(backoff) => return true,
                cmd = self.commands.recv() => match cmd {
                    Some(MailboxCommand::Shutdown) | None => return false,
                    // sync requests during backoff are covered by the
                    // immediate post-connect sync
                    Some(MailboxCommand::Sync { .. }) => continue,
                },
                _ = shutdown.recv() => return false,
            }
        }
    }
}
