// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

/// Per-mailbox rate limiting and mutual exclusion for fetch cycles.
///
/// The gate is owned by the mailbox actor, so every transition happens on one
/// task. Denials are silent no-ops: a trigger that arrives while
/// a cycle runs is dropped, not queued.
#[derive(Debug)]
pub struct SyncGate {
    min_interval_ms: i64,
    last_sync_at: i64,
    in_progress: bool,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SyncPermit {
    Granted,
    /// Within the minimum interval and not forced
    Throttled,
    /// A cycle for this mailbox is already in flight
    Busy,
}

impl SyncGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval_ms: min_interval.as_millis() as i64,
            last_sync_at: 0,
            in_progress: false,
        }
    }

    /// Try to open a fetch cycle at time `now`. `Granted` marks the gate
    /// in-progress; the caller must pair it with `finish`.
    pub fn try_begin(&mut self, force: bool, now: i64) -> SyncPermit {
        if !force && now - self.last_sync_at < self.min_interval_ms {
            return SyncPermit::Throttled;
        }
        if self.in_progress {
            return SyncPermit::Busy;
        }
        self.in_progress = true;
        SyncPermit::Granted
    }

    /// Close the cycle, successful or not.
    pub fn finish(&mut self, now: i64) {
        self.in_progress = false;
        self.last_sync_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttles_a_second_request_inside_the_window() {
        let mut gate = SyncGate::new(Duration::from_secs(15));
        assert_eq!(gate.try_begin(false, 1_000), SyncPermit::Granted);
        gate.finish(2_000);
        // 10s later: still inside the window
        assert_eq!(gate.try_begin(false, 12_000), SyncPermit::Throttled);
        // after the window has elapsed
        assert_eq!(gate.try_begin(false, 17_001), SyncPermit::Granted);
    }

    #[test]
    fn force_bypasses_the_throttle_but_not_the_busy_flag() {
        let mut gate = SyncGate::new(Duration::from_secs(15));
        assert_eq!(gate.try_begin(false, 1_000), SyncPermit::Granted);
        gate.finish(1_500);
        assert_eq!(gate.try_begin(true, 2_000), SyncPermit::Granted);
        // in progress now: even a forced request is dropped
        assert_eq!(gate.try_begin(true, 2_100), SyncPermit::Busy);
        gate.finish(3_000);
        assert_eq!(gate.try_begin(true, 3_100), SyncPermit::Granted);
    }

    #[test]
    fn failure_still_clears_the_in_progress_flag() {
        let mut gate = SyncGate::new(Duration::from_secs(15));
        assert_eq!(gate.try_begin(true, 1_000), SyncPermit::Granted);
        // the cycle failed; finish runs regardless
        gate.finish(1_200);
        assert_eq!(gate.try_begin(true, 1_300), SyncPermit::Granted);
    }
}
