//! Event bridge: turns radio notifications into manager-visible state.
//!
//! The driver calls [`EventBridge::on_event`] from its own context. A scan
//! waiting in the manager is released through the [`CompletionSignal`];
//! station notifications are recorded in [`LinkStatus`] but never move the
//! manager's lifecycle state.
//!
//! Scan-done events carry no scan identity, so the bridge tracks which scan
//! a completion belongs to. A scan that timed out while its completion was
//! still owed leaves the bridge [`ScanSlot::Abandoned`]; the next completion
//! is swallowed there instead of releasing a later scan.

use crate::traits::RadioEventHandler;
use crate::types::{DisconnectReason, RadioEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Single-bit signal set by the notifier and awaited by one waiter.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    bit: AtomicBool,
    notify: Notify,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.bit.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn clear(&self) {
        self.bit.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.bit.load(Ordering::Acquire)
    }

    /// Waits until the bit is set. Returns `false` if `timeout` elapsed first.
    pub async fn wait(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_set()).await.is_ok()
    }

    /// Waits with no bound; callers put their own deadline around it.
    pub async fn wait_set(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking the bit so a concurrent `set` is not lost.
            notified.as_mut().enable();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// Which scan, if any, the next scan-done event belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanSlot {
    /// No scan outstanding; scan-done events are ignored.
    #[default]
    Idle,
    /// A scan is waiting for its completion.
    Armed,
    /// A timed-out scan still owes a completion, which must be dropped.
    Abandoned,
}

/// What the bridge has learned about the station link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub station_started: bool,
    pub last_disconnect: Option<DisconnectReason>,
    pub disconnect_count: u32,
}

#[derive(Debug)]
pub struct EventBridge {
    scan_done: CompletionSignal,
    scan_ok: AtomicBool,
    slot: Mutex<ScanSlot>,
    /// Set once an abandoned scan's completion has been swallowed.
    drained: CompletionSignal,
    link: Mutex<LinkStatus>,
}

impl Default for EventBridge {
    fn default() -> Self {
        Self {
            scan_done: CompletionSignal::new(),
            scan_ok: AtomicBool::new(true),
            slot: Mutex::new(ScanSlot::Idle),
            drained: CompletionSignal::new(),
            link: Mutex::new(LinkStatus::default()),
        }
    }
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_done(&self) -> &CompletionSignal {
        &self.scan_done
    }

    fn slot(&self) -> MutexGuard<'_, ScanSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scan_slot(&self) -> ScanSlot {
        *self.slot()
    }

    /// Waits until no abandoned scan is still owed a completion.
    pub async fn settle(&self) {
        if self.scan_slot() == ScanSlot::Abandoned {
            tracing::debug!("Waiting for the previous scan to finish");
            self.drained.wait_set().await;
        }
    }

    /// Arms the bridge for a new scan.
    pub fn begin_scan(&self) {
        let mut slot = self.slot();
        self.scan_ok.store(true, Ordering::Release);
        self.scan_done.clear();
        *slot = ScanSlot::Armed;
    }

    /// Disarms after a scan that will not be owed another completion.
    pub fn end_scan(&self) {
        *self.slot() = ScanSlot::Idle;
    }

    /// Gives up on the current scan after its deadline.
    ///
    /// An armed scan whose completion has not arrived yet becomes
    /// [`ScanSlot::Abandoned`]. A scan that was still waiting out an earlier
    /// abandoned one forgets it, so a lost event cannot block scans for good.
    pub fn abandon_scan(&self) {
        let mut slot = self.slot();
        *slot = match *slot {
            ScanSlot::Armed if !self.scan_done.is_set() => {
                self.drained.clear();
                ScanSlot::Abandoned
            }
            ScanSlot::Abandoned => {
                tracing::warn!("Previous scan never reported completion; forgetting it");
                ScanSlot::Idle
            }
            _ => ScanSlot::Idle,
        };
    }

    /// Forgets any outstanding scan; used when the radio is torn down.
    pub fn reset_scan(&self) {
        let mut slot = self.slot();
        if *slot == ScanSlot::Abandoned {
            self.drained.set();
        }
        *slot = ScanSlot::Idle;
    }

    /// Status carried by the last scan-done event.
    pub fn last_scan_succeeded(&self) -> bool {
        self.scan_ok.load(Ordering::Acquire)
    }

    pub fn link_status(&self) -> LinkStatus {
        *self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forgets link history; used when the radio is torn down.
    pub fn reset_link(&self) {
        *self.link.lock().unwrap_or_else(PoisonError::into_inner) = LinkStatus::default();
    }

    fn on_scan_done(&self, success: bool, count: u16) {
        let mut slot = self.slot();
        match *slot {
            ScanSlot::Armed => {
                tracing::info!(success, count, "Scan completed");
                self.scan_ok.store(success, Ordering::Release);
                self.scan_done.set();
            }
            ScanSlot::Abandoned => {
                tracing::debug!(success, count, "Dropping completion of a timed-out scan");
                *slot = ScanSlot::Idle;
                self.drained.set();
            }
            ScanSlot::Idle => {
                tracing::trace!(success, count, "Ignoring unsolicited scan completion");
            }
        }
    }
}

impl RadioEventHandler for EventBridge {
    fn on_event(&self, event: RadioEvent) {
        match event {
            RadioEvent::ScanDone { success, count } => self.on_scan_done(success, count),
            RadioEvent::StaStarted => {
                tracing::info!("WiFi station started");
                self.link
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .station_started = true;
            }
            RadioEvent::StaDisconnected { reason } => {
                tracing::warn!(%reason, "Disconnected from WiFi");
                let mut link = self.link.lock().unwrap_or_else(PoisonError::into_inner);
                link.last_disconnect = Some(reason);
                link.disconnect_count = link.disconnect_count.saturating_add(1);
            }
            RadioEvent::Other(id) => {
                tracing::trace!(id, "Ignoring radio event");
            }
        }
    }
}
