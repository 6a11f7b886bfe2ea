//! Connectivity state machine.
//!
//! [`WifiManager`] owns the radio lifecycle. Every operation checks its
//! precondition and performs its state transition inside one short critical
//! section, then talks to the driver with no lock held. The scan cache is an
//! `Arc` swapped wholesale, so readers always see a complete record set.

mod commands;
mod setup;
mod state;

pub use state::{ManagerState, OwnedResources, ResourceOwnership};

use crate::config::ManagerConfig;
use crate::event_bridge::{EventBridge, LinkStatus};
use crate::traits::{RadioDriver, SystemServices};
use crate::types::{AuthMode, ScanResult, auth_mode_label};
use crate::{Error, Result};
use state::Lifecycle;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub struct WifiManager {
    config: ManagerConfig,
    system: Arc<dyn SystemServices>,
    radio: Arc<dyn RadioDriver>,
    bridge: Arc<EventBridge>,
    lifecycle: Mutex<Lifecycle>,
    scan_result: RwLock<Arc<ScanResult>>,
}

impl WifiManager {
    pub fn new(
        config: ManagerConfig,
        system: Arc<dyn SystemServices>,
        radio: Arc<dyn RadioDriver>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            system,
            radio,
            bridge: Arc::new(EventBridge::new()),
            lifecycle: Mutex::new(Lifecycle::default()),
            scan_result: RwLock::new(Arc::new(ScanResult::empty())),
        })
    }

    /// Builds a manager over a driver that also provides the system services.
    pub fn with_driver<D>(config: ManagerConfig, driver: Arc<D>) -> Result<Self>
    where
        D: RadioDriver + SystemServices + 'static,
    {
        Self::new(config, driver.clone(), driver)
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn state(&self) -> ManagerState {
        self.lifecycle().state
    }

    pub fn owned_resources(&self) -> OwnedResources {
        self.lifecycle().owned
    }

    /// Number of records in the cached scan. Valid in any state.
    pub fn ap_count(&self) -> usize {
        self.ap_list().len()
    }

    /// Read-only snapshot of the cached scan. Valid in any state.
    pub fn ap_list(&self) -> Arc<ScanResult> {
        self.scan_result
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn auth_mode_label(mode: AuthMode) -> &'static str {
        auth_mode_label(mode)
    }

    pub fn link_status(&self) -> LinkStatus {
        self.bridge.link_status()
    }

    /// Whether the scan-done signal is currently raised.
    pub fn is_scan_complete(&self) -> bool {
        self.bridge.scan_done().is_set()
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ManagerState) {
        self.lifecycle().state = state;
    }

    /// Atomically moves `from` -> `to`, or explains why it cannot.
    fn enter(&self, op: &'static str, from: ManagerState, to: ManagerState) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        match lifecycle.state {
            state if state == from => {
                lifecycle.state = to;
                Ok(())
            }
            state if state.is_transient() => Err(Error::Busy { op, state }),
            state => Err(Error::InvalidState { op, state }),
        }
    }

    fn publish(&self, result: ScanResult) -> Arc<ScanResult> {
        let result = Arc::new(result);
        *self
            .scan_result
            .write()
            .unwrap_or_else(PoisonError::into_inner) = result.clone();
        result
    }
}

impl std::fmt::Debug for WifiManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiManager")
            .field("state", &self.state())
            .field("owned", &self.owned_resources())
            .field("ap_count", &self.ap_count())
            .finish()
    }
}
