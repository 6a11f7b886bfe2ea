use crate::traits::NetifHandle;
use serde::Serialize;
use std::fmt;

/// Lifecycle of the manager. `Initializing`, `Scanning`, `Connecting` and
/// `Deinitializing` only last for the duration of the triggering call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Scanning,
    Connecting,
    Deinitializing,
}

impl ManagerState {
    pub fn is_transient(self) -> bool {
        !matches!(self, ManagerState::Uninitialized | ManagerState::Ready)
    }
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManagerState::Uninitialized => "uninitialized",
            ManagerState::Initializing => "initializing",
            ManagerState::Ready => "ready",
            ManagerState::Scanning => "scanning",
            ManagerState::Connecting => "connecting",
            ManagerState::Deinitializing => "deinitializing",
        };
        f.write_str(s)
    }
}

/// Who brought a shared resource into existence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceOwnership {
    #[default]
    NotCreated,
    /// Created by this manager; torn down by its `deinit`.
    Created,
    /// Already existed at `init`; another owner may depend on it.
    PreExisting,
}

impl ResourceOwnership {
    pub fn is_owned(self) -> bool {
        self == ResourceOwnership::Created
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnedResources {
    pub event_loop: ResourceOwnership,
    pub station_netif: ResourceOwnership,
    #[serde(skip)]
    pub(crate) netif_handle: Option<NetifHandle>,
}

impl OwnedResources {
    /// Handle of the station interface, only when this manager created it.
    pub fn owned_netif(&self) -> Option<NetifHandle> {
        if self.station_netif.is_owned() {
            self.netif_handle
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    pub state: ManagerState,
    pub owned: OwnedResources,
}
