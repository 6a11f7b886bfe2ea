use crate::types::{
    CountryConfig, DriverCode, PowerSave, RadioEvent, ScanConfig, ScanRecords, StationConfig,
    WifiMode,
};
use async_trait::async_trait;
use std::sync::Arc;

// 在这里定义无线驱动能力接口。管理器只通过这些 trait 访问硬件。

/// Result of a single driver call. Errors carry the platform diagnostic.
pub type DriverResult<T> = std::result::Result<T, DriverCode>;

/// Opaque handle to a network interface created by [`SystemServices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetifHandle(pub u32);

/// Receives asynchronous radio notifications.
///
/// Called from the driver's own execution context, so implementations must
/// not block.
pub trait RadioEventHandler: Send + Sync {
    fn on_event(&self, event: RadioEvent);
}

/// System-wide facilities the radio depends on but does not own: persistent
/// storage, the network interface layer and the shared event dispatcher.
#[async_trait]
pub trait SystemServices: Send + Sync {
    /// Mounts persistent storage. `NVS_NO_FREE_PAGES` and
    /// `NVS_NEW_VERSION_FOUND` mean the partition must be erased first.
    async fn storage_init(&self) -> DriverResult<()>;

    async fn storage_erase(&self) -> DriverResult<()>;

    /// Brings up the network interface layer. Idempotent on real platforms.
    async fn netif_init(&self) -> DriverResult<()>;

    /// Creates the default event dispatch loop. Fails with `INVALID_STATE`
    /// when one already exists.
    async fn event_loop_create_default(&self) -> DriverResult<()>;

    async fn event_loop_delete_default(&self) -> DriverResult<()>;

    /// Creates the default station interface. Fails with `INVALID_STATE`
    /// when one already exists.
    async fn create_station_netif(&self) -> DriverResult<NetifHandle>;

    async fn destroy_netif(&self, handle: NetifHandle) -> DriverResult<()>;
}

/// The wireless hardware / firmware capability.
#[async_trait]
pub trait RadioDriver: Send + Sync {
    async fn init(&self) -> DriverResult<()>;

    /// Releases the radio. Subscribed event handlers are dropped.
    async fn deinit(&self) -> DriverResult<()>;

    async fn set_power_save(&self, mode: PowerSave) -> DriverResult<()>;

    async fn set_mode(&self, mode: WifiMode) -> DriverResult<()>;

    async fn start(&self) -> DriverResult<()>;

    async fn stop(&self) -> DriverResult<()>;

    async fn set_country(&self, country: &CountryConfig) -> DriverResult<()>;

    async fn set_station_config(&self, config: &StationConfig) -> DriverResult<()>;

    /// Requests association. Returns once the request is accepted; the
    /// outcome arrives later as events.
    async fn connect(&self) -> DriverResult<()>;

    /// Starts a discovery. With `block` set the call returns only once the
    /// scan is finished; otherwise completion is announced by
    /// [`RadioEvent::ScanDone`].
    async fn scan_start(&self, config: &ScanConfig, block: bool) -> DriverResult<()>;

    /// Fetches up to `max_count` records from the last finished scan.
    async fn scan_get_records(&self, max_count: usize) -> DriverResult<ScanRecords>;

    /// Registers a handler for every radio event.
    async fn subscribe(&self, handler: Arc<dyn RadioEventHandler>) -> DriverResult<()>;
}
