use crate::traits::{DriverResult, NetifHandle, RadioDriver, RadioEventHandler, SystemServices};
use crate::types::{
    AccessPointRecord, AuthMode, Bssid, CipherInfo, CipherType, CountryConfig, DisconnectReason,
    DriverCode, PowerSave, RadioEvent, ScanConfig, ScanRecords, Ssid, StationConfig, WifiMode,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

/// Every entry point of the simulated platform, for call counting and
/// failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    StorageInit,
    StorageErase,
    NetifInit,
    EventLoopCreate,
    EventLoopDelete,
    NetifCreate,
    NetifDestroy,
    RadioInit,
    RadioDeinit,
    SetPowerSave,
    SetMode,
    Start,
    Stop,
    SetCountry,
    SetStationConfig,
    Connect,
    ScanStart,
    ScanGetRecords,
    Subscribe,
}

#[derive(Default)]
struct SimState {
    networks: Vec<AccessPointRecord>,
    calls: HashMap<Call, usize>,
    fail_next: HashMap<Call, VecDeque<DriverCode>>,
    fail_always: HashMap<Call, DriverCode>,

    event_loop_exists: bool,
    netif: Option<NetifHandle>,
    next_netif: u32,

    radio_inited: bool,
    started: bool,
    power_save: Option<PowerSave>,
    mode: Option<WifiMode>,
    country: Option<CountryConfig>,
    station_config: Option<StationConfig>,
    last_scan_config: Option<ScanConfig>,
    unreachable: HashSet<String>,

    scan_delay: Duration,
    scan_done_event: bool,
    scan_event_success: bool,
    ignore_max_count: bool,
    stall_scan_start: bool,
}

struct Inner {
    state: Mutex<SimState>,
    handlers: Mutex<Vec<Arc<dyn RadioEventHandler>>>,
}

impl Inner {
    fn emit(&self, event: RadioEvent) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler.on_event(event.clone());
        }
    }
}

/// A simulated radio and platform for tests and local development.
/// It models the singleton resources (event loop, station interface) and
/// the radio's init/start state, and delivers events like a real driver.
#[derive(Clone)]
pub struct SimulatedRadio {
    inner: Arc<Inner>,
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRadio {
    pub fn new() -> Self {
        let state = SimState {
            next_netif: 1,
            scan_done_event: true,
            scan_event_success: true,
            ..SimState::default()
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- configuration ---

    pub fn with_networks(self, networks: Vec<AccessPointRecord>) -> Self {
        self.set_networks(networks);
        self
    }

    pub fn set_networks(&self, networks: Vec<AccessPointRecord>) {
        self.state().networks = networks;
    }

    pub fn set_scan_delay(&self, delay: Duration) {
        self.state().scan_delay = delay;
    }

    /// Someone else already created the default event loop.
    pub fn with_preexisting_event_loop(self) -> Self {
        self.state().event_loop_exists = true;
        self
    }

    /// Someone else already created the station interface.
    pub fn with_preexisting_station_netif(self) -> Self {
        {
            let mut state = self.state();
            state.netif = Some(NetifHandle(0));
        }
        self
    }

    pub fn with_scan_delay(self, delay: Duration) -> Self {
        self.state().scan_delay = delay;
        self
    }

    /// Scans finish but never announce it.
    pub fn without_scan_done_event(self) -> Self {
        self.state().scan_done_event = false;
        self
    }

    /// Scan-done events report failure.
    pub fn with_failing_scan_event(self) -> Self {
        self.state().scan_event_success = false;
        self
    }

    /// Record fetches return every record, ignoring the requested maximum.
    /// Non-blocking scan requests never return.
    pub fn with_stalled_scan_start(self) -> Self {
        self.state().stall_scan_start = true;
        self
    }

    pub fn with_record_overflow(self) -> Self {
        self.state().ignore_max_count = true;
        self
    }

    /// Connecting to this SSID is accepted, then followed by a disconnect.
    pub fn with_unreachable(self, ssid: &str) -> Self {
        self.state().unreachable.insert(ssid.to_string());
        self
    }

    /// The next call to `call` fails with `code`. Queues up.
    pub fn fail_next(&self, call: Call, code: DriverCode) {
        self.state()
            .fail_next
            .entry(call)
            .or_default()
            .push_back(code);
    }

    pub fn fail_always(&self, call: Call, code: DriverCode) {
        self.state().fail_always.insert(call, code);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_next.clear();
        state.fail_always.clear();
    }

    // --- inspection ---

    pub fn calls(&self, call: Call) -> usize {
        self.state().calls.get(&call).copied().unwrap_or(0)
    }

    pub fn event_loop_exists(&self) -> bool {
        self.state().event_loop_exists
    }

    pub fn station_netif_exists(&self) -> bool {
        self.state().netif.is_some()
    }

    pub fn is_radio_inited(&self) -> bool {
        self.state().radio_inited
    }

    pub fn is_started(&self) -> bool {
        self.state().started
    }

    pub fn power_save(&self) -> Option<PowerSave> {
        self.state().power_save
    }

    pub fn mode(&self) -> Option<WifiMode> {
        self.state().mode
    }

    pub fn country(&self) -> Option<CountryConfig> {
        self.state().country.clone()
    }

    pub fn station_config(&self) -> Option<StationConfig> {
        self.state().station_config.clone()
    }

    pub fn last_scan_config(&self) -> Option<ScanConfig> {
        self.state().last_scan_config.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delivers an event to every subscriber, as the driver context would.
    pub fn emit(&self, event: RadioEvent) {
        self.inner.emit(event);
    }

    /// Counts the call and applies any injected failure.
    fn enter(&self, call: Call) -> DriverResult<MutexGuard<'_, SimState>> {
        let mut state = self.state();
        *state.calls.entry(call).or_insert(0) += 1;
        if let Some(code) = state.fail_next.get_mut(&call).and_then(VecDeque::pop_front) {
            return Err(code);
        }
        if let Some(code) = state.fail_always.get(&call) {
            return Err(*code);
        }
        Ok(state)
    }

    fn enter_inited(&self, call: Call) -> DriverResult<MutexGuard<'_, SimState>> {
        let state = self.enter(call)?;
        if !state.radio_inited {
            return Err(DriverCode::WIFI_NOT_INIT);
        }
        Ok(state)
    }
}

#[async_trait]
impl SystemServices for SimulatedRadio {
    async fn storage_init(&self) -> DriverResult<()> {
        self.enter(Call::StorageInit)?;
        Ok(())
    }

    async fn storage_erase(&self) -> DriverResult<()> {
        self.enter(Call::StorageErase)?;
        Ok(())
    }

    async fn netif_init(&self) -> DriverResult<()> {
        self.enter(Call::NetifInit)?;
        Ok(())
    }

    async fn event_loop_create_default(&self) -> DriverResult<()> {
        let mut state = self.enter(Call::EventLoopCreate)?;
        if state.event_loop_exists {
            return Err(DriverCode::INVALID_STATE);
        }
        state.event_loop_exists = true;
        Ok(())
    }

    async fn event_loop_delete_default(&self) -> DriverResult<()> {
        let mut state = self.enter(Call::EventLoopDelete)?;
        if !state.event_loop_exists {
            return Err(DriverCode::INVALID_STATE);
        }
        state.event_loop_exists = false;
        Ok(())
    }

    async fn create_station_netif(&self) -> DriverResult<NetifHandle> {
        let mut state = self.enter(Call::NetifCreate)?;
        if state.netif.is_some() {
            return Err(DriverCode::INVALID_STATE);
        }
        let handle = NetifHandle(state.next_netif);
        state.next_netif += 1;
        state.netif = Some(handle);
        Ok(handle)
    }

    async fn destroy_netif(&self, handle: NetifHandle) -> DriverResult<()> {
        let mut state = self.enter(Call::NetifDestroy)?;
        if state.netif != Some(handle) {
            return Err(DriverCode::INVALID_ARG);
        }
        state.netif = None;
        Ok(())
    }
}

#[async_trait]
impl RadioDriver for SimulatedRadio {
    async fn init(&self) -> DriverResult<()> {
        let mut state = self.enter(Call::RadioInit)?;
        if state.radio_inited {
            return Err(DriverCode::INVALID_STATE);
        }
        state.radio_inited = true;
        tracing::debug!("🤖 [SimulatedRadio] Radio initialized");
        Ok(())
    }

    async fn deinit(&self) -> DriverResult<()> {
        {
            let mut state = self.enter_inited(Call::RadioDeinit)?;
            state.radio_inited = false;
            state.started = false;
            state.station_config = None;
        }
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::debug!("🤖 [SimulatedRadio] Radio released");
        Ok(())
    }

    async fn set_power_save(&self, mode: PowerSave) -> DriverResult<()> {
        self.enter_inited(Call::SetPowerSave)?.power_save = Some(mode);
        Ok(())
    }

    async fn set_mode(&self, mode: WifiMode) -> DriverResult<()> {
        self.enter_inited(Call::SetMode)?.mode = Some(mode);
        Ok(())
    }

    async fn start(&self) -> DriverResult<()> {
        {
            let mut state = self.enter_inited(Call::Start)?;
            if state.mode.is_none() {
                return Err(DriverCode::WIFI_MODE);
            }
            state.started = true;
        }
        self.inner.emit(RadioEvent::StaStarted);
        Ok(())
    }

    async fn stop(&self) -> DriverResult<()> {
        self.enter_inited(Call::Stop)?.started = false;
        Ok(())
    }

    async fn set_country(&self, country: &CountryConfig) -> DriverResult<()> {
        self.enter_inited(Call::SetCountry)?.country = Some(country.clone());
        Ok(())
    }

    async fn set_station_config(&self, config: &StationConfig) -> DriverResult<()> {
        self.enter_inited(Call::SetStationConfig)?.station_config = Some(config.clone());
        Ok(())
    }

    async fn connect(&self) -> DriverResult<()> {
        let unreachable = {
            let state = self.enter_inited(Call::Connect)?;
            if !state.started {
                return Err(DriverCode::WIFI_NOT_STARTED);
            }
            let Some(config) = &state.station_config else {
                return Err(DriverCode::WIFI_SSID);
            };
            tracing::debug!(
                "🤖 [SimulatedRadio] Associating with '{}' using {:?}",
                config.ssid,
                config.credential
            );
            state.unreachable.contains(config.ssid.as_str())
        };
        if unreachable {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(10)).await;
                inner.emit(RadioEvent::StaDisconnected {
                    reason: DisconnectReason::NO_AP_FOUND,
                });
            });
        }
        Ok(())
    }

    async fn scan_start(&self, config: &ScanConfig, block: bool) -> DriverResult<()> {
        let params = {
            let mut state = self.enter_inited(Call::ScanStart)?;
            if !state.started {
                return Err(DriverCode::WIFI_NOT_STARTED);
            }
            state.last_scan_config = Some(config.clone());
            let count = u16::try_from(state.networks.len()).unwrap_or(u16::MAX);
            if state.stall_scan_start && !block {
                None
            } else {
                Some((state.scan_delay, state.scan_done_event, state.scan_event_success, count))
            }
        };
        let Some((delay, announce, success, count)) = params else {
            return std::future::pending().await;
        };
        let done = RadioEvent::ScanDone { success, count };

        if block {
            sleep(delay).await;
            if announce {
                self.inner.emit(done);
            }
        } else if announce {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                inner.emit(done);
            });
        }
        Ok(())
    }

    async fn scan_get_records(&self, max_count: usize) -> DriverResult<ScanRecords> {
        let state = self.enter_inited(Call::ScanGetRecords)?;
        let total = state.networks.len();
        let take = if state.ignore_max_count { total } else { max_count };
        Ok(ScanRecords {
            records: state.networks.iter().take(take).cloned().collect(),
            total,
        })
    }

    async fn subscribe(&self, handler: Arc<dyn RadioEventHandler>) -> DriverResult<()> {
        self.enter_inited(Call::Subscribe)?;
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
        Ok(())
    }
}

/// Builds a record with plausible defaults for the given auth mode.
pub fn access_point(ssid: &str, rssi: i8, channel: u8, auth_mode: AuthMode) -> AccessPointRecord {
    let cipher = match auth_mode {
        AuthMode::Open => None,
        AuthMode::Wep => Some(CipherInfo {
            pairwise: CipherType::Wep104,
            group: CipherType::Wep104,
        }),
        AuthMode::WpaPsk | AuthMode::WpaWpa2Psk => Some(CipherInfo {
            pairwise: CipherType::TkipCcmp,
            group: CipherType::Tkip,
        }),
        _ => Some(CipherInfo {
            pairwise: CipherType::Ccmp,
            group: CipherType::Ccmp,
        }),
    };
    let mut bssid = [0x02, 0x00, 0x00, 0x00, 0x00, channel];
    for (i, b) in ssid.bytes().take(3).enumerate() {
        bssid[i + 2] = b;
    }
    AccessPointRecord {
        ssid: Ssid::from_raw(ssid.as_bytes()),
        bssid: Bssid(bssid),
        rssi,
        channel,
        auth_mode,
        cipher,
    }
}

/// A fixed list of fake networks for local development.
pub fn demo_networks() -> Vec<AccessPointRecord> {
    vec![
        access_point("MyHomeWiFi", -38, 6, AuthMode::Wpa3Psk),
        access_point("CafeGuest", -52, 1, AuthMode::Open),
        access_point("Neighbor's Network", -71, 11, AuthMode::Wpa2Psk),
        access_point("xfinitywifi", -63, 6, AuthMode::WpaWpa2Psk),
        access_point("OldRouter", -80, 3, AuthMode::Wep),
        access_point("", -84, 9, AuthMode::Wpa2Wpa3Psk),
    ]
}
