//! Data model shared between the manager, radio drivers and presentation layers.

use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Maximum SSID length in bytes, fixed by the driver's station config field.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum credential length in bytes (64-byte driver field, NUL terminated).
pub const MAX_CREDENTIAL_LEN: usize = 63;

// -----------------------------------------------------------------------------
// Driver diagnostics

/// Diagnostic number reported by the platform / radio driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverCode(pub i32);

impl DriverCode {
    pub const FAIL: DriverCode = DriverCode(-1);
    pub const NO_MEM: DriverCode = DriverCode(0x101);
    pub const INVALID_ARG: DriverCode = DriverCode(0x102);
    /// Also reported when a singleton resource already exists.
    pub const INVALID_STATE: DriverCode = DriverCode(0x103);
    pub const NOT_FOUND: DriverCode = DriverCode(0x105);
    pub const NOT_SUPPORTED: DriverCode = DriverCode(0x106);
    pub const TIMEOUT: DriverCode = DriverCode(0x107);
    pub const NVS_NO_FREE_PAGES: DriverCode = DriverCode(0x110d);
    pub const NVS_NEW_VERSION_FOUND: DriverCode = DriverCode(0x1110);
    pub const WIFI_NOT_INIT: DriverCode = DriverCode(0x3001);
    pub const WIFI_NOT_STARTED: DriverCode = DriverCode(0x3002);
    pub const WIFI_MODE: DriverCode = DriverCode(0x3005);
    pub const WIFI_CONN: DriverCode = DriverCode(0x3007);
    pub const WIFI_SSID: DriverCode = DriverCode(0x300a);
    pub const WIFI_PASSWORD: DriverCode = DriverCode(0x300b);

    pub fn name(self) -> &'static str {
        match self {
            Self::FAIL => "FAIL",
            Self::NO_MEM => "NO_MEM",
            Self::INVALID_ARG => "INVALID_ARG",
            Self::INVALID_STATE => "INVALID_STATE",
            Self::NOT_FOUND => "NOT_FOUND",
            Self::NOT_SUPPORTED => "NOT_SUPPORTED",
            Self::TIMEOUT => "TIMEOUT",
            Self::NVS_NO_FREE_PAGES => "NVS_NO_FREE_PAGES",
            Self::NVS_NEW_VERSION_FOUND => "NVS_NEW_VERSION_FOUND",
            Self::WIFI_NOT_INIT => "WIFI_NOT_INIT",
            Self::WIFI_NOT_STARTED => "WIFI_NOT_STARTED",
            Self::WIFI_MODE => "WIFI_MODE",
            Self::WIFI_CONN => "WIFI_CONN",
            Self::WIFI_SSID => "WIFI_SSID",
            Self::WIFI_PASSWORD => "WIFI_PASSWORD",
            _ => "UNKNOWN_ERROR",
        }
    }

    /// Storage reports that it must be erased before it can be mounted.
    pub fn needs_storage_erase(self) -> bool {
        self == Self::NVS_NO_FREE_PAGES || self == Self::NVS_NEW_VERSION_FOUND
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#x})", self.name(), self.0)
    }
}

// -----------------------------------------------------------------------------
// Identity

/// Network name, at most [`MAX_SSID_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ssid(String);

impl Ssid {
    /// Validates user input. Empty and overlong names are rejected.
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::ConfigInvalid("SSID must not be empty".into()));
        }
        if s.len() > MAX_SSID_LEN {
            return Err(Error::ConfigInvalid(format!(
                "SSID is {} bytes, limit is {}",
                s.len(),
                MAX_SSID_LEN
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Decodes the driver's raw field: stops at the first NUL, clips to the
    /// field size and replaces invalid UTF-8. Hidden networks yield "".
    pub fn from_raw(bytes: &[u8]) -> Self {
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(bytes.len())
            .min(MAX_SSID_LEN);
        Self(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_hidden(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Ssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Pre-shared key or passphrase. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Overlong input is rejected rather than truncated.
    pub fn new(s: &str) -> Result<Self> {
        if s.len() > MAX_CREDENTIAL_LEN {
            return Err(Error::ConfigInvalid(format!(
                "credential is {} bytes, limit is {}",
                s.len(),
                MAX_CREDENTIAL_LEN
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(empty)")
        } else {
            f.write_str("Credential(********)")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bssid(pub [u8; 6]);

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for Bssid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// -----------------------------------------------------------------------------
// Security

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    Open,
    Wep,
    WpaPsk,
    Wpa2Psk,
    WpaWpa2Psk,
    Wpa3Psk,
    Wpa2Wpa3Psk,
    Unknown,
}

impl AuthMode {
    /// Maps the driver's numeric auth mode. Anything unrecognized
    /// (enterprise modes, out-of-range sentinels) becomes `Unknown`.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => AuthMode::Open,
            1 => AuthMode::Wep,
            2 => AuthMode::WpaPsk,
            3 => AuthMode::Wpa2Psk,
            4 => AuthMode::WpaWpa2Psk,
            6 => AuthMode::Wpa3Psk,
            7 => AuthMode::Wpa2Wpa3Psk,
            _ => AuthMode::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        auth_mode_label(self)
    }
}

/// Display string for an auth mode; total, unrecognized modes read "UNKNOWN".
pub fn auth_mode_label(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Open => "OPEN",
        AuthMode::Wep => "WEP",
        AuthMode::WpaPsk => "WPA_PSK",
        AuthMode::Wpa2Psk => "WPA2_PSK",
        AuthMode::WpaWpa2Psk => "WPA_WPA2_PSK",
        AuthMode::Wpa3Psk => "WPA3_PSK",
        AuthMode::Wpa2Wpa3Psk => "WPA2_WPA3_PSK",
        AuthMode::Unknown => "UNKNOWN",
    }
}

impl Serialize for AuthMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CipherType {
    None,
    Wep40,
    Wep104,
    Tkip,
    Ccmp,
    TkipCcmp,
    AesCmac128,
    Sms4,
    Gcmp,
    Gcmp256,
    Unknown,
}

impl CipherType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => CipherType::None,
            1 => CipherType::Wep40,
            2 => CipherType::Wep104,
            3 => CipherType::Tkip,
            4 => CipherType::Ccmp,
            5 => CipherType::TkipCcmp,
            6 => CipherType::AesCmac128,
            7 => CipherType::Sms4,
            8 => CipherType::Gcmp,
            9 => CipherType::Gcmp256,
            _ => CipherType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CipherInfo {
    pub pairwise: CipherType,
    pub group: CipherType,
}

// -----------------------------------------------------------------------------
// Scan results

/// A single discovered network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPointRecord {
    pub ssid: Ssid,
    pub bssid: Bssid,
    /// dBm
    pub rssi: i8,
    pub channel: u8,
    pub auth_mode: AuthMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherInfo>,
}

impl AccessPointRecord {
    /// Open networks never carry cipher information.
    pub fn normalized(mut self) -> Self {
        if self.auth_mode == AuthMode::Open {
            self.cipher = None;
        }
        self
    }
}

/// The latest completed scan, bounded to the manager's configured capacity.
///
/// Instances are immutable once built: a new scan produces a new value that
/// replaces the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    records: Vec<AccessPointRecord>,
    /// How many records the driver reported before truncation.
    total_found: usize,
}

impl ScanResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keeps the first `capacity` records in driver order and drops the rest.
    pub fn from_records(
        records: Vec<AccessPointRecord>,
        reported_total: usize,
        capacity: usize,
    ) -> Self {
        let total_found = reported_total.max(records.len());
        let records = records
            .into_iter()
            .take(capacity)
            .map(AccessPointRecord::normalized)
            .collect();
        Self { records, total_found }
    }

    pub fn records(&self) -> &[AccessPointRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccessPointRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_found(&self) -> usize {
        self.total_found
    }

    pub fn truncated(&self) -> bool {
        self.total_found > self.records.len()
    }

    /// Dumps every record at debug level.
    pub fn log_records(&self) {
        for ap in &self.records {
            match ap.cipher {
                Some(cipher) => tracing::debug!(
                    ssid = %ap.ssid,
                    rssi = ap.rssi,
                    channel = ap.channel,
                    auth = ap.auth_mode.label(),
                    pairwise = ?cipher.pairwise,
                    group = ?cipher.group,
                    "access point"
                ),
                None => tracing::debug!(
                    ssid = %ap.ssid,
                    rssi = ap.rssi,
                    channel = ap.channel,
                    auth = ap.auth_mode.label(),
                    "access point"
                ),
            }
        }
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = &'a AccessPointRecord;
    type IntoIter = std::slice::Iter<'a, AccessPointRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Raw output of a driver record fetch.
#[derive(Debug, Clone, Default)]
pub struct ScanRecords {
    pub records: Vec<AccessPointRecord>,
    /// Number of APs the driver found, which may exceed `records.len()`.
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    Active,
    Passive,
}

/// Discovery request handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Restrict to one SSID; `None` scans for all.
    pub ssid: Option<Ssid>,
    pub bssid: Option<Bssid>,
    /// 0 means every channel.
    pub channel: u8,
    pub show_hidden: bool,
    pub scan_type: ScanType,
    pub dwell_min: Duration,
    pub dwell_max: Duration,
}

// -----------------------------------------------------------------------------
// Association

/// What the caller wants to join. Transient, validated before use.
#[derive(Clone)]
pub struct ConnectionRequest {
    pub ssid: String,
    pub credential: String,
}

impl ConnectionRequest {
    pub fn new(ssid: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            credential: credential.into(),
        }
    }

    /// Bounds-checks against the driver's fixed-size fields.
    pub fn validate(&self) -> Result<StationConfig> {
        Ok(StationConfig {
            ssid: Ssid::new(&self.ssid)?,
            credential: Credential::new(&self.credential)?,
        })
    }
}

impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("ssid", &self.ssid)
            .field("credential", &"********")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    pub ssid: Ssid,
    pub credential: Credential,
}

// -----------------------------------------------------------------------------
// Radio settings

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    Station,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSave {
    None,
    MinModem,
    MaxModem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryPolicy {
    Auto,
    Manual,
}

/// Regulatory domain applied once the radio is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryConfig {
    pub code: String,
    pub start_channel: u8,
    pub channel_count: u8,
    pub max_tx_power_dbm: i8,
    pub policy: CountryPolicy,
}

// -----------------------------------------------------------------------------
// Events

/// Reason code attached to a station disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectReason(pub u8);

impl DisconnectReason {
    pub const UNSPECIFIED: DisconnectReason = DisconnectReason(1);
    pub const AUTH_EXPIRE: DisconnectReason = DisconnectReason(2);
    pub const ASSOC_LEAVE: DisconnectReason = DisconnectReason(8);
    pub const BEACON_TIMEOUT: DisconnectReason = DisconnectReason(200);
    pub const NO_AP_FOUND: DisconnectReason = DisconnectReason(201);
    pub const AUTH_FAIL: DisconnectReason = DisconnectReason(202);
    pub const ASSOC_FAIL: DisconnectReason = DisconnectReason(203);
    pub const HANDSHAKE_TIMEOUT: DisconnectReason = DisconnectReason(204);
    pub const CONNECTION_FAIL: DisconnectReason = DisconnectReason(205);

    pub fn name(self) -> &'static str {
        match self {
            Self::UNSPECIFIED => "UNSPECIFIED",
            Self::AUTH_EXPIRE => "AUTH_EXPIRE",
            Self::ASSOC_LEAVE => "ASSOC_LEAVE",
            Self::BEACON_TIMEOUT => "BEACON_TIMEOUT",
            Self::NO_AP_FOUND => "NO_AP_FOUND",
            Self::AUTH_FAIL => "AUTH_FAIL",
            Self::ASSOC_FAIL => "ASSOC_FAIL",
            Self::HANDSHAKE_TIMEOUT => "HANDSHAKE_TIMEOUT",
            Self::CONNECTION_FAIL => "CONNECTION_FAIL",
            _ => "OTHER",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

impl Serialize for DisconnectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Asynchronous notification from the radio subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    ScanDone { success: bool, count: u16 },
    StaStarted,
    StaDisconnected { reason: DisconnectReason },
    /// Any other event id; ignored by the manager.
    Other(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ssid: &str, auth_mode: AuthMode) -> AccessPointRecord {
        AccessPointRecord {
            ssid: Ssid::new(ssid).unwrap(),
            bssid: Bssid::default(),
            rssi: -60,
            channel: 6,
            auth_mode,
            cipher: Some(CipherInfo {
                pairwise: CipherType::Ccmp,
                group: CipherType::Ccmp,
            }),
        }
    }

    #[test]
    fn auth_mode_labels_are_total() {
        let modes = [
            (AuthMode::Open, "OPEN"),
            (AuthMode::Wep, "WEP"),
            (AuthMode::WpaPsk, "WPA_PSK"),
            (AuthMode::Wpa2Psk, "WPA2_PSK"),
            (AuthMode::WpaWpa2Psk, "WPA_WPA2_PSK"),
            (AuthMode::Wpa3Psk, "WPA3_PSK"),
            (AuthMode::Wpa2Wpa3Psk, "WPA2_WPA3_PSK"),
            (AuthMode::Unknown, "UNKNOWN"),
        ];
        for (mode, label) in modes {
            assert_eq!(auth_mode_label(mode), label);
        }
        for raw in [5, 8, 42, u32::MAX] {
            assert_eq!(AuthMode::from_raw(raw).label(), "UNKNOWN");
        }
    }

    #[test]
    fn ssid_bounds() {
        assert!(Ssid::new("").is_err());
        assert!(Ssid::new(&"a".repeat(MAX_SSID_LEN)).is_ok());
        assert!(matches!(
            Ssid::new(&"a".repeat(MAX_SSID_LEN + 1)),
            Err(Error::ConfigInvalid(_))
        ));
    }

    #[test]
    fn raw_ssid_stops_at_nul() {
        let mut raw = [0u8; 33];
        raw[..4].copy_from_slice(b"Net1");
        assert_eq!(Ssid::from_raw(&raw).as_str(), "Net1");
        assert!(Ssid::from_raw(&[0u8; 32]).is_hidden());
        assert_eq!(Ssid::from_raw(&[b'x'; 40]).as_str().len(), MAX_SSID_LEN);
    }

    #[test]
    fn overlong_credential_is_rejected_not_truncated() {
        let req = ConnectionRequest::new("Home", "k".repeat(MAX_CREDENTIAL_LEN + 1));
        assert!(matches!(req.validate(), Err(Error::ConfigInvalid(_))));

        let req = ConnectionRequest::new("Home", "k".repeat(MAX_CREDENTIAL_LEN));
        let cfg = req.validate().unwrap();
        assert_eq!(cfg.credential.as_str().len(), MAX_CREDENTIAL_LEN);
    }

    #[test]
    fn credential_is_redacted_in_debug_output() {
        let req = ConnectionRequest::new("Home", "secret");
        assert!(!format!("{req:?}").contains("secret"));
        let cfg = req.validate().unwrap();
        assert!(!format!("{cfg:?}").contains("secret"));
    }

    #[test]
    fn scan_result_truncates_and_strips_open_ciphers() {
        let records = vec![
            record("A", AuthMode::Open),
            record("B", AuthMode::Wpa2Psk),
            record("C", AuthMode::Wpa3Psk),
        ];
        let result = ScanResult::from_records(records, 3, 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result.total_found(), 3);
        assert!(result.truncated());
        assert_eq!(result.records()[0].cipher, None);
        assert!(result.records()[1].cipher.is_some());
    }

    #[test]
    fn record_serializes_with_labels() {
        let json = serde_json::to_value(record("Net1", AuthMode::Wpa2Psk)).unwrap();
        assert_eq!(json["ssid"], "Net1");
        assert_eq!(json["auth_mode"], "WPA2_PSK");
        assert_eq!(json["bssid"], "00:00:00:00:00:00");
        assert_eq!(json["cipher"]["pairwise"], "CCMP");
    }

    #[test]
    fn driver_code_display_names_known_codes() {
        assert_eq!(DriverCode::INVALID_STATE.to_string(), "INVALID_STATE (0x103)");
        assert!(DriverCode::NVS_NO_FREE_PAGES.needs_storage_erase());
        assert!(!DriverCode::FAIL.needs_storage_erase());
        assert_eq!(DriverCode(0x7777).name(), "UNKNOWN_ERROR");
    }
}
