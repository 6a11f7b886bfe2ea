//! Scan and connect.

use super::{ManagerState, WifiManager};
use crate::config::ScanWait;
use crate::types::{ConnectionRequest, DriverCode, ScanConfig, ScanResult};
use crate::{Error, Result};
use std::sync::Arc;

impl WifiManager {
    /// Active scan over all channels. Suspends the caller until the scan
    /// finishes or the configured timeout elapses.
    ///
    /// On success the cache is replaced by the new (capacity-bounded) result,
    /// which is also returned. On failure the previous cache is untouched.
    pub async fn scan(&self) -> Result<Arc<ScanResult>> {
        self.enter("scan", ManagerState::Ready, ManagerState::Scanning)?;
        tracing::info!("Performing Wi-Fi scan...");

        let outcome = match self.run_scan().await {
            Ok(result) => {
                tracing::info!(
                    count = result.len(),
                    total = result.total_found(),
                    "Found access points"
                );
                if result.truncated() {
                    tracing::warn!(
                        capacity = self.config.scan_capacity,
                        total = result.total_found(),
                        "Scan result truncated"
                    );
                }
                result.log_records();
                Ok(self.publish(result))
            }
            Err(e) => {
                tracing::error!(error = %e, "Wi-Fi scan failed");
                Err(e)
            }
        };
        self.set_state(ManagerState::Ready);
        outcome
    }

    async fn run_scan(&self) -> Result<ScanResult> {
        let scan_config = self.config.scan_config();
        let timeout = self.config.scan_timeout;

        match self.config.scan_wait {
            ScanWait::Blocking => {
                self.bridge.begin_scan();
                let started =
                    tokio::time::timeout(timeout, self.radio.scan_start(&scan_config, true)).await;
                self.bridge.end_scan();
                started
                    .map_err(|_| Error::ScanTimedOut { timeout })?
                    .map_err(|code| Error::driver("scan_start", code))?;
            }
            ScanWait::Event => {
                // Start and wait share one deadline.
                match tokio::time::timeout(timeout, self.start_and_await_scan(&scan_config)).await
                {
                    Ok(done) => {
                        self.bridge.end_scan();
                        done?;
                    }
                    Err(_) => {
                        self.bridge.abandon_scan();
                        return Err(Error::ScanTimedOut { timeout });
                    }
                }
            }
        }

        let capacity = self.config.scan_capacity;
        let fetched = self
            .radio
            .scan_get_records(capacity)
            .await
            .map_err(|code| Error::driver("scan_get_records", code))?;
        Ok(ScanResult::from_records(fetched.records, fetched.total, capacity))
    }

    async fn start_and_await_scan(&self, scan_config: &ScanConfig) -> Result<()> {
        self.bridge.settle().await;
        self.bridge.begin_scan();
        self.radio
            .scan_start(scan_config, false)
            .await
            .map_err(|code| Error::driver("scan_start", code))?;
        self.bridge.scan_done().wait_set().await;
        if !self.bridge.last_scan_succeeded() {
            return Err(Error::driver("scan_done", DriverCode::FAIL));
        }
        Ok(())
    }

    /// Applies the station config and asks the driver to associate.
    ///
    /// Returns once the request is accepted; the association outcome is
    /// reported later through [`WifiManager::link_status`].
    pub async fn connect(&self, request: &ConnectionRequest) -> Result<()> {
        self.enter("connect", ManagerState::Ready, ManagerState::Connecting)?;
        let result = self.apply_and_connect(request).await;
        self.set_state(ManagerState::Ready);
        result
    }

    /// Same as [`WifiManager::connect`] for callers holding plain strings.
    pub async fn connect_to(&self, ssid: &str, credential: &str) -> Result<()> {
        self.connect(&ConnectionRequest::new(ssid, credential)).await
    }

    async fn apply_and_connect(&self, request: &ConnectionRequest) -> Result<()> {
        let station = request.validate()?;
        tracing::info!(ssid = %station.ssid, "Connecting to SSID");

        self.radio
            .set_station_config(&station)
            .await
            .map_err(|code| Error::driver("set_station_config", code))?;
        self.radio
            .connect()
            .await
            .map_err(|code| Error::driver("connect", code))?;

        tracing::info!(ssid = %station.ssid, "Connection initiated");
        Ok(())
    }
}
