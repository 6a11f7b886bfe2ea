use crate::config::{AppConfig, DemoConfig};
use crate::{policy, web_server};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use wifi_manager_core::WifiManager;
use wifi_manager_core::backends::mock::{SimulatedRadio, demo_networks};

/// Outcome of switching the radio on, step by step, so the UI can tell an
/// init failure from a scan failure.
#[derive(Debug, Clone, Serialize)]
pub struct EnableReport {
    pub initialized: bool,
    /// "Scan done." or the failure, `None` when init already failed.
    pub scan: Option<String>,
    pub scan_ok: bool,
}

/// 打开无线：初始化，然后扫描。列表总是取自缓存。
pub async fn enable_radio(manager: &WifiManager) -> EnableReport {
    if let Err(e) = manager.init().await {
        tracing::error!("❌ WiFi init failed: {}", e);
        return EnableReport {
            initialized: false,
            scan: None,
            scan_ok: false,
        };
    }
    match manager.scan().await {
        Ok(result) => {
            tracing::info!("✅ Scan done, {} networks.", result.len());
            EnableReport {
                initialized: true,
                scan: Some("Scan done.".to_string()),
                scan_ok: true,
            }
        }
        Err(e) => {
            tracing::warn!("⚠️ Scan failed: {}", e);
            EnableReport {
                initialized: true,
                scan: Some(format!("Scan failed: {}", e)),
                scan_ok: false,
            }
        }
    }
}

pub fn build_radio(demo: &DemoConfig) -> SimulatedRadio {
    let mut radio = SimulatedRadio::new()
        .with_networks(demo_networks())
        .with_scan_delay(Duration::from_millis(demo.scan_delay_ms));
    for ssid in &demo.unreachable {
        radio = radio.with_unreachable(ssid);
    }
    if demo.preexisting_event_loop {
        radio = radio.with_preexisting_event_loop();
    }
    radio
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("🤖 Radio: Simulated backend selected");
    let radio = Arc::new(build_radio(&config.demo));
    let manager = Arc::new(WifiManager::with_driver(config.wifi.clone(), radio)?);

    policy::dispatch(config.startup, &manager).await;

    web_server::run_server(manager.clone(), config.bind_addr).await?;

    // Leave the radio the way we found it.
    if let Err(e) = manager.deinit().await {
        tracing::error!("❌ Deinit on shutdown failed: {}", e);
    }
    tracing::info!("🛑 Shutting down.");
    Ok(())
}
