use wifi_manager_core::WifiManager;

/// On-Start 策略：程序启动时立即打开无线并扫描
pub async fn run(manager: &WifiManager) {
    println!("🚀 Policy: On-Start. Enabling Wi-Fi immediately.");
    let report = crate::runner::enable_radio(manager).await;
    if report.initialized {
        tracing::info!("📡 {} access points cached", manager.ap_count());
    }
}
