use wifi_manager_core::WifiManager;

/// On-Demand 策略：无线保持关闭，直到界面请求打开
pub fn run(manager: &WifiManager) {
    println!("🚀 Policy: On-Demand. Wi-Fi stays off until requested.");
    tracing::debug!(state = %manager.state(), "Waiting for the first request");
}
