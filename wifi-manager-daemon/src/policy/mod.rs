use crate::config::StartupPolicy;
use wifi_manager_core::WifiManager;

pub mod on_demand;
pub mod on_start;

/// 策略调度器：根据配置的启动策略调用对应实现。
pub async fn dispatch(policy: StartupPolicy, manager: &WifiManager) {
    match policy {
        StartupPolicy::OnStart => on_start::run(manager).await,
        StartupPolicy::OnDemand => on_demand::run(manager),
    }
}
