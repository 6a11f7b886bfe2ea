use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use wifi_manager_core::ManagerConfig;
use wifi_manager_core::config::ManagerConfigFile;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "WIFI_MANAGER_CONFIG";

const DEFAULT_CONFIG_TOML: &str = include_str!("../configs.toml");

/// 顶层应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub startup: StartupPolicy,
    pub wifi: ManagerConfig,
    pub demo: DemoConfig,
}

/// What the daemon does with the radio before any UI request arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPolicy {
    OnStart,
    OnDemand,
}

/// Behaviour of the simulated radio.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub scan_delay_ms: u64,
    /// SSIDs that accept a connect request and then drop the link.
    pub unreachable: Vec<String>,
    pub preexisting_event_loop: bool,
}

/// 用于解析 TOML 的临时结构
#[derive(Deserialize)]
struct AppConfigFile {
    server: ServerConfigToml,
    #[serde(default)]
    wifi: ManagerConfigFile,
    #[serde(default)]
    demo: DemoConfig,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerConfigToml {
    bind_addr: String,
    #[serde(default = "default_startup")]
    startup: StartupPolicy,
}

fn default_startup() -> StartupPolicy {
    StartupPolicy::OnDemand
}

/// 从 TOML 字符串加载应用配置
pub fn load_config_from_toml_str(s: &str) -> Result<AppConfig> {
    let parsed: AppConfigFile = toml::from_str(s).context("Failed to parse config TOML")?;
    let bind_addr = SocketAddr::from_str(&parsed.server.bind_addr)
        .with_context(|| format!("Invalid bind_addr {:?}", parsed.server.bind_addr))?;
    let wifi = ManagerConfig::try_from(parsed.wifi).context("Invalid [wifi] section")?;

    Ok(AppConfig {
        bind_addr,
        startup: parsed.server.startup,
        wifi,
        demo: parsed.demo,
    })
}

/// Loads the file named by [`CONFIG_ENV`], or the built-in defaults.
pub fn load_config() -> Result<AppConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            tracing::info!("Loading config from {}", path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path))?;
            load_config_from_toml_str(&text)
        }
        Err(_) => {
            tracing::info!("Using built-in config");
            load_config_from_toml_str(DEFAULT_CONFIG_TOML)
        }
    }
}
