mod config;
mod policy;
mod runner;
mod web_server;

// 如果没有选择任何无线后端，编译失败
#[cfg(not(feature = "backend_mock"))]
compile_error!("No radio backend selected. Please enable one, e.g., --features wifi-manager-daemon/backend_mock");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志（这是入口点的职责）
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // 2. 加载配置并运行
    let result = match config::load_config() {
        Ok(config) => runner::run(config).await,
        Err(e) => Err(e),
    };

    // 3. 处理顶层错误
    if let Err(e) = result {
        tracing::error!("❌ Wi-Fi manager failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
