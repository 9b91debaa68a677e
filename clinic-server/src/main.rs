use anyhow::Context;
use clinic_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    tracing::info!("Clinic server starting...");

    // 2. 加载配置
    let config = Config::from_env().context("failed to load configuration")?;
    config
        .ensure_work_dir()
        .with_context(|| format!("failed to create work dir {}", config.work_dir))?;

    // 3. 初始化服务器状态 (数据库 + 迁移)
    let state = ServerState::initialize(&config)
        .await
        .context("failed to initialize server state")?;

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
