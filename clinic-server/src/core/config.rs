use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::core::ServerError;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | {WORK_DIR}/clinic.db | SQLite 数据库文件 |
/// | ROUTE_ROOT | ./src/app | 路由扫描根目录 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// JWT 相关见 [`JwtConfig::from_env`]，日志相关 (`LOG_LEVEL` / `LOG_DIR` /
/// `LOG_JSON`) 见 [`crate::setup_environment`]。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/var/lib/clinic HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 数据库文件路径
    pub database_path: String,
    /// 路由扫描根目录
    pub route_root: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值；JWT 密钥缺失或过短时返回错误
    pub fn from_env() -> Result<Self, ServerError> {
        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;
        let work_dir = env_or("WORK_DIR", "./data");
        Ok(Self::build(work_dir, jwt))
    }

    /// 使用自定义工作目录和 JWT 配置，其余取环境变量或默认值
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16, jwt: JwtConfig) -> Self {
        let mut config = Self::build(work_dir.into(), jwt);
        config.http_port = http_port;
        config.database_path = format!("{}/clinic.db", config.work_dir);
        config
    }

    fn build(work_dir: String, jwt: JwtConfig) -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| format!("{work_dir}/clinic.db")),
            route_root: env_or("ROUTE_ROOT", "./src/app"),
            environment: env_or("ENVIRONMENT", "development"),
            work_dir,
            jwt,
        }
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<PathBuf> {
        let dir = PathBuf::from(&self.work_dir);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
