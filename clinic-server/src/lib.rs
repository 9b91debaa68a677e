//! Clinic Server - 诊所管理系统的权限服务
//!
//! # 架构概述
//!
//! 用户的有效权限由两部分决定：旧版单角色字段 (`super_admin` 直接放行)
//! 和 用户 → 角色 → 权限 的多对多关系。权限以 `{route}:{method}` 为单位，
//! 由路由扫描或路由清单自动登记。
//!
//! - **权限解析** (`rbac`): 路由扫描、规范化、权限检查、对账、默认角色
//! - **数据库** (`db`): 嵌入式 SQLite (sqlx)
//! - **认证** (`auth`): JWT 验证 + 路由权限中间件
//! - **HTTP API** (`api`, `routes`): 管理接口
//!
//! # 模块结构
//!
//! ```text
//! clinic-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 验证、中间件
//! ├── rbac/          # 权限解析
//! ├── db/            # 数据库层
//! ├── api/           # HTTP 处理器
//! ├── routes/        # 路由组装、路由清单
//! └── utils/         # 错误转换、日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod rbac;
pub mod routes;
pub mod utils;

use anyhow::Context;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use rbac::{PermissionChecker, RouteScanner, normalize_route};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 .env，初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    let log_dir = std::env::var("LOG_DIR").ok();
    if let Some(dir) = &log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log dir {dir}"))?;
    }

    init_logger_with_file(Some(&log_level), Some(log_json), log_dir.as_deref());
    Ok(())
}
