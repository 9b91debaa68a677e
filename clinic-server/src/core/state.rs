use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::db::repository::AccessRepository;
use crate::rbac::{PermissionChecker, RouteScanner};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 克隆成本很低 (连接池和 Arc)，axum 每个请求拿到一份。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 验证服务 |
/// | checker | PermissionChecker | 权限检查器 (无状态，每次都读库) |
/// | scanner | RouteScanner | 路由树扫描器 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub checker: PermissionChecker,
    pub scanner: RouteScanner,
}

impl ServerState {
    /// 打开数据库并组装所有服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::with_db(config.clone(), db))
    }

    /// 使用已打开的数据库组装状态
    pub fn with_db(config: Config, db: DbService) -> Self {
        let checker = PermissionChecker::new(Arc::new(AccessRepository::new(db.pool.clone())));
        let scanner = RouteScanner::new(&config.route_root);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            config,
            db,
            jwt_service,
            checker,
            scanner,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}
