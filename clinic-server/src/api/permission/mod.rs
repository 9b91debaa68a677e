//! Permission Registry API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/permissions | GET | 列表 (`?category=&active=`) |
//! | /api/permissions/{id} | GET | 单个权限 |
//! | /api/permissions/{id}/active | PUT | 启用/停用 |
//! | /api/permissions/scan | POST | 从文件系统或路由清单对账 |
//! | /api/permissions/routes | GET | 扫描结果按分类分组 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_route_permission;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/permissions", get(handler::list))
        .route("/api/permissions/routes", get(handler::routes))
        .route("/api/permissions/scan", post(handler::scan))
        .route("/api/permissions/{id}", get(handler::get_by_id))
        .route("/api/permissions/{id}/active", put(handler::set_active))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_route_permission,
        ))
}
