//! RBAC 初始化接口
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/rbac/seed | POST | 按路由清单同步权限并补齐系统角色 |

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::require_route_permission;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/rbac/seed", post(handler::seed))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_route_permission,
        ))
}
