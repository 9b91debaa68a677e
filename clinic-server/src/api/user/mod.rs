//! User API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/users | POST | 创建用户 |
//! | /api/users/{id} | GET | 用户及其角色 id |
//! | /api/users/{id}/roles | PUT | 替换角色分配 |
//! | /api/users/{id}/legacy-role | PUT | 修改旧版角色字段 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_route_permission;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/users", post(handler::create))
        .route("/api/users/{id}", get(handler::get_by_id))
        .route("/api/users/{id}/roles", put(handler::set_roles))
        .route("/api/users/{id}/legacy-role", put(handler::set_legacy_role))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_route_permission,
        ))
}
