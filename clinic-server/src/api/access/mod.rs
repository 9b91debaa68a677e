//! Access API
//!
//! | 路径 | 方法 | 说明 | 保护 |
//! |------|------|------|------|
//! | /api/access/me | GET | 当前用户的角色与有效权限 | 路由权限 |
//! | /api/access/check | POST | 任意用户的单次权限检查 | 管理员 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{require_admin, require_route_permission};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let profile = Router::new()
        .route("/api/access/me", get(handler::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_route_permission,
        ));

    let check = Router::new()
        .route("/api/access/check", post(handler::check))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    profile.merge(check)
}
