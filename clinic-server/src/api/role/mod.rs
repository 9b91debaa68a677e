//! Role API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/roles | GET | 列表 (`?all=true` 含停用角色) |
//! | /api/roles | POST | 创建角色 |
//! | /api/roles/{id} | GET / PUT / DELETE | 查询、修改、删除 (`?force=true`) |
//! | /api/roles/{id}/permissions | PUT | 替换权限集合 |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_route_permission;
use crate::core::ServerState;

/// Role router - every route is checked against its own route permission
pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/roles", get(handler::list).post(handler::create))
        .route(
            "/api/roles/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/api/roles/{id}/permissions", put(handler::set_permissions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_route_permission,
        ))
}
