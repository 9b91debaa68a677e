//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公共)
//! - [`permission`] - 权限注册表: 列表、启停、扫描对账
//! - [`role`] - 角色管理接口
//! - [`user`] - 用户与角色分配
//! - [`rbac`] - 默认角色初始化
//! - [`access`] - 当前用户权限视图、管理员检查

pub mod access;
pub mod health;
pub mod permission;
pub mod rbac;
pub mod role;
pub mod user;
