//! 数据模型模块
//! 用户、角色与资源访问规则、认证请求

pub mod auth;
pub mod order;
pub mod role;
pub mod user;
