//! Business logic services layer

pub mod auth_service;
pub mod bootstrap;
pub mod order_service;
pub mod rbac_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use order_service::OrderService;
pub use rbac_service::RbacService;
pub use user_service::UserService;
