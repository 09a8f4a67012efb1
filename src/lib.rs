//! 令牌生命周期与资源级授权服务

pub mod auth;
pub mod config;
pub mod db;
pub mod denylist;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
