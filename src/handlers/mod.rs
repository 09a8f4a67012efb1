//! HTTP 处理器模块

pub mod auth;
pub mod business;
pub mod health;
pub mod role;
pub mod user;
