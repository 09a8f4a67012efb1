//! 演示业务资源：订单

use serde::{Deserialize, Serialize};

/// 订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub item: String,
    pub price: i64,
    pub owner: String,
}

/// 创建订单请求
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub item: String,
    #[validate(range(min = 0))]
    pub price: i64,
}
