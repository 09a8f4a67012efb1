//! 演示订单服务（进程内存储）

use crate::{
    error::AppError,
    models::order::{CreateOrderRequest, Order},
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use validator::Validate;

pub struct OrderService {
    orders: DashMap<i64, Order>,
    next_id: AtomicI64,
}

impl OrderService {
    /// 预置三条演示订单
    pub fn with_demo_data() -> Self {
        let service = Self {
            orders: DashMap::new(),
            next_id: AtomicI64::new(1),
        };

        for (item, price, owner) in [
            ("Laptop", 1200, "user_1"),
            ("Mouse", 25, "user_2"),
            ("Keyboard", 100, "user_1"),
        ] {
            service.insert(item.to_string(), price, owner.to_string());
        }

        service
    }

    fn insert(&self, item: String, price: i64, owner: String) -> Order {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let order = Order {
            id,
            item,
            price,
            owner,
        };
        self.orders.insert(id, order.clone());
        order
    }

    pub fn list(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.iter().map(|e| e.value().clone()).collect();
        orders.sort_by_key(|o| o.id);
        orders
    }

    pub fn create(&self, req: CreateOrderRequest, owner: &str) -> Result<Order, AppError> {
        req.validate()?;
        Ok(self.insert(req.item, req.price, owner.to_string()))
    }

    pub fn delete(&self, id: i64) -> Result<Order, AppError> {
        self.orders
            .remove(&id)
            .map(|(_, order)| order)
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))
    }
}
