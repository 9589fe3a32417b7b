//! In-memory store for tests.
//!
//! A unit works on a private copy of the state and swaps it in on commit, so
//! an aborted unit leaves nothing behind. Units run one at a time.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{Store, UnitFuture, UnitOfWork};
use crate::error::{ServiceError, ServiceResult};
use crate::models::*;

const FIRST_ORDER_NUMBER: i64 = 100_001;

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: HashMap<Uuid, User>,
    pub wallet_transactions: Vec<WalletTransaction>,
    pub loyalty_transactions: Vec<LoyaltyTransaction>,
    pub coupons: Vec<Coupon>,
    pub products: HashMap<Uuid, Product>,
    pub orders: Vec<Order>,
    pub order_details: Vec<OrderDetail>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_after_writes: RwLock<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following unit fail on its write number `writes + 1`.
    pub async fn set_fail_after_writes(&self, writes: Option<usize>) {
        *self.fail_after_writes.write().await = writes;
    }

    pub async fn add_user(&self, wallet_balance: BigDecimal, loyalty_point: i64) -> Uuid {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("{}@example.com", id.simple()),
            wallet_balance,
            loyalty_point,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.state.lock().await.users.insert(id, user);
        id
    }

    pub async fn add_product(&self, name: &str, price: BigDecimal) -> Uuid {
        let id = Uuid::new_v4();
        let product = Product {
            id,
            name: name.to_string(),
            price,
            tax: BigDecimal::from(0),
            discount: BigDecimal::from(0),
            unit: Some("kg".to_string()),
            added_by: "admin".to_string(),
            seller_id: None,
            status: true,
        };
        self.state.lock().await.products.insert(id, product);
        id
    }

    pub async fn add_coupon(&self, coupon: Coupon) {
        self.state.lock().await.coupons.push(coupon);
    }

    /// Records a bare order carrying `coupon_code`, as an earlier redemption.
    pub async fn add_redemption(&self, customer_id: Uuid, coupon_code: &str) {
        let mut state = self.state.lock().await;
        let order = Order {
            id: FIRST_ORDER_NUMBER + state.orders.len() as i64,
            user_id: customer_id,
            order_amount: BigDecimal::from(0),
            payment_status: "paid".to_string(),
            order_status: "delivered".to_string(),
            payment_method: "cash_on_delivery".to_string(),
            discount_amount: BigDecimal::from(0),
            coupon_code: Some(coupon_code.to_string()),
            discount_type: None,
            shipping_address: None,
            created_at: Utc::now(),
        };
        state.orders.push(order);
    }

    pub async fn user(&self, user_id: Uuid) -> User {
        self.state.lock().await.users[&user_id].clone()
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

struct MemoryUnit {
    staged: MemoryState,
    writes: usize,
    fail_after: Option<usize>,
}

impl MemoryUnit {
    fn record_write(&mut self) -> ServiceResult<()> {
        if self.fail_after == Some(self.writes) {
            return Err(ServiceError::Storage("injected write failure".to_string()));
        }
        self.writes += 1;
        Ok(())
    }

    fn user_mut(&mut self, user_id: Uuid) -> ServiceResult<&mut User> {
        self.staged
            .users
            .get_mut(&user_id)
            .ok_or(ServiceError::UserNotFound(user_id))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn lock_user(&mut self, user_id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.staged.users.get(&user_id).cloned())
    }

    async fn set_wallet_balance(&mut self, user_id: Uuid, balance: BigDecimal) -> ServiceResult<()> {
        self.record_write()?;
        let user = self.user_mut(user_id)?;
        user.wallet_balance = balance;
        user.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn set_loyalty_point(&mut self, user_id: Uuid, points: i64) -> ServiceResult<()> {
        self.record_write()?;
        let user = self.user_mut(user_id)?;
        user.loyalty_point = points;
        user.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn append_wallet_transaction(
        &mut self,
        row: NewWalletTransaction,
    ) -> ServiceResult<WalletTransaction> {
        self.record_write()?;
        let created = WalletTransaction {
            id: self.staged.wallet_transactions.len() as i64 + 1,
            user_id: row.user_id,
            transaction_id: row.transaction_id,
            transaction_type: row.transaction_type,
            credit: row.credit,
            debit: row.debit,
            balance: row.balance,
            reference: row.reference,
            created_at: Utc::now(),
        };
        self.staged.wallet_transactions.push(created.clone());
        Ok(created)
    }

    async fn append_loyalty_transaction(
        &mut self,
        row: NewLoyaltyTransaction,
    ) -> ServiceResult<LoyaltyTransaction> {
        self.record_write()?;
        let created = LoyaltyTransaction {
            id: self.staged.loyalty_transactions.len() as i64 + 1,
            user_id: row.user_id,
            transaction_id: row.transaction_id,
            transaction_type: row.transaction_type,
            credit: row.credit,
            debit: row.debit,
            balance: row.balance,
            reference: row.reference,
            created_at: Utc::now(),
        };
        self.staged.loyalty_transactions.push(created.clone());
        Ok(created)
    }

    async fn find_product(&mut self, product_id: Uuid) -> ServiceResult<Option<Product>> {
        Ok(self.staged.products.get(&product_id).cloned())
    }

    async fn insert_order(&mut self, order: NewOrder) -> ServiceResult<Order> {
        self.record_write()?;
        let created = Order {
            id: FIRST_ORDER_NUMBER + self.staged.orders.len() as i64,
            user_id: order.user_id,
            order_amount: order.order_amount,
            payment_status: order.payment_status,
            order_status: order.order_status,
            payment_method: order.payment_method,
            discount_amount: order.discount_amount,
            coupon_code: order.coupon_code,
            discount_type: order.discount_type,
            shipping_address: order.shipping_address,
            created_at: Utc::now(),
        };
        self.staged.orders.push(created.clone());
        Ok(created)
    }

    async fn insert_order_detail(&mut self, detail: NewOrderDetail) -> ServiceResult<OrderDetail> {
        self.record_write()?;
        let created = OrderDetail {
            id: detail.id,
            order_id: detail.order_id,
            product_id: detail.product_id,
            seller_id: detail.seller_id,
            product_details: detail.product_details,
            qty: detail.qty,
            price: detail.price,
            tax: detail.tax,
            discount: detail.discount,
            discount_type: detail.discount_type,
            variant: detail.variant,
            variation: detail.variation,
            delivery_status: detail.delivery_status,
            payment_status: detail.payment_status,
            created_at: Utc::now(),
        };
        self.staged.order_details.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn atomic<R, F>(&self, work: F) -> ServiceResult<R>
    where
        R: Send + 'static,
        F: for<'u> FnOnce(&'u mut dyn UnitOfWork) -> UnitFuture<'u, R> + Send + 'static,
    {
        let mut committed = self.state.lock().await;
        let mut unit = MemoryUnit {
            staged: committed.clone(),
            writes: 0,
            fail_after: *self.fail_after_writes.read().await,
        };
        let result = work(&mut unit).await?;
        *committed = unit.staged;
        Ok(result)
    }

    async fn find_user(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn find_active_coupon(&self, code: &str) -> ServiceResult<Option<Coupon>> {
        let state = self.state.lock().await;
        Ok(state
            .coupons
            .iter()
            .find(|c| c.code == code && c.status)
            .cloned())
    }

    async fn count_coupon_redemptions(&self, customer_id: Uuid, code: &str) -> ServiceResult<i64> {
        let state = self.state.lock().await;
        let total = state
            .orders
            .iter()
            .filter(|o| o.user_id == customer_id && o.coupon_code.as_deref() == Some(code))
            .count();
        Ok(total as i64)
    }

    async fn find_order(&self, order_id: i64) -> ServiceResult<Option<OrderWithDetails>> {
        let state = self.state.lock().await;
        let Some(order) = state.orders.iter().find(|o| o.id == order_id).cloned() else {
            return Ok(None);
        };
        let details = state
            .order_details
            .iter()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect();
        Ok(Some(OrderWithDetails { order, details }))
    }

    async fn wallet_transactions(&self, user_id: Uuid) -> ServiceResult<Vec<WalletTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .wallet_transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn loyalty_transactions(&self, user_id: Uuid) -> ServiceResult<Vec<LoyaltyTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .loyalty_transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}
