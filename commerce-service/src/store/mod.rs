//! Persistence seam for the ledgers and orders.
//!
//! Every multi-record write goes through [`Store::atomic`]: the closure gets a
//! [`UnitOfWork`] bound to one database transaction, and nothing it wrote
//! survives unless the closure returns `Ok`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::models::*;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

pub type UnitFuture<'u, R> = BoxFuture<'u, ServiceResult<R>>;

#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads the user and keeps the row locked until the unit ends.
    async fn lock_user(&mut self, user_id: Uuid) -> ServiceResult<Option<User>>;

    async fn set_wallet_balance(&mut self, user_id: Uuid, balance: BigDecimal) -> ServiceResult<()>;

    async fn set_loyalty_point(&mut self, user_id: Uuid, points: i64) -> ServiceResult<()>;

    async fn append_wallet_transaction(
        &mut self,
        row: NewWalletTransaction,
    ) -> ServiceResult<WalletTransaction>;

    async fn append_loyalty_transaction(
        &mut self,
        row: NewLoyaltyTransaction,
    ) -> ServiceResult<LoyaltyTransaction>;

    async fn find_product(&mut self, product_id: Uuid) -> ServiceResult<Option<Product>>;

    /// Inserts the order; the store assigns the sequential order number.
    async fn insert_order(&mut self, order: NewOrder) -> ServiceResult<Order>;

    async fn insert_order_detail(&mut self, detail: NewOrderDetail) -> ServiceResult<OrderDetail>;
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn atomic<R, F>(&self, work: F) -> ServiceResult<R>
    where
        R: Send + 'static,
        F: for<'u> FnOnce(&'u mut dyn UnitOfWork) -> UnitFuture<'u, R> + Send + 'static;

    async fn find_user(&self, user_id: Uuid) -> ServiceResult<Option<User>>;

    async fn find_active_coupon(&self, code: &str) -> ServiceResult<Option<Coupon>>;

    /// Number of the customer's orders that carry `code`.
    async fn count_coupon_redemptions(&self, customer_id: Uuid, code: &str) -> ServiceResult<i64>;

    async fn find_order(&self, order_id: i64) -> ServiceResult<Option<OrderWithDetails>>;

    async fn wallet_transactions(&self, user_id: Uuid) -> ServiceResult<Vec<WalletTransaction>>;

    async fn loyalty_transactions(&self, user_id: Uuid) -> ServiceResult<Vec<LoyaltyTransaction>>;
}
