use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::{Store, UnitFuture, UnitOfWork};
use crate::error::{ServiceError, ServiceResult};
use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn load_business_settings(&self) -> ServiceResult<Vec<BusinessSetting>> {
        let mut conn = self.pool.get().await?;
        let rows = business_settings::table
            .load::<BusinessSetting>(&mut conn)
            .await?;
        Ok(rows)
    }
}

struct PgUnitOfWork<'c> {
    conn: &'c mut AsyncPgConnection,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork<'_> {
    async fn lock_user(&mut self, user_id: Uuid) -> ServiceResult<Option<User>> {
        let user = users::table
            .find(user_id)
            .for_update()
            .first::<User>(self.conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn set_wallet_balance(&mut self, user_id: Uuid, balance: BigDecimal) -> ServiceResult<()> {
        diesel::update(users::table.find(user_id))
            .set((
                users::wallet_balance.eq(balance),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)
            .await?;
        Ok(())
    }

    async fn set_loyalty_point(&mut self, user_id: Uuid, points: i64) -> ServiceResult<()> {
        diesel::update(users::table.find(user_id))
            .set((
                users::loyalty_point.eq(points),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(self.conn)
            .await?;
        Ok(())
    }

    async fn append_wallet_transaction(
        &mut self,
        row: NewWalletTransaction,
    ) -> ServiceResult<WalletTransaction> {
        let created = diesel::insert_into(wallet_transactions::table)
            .values(&row)
            .get_result::<WalletTransaction>(self.conn)
            .await?;
        Ok(created)
    }

    async fn append_loyalty_transaction(
        &mut self,
        row: NewLoyaltyTransaction,
    ) -> ServiceResult<LoyaltyTransaction> {
        let created = diesel::insert_into(loyalty_transactions::table)
            .values(&row)
            .get_result::<LoyaltyTransaction>(self.conn)
            .await?;
        Ok(created)
    }

    async fn find_product(&mut self, product_id: Uuid) -> ServiceResult<Option<Product>> {
        let product = products::table
            .find(product_id)
            .first::<Product>(self.conn)
            .await
            .optional()?;
        Ok(product)
    }

    async fn insert_order(&mut self, order: NewOrder) -> ServiceResult<Order> {
        let created = diesel::insert_into(orders::table)
            .values(&order)
            .get_result::<Order>(self.conn)
            .await?;
        Ok(created)
    }

    async fn insert_order_detail(&mut self, detail: NewOrderDetail) -> ServiceResult<OrderDetail> {
        let created = diesel::insert_into(order_details::table)
            .values(&detail)
            .get_result::<OrderDetail>(self.conn)
            .await?;
        Ok(created)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn atomic<R, F>(&self, work: F) -> ServiceResult<R>
    where
        R: Send + 'static,
        F: for<'u> FnOnce(&'u mut dyn UnitOfWork) -> UnitFuture<'u, R> + Send + 'static,
    {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<R, ServiceError, _>(|conn| {
            Box::pin(async move {
                let mut unit = PgUnitOfWork { conn };
                work(&mut unit).await
            })
        })
        .await
    }

    async fn find_user(&self, user_id: Uuid) -> ServiceResult<Option<User>> {
        let mut conn = self.pool.get().await?;
        let user = users::table
            .find(user_id)
            .first::<User>(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn find_active_coupon(&self, code: &str) -> ServiceResult<Option<Coupon>> {
        let mut conn = self.pool.get().await?;
        let coupon = coupons::table
            .filter(coupons::code.eq(code))
            .filter(coupons::status.eq(true))
            .first::<Coupon>(&mut conn)
            .await
            .optional()?;
        Ok(coupon)
    }

    async fn count_coupon_redemptions(&self, customer_id: Uuid, code: &str) -> ServiceResult<i64> {
        let mut conn = self.pool.get().await?;
        let total = orders::table
            .filter(orders::user_id.eq(customer_id))
            .filter(orders::coupon_code.eq(code))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(total)
    }

    async fn find_order(&self, order_id: i64) -> ServiceResult<Option<OrderWithDetails>> {
        let mut conn = self.pool.get().await?;
        let order = orders::table
            .find(order_id)
            .first::<Order>(&mut conn)
            .await
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let details = order_details::table
            .filter(order_details::order_id.eq(order.id))
            .order(order_details::created_at.asc())
            .load::<OrderDetail>(&mut conn)
            .await?;

        Ok(Some(OrderWithDetails { order, details }))
    }

    async fn wallet_transactions(&self, user_id: Uuid) -> ServiceResult<Vec<WalletTransaction>> {
        let mut conn = self.pool.get().await?;
        let rows = wallet_transactions::table
            .filter(wallet_transactions::user_id.eq(user_id))
            .order(wallet_transactions::id.asc())
            .load::<WalletTransaction>(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn loyalty_transactions(&self, user_id: Uuid) -> ServiceResult<Vec<LoyaltyTransaction>> {
        let mut conn = self.pool.get().await?;
        let rows = loyalty_transactions::table
            .filter(loyalty_transactions::user_id.eq(user_id))
            .order(loyalty_transactions::id.asc())
            .load::<LoyaltyTransaction>(&mut conn)
            .await?;
        Ok(rows)
    }
}
