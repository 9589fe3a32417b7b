use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shared::{CouponRule, UnknownVariant};
use uuid::Uuid;

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::business_settings)]
pub struct BusinessSetting {
    pub key: String,
    pub value: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub wallet_balance: BigDecimal,
    pub loyalty_point: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::wallet_transactions)]
pub struct WalletTransaction {
    pub id: i64,
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub transaction_type: String,
    pub credit: BigDecimal,
    pub debit: BigDecimal,
    pub balance: BigDecimal,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::wallet_transactions)]
pub struct NewWalletTransaction {
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub transaction_type: String,
    pub credit: BigDecimal,
    pub debit: BigDecimal,
    pub balance: BigDecimal,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::loyalty_transactions)]
pub struct LoyaltyTransaction {
    pub id: i64,
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub transaction_type: String,
    pub credit: i64,
    pub debit: i64,
    pub balance: i64,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::loyalty_transactions)]
pub struct NewLoyaltyTransaction {
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub transaction_type: String,
    pub credit: i64,
    pub debit: i64,
    pub balance: i64,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::coupons)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub coupon_type: String,
    pub discount_type: String,
    pub discount: BigDecimal,
    pub max_discount: BigDecimal,
    pub min_purchase: BigDecimal,
    pub usage_limit: i64,
    pub customer_id: Option<Uuid>,
    pub status: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn rule(&self) -> Result<CouponRule, UnknownVariant> {
        Ok(CouponRule {
            coupon_type: self.coupon_type.parse()?,
            discount_type: self.discount_type.parse()?,
            discount: self.discount.clone(),
            max_discount: self.max_discount.clone(),
            min_purchase: self.min_purchase.clone(),
            limit: self.usage_limit,
            customer_id: self.customer_id,
        })
    }
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub tax: BigDecimal,
    pub discount: BigDecimal,
    pub unit: Option<String>,
    pub added_by: String,
    pub seller_id: Option<Uuid>,
    pub status: bool,
}

impl Product {
    /// Owning seller; admin-listed products have none.
    pub fn seller(&self) -> Option<Uuid> {
        if self.added_by == "seller" {
            self.seller_id
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i64,
    pub user_id: Uuid,
    pub order_amount: BigDecimal,
    pub payment_status: String,
    pub order_status: String,
    pub payment_method: String,
    pub discount_amount: BigDecimal,
    pub coupon_code: Option<String>,
    pub discount_type: Option<String>,
    pub shipping_address: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub order_amount: BigDecimal,
    pub payment_status: String,
    pub order_status: String,
    pub payment_method: String,
    pub discount_amount: BigDecimal,
    pub coupon_code: Option<String>,
    pub discount_type: Option<String>,
    pub shipping_address: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::order_details)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_id: i64,
    pub product_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub product_details: serde_json::Value,
    pub qty: i32,
    pub price: BigDecimal,
    pub tax: BigDecimal,
    pub discount: BigDecimal,
    pub discount_type: String,
    pub variant: Option<String>,
    pub variation: serde_json::Value,
    pub delivery_status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::order_details)]
pub struct NewOrderDetail {
    pub id: Uuid,
    pub order_id: i64,
    pub product_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub product_details: serde_json::Value,
    pub qty: i32,
    pub price: BigDecimal,
    pub tax: BigDecimal,
    pub discount: BigDecimal,
    pub discount_type: String,
    pub variant: Option<String>,
    pub variation: serde_json::Value,
    pub delivery_status: String,
    pub payment_status: String,
}

/// An order together with its lines, as returned by order tracking.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: Order,
    pub details: Vec<OrderDetail>,
}
