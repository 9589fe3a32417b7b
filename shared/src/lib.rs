use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod coupon;

pub use coupon::{CouponDecision, CouponRule, DeclineReason};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Which side of a ledger row carries the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionType {
    AddFundByAdmin,
    AddFund,
    LoyaltyPoint,
    Referrer,
    OrderPlace,
    LoyaltyPointToWallet,
}

impl WalletTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddFundByAdmin => "add_fund_by_admin",
            Self::AddFund => "add_fund",
            Self::LoyaltyPoint => "loyalty_point",
            Self::Referrer => "referrer",
            Self::OrderPlace => "order_place",
            Self::LoyaltyPointToWallet => "loyalty_point_to_wallet",
        }
    }

    /// `None` for types that only the point-to-wallet conversion may post.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::AddFundByAdmin | Self::AddFund | Self::LoyaltyPoint | Self::Referrer => {
                Some(Direction::Credit)
            }
            Self::OrderPlace => Some(Direction::Debit),
            Self::LoyaltyPointToWallet => None,
        }
    }

    /// Whether callers get the created row back rather than a bare success.
    pub fn returns_record(&self) -> bool {
        matches!(
            self,
            Self::LoyaltyPoint | Self::OrderPlace | Self::AddFundByAdmin | Self::Referrer
        )
    }
}

impl fmt::Display for WalletTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTransactionType {
    OrderPlace,
    PointToWallet,
    LoyaltyPointToWallet,
}

impl LoyaltyTransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderPlace => "order_place",
            Self::PointToWallet => "point_to_wallet",
            Self::LoyaltyPointToWallet => "loyalty_point_to_wallet",
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::OrderPlace => Some(Direction::Credit),
            Self::PointToWallet => Some(Direction::Debit),
            Self::LoyaltyPointToWallet => None,
        }
    }
}

impl fmt::Display for LoyaltyTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    Default,
    FirstOrder,
    FreeDelivery,
    CustomerWise,
}

impl FromStr for CouponType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "first_order" => Ok(Self::FirstOrder),
            "free_delivery" => Ok(Self::FreeDelivery),
            "customer_wise" => Ok(Self::CustomerWise),
            other => Err(UnknownVariant {
                kind: "coupon type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percent,
    Amount,
}

impl FromStr for DiscountType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(Self::Percent),
            "amount" => Ok(Self::Amount),
            other => Err(UnknownVariant {
                kind: "discount type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    DigitalPayment,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::DigitalPayment => "digital_payment",
            Self::Wallet => "wallet",
        }
    }
}

/// Status of a freshly placed order and of each of its lines.
pub const ORDER_PENDING: &str = "pending";
pub const PAYMENT_UNPAID: &str = "unpaid";

pub const COUPON_DISCOUNT: &str = "coupon_discount";
pub const DISCOUNT_ON_PRODUCT: &str = "discount_on_product";

/// One line of a customer's cart as submitted at checkout. `tax` and
/// `discount` are per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: BigDecimal,
    #[serde(default)]
    pub tax: BigDecimal,
    #[serde(default)]
    pub discount: BigDecimal,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub variations: serde_json::Value,
}

impl CartItem {
    pub fn line_total(&self) -> BigDecimal {
        (&self.price - &self.discount + &self.tax) * BigDecimal::from(self.quantity)
    }
}

/// Sum of every line's `(price - discount + tax) * quantity`.
pub fn cart_grand_total(cart: &[CartItem]) -> BigDecimal {
    cart.iter()
        .fold(BigDecimal::from(0), |total, item| total + item.line_total())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default)]
    pub address_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order_id: i64,
    pub customer_id: Uuid,
    pub email: String,
    pub order_amount: BigDecimal,
    pub placed_at: DateTime<Utc>,
}

impl OrderPlacedEvent {
    pub fn new(order_id: i64, customer_id: Uuid, email: String, order_amount: BigDecimal) -> Self {
        Self {
            order_id,
            customer_id,
            email,
            order_amount,
            placed_at: Utc::now(),
        }
    }
}
