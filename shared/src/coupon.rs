//! Coupon eligibility and discount rules.
//!
//! Everything here is pure: the caller supplies the coupon, the order context
//! and how many earlier orders of this customer already carry the code.

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{CouponType, DiscountType};

#[derive(Debug, Clone)]
pub struct CouponRule {
    pub coupon_type: CouponType,
    pub discount_type: DiscountType,
    pub discount: BigDecimal,
    /// Cap for percent discounts.
    pub max_discount: BigDecimal,
    pub min_purchase: BigDecimal,
    pub limit: i64,
    /// Bound customer, only meaningful for `CustomerWise`.
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    NotFound,
    UnsupportedType,
    UsageLimitReached,
    NotFirstOrder,
    BelowMinimumPurchase,
    WrongCustomer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponDecision {
    Applied(BigDecimal),
    Declined(DeclineReason),
}

impl CouponDecision {
    /// Discount to take off the order; zero when declined.
    pub fn amount(&self) -> BigDecimal {
        match self {
            Self::Applied(amount) => amount.clone(),
            Self::Declined(_) => BigDecimal::from(0),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

impl CouponRule {
    pub fn evaluate(
        &self,
        order_amount: &BigDecimal,
        customer_id: Uuid,
        delivery_charge: &BigDecimal,
        redemptions: i64,
    ) -> CouponDecision {
        match self.coupon_type {
            CouponType::Default => self
                .check_limit(redemptions)
                .or_else(|| self.check_min_purchase(order_amount))
                .map(CouponDecision::Declined)
                .unwrap_or_else(|| CouponDecision::Applied(self.order_discount(order_amount))),
            CouponType::FirstOrder => {
                if redemptions != 0 {
                    return CouponDecision::Declined(DeclineReason::NotFirstOrder);
                }
                self.check_min_purchase(order_amount)
                    .map(CouponDecision::Declined)
                    .unwrap_or_else(|| CouponDecision::Applied(self.order_discount(order_amount)))
            }
            CouponType::FreeDelivery => self
                .check_limit(redemptions)
                .or_else(|| self.check_min_purchase(order_amount))
                .map(CouponDecision::Declined)
                .unwrap_or_else(|| CouponDecision::Applied(delivery_charge.clone())),
            CouponType::CustomerWise => self
                .check_limit(redemptions)
                .or_else(|| self.check_min_purchase(order_amount))
                .or_else(|| {
                    (self.customer_id != Some(customer_id)).then_some(DeclineReason::WrongCustomer)
                })
                .map(CouponDecision::Declined)
                .unwrap_or_else(|| CouponDecision::Applied(self.order_discount(order_amount))),
        }
    }

    // `limit` redemptions already made still qualifies; only exceeding it declines.
    fn check_limit(&self, redemptions: i64) -> Option<DeclineReason> {
        (redemptions > self.limit).then_some(DeclineReason::UsageLimitReached)
    }

    fn check_min_purchase(&self, order_amount: &BigDecimal) -> Option<DeclineReason> {
        (&self.min_purchase > order_amount).then_some(DeclineReason::BelowMinimumPurchase)
    }

    fn order_discount(&self, order_amount: &BigDecimal) -> BigDecimal {
        match self.discount_type {
            DiscountType::Amount => self.discount.clone(),
            DiscountType::Percent => {
                let discount = order_amount * &self.discount / BigDecimal::from(100);
                if self.max_discount < discount {
                    self.max_discount.clone()
                } else {
                    discount
                }
            }
        }
    }
}
