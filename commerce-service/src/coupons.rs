use std::sync::Arc;

use bigdecimal::BigDecimal;
use shared::{CouponDecision, DeclineReason};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::store::Store;

pub struct CouponService<S> {
    store: Arc<S>,
}

impl<S: Store> CouponService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Decides the discount `code` grants on this order. Never writes; the
    /// redemption is recorded when the order is placed with the code on it.
    pub async fn evaluate(
        &self,
        code: &str,
        order_amount: &BigDecimal,
        customer_id: Uuid,
        delivery_charge: &BigDecimal,
    ) -> ServiceResult<CouponDecision> {
        let Some(coupon) = self.store.find_active_coupon(code).await? else {
            info!("Coupon {} not found or inactive", code);
            return Ok(CouponDecision::Declined(DeclineReason::NotFound));
        };

        let rule = match coupon.rule() {
            Ok(rule) => rule,
            Err(e) => {
                warn!("Coupon {} can not be evaluated: {}", code, e);
                return Ok(CouponDecision::Declined(DeclineReason::UnsupportedType));
            }
        };

        let redemptions = self.store.count_coupon_redemptions(customer_id, code).await?;
        let decision = rule.evaluate(order_amount, customer_id, delivery_charge, redemptions);
        match &decision {
            CouponDecision::Applied(amount) => {
                info!("Coupon {} grants {} to customer {}", code, amount, customer_id)
            }
            CouponDecision::Declined(reason) => {
                info!("Coupon {} declined for customer {}: {:?}", code, customer_id, reason)
            }
        }
        Ok(decision)
    }
}
