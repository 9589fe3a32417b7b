//! Order placement and tracking.

use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use shared::{
    cart_grand_total, CartItem, CouponDecision, CustomerInfo, DeclineReason,
    LoyaltyTransactionType, OrderPlacedEvent, PaymentMethod, ORDER_PENDING, PAYMENT_UNPAID,
    COUPON_DISCOUNT, DISCOUNT_ON_PRODUCT,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::coupons::CouponService;
use crate::error::{ServiceError, ServiceResult};
use crate::loyalty::LoyaltyService;
use crate::models::{NewOrder, NewOrderDetail, Order, OrderWithDetails};
use crate::notify::Notifier;
use crate::settings::BusinessSettings;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: Uuid,
    pub email: String,
    pub customer_info: CustomerInfo,
    pub cart: Vec<CartItem>,
    pub payment_method: PaymentMethod,
    pub discount: BigDecimal,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Checkout {
    pub customer_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    pub cart: Vec<CartItem>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub delivery_charge: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: i64,
    pub order_amount: BigDecimal,
    pub discount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_declined: Option<DeclineReason>,
}

pub struct OrderService<S> {
    store: Arc<S>,
    settings: Arc<BusinessSettings>,
    notifier: Arc<dyn Notifier>,
    coupons: CouponService<S>,
    loyalty: LoyaltyService<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>, settings: Arc<BusinessSettings>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            coupons: CouponService::new(store.clone()),
            loyalty: LoyaltyService::new(store.clone(), settings.clone()),
            store,
            settings,
            notifier,
        }
    }

    /// Creates the order and its lines in one unit and returns the order
    /// number. Lines whose product no longer exists are dropped.
    pub async fn place_order(&self, order: PlaceOrder) -> ServiceResult<i64> {
        Ok(self.place(order).await?.id)
    }

    async fn place(&self, order: PlaceOrder) -> ServiceResult<Order> {
        validate_cart(&order.cart)?;
        if order.discount < BigDecimal::zero() {
            return Err(ServiceError::InvalidAmount(order.discount.to_string()));
        }
        let order_amount = cart_grand_total(&order.cart) - &order.discount;
        if order_amount < BigDecimal::zero() {
            return Err(ServiceError::InvalidAmount(order_amount.to_string()));
        }

        let discount_type = if order.discount.is_zero() {
            None
        } else {
            Some(COUPON_DISCOUNT.to_string())
        };
        let new_order = NewOrder {
            user_id: order.customer_id,
            order_amount,
            payment_status: PAYMENT_UNPAID.to_string(),
            order_status: ORDER_PENDING.to_string(),
            payment_method: order.payment_method.as_str().to_string(),
            discount_amount: order.discount,
            coupon_code: order.coupon_code,
            discount_type,
            shipping_address: order.customer_info.address_id,
        };
        let cart = order.cart;

        let created = self
            .store
            .atomic(move |unit| {
                Box::pin(async move {
                    let created = unit.insert_order(new_order).await?;
                    for item in cart {
                        let Some(product) = unit.find_product(item.product_id).await? else {
                            warn!(
                                "Product {} not found, dropping line from order {}",
                                item.product_id, created.id
                            );
                            continue;
                        };

                        let qty = BigDecimal::from(item.quantity);
                        let detail = NewOrderDetail {
                            id: Uuid::new_v4(),
                            order_id: created.id,
                            product_id: product.id,
                            seller_id: product.seller(),
                            product_details: serde_json::to_value(&product)
                                .map_err(|e| ServiceError::Storage(e.to_string()))?,
                            qty: item.quantity,
                            price: item.price,
                            tax: item.tax * &qty,
                            discount: item.discount * &qty,
                            discount_type: DISCOUNT_ON_PRODUCT.to_string(),
                            variant: item.variant,
                            variation: item.variations,
                            delivery_status: ORDER_PENDING.to_string(),
                            payment_status: PAYMENT_UNPAID.to_string(),
                        };
                        unit.insert_order_detail(detail).await?;
                    }
                    Ok(created)
                })
            })
            .await
            .map_err(|e| {
                error!("Failed to place order for customer {}: {}", order.customer_id, e);
                e
            })?;

        info!(
            "Order {} placed for customer {} amount {}",
            created.id, created.user_id, created.order_amount
        );

        if self.settings.order_confirmation_enabled {
            let event = OrderPlacedEvent::new(
                created.id,
                created.user_id,
                order.email,
                created.order_amount.clone(),
            );
            if let Err(e) = self.notifier.order_placed(&event).await {
                warn!("Order {} confirmation not sent: {}", created.id, e);
            }
        }

        Ok(created)
    }

    /// Applies the coupon, places the order, then awards purchase points.
    /// The points award is best effort.
    pub async fn checkout(&self, checkout: Checkout) -> ServiceResult<CheckoutReceipt> {
        validate_cart(&checkout.cart)?;
        let total = cart_grand_total(&checkout.cart);
        let code = checkout
            .coupon_code
            .filter(|code| !code.trim().is_empty());

        let decision = match &code {
            Some(code) => Some(
                self.coupons
                    .evaluate(code, &total, checkout.customer_id, &checkout.delivery_charge)
                    .await?,
            ),
            None => None,
        };

        // a coupon can outweigh the cart (free delivery on a cheap basket)
        let discount = decision
            .as_ref()
            .map(CouponDecision::amount)
            .unwrap_or_else(BigDecimal::zero)
            .min(total);
        let applied = decision.as_ref().is_some_and(CouponDecision::is_applied);
        let coupon_declined = match decision {
            Some(CouponDecision::Declined(reason)) => Some(reason),
            _ => None,
        };

        let order = self
            .place(PlaceOrder {
                customer_id: checkout.customer_id,
                email: checkout.email,
                customer_info: checkout.customer_info,
                cart: checkout.cart,
                payment_method: checkout.payment_method,
                discount: discount.clone(),
                coupon_code: if applied { code } else { None },
            })
            .await?;

        if order.order_amount > BigDecimal::zero() {
            if let Err(e) = self
                .loyalty
                .credit_or_debit_points(
                    order.user_id,
                    Some(order.id.to_string()),
                    order.order_amount.clone(),
                    LoyaltyTransactionType::OrderPlace,
                )
                .await
            {
                warn!("Loyalty points for order {} not awarded: {}", order.id, e);
            }
        }

        Ok(CheckoutReceipt {
            order_id: order.id,
            order_amount: order.order_amount,
            discount,
            coupon_declined,
        })
    }

    pub async fn track_order(&self, order_id: i64) -> ServiceResult<OrderWithDetails> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }
}

fn validate_cart(cart: &[CartItem]) -> ServiceResult<()> {
    let zero = BigDecimal::zero();
    for item in cart {
        if item.quantity <= 0 {
            return Err(ServiceError::InvalidAmount(format!(
                "quantity {} for product {}",
                item.quantity, item.product_id
            )));
        }
        if item.price < zero || item.tax < zero || item.discount < zero || item.line_total() < zero {
            return Err(ServiceError::InvalidAmount(format!(
                "negative pricing for product {}",
                item.product_id
            )));
        }
    }
    Ok(())
}
