use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use shared::{CouponDecision, DeclineReason, LoyaltyTransactionType, WalletTransactionType};
use uuid::Uuid;

use crate::coupons::CouponService;
use crate::error::ServiceError;
use crate::loyalty::{Conversion, LoyaltyOutcome, LoyaltyService};
use crate::models::{LoyaltyTransaction, OrderWithDetails, WalletTransaction};
use crate::notify::Notifier;
use crate::orders::{Checkout, CheckoutReceipt, OrderService};
use crate::settings::BusinessSettings;
use crate::store::Store;
use crate::wallet::{WalletOutcome, WalletService};

pub struct AppState<S> {
    pub wallet: Arc<WalletService<S>>,
    pub loyalty: Arc<LoyaltyService<S>>,
    pub coupons: Arc<CouponService<S>>,
    pub orders: Arc<OrderService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            wallet: self.wallet.clone(),
            loyalty: self.loyalty.clone(),
            coupons: self.coupons.clone(),
            orders: self.orders.clone(),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>, settings: Arc<BusinessSettings>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            wallet: Arc::new(WalletService::new(store.clone(), settings.clone())),
            loyalty: Arc::new(LoyaltyService::new(store.clone(), settings.clone())),
            coupons: Arc::new(CouponService::new(store.clone())),
            orders: Arc::new(OrderService::new(store, settings, notifier)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
    pub order_amount: BigDecimal,
    pub customer_id: Uuid,
    #[serde(default)]
    pub delivery_charge: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct ApplyCouponResponse {
    pub discount: BigDecimal,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DeclineReason>,
}

#[derive(Debug, Deserialize)]
pub struct WalletTransactionRequest {
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub transaction_type: WalletTransactionType,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoyaltyTransactionRequest {
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub transaction_type: LoyaltyTransactionType,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertPointsRequest {
    pub user_id: Uuid,
    pub points: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReferralRequest {
    pub referrer_id: Uuid,
    pub referred_id: Uuid,
    #[serde(default = "default_referral_type")]
    pub transaction_type: WalletTransactionType,
}

fn default_referral_type() -> WalletTransactionType {
    WalletTransactionType::Referrer
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<T>,
}

impl From<WalletOutcome> for LedgerResponse<WalletTransaction> {
    fn from(outcome: WalletOutcome) -> Self {
        let (status, transaction) = match outcome {
            WalletOutcome::Recorded(row) => ("recorded", Some(row)),
            WalletOutcome::Applied => ("applied", None),
            WalletOutcome::Unchanged => ("unchanged", None),
            WalletOutcome::Disabled => ("disabled", None),
        };
        Self { status, transaction }
    }
}

impl From<LoyaltyOutcome> for LedgerResponse<LoyaltyTransaction> {
    fn from(outcome: LoyaltyOutcome) -> Self {
        let (status, transaction) = match outcome {
            LoyaltyOutcome::Recorded(row) => ("recorded", Some(row)),
            LoyaltyOutcome::Unchanged => ("unchanged", None),
            LoyaltyOutcome::Disabled => ("disabled", None),
        };
        Self { status, transaction }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: ServiceError) -> ApiError {
    let status = match &e {
        ServiceError::UserNotFound(_) | ServiceError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidAmount(_) | ServiceError::UnsupportedTransactionType(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::InsufficientBalance(_) | ServiceError::InsufficientPoints(_) => {
            StatusCode::CONFLICT
        }
        ServiceError::Database(_) | ServiceError::Pool(_) | ServiceError::Storage(_) => {
            tracing::error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/coupons/apply", post(apply_coupon::<S>))
        .route("/wallet/transactions", post(wallet_transaction::<S>))
        .route("/users/:id/wallet-transactions", get(wallet_history::<S>))
        .route("/loyalty/transactions", post(loyalty_transaction::<S>))
        .route("/users/:id/loyalty-transactions", get(loyalty_history::<S>))
        .route("/loyalty/convert", post(convert_points::<S>))
        .route("/referrals", post(award_referral::<S>))
        .route("/orders", post(checkout::<S>))
        .route("/orders/:id", get(track_order::<S>))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn apply_coupon<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<ApplyCouponRequest>,
) -> Result<Json<ApplyCouponResponse>, ApiError> {
    let decision = state
        .coupons
        .evaluate(
            &request.code,
            &request.order_amount,
            request.customer_id,
            &request.delivery_charge,
        )
        .await
        .map_err(error_response)?;

    let reason = match &decision {
        CouponDecision::Declined(reason) => Some(*reason),
        CouponDecision::Applied(_) => None,
    };
    Ok(Json(ApplyCouponResponse {
        discount: decision.amount(),
        applied: decision.is_applied(),
        reason,
    }))
}

pub async fn wallet_transaction<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<WalletTransactionRequest>,
) -> Result<Json<LedgerResponse<WalletTransaction>>, ApiError> {
    let outcome = state
        .wallet
        .credit_or_debit(
            request.user_id,
            request.amount,
            request.transaction_type,
            request.reference,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(outcome.into()))
}

pub async fn wallet_history<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<WalletTransaction>>, ApiError> {
    let rows = state.wallet.history(user_id).await.map_err(error_response)?;
    Ok(Json(rows))
}

pub async fn loyalty_transaction<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<LoyaltyTransactionRequest>,
) -> Result<Json<LedgerResponse<LoyaltyTransaction>>, ApiError> {
    let outcome = state
        .loyalty
        .credit_or_debit_points(
            request.user_id,
            request.reference,
            request.amount,
            request.transaction_type,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(outcome.into()))
}

pub async fn loyalty_history<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<LoyaltyTransaction>>, ApiError> {
    let rows = state.loyalty.history(user_id).await.map_err(error_response)?;
    Ok(Json(rows))
}

pub async fn convert_points<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<ConvertPointsRequest>,
) -> Result<Json<Conversion>, ApiError> {
    let rate = &state.loyalty.settings().loyalty_exchange_rate;
    let wallet_amount = BigDecimal::from(request.points) / rate;

    let conversion = state
        .loyalty
        .convert_points_to_wallet(request.user_id, request.points, wallet_amount)
        .await
        .map_err(error_response)?;
    Ok(Json(conversion))
}

pub async fn award_referral<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<ReferralRequest>,
) -> Result<Json<LedgerResponse<WalletTransaction>>, ApiError> {
    let row = state
        .loyalty
        .award_referrer(request.referrer_id, request.transaction_type, request.referred_id)
        .await
        .map_err(error_response)?;

    let status = if row.is_some() { "recorded" } else { "unchanged" };
    Ok(Json(LedgerResponse { status, transaction: row }))
}

pub async fn checkout<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<Checkout>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError> {
    let receipt = state.orders.checkout(request).await.map_err(error_response)?;
    tracing::info!("Checkout completed with order {}", receipt.order_id);
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn track_order<S: Store>(
    State(state): State<AppState<S>>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderWithDetails>, ApiError> {
    let order = state.orders.track_order(order_id).await.map_err(error_response)?;
    Ok(Json(order))
}

pub async fn health_check() -> &'static str {
    "OK"
}
