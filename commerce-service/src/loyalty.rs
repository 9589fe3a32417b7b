//! Loyalty point ledger, referral rewards and the conversion of points into
//! wallet credit.

use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use shared::{Direction, LoyaltyTransactionType, WalletTransactionType};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::ledger::{self, LoyaltyEntry, WalletEntry};
use crate::models::{LoyaltyTransaction, WalletTransaction};
use crate::settings::BusinessSettings;
use crate::store::Store;

#[derive(Debug, Clone)]
pub enum LoyaltyOutcome {
    Recorded(LoyaltyTransaction),
    /// Earned points rounded down to zero; nothing written.
    Unchanged,
    /// Loyalty is switched off; treated as success.
    Disabled,
}

/// Both rows written by one point-to-wallet conversion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Conversion {
    pub loyalty: LoyaltyTransaction,
    pub wallet: WalletTransaction,
}

pub struct LoyaltyService<S> {
    store: Arc<S>,
    settings: Arc<BusinessSettings>,
}

impl<S: Store> LoyaltyService<S> {
    pub fn new(store: Arc<S>, settings: Arc<BusinessSettings>) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &BusinessSettings {
        &self.settings
    }

    /// Credits purchase points (`order_place`, `amount` is the order amount)
    /// or debits points (`point_to_wallet`, `amount` is the point count).
    pub async fn credit_or_debit_points(
        &self,
        user_id: Uuid,
        reference: Option<String>,
        amount: BigDecimal,
        transaction_type: LoyaltyTransactionType,
    ) -> ServiceResult<LoyaltyOutcome> {
        if !self.settings.loyalty_enabled {
            info!("Loyalty disabled, skipping {} for user {}", transaction_type, user_id);
            return Ok(LoyaltyOutcome::Disabled);
        }

        ledger::ensure_positive(&amount)?;
        let (direction, points) = match transaction_type {
            LoyaltyTransactionType::OrderPlace => {
                let earned = amount * &self.settings.loyalty_purchase_percent / BigDecimal::from(100);
                (Direction::Credit, ledger::floor_points(&earned)?)
            }
            LoyaltyTransactionType::PointToWallet => {
                if !amount.is_integer() {
                    return Err(ServiceError::InvalidAmount(amount.to_string()));
                }
                (Direction::Debit, ledger::floor_points(&amount)?)
            }
            LoyaltyTransactionType::LoyaltyPointToWallet => {
                return Err(ServiceError::UnsupportedTransactionType(
                    transaction_type.to_string(),
                ))
            }
        };
        if points == 0 {
            return Ok(LoyaltyOutcome::Unchanged);
        }

        let entry = LoyaltyEntry::new(user_id, transaction_type, direction, points, reference);
        let created = self
            .store
            .atomic(move |unit| Box::pin(async move { ledger::post_loyalty(unit, entry).await }))
            .await
            .map_err(|e| {
                error!("Loyalty {} for user {} failed: {}", transaction_type, user_id, e);
                e
            })?;

        info!(
            "Loyalty {} recorded for user {}: credit {} debit {} balance {}",
            transaction_type, user_id, created.credit, created.debit, created.balance
        );
        Ok(LoyaltyOutcome::Recorded(created))
    }

    /// Credits the referrer's wallet with the configured referral reward.
    /// Returns `None` when no reward is configured.
    pub async fn award_referrer(
        &self,
        referrer_id: Uuid,
        transaction_type: WalletTransactionType,
        referred_id: Uuid,
    ) -> ServiceResult<Option<WalletTransaction>> {
        if transaction_type.direction() != Some(Direction::Credit) {
            return Err(ServiceError::UnsupportedTransactionType(
                transaction_type.to_string(),
            ));
        }

        let reward = self.settings.referral_reward.clone();
        if reward.is_zero() {
            info!("No referral reward configured, referrer {} gets nothing", referrer_id);
            return Ok(None);
        }

        let entry = WalletEntry::new(
            referrer_id,
            transaction_type,
            Direction::Credit,
            reward,
            Some(referred_id.to_string()),
        );
        let created = self
            .store
            .atomic(move |unit| Box::pin(async move { ledger::post_wallet(unit, entry).await }))
            .await
            .map_err(|e| {
                error!("Referral reward for {} failed: {}", referrer_id, e);
                e
            })?;

        info!(
            "Referrer {} credited {} for referring {}",
            referrer_id, created.credit, referred_id
        );
        Ok(Some(created))
    }

    /// Moves `points` out of the loyalty ledger and `wallet_amount` into the
    /// wallet in one unit. Both rows share one conversion reference.
    pub async fn convert_points_to_wallet(
        &self,
        user_id: Uuid,
        points: i64,
        wallet_amount: BigDecimal,
    ) -> ServiceResult<Conversion> {
        if points <= 0 {
            return Err(ServiceError::InvalidAmount(points.to_string()));
        }
        let wallet_amount = ledger::round_currency(&wallet_amount);
        ledger::ensure_positive(&wallet_amount)?;

        let reference = Some(Uuid::new_v4().to_string());
        let debit = LoyaltyEntry::new(
            user_id,
            LoyaltyTransactionType::LoyaltyPointToWallet,
            Direction::Debit,
            points,
            reference.clone(),
        );
        let credit = WalletEntry::new(
            user_id,
            WalletTransactionType::LoyaltyPointToWallet,
            Direction::Credit,
            wallet_amount,
            reference,
        );

        let conversion = self
            .store
            .atomic(move |unit| {
                Box::pin(async move {
                    let loyalty = ledger::post_loyalty(unit, debit).await?;
                    let wallet = ledger::post_wallet(unit, credit).await?;
                    Ok(Conversion { loyalty, wallet })
                })
            })
            .await
            .map_err(|e| {
                error!("Point conversion for user {} failed: {}", user_id, e);
                e
            })?;

        info!(
            "User {} converted {} points into {} wallet credit",
            user_id, points, conversion.wallet.credit
        );
        Ok(conversion)
    }

    pub async fn history(&self, user_id: Uuid) -> ServiceResult<Vec<LoyaltyTransaction>> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound(user_id));
        }
        self.store.loyalty_transactions(user_id).await
    }
}
