//! Posting of wallet and loyalty ledger rows.
//!
//! Each posting locks the user, moves the balance and appends the row that
//! snapshots the new balance. Callers run it inside [`Store::atomic`] so the
//! balance and its row land together or not at all.
//!
//! [`Store::atomic`]: crate::store::Store::atomic

use bigdecimal::{BigDecimal, Zero};
use num_traits::ToPrimitive;
use shared::{Direction, LoyaltyTransactionType, WalletTransactionType};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{LoyaltyTransaction, NewLoyaltyTransaction, NewWalletTransaction, WalletTransaction};
use crate::store::UnitOfWork;

#[derive(Debug, Clone)]
pub struct WalletEntry {
    pub user_id: Uuid,
    pub transaction_type: WalletTransactionType,
    pub credit: BigDecimal,
    pub debit: BigDecimal,
    pub reference: Option<String>,
}

impl WalletEntry {
    pub fn new(
        user_id: Uuid,
        transaction_type: WalletTransactionType,
        direction: Direction,
        amount: BigDecimal,
        reference: Option<String>,
    ) -> Self {
        let (credit, debit) = match direction {
            Direction::Credit => (amount, BigDecimal::zero()),
            Direction::Debit => (BigDecimal::zero(), amount),
        };
        Self {
            user_id,
            transaction_type,
            credit,
            debit,
            reference,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoyaltyEntry {
    pub user_id: Uuid,
    pub transaction_type: LoyaltyTransactionType,
    pub credit: i64,
    pub debit: i64,
    pub reference: Option<String>,
}

impl LoyaltyEntry {
    pub fn new(
        user_id: Uuid,
        transaction_type: LoyaltyTransactionType,
        direction: Direction,
        points: i64,
        reference: Option<String>,
    ) -> Self {
        let (credit, debit) = match direction {
            Direction::Credit => (points, 0),
            Direction::Debit => (0, points),
        };
        Self {
            user_id,
            transaction_type,
            credit,
            debit,
            reference,
        }
    }
}

pub async fn post_wallet(
    unit: &mut dyn UnitOfWork,
    entry: WalletEntry,
) -> ServiceResult<WalletTransaction> {
    let user = unit
        .lock_user(entry.user_id)
        .await?
        .ok_or(ServiceError::UserNotFound(entry.user_id))?;

    let balance = &user.wallet_balance + &entry.credit - &entry.debit;
    if balance < BigDecimal::zero() {
        return Err(ServiceError::InsufficientBalance(user.id));
    }

    unit.set_wallet_balance(user.id, balance.clone()).await?;
    unit.append_wallet_transaction(NewWalletTransaction {
        user_id: user.id,
        transaction_id: Uuid::new_v4(),
        transaction_type: entry.transaction_type.as_str().to_string(),
        credit: entry.credit,
        debit: entry.debit,
        balance,
        reference: entry.reference,
    })
    .await
}

pub async fn post_loyalty(
    unit: &mut dyn UnitOfWork,
    entry: LoyaltyEntry,
) -> ServiceResult<LoyaltyTransaction> {
    let user = unit
        .lock_user(entry.user_id)
        .await?
        .ok_or(ServiceError::UserNotFound(entry.user_id))?;

    let balance = user
        .loyalty_point
        .checked_add(entry.credit)
        .and_then(|points| points.checked_sub(entry.debit))
        .ok_or_else(|| ServiceError::InvalidAmount("loyalty point overflow".to_string()))?;
    if balance < 0 {
        return Err(ServiceError::InsufficientPoints(user.id));
    }

    unit.set_loyalty_point(user.id, balance).await?;
    unit.append_loyalty_transaction(NewLoyaltyTransaction {
        user_id: user.id,
        transaction_id: Uuid::new_v4(),
        transaction_type: entry.transaction_type.as_str().to_string(),
        credit: entry.credit,
        debit: entry.debit,
        balance,
        reference: entry.reference,
    })
    .await
}

/// Decimal places kept for wallet amounts.
pub const CURRENCY_SCALE: i64 = 2;

/// Rounds a non-negative amount down to the currency scale.
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    value.with_scale(CURRENCY_SCALE)
}

/// Rounds a non-negative amount down to whole points.
pub fn floor_points(value: &BigDecimal) -> ServiceResult<i64> {
    value
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidAmount(value.to_string()))
}

pub fn ensure_positive(amount: &BigDecimal) -> ServiceResult<()> {
    if amount <= &BigDecimal::zero() {
        return Err(ServiceError::InvalidAmount(amount.to_string()));
    }
    Ok(())
}
