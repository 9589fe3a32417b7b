use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use shared::WalletTransactionType;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::ledger::{self, WalletEntry};
use crate::models::WalletTransaction;
use crate::settings::BusinessSettings;
use crate::store::Store;

#[derive(Debug, Clone)]
pub enum WalletOutcome {
    /// Row created; returned for the types whose callers need it.
    Recorded(WalletTransaction),
    /// Row created, caller only needs to know it succeeded.
    Applied,
    /// The converted amount rounded down to nothing, so no row was written.
    Unchanged,
    /// The wallet is switched off for the business.
    Disabled,
}

pub struct WalletService<S> {
    store: Arc<S>,
    settings: Arc<BusinessSettings>,
}

impl<S: Store> WalletService<S> {
    pub fn new(store: Arc<S>, settings: Arc<BusinessSettings>) -> Self {
        Self { store, settings }
    }

    pub async fn credit_or_debit(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        transaction_type: WalletTransactionType,
        reference: Option<String>,
    ) -> ServiceResult<WalletOutcome> {
        if !self.settings.wallet_enabled {
            info!("Wallet disabled, skipping {} for user {}", transaction_type, user_id);
            return Ok(WalletOutcome::Disabled);
        }

        ledger::ensure_positive(&amount)?;
        let direction = transaction_type
            .direction()
            .ok_or_else(|| ServiceError::UnsupportedTransactionType(transaction_type.to_string()))?;

        // loyalty_point credits arrive as points and are converted to currency
        let amount = if transaction_type == WalletTransactionType::LoyaltyPoint {
            let converted = amount / &self.settings.loyalty_exchange_rate;
            BigDecimal::from(ledger::floor_points(&converted)?)
        } else {
            let rounded = ledger::round_currency(&amount);
            ledger::ensure_positive(&rounded)?;
            rounded
        };
        if amount.is_zero() {
            return Ok(WalletOutcome::Unchanged);
        }

        let entry = WalletEntry::new(user_id, transaction_type, direction, amount, reference);
        let created = self
            .store
            .atomic(move |unit| Box::pin(async move { ledger::post_wallet(unit, entry).await }))
            .await
            .map_err(|e| {
                error!("Wallet {} for user {} failed: {}", transaction_type, user_id, e);
                e
            })?;

        info!(
            "Wallet {} recorded for user {}: credit {} debit {} balance {}",
            transaction_type, user_id, created.credit, created.debit, created.balance
        );

        if transaction_type.returns_record() {
            Ok(WalletOutcome::Recorded(created))
        } else {
            Ok(WalletOutcome::Applied)
        }
    }

    pub async fn history(&self, user_id: Uuid) -> ServiceResult<Vec<WalletTransaction>> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::UserNotFound(user_id));
        }
        self.store.wallet_transactions(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn enabled() -> Arc<BusinessSettings> {
        Arc::new(BusinessSettings {
            wallet_enabled: true,
            loyalty_exchange_rate: BigDecimal::from(10),
            ..Default::default()
        })
    }

    fn dec(v: i32) -> BigDecimal {
        BigDecimal::from(v)
    }

    #[tokio::test]
    async fn test_disabled_wallet_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(10), 0).await;
        let service = WalletService::new(store.clone(), Arc::new(BusinessSettings::default()));

        let outcome = service
            .credit_or_debit(user, dec(50), WalletTransactionType::AddFund, None)
            .await
            .unwrap();

        assert!(matches!(outcome, WalletOutcome::Disabled));
        assert_eq!(store.user(user).await.wallet_balance, dec(10));
        assert!(store.snapshot().await.wallet_transactions.is_empty());
    }

    #[tokio::test]
    async fn test_add_fund_credits_and_reports_success() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(10), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let outcome = service
            .credit_or_debit(user, dec(15), WalletTransactionType::AddFund, Some("topup".into()))
            .await
            .unwrap();

        assert!(matches!(outcome, WalletOutcome::Applied));
        assert_eq!(store.user(user).await.wallet_balance, dec(25));
        let rows = store.snapshot().await.wallet_transactions;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].credit, dec(15));
        assert!(rows[0].debit.is_zero());
        assert_eq!(rows[0].balance, dec(25));
        assert_eq!(rows[0].reference.as_deref(), Some("topup"));
    }

    #[tokio::test]
    async fn test_admin_fund_returns_record() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(0), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let outcome = service
            .credit_or_debit(user, dec(40), WalletTransactionType::AddFundByAdmin, None)
            .await
            .unwrap();

        match outcome {
            WalletOutcome::Recorded(row) => {
                assert_eq!(row.transaction_type, "add_fund_by_admin");
                assert_eq!(row.balance, dec(40));
            }
            other => panic!("expected a recorded row, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_order_place_debits() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(100), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let outcome = service
            .credit_or_debit(user, dec(30), WalletTransactionType::OrderPlace, Some("100001".into()))
            .await
            .unwrap();

        let WalletOutcome::Recorded(row) = outcome else {
            panic!("order_place should return its row");
        };
        assert_eq!(row.debit, dec(30));
        assert_eq!(row.balance, dec(70));
        assert_eq!(store.user(user).await.wallet_balance, dec(70));
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected_without_side_effects() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(5), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let err = service
            .credit_or_debit(user, dec(30), WalletTransactionType::OrderPlace, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InsufficientBalance(id) if id == user));
        assert_eq!(store.user(user).await.wallet_balance, dec(5));
        assert!(store.snapshot().await.wallet_transactions.is_empty());
    }

    #[tokio::test]
    async fn test_loyalty_point_credit_is_converted_and_floored() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(0), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        service
            .credit_or_debit(user, dec(25), WalletTransactionType::LoyaltyPoint, None)
            .await
            .unwrap();
        assert_eq!(store.user(user).await.wallet_balance, dec(2));

        let outcome = service
            .credit_or_debit(user, dec(9), WalletTransactionType::LoyaltyPoint, None)
            .await
            .unwrap();
        assert!(matches!(outcome, WalletOutcome::Unchanged));
        assert_eq!(store.snapshot().await.wallet_transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_amount_is_kept_at_currency_scale() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(0), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let amount = BigDecimal::from(10) / BigDecimal::from(3);
        service
            .credit_or_debit(user, amount, WalletTransactionType::AddFund, None)
            .await
            .unwrap();
        let expected: BigDecimal = "3.33".parse().unwrap();
        assert_eq!(store.user(user).await.wallet_balance, expected);

        let err = service
            .credit_or_debit(user, "0.001".parse().unwrap(), WalletTransactionType::AddFund, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAmount(_)));
        assert_eq!(store.snapshot().await.wallet_transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_conversion_type_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(0), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let err = service
            .credit_or_debit(user, dec(5), WalletTransactionType::LoyaltyPointToWallet, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedTransactionType(_)));
    }

    #[tokio::test]
    async fn test_unknown_user_fails() {
        let store = Arc::new(MemoryStore::new());
        let service = WalletService::new(store.clone(), enabled());
        let missing = Uuid::new_v4();

        let err = service
            .credit_or_debit(missing, dec(5), WalletTransactionType::AddFund, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_failed_append_rolls_back_balance() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(10), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        // balance write succeeds, ledger append fails
        store.set_fail_after_writes(Some(1)).await;
        let err = service
            .credit_or_debit(user, dec(5), WalletTransactionType::AddFund, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(store.user(user).await.wallet_balance, dec(10));
        assert!(store.snapshot().await.wallet_transactions.is_empty());
    }

    #[tokio::test]
    async fn test_history_matches_running_balance() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(0), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let steps = [
            (20, WalletTransactionType::AddFund),
            (7, WalletTransactionType::OrderPlace),
            (3, WalletTransactionType::Referrer),
            (50, WalletTransactionType::OrderPlace),
            (16, WalletTransactionType::AddFundByAdmin),
        ];
        for (amount, transaction_type) in steps {
            // the 50 debit overdraws and must leave no trace
            let _ = service
                .credit_or_debit(user, dec(amount), transaction_type, None)
                .await;
        }

        let rows = service.history(user).await.unwrap();
        assert_eq!(rows.len(), 4);

        let mut running = BigDecimal::zero();
        for row in &rows {
            assert!(row.credit.is_zero() != row.debit.is_zero());
            running = running + &row.credit - &row.debit;
            assert_eq!(row.balance, running);
        }
        let wallet_balance = store.user(user).await.wallet_balance;
        assert_eq!(wallet_balance, dec(32));
        assert_eq!(rows.last().unwrap().balance, wallet_balance);
    }

    #[tokio::test]
    async fn test_concurrent_postings_keep_running_balance() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user(dec(0), 0).await;
        let service = WalletService::new(store.clone(), enabled());

        let service = &service;
        let credit = move |amount| {
            service.credit_or_debit(user, dec(amount), WalletTransactionType::AddFund, None)
        };
        let debit = move |amount| {
            service.credit_or_debit(user, dec(amount), WalletTransactionType::OrderPlace, None)
        };
        let (a, b, c, d, e, f) = tokio::join!(
            credit(40),
            debit(15),
            credit(25),
            debit(10),
            credit(5),
            debit(500),
        );
        for result in [a, b, c, d, e] {
            // debits racing ahead of credits may overdraw
            if let Err(err) = result {
                assert!(matches!(err, ServiceError::InsufficientBalance(_)));
            }
        }
        assert!(matches!(f, Err(ServiceError::InsufficientBalance(_))));

        let rows = service.history(user).await.unwrap();
        assert!(rows.len() >= 3);
        let mut running = BigDecimal::zero();
        for row in &rows {
            running = running + &row.credit - &row.debit;
            assert_eq!(row.balance, running);
            assert!(row.balance >= BigDecimal::zero());
        }
        let wallet_balance = store.user(user).await.wallet_balance;
        assert_eq!(rows.last().unwrap().balance, wallet_balance);
    }
}
