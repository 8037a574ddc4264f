//! Account ledger operations - deposit, withdraw, external transactions,
//! recent activity, statements and balance adjustments
//!
//! LedgerService keeps each account's balance and append-only transaction log.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use crate::validation;
use ccbank_core::{
    is_well_formed_id, most_recent, Account, AccountSummary, Bound, CoreError, Period, Statement,
    Transaction, TransactionKind, Withdrawal,
};
use ccbank_persistence::{AccountRepo, TransactionRepo, UserRepo, WithdrawalRepo};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Result of a deposit
#[derive(Debug, Clone)]
pub struct DepositReceipt {
    pub account: Account,
    pub transaction: Transaction,
}

/// Result of initiating a withdrawal
#[derive(Debug, Clone)]
pub struct WithdrawalReceipt {
    pub withdrawal: Withdrawal,
    pub account_balance: Decimal,
}

/// Result of a balance adjustment
#[derive(Debug, Clone)]
pub struct BalanceAdjustment {
    pub account: Account,
    /// Sum of every account balance of the owner after the adjustment
    pub total_balance: Decimal,
}

/// Transaction supplied by an external system
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTransaction {
    #[serde(default)]
    pub transaction_id: String,
    /// Defaults to the time of recording
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub description: String,
}

/// Ledger Service - handles deposit, withdraw and account queries
pub struct LedgerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LedgerService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Deposit into an account after checking the owner's PIN
    pub async fn deposit(
        &self,
        account_number: &str,
        pin: &str,
        amount: Decimal,
    ) -> BusinessResult<DepositReceipt> {
        validation::require("accountNumber", account_number)?;
        validation::require("accountPin", pin)?;
        validation::require_positive("amount", amount)?;

        let mut account = self.ctx.account_by_number(account_number).await?;
        let owner = self.ctx.user(&account.user_id).await?;

        if !self.ctx.hasher().verify(pin, &owner.pin_hash)? {
            tracing::warn!(account_number, "deposit rejected: invalid PIN");
            return Err(BusinessError::InvalidPin);
        }

        let transaction = account.deposit(amount)?;

        let mut tx = self.ctx.pool().begin().await?;
        account.version =
            AccountRepo::update_balance(&mut *tx, &account.id, account.balance, account.version)
                .await
                .map_err(|e| {
                    BusinessError::from_lookup(e, || {
                        BusinessError::AccountNotFound(account_number.to_string())
                    })
                })?;
        TransactionRepo::insert(&mut *tx, &transaction).await?;
        tx.commit().await?;

        tracing::info!(
            account_number,
            amount = %amount,
            balance = %account.balance,
            "deposit recorded"
        );

        Ok(DepositReceipt {
            account,
            transaction,
        })
    }

    /// Debit an account and open a staged withdrawal for the amount.
    ///
    /// The debit happens immediately; later stage confirmations never
    /// reverse it.
    pub async fn withdraw(
        &self,
        account_number: &str,
        amount: Decimal,
        currency: &str,
        description: &str,
    ) -> BusinessResult<WithdrawalReceipt> {
        validation::require("accountNumber", account_number)?;
        validation::require("currency", currency)?;
        validation::require("description", description)?;
        validation::require_positive("amount", amount)?;

        let mut account = self.ctx.account_by_number(account_number).await?;

        account.debit(amount).map_err(|e| match e {
            CoreError::InsufficientBalance { needed, available } => {
                BusinessError::insufficient_balance(needed, available)
            }
            other => other.into(),
        })?;

        let withdrawal = Withdrawal::initiate(
            &account,
            amount,
            currency,
            description,
            self.ctx.settings().withdrawal_stages,
        )?;

        let mut tx = self.ctx.pool().begin().await?;
        account.version =
            AccountRepo::update_balance(&mut *tx, &account.id, account.balance, account.version)
                .await
                .map_err(|e| {
                    BusinessError::from_lookup(e, || {
                        BusinessError::AccountNotFound(account_number.to_string())
                    })
                })?;
        WithdrawalRepo::insert(&mut *tx, &withdrawal).await?;
        tx.commit().await?;

        tracing::info!(
            account_number,
            withdrawal_id = %withdrawal.id,
            amount = %amount,
            stages = withdrawal.stages.len(),
            "withdrawal initiated"
        );

        Ok(WithdrawalReceipt {
            account_balance: account.balance,
            withdrawal,
        })
    }

    /// Append an externally supplied transaction to one of the user's
    /// accounts. The balance is left untouched.
    pub async fn record_transaction(
        &self,
        user_id: &str,
        account_id: &str,
        input: ExternalTransaction,
    ) -> BusinessResult<Account> {
        self.ctx.user(user_id).await?;

        let mut account = AccountRepo::get_by_id(self.ctx.pool(), account_id)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || BusinessError::AccountNotFound(account_id.to_string()))
            })?;
        if account.user_id != user_id {
            return Err(BusinessError::AccountNotFound(account_id.to_string()));
        }

        let transaction_id = input.transaction_id.trim();
        if !is_well_formed_id(transaction_id) {
            return Err(BusinessError::InvalidTransactionId(format!(
                "'{transaction_id}' is not a well-formed identifier"
            )));
        }
        if TransactionRepo::exists(self.ctx.pool(), transaction_id).await? {
            return Err(BusinessError::InvalidTransactionId(format!(
                "'{transaction_id}' is already used"
            )));
        }

        let kind = TransactionKind::from_str(&input.kind).ok_or_else(|| {
            BusinessError::validation("transaction.type", format!("unknown type '{}'", input.kind))
        })?;
        validation::require("transaction.currency", &input.currency)?;

        let transaction = Transaction {
            id: transaction_id.to_string(),
            account_id: account.id.clone(),
            occurred_at: input.date.unwrap_or_else(Utc::now),
            kind,
            amount: input.amount,
            currency: input.currency,
            description: input.description,
        };

        self.insert_recorded(&transaction).await?;
        tracing::info!(user_id, account_id, transaction_id, "external transaction recorded");

        account.record(transaction);
        Ok(account)
    }

    /// Insert an externally identified transaction; an id taken since the
    /// `exists` check is still reported as an invalid transaction id
    async fn insert_recorded(&self, transaction: &Transaction) -> BusinessResult<()> {
        TransactionRepo::insert(self.ctx.pool(), transaction)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    BusinessError::InvalidTransactionId(format!(
                        "'{}' is already used",
                        transaction.id
                    ))
                } else {
                    e.into()
                }
            })
    }

    /// Newest transactions across all of the user's accounts
    pub async fn recent_transactions(&self, user_id: &str) -> BusinessResult<Vec<Transaction>> {
        self.ctx.user(user_id).await?;

        let accounts = AccountRepo::get_by_user(self.ctx.pool(), user_id).await?;
        let all = accounts
            .into_iter()
            .flat_map(|account| account.transactions)
            .collect();

        Ok(most_recent(all, self.ctx.settings().recent_limit))
    }

    /// Statement of one of the user's accounts over `[start_date, end_date]`
    pub async fn statement(
        &self,
        user_id: &str,
        account_number: &str,
        start_date: &str,
        end_date: &str,
    ) -> BusinessResult<Statement> {
        validation::require("userId", user_id)?;
        validation::require("accountNumber", account_number)?;
        validation::require("startDate", start_date)?;
        validation::require("endDate", end_date)?;

        let start = Period::parse_bound(start_date, Bound::Start)
            .ok_or_else(|| BusinessError::validation("startDate", "not a valid date"))?;
        let end = Period::parse_bound(end_date, Bound::End)
            .ok_or_else(|| BusinessError::validation("endDate", "not a valid date"))?;
        let period = Period::new(start, end)?;

        self.ctx.user(user_id).await?;
        let account = AccountRepo::get_by_user(self.ctx.pool(), user_id)
            .await?
            .into_iter()
            .find(|a| a.account_number == account_number)
            .ok_or_else(|| BusinessError::AccountNotFound(account_number.to_string()))?;

        Ok(account.statement(period))
    }

    /// Current balance of one account
    pub async fn balance(&self, account_number: &str) -> BusinessResult<AccountSummary> {
        let account = self.ctx.account_by_number(account_number).await?;
        Ok(account.summary())
    }

    /// Add a signed amount to an account and refresh the owner's aggregate
    /// balance. There is no floor: the result may be negative.
    pub async fn adjust_balance(
        &self,
        account_number: &str,
        amount_to_add: Decimal,
    ) -> BusinessResult<BalanceAdjustment> {
        validation::require("accountNumber", account_number)?;

        let mut account = self.ctx.account_by_number(account_number).await?;
        let siblings = AccountRepo::get_by_user(self.ctx.pool(), &account.user_id).await?;

        account.adjust(amount_to_add);
        let total_balance: Decimal = siblings
            .iter()
            .map(|a| {
                if a.id == account.id {
                    account.balance
                } else {
                    a.balance
                }
            })
            .sum();

        let mut tx = self.ctx.pool().begin().await?;
        account.version =
            AccountRepo::update_balance(&mut *tx, &account.id, account.balance, account.version)
                .await
                .map_err(|e| {
                    BusinessError::from_lookup(e, || {
                        BusinessError::AccountNotFound(account_number.to_string())
                    })
                })?;
        UserRepo::set_balance(&mut *tx, &account.user_id, total_balance).await?;
        tx.commit().await?;

        tracing::info!(
            account_number,
            delta = %amount_to_add,
            balance = %account.balance,
            total = %total_balance,
            "balance adjusted"
        );

        Ok(BalanceAdjustment {
            account,
            total_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{fixture, register, PIN};
    use ccbank_core::{new_id, WithdrawalStatus};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_deposit_credits_and_logs() {
        let fx = fixture().await;
        let reg = register(&fx, "dep@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);

        let receipt = ledger
            .deposit(&reg.account.account_number, PIN, dec!(150))
            .await
            .unwrap();

        assert_eq!(receipt.account.balance, dec!(150));
        assert_eq!(receipt.transaction.kind, TransactionKind::Deposit);
        assert_eq!(receipt.transaction.description, "Deposit");
        assert_eq!(receipt.transaction.currency, reg.account.currency);

        let summary = ledger.balance(&reg.account.account_number).await.unwrap();
        assert_eq!(summary.balance, dec!(150));
    }

    #[tokio::test]
    async fn test_deposit_with_wrong_pin() {
        let fx = fixture().await;
        let reg = register(&fx, "pin@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);

        let err = ledger
            .deposit(&reg.account.account_number, "0000", dec!(10))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidPin));
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);

        let summary = ledger.balance(&reg.account.account_number).await.unwrap();
        assert_eq!(summary.balance, dec!(0));
    }

    #[tokio::test]
    async fn test_deposit_unknown_account() {
        let fx = fixture().await;
        let err = LedgerService::new(&fx.ctx)
            .deposit("9999999999", PIN, dec!(10))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_deposit_then_statement_includes_transaction_once() {
        let fx = fixture().await;
        let reg = register(&fx, "stmt@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);

        let receipt = ledger
            .deposit(&reg.account.account_number, PIN, dec!(42))
            .await
            .unwrap();

        let start = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let end = (Utc::now() + Duration::hours(1)).to_rfc3339();
        let statement = ledger
            .statement(&reg.user.id, &reg.account.account_number, &start, &end)
            .await
            .unwrap();

        let matching: Vec<_> = statement
            .transactions
            .iter()
            .filter(|t| t.id == receipt.transaction.id)
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(statement.balance, dec!(42));
        assert_eq!(statement.account_type, "savings");
    }

    #[tokio::test]
    async fn test_statement_outside_range_is_empty() {
        let fx = fixture().await;
        let reg = register(&fx, "old@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);
        ledger
            .deposit(&reg.account.account_number, PIN, dec!(1))
            .await
            .unwrap();

        let statement = ledger
            .statement(&reg.user.id, &reg.account.account_number, "2000-01-01", "2000-12-31")
            .await
            .unwrap();
        assert!(statement.transactions.is_empty());

        let err = ledger
            .statement(&reg.user.id, "1111111111", "2000-01-01", "2000-12-31")
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::AccountNotFound(_)));

        let err = ledger
            .statement(&reg.user.id, &reg.account.account_number, "2001-01-01", "2000-01-01")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_withdraw_full_balance() {
        let fx = fixture().await;
        let reg = register(&fx, "wd@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);
        let number = reg.account.account_number.clone();
        ledger.deposit(&number, PIN, dec!(100)).await.unwrap();

        let receipt = ledger.withdraw(&number, dec!(100), "USD", "rent").await.unwrap();

        assert_eq!(receipt.account_balance, dec!(0));
        let w = &receipt.withdrawal;
        assert_eq!(w.current_stage.to_string(), "stage1");
        assert!(w.stages[0].completed);
        assert!(!w.stages[1].completed);
        assert_eq!(w.stages.len(), 5);
        assert_eq!(w.status, WithdrawalStatus::Pending);

        assert_eq!(ledger.balance(&number).await.unwrap().balance, dec!(0));
        let stored = WithdrawalRepo::get_by_id(fx.ctx.pool(), &w.id).await.unwrap();
        assert_eq!(&stored, w);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_changes_nothing() {
        let fx = fixture().await;
        let reg = register(&fx, "poor@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);
        let number = reg.account.account_number.clone();
        ledger.deposit(&number, PIN, dec!(50)).await.unwrap();
        let tx_before = TransactionRepo::count(fx.ctx.pool()).await.unwrap();

        let err = ledger
            .withdraw(&number, dec!(50.01), "USD", "rent")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(ledger.balance(&number).await.unwrap().balance, dec!(50));
        assert_eq!(TransactionRepo::count(fx.ctx.pool()).await.unwrap(), tx_before);
        assert!(WithdrawalRepo::get_by_user(fx.ctx.pool(), &reg.user.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_uses_configured_stage_count() {
        let fx = crate::testing::fixture_with(crate::services::Settings {
            withdrawal_stages: 3,
            ..Default::default()
        })
        .await;
        let reg = register(&fx, "three@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);
        let number = reg.account.account_number.clone();
        ledger.deposit(&number, PIN, dec!(10)).await.unwrap();

        let receipt = ledger.withdraw(&number, dec!(1), "USD", "fee").await.unwrap();
        assert_eq!(receipt.withdrawal.stages.len(), 3);
    }

    #[tokio::test]
    async fn test_record_transaction_checks_id() {
        let fx = fixture().await;
        let reg = register(&fx, "ext@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);

        let input = |id: &str| ExternalTransaction {
            transaction_id: id.to_string(),
            date: None,
            kind: "credit".to_string(),
            amount: dec!(25),
            currency: "USD".to_string(),
            description: "payroll".to_string(),
        };

        let err = ledger
            .record_transaction(&reg.user.id, &reg.account.id, input("not-an-id"))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidTransactionId(_)));

        let id = new_id();
        let account = ledger
            .record_transaction(&reg.user.id, &reg.account.id, input(&id))
            .await
            .unwrap();
        assert_eq!(account.transactions.last().map(|t| t.id.as_str()), Some(id.as_str()));
        // Balance is not touched
        assert_eq!(account.balance, dec!(0));

        let err = ledger
            .record_transaction(&reg.user.id, &reg.account.id, input(&id))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::InvalidTransactionId(_)));

        // Same id inserted after the existence check
        let recorded = account.transactions.last().cloned().unwrap();
        let err = ledger.insert_recorded(&recorded).await.unwrap_err();
        assert!(matches!(err, BusinessError::InvalidTransactionId(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger
            .record_transaction("missing-user", &reg.account.id, input(&new_id()))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::UserNotFound(_)));

        let err = ledger
            .record_transaction(&reg.user.id, "missing-account", input(&new_id()))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_transactions_newest_first() {
        let fx = fixture().await;
        let reg = register(&fx, "recent@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);
        let base = Utc::now() - Duration::days(30);

        for day in 0..12 {
            ledger
                .record_transaction(
                    &reg.user.id,
                    &reg.account.id,
                    ExternalTransaction {
                        transaction_id: new_id(),
                        date: Some(base + Duration::days(day)),
                        kind: "debit".to_string(),
                        amount: dec!(1),
                        currency: "USD".to_string(),
                        description: format!("day {day}"),
                    },
                )
                .await
                .unwrap();
        }

        let recent = ledger.recent_transactions(&reg.user.id).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].description, "day 11");
        assert!(recent.windows(2).all(|w| w[0].occurred_at >= w[1].occurred_at));
    }

    #[tokio::test]
    async fn test_adjust_balance_refreshes_total() {
        let fx = fixture().await;
        let reg = register(&fx, "adj@example.com").await;
        let ledger = LedgerService::new(&fx.ctx);
        let number = reg.account.account_number.clone();

        let adjusted = ledger.adjust_balance(&number, dec!(30)).await.unwrap();
        assert_eq!(adjusted.account.balance, dec!(30));
        assert_eq!(adjusted.total_balance, dec!(30));

        // No floor
        let adjusted = ledger.adjust_balance(&number, dec!(-45)).await.unwrap();
        assert_eq!(adjusted.account.balance, dec!(-15));

        let user = UserRepo::get_by_id(fx.ctx.pool(), &reg.user.id).await.unwrap();
        assert_eq!(user.balance, dec!(-15));
    }
}
