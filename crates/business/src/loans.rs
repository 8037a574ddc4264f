//! Loan ledger - loan creation, repayments and queries

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use crate::validation;
use ccbank_core::{Loan, LoanRepayment, LoanTerms};
use ccbank_persistence::{AccountRepo, LoanRepo, RepaymentRepo};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Loan request as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoanApplication {
    pub loan_amount: Decimal,
    pub currency: String,
    pub interest_rate: Decimal,
    /// Months
    pub term_length: u32,
}

impl LoanApplication {
    fn into_terms(self) -> BusinessResult<LoanTerms> {
        if self.loan_amount.is_zero() {
            return Err(BusinessError::validation("loanAmount", "loanAmount is required"));
        }
        validation::require("currency", &self.currency)?;
        if self.interest_rate.is_zero() {
            return Err(BusinessError::validation("interestRate", "interestRate is required"));
        }
        if self.term_length == 0 {
            return Err(BusinessError::validation("termLength", "termLength is required"));
        }

        Ok(LoanTerms {
            principal: self.loan_amount,
            currency: self.currency,
            interest_rate: self.interest_rate,
            term_months: self.term_length,
        })
    }
}

/// Loan Service
pub struct LoanService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LoanService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a `pending` loan against the user's primary account
    pub async fn create_loan(
        &self,
        user_id: &str,
        application: LoanApplication,
    ) -> BusinessResult<Loan> {
        validation::require("userId", user_id)?;
        let terms = application.into_terms()?;

        self.ctx.user(user_id).await?;
        let account_id = AccountRepo::get_by_user(self.ctx.pool(), user_id)
            .await?
            .into_iter()
            .next()
            .map(|account| account.id)
            .unwrap_or_else(|| user_id.to_string());

        let loan = Loan::open(user_id, &account_id, terms)?;
        LoanRepo::insert(self.ctx.pool(), &loan).await?;

        tracing::info!(
            user_id,
            loan_id = %loan.id,
            principal = %loan.principal,
            term_months = loan.term_months,
            "loan created"
        );
        Ok(loan)
    }

    /// Record a repayment. The loan becomes `active` whatever the amount.
    pub async fn repay(
        &self,
        user_id: &str,
        loan_id: &str,
        amount: Decimal,
        currency: &str,
    ) -> BusinessResult<LoanRepayment> {
        validation::require_positive("repaymentAmount", amount)?;
        validation::require("loanId", loan_id)?;
        validation::require("currency", currency)?;

        let mut loan = self.get_loan(loan_id).await?;
        if loan.user_id != user_id {
            return Err(BusinessError::LoanNotFound(loan_id.to_string()));
        }

        let repayment = loan.repay(amount, currency)?;

        let mut tx = self.ctx.pool().begin().await?;
        RepaymentRepo::insert(&mut *tx, &repayment).await?;
        LoanRepo::update_status(&mut *tx, &loan.id, loan.status)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || BusinessError::LoanNotFound(loan_id.to_string()))
            })?;
        tx.commit().await?;

        tracing::info!(
            user_id,
            loan_id,
            repayment_id = %repayment.id,
            amount = %amount,
            "loan repayment recorded"
        );
        Ok(repayment)
    }

    pub async fn get_loan(&self, loan_id: &str) -> BusinessResult<Loan> {
        LoanRepo::get_by_id(self.ctx.pool(), loan_id)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || BusinessError::LoanNotFound(loan_id.to_string()))
            })
    }

    /// Repayments of a loan, oldest first. An empty history is `RepaymentsNotFound`.
    pub async fn list_repayments(&self, loan_id: &str) -> BusinessResult<Vec<LoanRepayment>> {
        let repayments = RepaymentRepo::get_by_loan(self.ctx.pool(), loan_id).await?;
        if repayments.is_empty() {
            return Err(BusinessError::RepaymentsNotFound(loan_id.to_string()));
        }
        Ok(repayments)
    }

    pub async fn loans_for_user(&self, user_id: &str) -> BusinessResult<Vec<Loan>> {
        self.ctx.user(user_id).await?;
        Ok(LoanRepo::get_by_user(self.ctx.pool(), user_id).await?)
    }
}
