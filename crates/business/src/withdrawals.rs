//! Withdrawal stage progression

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use ccbank_core::{Advance, Withdrawal};
use ccbank_persistence::WithdrawalRepo;

/// Withdrawal Service - confirms withdrawal stages one at a time
pub struct WithdrawalService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WithdrawalService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, withdrawal_id: &str) -> BusinessResult<Withdrawal> {
        WithdrawalRepo::get_by_id(self.ctx.pool(), withdrawal_id)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || {
                    BusinessError::WithdrawalNotFound(withdrawal_id.to_string())
                })
            })
    }

    /// Complete the current stage and move to the next one.
    ///
    /// Completing the last stage marks the withdrawal `completed`. A stage
    /// that is already done, or a withdrawal that is no longer pending, is
    /// rejected with a conflict and nothing is written.
    pub async fn advance(&self, withdrawal_id: &str) -> BusinessResult<Withdrawal> {
        let mut withdrawal = self.get(withdrawal_id).await?;

        let outcome = withdrawal
            .advance()
            .inspect_err(|e| tracing::debug!(withdrawal_id, error = %e, "stage advance rejected"))?;

        withdrawal.version = WithdrawalRepo::update_progress(self.ctx.pool(), &withdrawal)
            .await
            .map_err(|e| {
                BusinessError::from_lookup(e, || {
                    BusinessError::WithdrawalNotFound(withdrawal_id.to_string())
                })
            })?;

        match outcome {
            Advance::MovedTo(stage) => {
                tracing::info!(withdrawal_id, stage = %stage, "withdrawal stage advanced")
            }
            Advance::Completed => tracing::info!(withdrawal_id, "withdrawal completed"),
        }

        Ok(withdrawal)
    }
}
