//! Accounting equation repository.
//!
//! Validates `Assets = Liabilities + Equity + Net Income` over the cached GL
//! balances and applies auto-heal writes in a single transaction.

use std::sync::Arc;

use chrono::Utc;
use ledgerwatch_core::equation::{
    EquationDetail, EquationError, EquationReport, EquationTotals, GlAccountBalance,
    HealAction, HealOptions, HealOutcome, ZeroTarget, heal_diagnostics, plan_close,
    plan_header_zeroing,
};
use ledgerwatch_shared::error::AppError;
use ledgerwatch_shared::types::GlAccountId;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use super::ledger_rows::{self, to_account_balance};
use crate::entities::{gl_accounts, sea_orm_active_enums::GlAccountType};

/// Error types for accounting equation operations.
///
/// Named apart from the domain [`EquationError`], which it wraps.
#[derive(Debug, thiserror::Error)]
pub enum EquationRepoError {
    /// The equation does not hold after a posting.
    #[error(transparent)]
    Violated(#[from] EquationError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl EquationRepoError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Violated(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<EquationRepoError> for AppError {
    fn from(err: EquationRepoError) -> Self {
        match &err {
            EquationRepoError::Violated(_) => Self::BusinessRule(err.to_string()),
            EquationRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Accounting equation repository.
#[derive(Debug, Clone)]
pub struct EquationRepository {
    db: DatabaseConnection,
    tolerance: Decimal,
    options: HealOptions,
    heal_lock: Arc<Mutex<()>>,
}

impl EquationRepository {
    /// Creates a new equation repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, tolerance: Decimal, options: HealOptions) -> Self {
        Self {
            db,
            tolerance,
            options,
            heal_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Checks the accounting equation over active GL accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Result<EquationReport, EquationRepoError> {
        let accounts = ledger_rows::gl_account_balances(&self.db).await?;
        let report = self.evaluate(&accounts);

        if report.is_valid {
            info!(
                total_assets = %report.total_assets,
                net_income = %report.net_income,
                "Accounting equation balanced"
            );
        } else {
            warn!(
                diff = %report.diff,
                total_assets = %report.total_assets,
                total_liabilities = %report.total_liabilities,
                adjusted_equity = %report.adjusted_equity,
                "Accounting equation not balanced"
            );
        }

        Ok(report)
    }

    /// Validation plus the non-zero accounts and recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn equation_report(&self) -> Result<EquationDetail, EquationRepoError> {
        let accounts = ledger_rows::gl_account_balances(&self.db).await?;
        let report = self.evaluate(&accounts);
        Ok(EquationDetail::new(report, &accounts))
    }

    /// Guard run after a posting: fails when the equation no longer holds.
    ///
    /// # Errors
    ///
    /// Returns [`EquationRepoError::Violated`] naming `reference` when the
    /// equation is out of balance.
    pub async fn validate_after_transaction(
        &self,
        reference: &str,
    ) -> Result<EquationReport, EquationRepoError> {
        let report = self.validate().await?;
        if let Err(e) = report.ensure_valid(reference) {
            error!(reference, diff = %report.diff, "Posting broke the accounting equation");
            return Err(e.into());
        }
        Ok(report)
    }

    /// Closes net income (when enabled) and zeroes header accounts, then
    /// re-validates.
    ///
    /// Runs at most once at a time. A residual imbalance is reported in the
    /// outcome's diagnostics, never as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a database read or write fails; nothing is
    /// committed in that case.
    #[instrument(skip(self, options), fields(close_net_income = options.close_net_income))]
    pub async fn auto_heal(&self, options: &HealOptions) -> Result<HealOutcome, EquationRepoError> {
        let _lock = self.heal_lock.lock().await;

        let txn = self.db.begin().await?;
        let mut accounts = locked_accounts(&txn).await?;
        let before = self.evaluate(&accounts);
        let mut actions = Vec::new();
        let mut diagnostics = Vec::new();

        let plan = if options.close_net_income {
            plan_close(&accounts, &options.retained_earnings_code).unwrap_or_else(|e| {
                diagnostics.push(e.to_string());
                None
            })
        } else {
            None
        };
        if let Some(plan) = plan {
            let into = match plan.retained_earnings {
                Some(id) => id,
                None => {
                    let created = create_retained_earnings(&txn, options).await?;
                    actions.push(HealAction::CreatedRetainedEarnings {
                        code: created.code.clone(),
                    });
                    let id = created.id;
                    accounts.push(created);
                    id
                }
            };

            set_balance(&txn, into, balance_of(&accounts, into) + plan.net_income).await?;
            zero_balances(&txn, &plan.close_accounts).await?;
            for account in &mut accounts {
                if account.id == into {
                    account.balance += plan.net_income;
                } else if plan.close_accounts.contains(&account.id) {
                    account.balance = Decimal::ZERO;
                }
            }

            info!(
                amount = %plan.net_income,
                into = %options.retained_earnings_code,
                accounts_closed = plan.close_accounts.len(),
                "Net income closed into retained earnings"
            );
            actions.push(HealAction::ClosedNetIncome {
                amount: plan.net_income,
                into: options.retained_earnings_code.clone(),
                accounts_closed: plan.close_accounts.len(),
            });
        }

        let mut zeroed: Vec<ZeroTarget> = Vec::new();
        if !self.evaluate(&accounts).is_valid {
            zeroed = plan_header_zeroing(&accounts, &options.summary_codes);
            let ids: Vec<GlAccountId> = zeroed.iter().map(|target| target.id).collect();
            zero_balances(&txn, &ids).await?;
            for target in &zeroed {
                info!(code = %target.code, previous_balance = %target.balance, "Header account zeroed");
                actions.push(HealAction::ZeroedAccount {
                    code: target.code.clone(),
                    previous_balance: target.balance,
                });
            }
        }

        let after = self.evaluate(&locked_accounts(&txn).await?);
        txn.commit().await?;

        diagnostics.extend(heal_diagnostics(&zeroed, &after));
        for diagnostic in &diagnostics {
            warn!(diagnostic = %diagnostic, "Auto-heal diagnostic");
        }
        info!(
            actions = actions.len(),
            valid_before = before.is_valid,
            valid_after = after.is_valid,
            "Auto-heal finished"
        );

        Ok(HealOutcome {
            before,
            after,
            actions,
            diagnostics,
        })
    }

    /// Auto-heal with the configured options, logging the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if auto-heal fails.
    pub async fn scheduled_health_check(&self) -> Result<HealOutcome, EquationRepoError> {
        let outcome = match self.auto_heal(&self.options).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Scheduled accounting equation check failed");
                return Err(e);
            }
        };

        if outcome.after.is_valid {
            info!(
                actions = outcome.actions.len(),
                "Scheduled accounting equation check passed"
            );
        } else {
            error!(
                diff = %outcome.after.diff,
                diagnostics = outcome.diagnostics.len(),
                "Accounting equation still unbalanced after scheduled auto-heal"
            );
        }
        Ok(outcome)
    }

    fn evaluate(&self, accounts: &[GlAccountBalance]) -> EquationReport {
        EquationReport::evaluate(
            EquationTotals::from_accounts(accounts),
            self.tolerance,
            Utc::now(),
        )
    }
}

async fn locked_accounts(txn: &DatabaseTransaction) -> Result<Vec<GlAccountBalance>, DbErr> {
    let accounts = gl_accounts::Entity::find()
        .order_by_asc(gl_accounts::Column::Code)
        .lock_exclusive()
        .all(txn)
        .await?;
    Ok(accounts.into_iter().map(to_account_balance).collect())
}

fn balance_of(accounts: &[GlAccountBalance], id: GlAccountId) -> Decimal {
    accounts
        .iter()
        .find(|account| account.id == id)
        .map_or(Decimal::ZERO, |account| account.balance)
}

async fn create_retained_earnings<C: ConnectionTrait>(
    conn: &C,
    options: &HealOptions,
) -> Result<GlAccountBalance, DbErr> {
    let now = Utc::now();
    let model = gl_accounts::ActiveModel {
        id: Set(GlAccountId::new().into_inner()),
        code: Set(options.retained_earnings_code.clone()),
        name: Set(options.retained_earnings_name.clone()),
        account_type: Set(GlAccountType::Equity),
        balance: Set(Decimal::ZERO),
        is_header: Set(false),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    info!(code = %model.code, "Retained earnings account created");
    Ok(to_account_balance(model))
}

async fn set_balance<C: ConnectionTrait>(
    conn: &C,
    id: GlAccountId,
    balance: Decimal,
) -> Result<(), DbErr> {
    gl_accounts::Entity::update_many()
        .col_expr(
            gl_accounts::Column::Balance,
            sea_orm::sea_query::Expr::value(balance),
        )
        .col_expr(
            gl_accounts::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(Utc::now()),
        )
        .filter(gl_accounts::Column::Id.eq(id.into_inner()))
        .exec(conn)
        .await?;
    Ok(())
}

async fn zero_balances<C: ConnectionTrait>(conn: &C, ids: &[GlAccountId]) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }

    gl_accounts::Entity::update_many()
        .col_expr(
            gl_accounts::Column::Balance,
            sea_orm::sea_query::Expr::value(Decimal::ZERO),
        )
        .col_expr(
            gl_accounts::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(Utc::now()),
        )
        .filter(gl_accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
        .exec(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerwatch_core::equation::AccountType;
    use rust_decimal_macros::dec;

    fn account(code: &str, balance: Decimal) -> GlAccountBalance {
        GlAccountBalance {
            id: GlAccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type: AccountType::Asset,
            balance,
            is_header: false,
            is_active: true,
        }
    }

    #[test]
    fn test_balance_of_missing_account_is_zero() {
        let cash = account("1101", dec!(500));
        let accounts = vec![cash.clone()];
        assert_eq!(balance_of(&accounts, cash.id), dec!(500));
        assert_eq!(balance_of(&accounts, GlAccountId::new()), Decimal::ZERO);
    }

    #[test]
    fn test_violation_maps_to_business_rule() {
        let err = EquationRepoError::from(EquationError::Violated {
            reference: "SALE 42".to_string(),
            diff: dec!(10),
            detail: "difference 10".to_string(),
        });
        assert_eq!(err.error_code(), "ACCOUNTING_EQUATION_VIOLATED");
        assert_eq!(AppError::from(err).status_code(), 422);
    }
}
