//! Accounting equation domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerwatch_shared::config::EquationConfig;
use ledgerwatch_shared::types::GlAccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }

    /// Returns true for the temporary accounts closed into retained earnings.
    #[must_use]
    pub const fn is_income_statement(&self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GL account with its cached balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlAccountBalance {
    /// Account id.
    pub id: GlAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Cached balance.
    pub balance: Decimal,
    /// Structural header (summary) account.
    pub is_header: bool,
    /// Inactive accounts are excluded from every aggregate.
    pub is_active: bool,
}

/// Sums of active account balances per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquationTotals {
    /// Sum of asset balances.
    pub assets: Decimal,
    /// Sum of liability balances.
    pub liabilities: Decimal,
    /// Sum of equity balances.
    pub equity: Decimal,
    /// Sum of revenue balances.
    pub revenue: Decimal,
    /// Sum of expense balances.
    pub expenses: Decimal,
}

/// Result of checking `Assets = Liabilities + Equity + Net Income`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquationReport {
    /// True when `|diff| <= tolerance`.
    pub is_valid: bool,
    /// Sum of asset balances.
    pub total_assets: Decimal,
    /// Sum of liability balances.
    pub total_liabilities: Decimal,
    /// Sum of equity balances.
    pub total_equity: Decimal,
    /// Sum of revenue balances.
    pub total_revenue: Decimal,
    /// Sum of expense balances.
    pub total_expenses: Decimal,
    /// `revenue - expenses`.
    pub net_income: Decimal,
    /// `equity + net_income`.
    pub adjusted_equity: Decimal,
    /// `assets - (liabilities + adjusted_equity)`.
    pub diff: Decimal,
    /// Imbalance and net loss notices.
    pub warnings: Vec<String>,
    /// When the check ran.
    pub validated_at: DateTime<Utc>,
}

/// Equation report with account breakdown and advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquationDetail {
    /// Validation summary.
    pub report: EquationReport,
    /// Active accounts with a non-zero balance, ordered by type then code.
    pub accounts: Vec<GlAccountBalance>,
    /// Operator advice.
    pub recommendations: Vec<String>,
}

/// Tunables for an auto-heal pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealOptions {
    /// Close revenue and expense into retained earnings when net income is non-zero.
    pub close_net_income: bool,
    /// Code of the retained earnings account.
    pub retained_earnings_code: String,
    /// Name used if the retained earnings account must be created.
    pub retained_earnings_name: String,
    /// Summary codes zeroed in addition to flagged header accounts.
    pub summary_codes: Vec<String>,
}

impl From<&EquationConfig> for HealOptions {
    fn from(config: &EquationConfig) -> Self {
        Self {
            close_net_income: config.close_net_income,
            retained_earnings_code: config.retained_earnings_code.clone(),
            retained_earnings_name: config.retained_earnings_name.clone(),
            summary_codes: config.summary_codes.clone(),
        }
    }
}

/// A single write performed by auto-heal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealAction {
    /// Retained earnings account did not exist and was created.
    CreatedRetainedEarnings {
        /// Code of the new account.
        code: String,
    },
    /// Net income moved into retained earnings.
    ClosedNetIncome {
        /// Amount added to retained earnings.
        amount: Decimal,
        /// Retained earnings account code.
        into: String,
        /// Revenue and expense accounts zeroed.
        accounts_closed: usize,
    },
    /// A header or summary account balance was set to zero.
    ZeroedAccount {
        /// Account code.
        code: String,
        /// Balance before zeroing.
        previous_balance: Decimal,
    },
}

/// What an auto-heal pass did and where it left the books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealOutcome {
    /// State before healing.
    pub before: EquationReport,
    /// State after healing.
    pub after: EquationReport,
    /// Writes applied.
    pub actions: Vec<HealAction>,
    /// Residual problems for an operator.
    pub diagnostics: Vec<String>,
}
