//! Accounting equation evaluation and heal planning.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use ledgerwatch_shared::types::GlAccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::EquationError;
use super::types::{AccountType, EquationDetail, EquationReport, EquationTotals, GlAccountBalance};

impl EquationTotals {
    /// Sums active account balances per type.
    #[must_use]
    pub fn from_accounts(accounts: &[GlAccountBalance]) -> Self {
        accounts
            .iter()
            .filter(|account| account.is_active)
            .fold(Self::default(), |mut totals, account| {
                let bucket = match account.account_type {
                    AccountType::Asset => &mut totals.assets,
                    AccountType::Liability => &mut totals.liabilities,
                    AccountType::Equity => &mut totals.equity,
                    AccountType::Revenue => &mut totals.revenue,
                    AccountType::Expense => &mut totals.expenses,
                };
                *bucket += account.balance;
                totals
            })
    }

    /// `revenue - expenses`.
    #[must_use]
    pub fn net_income(&self) -> Decimal {
        self.revenue - self.expenses
    }
}

impl EquationReport {
    /// Checks `Assets = Liabilities + Equity + Net Income` within `tolerance`.
    #[must_use]
    pub fn evaluate(totals: EquationTotals, tolerance: Decimal, validated_at: DateTime<Utc>) -> Self {
        let net_income = totals.net_income();
        let adjusted_equity = totals.equity + net_income;
        let diff = totals.assets - (totals.liabilities + adjusted_equity);
        let is_valid = diff.abs() <= tolerance;

        let mut warnings = Vec::new();
        if !is_valid {
            warnings.push(format!(
                "Accounting equation not balanced: assets ({}) != liabilities + equity + net income ({}), difference {}",
                totals.assets,
                totals.liabilities + adjusted_equity,
                diff
            ));
        }
        if net_income.is_sign_negative() && !net_income.is_zero() {
            warnings.push(format!(
                "Net loss detected: {} (revenue {}, expenses {})",
                net_income, totals.revenue, totals.expenses
            ));
        }

        Self {
            is_valid,
            total_assets: totals.assets,
            total_liabilities: totals.liabilities,
            total_equity: totals.equity,
            total_revenue: totals.revenue,
            total_expenses: totals.expenses,
            net_income,
            adjusted_equity,
            diff,
            warnings,
            validated_at,
        }
    }

    /// Fails with [`EquationError::Violated`] when the equation does not hold.
    pub fn ensure_valid(&self, reference: &str) -> Result<(), EquationError> {
        if self.is_valid {
            return Ok(());
        }
        Err(EquationError::Violated {
            reference: reference.to_string(),
            diff: self.diff,
            detail: self
                .warnings
                .first()
                .cloned()
                .unwrap_or_else(|| format!("difference {}", self.diff)),
        })
    }
}

/// Produces operator advice for an equation report.
#[must_use]
pub fn equation_recommendations(report: &EquationReport) -> Vec<String> {
    let mut advice = Vec::new();
    if !report.is_valid {
        if report.diff > Decimal::ZERO {
            advice.push(
                "Assets exceed liabilities + equity: check for missing liabilities or understated equity"
                    .to_string(),
            );
        } else {
            advice.push(
                "Liabilities + equity exceed assets: check for missing assets or overstated liabilities"
                    .to_string(),
            );
        }
    }
    if !report.net_income.is_zero() {
        advice.push(
            "Run period-end closing to move net income into retained earnings".to_string(),
        );
    }
    advice
}

impl EquationDetail {
    /// Builds the detail view: non-zero active accounts ordered by type then code.
    #[must_use]
    pub fn new(report: EquationReport, accounts: &[GlAccountBalance]) -> Self {
        let mut listed: Vec<GlAccountBalance> = accounts
            .iter()
            .filter(|account| account.is_active && !account.balance.is_zero())
            .cloned()
            .collect();
        listed.sort_by(|a, b| {
            a.account_type
                .as_str()
                .cmp(b.account_type.as_str())
                .then_with(|| a.code.cmp(&b.code))
        });

        Self {
            recommendations: equation_recommendations(&report),
            report,
            accounts: listed,
        }
    }
}

/// How net income will be closed into retained earnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePlan {
    /// Amount to add to retained earnings.
    pub net_income: Decimal,
    /// Existing retained earnings account, `None` if it must be created.
    pub retained_earnings: Option<GlAccountId>,
    /// Revenue and expense accounts to zero.
    pub close_accounts: Vec<GlAccountId>,
}

/// Plans closing revenue and expense into retained earnings.
///
/// Returns `Ok(None)` when net income over active accounts is zero.
///
/// # Errors
///
/// Returns [`EquationError::RetainedEarningsUnusable`] when an account with
/// the retained earnings code exists but is inactive or not equity: the
/// equation would not count the closed amount.
pub fn plan_close(
    accounts: &[GlAccountBalance],
    retained_earnings_code: &str,
) -> Result<Option<ClosePlan>, EquationError> {
    let net_income = EquationTotals::from_accounts(accounts).net_income();
    if net_income.is_zero() {
        return Ok(None);
    }

    let retained_earnings = match accounts
        .iter()
        .find(|account| account.code == retained_earnings_code)
    {
        None => None,
        Some(account) if !account.is_active => {
            return Err(EquationError::RetainedEarningsUnusable {
                code: account.code.clone(),
                reason: "inactive",
            });
        }
        Some(account) if account.account_type != AccountType::Equity => {
            return Err(EquationError::RetainedEarningsUnusable {
                code: account.code.clone(),
                reason: "not an equity account",
            });
        }
        Some(account) => Some(account.id),
    };
    let close_accounts = accounts
        .iter()
        .filter(|account| {
            account.is_active
                && account.account_type.is_income_statement()
                && !account.balance.is_zero()
        })
        .map(|account| account.id)
        .collect();

    Ok(Some(ClosePlan {
        net_income,
        retained_earnings,
        close_accounts,
    }))
}

/// An account auto-heal will zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroTarget {
    /// Account id.
    pub id: GlAccountId,
    /// Account code.
    pub code: String,
    /// Balance before zeroing.
    pub balance: Decimal,
    /// False when selected only because the code is in the summary list.
    pub is_header: bool,
}

/// Selects active header or summary-coded accounts carrying a balance.
#[must_use]
pub fn plan_header_zeroing(accounts: &[GlAccountBalance], summary_codes: &[String]) -> Vec<ZeroTarget> {
    let codes: HashSet<&str> = summary_codes.iter().map(String::as_str).collect();
    let mut targets: Vec<ZeroTarget> = accounts
        .iter()
        .filter(|account| {
            account.is_active
                && !account.balance.is_zero()
                && (account.is_header || codes.contains(account.code.as_str()))
        })
        .map(|account| ZeroTarget {
            id: account.id,
            code: account.code.clone(),
            balance: account.balance,
            is_header: account.is_header,
        })
        .collect();
    targets.sort_by(|a, b| a.code.cmp(&b.code));
    targets
}

/// Diagnostics for a finished heal pass.
///
/// Flags non-header accounts zeroed only because of the summary code list,
/// and any imbalance left after healing.
#[must_use]
pub fn heal_diagnostics(zeroed: &[ZeroTarget], after: &EquationReport) -> Vec<String> {
    let mut diagnostics: Vec<String> = zeroed
        .iter()
        .filter(|target| !target.is_header)
        .map(|target| {
            format!(
                "Account {} is not flagged as a header but matched the summary code list; balance {} was zeroed",
                target.code, target.balance
            )
        })
        .collect();
    if !after.is_valid {
        diagnostics.push(format!(
            "Accounting equation still out of balance by {} after auto-heal; manual review required",
            after.diff
        ));
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::DEFAULT_TOLERANCE;
    use rust_decimal_macros::dec;

    fn account(code: &str, account_type: AccountType, balance: Decimal) -> GlAccountBalance {
        GlAccountBalance {
            id: GlAccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type,
            balance,
            is_header: false,
            is_active: true,
        }
    }

    fn balanced_books() -> Vec<GlAccountBalance> {
        vec![
            account("1101", AccountType::Asset, dec!(15000)),
            account("2101", AccountType::Liability, dec!(4000)),
            account("3101", AccountType::Equity, dec!(10000)),
            account("4101", AccountType::Revenue, dec!(3000)),
            account("5101", AccountType::Expense, dec!(2000)),
        ]
    }

    #[test]
    fn test_balanced_books_are_valid() {
        let totals = EquationTotals::from_accounts(&balanced_books());
        let report = EquationReport::evaluate(totals, DEFAULT_TOLERANCE, Utc::now());

        assert!(report.is_valid);
        assert_eq!(report.net_income, dec!(1000));
        assert_eq!(report.adjusted_equity, dec!(11000));
        assert_eq!(report.diff, Decimal::ZERO);
        assert!(report.warnings.is_empty());
        assert!(report.ensure_valid("payment 42").is_ok());
    }

    #[test]
    fn test_inactive_accounts_are_ignored() {
        let mut books = balanced_books();
        let mut dormant = account("1199", AccountType::Asset, dec!(999));
        dormant.is_active = false;
        books.push(dormant);

        let report = EquationReport::evaluate(
            EquationTotals::from_accounts(&books),
            DEFAULT_TOLERANCE,
            Utc::now(),
        );
        assert!(report.is_valid);
    }

    #[test]
    fn test_tolerance_boundary() {
        let mut books = balanced_books();
        books[0].balance = dec!(15000.01);
        let report = EquationReport::evaluate(
            EquationTotals::from_accounts(&books),
            DEFAULT_TOLERANCE,
            Utc::now(),
        );
        assert!(report.is_valid);

        books[0].balance = dec!(15000.02);
        let report = EquationReport::evaluate(
            EquationTotals::from_accounts(&books),
            DEFAULT_TOLERANCE,
            Utc::now(),
        );
        assert!(!report.is_valid);
        assert_eq!(report.diff, dec!(0.02));
    }

    #[test]
    fn test_net_loss_warning_and_guard() {
        let books = vec![
            account("1101", AccountType::Asset, dec!(100)),
            account("3101", AccountType::Equity, dec!(500)),
            account("5101", AccountType::Expense, dec!(500)),
        ];
        let report = EquationReport::evaluate(
            EquationTotals::from_accounts(&books),
            DEFAULT_TOLERANCE,
            Utc::now(),
        );

        assert!(!report.is_valid);
        assert_eq!(report.diff, dec!(100));
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[1].starts_with("Net loss detected"));

        let err = report.ensure_valid("deposit 7").unwrap_err();
        assert_eq!(err.error_code(), "ACCOUNTING_EQUATION_VIOLATED");
        assert!(err.to_string().contains("deposit 7"));

        let advice = equation_recommendations(&report);
        assert!(advice[0].starts_with("Assets exceed"));
        assert_eq!(advice.len(), 2);
    }

    #[test]
    fn test_detail_lists_nonzero_accounts_by_type_then_code() {
        let mut books = balanced_books();
        books.push(account("1102", AccountType::Asset, Decimal::ZERO));
        books.push(account("1100", AccountType::Asset, dec!(0.5)));
        let report = EquationReport::evaluate(
            EquationTotals::from_accounts(&books),
            DEFAULT_TOLERANCE,
            Utc::now(),
        );
        let detail = EquationDetail::new(report, &books);

        let codes: Vec<&str> = detail.accounts.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["1100", "1101", "3101", "5101", "2101", "4101"]);
    }

    #[test]
    fn test_plan_close() {
        let books = balanced_books();
        assert!(plan_close(&books, "3201").unwrap().is_some_and(|plan| {
            plan.net_income == dec!(1000)
                && plan.retained_earnings.is_none()
                && plan.close_accounts.len() == 2
        }));

        let mut closed = books;
        closed[3].balance = Decimal::ZERO;
        closed[4].balance = Decimal::ZERO;
        assert!(plan_close(&closed, "3201").unwrap().is_none());
    }

    #[test]
    fn test_plan_close_refuses_uncounted_retained_earnings() {
        let mut retained = account("3201", AccountType::Equity, Decimal::ZERO);
        retained.is_active = false;
        let books = vec![
            account("1101", AccountType::Asset, dec!(100)),
            account("4101", AccountType::Revenue, dec!(100)),
            retained,
        ];
        let before = EquationReport::evaluate(
            EquationTotals::from_accounts(&books),
            DEFAULT_TOLERANCE,
            Utc::now(),
        );
        assert!(before.is_valid);

        let err = plan_close(&books, "3201").unwrap_err();
        assert_eq!(err.error_code(), "RETAINED_EARNINGS_UNUSABLE");
        assert_eq!(
            err.to_string(),
            "Retained earnings account 3201 is inactive; net income was not closed"
        );

        let mut wrong_type = books;
        wrong_type[2] = account("3201", AccountType::Liability, Decimal::ZERO);
        assert!(matches!(
            plan_close(&wrong_type, "3201"),
            Err(EquationError::RetainedEarningsUnusable { reason: "not an equity account", .. })
        ));
    }

    #[test]
    fn test_plan_header_zeroing_reports_non_header_codes() {
        let mut header = account("1000", AccountType::Asset, dec!(15000));
        header.is_header = true;
        let mut flagged = account("1900", AccountType::Asset, dec!(20));
        flagged.is_header = true;
        let books = vec![
            header,
            flagged,
            account("2000", AccountType::Liability, dec!(300)),
            account("2100", AccountType::Liability, Decimal::ZERO),
            account("2101", AccountType::Liability, dec!(4000)),
        ];
        let codes = vec!["1000".to_string(), "2000".to_string(), "2100".to_string()];

        let targets = plan_header_zeroing(&books, &codes);
        let selected: Vec<&str> = targets.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(selected, vec!["1000", "1900", "2000"]);

        let after = EquationReport::evaluate(EquationTotals::default(), DEFAULT_TOLERANCE, Utc::now());
        let diagnostics = heal_diagnostics(&targets, &after);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("2000"));
    }
}
