//! Accounting equation validation and auto-heal planning.
//!
//! Checks `Assets = Liabilities + Equity + (Revenue - Expenses)` over active
//! GL accounts and plans the corrective writes auto-heal may apply.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::EquationError;
pub use service::{
    ClosePlan, ZeroTarget, equation_recommendations, heal_diagnostics, plan_close,
    plan_header_zeroing,
};
pub use types::{
    AccountType, EquationDetail, EquationReport, EquationTotals, GlAccountBalance, HealAction,
    HealOptions, HealOutcome,
};
