//! Row loaders shared by the integrity and monitoring repositories.
//!
//! Aggregates are computed in SQL; comparison and grading happen in
//! `ledgerwatch-core`.

use ledgerwatch_core::equation::{AccountType, GlAccountBalance};
use ledgerwatch_core::integrity::{CashBankGlRow, CashBankSumRow, JournalTotalsRow};
use ledgerwatch_shared::types::{CashBankAccountId, GlAccountId, JournalEntryId};
use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, EntityTrait, FromQueryResult, QueryOrder, Statement,
};
use uuid::Uuid;

use crate::entities::{gl_accounts, sea_orm_active_enums::GlAccountType};

const CASH_BANK_SUMS_SQL: &str = r"
SELECT cb.id, cb.code, cb.name, cb.gl_account_id, cb.balance,
       COALESCE(SUM(t.amount), 0) AS transaction_sum
FROM cash_bank_accounts cb
LEFT JOIN cash_bank_transactions t ON t.cash_bank_id = cb.id
WHERE cb.is_active
GROUP BY cb.id, cb.code, cb.name, cb.gl_account_id, cb.balance
ORDER BY cb.code
";

const CASH_BANK_GL_SQL: &str = r"
SELECT cb.id, cb.code, cb.name, cb.balance,
       gl.id AS gl_account_id, gl.code AS gl_code, gl.name AS gl_name,
       gl.balance AS gl_balance
FROM cash_bank_accounts cb
JOIN gl_accounts gl ON gl.id = cb.gl_account_id
WHERE cb.is_active
ORDER BY cb.code
";

const JOURNAL_TOTALS_SQL: &str = r"
SELECT je.id, je.entry_number,
       COALESCE(SUM(jl.debit), 0) AS total_debit,
       COALESCE(SUM(jl.credit), 0) AS total_credit
FROM journal_entries je
LEFT JOIN journal_lines jl ON jl.journal_entry_id = je.id
WHERE je.status = 'POSTED'
GROUP BY je.id, je.entry_number
ORDER BY je.entry_number
";

#[derive(Debug, FromQueryResult)]
struct SumRow {
    id: Uuid,
    code: String,
    name: String,
    gl_account_id: Uuid,
    balance: Decimal,
    transaction_sum: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct GlRow {
    id: Uuid,
    code: String,
    name: String,
    balance: Decimal,
    gl_account_id: Uuid,
    gl_code: String,
    gl_name: String,
    gl_balance: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct JournalRow {
    id: Uuid,
    entry_number: String,
    total_debit: Decimal,
    total_credit: Decimal,
}

/// True when the error means the store itself is unreachable.
pub(crate) const fn is_connection_error(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

/// Active cash/bank accounts with their transaction sums.
pub(crate) async fn cash_bank_sums<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<CashBankSumRow>, DbErr> {
    let rows = SumRow::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        CASH_BANK_SUMS_SQL,
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CashBankSumRow {
            account_id: CashBankAccountId::from_uuid(row.id),
            code: row.code,
            name: row.name,
            gl_account_id: GlAccountId::from_uuid(row.gl_account_id),
            balance: row.balance,
            transaction_sum: row.transaction_sum,
        })
        .collect())
}

/// Active cash/bank accounts joined with their GL mirrors.
pub(crate) async fn cash_bank_gl<C: ConnectionTrait>(conn: &C) -> Result<Vec<CashBankGlRow>, DbErr> {
    let rows = GlRow::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        CASH_BANK_GL_SQL,
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CashBankGlRow {
            account_id: CashBankAccountId::from_uuid(row.id),
            code: row.code,
            name: row.name,
            balance: row.balance,
            gl_account_id: GlAccountId::from_uuid(row.gl_account_id),
            gl_code: row.gl_code,
            gl_name: row.gl_name,
            gl_balance: row.gl_balance,
        })
        .collect())
}

/// Debit and credit totals of every posted journal entry.
pub(crate) async fn posted_journal_totals<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<JournalTotalsRow>, DbErr> {
    let rows = JournalRow::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        JOURNAL_TOTALS_SQL,
    ))
    .all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| JournalTotalsRow {
            entry_id: JournalEntryId::from_uuid(row.id),
            entry_number: row.entry_number,
            total_debit: row.total_debit,
            total_credit: row.total_credit,
        })
        .collect())
}

/// Every GL account with its cached balance, ordered by code.
pub(crate) async fn gl_account_balances<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<GlAccountBalance>, DbErr> {
    let accounts = gl_accounts::Entity::find()
        .order_by_asc(gl_accounts::Column::Code)
        .all(conn)
        .await?;

    Ok(accounts.into_iter().map(to_account_balance).collect())
}

pub(crate) fn to_account_balance(model: gl_accounts::Model) -> GlAccountBalance {
    GlAccountBalance {
        id: GlAccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        account_type: to_account_type(model.account_type),
        balance: model.balance,
        is_header: model.is_header,
        is_active: model.is_active,
    }
}

const fn to_account_type(value: GlAccountType) -> AccountType {
    match value {
        GlAccountType::Asset => AccountType::Asset,
        GlAccountType::Liability => AccountType::Liability,
        GlAccountType::Equity => AccountType::Equity,
        GlAccountType::Revenue => AccountType::Revenue,
        GlAccountType::Expense => AccountType::Expense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_connection_errors_are_distinguished() {
        assert!(is_connection_error(&DbErr::Conn(RuntimeErr::Internal(
            "refused".to_string()
        ))));
        assert!(!is_connection_error(&DbErr::Query(RuntimeErr::Internal(
            "syntax error".to_string()
        ))));
        assert!(!is_connection_error(&DbErr::RecordNotFound(
            "gl_accounts".to_string()
        )));
    }

    #[test]
    fn test_account_type_mapping() {
        assert_eq!(to_account_type(GlAccountType::Revenue), AccountType::Revenue);
        assert_eq!(to_account_type(GlAccountType::Asset), AccountType::Asset);
    }
}
