//! Ledger tables the consistency engine reads and corrects.
//!
//! Creates the chart of accounts, cash/bank accounts with their ledger lines,
//! and journal entries. The posting pipeline owns the writes to these tables;
//! the engine only writes cached balances and correction lines.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS
        // ============================================================
        db.execute_unprepared(GL_ACCOUNTS_SQL).await?;
        db.execute_unprepared(CASH_BANK_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER LINES & JOURNALS
        // ============================================================
        db.execute_unprepared(CASH_BANK_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(JOURNAL_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE gl_account_type AS ENUM (
    'ASSET',
    'LIABILITY',
    'EQUITY',
    'REVENUE',
    'EXPENSE'
);

CREATE TYPE cash_bank_kind AS ENUM ('CASH', 'BANK');

CREATE TYPE journal_status AS ENUM ('DRAFT', 'POSTED', 'REVERSED');
";

const GL_ACCOUNTS_SQL: &str = r"
CREATE TABLE gl_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type gl_account_type NOT NULL,
    balance NUMERIC(20, 2) NOT NULL DEFAULT 0,
    is_header BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_gl_accounts_type ON gl_accounts(account_type) WHERE is_active;
";

const CASH_BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE cash_bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    kind cash_bank_kind NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'IDR',
    balance NUMERIC(20, 2) NOT NULL DEFAULT 0,
    gl_account_id UUID NOT NULL UNIQUE REFERENCES gl_accounts(id),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const CASH_BANK_TRANSACTIONS_SQL: &str = r"
CREATE TABLE cash_bank_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    cash_bank_id UUID NOT NULL REFERENCES cash_bank_accounts(id),
    reference_type VARCHAR(50) NOT NULL,
    reference_id VARCHAR(100),
    amount NUMERIC(20, 2) NOT NULL,
    balance_after NUMERIC(20, 2) NOT NULL,
    transaction_date TIMESTAMPTZ NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_cash_bank_transactions_account_date
    ON cash_bank_transactions(cash_bank_id, transaction_date, id);
CREATE INDEX idx_cash_bank_transactions_reference
    ON cash_bank_transactions(reference_id) WHERE reference_id IS NOT NULL;
";

const JOURNAL_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entry_number VARCHAR(50) NOT NULL UNIQUE,
    entry_date DATE NOT NULL,
    status journal_status NOT NULL DEFAULT 'DRAFT',
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_journal_entries_status ON journal_entries(status);

CREATE TABLE journal_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    gl_account_id UUID NOT NULL REFERENCES gl_accounts(id),
    debit NUMERIC(20, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(20, 2) NOT NULL DEFAULT 0,
    memo TEXT,
    CONSTRAINT chk_journal_line_one_side CHECK (
        (debit > 0 AND credit = 0) OR (credit > 0 AND debit = 0)
    )
);

CREATE INDEX idx_journal_lines_entry ON journal_lines(journal_entry_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS journal_lines;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS cash_bank_transactions;
DROP TABLE IF EXISTS cash_bank_accounts;
DROP TABLE IF EXISTS gl_accounts;
DROP TYPE IF EXISTS journal_status;
DROP TYPE IF EXISTS cash_bank_kind;
DROP TYPE IF EXISTS gl_account_type;
";
