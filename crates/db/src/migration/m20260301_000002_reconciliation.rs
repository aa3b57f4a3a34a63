//! Reconciliation snapshots, reconciliations and the cash/bank audit trail.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(SNAPSHOTS_SQL).await?;
        db.execute_unprepared(RECONCILIATIONS_SQL).await?;
        db.execute_unprepared(AUDIT_TRAIL_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE snapshot_status AS ENUM ('ACTIVE', 'LOCKED');

CREATE TYPE reconciliation_status AS ENUM ('PENDING', 'APPROVED', 'REJECTED');

CREATE TYPE difference_type AS ENUM (
    'MISSING',
    'ADDED',
    'AMOUNT_CHANGE',
    'DATE_CHANGE'
);

CREATE TYPE severity_level AS ENUM ('LOW', 'MEDIUM', 'HIGH', 'CRITICAL');
";

const SNAPSHOTS_SQL: &str = r"
CREATE TABLE reconciliation_snapshots (
    id UUID PRIMARY KEY,
    cash_bank_id UUID NOT NULL REFERENCES cash_bank_accounts(id),
    period VARCHAR(7) NOT NULL CHECK (period ~ '^[0-9]{4}-(0[1-9]|1[0-2])$'),
    snapshot_date TIMESTAMPTZ NOT NULL,
    generated_by UUID NOT NULL,
    opening_balance NUMERIC(20, 2) NOT NULL DEFAULT 0,
    closing_balance NUMERIC(20, 2) NOT NULL DEFAULT 0,
    total_debit NUMERIC(20, 2) NOT NULL DEFAULT 0,
    total_credit NUMERIC(20, 2) NOT NULL DEFAULT 0,
    transaction_count INTEGER NOT NULL DEFAULT 0,
    data_hash CHAR(64) NOT NULL,
    is_locked BOOLEAN NOT NULL DEFAULT false,
    locked_at TIMESTAMPTZ,
    locked_by UUID,
    status snapshot_status NOT NULL DEFAULT 'ACTIVE',
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_snapshot_lock_stamp CHECK (
        NOT is_locked OR (locked_at IS NOT NULL AND locked_by IS NOT NULL)
    )
);

CREATE INDEX idx_reconciliation_snapshots_account_period
    ON reconciliation_snapshots(cash_bank_id, period);

CREATE TABLE reconciliation_transaction_snapshots (
    id UUID PRIMARY KEY,
    snapshot_id UUID NOT NULL REFERENCES reconciliation_snapshots(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    transaction_id UUID NOT NULL,
    transaction_date TIMESTAMPTZ NOT NULL,
    reference_type VARCHAR(50) NOT NULL,
    reference_id VARCHAR(100),
    amount NUMERIC(20, 2) NOT NULL,
    debit_amount NUMERIC(20, 2) NOT NULL DEFAULT 0,
    credit_amount NUMERIC(20, 2) NOT NULL DEFAULT 0,
    balance_after NUMERIC(20, 2) NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (snapshot_id, position)
);
";

const RECONCILIATIONS_SQL: &str = r"
CREATE TABLE bank_reconciliations (
    id UUID PRIMARY KEY,
    reconciliation_number VARCHAR(50) NOT NULL UNIQUE,
    cash_bank_id UUID NOT NULL REFERENCES cash_bank_accounts(id),
    period VARCHAR(7) NOT NULL,
    base_snapshot_id UUID NOT NULL REFERENCES reconciliation_snapshots(id),
    comparison_snapshot_id UUID NOT NULL REFERENCES reconciliation_snapshots(id),
    reconciliation_date TIMESTAMPTZ NOT NULL,
    reconciliation_by UUID NOT NULL,
    base_balance NUMERIC(20, 2) NOT NULL,
    current_balance NUMERIC(20, 2) NOT NULL,
    variance NUMERIC(20, 2) NOT NULL,
    base_transaction_count INTEGER NOT NULL,
    current_transaction_count INTEGER NOT NULL,
    transaction_variance INTEGER NOT NULL,
    missing_transactions INTEGER NOT NULL DEFAULT 0,
    added_transactions INTEGER NOT NULL DEFAULT 0,
    modified_transactions INTEGER NOT NULL DEFAULT 0,
    status reconciliation_status NOT NULL DEFAULT 'PENDING',
    reviewed_by UUID,
    reviewed_at TIMESTAMPTZ,
    review_notes TEXT,
    is_balanced BOOLEAN NOT NULL DEFAULT false,
    balance_confirmed BOOLEAN NOT NULL DEFAULT false,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_bank_reconciliations_account
    ON bank_reconciliations(cash_bank_id, created_at DESC);

CREATE TABLE reconciliation_differences (
    id UUID PRIMARY KEY,
    reconciliation_id UUID NOT NULL REFERENCES bank_reconciliations(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    difference_type difference_type NOT NULL,
    severity severity_level NOT NULL,
    base_transaction_id UUID,
    current_transaction_id UUID,
    field VARCHAR(50),
    old_value TEXT,
    new_value TEXT,
    amount_difference NUMERIC(20, 2) NOT NULL DEFAULT 0,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (reconciliation_id, position)
);
";

const AUDIT_TRAIL_SQL: &str = r"
CREATE TABLE cash_bank_audit_trail (
    id UUID PRIMARY KEY,
    cash_bank_id UUID NOT NULL REFERENCES cash_bank_accounts(id),
    transaction_id UUID,
    action VARCHAR(50) NOT NULL,
    entity_type VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    field_changed VARCHAR(100),
    old_value TEXT,
    new_value TEXT,
    reason TEXT,
    user_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_cash_bank_audit_trail_account
    ON cash_bank_audit_trail(cash_bank_id, created_at DESC);

-- Append-only: corrections are new rows, never edits
CREATE OR REPLACE FUNCTION prevent_audit_trail_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'cash_bank_audit_trail is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_cash_bank_audit_trail_immutable
    BEFORE UPDATE OR DELETE ON cash_bank_audit_trail
    FOR EACH ROW EXECUTE FUNCTION prevent_audit_trail_mutation();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_cash_bank_audit_trail_immutable ON cash_bank_audit_trail;
DROP FUNCTION IF EXISTS prevent_audit_trail_mutation();
DROP TABLE IF EXISTS cash_bank_audit_trail;
DROP TABLE IF EXISTS reconciliation_differences;
DROP TABLE IF EXISTS bank_reconciliations;
DROP TABLE IF EXISTS reconciliation_transaction_snapshots;
DROP TABLE IF EXISTS reconciliation_snapshots;
DROP TYPE IF EXISTS severity_level;
DROP TYPE IF EXISTS difference_type;
DROP TYPE IF EXISTS reconciliation_status;
DROP TYPE IF EXISTS snapshot_status;
";
