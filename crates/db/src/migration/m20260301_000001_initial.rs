//! Initial database migration.
//!
//! Creates the enums, tables, uniqueness keys and the `updated_at` trigger
//! used by every engine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS AND FUNCTIONS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(FUNCTIONS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS AND THE TRANSACTION LOG
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(INVESTMENTS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(BUDGETS_SQL).await?;

        // ============================================================
        // PART 3: GOALS
        // ============================================================
        db.execute_unprepared(GOALS_SQL).await?;
        db.execute_unprepared(GOAL_CONTRIBUTIONS_SQL).await?;

        // ============================================================
        // PART 4: CREDIT CARDS
        // ============================================================
        db.execute_unprepared(CREDIT_CARDS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(CREDIT_CARD_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: RECURRING AND MOVEMENT JOURNAL
        // ============================================================
        db.execute_unprepared(RECURRING_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(MOVEMENT_INTENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

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
CREATE TYPE account_type AS ENUM (
    'checking',
    'savings',
    'cash',
    'investment',
    'credit_card',
    'other'
);

CREATE TYPE transaction_type AS ENUM ('RECEIPT', 'EXPENSE', 'INVESTMENT', 'WITHDRAW');

CREATE TYPE goal_status AS ENUM ('ACTIVE', 'COMPLETED');

CREATE TYPE contribution_type AS ENUM ('DEPOSIT', 'WITHDRAW');

CREATE TYPE investment_type AS ENUM (
    'fixed_income',
    'stocks',
    'funds',
    'real_estate',
    'crypto',
    'other'
);

CREATE TYPE invoice_status AS ENUM ('OPEN', 'CLOSED', 'PARTIAL', 'PAID', 'OVERDUE');

CREATE TYPE recurring_frequency AS ENUM ('DAILY', 'WEEKLY', 'MONTHLY', 'YEARLY');

CREATE TYPE movement_kind AS ENUM (
    'transaction_create',
    'transaction_delete',
    'goal_contribution',
    'goal_withdrawal',
    'investment_create',
    'investment_contribution',
    'investment_withdrawal',
    'card_create',
    'card_charge',
    'invoice_payment'
);

CREATE TYPE movement_status AS ENUM ('PENDING', 'COMPLETED', 'COMPENSATED', 'FAILED');
";

const FUNCTIONS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    include_in_total BOOLEAN NOT NULL DEFAULT true,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Only card shadow accounts may go negative
    CONSTRAINT chk_accounts_balance
        CHECK (account_type = 'credit_card' OR balance >= 0)
);

CREATE INDEX idx_accounts_user ON accounts(user_id);
";

const INVESTMENTS_SQL: &str = r"
CREATE TABLE investments (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    investment_type investment_type NOT NULL,
    current_balance NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (current_balance >= 0),
    return_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    return_rate NUMERIC(12, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_investments_user ON investments(user_id);
";

// category_id has no foreign key: default categories are content-addressed
// ids without rows.
const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    transaction_type transaction_type NOT NULL,
    category_id UUID NOT NULL,
    investment_id UUID REFERENCES investments(id),
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    date DATE NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_transactions_investment_leg CHECK (
        transaction_type IN ('RECEIPT', 'EXPENSE') OR investment_id IS NOT NULL
    )
);

CREATE INDEX idx_transactions_user_date ON transactions(user_id, date DESC);
CREATE INDEX idx_transactions_investment ON transactions(investment_id)
    WHERE investment_id IS NOT NULL;
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id UUID NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    year INTEGER NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    spent NUMERIC(19, 4) NOT NULL DEFAULT 0,
    alert_at NUMERIC(7, 2) NOT NULL DEFAULT 80 CHECK (alert_at BETWEEN 0 AND 100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_budgets_period UNIQUE (user_id, category_id, month, year)
);
";

const GOALS_SQL: &str = r"
CREATE TABLE goals (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    target_amount NUMERIC(19, 4) NOT NULL CHECK (target_amount > 0),
    current_amount NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (current_amount >= 0),
    status goal_status NOT NULL DEFAULT 'ACTIVE',
    ended_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_goals_ended_at CHECK ((status = 'COMPLETED') = (ended_at IS NOT NULL))
);

CREATE INDEX idx_goals_user ON goals(user_id);
";

const GOAL_CONTRIBUTIONS_SQL: &str = r"
CREATE TABLE goal_contributions (
    id UUID PRIMARY KEY,
    goal_id UUID NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    contribution_type contribution_type NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_goal_contributions_goal ON goal_contributions(goal_id, created_at DESC);
";

// account_id has no foreign key: deleting a card removes its shadow account
// before the card row.
const CREDIT_CARDS_SQL: &str = r"
CREATE TABLE credit_cards (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    credit_limit NUMERIC(19, 4) NOT NULL CHECK (credit_limit > 0),
    available_limit NUMERIC(19, 4) NOT NULL,
    closing_day INTEGER NOT NULL CHECK (closing_day BETWEEN 1 AND 31),
    due_day INTEGER NOT NULL CHECK (due_day BETWEEN 1 AND 31),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_credit_cards_account UNIQUE (account_id),
    CONSTRAINT chk_credit_cards_limit
        CHECK (available_limit >= 0 AND available_limit <= credit_limit)
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    credit_card_id UUID NOT NULL REFERENCES credit_cards(id) ON DELETE CASCADE,
    reference_month INTEGER NOT NULL CHECK (reference_month BETWEEN 1 AND 12),
    reference_year INTEGER NOT NULL,
    opening_date DATE NOT NULL,
    closing_date DATE NOT NULL,
    due_date DATE NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    paid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (paid_amount >= 0),
    status invoice_status NOT NULL DEFAULT 'OPEN',
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_invoices_period UNIQUE (credit_card_id, reference_month, reference_year)
);
";

const CREDIT_CARD_TRANSACTIONS_SQL: &str = r"
CREATE TABLE credit_card_transactions (
    id UUID PRIMARY KEY,
    credit_card_id UUID NOT NULL REFERENCES credit_cards(id) ON DELETE CASCADE,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id UUID NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    date DATE NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_credit_card_transactions_invoice ON credit_card_transactions(invoice_id);
";

// day_of_week counts from Sunday = 0.
const RECURRING_TRANSACTIONS_SQL: &str = r"
CREATE TABLE recurring_transactions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    transaction_type transaction_type NOT NULL
        CHECK (transaction_type IN ('RECEIPT', 'EXPENSE')),
    category_id UUID NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    description TEXT,
    frequency recurring_frequency NOT NULL,
    day_of_month INTEGER CHECK (day_of_month BETWEEN 1 AND 31),
    day_of_week SMALLINT CHECK (day_of_week BETWEEN 0 AND 6),
    start_date DATE NOT NULL,
    end_date DATE,
    last_processed DATE,
    next_due DATE NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_recurring_end_date CHECK (end_date IS NULL OR end_date >= start_date)
);

CREATE INDEX idx_recurring_due ON recurring_transactions(next_due) WHERE is_active = true;
";

const MOVEMENT_INTENTS_SQL: &str = r"
CREATE TABLE movement_intents (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind movement_kind NOT NULL,
    status movement_status NOT NULL DEFAULT 'PENDING',
    in_flight_step VARCHAR(100),
    compensations JSONB NOT NULL DEFAULT '[]'::jsonb,
    error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_movement_intents_pending ON movement_intents(created_at)
    WHERE status = 'PENDING';
";

const TRIGGERS_SQL: &str = r"
CREATE TRIGGER trg_accounts_updated_at BEFORE UPDATE ON accounts
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_investments_updated_at BEFORE UPDATE ON investments
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_budgets_updated_at BEFORE UPDATE ON budgets
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_goals_updated_at BEFORE UPDATE ON goals
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_credit_cards_updated_at BEFORE UPDATE ON credit_cards
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_invoices_updated_at BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_recurring_transactions_updated_at BEFORE UPDATE ON recurring_transactions
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_movement_intents_updated_at BEFORE UPDATE ON movement_intents
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS movement_intents CASCADE;
DROP TABLE IF EXISTS recurring_transactions CASCADE;
DROP TABLE IF EXISTS credit_card_transactions CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS credit_cards CASCADE;
DROP TABLE IF EXISTS goal_contributions CASCADE;
DROP TABLE IF EXISTS goals CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS investments CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;

DROP TYPE IF EXISTS movement_status;
DROP TYPE IF EXISTS movement_kind;
DROP TYPE IF EXISTS recurring_frequency;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS investment_type;
DROP TYPE IF EXISTS contribution_type;
DROP TYPE IF EXISTS goal_status;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS account_type;
";
