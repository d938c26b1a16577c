use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool, Result};
use uuid::Uuid;

use crate::db::models::{
    DepositRequest, FundingAllocation, FundingApplication, InvestorAccount, InvestorProfile,
    ManagementFee, NewFundingApplication, PaymentNotification, Transaction, WithdrawalRequest,
};
use crate::domain::EntryKind;

// --- Funding Application Queries ---

pub async fn insert_application<'e, E: PgExecutor<'e>>(
    executor: E,
    app: &NewFundingApplication,
) -> Result<FundingApplication> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        INSERT INTO rff_applications (
            id, client_name, client_contact, loan_facility_number, loan_amount,
            interest_rate, bim_interest, bsf_interest, settlement_date,
            off_taker, off_taker_sector, priority, submitted_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(app.id)
    .bind(&app.client_name)
    .bind(&app.client_contact)
    .bind(&app.loan_facility_number)
    .bind(&app.loan_amount)
    .bind(&app.interest_rate)
    .bind(&app.bim_interest)
    .bind(&app.bsf_interest)
    .bind(app.settlement_date)
    .bind(&app.off_taker)
    .bind(&app.off_taker_sector)
    .bind(&app.priority)
    .bind(&app.submitted_by)
    .fetch_one(executor)
    .await
}

pub async fn get_application<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<FundingApplication> {
    sqlx::query_as::<_, FundingApplication>("SELECT * FROM rff_applications WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await
}

pub async fn lock_application<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<FundingApplication> {
    sqlx::query_as::<_, FundingApplication>(
        "SELECT * FROM rff_applications WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn list_applications(
    pool: &PgPool,
    approval_status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<FundingApplication>> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        SELECT * FROM rff_applications
        WHERE ($1::text IS NULL OR approval_status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(approval_status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Moves a pending application to `approval_status`. Returns `None` when the
/// row is no longer pending at `expected_version`.
pub async fn review_application<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    expected_version: i32,
    approval_status: &str,
    reviewed_by: &str,
    decline_reason: Option<&str>,
) -> Result<Option<FundingApplication>> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        UPDATE rff_applications
        SET approval_status = $3, reviewed_by = $4, reviewed_at = NOW(), decline_reason = $5,
            version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2 AND approval_status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(expected_version)
    .bind(approval_status)
    .bind(reviewed_by)
    .bind(decline_reason)
    .fetch_optional(executor)
    .await
}

pub async fn mark_application_funded<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<FundingApplication>> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        UPDATE rff_applications
        SET is_funded = TRUE, version = version + 1, updated_at = NOW()
        WHERE id = $1 AND approval_status = 'approved' AND NOT is_funded
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn mark_application_settled<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    expected_version: i32,
) -> Result<Option<FundingApplication>> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        UPDATE rff_applications
        SET is_settled = TRUE, version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2 AND is_funded AND NOT is_settled
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(expected_version)
    .fetch_optional(executor)
    .await
}

/// Approved, funded, unsettled applications due on or before `until`.
/// Funded, unsettled applications due between `from` and `until` inclusive.
pub async fn list_upcoming_settlements(
    pool: &PgPool,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<FundingApplication>> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        SELECT * FROM rff_applications
        WHERE approval_status = 'approved' AND is_funded AND NOT is_settled
        AND settlement_date BETWEEN $1 AND $2
        ORDER BY settlement_date ASC
        "#,
    )
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

pub async fn list_overdue_settlements(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<Vec<FundingApplication>> {
    sqlx::query_as::<_, FundingApplication>(
        r#"
        SELECT * FROM rff_applications
        WHERE approval_status = 'approved' AND is_funded AND NOT is_settled
        AND settlement_date < $1
        ORDER BY settlement_date ASC
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await
}

// --- Investor Queries ---

pub async fn insert_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    profile: &InvestorProfile,
) -> Result<InvestorProfile> {
    sqlx::query_as::<_, InvestorProfile>(
        r#"
        INSERT INTO investor_profiles (
            id, email, full_name, id_number, date_of_birth, phone_number,
            physical_address, postal_address, occupation, employer,
            source_of_funds, risk_appetite, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(profile.id)
    .bind(&profile.email)
    .bind(&profile.full_name)
    .bind(&profile.id_number)
    .bind(profile.date_of_birth)
    .bind(&profile.phone_number)
    .bind(&profile.physical_address)
    .bind(&profile.postal_address)
    .bind(&profile.occupation)
    .bind(&profile.employer)
    .bind(&profile.source_of_funds)
    .bind(&profile.risk_appetite)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .fetch_one(executor)
    .await
}

pub async fn get_profile<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<InvestorProfile> {
    sqlx::query_as::<_, InvestorProfile>("SELECT * FROM investor_profiles WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await
}

/// `owner_email` restricts the listing to the profile with that email.
pub async fn list_profiles(
    pool: &PgPool,
    owner_email: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<InvestorProfile>> {
    sqlx::query_as::<_, InvestorProfile>(
        r#"
        SELECT * FROM investor_profiles
        WHERE ($1::text IS NULL OR email = $1)
        ORDER BY full_name ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner_email)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

// --- Account Queries ---

pub async fn insert_account<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    profile_id: Uuid,
    account_name: &str,
) -> Result<InvestorAccount> {
    sqlx::query_as::<_, InvestorAccount>(
        r#"
        INSERT INTO investor_accounts (id, profile_id, account_name)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(profile_id)
    .bind(account_name)
    .fetch_one(executor)
    .await
}

pub async fn get_account<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<InvestorAccount> {
    sqlx::query_as::<_, InvestorAccount>("SELECT * FROM investor_accounts WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await
}

/// Email of the profile holding an account.
pub async fn account_owner_email<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
) -> Result<String> {
    sqlx::query_scalar(
        r#"
        SELECT p.email FROM investor_accounts a
        JOIN investor_profiles p ON p.id = a.profile_id
        WHERE a.id = $1
        "#,
    )
    .bind(account_id)
    .fetch_one(executor)
    .await
}

pub async fn lock_account<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<InvestorAccount> {
    sqlx::query_as::<_, InvestorAccount>("SELECT * FROM investor_accounts WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_one(executor)
        .await
}

pub async fn list_accounts_for_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<InvestorAccount>> {
    sqlx::query_as::<_, InvestorAccount>(
        "SELECT * FROM investor_accounts WHERE profile_id = $1 ORDER BY created_at ASC",
    )
    .bind(profile_id)
    .fetch_all(executor)
    .await
}

pub async fn list_accounts_by_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> Result<Vec<InvestorAccount>> {
    sqlx::query_as::<_, InvestorAccount>("SELECT * FROM investor_accounts WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub async fn list_account_ids(pool: &PgPool) -> Result<Vec<Uuid>> {
    sqlx::query_scalar("SELECT id FROM investor_accounts ORDER BY created_at ASC")
        .fetch_all(pool)
        .await
}

/// Accounts with a positive balance that have no fee recorded for `month`.
pub async fn list_accounts_due_fee(pool: &PgPool, month: &str) -> Result<Vec<InvestorAccount>> {
    sqlx::query_as::<_, InvestorAccount>(
        r#"
        SELECT a.* FROM investor_accounts a
        WHERE a.current_balance > 0
        AND NOT EXISTS (
            SELECT 1 FROM management_fees f WHERE f.account_id = a.id AND f.month = $1
        )
        ORDER BY a.created_at ASC
        "#,
    )
    .bind(month)
    .fetch_all(pool)
    .await
}

/// Applies a ledger entry's effect to the account totals.
///
/// Debits only match while the balance covers them; `None` means the account
/// is missing or the debit would overdraw it.
pub async fn apply_entry_to_account<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
    kind: EntryKind,
    amount: &BigDecimal,
) -> Result<Option<InvestorAccount>> {
    sqlx::query_as::<_, InvestorAccount>(
        r#"
        UPDATE investor_accounts SET
            total_invested = total_invested + CASE WHEN $2 = 'funding' THEN $3 ELSE 0 END,
            total_withdrawn = total_withdrawn + CASE WHEN $2 = 'withdrawal' THEN $3 ELSE 0 END,
            total_interest = total_interest + CASE WHEN $2 = 'interest' THEN $3 ELSE 0 END,
            total_fees = total_fees + CASE WHEN $2 = 'fee' THEN $3 ELSE 0 END,
            current_balance = current_balance
                + CASE WHEN $2 IN ('funding', 'interest') THEN $3 ELSE -$3 END,
            version = version + 1,
            updated_at = NOW()
        WHERE id = $1 AND ($2 IN ('funding', 'interest') OR current_balance >= $3)
        RETURNING *
        "#,
    )
    .bind(account_id)
    .bind(kind.as_str())
    .bind(amount)
    .fetch_optional(executor)
    .await
}

pub async fn add_realised_interest<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
    rate: &BigDecimal,
) -> Result<InvestorAccount> {
    sqlx::query_as::<_, InvestorAccount>(
        r#"
        UPDATE investor_accounts
        SET total_realised_interest = total_realised_interest + $2,
            version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(account_id)
    .bind(rate)
    .fetch_one(executor)
    .await
}

// --- Ledger Queries ---

pub struct NewEntry<'a> {
    pub account_id: Uuid,
    pub kind: EntryKind,
    pub amount: &'a BigDecimal,
    pub balance_after: &'a BigDecimal,
    pub source_type: &'a str,
    pub source_id: Uuid,
    pub created_by: &'a str,
}

pub async fn insert_transaction<'e, E: PgExecutor<'e>>(
    executor: E,
    entry: &NewEntry<'_>,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, account_id, kind, amount, balance_after, source_type, source_id, created_by
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.account_id)
    .bind(entry.kind.as_str())
    .bind(entry.amount)
    .bind(entry.balance_after)
    .bind(entry.source_type)
    .bind(entry.source_id)
    .bind(entry.created_by)
    .fetch_one(executor)
    .await
}

pub async fn list_transactions(
    pool: &PgPool,
    account_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE account_id = $1 ORDER BY seq ASC LIMIT $2 OFFSET $3",
    )
    .bind(account_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Every entry of an account in creation order.
pub async fn account_ledger<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE account_id = $1 ORDER BY seq ASC",
    )
    .bind(account_id)
    .fetch_all(executor)
    .await
}

// --- Deposit Request Queries ---

pub async fn insert_deposit<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
    amount: &BigDecimal,
    reference: Option<&str>,
    requested_by: &str,
) -> Result<DepositRequest> {
    sqlx::query_as::<_, DepositRequest>(
        r#"
        INSERT INTO deposit_requests (id, account_id, amount, reference, requested_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(amount)
    .bind(reference)
    .bind(requested_by)
    .fetch_one(executor)
    .await
}

pub async fn get_deposit<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<DepositRequest> {
    sqlx::query_as::<_, DepositRequest>("SELECT * FROM deposit_requests WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await
}

pub async fn list_deposits(
    pool: &PgPool,
    status: Option<&str>,
    account_id: Option<Uuid>,
    owner_email: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<DepositRequest>> {
    sqlx::query_as::<_, DepositRequest>(
        r#"
        SELECT * FROM deposit_requests
        WHERE ($1::text IS NULL OR status = $1)
        AND ($2::uuid IS NULL OR account_id = $2)
        AND ($3::text IS NULL OR account_id IN (
            SELECT a.id FROM investor_accounts a
            JOIN investor_profiles p ON p.id = a.profile_id
            WHERE p.email = $3
        ))
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(status)
    .bind(account_id)
    .bind(owner_email)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Conditional status change for a deposit request.
pub async fn transition_deposit<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    expected_version: i32,
    from: &str,
    to: &str,
    reviewed_by: &str,
    decline_reason: Option<&str>,
) -> Result<Option<DepositRequest>> {
    sqlx::query_as::<_, DepositRequest>(
        r#"
        UPDATE deposit_requests
        SET status = $4, reviewed_by = $5, reviewed_at = NOW(), decline_reason = $6,
            version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(expected_version)
    .bind(from)
    .bind(to)
    .bind(reviewed_by)
    .bind(decline_reason)
    .fetch_optional(executor)
    .await
}

pub async fn link_deposit_transaction<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    transaction_id: Uuid,
) -> Result<DepositRequest> {
    sqlx::query_as::<_, DepositRequest>(
        "UPDATE deposit_requests SET transaction_id = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(transaction_id)
    .fetch_one(executor)
    .await
}

// --- Withdrawal Request Queries ---

pub async fn insert_withdrawal<'e, E: PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
    amount: &BigDecimal,
    urgency: &str,
    requested_by: &str,
) -> Result<WithdrawalRequest> {
    sqlx::query_as::<_, WithdrawalRequest>(
        r#"
        INSERT INTO withdrawal_requests (id, account_id, amount, urgency, requested_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(amount)
    .bind(urgency)
    .bind(requested_by)
    .fetch_one(executor)
    .await
}

pub async fn get_withdrawal<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<WithdrawalRequest> {
    sqlx::query_as::<_, WithdrawalRequest>("SELECT * FROM withdrawal_requests WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await
}

pub async fn list_withdrawals(
    pool: &PgPool,
    status: Option<&str>,
    account_id: Option<Uuid>,
    owner_email: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<WithdrawalRequest>> {
    sqlx::query_as::<_, WithdrawalRequest>(
        r#"
        SELECT * FROM withdrawal_requests
        WHERE ($1::text IS NULL OR status = $1)
        AND ($2::uuid IS NULL OR account_id = $2)
        AND ($3::text IS NULL OR account_id IN (
            SELECT a.id FROM investor_accounts a
            JOIN investor_profiles p ON p.id = a.profile_id
            WHERE p.email = $3
        ))
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(status)
    .bind(account_id)
    .bind(owner_email)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Conditional status change for a withdrawal. `expected_version` of `None`
/// skips the version check for moves driven by a claimed notification.
#[allow(clippy::too_many_arguments)]
pub async fn transition_withdrawal<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    expected_version: Option<i32>,
    from: &str,
    to: &str,
    actor: &str,
    decline_reason: Option<&str>,
) -> Result<Option<WithdrawalRequest>> {
    sqlx::query_as::<_, WithdrawalRequest>(
        r#"
        UPDATE withdrawal_requests
        SET status = $4,
            reviewed_by = CASE WHEN $3 = 'pending' THEN $5 ELSE reviewed_by END,
            reviewed_at = CASE WHEN $3 = 'pending' THEN NOW() ELSE reviewed_at END,
            decline_reason = COALESCE($6, decline_reason),
            version = version + 1, updated_at = NOW()
        WHERE id = $1 AND ($2::int IS NULL OR version = $2) AND status = $3
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(expected_version)
    .bind(from)
    .bind(to)
    .bind(actor)
    .bind(decline_reason)
    .fetch_optional(executor)
    .await
}

pub async fn link_withdrawal_transaction<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    transaction_id: Uuid,
) -> Result<WithdrawalRequest> {
    sqlx::query_as::<_, WithdrawalRequest>(
        "UPDATE withdrawal_requests SET transaction_id = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(transaction_id)
    .fetch_one(executor)
    .await
}

// --- Funding Allocation Queries ---

pub async fn insert_allocation<'e, E: PgExecutor<'e>>(
    executor: E,
    rff_id: Uuid,
    account_id: Uuid,
    amount: &BigDecimal,
    interest_rate: &BigDecimal,
) -> Result<FundingAllocation> {
    sqlx::query_as::<_, FundingAllocation>(
        r#"
        INSERT INTO rff_funding (id, rff_id, account_id, amount, interest_rate)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(rff_id)
    .bind(account_id)
    .bind(amount)
    .bind(interest_rate)
    .fetch_one(executor)
    .await
}

pub async fn list_allocations<'e, E: PgExecutor<'e>>(
    executor: E,
    rff_id: Uuid,
) -> Result<Vec<FundingAllocation>> {
    sqlx::query_as::<_, FundingAllocation>(
        "SELECT * FROM rff_funding WHERE rff_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(rff_id)
    .fetch_all(executor)
    .await
}

pub async fn count_active_allocations<'e, E: PgExecutor<'e>>(
    executor: E,
    rff_id: Uuid,
) -> Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM rff_funding
        WHERE rff_id = $1 AND status IN ('pending', 'disbursed', 'settled')
        "#,
    )
    .bind(rff_id)
    .fetch_one(executor)
    .await
}

/// Moves every allocation of an RFF from one status to another.
pub async fn transition_allocations<'e, E: PgExecutor<'e>>(
    executor: E,
    rff_id: Uuid,
    from: &str,
    to: &str,
) -> Result<Vec<FundingAllocation>> {
    sqlx::query_as::<_, FundingAllocation>(
        r#"
        UPDATE rff_funding SET status = $3, updated_at = NOW()
        WHERE rff_id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(rff_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}

// --- Payment Notification Queries ---

pub async fn insert_notification<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: &str,
    rff_id: Option<Uuid>,
    withdrawal_id: Option<Uuid>,
    amount: &BigDecimal,
    priority: &str,
) -> Result<PaymentNotification> {
    sqlx::query_as::<_, PaymentNotification>(
        r#"
        INSERT INTO payment_notifications (id, kind, rff_id, withdrawal_id, amount, priority)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(kind)
    .bind(rff_id)
    .bind(withdrawal_id)
    .bind(amount)
    .bind(priority)
    .fetch_one(executor)
    .await
}

pub async fn get_notification<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<PaymentNotification> {
    sqlx::query_as::<_, PaymentNotification>("SELECT * FROM payment_notifications WHERE id = $1")
        .bind(id)
        .fetch_one(executor)
        .await
}

pub async fn list_notifications(
    pool: &PgPool,
    status: Option<&str>,
    kind: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<PaymentNotification>> {
    sqlx::query_as::<_, PaymentNotification>(
        r#"
        SELECT * FROM payment_notifications
        WHERE ($1::text IS NULL OR status = $1)
        AND ($2::text IS NULL OR kind = $2)
        ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                 created_at ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(status)
    .bind(kind)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Closes a pending notification. `None` means it was no longer pending at
/// `expected_version`.
pub async fn close_notification<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    expected_version: i32,
    to: &str,
    actor: &str,
    proof_reference: Option<&str>,
) -> Result<Option<PaymentNotification>> {
    sqlx::query_as::<_, PaymentNotification>(
        r#"
        UPDATE payment_notifications
        SET status = $3, processed_by = $4, processed_at = NOW(), proof_reference = $5,
            version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(expected_version)
    .bind(to)
    .bind(actor)
    .bind(proof_reference)
    .fetch_optional(executor)
    .await
}

pub async fn count_notifications_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM payment_notifications GROUP BY status",
    )
    .fetch_all(pool)
    .await
}

// --- Management Fee Queries ---

/// Records a fee unless one exists for the account and month already.
#[allow(clippy::too_many_arguments)]
pub async fn insert_fee<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    account_id: Uuid,
    month: &str,
    base_amount: &BigDecimal,
    fee_rate: &BigDecimal,
    fee_amount: &BigDecimal,
    transaction_id: Uuid,
) -> Result<Option<ManagementFee>> {
    sqlx::query_as::<_, ManagementFee>(
        r#"
        INSERT INTO management_fees (
            id, account_id, month, base_amount, fee_rate, fee_amount, transaction_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (account_id, month) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(account_id)
    .bind(month)
    .bind(base_amount)
    .bind(fee_rate)
    .bind(fee_amount)
    .bind(transaction_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_fees(
    pool: &PgPool,
    month: Option<&str>,
    account_id: Option<Uuid>,
    owner_email: Option<&str>,
) -> Result<Vec<ManagementFee>> {
    sqlx::query_as::<_, ManagementFee>(
        r#"
        SELECT * FROM management_fees
        WHERE ($1::text IS NULL OR month = $1)
        AND ($2::uuid IS NULL OR account_id = $2)
        AND ($3::text IS NULL OR account_id IN (
            SELECT a.id FROM investor_accounts a
            JOIN investor_profiles p ON p.id = a.profile_id
            WHERE p.email = $3
        ))
        ORDER BY month DESC, created_at ASC
        "#,
    )
    .bind(month)
    .bind(account_id)
    .bind(owner_email)
    .fetch_all(pool)
    .await
}

// --- Summary Queries ---

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ApplicationCounts {
    pub pending: i64,
    pub approved: i64,
    pub declined: i64,
    pub funded: i64,
    pub settled: i64,
    pub loan_book: BigDecimal,
}

pub async fn application_counts(pool: &PgPool) -> Result<ApplicationCounts> {
    sqlx::query_as::<_, ApplicationCounts>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE approval_status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE approval_status = 'approved') AS approved,
            COUNT(*) FILTER (WHERE approval_status = 'declined') AS declined,
            COUNT(*) FILTER (WHERE is_funded) AS funded,
            COUNT(*) FILTER (WHERE is_settled) AS settled,
            COALESCE(SUM(loan_amount) FILTER (WHERE is_funded AND NOT is_settled), 0) AS loan_book
        FROM rff_applications
        "#,
    )
    .fetch_one(pool)
    .await
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct AccountTotals {
    pub accounts: i64,
    pub total_invested: BigDecimal,
    pub total_withdrawn: BigDecimal,
    pub current_balance: BigDecimal,
}

pub async fn account_totals(pool: &PgPool) -> Result<AccountTotals> {
    sqlx::query_as::<_, AccountTotals>(
        r#"
        SELECT
            COUNT(*) AS accounts,
            COALESCE(SUM(total_invested), 0) AS total_invested,
            COALESCE(SUM(total_withdrawn), 0) AS total_withdrawn,
            COALESCE(SUM(current_balance), 0) AS current_balance
        FROM investor_accounts
        "#,
    )
    .fetch_one(pool)
    .await
}
