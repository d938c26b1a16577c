use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Balances, EntryKind, ParseStatusError};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FundingApplication {
    pub id: Uuid,
    pub rff_number: String,
    pub client_name: String,
    pub client_contact: String,
    pub loan_facility_number: String,
    pub loan_amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub bim_interest: BigDecimal,
    pub bsf_interest: BigDecimal,
    pub settlement_date: NaiveDate,
    pub off_taker: String,
    pub off_taker_sector: String,
    pub priority: String,
    pub submitted_by: String,
    pub approval_status: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub is_funded: bool,
    pub is_settled: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a new application after validation and interest splitting.
#[derive(Debug, Clone)]
pub struct NewFundingApplication {
    pub id: Uuid,
    pub client_name: String,
    pub client_contact: String,
    pub loan_facility_number: String,
    pub loan_amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub bim_interest: BigDecimal,
    pub bsf_interest: BigDecimal,
    pub settlement_date: NaiveDate,
    pub off_taker: String,
    pub off_taker_sector: String,
    pub priority: String,
    pub submitted_by: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub id_number: String,
    pub date_of_birth: NaiveDate,
    pub phone_number: String,
    pub physical_address: String,
    pub postal_address: Option<String>,
    pub occupation: String,
    pub employer: Option<String>,
    pub source_of_funds: String,
    pub risk_appetite: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvestorAccount {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub account_name: String,
    pub account_number: String,
    pub total_invested: BigDecimal,
    pub total_withdrawn: BigDecimal,
    pub total_interest: BigDecimal,
    pub total_fees: BigDecimal,
    pub current_balance: BigDecimal,
    pub total_realised_interest: BigDecimal,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvestorAccount {
    pub fn balances(&self) -> Balances {
        Balances {
            total_invested: self.total_invested.clone(),
            total_withdrawn: self.total_withdrawn.clone(),
            total_interest: self.total_interest.clone(),
            total_fees: self.total_fees.clone(),
            current_balance: self.current_balance.clone(),
        }
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub amount: BigDecimal,
    pub balance_after: BigDecimal,
    pub source_type: String,
    pub source_id: Uuid,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}

impl Transaction {
    pub fn entry_kind(&self) -> Result<EntryKind, ParseStatusError> {
        self.kind.parse()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DepositRequest {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: BigDecimal,
    pub reference: Option<String>,
    pub status: String,
    pub requested_by: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub withdrawal_number: String,
    pub account_id: Uuid,
    pub amount: BigDecimal,
    pub urgency: String,
    pub status: String,
    pub requested_by: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One investor account's share of an RFF disbursement.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FundingAllocation {
    pub id: Uuid,
    pub rff_id: Uuid,
    pub account_id: Uuid,
    pub amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub id: Uuid,
    pub kind: String,
    pub rff_id: Option<Uuid>,
    pub withdrawal_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub priority: String,
    pub status: String,
    pub proof_reference: Option<String>,
    pub processed_by: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ManagementFee {
    pub id: Uuid,
    pub account_id: Uuid,
    pub month: String,
    pub base_amount: BigDecimal,
    pub fee_rate: BigDecimal,
    pub fee_amount: BigDecimal,
    pub transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: String,
    pub action: String,
    pub old_val: Option<serde_json::Value>,
    pub new_val: Option<serde_json::Value>,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}
