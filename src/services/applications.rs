use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_APPLICATION, ENTITY_NOTIFICATION};
use crate::db::models::{
    FundingAllocation, FundingApplication, NewFundingApplication, PaymentNotification, Transaction,
};
use crate::db::queries;
use crate::domain::money::{allocate_evenly, interest_on, rate_per_account, split_interest};
use crate::domain::{
    Actor, AllocationStatus, EntryKind, NotificationKind, Permission, Priority, RequestStatus,
    ReviewDecision,
};
use crate::error::AppError;
use crate::services::ledger::{post_entry, Posting};
use crate::services::{authorize, stale, to_json};
use crate::validation::{
    clean_optional_text, clean_text, validate_money, validate_not_past, validate_rate,
    ValidationError, CONTACT_MAX_LEN, NAME_MAX_LEN, REASON_MAX_LEN, REFERENCE_MAX_LEN,
};

const SUBJECT: &str = "Funding application";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewApplication {
    pub client_name: String,
    pub client_contact: String,
    pub loan_facility_number: String,
    pub loan_amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub settlement_date: NaiveDate,
    pub off_taker: String,
    pub off_taker_sector: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Review {
    pub expected_version: i32,
    pub decision: ReviewDecision,
    pub reason: Option<String>,
}

/// Result of instructing funding: the allocations and the notification that
/// the payment officer must process to disburse them.
#[derive(Debug, Clone, Serialize)]
pub struct FundingInstruction {
    pub application: FundingApplication,
    pub allocations: Vec<FundingAllocation>,
    pub notification: PaymentNotification,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub application: FundingApplication,
    pub allocations: Vec<FundingAllocation>,
    pub interest_entries: Vec<Transaction>,
}

pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(
        &self,
        actor: &Actor,
        input: NewApplication,
    ) -> Result<FundingApplication, AppError> {
        authorize(actor, Permission::SubmitApplication)?;
        let new = Self::validate(input, actor, Utc::now().date_naive())?;

        let mut tx = self.pool.begin().await?;
        let application = queries::insert_application(&mut *tx, &new).await?;
        AuditLog::log_creation(
            &mut tx,
            application.id,
            ENTITY_APPLICATION,
            to_json(&application)?,
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            rff_number = %application.rff_number,
            actor = %actor.email,
            "funding application submitted"
        );
        Ok(application)
    }

    fn validate(
        input: NewApplication,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<NewFundingApplication, ValidationError> {
        validate_money("loan_amount", &input.loan_amount)?;
        validate_rate("interest_rate", &input.interest_rate)?;
        validate_not_past("settlement_date", input.settlement_date, today)?;
        let split = split_interest(&input.interest_rate);

        Ok(NewFundingApplication {
            id: Uuid::new_v4(),
            client_name: clean_text("client_name", &input.client_name, NAME_MAX_LEN)?,
            client_contact: clean_text("client_contact", &input.client_contact, CONTACT_MAX_LEN)?,
            loan_facility_number: clean_text(
                "loan_facility_number",
                &input.loan_facility_number,
                REFERENCE_MAX_LEN,
            )?,
            loan_amount: input.loan_amount,
            interest_rate: input.interest_rate,
            bim_interest: split.bim_interest,
            bsf_interest: split.bsf_interest,
            settlement_date: input.settlement_date,
            off_taker: clean_text("off_taker", &input.off_taker, NAME_MAX_LEN)?,
            off_taker_sector: clean_text(
                "off_taker_sector",
                &input.off_taker_sector,
                NAME_MAX_LEN,
            )?,
            priority: input.priority.as_str().to_string(),
            submitted_by: actor.email.clone(),
        })
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<FundingApplication, AppError> {
        authorize(actor, Permission::ViewFund)?;
        queries::get_application(&self.pool, id)
            .await
            .map_err(AppError::not_found(SUBJECT, id))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FundingApplication>, AppError> {
        authorize(actor, Permission::ViewFund)?;
        let status = status.map(|s| s.as_str());
        Ok(queries::list_applications(&self.pool, status, limit, offset).await?)
    }

    /// Moves a pending application to approved or declined.
    pub async fn review(
        &self,
        actor: &Actor,
        id: Uuid,
        review: Review,
    ) -> Result<FundingApplication, AppError> {
        authorize(actor, Permission::ReviewApplication)?;

        let reason = match review.decision {
            ReviewDecision::Approve => None,
            ReviewDecision::Decline => Some(clean_text(
                "reason",
                review.reason.as_deref().unwrap_or_default(),
                REASON_MAX_LEN,
            )?),
        };
        let target = review.decision.target();

        let mut tx = self.pool.begin().await?;
        let updated = queries::review_application(
            &mut *tx,
            id,
            review.expected_version,
            target.as_str(),
            &actor.email,
            reason.as_deref(),
        )
        .await?;

        let application = match updated {
            Some(application) => application,
            None => {
                let current = queries::get_application(&mut *tx, id)
                    .await
                    .map_err(AppError::not_found(SUBJECT, id))?;
                return Err(stale(
                    SUBJECT,
                    id,
                    &current.approval_status,
                    current.version,
                    RequestStatus::Pending.as_str(),
                    Some(review.expected_version),
                ));
            }
        };

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_APPLICATION,
            RequestStatus::Pending.as_str(),
            target.as_str(),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %id,
            from = RequestStatus::Pending.as_str(),
            to = target.as_str(),
            actor = %actor.email,
            "funding application reviewed"
        );
        Ok(application)
    }

    /// Splits an approved application's loan across investor accounts and
    /// raises the disbursement notification.
    pub async fn instruct_funding(
        &self,
        actor: &Actor,
        id: Uuid,
        account_ids: &[Uuid],
    ) -> Result<FundingInstruction, AppError> {
        authorize(actor, Permission::InstructFunding)?;

        if account_ids.is_empty() {
            return Err(ValidationError::new("account_ids", "select at least one account").into());
        }
        let unique: HashSet<&Uuid> = account_ids.iter().collect();
        if unique.len() != account_ids.len() {
            return Err(ValidationError::new("account_ids", "contains duplicate accounts").into());
        }

        let mut tx = self.pool.begin().await?;
        let application = queries::lock_application(&mut *tx, id)
            .await
            .map_err(AppError::not_found(SUBJECT, id))?;

        if application.approval_status != RequestStatus::Approved.as_str() {
            return Err(AppError::Validation(format!(
                "{} {} is {}, only approved applications can be funded",
                SUBJECT, id, application.approval_status
            )));
        }
        if application.is_funded {
            return Err(AppError::Conflict(format!("{} {} is already funded", SUBJECT, id)));
        }
        if queries::count_active_allocations(&mut *tx, id).await? > 0 {
            return Err(AppError::Conflict(format!(
                "funding for {} {} has already been instructed",
                SUBJECT, id
            )));
        }

        let accounts = queries::list_accounts_by_ids(&mut *tx, account_ids).await?;
        if let Some(missing) = account_ids
            .iter()
            .find(|wanted| !accounts.iter().any(|account| account.id == **wanted))
        {
            return Err(AppError::NotFound(format!("Investor account {} not found", missing)));
        }

        let amounts = allocate_evenly(&application.loan_amount, account_ids.len());
        let rate = rate_per_account(&application.bim_interest, account_ids.len());

        let mut allocations = Vec::with_capacity(account_ids.len());
        for (account_id, amount) in account_ids.iter().zip(amounts.iter()) {
            let allocation =
                queries::insert_allocation(&mut *tx, id, *account_id, amount, &rate).await?;
            allocations.push(allocation);
        }

        let notification = queries::insert_notification(
            &mut *tx,
            NotificationKind::RffFunding.as_str(),
            Some(id),
            None,
            &application.loan_amount,
            &application.priority,
        )
        .await?;

        AuditLog::log_creation(
            &mut tx,
            notification.id,
            ENTITY_NOTIFICATION,
            to_json(&notification)?,
            &actor.email,
        )
        .await?;
        AuditLog::log_field_update(
            &mut tx,
            id,
            ENTITY_APPLICATION,
            "allocations",
            serde_json::Value::Null,
            to_json(&allocations)?,
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %id,
            notification_id = %notification.id,
            accounts = allocations.len(),
            actor = %actor.email,
            "funding instructed"
        );

        Ok(FundingInstruction {
            application,
            allocations,
            notification,
        })
    }

    /// Marks a funded application settled and credits each funding account
    /// with the interest its allocation earned.
    pub async fn settle(
        &self,
        actor: &Actor,
        id: Uuid,
        expected_version: i32,
    ) -> Result<Settlement, AppError> {
        authorize(actor, Permission::SettleApplication)?;

        let mut tx = self.pool.begin().await?;
        let updated = queries::mark_application_settled(&mut *tx, id, expected_version).await?;

        let application = match updated {
            Some(application) => application,
            None => {
                let current = queries::get_application(&mut *tx, id)
                    .await
                    .map_err(AppError::not_found(SUBJECT, id))?;
                if !current.is_funded {
                    return Err(AppError::Validation(format!(
                        "{} {} has not been funded",
                        SUBJECT, id
                    )));
                }
                if current.is_settled {
                    return Err(AppError::Conflict(format!(
                        "{} {} is already settled",
                        SUBJECT, id
                    )));
                }
                return Err(stale(
                    SUBJECT,
                    id,
                    "funded",
                    current.version,
                    "funded",
                    Some(expected_version),
                ));
            }
        };

        let allocations = queries::transition_allocations(
            &mut *tx,
            id,
            AllocationStatus::Disbursed.as_str(),
            AllocationStatus::Settled.as_str(),
        )
        .await?;

        let mut interest_entries = Vec::with_capacity(allocations.len());
        for allocation in &allocations {
            let interest = interest_on(&allocation.amount, &allocation.interest_rate);
            if interest > BigDecimal::zero() {
                let (_, entry) = post_entry(
                    &mut tx,
                    &Posting {
                        account_id: allocation.account_id,
                        kind: EntryKind::Interest,
                        amount: &interest,
                        source_type: "rff_funding",
                        source_id: allocation.id,
                    },
                    actor,
                )
                .await?;
                interest_entries.push(entry);
            }
            queries::add_realised_interest(
                &mut *tx,
                allocation.account_id,
                &allocation.interest_rate,
            )
            .await?;
        }

        AuditLog::log_transition(&mut tx, id, ENTITY_APPLICATION, "funded", "settled", &actor.email)
            .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %id,
            allocations = allocations.len(),
            actor = %actor.email,
            "funding application settled"
        );

        Ok(Settlement {
            application,
            allocations,
            interest_entries,
        })
    }

    pub async fn allocations(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Vec<FundingAllocation>, AppError> {
        self.get(actor, id).await?;
        Ok(queries::list_allocations(&self.pool, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use std::str::FromStr;

    fn input() -> NewApplication {
        NewApplication {
            client_name: "  Kunene Farms  ".to_string(),
            client_contact: "+264 81 000 0000".to_string(),
            loan_facility_number: "LF-1001".to_string(),
            loan_amount: BigDecimal::from(250_000),
            interest_rate: BigDecimal::from(12),
            settlement_date: NaiveDate::from_ymd_opt(2030, 6, 30).unwrap(),
            off_taker: "Namib Mills".to_string(),
            off_taker_sector: "Agriculture".to_string(),
            priority: Priority::High,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    #[test]
    fn validate_splits_interest_and_trims_names() {
        let actor = Actor::new("bsf@example.com", Role::Bsf);
        let new = ApplicationService::validate(input(), &actor, today()).unwrap();

        assert_eq!(new.client_name, "Kunene Farms");
        assert_eq!(new.bim_interest, BigDecimal::from(6));
        assert_eq!(new.bsf_interest, BigDecimal::from(6));
        assert_eq!(new.priority, "high");
        assert_eq!(new.submitted_by, "bsf@example.com");
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let actor = Actor::new("bsf@example.com", Role::Bsf);

        let mut bad = input();
        bad.loan_amount = BigDecimal::from(0);
        assert_eq!(
            ApplicationService::validate(bad, &actor, today()).unwrap_err().field,
            "loan_amount"
        );

        let mut bad = input();
        bad.interest_rate = BigDecimal::from_str("100.5").unwrap();
        assert_eq!(
            ApplicationService::validate(bad, &actor, today()).unwrap_err().field,
            "interest_rate"
        );

        let mut bad = input();
        bad.settlement_date = NaiveDate::from_ymd_opt(2029, 12, 31).unwrap();
        assert_eq!(
            ApplicationService::validate(bad, &actor, today()).unwrap_err().field,
            "settlement_date"
        );

        let mut bad = input();
        bad.off_taker = "   ".to_string();
        assert_eq!(
            ApplicationService::validate(bad, &actor, today()).unwrap_err().field,
            "off_taker"
        );
    }

    #[test]
    fn review_body_rejects_unknown_fields() {
        let parsed: Result<Review, _> = serde_json::from_str(
            r#"{"expected_version": 1, "decision": "approve", "status": "approved"}"#,
        );
        assert!(parsed.is_err());

        let body = r#"{"expected_version": 3, "decision": "decline", "reason": "risk"}"#;
        let parsed: Review = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.decision, ReviewDecision::Decline);
    }
}
