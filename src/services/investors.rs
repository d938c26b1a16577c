use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_ACCOUNT, ENTITY_PROFILE};
use crate::db::models::{InvestorAccount, InvestorProfile};
use crate::db::queries;
use crate::domain::{Actor, Permission, RiskAppetite};
use crate::error::AppError;
use crate::services::{authorize, ensure_account_access, ensure_profile_access, to_json};
use crate::validation::{
    clean_optional_text, clean_text, validate_email, ValidationError, CONTACT_MAX_LEN,
    NAME_MAX_LEN, REFERENCE_MAX_LEN,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewInvestor {
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
    pub risk_appetite: RiskAppetite,
}

/// A profile with the accounts it owns.
#[derive(Debug, Clone, Serialize)]
pub struct InvestorDetail {
    #[serde(flatten)]
    pub profile: InvestorProfile,
    pub accounts: Vec<InvestorAccount>,
}

pub struct InvestorService {
    pool: PgPool,
}

impl InvestorService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: NewInvestor,
    ) -> Result<InvestorProfile, AppError> {
        authorize(actor, Permission::ManageInvestors)?;
        let profile = Self::validate(input, Utc::now().date_naive())?;

        let mut tx = self.pool.begin().await?;
        let profile = queries::insert_profile(&mut *tx, &profile).await?;
        // KYC identifiers stay out of the audit trail.
        AuditLog::log_creation(
            &mut tx,
            profile.id,
            ENTITY_PROFILE,
            json!({ "email": profile.email, "full_name": profile.full_name }),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(profile_id = %profile.id, actor = %actor.email, "investor profile created");
        Ok(profile)
    }

    fn validate(input: NewInvestor, today: NaiveDate) -> Result<InvestorProfile, ValidationError> {
        if input.date_of_birth >= today {
            return Err(ValidationError::new("date_of_birth", "must be in the past"));
        }

        let now = Utc::now();
        Ok(InvestorProfile {
            id: Uuid::new_v4(),
            email: validate_email(&input.email)?,
            full_name: clean_text("full_name", &input.full_name, NAME_MAX_LEN)?,
            id_number: clean_text("id_number", &input.id_number, REFERENCE_MAX_LEN)?,
            date_of_birth: input.date_of_birth,
            phone_number: clean_text("phone_number", &input.phone_number, CONTACT_MAX_LEN)?,
            physical_address: clean_text(
                "physical_address",
                &input.physical_address,
                REFERENCE_MAX_LEN,
            )?,
            postal_address: clean_optional_text(
                "postal_address",
                input.postal_address.as_deref(),
                REFERENCE_MAX_LEN,
            )?,
            occupation: clean_text("occupation", &input.occupation, NAME_MAX_LEN)?,
            employer: clean_optional_text("employer", input.employer.as_deref(), NAME_MAX_LEN)?,
            source_of_funds: clean_text("source_of_funds", &input.source_of_funds, NAME_MAX_LEN)?,
            risk_appetite: input.risk_appetite.as_str().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// An investor sees only their own profile.
    pub async fn list(
        &self,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvestorProfile>, AppError> {
        Ok(queries::list_profiles(&self.pool, actor.owner_scope(), limit, offset).await?)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<InvestorDetail, AppError> {
        let profile = queries::get_profile(&self.pool, id)
            .await
            .map_err(AppError::not_found("Investor profile", id))?;
        ensure_profile_access(actor, &profile)?;
        let accounts = queries::list_accounts_for_profile(&self.pool, id).await?;
        Ok(InvestorDetail { profile, accounts })
    }

    pub async fn open_account(
        &self,
        actor: &Actor,
        profile_id: Uuid,
        account_name: &str,
    ) -> Result<InvestorAccount, AppError> {
        authorize(actor, Permission::ManageInvestors)?;
        let account_name = clean_text("account_name", account_name, NAME_MAX_LEN)?;

        let mut tx = self.pool.begin().await?;
        queries::get_profile(&mut *tx, profile_id)
            .await
            .map_err(AppError::not_found("Investor profile", profile_id))?;
        let account =
            queries::insert_account(&mut *tx, Uuid::new_v4(), profile_id, &account_name).await?;
        AuditLog::log_creation(
            &mut tx,
            account.id,
            ENTITY_ACCOUNT,
            to_json(&account)?,
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            account_id = %account.id,
            account_number = %account.account_number,
            %profile_id,
            "investor account opened"
        );
        Ok(account)
    }

    pub async fn get_account(&self, actor: &Actor, id: Uuid) -> Result<InvestorAccount, AppError> {
        let account = queries::get_account(&self.pool, id)
            .await
            .map_err(AppError::not_found("Investor account", id))?;
        ensure_account_access(&self.pool, actor, id).await?;
        Ok(account)
    }
}
