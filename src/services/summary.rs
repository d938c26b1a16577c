use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::db::models::FundingApplication;
use crate::db::queries::{self, AccountTotals, ApplicationCounts};
use crate::domain::{Actor, Permission};
use crate::error::AppError;
use crate::services::{authorize, PaymentSummary};

/// Settlements falling due within this many days are listed as upcoming.
pub const UPCOMING_SETTLEMENT_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub applications: ApplicationCounts,
    pub accounts: AccountTotals,
    pub payments: PaymentSummary,
    pub upcoming_settlements: Vec<FundingApplication>,
    /// Funded applications past their settlement date.
    pub overdue_settlements: Vec<FundingApplication>,
}

pub struct SummaryService {
    pool: PgPool,
}

impl SummaryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn portfolio(&self, actor: &Actor) -> Result<PortfolioSummary, AppError> {
        self.portfolio_as_of(actor, Utc::now().date_naive()).await
    }

    pub async fn portfolio_as_of(
        &self,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<PortfolioSummary, AppError> {
        authorize(actor, Permission::ViewFund)?;
        let applications = queries::application_counts(&self.pool).await?;
        let accounts = queries::account_totals(&self.pool).await?;
        let counts = queries::count_notifications_by_status(&self.pool).await?;
        let payments = PaymentSummary::from_counts(&counts);
        let upcoming_settlements =
            queries::list_upcoming_settlements(&self.pool, today, upcoming_until(today)).await?;
        let overdue_settlements = queries::list_overdue_settlements(&self.pool, today).await?;

        Ok(PortfolioSummary {
            applications,
            accounts,
            payments,
            upcoming_settlements,
            overdue_settlements,
        })
    }
}

fn upcoming_until(today: NaiveDate) -> NaiveDate {
    today + Duration::days(UPCOMING_SETTLEMENT_DAYS)
}
