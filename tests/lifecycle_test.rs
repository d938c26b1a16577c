mod common;

use chrono::{Duration, Utc};
use common::*;
use fundops_core::domain::{EntryKind, Priority, ReviewDecision};
use fundops_core::error::AppError;
use fundops_core::services::applications::{NewApplication, Review};
use fundops_core::services::deposits::NewDeposit;
use fundops_core::services::payments::ProcessPayment;
use fundops_core::services::withdrawals::NewWithdrawal;
use fundops_core::services::{
    ApplicationService, DepositService, FeeService, InvestorService, LedgerService,
    PaymentService, SummaryService, WithdrawalService,
};

fn loan(facility: &str, amount: &str, days_to_settlement: i64) -> NewApplication {
    NewApplication {
        client_name: "Erongo Fisheries".to_string(),
        client_contact: "finance@erongo.example".to_string(),
        loan_facility_number: facility.to_string(),
        loan_amount: dec(amount),
        interest_rate: dec("10"),
        settlement_date: Utc::now().date_naive() + Duration::days(days_to_settlement),
        off_taker: "Walvis Cold Storage".to_string(),
        off_taker_sector: "Fishing".to_string(),
        priority: Priority::Medium,
    }
}

fn approve(expected_version: i32) -> Review {
    Review {
        expected_version,
        decision: ReviewDecision::Approve,
        reason: None,
    }
}

fn process(expected_version: i32) -> ProcessPayment {
    ProcessPayment {
        expected_version,
        proof_reference: Some("s3://proofs/pop-001.pdf".to_string()),
    }
}

#[tokio::test]
async fn deposit_then_withdrawal_leaves_difference() {
    let db = TestDb::start().await;
    let account = open_account(&db, "ana@fund.example").await;

    let deposit = fund_account(&db, account.id, "10000").await;
    assert_eq!(deposit.status, "approved");
    assert!(deposit.transaction_id.is_some());

    let withdrawals = WithdrawalService::new(db.pool.clone());
    let withdrawal = withdrawals
        .submit(
            &holder("ana@fund.example"),
            NewWithdrawal {
                account_id: account.id,
                amount: dec("2000"),
                urgency: Priority::High,
            },
        )
        .await
        .unwrap();
    assert!(withdrawal.withdrawal_number.starts_with("WD-"));

    let approval = withdrawals
        .approve(&admin(), withdrawal.id, withdrawal.version)
        .await
        .unwrap();
    assert_eq!(approval.withdrawal.status, "approved");
    assert_eq!(approval.notification.status, "pending");
    assert_eq!(approval.notification.priority, "high");

    // Approval alone moves no money.
    let investors = InvestorService::new(db.pool.clone());
    let before = investors.get_account(&admin(), account.id).await.unwrap();
    assert_eq!(before.current_balance, dec("10000"));

    let notification = PaymentService::new(db.pool.clone())
        .process(&officer(), approval.notification.id, process(approval.notification.version))
        .await
        .unwrap();
    assert_eq!(notification.status, "processed");
    assert_eq!(notification.processed_by.as_deref(), Some("payments@fund.example"));

    let after = investors.get_account(&admin(), account.id).await.unwrap();
    assert_eq!(after.current_balance, dec("8000"));
    assert_eq!(after.total_invested, dec("10000"));
    assert_eq!(after.total_withdrawn, dec("2000"));

    let processed = withdrawals.get(&admin(), withdrawal.id).await.unwrap();
    assert_eq!(processed.status, "processed");
    assert!(processed.transaction_id.is_some());

    let ledger = LedgerService::new(db.pool.clone());
    let entries = ledger.list_transactions(&admin(), account.id, 50, 0).await.unwrap();
    let kinds: Vec<EntryKind> = entries.iter().map(|e| e.entry_kind().unwrap()).collect();
    assert_eq!(kinds, vec![EntryKind::Funding, EntryKind::Withdrawal]);
    assert_eq!(entries[0].balance_after, dec("10000"));
    assert_eq!(entries[1].balance_after, dec("8000"));

    let check = ledger.verify_account(&admin(), account.id).await.unwrap();
    assert!(check.reconciliation.consistent);
    assert_eq!(check.reconciliation.entry_count, 2);
    assert_eq!(check.reconciliation.replayed.current_balance, dec("8000"));
}

#[tokio::test]
async fn second_approval_conflicts_without_second_entry() {
    let db = TestDb::start().await;
    let account = open_account(&db, "ben@fund.example").await;
    let deposit = submit_deposit(&db, account.id, "500.00").await;

    let deposits = DepositService::new(db.pool.clone());
    deposits.approve(&admin(), deposit.id, deposit.version).await.unwrap();

    let err = deposits
        .approve(&admin(), deposit.id, deposit.version)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(err.is_retryable());

    assert_eq!(db.transaction_count(account.id).await, 1);
    let account = InvestorService::new(db.pool.clone())
        .get_account(&admin(), account.id)
        .await
        .unwrap();
    assert_eq!(account.current_balance, dec("500"));
}

#[tokio::test]
async fn concurrent_approvals_apply_once() {
    let db = TestDb::start().await;
    let account = open_account(&db, "cara@fund.example").await;
    let deposit = submit_deposit(&db, account.id, "750.00").await;

    let first = DepositService::new(db.pool.clone());
    let second = DepositService::new(db.pool.clone());
    let admin_a = admin();
    let admin_b = admin();
    let (a, b) = tokio::join!(
        first.approve(&admin_a, deposit.id, deposit.version),
        second.approve(&admin_b, deposit.id, deposit.version),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(failure, AppError::Conflict(_)));

    assert_eq!(db.transaction_count(account.id).await, 1);
    let check = LedgerService::new(db.pool.clone())
        .verify_account(&admin(), account.id)
        .await
        .unwrap();
    assert!(check.reconciliation.consistent);
    assert_eq!(check.reconciliation.stored.current_balance, dec("750"));
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let db = TestDb::start().await;
    let account = open_account(&db, "dan@fund.example").await;
    let deposit = submit_deposit(&db, account.id, "100").await;

    let err = DepositService::new(db.pool.clone())
        .approve(&admin(), deposit.id, deposit.version + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let unchanged = DepositService::new(db.pool.clone())
        .get(&admin(), deposit.id)
        .await
        .unwrap();
    assert_eq!(unchanged.status, "pending");
    assert_eq!(db.transaction_count(account.id).await, 0);
}

#[tokio::test]
async fn withdrawal_exceeding_balance_at_processing_is_rejected() {
    let db = TestDb::start().await;
    let account = open_account(&db, "eli@fund.example").await;
    fund_account(&db, account.id, "1000").await;

    let withdrawals = WithdrawalService::new(db.pool.clone());
    let mut approvals = Vec::new();
    for amount in ["800", "500"] {
        let withdrawal = withdrawals
            .submit(
                &holder("eli@fund.example"),
                NewWithdrawal {
                    account_id: account.id,
                    amount: dec(amount),
                    urgency: Priority::Medium,
                },
            )
            .await
            .unwrap();
        approvals.push(
            withdrawals
                .approve(&admin(), withdrawal.id, withdrawal.version)
                .await
                .unwrap(),
        );
    }

    let payments = PaymentService::new(db.pool.clone());
    let first = &approvals[0].notification;
    payments.process(&officer(), first.id, process(first.version)).await.unwrap();

    let second = &approvals[1].notification;
    let err = payments
        .process(&officer(), second.id, process(second.version))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.to_string().contains("insufficient funds"));

    let notification = payments.get(&officer(), second.id).await.unwrap();
    assert_eq!(notification.status, "pending");
    assert_eq!(notification.version, second.version);
    let withdrawal = withdrawals.get(&admin(), approvals[1].withdrawal.id).await.unwrap();
    assert_eq!(withdrawal.status, "approved");
    assert!(withdrawal.transaction_id.is_none());

    assert_eq!(db.transaction_count(account.id).await, 2);
    let account = InvestorService::new(db.pool.clone())
        .get_account(&admin(), account.id)
        .await
        .unwrap();
    assert_eq!(account.current_balance, dec("200"));
}

#[tokio::test]
async fn withdrawal_above_balance_is_refused_at_submission() {
    let db = TestDb::start().await;
    let account = open_account(&db, "fay@fund.example").await;
    fund_account(&db, account.id, "100").await;

    let err = WithdrawalService::new(db.pool.clone())
        .submit(
            &holder("fay@fund.example"),
            NewWithdrawal {
                account_id: account.id,
                amount: dec("100.01"),
                urgency: Priority::Low,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn cancelled_withdrawal_moves_no_money() {
    let db = TestDb::start().await;
    let account = open_account(&db, "gus@fund.example").await;
    fund_account(&db, account.id, "300").await;

    let withdrawals = WithdrawalService::new(db.pool.clone());
    let withdrawal = withdrawals
        .submit(
            &holder("gus@fund.example"),
            NewWithdrawal {
                account_id: account.id,
                amount: dec("100"),
                urgency: Priority::Low,
            },
        )
        .await
        .unwrap();
    let approval = withdrawals
        .approve(&admin(), withdrawal.id, withdrawal.version)
        .await
        .unwrap();

    let cancelled = PaymentService::new(db.pool.clone())
        .cancel(&officer(), approval.notification.id, approval.notification.version)
        .await
        .unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let withdrawal = withdrawals.get(&admin(), withdrawal.id).await.unwrap();
    assert_eq!(withdrawal.status, "cancelled");
    assert_eq!(db.transaction_count(account.id).await, 1);
}

#[tokio::test]
async fn investor_cannot_review_requests() {
    let db = TestDb::start().await;
    let account = open_account(&db, "hal@fund.example").await;
    let deposit = submit_deposit(&db, account.id, "100").await;

    let err = DepositService::new(db.pool.clone())
        .approve(&holder("hal@fund.example"), deposit.id, deposit.version)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn funding_application_through_settlement() {
    let db = TestDb::start().await;
    let accounts = vec![
        open_account(&db, "one@fund.example").await,
        open_account(&db, "two@fund.example").await,
        open_account(&db, "three@fund.example").await,
    ];
    let account_ids: Vec<_> = accounts.iter().map(|a| a.id).collect();

    let applications = ApplicationService::new(db.pool.clone());
    let application = applications
        .submit(
            &originator(),
            NewApplication {
                client_name: "Kunene Farms".to_string(),
                client_contact: "+264 81 000 0000".to_string(),
                loan_facility_number: "LF-1001".to_string(),
                loan_amount: dec("100.00"),
                interest_rate: dec("12"),
                settlement_date: Utc::now().date_naive() + Duration::days(10),
                off_taker: "Namib Mills".to_string(),
                off_taker_sector: "Agriculture".to_string(),
                priority: Priority::High,
            },
        )
        .await
        .unwrap();
    assert!(application.rff_number.starts_with("RFF-"));
    assert_eq!(application.bim_interest, dec("6"));
    assert_eq!(application.bsf_interest, dec("6"));

    let err = applications
        .instruct_funding(&admin(), application.id, &account_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let application = applications
        .review(
            &committee(),
            application.id,
            Review {
                expected_version: application.version,
                decision: ReviewDecision::Approve,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(application.approval_status, "approved");
    assert_eq!(application.reviewed_by.as_deref(), Some("ic@fund.example"));

    let instruction = applications
        .instruct_funding(&admin(), application.id, &account_ids)
        .await
        .unwrap();
    let amounts: Vec<_> = instruction.allocations.iter().map(|a| a.amount.clone()).collect();
    assert_eq!(amounts, vec![dec("33.34"), dec("33.33"), dec("33.33")]);
    assert!(instruction.allocations.iter().all(|a| a.interest_rate == dec("2")));
    assert_eq!(instruction.notification.kind, "rff_funding");
    assert_eq!(instruction.notification.amount, dec("100"));
    assert_eq!(instruction.notification.priority, "high");

    let err = applications
        .instruct_funding(&admin(), application.id, &account_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    PaymentService::new(db.pool.clone())
        .process(
            &officer(),
            instruction.notification.id,
            process(instruction.notification.version),
        )
        .await
        .unwrap();

    let funded = applications.get(&admin(), application.id).await.unwrap();
    assert!(funded.is_funded);
    let allocations = applications.allocations(&admin(), application.id).await.unwrap();
    assert!(allocations.iter().all(|a| a.status == "disbursed"));

    let summaries = SummaryService::new(db.pool.clone());
    let summary = summaries.portfolio(&committee()).await.unwrap();
    assert_eq!(summary.applications.funded, 1);
    assert_eq!(summary.upcoming_settlements.len(), 1);
    assert_eq!(summary.upcoming_settlements[0].id, application.id);
    assert!(summary.overdue_settlements.is_empty());

    // Once the settlement date has passed it is overdue, not upcoming.
    let later = Utc::now().date_naive() + Duration::days(11);
    let summary = summaries.portfolio_as_of(&committee(), later).await.unwrap();
    assert!(summary.upcoming_settlements.is_empty());
    assert_eq!(summary.overdue_settlements.len(), 1);
    assert_eq!(summary.overdue_settlements[0].id, application.id);

    let err = summaries.portfolio(&holder("one@fund.example")).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let settlement = applications
        .settle(&admin(), application.id, funded.version)
        .await
        .unwrap();
    assert!(settlement.application.is_settled);
    assert_eq!(settlement.interest_entries.len(), 3);
    assert!(settlement.allocations.iter().all(|a| a.status == "settled"));

    let investors = InvestorService::new(db.pool.clone());
    let ledger = LedgerService::new(db.pool.clone());
    for account in &accounts {
        let account = investors.get_account(&admin(), account.id).await.unwrap();
        assert_eq!(account.total_interest, dec("0.67"));
        assert_eq!(account.current_balance, dec("0.67"));
        assert_eq!(account.total_realised_interest, dec("2"));
        let check = ledger.verify_account(&admin(), account.id).await.unwrap();
        assert!(check.reconciliation.consistent);
    }

    let err = applications
        .settle(&admin(), application.id, settlement.application.version)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn declining_an_application_requires_a_reason() {
    let db = TestDb::start().await;
    let applications = ApplicationService::new(db.pool.clone());
    let application = applications
        .submit(
            &originator(),
            NewApplication {
                client_name: "Oshana Traders".to_string(),
                client_contact: "ops@oshana.example".to_string(),
                loan_facility_number: "LF-2002".to_string(),
                loan_amount: dec("5000"),
                interest_rate: dec("9"),
                settlement_date: Utc::now().date_naive() + Duration::days(90),
                off_taker: "Coastal Retail".to_string(),
                off_taker_sector: "Retail".to_string(),
                priority: Priority::Low,
            },
        )
        .await
        .unwrap();

    let err = applications
        .review(
            &committee(),
            application.id,
            Review {
                expected_version: application.version,
                decision: ReviewDecision::Decline,
                reason: Some("  ".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let declined = applications
        .review(
            &committee(),
            application.id,
            Review {
                expected_version: application.version,
                decision: ReviewDecision::Decline,
                reason: Some("Off-taker concentration".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(declined.approval_status, "declined");
    assert_eq!(declined.decline_reason.as_deref(), Some("Off-taker concentration"));
}

#[tokio::test]
async fn management_fees_are_charged_once_per_month() {
    let db = TestDb::start().await;
    let account = open_account(&db, "ivy@fund.example").await;
    fund_account(&db, account.id, "1234.56").await;
    let idle = open_account(&db, "jon@fund.example").await;

    let fees = FeeService::new(db.pool.clone(), dec("1"));
    let charged = fees.assess(&admin(), "2026-01").await.unwrap();
    assert_eq!(charged.len(), 1);
    assert_eq!(charged[0].account_id, account.id);
    assert_eq!(charged[0].fee_amount, dec("12.35"));
    assert_eq!(charged[0].base_amount, dec("1234.56"));

    let again = fees.assess(&admin(), "2026-01").await.unwrap();
    assert!(again.is_empty());

    let investors = InvestorService::new(db.pool.clone());
    let charged_account = investors.get_account(&admin(), account.id).await.unwrap();
    assert_eq!(charged_account.current_balance, dec("1222.21"));
    assert_eq!(charged_account.total_fees, dec("12.35"));
    let idle_account = investors.get_account(&admin(), idle.id).await.unwrap();
    assert_eq!(idle_account.current_balance, dec("0"));

    assert_eq!(fees.list(&admin(), Some("2026-01"), None).await.unwrap().len(), 1);
    let own = fees.list(&holder("ivy@fund.example"), None, None).await.unwrap();
    assert_eq!(own.len(), 1);
    assert!(fees
        .list(&holder("jon@fund.example"), None, None)
        .await
        .unwrap()
        .is_empty());
    assert!(LedgerService::new(db.pool.clone())
        .verify_account(&admin(), account.id)
        .await
        .unwrap()
        .reconciliation
        .consistent);

    let err = fees.assess(&admin(), "2026-13").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn investors_cannot_touch_another_investors_account() {
    let db = TestDb::start().await;
    let victim = open_account(&db, "victim@fund.example").await;
    let attacker_account = open_account(&db, "attacker@fund.example").await;
    fund_account(&db, victim.id, "5000.00").await;
    let attacker = holder("attacker@fund.example");
    let owner = holder("victim@fund.example");

    let withdrawals = WithdrawalService::new(db.pool.clone());
    let err = withdrawals
        .submit(
            &attacker,
            NewWithdrawal {
                account_id: victim.id,
                amount: dec("4000.00"),
                urgency: Priority::High,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let deposits = DepositService::new(db.pool.clone());
    let err = deposits
        .submit(
            &attacker,
            NewDeposit {
                account_id: victim.id,
                amount: dec("10.00"),
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let investors = InvestorService::new(db.pool.clone());
    let err = investors.get_account(&attacker, victim.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = investors.get(&attacker, victim.profile_id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let profiles = investors.list(&attacker, 50, 0).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, attacker_account.profile_id);

    let err = LedgerService::new(db.pool.clone())
        .list_transactions(&attacker, victim.id, 50, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    assert!(deposits.list(&attacker, None, None, 50, 0).await.unwrap().is_empty());
    let leaked = deposits
        .list(&attacker, None, Some(victim.id), 50, 0)
        .await
        .unwrap();
    assert!(leaked.is_empty());
    assert_eq!(deposits.list(&owner, None, None, 50, 0).await.unwrap().len(), 1);
    assert!(withdrawals.list(&attacker, None, None, 50, 0).await.unwrap().is_empty());

    let own = withdrawals
        .submit(
            &owner,
            NewWithdrawal {
                account_id: victim.id,
                amount: dec("4000.00"),
                urgency: Priority::High,
            },
        )
        .await
        .unwrap();
    let err = withdrawals.get(&attacker, own.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(withdrawals.get(&owner, own.id).await.unwrap().id, own.id);

    let account = investors.get_account(&owner, victim.id).await.unwrap();
    assert_eq!(account.current_balance, dec("5000.00"));
}

#[tokio::test]
async fn amounts_too_large_for_storage_are_validation_errors() {
    let db = TestDb::start().await;
    let account = open_account(&db, "whale@fund.example").await;
    let deposits = DepositService::new(db.pool.clone());

    let err = deposits
        .submit(
            &admin(),
            NewDeposit {
                account_id: account.id,
                amount: dec("1000000000000000000000.00"),
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The largest storable amount is accepted; a further credit overflows the balance column.
    fund_account(&db, account.id, "999999999999999999.99").await;
    let deposit = submit_deposit(&db, account.id, "1.00").await;
    let err = deposits
        .approve(&admin(), deposit.id, deposit.version)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let account = InvestorService::new(db.pool.clone())
        .get_account(&admin(), account.id)
        .await
        .unwrap();
    assert_eq!(account.current_balance, dec("999999999999999999.99"));
    assert_eq!(db.transaction_count(account.id).await, 1);

    let overflow = sqlx::query("SELECT 1e30::numeric(20, 2)")
        .execute(&db.pool)
        .await
        .unwrap_err();
    assert!(matches!(AppError::from(overflow), AppError::Validation(_)));
}

#[tokio::test]
async fn cancelled_funding_can_be_instructed_again() {
    let db = TestDb::start().await;
    let first = open_account(&db, "ana@fund.example").await;
    let second = open_account(&db, "ben@fund.example").await;
    let account_ids = vec![first.id, second.id];

    let applications = ApplicationService::new(db.pool.clone());
    let application = applications
        .submit(&originator(), loan("LF-3003", "1000.00", 60))
        .await
        .unwrap();

    let err = applications
        .instruct_funding(&admin(), application.id, &account_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let application = applications
        .review(&committee(), application.id, approve(application.version))
        .await
        .unwrap();

    let err = applications
        .instruct_funding(&admin(), application.id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = applications
        .instruct_funding(&admin(), application.id, &[first.id, first.id])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = applications
        .instruct_funding(&admin(), application.id, &[first.id, uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(applications
        .allocations(&admin(), application.id)
        .await
        .unwrap()
        .is_empty());

    let payments = PaymentService::new(db.pool.clone());
    let instruction = applications
        .instruct_funding(&admin(), application.id, &account_ids)
        .await
        .unwrap();
    let cancelled = payments
        .cancel(&officer(), instruction.notification.id, instruction.notification.version)
        .await
        .unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let allocations = applications.allocations(&admin(), application.id).await.unwrap();
    assert_eq!(allocations.len(), 2);
    assert!(allocations.iter().all(|a| a.status == "cancelled"));
    assert!(!applications.get(&admin(), application.id).await.unwrap().is_funded);

    let retry = applications
        .instruct_funding(&admin(), application.id, &account_ids)
        .await
        .unwrap();
    assert_ne!(retry.notification.id, instruction.notification.id);
    payments
        .process(&officer(), retry.notification.id, process(retry.notification.version))
        .await
        .unwrap();

    let funded = applications.get(&admin(), application.id).await.unwrap();
    assert!(funded.is_funded);
    let allocations = applications.allocations(&admin(), application.id).await.unwrap();
    let disbursed = allocations.iter().filter(|a| a.status == "disbursed").count();
    let released = allocations.iter().filter(|a| a.status == "cancelled").count();
    assert_eq!((disbursed, released), (2, 2));

    let settlement = applications
        .settle(&admin(), application.id, funded.version)
        .await
        .unwrap();
    assert_eq!(settlement.interest_entries.len(), 2);
    for account_id in &account_ids {
        assert_eq!(db.transaction_count(*account_id).await, 1);
    }
}
