//! Behavioural coverage for the withdrawal ledger service.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::rstest;
use uuid::Uuid;

use crate::domain::ports::{
    LedgerRepositoryError, MockLedgerNotifier, MockLedgerRepository, NoopNotifier,
    NotifierError, RequestWithdrawal, WithdrawalCommand, WithdrawalFilter, WithdrawalQuery,
};
use crate::domain::{
    Amount, ErrorCode, PayoutDetails, WithdrawalLedgerService, WithdrawalStatus,
};
use crate::outbound::persistence::InMemoryLedgerRepository;

const MINIMUM_WITHDRAWAL: i64 = 5_000;

fn amount(value: i64) -> Amount {
    Amount::new(value).expect("valid amount")
}

fn service(
    repo: Arc<InMemoryLedgerRepository>,
) -> WithdrawalLedgerService<InMemoryLedgerRepository, NoopNotifier> {
    service_with_minimum(repo, MINIMUM_WITHDRAWAL)
}

fn service_with_minimum(
    repo: Arc<InMemoryLedgerRepository>,
    minimum: i64,
) -> WithdrawalLedgerService<InMemoryLedgerRepository, NoopNotifier> {
    WithdrawalLedgerService::new(
        repo,
        Arc::new(NoopNotifier),
        Arc::new(DefaultClock),
        amount(minimum),
    )
}

async fn seed_accruals(repo: &InMemoryLedgerRepository, author: Uuid, amounts: &[i64]) {
    for &value in amounts {
        repo.record_accrual(author, None, amount(value))
            .await
            .expect("accrual seeded");
    }
}

fn cash_request(author: Uuid, value: i64) -> RequestWithdrawal {
    RequestWithdrawal {
        author_id: author,
        amount: amount(value),
        details: PayoutDetails::Cash,
        notes: None,
    }
}

#[rstest]
#[tokio::test]
async fn happy_path_request_approve_pay() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[10_000]).await;
    let ledger = service(Arc::clone(&repo));

    let created = ledger
        .request_withdrawal(cash_request(author, 6_000))
        .await
        .expect("request accepted");
    assert_eq!(created.status(), WithdrawalStatus::Pending);
    let after_request = ledger.available(author).await.expect("balance");
    assert_eq!(after_request.available, amount(4_000));

    let validator = Uuid::new_v4();
    let approved = ledger
        .approve(created.id(), validator, None)
        .await
        .expect("approval accepted");
    assert_eq!(approved.status(), WithdrawalStatus::Approved);
    assert_eq!(approved.validator_id(), Some(validator));
    // Approval keeps the reservation; available is unchanged.
    let after_approve = ledger.available(author).await.expect("balance");
    assert_eq!(after_approve.available, amount(4_000));

    let paid = ledger
        .mark_paid(created.id(), Some("paid via momo batch".into()))
        .await
        .expect("payout accepted");
    assert_eq!(paid.status(), WithdrawalStatus::Paid);
    assert!(paid.paid_at().is_some());

    // Whole-record consumption: the single 10 000 accrual covers the 6 000
    // payout and is marked paid in full.
    let accruals = repo.accruals_for(author).await;
    assert_eq!(accruals.len(), 1);
    assert!(accruals[0].is_paid());

    let breakdown = ledger.available(author).await.expect("balance");
    assert_eq!(breakdown.total_paid, amount(10_000));
    assert_eq!(breakdown.available, amount(4_000));
}

#[rstest]
#[tokio::test]
async fn rejection_releases_the_reservation() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[3_000 + MINIMUM_WITHDRAWAL]).await;
    let ledger = service(Arc::clone(&repo));

    let created = ledger
        .request_withdrawal(cash_request(author, MINIMUM_WITHDRAWAL))
        .await
        .expect("request accepted");
    let reserved = ledger.available(author).await.expect("balance");
    assert_eq!(reserved.available, amount(3_000));

    let rejected = ledger
        .reject(created.id(), Uuid::new_v4(), "duplicate".into(), None)
        .await
        .expect("rejection accepted");
    assert_eq!(rejected.status(), WithdrawalStatus::Rejected);
    assert_eq!(rejected.rejection_reason(), Some("duplicate"));

    let released = ledger.available(author).await.expect("balance");
    assert_eq!(released.available, amount(3_000 + MINIMUM_WITHDRAWAL));
}

#[rstest]
#[tokio::test]
async fn insufficient_balance_leaves_no_trace() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[6_000]).await;
    let ledger = service(Arc::clone(&repo));

    let err = ledger
        .request_withdrawal(cash_request(author, 7_500))
        .await
        .expect_err("overdraft refused");
    assert_eq!(err.code(), ErrorCode::InsufficientBalance);
    assert_eq!(
        err.details().and_then(|d| d.get("availableBalance")),
        Some(&serde_json::json!(6_000))
    );

    let listing = ledger
        .list_for_author(author, None)
        .await
        .expect("listing");
    assert!(listing.withdrawals.is_empty());
    assert_eq!(listing.balance.available, amount(6_000));
}

#[rstest]
#[tokio::test]
async fn amount_below_minimum_is_invalid_regardless_of_balance() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[100_000]).await;
    let ledger = service(Arc::clone(&repo));

    let err = ledger
        .request_withdrawal(cash_request(author, 4_000))
        .await
        .expect_err("below minimum refused");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("minimumWithdrawal")),
        Some(&serde_json::json!(MINIMUM_WITHDRAWAL))
    );
}

#[rstest]
#[tokio::test]
async fn missing_payout_fields_are_invalid() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[100_000]).await;
    let ledger = service(Arc::clone(&repo));

    let err = ledger
        .request_withdrawal(RequestWithdrawal {
            author_id: author,
            amount: amount(10_000),
            details: PayoutDetails::MobileMoney { msisdn: "  ".into() },
            notes: None,
        })
        .await
        .expect_err("blank msisdn refused");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("field")),
        Some(&serde_json::json!("mobileMoneyNumber"))
    );
}

#[rstest]
#[tokio::test]
async fn second_pending_request_conflicts() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[50_000]).await;
    let ledger = service(Arc::clone(&repo));

    ledger
        .request_withdrawal(cash_request(author, 10_000))
        .await
        .expect("first request accepted");
    let err = ledger
        .request_withdrawal(cash_request(author, 5_000))
        .await
        .expect_err("second pending refused");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_cannot_jointly_overdraw() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[5_000]).await;
    // Minimum below the contested amount so both requests reach the
    // balance check and race for the same funds.
    let ledger = Arc::new(service_with_minimum(Arc::clone(&repo), 1_000));

    let first = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.request_withdrawal(cash_request(author, 4_000)).await })
    };
    let second = {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.request_withdrawal(cash_request(author, 4_000)).await })
    };

    let outcomes = [
        first.await.expect("task completes"),
        second.await.expect("task completes"),
    ];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1, "exactly one request may win the balance");
    let failure = outcomes
        .iter()
        .find_map(|outcome| outcome.as_ref().err())
        .expect("one request fails");
    assert!(
        matches!(
            failure.code(),
            ErrorCode::InsufficientBalance | ErrorCode::Conflict
        ),
        "loser fails with a balance or conflict error, got {:?}",
        failure.code()
    );

    let breakdown = ledger.available(author).await.expect("balance");
    assert_eq!(breakdown.total_reserved, amount(4_000));
}

#[rstest]
#[tokio::test]
async fn fifo_settlement_consumes_oldest_accruals() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[1_000, 2_000, 1_500]).await;
    let ledger = service_with_minimum(Arc::clone(&repo), 1_000);

    let created = ledger
        .request_withdrawal(cash_request(author, 2_500))
        .await
        .expect("request accepted");
    ledger
        .approve(created.id(), Uuid::new_v4(), None)
        .await
        .expect("approval accepted");
    ledger
        .mark_paid(created.id(), None)
        .await
        .expect("payout accepted");

    let mut accruals = repo.accruals_for(author).await;
    accruals.sort_by_key(crate::domain::AccrualRecord::created_at);
    let paid_flags: Vec<bool> = accruals.iter().map(|r| r.is_paid()).collect();
    assert_eq!(paid_flags, vec![true, true, false]);
}

#[rstest]
#[tokio::test]
async fn mark_paid_twice_is_rejected_and_never_double_settles() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[6_000, 6_000]).await;
    let ledger = service(Arc::clone(&repo));

    let created = ledger
        .request_withdrawal(cash_request(author, 6_000))
        .await
        .expect("request accepted");
    ledger
        .approve(created.id(), Uuid::new_v4(), None)
        .await
        .expect("approval accepted");
    ledger
        .mark_paid(created.id(), None)
        .await
        .expect("first payout accepted");

    let err = ledger
        .mark_paid(created.id(), None)
        .await
        .expect_err("second payout refused");
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let accruals = repo.accruals_for(author).await;
    let paid_count = accruals.iter().filter(|r| r.is_paid()).count();
    assert_eq!(paid_count, 1, "settlement must not run twice");
}

#[rstest]
#[tokio::test]
async fn approving_a_rejected_request_is_invalid_state() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[20_000]).await;
    let ledger = service(Arc::clone(&repo));

    let created = ledger
        .request_withdrawal(cash_request(author, 10_000))
        .await
        .expect("request accepted");
    ledger
        .reject(created.id(), Uuid::new_v4(), "wrong account".into(), None)
        .await
        .expect("rejection accepted");

    let err = ledger
        .approve(created.id(), Uuid::new_v4(), None)
        .await
        .expect_err("terminal state refused");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn rejection_requires_a_reason() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let ledger = service(Arc::clone(&repo));

    let err = ledger
        .reject(Uuid::new_v4(), Uuid::new_v4(), "   ".into(), None)
        .await
        .expect_err("blank reason refused");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn unknown_withdrawal_is_not_found() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let ledger = service(Arc::clone(&repo));

    let err = ledger
        .approve(Uuid::new_v4(), Uuid::new_v4(), None)
        .await
        .expect_err("unknown id refused");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn admin_listing_tallies_statuses() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let ledger = service(Arc::clone(&repo));

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_accruals(&repo, alice, &[40_000]).await;
    seed_accruals(&repo, bob, &[40_000]).await;

    let kept = ledger
        .request_withdrawal(cash_request(alice, 10_000))
        .await
        .expect("request accepted");
    ledger
        .approve(kept.id(), Uuid::new_v4(), None)
        .await
        .expect("approval accepted");
    ledger
        .request_withdrawal(cash_request(bob, 8_000))
        .await
        .expect("request accepted");

    let review = ledger
        .list_all(WithdrawalFilter::default())
        .await
        .expect("review");
    assert_eq!(review.withdrawals.len(), 2);
    assert_eq!(review.counts.approved, 1);
    assert_eq!(review.counts.pending, 1);

    let only_pending = ledger
        .list_all(WithdrawalFilter {
            status: Some(WithdrawalStatus::Pending),
            ..WithdrawalFilter::default()
        })
        .await
        .expect("filtered review");
    assert_eq!(only_pending.withdrawals.len(), 1);
    assert_eq!(only_pending.withdrawals[0].author_id(), bob);
}

#[rstest]
#[tokio::test]
async fn notifier_failure_does_not_fail_the_operation() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    repo.record_accrual(author, None, amount(20_000))
        .await
        .expect("accrual seeded");

    let mut notifier = MockLedgerNotifier::new();
    notifier
        .expect_notify()
        .returning(|_| Err(NotifierError::delivery("sink offline")));
    let ledger = WithdrawalLedgerService::new(
        repo,
        Arc::new(notifier),
        Arc::new(DefaultClock),
        amount(MINIMUM_WITHDRAWAL),
    );

    let created = ledger
        .request_withdrawal(cash_request(author, 10_000))
        .await
        .expect("request accepted despite notifier outage");
    assert_eq!(created.status(), WithdrawalStatus::Pending);
}

#[rstest]
#[tokio::test]
async fn events_are_emitted_per_transition() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    repo.record_accrual(author, None, amount(20_000))
        .await
        .expect("accrual seeded");

    let mut notifier = MockLedgerNotifier::new();
    notifier
        .expect_notify()
        .withf(move |event| event.author_id == author)
        .times(3)
        .returning(|_| Ok(()));
    let ledger = WithdrawalLedgerService::new(
        repo,
        Arc::new(notifier),
        Arc::new(DefaultClock),
        amount(MINIMUM_WITHDRAWAL),
    );

    let created = ledger
        .request_withdrawal(cash_request(author, 10_000))
        .await
        .expect("request accepted");
    ledger
        .approve(created.id(), Uuid::new_v4(), None)
        .await
        .expect("approval accepted");
    ledger
        .mark_paid(created.id(), None)
        .await
        .expect("payout accepted");
}

#[rstest]
#[tokio::test]
async fn repository_outage_maps_to_service_unavailable() {
    let mut repo = MockLedgerRepository::new();
    repo.expect_load_author_ledger()
        .returning(|_| Err(LedgerRepositoryError::connection("pool exhausted")));
    let ledger = WithdrawalLedgerService::new(
        Arc::new(repo),
        Arc::new(NoopNotifier),
        Arc::new(DefaultClock),
        amount(MINIMUM_WITHDRAWAL),
    );

    let err = ledger
        .available(Uuid::new_v4())
        .await
        .expect_err("outage surfaced");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn settlement_shortfall_is_a_fatal_inconsistency() {
    let repo = Arc::new(InMemoryLedgerRepository::new());
    let author = Uuid::new_v4();
    seed_accruals(&repo, author, &[6_000, 6_000]).await;
    let ledger = service(Arc::clone(&repo));

    // Two sequential withdrawals against the same earnings: the first
    // settles and consumes both records outright (whole-record overshoot),
    // leaving nothing for the second even though it reserved correctly.
    let first = ledger
        .request_withdrawal(cash_request(author, 7_000))
        .await
        .expect("request accepted");
    ledger
        .approve(first.id(), Uuid::new_v4(), None)
        .await
        .expect("approval accepted");
    ledger
        .mark_paid(first.id(), None)
        .await
        .expect("payout accepted");

    let second = ledger
        .request_withdrawal(cash_request(author, 5_000))
        .await
        .expect("reservation still fits the arithmetic balance");
    ledger
        .approve(second.id(), Uuid::new_v4(), None)
        .await
        .expect("approval accepted");
    let err = ledger
        .mark_paid(second.id(), None)
        .await
        .expect_err("no unpaid accrual left to settle");
    assert_eq!(err.code(), ErrorCode::LedgerInconsistency);

    // The failed payout must not transition.
    let review = ledger
        .list_all(WithdrawalFilter {
            author_id: Some(author),
            ..WithdrawalFilter::default()
        })
        .await
        .expect("review");
    let stuck = review
        .withdrawals
        .iter()
        .find(|w| w.id() == second.id())
        .expect("second withdrawal listed");
    assert_eq!(stuck.status(), WithdrawalStatus::Approved);
}
