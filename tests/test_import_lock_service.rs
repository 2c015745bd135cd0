/// Import lock coordination: acquire, release, inspect and sweep behaviour.
///
/// Every scenario runs against both the in-memory store and the SQLite store
/// so the two backends stay interchangeable.
mod helpers;

use helpers::*;
use pantry::domain::ports::import_lock_repository::ImportLockRepository;
use pantry::infrastructure::persistence::InMemoryImportLockRepository;
use pantry::{AcquireOutcome, ImportLockService, LockStatus, ReleaseStatus};
use std::sync::Arc;

const TIMEOUT: i64 = 300_000;
const URL: &str = "https://x/r1";

fn service_with(
    repo: Arc<dyn ImportLockRepository>,
    clock: Arc<ManualTimeService>,
) -> ImportLockService {
    ImportLockService::with_timeout(repo, clock, TIMEOUT)
}

fn expect_granted(outcome: AcquireOutcome) -> String {
    match outcome {
        AcquireOutcome::Granted { lock_id } => lock_id,
        other => panic!("expected lock to be granted, got {:?}", other),
    }
}

// ===== Scenarios =====

async fn first_acquire_creates_pending_lock(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(5_000);
    let service = service_with(repo.clone(), clock);

    let lock_id = expect_granted(service.acquire(URL, "userA").await.unwrap());

    let lock = repo.find_by_url(URL).await.unwrap().expect("lock should exist");
    assert_eq!(lock.id, lock_id);
    assert_eq!(lock.owner_id, "userA");
    assert_eq!(lock.started_at, 5_000);
    assert_eq!(lock.status, LockStatus::Pending);
}

async fn live_lock_rejects_second_caller(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo.clone(), clock.clone());
    service.acquire(URL, "userA").await.unwrap();

    clock.set(1_000);
    let outcome = service.acquire(URL, "userB").await.unwrap();

    match outcome {
        AcquireOutcome::Rejected { holder } => {
            assert_eq!(holder.owner_id, "userA");
            assert_eq!(holder.started_at, 0);
        }
        other => panic!("expected IMPORT_IN_PROGRESS, got {:?}", other),
    }

    let lock = repo.find_by_url(URL).await.unwrap().unwrap();
    assert_eq!(lock.owner_id, "userA");
    assert_eq!(lock.started_at, 0);
    assert_eq!(lock.status, LockStatus::Pending);
}

async fn same_owner_is_rejected_while_holding(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo, clock);
    service.acquire(URL, "userA").await.unwrap();

    let outcome = service.acquire(URL, "userA").await.unwrap();
    assert!(!outcome.is_granted(), "double submit must not be granted");
}

async fn expired_lock_is_taken_over(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo.clone(), clock.clone());
    let first_id = expect_granted(service.acquire(URL, "userA").await.unwrap());

    clock.set(TIMEOUT + 10_000);
    let second_id = expect_granted(service.acquire(URL, "userC").await.unwrap());

    assert_eq!(first_id, second_id, "takeover keeps the record");
    let lock = repo.find_by_url(URL).await.unwrap().unwrap();
    assert_eq!(lock.owner_id, "userC");
    assert_eq!(lock.started_at, TIMEOUT + 10_000);
    assert_eq!(lock.status, LockStatus::Pending);
}

async fn finished_lock_is_reacquired_at_any_age(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo.clone(), clock.clone());

    service.acquire(URL, "userA").await.unwrap();
    service.release(URL, ReleaseStatus::Failed).await.unwrap();

    clock.set(10);
    expect_granted(service.acquire(URL, "userB").await.unwrap());

    let lock = repo.find_by_url(URL).await.unwrap().unwrap();
    assert_eq!(lock.owner_id, "userB");
    assert_eq!(lock.started_at, 10);
    assert_eq!(lock.status, LockStatus::Pending);
}

async fn release_keeps_owner_and_start(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(42);
    let service = service_with(repo.clone(), clock.clone());
    service.acquire(URL, "userA").await.unwrap();

    clock.set(900);
    service.release(URL, ReleaseStatus::Completed).await.unwrap();

    let lock = repo.find_by_url(URL).await.unwrap().unwrap();
    assert_eq!(lock.status, LockStatus::Completed);
    assert_eq!(lock.owner_id, "userA");
    assert_eq!(lock.started_at, 42);
}

async fn release_of_unknown_url_is_noop(repo: Arc<dyn ImportLockRepository>) {
    let service = service_with(repo.clone(), ManualTimeService::at(0));

    service
        .release("https://x/never-locked", ReleaseStatus::Completed)
        .await
        .expect("releasing a missing lock is not an error");

    assert!(repo.find_by_url("https://x/never-locked").await.unwrap().is_none());
}

async fn inspect_hides_expired_pending_lock(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo.clone(), clock.clone());
    service.acquire(URL, "userA").await.unwrap();

    assert!(service.inspect(URL).await.unwrap().is_some());

    clock.set(TIMEOUT);
    assert!(service.inspect(URL).await.unwrap().is_none());
    assert!(
        repo.find_by_url(URL).await.unwrap().is_some(),
        "record stays until a sweep runs"
    );
}

async fn inspect_reports_finished_locks(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo, clock.clone());
    service.acquire(URL, "userA").await.unwrap();
    service.release(URL, ReleaseStatus::Completed).await.unwrap();

    clock.set(TIMEOUT * 2);
    let lock = service.inspect(URL).await.unwrap().expect("finished lock is informational");
    assert_eq!(lock.status, LockStatus::Completed);

    assert!(service.inspect("https://x/unknown").await.unwrap().is_none());
}

async fn sweep_removes_only_old_records(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo.clone(), clock.clone());

    service.acquire("https://x/old-pending", "u").await.unwrap();
    service.acquire("https://x/old-done", "u").await.unwrap();
    service
        .release("https://x/old-done", ReleaseStatus::Completed)
        .await
        .unwrap();

    clock.set(50_000);
    service.acquire("https://x/fresh", "u").await.unwrap();

    clock.set(TIMEOUT + 1);
    let result = service.sweep_expired().await.unwrap();

    assert_eq!(result.deleted_count, 2);
    assert!(repo.find_by_url("https://x/old-pending").await.unwrap().is_none());
    assert!(repo.find_by_url("https://x/old-done").await.unwrap().is_none());
    assert!(repo.find_by_url("https://x/fresh").await.unwrap().is_some());

    let again = service.sweep_expired().await.unwrap();
    assert_eq!(again.deleted_count, 0);
}

/// Walks the documented timeline with a five minute timeout.
async fn documented_timeline(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo.clone(), clock.clone());

    // t=0: userA takes the lock
    expect_granted(service.acquire(URL, "userA").await.unwrap());

    // t=1000: userB is told an import is running
    clock.set(1_000);
    match service.acquire(URL, "userB").await.unwrap() {
        AcquireOutcome::Rejected { holder } => {
            assert_eq!(holder.owner_id, "userA");
            assert_eq!(holder.started_at, 0);
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    // t=1000: userA finishes
    service.release(URL, ReleaseStatus::Completed).await.unwrap();
    assert_eq!(
        repo.find_by_url(URL).await.unwrap().unwrap().status,
        LockStatus::Completed
    );

    // t=2000: userB may now import
    clock.set(2_000);
    expect_granted(service.acquire(URL, "userB").await.unwrap());
    let lock = repo.find_by_url(URL).await.unwrap().unwrap();
    assert_eq!((lock.owner_id.as_str(), lock.started_at), ("userB", 2_000));

    // t=310000: userB never released, userC takes over
    clock.set(310_000);
    expect_granted(service.acquire(URL, "userC").await.unwrap());
    let lock = repo.find_by_url(URL).await.unwrap().unwrap();
    assert_eq!((lock.owner_id.as_str(), lock.started_at), ("userC", 310_000));

    // t=320000: sweep cutoff is 20000, the fresh record survives
    clock.set(320_000);
    let result = service.sweep_expired().await.unwrap();
    assert_eq!(result.deleted_count, 0);
    assert!(repo.find_by_url(URL).await.unwrap().is_some());
}

async fn concurrent_acquire_grants_once(repo: Arc<dyn ImportLockRepository>) {
    let clock = ManualTimeService::at(0);
    let service = service_with(repo, clock);

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .acquire(URL, &format!("user-{}", i))
                .await
                .expect("acquire should not fail")
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap().is_granted() {
            granted += 1;
        }
    }
    assert_eq!(granted, 1, "exactly one caller may hold the lock");
}

// ===== In-memory store =====

fn memory_repo() -> Arc<dyn ImportLockRepository> {
    Arc::new(InMemoryImportLockRepository::new())
}

#[tokio::test]
async fn test_memory_first_acquire_creates_pending_lock() {
    first_acquire_creates_pending_lock(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_live_lock_rejects_second_caller() {
    live_lock_rejects_second_caller(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_same_owner_is_rejected_while_holding() {
    same_owner_is_rejected_while_holding(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_expired_lock_is_taken_over() {
    expired_lock_is_taken_over(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_finished_lock_is_reacquired() {
    finished_lock_is_reacquired_at_any_age(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_release_keeps_owner_and_start() {
    release_keeps_owner_and_start(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_release_of_unknown_url_is_noop() {
    release_of_unknown_url_is_noop(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_inspect_hides_expired_pending_lock() {
    inspect_hides_expired_pending_lock(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_inspect_reports_finished_locks() {
    inspect_reports_finished_locks(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_sweep_removes_only_old_records() {
    sweep_removes_only_old_records(memory_repo()).await;
}

#[tokio::test]
async fn test_memory_documented_timeline() {
    documented_timeline(memory_repo()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_concurrent_acquire_grants_once() {
    concurrent_acquire_grants_once(memory_repo()).await;
}

// ===== SQLite store =====

macro_rules! sqlite_test {
    ($name:ident, $scenario:ident) => {
        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        async fn $name() {
            let test_db = setup_test_db().await;
            let repo: Arc<dyn ImportLockRepository> = Arc::new(test_db.db().clone());
            $scenario(repo).await;
            teardown_test_db(test_db).await;
        }
    };
}

sqlite_test!(test_sqlite_first_acquire_creates_pending_lock, first_acquire_creates_pending_lock);
sqlite_test!(test_sqlite_live_lock_rejects_second_caller, live_lock_rejects_second_caller);
sqlite_test!(test_sqlite_same_owner_is_rejected_while_holding, same_owner_is_rejected_while_holding);
sqlite_test!(test_sqlite_expired_lock_is_taken_over, expired_lock_is_taken_over);
sqlite_test!(test_sqlite_finished_lock_is_reacquired, finished_lock_is_reacquired_at_any_age);
sqlite_test!(test_sqlite_release_keeps_owner_and_start, release_keeps_owner_and_start);
sqlite_test!(test_sqlite_release_of_unknown_url_is_noop, release_of_unknown_url_is_noop);
sqlite_test!(test_sqlite_inspect_hides_expired_pending_lock, inspect_hides_expired_pending_lock);
sqlite_test!(test_sqlite_inspect_reports_finished_locks, inspect_reports_finished_locks);
sqlite_test!(test_sqlite_sweep_removes_only_old_records, sweep_removes_only_old_records);
sqlite_test!(test_sqlite_documented_timeline, documented_timeline);
sqlite_test!(test_sqlite_concurrent_acquire_grants_once, concurrent_acquire_grants_once);
