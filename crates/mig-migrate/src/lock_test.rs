use super::*;
use std::time::Duration;

#[tokio::test]
async fn test_same_target_serializes() {
    let guard = acquire("lock-test:a").await;
    let waiter = tokio::spawn(async { acquire("lock-test:a").await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    let second = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .unwrap()
        .unwrap();
    drop(second);
}

#[tokio::test]
async fn test_different_targets_do_not_block() {
    let _a = acquire("lock-test:b").await;
    let b = tokio::time::timeout(Duration::from_secs(1), acquire("lock-test:c")).await;
    assert!(b.is_ok());
}

#[test]
fn test_same_identity_same_lock() {
    assert!(Arc::ptr_eq(&lock_for("lock-test:d"), &lock_for("lock-test:d")));
    assert!(!Arc::ptr_eq(&lock_for("lock-test:d"), &lock_for("lock-test:e")));
}
