//! Integration Tests for the Memo Wrappers
//!
//! Exercises the public API end to end: the square and failure scenarios,
//! forgetting, bounded caches, and the shared single-flight variant.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use memo_cache::demo::{failure_scenario, single_flight_scenario, square_scenario};
use memo_cache::{
    forget, memoize, spawn_cleanup_task, MemoConfig, MemoError, Memoized, SharedMemo,
};
use tokio_test::assert_ok;

// == Helper Functions ==

fn counted<K, V>(f: impl Fn(&K) -> V) -> (Rc<Cell<usize>>, impl FnMut(&K) -> V) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let wrapped = move |key: &K| {
        counter.set(counter.get() + 1);
        f(key)
    };
    (calls, wrapped)
}

// == Single-threaded Wrapper ==

#[test]
fn test_square_called_twice_evaluates_once() {
    let (calls, square) = counted(|x: &i64| x * x);
    let mut memo = memoize(square);

    assert_eq!(memo.call(3), 9);
    assert_eq!(calls.get(), 1);
    assert_eq!(memo.call(3), 9);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_repeated_sequence_evaluates_each_distinct_value_once() {
    let report = square_scenario("distinct", &[1, 1, 2, 1, 3, 2]);

    assert_eq!(report.calls, 6);
    assert_eq!(report.evaluations, 3);
    assert_eq!(report.stats.hits, 3);
    assert_eq!(report.stats.total_entries, 3);
}

#[test]
fn test_failing_input_is_evaluated_every_time() {
    let report = failure_scenario(2);

    assert_eq!(report.evaluations, 2);
    assert_eq!(report.stats.failures, 2);
    assert_eq!(report.stats.total_entries, 0);
}

#[test]
fn test_failure_surfaces_same_error_each_time() {
    let (calls, checked) = counted(|x: &i32| {
        if *x == -1 {
            Err("bad input")
        } else {
            Ok(x * 2)
        }
    });
    let mut memo = memoize(checked);

    assert_eq!(memo.try_call(-1), Err(MemoError::ComputationFailed("bad input")));
    assert_eq!(memo.try_call(-1), Err(MemoError::ComputationFailed("bad input")));
    assert_eq!(calls.get(), 2);

    assert_eq!(memo.try_call(5), Ok(10));
    assert_eq!(memo.try_call(5), Ok(10));
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_forget_then_recompute() {
    let (calls, square) = counted(|x: &u64| x * x);
    let mut memo = memoize(square);

    memo.call(4);
    forget(&mut memo);
    forget(&mut memo);
    assert!(!memo.has_cache(&4));

    assert_eq!(memo.call(4), 16);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_string_keys_and_values() {
    let mut shout = memoize(|s: &String| s.to_uppercase());

    assert_eq!(shout.call("memo".to_string()), "MEMO");
    assert!(shout.has_cache(&"memo".to_string()));
    assert_eq!(shout.stats().misses, 1);
}

#[test]
fn test_bounded_wrapper_never_exceeds_capacity() {
    let config = MemoConfig::default().with_max_entries(8);
    let mut memo = Memoized::with_config(|x: &u32| x.count_ones(), &config);

    for x in 0..100u32 {
        memo.call(x % 20);
        assert!(memo.len() <= 8);
    }
    assert!(memo.stats().evictions > 0);
}

// == Shared Wrapper ==

#[tokio::test]
async fn test_single_flight_scenario() {
    let memo = Arc::new(SharedMemo::new());
    let report = single_flight_scenario(memo, 8).await;

    assert_eq!(report.calls, 8);
    assert_eq!(report.evaluations, 1);
    assert_eq!(report.stats.total_entries, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_keys_proceed_independently() {
    let memo = Arc::new(SharedMemo::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..20u64)
        .map(|i| {
            let memo = Arc::clone(&memo);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                memo.get_or_compute(i % 4, |k| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let k = *k;
                    async move {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        k + 100
                    }
                })
                .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(assert_ok!(handle.await), i as u64 % 4 + 100);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(memo.len().await, 4);
}

#[tokio::test]
async fn test_shared_failure_then_success() {
    let memo: SharedMemo<&'static str, usize> = SharedMemo::new();

    let failed = memo
        .get_or_try_compute("key", |_| async { Err::<usize, _>("unavailable") })
        .await;
    assert_eq!(failed, Err(MemoError::ComputationFailed("unavailable")));
    assert!(!memo.has_cache(&"key").await);

    let value = memo
        .get_or_try_compute("key", |k| {
            let len = k.len();
            async move { Ok::<_, &str>(len) }
        })
        .await;
    assert_eq!(value, Ok(3));
    assert!(memo.has_cache(&"key").await);
}

#[tokio::test]
async fn test_cleanup_task_sweeps_shared_memo() {
    let config = MemoConfig::default()
        .with_max_age(Duration::from_millis(60))
        .with_cleanup_interval(Duration::from_millis(30));
    let memo = Arc::new(SharedMemo::with_config(&config));

    memo.get_or_compute(1u8, |x| std::future::ready(u16::from(*x))).await;
    let handle = spawn_cleanup_task(Arc::clone(&memo), config.cleanup_interval);

    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(memo.is_empty().await);
    handle.abort();
}
