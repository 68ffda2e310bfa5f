use lazycont::scheduler::{ManualScheduler, ThreadScheduler};
use lazycont::tools::retry;
use lazycont::{Cont, ContError, Outcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

fn outcome_of<A: Send + 'static>(cont: &Cont<(), A>) -> Option<Outcome<A>> {
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    cont.runner(())
        .on_outcome(move |outcome| *sink.lock().unwrap() = Some(outcome))
        .run();

    let outcome = slot.lock().unwrap().take();
    outcome
}

/// Fails until the `succeed_at`-th attempt (1-based).
fn flaky(attempts: &Arc<AtomicUsize>, succeed_at: usize) -> Cont<(), usize> {
    let attempts = attempts.clone();
    Cont::from_run(move |_, observer| {
        let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if n < succeed_at {
            observer.on_terminate(vec![ContError::msg(format!("attempt {n} failed"))]);
        } else {
            observer.on_value(n);
        }
    })
}

#[test]
fn test_retry_succeeds_before_limit() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let cont = flaky(&attempts, 3).retry(5);

    assert!(
        matches!(outcome_of(&cont), Some(Outcome::Success(3))),
        "Retry should succeed before limit"
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 3, "Should have tried 3 times");
}

#[test]
fn test_retry_fails_after_limit() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let cont = flaky(&attempts, usize::MAX).retry(3);

    match outcome_of(&cont) {
        Some(Outcome::Failure(errors)) => assert_eq!(errors[0].to_string(), "attempt 4 failed"),
        other => panic!("Retry should fail after limit, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 4, "Should have tried 4 times");
}

#[test]
fn test_retry_budget_is_per_run() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let cont = flaky(&attempts, usize::MAX).retry(2);

    outcome_of(&cont);
    outcome_of(&cont);

    assert_eq!(attempts.load(Ordering::SeqCst), 6);
}

#[test]
fn test_retry_factory_builds_each_attempt() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let cont = retry(4, move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            Cont::<(), usize>::error(ContError::msg("fail"))
        } else {
            Cont::of(n)
        }
    });

    assert!(matches!(outcome_of(&cont), Some(Outcome::Success(2))));
    assert_eq!(builds.load(Ordering::SeqCst), 3);
}

#[test]
fn test_retry_with_schedules_each_retry() {
    let scheduler = Arc::new(ManualScheduler::new());
    let attempts = Arc::new(AtomicUsize::new(0));
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    flaky(&attempts, 3)
        .retry_with(5, scheduler.clone())
        .run((), move |v| *sink.lock().unwrap() = Some(v), |_| {});

    assert_eq!(attempts.load(Ordering::SeqCst), 1, "First attempt runs inline");
    assert_eq!(scheduler.run_all(), 2);
    assert_eq!(*slot.lock().unwrap(), Some(3));
}

#[test]
fn test_retry_with_interval() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let interval = Duration::from_millis(20);
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();

    flaky(&attempts, 3)
        .retry_with(3, ThreadScheduler::with_delay(interval))
        .runner(())
        .on_outcome(move |outcome| {
            let _ = tx.send(outcome.success());
        })
        .run();

    let value = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(value, Some(3), "Retry with interval should succeed");
    assert!(start.elapsed() >= interval * 2, "Each retry waits for the interval");
}
