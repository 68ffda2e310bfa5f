use lazycont::scheduler::{Immediate, ManualScheduler, Scheduler, ThreadScheduler};
use lazycont::{Cont, Outcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

#[test]
fn test_immediate_runs_inline() {
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = ran.clone();

    Immediate.schedule(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn test_manual_scheduler_orders() {
    let scheduler = ManualScheduler::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..3 {
        let order = order.clone();
        scheduler.schedule(Box::new(move || order.lock().unwrap().push(i)));
    }

    assert_eq!(scheduler.len(), 3);
    assert!(scheduler.run_last());
    assert!(scheduler.run_next());
    assert_eq!(scheduler.run_all(), 1);
    assert!(scheduler.is_empty());
    assert!(!scheduler.run_next());

    assert_eq!(*order.lock().unwrap(), [2, 0, 1]);
}

#[test]
fn test_subscribe_on_defers_start() {
    let scheduler = Arc::new(ManualScheduler::new());
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = starts.clone();

    let cont = Cont::<(), i32>::from_run(move |_, observer| {
        counter.fetch_add(1, Ordering::SeqCst);
        observer.on_value(1);
    })
    .subscribe_on(scheduler.clone());

    cont.ff(());
    assert_eq!(starts.load(Ordering::SeqCst), 0);

    scheduler.run_all();
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_observe_on_defers_delivery() {
    let scheduler = Arc::new(ManualScheduler::new());
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    Cont::<(), i32>::of(5)
        .observe_on(scheduler.clone())
        .run((), move |v| *sink.lock().unwrap() = Some(v), |_| {});

    assert_eq!(*slot.lock().unwrap(), None);
    scheduler.run_all();
    assert_eq!(*slot.lock().unwrap(), Some(5));
}

#[test]
fn test_thread_scheduler_delivers_on_other_thread() {
    let (tx, rx) = mpsc::channel();
    let caller = std::thread::current().id();

    Cont::<(), i32>::of(1)
        .observe_on(ThreadScheduler::new())
        .runner(())
        .on_outcome(move |outcome| {
            let _ = tx.send((outcome.is_success(), std::thread::current().id()));
        })
        .run();

    let (success, thread) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(success);
    assert_ne!(thread, caller);
}

#[test]
fn test_thread_scheduler_delay() {
    let (tx, rx) = mpsc::channel();
    let delay = Duration::from_millis(30);
    let start = Instant::now();

    Cont::<(), &str>::of("late")
        .subscribe_on(ThreadScheduler::with_delay(delay))
        .runner(())
        .on_outcome(move |outcome| {
            let _ = tx.send(outcome.success());
        })
        .run();

    let value = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(value, Some("late"));
    assert!(start.elapsed() >= delay);
}

#[test]
fn test_outcome_helpers() {
    let ok: Outcome<i32> = Ok::<i32, lazycont::ContError>(1).into();
    let failed: Outcome<i32> = Err::<i32, Vec<lazycont::ContError>>(Vec::new()).into();

    assert!(ok.is_success());
    assert_eq!(ok.clone().map(|x| x * 3).success(), Some(3));
    assert!(failed.is_failure());
    assert!(failed.into_result().is_err());
}
