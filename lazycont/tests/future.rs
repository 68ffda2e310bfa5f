use lazycont::scheduler::{Immediate, ManualScheduler, ThreadScheduler};
use lazycont::{Cont, ContError, Outcome};
use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};
use std::time::Duration;

struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);

    loop {
        if let Poll::Ready(value) = future.as_mut().poll(&mut cx) {
            return value;
        }
        thread::park_timeout(Duration::from_millis(50));
    }
}

/// Returns `Pending` once, waking itself, then resolves.
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = Result<i32, ContError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(Ok(2));
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Wakes itself and returns `Pending` a given number of times.
struct Yields(usize);

impl Future for Yields {
    type Output = Result<usize, ContError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.0 == 0 {
            return Poll::Ready(Ok(0));
        }

        self.0 -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Never resolves; records its waker and its drop.
struct Stalled {
    waker: Arc<Mutex<Option<Waker>>>,
    dropped: Arc<AtomicUsize>,
}

impl Future for Stalled {
    type Output = Result<i32, ContError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        *self.waker.lock().unwrap() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for Stalled {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_into_future_resolves_value() {
    let outcome = block_on(Cont::<(), i32>::of(1).map(|x| x + 1).into_future(()));

    assert!(matches!(outcome, Outcome::Success(2)));
}

#[test]
fn test_into_future_resolves_termination() {
    let outcome = block_on(Cont::<(), i32>::error(std::fmt::Error).into_future(()));

    assert!(matches!(outcome, Outcome::Failure(errors) if errors.len() == 1));
}

#[test]
fn test_into_future_is_lazy() {
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = starts.clone();

    let cont = Cont::<(), i32>::from_run(move |_, observer| {
        counter.fetch_add(1, Ordering::SeqCst);
        observer.on_value(1);
    });

    let future = cont.into_future(());
    assert_eq!(starts.load(Ordering::SeqCst), 0);

    block_on(future);
    assert_eq!(starts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_into_future_waits_for_other_threads() {
    let cont = Cont::<(), &str>::of("threaded")
        .subscribe_on(ThreadScheduler::with_delay(Duration::from_millis(10)));

    assert!(matches!(block_on(cont.into_future(())), Outcome::Success("threaded")));
}

#[test]
fn test_dropping_into_future_cancels() {
    let scheduler = Arc::new(ManualScheduler::new());
    let continued = Arc::new(AtomicUsize::new(0));
    let counter = continued.clone();

    let cont = Cont::<(), i32>::of(1)
        .observe_on(scheduler.clone())
        .map(move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            x
        });

    let mut future = cont.into_future(());
    let mut cx = Context::from_waker(Waker::noop());
    assert!(Pin::new(&mut future).poll(&mut cx).is_pending());

    drop(future);
    scheduler.run_all();

    assert_eq!(continued.load(Ordering::SeqCst), 0);
}

#[test]
fn test_from_future_ready_value() {
    let cont = Cont::<(), i32>::from_future(Immediate, |_| async { Ok::<i32, ContError>(40 + 2) });

    assert!(matches!(block_on(cont.into_future(())), Outcome::Success(42)));
}

#[test]
fn test_from_future_error_terminates() {
    let cont = Cont::<(), i32>::from_future(Immediate, |_| async { Err(ContError::msg("io")) });

    match block_on(cont.into_future(())) {
        Outcome::Failure(errors) => assert_eq!(errors[0].to_string(), "io"),
        other => panic!("expected a termination, got {other:?}"),
    }
}

#[test]
fn test_from_future_reads_environment() {
    let cont = Cont::<u32, u32>::from_future(Immediate, |base: &u32| {
        let base = *base;
        async move { Ok::<u32, ContError>(base * 2) }
    });

    assert!(matches!(block_on(cont.into_future(21)), Outcome::Success(42)));
}

#[test]
fn test_from_future_repolls_on_wake() {
    let scheduler = Arc::new(ManualScheduler::new());
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    Cont::<(), i32>::from_future(scheduler.clone(), |_| YieldOnce { yielded: false })
        .run((), move |v| *sink.lock().unwrap() = Some(v), |_| {});

    assert_eq!(scheduler.run_all(), 2, "One poll per wake-up");
    assert_eq!(*slot.lock().unwrap(), Some(2));
}

#[test]
fn test_from_future_cancel_drops_future() {
    let waker = Arc::new(Mutex::new(None));
    let dropped = Arc::new(AtomicUsize::new(0));
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();

    let cont = Cont::<(), i32>::from_future(Immediate, {
        let waker = waker.clone();
        let dropped = dropped.clone();
        move |_| Stalled {
            waker: waker.clone(),
            dropped: dropped.clone(),
        }
    });

    let token = cont.run(
        (),
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        |_| {},
    );

    assert_eq!(dropped.load(Ordering::SeqCst), 0);
    token.cancel();
    assert_eq!(dropped.load(Ordering::SeqCst), 1);

    let stored = waker.lock().unwrap().take();
    if let Some(waker) = stored {
        waker.wake();
    }
    assert_eq!(delivered.load(Ordering::SeqCst), 0);
}

#[test]
fn test_from_future_poll_panic_terminates() {
    let cont = Cont::<(), i32>::from_future(Immediate, |_| async {
        if true {
            panic!("poll bug");
        }
        Ok::<i32, ContError>(1)
    });

    match block_on(cont.into_future(())) {
        Outcome::Failure(errors) => assert!(errors[0].is_panic()),
        other => panic!("expected a termination, got {other:?}"),
    }
}

#[test]
fn test_from_future_many_yields_inline() {
    let cont = Cont::<(), usize>::from_future(Immediate, |_| Yields(200_000));
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    cont.run((), move |v| *sink.lock().unwrap() = Some(v), |_| {});

    assert_eq!(*slot.lock().unwrap(), Some(0));
}

#[test]
fn test_from_future_yields_requeue_on_manual_scheduler() {
    let scheduler = Arc::new(ManualScheduler::new());
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    Cont::<(), usize>::from_future(scheduler.clone(), |_| Yields(3))
        .run((), move |v| *sink.lock().unwrap() = Some(v), |_| {});

    assert_eq!(scheduler.run_all(), 4);
    assert_eq!(*slot.lock().unwrap(), Some(0));
}
