use lazycont::scheduler::ManualScheduler;
use lazycont::{Cont, Outcome, Panic, ask};
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Config {
    name: String,
    port: u16,
}

fn outcome_in<E, A>(cont: &Cont<E, A>, env: impl Into<Arc<E>>) -> Option<Outcome<A>>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();

    cont.runner(env)
        .on_outcome(move |outcome| *sink.lock().unwrap() = Some(outcome))
        .run();

    let outcome = slot.lock().unwrap().take();
    outcome
}

#[test]
fn test_ask_returns_same_environment() {
    let config = Arc::new(Config {
        name: "svc".into(),
        port: 80,
    });

    match outcome_in(&Cont::<Config, Arc<Config>>::ask(), config.clone()) {
        Some(Outcome::Success(seen)) => assert!(Arc::ptr_eq(&seen, &config)),
        other => panic!("expected the environment, got {:?}", other.map(|o| o.is_success())),
    }
}

#[test]
fn test_free_ask_reads_fields() {
    let cont = ask::<Config>().map(|config| config.port);
    let outcome = outcome_in(
        &cont,
        Config {
            name: "svc".into(),
            port: 8080,
        },
    );

    assert!(matches!(outcome, Some(Outcome::Success(8080))));
}

#[test]
fn test_local_derives_environment() {
    let port_only: Cont<u16, u16> = ask::<u16>().map(|port| *port + 1);
    let cont: Cont<Config, u16> = port_only.local(|config: &Config| config.port);

    let outcome = outcome_in(
        &cont,
        Config {
            name: "svc".into(),
            port: 41,
        },
    );

    assert!(matches!(outcome, Some(Outcome::Success(42))));
}

#[test]
fn test_local0_ignores_outer_environment() {
    let cont: Cont<Config, String> = ask::<String>()
        .map(|s| s.to_uppercase())
        .local0(|| "inner".to_owned());

    let outcome = outcome_in(
        &cont,
        Config {
            name: "outer".into(),
            port: 1,
        },
    );

    assert!(matches!(outcome, Some(Outcome::Success(ref s)) if s == "INNER"));
}

#[test]
fn test_scope_shares_one_environment() {
    let shared = Arc::new(7u32);
    let cont: Cont<(), Arc<u32>> = ask::<u32>().scope(shared.clone());

    for _ in 0..2 {
        match outcome_in(&cont, ()) {
            Some(Outcome::Success(seen)) => assert!(Arc::ptr_eq(&seen, &shared)),
            _ => panic!("expected the scoped environment"),
        }
    }
}

#[test]
fn test_inject_into_uses_value_as_environment() {
    let provider = Cont::<(), Config>::from_run(|_, observer| {
        observer.on_value(Config {
            name: "injected".into(),
            port: 9,
        })
    });
    let consumer = ask::<Config>().map(|config| format!("{}:{}", config.name, config.port));

    let outcome = outcome_in(&provider.inject_into(consumer), ());

    assert!(matches!(outcome, Some(Outcome::Success(ref s)) if s == "injected:9"));
}

#[test]
fn test_injected_by_mirrors_inject_into() {
    let provider = Cont::<(), u16>::of(3000);
    let consumer = ask::<u16>().map(|port| *port * 2);

    let outcome = outcome_in(&consumer.injected_by(provider), ());

    assert!(matches!(outcome, Some(Outcome::Success(6000))));
}

#[test]
fn test_local_failure_terminates() {
    let cont: Cont<Config, u16> = ask::<u16>()
        .map(|port| *port)
        .local(|_: &Config| -> u16 { panic!("no port") });

    let outcome = outcome_in(
        &cont,
        Config {
            name: "svc".into(),
            port: 1,
        },
    );

    match outcome {
        Some(Outcome::Failure(errors)) => assert!(errors[0].is_panic()),
        _ => panic!("expected a termination"),
    }
}

#[test]
fn test_local_shares_cancellation() {
    let scheduler = Arc::new(ManualScheduler::new());
    let deliveries = Arc::new(AtomicUsize::new(0));
    let values = deliveries.clone();
    let terminations = deliveries.clone();

    let cont: Cont<Config, u16> = ask::<u16>()
        .map(|port| *port)
        .subscribe_on(scheduler.clone())
        .local(|config: &Config| config.port);

    let token = cont.run(
        Config {
            name: "svc".into(),
            port: 80,
        },
        move |_| {
            values.fetch_add(1, Ordering::SeqCst);
        },
        move |_| {
            terminations.fetch_add(1, Ordering::SeqCst);
        },
    );

    token.cancel();
    scheduler.run_all();

    assert_eq!(deliveries.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scope_keeps_panic_handler() {
    let panics: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = panics.clone();

    let cont: Cont<(), u32> = ask::<u32>().map(|value| *value).scope(5u32);

    cont.runner(())
        .on_value(|_| panic!("callback bug"))
        .on_panic(move |panic| sink.lock().unwrap().push(panic.message()))
        .run();

    assert_eq!(*panics.lock().unwrap(), vec!["callback bug".to_owned()]);
}

#[test]
fn test_scoped_runtime_reports_to_runner_panic_handler() {
    let panics: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = panics.clone();

    let leaf = Cont::<u32, u32>::from_run(|runtime, observer| {
        let caught = panic::catch_unwind(|| -> u32 { panic!("leaf bug") });
        if let Err(payload) = caught {
            runtime.on_panic(Panic::new(payload));
        }
        observer.on_value(*runtime.env());
    });

    let outcome = Arc::new(Mutex::new(None));
    let slot = outcome.clone();

    leaf.scope(7u32)
        .runner(())
        .on_value(move |value| *slot.lock().unwrap() = Some(value))
        .on_panic(move |panic| sink.lock().unwrap().push(panic.message()))
        .run();

    assert_eq!(*panics.lock().unwrap(), vec!["leaf bug".to_owned()]);
    assert_eq!(*outcome.lock().unwrap(), Some(7));
}
