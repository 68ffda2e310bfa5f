use crate::error::Panic;
use crate::runtime::PanicHandler;

use std::sync::Arc;
use std::thread;

/// Returns the handler used when a run does not configure one.
///
/// The panic is logged, then raised again on a detached thread so that it
/// does not unwind through the continuation that delivered it.
pub(crate) fn rethrow_async() -> PanicHandler {
    Arc::new(|panic: Panic| {
        let message = panic.message();

        tracing::error!(%message, "continuation callback panicked; re-raising asynchronously");

        let spawned = thread::Builder::new()
            .name("lazycont-panic".into())
            .spawn(move || panic!("unhandled panic in continuation callback: {message}"));

        if let Err(err) = spawned {
            tracing::error!(%err, "failed to spawn the panic re-raise thread");
        }
    })
}
