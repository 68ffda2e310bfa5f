use super::{Cont, guarded};

use std::sync::Arc;

/// Reads the current environment as a success value.
///
/// Free-function form of [`Cont::ask`].
pub fn ask<E>() -> Cont<E, Arc<E>>
where
    E: Send + Sync + 'static,
{
    Cont::ask()
}

impl<E> Cont<E, Arc<E>>
where
    E: Send + Sync + 'static,
{
    /// Settles with the environment of the execution.
    ///
    /// The environment is handed out by reference: the settled `Arc` points
    /// to the very value given to `run`.
    pub fn ask() -> Self {
        Cont::raw(|runtime, observer| observer.on_value(runtime.env_arc()))
    }
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Derives the environment this continuation needs from an outer one.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// struct App { db: Db }
    ///
    /// let query: Cont<Db, Rows> = /* ... */;
    /// let in_app: Cont<App, Rows> = query.local(|app: &App| app.db.clone());
    /// ```
    pub fn local<E0, F>(self, f: F) -> Cont<E0, A>
    where
        E0: Send + Sync + 'static,
        F: Fn(&E0) -> E + Send + Sync + 'static,
    {
        Cont::raw(move |runtime, observer| match guarded(|| f(runtime.env())) {
            Ok(env) => self.run_with(&runtime.copy_update_env(env), observer),
            Err(err) => observer.on_terminate(vec![err]),
        })
    }

    /// Supplies the environment from nothing, ignoring the outer one.
    pub fn local0<E0, F>(self, supplier: F) -> Cont<E0, A>
    where
        E0: Send + Sync + 'static,
        F: Fn() -> E + Send + Sync + 'static,
    {
        Cont::raw(move |runtime, observer| match guarded(&supplier) {
            Ok(env) => self.run_with(&runtime.copy_update_env(env), observer),
            Err(err) => observer.on_terminate(vec![err]),
        })
    }

    /// Runs with a constant environment.
    ///
    /// Every execution sees the same `Arc`.
    pub fn scope<E0>(self, env: impl Into<Arc<E>>) -> Cont<E0, A>
    where
        E0: Send + Sync + 'static,
    {
        let env: Arc<E> = env.into();

        Cont::raw(move |runtime, observer| {
            self.run_with(&runtime.copy_update_env(env.clone()), observer)
        })
    }

    /// Uses this continuation's value as the environment of `consumer`.
    pub fn inject_into<B>(self, consumer: Cont<A, B>) -> Cont<E, B>
    where
        A: Sync,
        B: Send + 'static,
    {
        self.then(move |value| consumer.clone().scope(value))
    }

    /// Runs this continuation in the environment produced by `provider`.
    pub fn injected_by<E0>(self, provider: Cont<E0, E>) -> Cont<E0, A>
    where
        E0: Send + Sync + 'static,
    {
        provider.inject_into(self)
    }
}
