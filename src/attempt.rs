//! Uniform execution of fallible operations.
//!
//! [`attempt`] and [`attempt_async`] run a callable and fold both its `Err`
//! return and any panic it raises into a single [`Caught`] error value, so
//! callers only ever branch on a `Result`.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use thiserror::Error;

/// Failure captured while running a callable under [`attempt`].
#[derive(Debug, Error)]
pub enum Caught<E> {
    /// The callable returned an error.
    #[error("{0}")]
    Failed(E),
    /// The callable panicked; holds the panic message when one was provided.
    #[error("operation panicked: {0}")]
    Panicked(String),
}

/// Outcome of an attempted operation: exactly one of data or error.
pub type Attempt<T, E> = Result<T, Caught<E>>;

/// Runs `callback`, never letting an error or a panic escape.
pub fn attempt<T, E, F>(callback: F) -> Attempt<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(error)) => Err(Caught::Failed(error)),
        Err(payload) => Err(Caught::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Awaits `operation` to completion and folds its outcome like [`attempt`].
pub async fn attempt_async<T, E, Fut>(operation: Fut) -> Attempt<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(Ok(data)) => Ok(data),
        Ok(Err(error)) => Err(Caught::Failed(error)),
        Err(payload) => Err(Caught::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}
