//! # View-Model Stores
//!
//! Stateful facades over the backend, one per resource.
//!
//! ## Action Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Action Lifecycle                            │
//! │                                                                         │
//! │   1. status[category] = { loading: true, error: None }                  │
//! │   2. await request (no lock held)                                       │
//! │   3. status[category].loading = false                                   │
//! │         ├── Ok(v)  → apply v to state                                   │
//! │         └── Err(e) → status[category].error = message                   │
//! │                      ErrorHandler::handle(&e)                           │
//! │                      return None / false / empty                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::{ClientError, ClientResult};
use crate::handler::ErrorHandler;

pub mod auth;
pub mod cart;
pub mod product;
pub mod user;

/// Loading flag and last error of one action category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// State that tracks an [`ActionStatus`] per action category.
pub(crate) trait StoreState {
    type Category: Copy;

    fn status_mut(&mut self, category: Self::Category) -> &mut ActionStatus;
}

/// Message stored in an error slot.
pub(crate) fn error_message(err: &ClientError, fallback: &str) -> String {
    err.server_message().unwrap_or(fallback).to_string()
}

/// Marks `category` as loading and clears its previous error.
pub(crate) fn begin<S: StoreState>(state: &RwLock<S>, category: S::Category) {
    let mut state = state.write();
    let status = state.status_mut(category);
    status.loading = true;
    status.error = None;
}

/// Runs one store action through the standard lifecycle.
///
/// `apply` runs under the state write lock only when the request succeeded.
/// The error handler is invoked after the lock is released.
pub(crate) async fn track<S, T, Fut, A>(
    state: &RwLock<S>,
    category: S::Category,
    handler: &dyn ErrorHandler,
    fallback: &str,
    request: Fut,
    apply: A,
) -> Option<T>
where
    S: StoreState,
    Fut: Future<Output = ClientResult<T>>,
    A: FnOnce(&mut S, &T),
{
    begin(state, category);
    let result = request.await;

    let outcome = {
        let mut guard = state.write();
        guard.status_mut(category).loading = false;
        match result {
            Ok(value) => {
                apply(&mut *guard, &value);
                Ok(value)
            }
            Err(err) => {
                guard.status_mut(category).error = Some(error_message(&err, fallback));
                Err(err)
            }
        }
    };

    match outcome {
        Ok(value) => Some(value),
        Err(err) => {
            handler.handle(&err);
            None
        }
    }
}
