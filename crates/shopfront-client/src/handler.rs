//! # Error Handler
//!
//! The shared sink every store forwards its caught errors to, after it has
//! already recorded a message in its own error slot.

use tracing::{error, warn};

use crate::error::ClientError;

/// Global error sink shared by all stores.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, err: &ClientError);
}

/// Default handler: logs through `tracing`.
///
/// Retryable failures are logged at `warn`, everything else at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn handle(&self, err: &ClientError) {
        if err.is_retryable() {
            warn!(error = %err, status = ?err.status(), "Request failed");
        } else {
            error!(
                error = %err,
                status = ?err.status(),
                server_message = ?err.server_message(),
                "Request failed"
            );
        }
    }
}
