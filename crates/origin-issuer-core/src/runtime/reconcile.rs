// crates/origin-issuer-core/src/runtime/reconcile.rs
// ============================================================================
// Module: Reconcile Outcomes
// Description: Shared result, error, and status-update types for reconcilers.
// Purpose: Give the host scheduler one contract for both resource kinds.
// Dependencies: crate::{core, interfaces}, thiserror, tokio-util
// ============================================================================

//! ## Overview
//! Both reconcilers return `Result<ReconcileAction, ReconcileError>`. An error
//! asks the host to retry with backoff; `Ok` with no requeue means "wait for
//! the next change event". [`ReconcileError::kind`] classifies failures so
//! hosts can tell validation problems from transient and signing failures.
//!
//! Blocking collaborator calls are raced against the host cancellation token
//! through [`cancellable`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::ConditionStatus;
use crate::core::ValidationError;
use crate::interfaces::ClientError;
use crate::interfaces::SignError;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Successful reconcile result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileAction {
    /// Delay before the host should reconcile again. Both reconcilers are
    /// purely event driven and always leave this unset.
    pub requeue_after: Option<Duration>,
}

impl ReconcileAction {
    /// Wait for the next change event.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            requeue_after: None,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure classification for host retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed operator input.
    Validation,
    /// Infrastructure or ordering failure expected to clear on retry.
    Transient,
    /// CA signing failure; the request is already marked terminal.
    Signing,
    /// The host cancelled the reconcile.
    Cancelled,
}

/// Reconcile failure with resource and step context.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Issuer spec failed validation.
    #[error("issuer {issuer}: {source}")]
    Validation {
        /// Issuer name.
        issuer: String,
        /// Validation failure.
        #[source]
        source: ValidationError,
    },
    /// A store call failed.
    #[error("{resource}: {step} failed: {source}")]
    Store {
        /// Resource identity being reconciled.
        resource: String,
        /// Step label.
        step: &'static str,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The credential secret lacks the configured key.
    #[error("secret {secret} does not contain key \"{key}\"")]
    MissingSecretKey {
        /// Secret name.
        secret: String,
        /// Missing key.
        key: String,
    },
    /// The CA client could not be built.
    #[error("issuer {issuer}: {source}")]
    Client {
        /// Issuer name.
        issuer: String,
        /// Client failure.
        #[source]
        source: ClientError,
    },
    /// The referenced issuer is not `Ready=True`.
    #[error("{request}: issuer {issuer} is not ready")]
    IssuerNotReady {
        /// Request identity.
        request: String,
        /// Issuer name.
        issuer: String,
    },
    /// No provisioner is registered for the issuer in this process.
    #[error("{request}: provisioner {issuer} not found")]
    ProvisionerNotFound {
        /// Request identity.
        request: String,
        /// Issuer name.
        issuer: String,
    },
    /// The CA signing call failed.
    #[error("{request}: {source}")]
    Sign {
        /// Request identity.
        request: String,
        /// Signing failure.
        #[source]
        source: SignError,
    },
    /// The host cancelled the reconcile before the step could run.
    #[error("{resource}: cancelled during {step}")]
    Cancelled {
        /// Resource identity being reconciled.
        resource: String,
        /// Step label.
        step: &'static str,
    },
}

impl ReconcileError {
    /// Returns the retry classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation {
                ..
            } => ErrorKind::Validation,
            Self::Sign {
                ..
            } => ErrorKind::Signing,
            Self::Cancelled {
                ..
            } => ErrorKind::Cancelled,
            Self::Store {
                ..
            }
            | Self::MissingSecretKey {
                ..
            }
            | Self::Client {
                ..
            }
            | Self::IssuerNotReady {
                ..
            }
            | Self::ProvisionerNotFound {
                ..
            } => ErrorKind::Transient,
        }
    }

    /// Returns true when the error came from cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled)
    }
}

// ============================================================================
// SECTION: Status Updates
// ============================================================================

/// A `Ready` condition write requested by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Condition status.
    pub status: ConditionStatus,
    /// Machine-readable reason.
    pub reason: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Record the failure time when none is set yet.
    pub record_failure_time: bool,
}

impl StatusUpdate {
    /// Builds a `Ready=True` update.
    #[must_use]
    pub fn ready(reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: ConditionStatus::True,
            reason,
            message: message.into(),
            record_failure_time: false,
        }
    }

    /// Builds a `Ready=False` update.
    #[must_use]
    pub fn not_ready(reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: ConditionStatus::False,
            reason,
            message: message.into(),
            record_failure_time: false,
        }
    }

    /// Marks the update as recording the failure time.
    #[must_use]
    pub const fn with_failure_time(mut self) -> Self {
        self.record_failure_time = true;
        self
    }
}

// ============================================================================
// SECTION: Gate Outcomes
// ============================================================================

/// Result of evaluating one signing-request gate.
#[derive(Debug)]
pub enum GateOutcome {
    /// Continue with the next gate.
    Proceed,
    /// Stop quietly: no status change, no error.
    TerminalOk {
        /// Log detail for the skip.
        detail: &'static str,
    },
    /// Stop with a terminal status; never retried.
    TerminalError {
        /// Status to persist.
        update: StatusUpdate,
        /// Error surfaced for observability, if any.
        error: Option<ReconcileError>,
    },
    /// Stop and ask the host to retry.
    RetryableError {
        /// Best-effort status to persist first, if any.
        update: Option<StatusUpdate>,
        /// Error returned to the host.
        error: ReconcileError,
    },
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Runs a future unless the token fires first.
///
/// The token is polled first so an already-cancelled reconcile never starts
/// the call.
///
/// # Errors
///
/// Returns [`ReconcileError::Cancelled`] when the token fires.
pub async fn cancellable<F, T>(
    cancel: &CancellationToken,
    resource: &str,
    step: &'static str,
    future: F,
) -> Result<T, ReconcileError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ReconcileError::Cancelled {
            resource: resource.to_string(),
            step,
        }),
        output = future => Ok(output),
    }
}

/// Fails when the token has already fired.
///
/// # Errors
///
/// Returns [`ReconcileError::Cancelled`] when the token is cancelled.
pub fn ensure_active(
    cancel: &CancellationToken,
    resource: &str,
    step: &'static str,
) -> Result<(), ReconcileError> {
    if cancel.is_cancelled() {
        return Err(ReconcileError::Cancelled {
            resource: resource.to_string(),
            step,
        });
    }
    Ok(())
}
