// crates/origin-issuer-core/src/runtime/request.rs
// ============================================================================
// Module: Certificate Request Reconciler
// Description: Ordered gate sequence deciding whether to sign, retry, or stop.
// Purpose: Turn approved certificate requests into issued certificates once.
// Dependencies: crate::{audit, core, interfaces, runtime}, tokio-util
// ============================================================================

//! ## Overview
//! Each reconcile walks [`REQUEST_GATES`] in order. Every gate evaluates to a
//! [`GateOutcome`]; the first non-`Proceed` outcome ends the reconcile. When
//! every gate proceeds the certificate produced by the `Sign` gate is stored
//! and the request is marked `Ready=True/Issued`.
//!
//! The first eight gates are pure functions of the request, the reconciler
//! configuration, and the approval oracle ([`evaluate_precondition`]). The
//! remaining gates call the issuer store, the registry, and the CA.
//!
//! ## Invariants
//! - A request with a certificate is never signed again.
//! - `Ready=True`, `Ready=False/Failed`, and `Ready=False/Denied` are terminal.
//! - CA requests never reach the CA and never receive a condition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::audit::AuditLevel;
use crate::audit::EventOutcome;
use crate::audit::ReconcileEvent;
use crate::audit::ReconcileEventParams;
use crate::audit::ResourceKind;
use crate::core::CERTIFICATE_REQUEST_KIND;
use crate::core::CertificateRequest;
use crate::core::ConditionType;
use crate::core::ISSUER_KIND;
use crate::core::ObjectKey;
use crate::core::OriginIssuer;
use crate::core::REASON_DENIED;
use crate::core::REASON_FAILED;
use crate::core::REASON_ISSUED;
use crate::core::REASON_PENDING;
use crate::core::set_condition;
use crate::interfaces::ApprovalOracle;
use crate::runtime::controller::Collaborators;
use crate::runtime::provisioner::Provisioner;
use crate::runtime::reconcile::GateOutcome;
use crate::runtime::reconcile::ReconcileAction;
use crate::runtime::reconcile::ReconcileError;
use crate::runtime::reconcile::StatusUpdate;
use crate::runtime::reconcile::cancellable;
use crate::runtime::reconcile::ensure_active;
use crate::runtime::registry::ProvisionerRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message published when an approval controller denied the request.
pub const MESSAGE_DENIED: &str = "The CertificateRequest was denied by an approval controller";

/// Message published with `Ready=True/Issued`.
pub const MESSAGE_ISSUED: &str = "Certificate issued";

/// Step label: fetch the request by key.
const STEP_FETCH: &str = "fetch_request";
/// Step label: store the certificate and mark the request issued.
const STEP_ISSUE: &str = "issue";
/// Step label: persist the status.
const STEP_UPDATE_STATUS: &str = "update_status";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Certificate request reconciler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestReconcilerConfig {
    /// Wait for an explicit approval before signing.
    pub check_approved_condition: bool,
}

// ============================================================================
// SECTION: Gates
// ============================================================================

/// Named gate in the signing-request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestGate {
    /// Ignore requests addressed to another issuer group.
    ForeignGroup,
    /// Ignore requests that are already `Ready=True`.
    AlreadyReady,
    /// Ignore requests that already failed.
    AlreadyFailed,
    /// Ignore requests that were already marked denied.
    AlreadyDenied,
    /// Mark newly denied requests as terminally denied.
    NewlyDenied,
    /// Wait for approval when approval checking is enabled.
    ApprovalPending,
    /// Ignore requests that already carry a certificate.
    AlreadyIssued,
    /// Ignore CA certificate requests.
    CaUnsupported,
    /// Fetch the referenced issuer.
    ResolveIssuer,
    /// Require the issuer to be `Ready=True`.
    IssuerReadiness,
    /// Load the issuer's provisioner from the registry.
    LoadProvisioner,
    /// Sign the CSR through the provisioner.
    Sign,
}

/// Gates in evaluation order.
pub const REQUEST_GATES: [RequestGate; 12] = [
    RequestGate::ForeignGroup,
    RequestGate::AlreadyReady,
    RequestGate::AlreadyFailed,
    RequestGate::AlreadyDenied,
    RequestGate::NewlyDenied,
    RequestGate::ApprovalPending,
    RequestGate::AlreadyIssued,
    RequestGate::CaUnsupported,
    RequestGate::ResolveIssuer,
    RequestGate::IssuerReadiness,
    RequestGate::LoadProvisioner,
    RequestGate::Sign,
];

impl RequestGate {
    /// Returns the gate label used in events and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ForeignGroup => "foreign_group",
            Self::AlreadyReady => "already_ready",
            Self::AlreadyFailed => "already_failed",
            Self::AlreadyDenied => "already_denied",
            Self::NewlyDenied => "newly_denied",
            Self::ApprovalPending => "approval_pending",
            Self::AlreadyIssued => "already_issued",
            Self::CaUnsupported => "ca_unsupported",
            Self::ResolveIssuer => "resolve_issuer",
            Self::IssuerReadiness => "issuer_readiness",
            Self::LoadProvisioner => "load_provisioner",
            Self::Sign => "sign",
        }
    }

    /// Returns true for gates that need no external calls.
    #[must_use]
    pub const fn is_precondition(self) -> bool {
        !matches!(
            self,
            Self::ResolveIssuer | Self::IssuerReadiness | Self::LoadProvisioner | Self::Sign
        )
    }
}

impl fmt::Display for RequestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluates a precondition gate.
///
/// Gates that need external calls evaluate to [`GateOutcome::Proceed`] here.
#[must_use]
pub fn evaluate_precondition(
    gate: RequestGate,
    request: &CertificateRequest,
    config: &RequestReconcilerConfig,
    approval: &dyn ApprovalOracle,
) -> GateOutcome {
    let stop = |detail: &'static str| GateOutcome::TerminalOk {
        detail,
    };
    match gate {
        RequestGate::ForeignGroup if !request.spec.issuer_ref.is_own_group() => {
            stop("issuer group is handled by another controller")
        }
        RequestGate::AlreadyReady if request.is_ready() => stop("request is already ready"),
        RequestGate::AlreadyFailed if request.has_ready_false(REASON_FAILED) => {
            stop("request has already failed")
        }
        RequestGate::AlreadyDenied if request.has_ready_false(REASON_DENIED) => {
            stop("request is already marked denied")
        }
        RequestGate::NewlyDenied if approval.is_denied(request) => GateOutcome::TerminalError {
            update: StatusUpdate::not_ready(REASON_DENIED, MESSAGE_DENIED).with_failure_time(),
            error: None,
        },
        RequestGate::ApprovalPending
            if config.check_approved_condition && !approval.is_approved(request) =>
        {
            stop("request has not been approved")
        }
        RequestGate::AlreadyIssued if request.is_issued() => {
            stop("request already carries a certificate")
        }
        RequestGate::CaUnsupported if request.spec.is_ca => {
            stop("signing of CA certificates is not supported")
        }
        _ => GateOutcome::Proceed,
    }
}

/// Values produced by earlier gates for later ones.
#[derive(Debug, Default)]
struct GateContext {
    /// Issuer fetched by `ResolveIssuer`.
    issuer: Option<OriginIssuer>,
    /// Provisioner loaded by `LoadProvisioner`.
    provisioner: Option<Arc<Provisioner>>,
    /// Certificate produced by `Sign`.
    certificate: Option<Vec<u8>>,
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Reconciler for `CertificateRequest` resources.
pub struct CertificateRequestReconciler {
    /// External collaborators.
    collaborators: Collaborators,
    /// Shared provisioner registry; read only.
    registry: Arc<ProvisionerRegistry>,
    /// Reconciler settings.
    config: RequestReconcilerConfig,
}

impl CertificateRequestReconciler {
    /// Creates a certificate request reconciler.
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        registry: Arc<ProvisionerRegistry>,
        config: RequestReconcilerConfig,
    ) -> Self {
        Self {
            collaborators,
            registry,
            config,
        }
    }

    /// Returns the reconciler settings.
    #[must_use]
    pub const fn config(&self) -> &RequestReconcilerConfig {
        &self.config
    }

    /// Fetches a request by key and reconciles it.
    ///
    /// A missing request is a quiet no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the fetch or the reconcile fails.
    pub async fn reconcile_key(
        &self,
        key: &ObjectKey,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        let resource = request_identity(key);
        let fetched =
            cancellable(cancel, &resource, STEP_FETCH, self.collaborators.requests.get(key))
                .await?;
        match fetched {
            Ok(request) => self.reconcile(request, cancel).await,
            Err(err) if err.is_not_found() => {
                self.record(request_event(key, STEP_FETCH, AuditLevel::Debug, EventOutcome::Ignored));
                Ok(ReconcileAction::done())
            }
            Err(source) => Err(ReconcileError::Store {
                resource,
                step: STEP_FETCH,
                source,
            }),
        }
    }

    /// Reconciles one request through the gate sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when a gate asks for a retry, when signing
    /// fails, or when a terminal status write fails.
    pub async fn reconcile(
        &self,
        mut request: CertificateRequest,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        let mut context = GateContext::default();
        for gate in REQUEST_GATES {
            let outcome = if gate.is_precondition() {
                evaluate_precondition(
                    gate,
                    &request,
                    &self.config,
                    self.collaborators.approval.as_ref(),
                )
            } else {
                self.evaluate_external(gate, &request, &mut context, cancel).await
            };
            match outcome {
                GateOutcome::Proceed => {}
                GateOutcome::TerminalOk {
                    detail,
                } => {
                    let level = if gate == RequestGate::CaUnsupported {
                        AuditLevel::Info
                    } else {
                        AuditLevel::Debug
                    };
                    self.record(ReconcileEventParams {
                        message: Some(detail.to_string()),
                        ..request_event(&request.key, gate.label(), level, EventOutcome::Ignored)
                    });
                    return Ok(ReconcileAction::done());
                }
                GateOutcome::TerminalError {
                    update,
                    error: None,
                } => {
                    let reason = update.reason;
                    self.write_status(&mut request, update, cancel).await?;
                    self.record(ReconcileEventParams {
                        reason: Some(reason.to_string()),
                        ..request_event(
                            &request.key,
                            gate.label(),
                            AuditLevel::Info,
                            EventOutcome::Terminal,
                        )
                    });
                    return Ok(ReconcileAction::done());
                }
                GateOutcome::TerminalError {
                    update,
                    error: Some(error),
                } => {
                    self.fail(&mut request, gate, Some(update), &error, cancel).await;
                    return Err(error);
                }
                GateOutcome::RetryableError {
                    update,
                    error,
                } => {
                    self.fail(&mut request, gate, update, &error, cancel).await;
                    return Err(error);
                }
            }
        }

        let Some(certificate) = context.certificate else {
            return Ok(ReconcileAction::done());
        };
        request.status.certificate = certificate;
        self.write_status(&mut request, StatusUpdate::ready(REASON_ISSUED, MESSAGE_ISSUED), cancel)
            .await?;
        self.record(ReconcileEventParams {
            reason: Some(REASON_ISSUED.to_string()),
            ..request_event(&request.key, STEP_ISSUE, AuditLevel::Info, EventOutcome::Succeeded)
        });
        Ok(ReconcileAction::done())
    }

    /// Evaluates a gate that needs the issuer store, registry, or CA.
    async fn evaluate_external(
        &self,
        gate: RequestGate,
        request: &CertificateRequest,
        context: &mut GateContext,
        cancel: &CancellationToken,
    ) -> GateOutcome {
        let resource = request_identity(&request.key);
        let issuer_name = request.spec.issuer_ref.issuer_name();
        match gate {
            RequestGate::ResolveIssuer => {
                let fetched = cancellable(
                    cancel,
                    &resource,
                    gate.label(),
                    self.collaborators.issuers.get(&issuer_name),
                )
                .await;
                match fetched {
                    Ok(Ok(issuer)) => {
                        context.issuer = Some(issuer);
                        GateOutcome::Proceed
                    }
                    Ok(Err(source)) => GateOutcome::RetryableError {
                        update: Some(StatusUpdate::not_ready(
                            REASON_PENDING,
                            format!(
                                "Failed to retrieve {ISSUER_KIND} resource {issuer_name}: {source}"
                            ),
                        )),
                        error: ReconcileError::Store {
                            resource,
                            step: gate.label(),
                            source,
                        },
                    },
                    Err(error) => GateOutcome::RetryableError {
                        update: None,
                        error,
                    },
                }
            }
            RequestGate::IssuerReadiness => {
                let ready = context
                    .issuer
                    .as_ref()
                    .is_some_and(|issuer| issuer.status.conditions.is_true(&ConditionType::Ready));
                if ready {
                    return GateOutcome::Proceed;
                }
                GateOutcome::RetryableError {
                    update: Some(StatusUpdate::not_ready(
                        REASON_PENDING,
                        format!("{ISSUER_KIND} {issuer_name} is not Ready"),
                    )),
                    error: ReconcileError::IssuerNotReady {
                        request: resource,
                        issuer: issuer_name.to_string(),
                    },
                }
            }
            RequestGate::LoadProvisioner => {
                if let Some(provisioner) = self.registry.load(&issuer_name) {
                    context.provisioner = Some(provisioner);
                    return GateOutcome::Proceed;
                }
                GateOutcome::RetryableError {
                    update: Some(StatusUpdate::not_ready(
                        REASON_PENDING,
                        format!("Failed to load provisioner for {ISSUER_KIND} resource {issuer_name}"),
                    )),
                    error: ReconcileError::ProvisionerNotFound {
                        request: resource,
                        issuer: issuer_name.to_string(),
                    },
                }
            }
            RequestGate::Sign => {
                let Some(provisioner) = context.provisioner.clone() else {
                    return GateOutcome::RetryableError {
                        update: None,
                        error: ReconcileError::ProvisionerNotFound {
                            request: resource,
                            issuer: issuer_name.to_string(),
                        },
                    };
                };
                match cancellable(cancel, &resource, gate.label(), provisioner.sign(request)).await
                {
                    Ok(Ok(certificate)) => {
                        context.certificate = Some(certificate);
                        GateOutcome::Proceed
                    }
                    Ok(Err(source)) => GateOutcome::TerminalError {
                        update: StatusUpdate::not_ready(
                            REASON_FAILED,
                            format!("Failed to sign certificate request: {source}"),
                        ),
                        error: Some(ReconcileError::Sign {
                            request: resource,
                            source,
                        }),
                    },
                    Err(error) => GateOutcome::RetryableError {
                        update: None,
                        error,
                    },
                }
            }
            _ => evaluate_precondition(
                gate,
                request,
                &self.config,
                self.collaborators.approval.as_ref(),
            ),
        }
    }

    /// Records a failed gate and makes a best-effort status write.
    async fn fail(
        &self,
        request: &mut CertificateRequest,
        gate: RequestGate,
        update: Option<StatusUpdate>,
        error: &ReconcileError,
        cancel: &CancellationToken,
    ) {
        let outcome = if error.is_cancelled() {
            EventOutcome::Cancelled
        } else if update.as_ref().is_some_and(|update| update.reason == REASON_FAILED) {
            EventOutcome::Terminal
        } else {
            EventOutcome::Failed
        };
        self.record(ReconcileEventParams {
            reason: update.as_ref().map(|update| update.reason.to_string()),
            error: Some(error.to_string()),
            ..request_event(&request.key, gate.label(), AuditLevel::Error, outcome)
        });
        if let Some(update) = update
            && let Err(err) = self.write_status(request, update, cancel).await
        {
            self.record(ReconcileEventParams {
                error: Some(err.to_string()),
                ..request_event(
                    &request.key,
                    STEP_UPDATE_STATUS,
                    AuditLevel::Error,
                    EventOutcome::Failed,
                )
            });
        }
    }

    /// Applies a `Ready` update and persists the request status.
    ///
    /// The token is checked before the write starts; a started write is
    /// never abandoned.
    async fn write_status(
        &self,
        request: &mut CertificateRequest,
        update: StatusUpdate,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let resource = request_identity(&request.key);
        ensure_active(cancel, &resource, STEP_UPDATE_STATUS)?;
        let now = self.collaborators.clock.now();
        if update.record_failure_time && request.status.failure_time.is_none() {
            request.status.failure_time = Some(now);
        }
        let change = set_condition(
            &mut request.status,
            ConditionType::Ready,
            update.status,
            update.reason,
            update.message.clone(),
            now,
        );
        if change.is_transition() {
            self.collaborators.audit.record(&ReconcileEvent::transition(ReconcileEventParams {
                reason: Some(update.reason.to_string()),
                message: Some(format!("Ready={}: {}", update.status, update.message)),
                ..request_event(
                    &request.key,
                    STEP_UPDATE_STATUS,
                    AuditLevel::Info,
                    EventOutcome::Proceeded,
                )
            }));
        }
        self.collaborators.requests.update_status(request).await.map_err(|source| {
            ReconcileError::Store {
                resource,
                step: STEP_UPDATE_STATUS,
                source,
            }
        })
    }

    /// Records a step event.
    fn record(&self, params: ReconcileEventParams) {
        self.collaborators.audit.record(&ReconcileEvent::new(params));
    }
}

/// Builds event parameters for a request step.
fn request_event(
    key: &ObjectKey,
    step: &'static str,
    level: AuditLevel,
    outcome: EventOutcome,
) -> ReconcileEventParams {
    ReconcileEventParams {
        level,
        resource_kind: ResourceKind::CertificateRequest,
        namespace: Some(key.namespace.clone()),
        name: key.name.clone(),
        step,
        outcome,
        reason: None,
        message: None,
        error: None,
    }
}

/// Formats the request identity used in errors.
fn request_identity(key: &ObjectKey) -> String {
    format!("{CERTIFICATE_REQUEST_KIND} {key}")
}
