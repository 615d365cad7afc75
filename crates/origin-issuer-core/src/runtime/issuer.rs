// crates/origin-issuer-core/src/runtime/issuer.rs
// ============================================================================
// Module: Issuer Reconciler
// Description: Verifies issuer credentials and publishes signing capabilities.
// Purpose: Drive an OriginIssuer to Ready=True/Verified or an explanatory failure.
// Dependencies: crate::{audit, core, interfaces, runtime}, serde, tokio-util
// ============================================================================

//! ## Overview
//! Steps run top to bottom and the first failure short-circuits:
//!
//! 1. validate the spec (no external calls on malformed input)
//! 2. resolve the credential secret
//! 3. extract the configured key
//! 4. build an authenticated CA client
//! 5. bind the provisioner to the validated request type (infallible)
//! 6. store the provisioner in the registry
//! 7. publish `Ready=True/Verified`
//!
//! Failed steps may request a `Ready=False` status write. That write is best
//! effort: the step error is what the host sees. Whether validation and
//! client-construction failures write a status at all is configurable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::audit::AuditLevel;
use crate::audit::EventOutcome;
use crate::audit::ReconcileEvent;
use crate::audit::ReconcileEventParams;
use crate::audit::ResourceKind;
use crate::core::ConditionType;
use crate::core::ISSUER_KIND;
use crate::core::IssuerName;
use crate::core::ObjectKey;
use crate::core::OriginIssuer;
use crate::core::REASON_ERROR;
use crate::core::REASON_NOT_FOUND;
use crate::core::REASON_VERIFIED;
use crate::core::set_condition;
use crate::runtime::controller::Collaborators;
use crate::runtime::provisioner::Provisioner;
use crate::runtime::reconcile::ReconcileAction;
use crate::runtime::reconcile::ReconcileError;
use crate::runtime::reconcile::StatusUpdate;
use crate::runtime::reconcile::cancellable;
use crate::runtime::reconcile::ensure_active;
use crate::runtime::registry::ProvisionerRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Namespace used when a secret reference leaves its namespace empty.
pub const DEFAULT_CLUSTER_RESOURCE_NAMESPACE: &str = "cert-manager";

/// Message published with `Ready=True/Verified`.
pub const MESSAGE_VERIFIED: &str = "OriginIssuer verified and ready to sign certificates";

/// Step label: fetch the issuer by name.
const STEP_FETCH: &str = "fetch_issuer";
/// Step label: validate the spec.
const STEP_VALIDATE: &str = "validate";
/// Step label: fetch the credential secret.
const STEP_RESOLVE_SECRET: &str = "resolve_secret";
/// Step label: read the service key out of the secret.
const STEP_EXTRACT_KEY: &str = "extract_key";
/// Step label: build the CA client.
const STEP_BUILD_CLIENT: &str = "build_client";
/// Step label: publish the provisioner.
const STEP_STORE_PROVISIONER: &str = "store_provisioner";
/// Step label: persist the status.
const STEP_UPDATE_STATUS: &str = "update_status";
/// Step label: drop the registry entry of a deleted issuer.
const STEP_EVICT: &str = "evict_provisioner";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Registry behavior when an issuer is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryEviction {
    /// Keep stale entries until the process restarts.
    #[default]
    Retain,
    /// Remove the entry when the issuer is reported deleted.
    EvictOnDelete,
}

/// Issuer reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerReconcilerConfig {
    /// Namespace for secret references without one.
    pub cluster_resource_namespace: String,
    /// Registry eviction policy on issuer deletion.
    pub eviction: RegistryEviction,
    /// Write `Ready=False/Error` when spec validation fails.
    pub status_on_validation_failure: bool,
    /// Write `Ready=False/Error` when the CA client cannot be built.
    pub status_on_client_failure: bool,
}

impl Default for IssuerReconcilerConfig {
    fn default() -> Self {
        Self {
            cluster_resource_namespace: DEFAULT_CLUSTER_RESOURCE_NAMESPACE.to_string(),
            eviction: RegistryEviction::Retain,
            status_on_validation_failure: false,
            status_on_client_failure: false,
        }
    }
}

// ============================================================================
// SECTION: Step Failure
// ============================================================================

/// A failed verification step.
struct StepFailure {
    /// Step label.
    step: &'static str,
    /// Status write requested by the step.
    update: Option<StatusUpdate>,
    /// Error returned to the host.
    error: ReconcileError,
}

impl StepFailure {
    /// Creates a step failure.
    fn new(step: &'static str, update: Option<StatusUpdate>, error: ReconcileError) -> Self {
        Self {
            step,
            update,
            error,
        }
    }
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Reconciler for `OriginIssuer` resources.
pub struct IssuerReconciler {
    /// External collaborators.
    collaborators: Collaborators,
    /// Shared provisioner registry; this reconciler is its only writer.
    registry: Arc<ProvisionerRegistry>,
    /// Reconciler settings.
    config: IssuerReconcilerConfig,
}

impl IssuerReconciler {
    /// Creates an issuer reconciler.
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        registry: Arc<ProvisionerRegistry>,
        config: IssuerReconcilerConfig,
    ) -> Self {
        Self {
            collaborators,
            registry,
            config,
        }
    }

    /// Returns the reconciler settings.
    #[must_use]
    pub const fn config(&self) -> &IssuerReconcilerConfig {
        &self.config
    }

    /// Fetches an issuer by name and reconciles it.
    ///
    /// A missing issuer is treated as a deletion.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the fetch or the reconcile fails.
    pub async fn reconcile_key(
        &self,
        name: &IssuerName,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        let resource = issuer_identity(name);
        let fetched =
            cancellable(cancel, &resource, STEP_FETCH, self.collaborators.issuers.get(name))
                .await?;
        match fetched {
            Ok(issuer) => self.reconcile(issuer, cancel).await,
            Err(err) if err.is_not_found() => {
                self.handle_deleted(name);
                Ok(ReconcileAction::done())
            }
            Err(source) => Err(ReconcileError::Store {
                resource,
                step: STEP_FETCH,
                source,
            }),
        }
    }

    /// Reconciles one issuer.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for the first failing step, or when the
    /// final status write fails.
    pub async fn reconcile(
        &self,
        mut issuer: OriginIssuer,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        match self.verify(&issuer, cancel).await {
            Ok(provisioner) => {
                self.registry.store(issuer.name.clone(), provisioner);
                self.emit(
                    &issuer.name,
                    STEP_STORE_PROVISIONER,
                    AuditLevel::Debug,
                    EventOutcome::Proceeded,
                );
                let update = StatusUpdate::ready(REASON_VERIFIED, MESSAGE_VERIFIED);
                if let Err(err) = self.write_status(&mut issuer, update, cancel).await {
                    self.record(ReconcileEventParams {
                        error: Some(err.to_string()),
                        ..issuer_event(
                            &issuer.name,
                            STEP_UPDATE_STATUS,
                            AuditLevel::Error,
                            EventOutcome::Failed,
                        )
                    });
                    return Err(err);
                }
                self.record(ReconcileEventParams {
                    reason: Some(REASON_VERIFIED.to_string()),
                    ..issuer_event(
                        &issuer.name,
                        STEP_UPDATE_STATUS,
                        AuditLevel::Info,
                        EventOutcome::Succeeded,
                    )
                });
                Ok(ReconcileAction::done())
            }
            Err(failure) => {
                let outcome = if failure.error.is_cancelled() {
                    EventOutcome::Cancelled
                } else {
                    EventOutcome::Failed
                };
                self.record(ReconcileEventParams {
                    reason: failure.update.as_ref().map(|update| update.reason.to_string()),
                    error: Some(failure.error.to_string()),
                    ..issuer_event(&issuer.name, failure.step, AuditLevel::Error, outcome)
                });
                if let Some(update) = failure.update
                    && let Err(err) = self.write_status(&mut issuer, update, cancel).await
                {
                    self.record(ReconcileEventParams {
                        error: Some(err.to_string()),
                        ..issuer_event(
                            &issuer.name,
                            STEP_UPDATE_STATUS,
                            AuditLevel::Error,
                            EventOutcome::Failed,
                        )
                    });
                }
                Err(failure.error)
            }
        }
    }

    /// Handles an issuer deletion notification.
    ///
    /// Returns true when a registry entry was evicted.
    pub fn handle_deleted(&self, name: &IssuerName) -> bool {
        let evicted = match self.config.eviction {
            RegistryEviction::Retain => false,
            RegistryEviction::EvictOnDelete => self.registry.remove(name).is_some(),
        };
        let outcome = if evicted { EventOutcome::Succeeded } else { EventOutcome::Ignored };
        self.emit(name, STEP_EVICT, AuditLevel::Info, outcome);
        evicted
    }

    /// Runs steps 1 through 5 and returns the verified provisioner.
    async fn verify(
        &self,
        issuer: &OriginIssuer,
        cancel: &CancellationToken,
    ) -> Result<Arc<Provisioner>, StepFailure> {
        let resource = issuer_identity(&issuer.name);

        let validated = issuer.spec.validate().map_err(|source| {
            let update = self.config.status_on_validation_failure.then(|| {
                StatusUpdate::not_ready(REASON_ERROR, format!("Invalid OriginIssuer spec: {source}"))
            });
            StepFailure::new(
                STEP_VALIDATE,
                update,
                ReconcileError::Validation {
                    issuer: issuer.name.to_string(),
                    source,
                },
            )
        })?;
        self.emit(&issuer.name, STEP_VALIDATE, AuditLevel::Debug, EventOutcome::Proceeded);

        let selector = &validated.service_key_ref;
        let namespace = if selector.namespace.is_empty() {
            self.config.cluster_resource_namespace.clone()
        } else {
            selector.namespace.clone()
        };
        let secret_key = ObjectKey::new(namespace, selector.name.clone());
        let secret = cancellable(
            cancel,
            &resource,
            STEP_RESOLVE_SECRET,
            self.collaborators.secrets.get(&secret_key),
        )
        .await
        .map_err(|error| StepFailure::new(STEP_RESOLVE_SECRET, None, error))?
        .map_err(|source| {
            let reason = if source.is_not_found() { REASON_NOT_FOUND } else { REASON_ERROR };
            let update = StatusUpdate::not_ready(
                reason,
                format!("Failed to retrieve auth secret: {source}"),
            );
            StepFailure::new(
                STEP_RESOLVE_SECRET,
                Some(update),
                ReconcileError::Store {
                    resource: resource.clone(),
                    step: STEP_RESOLVE_SECRET,
                    source,
                },
            )
        })?;

        let Some(service_key) = secret.data.get(&selector.key) else {
            let error = ReconcileError::MissingSecretKey {
                secret: secret.key.name.clone(),
                key: selector.key.clone(),
            };
            let update = StatusUpdate::not_ready(
                REASON_NOT_FOUND,
                format!("Failed to retrieve auth secret: {error}"),
            );
            return Err(StepFailure::new(STEP_EXTRACT_KEY, Some(update), error));
        };

        let client = self.collaborators.client_factory.build(service_key).map_err(|source| {
            let update = self.config.status_on_client_failure.then(|| {
                StatusUpdate::not_ready(
                    REASON_ERROR,
                    format!("Failed to create Origin CA client: {source}"),
                )
            });
            StepFailure::new(
                STEP_BUILD_CLIENT,
                update,
                ReconcileError::Client {
                    issuer: issuer.name.to_string(),
                    source,
                },
            )
        })?;

        Ok(Arc::new(Provisioner::new(client, validated.request_type)))
    }

    /// Applies a `Ready` update and persists the issuer status.
    ///
    /// The token is checked before the write starts; a started write is
    /// never abandoned.
    async fn write_status(
        &self,
        issuer: &mut OriginIssuer,
        update: StatusUpdate,
        cancel: &CancellationToken,
    ) -> Result<(), ReconcileError> {
        let resource = issuer_identity(&issuer.name);
        ensure_active(cancel, &resource, STEP_UPDATE_STATUS)?;
        let change = set_condition(
            &mut issuer.status,
            ConditionType::Ready,
            update.status,
            update.reason,
            update.message.clone(),
            self.collaborators.clock.now(),
        );
        if change.is_transition() {
            self.collaborators.audit.record(&ReconcileEvent::transition(ReconcileEventParams {
                reason: Some(update.reason.to_string()),
                message: Some(format!("Ready={}: {}", update.status, update.message)),
                ..issuer_event(
                    &issuer.name,
                    STEP_UPDATE_STATUS,
                    AuditLevel::Info,
                    EventOutcome::Proceeded,
                )
            }));
        }
        self.collaborators.issuers.update_status(issuer).await.map_err(|source| {
            ReconcileError::Store {
                resource,
                step: STEP_UPDATE_STATUS,
                source,
            }
        })
    }

    /// Records a bare step event.
    fn emit(&self, name: &IssuerName, step: &'static str, level: AuditLevel, outcome: EventOutcome) {
        self.record(issuer_event(name, step, level, outcome));
    }

    /// Records a step event.
    fn record(&self, params: ReconcileEventParams) {
        self.collaborators.audit.record(&ReconcileEvent::new(params));
    }
}

/// Builds event parameters for an issuer step.
fn issuer_event(
    name: &IssuerName,
    step: &'static str,
    level: AuditLevel,
    outcome: EventOutcome,
) -> ReconcileEventParams {
    ReconcileEventParams {
        level,
        resource_kind: ResourceKind::OriginIssuer,
        namespace: None,
        name: name.to_string(),
        step,
        outcome,
        reason: None,
        message: None,
        error: None,
    }
}

/// Formats the issuer identity used in errors.
fn issuer_identity(name: &IssuerName) -> String {
    format!("{ISSUER_KIND} {name}")
}
