// crates/origin-issuer-core/src/runtime/controller.rs
// ============================================================================
// Module: Origin Issuer Controller
// Description: Process-root object wiring collaborators, registry, and reconcilers.
// Purpose: Own the shared registry and expose both reconcile entry points.
// Dependencies: crate::{audit, interfaces, runtime}, tokio-util
// ============================================================================

//! ## Overview
//! [`OriginIssuerController`] owns the [`ProvisionerRegistry`] and hands the
//! same instance to both reconcilers. A host scheduler calls the entry points
//! on change events; the controller keeps no other state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::audit::AuditSink;
use crate::core::CertificateRequest;
use crate::core::IssuerName;
use crate::core::ObjectKey;
use crate::core::OriginIssuer;
use crate::interfaces::ApprovalOracle;
use crate::interfaces::CertificateRequestStore;
use crate::interfaces::ClientFactory;
use crate::interfaces::Clock;
use crate::interfaces::IssuerStore;
use crate::interfaces::SecretStore;
use crate::runtime::issuer::IssuerReconciler;
use crate::runtime::issuer::IssuerReconcilerConfig;
use crate::runtime::reconcile::ReconcileAction;
use crate::runtime::reconcile::ReconcileError;
use crate::runtime::registry::ProvisionerRegistry;
use crate::runtime::request::CertificateRequestReconciler;
use crate::runtime::request::RequestReconcilerConfig;

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// External collaborators shared by both reconcilers.
#[derive(Clone)]
pub struct Collaborators {
    /// Issuer resource store.
    pub issuers: Arc<dyn IssuerStore>,
    /// Certificate request resource store.
    pub requests: Arc<dyn CertificateRequestStore>,
    /// Secret store holding service keys.
    pub secrets: Arc<dyn SecretStore>,
    /// Builds CA clients from service keys.
    pub client_factory: Arc<dyn ClientFactory>,
    /// Approval policy.
    pub approval: Arc<dyn ApprovalOracle>,
    /// Time source for condition timestamps.
    pub clock: Arc<dyn Clock>,
    /// Audit sink for step events.
    pub audit: Arc<dyn AuditSink>,
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Issuer reconciler settings.
    pub issuer: IssuerReconcilerConfig,
    /// Request reconciler settings.
    pub request: RequestReconcilerConfig,
}

/// Process-root controller.
pub struct OriginIssuerController {
    /// Registry shared by both reconcilers.
    registry: Arc<ProvisionerRegistry>,
    /// Issuer reconciler.
    issuers: IssuerReconciler,
    /// Certificate request reconciler.
    requests: CertificateRequestReconciler,
}

impl OriginIssuerController {
    /// Builds a controller with a fresh registry.
    #[must_use]
    pub fn new(collaborators: Collaborators, config: ControllerConfig) -> Self {
        let registry = Arc::new(ProvisionerRegistry::new());
        let issuers =
            IssuerReconciler::new(collaborators.clone(), Arc::clone(&registry), config.issuer);
        let requests =
            CertificateRequestReconciler::new(collaborators, Arc::clone(&registry), config.request);
        Self {
            registry,
            issuers,
            requests,
        }
    }

    /// Returns the shared registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ProvisionerRegistry> {
        &self.registry
    }

    /// Returns the issuer reconciler.
    #[must_use]
    pub const fn issuer_reconciler(&self) -> &IssuerReconciler {
        &self.issuers
    }

    /// Returns the certificate request reconciler.
    #[must_use]
    pub const fn request_reconciler(&self) -> &CertificateRequestReconciler {
        &self.requests
    }

    /// Reconciles an issuer.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the host should retry.
    pub async fn reconcile_issuer(
        &self,
        issuer: OriginIssuer,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        self.issuers.reconcile(issuer, cancel).await
    }

    /// Fetches and reconciles an issuer by name.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the host should retry.
    pub async fn reconcile_issuer_key(
        &self,
        name: &IssuerName,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        self.issuers.reconcile_key(name, cancel).await
    }

    /// Handles an issuer deletion notification.
    pub fn issuer_deleted(&self, name: &IssuerName) -> bool {
        self.issuers.handle_deleted(name)
    }

    /// Reconciles a certificate request.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the host should retry.
    pub async fn reconcile_request(
        &self,
        request: CertificateRequest,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        self.requests.reconcile(request, cancel).await
    }

    /// Fetches and reconciles a certificate request by key.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the host should retry.
    pub async fn reconcile_request_key(
        &self,
        key: &ObjectKey,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReconcileError> {
        self.requests.reconcile_key(key, cancel).await
    }
}
