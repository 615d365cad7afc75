// crates/origin-issuer-core/src/runtime/mod.rs
// ============================================================================
// Module: Origin Issuer Runtime
// Description: Reconcilers, registry, provisioner, and in-memory collaborators.
// Purpose: Execute the issuer and certificate request state machines.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime holds the two reconcilers and the registry that connects them.
//! The reconcilers never call each other; they share only the registry and
//! the persisted issuer conditions.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod controller;
pub mod issuer;
pub mod memory;
pub mod provisioner;
pub mod reconcile;
pub mod registry;
pub mod request;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use controller::Collaborators;
pub use controller::ControllerConfig;
pub use controller::OriginIssuerController;
pub use issuer::DEFAULT_CLUSTER_RESOURCE_NAMESPACE;
pub use issuer::IssuerReconciler;
pub use issuer::IssuerReconcilerConfig;
pub use issuer::MESSAGE_VERIFIED;
pub use issuer::RegistryEviction;
pub use memory::FixedClock;
pub use memory::InMemoryCertificateRequestStore;
pub use memory::InMemoryIssuerStore;
pub use memory::InMemorySecretStore;
pub use memory::StaticClientFactory;
pub use provisioner::ALLOWED_VALIDITY_DAYS;
pub use provisioner::DEFAULT_VALIDITY_DAYS;
pub use provisioner::Provisioner;
pub use provisioner::closest_validity_days;
pub use provisioner::csr_hostnames;
pub use reconcile::ErrorKind;
pub use reconcile::GateOutcome;
pub use reconcile::ReconcileAction;
pub use reconcile::ReconcileError;
pub use reconcile::StatusUpdate;
pub use registry::ProvisionerRegistry;
pub use request::CertificateRequestReconciler;
pub use request::MESSAGE_DENIED;
pub use request::MESSAGE_ISSUED;
pub use request::REQUEST_GATES;
pub use request::RequestGate;
pub use request::RequestReconcilerConfig;
pub use request::evaluate_precondition;
