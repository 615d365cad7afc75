// crates/origin-issuer-core/src/lib.rs
// ============================================================================
// Module: Origin Issuer Core Library
// Description: Public API surface for the Origin CA issuer controller core.
// Purpose: Expose resource types, collaborator interfaces, and reconcilers.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Origin issuer core decides when a Cloudflare Origin CA signing call is made
//! and how its outcome is surfaced on resource status. Issuers are verified
//! and their signing capabilities published into a shared registry; signing
//! requests consume that registry through an ordered gate sequence.
//!
//! The core is host-agnostic: resource stores, secrets, CA clients, approval
//! policy, and time all come in through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use audit::AuditLevel;
pub use audit::AuditSink;
pub use audit::EventOutcome;
pub use audit::FileAuditSink;
pub use audit::LevelFilter;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ReconcileEvent;
pub use audit::ReconcileEventParams;
pub use audit::ResourceKind;
pub use audit::StderrAuditSink;
pub use interfaces::ApprovalOracle;
pub use interfaces::CertificateRequestStore;
pub use interfaces::ClientError;
pub use interfaces::ClientFactory;
pub use interfaces::Clock;
pub use interfaces::ConditionApprovalOracle;
pub use interfaces::IssuerStore;
pub use interfaces::OriginCaClient;
pub use interfaces::Secret;
pub use interfaces::SecretStore;
pub use interfaces::SignError;
pub use interfaces::SignRequest;
pub use interfaces::SignResponse;
pub use interfaces::StoreError;
pub use interfaces::SystemClock;
pub use runtime::CertificateRequestReconciler;
pub use runtime::Collaborators;
pub use runtime::ControllerConfig;
pub use runtime::ErrorKind;
pub use runtime::FixedClock;
pub use runtime::GateOutcome;
pub use runtime::InMemoryCertificateRequestStore;
pub use runtime::InMemoryIssuerStore;
pub use runtime::InMemorySecretStore;
pub use runtime::IssuerReconciler;
pub use runtime::IssuerReconcilerConfig;
pub use runtime::OriginIssuerController;
pub use runtime::Provisioner;
pub use runtime::ProvisionerRegistry;
pub use runtime::REQUEST_GATES;
pub use runtime::ReconcileAction;
pub use runtime::ReconcileError;
pub use runtime::RegistryEviction;
pub use runtime::RequestGate;
pub use runtime::RequestReconcilerConfig;
pub use runtime::StaticClientFactory;
pub use runtime::StatusUpdate;
