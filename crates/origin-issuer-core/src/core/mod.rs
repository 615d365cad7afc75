// crates/origin-issuer-core/src/core/mod.rs
// ============================================================================
// Module: Origin Issuer Core Types
// Description: Resource, condition, identity, and time models.
// Purpose: Define the persisted data model shared by both reconcilers.
// Dependencies: base64, serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types describe what is persisted on issuer and request resources.
//! They carry no I/O; reconcilers mutate them and hand them to the stores.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod condition;
pub mod identifiers;
pub mod issuer;
pub mod request;
pub mod time;
pub mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::Condition;
pub use condition::ConditionChange;
pub use condition::ConditionStatus;
pub use condition::ConditionType;
pub use condition::Conditions;
pub use condition::HasConditions;
pub use condition::set_condition;
pub use identifiers::CERTIFICATE_REQUEST_KIND;
pub use identifiers::ISSUER_GROUP;
pub use identifiers::ISSUER_KIND;
pub use identifiers::IssuerName;
pub use identifiers::ObjectKey;
pub use issuer::IssuerAuthentication;
pub use issuer::OriginIssuer;
pub use issuer::OriginIssuerSpec;
pub use issuer::OriginIssuerStatus;
pub use issuer::REASON_ERROR;
pub use issuer::REASON_NOT_FOUND;
pub use issuer::REASON_VERIFIED;
pub use issuer::RequestType;
pub use issuer::SecretKeySelector;
pub use issuer::UnknownRequestType;
pub use issuer::ValidatedIssuerSpec;
pub use issuer::ValidationError;
pub use request::CertificateRequest;
pub use request::CertificateRequestSpec;
pub use request::CertificateRequestStatus;
pub use request::IssuerRef;
pub use request::REASON_DENIED;
pub use request::REASON_FAILED;
pub use request::REASON_ISSUED;
pub use request::REASON_PENDING;
pub use self::time::Timestamp;
