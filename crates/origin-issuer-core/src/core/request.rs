// crates/origin-issuer-core/src/core/request.rs
// ============================================================================
// Module: Certificate Request Resource
// Description: Signing request model and well-known condition reasons.
// Purpose: Describe one CSR awaiting issuance and its observable outcome.
// Dependencies: crate::core::{condition, identifiers, time, wire}, serde
// ============================================================================

//! ## Overview
//! A [`CertificateRequest`] names an issuer and carries a PEM-encoded CSR.
//! Once `status.certificate` is non-empty the request is never signed again,
//! and a `Ready=False` condition with reason `Denied` or `Failed` is terminal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::condition::ConditionStatus;
use crate::core::condition::ConditionType;
use crate::core::condition::Conditions;
use crate::core::condition::HasConditions;
use crate::core::identifiers::ISSUER_GROUP;
use crate::core::identifiers::IssuerName;
use crate::core::identifiers::ObjectKey;
use crate::core::time::Timestamp;
use crate::core::wire::base64_bytes;
use crate::core::wire::go_duration;

// ============================================================================
// SECTION: Reasons
// ============================================================================

/// Ready reason while the request waits on its issuer.
pub const REASON_PENDING: &str = "Pending";
/// Terminal Ready reason after a signing failure.
pub const REASON_FAILED: &str = "Failed";
/// Ready reason after a certificate was issued.
pub const REASON_ISSUED: &str = "Issued";
/// Terminal Ready reason after an approval controller denied the request.
pub const REASON_DENIED: &str = "Denied";

// ============================================================================
// SECTION: Request Resource
// ============================================================================

/// Reference from a request to the issuer that should sign it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerRef {
    /// Issuer name (looked up cluster-wide).
    pub name: String,
    /// Issuer kind label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Issuer API group; empty means this controller's group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
}

impl IssuerRef {
    /// Returns true when the reference targets this controller's group.
    #[must_use]
    pub fn is_own_group(&self) -> bool {
        self.group.is_empty() || self.group == ISSUER_GROUP
    }

    /// Returns the referenced issuer identity.
    #[must_use]
    pub fn issuer_name(&self) -> IssuerName {
        IssuerName::new(self.name.clone())
    }
}

/// Request input supplied by the certificate owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestSpec {
    /// Issuer that should sign the request.
    pub issuer_ref: IssuerRef,
    /// PEM-encoded certificate signing request (base64 on the wire).
    #[serde(default, with = "base64_bytes")]
    pub request: Vec<u8>,
    /// Whether a CA certificate is requested.
    #[serde(default, rename = "isCA")]
    pub is_ca: bool,
    /// Requested certificate lifetime, a Go duration string on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "go_duration")]
    pub duration: Option<Duration>,
}

/// Request status written by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequestStatus {
    /// Status conditions; the controller manages `Ready`.
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
    /// Issued certificate PEM; empty until issued.
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub certificate: Vec<u8>,
    /// Time the request was first marked as failed or denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_time: Option<Timestamp>,
}

impl HasConditions for CertificateRequestStatus {
    fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }
}

/// Namespaced certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    /// Request identity.
    pub key: ObjectKey,
    /// Desired state.
    pub spec: CertificateRequestSpec,
    /// Observed state.
    #[serde(default)]
    pub status: CertificateRequestStatus,
}

impl CertificateRequest {
    /// Creates a request with an empty status.
    #[must_use]
    pub fn new(key: ObjectKey, spec: CertificateRequestSpec) -> Self {
        Self {
            key,
            spec,
            status: CertificateRequestStatus::default(),
        }
    }

    /// Returns true when `Ready=True` is present.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status.conditions.is_true(&ConditionType::Ready)
    }

    /// Returns true when `Ready=False` with the given reason is present.
    #[must_use]
    pub fn has_ready_false(&self, reason: &str) -> bool {
        self.status.conditions.has(&ConditionType::Ready, ConditionStatus::False, Some(reason))
    }

    /// Returns true when a certificate has already been issued.
    #[must_use]
    pub fn is_issued(&self) -> bool {
        !self.status.certificate.is_empty()
    }
}
