// crates/origin-issuer-core/src/core/issuer.rs
// ============================================================================
// Module: Origin Issuer Resource
// Description: Issuer resource model, request types, and spec validation.
// Purpose: Describe a trusted signing credential and parse operator input.
// Dependencies: crate::core::{condition, identifiers}, serde, thiserror
// ============================================================================

//! ## Overview
//! An [`OriginIssuer`] binds a Cloudflare service key, stored in a secret, to
//! a requested signature algorithm. The spec is operator input and is never
//! mutated by the controller; only the status is written back.
//!
//! The request type is kept exactly as the operator wrote it. Validation
//! parses it into a [`RequestType`] so malformed input is rejected before any
//! external call happens.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::condition::Conditions;
use crate::core::condition::HasConditions;
use crate::core::identifiers::IssuerName;

// ============================================================================
// SECTION: Reasons
// ============================================================================

/// Ready reason after the issuer credential was verified.
pub const REASON_VERIFIED: &str = "Verified";
/// Ready reason when the credential secret or key is missing.
pub const REASON_NOT_FOUND: &str = "NotFound";
/// Ready reason for every other issuer failure.
pub const REASON_ERROR: &str = "Error";

// ============================================================================
// SECTION: Request Type
// ============================================================================

/// Signature algorithm requested from the Origin CA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// RSA-2048 signature.
    #[serde(rename = "OriginRSA")]
    OriginRsa,
    /// ECDSA P-256 signature.
    #[serde(rename = "OriginECC")]
    OriginEcc,
}

impl RequestType {
    /// Returns the wire label for the request type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OriginRsa => "OriginRSA",
            Self::OriginEcc => "OriginECC",
        }
    }

    /// Returns the value sent to the Origin CA API.
    #[must_use]
    pub const fn api_value(self) -> &'static str {
        match self {
            Self::OriginRsa => "origin-rsa",
            Self::OriginEcc => "origin-ecc",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognized request type label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized request type \"{0}\"")]
pub struct UnknownRequestType(pub String);

impl FromStr for RequestType {
    type Err = UnknownRequestType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "OriginRSA" => Ok(Self::OriginRsa),
            "OriginECC" => Ok(Self::OriginEcc),
            other => Err(UnknownRequestType(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Issuer Resource
// ============================================================================

/// Reference to a key inside a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    /// Secret name.
    #[serde(default)]
    pub name: String,
    /// Key inside the secret data map.
    #[serde(default)]
    pub key: String,
    /// Secret namespace; empty selects the cluster resource namespace.
    #[serde(default)]
    pub namespace: String,
}

/// Authentication settings for the Origin CA API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerAuthentication {
    /// Secret reference holding an API service key.
    #[serde(default)]
    pub service_key_ref: SecretKeySelector,
}

/// Operator-supplied issuer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginIssuerSpec {
    /// Requested signature algorithm as written by the operator.
    #[serde(default)]
    pub request_type: String,
    /// Origin CA authentication.
    #[serde(default)]
    pub auth: IssuerAuthentication,
}

/// Issuer status written by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginIssuerStatus {
    /// Status conditions; the controller manages `Ready`.
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
}

impl HasConditions for OriginIssuerStatus {
    fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.conditions
    }
}

/// Cluster-scoped Origin CA issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginIssuer {
    /// Issuer identity.
    pub name: IssuerName,
    /// Desired state.
    #[serde(default)]
    pub spec: OriginIssuerSpec,
    /// Observed state.
    #[serde(default)]
    pub status: OriginIssuerStatus,
}

impl OriginIssuer {
    /// Creates an issuer with an empty status.
    #[must_use]
    pub fn new(name: impl Into<IssuerName>, spec: OriginIssuerSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            status: OriginIssuerStatus::default(),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Spec validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    /// The request type is not a recognized value.
    #[error("spec.requestType has invalid value \"{0}\"")]
    InvalidRequestType(String),
}

/// Issuer spec after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIssuerSpec {
    /// Parsed request type.
    pub request_type: RequestType,
    /// Secret reference with non-empty name and key.
    pub service_key_ref: SecretKeySelector,
}

impl OriginIssuerSpec {
    /// Validates required fields and enum values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for the first failing field, checked in
    /// order: secret name, secret key, request type presence, request type value.
    pub fn validate(&self) -> Result<ValidatedIssuerSpec, ValidationError> {
        let selector = &self.auth.service_key_ref;
        if selector.name.is_empty() {
            return Err(ValidationError::Empty("spec.auth.serviceKeyRef.name"));
        }
        if selector.key.is_empty() {
            return Err(ValidationError::Empty("spec.auth.serviceKeyRef.key"));
        }
        if self.request_type.is_empty() {
            return Err(ValidationError::Empty("spec.requestType"));
        }
        let request_type = self
            .request_type
            .parse::<RequestType>()
            .map_err(|err| ValidationError::InvalidRequestType(err.0))?;
        Ok(ValidatedIssuerSpec {
            request_type,
            service_key_ref: selector.clone(),
        })
    }
}
