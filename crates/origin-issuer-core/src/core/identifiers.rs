// crates/origin-issuer-core/src/core/identifiers.rs
// ============================================================================
// Module: Origin Issuer Identifiers
// Description: Identity types for issuers, namespaced objects, and the issuer group.
// Purpose: Provide strongly typed, serializable identities with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Issuers are cluster-scoped and identified by name alone. Certificate
//! requests and secrets are namespaced and identified by an [`ObjectKey`].
//! Identifiers are opaque; no normalization is applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// API group served by this issuer implementation.
pub const ISSUER_GROUP: &str = "cert-manager.k8s.cloudflare.com";

/// Resource kind label for issuers.
pub const ISSUER_KIND: &str = "OriginIssuer";

/// Resource kind label for certificate requests.
pub const CERTIFICATE_REQUEST_KIND: &str = "CertificateRequest";

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Cluster-scoped issuer identity.
///
/// # Invariants
/// - Opaque UTF-8 string; lookups ignore any namespace qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuerName(String);

impl IssuerName {
    /// Creates a new issuer name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssuerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for IssuerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IssuerName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Namespaced object identity (namespace + name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Object namespace.
    pub namespace: String,
    /// Object name.
    pub name: String,
}

impl ObjectKey {
    /// Creates a new object key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            return self.name.fmt(f);
        }
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
