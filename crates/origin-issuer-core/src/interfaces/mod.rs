// crates/origin-issuer-core/src/interfaces/mod.rs
// ============================================================================
// Module: Origin Issuer Interfaces
// Description: Collaborator contracts for stores, secrets, CA clients, and policy.
// Purpose: Define the boundary between the reconcilers and their host.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Reconcilers talk to the outside world only through these traits. Resource
//! and secret stores are assumed strongly consistent per object with no
//! cross-object transactions. CA clients are built from raw service key bytes
//! by a [`ClientFactory`] and expose a single `sign` call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::CertificateRequest;
use crate::core::ConditionType;
use crate::core::IssuerName;
use crate::core::ObjectKey;
use crate::core::OriginIssuer;
use crate::core::RequestType;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Resource and secret store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("{resource} \"{name}\" not found")]
    NotFound {
        /// Plural resource label (for example `secrets`).
        resource: &'static str,
        /// Object name.
        name: String,
    },
    /// The write lost a race with another writer.
    #[error("conflict updating {resource} \"{name}\": {message}")]
    Conflict {
        /// Plural resource label.
        resource: &'static str,
        /// Object name.
        name: String,
        /// Store-provided detail.
        message: String,
    },
    /// The store could not be reached or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for a missing object.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// SECTION: Resource Stores
// ============================================================================

/// Store for cluster-scoped issuers.
#[async_trait]
pub trait IssuerStore: Send + Sync {
    /// Fetches an issuer by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the issuer does not exist.
    async fn get(&self, name: &IssuerName) -> Result<OriginIssuer, StoreError>;

    /// Persists the issuer status subresource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn update_status(&self, issuer: &OriginIssuer) -> Result<(), StoreError>;
}

/// Store for namespaced certificate requests.
#[async_trait]
pub trait CertificateRequestStore: Send + Sync {
    /// Fetches a request by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the request does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<CertificateRequest, StoreError>;

    /// Persists the request status subresource.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn update_status(&self, request: &CertificateRequest) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Secret Store
// ============================================================================

/// Secret object holding raw credential material.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    /// Secret identity.
    pub key: ObjectKey,
    /// Secret data keyed by entry name.
    pub data: BTreeMap<String, Vec<u8>>,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("key", &self.key)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Store for secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches a secret by namespace and name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the secret does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<Secret, StoreError>;
}

// ============================================================================
// SECTION: Origin CA Client
// ============================================================================

/// Client construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The credential bytes are unusable.
    #[error("invalid service key: {0}")]
    InvalidCredential(String),
    /// The client could not be constructed.
    #[error("client construction failed: {0}")]
    Build(String),
}

/// Signing errors, keeping CA rejections apart from transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The CA refused the request.
    #[error("origin ca rejected request (code {code}): {message}")]
    Rejected {
        /// CA error code.
        code: i64,
        /// CA error message.
        message: String,
    },
    /// The CA could not be reached or answered with an unusable response.
    #[error("origin ca transport error: {0}")]
    Transport(String),
    /// The request could not be prepared locally.
    #[error("invalid certificate request: {0}")]
    InvalidRequest(String),
}

impl SignError {
    /// Returns true when the CA itself refused the request.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Payload for a single Origin CA signing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    /// Hostnames the certificate covers.
    pub hostnames: Vec<String>,
    /// Requested validity in days.
    pub validity_days: u32,
    /// Requested signature algorithm.
    pub request_type: RequestType,
    /// PEM-encoded CSR.
    pub csr: String,
}

/// Signed certificate returned by the Origin CA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignResponse {
    /// PEM-encoded certificate.
    pub certificate: String,
}

/// Authenticated Origin CA client.
#[async_trait]
pub trait OriginCaClient: Send + Sync {
    /// Performs exactly one signing call.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Rejected`] when the CA refuses the request and
    /// [`SignError::Transport`] when the CA cannot be reached.
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse, SignError>;
}

/// Builds authenticated CA clients from raw credential bytes.
pub trait ClientFactory: Send + Sync {
    /// Builds a client bound to the given service key.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the key is unusable or the client cannot be built.
    fn build(&self, service_key: &[u8]) -> Result<Arc<dyn OriginCaClient>, ClientError>;
}

// ============================================================================
// SECTION: Approval Oracle
// ============================================================================

/// Approval policy consulted by the request reconciler.
pub trait ApprovalOracle: Send + Sync {
    /// Returns true when the request has been approved.
    fn is_approved(&self, request: &CertificateRequest) -> bool;

    /// Returns true when the request has been denied.
    fn is_denied(&self, request: &CertificateRequest) -> bool;
}

/// Approval oracle reading `Approved` and `Denied` conditions off the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionApprovalOracle;

impl ApprovalOracle for ConditionApprovalOracle {
    fn is_approved(&self, request: &CertificateRequest) -> bool {
        request.status.conditions.is_true(&ConditionType::Approved)
    }

    fn is_denied(&self, request: &CertificateRequest) -> bool {
        request.status.conditions.is_true(&ConditionType::Denied)
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source for condition and failure timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now_utc()
    }
}
