// crates/origin-issuer-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures, a recording CA client, and a test harness.
// Purpose: Wire both reconcilers against in-memory collaborators.
// Dependencies: origin-issuer-core, rcgen, tokio
// ============================================================================

//! ## Overview
//! [`Harness`] owns one of every in-memory collaborator plus a
//! [`RecordingCaClient`], so tests can drive reconciles and then inspect
//! stored status, call counts, and audit events.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures may panic on setup failures."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use origin_issuer_core::CertificateRequest;
use origin_issuer_core::CertificateRequestSpec;
use origin_issuer_core::Collaborators;
use origin_issuer_core::ConditionApprovalOracle;
use origin_issuer_core::ConditionStatus;
use origin_issuer_core::ConditionType;
use origin_issuer_core::ControllerConfig;
use origin_issuer_core::FixedClock;
use origin_issuer_core::InMemoryCertificateRequestStore;
use origin_issuer_core::InMemoryIssuerStore;
use origin_issuer_core::InMemorySecretStore;
use origin_issuer_core::IssuerAuthentication;
use origin_issuer_core::IssuerRef;
use origin_issuer_core::MemoryAuditSink;
use origin_issuer_core::ObjectKey;
use origin_issuer_core::OriginCaClient;
use origin_issuer_core::OriginIssuer;
use origin_issuer_core::OriginIssuerController;
use origin_issuer_core::OriginIssuerSpec;
use origin_issuer_core::SecretKeySelector;
use origin_issuer_core::SignError;
use origin_issuer_core::SignRequest;
use origin_issuer_core::SignResponse;
use origin_issuer_core::StaticClientFactory;
use origin_issuer_core::Timestamp;
use rcgen::CertificateParams;
use rcgen::DistinguishedName;
use rcgen::DnType;
use rcgen::KeyPair;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service key stored in the issuer secret.
pub const SERVICE_KEY: &str = "djEuMC0weDAwQkFCMTBD";
/// Secret name referenced by fixture issuers.
pub const SECRET_NAME: &str = "service-key-issuer";
/// Secret data key referenced by fixture issuers.
pub const SECRET_KEY: &str = "key";
/// Secret namespace referenced by fixture issuers.
pub const SECRET_NAMESPACE: &str = "default";
/// Certificate PEM returned by the recording CA client.
pub const CERTIFICATE_PEM: &str =
    "-----BEGIN CERTIFICATE-----\nTUlJQ2VydGlmaWNhdGU=\n-----END CERTIFICATE-----\n";
/// Fixed instant used by the harness clock.
pub const NOW: i64 = 1_700_000_000;

// ============================================================================
// SECTION: Recording CA Client
// ============================================================================

/// Behavior of the recording CA client.
#[derive(Debug, Clone)]
pub enum CaBehavior {
    /// Return [`CERTIFICATE_PEM`].
    Issue,
    /// Return the error.
    Fail(SignError),
    /// Never complete.
    Hang,
}

/// CA client that records every signing call.
#[derive(Debug)]
pub struct RecordingCaClient {
    /// Configured behavior.
    behavior: Mutex<CaBehavior>,
    /// Requests seen, in call order.
    calls: Mutex<Vec<SignRequest>>,
}

impl RecordingCaClient {
    /// Creates a client with the given behavior.
    pub fn new(behavior: CaBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the client behavior.
    pub fn set_behavior(&self, behavior: CaBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Returns the recorded requests.
    pub fn calls(&self) -> Vec<SignRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of signing calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OriginCaClient for RecordingCaClient {
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse, SignError> {
        self.calls.lock().unwrap().push(request.clone());
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            CaBehavior::Issue => Ok(SignResponse {
                certificate: CERTIFICATE_PEM.to_string(),
            }),
            CaBehavior::Fail(error) => Err(error),
            CaBehavior::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// In-memory collaborators plus a controller.
pub struct Harness {
    /// Issuer store.
    pub issuers: Arc<InMemoryIssuerStore>,
    /// Request store.
    pub requests: Arc<InMemoryCertificateRequestStore>,
    /// Secret store.
    pub secrets: Arc<InMemorySecretStore>,
    /// CA client handed out by the factory.
    pub ca: Arc<RecordingCaClient>,
    /// Client factory.
    pub factory: Arc<StaticClientFactory>,
    /// Captured audit events.
    pub audit: Arc<MemoryAuditSink>,
    /// Clock used for condition timestamps.
    pub clock: Arc<FixedClock>,
    /// Controller under test.
    pub controller: OriginIssuerController,
}

impl Harness {
    /// Builds a harness with default configuration and a working CA.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Builds a harness with the configuration and a working CA.
    pub fn with_config(config: ControllerConfig) -> Self {
        let ca = Arc::new(RecordingCaClient::new(CaBehavior::Issue));
        let factory = Arc::new(StaticClientFactory::new(ca.clone()));
        Self::build(config, ca, factory)
    }

    /// Builds a harness with an explicit client factory.
    pub fn with_factory(config: ControllerConfig, factory: StaticClientFactory) -> Self {
        let ca = Arc::new(RecordingCaClient::new(CaBehavior::Issue));
        Self::build(config, ca, Arc::new(factory))
    }

    fn build(
        config: ControllerConfig,
        ca: Arc<RecordingCaClient>,
        factory: Arc<StaticClientFactory>,
    ) -> Self {
        let issuers = Arc::new(InMemoryIssuerStore::new());
        let requests = Arc::new(InMemoryCertificateRequestStore::new());
        let secrets = Arc::new(InMemorySecretStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let clock = Arc::new(FixedClock::new(at(NOW)));
        let collaborators = Collaborators {
            issuers: issuers.clone(),
            requests: requests.clone(),
            secrets: secrets.clone(),
            client_factory: factory.clone(),
            approval: Arc::new(ConditionApprovalOracle),
            clock: clock.clone(),
            audit: audit.clone(),
        };
        let controller = OriginIssuerController::new(collaborators, config);
        Self {
            issuers,
            requests,
            secrets,
            ca,
            factory,
            audit,
            clock,
            controller,
        }
    }

    /// Stores the fixture service key secret.
    pub fn insert_service_key(&self) {
        self.secrets.insert_key(SECRET_NAMESPACE, SECRET_NAME, SECRET_KEY, SERVICE_KEY);
    }

    /// Stores an issuer and returns it.
    pub fn insert_issuer(&self, issuer: OriginIssuer) -> OriginIssuer {
        self.issuers.insert(issuer.clone());
        issuer
    }

    /// Stores a request and returns it.
    pub fn insert_request(&self, request: CertificateRequest) -> CertificateRequest {
        self.requests.insert(request.clone());
        request
    }

    /// Returns the stored issuer.
    pub fn stored_issuer(&self, name: &str) -> OriginIssuer {
        self.issuers.issuer(&name.into()).expect("issuer stored")
    }

    /// Returns the stored request.
    pub fn stored_request(&self, key: &ObjectKey) -> CertificateRequest {
        self.requests.request(key).expect("request stored")
    }
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns a timestamp at the given unix second.
pub fn at(seconds: i64) -> Timestamp {
    Timestamp::from_unix_seconds(seconds).expect("valid timestamp")
}

/// Builds an issuer referencing the fixture secret.
pub fn issuer(name: &str) -> OriginIssuer {
    OriginIssuer::new(
        name,
        OriginIssuerSpec {
            request_type: "OriginECC".to_string(),
            auth: IssuerAuthentication {
                service_key_ref: SecretKeySelector {
                    name: SECRET_NAME.to_string(),
                    key: SECRET_KEY.to_string(),
                    namespace: SECRET_NAMESPACE.to_string(),
                },
            },
        },
    )
}

/// Builds an issuer already carrying `Ready=True/Verified`.
pub fn ready_issuer(name: &str) -> OriginIssuer {
    let mut issuer = issuer(name);
    issuer.status.conditions.set(
        ConditionType::Ready,
        ConditionStatus::True,
        "Verified",
        "ready",
        at(NOW - 60),
    );
    issuer
}

/// Builds a request for the named issuer with a CSR for `example.com`.
pub fn request(name: &str, issuer: &str) -> CertificateRequest {
    CertificateRequest::new(
        ObjectKey::new("default", name),
        CertificateRequestSpec {
            issuer_ref: IssuerRef {
                name: issuer.to_string(),
                kind: "OriginIssuer".to_string(),
                group: "cert-manager.k8s.cloudflare.com".to_string(),
            },
            request: csr_pem(&["example.com", "www.example.com"]).into_bytes(),
            is_ca: false,
            duration: None,
        },
    )
}

/// Adds a condition with the given type and status to a request.
pub fn with_condition(
    mut request: CertificateRequest,
    condition_type: ConditionType,
    status: ConditionStatus,
    reason: &str,
) -> CertificateRequest {
    request.status.conditions.set(condition_type, status, reason, "", at(NOW - 30));
    request
}

/// Generates a PEM CSR requesting the DNS names.
pub fn csr_pem(names: &[&str]) -> String {
    let names: Vec<String> = names.iter().map(|name| (*name).to_string()).collect();
    let params = CertificateParams::new(names).expect("csr params");
    let key = KeyPair::generate().expect("key pair");
    params.serialize_request(&key).expect("csr").pem().expect("csr pem")
}

/// Generates a PEM CSR carrying only a subject common name.
pub fn csr_pem_common_name(common_name: Option<&str>) -> String {
    let mut params = CertificateParams::default();
    let mut subject = DistinguishedName::new();
    if let Some(common_name) = common_name {
        subject.push(DnType::CommonName, common_name);
    }
    params.distinguished_name = subject;
    let key = KeyPair::generate().expect("key pair");
    params.serialize_request(&key).expect("csr").pem().expect("csr pem")
}
