// crates/origin-issuer-core/tests/provisioner.rs
// ============================================================================
// Module: Provisioner Tests
// Description: CSR parsing, validity selection, and CA call shaping.
// Purpose: Ensure each sign performs exactly one well-formed CA call.
// Dependencies: origin-issuer-core, rcgen, tokio
// ============================================================================

//! Provisioner tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::CERTIFICATE_PEM;
use common::CaBehavior;
use common::RecordingCaClient;
use common::csr_pem;
use common::csr_pem_common_name;
use common::issuer;
use common::request;
use origin_issuer_core::Provisioner;
use origin_issuer_core::RequestType;
use origin_issuer_core::SignError;
use origin_issuer_core::runtime::csr_hostnames;

#[test]
fn new_binds_validated_request_type() {
    let client = Arc::new(RecordingCaClient::new(CaBehavior::Issue));
    let validated = issuer("foo").spec.validate().unwrap();
    let provisioner = Provisioner::new(client, validated.request_type);
    assert_eq!(provisioner.request_type(), RequestType::OriginEcc);
}

#[test]
fn hostnames_come_from_dns_subject_alternative_names() {
    let pem = csr_pem(&["example.com", "*.example.com"]);
    let hostnames = csr_hostnames(pem.as_bytes()).unwrap();
    assert_eq!(hostnames, vec!["example.com".to_string(), "*.example.com".to_string()]);
}

#[test]
fn hostnames_fall_back_to_common_name() {
    let pem = csr_pem_common_name(Some("origin.example.com"));
    let hostnames = csr_hostnames(pem.as_bytes()).unwrap();
    assert_eq!(hostnames, vec!["origin.example.com".to_string()]);
}

#[test]
fn csr_without_hostnames_is_invalid() {
    let pem = csr_pem_common_name(None);
    let err = csr_hostnames(pem.as_bytes()).unwrap_err();
    assert!(matches!(err, SignError::InvalidRequest(_)));
}

#[tokio::test]
async fn sign_issues_one_call_with_request_details() {
    let client = Arc::new(RecordingCaClient::new(CaBehavior::Issue));
    let provisioner = Provisioner::new(client.clone(), RequestType::OriginRsa);
    let mut cr = request("web", "foo");
    cr.spec.duration = Some(Duration::from_secs(400 * 86_400));

    let certificate = provisioner.sign(&cr).await.unwrap();

    assert_eq!(certificate, CERTIFICATE_PEM.as_bytes());
    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request_type, RequestType::OriginRsa);
    assert_eq!(calls[0].validity_days, 365);
    assert_eq!(calls[0].hostnames, vec!["example.com", "www.example.com"]);
    assert!(calls[0].csr.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
}

#[tokio::test]
async fn sign_passes_ca_rejection_through_unchanged() {
    let rejection = SignError::Rejected {
        code: 1010,
        message: "invalid hostname".to_string(),
    };
    let client = Arc::new(RecordingCaClient::new(CaBehavior::Fail(rejection.clone())));
    let provisioner = Provisioner::new(client, RequestType::OriginEcc);
    let err = provisioner.sign(&request("web", "foo")).await.unwrap_err();
    assert_eq!(err, rejection);
    assert!(err.is_rejected());
}

#[tokio::test]
async fn sign_rejects_malformed_csr_without_calling_ca() {
    let client = Arc::new(RecordingCaClient::new(CaBehavior::Issue));
    let provisioner = Provisioner::new(client.clone(), RequestType::OriginEcc);
    let mut cr = request("web", "foo");
    cr.spec.request = b"-----BEGIN CERTIFICATE REQUEST-----\nAAAA\n-----END CERTIFICATE REQUEST-----\n".to_vec();
    let err = provisioner.sign(&cr).await.unwrap_err();
    assert!(matches!(err, SignError::InvalidRequest(_)));
    assert_eq!(client.call_count(), 0);
}
