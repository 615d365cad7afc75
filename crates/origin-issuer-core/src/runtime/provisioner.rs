// crates/origin-issuer-core/src/runtime/provisioner.rs
// ============================================================================
// Module: Provisioner
// Description: Signing capability bound to one CA client and one algorithm.
// Purpose: Turn a certificate request into exactly one Origin CA signing call.
// Dependencies: crate::{core, interfaces}, pem, x509-parser
// ============================================================================

//! ## Overview
//! A [`Provisioner`] is built only by a successful issuer reconcile. It holds
//! no mutable state, so many request reconciles may sign through the same
//! instance at once. CSR parsing happens locally before the CA is contacted;
//! CA errors are returned unchanged so callers can tell a rejection from a
//! transport failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::extensions::GeneralName;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::FromDer;

use crate::core::CertificateRequest;
use crate::core::RequestType;
use crate::interfaces::OriginCaClient;
use crate::interfaces::SignError;
use crate::interfaces::SignRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Validity periods, in days, accepted by the Origin CA.
pub const ALLOWED_VALIDITY_DAYS: [u32; 7] = [7, 30, 90, 365, 730, 1095, 5475];

/// Validity used when the request does not ask for a duration.
pub const DEFAULT_VALIDITY_DAYS: u32 = 90;

/// Seconds per day.
const SECONDS_PER_DAY: u64 = 86_400;

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Signing capability for one issuer.
pub struct Provisioner {
    /// Authenticated Origin CA client.
    client: Arc<dyn OriginCaClient>,
    /// Algorithm requested on every signing call.
    request_type: RequestType,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner").field("request_type", &self.request_type).finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Binds a client to a validated request type.
    ///
    /// The request type is parsed during issuer validation, so binding cannot
    /// fail.
    #[must_use]
    pub fn new(client: Arc<dyn OriginCaClient>, request_type: RequestType) -> Self {
        Self {
            client,
            request_type,
        }
    }

    /// Returns the bound request type.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        self.request_type
    }

    /// Signs the request's CSR and returns the certificate PEM bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidRequest`] when the CSR cannot be parsed, and
    /// passes CA client errors through unchanged.
    pub async fn sign(&self, request: &CertificateRequest) -> Result<Vec<u8>, SignError> {
        let csr = std::str::from_utf8(&request.spec.request)
            .map_err(|_| SignError::InvalidRequest("csr is not valid utf-8".to_string()))?;
        let hostnames = csr_hostnames(csr.as_bytes())?;
        let sign_request = SignRequest {
            hostnames,
            validity_days: closest_validity_days(request.spec.duration),
            request_type: self.request_type,
            csr: csr.to_string(),
        };
        let response = self.client.sign(&sign_request).await?;
        Ok(response.certificate.into_bytes())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Picks the accepted validity closest to the requested duration.
///
/// Ties resolve to the shorter validity.
#[must_use]
pub fn closest_validity_days(duration: Option<Duration>) -> u32 {
    let Some(duration) = duration else {
        return DEFAULT_VALIDITY_DAYS;
    };
    let requested = duration.as_secs() / SECONDS_PER_DAY;
    let mut best = DEFAULT_VALIDITY_DAYS;
    let mut best_diff = u64::MAX;
    for days in ALLOWED_VALIDITY_DAYS {
        let diff = u64::from(days).abs_diff(requested);
        if diff < best_diff {
            best = days;
            best_diff = diff;
        }
    }
    best
}

/// Extracts hostnames from a PEM CSR.
///
/// DNS subject-alternative names are used in order; the subject common name
/// is the fallback when no DNS names are requested.
///
/// # Errors
///
/// Returns [`SignError::InvalidRequest`] when the CSR cannot be decoded or names no hostnames.
pub fn csr_hostnames(csr_pem: &[u8]) -> Result<Vec<String>, SignError> {
    let block = pem::parse(csr_pem)
        .map_err(|err| SignError::InvalidRequest(format!("csr pem decode failed: {err}")))?;
    if !block.tag().ends_with("CERTIFICATE REQUEST") {
        return Err(SignError::InvalidRequest(format!(
            "unexpected pem block \"{}\", expected a certificate request",
            block.tag()
        )));
    }
    let (_, csr) = X509CertificationRequest::from_der(block.contents())
        .map_err(|err| SignError::InvalidRequest(format!("csr parse failed: {err}")))?;

    let mut hostnames: Vec<String> = Vec::new();
    if let Some(extensions) = csr.requested_extensions() {
        for extension in extensions {
            let ParsedExtension::SubjectAlternativeName(san) = extension else {
                continue;
            };
            for name in &san.general_names {
                if let GeneralName::DNSName(dns) = name
                    && !hostnames.iter().any(|existing| existing == dns)
                {
                    hostnames.push((*dns).to_string());
                }
            }
        }
    }
    if hostnames.is_empty()
        && let Some(common_name) = csr
            .certification_request_info
            .subject
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
    {
        hostnames.push(common_name.to_string());
    }
    if hostnames.is_empty() {
        return Err(SignError::InvalidRequest("csr does not name any hostnames".to_string()));
    }
    Ok(hostnames)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_defaults_to_ninety_days() {
        assert_eq!(closest_validity_days(None), 90);
    }

    #[test]
    fn validity_rounds_to_nearest_allowed_value() {
        let day = Duration::from_secs(SECONDS_PER_DAY);
        assert_eq!(closest_validity_days(Some(day)), 7);
        assert_eq!(closest_validity_days(Some(day * 45)), 30);
        assert_eq!(closest_validity_days(Some(day * 200)), 90);
        assert_eq!(closest_validity_days(Some(day * 366)), 365);
        assert_eq!(closest_validity_days(Some(day * 20_000)), 5475);
    }

    #[test]
    fn validity_ties_prefer_shorter_period() {
        let day = Duration::from_secs(SECONDS_PER_DAY);
        assert_eq!(closest_validity_days(Some(day * 60)), 30);
    }

    #[test]
    fn hostnames_reject_non_pem_input() {
        let err = csr_hostnames(b"not a csr").unwrap_err();
        assert!(matches!(err, SignError::InvalidRequest(_)));
    }
}
