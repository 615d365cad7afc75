// crates/origin-issuer-cfapi/src/factory.rs
// ============================================================================
// Module: Origin CA Client Factory
// Description: Builds Origin CA clients from raw service key bytes.
// Purpose: Bridge secret material into authenticated HTTP clients.
// Dependencies: origin-issuer-core
// ============================================================================

//! ## Overview
//! [`CfApiFactory`] implements [`ClientFactory`] for the issuer reconciler.
//! The endpoint is checked once at construction; each `build` call only has
//! to vet the key bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use origin_issuer_core::ClientError;
use origin_issuer_core::ClientFactory;
use origin_issuer_core::OriginCaClient;

use crate::client::CfApiClient;
use crate::client::CfApiClientConfig;
use crate::client::CfApiError;

// ============================================================================
// SECTION: Factory
// ============================================================================

/// Client factory producing [`CfApiClient`]s.
#[derive(Debug, Clone)]
pub struct CfApiFactory {
    /// Settings shared by every built client.
    config: CfApiClientConfig,
}

impl CfApiFactory {
    /// Creates a factory after checking the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CfApiError`] when the endpoint is unusable.
    pub fn new(config: CfApiClientConfig) -> Result<Self, CfApiError> {
        config.certificates_url()?;
        Ok(Self {
            config,
        })
    }

    /// Returns the client settings.
    #[must_use]
    pub const fn config(&self) -> &CfApiClientConfig {
        &self.config
    }
}

impl ClientFactory for CfApiFactory {
    fn build(&self, service_key: &[u8]) -> Result<Arc<dyn OriginCaClient>, ClientError> {
        let key = std::str::from_utf8(service_key).map_err(|_| {
            ClientError::InvalidCredential("service key is not valid UTF-8".to_string())
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ClientError::InvalidCredential("service key is empty".to_string()));
        }
        let client = CfApiClient::new(&self.config, key).map_err(|err| match err {
            CfApiError::InvalidServiceKey(detail) => ClientError::InvalidCredential(detail),
            other => ClientError::Build(other.to_string()),
        })?;
        Ok(Arc::new(client))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
