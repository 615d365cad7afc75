// crates/origin-issuer-cfapi/src/lib.rs
// ============================================================================
// Module: Origin Issuer Cloudflare API
// Description: Origin CA HTTP client and client factory.
// Purpose: Implement the core signing capability against the Cloudflare API.
// Dependencies: origin-issuer-core, reqwest, serde, url
// ============================================================================

//! ## Overview
//! This crate provides the production [`OriginCaClient`] and [`ClientFactory`]
//! implementations used by the issuer reconciler. Each client is bound to a
//! single service key and performs one HTTPS call per signing request.
//! Invariants:
//! - Cleartext endpoints are refused unless explicitly allowed.
//! - Response bodies are size-limited and undecodable bodies fail closed.
//!
//! Security posture: the service key is a credential and is never logged.
//!
//! [`OriginCaClient`]: origin_issuer_core::OriginCaClient
//! [`ClientFactory`]: origin_issuer_core::ClientFactory

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod factory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::CfApiClient;
pub use client::CfApiClientConfig;
pub use client::CfApiError;
pub use client::DEFAULT_ENDPOINT;
pub use client::DEFAULT_MAX_RESPONSE_BYTES;
pub use client::SERVICE_KEY_HEADER;
pub use factory::CfApiFactory;
