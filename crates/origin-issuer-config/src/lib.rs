// crates/origin-issuer-config/src/lib.rs
// ============================================================================
// Module: Origin Issuer Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for origin-issuer.toml semantics.
// Dependencies: origin-issuer-cfapi, origin-issuer-core, serde, toml
// ============================================================================

//! ## Overview
//! `origin-issuer-config` defines the configuration model for the Origin CA
//! issuer controller and converts it into the settings consumed by the core
//! reconcilers, the Origin CA client, and the audit sink.
//!
//! Security posture: config inputs are untrusted and validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
