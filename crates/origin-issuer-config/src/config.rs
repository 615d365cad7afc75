// crates/origin-issuer-config/src/config.rs
// ============================================================================
// Module: Origin Issuer Configuration
// Description: Configuration loading and validation for the controller.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: origin-issuer-cfapi, origin-issuer-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file is a valid configuration.
//! Missing or invalid configuration fails closed.
//!
//! Security posture: config inputs are untrusted. Service keys never appear in
//! configuration; they are read from secrets at reconcile time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use origin_issuer_cfapi::CfApiClientConfig;
use origin_issuer_cfapi::DEFAULT_ENDPOINT;
use origin_issuer_cfapi::DEFAULT_MAX_RESPONSE_BYTES;
use origin_issuer_core::AuditLevel;
use origin_issuer_core::AuditSink;
use origin_issuer_core::ControllerConfig;
use origin_issuer_core::FileAuditSink;
use origin_issuer_core::IssuerReconcilerConfig;
use origin_issuer_core::LevelFilter;
use origin_issuer_core::NoopAuditSink;
use origin_issuer_core::RegistryEviction;
use origin_issuer_core::RequestReconcilerConfig;
use origin_issuer_core::StderrAuditSink;
use origin_issuer_core::runtime::DEFAULT_CLUSTER_RESOURCE_NAMESPACE;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "origin-issuer.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ORIGIN_ISSUER_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum namespace name length.
const MAX_NAMESPACE_LENGTH: usize = 63;
/// Minimum connect timeout in milliseconds.
const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum connect timeout in milliseconds.
const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Minimum request timeout in milliseconds.
const MIN_REQUEST_TIMEOUT_MS: u64 = 500;
/// Maximum request timeout in milliseconds.
const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;
/// Maximum user agent length.
const MAX_USER_AGENT_LENGTH: usize = 256;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginIssuerConfig {
    /// Reconciler behavior.
    #[serde(default)]
    pub controller: ControllerSection,
    /// Origin CA client settings.
    #[serde(default)]
    pub cfapi: CfApiConfig,
    /// Audit event sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl OriginIssuerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is the explicit argument, then [`CONFIG_ENV_VAR`], then
    /// `origin-issuer.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        self.cfapi.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the core controller configuration.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            issuer: self.controller.issuer_config(),
            request: self.controller.request_config(),
        }
    }
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// `[controller]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerSection {
    /// Wait for `Approved=True` before signing.
    #[serde(default)]
    pub check_approved_condition: bool,
    /// Namespace used when a secret reference leaves its namespace empty.
    #[serde(default = "default_cluster_resource_namespace")]
    pub cluster_resource_namespace: String,
    /// Registry behavior when an issuer is deleted.
    #[serde(default)]
    pub registry_eviction: RegistryEviction,
    /// Write `Ready=False` when issuer validation fails.
    #[serde(default)]
    pub status_on_validation_failure: bool,
    /// Write `Ready=False` when the CA client cannot be built.
    #[serde(default)]
    pub status_on_client_failure: bool,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            check_approved_condition: false,
            cluster_resource_namespace: default_cluster_resource_namespace(),
            registry_eviction: RegistryEviction::default(),
            status_on_validation_failure: false,
            status_on_client_failure: false,
        }
    }
}

impl ControllerSection {
    /// Validates controller settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.cluster_resource_namespace;
        if namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "controller.cluster_resource_namespace must be non-empty".to_string(),
            ));
        }
        if namespace.len() > MAX_NAMESPACE_LENGTH || !is_dns_label(namespace) {
            return Err(ConfigError::Invalid(
                "controller.cluster_resource_namespace must be a DNS label".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the issuer reconciler settings.
    #[must_use]
    pub fn issuer_config(&self) -> IssuerReconcilerConfig {
        IssuerReconcilerConfig {
            cluster_resource_namespace: self.cluster_resource_namespace.clone(),
            eviction: self.registry_eviction,
            status_on_validation_failure: self.status_on_validation_failure,
            status_on_client_failure: self.status_on_client_failure,
        }
    }

    /// Returns the certificate request reconciler settings.
    #[must_use]
    pub const fn request_config(&self) -> RequestReconcilerConfig {
        RequestReconcilerConfig {
            check_approved_condition: self.check_approved_condition,
        }
    }
}

// ============================================================================
// SECTION: Origin CA Client
// ============================================================================

/// `[cfapi]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CfApiConfig {
    /// API base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Allow cleartext HTTP endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional user agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for CfApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            allow_http: false,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: None,
        }
    }
}

impl CfApiConfig {
    /// Validates Origin CA client settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_range(
            "cfapi.connect_timeout_ms",
            self.connect_timeout_ms,
            MIN_CONNECT_TIMEOUT_MS,
            MAX_CONNECT_TIMEOUT_MS,
        )?;
        validate_timeout_range(
            "cfapi.request_timeout_ms",
            self.request_timeout_ms,
            MIN_REQUEST_TIMEOUT_MS,
            MAX_REQUEST_TIMEOUT_MS,
        )?;
        if let Some(agent) = &self.user_agent
            && (agent.trim().is_empty() || agent.len() > MAX_USER_AGENT_LENGTH)
        {
            return Err(ConfigError::Invalid(format!(
                "cfapi.user_agent must be 1 to {MAX_USER_AGENT_LENGTH} characters"
            )));
        }
        self.client_config()
            .certificates_url()
            .map_err(|err| ConfigError::Invalid(format!("cfapi.endpoint: {err}")))?;
        Ok(())
    }

    /// Returns the HTTP client settings.
    #[must_use]
    pub fn client_config(&self) -> CfApiClientConfig {
        let defaults = CfApiClientConfig::default();
        CfApiClientConfig {
            endpoint: self.endpoint.trim().to_string(),
            allow_http: self.allow_http,
            connect_timeout_ms: self.connect_timeout_ms,
            request_timeout_ms: self.request_timeout_ms,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `path`.
    File,
    /// Discard events.
    None,
}

/// `[audit]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log path; required for the file sink.
    #[serde(default)]
    pub path: Option<String>,
    /// Minimum level recorded.
    #[serde(default = "default_audit_min_level")]
    pub min_level: AuditLevel,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSinkKind::default(),
            path: None,
            min_level: default_audit_min_level(),
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path only allowed when audit.sink=file".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }

    /// Builds the configured sink behind a level filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file sink cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        let inner: Arc<dyn AuditSink> = match (self.sink, &self.path) {
            (AuditSinkKind::Stderr, _) => Arc::new(StderrAuditSink),
            (AuditSinkKind::None, _) => Arc::new(NoopAuditSink),
            (AuditSinkKind::File, Some(path)) => Arc::new(
                FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?,
            ),
            (AuditSinkKind::File, None) => {
                return Err(ConfigError::Invalid(
                    "audit.sink=file requires audit.path".to_string(),
                ));
            }
        };
        Ok(Arc::new(LevelFilter::new(self.min_level, inner)))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default cluster resource namespace.
fn default_cluster_resource_namespace() -> String {
    DEFAULT_CLUSTER_RESOURCE_NAMESPACE.to_string()
}

/// Default Origin CA endpoint.
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// Default connect timeout in milliseconds.
const fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Default request timeout in milliseconds.
const fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Default minimum audit level.
const fn default_audit_min_level() -> AuditLevel {
    AuditLevel::Info
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, the environment, or the default.
fn resolve_path(path: Option<&Path>, env_path: Option<String>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a timeout value within an inclusive range.
fn validate_timeout_range(
    field: &str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

/// Returns true for a lowercase RFC 1123 label.
fn is_dns_label(value: &str) -> bool {
    let bytes = value.as_bytes();
    let edge_ok = |byte: Option<&u8>| byte.is_some_and(u8::is_ascii_alphanumeric);
    edge_ok(bytes.first())
        && edge_ok(bytes.last())
        && bytes.iter().all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || *byte == b'-')
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let resolved =
            resolve_path(Some(Path::new("a.toml")), Some("b.toml".to_string())).unwrap();
        assert_eq!(resolved, PathBuf::from("a.toml"));
    }

    #[test]
    fn environment_path_wins_over_default() {
        let resolved = resolve_path(None, Some("/etc/origin/issuer.toml".to_string())).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/origin/issuer.toml"));
        assert_eq!(resolve_path(None, None).unwrap(), PathBuf::from(DEFAULT_CONFIG_NAME));
    }

    #[test]
    fn oversized_environment_path_is_rejected() {
        let long = "a".repeat(MAX_TOTAL_PATH_LENGTH + 1);
        assert!(matches!(resolve_path(None, Some(long)), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn long_path_component_is_rejected() {
        let path = PathBuf::from(format!("/tmp/{}", "c".repeat(MAX_PATH_COMPONENT_LENGTH + 1)));
        assert!(validate_path(&path).is_err());
    }

    #[test]
    fn dns_labels() {
        assert!(is_dns_label("cert-manager"));
        assert!(is_dns_label("ns1"));
        assert!(!is_dns_label("-edge"));
        assert!(!is_dns_label("edge-"));
        assert!(!is_dns_label("Upper"));
        assert!(!is_dns_label(""));
    }
}
