//! Config loading and validation tests for origin-issuer-config.
// crates/origin-issuer-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading and Validation Tests
// Description: Validate defaults, file loading, and fail-closed validation.
// Purpose: Ensure operator mistakes are rejected before the controller starts.
// =============================================================================

use std::fs;

use origin_issuer_config::AuditSinkKind;
use origin_issuer_config::ConfigError;
use origin_issuer_config::MAX_CONFIG_FILE_SIZE;
use origin_issuer_config::OriginIssuerConfig;
use origin_issuer_core::AuditLevel;
use origin_issuer_core::EventOutcome;
use origin_issuer_core::ReconcileEvent;
use origin_issuer_core::ReconcileEventParams;
use origin_issuer_core::RegistryEviction;
use origin_issuer_core::ResourceKind;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<OriginIssuerConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn empty_config_uses_defaults() -> TestResult {
    let config = OriginIssuerConfig::from_toml("").map_err(|err| err.to_string())?;
    let controller = config.controller_config();
    if controller.issuer.cluster_resource_namespace != "cert-manager" {
        return Err("cluster_resource_namespace should default to cert-manager".to_string());
    }
    if controller.issuer.eviction != RegistryEviction::Retain {
        return Err("registry_eviction should default to retain".to_string());
    }
    if controller.request.check_approved_condition {
        return Err("check_approved_condition should default to false".to_string());
    }
    let client = config.cfapi.client_config();
    if client.endpoint != "https://api.cloudflare.com/client/v4/" || client.allow_http {
        return Err(format!("unexpected default endpoint {}", client.endpoint));
    }
    if config.audit.sink != AuditSinkKind::Stderr || config.audit.min_level != AuditLevel::Info {
        return Err("audit should default to stderr at info".to_string());
    }
    Ok(())
}

#[test]
fn full_config_maps_to_reconciler_settings() -> TestResult {
    let config = OriginIssuerConfig::from_toml(
        r#"
[controller]
check_approved_condition = true
cluster_resource_namespace = "issuer-system"
registry_eviction = "evict_on_delete"
status_on_validation_failure = true
status_on_client_failure = true

[cfapi]
endpoint = "https://ca.example.internal/client/v4"
connect_timeout_ms = 2000
request_timeout_ms = 10000
user_agent = "origin-issuer-test"

[audit]
sink = "none"
min_level = "debug"
"#,
    )
    .map_err(|err| err.to_string())?;
    let controller = config.controller_config();
    if !controller.request.check_approved_condition
        || controller.issuer.cluster_resource_namespace != "issuer-system"
        || controller.issuer.eviction != RegistryEviction::EvictOnDelete
        || !controller.issuer.status_on_validation_failure
        || !controller.issuer.status_on_client_failure
    {
        return Err("controller section not mapped".to_string());
    }
    let client = config.cfapi.client_config();
    if client.connect_timeout_ms != 2_000
        || client.request_timeout_ms != 10_000
        || client.user_agent != "origin-issuer-test"
    {
        return Err("cfapi section not mapped".to_string());
    }
    let url = client.certificates_url().map_err(|err| err.to_string())?;
    if url.as_str() != "https://ca.example.internal/client/v4/certificates" {
        return Err(format!("unexpected certificates url {url}"));
    }
    Ok(())
}

#[test]
fn unknown_fields_are_rejected() -> TestResult {
    match OriginIssuerConfig::from_toml("[controller]\ncheck_approved = true\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got ok={}", other.is_ok())),
    }
}

#[test]
fn cleartext_endpoint_requires_allow_http() -> TestResult {
    assert_invalid(
        OriginIssuerConfig::from_toml("[cfapi]\nendpoint = \"http://127.0.0.1:8080/\"\n"),
        "cfapi.endpoint",
    )?;
    OriginIssuerConfig::from_toml(
        "[cfapi]\nendpoint = \"http://127.0.0.1:8080/\"\nallow_http = true\n",
    )
    .map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn timeouts_are_range_checked() -> TestResult {
    assert_invalid(
        OriginIssuerConfig::from_toml("[cfapi]\nrequest_timeout_ms = 0\n"),
        "cfapi.request_timeout_ms",
    )?;
    assert_invalid(
        OriginIssuerConfig::from_toml("[cfapi]\nconnect_timeout_ms = 600000\n"),
        "cfapi.connect_timeout_ms",
    )
}

#[test]
fn cluster_namespace_must_be_a_dns_label() -> TestResult {
    assert_invalid(
        OriginIssuerConfig::from_toml("[controller]\ncluster_resource_namespace = \"\"\n"),
        "must be non-empty",
    )?;
    assert_invalid(
        OriginIssuerConfig::from_toml(
            "[controller]\ncluster_resource_namespace = \"Cert_Manager\"\n",
        ),
        "DNS label",
    )
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        OriginIssuerConfig::from_toml("[audit]\nsink = \"file\"\n"),
        "audit.sink=file requires audit.path",
    )?;
    assert_invalid(
        OriginIssuerConfig::from_toml("[audit]\nsink = \"stderr\"\npath = \"/tmp/a.log\"\n"),
        "audit.path only allowed",
    )
}

#[test]
fn load_reads_explicit_path() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("origin-issuer.toml");
    fs::write(&path, "[controller]\ncheck_approved_condition = true\n")
        .map_err(|err| err.to_string())?;
    let config = OriginIssuerConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if !config.controller.check_approved_condition {
        return Err("loaded config lost controller settings".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(MAX_CONFIG_FILE_SIZE));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    assert_invalid(OriginIssuerConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(OriginIssuerConfig::load(Some(&path)), "utf-8")
}

#[test]
fn missing_file_is_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    match OriginIssuerConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got ok={}", other.is_ok())),
    }
}

#[test]
fn file_sink_filters_below_min_level() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let log = dir.path().join("audit.jsonl");
    let toml = format!(
        "[audit]\nsink = \"file\"\npath = '{}'\nmin_level = \"info\"\n",
        log.display()
    );
    let config = OriginIssuerConfig::from_toml(&toml).map_err(|err| err.to_string())?;
    let sink = config.audit.build_sink().map_err(|err| err.to_string())?;
    for level in [AuditLevel::Debug, AuditLevel::Info, AuditLevel::Error] {
        sink.record(&ReconcileEvent::new(ReconcileEventParams {
            level,
            resource_kind: ResourceKind::OriginIssuer,
            namespace: None,
            name: "foo".to_string(),
            step: "validate",
            outcome: EventOutcome::Proceeded,
            reason: None,
            message: None,
            error: None,
        }));
    }
    let written = fs::read_to_string(&log).map_err(|err| err.to_string())?;
    let lines = written.lines().count();
    if lines != 2 {
        return Err(format!("expected 2 audit lines, found {lines}"));
    }
    if written.contains("\"debug\"") {
        return Err("debug event was not filtered".to_string());
    }
    Ok(())
}
