// crates/origin-issuer-core/tests/registry.rs
// ============================================================================
// Module: Provisioner Registry Tests
// Description: Store/load semantics and concurrent access.
// Purpose: Ensure entries are never lost under concurrent writers.
// Dependencies: origin-issuer-core, tokio
// ============================================================================

//! Provisioner registry tests.

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

use common::CaBehavior;
use common::RecordingCaClient;
use origin_issuer_core::IssuerName;
use origin_issuer_core::Provisioner;
use origin_issuer_core::ProvisionerRegistry;
use origin_issuer_core::RequestType;

fn provisioner(request_type: &str) -> Arc<Provisioner> {
    let client = Arc::new(RecordingCaClient::new(CaBehavior::Issue));
    Arc::new(Provisioner::new(client, request_type.parse::<RequestType>().unwrap()))
}

#[test]
fn load_misses_unknown_identity() {
    let registry = ProvisionerRegistry::new();
    assert!(registry.load(&IssuerName::new("missing")).is_none());
    assert!(registry.is_empty());
}

#[test]
fn store_overwrites_previous_entry() {
    let registry = ProvisionerRegistry::new();
    let name = IssuerName::new("foo");
    registry.store(name.clone(), provisioner("OriginRSA"));
    registry.store(name.clone(), provisioner("OriginECC"));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.load(&name).unwrap().request_type(), RequestType::OriginEcc);
}

#[test]
fn registries_are_isolated() {
    let first = ProvisionerRegistry::new();
    let second = ProvisionerRegistry::new();
    first.store(IssuerName::new("foo"), provisioner("OriginRSA"));
    assert!(second.load(&IssuerName::new("foo")).is_none());
}

#[test]
fn remove_returns_entry_once() {
    let registry = ProvisionerRegistry::new();
    let name = IssuerName::new("foo");
    registry.store(name.clone(), provisioner("OriginRSA"));
    assert!(registry.remove(&name).is_some());
    assert!(registry.remove(&name).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_store_then_load_keeps_every_entry() {
    const ISSUERS: usize = 256;
    let registry = Arc::new(ProvisionerRegistry::new());

    let mut writers = Vec::with_capacity(ISSUERS);
    for index in 0..ISSUERS {
        let registry = Arc::clone(&registry);
        writers.push(tokio::spawn(async move {
            let request_type = if index % 2 == 0 { "OriginRSA" } else { "OriginECC" };
            registry.store(IssuerName::new(format!("issuer-{index}")), provisioner(request_type));
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }

    let mut readers = Vec::with_capacity(ISSUERS);
    for index in 0..ISSUERS {
        let registry = Arc::clone(&registry);
        readers.push(tokio::spawn(async move {
            let loaded = registry.load(&IssuerName::new(format!("issuer-{index}")));
            let expected =
                if index % 2 == 0 { RequestType::OriginRsa } else { RequestType::OriginEcc };
            loaded.map(|provisioner| provisioner.request_type()) == Some(expected)
        }));
    }
    for reader in readers {
        assert!(reader.await.unwrap());
    }
    assert_eq!(registry.len(), ISSUERS);
}
