// crates/origin-issuer-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Collaborators
// Description: Deterministic stores, client factory, and clock.
// Purpose: Run both reconcilers without a cluster for tests and local demos.
// Dependencies: crate::{core, interfaces}, async-trait
// ============================================================================

//! ## Overview
//! These implementations keep every object in a mutex-guarded map and count
//! calls so tests can assert how many external operations a reconcile made.
//! Status updates replace only the stored status, mirroring a status
//! subresource. Failures can be injected per store. They are not intended for
//! production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use async_trait::async_trait;

use crate::core::CertificateRequest;
use crate::core::IssuerName;
use crate::core::ObjectKey;
use crate::core::OriginIssuer;
use crate::core::Timestamp;
use crate::interfaces::CertificateRequestStore;
use crate::interfaces::ClientError;
use crate::interfaces::ClientFactory;
use crate::interfaces::Clock;
use crate::interfaces::IssuerStore;
use crate::interfaces::OriginCaClient;
use crate::interfaces::Secret;
use crate::interfaces::SecretStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Shared State
// ============================================================================

/// Map plus call accounting for one in-memory store.
#[derive(Debug)]
struct StoreState<K, V> {
    /// Stored objects.
    objects: BTreeMap<K, V>,
    /// Number of `get` calls.
    gets: usize,
    /// Number of `update_status` calls.
    updates: usize,
    /// Error returned by every `get` when set.
    get_error: Option<StoreError>,
    /// Error returned by every `update_status` when set.
    update_error: Option<StoreError>,
}

impl<K, V> Default for StoreState<K, V> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            gets: 0,
            updates: 0,
            get_error: None,
            update_error: None,
        }
    }
}

/// Locks store state, recovering from poisoning.
fn lock<K, V>(state: &Mutex<StoreState<K, V>>) -> std::sync::MutexGuard<'_, StoreState<K, V>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// SECTION: Issuer Store
// ============================================================================

/// In-memory issuer store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIssuerStore {
    /// Issuers keyed by name.
    state: Arc<Mutex<StoreState<IssuerName, OriginIssuer>>>,
}

impl InMemoryIssuerStore {
    /// Creates an empty issuer store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an issuer, spec and status included.
    pub fn insert(&self, issuer: OriginIssuer) {
        lock(&self.state).objects.insert(issuer.name.clone(), issuer);
    }

    /// Removes an issuer.
    pub fn remove(&self, name: &IssuerName) -> Option<OriginIssuer> {
        lock(&self.state).objects.remove(name)
    }

    /// Returns the stored copy of an issuer.
    #[must_use]
    pub fn issuer(&self, name: &IssuerName) -> Option<OriginIssuer> {
        lock(&self.state).objects.get(name).cloned()
    }

    /// Returns the number of `get` calls served.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        lock(&self.state).gets
    }

    /// Returns the number of `update_status` calls served.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        lock(&self.state).updates
    }

    /// Makes every subsequent `get` fail with the error (or clears it).
    pub fn fail_gets_with(&self, error: Option<StoreError>) {
        lock(&self.state).get_error = error;
    }

    /// Makes every subsequent `update_status` fail with the error (or clears it).
    pub fn fail_updates_with(&self, error: Option<StoreError>) {
        lock(&self.state).update_error = error;
    }
}

#[async_trait]
impl IssuerStore for InMemoryIssuerStore {
    async fn get(&self, name: &IssuerName) -> Result<OriginIssuer, StoreError> {
        let mut state = lock(&self.state);
        state.gets += 1;
        if let Some(error) = &state.get_error {
            return Err(error.clone());
        }
        state.objects.get(name).cloned().ok_or_else(|| StoreError::NotFound {
            resource: "originissuers",
            name: name.to_string(),
        })
    }

    async fn update_status(&self, issuer: &OriginIssuer) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        state.updates += 1;
        if let Some(error) = &state.update_error {
            return Err(error.clone());
        }
        let stored = state.objects.get_mut(&issuer.name).ok_or_else(|| StoreError::NotFound {
            resource: "originissuers",
            name: issuer.name.to_string(),
        })?;
        stored.status = issuer.status.clone();
        Ok(())
    }
}

// ============================================================================
// SECTION: Certificate Request Store
// ============================================================================

/// In-memory certificate request store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCertificateRequestStore {
    /// Requests keyed by namespace and name.
    state: Arc<Mutex<StoreState<ObjectKey, CertificateRequest>>>,
}

impl InMemoryCertificateRequestStore {
    /// Creates an empty request store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a request, spec and status included.
    pub fn insert(&self, request: CertificateRequest) {
        lock(&self.state).objects.insert(request.key.clone(), request);
    }

    /// Returns the stored copy of a request.
    #[must_use]
    pub fn request(&self, key: &ObjectKey) -> Option<CertificateRequest> {
        lock(&self.state).objects.get(key).cloned()
    }

    /// Returns the number of `get` calls served.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        lock(&self.state).gets
    }

    /// Returns the number of `update_status` calls served.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        lock(&self.state).updates
    }

    /// Makes every subsequent `update_status` fail with the error (or clears it).
    pub fn fail_updates_with(&self, error: Option<StoreError>) {
        lock(&self.state).update_error = error;
    }
}

#[async_trait]
impl CertificateRequestStore for InMemoryCertificateRequestStore {
    async fn get(&self, key: &ObjectKey) -> Result<CertificateRequest, StoreError> {
        let mut state = lock(&self.state);
        state.gets += 1;
        if let Some(error) = &state.get_error {
            return Err(error.clone());
        }
        state.objects.get(key).cloned().ok_or_else(|| StoreError::NotFound {
            resource: "certificaterequests",
            name: key.name.clone(),
        })
    }

    async fn update_status(&self, request: &CertificateRequest) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        state.updates += 1;
        if let Some(error) = &state.update_error {
            return Err(error.clone());
        }
        let stored = state.objects.get_mut(&request.key).ok_or_else(|| StoreError::NotFound {
            resource: "certificaterequests",
            name: request.key.name.clone(),
        })?;
        stored.status = request.status.clone();
        Ok(())
    }
}

// ============================================================================
// SECTION: Secret Store
// ============================================================================

/// In-memory secret store.
#[derive(Debug, Default, Clone)]
pub struct InMemorySecretStore {
    /// Secrets keyed by namespace and name.
    state: Arc<Mutex<StoreState<ObjectKey, Secret>>>,
}

impl InMemorySecretStore {
    /// Creates an empty secret store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a secret holding a single key.
    pub fn insert_key(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: impl Into<Vec<u8>>,
    ) {
        let object_key = ObjectKey::new(namespace, name);
        let mut data = BTreeMap::new();
        data.insert(key.to_string(), value.into());
        self.insert(Secret {
            key: object_key,
            data,
        });
    }

    /// Inserts or replaces a secret.
    pub fn insert(&self, secret: Secret) {
        lock(&self.state).objects.insert(secret.key.clone(), secret);
    }

    /// Returns the number of `get` calls served.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        lock(&self.state).gets
    }

    /// Makes every subsequent `get` fail with the error (or clears it).
    pub fn fail_gets_with(&self, error: Option<StoreError>) {
        lock(&self.state).get_error = error;
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, key: &ObjectKey) -> Result<Secret, StoreError> {
        let mut state = lock(&self.state);
        state.gets += 1;
        if let Some(error) = &state.get_error {
            return Err(error.clone());
        }
        state.objects.get(key).cloned().ok_or_else(|| StoreError::NotFound {
            resource: "secrets",
            name: key.name.clone(),
        })
    }
}

// ============================================================================
// SECTION: Client Factory
// ============================================================================

/// Client factory returning one prepared client (or one prepared error).
pub struct StaticClientFactory {
    /// Result handed out on every build.
    result: Result<Arc<dyn OriginCaClient>, ClientError>,
    /// Service keys seen by `build`, in call order.
    seen_keys: Mutex<Vec<Vec<u8>>>,
}

impl std::fmt::Debug for StaticClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticClientFactory")
            .field("fails", &self.result.is_err())
            .field("builds", &self.build_calls())
            .finish()
    }
}

impl StaticClientFactory {
    /// Creates a factory that always returns the client.
    #[must_use]
    pub fn new(client: Arc<dyn OriginCaClient>) -> Self {
        Self {
            result: Ok(client),
            seen_keys: Mutex::new(Vec::new()),
        }
    }

    /// Creates a factory that always fails with the error.
    #[must_use]
    pub fn failing(error: ClientError) -> Self {
        Self {
            result: Err(error),
            seen_keys: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of build calls.
    #[must_use]
    pub fn build_calls(&self) -> usize {
        self.seen_keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns the service keys passed to `build`.
    #[must_use]
    pub fn seen_keys(&self) -> Vec<Vec<u8>> {
        self.seen_keys.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ClientFactory for StaticClientFactory {
    fn build(&self, service_key: &[u8]) -> Result<Arc<dyn OriginCaClient>, ClientError> {
        self.seen_keys.lock().unwrap_or_else(PoisonError::into_inner).push(service_key.to_vec());
        self.result.clone()
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Clock returning a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    /// Current instant.
    now: Mutex<Timestamp>,
}

impl FixedClock {
    /// Creates a clock frozen at the instant.
    #[must_use]
    pub const fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
