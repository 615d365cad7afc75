// crates/origin-issuer-core/src/runtime/registry.rs
// ============================================================================
// Module: Provisioner Registry
// Description: Concurrency-safe map from issuer identity to signing capability.
// Purpose: Hand verified provisioners from the issuer reconciler to request reconciles.
// Dependencies: crate::core, crate::runtime::provisioner
// ============================================================================

//! ## Overview
//! The registry is an explicit object owned by the process root and shared by
//! reference with both reconcilers. A successful issuer reconcile is the only
//! writer; request reconciles only read. Entries live in memory only, so a
//! restarted process rebuilds them by replaying issuer reconciles.
//!
//! Critical sections cover the map operation alone; no lock is held across
//! an await point or an external call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::core::IssuerName;
use crate::runtime::provisioner::Provisioner;

// ============================================================================
// SECTION: Provisioner Registry
// ============================================================================

/// In-memory provisioner registry keyed by issuer name.
///
/// # Invariants
/// - At most one entry per issuer; the last `store` wins.
/// - `store` always succeeds; a poisoned lock is recovered, not propagated.
#[derive(Debug, Default)]
pub struct ProvisionerRegistry {
    /// Provisioners keyed by issuer identity.
    entries: RwLock<HashMap<IssuerName, Arc<Provisioner>>>,
}

impl ProvisionerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the provisioner for an issuer.
    pub fn store(&self, issuer: IssuerName, provisioner: Arc<Provisioner>) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).insert(issuer, provisioner);
    }

    /// Returns the provisioner for an issuer, if one was stored in this process.
    #[must_use]
    pub fn load(&self, issuer: &IssuerName) -> Option<Arc<Provisioner>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).get(issuer).cloned()
    }

    /// Removes the provisioner for an issuer, returning it when present.
    pub fn remove(&self, issuer: &IssuerName) -> Option<Arc<Provisioner>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(issuer)
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
