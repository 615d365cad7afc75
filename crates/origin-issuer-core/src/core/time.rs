// crates/origin-issuer-core/src/core/time.rs
// ============================================================================
// Module: Origin Issuer Time Model
// Description: Canonical timestamp representation for conditions and failures.
// Purpose: Keep condition bookkeeping deterministic under an injected clock.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Reconcilers never read wall-clock time directly; every timestamp comes from
//! the injected [`crate::interfaces::Clock`]. Timestamps carry second
//! precision and serialize as RFC 3339 in UTC, matching resource status wire
//! forms.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Second-precision UTC timestamp.
///
/// # Invariants
/// - Sub-second components are always zero.
/// - The offset is always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Creates a timestamp from a date-time, truncating to whole seconds in UTC.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(time::UtcOffset::UTC);
        Self(utc.replace_nanosecond(0).unwrap_or(utc))
    }

    /// Creates a timestamp from unix seconds, returning `None` when out of range.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now_utc() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }

    /// Returns unix seconds.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Returns the underlying date-time.
    #[must_use]
    pub const fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0.unix_timestamp()),
        }
    }
}
