// crates/origin-issuer-core/src/core/wire.rs
// ============================================================================
// Module: Resource Wire Encodings
// Description: Serde helpers for API-server field encodings.
// Purpose: Serialize byte and duration fields the way resource manifests do.
// Dependencies: base64, serde
// ============================================================================

//! ## Overview
//! The API server encodes byte fields as standard base64 strings and
//! durations as Go duration strings (`"2160h0m0s"`). These modules plug into
//! `#[serde(with = ...)]` so resource structs keep native Rust types in
//! memory while matching the persisted form.

// ============================================================================
// SECTION: Base64 Bytes
// ============================================================================

/// Standard base64 encoding for `Vec<u8>` fields.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error as _;

    /// Serializes bytes as a base64 string.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Deserializes bytes from a base64 string.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is not a valid base64 string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)
    }
}

// ============================================================================
// SECTION: Go Durations
// ============================================================================

/// Go duration strings for `Option<Duration>` fields.
pub mod go_duration {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error as _;

    /// Nanoseconds per second.
    const NANOS_PER_SECOND: u128 = 1_000_000_000;

    /// Serializes an optional duration as a Go duration string.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&format(*duration)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional duration from a Go duration string.
    ///
    /// # Errors
    ///
    /// Returns an error when the string is not a valid non-negative duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|text| parse(&text).map_err(D::Error::custom)).transpose()
    }

    /// Formats a duration the way Go's `time.Duration.String` does.
    #[must_use]
    pub fn format(duration: Duration) -> String {
        let nanos = duration.subsec_nanos();
        let secs = duration.as_secs();
        if secs == 0 {
            return match nanos {
                0 => "0s".to_string(),
                1..1_000 => format!("{nanos}ns"),
                1_000..1_000_000 => {
                    format!("{}µs", fraction(u64::from(nanos / 1_000), nanos % 1_000, 3))
                }
                _ => {
                    format!("{}ms", fraction(u64::from(nanos / 1_000_000), nanos % 1_000_000, 6))
                }
            };
        }
        let hours = secs / 3_600;
        let minutes = (secs % 3_600) / 60;
        let seconds = fraction(secs % 60, nanos, 9);
        if hours > 0 {
            format!("{hours}h{minutes}m{seconds}s")
        } else if minutes > 0 {
            format!("{minutes}m{seconds}s")
        } else {
            format!("{seconds}s")
        }
    }

    /// Renders `whole.frac` with trailing zeros trimmed.
    fn fraction(whole: u64, frac: u32, digits: usize) -> String {
        if frac == 0 {
            return whole.to_string();
        }
        let padded = format!("{frac:0digits$}");
        format!("{whole}.{}", padded.trim_end_matches('0'))
    }

    /// Parses a Go duration string such as `"2160h"` or `"1h30m0.5s"`.
    ///
    /// # Errors
    ///
    /// Returns a message when the input is empty, negative, malformed, or
    /// overflows.
    pub fn parse(text: &str) -> Result<Duration, String> {
        let invalid = || format!("invalid duration {text}");
        let body = text.strip_prefix('+').unwrap_or(text);
        if body.starts_with('-') {
            return Err(format!("negative duration {text}"));
        }
        if body == "0" {
            return Ok(Duration::ZERO);
        }
        if body.is_empty() {
            return Err(invalid());
        }
        let mut total: u128 = 0;
        let mut rest = body;
        while !rest.is_empty() {
            let number_len =
                rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).ok_or_else(invalid)?;
            let (number, tail) = rest.split_at(number_len);
            let unit_len = tail.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(tail.len());
            let (unit, next) = tail.split_at(unit_len);
            let scale: u128 = match unit {
                "ns" => 1,
                "us" | "µs" | "μs" => 1_000,
                "ms" => 1_000_000,
                "s" => NANOS_PER_SECOND,
                "m" => 60 * NANOS_PER_SECOND,
                "h" => 3_600 * NANOS_PER_SECOND,
                _ => return Err(invalid()),
            };
            let value = scaled(number, scale).ok_or_else(invalid)?;
            total = total.checked_add(value).ok_or_else(invalid)?;
            rest = next;
        }
        let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| invalid())?;
        let nanos = u32::try_from(total % NANOS_PER_SECOND).map_err(|_| invalid())?;
        Ok(Duration::new(secs, nanos))
    }

    /// Multiplies a decimal literal by `scale`, truncating below one nanosecond.
    fn scaled(number: &str, scale: u128) -> Option<u128> {
        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut value = whole.checked_mul(scale)?;
        let mut unit = scale;
        for digit in frac.bytes() {
            unit /= 10;
            if unit == 0 {
                break;
            }
            value = value.checked_add(u128::from(digit - b'0') * unit)?;
        }
        Some(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use std::time::Duration;

    use super::go_duration::format;
    use super::go_duration::parse;

    #[test]
    fn formats_like_go() {
        assert_eq!(format(Duration::from_secs(90 * 86_400)), "2160h0m0s");
        assert_eq!(format(Duration::from_secs(90)), "1m30s");
        assert_eq!(format(Duration::from_secs(5)), "5s");
        assert_eq!(format(Duration::from_millis(1_500)), "1.5s");
        assert_eq!(format(Duration::from_millis(250)), "250ms");
        assert_eq!(format(Duration::ZERO), "0s");
    }

    #[test]
    fn parses_go_strings() {
        assert_eq!(parse("2160h0m0s").unwrap(), Duration::from_secs(90 * 86_400));
        assert_eq!(parse("2160h").unwrap(), Duration::from_secs(90 * 86_400));
        assert_eq!(parse("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse("1.5h").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn rejects_malformed_strings() {
        for text in ["", "-1h", "10", "1d", "h", "1..5s", "1h30"] {
            assert!(parse(text).is_err(), "{text} should be rejected");
        }
    }
}
