//! HMAC signing and verification for inbound billing webhooks.
//!
//! The provider sends a header of the form `t=<unix seconds>,v1=<hex digest>`
//! where the digest is `HMAC-SHA256(secret, "{t}.{raw body}")`. More than one
//! `v1` entry may be present while the provider rotates secrets; any match is
//! accepted. The timestamp must be within a tolerance window of `now` so a
//! captured request cannot be replayed indefinitely.

use hmac::{Hmac, Mac};
use sha2::Sha256;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default maximum age (either direction) of a signed timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Header key carrying the signing timestamp.
const TIMESTAMP_KEY: &str = "t";

/// Header key carrying a v1 (HMAC-SHA256) signature.
const SIGNATURE_KEY: &str = "v1";

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a webhook signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature header is malformed")]
    MalformedHeader,

    #[error("Signature header has no timestamp")]
    MissingTimestamp,

    #[error("Signature header has no v1 signature")]
    MissingSignature,

    #[error("Signature timestamp is {age_secs}s away from now")]
    OutsideTolerance { age_secs: u64 },

    #[error("No signature matches the payload")]
    Mismatch,
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Compute the hex-encoded v1 signature for `payload` signed at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(signed_mac(secret, timestamp, payload).finalize().into_bytes())
}

/// Build a complete signature header for `payload`.
///
/// Used by tests and local tooling to produce events the verifier accepts.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!(
        "{TIMESTAMP_KEY}={timestamp},{SIGNATURE_KEY}={}",
        compute_signature(secret, timestamp, payload)
    )
}

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify `header` against `payload`.
///
/// `now` is the current Unix time in seconds. Comparison is constant-time.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header)?;

    // `t` is untrusted; abs_diff cannot overflow on extreme values.
    let age_secs = now.abs_diff(parsed.timestamp);
    if age_secs > tolerance_secs.max(0).unsigned_abs() {
        return Err(SignatureError::OutsideTolerance { age_secs });
    }

    let matched = parsed.signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| {
                signed_mac(secret, parsed.timestamp, payload)
                    .verify_slice(&bytes)
                    .is_ok()
            })
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

struct ParsedHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    let mut saw_pair = false;

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        saw_pair = true;
        match key {
            TIMESTAMP_KEY => timestamp = value.parse::<i64>().ok(),
            SIGNATURE_KEY => signatures.push(value),
            _ => {}
        }
    }

    if !saw_pair {
        return Err(SignatureError::MalformedHeader);
    }
    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    Ok(ParsedHeader {
        timestamp,
        signatures,
    })
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string. Returns `None` on odd length or non-hex input.
    pub fn decode(input: &str) -> Option<Vec<u8>> {
        if input.len() % 2 != 0 {
            return None;
        }
        (0..input.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(input.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
