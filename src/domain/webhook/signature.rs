//! Webhook signature verification.
//!
//! Verifies the processor's signature header (`t=<ts>,v1=<hex>[,v1=<hex>...]`)
//! using HMAC-SHA256 over `"{timestamp}.{payload}"`, with a freshness window
//! to limit replay and constant-time signature comparison.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};

type HmacSha256 = Hmac<Sha256>;

/// Default freshness tolerance for signed timestamps (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed components of the signature header.
///
/// Parsing is lenient: malformed pairs and unknown schemes are skipped so a
/// provider can add fields without breaking verification. The header only
/// fails to parse when no usable timestamp or no `v1` candidate remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the signature covers.
    pub timestamp: i64,
    /// All `v1` candidates, hex-decoded. Any single match verifies.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `t=<ts>,v1=<hex>[,v1=<hex>...]`.
    pub fn parse(header: &str) -> Option<Self> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures: Vec<Vec<u8>> = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" => {
                    timestamp = value.trim().parse().ok().filter(|ts| *ts != 0);
                }
                "v1" => {
                    if let Ok(decoded) = hex::decode(value.trim()) {
                        v1_signatures.push(decoded);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp?;
        if v1_signatures.is_empty() {
            return None;
        }
        Some(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier bound to one signing secret and freshness tolerance.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    /// Allowed clock difference in seconds; 0 disables the freshness check.
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Verifies a raw payload against its signature header.
    ///
    /// Returns `false` (never an error) when the payload, header, or secret
    /// is empty, the header has no timestamp or `v1` signature, the
    /// timestamp falls outside the tolerance window, or no candidate
    /// matches the expected HMAC.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> bool {
        self.verify_at(payload, signature_header, Utc::now().timestamp())
    }

    /// Verification against an explicit clock, for deterministic tests.
    pub fn verify_at(&self, payload: &[u8], signature_header: &str, now: i64) -> bool {
        if payload.is_empty() || signature_header.is_empty() || self.secret.is_empty() {
            return false;
        }

        let Some(header) = SignatureHeader::parse(signature_header) else {
            return false;
        };

        if self.tolerance_secs > 0 && (now - header.timestamp).abs() > self.tolerance_secs {
            return false;
        }

        let expected = compute_signature(&self.secret, header.timestamp, payload);

        // Check every candidate; constant-time per comparison, no early exit.
        let mut matched = Choice::from(0u8);
        for candidate in &header.v1_signatures {
            matched |= expected.ct_eq(candidate.as_slice());
        }
        matched.into()
    }
}

/// HMAC-SHA256 over `"{timestamp}.{payload}"`.
fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// SHA-256 content hash of a raw payload, hex-encoded.
pub fn payload_hash(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}
