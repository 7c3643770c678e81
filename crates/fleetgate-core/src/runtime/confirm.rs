// crates/fleetgate-core/src/runtime/confirm.rs
// ============================================================================
// Module: Fleetgate Confirmation Tokens
// Description: HMAC-signed, plan-bound, time-limited confirmation tokens.
// Purpose: Require an explicit second step before critical mutations run.
// Dependencies: hmac, sha2, subtle, base64, serde
// ============================================================================

//! ## Overview
//! A confirmation token binds a plan hash to a wall-clock expiry under an
//! HMAC-SHA256 tag keyed by a process secret. Verification is fail-closed
//! and ordered: structural and signature defects report `invalid`, a
//! plan-hash disagreement reports `mismatch`, and only then is expiry
//! checked. Tag comparison is constant-time.
//! Security posture: tokens are bearer credentials; production deployments
//! must never run with the default secret (the configuration loader rejects
//! it).

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Development-only sentinel secret.
pub const DEFAULT_CONFIRMATION_SECRET: &str = "fleetgate-dev-secret-change-me";

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// SECTION: Token Payload
// ============================================================================

/// Signed token payload.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    /// Unix-seconds expiry.
    expires_at: u64,
    /// Plan hash the token is bound to.
    plan_hash: String,
}

/// Verification outcome for a confirmation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerification {
    /// Token is structurally valid, correctly signed, bound to the expected
    /// plan, and unexpired.
    Ok,
    /// Token is malformed or carries a bad signature.
    Invalid,
    /// Token is bound to a different plan hash.
    Mismatch,
    /// Token expired before `now`.
    Expired,
}

// ============================================================================
// SECTION: Token Service
// ============================================================================

/// Issues and verifies confirmation tokens.
pub struct ConfirmationTokenService {
    /// HMAC key material.
    secret: Vec<u8>,
}

impl ConfirmationTokenService {
    /// Creates a service over the given secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns true when the service runs on the development sentinel secret.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_CONFIRMATION_SECRET.as_bytes()
    }

    /// Issues a token binding `plan_hash` to `expires_at`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the payload cannot be canonicalized.
    pub fn issue(&self, plan_hash: &str, expires_at: u64) -> Result<String, HashError> {
        let payload = TokenPayload {
            expires_at,
            plan_hash: plan_hash.to_string(),
        };
        let encoded = URL_SAFE_NO_PAD.encode(canonical_json_bytes(&payload)?);
        let tag = URL_SAFE_NO_PAD.encode(self.mac(encoded.as_bytes()));
        Ok(format!("{encoded}.{tag}"))
    }

    /// Verifies a token against an expected plan hash and the current time.
    #[must_use]
    pub fn verify(
        &self,
        token: &str,
        expected_plan_hash: &str,
        now: u64,
    ) -> TokenVerification {
        let Some((encoded, tag)) = token.split_once('.') else {
            return TokenVerification::Invalid;
        };
        let Ok(tag_bytes) = URL_SAFE_NO_PAD.decode(tag) else {
            return TokenVerification::Invalid;
        };
        let expected_tag = self.mac(encoded.as_bytes());
        if !bool::from(expected_tag.ct_eq(&tag_bytes)) {
            return TokenVerification::Invalid;
        }
        let Ok(payload_bytes) = URL_SAFE_NO_PAD.decode(encoded) else {
            return TokenVerification::Invalid;
        };
        let Ok(payload) = serde_json::from_slice::<TokenPayload>(&payload_bytes) else {
            return TokenVerification::Invalid;
        };
        if payload.plan_hash != expected_plan_hash {
            return TokenVerification::Mismatch;
        }
        if now >= payload.expires_at {
            return TokenVerification::Expired;
        }
        TokenVerification::Ok
    }

    /// Computes the HMAC tag over the encoded payload.
    #[allow(clippy::expect_used, reason = "HMAC accepts keys of any length")]
    fn mac(&self, message: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }
}
