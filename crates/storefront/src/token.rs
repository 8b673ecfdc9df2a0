//! Backend bearer tokens and client-side expiry checks.
//!
//! The backend issues JWTs. The storefront never verifies signatures; it only
//! peeks at the `exp` claim so it can sign the visitor out before a request
//! is rejected.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// URL-safe base64 that accepts the payload with or without `=` padding.
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Opaque bearer token issued by the backend.
///
/// Serialized transparently so it can live in the session. `Debug` is
/// redacted so it never ends up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Raw token for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token's `exp` claim is in the past at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(Some(&self.0), now)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

impl From<String> for BearerToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Decide whether a token should be treated as expired.
///
/// - missing token, missing payload segment or undecodable payload: expired
/// - payload without an `exp` claim: not expired
/// - otherwise expired iff `exp < now` (seconds since the epoch)
#[must_use]
pub fn is_expired(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };
    let Some(payload) = decode_payload(token) else {
        return true;
    };

    #[allow(clippy::cast_precision_loss)] // epoch seconds fit comfortably in f64
    let now_secs = now.timestamp() as f64;
    payload
        .get("exp")
        .and_then(serde_json::Value::as_f64)
        .is_some_and(|exp| exp < now_secs)
}

fn decode_payload(token: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let segment = token.split('.').nth(1)?;
    let bytes = JWT_SEGMENT.decode(segment).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;

    fn token_with(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_token_is_expired() {
        assert!(is_expired(None, now()));
    }

    #[test]
    fn test_garbage_token_is_expired() {
        assert!(is_expired(Some("not-a-jwt"), now()));
        assert!(is_expired(Some("a.%%%.c"), now()));
        assert!(is_expired(Some(&token_with("[1,2,3]")), now()));
    }

    #[test]
    fn test_token_without_exp_never_expires() {
        assert!(!is_expired(Some(&token_with(r#"{"sub":"ana@applegym.pe"}"#)), now()));
    }

    #[test]
    fn test_exp_compared_against_now() {
        let now = now();
        let past = token_with(&format!(r#"{{"exp":{}}}"#, now.timestamp() - 1));
        let future = token_with(&format!(r#"{{"exp":{}}}"#, now.timestamp() + 3600));
        assert!(is_expired(Some(&past), now));
        assert!(!is_expired(Some(&future), now));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let padded = format!(
            "h.{}.s",
            base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"x"}"#)
        );
        assert!(!is_expired(Some(&padded), now()));
    }

    #[test]
    fn test_bearer_token_debug_is_redacted() {
        let token = BearerToken::new("eyJhbGciOi.secret.payload".to_string());
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }
}
