//! Webhook signature verification.
//!
//! Deliveries are authenticated with HMAC-SHA256 over
//! `"{timestamp}.{payload}"`, keyed by the shared signing secret, and a
//! bounded timestamp window to stop replays. Verification happens before
//! the payload is parsed; an unverifiable delivery is never acted upon.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for a delivery (replay window).
const MAX_DELIVERY_AGE_SECS: i64 = 300;

/// Tolerance for deliveries timestamped in the future (clock skew).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the signature header.
///
/// Format: `t=<unix-timestamp>,v1=<hex-signature>`. Unknown fields are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(WebhookError::ParseError(
                    "invalid signature header format".to_string(),
                ));
            };
            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp
                .ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?,
            signature: signature
                .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?,
        })
    }
}

/// Verifies webhook deliveries against the shared signing secret.
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    /// Creates a verifier with the given signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies a delivery's authenticity.
    ///
    /// Checks, in order: header shape, timestamp window, HMAC signature
    /// (constant-time comparison). Returns without touching the payload
    /// body beyond hashing it — parsing is the caller's next step, taken
    /// only after this succeeds.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;
        if age > MAX_DELIVERY_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_eq(&expected, &header.signature) {
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time byte comparison, so signature mismatches leak nothing
/// through timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn header_for(secret: &str, timestamp: i64, payload: &str) -> String {
        format!("t={},v1={}", timestamp, sign(secret, timestamp, payload))
    }

    #[test]
    fn parse_header_extracts_timestamp_and_signature() {
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", "ab".repeat(32))).unwrap();
        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.signature.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let raw = format!("t=1234567890,v1={},v0=legacy,scheme=hmac", "ab".repeat(32));
        assert!(SignatureHeader::parse(&raw).is_ok());
    }

    #[test]
    fn parse_header_rejects_missing_parts() {
        assert!(matches!(
            SignatureHeader::parse("v1=abcd"),
            Err(WebhookError::ParseError(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=1234567890"),
            Err(WebhookError::ParseError(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=not_a_number,v1=abcd"),
            Err(WebhookError::ParseError(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=1,v1=zzzz"),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn verify_accepts_a_correctly_signed_payload() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = r#"{"id":"evt_1"}"#;
        let now = chrono::Utc::now().timestamp();

        let result = verifier.verify(payload.as_bytes(), &header_for(TEST_SECRET, now, payload));
        assert!(result.is_ok());
    }

    #[test]
    fn verify_rejects_a_wrong_secret() {
        let verifier = WebhookVerifier::new("whsec_other");
        let payload = r#"{"id":"evt_1"}"#;
        let now = chrono::Utc::now().timestamp();

        let result = verifier.verify(payload.as_bytes(), &header_for(TEST_SECRET, now, payload));
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_rejects_a_tampered_payload() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let now = chrono::Utc::now().timestamp();
        let header = header_for(TEST_SECRET, now, r#"{"id":"evt_1"}"#);

        let result = verifier.verify(br#"{"id":"evt_2"}"#, &header);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_rejects_deliveries_outside_the_replay_window() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = r#"{"id":"evt_1"}"#;

        let stale = chrono::Utc::now().timestamp() - MAX_DELIVERY_AGE_SECS - 1;
        let result = verifier.verify(payload.as_bytes(), &header_for(TEST_SECRET, stale, payload));
        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));

        let future = chrono::Utc::now().timestamp() + MAX_CLOCK_SKEW_SECS + 60;
        let result = verifier.verify(payload.as_bytes(), &header_for(TEST_SECRET, future, payload));
        assert!(matches!(result, Err(WebhookError::InvalidTimestamp)));
    }

    #[test]
    fn verify_tolerates_bounded_clock_skew() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = r#"{"id":"evt_1"}"#;
        let slightly_ahead = chrono::Utc::now().timestamp() + 30;

        let result = verifier.verify(
            payload.as_bytes(),
            &header_for(TEST_SECRET, slightly_ahead, payload),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn constant_time_eq_requires_equal_lengths() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
