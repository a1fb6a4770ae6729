//! Verification of signed provider webhooks.
//!
//! The signature header has the form `t=<unix seconds>,v1=<hex>`, where the
//! hex digest is HMAC-SHA256 over `"<t>.<raw body>"` keyed with the endpoint
//! secret. Several `v1` entries may be present during secret rotation.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::gateway::PaymentIntent;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("signature timestamp outside the tolerance window")]
    Expired,
    #[error("no signature matches the payload")]
    Mismatch,
    #[error("invalid event payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// The payment intent carried by `payment_intent.*` events.
    pub fn payment_intent(&self) -> Option<PaymentIntent> {
        serde_json::from_value(self.data.object.clone()).ok()
    }
}

pub struct WebhookVerifier {
    secret: Vec<u8>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<(), WebhookError> {
        let mut timestamp = None;
        let mut candidates = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| WebhookError::MalformedHeader)?,
                    )
                }
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if candidates.is_empty() {
            return Err(WebhookError::MalformedHeader);
        }

        let expected = self.digest(payload, timestamp).ok_or(WebhookError::Mismatch)?;
        let matched = candidates
            .iter()
            .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
        if !matched {
            return Err(WebhookError::Mismatch);
        }
        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(WebhookError::Expired);
        }
        Ok(())
    }

    /// Verifies the signature and decodes the event.
    pub fn event(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify(payload, header.ok_or(WebhookError::MissingSignature)?, now)?;
        serde_json::from_slice(payload).map_err(|err| WebhookError::Payload(err.to_string()))
    }

    /// Header value the provider would send for `payload` at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let digest = self.digest(payload, timestamp).unwrap_or_default();
        format!("t={timestamp},v1={digest}")
    }

    fn digest(&self, payload: &[u8], timestamp: i64) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","status":"succeeded","metadata":{"type":"premium","userId":"u1"}}}}"#;

    #[test]
    fn accepts_fresh_valid_signatures() {
        let verifier = WebhookVerifier::new("whsec_test");
        let header = verifier.sign(BODY, 1_700_000_000);
        verifier
            .verify(BODY, &header, 1_700_000_100)
            .expect("valid signature");

        let event = verifier
            .event(BODY, Some(&header), 1_700_000_000)
            .expect("event");
        assert_eq!(event.kind, PAYMENT_SUCCEEDED);
        let intent = event.payment_intent().expect("intent");
        assert_eq!(intent.metadata.get("userId").map(String::as_str), Some("u1"));
    }

    #[test]
    fn rejects_tampered_foreign_and_stale_signatures() {
        let verifier = WebhookVerifier::new("whsec_test");
        let header = verifier.sign(BODY, 1_700_000_000);

        let tampered = BODY.to_vec().into_iter().rev().collect::<Vec<u8>>();
        assert_eq!(
            verifier.verify(&tampered, &header, 1_700_000_000),
            Err(WebhookError::Mismatch)
        );

        let foreign = WebhookVerifier::new("whsec_other").sign(BODY, 1_700_000_000);
        assert_eq!(
            verifier.verify(BODY, &foreign, 1_700_000_000),
            Err(WebhookError::Mismatch)
        );

        assert_eq!(
            verifier.verify(BODY, &header, 1_700_000_301),
            Err(WebhookError::Expired)
        );
    }

    #[test]
    fn header_shape_is_checked() {
        let verifier = WebhookVerifier::new("whsec_test");
        assert_eq!(
            verifier.verify(BODY, "v1=abc", 0),
            Err(WebhookError::MalformedHeader)
        );
        assert_eq!(
            verifier.verify(BODY, "t=abc,v1=abc", 0),
            Err(WebhookError::MalformedHeader)
        );
        assert_eq!(verifier.verify(BODY, "t=5", 5), Err(WebhookError::MalformedHeader));
        assert!(matches!(
            verifier.event(BODY, None, 0),
            Err(WebhookError::MissingSignature)
        ));
    }

    #[test]
    fn any_matching_v1_entry_is_enough() {
        let verifier = WebhookVerifier::new("whsec_test");
        let valid = verifier.sign(BODY, 42);
        let digest = valid.split_once(",v1=").map(|(_, d)| d).expect("digest");
        let header = format!("t=42,v1=deadbeef,v1={digest}");
        verifier.verify(BODY, &header, 42).expect("rotated secret");
    }
}
