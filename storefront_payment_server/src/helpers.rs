//! Webhook signature verification.
//!
//! The gateway signs notifications with an `x-signature` header of the form `ts=<unix ts>,v1=<hex hmac>`. The
//! HMAC-SHA256 is taken over the manifest `id:<data id>;request-id:<x-request-id>;ts:<ts>;` with the
//! webhook secret as key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The `ts` and `v1` fields of an `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParts {
    pub ts: String,
    pub v1: String,
}

/// Splits an `x-signature` header into its parts. Returns `None` when either field is missing.
pub fn parse_signature_header(header: &str) -> Option<SignatureParts> {
    let mut ts = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim().to_string()),
            Some(("v1", value)) => v1 = Some(value.trim().to_string()),
            _ => {},
        }
    }
    Some(SignatureParts { ts: ts?, v1: v1? })
}

pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot actually fail
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies the signature on a webhook request. `data_id` is the payment id from the notification body and
/// `request_id` is the `x-request-id` header.
pub fn verify_webhook_signature(secret: &str, signature_header: &str, request_id: &str, data_id: &str) -> bool {
    let Some(parts) = parse_signature_header(signature_header) else {
        return false;
    };
    let manifest = format!("id:{};request-id:{};ts:{};", data_id.to_lowercase(), request_id, parts.ts);
    let expected = calculate_hmac(secret, manifest.as_bytes());
    expected.eq_ignore_ascii_case(&parts.v1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signature_headers_parse() {
        let parts = parse_signature_header("ts=1704908010,v1=abcdef0123").unwrap();
        assert_eq!(parts.ts, "1704908010");
        assert_eq!(parts.v1, "abcdef0123");
        assert!(parse_signature_header("ts=1704908010").is_none());
        assert!(parse_signature_header("garbage").is_none());
    }

    #[test]
    fn valid_signatures_verify() {
        let secret = "my-webhook-secret";
        let manifest = "id:pay-123;request-id:req-9;ts:1704908010;";
        let v1 = calculate_hmac(secret, manifest.as_bytes());
        let header = format!("ts=1704908010,v1={v1}");
        assert!(verify_webhook_signature(secret, &header, "req-9", "pay-123"));
        // the id is lowercased before signing
        assert!(verify_webhook_signature(secret, &header, "req-9", "PAY-123"));
    }

    #[test]
    fn tampered_signatures_fail() {
        let secret = "my-webhook-secret";
        let manifest = "id:pay-123;request-id:req-9;ts:1704908010;";
        let v1 = calculate_hmac(secret, manifest.as_bytes());
        let header = format!("ts=1704908010,v1={v1}");
        assert!(!verify_webhook_signature("wrong-secret", &header, "req-9", "pay-123"));
        assert!(!verify_webhook_signature(secret, &header, "req-9", "pay-999"));
        assert!(!verify_webhook_signature(secret, "ts=1,v1=deadbeef", "req-9", "pay-123"));
    }
}
