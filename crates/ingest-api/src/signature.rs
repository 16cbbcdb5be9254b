//! HMAC-SHA256 webhook signature verification with replay protection.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const MAX_CLOCK_SKEW_SECS: i64 = 300;

#[derive(Debug, PartialEq, Eq)]
pub enum SignatureError {
    MissingSignature,
    MissingTimestamp,
    InvalidTimestamp,
    StaleTimestamp,
    Mismatch,
}

/// Verify a webhook request's signature.
///
/// The signed message is `method\npath\ntimestamp\n` followed by the raw
/// request body, HMAC-SHA256'd with the webhook's configured secret and
/// hex-encoded. `now` is injected so tests can pin the clock.
pub fn verify(
    secret: &str,
    method: &str,
    path: &str,
    raw_body: &[u8],
    provided_signature: Option<&str>,
    provided_timestamp: Option<&str>,
    now: i64,
) -> Result<(), SignatureError> {
    let signature = provided_signature.ok_or(SignatureError::MissingSignature)?;
    let timestamp_raw = provided_timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let timestamp: i64 = timestamp_raw
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;

    if (now - timestamp).abs() > MAX_CLOCK_SKEW_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(method.as_bytes());
    mac.update(b"\n");
    mac.update(path.as_bytes());
    mac.update(b"\n");
    mac.update(timestamp_raw.as_bytes());
    mac.update(b"\n");
    mac.update(raw_body);
    let expected = hex::encode(mac.finalize().into_bytes());

    if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, method: &str, path: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(method.as_bytes());
        mac.update(b"\n");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(timestamp.as_bytes());
        mac.update(b"\n");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_and_fresh_timestamp_passes() {
        let sig = sign("shh", "POST", "/api/v1/webhook/abc", "1000", b"{}");
        assert!(verify("shh", "POST", "/api/v1/webhook/abc", b"{}", Some(&sig), Some("1000"), 1000).is_ok());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let sig = sign("shh", "POST", "/api/v1/webhook/abc", "1000", b"{}");
        let err = verify(
            "shh",
            "POST",
            "/api/v1/webhook/abc",
            b"{}",
            Some(&sig),
            Some("1000"),
            1000 + 301,
        )
        .unwrap_err();
        assert_eq!(err, SignatureError::StaleTimestamp);
    }

    #[test]
    fn timestamp_at_boundary_is_accepted() {
        let sig = sign("shh", "POST", "/api/v1/webhook/abc", "1000", b"{}");
        assert!(verify(
            "shh",
            "POST",
            "/api/v1/webhook/abc",
            b"{}",
            Some(&sig),
            Some("1000"),
            1000 + 300,
        )
        .is_ok());
    }

    #[test]
    fn tampered_body_fails_verification() {
        let sig = sign("shh", "POST", "/api/v1/webhook/abc", "1000", b"{}");
        let err = verify(
            "shh",
            "POST",
            "/api/v1/webhook/abc",
            b"{\"tampered\":true}",
            Some(&sig),
            Some("1000"),
            1000,
        )
        .unwrap_err();
        assert_eq!(err, SignatureError::Mismatch);
    }

    #[test]
    fn missing_signature_header_is_rejected() {
        let err = verify("shh", "POST", "/x", b"{}", None, Some("1000"), 1000).unwrap_err();
        assert_eq!(err, SignatureError::MissingSignature);
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let sig = sign("shh", "POST", "/x", "1000", b"{}");
        let err = verify("shh", "POST", "/x", b"{}", Some(&sig), Some("not-a-number"), 1000).unwrap_err();
        assert_eq!(err, SignatureError::InvalidTimestamp);
    }
}
