use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a GitHub HMAC signature over the raw request body.
/// Expects a header value like "sha256=<hex>".
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let expected_hex = match signature_header.strip_prefix("sha256=") {
        Some(h) => h,
        None => return false,
    };
    let expected = match hex::decode(expected_hex) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    // verify_slice is constant-time; this endpoint is reachable from the
    // public internet.
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"zen":"Keep it logically awesome."}"#;
        let header = sign("s3cret", body);
        assert!(verify_signature("s3cret", body, &header));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let header = sign("other", body);
        assert!(!verify_signature("s3cret", body, &header));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign("s3cret", b"payload");
        assert!(!verify_signature("s3cret", b"payload2", &header));
    }

    #[test]
    fn rejects_missing_prefix_or_bad_hex() {
        assert!(!verify_signature("s3cret", b"x", "deadbeef"));
        assert!(!verify_signature("s3cret", b"x", "sha256=not-hex"));
        assert!(!verify_signature("s3cret", b"x", ""));
    }
}
