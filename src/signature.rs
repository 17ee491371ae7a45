// credits_webhook_backend/src/signature.rs
// Lemon Squeezy webhook signature (hex HMAC-SHA256 over the raw body)

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";

/// Verify an `X-Signature` value against the exact bytes received.
/// Big O: O(n) where n is payload size
///
/// Anything that is not clean hex (odd length, stray characters, empty)
/// simply fails to verify. The digest comparison is constant-time.
pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Lowercase hex HMAC-SHA256 of `body`, as Lemon Squeezy sends it.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    // HMAC takes keys of any length, the error arm is unreachable.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "ls_whsec_test_secret";
    const BODY: &[u8] = br#"{"meta":{"event_name":"order_created","custom_data":{"user_id":"u-1"}}}"#;

    #[test]
    fn accepts_own_signature() {
        let sig = sign_body(SECRET, BODY);
        assert_eq!(sig.len(), 64);
        assert!(verify_signature(SECRET, &sig, BODY));
    }

    #[test]
    fn accepts_uppercase_hex() {
        let sig = sign_body(SECRET, BODY).to_uppercase();
        assert!(verify_signature(SECRET, &sig, BODY));
    }

    #[test]
    fn rejects_any_single_bit_flip_in_body() {
        let sig = sign_body(SECRET, BODY);
        for i in 0..BODY.len() {
            for bit in 0..8 {
                let mut tampered = BODY.to_vec();
                tampered[i] ^= 1 << bit;
                assert!(
                    !verify_signature(SECRET, &sig, &tampered),
                    "flip of bit {bit} in byte {i} verified"
                );
            }
        }
    }

    #[test]
    fn rejects_wrong_secret() {
        let sig = sign_body("another_secret", BODY);
        assert!(!verify_signature(SECRET, &sig, BODY));
    }

    #[test]
    fn malformed_signatures_do_not_verify() {
        let sig = sign_body(SECRET, BODY);
        let odd = &sig[..63];
        let truncated = &sig[..62];

        assert!(!verify_signature(SECRET, "", BODY));
        assert!(!verify_signature(SECRET, "abc", BODY));
        assert!(!verify_signature(SECRET, odd, BODY));
        assert!(!verify_signature(SECRET, truncated, BODY));
        assert!(!verify_signature(SECRET, "not-a-valid-hex-signature", BODY));
        assert!(!verify_signature(SECRET, "mock_signature", BODY));
    }

    #[test]
    fn empty_body_round_trips() {
        let sig = sign_body(SECRET, b"");
        assert!(verify_signature(SECRET, &sig, b""));
        assert!(!verify_signature(SECRET, &sig, b" "));
    }
}
