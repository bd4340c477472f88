use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against
/// the raw request body and the shared signing secret.
///
/// The signed payload is `"{t}.{body}"`. Signatures older or newer than
/// `tolerance_secs` are rejected to bound replay windows. This is the trust
/// boundary: nothing downstream runs unless this returns true.
pub fn verify_signature(header: &str, payload: &[u8], secret: &str, tolerance_secs: u64) -> bool {
    let Some((timestamp, candidate)) = parse_signature_header(header) else {
        return false;
    };

    if let Ok(ts) = timestamp.parse::<i64>() {
        let now = chrono::Utc::now().timestamp();
        if (now - ts).unsigned_abs() > tolerance_secs {
            return false;
        }
    } else {
        return false;
    }

    let expected = compute_signature(timestamp, payload, secret);
    constant_time_eq(&expected, candidate)
}

/// Computes the hex HMAC-SHA256 over `"{timestamp}.{body}"`.
pub fn compute_signature(timestamp: &str, payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn parse_signature_header(header: &str) -> Option<(&str, &str)> {
    let mut ts = "";
    let mut v1 = "";
    for part in header.split(',') {
        let mut it = part.trim().splitn(2, '=');
        match (it.next(), it.next()) {
            (Some("t"), Some(val)) => ts = val,
            (Some("v1"), Some(val)) => v1 = val,
            _ => {}
        }
    }
    if ts.is_empty() || v1.is_empty() {
        None
    } else {
        Some((ts, v1))
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn signed_header(payload: &[u8]) -> String {
        let ts = chrono::Utc::now().timestamp().to_string();
        let sig = compute_signature(&ts, payload, SECRET);
        format!("t={},v1={}", ts, sig)
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"id":"evt_1","type":"charge.refunded"}"#;
        let header = signed_header(payload);
        assert!(verify_signature(&header, payload, SECRET, 300));
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = b"{}";
        let header = signed_header(payload);
        assert!(!verify_signature(&header, payload, "whsec_other", 300));
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = br#"{"amount":100}"#;
        let header = signed_header(payload);
        assert!(!verify_signature(&header, br#"{"amount":999}"#, SECRET, 300));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = b"{}";
        let ts = (chrono::Utc::now().timestamp() - 3600).to_string();
        let sig = compute_signature(&ts, payload, SECRET);
        let header = format!("t={},v1={}", ts, sig);
        assert!(!verify_signature(&header, payload, SECRET, 300));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(!verify_signature("v1=abc", b"{}", SECRET, 300));
        assert!(!verify_signature("t=123", b"{}", SECRET, 300));
        assert!(!verify_signature("", b"{}", SECRET, 300));
    }
}
