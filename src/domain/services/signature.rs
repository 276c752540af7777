use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("timestamp outside tolerance window")]
    TimestampOutOfTolerance,
    #[error("no signature matched the payload")]
    Mismatch,
    #[error("webhook secret cannot be used as an HMAC key")]
    InvalidSecret,
}

/// Verifies `t=<unix>,v1=<hex>` signature headers over the raw request body.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
        Self { secret: secret.into(), tolerance_secs }
    }

    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<(), SignatureError> {
        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<Vec<u8>> = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value.parse().map_err(|_| SignatureError::MalformedHeader)?),
                // Undecodable entries simply never match.
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        candidates.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if candidates.is_empty() {
            return Err(SignatureError::Mismatch);
        }

        if self.tolerance_secs > 0 {
            let age = now.checked_sub(timestamp).ok_or(SignatureError::TimestampOutOfTolerance)?;
            if age.unsigned_abs() > self.tolerance_secs.unsigned_abs() {
                return Err(SignatureError::TimestampOutOfTolerance);
            }
        }

        let mut mac = self.mac()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = candidates.iter().any(|candidate| mac.clone().verify_slice(candidate).is_ok());

        if matched { Ok(()) } else { Err(SignatureError::Mismatch) }
    }

    /// Builds a header for `payload` at `timestamp`. Used by tests and local tooling.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, SignatureError> {
        let mut mac = self.mac()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
    }

    fn mac(&self) -> Result<HmacSha256, SignatureError> {
        HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_valid_signature() {
        let verifier = SignatureVerifier::new(SECRET, 300);
        let body = br#"{"id":"evt_1","type":"invoice.paid"}"#;
        let header = verifier.sign(body, NOW).unwrap();
        assert_eq!(verifier.verify(body, &header, NOW + 10), Ok(()));
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256("whsec_test_secret", "1700000000.{}")
        let verifier = SignatureVerifier::new(SECRET, 0);
        let header = verifier.sign(b"{}", NOW).unwrap();
        let expected = {
            let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
            mac.update(b"1700000000.{}");
            hex::encode(mac.finalize().into_bytes())
        };
        assert_eq!(header, format!("t=1700000000,v1={}", expected));
    }

    #[test]
    fn test_body_must_match_byte_for_byte() {
        let verifier = SignatureVerifier::new(SECRET, 300);
        let header = verifier.sign(br#"{"a": 1}"#, NOW).unwrap();
        assert_eq!(verifier.verify(br#"{"a":1}"#, &header, NOW), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_wrong_secret() {
        let signer = SignatureVerifier::new("whsec_other", 300);
        let verifier = SignatureVerifier::new(SECRET, 300);
        let header = signer.sign(b"{}", NOW).unwrap();
        assert_eq!(verifier.verify(b"{}", &header, NOW), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let verifier = SignatureVerifier::new(SECRET, 300);
        let good = verifier.sign(b"{}", NOW).unwrap();
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={},v1={},v1={},v0=deadbeef", NOW, "00".repeat(32), good_sig);
        assert_eq!(verifier.verify(b"{}", &header, NOW), Ok(()));
    }

    #[test]
    fn test_stale_timestamp() {
        let verifier = SignatureVerifier::new(SECRET, 300);
        let header = verifier.sign(b"{}", NOW - 301).unwrap();
        assert_eq!(verifier.verify(b"{}", &header, NOW), Err(SignatureError::TimestampOutOfTolerance));
    }

    #[test]
    fn test_extreme_timestamps_are_out_of_tolerance() {
        let verifier = SignatureVerifier::new(SECRET, 300);
        let sig = "00".repeat(32);
        assert_eq!(
            verifier.verify(b"{}", &format!("t=-9223372036854775808,v1={}", sig), NOW),
            Err(SignatureError::TimestampOutOfTolerance)
        );
        assert_eq!(
            verifier.verify(b"{}", &format!("t=9223372036854775807,v1={}", sig), -NOW),
            Err(SignatureError::TimestampOutOfTolerance)
        );
        assert_eq!(
            verifier.verify(b"{}", &format!("t={},v1={}", i64::MIN + 1, sig), 0),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_malformed_headers() {
        let verifier = SignatureVerifier::new(SECRET, 300);
        assert_eq!(verifier.verify(b"{}", "v1=abcd", NOW), Err(SignatureError::MalformedHeader));
        assert_eq!(verifier.verify(b"{}", "t=notanumber,v1=abcd", NOW), Err(SignatureError::MalformedHeader));
        assert_eq!(verifier.verify(b"{}", &format!("t={}", NOW), NOW), Err(SignatureError::Mismatch));
        assert_eq!(verifier.verify(b"{}", "garbage", NOW), Err(SignatureError::MalformedHeader));
    }
}
