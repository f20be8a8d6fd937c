use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_VERSION: &str = "v0";
/// Requests older or newer than this many seconds are treated as replays.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60 * 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("request timestamp `{0}` is not a unix timestamp")]
    MalformedTimestamp(String),
    #[error("request timestamp is {skew_secs}s away from now")]
    Stale { skew_secs: u64 },
    #[error("signature header is not a v0 hex digest")]
    MalformedSignature,
    #[error("signing secret is unusable")]
    InvalidSecret,
    #[error("signature does not match request body")]
    Mismatch,
}

/// `v0=` + hex(HMAC-SHA256(secret, "v0:{timestamp}:{body}")).
pub fn sign(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mac = keyed_mac(secret, timestamp, body)?;
    Ok(format!("{SIGNATURE_VERSION}={}", encode_hex(mac.finalize().into_bytes().as_slice())))
}

pub fn verify_signature(
    secret: &[u8],
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now_unix_secs: i64,
) -> Result<(), SignatureError> {
    let sent_at: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp(timestamp.to_owned()))?;
    let skew_secs = now_unix_secs.abs_diff(sent_at);
    if skew_secs > MAX_CLOCK_SKEW_SECS {
        return Err(SignatureError::Stale { skew_secs });
    }

    let digest = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|rest| rest.strip_prefix('='))
        .and_then(decode_hex)
        .ok_or(SignatureError::MalformedSignature)?;

    keyed_mac(secret, timestamp.trim(), body)?
        .verify_slice(&digest)
        .map_err(|_| SignatureError::Mismatch)
}

fn keyed_mac(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len()).step_by(2).map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::{sign, verify_signature, SignatureError, MAX_CLOCK_SKEW_SECS};

    const SECRET: &[u8] = b"8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &[u8] = b"token=xyz&command=%2Ftodo&text=";

    #[test]
    fn signed_request_verifies() {
        let signature = sign(SECRET, "1531420618", BODY).expect("sign");

        assert!(signature.starts_with("v0="));
        assert_eq!(signature.len(), 3 + 64);
        assert_eq!(verify_signature(SECRET, "1531420618", BODY, &signature, 1531420618), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let signature = sign(SECRET, "1531420618", BODY).expect("sign");

        let tampered = b"token=xyz&command=%2Fcreate";

        let result = verify_signature(SECRET, "1531420618", tampered, &signature, 1531420618);

        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signature = sign(b"another-secret", "1531420618", BODY).expect("sign");

        let result = verify_signature(SECRET, "1531420618", BODY, &signature, 1531420618);

        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn stale_timestamp_is_rejected_before_digest_check() {
        let signature = sign(SECRET, "1531420618", BODY).expect("sign");
        let now = 1531420618 + MAX_CLOCK_SKEW_SECS as i64 + 1;

        let result = verify_signature(SECRET, "1531420618", BODY, &signature, now);

        assert_eq!(result, Err(SignatureError::Stale { skew_secs: MAX_CLOCK_SKEW_SECS + 1 }));
    }

    #[test]
    fn extreme_timestamps_are_stale_without_overflow() {
        let now: i64 = 1_700_000_000;

        for timestamp in [i64::MIN, i64::MAX] {
            let header = timestamp.to_string();
            let signature = sign(SECRET, &header, BODY).expect("sign");

            let result = verify_signature(SECRET, &header, BODY, &signature, now);

            assert_eq!(result, Err(SignatureError::Stale { skew_secs: now.abs_diff(timestamp) }));
        }
    }

    #[test]
    fn malformed_headers_are_reported() {
        assert_eq!(
            verify_signature(SECRET, "yesterday", BODY, "v0=00", 0),
            Err(SignatureError::MalformedTimestamp("yesterday".to_owned()))
        );
        assert_eq!(
            verify_signature(SECRET, "100", BODY, "v1=abcd", 100),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verify_signature(SECRET, "100", BODY, "v0=zz", 100),
            Err(SignatureError::MalformedSignature)
        );
    }
}
