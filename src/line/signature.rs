//! `X-Line-Signature` check: base64 of HMAC-SHA256 over the raw body, keyed
//! with the channel secret.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is not valid base64")]
    Malformed,

    #[error("signature does not match request body")]
    Mismatch,

    #[error("channel secret rejected as HMAC key")]
    InvalidKey,
}

pub fn sign(channel_secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    Ok(STANDARD.encode(mac(channel_secret, body)?.finalize().into_bytes()))
}

/// Constant-time comparison of `signature` against the body's MAC.
pub fn verify(channel_secret: &str, body: &[u8], signature: &str) -> Result<(), SignatureError> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| SignatureError::Malformed)?;

    mac(channel_secret, body)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

fn mac(channel_secret: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(mac)
}
