//! Public-key normalization and import.
//!
//! The controller delivers its public key as a single line:
//!
//! ```text
//! -----BEGIN PUBLIC KEY-----MIIBIjANBgkq...IDAQAB-----END PUBLIC KEY-----
//! ```
//!
//! [`normalize_public_key`] turns that into a structurally valid PEM block,
//! and [`parse_public_key`] imports it as an RSA public key.

use base64::Engine;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

use super::error::CryptoError;
use super::{PEM_FOOTER, PEM_HEADER};

/// Normalize a public key into a PEM block.
///
/// Places the header marker, the key body, and the footer marker on
/// separate lines and trims surrounding whitespace. Idempotent. Keys
/// without both markers are returned trimmed but otherwise untouched;
/// [`parse_public_key`] rejects them.
pub fn normalize_public_key(public_key: &str) -> String {
    let key = public_key.trim();

    let (Some(header_at), Some(footer_at)) = (key.find(PEM_HEADER), key.rfind(PEM_FOOTER)) else {
        return key.to_string();
    };

    let body_start = header_at + PEM_HEADER.len();
    if footer_at < body_start {
        return key.to_string();
    }

    let before = &key[..header_at];
    let body = key[body_start..footer_at].trim();
    let after = &key[footer_at + PEM_FOOTER.len()..];

    format!("{before}{PEM_HEADER}\n{body}\n{PEM_FOOTER}{after}")
        .trim()
        .to_string()
}

/// Extract and base64-decode the DER body between the PEM markers.
///
/// Whitespace inside the body (line wrapping of any width) is ignored.
pub fn public_key_der(public_key: &str) -> Result<Vec<u8>, CryptoError> {
    let header_at = public_key
        .find(PEM_HEADER)
        .ok_or_else(|| CryptoError::PublicKey("missing header marker".to_string()))?;
    let body_start = header_at + PEM_HEADER.len();

    let footer_at = public_key[body_start..]
        .find(PEM_FOOTER)
        .map(|offset| body_start + offset)
        .ok_or_else(|| CryptoError::PublicKey("missing footer marker".to_string()))?;

    let body: String = public_key[body_start..footer_at]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if body.is_empty() {
        return Err(CryptoError::PublicKey("empty key body".to_string()));
    }

    base64::engine::general_purpose::STANDARD
        .decode(body.as_bytes())
        .map_err(|e| CryptoError::PublicKey(format!("key body is not base64: {e}")))
}

/// Import an RSA public key from a (normalized or single-line) PEM string.
///
/// Accepts SubjectPublicKeyInfo DER, falling back to a bare PKCS#1
/// `RSAPublicKey` structure.
pub fn parse_public_key(public_key: &str) -> Result<RsaPublicKey, CryptoError> {
    let der = public_key_der(public_key)?;

    RsaPublicKey::from_public_key_der(&der)
        .or_else(|spki_err| {
            RsaPublicKey::from_pkcs1_der(&der).map_err(|pkcs1_err| {
                CryptoError::PublicKey(format!(
                    "not an RSA public key (SPKI: {spki_err}; PKCS#1: {pkcs1_err})"
                ))
            })
        })
}
