//! Hybrid credential encryptor.
//!
//! Builds the single `secure/authenticate/...` command the controller
//! expects:
//!
//! ```text
//! seed(16) ──hex──> key(32 ASCII bytes) ─┐
//! iv(16)  ────────────────────────────── ├─ AES-256-CBC/PKCS#7(credential) ─> base64 ─┐
//!                                        │                                           │
//! "<hex(key)>:<hex(iv)>:<session-token>" ─ RSA PKCS#1 v1.5(pubkey) ─> base64 ───────┤
//!                                                                                     v
//!      secure/authenticate/<pct(user)>/<pct(rsa_b64)>/<pct(aes_b64)>
//! ```
//!
//! Every call draws fresh key material; nothing is cached between calls.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use super::aes_cbc::AesCbcCipher;
use super::error::CryptoError;
use super::keys::{Credential, EphemeralKeys};
use super::pem::{normalize_public_key, parse_public_key};
use super::rsa_wrap;
use crate::protocol::AUTHENTICATE_COMMAND;

/// Characters left unescaped in a command segment: the RFC 3986
/// unreserved set. Everything else, `/` included, is percent-encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one `/`-delimited command segment.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Produces the authenticate command from the controller's key disclosure.
///
/// The handshake state machine depends on this trait rather than on
/// [`HybridEncryptor`] directly so the key exchange can be observed in
/// tests.
pub trait CredentialEncryptor: Send + Sync {
    /// Build `secure/authenticate/{user}/{rsa}/{aes}`.
    fn encrypt(
        &self,
        public_key: &str,
        session_token: &str,
        credential: &Credential,
        active_user: &str,
    ) -> Result<String, CryptoError>;
}

/// Production encryptor drawing key material from the OS RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridEncryptor;

impl CredentialEncryptor for HybridEncryptor {
    fn encrypt(
        &self,
        public_key: &str,
        session_token: &str,
        credential: &Credential,
        active_user: &str,
    ) -> Result<String, CryptoError> {
        build_auth_command(&mut OsRng, public_key, session_token, credential, active_user)
    }
}

/// Build the authenticate command with an explicit RNG.
pub fn build_auth_command<R: RngCore + CryptoRng>(
    rng: &mut R,
    public_key: &str,
    session_token: &str,
    credential: &Credential,
    active_user: &str,
) -> Result<String, CryptoError> {
    let rsa_key = parse_public_key(&normalize_public_key(public_key))?;

    let keys = EphemeralKeys::generate(rng);

    let wrapped = rsa_wrap::wrap(rng, &rsa_key, keys.rsa_plaintext(session_token).as_bytes())?;
    let rsa_b64 = STANDARD.encode(wrapped);

    let ciphertext = AesCbcCipher::from_keys(&keys).encrypt(credential.as_bytes())?;
    let aes_b64 = STANDARD.encode(ciphertext);

    Ok(format!(
        "{}/{}/{}/{}",
        AUTHENTICATE_COMMAND,
        encode_segment(active_user),
        encode_segment(&rsa_b64),
        encode_segment(&aes_b64)
    ))
}

/// Decoded segments of an authenticate command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCommand {
    /// Active user identity.
    pub user: String,
    /// Base64 RSA ciphertext of `"<hex-key>:<hex-iv>:<session-token>"`.
    pub rsa_b64: String,
    /// Base64 AES-CBC ciphertext of the credential.
    pub aes_b64: String,
}

impl AuthCommand {
    /// Split and percent-decode an authenticate command.
    pub fn parse(command: &str) -> Result<Self, CryptoError> {
        let rest = command
            .strip_prefix(AUTHENTICATE_COMMAND)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| CryptoError::Encoding("not an authenticate command".to_string()))?;

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() != 3 {
            return Err(CryptoError::Encoding(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        }

        let decode = |s: &str| {
            percent_decode_str(s)
                .decode_utf8()
                .map(|c| c.into_owned())
                .map_err(|e| CryptoError::Encoding(format!("percent-decoding: {e}")))
        };

        Ok(Self {
            user: decode(segments[0])?,
            rsa_b64: decode(segments[1])?,
            aes_b64: decode(segments[2])?,
        })
    }

    /// Base64-decode the RSA segment.
    pub fn rsa_ciphertext(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(STANDARD.decode(&self.rsa_b64)?)
    }

    /// Base64-decode the AES segment.
    pub fn aes_ciphertext(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(STANDARD.decode(&self.aes_b64)?)
    }
}
