//! RSA PKCS#1 v1.5 wrapping of the ephemeral key material.

use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use super::error::CryptoError;

/// PKCS#1 v1.5 encryption padding overhead in bytes.
pub const PKCS1_V15_OVERHEAD: usize = 11;

/// Largest plaintext PKCS#1 v1.5 can carry for this key's modulus.
pub fn max_plaintext_len(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(PKCS1_V15_OVERHEAD)
}

/// Encrypt `plaintext` with the controller's public key.
///
/// Never truncates: an oversized plaintext is a
/// [`CryptoError::PlaintextTooLong`].
pub fn wrap<R: RngCore + CryptoRng>(
    rng: &mut R,
    key: &RsaPublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let max = max_plaintext_len(key);
    if plaintext.len() > max {
        return Err(CryptoError::PlaintextTooLong {
            len: plaintext.len(),
            max,
        });
    }

    key.encrypt(rng, Pkcs1v15Encrypt, plaintext)
        .map_err(|e| match e {
            rsa::Error::MessageTooLong => CryptoError::PlaintextTooLong {
                len: plaintext.len(),
                max,
            },
            other => CryptoError::Rsa(other.to_string()),
        })
}

/// Decrypt a wrapped payload with the matching private key.
///
/// This is the controller's side of [`wrap`]; the client never holds a
/// private key.
pub fn unwrap_with(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    key.decrypt(Pkcs1v15Encrypt, ciphertext)
        .map_err(|e| CryptoError::Rsa(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_key() -> RsaPrivateKey {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        RsaPrivateKey::new(&mut rng, 1024).unwrap()
    }

    #[test]
    fn test_wrap_unwrap() {
        let private = test_key();
        let public = private.to_public_key();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let wrapped = wrap(&mut rng, &public, b"key:iv:token").unwrap();
        assert_eq!(wrapped.len(), public.size());
        assert_eq!(unwrap_with(&private, &wrapped).unwrap(), b"key:iv:token");
    }

    #[test]
    fn test_max_plaintext_len() {
        let public = test_key().to_public_key();
        assert_eq!(max_plaintext_len(&public), 128 - PKCS1_V15_OVERHEAD);
    }

    #[test]
    fn test_plaintext_too_long_is_rejected() {
        let public = test_key().to_public_key();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let oversized = vec![b'a'; max_plaintext_len(&public) + 1];
        let err = wrap(&mut rng, &public, &oversized).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::PlaintextTooLong { len, max } if len == max + 1
        ));
    }

    #[test]
    fn test_fresh_padding_per_call() {
        let public = test_key().to_public_key();
        let mut rng = ChaCha20Rng::seed_from_u64(9);

        let a = wrap(&mut rng, &public, b"same").unwrap();
        let b = wrap(&mut rng, &public, b"same").unwrap();
        assert_ne!(a, b);
    }
}
