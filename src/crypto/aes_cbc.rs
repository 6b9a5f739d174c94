//! AES-256-CBC with PKCS#7 padding for the credential ciphertext.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use super::error::CryptoError;
use super::keys::EphemeralKeys;
use super::{IV_SIZE, SYMMETRIC_KEY_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-CBC cipher bound to one key/IV pair.
pub struct AesCbcCipher<'a> {
    key: &'a [u8],
    iv: &'a [u8],
}

impl<'a> AesCbcCipher<'a> {
    /// Create a cipher from a 32-byte key and 16-byte IV.
    pub fn new(key: &'a [u8], iv: &'a [u8]) -> Result<Self, CryptoError> {
        if key.len() != SYMMETRIC_KEY_SIZE {
            return Err(CryptoError::Cipher(format!(
                "Key must be {} bytes, got {}",
                SYMMETRIC_KEY_SIZE,
                key.len()
            )));
        }
        if iv.len() != IV_SIZE {
            return Err(CryptoError::Cipher(format!(
                "IV must be {} bytes, got {}",
                IV_SIZE,
                iv.len()
            )));
        }
        Ok(Self { key, iv })
    }

    /// Cipher over a set of ephemeral keys.
    pub fn from_keys(keys: &'a EphemeralKeys) -> Self {
        Self {
            key: keys.symmetric_key(),
            iv: keys.iv(),
        }
    }

    /// Pad with PKCS#7 and encrypt. Output length is always a non-zero
    /// multiple of the block size.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256CbcEnc::new_from_slices(self.key, self.iv)
            .map_err(|e| CryptoError::Cipher(format!("Invalid key/IV: {e}")))?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    /// Decrypt and strip PKCS#7 padding.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256CbcDec::new_from_slices(self.key, self.iv)
            .map_err(|e| CryptoError::Cipher(format!("Invalid key/IV: {e}")))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Cipher("Bad padding or truncated ciphertext".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SEED_SIZE;

    fn test_keys() -> EphemeralKeys {
        EphemeralKeys::from_parts(&[0x42u8; SEED_SIZE], [7u8; IV_SIZE])
    }

    #[test]
    fn test_roundtrip_boundary_lengths() {
        let keys = test_keys();
        let cipher = AesCbcCipher::from_keys(&keys);

        for len in [0usize, 1, 15, 16, 1000] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ciphertext = cipher.encrypt(&plaintext).unwrap();

            assert_eq!(ciphertext.len() % 16, 0);
            assert!(ciphertext.len() > plaintext.len(), "PKCS#7 always pads");
            assert_eq!(cipher.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_full_block_gets_extra_padding_block() {
        let keys = test_keys();
        let cipher = AesCbcCipher::from_keys(&keys);
        assert_eq!(cipher.encrypt(&[0u8; 16]).unwrap().len(), 32);
    }

    #[test]
    fn test_rejects_wrong_lengths() {
        assert!(AesCbcCipher::new(&[0u8; 16], &[0u8; IV_SIZE]).is_err());
        assert!(AesCbcCipher::new(&[0u8; 32], &[0u8; 8]).is_err());
        assert!(AesCbcCipher::new(&[0u8; 32], &[0u8; IV_SIZE]).is_ok());
    }

    #[test]
    fn test_wrong_key_fails_or_differs() {
        let keys = test_keys();
        let other = EphemeralKeys::from_parts(&[0x43u8; SEED_SIZE], [7u8; IV_SIZE]);
        let ciphertext = AesCbcCipher::from_keys(&keys).encrypt(b"token").unwrap();

        match AesCbcCipher::from_keys(&other).decrypt(&ciphertext) {
            Ok(plaintext) => assert_ne!(plaintext, b"token"),
            Err(err) => assert!(matches!(err, CryptoError::Cipher(_))),
        }
    }

    #[test]
    fn test_truncated_ciphertext() {
        let keys = test_keys();
        let cipher = AesCbcCipher::from_keys(&keys);
        assert!(cipher.decrypt(&[0u8; 15]).is_err());
    }
}
