//! Hybrid payload tests against a real key pair, without a connection.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use loxaudio::crypto::{
    build_auth_command, max_plaintext_len, normalize_public_key, parse_public_key, unwrap_with,
    AuthCommand, CryptoError, CredentialEncryptor, HybridEncryptor,
};
use loxaudio::Credential;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;

fn key_pair() -> RsaPrivateKey {
    let mut rng = ChaCha20Rng::seed_from_u64(1234);
    RsaPrivateKey::new(&mut rng, 1024).unwrap()
}

fn single_line(der: &[u8]) -> String {
    format!(
        "-----BEGIN PUBLIC KEY-----{}-----END PUBLIC KEY-----",
        STANDARD.encode(der)
    )
}

fn spki_single_line(key: &RsaPrivateKey) -> String {
    single_line(key.to_public_key().to_public_key_der().unwrap().as_bytes())
}

#[test]
fn test_command_has_three_segments() {
    let key = key_pair();
    let command = HybridEncryptor
        .encrypt(&spki_single_line(&key), "abc123", &Credential::new("jwt"), "admin")
        .unwrap();

    let rest = command.strip_prefix("secure/authenticate/").unwrap();
    assert_eq!(rest.split('/').count(), 3);

    let parsed = AuthCommand::parse(&command).unwrap();
    assert_eq!(parsed.user, "admin");
    // 1024-bit modulus
    assert_eq!(parsed.rsa_ciphertext().unwrap().len(), 128);
    // "jwt" pads to one block
    assert_eq!(parsed.aes_ciphertext().unwrap().len(), 16);
}

#[test]
fn test_fresh_material_per_call() {
    let key = key_pair();
    let pubkey = spki_single_line(&key);
    let credential = Credential::new("jwt");

    let first = HybridEncryptor
        .encrypt(&pubkey, "abc123", &credential, "admin")
        .unwrap();
    let second = HybridEncryptor
        .encrypt(&pubkey, "abc123", &credential, "admin")
        .unwrap();

    let first = AuthCommand::parse(&first).unwrap();
    let second = AuthCommand::parse(&second).unwrap();
    assert_ne!(first.rsa_b64, second.rsa_b64);
    assert_ne!(first.aes_b64, second.aes_b64);

    let first_plain = unwrap_with(&key, &first.rsa_ciphertext().unwrap()).unwrap();
    let second_plain = unwrap_with(&key, &second.rsa_ciphertext().unwrap()).unwrap();
    assert_ne!(first_plain, second_plain);
}

#[test]
fn test_deterministic_with_seeded_rng() {
    let key = key_pair();
    let pubkey = spki_single_line(&key);
    let credential = Credential::new("jwt");

    let a = build_auth_command(
        &mut ChaCha20Rng::seed_from_u64(9),
        &pubkey,
        "abc123",
        &credential,
        "admin",
    )
    .unwrap();
    let b = build_auth_command(
        &mut ChaCha20Rng::seed_from_u64(9),
        &pubkey,
        "abc123",
        &credential,
        "admin",
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_pkcs1_public_key_accepted() {
    let key = key_pair();
    let pkcs1 = single_line(key.to_public_key().to_pkcs1_der().unwrap().as_bytes());

    let command = HybridEncryptor
        .encrypt(&pkcs1, "abc123", &Credential::new("jwt"), "admin")
        .unwrap();
    let parsed = AuthCommand::parse(&command).unwrap();
    assert!(unwrap_with(&key, &parsed.rsa_ciphertext().unwrap()).is_ok());
}

#[test]
fn test_normalized_key_parses_to_same_key() {
    let key = key_pair();
    let single = spki_single_line(&key);
    let normalized = normalize_public_key(&single);

    assert_eq!(normalized.lines().count(), 3);
    assert_eq!(normalize_public_key(&normalized), normalized);
    assert_eq!(
        parse_public_key(&single).unwrap(),
        parse_public_key(&normalized).unwrap()
    );
}

#[test]
fn test_session_token_too_long_for_modulus() {
    let key = key_pair();
    let max = max_plaintext_len(&key.to_public_key());
    // "<64 hex>:<32 hex>:" leaves max - 98 bytes for the token
    let token = "t".repeat(max - 98 + 1);

    let err = HybridEncryptor
        .encrypt(&spki_single_line(&key), &token, &Credential::new("jwt"), "admin")
        .unwrap_err();
    assert!(matches!(err, CryptoError::PlaintextTooLong { .. }));
}

#[test]
fn test_longest_session_token_fits() {
    let key = key_pair();
    let max = max_plaintext_len(&key.to_public_key());
    let token = "t".repeat(max - 98);

    let command = HybridEncryptor
        .encrypt(&spki_single_line(&key), &token, &Credential::new("jwt"), "admin")
        .unwrap();
    let parsed = AuthCommand::parse(&command).unwrap();
    let plain = unwrap_with(&key, &parsed.rsa_ciphertext().unwrap()).unwrap();
    assert_eq!(plain.len(), max);
}

#[test]
fn test_bad_public_keys() {
    let credential = Credential::new("jwt");

    for bad in [
        "",
        "not a key",
        "-----BEGIN PUBLIC KEY----------END PUBLIC KEY-----",
        "-----BEGIN PUBLIC KEY-----%%%%-----END PUBLIC KEY-----",
        "-----BEGIN PUBLIC KEY-----AAAA-----END PUBLIC KEY-----",
    ] {
        let err = HybridEncryptor
            .encrypt(bad, "abc123", &credential, "admin")
            .unwrap_err();
        assert!(
            matches!(err, CryptoError::PublicKey(_)),
            "{bad:?} gave {err:?}"
        );
    }
}
