// src/store/crypto.rs — Credential encryption at rest (AES-256-GCM)

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const NONCE_LEN: usize = 12;

/// Encrypts credential JSON for storage and decrypts it just-in-time at
/// dispatch. The blob layout is nonce || ciphertext, base64-encoded.
///
/// The master key is injected (from configuration) — there is no default
/// key, so a rotated or wrong key surfaces as a decryption failure rather
/// than silently producing a second keyspace.
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow!("encryption failure: {e:?}"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let decoded = BASE64.decode(encoded)?;
        if decoded.len() < NONCE_LEN {
            return Err(anyhow!("encrypted payload too short"));
        }

        let (nonce_bytes, ciphertext) = decoded.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| anyhow!("decryption failure: {e:?}"))?;

        Ok(String::from_utf8(plaintext)?)
    }
}
