use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
    Key,
    Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use shop_common::Secret;
use thiserror::Error;

const NONCE_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("The value could not be encrypted")]
    EncryptionFailed,
    #[error("The value could not be decrypted")]
    DecryptionFailed,
    #[error("The encrypted value is not valid base64")]
    InvalidEncoding,
}

/// Symmetric encryption of short strings (email addresses in password reset flows). The AES-256 key is the SHA-256
/// digest of the server secret. Output is base64url(nonce || ciphertext).
#[derive(Clone)]
pub struct EmailCipher {
    cipher: Aes256Gcm,
}

impl EmailCipher {
    pub fn new(secret: &Secret<String>) -> Self {
        let key = Sha256::digest(secret.reveal().as_bytes());
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        Self { cipher }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;
        let mut out = nonce.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(base64::encode_config(out, base64::URL_SAFE_NO_PAD))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String, CipherError> {
        let bytes =
            base64::decode_config(encrypted.trim(), base64::URL_SAFE_NO_PAD).map_err(|_| CipherError::InvalidEncoding)?;
        if bytes.len() <= NONCE_LENGTH {
            return Err(CipherError::DecryptionFailed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LENGTH);
        let plaintext =
            self.cipher.decrypt(Nonce::from_slice(nonce), ciphertext).map_err(|_| CipherError::DecryptionFailed)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailed)
    }
}
