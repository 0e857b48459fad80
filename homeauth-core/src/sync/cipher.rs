use std::fmt;

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use zeroize::Zeroizing;

use super::SyncError;

/// Encrypts the new password carried in a sync payload.
///
/// AES-256-GCM with a fresh 96-bit nonce per message. The wire form is
/// `base64(nonce || ciphertext || tag)`.
#[derive(Clone)]
pub struct PasswordCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCipher")
            .field("algorithm", &"aes-256-gcm")
            .finish_non_exhaustive()
    }
}

impl PasswordCipher {
    pub const KEY_LEN: usize = 32;
    const NONCE_LEN: usize = 12;

    pub fn new(key: &[u8]) -> Result<Self, SyncError> {
        if key.len() != Self::KEY_LEN {
            return Err(SyncError::InvalidKey(format!(
                "expected {} bytes, got {}",
                Self::KEY_LEN,
                key.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Build from a base64 encoded 32 byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, SyncError> {
        let key = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|err| SyncError::InvalidKey(err.to_string()))?,
        );
        Self::new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SyncError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| SyncError::Encrypt)?;

        let mut framed = Vec::with_capacity(Self::NONCE_LEN + ciphertext.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(framed))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<Zeroizing<String>, SyncError> {
        let framed = BASE64.decode(encoded).map_err(|_| SyncError::Decrypt)?;
        if framed.len() <= Self::NONCE_LEN {
            return Err(SyncError::Decrypt);
        }
        let (nonce, ciphertext) = framed.split_at(Self::NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SyncError::Decrypt)?;
        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|_| SyncError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> PasswordCipher {
        PasswordCipher::new(&[7u8; 32]).unwrap()
    }

    #[test]
    fn nonce_is_fresh_per_message() {
        let cipher = cipher();
        let first = cipher.encrypt("hunter22").unwrap();
        let second = cipher.encrypt("hunter22").unwrap();

        assert_ne!(first, second);
        assert_eq!(cipher.decrypt(&first).unwrap().as_str(), "hunter22");
        assert_eq!(cipher.decrypt(&second).unwrap().as_str(), "hunter22");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = cipher().encrypt("hunter22").unwrap();
        let other = PasswordCipher::new(&[8u8; 32]).unwrap();
        assert!(matches!(other.decrypt(&sealed), Err(SyncError::Decrypt)));
    }

    #[test]
    fn key_length_is_checked() {
        assert!(matches!(
            PasswordCipher::new(&[0u8; 16]),
            Err(SyncError::InvalidKey(_))
        ));
        let encoded = BASE64.encode([1u8; 32]);
        assert!(PasswordCipher::from_base64(&encoded).is_ok());
        assert!(PasswordCipher::from_base64("not base64!").is_err());
    }

    #[test]
    fn truncated_frames_are_rejected() {
        let short = BASE64.encode([0u8; 12]);
        assert!(matches!(cipher().decrypt(&short), Err(SyncError::Decrypt)));
    }
}
