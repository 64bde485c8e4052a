use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::aead::{self, AEAD_KEY_LEN};
use crate::error::Error;

/// Handshake-time AEAD key and nonce counter.
///
/// Each `mix_key` installs a fresh temporary key with the nonce back at zero.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherState {
    /// The temporary key, or `None` before the first `mix_key`.
    key: Option<[u8; AEAD_KEY_LEN]>,
    /// Nonce counter, incremented after each encryption/decryption.
    #[zeroize(skip)]
    nonce: u64,
}

impl CipherState {
    /// Create an empty (uninitialized) CipherState.
    pub fn empty() -> Self {
        Self {
            key: None,
            nonce: 0,
        }
    }

    /// Initialize with a key, resetting the nonce counter to zero.
    pub fn initialize_key(&mut self, key: [u8; AEAD_KEY_LEN]) {
        self.key = Some(key);
        self.nonce = 0;
    }

    /// Encrypt plaintext with associated data, appending the tag.
    pub fn encrypt_with_ad(&mut self, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        let key = self.key.as_ref().ok_or(Error::InvalidState)?;
        let out = aead::encrypt(key, self.nonce, ad, plaintext)?;
        self.nonce += 1;
        Ok(out)
    }

    /// Decrypt ciphertext with associated data, verifying the tag.
    ///
    /// The nonce only advances when the tag verifies.
    pub fn decrypt_with_ad(&mut self, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        let key = self.key.as_ref().ok_or(Error::InvalidState)?;
        let out = aead::decrypt(key, self.nonce, ad, ciphertext)?;
        self.nonce += 1;
        Ok(out)
    }
}
