use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::cipher_state::CipherState;
use crate::crypto::aead::AEAD_KEY_LEN;
use crate::crypto::hash::{self, HASH_LEN};
use crate::error::Error;

/// The Noise protocol name hashed into the initial transcript.
pub const PROTOCOL_NAME: &str = "Noise_XK_secp256k1_ChaChaPoly_SHA256";
/// The prologue mixed into the transcript right after initialization.
pub const PROLOGUE: &[u8] = b"lightning";

/// Keys produced by [`SymmetricState::split`].
pub struct SplitKeys {
    /// Final transcript hash.
    pub h: [u8; HASH_LEN],
    /// Final chaining key, carried into both transport directions for rotation.
    pub ck: Zeroizing<[u8; HASH_LEN]>,
    /// First HKDF output: the initiator's sending key.
    pub k1: Zeroizing<[u8; AEAD_KEY_LEN]>,
    /// Second HKDF output: the initiator's receiving key.
    pub k2: Zeroizing<[u8; AEAD_KEY_LEN]>,
}

/// Running handshake transcript: chaining key, handshake hash and the
/// current temporary key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricState {
    cipher: CipherState,
    /// Chaining key (ck), folded with every DH output via HKDF.
    ck: Zeroizing<[u8; HASH_LEN]>,
    /// Handshake hash (h), accumulates every public value exchanged.
    h: [u8; HASH_LEN],
}

impl SymmetricState {
    /// Initialize from a protocol name and mix in the prologue.
    ///
    /// Names up to `HASH_LEN` bytes are zero padded, longer names are hashed.
    /// `ck` starts equal to `h` before the prologue is mixed.
    pub fn initialize(protocol_name: &str, prologue: &[u8]) -> Self {
        let name_bytes = protocol_name.as_bytes();
        let h = if name_bytes.len() <= HASH_LEN {
            let mut h = [0u8; HASH_LEN];
            h[..name_bytes.len()].copy_from_slice(name_bytes);
            h
        } else {
            hash::hash(name_bytes)
        };

        let mut state = Self {
            cipher: CipherState::empty(),
            ck: Zeroizing::new(h),
            h,
        };
        state.mix_hash(prologue);
        state
    }

    /// `(ck, temp_k) = HKDF(ck, input_key_material)`, then install `temp_k`.
    pub fn mix_key(&mut self, input_key_material: &[u8]) {
        let (new_ck, temp_k) = hash::hkdf2(&self.ck, input_key_material);
        *self.ck = *new_ck;

        let mut key = [0u8; AEAD_KEY_LEN];
        key.copy_from_slice(&*temp_k);
        self.cipher.initialize_key(key);
        key.zeroize();
    }

    /// `h = SHA256(h || data)`
    pub fn mix_hash(&mut self, data: &[u8]) {
        self.h = hash::hash_two(&self.h, data);
    }

    /// Encrypt with `h` as associated data, then mix the ciphertext into `h`.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        let ciphertext = self.cipher.encrypt_with_ad(&self.h, plaintext)?;
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    /// Decrypt with `h` as associated data, then mix the ciphertext into `h`.
    ///
    /// `h` is only updated when the tag verifies.
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        let plaintext = self.cipher.decrypt_with_ad(&self.h, ciphertext)?;
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }

    /// `(k1, k2) = HKDF(ck, "")`, consuming the transcript.
    pub fn split(self) -> SplitKeys {
        let (k1, k2) = hash::hkdf2(&self.ck, &[]);
        SplitKeys {
            h: self.h,
            ck: Zeroizing::new(*self.ck),
            k1,
            k2,
        }
    }

    /// Get the current handshake hash.
    pub fn handshake_hash(&self) -> &[u8; HASH_LEN] {
        &self.h
    }

    /// Get the current chaining key.
    #[cfg(test)]
    pub fn chaining_key(&self) -> &[u8; HASH_LEN] {
        &self.ck
    }
}
