use chacha20poly1305::{
    ChaCha20Poly1305, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};

use crate::error::Error;

/// AEAD key length in bytes.
pub const AEAD_KEY_LEN: usize = 32;
/// AEAD tag length in bytes.
pub const AEAD_TAG_LEN: usize = 16;
/// AEAD nonce length in bytes.
pub const AEAD_NONCE_LEN: usize = 12;

/// Encrypt `plaintext`, returning the ciphertext with the 16-byte tag appended.
pub fn encrypt(
    key: &[u8; AEAD_KEY_LEN],
    nonce: u64,
    ad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::with_capacity(plaintext.len() + AEAD_TAG_LEN);
    buffer.extend_from_slice(plaintext);

    let cipher = ChaCha20Poly1305::new(key.into());
    let tag = cipher
        .encrypt_in_place_detached(&Nonce::from(make_nonce(nonce)), ad, &mut buffer)
        .map_err(|_| Error::MessageTooLarge(plaintext.len()))?;

    buffer.extend_from_slice(&tag);
    Ok(buffer)
}

/// Decrypt `ciphertext` (body followed by the 16-byte tag), verifying the tag.
pub fn decrypt(
    key: &[u8; AEAD_KEY_LEN],
    nonce: u64,
    ad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, Error> {
    if ciphertext.len() < AEAD_TAG_LEN {
        return Err(Error::AuthenticationFailed);
    }
    let plaintext_len = ciphertext.len() - AEAD_TAG_LEN;
    let (body, tag) = ciphertext.split_at(plaintext_len);

    let mut buffer = body.to_vec();
    let cipher = ChaCha20Poly1305::new(key.into());
    cipher
        .decrypt_in_place_detached(
            &Nonce::from(make_nonce(nonce)),
            ad,
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| Error::AuthenticationFailed)?;

    Ok(buffer)
}

/// Build the 12-byte nonce from a u64 counter.
///
/// 4 bytes of zeros followed by the 64-bit little-endian counter.
fn make_nonce(n: u64) -> [u8; AEAD_NONCE_LEN] {
    let mut nonce = [0u8; AEAD_NONCE_LEN];
    nonce[4..].copy_from_slice(&n.to_le_bytes());
    nonce
}
