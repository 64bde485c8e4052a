use rand_core::CryptoRngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, ecdh};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::Error;

/// ECDH output length in bytes.
pub const DH_LEN: usize = 32;
/// Length of a compressed secp256k1 public key.
pub const PUBKEY_LEN: usize = 33;

/// A shared secret resulting from a Diffie-Hellman operation.
///
/// Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; DH_LEN]);

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl SharedSecret {
    /// Access the raw 32-byte shared secret.
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }
}

/// ECDH as BOLT 8 defines it: SHA-256 of the compressed point `k * P`.
pub fn dh(local: &SecretKey, remote: &PublicKey) -> SharedSecret {
    let shared = ecdh::SharedSecret::new(remote, local);
    SharedSecret(shared.secret_bytes())
}

/// Derive the public key of a secret.
pub fn public_key(secret: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(&Secp256k1::signing_only(), secret)
}

/// Parse a 33-byte compressed public key.
///
/// Uncompressed (`0x04`) encodings and points off the curve are rejected.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, Error> {
    if bytes.len() != PUBKEY_LEN {
        return Err(Error::InvalidPublicKey);
    }
    PublicKey::from_slice(bytes).map_err(|_| Error::InvalidPublicKey)
}

/// Draw a fresh secret key from `rng`.
///
/// Candidates outside `[1, n)` are redrawn.
pub fn generate_secret(rng: &mut impl CryptoRngCore) -> SecretKey {
    let mut bytes = Zeroizing::new([0u8; 32]);
    loop {
        rng.fill_bytes(bytes.as_mut_slice());
        if let Ok(secret) = SecretKey::from_slice(bytes.as_slice()) {
            return secret;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dh_is_symmetric() {
        let a = generate_secret(&mut rand_core::OsRng);
        let b = generate_secret(&mut rand_core::OsRng);

        let ab = dh(&a, &public_key(&b));
        let ba = dh(&b, &public_key(&a));
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn public_key_of_test_vector_secret() {
        let secret = SecretKey::from_slice(&[0x21; 32]).unwrap();
        assert_eq!(
            hex::encode(public_key(&secret).serialize()),
            "028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7"
        );
    }

    #[test]
    fn reject_uncompressed_prefix() {
        let mut bytes = public_key(&SecretKey::from_slice(&[0x21; 32]).unwrap()).serialize();
        bytes[0] = 0x04;
        assert_eq!(parse_public_key(&bytes), Err(Error::InvalidPublicKey));
    }

    #[test]
    fn reject_wrong_length() {
        let full = public_key(&SecretKey::from_slice(&[0x21; 32]).unwrap()).serialize();
        assert_eq!(parse_public_key(&full[..32]), Err(Error::InvalidPublicKey));

        let uncompressed =
            public_key(&SecretKey::from_slice(&[0x21; 32]).unwrap()).serialize_uncompressed();
        assert_eq!(
            parse_public_key(&uncompressed),
            Err(Error::InvalidPublicKey)
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let shared = SharedSecret([0xab; DH_LEN]);
        assert_eq!(format!("{shared:?}"), "SharedSecret([REDACTED])");
    }
}
