use rand_core::CryptoRngCore;
use secp256k1::{PublicKey, SecretKey};

use crate::crypto::ecdh;
use crate::error::Error;

/// A secp256k1 secret key.
///
/// Erased from memory when dropped.
#[derive(Clone)]
pub struct StaticSecret(SecretKey);

impl Drop for StaticSecret {
    fn drop(&mut self) {
        self.0.non_secure_erase();
    }
}

impl core::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("StaticSecret([REDACTED])")
    }
}

impl StaticSecret {
    /// Create from raw 32-byte secret key material.
    ///
    /// Fails if the scalar is zero or not below the curve order.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, Error> {
        SecretKey::from_slice(&bytes)
            .map(Self)
            .map_err(|_| Error::InvalidSecretKey)
    }

    /// Export the raw 32-byte secret key material.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    pub(crate) fn inner(&self) -> &SecretKey {
        &self.0
    }
}

impl From<SecretKey> for StaticSecret {
    fn from(secret: SecretKey) -> Self {
        Self(secret)
    }
}

/// A secret key together with its compressed public point.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret: StaticSecret,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generate a new random keypair using the provided RNG.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        Self::from_secret(StaticSecret(ecdh::generate_secret(rng)))
    }

    /// Create a keypair from an existing secret.
    pub fn from_secret(secret: StaticSecret) -> Self {
        let public = ecdh::public_key(secret.inner());
        Self { secret, public }
    }

    /// Create a keypair from raw 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, Error> {
        StaticSecret::from_bytes(bytes).map(Self::from_secret)
    }

    /// The 33-byte compressed encoding of the public key.
    pub fn public_bytes(&self) -> [u8; ecdh::PUBKEY_LEN] {
        self.public.serialize()
    }
}
