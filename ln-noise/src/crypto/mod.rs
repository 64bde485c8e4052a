//! Cryptographic primitives for the BOLT 8 handshake.
//!
//! - [`aead`]: ChaCha20-Poly1305 AEAD encryption
//! - [`ecdh`]: secp256k1 Diffie-Hellman and key parsing
//! - [`hash`]: SHA-256 hashing and HKDF

pub mod aead;
pub mod ecdh;
pub mod hash;
