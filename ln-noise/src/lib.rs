#![deny(unsafe_code)]

//! # ln-noise
//!
//! A sans-IO implementation of the BOLT 8 transport: the three-act
//! `Noise_XK_secp256k1_ChaChaPoly_SHA256` handshake followed by a
//! length-framed, key-rotating ChaCha20-Poly1305 cipher.
//!
//! ## Driving a connection
//!
//! ```rust
//! use ln_noise::{InitiatorHandshake, KeyPair, ResponderHandshake};
//! use rand_core::OsRng;
//!
//! let node_a = KeyPair::generate(&mut OsRng);
//! let node_b = KeyPair::generate(&mut OsRng);
//!
//! let mut initiator = InitiatorHandshake::with_rng(&node_a, node_b.public, &mut OsRng);
//! let mut responder = ResponderHandshake::with_rng(&node_b, &mut OsRng);
//!
//! let act_one = initiator.act_one()?;
//! responder.receive_act_one(&act_one)?;
//! let act_two = responder.act_two()?;
//! initiator.act_two(&act_two)?;
//! let (act_three, mut a) = initiator.act_three()?;
//! let (mut b, remote) = responder.receive_act_three(&act_three)?;
//! assert_eq!(remote, node_a.public);
//!
//! let frame = a.encrypt(b"hello")?;
//! let (msg, _) = b.decrypt_frame(&frame)?.expect("whole frame");
//! assert_eq!(msg, b"hello");
//! # Ok::<(), ln_noise::Error>(())
//! ```
//!
//! ## Security Properties
//!
//! - Secret keys, chaining keys and DH outputs zeroized on drop
//! - Fixed-size act parsing; no panics on network input
//! - Any validation failure is terminal for the handshake
//! - Ephemeral keys come from an injected RNG, never ambient state

pub mod crypto;
pub mod error;
pub mod keys;

mod cipher_state;
mod frame;
mod handshake;
mod symmetric_state;
mod transport;

// Re-export the primary public API
pub use error::{Act, Error};
pub use frame::FrameDecoder;
pub use handshake::{
    ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE, HANDSHAKE_VERSION, HandshakeAction,
    HandshakeState, InitiatorHandshake, ResponderHandshake,
};
pub use keys::{KeyPair, StaticSecret};
pub use secp256k1::PublicKey;
pub use symmetric_state::{PROLOGUE, PROTOCOL_NAME};
pub use transport::{
    ENCRYPTED_LENGTH_SIZE, MAC_SIZE, MAX_MESSAGE_SIZE, ROTATION_INTERVAL, TransportCipher,
};
