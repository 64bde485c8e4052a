use thiserror::Error;

/// One of the three fixed handshake messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Act {
    One,
    Two,
    Three,
}

impl core::fmt::Display for Act {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::One => f.write_str("act 1"),
            Self::Two => f.write_str("act 2"),
            Self::Three => f.write_str("act 3"),
        }
    }
}

/// Errors that can occur during the handshake or transport phase.
///
/// Everything except `InvalidState` and `MessageTooLarge` is caused by peer
/// input and is terminal for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An operation was called out of sequence, or after the handshake failed.
    #[error("operation not valid in current state")]
    InvalidState,
    /// A handshake message did not have the fixed size for its act.
    #[error("{act} read failed: expected {expected} bytes, got {actual}")]
    ActReadFailed {
        act: Act,
        expected: usize,
        actual: usize,
    },
    /// A handshake message carried an unknown version byte.
    #[error("{act} bad version {version}")]
    BadVersion { act: Act, version: u8 },
    /// Bytes that should hold a compressed secp256k1 point do not decode to one.
    #[error("the public key could not be parsed or is invalid")]
    InvalidPublicKey,
    /// A 32-byte secret is zero or not below the curve order.
    #[error("the secret key is out of range")]
    InvalidSecretKey,
    /// An AEAD tag did not verify.
    #[error("unable to authenticate")]
    AuthenticationFailed,
    /// A plaintext does not fit the 2-byte length prefix.
    #[error("message too large: {0} bytes (max 65535)")]
    MessageTooLarge(usize),
    /// A ciphertext body does not match the previously decrypted length.
    #[error("ciphertext body is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    /// The frame decoder is paused on undelivered messages and its byte buffer is full.
    #[error("frame buffer full: drain ready messages first")]
    FrameBufferFull,
}
