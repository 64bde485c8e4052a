//! The three-act `Noise_XK` handshake from BOLT 8.
//!
//! ```text
//! XK:
//!   <- s
//!   ...
//!   -> e, es
//!   <- e, ee
//!   -> s, se
//! ```
//!
//! [`InitiatorHandshake`] and [`ResponderHandshake`] each expose only the
//! operations of their role. Both share [`HandshakeCore`], which owns the
//! transcript and enforces the transition table in [`state`].

mod initiator;
mod responder;
mod state;

pub use initiator::InitiatorHandshake;
pub use responder::ResponderHandshake;
pub use state::HandshakeState;

use secp256k1::{PublicKey, SecretKey};

use crate::crypto::aead::AEAD_TAG_LEN;
use crate::crypto::ecdh::{self, PUBKEY_LEN};
use crate::crypto::hash::HASH_LEN;
use crate::error::{Act, Error};
use crate::keys::KeyPair;
use crate::symmetric_state::{PROLOGUE, PROTOCOL_NAME, SymmetricState};
use crate::transport::TransportCipher;
use state::Step;

/// The only handshake version in use.
pub const HANDSHAKE_VERSION: u8 = 0;
/// `version(1) || ephemeral_pubkey(33) || tag(16)`
pub const ACT_ONE_SIZE: usize = 1 + PUBKEY_LEN + AEAD_TAG_LEN;
/// Same layout as act one.
pub const ACT_TWO_SIZE: usize = ACT_ONE_SIZE;
/// `version(1) || encrypted_static_pubkey(33+16) || tag(16)`
pub const ACT_THREE_SIZE: usize = 1 + PUBKEY_LEN + AEAD_TAG_LEN + AEAD_TAG_LEN;

/// The current action the caller must take to advance the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Produce the next act and send it.
    WriteAct,
    /// Read exactly this many bytes from the peer and pass them in.
    ReadAct(usize),
    /// Transport keys have been handed out.
    Complete,
    /// The handshake failed. Close the connection.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Initiator,
    Responder,
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// Which of our own keys takes part in a DH.
#[derive(Debug, Clone, Copy)]
enum LocalKey {
    Static,
    Ephemeral,
}

/// Role-independent handshake state.
struct HandshakeCore {
    role: Role,
    /// `None` once the handshake has completed or failed.
    symmetric: Option<SymmetricState>,
    state: HandshakeState,
    s: KeyPair,
    /// Dropped together with `symmetric`.
    e: Option<KeyPair>,
    rs: Option<PublicKey>,
    re: Option<PublicKey>,
}

impl HandshakeCore {
    /// Both roles hash the responder's static key as the pre-message.
    fn new(role: Role, s: KeyPair, e: KeyPair, rs: Option<PublicKey>) -> Self {
        let mut symmetric = SymmetricState::initialize(PROTOCOL_NAME, PROLOGUE);
        let responder_static = match role {
            Role::Initiator => rs.map(|pk| pk.serialize()),
            Role::Responder => Some(s.public_bytes()),
        };
        if let Some(pre_message) = responder_static {
            symmetric.mix_hash(&pre_message);
        }

        Self {
            role,
            symmetric: Some(symmetric),
            state: HandshakeState::Initialized,
            s,
            e: Some(e),
            rs,
            re: None,
        }
    }

    /// Run `f` as `step`.
    ///
    /// Illegal steps return `Error::InvalidState` without touching anything.
    /// Any error from `f` is terminal.
    fn step<T>(
        &mut self,
        step: Step,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let Some(next) = self.state.after(step) else {
            log::debug!("{}: {step:?} not allowed in {:?}", self.role, self.state);
            return Err(Error::InvalidState);
        };

        match f(self) {
            Ok(value) => {
                log::debug!("{}: {:?} -> {next:?}", self.role, self.state);
                self.state = next;
                Ok(value)
            }
            Err(err) => {
                log::debug!("{}: handshake failed during {step:?}: {err}", self.role);
                self.fail();
                Err(err)
            }
        }
    }

    fn fail(&mut self) {
        self.state = HandshakeState::Failed;
        self.symmetric = None;
        self.e = None;
    }

    fn ss(&mut self) -> Result<&mut SymmetricState, Error> {
        self.symmetric.as_mut().ok_or(Error::InvalidState)
    }

    fn local_secret(&self, which: LocalKey) -> Result<&SecretKey, Error> {
        match which {
            LocalKey::Static => Ok(self.s.secret.inner()),
            LocalKey::Ephemeral => self
                .e
                .as_ref()
                .map(|e| e.secret.inner())
                .ok_or(Error::InvalidState),
        }
    }

    fn mix_dh(&mut self, local: LocalKey, remote: &PublicKey) -> Result<(), Error> {
        let shared = ecdh::dh(self.local_secret(local)?, remote);
        self.ss()?.mix_key(shared.as_bytes());
        Ok(())
    }

    fn handshake_hash(&self) -> Result<&[u8; HASH_LEN], Error> {
        self.symmetric
            .as_ref()
            .map(|s| s.handshake_hash())
            .ok_or(Error::InvalidState)
    }

    // ===== Acts 1 and 2: write e, then DH(e, remote) =====
    //
    // Layout: [version(1)][e_pub(33)][tag(16)]

    fn write_ephemeral_act(&mut self, remote: &PublicKey) -> Result<[u8; ACT_ONE_SIZE], Error> {
        let e_pub = self.e.as_ref().ok_or(Error::InvalidState)?.public_bytes();
        self.ss()?.mix_hash(&e_pub);
        self.mix_dh(LocalKey::Ephemeral, remote)?;
        let tag = self.ss()?.encrypt_and_hash(&[])?;

        let mut out = [0u8; ACT_ONE_SIZE];
        out[0] = HANDSHAKE_VERSION;
        out[1..1 + PUBKEY_LEN].copy_from_slice(&e_pub);
        out[1 + PUBKEY_LEN..].copy_from_slice(&tag);
        Ok(out)
    }

    // ===== Acts 1 and 2: read re, then DH(local, re) =====

    fn read_ephemeral_act(
        &mut self,
        act: Act,
        input: &[u8],
        local: LocalKey,
    ) -> Result<PublicKey, Error> {
        check_header(act, input, ACT_ONE_SIZE)?;

        let re_bytes = &input[1..1 + PUBKEY_LEN];
        let re = ecdh::parse_public_key(re_bytes)?;
        self.ss()?.mix_hash(re_bytes);
        self.mix_dh(local, &re)?;
        self.ss()?.decrypt_and_hash(&input[1 + PUBKEY_LEN..])?;

        self.re = Some(re);
        Ok(re)
    }

    /// Split the transcript into transport keys and drop the ephemeral key.
    fn finish(&mut self) -> Result<TransportCipher, Error> {
        let symmetric = self.symmetric.take().ok_or(Error::InvalidState)?;
        self.e = None;
        let keys = symmetric.split();
        Ok(TransportCipher::from_split(
            keys,
            self.role == Role::Initiator,
        ))
    }
}

/// Validate size and version byte of an incoming act.
fn check_header(act: Act, input: &[u8], expected: usize) -> Result<(), Error> {
    if input.len() != expected {
        return Err(Error::ActReadFailed {
            act,
            expected,
            actual: input.len(),
        });
    }
    if input[0] != HANDSHAKE_VERSION {
        return Err(Error::BadVersion {
            act,
            version: input[0],
        });
    }
    Ok(())
}
