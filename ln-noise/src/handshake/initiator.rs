use rand_core::CryptoRngCore;
use secp256k1::PublicKey;

use super::state::Step;
use super::{
    ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE, HANDSHAKE_VERSION, HandshakeAction,
    HandshakeCore, HandshakeState, LocalKey, Role,
};
use crate::crypto::aead::AEAD_TAG_LEN;
use crate::crypto::ecdh::PUBKEY_LEN;
use crate::crypto::hash::HASH_LEN;
use crate::error::{Act, Error};
use crate::keys::KeyPair;
use crate::transport::TransportCipher;

/// The connecting side of a handshake.
///
/// Knows the responder's static key up front and proves its own identity in
/// act 3.
pub struct InitiatorHandshake {
    core: HandshakeCore,
}

impl InitiatorHandshake {
    /// Create an initiator with a caller-supplied ephemeral key.
    ///
    /// The ephemeral key must be fresh for every handshake; fixed keys are
    /// only for reproducing test vectors.
    pub fn new(local: &KeyPair, remote_static: PublicKey, ephemeral: KeyPair) -> Self {
        Self {
            core: HandshakeCore::new(
                Role::Initiator,
                local.clone(),
                ephemeral,
                Some(remote_static),
            ),
        }
    }

    /// Create an initiator whose ephemeral key is drawn from `rng`.
    pub fn with_rng(
        local: &KeyPair,
        remote_static: PublicKey,
        rng: &mut impl CryptoRngCore,
    ) -> Self {
        Self::new(local, remote_static, KeyPair::generate(rng))
    }

    /// Produce act 1: `e, es`.
    pub fn act_one(&mut self) -> Result<[u8; ACT_ONE_SIZE], Error> {
        self.core.step(Step::WriteActOne, |core| {
            let rs = core.rs.ok_or(Error::InvalidState)?;
            core.write_ephemeral_act(&rs)
        })
    }

    /// Validate the responder's act 2: `e, ee`.
    pub fn act_two(&mut self, input: &[u8]) -> Result<(), Error> {
        self.core.step(Step::ReadActTwo, |core| {
            core.read_ephemeral_act(Act::Two, input, LocalKey::Ephemeral)
                .map(|_| ())
        })
    }

    /// Produce act 3: `s, se`, and the transport cipher.
    ///
    /// Layout: `[version(1)][encrypted s_pub(33+16)][tag(16)]`
    pub fn act_three(&mut self) -> Result<([u8; ACT_THREE_SIZE], TransportCipher), Error> {
        self.core.step(Step::WriteActThree, |core| {
            let re = core.re.ok_or(Error::InvalidState)?;

            let s_pub = core.s.public_bytes();
            let encrypted_s = core.ss()?.encrypt_and_hash(&s_pub)?;
            core.mix_dh(LocalKey::Static, &re)?;
            let tag = core.ss()?.encrypt_and_hash(&[])?;
            let cipher = core.finish()?;

            let mut out = [0u8; ACT_THREE_SIZE];
            out[0] = HANDSHAKE_VERSION;
            out[1..1 + PUBKEY_LEN + AEAD_TAG_LEN].copy_from_slice(&encrypted_s);
            out[1 + PUBKEY_LEN + AEAD_TAG_LEN..].copy_from_slice(&tag);
            Ok((out, cipher))
        })
    }

    /// Current position in the handshake.
    pub fn state(&self) -> HandshakeState {
        self.core.state
    }

    /// What the caller should do next.
    pub fn next_action(&self) -> HandshakeAction {
        match self.core.state {
            HandshakeState::Initialized | HandshakeState::Act2Received => {
                HandshakeAction::WriteAct
            }
            HandshakeState::Act1Sent => HandshakeAction::ReadAct(ACT_TWO_SIZE),
            HandshakeState::Complete => HandshakeAction::Complete,
            HandshakeState::Failed
            | HandshakeState::Act1Received
            | HandshakeState::Act2Sent => HandshakeAction::Failed,
        }
    }

    /// The running transcript hash `h`.
    ///
    /// Returns `Err(Error::InvalidState)` once the handshake has completed or
    /// failed; use [`TransportCipher::handshake_hash`] afterwards.
    pub fn handshake_hash(&self) -> Result<&[u8; HASH_LEN], Error> {
        self.core.handshake_hash()
    }

    /// The responder's static key this handshake authenticates against.
    pub fn remote_static(&self) -> Option<&PublicKey> {
        self.core.rs.as_ref()
    }
}

impl core::fmt::Debug for InitiatorHandshake {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InitiatorHandshake")
            .field("state", &self.core.state)
            .finish_non_exhaustive()
    }
}
