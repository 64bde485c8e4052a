use rand_core::CryptoRngCore;
use secp256k1::PublicKey;

use super::state::Step;
use super::{
    ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE, HandshakeAction, HandshakeCore, HandshakeState,
    LocalKey, Role, check_header,
};
use crate::crypto::aead::AEAD_TAG_LEN;
use crate::crypto::ecdh::{self, PUBKEY_LEN};
use crate::crypto::hash::HASH_LEN;
use crate::error::{Act, Error};
use crate::keys::KeyPair;
use crate::transport::TransportCipher;

/// The accepting side of a handshake.
///
/// Learns and authenticates the initiator's static key from act 3.
pub struct ResponderHandshake {
    core: HandshakeCore,
}

impl ResponderHandshake {
    /// Create a responder with a caller-supplied ephemeral key.
    pub fn new(local: &KeyPair, ephemeral: KeyPair) -> Self {
        Self {
            core: HandshakeCore::new(Role::Responder, local.clone(), ephemeral, None),
        }
    }

    /// Create a responder whose ephemeral key is drawn from `rng`.
    pub fn with_rng(local: &KeyPair, rng: &mut impl CryptoRngCore) -> Self {
        Self::new(local, KeyPair::generate(rng))
    }

    /// Validate the initiator's act 1: `e, es`.
    pub fn receive_act_one(&mut self, input: &[u8]) -> Result<(), Error> {
        self.core.step(Step::ReadActOne, |core| {
            core.read_ephemeral_act(Act::One, input, LocalKey::Static)
                .map(|_| ())
        })
    }

    /// Produce act 2: `e, ee`.
    pub fn act_two(&mut self) -> Result<[u8; ACT_TWO_SIZE], Error> {
        self.core.step(Step::WriteActTwo, |core| {
            let re = core.re.ok_or(Error::InvalidState)?;
            core.write_ephemeral_act(&re)
        })
    }

    /// Validate the initiator's act 3: `s, se`.
    ///
    /// Returns the transport cipher and the initiator's authenticated static
    /// key.
    pub fn receive_act_three(
        &mut self,
        input: &[u8],
    ) -> Result<(TransportCipher, PublicKey), Error> {
        self.core.step(Step::ReadActThree, |core| {
            check_header(Act::Three, input, ACT_THREE_SIZE)?;
            let (encrypted_s, tag) = input[1..].split_at(PUBKEY_LEN + AEAD_TAG_LEN);

            let rs_bytes = core.ss()?.decrypt_and_hash(encrypted_s)?;
            let rs = ecdh::parse_public_key(&rs_bytes)?;
            core.mix_dh(LocalKey::Ephemeral, &rs)?;
            core.ss()?.decrypt_and_hash(tag)?;

            core.rs = Some(rs);
            let cipher = core.finish()?;
            Ok((cipher, rs))
        })
    }

    /// Current position in the handshake.
    pub fn state(&self) -> HandshakeState {
        self.core.state
    }

    /// What the caller should do next.
    pub fn next_action(&self) -> HandshakeAction {
        match self.core.state {
            HandshakeState::Initialized => HandshakeAction::ReadAct(ACT_ONE_SIZE),
            HandshakeState::Act1Received => HandshakeAction::WriteAct,
            HandshakeState::Act2Sent => HandshakeAction::ReadAct(ACT_THREE_SIZE),
            HandshakeState::Complete => HandshakeAction::Complete,
            HandshakeState::Failed
            | HandshakeState::Act1Sent
            | HandshakeState::Act2Received => HandshakeAction::Failed,
        }
    }

    /// The running transcript hash `h`.
    pub fn handshake_hash(&self) -> Result<&[u8; HASH_LEN], Error> {
        self.core.handshake_hash()
    }

    /// The initiator's static key, known once act 3 has been validated.
    pub fn remote_static(&self) -> Option<&PublicKey> {
        self.core.rs.as_ref()
    }
}

impl core::fmt::Debug for ResponderHandshake {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResponderHandshake")
            .field("state", &self.core.state)
            .finish_non_exhaustive()
    }
}
