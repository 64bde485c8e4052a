use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::aead::{self, AEAD_KEY_LEN, AEAD_TAG_LEN};
use crate::crypto::hash::{self, HASH_LEN};
use crate::error::Error;
use crate::symmetric_state::SplitKeys;

/// Size of the MAC appended to every ciphertext.
pub const MAC_SIZE: usize = AEAD_TAG_LEN;
/// Size of the encrypted 2-byte length prefix of a frame.
pub const ENCRYPTED_LENGTH_SIZE: usize = 2 + MAC_SIZE;
/// Largest plaintext that fits the 2-byte length prefix.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;
/// Number of nonces a key is used for before it is rotated.
pub const ROTATION_INTERVAL: u64 = 1000;

// A frame spends two nonces, so frame boundaries always fall on even nonces
// and never straddle a rotation.
const _: () = assert!(ROTATION_INTERVAL % 2 == 0);

/// One direction's key, nonce and rotation chaining key.
///
/// The three only change together: every nonce increment that reaches
/// `ROTATION_INTERVAL` replaces the key and chaining key and resets the nonce.
#[derive(Zeroize, ZeroizeOnDrop)]
struct KeyEpoch {
    key: [u8; AEAD_KEY_LEN],
    ck: [u8; HASH_LEN],
    #[zeroize(skip)]
    nonce: u64,
    #[zeroize(skip)]
    epoch: u64,
}

impl KeyEpoch {
    fn new(key: &[u8; AEAD_KEY_LEN], ck: &[u8; HASH_LEN]) -> Self {
        Self {
            key: *key,
            ck: *ck,
            nonce: 0,
            epoch: 0,
        }
    }

    fn seal(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        let ciphertext = aead::encrypt(&self.key, self.nonce, &[], plaintext)?;
        self.advance();
        Ok(ciphertext)
    }

    /// Decrypt at `nonce + offset` without consuming anything.
    fn open_at(&self, offset: u64, ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        aead::decrypt(&self.key, self.nonce + offset, &[], ciphertext)
    }

    fn advance(&mut self) {
        self.nonce += 1;
        if self.nonce == ROTATION_INTERVAL {
            self.rotate();
        }
    }

    /// `(ck, k) = HKDF(ck, k)`
    fn rotate(&mut self) {
        let (ck, key) = hash::hkdf2(&self.ck, &self.key);
        self.ck.copy_from_slice(&*ck);
        self.key.copy_from_slice(&*key);
        self.nonce = 0;
        self.epoch += 1;
    }
}

/// Post-handshake transport encryption state.
///
/// Every message travels as one frame:
///
/// ```text
/// [encrypted be16 length (2+16)][encrypted body (N+16)]
/// ```
///
/// Sending and receiving keys rotate independently, each after
/// `ROTATION_INTERVAL` nonces (500 frames).
pub struct TransportCipher {
    sending: KeyEpoch,
    receiving: KeyEpoch,
    /// Length decrypted by `decrypt_length`, awaiting its body.
    pending_length: Option<u16>,
    handshake_hash: Option<[u8; HASH_LEN]>,
}

impl Drop for TransportCipher {
    fn drop(&mut self) {
        self.handshake_hash.zeroize();
    }
}

impl core::fmt::Debug for TransportCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransportCipher")
            .field("send_nonce", &self.sending.nonce)
            .field("send_epoch", &self.sending.epoch)
            .field("recv_nonce", &self.receiving.nonce)
            .field("recv_epoch", &self.receiving.epoch)
            .finish_non_exhaustive()
    }
}

impl TransportCipher {
    /// Build a cipher from raw sending/receiving keys and the handshake's
    /// final chaining key.
    pub fn new(
        mut sending_key: [u8; AEAD_KEY_LEN],
        mut receiving_key: [u8; AEAD_KEY_LEN],
        mut chaining_key: [u8; HASH_LEN],
    ) -> Self {
        let cipher = Self::from_keys(&sending_key, &receiving_key, &chaining_key);
        sending_key.zeroize();
        receiving_key.zeroize();
        chaining_key.zeroize();
        cipher
    }

    /// The initiator sends with the first split key, the responder with the
    /// second.
    pub(crate) fn from_split(keys: SplitKeys, is_initiator: bool) -> Self {
        let (sending_key, receiving_key) = if is_initiator {
            (&keys.k1, &keys.k2)
        } else {
            (&keys.k2, &keys.k1)
        };
        let mut cipher = Self::from_keys(sending_key, receiving_key, &keys.ck);
        cipher.handshake_hash = Some(keys.h);
        cipher
    }

    fn from_keys(
        sending_key: &[u8; AEAD_KEY_LEN],
        receiving_key: &[u8; AEAD_KEY_LEN],
        chaining_key: &[u8; HASH_LEN],
    ) -> Self {
        Self {
            sending: KeyEpoch::new(sending_key, chaining_key),
            receiving: KeyEpoch::new(receiving_key, chaining_key),
            pending_length: None,
            handshake_hash: None,
        }
    }

    /// Encrypt `msg` into a complete frame.
    ///
    /// Returns `Error::MessageTooLarge` if `msg` exceeds `MAX_MESSAGE_SIZE`.
    pub fn encrypt(&mut self, msg: &[u8]) -> Result<Vec<u8>, Error> {
        let len = u16::try_from(msg.len()).map_err(|_| Error::MessageTooLarge(msg.len()))?;

        let mut frame = self.sending.seal(&len.to_be_bytes())?;
        frame.extend_from_slice(&self.sending.seal(msg)?);

        if self.sending.nonce == 0 {
            log::trace!("sending key rotated to epoch {}", self.sending.epoch);
        }
        Ok(frame)
    }

    /// Decrypt the length prefix of the next frame.
    ///
    /// The receive nonce is not committed until the matching
    /// `decrypt_message` succeeds, so calling this again before the body
    /// decrypts the same prefix again.
    pub fn decrypt_length(
        &mut self,
        encrypted: &[u8; ENCRYPTED_LENGTH_SIZE],
    ) -> Result<u16, Error> {
        self.pending_length = None;
        let len = self.peek_length(encrypted)?;
        self.pending_length = Some(len);
        Ok(len)
    }

    /// Decrypt the body of the frame whose length was just decrypted.
    ///
    /// `encrypted` must be exactly the announced length plus `MAC_SIZE`.
    pub fn decrypt_message(&mut self, encrypted: &[u8]) -> Result<Vec<u8>, Error> {
        let len = self.pending_length.ok_or(Error::InvalidState)?;
        let expected = usize::from(len) + MAC_SIZE;
        if encrypted.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: encrypted.len(),
            });
        }

        let msg = self.receiving.open_at(1, encrypted)?;
        self.pending_length = None;
        self.commit_frame();
        Ok(msg)
    }

    /// Decrypt one whole frame from the front of `input`.
    ///
    /// Returns `Ok(None)` without changing any state when `input` does not
    /// hold a complete frame yet. Otherwise returns the plaintext and the
    /// number of bytes the frame occupied.
    pub fn decrypt_frame(&mut self, input: &[u8]) -> Result<Option<(Vec<u8>, usize)>, Error> {
        if self.pending_length.is_some() {
            return Err(Error::InvalidState);
        }
        let Some(encrypted_len) = input.first_chunk::<ENCRYPTED_LENGTH_SIZE>() else {
            return Ok(None);
        };
        let len = self.peek_length(encrypted_len)?;

        let total = ENCRYPTED_LENGTH_SIZE + usize::from(len) + MAC_SIZE;
        if input.len() < total {
            return Ok(None);
        }

        let msg = self
            .receiving
            .open_at(1, &input[ENCRYPTED_LENGTH_SIZE..total])?;
        self.commit_frame();
        Ok(Some((msg, total)))
    }

    fn peek_length(&self, encrypted: &[u8; ENCRYPTED_LENGTH_SIZE]) -> Result<u16, Error> {
        let plaintext = self.receiving.open_at(0, encrypted)?;
        let bytes: [u8; 2] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| Error::AuthenticationFailed)?;
        Ok(u16::from_be_bytes(bytes))
    }

    fn commit_frame(&mut self) {
        self.receiving.advance();
        self.receiving.advance();
        if self.receiving.nonce == 0 {
            log::trace!("receiving key rotated to epoch {}", self.receiving.epoch);
        }
    }

    /// The current sending key.
    pub fn sending_key(&self) -> &[u8; AEAD_KEY_LEN] {
        &self.sending.key
    }

    /// The current receiving key.
    pub fn receiving_key(&self) -> &[u8; AEAD_KEY_LEN] {
        &self.receiving.key
    }

    /// The final handshake hash, a channel binding value.
    ///
    /// Both sides hold the same value. `None` for ciphers built with
    /// [`TransportCipher::new`].
    pub fn handshake_hash(&self) -> Option<&[u8; HASH_LEN]> {
        self.handshake_hash.as_ref()
    }

    /// The AEAD overhead of one frame.
    pub fn overhead(&self) -> usize {
        ENCRYPTED_LENGTH_SIZE + MAC_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (TransportCipher, TransportCipher) {
        let ck = [0x07; HASH_LEN];
        let a = TransportCipher::new([0x01; 32], [0x02; 32], ck);
        let b = TransportCipher::new([0x02; 32], [0x01; 32], ck);
        (a, b)
    }

    fn receive(cipher: &mut TransportCipher, frame: &[u8]) -> Result<Vec<u8>, Error> {
        let prefix: &[u8; ENCRYPTED_LENGTH_SIZE] =
            frame[..ENCRYPTED_LENGTH_SIZE].try_into().unwrap();
        cipher.decrypt_length(prefix)?;
        cipher.decrypt_message(&frame[ENCRYPTED_LENGTH_SIZE..])
    }

    #[test]
    fn frame_layout() {
        let (mut a, _) = pair();
        let frame = a.encrypt(b"hello").unwrap();
        assert_eq!(frame.len(), ENCRYPTED_LENGTH_SIZE + 5 + MAC_SIZE);
        assert_eq!(frame.len(), 5 + a.overhead());
        assert_eq!(a.sending.nonce, 2);
    }

    #[test]
    fn length_is_big_endian() {
        let (mut a, b) = pair();
        let frame = a.encrypt(&[0u8; 0x0102]).unwrap();
        let plaintext = b.receiving.open_at(0, &frame[..ENCRYPTED_LENGTH_SIZE]).unwrap();
        assert_eq!(plaintext, [0x01u8, 0x02]);
    }

    #[test]
    fn round_trip_both_directions() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(b"ping").unwrap();
        assert_eq!(receive(&mut b, &frame).unwrap(), b"ping");
        let frame = b.encrypt(b"pong").unwrap();
        assert_eq!(receive(&mut a, &frame).unwrap(), b"pong");
    }

    #[test]
    fn empty_message() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(&[]).unwrap();
        assert_eq!(frame.len(), ENCRYPTED_LENGTH_SIZE + MAC_SIZE);
        assert!(receive(&mut b, &frame).unwrap().is_empty());
    }

    #[test]
    fn max_message_size() {
        let (mut a, mut b) = pair();
        let msg = vec![0xab; MAX_MESSAGE_SIZE];
        let frame = a.encrypt(&msg).unwrap();
        assert_eq!(receive(&mut b, &frame).unwrap(), msg);

        assert_eq!(
            a.encrypt(&vec![0u8; MAX_MESSAGE_SIZE + 1]),
            Err(Error::MessageTooLarge(MAX_MESSAGE_SIZE + 1))
        );
    }

    #[test]
    fn message_without_length_is_invalid_state() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(b"hi").unwrap();
        assert_eq!(
            b.decrypt_message(&frame[ENCRYPTED_LENGTH_SIZE..]),
            Err(Error::InvalidState)
        );
    }

    #[test]
    fn body_length_mismatch() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(b"hello").unwrap();
        let prefix = frame[..ENCRYPTED_LENGTH_SIZE].try_into().unwrap();
        assert_eq!(b.decrypt_length(prefix), Ok(5));
        assert_eq!(
            b.decrypt_message(&frame[ENCRYPTED_LENGTH_SIZE..frame.len() - 1]),
            Err(Error::LengthMismatch {
                expected: 5 + MAC_SIZE,
                actual: 5 + MAC_SIZE - 1,
            })
        );
    }

    #[test]
    fn repeated_length_decrypt_is_idempotent() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(b"hello").unwrap();
        let prefix = frame[..ENCRYPTED_LENGTH_SIZE].try_into().unwrap();
        assert_eq!(b.decrypt_length(prefix), Ok(5));
        assert_eq!(b.decrypt_length(prefix), Ok(5));
        assert_eq!(b.decrypt_message(&frame[ENCRYPTED_LENGTH_SIZE..]).unwrap(), b"hello");
    }

    #[test]
    fn tampered_length_fails() {
        let (mut a, mut b) = pair();
        let mut frame = a.encrypt(b"hello").unwrap();
        frame[0] ^= 0x80;
        assert_eq!(receive(&mut b, &frame), Err(Error::AuthenticationFailed));
    }

    #[test]
    fn tampered_body_fails() {
        let (mut a, mut b) = pair();
        let mut frame = a.encrypt(b"hello").unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        assert_eq!(receive(&mut b, &frame), Err(Error::AuthenticationFailed));
    }

    #[test]
    fn decrypt_frame_waits_for_whole_frame() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(b"hello").unwrap();

        assert_eq!(b.decrypt_frame(&frame[..10]), Ok(None));
        assert_eq!(b.decrypt_frame(&frame[..frame.len() - 1]), Ok(None));
        assert_eq!(b.receiving.nonce, 0);

        let (msg, used) = b.decrypt_frame(&frame).unwrap().unwrap();
        assert_eq!(msg, b"hello");
        assert_eq!(used, frame.len());
        assert_eq!(b.receiving.nonce, 2);
    }

    #[test]
    fn decrypt_frame_reports_bytes_used() {
        let (mut a, mut b) = pair();
        let mut stream = a.encrypt(b"one").unwrap();
        let first_len = stream.len();
        stream.extend_from_slice(&a.encrypt(b"two").unwrap());

        let (msg, used) = b.decrypt_frame(&stream).unwrap().unwrap();
        assert_eq!((msg.as_slice(), used), (&b"one"[..], first_len));
        let (msg, _) = b.decrypt_frame(&stream[used..]).unwrap().unwrap();
        assert_eq!(msg, b"two");
    }

    #[test]
    fn decrypt_frame_refuses_pending_length() {
        let (mut a, mut b) = pair();
        let frame = a.encrypt(b"hello").unwrap();
        b.decrypt_length(frame[..ENCRYPTED_LENGTH_SIZE].try_into().unwrap())
            .unwrap();
        assert_eq!(b.decrypt_frame(&frame), Err(Error::InvalidState));
    }

    #[test]
    fn rotation_after_interval() {
        let (mut a, mut b) = pair();
        let initial_key = *a.sending_key();

        for i in 0..ROTATION_INTERVAL / 2 {
            assert_eq!(a.sending.epoch, 0, "frame {i}");
            let frame = a.encrypt(b"x").unwrap();
            receive(&mut b, &frame).unwrap();
        }
        assert_eq!(a.sending.epoch, 1);
        assert_eq!(a.sending.nonce, 0);
        assert_ne!(*a.sending_key(), initial_key);
        assert_eq!(a.sending_key(), b.receiving_key());

        // The other direction has not moved.
        assert_eq!(a.receiving.epoch, 0);
        assert_eq!(b.sending.epoch, 0);
    }

    #[test]
    fn debug_hides_keys() {
        let (a, _) = pair();
        let debug = format!("{a:?}");
        assert!(debug.contains("send_nonce"));
        assert!(!debug.contains("key"));
    }

    #[test]
    fn from_split_assigns_keys_by_role() {
        use zeroize::Zeroizing;

        let split = || SplitKeys {
            h: [0x0a; HASH_LEN],
            ck: Zeroizing::new([0x0c; HASH_LEN]),
            k1: Zeroizing::new([0x01; AEAD_KEY_LEN]),
            k2: Zeroizing::new([0x02; AEAD_KEY_LEN]),
        };

        let initiator = TransportCipher::from_split(split(), true);
        assert_eq!(*initiator.sending_key(), [0x01; AEAD_KEY_LEN]);
        assert_eq!(*initiator.receiving_key(), [0x02; AEAD_KEY_LEN]);
        assert_eq!(initiator.sending.ck, [0x0c; HASH_LEN]);
        assert_eq!(initiator.receiving.ck, [0x0c; HASH_LEN]);

        let responder = TransportCipher::from_split(split(), false);
        assert_eq!(*responder.sending_key(), [0x02; AEAD_KEY_LEN]);
        assert_eq!(*responder.receiving_key(), [0x01; AEAD_KEY_LEN]);
        assert_eq!(responder.handshake_hash(), Some(&[0x0a; HASH_LEN]));
    }
}
