//! Buffered frame reading over an arbitrary byte stream.
//!
//! Frames may arrive split across any number of reads. The decoder keeps
//! partial frames until they are complete, decrypts them in order and hands
//! out plaintext messages.

use std::collections::VecDeque;

use crate::error::Error;
use crate::transport::{ENCRYPTED_LENGTH_SIZE, MAC_SIZE, MAX_MESSAGE_SIZE, TransportCipher};

/// Accumulates incoming bytes and yields complete decrypted messages.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of frames not yet complete.
    buffer: Vec<u8>,
    /// Fully decrypted messages ready for the caller.
    messages_ready: VecDeque<Vec<u8>>,
}

impl FrameDecoder {
    /// Maximum number of undelivered messages. Decoding pauses once this many
    /// are waiting.
    pub const MESSAGE_READY_MAX: usize = 8;

    /// Maximum number of undecoded bytes held while decoding is paused: one
    /// largest possible frame.
    pub const BUFFER_MAX: usize = ENCRYPTED_LENGTH_SIZE + MAX_MESSAGE_SIZE + MAC_SIZE;

    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest bytes read from the stream, decrypting every frame they complete.
    ///
    /// Returns `true` if at least one message is now available. Once
    /// `MESSAGE_READY_MAX` messages are waiting, further frames stay buffered
    /// undecrypted until [`FrameDecoder::next_message`] makes room; ingesting
    /// an empty slice resumes decoding. Bytes that would push a paused buffer
    /// past `BUFFER_MAX` are refused with `Error::FrameBufferFull` and nothing
    /// changes. Cipher errors are returned unchanged and leave the connection
    /// unusable.
    pub fn ingest_bytes(
        &mut self,
        cipher: &mut TransportCipher,
        bytes: &[u8],
    ) -> Result<bool, Error> {
        if self.is_paused() && self.buffer.len() + bytes.len() > Self::BUFFER_MAX {
            return Err(Error::FrameBufferFull);
        }
        self.buffer.extend_from_slice(bytes);

        let mut consumed = 0;
        while !self.is_paused() {
            match cipher.decrypt_frame(&self.buffer[consumed..])? {
                Some((msg, used)) => {
                    self.messages_ready.push_back(msg);
                    consumed += used;
                }
                None => break,
            }
        }
        self.buffer.drain(..consumed);

        Ok(!self.messages_ready.is_empty())
    }

    fn is_paused(&self) -> bool {
        self.messages_ready.len() >= Self::MESSAGE_READY_MAX
    }

    /// Take the oldest decrypted message.
    pub fn next_message(&mut self) -> Option<Vec<u8>> {
        self.messages_ready.pop_front()
    }

    /// Number of bytes held for a frame that is not complete yet.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}
