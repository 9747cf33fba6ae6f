//! Per-direction transport state: the negotiated cipher/MAC pair and
//! the keys and chaining state they operate with.

use rand::RngCore;
use secrecy::ExposeSecret;

use crate::algorithm::{Cipher, CipherState, Hmac};
use crate::error::Result;

use super::keys::Keys;

/// The minimum total packet size RFC 4253 §6.1 allows implementations
/// to assume peers can handle (used only as a padding-floor safeguard).
const MIN_PACKET_SIZE: usize = 16;
const MIN_PAD_SIZE: usize = 4;
const MIN_ALIGN: usize = 8;

/// Both directions' transport state, installed atomically at `NEWKEYS`.
#[derive(Default)]
pub struct TransportPair {
    /// Outbound (client-to-server) transport.
    pub tx: Transport,
    /// Inbound (server-to-client) transport.
    pub rx: Transport,
}

/// One direction's negotiated cipher, MAC, keys and chaining state.
#[derive(Default)]
pub struct Transport {
    pub cipher: Cipher,
    pub hmac: Hmac,

    pub state: Option<CipherState>,
    pub keys: Keys,
}

impl Transport {
    /// The alignment packets in this direction must respect.
    pub fn block_size(&self) -> usize {
        self.cipher.block_size().max(MIN_ALIGN)
    }

    /// Decrypt `buf` in place using the installed cipher.
    pub fn decrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        self.cipher.decrypt(
            &mut self.state,
            self.keys.key.expose_secret(),
            self.keys.iv.expose_secret(),
            buf,
        )
    }

    /// Encrypt `buf` in place using the installed cipher.
    pub fn encrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        self.cipher.encrypt(
            &mut self.state,
            self.keys.key.expose_secret(),
            self.keys.iv.expose_secret(),
            buf,
        )
    }

    /// Compute the amount of padding (§4.2 step 1) for a payload of
    /// `payload_len` bytes: `align - ((payload_len + 5) % align)`,
    /// bumped by a full alignment when that would be below the 4-byte
    /// minimum, and again if the resulting packet would be smaller
    /// than this direction's minimum handleable size.
    pub fn padding_len(&self, payload_len: usize) -> u8 {
        let align = self.block_size();
        let size = 4 + 1 + payload_len; // length field + pad-len field + payload

        let mut padding = align - (size % align);
        if padding < MIN_PAD_SIZE {
            padding += align;
        }

        if size + padding < MIN_PACKET_SIZE.max(align) {
            padding += align;
        }

        padding as u8
    }

    /// Append `padding_len` octets of padding to `buf`: random bytes
    /// when a cipher is installed (required by RFC 4253 §6), a fixed
    /// filler otherwise.
    pub fn append_padding(&self, buf: &mut Vec<u8>, padding_len: u8) {
        let start = buf.len();
        buf.resize(start + padding_len as usize, 0xFF);

        if self.cipher != Cipher::None {
            rand::thread_rng().fill_bytes(&mut buf[start..]);
        }
    }

    /// `MAC(key, seq || plaintext_packet)`.
    pub fn seal(&self, seq: u32, plaintext_packet: &[u8]) -> Vec<u8> {
        self.hmac
            .sign(seq, plaintext_packet, self.keys.hmac.expose_secret())
    }

    /// Verify `mac` against `MAC(key, seq || plaintext_packet)`.
    pub fn open(&self, seq: u32, plaintext_packet: &[u8], mac: &[u8]) -> Result<()> {
        self.hmac
            .verify(seq, plaintext_packet, self.keys.hmac.expose_secret(), mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_respects_minimum_of_four() {
        let t = Transport::default(); // cipher=None, block_size=8

        // payload_len=3: size = 4+1+3 = 8, 8 % 8 = 0, so padding = 8 (bumped from 0).
        assert_eq!(t.padding_len(3), 8);
    }

    #[test]
    fn padding_is_always_in_valid_range() {
        let t = Transport::default();

        for payload_len in 0..64 {
            let pad = t.padding_len(payload_len);
            assert!((4..=255).contains(&pad));

            let total = 4 + 1 + payload_len + pad as usize;
            assert_eq!(total % t.block_size(), 0);
        }
    }
}
