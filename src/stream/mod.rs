//! The Binary Packet Protocol (BPP) record layer: frames, pads,
//! encrypts and authenticates every message exchanged with the peer.

use futures::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use futures_time::{future::FutureExt as _, time::Duration};

use crate::error::{Error, Result};

mod keys;
pub use keys::Keys;

mod transport;
pub use transport::{Transport, TransportPair};

/// Maximum accepted `packet_length`, per the wire-format bound this
/// crate enforces (spec: reject anything above this).
pub const MAX_PACKET_LENGTH: u32 = 65535;

/// Trait alias for something pipe-alike: a duplex, buffered byte stream.
pub trait Pipe: AsyncBufRead + AsyncWrite + Unpin + Send + Sync + 'static {}
impl<T: AsyncBufRead + AsyncWrite + Unpin + Send + Sync + 'static> Pipe for T {}

/// A wrapper around a [`Pipe`] implementing the binary packet protocol:
/// per-direction sequence numbers, framing, padding, encryption and
/// MAC, with independently-installable transport state per direction.
pub struct Stream<S> {
    inner: S,
    timeout: Duration,

    transport: TransportPair,
    session_id: Option<Vec<u8>>,

    txseq: u32,
    rxseq: u32,
}

impl<S> Stream<S>
where
    S: Pipe,
{
    /// Wrap `inner`, with `timeout` applied to every send/receive.
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            transport: TransportPair::default(),
            session_id: None,
            txseq: 0,
            rxseq: 0,
        }
    }

    /// Whether no key-exchange has completed yet (a fresh stream is
    /// always rekeyable, since it has no session id yet).
    pub fn is_rekeyable(&self) -> bool {
        self.session_id.is_none()
    }

    /// Install newly derived transport state, atomically replacing
    /// both directions at once (called once both sides' `NEWKEYS`
    /// have been exchanged).
    pub fn with_transport(&mut self, transport: TransportPair) {
        self.transport = transport;
    }

    /// Record `hash` as the session id if this is the first key
    /// exchange, then return the (possibly earlier) session id.
    pub fn with_session(&mut self, hash: &[u8]) -> &[u8] {
        self.session_id.get_or_insert_with(|| hash.to_vec())
    }

    /// The session id, once a key exchange has completed.
    pub fn session_id(&self) -> Option<&[u8]> {
        self.session_id.as_deref()
    }

    /// Whether data is immediately available to read without blocking.
    pub async fn is_readable(&mut self) -> Result<bool> {
        futures::select_biased! {
            buf = self.inner.fill_buf() => {
                buf?;
                Ok(true)
            }
            _ = futures::future::ready(()) => Ok(false),
        }
    }

    /// Encrypt, authenticate and send one payload to the peer.
    ///
    /// # Cancel safety
    /// Not cancel-safe: a cancellation mid-write leaves the cipher
    /// chain state and sequence number unrecoverable (see SPEC_FULL.md §5).
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        async {
            let tx = &mut self.transport.tx;

            let pad_len = tx.padding_len(payload.len());
            let packet_length = 1 + payload.len() as u32 + pad_len as u32;

            let mut plaintext = Vec::with_capacity(4 + packet_length as usize);
            plaintext.extend_from_slice(&packet_length.to_be_bytes());
            plaintext.push(pad_len);
            plaintext.extend_from_slice(payload);
            tx.append_padding(&mut plaintext, pad_len);

            let mac = tx.seal(self.txseq, &plaintext);

            let mut wire = plaintext;
            tx.encrypt(&mut wire)?;
            wire.extend_from_slice(&mac);

            self.inner.write_all(&wire).await?;
            self.inner.flush().await?;

            self.txseq = self.txseq.wrapping_add(1);

            tracing::trace!(seq = self.txseq.wrapping_sub(1), bytes = payload.len(), "sent packet");

            Ok(())
        }
        .timeout(self.timeout)
        .await?
    }

    /// Receive, decrypt and authenticate one payload from the peer.
    ///
    /// # Cancel safety
    /// Not cancel-safe, for the same reason as [`Stream::send`].
    pub async fn recv(&mut self) -> Result<Vec<u8>> {
        async {
            let rx = &mut self.transport.rx;
            let block = rx.block_size();
            let mac_len = rx.hmac.size();

            let mut plaintext = vec![0u8; block];
            self.inner.read_exact(&mut plaintext).await?;
            rx.decrypt(&mut plaintext)?;

            let packet_length = u32::from_be_bytes(plaintext[0..4].try_into().expect("4 bytes"));
            if packet_length == 0
                || packet_length > MAX_PACKET_LENGTH
                || (packet_length + 4) as usize % rx.block_size() != 0
            {
                return Err(Error::InvalidLength(packet_length));
            }

            let total_len = packet_length as usize + 4;
            let remainder_ciphertext_len = total_len - block;

            let mut rest = vec![0u8; remainder_ciphertext_len + mac_len];
            self.inner.read_exact(&mut rest).await?;

            let (ciphertext_rest, mac) = rest.split_at(remainder_ciphertext_len);

            let mut rest_plain = ciphertext_rest.to_vec();
            rx.decrypt(&mut rest_plain)?;
            plaintext.extend_from_slice(&rest_plain);

            let pad_len = plaintext[4];
            if pad_len < 4 || pad_len as usize + 1 > packet_length as usize {
                return Err(Error::InvalidPadding(pad_len));
            }

            if mac_len > 0 {
                rx.open(self.rxseq, &plaintext, mac)?;
            }

            self.rxseq = self.rxseq.wrapping_add(1);

            let payload_end = total_len - pad_len as usize;
            let payload = plaintext[5..payload_end].to_vec();

            tracing::trace!(seq = self.rxseq.wrapping_sub(1), bytes = payload.len(), "received packet");

            Ok(payload)
        }
        .timeout(self.timeout)
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn null_cipher_round_trip() {
        // Scenario 1: null cipher, null MAC round-trip.
        let pipe = Cursor::new(Vec::<u8>::new());
        let mut tx_stream = Stream::new(pipe, Duration::from_secs(5));

        block_on(tx_stream.send(b"hello")).unwrap();

        let written = tx_stream.inner.into_inner();

        // Packet-level invariants (P1/P2): total on-wire size is a
        // multiple of the 8-byte floor block, and padding is in [4,255].
        assert_eq!(written.len() % 8, 0);

        let pad_len = written[4];
        assert!((4..=255).contains(&pad_len));

        let mut rx_stream = Stream::new(Cursor::new(written), Duration::from_secs(5));
        let payload = block_on(rx_stream.recv()).unwrap();

        assert_eq!(payload, b"hello"); // P3
    }

    #[test]
    fn small_payload_gets_minimum_eight_bytes_padding() {
        // Scenario 2: 3-byte payload, null cipher (8-byte floor block).
        let pipe = Cursor::new(Vec::<u8>::new());
        let mut stream = Stream::new(pipe, Duration::from_secs(5));

        block_on(stream.send(b"abc")).unwrap();
        let written = stream.inner.into_inner();

        let packet_length = u32::from_be_bytes(written[0..4].try_into().unwrap());
        let pad_len = written[4];

        assert_eq!(packet_length, 1 + 3 + 8);
        assert_eq!(pad_len, 8);
        assert_eq!(written.len(), 16); // 4 + packet_length, no MAC
    }

    #[test]
    fn oversized_length_field_is_rejected() {
        let mut bytes = vec![0u8; 8];
        bytes[0..4].copy_from_slice(&(MAX_PACKET_LENGTH + 1).to_be_bytes());

        let mut stream = Stream::new(Cursor::new(bytes), Duration::from_secs(5));
        let err = block_on(stream.recv()).unwrap_err();

        assert!(matches!(err, Error::InvalidLength(_)));
    }

    #[test]
    fn mac_mismatch_on_tampered_payload_is_terminal() {
        use crate::algorithm::Hmac;

        let pipe = Cursor::new(Vec::<u8>::new());
        let mut tx_stream = Stream::new(pipe, Duration::from_secs(5));
        tx_stream.transport.tx.hmac = Hmac::HmacSha1;
        tx_stream.transport.tx.keys.hmac = secrecy::SecretBox::new(Box::new(vec![0x11; 20]));

        block_on(tx_stream.send(b"integrity matters")).unwrap();
        let mut written = tx_stream.inner.into_inner();

        // Flip a bit inside the payload region (after the 5-byte header).
        let idx = 6;
        written[idx] ^= 0x01;

        let mut rx_stream = Stream::new(Cursor::new(written), Duration::from_secs(5));
        rx_stream.transport.rx.hmac = Hmac::HmacSha1;
        rx_stream.transport.rx.keys.hmac = secrecy::SecretBox::new(Box::new(vec![0x11; 20]));

        let err = block_on(rx_stream.recv()).unwrap_err();
        assert!(matches!(err, Error::MacMismatch));
    }
}
