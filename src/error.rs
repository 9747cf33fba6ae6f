//! Collection of error handling types and aliases.

use thiserror::Error;

use crate::message::DisconnectReason;

/// The side that originated a disconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectedBy {
    /// The connection was torn down by _us_.
    Us,

    /// The connection was torn down by _them_.
    Them,
}

/// Describes a disconnection, either one we sent or one we received.
#[must_use]
#[derive(Debug, Error, Clone)]
#[error("connection disconnected by {by:?} ({reason:?}): {description}")]
pub struct DisconnectedError {
    /// Side that sent the `SSH_MSG_DISCONNECT`.
    pub by: DisconnectedBy,

    /// Reason code carried by the message.
    pub reason: DisconnectReason,

    /// Human-readable description carried by the message.
    pub description: String,
}

/// The error categories that can occur while operating this crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying pipe.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input ended before a field could be fully read.
    #[error("unexpected end of input while decoding a field")]
    Truncated,

    /// A length field decoded to an out-of-range value.
    #[error("packet length {0} is out of the allowed range")]
    InvalidLength(u32),

    /// The padding length field was inconsistent with the packet length.
    #[error("padding length {0} is invalid for this packet")]
    InvalidPadding(u8),

    /// An `mpint` field could not be decoded.
    #[error("malformed mpint encoding")]
    InvalidMpint,

    /// Packet integrity check failed.
    #[error("MAC verification failed")]
    MacMismatch,

    /// The cipher backend failed to encrypt or decrypt.
    #[error("cipher operation failed")]
    CipherError,

    /// No common algorithm was found during negotiation.
    #[error("unable to negotiate a common {0} algorithm")]
    NegotiationFailed(&'static str),

    /// The peer's DH public value was outside the required range.
    #[error("peer's Diffie-Hellman public value is out of range")]
    InvalidPublicValue,

    /// The server's signature over the exchange hash did not verify.
    #[error(transparent)]
    BadSignature(#[from] signature::Error),

    /// The host-key verifier rejected the server's key.
    #[error("host key rejected by verifier")]
    UntrustedHost,

    /// SSH key (de)serialization or signing error.
    #[error(transparent)]
    Key(#[from] ssh_key::Error),

    /// The peer sent a message that made no sense in the current context.
    #[error("unexpected message: got {got:#x}, expected {expected:#x}")]
    UnexpectedMessage {
        /// Message number that was received.
        got: u8,
        /// Message number that was expected.
        expected: u8,
    },

    /// The peer closed the connection with `SSH_MSG_DISCONNECT`.
    #[error(transparent)]
    RemoteDisconnect(#[from] DisconnectedError),

    /// Bytes were already buffered past `NEWKEYS`, under the old keys.
    #[error("read-ahead buffer not drained before installing new keys")]
    ReadAheadNotDrained,
}

/// A [`std::result::Result`] alias defaulting the error type to [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
