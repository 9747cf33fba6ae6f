//! A low-level SSH library handling the binary packet protocol and
//! Diffie-Hellman key-exchange, not more, not less.
//!
//! This crate owns exactly the transport layer described in RFC 4253:
//! framing, padding, encryption and integrity of packets ([`stream`]),
//! and the key-exchange handshake that derives the keys they use
//! ([`kex`]). It does not perform the version-banner exchange (callers
//! hand in the already-agreed `V_C`/`V_S` strings), user authentication
//! or channel multiplexing; those belong to higher layers built on top.
//!
//! A [`Connection`] is the usual entry point: it pairs a duplex byte
//! stream with a [`Client`] configuration and a [`HostKeyVerifier`],
//! drives the initial key exchange lazily on first use, and transparently
//! re-keys whenever the peer requests one.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

mod buffer;
mod client;
mod error;
mod kex;
mod message;
mod session;
mod stream;

pub mod algorithm;
pub mod hostkey;

pub use client::{Algorithms, Client, PROTOCOL_ID};
pub use error::{DisconnectedBy, DisconnectedError, Error, Result};
pub use message::DisconnectReason;
pub use session::Connection;
pub use stream::{Pipe, MAX_PACKET_LENGTH};
