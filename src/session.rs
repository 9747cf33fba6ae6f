//! The connection: pairs a [`Stream`] with a [`Client`] configuration
//! and dispatches transport-level messages (SPEC_FULL.md §4.4).

use either::Either;

use crate::buffer::Buffer;
use crate::client::Client;
use crate::error::{DisconnectedBy, DisconnectedError, Error, Result};
use crate::hostkey::HostKeyVerifier;
use crate::kex;
use crate::message::{self, Disconnect, DisconnectReason};
use crate::stream::{Pipe, Stream};

/// A client-side SSH transport connection: binary packet protocol
/// framing plus key-exchange, nothing above it (no auth, no channels).
pub struct Connection<IO: Pipe> {
    stream: Either<Stream<IO>, DisconnectedError>,
    config: Client,
    verifier: Box<dyn HostKeyVerifier>,

    v_c: Vec<u8>,
    v_s: Vec<u8>,
}

impl<IO> Connection<IO>
where
    IO: Pipe,
{
    /// Wrap `pipe` as a connection, given the already-exchanged
    /// identification strings `v_c`/`v_s` (CR/LF stripped) and a
    /// host-key verifier.
    pub fn new(
        pipe: IO,
        config: Client,
        v_c: impl Into<Vec<u8>>,
        v_s: impl Into<Vec<u8>>,
        verifier: impl HostKeyVerifier + 'static,
    ) -> Self {
        let timeout = config.timeout();

        Self {
            stream: Either::Left(Stream::new(pipe, timeout)),
            config,
            verifier: Box::new(verifier),
            v_c: v_c.into(),
            v_s: v_s.into(),
        }
    }

    /// The exchange hash of the first key exchange, stable across
    /// subsequent rekeys (P5).
    pub fn session_id(&self) -> Option<&[u8]> {
        self.stream.as_ref().left().and_then(Stream::session_id)
    }

    fn stream_mut(&mut self) -> Result<&mut Stream<IO>> {
        match &mut self.stream {
            Either::Left(stream) => Ok(stream),
            Either::Right(err) => Err(err.clone().into()),
        }
    }

    /// Drive a key-exchange from our side, optionally handing in a
    /// `KEXINIT` payload the caller already read off the wire (a
    /// server-initiated rekey).
    async fn kex(&mut self, peer_kexinit_payload: Option<Vec<u8>>) -> Result<()> {
        let stream = self.stream_mut()?;

        let result = kex::perform(
            stream,
            &self.config,
            &self.v_c,
            &self.v_s,
            self.verifier.as_ref(),
            peer_kexinit_payload,
        )
        .await;

        if let Err(err) = result {
            return Err(self
                .disconnect(DisconnectReason::KeyExchangeFailed, &err.to_string())
                .await
                .into());
        }

        Ok(())
    }

    /// Receive one application-layer payload, transparently handling
    /// and dispatching transport messages (`IGNORE`, `DEBUG`,
    /// `DISCONNECT`, `KEXINIT`) along the way.
    pub async fn recv(&mut self) -> Result<Vec<u8>> {
        if self.stream_mut()?.is_rekeyable() {
            self.kex(None).await?;
        }

        loop {
            let payload = match self.stream_mut()?.recv().await {
                Ok(payload) => payload,
                // Fatal receive-path errors must be reported to the peer
                // before the connection closes, not just surfaced locally.
                Err(err @ Error::MacMismatch) => {
                    return Err(self
                        .disconnect(DisconnectReason::MacError, &err.to_string())
                        .await
                        .into());
                }
                Err(err @ (Error::InvalidLength(_) | Error::InvalidPadding(_))) => {
                    return Err(self
                        .disconnect(DisconnectReason::ProtocolError, &err.to_string())
                        .await
                        .into());
                }
                Err(err) => return Err(err),
            };
            let msg_type = payload.first().copied().unwrap_or(0);

            match msg_type {
                message::SSH_MSG_DISCONNECT => {
                    let Disconnect {
                        reason,
                        description,
                    } = Disconnect::decode(&payload)?;

                    tracing::warn!(?reason, %description, "peer disconnected");

                    let err = DisconnectedError {
                        by: DisconnectedBy::Them,
                        reason,
                        description,
                    };
                    self.stream = Either::Right(err.clone());

                    return Err(err.into());
                }
                message::SSH_MSG_IGNORE => {
                    tracing::trace!("received an ignore message");
                }
                message::SSH_MSG_UNIMPLEMENTED => {
                    tracing::debug!("peer reported an unimplemented message");
                    return Ok(payload);
                }
                message::SSH_MSG_DEBUG => {
                    tracing::debug!("received a debug message");
                }
                message::SSH_MSG_KEXINIT => {
                    self.kex(Some(payload)).await?;
                }
                _ => return Ok(payload),
            }
        }
    }

    /// Send one application-layer payload, triggering a rekey first if
    /// one is due.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        if self.stream_mut()?.is_rekeyable() {
            self.kex(None).await?;
        }

        self.stream_mut()?.send(payload).await
    }

    /// Send `SSH_MSG_DISCONNECT` and mark the connection as closed.
    pub async fn disconnect(
        &mut self,
        reason: DisconnectReason,
        description: &str,
    ) -> DisconnectedError {
        let stream = match &mut self.stream {
            Either::Left(stream) => stream,
            Either::Right(err) => return err.clone(),
        };

        let mut buf = Buffer::new();
        Disconnect::encode(reason, description, &mut buf);

        let _ = stream.send(buf.as_slice()).await;

        let err = DisconnectedError {
            by: DisconnectedBy::Us,
            reason,
            description: description.to_owned(),
        };
        self.stream = Either::Right(err.clone());

        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostkey::AcceptAll;
    use futures::io::Cursor;

    fn is_send<T: Send>() {}

    #[test]
    fn connection_is_send() {
        is_send::<Connection<Cursor<Vec<u8>>>>();
    }

    #[test]
    fn disconnect_marks_connection_closed() {
        let pipe = Cursor::new(Vec::<u8>::new());
        let mut conn = Connection::new(
            pipe,
            Client::default(),
            "SSH-2.0-client",
            "SSH-2.0-server",
            AcceptAll,
        );

        let err =
            futures::executor::block_on(conn.disconnect(DisconnectReason::ByApplication, "done"));

        assert_eq!(err.by, DisconnectedBy::Us);
        assert!(matches!(conn.stream, Either::Right(_)));
    }
}
