//! Transport-layer message numbers and the payload shapes this crate
//! understands directly (KEXINIT, NEWKEYS, DISCONNECT, the DH messages).

use strum::FromRepr;

use crate::buffer::{Buffer, Reader};
use crate::error::{Error, Result};

/// `SSH_MSG_DISCONNECT`
pub const SSH_MSG_DISCONNECT: u8 = 1;
/// `SSH_MSG_IGNORE`
pub const SSH_MSG_IGNORE: u8 = 2;
/// `SSH_MSG_UNIMPLEMENTED`
pub const SSH_MSG_UNIMPLEMENTED: u8 = 3;
/// `SSH_MSG_DEBUG`
pub const SSH_MSG_DEBUG: u8 = 4;
/// `SSH_MSG_KEXINIT`
pub const SSH_MSG_KEXINIT: u8 = 20;
/// `SSH_MSG_NEWKEYS`
pub const SSH_MSG_NEWKEYS: u8 = 21;
/// `SSH_MSG_KEXDH_INIT`
pub const SSH_MSG_KEXDH_INIT: u8 = 30;
/// `SSH_MSG_KEXDH_REPLY`
pub const SSH_MSG_KEXDH_REPLY: u8 = 31;

/// `SSH_MSG_DISCONNECT` reason codes (RFC 4253 §11.1).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum DisconnectReason {
    /// `SSH_DISCONNECT_HOST_NOT_ALLOWED_TO_CONNECT`
    HostNotAllowedToConnect = 1,
    /// `SSH_DISCONNECT_PROTOCOL_ERROR`
    ProtocolError = 2,
    /// `SSH_DISCONNECT_KEY_EXCHANGE_FAILED`
    KeyExchangeFailed = 3,
    /// `SSH_DISCONNECT_RESERVED`
    Reserved = 4,
    /// `SSH_DISCONNECT_MAC_ERROR`
    MacError = 5,
    /// `SSH_DISCONNECT_COMPRESSION_ERROR`
    CompressionError = 6,
    /// `SSH_DISCONNECT_SERVICE_NOT_AVAILABLE`
    ServiceNotAvailable = 7,
    /// `SSH_DISCONNECT_PROTOCOL_VERSION_NOT_SUPPORTED`
    ProtocolVersionNotSupported = 8,
    /// `SSH_DISCONNECT_HOST_KEY_NOT_VERIFIABLE`
    HostKeyNotVerifiable = 9,
    /// `SSH_DISCONNECT_CONNECTION_LOST`
    ConnectionLost = 10,
    /// `SSH_DISCONNECT_BY_APPLICATION`
    ByApplication = 11,
    /// `SSH_DISCONNECT_TOO_MANY_CONNECTIONS`
    TooManyConnections = 12,
    /// `SSH_DISCONNECT_AUTH_CANCELLED_BY_USER`
    AuthCancelledByUser = 13,
    /// `SSH_DISCONNECT_NO_MORE_AUTH_METHODS_AVAILABLE`
    NoMoreAuthMethodsAvailable = 14,
    /// `SSH_DISCONNECT_ILLEGAL_USER_NAME`
    IllegalUserName = 15,
}

impl DisconnectReason {
    fn from_u32_or_protocol_error(v: u32) -> Self {
        Self::from_repr(v).unwrap_or(Self::ProtocolError)
    }
}

/// The `SSH_MSG_KEXINIT` payload: the per-side algorithm preference lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexInit {
    /// 16 random bytes, uncorrelated with any other value.
    pub cookie: [u8; 16],
    /// Key-exchange method names, most preferred first.
    pub kex_algorithms: Vec<String>,
    /// Host-key algorithm names, most preferred first.
    pub server_host_key_algorithms: Vec<String>,
    /// Client-to-server cipher names, most preferred first.
    pub encryption_algorithms_client_to_server: Vec<String>,
    /// Server-to-client cipher names, most preferred first.
    pub encryption_algorithms_server_to_client: Vec<String>,
    /// Client-to-server MAC names, most preferred first.
    pub mac_algorithms_client_to_server: Vec<String>,
    /// Server-to-client MAC names, most preferred first.
    pub mac_algorithms_server_to_client: Vec<String>,
    /// Client-to-server compression names, most preferred first.
    pub compression_algorithms_client_to_server: Vec<String>,
    /// Server-to-client compression names, most preferred first.
    pub compression_algorithms_server_to_client: Vec<String>,
    /// Client-to-server language tags (unused by this crate, forwarded as-is).
    pub languages_client_to_server: Vec<String>,
    /// Server-to-client language tags (unused by this crate, forwarded as-is).
    pub languages_server_to_client: Vec<String>,
    /// Whether a speculative first KEX packet follows; this crate never
    /// sends one and does not implement consuming one from the peer
    /// (RFC 4253 §7.1 guess-packet optimization is out of scope).
    pub first_kex_packet_follows: bool,
}

fn split_name_list(raw: &[u8]) -> Vec<String> {
    let s = String::from_utf8_lossy(raw);
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(',').map(str::to_owned).collect()
    }
}

impl KexInit {
    /// Encode the message (including its leading `SSH_MSG_KEXINIT` type
    /// byte) into `buf`.
    pub fn encode(&self, buf: &mut Buffer) {
        buf.write_u8(SSH_MSG_KEXINIT);
        buf.append(&self.cookie);
        buf.write_name_list(&self.kex_algorithms);
        buf.write_name_list(&self.server_host_key_algorithms);
        buf.write_name_list(&self.encryption_algorithms_client_to_server);
        buf.write_name_list(&self.encryption_algorithms_server_to_client);
        buf.write_name_list(&self.mac_algorithms_client_to_server);
        buf.write_name_list(&self.mac_algorithms_server_to_client);
        buf.write_name_list(&self.compression_algorithms_client_to_server);
        buf.write_name_list(&self.compression_algorithms_server_to_client);
        buf.write_name_list(&self.languages_client_to_server);
        buf.write_name_list(&self.languages_server_to_client);
        buf.write_u8(self.first_kex_packet_follows as u8);
        buf.write_u32_be(0); // reserved
    }

    /// Decode a `SSH_MSG_KEXINIT` payload (type byte included).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);

        let msg_type = r.read_u8()?;
        if msg_type != SSH_MSG_KEXINIT {
            return Err(Error::UnexpectedMessage {
                got: msg_type,
                expected: SSH_MSG_KEXINIT,
            });
        }

        let mut cookie = [0u8; 16];
        for b in &mut cookie {
            *b = r.read_u8()?;
        }

        let kex_algorithms = split_name_list(r.read_string()?);
        let server_host_key_algorithms = split_name_list(r.read_string()?);
        let encryption_algorithms_client_to_server = split_name_list(r.read_string()?);
        let encryption_algorithms_server_to_client = split_name_list(r.read_string()?);
        let mac_algorithms_client_to_server = split_name_list(r.read_string()?);
        let mac_algorithms_server_to_client = split_name_list(r.read_string()?);
        let compression_algorithms_client_to_server = split_name_list(r.read_string()?);
        let compression_algorithms_server_to_client = split_name_list(r.read_string()?);
        let languages_client_to_server = split_name_list(r.read_string()?);
        let languages_server_to_client = split_name_list(r.read_string()?);
        let first_kex_packet_follows = r.read_u8()? != 0;
        let _reserved = r.read_u32_be()?;

        Ok(Self {
            cookie,
            kex_algorithms,
            server_host_key_algorithms,
            encryption_algorithms_client_to_server,
            encryption_algorithms_server_to_client,
            mac_algorithms_client_to_server,
            mac_algorithms_server_to_client,
            compression_algorithms_client_to_server,
            compression_algorithms_server_to_client,
            languages_client_to_server,
            languages_server_to_client,
            first_kex_packet_follows,
        })
    }
}

/// A decoded `SSH_MSG_DISCONNECT` payload.
#[derive(Debug, Clone)]
pub struct Disconnect {
    /// The reason the peer is disconnecting.
    pub reason: DisconnectReason,
    /// A human-readable description.
    pub description: String,
}

impl Disconnect {
    /// Decode a `SSH_MSG_DISCONNECT` payload (type byte included).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);

        let msg_type = r.read_u8()?;
        if msg_type != SSH_MSG_DISCONNECT {
            return Err(Error::UnexpectedMessage {
                got: msg_type,
                expected: SSH_MSG_DISCONNECT,
            });
        }

        let reason = DisconnectReason::from_u32_or_protocol_error(r.read_u32_be()?);
        let description = String::from_utf8_lossy(r.read_string()?).into_owned();

        Ok(Self {
            reason,
            description,
        })
    }

    /// Encode a `SSH_MSG_DISCONNECT` payload (type byte included).
    pub fn encode(reason: DisconnectReason, description: &str, buf: &mut Buffer) {
        buf.write_u8(SSH_MSG_DISCONNECT);
        buf.write_u32_be(reason as u32);
        buf.write_string(description.as_bytes());
        buf.write_string(b""); // language tag, unused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_kexinit() -> KexInit {
        KexInit {
            cookie: [7; 16],
            kex_algorithms: vec!["diffie-hellman-group14-sha1".into()],
            server_host_key_algorithms: vec!["ssh-ed25519".into()],
            encryption_algorithms_client_to_server: vec!["aes128-ctr".into()],
            encryption_algorithms_server_to_client: vec!["aes128-ctr".into()],
            mac_algorithms_client_to_server: vec!["hmac-sha1".into()],
            mac_algorithms_server_to_client: vec!["hmac-sha1".into()],
            compression_algorithms_client_to_server: vec!["none".into()],
            compression_algorithms_server_to_client: vec!["none".into()],
            languages_client_to_server: vec![],
            languages_server_to_client: vec![],
            first_kex_packet_follows: false,
        }
    }

    #[test]
    fn kexinit_round_trip() {
        let original = sample_kexinit();

        let mut buf = Buffer::new();
        original.encode(&mut buf);

        let decoded = KexInit::decode(buf.as_slice()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn disconnect_round_trip() {
        let mut buf = Buffer::new();
        Disconnect::encode(DisconnectReason::ByApplication, "bye", &mut buf);

        let decoded = Disconnect::decode(buf.as_slice()).unwrap();
        assert_eq!(decoded.reason, DisconnectReason::ByApplication);
        assert_eq!(decoded.description, "bye");
    }

    #[test]
    fn unknown_reason_code_maps_to_protocol_error() {
        assert_eq!(
            DisconnectReason::from_u32_or_protocol_error(999),
            DisconnectReason::ProtocolError
        );
    }
}
