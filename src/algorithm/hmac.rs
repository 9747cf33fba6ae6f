use digest::{Mac as _, OutputSizeUser};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use strum::{AsRefStr, EnumString};

use crate::error::{Error, Result};

/// SSH MAC algorithms this crate implements.
///
/// The `*-etm@openssh.com` variants are not offered: they MAC the
/// ciphertext and leave the length field unencrypted, which
/// contradicts this crate's always-MAC-the-plaintext-packet framing.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Hmac {
    /// HMAC with a SHA-2-512 digest.
    #[strum(serialize = "hmac-sha2-512")]
    HmacSha512,
    /// HMAC with a SHA-2-256 digest.
    #[strum(serialize = "hmac-sha2-256")]
    HmacSha256,
    /// HMAC with a SHA-1 digest.
    HmacSha1,
    /// No MAC algorithm.
    #[default]
    None,
}

impl Hmac {
    /// Compute `HMAC(key, seq_num_be || packet)`.
    pub fn sign(&self, seq: u32, packet: &[u8], key: &[u8]) -> Vec<u8> {
        fn sign<D: digest::Mac + digest::KeyInit>(seq: u32, packet: &[u8], key: &[u8]) -> Vec<u8> {
            D::new_from_slice(key)
                .expect("HMAC accepts keys of any length")
                .chain_update(seq.to_be_bytes())
                .chain_update(packet)
                .finalize()
                .into_bytes()
                .to_vec()
        }

        match self {
            Self::HmacSha512 => sign::<hmac::Hmac<Sha512>>(seq, packet, key),
            Self::HmacSha256 => sign::<hmac::Hmac<Sha256>>(seq, packet, key),
            Self::HmacSha1 => sign::<hmac::Hmac<Sha1>>(seq, packet, key),
            Self::None => Vec::new(),
        }
    }

    /// Verify `mac` against `HMAC(key, seq_num_be || packet)` in
    /// constant time (delegated to `hmac`'s `Mac::verify_slice`, which
    /// compares via `subtle`'s constant-time equality rather than a
    /// short-circuiting byte compare).
    pub fn verify(&self, seq: u32, packet: &[u8], key: &[u8], mac: &[u8]) -> Result<()> {
        fn verify<D: digest::Mac + digest::KeyInit>(
            seq: u32,
            packet: &[u8],
            key: &[u8],
            mac: &[u8],
        ) -> Result<()> {
            D::new_from_slice(key)
                .expect("HMAC accepts keys of any length")
                .chain_update(seq.to_be_bytes())
                .chain_update(packet)
                .verify_slice(mac)
                .map_err(|_| Error::MacMismatch)
        }

        match self {
            Self::HmacSha512 => verify::<hmac::Hmac<Sha512>>(seq, packet, key, mac),
            Self::HmacSha256 => verify::<hmac::Hmac<Sha256>>(seq, packet, key, mac),
            Self::HmacSha1 => verify::<hmac::Hmac<Sha1>>(seq, packet, key, mac),
            Self::None => Ok(()),
        }
    }

    /// MAC output length in bytes (0 when no MAC is in use).
    pub fn size(&self) -> usize {
        match self {
            Self::HmacSha512 => Sha512::output_size(),
            Self::HmacSha256 => Sha256::output_size(),
            Self::HmacSha1 => Sha1::output_size(),
            Self::None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let mac = Hmac::HmacSha256;
        let key = b"a shared secret key material";
        let packet = b"framed packet bytes";

        let tag = mac.sign(42, packet, key);
        assert_eq!(tag.len(), mac.size());
        mac.verify(42, packet, key, &tag).unwrap();
    }

    #[test]
    fn altered_packet_fails_verification() {
        let mac = Hmac::HmacSha1;
        let key = b"key";
        let mut packet = b"original packet".to_vec();

        let tag = mac.sign(1, &packet, key);
        packet[0] ^= 0x01;

        assert!(mac.verify(1, &packet, key, &tag).is_err());
    }

    #[test]
    fn wrong_sequence_number_fails_verification() {
        let mac = Hmac::HmacSha1;
        let key = b"key";
        let packet = b"packet";

        let tag = mac.sign(1, packet, key);
        assert!(mac.verify(2, packet, key, &tag).is_err());
    }

    #[test]
    fn none_mac_has_zero_size_and_empty_tag() {
        let mac = Hmac::None;
        assert_eq!(mac.size(), 0);
        assert!(mac.sign(0, b"x", b"").is_empty());
        mac.verify(0, b"x", b"", b"").unwrap();
    }
}
