//! Key-derivation function (RFC 4253 §7.2): expands the shared secret
//! and exchange hash into six named keys.

use digest::{Digest, FixedOutputReset};
use secrecy::SecretBox;

use crate::algorithm::Cipher;

/// The three keys derived for a single direction: initial IV, cipher
/// key and MAC key.
#[derive(Default)]
pub struct Keys {
    /// Cipher initialization vector.
    pub iv: SecretBox<Vec<u8>>,
    /// Cipher key.
    pub key: SecretBox<Vec<u8>>,
    /// MAC key.
    pub hmac: SecretBox<Vec<u8>>,
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keys").finish_non_exhaustive()
    }
}

impl Keys {
    /// Derive the client-to-server triple (letters 'A', 'C', 'E').
    pub fn as_client<D: Digest + FixedOutputReset>(
        secret_mpint: &[u8],
        exchange_hash: &[u8],
        session_id: &[u8],
        cipher: &Cipher,
        hmac_size: usize,
    ) -> Self {
        Self {
            iv: Self::derive::<D>(secret_mpint, exchange_hash, b'A', session_id, cipher.iv_size()),
            key: Self::derive::<D>(secret_mpint, exchange_hash, b'C', session_id, cipher.key_size()),
            hmac: Self::derive::<D>(secret_mpint, exchange_hash, b'E', session_id, hmac_size),
        }
    }

    /// Derive the server-to-client triple (letters 'B', 'D', 'F').
    pub fn as_server<D: Digest + FixedOutputReset>(
        secret_mpint: &[u8],
        exchange_hash: &[u8],
        session_id: &[u8],
        cipher: &Cipher,
        hmac_size: usize,
    ) -> Self {
        Self {
            iv: Self::derive::<D>(secret_mpint, exchange_hash, b'B', session_id, cipher.iv_size()),
            key: Self::derive::<D>(secret_mpint, exchange_hash, b'D', session_id, cipher.key_size()),
            hmac: Self::derive::<D>(secret_mpint, exchange_hash, b'F', session_id, hmac_size),
        }
    }

    /// `derive(letter) = Hash(secret || H || letter || session_id)`,
    /// extended with `Hash(secret || H || K(-1))` until `size` bytes
    /// are available, then truncated (RFC 4253 §7.2).
    fn derive<D: Digest + FixedOutputReset>(
        secret_mpint: &[u8],
        exchange_hash: &[u8],
        letter: u8,
        session_id: &[u8],
        size: usize,
    ) -> SecretBox<Vec<u8>> {
        SecretBox::new(Box::new(Self::derive_raw::<D>(
            secret_mpint,
            exchange_hash,
            letter,
            session_id,
            size,
        )))
    }

    /// Non-secret-boxed variant used directly by the prefix-property test.
    fn derive_raw<D: Digest + FixedOutputReset>(
        secret_mpint: &[u8],
        exchange_hash: &[u8],
        letter: u8,
        session_id: &[u8],
        size: usize,
    ) -> Vec<u8> {
        let mut hasher = D::new()
            .chain_update(secret_mpint)
            .chain_update(exchange_hash)
            .chain_update([letter])
            .chain_update(session_id);

        let mut key = hasher.finalize_reset().to_vec();

        while key.len() < size {
            hasher = hasher
                .chain_update(secret_mpint)
                .chain_update(exchange_hash)
                .chain_update(&key);

            key.extend_from_slice(&hasher.finalize_reset());
        }

        key.truncate(size);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use sha1::Sha1;

    #[test]
    fn kdf_output_is_a_prefix_of_a_longer_derivation() {
        // P6: derivation of length L is a prefix of derivation of length L' > L.
        let secret = b"\x00\x00\x00\x04\xca\xfe\xba\xbe";
        let hash = b"exchange-hash-stand-in";
        let session_id = b"session-id-stand-in";

        let short = Keys::derive_raw::<Sha1>(secret, hash, b'A', session_id, 20);
        let long = Keys::derive_raw::<Sha1>(secret, hash, b'A', session_id, 40);

        assert_eq!(&long[..20], &short[..]);
    }

    #[test]
    fn client_and_server_keys_differ() {
        let secret = b"shared-secret";
        let hash = b"hash";
        let session_id = b"sid";

        let client = Keys::as_client::<Sha1>(secret, hash, session_id, &Cipher::Aes128Ctr, 20);
        let server = Keys::as_server::<Sha1>(secret, hash, session_id, &Cipher::Aes128Ctr, 20);

        assert_ne!(client.key.expose_secret(), server.key.expose_secret());
        assert_ne!(client.iv.expose_secret(), server.iv.expose_secret());
    }
}
