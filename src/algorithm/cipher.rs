use strum::{AsRefStr, EnumString};

use crate::error::{Error, Result};

/// Opaque, per-direction cipher chaining state (CBC IV chain or CTR
/// counter), type-erased the way the teacher keeps it since each cipher
/// variant needs a differently-typed backend context.
pub type CipherState = Box<dyn std::any::Any + Send + Sync>;

/// SSH cipher algorithms this crate implements.
///
/// AEAD ciphers (`*-gcm@openssh.com`, `chacha20-poly1305@openssh.com`)
/// are not offered: they fold the MAC into the cipher, which
/// contradicts this crate's always-separate-MAC framing.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Cipher {
    /// AES-256 in counter (CTR) mode.
    Aes256Ctr,
    /// AES-192 in counter (CTR) mode.
    Aes192Ctr,
    /// AES-128 in counter (CTR) mode.
    Aes128Ctr,
    /// AES-256 in cipher block chaining (CBC) mode.
    Aes256Cbc,
    /// AES-192 in cipher block chaining (CBC) mode.
    Aes192Cbc,
    /// AES-128 in cipher block chaining (CBC) mode.
    Aes128Cbc,
    /// TripleDES in cipher block chaining (CBC) mode.
    #[strum(serialize = "3des-cbc")]
    TDesCbc,
    /// No cipher algorithm.
    #[default]
    None,
}

impl Cipher {
    fn state<'s, T: cipher::KeyIvInit + Send + Sync + 'static>(
        state: &'s mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
    ) -> Result<&'s mut T> {
        if state.is_none() {
            *state = Some(Box::new(
                T::new_from_slices(key, iv).map_err(|_| Error::CipherError)?,
            ));
        }

        state
            .as_mut()
            .expect("just initialized")
            .downcast_mut()
            .ok_or(Error::CipherError)
    }

    fn ctr<C: ctr::cipher::StreamCipher>(cipher: &mut C, buffer: &mut [u8]) -> Result<()> {
        cipher
            .try_apply_keystream(buffer)
            .map_err(|_| Error::CipherError)
    }

    /// Encrypt `buffer` in place using `key`/`iv` and the per-direction
    /// `state`, creating the backend context on first use.
    pub fn encrypt(
        &self,
        state: &mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
        buffer: &mut [u8],
    ) -> Result<()> {
        fn cbc<C: cbc::cipher::BlockEncryptMut>(cipher: &mut C, buffer: &mut [u8]) -> Result<()> {
            use cbc::cipher::inout;

            let data = inout::InOutBufReserved::from_mut_slice(buffer, buffer.len())
                .map_err(|_| Error::CipherError)?;
            let mut blocks = data
                .into_padded_blocks::<cbc::cipher::block_padding::NoPadding, C::BlockSize>()
                .map_err(|_| Error::CipherError)?;

            cipher.encrypt_blocks_inout_mut(blocks.get_blocks());
            if let Some(block) = blocks.get_tail_block() {
                cipher.encrypt_block_inout_mut(block);
            }

            Ok(())
        }

        match self {
            Self::Aes256Ctr => Self::ctr(Self::state::<ctr::Ctr128BE<aes::Aes256>>(state, key, iv)?, buffer),
            Self::Aes192Ctr => Self::ctr(Self::state::<ctr::Ctr128BE<aes::Aes192>>(state, key, iv)?, buffer),
            Self::Aes128Ctr => Self::ctr(Self::state::<ctr::Ctr128BE<aes::Aes128>>(state, key, iv)?, buffer),
            Self::Aes256Cbc => cbc(Self::state::<cbc::Encryptor<aes::Aes256>>(state, key, iv)?, buffer),
            Self::Aes192Cbc => cbc(Self::state::<cbc::Encryptor<aes::Aes192>>(state, key, iv)?, buffer),
            Self::Aes128Cbc => cbc(Self::state::<cbc::Encryptor<aes::Aes128>>(state, key, iv)?, buffer),
            Self::TDesCbc => cbc(Self::state::<cbc::Encryptor<des::TdesEde3>>(state, key, iv)?, buffer),
            Self::None => Ok(()),
        }
    }

    /// Decrypt `buffer` in place. CTR mode decryption is identical to
    /// encryption (the keystream is just XORed again).
    pub fn decrypt(
        &self,
        state: &mut Option<CipherState>,
        key: &[u8],
        iv: &[u8],
        buffer: &mut [u8],
    ) -> Result<()> {
        fn cbc<C: cbc::cipher::BlockDecryptMut>(cipher: &mut C, buffer: &mut [u8]) -> Result<()> {
            use cbc::cipher::inout;

            let data = inout::InOutBufReserved::from_mut_slice(buffer, buffer.len())
                .map_err(|_| Error::CipherError)?;
            let mut blocks = data
                .into_padded_blocks::<cbc::cipher::block_padding::NoPadding, C::BlockSize>()
                .map_err(|_| Error::CipherError)?;

            cipher.decrypt_blocks_inout_mut(blocks.get_blocks());
            if let Some(block) = blocks.get_tail_block() {
                cipher.decrypt_block_inout_mut(block);
            }

            Ok(())
        }

        match self {
            Self::Aes256Ctr | Self::Aes192Ctr | Self::Aes128Ctr => {
                self.encrypt(state, key, iv, buffer)
            }
            Self::Aes256Cbc => cbc(Self::state::<cbc::Decryptor<aes::Aes256>>(state, key, iv)?, buffer),
            Self::Aes192Cbc => cbc(Self::state::<cbc::Decryptor<aes::Aes192>>(state, key, iv)?, buffer),
            Self::Aes128Cbc => cbc(Self::state::<cbc::Decryptor<aes::Aes128>>(state, key, iv)?, buffer),
            Self::TDesCbc => cbc(Self::state::<cbc::Decryptor<des::TdesEde3>>(state, key, iv)?, buffer),
            Self::None => Ok(()),
        }
    }

    /// Cipher block length in bytes, used for padding alignment.
    pub fn block_size(&self) -> usize {
        match self {
            Self::None | Self::TDesCbc => 8,
            Self::Aes128Cbc
            | Self::Aes192Cbc
            | Self::Aes256Cbc
            | Self::Aes128Ctr
            | Self::Aes192Ctr
            | Self::Aes256Ctr => 16,
        }
    }

    /// Key length in bytes required by the cipher.
    pub fn key_size(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Aes128Cbc | Self::Aes128Ctr => 16,
            Self::TDesCbc | Self::Aes192Cbc | Self::Aes192Ctr => 24,
            Self::Aes256Cbc | Self::Aes256Ctr => 32,
        }
    }

    /// IV length in bytes required by the cipher.
    pub fn iv_size(&self) -> usize {
        match self {
            Self::None => 0,
            Self::TDesCbc => 8,
            Self::Aes128Cbc
            | Self::Aes192Cbc
            | Self::Aes256Cbc
            | Self::Aes128Ctr
            | Self::Aes192Ctr
            | Self::Aes256Ctr => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes128_ctr_encrypt_decrypt_round_trip() {
        let cipher = Cipher::Aes128Ctr;
        let key = vec![0x42; cipher.key_size()];
        let iv = vec![0x24; cipher.iv_size()];

        let mut state_enc = None;
        let mut state_dec = None;

        let mut buf = b"hello, ssh transport layer!!!!!".to_vec();
        let original = buf.clone();

        cipher.encrypt(&mut state_enc, &key, &iv, &mut buf).unwrap();
        assert_ne!(buf, original);

        cipher.decrypt(&mut state_dec, &key, &iv, &mut buf).unwrap();
        assert_eq!(buf, original);
    }

    #[test]
    fn none_cipher_is_a_no_op() {
        let cipher = Cipher::None;
        let mut state = None;
        let mut buf = b"plaintext".to_vec();
        let original = buf.clone();

        cipher.encrypt(&mut state, &[], &[], &mut buf).unwrap();
        assert_eq!(buf, original);
    }

    #[test]
    fn block_sizes_match_known_algorithms() {
        assert_eq!(Cipher::None.block_size(), 8);
        assert_eq!(Cipher::Aes128Ctr.block_size(), 16);
        assert_eq!(Cipher::TDesCbc.key_size(), 24);
    }
}
