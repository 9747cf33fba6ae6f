//! Classic (non-ECDH) Diffie-Hellman group parameters and the modular
//! exponentiation primitive they share.
//!
//! Constants are the RFC 2409 §6.2 (group1) and RFC 3526 §3 (group14)
//! fixed generator/modulus pairs, generator `g = 2` in both cases.

use num_bigint::BigUint;
use rand::RngCore;

use crate::error::{Error, Result};

/// A fixed Diffie-Hellman group: generator and modulus.
pub struct Group {
    pub(crate) generator: BigUint,
    pub(crate) modulus: BigUint,
}

const GROUP1_MODULUS_HEX: &str = concat!(
    "FFFFFFFF", "FFFFFFFF", "C90FDAA2", "2168C234", "C4C6628B", "80DC1CD1",
    "29024E08", "8A67CC74", "020BBEA6", "3B139B22", "514A0879", "8E3404DD",
    "EF9519B3", "CD3A431B", "302B0A6D", "F25F1437", "4FE1356D", "6D51C245",
    "E485B576", "625E7EC6", "F44C42E9", "A637ED6B", "0BFF5CB6", "F406B7ED",
    "EE386BFB", "5A899FA5", "AE9F2411", "7C4B1FE6", "49286651", "ECE65381",
    "FFFFFFFF", "FFFFFFFF",
);

const GROUP14_MODULUS_HEX: &str = concat!(
    "FFFFFFFF", "FFFFFFFF", "C90FDAA2", "2168C234", "C4C6628B", "80DC1CD1",
    "29024E08", "8A67CC74", "020BBEA6", "3B139B22", "514A0879", "8E3404DD",
    "EF9519B3", "CD3A431B", "302B0A6D", "F25F1437", "4FE1356D", "6D51C245",
    "E485B576", "625E7EC6", "F44C42E9", "A637ED6B", "0BFF5CB6", "F406B7ED",
    "EE386BFB", "5A899FA5", "AE9F2411", "7C4B1FE6", "49286651", "ECE45B3D",
    "C2007CB8", "A163BF05", "98DA4836", "1C55D39A", "69163FA8", "FD24CF5F",
    "83655D23", "DCA3AD96", "1C62F356", "208552BB", "9ED52907", "7096966D",
    "670C354E", "4ABC9804", "F1746C08", "CA18217C", "32905E46", "2E36CE3B",
    "E39E772C", "180E8603", "9B2783A2", "EC07A28F", "B5C55DF0", "6F4C52C9",
    "DE2BCBF6", "95581718", "3995497C", "EA956AE5", "15D22618", "98FA0510",
    "15728E5A", "8AACAA68", "FFFFFFFF", "FFFFFFFF",
);

fn from_hex(hex: &str) -> BigUint {
    BigUint::parse_bytes(hex.as_bytes(), 16).expect("compiled-in DH modulus constant is valid hex")
}

impl Group {
    /// RFC 2409 §6.2's "group1" Oakley group: 1024 bits, generator 2.
    pub fn group1() -> Self {
        Self {
            generator: BigUint::from(2u8),
            modulus: from_hex(GROUP1_MODULUS_HEX),
        }
    }

    /// RFC 3526 §3: the 2048-bit MODP group, generator 2.
    pub fn group14() -> Self {
        Self {
            generator: BigUint::from(2u8),
            modulus: from_hex(GROUP14_MODULUS_HEX),
        }
    }

    /// Draw a random private exponent `x` with `1 < x < p - 1`, and
    /// compute the corresponding public value `e = g^x mod p`.
    pub fn generate_keypair(&self) -> (BigUint, BigUint) {
        let bit_len = self.modulus.bits();

        let x = loop {
            let mut bytes = vec![0u8; (bit_len as usize).div_ceil(8)];
            rand::thread_rng().fill_bytes(&mut bytes);
            let candidate = BigUint::from_bytes_be(&bytes) % &self.modulus;

            if candidate > BigUint::from(1u8) && candidate < &self.modulus - BigUint::from(1u8) {
                break candidate;
            }
        };

        let e = self.modexp(&self.generator, &x);

        (x, e)
    }

    /// `base^exp mod p`.
    pub fn modexp(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        base.modpow(exp, &self.modulus)
    }

    /// Validate a peer public value per RFC 4253 §8: reject `f <= 1`
    /// or `f >= p - 1`.
    pub fn validate_public(&self, f: &BigUint) -> Result<()> {
        let one = BigUint::from(1u8);
        let p_minus_one = &self.modulus - &one;

        if f <= &one || f >= &p_minus_one {
            Err(Error::InvalidPublicValue)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_modexp_matches_hand_computation() {
        // Tiny hand-verifiable sanity check of the modexp primitive
        // itself, independent of the real (huge) DH groups: 3^5 mod 7.
        //   3^1=3, 3^2=2, 3^3=6, 3^4=4, 3^5=5 (mod 7)
        let base = BigUint::from(3u8);
        let exp = BigUint::from(5u8);
        let modulus = BigUint::from(7u8);

        let group = Group {
            generator: base.clone(),
            modulus,
        };

        assert_eq!(group.modexp(&base, &exp), BigUint::from(5u8));
    }

    #[test]
    fn group1_and_group14_moduli_are_well_formed() {
        let g1 = Group::group1();
        assert_eq!(g1.modulus.bits(), 1024);

        let g14 = Group::group14();
        assert_eq!(g14.modulus.bits(), 2048);
    }

    #[test]
    fn keypair_public_value_is_in_range() {
        let group = Group::group14();
        let (_x, e) = group.generate_keypair();

        assert!(group.validate_public(&e).is_ok());
    }

    #[test]
    fn validate_public_rejects_boundary_values() {
        let group = Group::group1();

        assert!(group.validate_public(&BigUint::from(1u8)).is_err());
        assert!(group
            .validate_public(&(&group.modulus - BigUint::from(1u8)))
            .is_err());
        assert!(group.validate_public(&BigUint::from(2u8)).is_ok());
    }

    #[test]
    fn shared_secret_agrees_between_both_sides() {
        // Small group to keep the test fast and hand-checkable in shape
        // (real agreement math, not the production-size constants).
        let group = Group {
            generator: BigUint::from(5u8),
            modulus: BigUint::from(23u8),
        };

        let (x, e) = group.generate_keypair();
        let (y, f) = group.generate_keypair();

        let k1 = group.modexp(&f, &x);
        let k2 = group.modexp(&e, &y);

        assert_eq!(k1, k2);
    }
}
