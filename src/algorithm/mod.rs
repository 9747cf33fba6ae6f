//! Supported algorithms for **encryption**, **integrity** and
//! **compression** (key-exchange methods live in [`crate::kex`]).

mod cipher;
pub use cipher::{Cipher, CipherState};

mod hmac;
pub use hmac::Hmac;

mod compress;
pub use compress::Compress;

use crate::error::{Error, Result};

/// Pick the first name in `preferred` that also appears in `available`,
/// per RFC 4253 §7.1's negotiation rule (the client's order decides).
pub(crate) fn negotiate<'a>(
    category: &'static str,
    preferred: &'a [String],
    available: &[String],
) -> Result<&'a str> {
    preferred
        .iter()
        .find(|name| available.iter().any(|a| a == *name))
        .map(String::as_str)
        .ok_or(Error::NegotiationFailed(category))
}
