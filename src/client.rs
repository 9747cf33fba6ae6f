//! Client-side session configuration: identification, timeout and
//! algorithm policy.

use std::time::Duration as StdDuration;

use futures_time::time::Duration;
use rand::RngCore;

use crate::message::KexInit;

/// This crate's version identification string, sent as part of `V_C`
/// hash input (the banner I/O itself is out of scope, see
/// SPEC_FULL.md §1/§3 — callers perform the exchange and pass the
/// stripped strings in).
pub const PROTOCOL_ID: &str = concat!("SSH-2.0-", env!("CARGO_PKG_NAME"), "_", env!("CARGO_PKG_VERSION"));

/// A client-side session configuration: timeout and enabled algorithms.
#[derive(Debug, Clone)]
pub struct Client {
    /// Timeout applied to every packet send/receive.
    pub timeout: StdDuration,

    /// Algorithms this client is willing to negotiate, most-preferred
    /// first in each category.
    pub algorithms: Algorithms,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            timeout: StdDuration::from_secs(120),
            algorithms: Algorithms::default(),
        }
    }
}

impl Client {
    pub(crate) fn timeout(&self) -> Duration {
        self.timeout.into()
    }

    /// Build a fresh `KEXINIT` payload from this configuration, with a
    /// freshly-drawn random cookie.
    pub fn kexinit(&self) -> KexInit {
        let mut cookie = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut cookie);

        KexInit {
            cookie,
            kex_algorithms: self.algorithms.kexs.clone(),
            server_host_key_algorithms: self.algorithms.host_keys.clone(),
            encryption_algorithms_client_to_server: self.algorithms.ciphers.clone(),
            encryption_algorithms_server_to_client: self.algorithms.ciphers.clone(),
            mac_algorithms_client_to_server: self.algorithms.macs.clone(),
            mac_algorithms_server_to_client: self.algorithms.macs.clone(),
            compression_algorithms_client_to_server: self.algorithms.compressions.clone(),
            compression_algorithms_server_to_client: self.algorithms.compressions.clone(),
            languages_client_to_server: Vec::new(),
            languages_server_to_client: Vec::new(),
            first_kex_packet_follows: false,
        }
    }
}

/// Enabled algorithms for a client-side session, ordered by preference.
#[derive(Debug, Clone)]
pub struct Algorithms {
    /// Key-exchange method names.
    pub kexs: Vec<String>,
    /// Host-key (signature) algorithm names.
    pub host_keys: Vec<String>,
    /// Cipher names (used for both directions).
    pub ciphers: Vec<String>,
    /// MAC names (used for both directions).
    pub macs: Vec<String>,
    /// Compression method names (used for both directions).
    pub compressions: Vec<String>,
}

impl Default for Algorithms {
    fn default() -> Self {
        Self {
            kexs: owned(&[
                "diffie-hellman-group14-sha1",
                "diffie-hellman-group1-sha1",
            ]),
            host_keys: owned(&["ssh-ed25519", "rsa-sha2-512", "rsa-sha2-256", "ssh-rsa"]),
            ciphers: owned(&[
                "aes256-ctr",
                "aes192-ctr",
                "aes128-ctr",
                "aes256-cbc",
                "aes192-cbc",
                "aes128-cbc",
                "3des-cbc",
            ]),
            macs: owned(&["hmac-sha2-512", "hmac-sha2-256", "hmac-sha1"]),
            compressions: owned(&["none"]),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
