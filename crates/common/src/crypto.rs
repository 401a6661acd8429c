//! Cryptographic helpers for the HNAP handshake
//!
//! HNAP devices derive everything from one keyed digest rendered as upper-case
//! hex:
//!
//! ```text
//! private_key    = HMAC(public_key + password, challenge)
//! login_password = HMAC(private_key, challenge)
//! HNAP_AUTH      = HMAC(private_key, timestamp + soap_action) + " " + timestamp
//! ```

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};

/// Digest used for HNAP keyed hashes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HmacAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl HmacAlgorithm {
    /// Upper-case hex HMAC of `msg` under `key`.
    ///
    /// Returns `None` only if the MAC rejects the key, which HMAC never does.
    pub fn hex(&self, key: &[u8], msg: &[u8]) -> Option<String> {
        let digest = match self {
            HmacAlgorithm::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key).ok()?;
                mac.update(msg);
                mac.finalize().into_bytes().to_vec()
            }
            HmacAlgorithm::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(key).ok()?;
                mac.update(msg);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Some(hex::encode_upper(digest))
    }
}

/// `n` random bytes as upper-case hex
pub fn random_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}

/// Session key derived from the server's public key, the password and the challenge.
pub fn hnap_private_key(
    algorithm: HmacAlgorithm,
    public_key: &str,
    password: &str,
    challenge: &str,
) -> Option<String> {
    let key = format!("{public_key}{password}");
    algorithm.hex(key.as_bytes(), challenge.as_bytes())
}

/// Value the client must send as `LoginPassword`.
pub fn hnap_login_password(
    algorithm: HmacAlgorithm,
    private_key: &str,
    challenge: &str,
) -> Option<String> {
    algorithm.hex(private_key.as_bytes(), challenge.as_bytes())
}

/// Request signature carried in the first half of the `HNAP_AUTH` header.
pub fn hnap_auth_signature(
    algorithm: HmacAlgorithm,
    private_key: &str,
    timestamp: &str,
    soap_action: &str,
) -> Option<String> {
    let msg = format!("{timestamp}{soap_action}");
    algorithm.hex(private_key.as_bytes(), msg.as_bytes())
}

/// Full `HNAP_AUTH` header value for a request.
pub fn hnap_auth_header(
    algorithm: HmacAlgorithm,
    private_key: &str,
    timestamp: &str,
    soap_action: &str,
) -> Option<String> {
    hnap_auth_signature(algorithm, private_key, timestamp, soap_action)
        .map(|sig| format!("{sig} {timestamp}"))
}
