//! Core types shared across modemsim

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;

/// Login protocol emulated by a mock server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// No login at all.
    None,
    /// HTML form POST with a session cookie.
    Form,
    /// Credentials and session token carried in the query string.
    UrlToken,
    /// HNAP challenge/response handshake with signed requests.
    Hnap,
}

impl AuthType {
    /// All known variants, in declaration order.
    pub const ALL: [AuthType; 4] = [
        AuthType::None,
        AuthType::Form,
        AuthType::UrlToken,
        AuthType::Hnap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::Form => "form",
            AuthType::UrlToken => "url_token",
            AuthType::Hnap => "hnap",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnsupportedAuthType(s.to_string()))
    }
}

/// Identity of one mockable device definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemDescriptor {
    pub manufacturer: String,
    pub model: String,
    /// Modem root directory (holds `modem.yaml` and `fixtures/`)
    pub path: PathBuf,
}

impl fmt::Display for ModemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.manufacturer, self.model, self.path.display())
    }
}
