//! Pluggable login protocol emulation.
//!
//! Supports:
//! - `none`: devices without a login
//! - `form`: HTML form POST + session cookie
//! - `url_token`: credentials and token in the query string
//! - `hnap`: HNAP challenge/response with signed requests
//!
//! Each handler owns its own session table, so two servers never share logins.

pub mod form;
pub mod hnap;
pub mod none;
pub mod session;
pub mod types;
pub mod url_token;

use modemsim_common::{AuthType, ModemConfig};
use std::sync::Arc;

pub use form::FormAuth;
pub use hnap::HnapAuth;
pub use none::NoAuth;
pub use session::SessionStore;
pub use types::*;
pub use url_token::UrlTokenAuth;

/// Trait for login protocol handlers
pub trait AuthHandler: Send + Sync {
    /// Protocol this handler emulates
    fn auth_type(&self) -> AuthType;

    /// Whether the request targets the protocol's own endpoints
    /// (login, logout, handshake) rather than a device page
    fn is_protocol_request(&self, _req: &AuthRequest) -> bool {
        false
    }

    /// Decide whether the request may proceed
    fn handle(&self, req: &AuthRequest) -> AuthResult;
}

/// Build the handler for `auth_type` from a modem definition
pub fn build_handler(auth_type: AuthType, config: &ModemConfig) -> Arc<dyn AuthHandler> {
    let auth = &config.auth;
    let credentials = auth.credentials.clone();
    let ttl = auth.session_ttl_secs;

    match auth_type {
        AuthType::None => Arc::new(NoAuth),
        AuthType::Form => {
            let serve_login_form = config.page_for(&auth.form.login_path, None).is_none();
            Arc::new(FormAuth::new(auth.form.clone(), credentials, ttl, serve_login_form))
        }
        AuthType::UrlToken => Arc::new(UrlTokenAuth::new(
            auth.url_token.clone(),
            credentials,
            config.pages.clone(),
            ttl,
        )),
        AuthType::Hnap => Arc::new(HnapAuth::new(auth.hnap.clone(), credentials, ttl)),
    }
}
