//! Credentials and session token carried in the query string.
//!
//! A client logs in by requesting any declared page with
//! `?{login_prefix}{base64(username:password)}`; the body of the reply is the
//! session token. Later requests append `?{token_prefix}{token}`. No cookies
//! are involved.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use modemsim_common::config::{PagesConfig, UrlTokenAuthConfig};
use modemsim_common::{AuthType, Credentials};
use tracing::{debug, info};

use super::session::SessionStore;
use super::types::{AuthRequest, AuthResult};
use super::AuthHandler;
use crate::responses;

pub struct UrlTokenAuth {
    config: UrlTokenAuthConfig,
    credentials: Credentials,
    /// Pages that accept the login query
    pages: PagesConfig,
    sessions: SessionStore,
}

impl UrlTokenAuth {
    pub fn new(
        config: UrlTokenAuthConfig,
        credentials: Credentials,
        pages: PagesConfig,
        session_ttl_secs: i64,
    ) -> Self {
        Self {
            config,
            credentials,
            pages,
            sessions: SessionStore::new(session_ttl_secs),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// `username:password` from the login query item, if it decodes
    fn decode_credentials(encoded: &str) -> Option<(String, String)> {
        let encoded = urlencoding::decode(encoded).ok()?;
        let raw = STANDARD.decode(encoded.as_bytes()).ok()?;
        let raw = String::from_utf8(raw).ok()?;
        let (user, pass) = raw.split_once(':')?;
        Some((user.to_string(), pass.to_string()))
    }

    fn presented_token<'a>(&self, req: &'a AuthRequest) -> Option<&'a str> {
        req.query_item_with_prefix(&self.config.token_prefix)
            .map(|t| t.trim_end_matches('='))
    }

    fn login(&self, encoded: &str) -> AuthResult {
        match Self::decode_credentials(encoded) {
            Some((user, pass))
                if user == self.credentials.username && pass == self.credentials.password =>
            {
                let session = self.sessions.issue();
                info!("URL token login succeeded for {}", user);
                AuthResult::Challenge(token_response(&session.token))
            }
            _ => {
                debug!("URL token login rejected");
                AuthResult::Rejected(responses::unauthorized())
            }
        }
    }
}

fn token_response(token: &str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        token.to_string(),
    )
        .into_response()
}

impl AuthHandler for UrlTokenAuth {
    fn auth_type(&self) -> AuthType {
        AuthType::UrlToken
    }

    fn is_protocol_request(&self, req: &AuthRequest) -> bool {
        req.path == self.config.logout_path
            || (req.query_item_with_prefix(&self.config.login_prefix).is_some()
                && self.pages.serves(&req.path))
    }

    fn handle(&self, req: &AuthRequest) -> AuthResult {
        if let Some(encoded) = req.query_item_with_prefix(&self.config.login_prefix) {
            return self.login(encoded);
        }

        let session = self
            .presented_token(req)
            .and_then(|t| self.sessions.get_valid(t));

        if req.path == self.config.logout_path {
            return match session {
                Some(session) => {
                    self.sessions.remove(&session.token);
                    info!("URL token session logged out");
                    AuthResult::Challenge((StatusCode::OK, "Logged out").into_response())
                }
                None => AuthResult::Rejected(responses::unauthorized()),
            };
        }

        match session {
            Some(session) => AuthResult::Authorized(session),
            None => AuthResult::Rejected(responses::unauthorized()),
        }
    }
}
