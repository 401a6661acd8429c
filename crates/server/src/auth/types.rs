//! Core types for the authentication layer.

use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;

/// Session token
pub type SessionToken = String;

/// Server-side state of one logged-in client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub issued_at: i64,
    pub expires_at: i64,
    /// HNAP private key used to check request signatures
    pub private_key: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<SessionToken>, ttl_secs: i64) -> Self {
        let now = now_epoch_secs();
        Self {
            token: token.into(),
            issued_at: now,
            expires_at: now.saturating_add(ttl_secs),
            private_key: None,
        }
    }

    /// Placeholder session for requests that need no login
    pub fn anonymous() -> Self {
        Self {
            token: String::new(),
            issued_at: now_epoch_secs(),
            expires_at: i64::MAX,
            private_key: None,
        }
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of running a request through an auth handler
#[derive(Debug)]
pub enum AuthResult {
    /// Proceed to the page; carries the session that allowed it
    Authorized(Session),
    /// The handler answered with a step of its own login protocol
    /// (login page or redirect, handshake challenge, login result)
    Challenge(Response),
    /// Credentials or session missing, wrong, or expired
    Rejected(Response),
}

impl AuthResult {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthResult::Authorized(_))
    }
}

/// Transport-neutral view of an inbound request
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub cookies: CookieJar,
    pub body: Bytes,
}

impl AuthRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let cookies = CookieJar::from_headers(&headers);
        Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(String::from),
            headers,
            cookies,
            body,
        }
    }

    /// Shorthand for tests and tooling
    pub fn get(path_and_query: &str) -> Self {
        let uri: Uri = path_and_query.parse().unwrap_or_else(|_| Uri::from_static("/"));
        Self::new(Method::GET, &uri, HeaderMap::new(), Bytes::new())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|c| c.value())
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
    }

    /// Raw `&`-separated query items, undecoded
    pub fn query_items(&self) -> impl Iterator<Item = &str> {
        self.query
            .as_deref()
            .unwrap_or("")
            .split('&')
            .filter(|item| !item.is_empty())
    }

    /// First query item starting with `prefix`, with the prefix removed
    pub fn query_item_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.query_items().find_map(|item| item.strip_prefix(prefix))
    }

    /// `application/x-www-form-urlencoded` body fields
    pub fn form_fields(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    /// Full SOAP action URI with surrounding quotes removed
    pub fn soap_action(&self) -> Option<&str> {
        self.header("soapaction").map(|v| v.trim().trim_matches('"'))
    }

    /// HNAP action name: last path segment of the SOAP action
    pub fn hnap_action(&self) -> Option<&str> {
        self.soap_action()
            .and_then(|action| action.rsplit('/').find(|segment| !segment.is_empty()))
    }
}

pub(crate) fn now_epoch_secs() -> i64 {
    Utc::now().timestamp()
}
