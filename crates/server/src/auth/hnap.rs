//! HNAP challenge/response login.
//!
//! Emulates the JSON flavour of HNAP used by Arris/Motorola firmware:
//!
//! 1. `Login` with `Action: request` returns a `Challenge`, a `PublicKey` and
//!    a `Cookie` (the client's `uid`).
//! 2. `Login` with `Action: login` carries
//!    `LoginPassword = HMAC(HMAC(PublicKey + password, Challenge), Challenge)`.
//!    A match turns the pending challenge into a session holding the private
//!    key; a mismatch leaves the pending challenge untouched. Unanswered
//!    challenges expire with the session TTL.
//! 3. Every later call is signed with
//!    `HNAP_AUTH: HMAC(private_key, timestamp + SOAPAction) timestamp`.

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::Cookie;
use dashmap::DashMap;
use modemsim_common::config::HnapAuthConfig;
use modemsim_common::crypto::{self, random_hex};
use modemsim_common::{AuthType, Credentials};
use serde::Deserialize;
use tracing::{debug, info};

use super::session::SessionStore;
use super::types::{now_epoch_secs, AuthRequest, AuthResult, Session};
use super::AuthHandler;
use crate::responses;

/// Cookie carrying the HNAP client id
pub const UID_COOKIE: &str = "uid";
/// Header carrying the request signature
pub const HNAP_AUTH_HEADER: &str = "hnap_auth";

const LOGIN_ACTION: &str = "Login";
const LOGOUT_ACTION: &str = "Logout";

/// Challenge handed out in step 1, awaiting the client's answer
#[derive(Debug, Clone)]
struct PendingChallenge {
    challenge: String,
    public_key: String,
    expires_at: i64,
}

impl PendingChallenge {
    fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginEnvelope {
    login: LoginParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoginParams {
    action: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    login_password: String,
}

pub struct HnapAuth {
    config: HnapAuthConfig,
    credentials: Credentials,
    pending: DashMap<String, PendingChallenge>,
    sessions: SessionStore,
}

impl HnapAuth {
    pub fn new(config: HnapAuthConfig, credentials: Credentials, session_ttl_secs: i64) -> Self {
        Self {
            config,
            credentials,
            pending: DashMap::new(),
            sessions: SessionStore::new(session_ttl_secs),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Number of handshakes waiting for step 2
    pub fn pending_challenges(&self) -> usize {
        self.pending.len()
    }

    fn prune_expired_challenges(&self) {
        let now = now_epoch_secs();
        self.pending.retain(|_, p| !p.is_expired_at(now));
    }

    fn login(&self, req: &AuthRequest) -> AuthResult {
        let params = match serde_json::from_slice::<LoginEnvelope>(&req.body) {
            Ok(envelope) => envelope.login,
            Err(e) => {
                debug!("Malformed HNAP login body: {}", e);
                return AuthResult::Rejected(login_failed());
            }
        };

        match params.action.as_str() {
            "request" => self.issue_challenge(&params),
            "login" => self.verify_login(req, &params),
            other => {
                debug!("Unknown HNAP login action {:?}", other);
                AuthResult::Rejected(login_failed())
            }
        }
    }

    fn issue_challenge(&self, params: &LoginParams) -> AuthResult {
        if params.username != self.credentials.username {
            debug!("HNAP challenge refused for unknown user");
            return AuthResult::Rejected(login_failed());
        }

        self.prune_expired_challenges();
        self.sessions.prune_expired();

        let uid = random_hex(self.config.challenge_bytes);
        let pending = PendingChallenge {
            challenge: random_hex(self.config.challenge_bytes),
            public_key: random_hex(self.config.challenge_bytes),
            expires_at: now_epoch_secs().saturating_add(self.sessions.ttl_secs()),
        };
        let body = serde_json::json!({
            "LoginResponse": {
                "Challenge": pending.challenge,
                "Cookie": uid,
                "PublicKey": pending.public_key,
                "LoginResult": "OK",
            }
        });
        self.pending.insert(uid.clone(), pending);
        debug!("HNAP challenge issued for uid {}", uid);

        AuthResult::Challenge(with_cookie(
            (StatusCode::OK, Json(body)).into_response(),
            uid_cookie(&uid),
        ))
    }

    fn verify_login(&self, req: &AuthRequest, params: &LoginParams) -> AuthResult {
        let Some(uid) = req.cookie(UID_COOKIE) else {
            return AuthResult::Rejected(login_failed());
        };
        let Some(pending) = self.pending.get(uid).map(|p| p.value().clone()) else {
            debug!("HNAP login for uid {} without a challenge", uid);
            return AuthResult::Rejected(login_failed());
        };
        if pending.is_expired_at(now_epoch_secs()) {
            self.pending.remove(uid);
            debug!("HNAP challenge for uid {} expired", uid);
            return AuthResult::Rejected(login_failed());
        }

        let algorithm = self.config.algorithm;
        let private_key = crypto::hnap_private_key(
            algorithm,
            &pending.public_key,
            &self.credentials.password,
            &pending.challenge,
        );
        let expected = private_key
            .as_deref()
            .and_then(|key| crypto::hnap_login_password(algorithm, key, &pending.challenge));

        match (private_key, expected) {
            (Some(private_key), Some(expected))
                if params.username == self.credentials.username
                    && params.login_password == expected =>
            {
                self.pending.remove(uid);
                self.sessions
                    .insert(Session::new(uid, self.sessions.ttl_secs()).with_private_key(&private_key));
                info!("HNAP login succeeded for uid {}", uid);

                let body = serde_json::json!({ "LoginResponse": { "LoginResult": "OK" } });
                AuthResult::Challenge(with_cookie(
                    (StatusCode::OK, Json(body)).into_response(),
                    uid_cookie(uid),
                ))
            }
            _ => {
                debug!("HNAP login password mismatch for uid {}", uid);
                AuthResult::Rejected(login_failed())
            }
        }
    }

    /// Session of a correctly signed request
    fn verify_signature(&self, req: &AuthRequest) -> Option<Session> {
        let session = self.sessions.get_valid(req.cookie(UID_COOKIE)?)?;
        let private_key = session.private_key.as_deref()?;
        let (signature, timestamp) = req.header(HNAP_AUTH_HEADER)?.trim().split_once(' ')?;
        let soap_action = req.soap_action()?;

        let expected =
            crypto::hnap_auth_signature(self.config.algorithm, private_key, timestamp, soap_action)?;
        (signature == expected).then_some(session)
    }
}

fn uid_cookie(uid: &str) -> String {
    Cookie::build((UID_COOKIE, uid.to_string()))
        .path("/")
        .build()
        .to_string()
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    if let Ok(value) = cookie.parse() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

fn login_failed() -> Response {
    let body = serde_json::json!({ "LoginResponse": { "LoginResult": "FAILED" } });
    (StatusCode::OK, Json(body)).into_response()
}

impl AuthHandler for HnapAuth {
    fn auth_type(&self) -> AuthType {
        AuthType::Hnap
    }

    fn is_protocol_request(&self, req: &AuthRequest) -> bool {
        req.method == Method::POST
            && req.path == self.config.endpoint
            && matches!(req.hnap_action(), Some(LOGIN_ACTION | LOGOUT_ACTION))
    }

    fn handle(&self, req: &AuthRequest) -> AuthResult {
        let session = match req.hnap_action() {
            Some(LOGIN_ACTION) if req.path == self.config.endpoint => return self.login(req),
            _ => self.verify_signature(req),
        };

        match (req.hnap_action(), session) {
            (Some(LOGOUT_ACTION), Some(session)) if req.path == self.config.endpoint => {
                self.sessions.remove(&session.token);
                info!("HNAP session {} logged out", session.token);
                let body = serde_json::json!({ "LogoutResponse": { "LogoutResult": "OK" } });
                AuthResult::Challenge((StatusCode::OK, Json(body)).into_response())
            }
            (_, Some(session)) => AuthResult::Authorized(session),
            (_, None) => AuthResult::Rejected(responses::unauthorized()),
        }
    }
}
