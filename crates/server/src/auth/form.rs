//! HTML form login with a session cookie.
//!
//! `POST {login_path}` with the configured username/password fields issues a
//! session cookie and redirects. Page requests carrying a live token (cookie
//! or `Authorization: Bearer`) pass; anything else is sent to the login page.

use axum::http::{Method, StatusCode};
use axum_extra::extract::cookie::Cookie;
use modemsim_common::config::FormAuthConfig;
use modemsim_common::{AuthType, Credentials};
use tracing::{debug, info};

use super::session::SessionStore;
use super::types::{AuthRequest, AuthResult, Session};
use super::AuthHandler;
use crate::responses;

pub struct FormAuth {
    config: FormAuthConfig,
    credentials: Credentials,
    sessions: SessionStore,
    /// Answer `GET {login_path}` with the built-in form (no fixture declared)
    serve_login_form: bool,
}

impl FormAuth {
    pub fn new(
        config: FormAuthConfig,
        credentials: Credentials,
        session_ttl_secs: i64,
        serve_login_form: bool,
    ) -> Self {
        Self {
            config,
            credentials,
            sessions: SessionStore::new(session_ttl_secs),
            serve_login_form,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn presented_token<'a>(&self, req: &'a AuthRequest) -> Option<&'a str> {
        req.cookie(&self.config.cookie_name)
            .or_else(|| req.bearer_token())
    }

    fn session_cookie(&self, token: &str) -> String {
        Cookie::build((self.config.cookie_name.clone(), token.to_string()))
            .path("/")
            .http_only(true)
            .build()
            .to_string()
    }

    fn cleared_cookie(&self) -> String {
        let mut cookie = Cookie::build((self.config.cookie_name.clone(), String::new()))
            .path("/")
            .build();
        cookie.make_removal();
        cookie.to_string()
    }

    fn login(&self, req: &AuthRequest) -> AuthResult {
        let fields = req.form_fields();
        let username = fields.get(&self.config.username_field);
        let password = fields.get(&self.config.password_field);

        match (username, password) {
            (Some(u), Some(p)) if *u == self.credentials.username && *p == self.credentials.password => {
                let session = self.sessions.issue();
                info!("Form login succeeded for {}", u);
                AuthResult::Challenge(responses::redirect_with_cookie(
                    &self.config.success_redirect,
                    Some(self.session_cookie(&session.token)),
                ))
            }
            _ => {
                debug!("Form login rejected");
                AuthResult::Rejected(responses::login_form(
                    &self.config,
                    StatusCode::UNAUTHORIZED,
                    Some("Invalid username or password"),
                ))
            }
        }
    }

    fn logout(&self, req: &AuthRequest) -> AuthResult {
        if let Some(token) = self.presented_token(req) {
            if self.sessions.remove(token) {
                info!("Form session logged out");
            }
        }
        AuthResult::Challenge(responses::redirect_with_cookie(
            &self.config.login_path,
            Some(self.cleared_cookie()),
        ))
    }
}

impl AuthHandler for FormAuth {
    fn auth_type(&self) -> AuthType {
        AuthType::Form
    }

    fn is_protocol_request(&self, req: &AuthRequest) -> bool {
        if req.path == self.config.logout_path {
            return true;
        }
        req.path == self.config.login_path && (req.method == Method::POST || self.serve_login_form)
    }

    fn handle(&self, req: &AuthRequest) -> AuthResult {
        if req.path == self.config.login_path {
            return match req.method {
                Method::POST => self.login(req),
                _ if self.serve_login_form => AuthResult::Challenge(responses::login_form(
                    &self.config,
                    StatusCode::OK,
                    None,
                )),
                // the device's own login page is always reachable
                _ => AuthResult::Authorized(Session::anonymous()),
            };
        }
        if req.path == self.config.logout_path {
            return self.logout(req);
        }

        match self.presented_token(req).and_then(|t| self.sessions.get_valid(t)) {
            Some(session) => AuthResult::Authorized(session),
            None => AuthResult::Challenge(responses::redirect(&self.config.login_path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue, Uri};
    use bytes::Bytes;

    fn auth() -> FormAuth {
        FormAuth::new(FormAuthConfig::default(), Credentials::default(), 60, true)
    }

    fn post_login(body: &'static str) -> AuthRequest {
        AuthRequest::new(
            Method::POST,
            &Uri::from_static("/login"),
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    fn with_cookie(path: &'static str, cookie: &str) -> AuthRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        AuthRequest::new(Method::GET, &Uri::from_static(path), headers, Bytes::new())
    }

    fn issued_token(result: AuthResult) -> String {
        let AuthResult::Challenge(resp) = result else {
            panic!("expected login redirect");
        };
        assert_eq!(resp.status(), StatusCode::FOUND);
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        let (pair, _) = cookie.split_once(';').unwrap();
        pair.strip_prefix("session=").unwrap().to_string()
    }

    #[test]
    fn test_login_issues_usable_token() {
        let auth = auth();
        let token = issued_token(auth.handle(&post_login("username=admin&password=password")));

        let result = auth.handle(&with_cookie("/status.html", &format!("session={token}")));
        assert!(result.is_authorized());
    }

    #[test]
    fn test_unauthenticated_page_redirects_to_login() {
        let auth = auth();
        match auth.handle(&AuthRequest::get("/status.html")) {
            AuthResult::Challenge(resp) => {
                assert_eq!(resp.status(), StatusCode::FOUND);
                assert_eq!(resp.headers()[header::LOCATION], "/login");
            }
            other => panic!("expected challenge, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_credentials_rejected() {
        let auth = auth();
        for body in [
            "username=admin&password=wrong",
            "username=Admin&password=password",
            "username=admin",
            "",
        ] {
            match auth.handle(&post_login(body)) {
                AuthResult::Rejected(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
                other => panic!("expected rejection for {body:?}, got {other:?}"),
            }
        }
        assert!(auth.sessions().is_empty());
    }

    #[test]
    fn test_forged_token_redirects() {
        let auth = auth();
        assert!(!auth.handle(&with_cookie("/status.html", "session=forged")).is_authorized());
    }

    #[test]
    fn test_logout_invalidates_session() {
        let auth = auth();
        let token = issued_token(auth.handle(&post_login("username=admin&password=password")));
        let cookie = format!("session={token}");

        assert!(auth.is_protocol_request(&with_cookie("/logout", &cookie)));
        assert!(matches!(auth.handle(&with_cookie("/logout", &cookie)), AuthResult::Challenge(_)));
        assert!(!auth.handle(&with_cookie("/status.html", &cookie)).is_authorized());
    }

    #[test]
    fn test_declared_login_page_is_reachable() {
        let auth = FormAuth::new(FormAuthConfig::default(), Credentials::default(), 60, false);
        let req = AuthRequest::get("/login");
        assert!(!auth.is_protocol_request(&req));
        assert!(auth.handle(&req).is_authorized());
    }
}
