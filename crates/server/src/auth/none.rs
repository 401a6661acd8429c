//! Devices with no login at all.

use modemsim_common::AuthType;

use super::types::{AuthRequest, AuthResult, Session};
use super::AuthHandler;

/// Authorizes every request and keeps no state
#[derive(Debug, Default)]
pub struct NoAuth;

impl AuthHandler for NoAuth {
    fn auth_type(&self) -> AuthType {
        AuthType::None
    }

    fn handle(&self, _req: &AuthRequest) -> AuthResult {
        AuthResult::Authorized(Session::anonymous())
    }
}
