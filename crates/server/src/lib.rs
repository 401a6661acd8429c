//! modemsim mock server
//!
//! Serves a modem's recorded pages over HTTP behind the login protocol the
//! real device speaks.

pub mod auth;
pub mod responses;
pub mod server;

pub use auth::{AuthHandler, AuthRequest, AuthResult};
pub use server::{MockServer, MockServerBuilder};
