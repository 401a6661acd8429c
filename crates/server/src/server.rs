//! Mock server implementation

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::Response,
    Router,
};
use modemsim_common::{AuthType, Error, FixtureStore, ModemConfig, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::auth::{build_handler, AuthHandler, AuthRequest, AuthResult};
use crate::responses;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Mock HTTP server for one modem definition
pub struct MockServer {
    state: Arc<ServerState>,
    host: String,
    port: u16,
    running: Option<RunningServer>,
}

/// Shared, read-only request context
struct ServerState {
    modem_path: PathBuf,
    config: ModemConfig,
    auth: Arc<dyn AuthHandler>,
    fixtures: FixtureStore,
}

struct RunningServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

impl MockServer {
    /// Create a server for the modem at `modem_path`.
    ///
    /// `auth_override` replaces the modem's default auth type and is honored
    /// even when the modem does not declare it; it must name a known type.
    pub fn new(
        modem_path: impl AsRef<Path>,
        host: &str,
        port: u16,
        auth_override: Option<&str>,
    ) -> Result<Self> {
        let modem_path = modem_path.as_ref().to_path_buf();
        let config = ModemConfig::load(&modem_path)?;

        let auth_type = match auth_override {
            Some(name) => {
                let auth_type: AuthType = name.parse()?;
                if !config.auth.supports(auth_type) {
                    warn!(
                        "Auth override {} is not declared by {} {}; using it anyway",
                        auth_type, config.manufacturer, config.model
                    );
                }
                auth_type
            }
            None => config.auth.default_type(),
        };

        let state = ServerState {
            auth: build_handler(auth_type, &config),
            fixtures: FixtureStore::for_modem(&modem_path),
            modem_path,
            config,
        };

        Ok(Self {
            state: Arc::new(state),
            host: host.to_string(),
            port,
            running: None,
        })
    }

    pub fn builder(modem_path: impl AsRef<Path>) -> MockServerBuilder {
        MockServerBuilder::new(modem_path)
    }

    pub fn config(&self) -> &ModemConfig {
        &self.state.config
    }

    pub fn modem_path(&self) -> &Path {
        &self.state.modem_path
    }

    /// Auth type in effect for this instance
    pub fn auth_type(&self) -> AuthType {
        self.state.auth.auth_type()
    }

    /// Create router
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(handle_request)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the listener and start serving in the background
    pub async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::Server("server already running".to_string()));
        }

        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port)).await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();

        let signal = shutdown.clone();
        let router = self.router();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        info!(
            "Mock {} {} ({} auth) listening on http://{}",
            self.state.config.manufacturer,
            self.state.config.model,
            self.auth_type(),
            addr
        );
        self.running = Some(RunningServer { addr, shutdown, task });
        Ok(())
    }

    /// Stop serving and release the socket.
    ///
    /// In-flight requests complete first. Safe to call repeatedly or on a
    /// server that never started.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.shutdown.cancel();
        match running.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Mock server on {} exited with error: {}", running.addr, e),
            Err(e) => warn!("Mock server task on {} failed: {}", running.addr, e),
        }
        info!("Mock server on {} stopped", running.addr);
    }

    /// Serve until `signal` resolves, then stop
    pub async fn run_until<F>(&mut self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        signal.await;
        self.stop().await;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    /// Base URL of the bound listener, e.g. `http://127.0.0.1:8080`
    pub fn url(&self) -> Option<String> {
        self.local_addr().map(|addr| format!("http://{addr}"))
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
        }
    }
}

/// Builder for [`MockServer`]
pub struct MockServerBuilder {
    modem_path: PathBuf,
    host: String,
    port: u16,
    auth_type: Option<String>,
}

impl MockServerBuilder {
    pub fn new(modem_path: impl AsRef<Path>) -> Self {
        Self {
            modem_path: modem_path.as_ref().to_path_buf(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auth_type: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Port to bind; `0` picks a free one
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn auth_type(mut self, auth_type: impl Into<String>) -> Self {
        self.auth_type = Some(auth_type.into());
        self
    }

    pub fn build(self) -> Result<MockServer> {
        MockServer::new(&self.modem_path, &self.host, self.port, self.auth_type.as_deref())
    }
}

// ============================================================================
// Request pipeline
// ============================================================================

async fn handle_request(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = AuthRequest::new(method, &uri, headers, body);
    state.respond(&req)
}

impl ServerState {
    fn respond(&self, req: &AuthRequest) -> Response {
        // Login/logout/handshake endpoints belong to the auth protocol.
        if self.auth.is_protocol_request(req) {
            match self.auth.handle(req) {
                AuthResult::Authorized(_) => {}
                AuthResult::Challenge(resp) | AuthResult::Rejected(resp) => return resp,
            }
        }

        let Some((page_key, page)) = self.config.page_for(&req.path, req.hnap_action()) else {
            debug!("No page for {} {}", req.method, req.path);
            return responses::not_found();
        };

        if self.config.is_public(&req.path) {
            debug!("Public page {}", page_key);
        } else {
            match self.auth.handle(req) {
                AuthResult::Authorized(_) => {}
                AuthResult::Challenge(resp) => {
                    debug!("Auth challenge for page {}", page_key);
                    return resp;
                }
                AuthResult::Rejected(resp) => {
                    debug!("Auth rejected for page {}", page_key);
                    return resp;
                }
            }
        }

        match self.fixtures.resolve(&page.fixture) {
            Ok(fixture) => responses::fixture(fixture),
            Err(e) => {
                debug!("Page {}: {}", page_key, e);
                responses::not_found()
            }
        }
    }
}
