//! Modem definition loading
//!
//! Each modem lives in its own directory holding a `modem.yaml` definition and
//! a `fixtures/` tree. Only the fields the mock server consumes are modelled
//! here; unknown keys are ignored so richer definitions still load.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::crypto::HmacAlgorithm;
use crate::fixtures::FixtureStore;
use crate::{AuthType, Error, ModemDescriptor, Result};

/// File name of the modem definition inside a modem directory.
pub const MODEM_CONFIG_FILE: &str = "modem.yaml";

/// Fixed credentials shared by every auth-enabled modem unless overridden.
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "password";

/// Typed modem definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    pub manufacturer: String,
    pub model: String,
    pub auth: AuthConfig,
    #[serde(default)]
    pub pages: PagesConfig,
}

/// Authentication section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Supported login protocols, in preference order
    #[serde(default)]
    pub types: Vec<AuthType>,

    /// Protocol used when no override is given (first of `types` if absent)
    #[serde(default)]
    pub default: Option<AuthType>,

    #[serde(default)]
    pub credentials: Credentials,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    #[serde(default)]
    pub form: FormAuthConfig,

    #[serde(default)]
    pub url_token: UrlTokenAuthConfig,

    #[serde(default)]
    pub hnap: HnapAuthConfig,
}

fn default_session_ttl() -> i64 { 60 * 60 }

impl AuthConfig {
    /// The declared default, falling back to the first declared type.
    pub fn default_type(&self) -> AuthType {
        self.default
            .or_else(|| self.types.first().copied())
            .unwrap_or(AuthType::None)
    }

    pub fn supports(&self, auth_type: AuthType) -> bool {
        self.types.contains(&auth_type)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            types: vec![AuthType::None],
            default: None,
            credentials: Credentials::default(),
            session_ttl_secs: default_session_ttl(),
            form: FormAuthConfig::default(),
            url_token: UrlTokenAuthConfig::default(),
            hnap: HnapAuthConfig::default(),
        }
    }
}

/// Credentials the emulated device accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_username() -> String { DEFAULT_USERNAME.to_string() }
fn default_password() -> String { DEFAULT_PASSWORD.to_string() }

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

/// HTML form login parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormAuthConfig {
    #[serde(default = "default_form_login_path")]
    pub login_path: String,
    #[serde(default = "default_form_logout_path")]
    pub logout_path: String,
    #[serde(default = "default_username_field")]
    pub username_field: String,
    #[serde(default = "default_password_field")]
    pub password_field: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Where a successful login redirects to
    #[serde(default = "default_success_redirect")]
    pub success_redirect: String,
}

fn default_form_login_path() -> String { "/login".to_string() }
fn default_form_logout_path() -> String { "/logout".to_string() }
fn default_username_field() -> String { "username".to_string() }
fn default_password_field() -> String { "password".to_string() }
fn default_cookie_name() -> String { "session".to_string() }
fn default_success_redirect() -> String { "/".to_string() }

impl Default for FormAuthConfig {
    fn default() -> Self {
        Self {
            login_path: default_form_login_path(),
            logout_path: default_form_logout_path(),
            username_field: default_username_field(),
            password_field: default_password_field(),
            cookie_name: default_cookie_name(),
            success_redirect: default_success_redirect(),
        }
    }
}

/// Query-string token login parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlTokenAuthConfig {
    /// Query prefix carrying `base64(username:password)`
    #[serde(default = "default_login_prefix")]
    pub login_prefix: String,
    /// Query prefix carrying the issued session token
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
    #[serde(default = "default_url_token_logout_path")]
    pub logout_path: String,
}

fn default_login_prefix() -> String { "login_".to_string() }
fn default_token_prefix() -> String { "ct_".to_string() }
fn default_url_token_logout_path() -> String { "/logout.html".to_string() }

impl Default for UrlTokenAuthConfig {
    fn default() -> Self {
        Self {
            login_prefix: default_login_prefix(),
            token_prefix: default_token_prefix(),
            logout_path: default_url_token_logout_path(),
        }
    }
}

/// HNAP handshake parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnapAuthConfig {
    #[serde(default = "default_hnap_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub algorithm: HmacAlgorithm,
    /// Random bytes in each challenge and public key
    #[serde(default = "default_challenge_bytes")]
    pub challenge_bytes: usize,
}

fn default_hnap_endpoint() -> String { "/HNAP1/".to_string() }
fn default_challenge_bytes() -> usize { 10 }

impl Default for HnapAuthConfig {
    fn default() -> Self {
        Self {
            endpoint: default_hnap_endpoint(),
            algorithm: HmacAlgorithm::default(),
            challenge_bytes: default_challenge_bytes(),
        }
    }
}

/// Page layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Paths served without authentication
    #[serde(default)]
    pub public: Vec<String>,

    /// Page key -> page definition
    #[serde(default)]
    pub data: BTreeMap<String, PageConfig>,
}

impl PagesConfig {
    /// Whether any declared page answers `path`
    pub fn serves(&self, path: &str) -> bool {
        self.data.values().any(|page| page.matches_path(path))
    }
}

/// A single page served from a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Request path; a trailing `*` matches any suffix
    pub url: String,
    /// Fixture key relative to `fixtures/`
    pub fixture: String,
    /// HNAP action name, for pages sharing the HNAP endpoint
    #[serde(default)]
    pub action: Option<String>,
}

impl PageConfig {
    pub fn matches_path(&self, path: &str) -> bool {
        url_matches(&self.url, path)
    }
}

fn url_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}

/// Raw shape of `modem.yaml` before required fields are checked.
#[derive(Debug, Deserialize)]
struct RawModemConfig {
    manufacturer: Option<String>,
    model: Option<String>,
    auth: Option<AuthConfig>,
    #[serde(default)]
    pages: PagesConfig,
}

impl ModemConfig {
    /// Load `modem.yaml` from a modem directory
    pub fn load(modem_path: &Path) -> Result<Self> {
        let file = modem_path.join(MODEM_CONFIG_FILE);
        if !file.is_file() {
            return Err(Error::config(&file, "file not found"));
        }
        let content = std::fs::read_to_string(&file)
            .map_err(|e| Error::config(&file, e.to_string()))?;
        Self::parse(&content, &file)
    }

    /// Parse and validate a definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, Path::new(MODEM_CONFIG_FILE))
    }

    fn parse(yaml: &str, origin: &Path) -> Result<Self> {
        let raw: RawModemConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::config(origin, e.to_string()))?;

        let manufacturer = required(raw.manufacturer, "manufacturer", origin)?;
        let model = required(raw.model, "model", origin)?;
        let mut auth = raw
            .auth
            .ok_or_else(|| Error::config(origin, "missing required field `auth`"))?;

        let mut seen = BTreeSet::new();
        auth.types.retain(|t| seen.insert(*t));
        if auth.types.is_empty() {
            return Err(Error::config(origin, "`auth.types` must declare at least one type"));
        }
        if let Some(default) = auth.default {
            if !auth.supports(default) {
                return Err(Error::config(
                    origin,
                    format!("`auth.default` ({default}) is not listed in `auth.types`"),
                ));
            }
        }
        if auth.session_ttl_secs <= 0 {
            return Err(Error::config(origin, "`auth.session_ttl_secs` must be positive"));
        }
        if auth.hnap.challenge_bytes == 0 {
            return Err(Error::config(origin, "`auth.hnap.challenge_bytes` must be positive"));
        }

        for (key, page) in &raw.pages.data {
            if !page.url.starts_with('/') {
                return Err(Error::config(
                    origin,
                    format!("page `{key}` url must start with '/': {}", page.url),
                ));
            }
        }

        Ok(Self {
            manufacturer,
            model,
            auth,
            pages: raw.pages,
        })
    }

    /// Find the page serving `path`, optionally narrowed by HNAP action.
    ///
    /// Pages bound to a specific action win over action-less pages on the same
    /// URL.
    pub fn page_for(&self, path: &str, action: Option<&str>) -> Option<(&str, &PageConfig)> {
        let mut fallback = None;
        for (key, page) in &self.pages.data {
            if !page.matches_path(path) {
                continue;
            }
            match (&page.action, action) {
                (Some(wanted), Some(got)) if wanted == got => return Some((key.as_str(), page)),
                (Some(_), _) => {}
                (None, _) => {
                    if fallback.is_none() {
                        fallback = Some((key.as_str(), page));
                    }
                }
            }
        }
        fallback
    }

    /// Whether `path` is served without authentication
    pub fn is_public(&self, path: &str) -> bool {
        self.pages.public.iter().any(|p| url_matches(p, path))
    }

    pub fn descriptor(&self, modem_path: &Path) -> ModemDescriptor {
        ModemDescriptor {
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            path: modem_path.to_path_buf(),
        }
    }
}

fn required(value: Option<String>, field: &str, origin: &Path) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::config(origin, format!("missing required field `{field}`"))),
    }
}

/// Page keys of a modem whose fixture file exists.
///
/// An absent `fixtures/` directory yields an empty set.
pub fn list_modem_fixtures(modem_path: &Path) -> Result<BTreeSet<String>> {
    let config = ModemConfig::load(modem_path)?;
    let store = FixtureStore::for_modem(modem_path);
    if !store.root().is_dir() {
        return Ok(BTreeSet::new());
    }

    Ok(config
        .pages
        .data
        .iter()
        .filter(|(_, page)| store.contains(&page.fixture))
        .map(|(key, _)| key.clone())
        .collect())
}
