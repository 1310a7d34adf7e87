//! Credential resolution
//!
//! The engine authenticates every outbound call with a `(url, key, email)`
//! triple resolved once, at construction, from four possible sources in
//! priority order:
//!
//! 1. the `GRIDFETCH_API_KEY` / `GRIDFETCH_API_URL` / `GRIDFETCH_API_EMAIL`
//!    environment variables (all three required);
//! 2. a credentials file named by `GRIDFETCH_RC_FILE`;
//! 3. the default `~/.gridfetchrc`;
//! 4. anonymous fallback constants.
//!
//! The first fully-specified source wins; sources are never merged. A
//! malformed explicit source (1 or 2) is a fatal configuration error, while
//! the default rc file being absent or malformed falls through to anonymous
//! access: explicit configuration must be correct, the default path is
//! opportunistic.
//!
//! Resolution is a pure function over injected [`EnvSource`] and
//! [`FileSource`] implementations, so it can be tested deterministically
//! without touching the real environment or filesystem.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the API key
pub const ENV_KEY: &str = "GRIDFETCH_API_KEY";
/// Environment variable holding the API base URL
pub const ENV_URL: &str = "GRIDFETCH_API_URL";
/// Environment variable holding the account email
pub const ENV_EMAIL: &str = "GRIDFETCH_API_EMAIL";
/// Environment variable naming an alternate credentials file
pub const ENV_RC_FILE: &str = "GRIDFETCH_RC_FILE";
/// File name of the default per-user credentials file
pub const DEFAULT_RC_FILENAME: &str = ".gridfetchrc";

const ANONYMOUS_KEY: &str = "anonymous";
const ANONYMOUS_URL: &str = "https://api.gridfetch.dev/v1";
const ANONYMOUS_EMAIL: &str = "anonymous@gridfetch.dev";

/// Immutable authentication triple consumed by the transport on every call
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// API base URL
    pub url: String,
    /// API key
    pub key: String,
    /// Account email, sent in the `From` header
    pub email: String,
}

impl Credentials {
    /// Resolve credentials from the real process environment and filesystem.
    pub fn resolve() -> Result<Self> {
        resolve_credentials(&ProcessEnv, &Filesystem)
    }

    /// The fixed identity-less triple granting limited-quality access when
    /// no user credentials are configured. Always available.
    pub fn anonymous() -> Self {
        Self {
            url: ANONYMOUS_URL.to_string(),
            key: ANONYMOUS_KEY.to_string(),
            email: ANONYMOUS_EMAIL.to_string(),
        }
    }
}

/// Read access to environment variables
pub trait EnvSource {
    /// Value of the variable, or None when unset
    fn var(&self, name: &str) -> Option<String>;
}

/// Read access to credential files
pub trait FileSource {
    /// Contents of the file at `path`
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// [`EnvSource`] backed by the process environment
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// [`FileSource`] backed by the real filesystem
pub struct Filesystem;

impl FileSource for Filesystem {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[derive(Deserialize)]
struct RcFile {
    url: String,
    key: String,
    email: String,
}

/// Produce exactly one [`Credentials`] value from the injected sources, or
/// fail with [`Error::Configuration`].
///
/// See the [module docs](self) for the precedence rules.
pub fn resolve_credentials(env: &dyn EnvSource, files: &dyn FileSource) -> Result<Credentials> {
    let non_empty = |name: &str| env.var(name).filter(|v| !v.is_empty());

    // Source 1: the environment triple, all-or-nothing
    match (non_empty(ENV_KEY), non_empty(ENV_URL), non_empty(ENV_EMAIL)) {
        (Some(key), Some(url), Some(email)) => {
            tracing::debug!("using credentials from environment variables");
            return Ok(Credentials { url, key, email });
        }
        (None, None, None) => {}
        _ => {
            return Err(Error::Configuration(format!(
                "incomplete credentials in environment: {ENV_KEY}, {ENV_URL} and {ENV_EMAIL} must all be set"
            )));
        }
    }

    // Source 2: an explicitly named rc file must be valid
    if let Some(path) = non_empty(ENV_RC_FILE) {
        let path = Path::new(&path);
        let text = files.read(path).map_err(|e| {
            Error::Configuration(format!(
                "cannot read credentials file '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), "using credentials file named by {ENV_RC_FILE}");
        return parse_rc(&text, path);
    }

    // Source 3: the default rc file is opportunistic; absent or malformed
    // falls through to anonymous access
    if let Some(path) = default_rc_path(env) {
        if let Ok(text) = files.read(&path) {
            match parse_rc(&text, &path) {
                Ok(credentials) => {
                    tracing::debug!(path = %path.display(), "using default credentials file");
                    return Ok(credentials);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring malformed default credentials file");
                }
            }
        }
    }

    // Source 4: anonymous fallback, always available
    tracing::debug!("no credentials configured, using anonymous access");
    Ok(Credentials::anonymous())
}

fn parse_rc(text: &str, path: &Path) -> Result<Credentials> {
    let rc: RcFile = serde_json::from_str(text).map_err(|e| {
        Error::Configuration(format!(
            "missing or malformed credentials in '{}': {e}",
            path.display()
        ))
    })?;
    Ok(Credentials {
        url: rc.url,
        key: rc.key,
        email: rc.email,
    })
}

fn default_rc_path(env: &dyn EnvSource) -> Option<PathBuf> {
    let home = env
        .var("HOME")
        .filter(|v| !v.is_empty())
        .or_else(|| env.var("USERPROFILE").filter(|v| !v.is_empty()))?;
    Some(PathBuf::from(home).join(DEFAULT_RC_FILENAME))
}
