use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesystemConfig {
    /// Starting directory of every workspace.
    #[serde(default = "default_home")]
    pub home: PathBuf,
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_login")]
    pub login: String,
    /// Argon2 PHC string. Empty means "admin", hashed at startup.
    #[serde(default)]
    pub password_hash: String,
    /// HS256 key for the session cookie.
    #[serde(default)]
    pub cookie_secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
}

/// Which connections share a cursor and clipboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionScope {
    /// One workspace for the whole process.
    #[default]
    Global,
    /// One workspace per login (session token id).
    Login,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub scope: SessionScope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_rpm")]
    pub login_requests_per_minute: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

const DEFAULT_LOGIN: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}
fn default_login() -> String {
    DEFAULT_LOGIN.to_string()
}
fn default_session_ttl_hours() -> u64 { 24 }
fn default_login_rpm() -> u32 { 5 }
fn default_max_upload_size_mb() -> usize { 100 }

fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            max_upload_size_mb: default_max_upload_size_mb(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login: default_login(),
            password_hash: String::new(),
            cookie_secret: String::new(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { login_requests_per_minute: default_login_rpm() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            filesystem: FilesystemConfig::default(),
            auth: AuthConfig::default(),
            session: SessionConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.filesystem.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// Reads the TOML file named by `SFM_CONFIG` (if any), applies `SFM_*`
    /// environment overrides and fills in generated secrets.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("SFM_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.finalize()?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (environment variables in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("SFM_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Some(ip) = lookup("SFM_SERVER_ADDRESS") {
            let ip: IpAddr = ip.parse()?;
            self.bind_addr.set_ip(ip);
        }
        if let Some(port) = lookup("SFM_SERVER_PORT") {
            self.bind_addr.set_port(port.parse()?);
        }

        if let Some(home) = lookup("SFM_HOME") {
            self.filesystem.home = PathBuf::from(home);
        }
        if let Some(val) = lookup("SFM_MAX_UPLOAD_SIZE_MB") {
            if let Ok(mb) = val.parse::<usize>() {
                self.filesystem.max_upload_size_mb = mb;
            }
        }

        if let Some(login) = lookup("SFM_LOGIN") {
            self.auth.login = login;
        }
        if let Some(hash) = lookup("SFM_PASSWORD_HASH") {
            self.auth.password_hash = hash;
        }
        if let Some(secret) = lookup("SFM_COOKIE_SECRET") {
            self.auth.cookie_secret = secret;
        }

        if let Some(scope) = lookup("SFM_SESSION_SCOPE") {
            self.session.scope = match scope.to_ascii_lowercase().as_str() {
                "global" => SessionScope::Global,
                "login" => SessionScope::Login,
                other => anyhow::bail!("unknown session scope: {other} (expected global or login)"),
            };
        }

        if let Some(cert) = lookup("SFM_TLS_CERT") {
            self.tls.cert_path = Some(cert);
        }
        if let Some(key) = lookup("SFM_TLS_KEY") {
            self.tls.key_path = Some(key);
        }

        Ok(())
    }

    /// Validates the home directory, generates missing secrets and rejects
    /// placeholder ones.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        if !self.filesystem.home.is_absolute() {
            anyhow::bail!(
                "Home directory must be an absolute path, got {}",
                self.filesystem.home.display()
            );
        }

        if self.auth.cookie_secret.is_empty() {
            self.auth.cookie_secret = format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            );
            tracing::warn!(
                "No cookie secret configured. Generated random secret (sessions end on restart)."
            );
        }

        const WEAK_SECRETS: &[&str] = &[
            "change-me-to-a-random-secret",
            "1234567890qwerty",
            "secret",
            "password",
            "cookie-secret",
        ];
        if WEAK_SECRETS.iter().any(|&w| self.auth.cookie_secret == w) {
            anyhow::bail!(
                "Cookie secret matches a known weak/placeholder value. \
                 Set a strong random secret via SFM_COOKIE_SECRET."
            );
        }
        if self.auth.cookie_secret.len() < 32 {
            tracing::warn!(
                "Cookie secret is shorter than 32 characters. \
                 Consider using a stronger secret via SFM_COOKIE_SECRET."
            );
        }

        if self.auth.password_hash.is_empty() {
            self.auth.password_hash = crate::auth::password::hash_password(DEFAULT_PASSWORD)?;
            tracing::warn!(
                "No password hash configured. Login is {} / {DEFAULT_PASSWORD}; \
                 set SFM_PASSWORD_HASH (see sfm-hash-password).",
                self.auth.login
            );
        }

        if self.bind_addr.ip().is_unspecified() && !self.tls_enabled() {
            tracing::warn!(
                "Listening on all interfaces ({}) without TLS; credentials travel in clear text.",
                self.bind_addr
            );
        }

        Ok(())
    }
}
