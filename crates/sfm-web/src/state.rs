use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use sfm_core::Dispatcher;

use crate::config::ServerConfig;
use crate::workspace::WorkspaceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub workspaces: Arc<WorkspaceRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    /// Revoked session token ids (jti) mapped to the token's expiry (unix
    /// seconds). Tokens in this map are rejected by the auth extractor.
    pub revoked_tokens: Arc<DashMap<String, u64>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let workspaces = WorkspaceRegistry::new(config.session.scope, config.filesystem.home.clone());
        Self {
            config: Arc::new(config),
            workspaces: Arc::new(workspaces),
            dispatcher: Arc::new(Dispatcher::new()),
            revoked_tokens: Arc::new(DashMap::new()),
        }
    }

    /// Revokes a session and drops its workspace (login scope only).
    pub fn revoke(&self, jti: &str, exp: u64) {
        self.revoked_tokens.insert(jti.to_string(), exp);
        self.workspaces.release(jti);
    }

    /// Forgets revocations and per-login workspaces whose tokens have
    /// expired.
    pub fn purge_expired(&self) {
        self.purge_expired_at(unix_now());
    }

    fn purge_expired_at(&self, now: u64) {
        self.revoked_tokens.retain(|_, exp| *exp > now);
        let dropped = self.workspaces.purge_expired(now);
        if dropped > 0 {
            tracing::debug!("Dropped {dropped} expired workspace(s)");
        }
    }
}

/// Current time in unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
