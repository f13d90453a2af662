//! Session state ownership for the server.
//!
//! Each workspace is one [`SessionState`] behind a mutex. With the `global`
//! scope every connection shares a single workspace; with `login` scope
//! each session token gets its own, kept until the token is released or
//! expires. Commands against one workspace run strictly one at a time.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use sfm_core::{Dispatcher, Envelope, SessionState};

use crate::auth::middleware::AuthUser;
use crate::config::SessionScope;

pub type SharedSession = Arc<Mutex<SessionState>>;

const GLOBAL_KEY: &str = "*";

struct Workspace {
    session: SharedSession,
    /// Unix seconds after which nobody can reach this workspace any more.
    expires_at: u64,
}

pub struct WorkspaceRegistry {
    scope: SessionScope,
    home: PathBuf,
    sessions: DashMap<String, Workspace>,
}

impl WorkspaceRegistry {
    pub fn new(scope: SessionScope, home: PathBuf) -> Self {
        Self {
            scope,
            home,
            sessions: DashMap::new(),
        }
    }

    /// Returns the workspace `user` operates in, creating it at home on
    /// first use.
    pub fn session_for(&self, user: &AuthUser) -> SharedSession {
        let (key, expires_at) = match self.scope {
            SessionScope::Global => (GLOBAL_KEY, u64::MAX),
            SessionScope::Login => (user.jti.as_str(), user.exp),
        };
        self.sessions
            .entry(key.to_string())
            .or_insert_with(|| Workspace {
                session: Arc::new(Mutex::new(SessionState::new(&self.home))),
                expires_at,
            })
            .session
            .clone()
    }

    /// Drops the per-login workspace of `jti`. The global workspace lives
    /// as long as the process.
    pub fn release(&self, jti: &str) {
        if self.scope == SessionScope::Login {
            self.sessions.remove(jti);
        }
    }

    /// Drops workspaces whose session token expired at or before `now`.
    /// Returns how many were dropped.
    pub fn purge_expired(&self, now: u64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, workspace| workspace.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Locks a workspace. A poisoned lock is recovered: the state is plain data
/// and every operation leaves it consistent.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, SessionState> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current directory of a workspace, read under its lock.
pub fn current_directory(session: &SharedSession) -> PathBuf {
    lock(session).current_directory().to_path_buf()
}

/// Runs one command frame on a blocking thread while holding the
/// workspace lock for the whole operation.
pub async fn dispatch(
    dispatcher: Arc<Dispatcher>,
    session: SharedSession,
    frame: String,
) -> Result<Envelope, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || {
        let mut state = lock(&session);
        dispatcher.dispatch(&mut state, &frame)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(jti: &str) -> AuthUser {
        expiring_user(jti, u64::MAX)
    }

    fn expiring_user(jti: &str, exp: u64) -> AuthUser {
        AuthUser {
            sub: "admin".into(),
            jti: jti.into(),
            exp,
        }
    }

    #[test]
    fn global_scope_shares_one_workspace() {
        let registry = WorkspaceRegistry::new(SessionScope::Global, PathBuf::from("/srv"));
        let a = registry.session_for(&user("a"));
        let b = registry.session_for(&user("b"));

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        registry.release("a");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn login_scope_isolates_workspaces() {
        let registry = WorkspaceRegistry::new(SessionScope::Login, PathBuf::from("/srv"));
        let a = registry.session_for(&user("a"));
        let b = registry.session_for(&user("b"));

        assert!(!Arc::ptr_eq(&a, &b));
        lock(&a).chdir("", "sub");
        assert_eq!(current_directory(&a), PathBuf::from("/srv/sub"));
        assert_eq!(current_directory(&b), PathBuf::from("/srv"));

        registry.release("a");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn purge_drops_expired_login_workspaces() {
        let registry = WorkspaceRegistry::new(SessionScope::Login, PathBuf::from("/srv"));
        registry.session_for(&expiring_user("old", 100));
        let live = registry.session_for(&expiring_user("live", 300));

        assert_eq!(registry.purge_expired(200), 1);
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&live, &registry.session_for(&expiring_user("live", 300))));
    }

    #[test]
    fn purge_keeps_global_workspace() {
        let registry = WorkspaceRegistry::new(SessionScope::Global, PathBuf::from("/srv"));
        registry.session_for(&expiring_user("a", 100));

        assert_eq!(registry.purge_expired(u64::MAX - 1), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let registry = WorkspaceRegistry::new(SessionScope::Global, PathBuf::from("/srv"));
        let session = registry.session_for(&user("a"));
        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(session.is_poisoned());
        assert_eq!(current_directory(&session), PathBuf::from("/srv"));
    }

    #[tokio::test]
    async fn dispatch_runs_against_workspace() {
        let registry = WorkspaceRegistry::new(SessionScope::Global, PathBuf::from("/srv"));
        let session = registry.session_for(&user("a"));

        let envelope = dispatch(
            Arc::new(Dispatcher::new()),
            session.clone(),
            r#"{"do": "chdir", "path": "", "name": "../etc"}"#.to_string(),
        )
        .await
        .unwrap();

        assert_eq!(envelope.action(), Some("chdir"));
        assert_eq!(current_directory(&session), PathBuf::from("/etc"));
    }
}
