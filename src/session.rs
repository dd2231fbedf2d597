//! Client-side session state: the issued credential and the role derived
//! from it, held in memory and mirrored to a single durable file slot so a
//! sign-in survives process restarts until an explicit logout.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::token::{decode_claims, Claims, Role};

/// File name of the durable credential slot inside the state directory.
pub const CREDENTIAL_SLOT: &str = "credential";

/// A signed-in session. The role is always read out of the decoded claims,
/// never stored separately, so credential and role cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
}

impl Session {
    pub fn role(&self) -> Role {
        self.claims.role
    }
    pub fn username(&self) -> &str {
        &self.claims.sub
    }
}

struct Inner {
    loaded: bool,
    session: Option<Session>,
}

/// In-memory session with one durable slot on disk. The only writers are the
/// sign-in success path (`set`) and logout (`clear`); each swaps credential
/// and derived role in a single transition, so a concurrent reader never
/// observes one without the other.
pub struct SessionStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(CREDENTIAL_SLOT),
            inner: RwLock::new(Inner { loaded: false, session: None }),
        }
    }

    /// Decode and install a freshly issued credential, overwriting the
    /// durable slot. On decode failure the store is left untouched and the
    /// failure is returned to the caller.
    pub fn set(&self, token: &str) -> ApiResult<Session> {
        let claims = decode_claims(token)?;
        let session = Session { token: token.to_string(), claims };
        // slot write happens under the same lock as the memory swap, so
        // racing setters cannot leave disk and memory disagreeing
        let mut inner = self.inner.write();
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| ApiError::io(e.to_string()))?;
        }
        fs::write(&self.path, token).map_err(|e| ApiError::io(e.to_string()))?;
        inner.session = Some(session.clone());
        inner.loaded = true;
        debug!("session installed for '{}' ({})", session.username(), session.role());
        Ok(session)
    }

    /// Current session, rehydrating once from the durable slot on first use.
    /// A missing, malformed or expired persisted credential reads as no
    /// session; startup never fails on a bad slot.
    pub fn current(&self) -> Option<Session> {
        {
            let inner = self.inner.read();
            if inner.loaded {
                return inner.session.clone();
            }
        }
        let mut inner = self.inner.write();
        if !inner.loaded {
            inner.session = self.restore();
            inner.loaded = true;
        }
        inner.session.clone()
    }

    fn restore(&self) -> Option<Session> {
        let token = match fs::read_to_string(&self.path) {
            Ok(t) => t.trim().to_string(),
            Err(_) => return None,
        };
        if token.is_empty() {
            return None;
        }
        match decode_claims(&token) {
            Ok(claims) => {
                debug!("session restored for '{}' from {}", claims.sub, self.path.display());
                Some(Session { token, claims })
            }
            Err(e) => {
                debug!("persisted credential rejected ({e}); starting signed out");
                None
            }
        }
    }

    /// Forget the session in memory and remove the durable copy.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("failed to remove persisted credential: {e}");
            }
        }
        inner.session = None;
        inner.loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tempfile::tempdir;

    fn forge(sub: &str, role: Role, exp: i64) -> String {
        let claims = Claims { sub: sub.into(), role, exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
    }

    fn fresh(sub: &str, role: Role) -> String {
        forge(sub, role, chrono::Utc::now().timestamp() + 3600)
    }

    #[test]
    fn set_then_current_is_mutually_consistent() {
        let tmp = tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        let installed = store.set(&fresh("alice", Role::Admin)).unwrap();
        let current = store.current().unwrap();
        assert_eq!(current, installed);
        assert_eq!(current.role(), Role::Admin);
        assert_eq!(current.username(), "alice");
        assert_eq!(current.role(), current.claims.role);
    }

    #[test]
    fn set_with_bad_credential_leaves_store_unchanged() {
        let tmp = tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        store.set(&fresh("alice", Role::User)).unwrap();

        let err = store.set("garbage").unwrap_err();
        assert_eq!(err.kind(), "decode");
        let current = store.current().unwrap();
        assert_eq!(current.username(), "alice");
        assert_eq!(current.role(), Role::User);
    }

    #[test]
    fn clear_empties_memory_and_disk() {
        let tmp = tempdir().unwrap();
        let store = SessionStore::new(tmp.path());
        store.set(&fresh("alice", Role::User)).unwrap();
        store.clear();
        assert!(store.current().is_none());
        assert!(!tmp.path().join(CREDENTIAL_SLOT).exists());
        // clearing an already-empty store is fine
        store.clear();
        assert!(store.current().is_none());
    }

    #[test]
    fn racing_sets_keep_memory_and_disk_consistent() {
        use std::sync::Arc;

        let tmp = tempdir().unwrap();
        let store = Arc::new(SessionStore::new(tmp.path()));
        let first = fresh("alice", Role::User);
        let second = fresh("root", Role::Admin);

        let handles: Vec<_> = [first, second]
            .into_iter()
            .map(|token| {
                let store = store.clone();
                std::thread::spawn(move || store.set(&token).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // whichever set won, the durable slot holds the same credential
        let current = store.current().unwrap();
        let persisted = std::fs::read_to_string(tmp.path().join(CREDENTIAL_SLOT)).unwrap();
        assert_eq!(current.token, persisted.trim());
    }

    #[test]
    fn rehydrates_from_durable_slot() {
        let tmp = tempdir().unwrap();
        let token = fresh("bob", Role::User);
        SessionStore::new(tmp.path()).set(&token).unwrap();

        // fresh process: new store over the same state dir
        let store = SessionStore::new(tmp.path());
        let restored = store.current().unwrap();
        assert_eq!(restored.token, token);
        assert_eq!(restored.role(), Role::User);
    }

    #[test]
    fn malformed_persisted_credential_reads_as_no_session() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join(CREDENTIAL_SLOT), "corrupted nonsense").unwrap();
        let store = SessionStore::new(tmp.path());
        assert!(store.current().is_none());
    }

    #[test]
    fn expired_persisted_credential_reads_as_no_session() {
        let tmp = tempdir().unwrap();
        let stale = forge("alice", Role::Admin, chrono::Utc::now().timestamp() - 3600);
        std::fs::write(tmp.path().join(CREDENTIAL_SLOT), stale).unwrap();
        let store = SessionStore::new(tmp.path());
        assert!(store.current().is_none());
    }

    #[test]
    fn missing_state_dir_reads_as_no_session() {
        let tmp = tempdir().unwrap();
        let store = SessionStore::new(&tmp.path().join("never-created"));
        assert!(store.current().is_none());
    }
}
