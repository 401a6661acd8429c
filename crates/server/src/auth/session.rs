//! Per-handler session table.

use dashmap::DashMap;

use super::types::{now_epoch_secs, Session, SessionToken};

/// Sessions issued by one auth handler instance.
///
/// Never shared between servers and never persisted.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<SessionToken, Session>,
    ttl_secs: i64,
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_secs,
        }
    }

    /// Issue a session under a fresh random token
    pub fn issue(&self) -> Session {
        self.issue_with_token(hex::encode(rand::random::<[u8; 16]>()))
    }

    /// Issue a session under a caller-chosen token, replacing any previous one
    pub fn issue_with_token(&self, token: impl Into<SessionToken>) -> Session {
        let session = Session::new(token, self.ttl_secs);
        self.insert(session.clone());
        session
    }

    /// Store a session, dropping any that have expired
    pub fn insert(&self, session: Session) {
        self.prune_expired();
        self.sessions.insert(session.token.clone(), session);
    }

    /// Remove every expired session
    pub fn prune_expired(&self) {
        let now = now_epoch_secs();
        self.sessions.retain(|_, s| !s.is_expired_at(now));
    }

    /// Look up a live session; an expired one is dropped and reported missing.
    pub fn get_valid(&self, token: &str) -> Option<Session> {
        if token.is_empty() {
            return None;
        }
        let session = self.sessions.get(token).map(|s| s.value().clone())?;
        if session.is_expired_at(now_epoch_secs()) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_lookup() {
        let store = SessionStore::new(60);
        let session = store.issue();
        assert_eq!(session.token.len(), 32);
        assert_eq!(store.get_valid(&session.token), Some(session.clone()));
        assert!(store.get_valid("unknown").is_none());
        assert!(store.get_valid("").is_none());
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(60);
        let mut session = Session::new("old", 60);
        session.expires_at = session.issued_at - 1;
        store.insert(session);

        assert_eq!(store.len(), 1);
        assert!(store.get_valid("old").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_abandoned_sessions_pruned_on_issue() {
        let store = SessionStore::new(60);
        for i in 0..100 {
            let mut session = Session::new(format!("stale-{i}"), 60);
            session.expires_at = session.issued_at - 1;
            store.insert(session);
        }
        assert_eq!(store.len(), 1);

        let fresh = store.issue();
        assert_eq!(store.len(), 1);
        assert!(store.get_valid(&fresh.token).is_some());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(60);
        let session = store.issue_with_token("abc");
        assert!(store.remove(&session.token));
        assert!(!store.remove(&session.token));
        assert!(store.get_valid("abc").is_none());
    }
}
