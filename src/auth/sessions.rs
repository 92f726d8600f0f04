use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::{distributions::Alphanumeric, Rng};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::authz::{AuthenticatedUser, Identity};

/// Cookie carrying the opaque session token. The token is the only
/// client-supplied value the server trusts.
pub const SESSION_COOKIE: &str = "sid";

const TOKEN_LEN: usize = 48;

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    email: String,
    name: String,
    expires_at: OffsetDateTime,
}

/// In-memory token -> identity map with an absolute (non-sliding) expiry.
/// Sessions live only as long as the process; there is no revocation list
/// beyond deletion. Multiple sessions per user are legal.
#[derive(Clone)]
pub struct SessionStore {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh token bound to the user, expiring at now + TTL.
    pub fn create(&self, user: &User) -> String {
        let token: String = rand::rngs::OsRng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        let session = Session {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            expires_at: OffsetDateTime::now_utc() + self.ttl,
        };
        self.inner
            .write()
            .expect("session store lock poisoned")
            .insert(token.clone(), session);
        debug!(user_id = %user.id, "session created");
        token
    }

    /// Resolve a token to an identity. Unknown and expired tokens both come
    /// back as Anonymous; expired entries are dropped on the way.
    pub fn resolve(&self, token: &str) -> Identity {
        let now = OffsetDateTime::now_utc();
        {
            let sessions = self.inner.read().expect("session store lock poisoned");
            match sessions.get(token) {
                Some(s) if now < s.expires_at => {
                    return Identity::Authenticated(AuthenticatedUser {
                        user_id: s.user_id,
                        email: s.email.clone(),
                        name: s.name.clone(),
                    });
                }
                Some(_) => {}
                None => return Identity::Anonymous,
            }
        }
        self.destroy(token);
        Identity::Anonymous
    }

    /// Remove a token binding. Destroying an absent token is not an error.
    pub fn destroy(&self, token: &str) {
        self.inner
            .write()
            .expect("session store lock poisoned")
            .remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            name: "Ana".into(),
            password: "pw".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn create_then_resolve_returns_the_identity() {
        let store = SessionStore::new(Duration::hours(24));
        let u = user();
        let token = store.create(&u);
        match store.resolve(&token) {
            Identity::Authenticated(a) => {
                assert_eq!(a.user_id, u.id);
                assert_eq!(a.email, u.email);
                assert_eq!(a.name, u.name);
            }
            Identity::Anonymous => panic!("expected authenticated identity"),
        }
    }

    #[test]
    fn unknown_token_is_anonymous() {
        let store = SessionStore::new(Duration::hours(24));
        assert_eq!(store.resolve("no-such-token"), Identity::Anonymous);
    }

    #[test]
    fn expired_token_is_anonymous_and_dropped() {
        // Zero TTL: the session is already past its absolute expiry.
        let store = SessionStore::new(Duration::ZERO);
        let token = store.create(&user());
        assert_eq!(store.resolve(&token), Identity::Anonymous);
        // Lazily removed on resolve.
        assert!(!store
            .inner
            .read()
            .expect("lock")
            .contains_key(&token));
    }

    #[test]
    fn destroy_is_idempotent() {
        let store = SessionStore::new(Duration::hours(24));
        let token = store.create(&user());
        store.destroy(&token);
        store.destroy(&token);
        assert_eq!(store.resolve(&token), Identity::Anonymous);
    }

    #[test]
    fn multiple_sessions_per_user_are_independent() {
        let store = SessionStore::new(Duration::hours(24));
        let u = user();
        let t1 = store.create(&u);
        let t2 = store.create(&u);
        assert_ne!(t1, t2);
        store.destroy(&t1);
        assert_eq!(store.resolve(&t1), Identity::Anonymous);
        assert!(matches!(store.resolve(&t2), Identity::Authenticated(_)));
    }

    #[test]
    fn tokens_are_long_and_alphanumeric() {
        let store = SessionStore::new(Duration::hours(24));
        let token = store.create(&user());
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
