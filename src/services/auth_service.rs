// ==================== AUTH SESSIONS ====================
// A browser session owns one `AuthClient`: the signed-in identity plus the
// listeners that views register while they are mounted. Sessions live in the
// `SessionRegistry` and are referenced from the browser by a signed token.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use uuid::Uuid;

use super::identity_service::{AuthError, IdentityProvider};
use crate::models::Identity;

pub const SESSION_COOKIE: &str = "cr_session";
const SESSION_ISSUER: &str = "course-recommender";

type Listener = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

pub struct AuthClient {
    provider: Arc<dyn IdentityProvider>,
    current: RwLock<Option<Identity>>,
    listeners: Mutex<BTreeMap<u64, Listener>>,
    next_listener: AtomicU64,
}

impl AuthClient {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            current: RwLock::new(None),
            listeners: Mutex::new(BTreeMap::new()),
            next_listener: AtomicU64::new(0),
        })
    }

    pub async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.create_account(email, password).await?;
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.sign_in(email, password).await?;
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    /// Forgets the local identity. Nothing is revoked at the provider.
    pub fn sign_out(&self) {
        self.set_current(None);
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    /// Registers `listener` and immediately calls it with the current
    /// identity. The listener stays registered until the returned
    /// `Subscription` is dropped or unsubscribed.
    pub fn on_identity_change<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let listener: Listener = Arc::new(listener);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, listener.clone());
        }

        let current = self.current_identity();
        listener(current.as_ref());

        Subscription {
            client: Arc::downgrade(self),
            id,
            active: true,
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn set_current(&self, identity: Option<Identity>) {
        if let Ok(mut current) = self.current.write() {
            *current = identity.clone();
        }

        // Call outside the lock so listeners may touch the client.
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        for listener in listeners {
            listener(identity.as_ref());
        }
    }

    fn remove_listener(&self, id: u64) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
        }
    }
}

/// Handle to a registered identity listener.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    client: Weak<AuthClient>,
    id: u64,
    active: bool,
}

impl Subscription {
    #[cfg(test)]
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(client) = self.client.upgrade() {
            client.remove_listener(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

// ==================== SESSION TOKENS ====================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String, // session id
    pub uid: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("invalid session token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("malformed session id")]
    MalformedId,
}

struct SessionEntry {
    client: Arc<AuthClient>,
    expires_at: DateTime<Utc>,
}

/// Live browser sessions, keyed by session id.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionEntry>,
    provider: Arc<dyn IdentityProvider>,
    secret: String,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(provider: Arc<dyn IdentityProvider>, secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            provider,
            secret: secret.into(),
            ttl,
        }
    }

    /// Fresh, signed-out client for a sign-in or sign-up attempt.
    pub fn new_client(&self) -> Arc<AuthClient> {
        AuthClient::new(self.provider.clone())
    }

    /// Registers a signed-in client and returns its session token.
    pub fn open(&self, client: Arc<AuthClient>) -> Result<String, SessionError> {
        let identity = client.current_identity();
        let uid = identity.map(|i| i.uid).unwrap_or_default();
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = SessionClaims {
            sub: session_id.to_string(),
            uid,
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            iss: SESSION_ISSUER.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(SessionError::Sign)?;

        self.sessions.insert(session_id, SessionEntry { client, expires_at });
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        let mut issuers = HashSet::new();
        issuers.insert(SESSION_ISSUER.to_string());
        validation.iss = Some(issuers);

        decode::<SessionClaims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(SessionError::Invalid)
    }

    /// Resolves a session token to its live client. Invalid, expired or
    /// revoked tokens resolve to `None`.
    pub fn resolve(&self, token: &str) -> Option<Arc<AuthClient>> {
        let claims = match self.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                log::debug!("Rejected session token: {}", e);
                return None;
            }
        };
        let session_id = Uuid::parse_str(&claims.sub).ok()?;
        let entry = self.sessions.get(&session_id)?;
        if entry.expires_at <= Utc::now() {
            return None;
        }
        Some(entry.client.clone())
    }

    /// Signs the session out and forgets it.
    pub fn revoke(&self, token: &str) -> Result<(), SessionError> {
        let claims = self.verify(token)?;
        let session_id = Uuid::parse_str(&claims.sub).map_err(|_| SessionError::MalformedId)?;
        if let Some((_, entry)) = self.sessions.remove(&session_id) {
            entry.client.sign_out();
        }
        Ok(())
    }

    /// Drops sessions past their expiry; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                entry.client.sign_out();
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::identity_service::MemoryIdentityProvider;
    use std::sync::atomic::AtomicUsize;

    pub(crate) fn provider() -> Arc<dyn IdentityProvider> {
        Arc::new(MemoryIdentityProvider::with_cost(4))
    }

    #[tokio::test]
    async fn test_listener_sees_current_and_later_changes() {
        let client = AuthClient::new(provider());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        let subscription = client.on_identity_change(move |identity| {
            log.lock().unwrap().push(identity.map(|i| i.email.clone()));
        });

        client.create_account("a@b.c", "secret123").await.unwrap();
        client.sign_out();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("a@b.c".to_string()), None]
        );
        drop(subscription);
    }

    #[tokio::test]
    async fn test_dropping_subscription_removes_listener() {
        let client = AuthClient::new(provider());
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let subscription = client.on_identity_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(client.listener_count(), 1);

        drop(subscription);
        assert_eq!(client.listener_count(), 0);

        client.create_account("a@b.c", "secret123").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1); // only the initial call
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let client = AuthClient::new(provider());
        let subscription = client.on_identity_change(|_| {});
        subscription.unsubscribe();
        assert_eq!(client.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_session_roundtrip_and_revoke() {
        let registry = SessionRegistry::new(provider(), "test-secret", Duration::hours(1));
        let client = registry.new_client();
        client.create_account("a@b.c", "secret123").await.unwrap();

        let token = registry.open(client).unwrap();
        let resolved = registry.resolve(&token).expect("session should resolve");
        assert_eq!(resolved.current_identity().unwrap().email, "a@b.c");

        registry.revoke(&token).unwrap();
        assert!(registry.resolve(&token).is_none());
        assert!(resolved.current_identity().is_none());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let registry = SessionRegistry::new(provider(), "test-secret", Duration::hours(1));
        let other = SessionRegistry::new(provider(), "other-secret", Duration::hours(1));
        let token = other.open(other.new_client()).unwrap();

        assert!(registry.verify(&token).is_err());
        assert!(registry.resolve(&token).is_none());
        assert!(registry.resolve("not-a-token").is_none());
    }

    #[test]
    fn test_sweep_drops_expired_sessions() {
        let registry = SessionRegistry::new(provider(), "test-secret", Duration::seconds(-1));
        registry.open(registry.new_client()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.sweep_expired(), 1);
        assert_eq!(registry.len(), 0);
    }
}
