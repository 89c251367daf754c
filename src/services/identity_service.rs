// ==================== IDENTITY PROVIDER ====================
// Account creation and password sign-in are delegated to a hosted identity
// provider. `FirebaseIdentityProvider` talks to the Identity Toolkit REST API;
// `MemoryIdentityProvider` keeps accounts in process for development and tests.

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::Identity;

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account already exists for this email")]
    AccountExists,

    #[error("identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

// ==================== FIREBASE (Identity Toolkit REST) ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
struct IdToken {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

/// ID tokens from each user's latest sign-in, refreshed through the Secure
/// Token API once they expire. Firestore requests are authorized with them.
pub struct FirebaseTokens {
    client: reqwest::Client,
    token_url: String,
    api_key: String,
    tokens: DashMap<String, IdToken>,
}

impl FirebaseTokens {
    pub fn new(token_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: token_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            tokens: DashMap::new(),
        }
    }

    /// `expires_in` is the provider's lifetime in seconds, sent as a string.
    pub fn store(&self, uid: &str, id_token: String, refresh_token: String, expires_in: &str) {
        let lifetime = expires_in.trim().parse::<i64>().unwrap_or(0);
        let expires_at = Utc::now() + chrono::Duration::seconds(lifetime - TOKEN_EXPIRY_SKEW_SECS);
        self.tokens.insert(
            uid.to_string(),
            IdToken {
                id_token,
                refresh_token,
                expires_at,
            },
        );
    }

    /// A valid ID token for `uid`, or `None` if the user has not signed in
    /// since this process started.
    pub async fn id_token(&self, uid: &str) -> Result<Option<String>, AuthError> {
        let Some(entry) = self.tokens.get(uid).map(|entry| entry.clone()) else {
            return Ok(None);
        };
        if entry.expires_at > Utc::now() {
            return Ok(Some(entry.id_token));
        }
        self.refresh(uid, &entry.refresh_token).await.map(Some)
    }

    async fn refresh(&self, uid: &str, refresh_token: &str) -> Result<String, AuthError> {
        let url = format!("{}/token", self.token_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(Duration::from_secs(10))
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());
            log::warn!("⚠️  Token refresh failed for user {}: {}", uid, message);
            self.tokens.remove(uid);
            return Err(classify_error(&message));
        }

        let body: RefreshResponse = response.json().await?;
        self.store(uid, body.id_token.clone(), body.refresh_token, &body.expires_in);
        log::debug!("Refreshed ID token for user {}", uid);
        Ok(body.id_token)
    }
}

pub struct FirebaseIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    tokens: Arc<FirebaseTokens>,
}

impl FirebaseIdentityProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, tokens: Arc<FirebaseTokens>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            tokens,
        }
    }

    async fn password_call(&self, action: &str, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, action);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(10))
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(classify_error(&message));
        }

        let body: PasswordResponse = response.json().await?;
        if let (Some(id_token), Some(refresh_token)) = (body.id_token, body.refresh_token) {
            let expires_in = body.expires_in.as_deref().unwrap_or("3600");
            self.tokens.store(&body.local_id, id_token, refresh_token, expires_in);
        }
        let identity = Identity::new(body.local_id, body.email.unwrap_or_else(|| email.to_string()));
        Ok(match body.display_name.filter(|n| !n.is_empty()) {
            Some(name) => identity.with_display_name(name),
            None => identity,
        })
    }
}

/// Maps Identity Toolkit error codes (e.g. `EMAIL_EXISTS`,
/// `INVALID_LOGIN_CREDENTIALS`, `WEAK_PASSWORD : ...`) onto `AuthError`.
fn classify_error(message: &str) -> AuthError {
    let code = message.split([' ', ':']).next().unwrap_or(message);
    match code {
        "EMAIL_EXISTS" => AuthError::AccountExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Rejected(message.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.password_call("signInWithPassword", email, password).await
    }
}

// ==================== IN-MEMORY ====================

struct Account {
    uid: String,
    password_hash: String,
}

pub struct MemoryIdentityProvider {
    accounts: DashMap<String, Account>,
    cost: u32,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// bcrypt work factor; tests use the minimum.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            accounts: DashMap::new(),
            cost,
        }
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(AuthError::Rejected("INVALID_EMAIL".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected(format!(
                "WEAK_PASSWORD : Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = hash(password, self.cost)?;
        let uid = Uuid::new_v4().simple().to_string();

        match self.accounts.entry(email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AuthError::AccountExists),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Account {
                    uid: uid.clone(),
                    password_hash,
                });
                Ok(Identity::new(uid, email))
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let (uid, password_hash) = match self.accounts.get(&email) {
            Some(account) => (account.uid.clone(), account.password_hash.clone()),
            None => return Err(AuthError::InvalidCredentials),
        };

        if !verify(password, &password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Identity::new(uid, email))
    }
}
