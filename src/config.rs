// ==================== CONFIGURATION ====================
// Everything comes from the environment (a `.env` file is loaded first by
// `main`). Only the session secret is mandatory; the backends default to the
// in-memory implementations so the app runs without any external service.

use std::env;

const DEFAULT_FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_FIREBASE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_RECOMMENDATION_ENDPOINT: &str = "https://course-backend-1.onrender.com/recommend";
const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("unknown {name} backend {value:?}")]
    UnknownBackend { name: &'static str, value: String },

    #[error("{name} must be true or false, got {value:?}")]
    InvalidFlag { name: &'static str, value: String },

    #[error("{name} requires {requires}")]
    Requires { name: &'static str, requires: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Memory,
    MongoDb { url: String },
    /// Cloud Firestore over REST, authenticated as the signed-in user.
    Firestore { base_url: String, project_id: String },
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::MongoDb { .. } => "mongodb",
            StoreBackend::Firestore { .. } => "firestore",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentityBackend {
    Memory,
    Firebase {
        base_url: String,
        token_url: String,
        api_key: String,
    },
}

impl IdentityBackend {
    pub fn name(&self) -> &'static str {
        match self {
            IdentityBackend::Memory => "memory",
            IdentityBackend::Firebase { .. } => "firebase",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub identity: IdentityBackend,
    pub recommendation_endpoint: String,
    pub session_secret: String,
    pub session_ttl: chrono::Duration,
    pub sweep_interval: std::time::Duration,
    /// Marks the session cookie `Secure`; only turn off for plain-http hosts.
    pub secure_cookies: bool,
}

impl Config {
    /// The hosted engine reads the profile from Firestore, so any other
    /// store leaves it without the document it needs.
    pub fn engine_shares_store(&self) -> bool {
        matches!(self.store, StoreBackend::Firestore { .. })
            || self.recommendation_endpoint != DEFAULT_RECOMMENDATION_ENDPOINT
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // blank values count as unset
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));
        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match var(name) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidNumber { name, value }),
            }
        };

        let flag = |name: &'static str, default: bool| -> Result<bool, ConfigError> {
            match var(name) {
                None => Ok(default),
                Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" => Ok(true),
                    "false" | "0" | "no" => Ok(false),
                    _ => Err(ConfigError::InvalidFlag { name, value }),
                },
            }
        };

        let store = match var("DOCUMENT_STORE").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "mongodb" => StoreBackend::MongoDb {
                url: required("DATABASE_URL")?,
            },
            "firestore" => StoreBackend::Firestore {
                base_url: var("FIRESTORE_URL").unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string()),
                project_id: required("FIREBASE_PROJECT_ID")?,
            },
            other => {
                return Err(ConfigError::UnknownBackend {
                    name: "DOCUMENT_STORE",
                    value: other.to_string(),
                })
            }
        };

        let identity = match var("IDENTITY_PROVIDER").as_deref().unwrap_or("memory") {
            "memory" => IdentityBackend::Memory,
            "firebase" => IdentityBackend::Firebase {
                base_url: var("FIREBASE_AUTH_URL").unwrap_or_else(|| DEFAULT_FIREBASE_AUTH_URL.to_string()),
                token_url: var("FIREBASE_TOKEN_URL").unwrap_or_else(|| DEFAULT_FIREBASE_TOKEN_URL.to_string()),
                api_key: required("FIREBASE_API_KEY")?,
            },
            other => {
                return Err(ConfigError::UnknownBackend {
                    name: "IDENTITY_PROVIDER",
                    value: other.to_string(),
                })
            }
        };

        // Firestore documents are read and written with the user's ID token.
        if matches!(store, StoreBackend::Firestore { .. }) && !matches!(identity, IdentityBackend::Firebase { .. }) {
            return Err(ConfigError::Requires {
                name: "DOCUMENT_STORE=firestore",
                requires: "IDENTITY_PROVIDER=firebase",
            });
        }

        let port = number("PORT", 3000)?;
        let port = u16::try_from(port).map_err(|_| ConfigError::InvalidNumber {
            name: "PORT",
            value: port.to_string(),
        })?;

        let ttl_hours = number("SESSION_TTL_HOURS", 24)?;
        if ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::InvalidNumber {
                name: "SESSION_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }
        let sweep_secs = number("SESSION_SWEEP_SECS", 300)?;

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            store,
            identity,
            recommendation_endpoint: var("RECOMMENDATION_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_RECOMMENDATION_ENDPOINT.to_string()),
            session_secret: required("SESSION_SECRET")?,
            session_ttl: chrono::Duration::hours(ttl_hours as i64),
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            secure_cookies: flag("SESSION_COOKIE_SECURE", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SESSION_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.identity, IdentityBackend::Memory);
        assert_eq!(config.recommendation_endpoint, DEFAULT_RECOMMENDATION_ENDPOINT);
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(300));
        assert!(config.secure_cookies);
        assert!(!config.engine_shares_store());
    }

    #[test]
    fn test_session_secret_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("SESSION_SECRET"));
        assert_eq!(
            load(&[("SESSION_SECRET", "  ")]).unwrap_err(),
            ConfigError::Missing("SESSION_SECRET")
        );
    }

    #[test]
    fn test_remote_backends() {
        let config = load(&[
            ("SESSION_SECRET", "s"),
            ("DOCUMENT_STORE", "mongodb"),
            ("DATABASE_URL", "mongodb://localhost:27017/courses"),
            ("IDENTITY_PROVIDER", "firebase"),
            ("FIREBASE_API_KEY", "key"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::MongoDb {
                url: "mongodb://localhost:27017/courses".into()
            }
        );
        assert_eq!(
            config.identity,
            IdentityBackend::Firebase {
                base_url: DEFAULT_FIREBASE_AUTH_URL.into(),
                token_url: DEFAULT_FIREBASE_TOKEN_URL.into(),
                api_key: "key".into()
            }
        );
    }

    #[test]
    fn test_firestore_backend() {
        let config = load(&[
            ("SESSION_SECRET", "s"),
            ("DOCUMENT_STORE", "firestore"),
            ("FIREBASE_PROJECT_ID", "courses-app"),
            ("IDENTITY_PROVIDER", "firebase"),
            ("FIREBASE_API_KEY", "key"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Firestore {
                base_url: DEFAULT_FIRESTORE_URL.into(),
                project_id: "courses-app".into()
            }
        );
        assert_eq!(config.store.name(), "firestore");
        assert!(config.engine_shares_store());
    }

    #[test]
    fn test_firestore_needs_firebase_identity() {
        let err = load(&[
            ("SESSION_SECRET", "s"),
            ("DOCUMENT_STORE", "firestore"),
            ("FIREBASE_PROJECT_ID", "courses-app"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Requires { .. }));

        let err = load(&[("SESSION_SECRET", "s"), ("DOCUMENT_STORE", "firestore")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("FIREBASE_PROJECT_ID"));
    }

    #[test]
    fn test_custom_engine_shares_any_store() {
        let config = load(&[
            ("SESSION_SECRET", "s"),
            ("RECOMMENDATION_ENDPOINT", "http://localhost:8000/recommend"),
        ])
        .unwrap();
        assert!(config.engine_shares_store());
    }

    #[test]
    fn test_secure_cookie_flag() {
        let config = load(&[("SESSION_SECRET", "s"), ("SESSION_COOKIE_SECURE", "false")]).unwrap();
        assert!(!config.secure_cookies);
        assert!(matches!(
            load(&[("SESSION_SECRET", "s"), ("SESSION_COOKIE_SECURE", "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
    }

    #[test]
    fn test_remote_backend_needs_its_settings() {
        let err = load(&[("SESSION_SECRET", "s"), ("DOCUMENT_STORE", "mongodb")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = load(&[("SESSION_SECRET", "s"), ("IDENTITY_PROVIDER", "firebase")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("FIREBASE_API_KEY"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            load(&[("SESSION_SECRET", "s"), ("PORT", "http")]),
            Err(ConfigError::InvalidNumber { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("SESSION_SECRET", "s"), ("PORT", "70000")]),
            Err(ConfigError::InvalidNumber { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("SESSION_SECRET", "s"), ("SESSION_SWEEP_SECS", "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            load(&[("SESSION_SECRET", "s"), ("DOCUMENT_STORE", "sqlite")]),
            Err(ConfigError::UnknownBackend { name: "DOCUMENT_STORE", .. })
        ));
    }
}
