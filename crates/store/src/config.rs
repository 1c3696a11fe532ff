//! Document store configuration loaded from environment variables.
//!
//! Shared by the storefront, the admin panel and the CLI.
//!
//! # Environment Variables
//!
//! ## Required (Firestore backend)
//! - `FIREBASE_PROJECT_ID` - Google Cloud project that owns the database
//! - `FIREBASE_API_KEY` - Web API key used to sign in (not needed with the emulator)
//!
//! ## Optional
//! - `STORE_BACKEND` - `firestore` (default) or `memory`
//! - `SHOPIFY_LITE_APP_ID` - Scopes the collections (default: `default-app-id`)
//! - `FIREBASE_DATABASE_ID` - Database within the project (default: `(default)`)
//! - `FIREBASE_INITIAL_AUTH_TOKEN` - Custom token; anonymous sign-in when unset
//! - `FIRESTORE_EMULATOR_HOST` - `host:port` of a local emulator
//! - `STORE_POLL_INTERVAL_SECS` - Snapshot poll interval (default: 5)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Default application id when `SHOPIFY_LITE_APP_ID` is unset.
pub const DEFAULT_APP_ID: &str = "default-app-id";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which [`DocumentStore`](crate::DocumentStore) to build.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Firestore(FirestoreConfig),
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Application id scoping the collections.
    pub app_id: String,
    /// How often the Firestore adapter re-reads watched collections.
    pub poll_interval: Duration,
}

/// Firestore connection settings.
#[derive(Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database_id: String,
    pub api_key: Option<SecretString>,
    /// Custom token for `accounts:signInWithCustomToken`.
    pub initial_auth_token: Option<SecretString>,
    /// `host:port` of the emulator. Disables sign-in.
    pub emulator_host: Option<String>,
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "initial_auth_token",
                &self.initial_auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("emulator_host", &self.emulator_host)
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// In-memory backend with default settings.
    #[must_use]
    pub fn memory(app_id: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Memory,
            app_id: app_id.into(),
            poll_interval: Duration::from_secs(5),
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let app_id = env.or_default("SHOPIFY_LITE_APP_ID", DEFAULT_APP_ID);
        let poll_secs = env
            .or_default("STORE_POLL_INTERVAL_SECS", "5")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "STORE_POLL_INTERVAL_SECS".to_string(),
                    "must be a positive whole number of seconds".to_string(),
                )
            })?;

        let backend = match env.or_default("STORE_BACKEND", "firestore").as_str() {
            "memory" => StoreBackend::Memory,
            "firestore" => StoreBackend::Firestore(FirestoreConfig::from_env(&env)?),
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORE_BACKEND".to_string(),
                    format!("expected 'firestore' or 'memory', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            backend,
            app_id,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

impl FirestoreConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let emulator_host = env.optional("FIRESTORE_EMULATOR_HOST");
        let api_key = match (env.optional("FIREBASE_API_KEY"), &emulator_host) {
            (Some(key), _) => Some(validated_secret(key, "FIREBASE_API_KEY")?),
            (None, Some(_)) => None,
            (None, None) => return Err(ConfigError::MissingEnvVar("FIREBASE_API_KEY".to_string())),
        };

        Ok(Self {
            project_id: env.required("FIREBASE_PROJECT_ID")?,
            database_id: env.or_default("FIREBASE_DATABASE_ID", "(default)"),
            api_key,
            initial_auth_token: env
                .optional("FIREBASE_INITIAL_AUTH_TOKEN")
                .map(SecretString::from),
            emulator_host,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup. Empty values count as unset.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy values.
fn validated_secret(value: String, var_name: &str) -> Result<SecretString, ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(&value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"),
        ));
    }

    Ok(SecretString::from(value))
}
