//! Identity Toolkit sign-in for database access.
//!
//! The application signs in as itself, either anonymously or with a custom
//! token handed to it by the deployment, purely to obtain an ID token that the
//! database's security rules accept. End users never see any of this.
//!
//! Tokens are cached and refreshed through the secure-token endpoint shortly
//! before they expire.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Refresh this long before the token's stated expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Production Identity Toolkit endpoint.
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Production secure-token endpoint.
pub const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Errors from the sign-in flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity service rejected the request.
    #[error("sign-in rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error message from the service, e.g. `INVALID_CUSTOM_TOKEN`.
        message: String,
    },

    /// Response was not the JSON we expected.
    #[error("invalid sign-in response: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL does not parse.
    #[error("invalid identity endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// Anonymous sign-in needs an API key.
    #[error("FIREBASE_API_KEY is required to sign in")]
    MissingApiKey,
}

/// How the application identifies itself.
#[derive(Clone)]
pub enum SignInMethod {
    Anonymous,
    CustomToken(SecretString),
}

impl std::fmt::Debug for SignInMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::CustomToken(_) => f.write_str("CustomToken([REDACTED])"),
        }
    }
}

/// Base URLs of the identity services. Overridable for tests.
#[derive(Debug, Clone)]
pub struct IdentityEndpoints {
    pub identity_toolkit: String,
    pub secure_token: String,
}

impl Default for IdentityEndpoints {
    fn default() -> Self {
        Self {
            identity_toolkit: IDENTITY_TOOLKIT_URL.to_string(),
            secure_token: SECURE_TOKEN_URL.to_string(),
        }
    }
}

struct Session {
    id_token: SecretString,
    refresh_token: SecretString,
    user_id: String,
    expires_at: Instant,
}

impl Session {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

/// Identity Toolkit client holding the current session.
pub struct IdentityClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    method: SignInMethod,
    endpoints: IdentityEndpoints,
    session: Mutex<Option<Session>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

impl IdentityClient {
    /// Create a client. No request is made until a token is needed.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        api_key: Option<SecretString>,
        method: SignInMethod,
        endpoints: IdentityEndpoints,
    ) -> Self {
        Self {
            client,
            api_key,
            method,
            endpoints,
            session: Mutex::new(None),
        }
    }

    /// A valid ID token, signing in or refreshing as needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if neither refresh nor a fresh sign-in succeeds.
    pub async fn id_token(&self) -> Result<SecretString, AuthError> {
        let mut session = self.session.lock().await;

        let stale_refresh_token = match session.as_ref() {
            Some(current) if current.is_fresh() => return Ok(current.id_token.clone()),
            Some(current) => Some(current.refresh_token.clone()),
            None => None,
        };

        if let Some(refresh_token) = stale_refresh_token {
            match self.refresh(&refresh_token).await {
                Ok(refreshed) => {
                    debug!(user_id = %refreshed.user_id, "Refreshed ID token");
                    let token = refreshed.id_token.clone();
                    *session = Some(refreshed);
                    return Ok(token);
                }
                Err(e) => warn!(error = %e, "Token refresh failed, signing in again"),
            }
        }

        let fresh = self.sign_in().await?;
        let token = fresh.id_token.clone();
        *session = Some(fresh);
        Ok(token)
    }

    /// Drop the cached session so the next request signs in again.
    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }

    #[instrument(skip(self), fields(method = ?self.method))]
    async fn sign_in(&self) -> Result<Session, AuthError> {
        let api_key = self.api_key.as_ref().ok_or(AuthError::MissingApiKey)?;
        let (endpoint, body) = match &self.method {
            SignInMethod::Anonymous => ("accounts:signUp", json!({ "returnSecureToken": true })),
            SignInMethod::CustomToken(token) => (
                "accounts:signInWithCustomToken",
                json!({ "token": token.expose_secret(), "returnSecureToken": true }),
            ),
        };
        let url = keyed_url(&self.endpoints.identity_toolkit, endpoint, api_key)?;

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?;
        let text = checked_text(response).await?;
        let parsed: SignInResponse = serde_json::from_str(&text)?;

        info!(user_id = %parsed.local_id, "Signed in to identity service");
        Ok(Session {
            id_token: SecretString::from(parsed.id_token),
            refresh_token: SecretString::from(parsed.refresh_token),
            expires_at: expiry(&parsed.expires_in),
            user_id: parsed.local_id,
        })
    }

    async fn refresh(&self, refresh_token: &SecretString) -> Result<Session, AuthError> {
        let api_key = self.api_key.as_ref().ok_or(AuthError::MissingApiKey)?;
        let url = keyed_url(&self.endpoints.secure_token, "token", api_key)?;

        let response = self
            .client
            .post(url)
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token.expose_secret(),
            }))
            .send()
            .await?;
        let text = checked_text(response).await?;
        let parsed: RefreshResponse = serde_json::from_str(&text)?;

        Ok(Session {
            id_token: SecretString::from(parsed.id_token),
            refresh_token: SecretString::from(parsed.refresh_token),
            expires_at: expiry(&parsed.expires_in),
            user_id: parsed.user_id,
        })
    }
}

impl std::fmt::Debug for IdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("method", &self.method)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

fn keyed_url(base: &str, endpoint: &str, api_key: &SecretString) -> Result<Url, AuthError> {
    let mut url = Url::parse(&format!("{base}/{endpoint}"))?;
    url.query_pairs_mut()
        .append_pair("key", api_key.expose_secret());
    Ok(url)
}

async fn checked_text(response: reqwest::Response) -> Result<String, AuthError> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        return Ok(text);
    }
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| text.chars().take(200).collect());
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// `expiresIn` is a string of seconds. Unparseable values expire at once.
fn expiry(expires_in: &str) -> Instant {
    let seconds = expires_in.parse::<u64>().unwrap_or(0);
    Instant::now() + Duration::from_secs(seconds)
}
