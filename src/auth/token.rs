//! OAuth2 client-credentials session.
//!
//! [`TokenManager`] owns exactly one [`Session`]. The first caller acquires a
//! token; later callers reuse it until `expires_at`, which always sits
//! [`EXPIRY_MARGIN_SECS`] before the server-reported expiry. The whole
//! check / request / store sequence runs under one async mutex, so at most one
//! token request is in flight and callers queued behind it reuse its result.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::AuthError;
use crate::observability::redact_secrets;

/// Seconds subtracted from every server-reported token lifetime.
///
/// Applied unconditionally: a lifetime shorter than the margin produces an
/// expiry in the past, and the next call acquires a new token.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Credentials & session
// ---------------------------------------------------------------------------

/// Client-credentials grant inputs. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Base URL of the authorization server; `/oauth/token` is appended.
    pub auth_endpoint: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            auth_endpoint: auth_endpoint.into(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.auth_endpoint.trim_end_matches('/'))
    }
}

/// Cached access token and the instant it stops being handed out.
#[derive(Clone, Default)]
pub struct Session {
    access_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|_| now < self.expires_at)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response. Deserialize-only so a token can never be
/// serialized into a log line by accident.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

// ---------------------------------------------------------------------------
// TokenManager
// ---------------------------------------------------------------------------

/// Owner of the process-wide OAuth2 session.
pub struct TokenManager {
    http: reqwest::Client,
    credentials: Credentials,
    session: Mutex<Session>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("client_id", &self.credentials.client_id)
            .field("token_url", &self.credentials.token_url())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a manager with an empty session. No network traffic happens
    /// until the first token is needed.
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            session: Mutex::new(Session::default()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Return a bearer token that is valid right now, acquiring one if the
    /// cached token is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the token request fails. The session is left
    /// exactly as it was, so the next call tries again.
    pub async fn ensure_valid_token(&self) -> Result<String, AuthError> {
        let mut session = self.session.lock().await;
        if let Some(token) = session.valid_token(self.clock.now()) {
            return Ok(token.to_string());
        }

        let response = self.request_token().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Upwind token acquisition failed");
        })?;
        let lifetime = response.expires_in.unwrap_or_default();

        let now = self.clock.now();
        let usable = i64::try_from(lifetime)
            .unwrap_or(i64::MAX)
            .saturating_sub(EXPIRY_MARGIN_SECS);
        let expires_at = TimeDelta::try_seconds(usable)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        session.access_token = Some(response.access_token.clone());
        session.expires_at = expires_at;

        tracing::info!(
            expires_in = lifetime,
            expires_at = %expires_at,
            "acquired Upwind access token"
        );
        Ok(response.access_token)
    }

    /// Best-effort organization id lookup from the current token's claims.
    ///
    /// Never fails: an authentication error or an undecodable token both
    /// yield `None`. The result is unverified and only suitable as a default
    /// for an omitted parameter.
    pub async fn discover_organization_id(&self) -> Option<String> {
        match self.ensure_valid_token().await {
            Ok(token) => super::jwt::organization_id_from_token(&token),
            Err(e) => {
                tracing::warn!(error = %e, "could not discover organization id from auth token");
                None
            }
        }
    }

    /// When the cached token stops being handed out, if one is cached.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        let session = self.session.lock().await;
        session.access_token.as_ref().map(|_| session.expires_at)
    }

    #[cfg(test)]
    pub(crate) async fn cached_token(&self) -> Option<String> {
        self.session.lock().await.access_token.clone()
    }

    async fn request_token(&self) -> Result<TokenResponse, AuthError> {
        let url = self.credentials.token_url();
        tracing::debug!(url = %url, client_id = %self.credentials.client_id, "requesting Upwind access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose_secret()),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Http(redact_secrets(&e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Http(redact_secrets(&e.to_string())))?;

        if !status.is_success() {
            return Err(AuthError::Status {
                status: status.as_u16(),
                body: redact_secrets(&body),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::InvalidResponse("empty access_token".into()));
        }
        if parsed.expires_in.is_none() {
            return Err(AuthError::InvalidResponse("missing expires_in".into()));
        }
        if let Some(ref tt) = parsed.token_type {
            if !tt.eq_ignore_ascii_case("bearer") {
                return Err(AuthError::UnsupportedTokenType(tt.clone()));
            }
        }

        Ok(parsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
