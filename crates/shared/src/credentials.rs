//! Credential lookup for backend calls.
//!
//! Credentials are resolved per call through a [`CredentialProvider`] so a key
//! swapped mid-session is picked up by the next request. A resolved
//! [`Credential`] lives only for the call that asked for it.

use crate::error::{OracleError, Result};
use crate::settings::{OAuthCredentials, ProviderAuth};
use chrono::Utc;
use std::env;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

const ENV_KEYS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// How the backend expects a secret to be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ApiKey,
    Bearer,
}

/// An API key or access token, wiped from memory on drop
#[derive(Clone)]
pub struct Credential {
    secret: Zeroizing<String>,
    kind: CredentialKind,
}

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            kind: CredentialKind::ApiKey,
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(token.into()),
            kind: CredentialKind::Bearer,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn expose(&self) -> &str {
        self.secret.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({:?}, <redacted>)", self.kind)
    }
}

pub trait CredentialProvider: Send + Sync {
    /// Resolve the credential to use for the call about to be made.
    fn credential(&self) -> Result<Credential>;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Arc<P> {
    fn credential(&self) -> Result<Credential> {
        (**self).credential()
    }
}

/// Fixed key, mostly for tests and one-shot CLI use
pub struct StaticCredential(Credential);

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Credential::new(secret))
    }
}

impl CredentialProvider for StaticCredential {
    fn credential(&self) -> Result<Credential> {
        Ok(self.0.clone())
    }
}

/// Reads `GEMINI_API_KEY` (then `API_KEY`) from the environment on every call
#[derive(Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credential(&self) -> Result<Credential> {
        from_env().ok_or_else(|| OracleError::auth("GEMINI_API_KEY not set"))
    }
}

/// Settings-backed credentials with environment fallback
pub struct SettingsCredentials {
    auth: ProviderAuth,
}

impl SettingsCredentials {
    pub fn new(auth: ProviderAuth) -> Self {
        Self { auth }
    }
}

impl CredentialProvider for SettingsCredentials {
    fn credential(&self) -> Result<Credential> {
        if let Some(api_key) = self.auth.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(Credential::new(api_key.trim()));
        }
        if let Some(oauth) = self.auth.oauth.as_ref().filter(|o| is_usable(o, Utc::now().timestamp())) {
            return Ok(Credential::bearer(oauth.access_token.trim()));
        }
        from_env().ok_or_else(|| OracleError::auth("No Gemini authentication configured"))
    }
}

/// Expired or blank tokens are skipped rather than sent
fn is_usable(oauth: &OAuthCredentials, now: i64) -> bool {
    !oauth.access_token.trim().is_empty() && oauth.expires_at.map_or(true, |at| at > now)
}

fn from_env() -> Option<Credential> {
    ENV_KEYS
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .map(|value| Credential::new(value.trim()))
}
