//! Bearer tokens and the OIDC login URL.
//!
//! Tokens are obtained outside this crate (the MySkoda app login); the
//! connector only carries them and checks their expiry. The authorization
//! URL is built so a user can start the login in a browser.

use crate::config::toml_config::AuthConfig;
use crate::domain::endpoint::{ApiBase, Endpoint};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use url::Url;

/// Tokens are treated as expired this long before their real expiry.
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Unknown expiry counts as valid; the API will answer 401 if it is not.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECONDS) >= expires_at,
            None => false,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub fn authorization_url(auth: &AuthConfig, base: &ApiBase, state: &str) -> Result<Url> {
    let client_id = validate_required_field("auth.client_id", &auth.client_id)?;
    let redirect_uri = validate_required_field("auth.redirect_uri", &auth.redirect_uri)?;

    let mut url = Endpoint::OidcAuthorize.url(base, None)?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &auth.scope)
        .append_pair("state", state);
    Ok(url)
}
