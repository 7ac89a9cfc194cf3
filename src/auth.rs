//! OAuth token lifecycle.
//!
//! [`resolve_credentials`] is the single entry point: load the stored
//! record, ask the authorization server whether the access token is still
//! good, refresh it if possible, persist the result. Per identity the
//! states are:
//!
//! ```text
//! NoRecord ──────────────→ Err(NoCredentials)
//! ValidToken ────────────→ Ok(credentials unchanged)
//! ExpiredNoRefresh ──────→ Err(RefreshImpossible)   user must re-authenticate
//! ExpiredWithRefresh ────→ refresh exchange → persist new access token → Ok
//! RefreshFailed ─────────→ Err(RefreshFailed)       user must re-authenticate
//! ```
//!
//! Staleness is decided by the remote authorization contract (a tokeninfo
//! probe), never by a locally cached expiry timestamp. The refresh
//! exchange does not rotate the refresh token; only the access token is
//! written back, and that write is the lifecycle's only side effect.
//!
//! The remote sits behind the [`AuthorizationServer`] trait so the
//! lifecycle logic is testable with a recording fake.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::OAuthConfig;
use crate::store::{CredentialStore, Identity, StoreError};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no credentials stored for {0} — authenticate first")]
    NoCredentials(Identity),
    #[error("access token for {0} is expired and no refresh token is stored — re-authenticate")]
    RefreshImpossible(Identity),
    #[error("the authorization server rejected the token refresh ({0}) — re-authenticate")]
    RefreshFailed(String),
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("failed to fetch the user profile: {0}")]
    ProfileFailed(String),
    #[error("malformed authorization server response: {0}")]
    MalformedResponse(String),
    #[error("network error reaching the authorization server: {0}")]
    Network(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A ready-to-use token pair for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Remote verdict on an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
}

/// Result of a refresh exchange. The server does not rotate the refresh
/// token in this flow, so only the access token comes back.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
}

/// Result of an authorization-code exchange.
#[derive(Debug, Clone)]
pub struct CodeGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Profile metadata fetched after authorization.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// The remote authorization server, from this tool's point of view.
pub trait AuthorizationServer {
    /// Ask the remote whether an access token is still usable.
    fn token_status(&self, access_token: &str) -> Result<TokenStatus, AuthError>;

    /// Exchange a refresh token for a fresh access token.
    fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AuthError>;

    /// Exchange an authorization code for a token pair.
    fn exchange_code(&self, code: &str) -> Result<CodeGrant, AuthError>;

    /// Fetch profile metadata for a just-authorized access token.
    fn user_profile(&self, access_token: &str) -> Result<UserProfile, AuthError>;
}

/// Resolve usable credentials for `identity`, refreshing if stale.
///
/// The only state mutation is persisting a refreshed access token; every
/// other path is read-only.
pub fn resolve_credentials(
    store: &CredentialStore,
    server: &impl AuthorizationServer,
    identity: &Identity,
) -> Result<Credentials, AuthError> {
    let record = store
        .get(identity)?
        .ok_or_else(|| AuthError::NoCredentials(identity.clone()))?;
    let mut credentials = Credentials {
        identity: identity.clone(),
        access_token: record.access_token,
        refresh_token: record.refresh_token,
    };

    match server.token_status(&credentials.access_token)? {
        TokenStatus::Valid => Ok(credentials),
        TokenStatus::Expired => {
            let refresh_token = credentials
                .refresh_token
                .as_deref()
                .ok_or_else(|| AuthError::RefreshImpossible(identity.clone()))?;
            let refreshed = server.refresh(refresh_token)?;
            store.update_access_token(identity, &refreshed.access_token)?;
            log::info!("access token refreshed for {identity}");
            credentials.access_token = refreshed.access_token;
            Ok(credentials)
        }
    }
}

/// Build the user-facing authorization URL for the code flow.
///
/// `access_type=offline` + `prompt=consent` so the server issues a refresh
/// token on every authorization, and `state` guards the redirect against
/// forgery.
pub fn authorization_url(oauth: &OAuthConfig, state: &str) -> Result<String, AuthError> {
    let mut url = url::Url::parse(&oauth.auth_url)
        .map_err(|e| AuthError::MalformedResponse(format!("bad auth_url: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", &oauth.client_id)
        .append_pair("redirect_uri", &oauth.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &oauth.scopes.join(" "))
        .append_pair("access_type", "offline")
        .append_pair("include_granted_scopes", "true")
        .append_pair("prompt", "consent")
        .append_pair("state", state);
    Ok(url.into())
}

// =========================================================================
// HTTP implementation
// =========================================================================

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// [`AuthorizationServer`] over HTTP, against the endpoints in
/// [`OAuthConfig`].
pub struct HttpAuthServer {
    client: reqwest::blocking::Client,
    oauth: OAuthConfig,
}

impl HttpAuthServer {
    pub fn new(oauth: OAuthConfig, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        Ok(Self { client, oauth })
    }
}

impl AuthorizationServer for HttpAuthServer {
    fn token_status(&self, access_token: &str) -> Result<TokenStatus, AuthError> {
        let response = self
            .client
            .get(&self.oauth.tokeninfo_url)
            .query(&[("access_token", access_token)])
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        // The remote owns the verdict: any client-error status means the
        // token is no longer usable.
        if response.status().is_success() {
            Ok(TokenStatus::Valid)
        } else if response.status().is_client_error() {
            Ok(TokenStatus::Expired)
        } else {
            Err(AuthError::Network(format!(
                "tokeninfo returned {}",
                response.status()
            )))
        }
    }

    fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AuthError> {
        let client_secret = self.oauth.resolved_client_secret();
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .client
            .post(&self.oauth.token_url)
            .form(&params)
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(AuthError::RefreshFailed(detail));
        }
        let body: RefreshResponse = response
            .json()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        let access_token = body.access_token.ok_or_else(|| {
            AuthError::MalformedResponse("refresh response lacks access_token".to_string())
        })?;
        Ok(RefreshedToken { access_token })
    }

    fn exchange_code(&self, code: &str) -> Result<CodeGrant, AuthError> {
        let client_secret = self.oauth.resolved_client_secret();
        let params = [
            ("code", code),
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("redirect_uri", self.oauth.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .client
            .post(&self.oauth.token_url)
            .form(&params)
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(AuthError::ExchangeFailed(detail));
        }
        let body: ExchangeResponse = response
            .json()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        let access_token = body.access_token.ok_or_else(|| {
            AuthError::MalformedResponse("exchange response lacks access_token".to_string())
        })?;
        Ok(CodeGrant {
            access_token,
            refresh_token: body.refresh_token,
        })
    }

    fn user_profile(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .client
            .get(&self.oauth.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(AuthError::ProfileFailed(detail));
        }
        let body: UserInfoResponse = response
            .json()
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        // Email is the identity key — without it the grant is unusable.
        let email = body.email.ok_or_else(|| {
            AuthError::MalformedResponse("userinfo response lacks email".to_string())
        })?;
        Ok(UserProfile {
            email,
            name: body.name,
            picture: body.picture,
        })
    }
}
