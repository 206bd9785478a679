//! OAuth 2.0 PKCE authorization and token exchanges.
//!
//! The library does not own the redirect leg of the flow. The embedder calls
//! [`begin_authorization`], sends the user to the returned URL, receives the
//! authorization code on its registered redirect URI and hands it to
//! [`exchange_code`] together with the verifier.

use chrono::Utc;
use reqwest::{Client, Url};
use tracing::debug;

use crate::{
    config::ApiConfig,
    error::{Error, Result},
    types::{AuthorizeRequest, Credential, TokenResponse},
    utils,
};

/// Builds the user-facing authorization URL for a prepared code challenge.
///
/// All parameters are query-encoded, including the space-separated scope
/// list and the redirect URI.
pub fn authorize_url(config: &ApiConfig, code_challenge: &str) -> Result<String> {
    let url = Url::parse_with_params(
        &config.authorize_endpoint(),
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", config.scope.as_str()),
        ],
    )
    .map_err(|e| Error::InvalidUrl(e.to_string()))?;

    Ok(url.to_string())
}

/// Starts a PKCE authorization attempt.
///
/// Generates a fresh code verifier, derives its SHA-256 challenge and builds
/// the authorization URL carrying it. The caller must hold on to the
/// verifier: the code exchange only succeeds with the verifier that belongs
/// to the challenge the user authorized.
///
/// # Returns
///
/// An [`AuthorizeRequest`] with the URL to open and the verifier to keep.
pub fn begin_authorization(config: &ApiConfig) -> Result<AuthorizeRequest> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let url = authorize_url(config, &code_challenge)?;

    Ok(AuthorizeRequest { url, code_verifier })
}

/// Exchanges an authorization code for a credential using PKCE.
///
/// Completes the flow started by [`begin_authorization`] by posting the
/// code and its verifier to the accounts token endpoint with the
/// `authorization_code` grant.
///
/// # Arguments
///
/// * `code` - Authorization code received on the redirect URI
/// * `verifier` - Code verifier generated at the start of the flow
///
/// # Returns
///
/// The full credential: access token, refresh token, granted scope and
/// expiry metadata stamped with the current time.
///
/// # Errors
///
/// A rejecting token endpoint yields [`Error::AuthFailed`]; the code is
/// single-use and short-lived, so a stale code is the common cause.
pub async fn exchange_code(
    http: &Client,
    config: &ApiConfig,
    code: &str,
    verifier: &str,
) -> Result<Credential> {
    debug!("exchanging authorization code");

    let res = http
        .post(config.token_endpoint())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    if !res.status().is_success() {
        return Err(Error::AuthFailed(format!(
            "token endpoint answered {}",
            res.status()
        )));
    }

    let token: TokenResponse = res.json().await?;
    Ok(credential_from_response(token, None))
}

/// Exchanges a refresh token for a fresh credential.
///
/// Any failure along the way maps to [`Error::RefreshFailed`]; the caller
/// has to send the user through a new authorization when that happens.
pub async fn refresh(
    http: &Client,
    config: &ApiConfig,
    refresh_token: &str,
) -> Result<Credential> {
    debug!("refreshing access token");

    let res = http
        .post(config.token_endpoint())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| Error::RefreshFailed(e.to_string()))?;

    if !res.status().is_success() {
        return Err(Error::RefreshFailed(format!(
            "token endpoint answered {}",
            res.status()
        )));
    }

    let token: TokenResponse = res
        .json()
        .await
        .map_err(|e| Error::RefreshFailed(e.to_string()))?;

    Ok(credential_from_response(token, Some(refresh_token)))
}

/// The token endpoint may omit the refresh token on the refresh grant; the
/// previous one stays valid then and is carried forward.
fn credential_from_response(response: TokenResponse, previous_refresh: Option<&str>) -> Credential {
    Credential {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .unwrap_or_default(),
        scope: response.scope.unwrap_or_default(),
        expires_in: response.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    }
}
