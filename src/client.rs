//! Authenticated Spotify Web API client.

use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    config::ApiConfig,
    error::{Error, Result},
    token::TokenStore,
    types::Page,
};

/// Default page size for paginated listings.
pub const PAGE_LIMIT: u64 = 50;

/// Bearer-authenticated client over the Web API.
///
/// Every request attaches the stored access token. A 401 triggers exactly
/// one refresh and one retry of the identical request; all other statuses
/// are handed back to the caller. Requests run with the transport's default
/// timeouts; no additional deadline is applied.
pub struct SpotifyClient {
    http: Client,
    config: ApiConfig,
    tokens: TokenStore,
}

impl SpotifyClient {
    pub fn new(config: ApiConfig, tokens: TokenStore) -> Self {
        SpotifyClient {
            http: Client::new(),
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Issues a single authenticated request.
    ///
    /// On 401 the access token is refreshed once and the request is retried
    /// with the same method, query parameters and body. A 401 on the retry
    /// maps to [`Error::Http`]; every other status, success or not, is
    /// returned as the plain response for the caller to judge.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Web API path such as `/me/playlists`
    /// * `query` - Optional query parameters, reused verbatim on the retry
    /// * `body` - Optional JSON body, reused verbatim on the retry
    pub async fn request<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(String, String)]>,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = self.config.api_url(endpoint);
        let mut access_token = self.tokens.access_token().await?;
        let mut refreshed = false;

        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&access_token);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, endpoint, "api request");
            let response = request.send().await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }
            if refreshed {
                // a second 401 means the request itself is not permitted
                return Err(Error::Http {
                    status: StatusCode::UNAUTHORIZED,
                });
            }

            warn!(endpoint, "access token rejected, refreshing");
            access_token = self
                .tokens
                .refresh_if_stale(&access_token)
                .await?
                .access_token;
            refreshed = true;
        }
    }

    /// GET without a body.
    pub async fn get(
        &self,
        endpoint: &str,
        query: Option<&[(String, String)]>,
    ) -> Result<Response> {
        self.request::<()>(Method::GET, endpoint, query, None).await
    }

    /// Fetches every page of a paginated listing, in order.
    ///
    /// Pages are requested sequentially starting from `initial_params`
    /// (default `limit=50`). Each page must answer 2xx and parse as
    /// `{ items, next }`; while `next` carries an absolute URL, its query
    /// string seeds the following request. The flattened items are
    /// materialized eagerly.
    pub async fn request_paginated<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        initial_params: Option<&[(String, String)]>,
    ) -> Result<Vec<T>> {
        let mut params: Vec<(String, String)> = match initial_params {
            Some(params) => params.to_vec(),
            None => vec![("limit".to_string(), PAGE_LIMIT.to_string())],
        };
        let mut collected: Vec<T> = Vec::new();

        loop {
            let response = self
                .request::<()>(Method::GET, endpoint, Some(&params), None)
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Http { status });
            }

            let page: Page<T> = response.json().await?;
            collected.extend(page.items);

            match page.next {
                Some(next) => params = cursor_params(&next)?,
                None => break,
            }
        }

        debug!(endpoint, items = collected.len(), "pagination complete");
        Ok(collected)
    }
}

/// Query parameters encoded in the absolute `next` URL of a page.
fn cursor_params(next: &str) -> Result<Vec<(String, String)>> {
    let url = Url::parse(next).map_err(|e| Error::Cursor(e.to_string()))?;
    Ok(url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}
