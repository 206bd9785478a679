//! Credential storage and the refresh gate.
//!
//! Exactly one credential is live per session. Every read and write goes
//! through a [`CredentialStorage`] backend so that embedders can supply
//! their own persistence; the default keeps a JSON file in the platform's
//! local data directory.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    auth,
    config::ApiConfig,
    error::{Error, Result},
    types::Credential,
};

/// Persistence backend for the single live credential.
#[async_trait]
pub trait CredentialStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Credential>>;
    async fn store(&self, credential: &Credential) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Credential persisted as JSON under the local data directory,
/// `spotitags/credential.json`.
pub struct FileCredentialStorage {
    path: PathBuf,
}

impl FileCredentialStorage {
    pub fn new() -> Self {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("spotitags/credential.json");
        FileCredentialStorage { path }
    }

    pub fn with_path(path: PathBuf) -> Self {
        FileCredentialStorage { path }
    }
}

impl Default for FileCredentialStorage {
    fn default() -> Self {
        FileCredentialStorage::new()
    }
}

#[async_trait]
impl CredentialStorage for FileCredentialStorage {
    async fn load(&self) -> Result<Option<Credential>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // never stored yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(e.to_string())),
        };

        let credential =
            serde_json::from_str(&content).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Some(credential))
    }

    async fn store(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(credential).map_err(|e| Error::Storage(e.to_string()))?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    async fn clear(&self) -> Result<()> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }
}

/// In-memory storage for embedders that manage persistence themselves, and
/// for tests.
#[derive(Default)]
pub struct MemoryCredentialStorage {
    credential: RwLock<Option<Credential>>,
}

#[async_trait]
impl CredentialStorage for MemoryCredentialStorage {
    async fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.read().await.clone())
    }

    async fn store(&self, credential: &Credential) -> Result<()> {
        *self.credential.write().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.credential.write().await = None;
        Ok(())
    }
}

/// Owner of the live credential.
///
/// Refreshing is serialized through an internal lock so that concurrent
/// 401 handlers trigger at most one token-endpoint call per stale token.
pub struct TokenStore {
    storage: Box<dyn CredentialStorage>,
    http: Client,
    config: ApiConfig,
    refresh_gate: Mutex<()>,
}

impl TokenStore {
    pub fn new(config: ApiConfig, storage: Box<dyn CredentialStorage>) -> Self {
        TokenStore {
            storage,
            http: Client::new(),
            config,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Store backed by the default on-disk location.
    pub fn persistent(config: ApiConfig) -> Self {
        TokenStore::new(config, Box::new(FileCredentialStorage::new()))
    }

    /// Current credential, or `Unauthenticated` when none is stored.
    pub async fn credential(&self) -> Result<Credential> {
        self.storage.load().await?.ok_or(Error::Unauthenticated)
    }

    /// Access token for the next request.
    pub async fn access_token(&self) -> Result<String> {
        Ok(self.credential().await?.access_token)
    }

    /// Persists a credential obtained from an authorization exchange.
    pub async fn set_credential(&self, credential: Credential) -> Result<()> {
        self.storage.store(&credential).await
    }

    /// Drops the stored credential. The session is unauthenticated
    /// afterwards.
    pub async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }

    /// Exchanges the stored refresh token for a fresh credential and
    /// persists it.
    pub async fn refresh(&self) -> Result<Credential> {
        let _guard = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Single-flight refresh for 401 handlers.
    ///
    /// `observed` is the access token the caller was rejected with. When the
    /// stored token already differs, a concurrent refresh has won the race
    /// and the renewed credential is returned without another
    /// token-endpoint call.
    pub async fn refresh_if_stale(&self, observed: &str) -> Result<Credential> {
        let _guard = self.refresh_gate.lock().await;

        if let Some(current) = self.storage.load().await? {
            if current.access_token != observed {
                debug!("access token already renewed by a concurrent refresh");
                return Ok(current);
            }
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Credential> {
        let current = match self.storage.load().await? {
            Some(credential) => credential,
            None => return Err(Error::RefreshFailed("no credential to refresh".to_string())),
        };

        let renewed = auth::refresh(&self.http, &self.config, &current.refresh_token).await?;
        self.storage.store(&renewed).await?;
        debug!("access token refreshed");
        Ok(renewed)
    }
}
