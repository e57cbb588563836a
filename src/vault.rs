//! Process-wide context.
//!
//! `HealthVault` is built once at startup and handed to every consumer. It
//! owns the backend, the record store and the encryption manager, so there
//! is exactly one key per vault and no global state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config;
use crate::crypto::{CryptoError, EncryptionManager, KeyStatus};
use crate::db::{DatabaseError, KeyValueBackend, MemoryBackend, SqliteBackend};
use crate::models::{AppSettings, SettingsPatch};
use crate::settings;
use crate::store::RecordStore;
use crate::workspace::DiagnosticWorkspace;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Where the vault keeps its data.
#[derive(Debug, Clone, Default)]
pub struct VaultConfig {
    /// SQLite file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
}

impl VaultConfig {
    /// The default on-disk location under the app data directory.
    pub fn from_env() -> Self {
        Self {
            db_path: Some(config::store_path()),
        }
    }

    pub fn in_memory() -> Self {
        Self { db_path: None }
    }
}

#[derive(Clone)]
pub struct HealthVault {
    backend: Arc<dyn KeyValueBackend>,
    store: RecordStore,
    encryption: Arc<EncryptionManager>,
}

impl HealthVault {
    pub fn open(config: &VaultConfig) -> Result<Self, VaultError> {
        let backend: Arc<dyn KeyValueBackend> = match &config.db_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Opening record store");
                Arc::new(SqliteBackend::open(path)?)
            }
            None => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::with_backend(backend))
    }

    pub fn with_backend(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            store: RecordStore::new(Arc::clone(&backend)),
            encryption: Arc::new(EncryptionManager::new(Arc::clone(&backend))),
            backend,
        }
    }

    /// Bring up encryption. A failure is logged and the vault keeps working
    /// without encryption; returns whether encryption is available.
    pub fn start(&self) -> bool {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
        match self.encryption.initialize() {
            Ok(()) => {
                tracing::info!(key_id = ?self.encryption.key_id(), "Encryption ready");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Encryption unavailable, continuing without it");
                false
            }
        }
    }

    pub fn encryption_ready(&self) -> bool {
        self.encryption.status() == KeyStatus::Ready
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn encryption(&self) -> &EncryptionManager {
        &self.encryption
    }

    /// A fresh workspace over this vault's store.
    pub fn workspace(&self) -> DiagnosticWorkspace {
        DiagnosticWorkspace::new(self.store.clone())
    }

    /// Run blocking store work off the async executor.
    pub async fn run<F, T>(&self, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&RecordStore) -> Result<T, DatabaseError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let value = tokio::task::spawn_blocking(move || f(&store)).await??;
        Ok(value)
    }

    pub fn settings(&self) -> Result<AppSettings, VaultError> {
        Ok(settings::load_settings(self.backend.as_ref())?)
    }

    /// Apply a settings patch. When the retention window changes to a
    /// finite value, expired sessions are purged straight away.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<AppSettings, VaultError> {
        let previous = settings::load_settings(self.backend.as_ref())?;
        let updated = settings::update_settings(self.backend.as_ref(), patch)?;

        let days = updated.data_retention_days;
        if days != previous.data_retention_days && days >= 0 {
            self.store.cleanup_expired_data(days)?;
        }
        Ok(updated)
    }
}
