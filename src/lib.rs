pub mod config;
pub mod models;
pub mod db;
pub mod crypto;
pub mod store;
pub mod settings;
pub mod workspace; // session editing + analysis hand-off
pub mod vault; // process context

pub use crypto::{CryptoError, EncryptedPayload, EncryptionManager};
pub use db::DatabaseError;
pub use store::{DeletionReport, RecordStore, UserDataExport};
pub use vault::{HealthVault, VaultConfig, VaultError};
pub use workspace::{DiagnosticAnalyzer, DiagnosticWorkspace, WorkspaceError};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
