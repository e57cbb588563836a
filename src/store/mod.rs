//! Record store: keyed persistence for the five record kinds.
//!
//! User profiles, sessions, results, images and audio recordings all share
//! one flat key space (see [`keys`]). A session and its attachments are
//! written as separate keys so an attachment can be loaded or removed on
//! its own; nothing here is transactional across keys. A failure halfway
//! through a multi-key write or cascade leaves the keys already touched as
//! they are.
//!
//! Listing by user and the retention sweep scan every `session_*` key.
//! Callers must serialize writes to the same session id themselves.

mod erasure;
mod export;
pub mod keys;
mod profile;
mod result;
mod session;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::KeyValueBackend;

pub use export::UserDataExport;

/// Handle over a [`KeyValueBackend`]. Cheap to clone.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub(crate) fn backend(&self) -> &dyn KeyValueBackend {
        self.backend.as_ref()
    }
}

/// Counts of what a cascade delete or retention sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub sessions: usize,
    pub images: usize,
    pub audio_recordings: usize,
    pub results: usize,
}

impl DeletionReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn absorb(&mut self, other: DeletionReport) {
        self.sessions += other.sessions;
        self.images += other.images;
        self.audio_recordings += other.audio_recordings;
        self.results += other.results;
    }
}
