//! In-memory owner of the session being worked on.
//!
//! All edits to a session go through one `DiagnosticWorkspace`, which
//! re-saves the whole session after every change. Concurrent writers to the
//! same session id are not coordinated by the store, so a session should
//! only ever be edited through a single workspace.

use crate::db::DatabaseError;
use crate::models::{
    AudioRecording, AudioType, DiagnosticImage, DiagnosticResult, DiagnosticSession, ImageType,
    NewSymptom, Symptom,
};
use crate::store::RecordStore;

/// Produces a result for a session. The analysis itself lives outside this
/// crate.
pub trait DiagnosticAnalyzer: Send + Sync {
    fn analyze(&self, session: &DiagnosticSession) -> Result<DiagnosticResult, String>;
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("No active diagnostic session")]
    NoActiveSession,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Analysis failed: {0}")]
    Analysis(String),
}

pub struct DiagnosticWorkspace {
    store: RecordStore,
    current_session: Option<DiagnosticSession>,
    current_result: Option<DiagnosticResult>,
}

impl DiagnosticWorkspace {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            current_session: None,
            current_result: None,
        }
    }

    pub fn session(&self) -> Option<&DiagnosticSession> {
        self.current_session.as_ref()
    }

    pub fn result(&self) -> Option<&DiagnosticResult> {
        self.current_result.as_ref()
    }

    /// Start and persist an empty session. Drops any previous session and
    /// result from the workspace (they stay in the store).
    pub fn create_new_session(
        &mut self,
        user_id: &str,
        language: &str,
    ) -> Result<&DiagnosticSession, WorkspaceError> {
        let session = self
            .store
            .save_diagnostic_session(&DiagnosticSession::new(user_id, language))?;
        tracing::info!(session_id = %session.id, "Diagnostic session started");

        self.current_result = None;
        Ok(self.current_session.insert(session))
    }

    pub fn add_symptom(&mut self, symptom: NewSymptom) -> Result<Symptom, WorkspaceError> {
        let added = self.session_mut()?.add_symptom(symptom).clone();
        self.persist()?;
        Ok(added)
    }

    /// Returns `false` when no symptom had that id; nothing is saved then.
    pub fn remove_symptom(&mut self, symptom_id: &str) -> Result<bool, WorkspaceError> {
        if !self.session_mut()?.remove_symptom(symptom_id) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn add_image(
        &mut self,
        data_url: &str,
        image_type: ImageType,
        body_location: Option<String>,
    ) -> Result<DiagnosticImage, WorkspaceError> {
        let added = self
            .session_mut()?
            .add_image(data_url, image_type, body_location)
            .clone();
        self.persist()?;
        Ok(added)
    }

    /// Detach an image and delete its stored record.
    ///
    /// The session is saved before the record is deleted, so a failure in
    /// between leaves an unreferenced record rather than a dangling
    /// reference.
    pub fn remove_image(&mut self, image_id: &str) -> Result<bool, WorkspaceError> {
        if !self.session_mut()?.remove_image(image_id) {
            return Ok(false);
        }
        let session_id = self.persist()?;
        self.store.delete_image(&session_id, image_id)?;
        Ok(true)
    }

    pub fn add_audio_recording(
        &mut self,
        blob: Vec<u8>,
        url: &str,
        audio_type: AudioType,
        duration: f64,
    ) -> Result<AudioRecording, WorkspaceError> {
        let added = self
            .session_mut()?
            .add_audio_recording(blob, url, audio_type, duration)
            .clone();
        self.persist()?;
        Ok(added)
    }

    /// Same ordering as [`remove_image`](Self::remove_image).
    pub fn remove_audio_recording(&mut self, recording_id: &str) -> Result<bool, WorkspaceError> {
        if !self.session_mut()?.remove_audio_recording(recording_id) {
            return Ok(false);
        }
        let session_id = self.persist()?;
        self.store.delete_audio_recording(&session_id, recording_id)?;
        Ok(true)
    }

    pub fn set_text_description(&mut self, description: &str) -> Result<(), WorkspaceError> {
        self.session_mut()?.set_text_description(description);
        self.persist()?;
        Ok(())
    }

    /// Run `analyzer` over the current session and store its result,
    /// replacing any earlier result for the session.
    pub fn analyze(
        &mut self,
        analyzer: &dyn DiagnosticAnalyzer,
    ) -> Result<&DiagnosticResult, WorkspaceError> {
        let session = self
            .current_session
            .as_ref()
            .ok_or(WorkspaceError::NoActiveSession)?;

        let mut analyzed = analyzer.analyze(session).map_err(WorkspaceError::Analysis)?;
        analyzed.session_id = session.id.clone();
        let result = self.store.save_diagnostic_result(&analyzed)?;

        tracing::info!(
            session_id = %result.session_id,
            severity = %result.severity,
            conditions = result.conditions.len(),
            "Session analyzed"
        );
        Ok(self.current_result.insert(result))
    }

    /// Make a stored session current, with its attachments and any stored
    /// result. Returns `false` and leaves the workspace untouched when no
    /// such session exists.
    pub fn load_session(&mut self, session_id: &str) -> Result<bool, WorkspaceError> {
        let Some(mut session) = self.store.get_diagnostic_session(session_id)? else {
            return Ok(false);
        };
        self.store.rehydrate(&mut session)?;
        let result = self.store.get_diagnostic_result(session_id)?;

        self.current_session = Some(session);
        self.current_result = result;
        Ok(true)
    }

    pub fn load_result(
        &mut self,
        session_id: &str,
    ) -> Result<Option<&DiagnosticResult>, WorkspaceError> {
        self.current_result = self.store.get_diagnostic_result(session_id)?;
        Ok(self.current_result.as_ref())
    }

    /// Forget the current session and result. Stored data is kept.
    pub fn reset(&mut self) {
        self.current_session = None;
        self.current_result = None;
    }

    fn session_mut(&mut self) -> Result<&mut DiagnosticSession, WorkspaceError> {
        self.current_session
            .as_mut()
            .ok_or(WorkspaceError::NoActiveSession)
    }

    /// Save the current session; returns its id.
    fn persist(&self) -> Result<String, WorkspaceError> {
        let session = self
            .current_session
            .as_ref()
            .ok_or(WorkspaceError::NoActiveSession)?;
        self.store.save_diagnostic_session(session)?;
        Ok(session.id.clone())
    }
}
