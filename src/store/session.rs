use serde::Deserialize;
use uuid::Uuid;

use super::keys::{audio_key, image_key, session_key, SESSION_PREFIX};
use super::RecordStore;
use crate::db::{get_json, keys_with_prefix, set_json, DatabaseError};
use crate::models::{AudioRecording, DiagnosticImage, DiagnosticSession};

/// The parts of a stored session needed to locate its dependents, without
/// decoding attachment payloads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionHeader {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub images: Vec<AttachmentRef>,
    #[serde(default)]
    pub audio_recordings: Vec<AttachmentRef>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AttachmentRef {
    pub id: String,
}

impl RecordStore {
    /// Write the whole session record, then every attached image and audio
    /// recording under its own key. Assigns an id when the session has none.
    ///
    /// Rejects sessions with repeated symptom ids or NaN/infinite
    /// measurements before writing anything.
    pub fn save_diagnostic_session(
        &self,
        session: &DiagnosticSession,
    ) -> Result<DiagnosticSession, DatabaseError> {
        if let Some(dup) = session.duplicate_symptom_id() {
            return Err(DatabaseError::ConstraintViolation(format!(
                "duplicate symptom id {dup} in session {}",
                session.id
            )));
        }
        if let Some(field) = session.non_finite_measurement() {
            return Err(DatabaseError::ConstraintViolation(format!(
                "{field} is not a finite number in session {}",
                session.id
            )));
        }

        let mut session = session.clone();
        if session.id.is_empty() {
            session.id = Uuid::new_v4().to_string();
        }

        set_json(self.backend(), &session_key(&session.id), &session)?;

        for image in &session.images {
            self.save_image(&session.id, image)?;
        }
        for recording in &session.audio_recordings {
            self.save_audio_recording(&session.id, recording)?;
        }

        tracing::debug!(
            session_id = %session.id,
            images = session.images.len(),
            audio = session.audio_recordings.len(),
            "Session saved"
        );
        Ok(session)
    }

    /// The session record exactly as stored. Attachments are the inline
    /// copies from the last save and are not re-read from their own keys.
    pub fn get_diagnostic_session(
        &self,
        session_id: &str,
    ) -> Result<Option<DiagnosticSession>, DatabaseError> {
        get_json(self.backend(), &session_key(session_id))
    }

    /// Every session owned by `user_id`, with images and audio replaced by
    /// the copies stored under their own keys.
    ///
    /// Scans all session keys. A referenced attachment that is missing fails
    /// the whole call with `NotFound`.
    pub fn get_user_sessions(&self, user_id: &str) -> Result<Vec<DiagnosticSession>, DatabaseError> {
        let mut sessions = Vec::new();

        for key in keys_with_prefix(self.backend(), SESSION_PREFIX)? {
            let Some(mut session) = get_json::<DiagnosticSession>(self.backend(), &key)? else {
                continue;
            };
            if session.user_id != user_id {
                continue;
            }
            self.rehydrate(&mut session)?;
            sessions.push(session);
        }

        Ok(sessions)
    }

    /// Remove one image record. The caller is responsible for dropping it
    /// from the session's list.
    pub fn delete_image(&self, session_id: &str, image_id: &str) -> Result<(), DatabaseError> {
        self.backend().remove(&image_key(session_id, image_id))
    }

    /// Remove one audio record. The caller is responsible for dropping it
    /// from the session's list.
    pub fn delete_audio_recording(
        &self,
        session_id: &str,
        recording_id: &str,
    ) -> Result<(), DatabaseError> {
        self.backend().remove(&audio_key(session_id, recording_id))
    }

    pub fn get_image(
        &self,
        session_id: &str,
        image_id: &str,
    ) -> Result<DiagnosticImage, DatabaseError> {
        get_json(self.backend(), &image_key(session_id, image_id))?
            .ok_or_else(|| DatabaseError::not_found("image", image_id))
    }

    pub fn get_audio_recording(
        &self,
        session_id: &str,
        recording_id: &str,
    ) -> Result<AudioRecording, DatabaseError> {
        get_json(self.backend(), &audio_key(session_id, recording_id))?
            .ok_or_else(|| DatabaseError::not_found("audio recording", recording_id))
    }

    fn save_image(&self, session_id: &str, image: &DiagnosticImage) -> Result<(), DatabaseError> {
        set_json(self.backend(), &image_key(session_id, &image.id), image)
    }

    fn save_audio_recording(
        &self,
        session_id: &str,
        recording: &AudioRecording,
    ) -> Result<(), DatabaseError> {
        set_json(self.backend(), &audio_key(session_id, &recording.id), recording)
    }

    pub(crate) fn rehydrate(&self, session: &mut DiagnosticSession) -> Result<(), DatabaseError> {
        for image in session.images.iter_mut() {
            *image = self.get_image(&session.id, &image.id)?;
        }
        for recording in session.audio_recordings.iter_mut() {
            *recording = self.get_audio_recording(&session.id, &recording.id)?;
        }
        Ok(())
    }

    /// Headers of every stored session, in key order.
    pub(super) fn session_headers(&self) -> Result<Vec<SessionHeader>, DatabaseError> {
        let mut headers = Vec::new();
        for key in keys_with_prefix(self.backend(), SESSION_PREFIX)? {
            if let Some(header) = get_json::<SessionHeader>(self.backend(), &key)? {
                headers.push(header);
            }
        }
        Ok(headers)
    }
}
