use serde::{Deserialize, Serialize};

use super::RecordStore;
use crate::db::DatabaseError;
use crate::models::{DiagnosticResult, DiagnosticSession, UserInfo};

/// Everything the store holds for one user, as handed to the user on an
/// export request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataExport {
    pub user_data: Option<UserInfo>,
    pub sessions: Vec<DiagnosticSession>,
    /// Only sessions that have been analyzed contribute a result.
    pub results: Vec<DiagnosticResult>,
}

impl RecordStore {
    /// Gather the profile, rehydrated sessions and existing results for
    /// `user_id`. Read-only.
    pub fn collect_user_data(&self, user_id: &str) -> Result<UserDataExport, DatabaseError> {
        let user_data = self.get_user_info(user_id)?;
        let sessions = self.get_user_sessions(user_id)?;

        let mut results = Vec::with_capacity(sessions.len());
        for session in &sessions {
            if let Some(result) = self.get_diagnostic_result(&session.id)? {
                results.push(result);
            }
        }

        Ok(UserDataExport {
            user_data,
            sessions,
            results,
        })
    }

    /// [`collect_user_data`](Self::collect_user_data) as a pretty-printed
    /// JSON document.
    pub fn export_user_data(&self, user_id: &str) -> Result<String, DatabaseError> {
        let export = self.collect_user_data(user_id)?;
        tracing::info!(
            sessions = export.sessions.len(),
            results = export.results.len(),
            "User data exported"
        );
        Ok(serde_json::to_string_pretty(&export)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{cough, memory_store, result_for};
    use super::*;
    use crate::models::{AudioType, ImageType};

    #[test]
    fn collects_profile_sessions_and_results() {
        let store = memory_store();
        let user = store
            .save_user_info(&UserInfo {
                id: Some("u1".into()),
                name: Some("Juma".into()),
                ..Default::default()
            })
            .unwrap();

        let mut analyzed = DiagnosticSession::new("u1", "en");
        analyzed.add_symptom(cough());
        analyzed.add_image("data:,img", ImageType::Skin, None);
        store.save_diagnostic_session(&analyzed).unwrap();
        store.save_diagnostic_result(&result_for(&analyzed.id)).unwrap();

        let mut pending = DiagnosticSession::new("u1", "sw");
        pending.add_audio_recording(vec![7; 8], "blob:p", AudioType::Cough, 2.0);
        store.save_diagnostic_session(&pending).unwrap();

        store.save_diagnostic_session(&DiagnosticSession::new("u2", "en")).unwrap();

        let export = store.collect_user_data("u1").unwrap();
        assert_eq!(export.user_data, Some(user));
        assert_eq!(export.sessions.len(), 2);
        assert_eq!(export.results.len(), 1);
        assert_eq!(export.results[0].session_id, analyzed.id);
    }

    #[test]
    fn json_document_shape() {
        let store = memory_store();
        store.save_diagnostic_session(&DiagnosticSession::new("u1", "en")).unwrap();

        let json = store.export_user_data("u1").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["userData"].is_null());
        assert_eq!(value["sessions"].as_array().unwrap().len(), 1);
        assert_eq!(value["results"].as_array().unwrap().len(), 0);
        assert!(json.contains('\n'));
    }

    #[test]
    fn export_does_not_mutate() {
        let store = memory_store();
        let mut session = DiagnosticSession::new("u1", "en");
        session.add_image("data:,x", ImageType::Eye, None);
        store.save_diagnostic_session(&session).unwrap();

        let before = crate::db::KeyValueBackend::keys(store.backend()).unwrap();
        store.export_user_data("u1").unwrap();
        assert_eq!(crate::db::KeyValueBackend::keys(store.backend()).unwrap(), before);
    }
}
