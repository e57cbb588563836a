use super::keys::result_key;
use super::RecordStore;
use crate::db::{get_json, set_json, DatabaseError};
use crate::models::DiagnosticResult;

impl RecordStore {
    /// Upsert the result for its session. Re-analysis overwrites the
    /// previous result. Returns the stored record.
    pub fn save_diagnostic_result(
        &self,
        result: &DiagnosticResult,
    ) -> Result<DiagnosticResult, DatabaseError> {
        if let Some(field) = result.out_of_range_score() {
            return Err(DatabaseError::ConstraintViolation(format!(
                "{field} outside 0..=1 in result for session {}",
                result.session_id
            )));
        }
        set_json(self.backend(), &result_key(&result.session_id), result)?;
        tracing::debug!(session_id = %result.session_id, "Result saved");
        Ok(result.clone())
    }

    pub fn get_diagnostic_result(
        &self,
        session_id: &str,
    ) -> Result<Option<DiagnosticResult>, DatabaseError> {
        get_json(self.backend(), &result_key(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_store, result_for};
    use crate::db::DatabaseError;
    use crate::models::ResultSeverity;

    #[test]
    fn save_and_get() {
        let store = memory_store();
        let result = result_for("s1");
        let saved = store.save_diagnostic_result(&result).unwrap();
        assert_eq!(saved, result);
        assert_eq!(store.get_diagnostic_result("s1").unwrap(), Some(saved));
    }

    #[test]
    fn missing_result_is_none() {
        let store = memory_store();
        assert!(store.get_diagnostic_result("nope").unwrap().is_none());
    }

    #[test]
    fn reanalysis_overwrites() {
        let store = memory_store();
        store.save_diagnostic_result(&result_for("s1")).unwrap();

        let mut second = result_for("s1");
        second.severity = ResultSeverity::High;
        second.confidence = 0.95;
        store.save_diagnostic_result(&second).unwrap();

        let stored = store.get_diagnostic_result("s1").unwrap().unwrap();
        assert_eq!(stored.severity, ResultSeverity::High);
        assert_eq!(stored.confidence, 0.95);
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let store = memory_store();
        let mut result = result_for("s1");
        result.conditions[0].probability = 1.2;

        let err = store.save_diagnostic_result(&result).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
        assert!(store.get_diagnostic_result("s1").unwrap().is_none());
    }
}
