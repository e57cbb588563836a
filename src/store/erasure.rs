use chrono::{DateTime, Duration, Utc};

use super::keys::{audio_key, image_key, result_key, session_key, user_key, CURRENT_USER_KEY};
use super::session::SessionHeader;
use super::{DeletionReport, RecordStore};
use crate::db::DatabaseError;

impl RecordStore {
    /// Remove the user's profile and every session they own, together with
    /// the sessions' images, audio and results. Clears the current-user
    /// pointer if it named this user.
    ///
    /// Not atomic: a backend failure stops the cascade and leaves the keys
    /// already removed gone.
    pub fn delete_user_data(&self, user_id: &str) -> Result<DeletionReport, DatabaseError> {
        let mut report = DeletionReport::default();

        for header in self.session_headers()? {
            if header.user_id != user_id {
                continue;
            }
            report.absorb(self.delete_session_cascade(&header)?);
        }

        self.backend().remove(&user_key(user_id))?;

        if self.current_user_id()?.as_deref() == Some(user_id) {
            self.backend().remove(CURRENT_USER_KEY)?;
        }

        tracing::info!(
            sessions = report.sessions,
            images = report.images,
            audio = report.audio_recordings,
            results = report.results,
            "User data deleted"
        );
        Ok(report)
    }

    /// Purge sessions older than `retention_days`. Negative values mean
    /// "keep forever" and purge nothing; `0` purges every session older
    /// than now. User profiles are never touched.
    pub fn cleanup_expired_data(&self, retention_days: i64) -> Result<DeletionReport, DatabaseError> {
        self.cleanup_expired_data_at(retention_days, Utc::now())
    }

    pub(crate) fn cleanup_expired_data_at(
        &self,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Result<DeletionReport, DatabaseError> {
        let mut report = DeletionReport::default();
        if retention_days < 0 {
            return Ok(report);
        }

        // A window too large to represent expires nothing
        let Some(cutoff) = Duration::try_days(retention_days).and_then(|d| now.checked_sub_signed(d))
        else {
            return Ok(report);
        };

        for header in self.session_headers()? {
            let created = match DateTime::parse_from_rfc3339(&header.timestamp) {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!(
                        session_id = %header.id,
                        error = %e,
                        "Skipping session with unreadable timestamp"
                    );
                    continue;
                }
            };
            if created < cutoff {
                report.absorb(self.delete_session_cascade(&header)?);
            }
        }

        if !report.is_empty() {
            tracing::info!(
                retention_days,
                sessions = report.sessions,
                images = report.images,
                audio = report.audio_recordings,
                results = report.results,
                "Expired sessions purged"
            );
        }
        Ok(report)
    }

    fn delete_session_cascade(&self, header: &SessionHeader) -> Result<DeletionReport, DatabaseError> {
        let mut report = DeletionReport::default();

        for image in &header.images {
            if self.remove_existing(&image_key(&header.id, &image.id))? {
                report.images += 1;
            }
        }
        for recording in &header.audio_recordings {
            if self.remove_existing(&audio_key(&header.id, &recording.id))? {
                report.audio_recordings += 1;
            }
        }
        if self.remove_existing(&result_key(&header.id))? {
            report.results += 1;
        }

        self.backend().remove(&session_key(&header.id))?;
        report.sessions += 1;

        Ok(report)
    }

    /// Remove `key`; returns whether it was present.
    fn remove_existing(&self, key: &str) -> Result<bool, DatabaseError> {
        if self.backend().get(key)?.is_none() {
            return Ok(false);
        }
        self.backend().remove(key)?;
        Ok(true)
    }
}
