use uuid::Uuid;

use super::keys::{user_key, CURRENT_USER_KEY};
use super::RecordStore;
use crate::db::{get_json, set_json, DatabaseError};
use crate::models::UserInfo;

impl RecordStore {
    /// Upsert a profile, assigning an id when it has none. Returns the
    /// stored record.
    pub fn save_user_info(&self, info: &UserInfo) -> Result<UserInfo, DatabaseError> {
        let mut info = info.clone();
        let id = match info.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = Uuid::new_v4().to_string();
                info.id = Some(id.clone());
                id
            }
        };
        set_json(self.backend(), &user_key(&id), &info)?;
        Ok(info)
    }

    pub fn get_user_info(&self, user_id: &str) -> Result<Option<UserInfo>, DatabaseError> {
        get_json(self.backend(), &user_key(user_id))
    }

    /// Profile the current-user pointer refers to. `None` when no pointer
    /// is set or it points at a missing profile.
    pub fn get_current_user(&self) -> Result<Option<UserInfo>, DatabaseError> {
        match self.current_user_id()? {
            Some(id) if !id.is_empty() => self.get_user_info(&id),
            _ => Ok(None),
        }
    }

    pub fn set_current_user(&self, user_id: &str) -> Result<(), DatabaseError> {
        set_json(self.backend(), CURRENT_USER_KEY, user_id)
    }

    pub(crate) fn current_user_id(&self) -> Result<Option<String>, DatabaseError> {
        get_json(self.backend(), CURRENT_USER_KEY)
    }
}
