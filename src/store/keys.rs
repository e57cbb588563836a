//! Backend key scheme. These strings are the on-disk contract: data written
//! by earlier builds is addressed with exactly these patterns.

pub const USER_PREFIX: &str = "user_";
pub const SESSION_PREFIX: &str = "session_";
pub const RESULT_PREFIX: &str = "result_";
pub const IMAGE_PREFIX: &str = "image_";
pub const AUDIO_PREFIX: &str = "audio_";
pub const CURRENT_USER_KEY: &str = "currentUserId";

pub fn user_key(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

pub fn session_key(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}

pub fn result_key(session_id: &str) -> String {
    format!("{RESULT_PREFIX}{session_id}")
}

pub fn image_key(session_id: &str, image_id: &str) -> String {
    format!("{IMAGE_PREFIX}{session_id}_{image_id}")
}

pub fn audio_key(session_id: &str, recording_id: &str) -> String {
    format!("{AUDIO_PREFIX}{session_id}_{recording_id}")
}
