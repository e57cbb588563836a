use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AudioType, ImageType, SensorType, SymptomSeverity};

/// Aggregate root of one symptom check.
///
/// Owns its images, audio recordings and sensor readings. `id` is fixed once
/// assigned; symptom ids are unique within the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSession {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<DiagnosticImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_recordings: Vec<AudioRecording>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensor_data: Vec<SensorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: String,
    pub name: String,
    pub severity: SymptomSeverity,
    /// Free text, e.g. "2 days"
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A symptom as entered, before the session assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSymptom {
    pub name: String,
    pub severity: SymptomSeverity,
    pub duration: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticImage {
    pub id: String,
    /// base64 data URL
    pub data_url: String,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_location: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRecording {
    pub id: String,
    /// Raw audio payload, carried as base64 in the JSON record
    #[serde(with = "base64_bytes")]
    pub blob: Vec<u8>,
    /// Playback URL handed out by the capture layer
    pub url: String,
    #[serde(rename = "type")]
    pub audio_type: AudioType,
    /// Seconds
    pub duration: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticSession {
    /// Start an empty session for `user_id` with a fresh id.
    pub fn new(user_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            symptoms: Vec::new(),
            images: Vec::new(),
            audio_recordings: Vec::new(),
            sensor_data: Vec::new(),
            text_description: None,
            timestamp: Utc::now(),
            language: language.into(),
        }
    }

    pub fn add_symptom(&mut self, symptom: NewSymptom) -> &Symptom {
        self.symptoms.push(Symptom {
            id: Uuid::new_v4().to_string(),
            name: symptom.name,
            severity: symptom.severity,
            duration: symptom.duration,
            description: symptom.description,
        });
        &self.symptoms[self.symptoms.len() - 1]
    }

    /// Returns `true` if a symptom was removed.
    pub fn remove_symptom(&mut self, symptom_id: &str) -> bool {
        let before = self.symptoms.len();
        self.symptoms.retain(|s| s.id != symptom_id);
        self.symptoms.len() != before
    }

    pub fn add_image(
        &mut self,
        data_url: impl Into<String>,
        image_type: ImageType,
        body_location: Option<String>,
    ) -> &DiagnosticImage {
        self.images.push(DiagnosticImage {
            id: Uuid::new_v4().to_string(),
            data_url: data_url.into(),
            image_type,
            body_location,
            timestamp: Utc::now(),
        });
        &self.images[self.images.len() - 1]
    }

    pub fn remove_image(&mut self, image_id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|i| i.id != image_id);
        self.images.len() != before
    }

    pub fn add_audio_recording(
        &mut self,
        blob: Vec<u8>,
        url: impl Into<String>,
        audio_type: AudioType,
        duration: f64,
    ) -> &AudioRecording {
        self.audio_recordings.push(AudioRecording {
            id: Uuid::new_v4().to_string(),
            blob,
            url: url.into(),
            audio_type,
            duration,
            timestamp: Utc::now(),
        });
        &self.audio_recordings[self.audio_recordings.len() - 1]
    }

    pub fn remove_audio_recording(&mut self, recording_id: &str) -> bool {
        let before = self.audio_recordings.len();
        self.audio_recordings.retain(|r| r.id != recording_id);
        self.audio_recordings.len() != before
    }

    pub fn set_text_description(&mut self, description: impl Into<String>) {
        self.text_description = Some(description.into());
    }

    /// First symptom id that appears more than once, if any.
    pub fn duplicate_symptom_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.symptoms
            .iter()
            .find(|s| !seen.insert(s.id.as_str()))
            .map(|s| s.id.as_str())
    }

    /// Name of the first NaN or infinite measurement, if any. JSON has no
    /// encoding for these, so they cannot be stored.
    pub fn non_finite_measurement(&self) -> Option<String> {
        if let Some(r) = self.audio_recordings.iter().find(|r| !r.duration.is_finite()) {
            return Some(format!("duration of audio recording {}", r.id));
        }
        self.sensor_data
            .iter()
            .find(|s| !s.value.is_finite())
            .map(|s| format!("{} sensor value", s.sensor_type))
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
