use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serde representation is the same string `as_str` returns, so
/// persisted records keep their legacy enum spellings.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(SymptomSeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(ImageType {
    Skin => "skin",
    Eye => "eye",
    Wound => "wound",
    Other => "other",
});

str_enum!(AudioType {
    Cough => "cough",
    Breathing => "breathing",
    Voice => "voice",
    Other => "other",
});

str_enum!(SensorType {
    HeartRate => "heartRate",
    Temperature => "temperature",
    BloodPressure => "bloodPressure",
    OxygenSaturation => "oxygenSaturation",
});

str_enum!(ResultSeverity {
    Low => "low",
    Medium => "medium",
    High => "high",
    Emergency => "emergency",
});

str_enum!(ActionType {
    Medication => "medication",
    Specialist => "specialist",
    Test => "test",
    Lifestyle => "lifestyle",
    Emergency => "emergency",
});

str_enum!(Urgency {
    Routine => "routine",
    Soon => "soon",
    Urgent => "urgent",
    Immediate => "immediate",
});

str_enum!(FacilityType {
    Hospital => "hospital",
    Clinic => "clinic",
    Pharmacy => "pharmacy",
    Specialist => "specialist",
});

str_enum!(Theme {
    Light => "light",
    Dark => "dark",
    System => "system",
});

str_enum!(LlmProvider {
    OpenAi => "openai",
    Google => "google",
    Azure => "azure",
    Anthropic => "anthropic",
    Custom => "custom",
});
