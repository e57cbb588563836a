use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ActionType, FacilityType, ResultSeverity, Urgency};

/// Analysis output for one session. Keyed by `session_id`; re-analysis overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub session_id: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub recommended_actions: Vec<RecommendedAction>,
    pub severity: ResultSeverity,
    /// 0..=1
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    /// ICD-11 code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icd_code: Option<String>,
    /// 0..=1
    pub probability: f64,
    pub description: String,
    #[serde(default)]
    pub common_symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub description: String,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// 0..=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_options: Option<Vec<NearbyHealthcareOption>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// e.g. "WHO"
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyHealthcareOption {
    pub name: String,
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

impl DiagnosticResult {
    /// Name of the first score outside 0..=1, if any.
    pub fn out_of_range_score(&self) -> Option<String> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);

        if !in_unit(self.confidence) {
            return Some("confidence".into());
        }
        if let Some(c) = self.conditions.iter().find(|c| !in_unit(c.probability)) {
            return Some(format!("probability of condition '{}'", c.name));
        }
        self.recommended_actions
            .iter()
            .find(|a| a.effectiveness.is_some_and(|e| !in_unit(e)))
            .map(|a| format!("effectiveness of action '{}'", a.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(confidence: f64) -> DiagnosticResult {
        DiagnosticResult {
            session_id: "s1".into(),
            conditions: vec![Condition {
                name: "Common cold".into(),
                icd_code: Some("CA07".into()),
                probability: 0.7,
                description: "Viral upper respiratory infection".into(),
                common_symptoms: vec!["Cough".into()],
                references: None,
            }],
            recommended_actions: vec![RecommendedAction {
                action_type: ActionType::Lifestyle,
                description: "Rest and fluids".into(),
                urgency: Urgency::Routine,
                cost: None,
                effectiveness: Some(0.6),
                nearby_options: None,
            }],
            severity: ResultSeverity::Low,
            confidence,
            timestamp: Utc::now(),
            disclaimer: "Not medical advice".into(),
        }
    }

    #[test]
    fn in_range_scores_pass() {
        assert!(result(0.0).out_of_range_score().is_none());
        assert!(result(1.0).out_of_range_score().is_none());
    }

    #[test]
    fn out_of_range_scores_named() {
        assert_eq!(result(1.2).out_of_range_score().as_deref(), Some("confidence"));

        let mut r = result(0.5);
        r.recommended_actions[0].effectiveness = Some(-0.1);
        assert!(r.out_of_range_score().unwrap().contains("Rest and fluids"));

        let mut r = result(0.5);
        r.conditions[0].probability = f64::NAN;
        assert!(r.out_of_range_score().unwrap().contains("Common cold"));
    }

    #[test]
    fn action_type_serialized_as_type() {
        let json = serde_json::to_value(result(0.5)).unwrap();
        assert_eq!(json["recommendedActions"][0]["type"], "lifestyle");
        assert_eq!(json["conditions"][0]["icdCode"], "CA07");
        assert_eq!(json["sessionId"], "s1");
    }
}
