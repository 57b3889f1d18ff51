//! Wire and domain types shared by the session core.

use crate::config::{MAX_RIR, MIN_RIR};
use crate::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque backend identifier of a persisted set.
///
/// The backend may hand out numeric or string ids; both are kept as text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetId(pub String);

impl SetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Serialize for SetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => SetId(n.to_string()),
            RawId::Text(s) => SetId(s),
        })
    }
}

/// One performed or planned block of repetitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Set {
    #[serde(default)]
    pub id: Option<SetId>,
    pub set_number: u32,
    pub actual_weight: f64,
    pub actual_reps: u32,
    #[serde(default)]
    pub actual_rir: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Set {
    /// Field values of this set as an editable draft.
    pub fn to_draft(&self) -> SetDraft {
        SetDraft {
            actual_weight: self.actual_weight,
            actual_reps: self.actual_reps as i32,
            actual_rir: self.actual_rir.map(i32::from),
            notes: self.notes.clone(),
        }
    }

    /// True when weight, reps or RIR differ from `other`.
    pub fn performance_differs(&self, other: &Set) -> bool {
        self.actual_weight != other.actual_weight
            || self.actual_reps != other.actual_reps
            || self.actual_rir != other.actual_rir
    }
}

/// Unvalidated user input for a set.
///
/// Signed fields keep out-of-range input representable so validation can
/// reject it instead of the parser silently clamping.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SetDraft {
    pub actual_weight: f64,
    pub actual_reps: i32,
    pub actual_rir: Option<i32>,
    pub notes: Option<String>,
}

impl SetDraft {
    /// Check the draft locally before anything is sent to the server.
    pub fn validate(&self) -> Result<SetFields, ValidationError> {
        if !self.actual_weight.is_finite() {
            return Err(ValidationError::NonFiniteWeight);
        }
        if self.actual_weight < 0.0 {
            return Err(ValidationError::NegativeWeight(self.actual_weight));
        }
        if self.actual_reps < 0 {
            return Err(ValidationError::NegativeReps(self.actual_reps));
        }
        let actual_rir = match self.actual_rir {
            None => None,
            Some(rir) if (MIN_RIR..=MAX_RIR).contains(&rir) => Some(rir as u8),
            Some(rir) => return Err(ValidationError::RirOutOfRange(rir)),
        };
        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(SetFields {
            actual_weight: self.actual_weight,
            actual_reps: self.actual_reps as u32,
            actual_rir,
            notes,
        })
    }
}

/// Validated field values, ready to be sent or merged into the cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetFields {
    pub actual_weight: f64,
    pub actual_reps: u32,
    pub actual_rir: Option<u8>,
    pub notes: Option<String>,
}

/// Partial update merged into a cached set.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SetPatch {
    pub actual_weight: Option<f64>,
    pub actual_reps: Option<u32>,
    /// `Some(None)` clears a recorded RIR.
    pub actual_rir: Option<Option<u8>>,
    pub notes: Option<Option<String>>,
}

impl From<&SetFields> for SetPatch {
    fn from(fields: &SetFields) -> Self {
        Self {
            actual_weight: Some(fields.actual_weight),
            actual_reps: Some(fields.actual_reps),
            actual_rir: Some(fields.actual_rir),
            notes: Some(fields.notes.clone()),
        }
    }
}

impl From<&Set> for SetPatch {
    fn from(set: &Set) -> Self {
        Self {
            actual_weight: Some(set.actual_weight),
            actual_reps: Some(set.actual_reps),
            actual_rir: Some(set.actual_rir),
            notes: Some(set.notes.clone()),
        }
    }
}

/// Body of `POST /workouts/{workoutId}/sets`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewSetBody {
    pub exercise_id: String,
    pub set_number: u32,
    pub actual_weight: f64,
    pub actual_reps: u32,
    pub actual_rir: Option<u8>,
    pub notes: Option<String>,
}

/// Envelope of `GET /workouts/{workoutId}/sets`.
#[derive(Debug, Deserialize)]
pub struct SetList {
    #[serde(default)]
    pub data: Option<Vec<Set>>,
}

/// Recommended parameters for the next set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_weight_kg: f64,
    pub target_reps_low: u32,
    pub target_reps_high: u32,
    pub target_rir: Option<u8>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub readiness_score_percent: Option<f64>,
}

/// Last recorded set of the exercise in an earlier workout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviousSet {
    pub actual_weight: f64,
    pub actual_reps: u32,
    #[serde(default)]
    pub actual_rir: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviousPerformance {
    pub previous_set: Option<PreviousSet>,
    #[serde(default)]
    pub progression_metric_string: Option<String>,
    #[serde(default)]
    pub is_positive_progression: Option<bool>,
}

/// Previous-performance comparison as displayed.
#[derive(Clone, Debug, PartialEq)]
pub enum Comparison {
    /// The server has no earlier data for this exercise (404).
    NoPriorData,
    Previous(PreviousPerformance),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_id_accepts_numbers_and_strings() {
        let numeric: Set = serde_json::from_str(
            r#"{"id": 42, "set_number": 1, "actual_weight": 60.0, "actual_reps": 8}"#,
        )
        .unwrap();
        assert_eq!(numeric.id, Some(SetId::new("42")));
        assert_eq!(numeric.actual_rir, None);

        let text: Set = serde_json::from_str(
            r#"{"id": "a1b2", "set_number": 2, "actual_weight": 62.5, "actual_reps": 6, "actual_rir": 2}"#,
        )
        .unwrap();
        assert_eq!(text.id, Some(SetId::new("a1b2")));
        assert_eq!(text.actual_rir, Some(2));
    }

    fn draft(weight: f64, reps: i32, rir: Option<i32>) -> SetDraft {
        SetDraft {
            actual_weight: weight,
            actual_reps: reps,
            actual_rir: rir,
            notes: None,
        }
    }

    #[test]
    fn validate_rejects_out_of_range_fields() {
        assert_eq!(
            draft(-1.0, 5, None).validate(),
            Err(ValidationError::NegativeWeight(-1.0))
        );
        assert_eq!(
            draft(f64::NAN, 5, None).validate(),
            Err(ValidationError::NonFiniteWeight)
        );
        assert_eq!(
            draft(60.0, -3, None).validate(),
            Err(ValidationError::NegativeReps(-3))
        );
        assert_eq!(
            draft(60.0, 5, Some(11)).validate(),
            Err(ValidationError::RirOutOfRange(11))
        );
        assert_eq!(
            draft(60.0, 5, Some(-1)).validate(),
            Err(ValidationError::RirOutOfRange(-1))
        );
    }

    #[test]
    fn validate_accepts_boundaries_and_trims_notes() {
        let mut d = draft(0.0, 0, Some(10));
        d.notes = Some("   ".into());
        let fields = d.validate().unwrap();
        assert_eq!(fields.actual_weight, 0.0);
        assert_eq!(fields.actual_reps, 0);
        assert_eq!(fields.actual_rir, Some(10));
        assert_eq!(fields.notes, None);

        let fields = draft(100.0, 5, Some(0)).validate().unwrap();
        assert_eq!(fields.actual_rir, Some(0));
    }

    #[test]
    fn missing_list_data_is_none() {
        let list: SetList = serde_json::from_str("{}").unwrap();
        assert!(list.data.is_none());
    }

    #[test]
    fn performance_differs_ignores_notes() {
        let a = Set {
            id: None,
            set_number: 1,
            actual_weight: 100.0,
            actual_reps: 5,
            actual_rir: Some(2),
            notes: None,
        };
        let mut b = a.clone();
        b.notes = Some("felt easy".into());
        assert!(!a.performance_differs(&b));
        b.actual_reps = 6;
        assert!(a.performance_differs(&b));
    }
}
