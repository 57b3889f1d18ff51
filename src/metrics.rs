//! Performance figures derived from logged sets.

use crate::models::{PreviousSet, Set};

/// Estimated one-repetition maximum (Epley).
pub fn estimated_1rm(weight: f64, reps: u32) -> f64 {
    match reps {
        0 => 0.0,
        1 => weight,
        _ => weight * (1.0 + reps as f64 / 30.0),
    }
}

pub fn set_volume(set: &Set) -> f64 {
    set.actual_weight * set.actual_reps as f64
}

pub fn total_volume<'a>(sets: impl IntoIterator<Item = &'a Set>) -> f64 {
    sets.into_iter().map(set_volume).sum()
}

/// Set with the highest e1RM; the earliest one wins a tie.
pub fn best_set<'a>(sets: impl IntoIterator<Item = &'a Set>) -> Option<&'a Set> {
    sets.into_iter().fold(None, |best: Option<&Set>, set| match best {
        Some(b) if estimated_1rm(b.actual_weight, b.actual_reps)
            >= estimated_1rm(set.actual_weight, set.actual_reps) =>
        {
            Some(b)
        }
        _ => Some(set),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Progression {
    pub delta_kg: f64,
    pub delta_percent: f64,
    pub is_positive: bool,
    pub label: String,
}

/// Compare a set against the previous workout's set by e1RM.
pub fn compare_to_previous(current: &Set, previous: &PreviousSet) -> Progression {
    let now = estimated_1rm(current.actual_weight, current.actual_reps);
    let before = estimated_1rm(previous.actual_weight, previous.actual_reps);
    let delta_kg = now - before;
    let delta_percent = if before > 0.0 {
        delta_kg / before * 100.0
    } else {
        0.0
    };
    let sign = if delta_kg >= 0.0 { "+" } else { "" };
    Progression {
        delta_kg,
        delta_percent,
        is_positive: delta_kg >= 0.0,
        label: format!(
            "{}{:.1} kg e1RM ({}{:.1}%)",
            sign, delta_kg, sign, delta_percent
        ),
    }
}
