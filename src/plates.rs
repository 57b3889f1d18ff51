//! Plate rounding: turn an arbitrary target load into one that can actually
//! be put on a barbell, together with the plates needed on each side.
//!
//! All arithmetic after the input conversion happens on whole grams, so the
//! only rounding step is the snap to the smallest increment and the result is
//! identical on every call for the same inputs.

use crate::config::{BarbellConfig, MAX_LOAD_KG};
use crate::error::PlateError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

const GRAMS_PER_KG: f64 = 1000.0;

/// A number of identical plates loaded on one side of the bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateCount {
    pub weight: f64,
    pub count: u32,
}

/// Result of [`round_to_loadable`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateConfiguration {
    pub final_load: f64,
    /// Plates for one side, heaviest first.
    pub per_side: Vec<PlateCount>,
    pub bar_only: bool,
    /// Target too light for this bar; `final_load` is 0.
    pub unloadable: bool,
    /// Per-side load the available plates could not cover.
    pub remainder_per_side: f64,
}

impl PlateConfiguration {
    fn unloadable() -> Self {
        Self {
            final_load: 0.0,
            per_side: Vec::new(),
            bar_only: false,
            unloadable: true,
            remainder_per_side: 0.0,
        }
    }

    fn bar_only(bar_weight: f64) -> Self {
        Self {
            final_load: bar_weight,
            per_side: Vec::new(),
            bar_only: true,
            unloadable: false,
            remainder_per_side: 0.0,
        }
    }

    /// Load contributed by the plates on one side.
    pub fn per_side_load(&self) -> f64 {
        let grams: i64 = self
            .per_side
            .iter()
            .map(|p| to_grams(p.weight) * i64::from(p.count))
            .sum();
        from_grams(grams)
    }
}

impl fmt::Display for PlateConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unloadable {
            return write!(f, "Too light for this bar");
        }
        if self.bar_only {
            return write!(f, "Bar only ({} kg)", self.final_load);
        }
        let plates: Vec<String> = self
            .per_side
            .iter()
            .map(|p| format!("{}×{}", p.count, p.weight))
            .collect();
        write!(f, "{} kg: {} per side", self.final_load, plates.join(" + "))?;
        if self.remainder_per_side > 0.0 {
            write!(f, " ({} kg not loadable)", self.remainder_per_side)?;
        }
        Ok(())
    }
}

/// Convert a load to grams, rejecting values the gram arithmetic cannot hold.
fn checked_grams(kg: f64) -> Result<i64, PlateError> {
    if !kg.is_finite() {
        return Err(PlateError::NonFiniteInput);
    }
    if kg.abs() > MAX_LOAD_KG {
        return Err(PlateError::LoadOutOfRange(kg));
    }
    Ok(to_grams(kg))
}

#[inline]
fn to_grams(kg: f64) -> i64 {
    (kg * GRAMS_PER_KG).round() as i64
}

#[inline]
fn from_grams(grams: i64) -> f64 {
    grams as f64 / GRAMS_PER_KG
}

/// Round `target_load` to the nearest load reachable with `available_plates`.
///
/// # Algorithm
/// 1. Targets below the bar snap to the bar when above half its weight and
///    are reported unloadable otherwise.
/// 2. The weight on the bar is rounded half-up to a multiple of
///    `smallest_increment`.
/// 3. Half of it is decomposed greedily into plates, heaviest first; what the
///    plates cannot cover is reported as `remainder_per_side`.
pub fn round_to_loadable(
    target_load: f64,
    bar_weight: f64,
    smallest_increment: f64,
    available_plates: &[f64],
) -> Result<PlateConfiguration, PlateError> {
    let target_g = checked_grams(target_load)?;
    let bar_g = checked_grams(bar_weight)?;
    let increment_g = checked_grams(smallest_increment)?;
    if bar_weight < 0.0 {
        return Err(PlateError::NegativeBarWeight(bar_weight));
    }
    if increment_g <= 0 {
        return Err(PlateError::NonPositiveIncrement(smallest_increment));
    }
    let mut plates_g = Vec::with_capacity(available_plates.len());
    for &plate in available_plates {
        let grams = checked_grams(plate)?;
        if grams <= 0 {
            return Err(PlateError::NegativePlate(plate));
        }
        plates_g.push(grams);
    }
    plates_g.sort_unstable_by(|a, b| b.cmp(a));
    plates_g.dedup();

    if target_g < bar_g {
        return Ok(if target_g * 2 > bar_g {
            debug!("Target {} kg below bar, snapping to bar", target_load);
            PlateConfiguration::bar_only(from_grams(bar_g))
        } else {
            debug!("Target {} kg too light for a {} kg bar", target_load, bar_weight);
            PlateConfiguration::unloadable()
        });
    }

    let on_bar_g = target_g - bar_g;
    let rounded_g = (on_bar_g + increment_g / 2) / increment_g * increment_g;
    if rounded_g == 0 {
        return Ok(PlateConfiguration::bar_only(from_grams(bar_g)));
    }

    let mut remaining_g = rounded_g / 2;
    let mut per_side = Vec::new();
    for &plate_g in &plates_g {
        if plate_g > remaining_g {
            continue;
        }
        let count = remaining_g / plate_g;
        remaining_g -= count * plate_g;
        per_side.push(PlateCount {
            weight: from_grams(plate_g),
            count: u32::try_from(count)
                .map_err(|_| PlateError::LoadOutOfRange(target_load))?,
        });
    }
    // An odd gram lost when halving belongs to the remainder as well.
    let remainder_g = remaining_g * 2 + rounded_g % 2;

    Ok(PlateConfiguration {
        final_load: from_grams(bar_g + rounded_g),
        per_side,
        bar_only: false,
        unloadable: false,
        remainder_per_side: from_grams(remainder_g) / 2.0,
    })
}

/// [`round_to_loadable`] with a bar and plate inventory taken from config.
pub fn round_with(
    target_load: f64,
    barbell: &BarbellConfig,
) -> Result<PlateConfiguration, PlateError> {
    round_to_loadable(
        target_load,
        barbell.bar_weight,
        barbell.smallest_increment,
        &barbell.plates,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLATES_KG;

    fn round(target: f64) -> PlateConfiguration {
        round_to_loadable(target, 20.0, 2.5, &DEFAULT_PLATES_KG).unwrap()
    }

    fn plates(config: &PlateConfiguration) -> Vec<(f64, u32)> {
        config.per_side.iter().map(|p| (p.weight, p.count)).collect()
    }

    #[test]
    fn exact_load_uses_greedy_breakdown() {
        let config = round(100.0);
        assert_eq!(config.final_load, 100.0);
        assert!(!config.bar_only && !config.unloadable);
        // 40 kg per side, heaviest plates first.
        assert_eq!(plates(&config), vec![(25.0, 1), (15.0, 1)]);
        assert_eq!(config.per_side_load(), 40.0);
        assert_eq!(config.remainder_per_side, 0.0);
    }

    #[test]
    fn slightly_above_bar_snaps_to_bar() {
        let config = round(21.0);
        assert!(config.bar_only);
        assert_eq!(config.final_load, 20.0);
        assert!(config.per_side.is_empty());
    }

    #[test]
    fn below_bar_but_above_half_snaps_to_bar() {
        let config = round(10.5);
        assert!(config.bar_only);
        assert_eq!(config.final_load, 20.0);
    }

    #[test]
    fn half_bar_or_less_is_unloadable() {
        for target in [5.0, 10.0, 0.0, -3.0] {
            let config = round(target);
            assert!(config.unloadable, "target {}", target);
            assert_eq!(config.final_load, 0.0);
        }
    }

    #[test]
    fn rounds_to_nearest_increment() {
        let config = round(103.4);
        assert_eq!(config.final_load, 102.5);
        assert_eq!(plates(&config), vec![(25.0, 1), (15.0, 1), (1.25, 1)]);
    }

    #[test]
    fn rounds_half_up() {
        // 81.25 on the bar sits exactly between 80 and 82.5.
        assert_eq!(round(101.25).final_load, 102.5);
        assert_eq!(round(101.2).final_load, 100.0);
    }

    #[test]
    fn missing_small_plates_leave_a_remainder() {
        let config = round_to_loadable(62.5, 20.0, 2.5, &[20.0, 10.0, 5.0]).unwrap();
        assert_eq!(config.final_load, 62.5);
        assert_eq!(plates(&config), vec![(20.0, 1)]);
        assert_eq!(config.remainder_per_side, 1.25);
    }

    #[test]
    fn unsorted_plates_are_walked_heaviest_first() {
        let config = round_to_loadable(140.0, 20.0, 2.5, &[5.0, 25.0, 10.0]).unwrap();
        assert_eq!(plates(&config), vec![(25.0, 2), (10.0, 1)]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let first = round(87.3);
        for _ in 0..100 {
            assert_eq!(round(87.3), first);
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            round_to_loadable(100.0, 20.0, 0.0, &DEFAULT_PLATES_KG),
            Err(PlateError::NonPositiveIncrement(0.0))
        );
        assert_eq!(
            round_to_loadable(f64::INFINITY, 20.0, 2.5, &DEFAULT_PLATES_KG),
            Err(PlateError::NonFiniteInput)
        );
        assert_eq!(
            round_to_loadable(100.0, -1.0, 2.5, &DEFAULT_PLATES_KG),
            Err(PlateError::NegativeBarWeight(-1.0))
        );
    }

    #[test]
    fn huge_loads_are_rejected_not_saturated() {
        assert_eq!(
            round_to_loadable(1e300, 20.0, 2.5, &DEFAULT_PLATES_KG),
            Err(PlateError::LoadOutOfRange(1e300))
        );
        assert_eq!(
            round_to_loadable(100.0, 20.0, 2.5, &[25.0, 1e20]),
            Err(PlateError::LoadOutOfRange(1e20))
        );
        assert_eq!(
            round_to_loadable(100.0, 20.0, 1e-300, &DEFAULT_PLATES_KG),
            Err(PlateError::NonPositiveIncrement(1e-300))
        );
    }

    #[test]
    fn largest_accepted_load_stays_exact() {
        let config = round(MAX_LOAD_KG);
        assert_eq!(config.final_load, MAX_LOAD_KG);
        assert_eq!(config.remainder_per_side, 0.0);
        assert_eq!(config.per_side_load() * 2.0 + 20.0, MAX_LOAD_KG);
    }

    #[test]
    fn display_lists_plates() {
        assert_eq!(round(100.0).to_string(), "100 kg: 1×25 + 1×15 per side");
        assert_eq!(round(21.0).to_string(), "Bar only (20 kg)");
    }
}
