//! Parsing of the text typed into the set and rest timer fields.

use once_cell::sync::Lazy;
use regex::Regex;
use set_coach::config::{MAX_REST_SECS, MAX_RIR, MIN_RIR};

// Compiled regexes for weight and rest duration parsing
static WEIGHT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(-?\d+(?:[.,]\d*)?)\s*(?:kg)?$").expect("valid regex"));
static REST_MIN_SEC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)m\s*(?:(\d+)s)?$").expect("valid regex"));
static REST_COLON_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{1,2})$").expect("valid regex"));
static REST_SEC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)s?$").expect("valid regex"));

/// Input parsing error types
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    EmptyInput(&'static str),
    NotANumber(&'static str),
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    InvalidSeconds(u32),
    InvalidFormat(String),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::EmptyInput(field) => write!(f, "{} cannot be empty", field),
            InputError::NotANumber(field) => write!(f, "{} must be a valid number", field),
            InputError::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            InputError::InvalidSeconds(s) => write!(f, "Invalid seconds: {} (must be 0-59)", s),
            InputError::InvalidFormat(hint) => write!(f, "Invalid time format. {}", hint),
        }
    }
}

impl std::error::Error for InputError {}

/// Parse a weight in kg: "82.5", "82,5" or "82.5kg".
///
/// Only the syntax is checked here; sign and range checks belong to set
/// validation so the same message shows for typed and programmatic input.
pub fn parse_weight(input: &str) -> Result<f64, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyInput("Weight"));
    }
    let captures = WEIGHT_REGEX
        .captures(trimmed)
        .ok_or(InputError::NotANumber("Weight"))?;
    captures[1]
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| InputError::NotANumber("Weight"))
}

pub fn parse_reps(input: &str) -> Result<i32, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyInput("Reps"));
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| InputError::NotANumber("Reps"))
}

/// Parse an optional RIR; a blank field means "not recorded".
pub fn parse_rir(input: &str) -> Result<Option<i32>, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let rir = trimmed
        .parse::<i32>()
        .map_err(|_| InputError::NotANumber("RIR"))?;
    if !(MIN_RIR..=MAX_RIR).contains(&rir) {
        return Err(InputError::OutOfRange {
            field: "RIR",
            min: MIN_RIR.into(),
            max: MAX_RIR.into(),
        });
    }
    Ok(Some(rir))
}

/// Parse a rest duration to whole seconds.
///
/// Supported formats:
/// - Seconds: "90" or "90s"
/// - Colon format: "1:30" (minutes:seconds)
/// - Minutes and seconds: "2m", "2m30s" or "2m 30s"
pub fn parse_rest_duration(input: &str) -> Result<u32, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyInput("Rest"));
    }

    let secs = if let Some(captures) = REST_SEC_REGEX.captures(trimmed) {
        parse_part(&captures[1])?
    } else if let Some(captures) = REST_COLON_REGEX.captures(trimmed) {
        minutes_and_seconds(&captures[1], Some(&captures[2]))?
    } else if let Some(captures) = REST_MIN_SEC_REGEX.captures(trimmed) {
        minutes_and_seconds(&captures[1], captures.get(2).map(|m| m.as_str()))?
    } else {
        return Err(InputError::InvalidFormat(
            "Use: 90, 90s, 1:30 or 1m30s".to_string(),
        ));
    };

    if secs > MAX_REST_SECS {
        return Err(InputError::OutOfRange {
            field: "Rest",
            min: 0,
            max: MAX_REST_SECS.into(),
        });
    }
    Ok(secs)
}

fn parse_part(digits: &str) -> Result<u32, InputError> {
    digits.parse().map_err(|_| InputError::NotANumber("Rest"))
}

fn minutes_and_seconds(minutes: &str, seconds: Option<&str>) -> Result<u32, InputError> {
    let minutes = parse_part(minutes)?;
    let seconds = seconds.map(parse_part).transpose()?.unwrap_or(0);
    if seconds > 59 {
        return Err(InputError::InvalidSeconds(seconds));
    }
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or(InputError::NotANumber("Rest"))
}
