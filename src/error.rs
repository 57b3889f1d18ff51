//! Error types for the set session core.

use crate::models::SetId;
use crate::session::SetTarget;
use std::fmt;

/// Local rejection of a draft; never sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NonFiniteWeight,
    NegativeWeight(f64),
    NegativeReps(i32),
    RirOutOfRange(i32),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonFiniteWeight => write!(f, "Weight must be a number"),
            ValidationError::NegativeWeight(w) => {
                write!(f, "Weight cannot be negative (got {})", w)
            }
            ValidationError::NegativeReps(r) => write!(f, "Reps cannot be negative (got {})", r),
            ValidationError::RirOutOfRange(r) => {
                write!(f, "RIR must be between 0 and 10 (got {})", r)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of a failed remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Non-2xx response other than 401/403.
    Remote { status: u16, message: String },
    /// The request never reached the server.
    Network(String),
    /// 401 or 403; surfaced, never retried.
    Unauthorized(u16),
    /// 2xx response whose body could not be read.
    Decode(String),
}

impl ApiError {
    /// Build a remote error from a status and an optional server message.
    pub fn remote(status: u16, message: Option<String>) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized(status),
            _ => ApiError::Remote {
                status,
                message: message.unwrap_or_else(|| format!("HTTP error: {}", status)),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Remote { message, .. } => write!(f, "{}", message),
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Unauthorized(status) => {
                write!(f, "Not authorized (HTTP {}), please sign in again", status)
            }
            ApiError::Decode(msg) => write!(f, "Unexpected server response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors reported by session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Validation(ValidationError),
    /// A mutation targeted a set that already has one in flight.
    Conflict(SetTarget),
    Remote { status: u16, message: String },
    Network(String),
    Auth(u16),
    UnknownSet(SetId),
    NotEditing,
}

impl SessionError {
    /// True for failures that must be surfaced instead of retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Auth(_))
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Validation(e) => write!(f, "{}", e),
            SessionError::Conflict(target) => {
                write!(f, "Still saving {}, please wait", target)
            }
            SessionError::Remote { message, .. } => write!(f, "{}", message),
            SessionError::Network(msg) => write!(f, "Network error: {}", msg),
            SessionError::Auth(status) => {
                write!(f, "Not authorized (HTTP {}), please sign in again", status)
            }
            SessionError::UnknownSet(id) => write!(f, "Set {} is not part of this session", id),
            SessionError::NotEditing => write!(f, "No set is being edited"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ValidationError> for SessionError {
    fn from(e: ValidationError) -> Self {
        SessionError::Validation(e)
    }
}

impl From<ApiError> for SessionError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Remote { status, message } => SessionError::Remote { status, message },
            ApiError::Network(msg) => SessionError::Network(msg),
            ApiError::Unauthorized(status) => SessionError::Auth(status),
            // A 2xx with a garbled body still reached the server.
            ApiError::Decode(msg) => SessionError::Remote {
                status: 200,
                message: format!("Unexpected server response: {}", msg),
            },
        }
    }
}

/// Invalid parameters passed to the plate rounding engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlateError {
    NonFiniteInput,
    NonPositiveIncrement(f64),
    NegativeBarWeight(f64),
    NegativePlate(f64),
    LoadOutOfRange(f64),
}

impl fmt::Display for PlateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateError::NonFiniteInput => write!(f, "Loads must be finite numbers"),
            PlateError::NonPositiveIncrement(inc) => {
                write!(f, "Smallest increment must be positive (got {})", inc)
            }
            PlateError::NegativeBarWeight(w) => {
                write!(f, "Bar weight cannot be negative (got {})", w)
            }
            PlateError::NegativePlate(p) => write!(f, "Plate weight must be positive (got {})", p),
            PlateError::LoadOutOfRange(w) => {
                write!(f, "Load must be within ±{} kg (got {})", crate::config::MAX_LOAD_KG, w)
            }
        }
    }
}

impl std::error::Error for PlateError {}
