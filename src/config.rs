//! Application-level configuration constants.

use serde::{Deserialize, Serialize};

// Remote API
pub const DEFAULT_API_BASE_URL: &str = "/api/v1";
pub const AUTH_TOKEN_STORAGE_KEY: &str = "set_coach_auth_token";

// Barbell defaults (kg)
pub const DEFAULT_BAR_WEIGHT_KG: f64 = 20.0;
pub const DEFAULT_INCREMENT_KG: f64 = 2.5;
/// Loads beyond this are rejected by the plate rounding engine.
pub const MAX_LOAD_KG: f64 = 100_000.0;
pub const DEFAULT_PLATES_KG: [f64; 7] = [25.0, 20.0, 15.0, 10.0, 5.0, 2.5, 1.25];

// Set field limits
pub const MIN_RIR: i32 = 0;
pub const MAX_RIR: i32 = 10;

// Rest timer
pub const DEFAULT_REST_SECS: u32 = 120;
pub const MAX_REST_SECS: u32 = 60 * 60;
pub const TICK_MS: u32 = 1_000;

/// Where the remote API lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Bar and plate inventory used by the plate rounding engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarbellConfig {
    pub bar_weight: f64,
    pub smallest_increment: f64,
    /// Plate weights in descending order.
    pub plates: Vec<f64>,
}

impl Default for BarbellConfig {
    fn default() -> Self {
        Self {
            bar_weight: DEFAULT_BAR_WEIGHT_KG,
            smallest_increment: DEFAULT_INCREMENT_KG,
            plates: DEFAULT_PLATES_KG.to_vec(),
        }
    }
}
