//! Set session core of the workout logging client.
//!
//! Tracks the sets of one exercise within one workout, keeps a single set
//! open for editing at a time, syncs mutations with the remote API, refreshes
//! coaching data after every change, and rounds target loads to what can be
//! put on a barbell.

use wasm_bindgen::prelude::*;

pub mod api;
pub mod config;
pub mod edit_session;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod plates;
pub mod refresher;
pub mod rest_timer;
pub mod session;
pub mod set_cache;
pub mod sync;

pub use api::{HttpSetApi, SetApi, StaticToken, TokenSource};
pub use config::{BarbellConfig, ClientConfig};
pub use error::{ApiError, PlateError, SessionError, ValidationError};
pub use events::SessionEvent;
pub use models::{Set, SetDraft, SetId};
pub use plates::{round_to_loadable, PlateConfiguration};
pub use refresher::{CoachingBoard, Feed};
pub use rest_timer::RestTimer;
pub use session::{SessionScope, SetTarget};
pub use sync::{DeleteOutcome, SyncController};

/// Plate rounding entry point for plain JavaScript callers.
///
/// # Arguments
/// * `target_load` - Desired total load in kg
/// * `barbell_js` - Optional `BarbellConfig` object; defaults apply when
///   `undefined` or `null`
///
/// # Returns
/// Serialized `PlateConfiguration`, or an error message string
#[wasm_bindgen]
pub fn round_to_loadable_js(target_load: f64, barbell_js: JsValue) -> JsValue {
    let barbell: BarbellConfig = if barbell_js.is_undefined() || barbell_js.is_null() {
        BarbellConfig::default()
    } else {
        match serde_wasm_bindgen::from_value(barbell_js) {
            Ok(b) => b,
            Err(e) => {
                return serde_wasm_bindgen::to_value(&format!("Invalid barbell config: {}", e))
                    .unwrap_or(JsValue::NULL);
            }
        }
    };

    match plates::round_with(target_load, &barbell) {
        Ok(config) => serde_wasm_bindgen::to_value(&config).unwrap_or(JsValue::NULL),
        Err(e) => serde_wasm_bindgen::to_value(&e.to_string()).unwrap_or(JsValue::NULL),
    }
}
