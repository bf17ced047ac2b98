use std::time::Duration;

use wasm_bindgen::prelude::*;

use tokencost_core::config::{self, CalculatorConfig};
use tokencost_core::input;
use tokencost_core::loader::load_catalog_str;
use tokencost_core::session::Mode;
use tokencost_core::{RecordId, Session, SessionState, Slot};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Milliseconds from `performance.now()` as a session timestamp.
/// Garbage (NaN, negative, huge) maps to zero.
fn at(now_ms: f64) -> Duration {
    Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or(Duration::ZERO)
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// One calculator page. Every edit takes the current `performance.now()`;
/// the page schedules a timer for `pending_deadline_ms()` and calls `poll`.
#[wasm_bindgen]
pub struct Calculator {
    session: Session,
}

#[derive(serde::Serialize)]
struct PresetJs<'a> {
    name: &'a str,
    label: &'a str,
    input_tokens: f64,
    output_tokens: f64,
}

#[wasm_bindgen]
impl Calculator {
    /// Build from pricing.tsv text and optional calculator.toml text.
    #[wasm_bindgen(constructor)]
    pub fn new(tsv: &str, config_toml: Option<String>) -> Result<Calculator, JsError> {
        let catalog = load_catalog_str(tsv).map_err(js_err)?;
        let config: CalculatorConfig = match config_toml {
            Some(ref toml) => config::parse_config(toml),
            None => config::load_bundled_config(),
        }
        .map_err(js_err)?;
        Ok(Calculator {
            session: Session::new(catalog, config),
        })
    }

    pub fn model_count(&self) -> usize {
        self.session.catalog().len()
    }

    /// Dropdown entries for the current search: [{id, label}].
    pub fn options(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.session.options()).unwrap_or(JsValue::NULL)
    }

    /// Preset buttons: [{name, label, input_tokens, output_tokens}].
    pub fn presets(&self) -> JsValue {
        let presets: Vec<PresetJs<'_>> = self
            .session
            .config()
            .presets
            .iter()
            .map(|(name, p)| PresetJs {
                name,
                label: &p.label,
                input_tokens: p.input_tokens as f64,
                output_tokens: p.output_tokens as f64,
            })
            .collect();
        serde_wasm_bindgen::to_value(&presets).unwrap_or(JsValue::NULL)
    }

    /// "fresh" before the first calculation, "live" after.
    pub fn state(&self) -> String {
        match self.session.state() {
            SessionState::Fresh => "fresh".into(),
            SessionState::Live => "live".into(),
        }
    }

    pub fn is_compare(&self) -> bool {
        self.session.mode() == Mode::Compare
    }

    /// Selected record id for "single", "a" or "b".
    pub fn selection(&self, slot: &str) -> Result<Option<u32>, JsError> {
        let slot: Slot = slot.parse().map_err(js_err)?;
        Ok(self.session.selection(slot).map(|id| id.0))
    }

    pub fn discount_percent(&self) -> String {
        self.session.discount_percent().to_string()
    }

    // -- edits --------------------------------------------------------------

    pub fn set_query(&mut self, query: &str, now_ms: f64) {
        self.session.set_query(query, at(now_ms));
    }

    pub fn set_compare_mode(&mut self, compare: bool, now_ms: f64) {
        self.session.set_compare_mode(compare, at(now_ms));
    }

    /// Pass `undefined` as `id` for the empty dropdown entry.
    pub fn select_model(&mut self, slot: &str, id: Option<u32>, now_ms: f64) -> Result<(), JsError> {
        let slot: Slot = slot.parse().map_err(js_err)?;
        self.session.select_model(slot, id.map(RecordId), at(now_ms));
        Ok(())
    }

    pub fn set_input_tokens(&mut self, raw: &str, now_ms: f64) {
        self.session.set_input_tokens(raw, at(now_ms));
    }

    pub fn set_output_tokens(&mut self, raw: &str, now_ms: f64) {
        self.session.set_output_tokens(raw, at(now_ms));
    }

    pub fn apply_preset(&mut self, name: &str, now_ms: f64) -> Result<(), JsError> {
        self.session.apply_preset(name, at(now_ms)).map_err(js_err)
    }

    pub fn set_annual(&mut self, annual: bool, now_ms: f64) {
        self.session.set_annual(annual, at(now_ms));
    }

    pub fn set_discount_enabled(&mut self, enabled: bool, now_ms: f64) {
        self.session.set_discount_enabled(enabled, at(now_ms));
    }

    pub fn set_discount_percent(&mut self, raw: &str, now_ms: f64) {
        self.session.set_discount_percent(raw, at(now_ms));
    }

    // -- calculation --------------------------------------------------------

    /// Explicit Calculate click. Returns the new display.
    pub fn calculate(&mut self) -> JsValue {
        self.session.calculate();
        self.display()
    }

    /// Run the scheduled refresh if due. True if the display changed.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.session.poll(at(now_ms))
    }

    /// When to call `poll` next, in `performance.now()` milliseconds.
    pub fn pending_deadline_ms(&self) -> Option<f64> {
        self.session
            .pending_deadline()
            .map(|d| d.as_secs_f64() * 1000.0)
    }

    /// `{type: "hint", kind, title, body}` or `{type: "result", display, text, markdown, csv}`.
    pub fn display(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.session.display()).unwrap_or(JsValue::NULL)
    }

    pub fn display_json(&self) -> String {
        serde_json::to_string(self.session.display()).unwrap_or_default()
    }

    // -- exports ------------------------------------------------------------

    pub fn copy_text(&self) -> Option<String> {
        self.session.display().copy_text().map(str::to_string)
    }

    pub fn copy_markdown(&self) -> Option<String> {
        self.session.display().copy_markdown().map(str::to_string)
    }

    pub fn copy_csv(&self) -> Option<String> {
        self.session.display().copy_csv().map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Reformat a token field while typing: "1000000" -> "1,000,000".
#[wasm_bindgen]
pub fn format_token_input(raw: &str) -> String {
    input::format_token_input(raw)
}

/// Token count from free text. f64 to avoid BigInt on the JS side.
#[wasm_bindgen]
pub fn sanitize_tokens(raw: &str) -> f64 {
    input::sanitize_tokens(raw) as f64
}
