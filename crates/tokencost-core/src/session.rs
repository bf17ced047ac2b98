//! The calculator session: inputs, selections, staleness and debounced
//! recalculation.
//!
//! A UI drives a [`Session`] through its setters and reads back
//! [`Session::display`]. Nothing here touches a clock or a timer: operations
//! that may schedule an automatic recalculation take `now`, and the UI calls
//! [`Session::poll`] when the [`Session::pending_deadline`] passes.

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::CalculatorConfig;
use crate::cost::{self, DiscountOverlay, Period};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::format::{self, CompareResult, ResultBundle, SingleResult};
use crate::input::{sanitize_percent, sanitize_tokens};
use crate::pricing::{PricingCatalog, PricingRecord, RecordId, SelectOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Single,
    Compare,
}

/// A model picker. `Single` is used in single mode, `A` and `B` in compare mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Single,
    A,
    B,
}

impl FromStr for Slot {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "model" => Ok(Self::Single),
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            other => Err(format!("unknown slot: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Never calculated: edits are recorded silently.
    Fresh,
    /// Calculated at least once: edits mark the result stale and schedule a refresh.
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Ready,
    NoModels,
    MissingTokens,
    NoModelSelected,
    NoCompareSelection,
    InvalidSelection,
    CompareSelectionUnavailable,
    Updating,
    ModeChanged,
    PresetApplied,
    SingleMatch,
    NoMatches,
    Matches,
}

/// A short message shown instead of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub kind: HintKind,
    pub title: String,
    pub body: String,
}

impl Hint {
    fn new(kind: HintKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn ready() -> Self {
        Self::new(
            HintKind::Ready,
            "Ready.",
            "Select a model, enter tokens, then click Calculate Cost.",
        )
    }

    fn no_models() -> Self {
        Self::new(HintKind::NoModels, "No models loaded.", "Check your pricing.tsv and refresh.")
    }

    fn missing_tokens() -> Self {
        Self::new(
            HintKind::MissingTokens,
            "Enter your token usage.",
            "Fill monthly input and output tokens, or use a preset.",
        )
    }

    fn no_model_selected() -> Self {
        Self::new(
            HintKind::NoModelSelected,
            "Select a model to begin.",
            "Choose a provider and model, then calculate.",
        )
    }

    fn no_compare_selection() -> Self {
        Self::new(
            HintKind::NoCompareSelection,
            "Select Model A and Model B.",
            "Pick two models, then calculate.",
        )
    }

    fn invalid_selection() -> Self {
        Self::new(
            HintKind::InvalidSelection,
            "Invalid selection.",
            "Re-select the model and try again.",
        )
    }

    fn compare_unavailable() -> Self {
        Self::new(
            HintKind::CompareSelectionUnavailable,
            "Could not load selected models.",
            "Try re-selecting both models, then calculate again.",
        )
    }

    fn updating() -> Self {
        Self::new(
            HintKind::Updating,
            "Updating…",
            "Results refresh automatically when you pause, or click Calculate.",
        )
    }

    fn mode_changed() -> Self {
        Self::new(HintKind::ModeChanged, "Mode changed.", "Pick your model(s), then calculate.")
    }

    fn preset_applied() -> Self {
        Self::new(HintKind::PresetApplied, "Preset applied.", "Refreshing estimate…")
    }

    fn search(matches: usize) -> Self {
        match matches {
            0 => Self::new(HintKind::NoMatches, "No matches found.", "Try a different keyword."),
            1 => Self::new(
                HintKind::Matches,
                "1 match found.",
                "Pick a model, then click Calculate.",
            ),
            n => Self::new(
                HintKind::Matches,
                format!("{n} matches found."),
                "Pick a model, then click Calculate.",
            ),
        }
    }

    fn single_match() -> Self {
        Self::new(
            HintKind::SingleMatch,
            "1 match found.",
            "Model selected. Click Calculate or keep typing.",
        )
    }
}

/// What the results panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Display {
    Hint(Hint),
    Result(ResultBundle),
}

impl Display {
    pub fn result(&self) -> Option<&ResultBundle> {
        match self {
            Display::Result(r) => Some(r),
            Display::Hint(_) => None,
        }
    }

    pub fn hint(&self) -> Option<&Hint> {
        match self {
            Display::Hint(h) => Some(h),
            Display::Result(_) => None,
        }
    }

    /// Plain-text export; nothing to copy while a hint is shown.
    pub fn copy_text(&self) -> Option<&str> {
        self.result().map(|r| r.text.as_str())
    }

    pub fn copy_markdown(&self) -> Option<&str> {
        self.result().map(|r| r.markdown.as_str())
    }

    pub fn copy_csv(&self) -> Option<&str> {
        self.result().map(|r| r.csv.as_str())
    }
}

/// Which model(s) a calculation prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Single(RecordId),
    Compare { a: RecordId, b: RecordId },
}

/// Validated inputs for one calculation, built fresh each time.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationRequest {
    pub selection: Selection,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub period: Period,
    pub overlay: Option<DiscountOverlay>,
}

/// Price a request against `catalog` and render it.
///
/// An id missing from the catalog is reported as a hint, not an error.
pub fn evaluate(
    catalog: &PricingCatalog,
    req: &CalculationRequest,
) -> std::result::Result<ResultBundle, Hint> {
    match req.selection {
        Selection::Single(id) => {
            let record = catalog.get(id).ok_or_else(Hint::invalid_selection)?;
            let costs = cost::estimate(record, req.input_tokens, req.output_tokens, req.period);
            Ok(format::format_single(&SingleResult {
                record,
                input_tokens: req.input_tokens,
                output_tokens: req.output_tokens,
                period: req.period,
                costs,
                overlay: req.overlay,
            }))
        }
        Selection::Compare { a, b } => {
            let (Some(a), Some(b)) = (catalog.get(a), catalog.get(b)) else {
                return Err(Hint::compare_unavailable());
            };
            let comparison = cost::compare(a, b, req.input_tokens, req.output_tokens, req.period);
            Ok(format::format_compare(&CompareResult {
                a,
                b,
                input_tokens: req.input_tokens,
                output_tokens: req.output_tokens,
                period: req.period,
                comparison,
            }))
        }
    }
}

/// One calculator session over a loaded catalog.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: PricingCatalog,
    config: CalculatorConfig,
    query: String,
    view: Vec<RecordId>,
    mode: Mode,
    single: Option<RecordId>,
    slot_a: Option<RecordId>,
    slot_b: Option<RecordId>,
    input_raw: String,
    output_raw: String,
    annual: bool,
    discount_enabled: bool,
    discount_raw: String,
    has_calculated_once: bool,
    debouncer: Debouncer,
    display: Display,
}

impl Session {
    pub fn new(catalog: PricingCatalog, config: CalculatorConfig) -> Self {
        let view = catalog.records().iter().map(|r| r.id).collect();
        Self {
            discount_raw: config.discount_percent.to_string(),
            debouncer: Debouncer::new(config.debounce),
            catalog,
            config,
            query: String::new(),
            view,
            mode: Mode::Single,
            single: None,
            slot_a: None,
            slot_b: None,
            input_raw: String::new(),
            output_raw: String::new(),
            annual: false,
            discount_enabled: false,
            has_calculated_once: false,
            display: Display::Hint(Hint::ready()),
        }
    }

    // ── Read access ──────────────────────────────────────────────────

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.has_calculated_once {
            SessionState::Live
        } else {
            SessionState::Fresh
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Records matching the current query, in catalog order.
    pub fn view(&self) -> Vec<&PricingRecord> {
        self.view
            .iter()
            .filter_map(|id| self.catalog.get(*id))
            .collect()
    }

    /// The current view as dropdown entries.
    pub fn options(&self) -> Vec<SelectOption> {
        self.view().into_iter().map(SelectOption::from).collect()
    }

    pub fn selection(&self, slot: Slot) -> Option<RecordId> {
        match slot {
            Slot::Single => self.single,
            Slot::A => self.slot_a,
            Slot::B => self.slot_b,
        }
    }

    pub fn input_tokens(&self) -> &str {
        &self.input_raw
    }

    pub fn output_tokens(&self) -> &str {
        &self.output_raw
    }

    pub fn is_annual(&self) -> bool {
        self.annual
    }

    pub fn discount_enabled(&self) -> bool {
        self.discount_enabled
    }

    pub fn discount_percent(&self) -> &str {
        &self.discount_raw
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// When the pending automatic recalculation is due, if one is scheduled.
    pub fn pending_deadline(&self) -> Option<Duration> {
        self.debouncer.deadline()
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Record a tracked change. Before the first calculation this is silent;
    /// afterwards the result is replaced by `hint` and a refresh is scheduled.
    fn touch(&mut self, hint: Hint, now: Duration) {
        if !self.has_calculated_once {
            return;
        }
        debug!(hint = ?hint.kind, "inputs changed, refresh scheduled");
        self.display = Display::Hint(hint);
        self.debouncer.arm(now);
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<RecordId> {
        match slot {
            Slot::Single => &mut self.single,
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    /// Filter the selectable models. Selections that drop out of the view
    /// are cleared; in single mode a lone match is selected automatically.
    pub fn set_query(&mut self, query: &str, now: Duration) {
        self.query = query.to_string();
        self.view = self.catalog.filter(query).iter().map(|r| r.id).collect();

        for slot in [Slot::Single, Slot::A, Slot::B] {
            let view = &self.view;
            let sel = match slot {
                Slot::Single => &mut self.single,
                Slot::A => &mut self.slot_a,
                Slot::B => &mut self.slot_b,
            };
            if sel.is_some_and(|id| !view.contains(&id)) {
                *sel = None;
            }
        }

        let hint = if self.mode == Mode::Single && self.view.len() == 1 {
            self.single = Some(self.view[0]);
            Hint::single_match()
        } else {
            Hint::search(self.view.len())
        };
        self.touch(hint, now);
    }

    /// Switch between single and compare mode. Clears every selection.
    pub fn set_compare_mode(&mut self, compare: bool, now: Duration) {
        let mode = if compare { Mode::Compare } else { Mode::Single };
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.single = None;
        self.slot_a = None;
        self.slot_b = None;
        self.touch(Hint::mode_changed(), now);
    }

    pub fn select_model(&mut self, slot: Slot, id: Option<RecordId>, now: Duration) {
        *self.slot_mut(slot) = id;
        self.touch(Hint::updating(), now);
    }

    pub fn set_input_tokens(&mut self, raw: &str, now: Duration) {
        self.input_raw = raw.to_string();
        self.touch(Hint::updating(), now);
    }

    pub fn set_output_tokens(&mut self, raw: &str, now: Duration) {
        self.output_raw = raw.to_string();
        self.touch(Hint::updating(), now);
    }

    /// Fill both token fields from a configured preset.
    pub fn apply_preset(&mut self, name: &str, now: Duration) -> Result<()> {
        let preset = self.config.preset(name)?;
        self.input_raw = preset.input_tokens.to_string();
        self.output_raw = preset.output_tokens.to_string();
        self.touch(Hint::preset_applied(), now);
        Ok(())
    }

    pub fn set_annual(&mut self, annual: bool, now: Duration) {
        self.annual = annual;
        self.touch(Hint::updating(), now);
    }

    pub fn set_discount_enabled(&mut self, enabled: bool, now: Duration) {
        self.discount_enabled = enabled;
        self.touch(Hint::updating(), now);
    }

    pub fn set_discount_percent(&mut self, raw: &str, now: Duration) {
        self.discount_raw = raw.to_string();
        self.touch(Hint::updating(), now);
    }

    // ── Calculation ──────────────────────────────────────────────────

    /// Validate the current inputs into a request.
    pub fn request(&self) -> std::result::Result<CalculationRequest, Hint> {
        if self.catalog.is_empty() {
            return Err(Hint::no_models());
        }
        if self.input_raw.trim().is_empty() || self.output_raw.trim().is_empty() {
            return Err(Hint::missing_tokens());
        }

        let selection = match self.mode {
            Mode::Single => Selection::Single(self.single.ok_or_else(Hint::no_model_selected)?),
            Mode::Compare => match (self.slot_a, self.slot_b) {
                (Some(a), Some(b)) => Selection::Compare { a, b },
                _ => return Err(Hint::no_compare_selection()),
            },
        };

        Ok(CalculationRequest {
            selection,
            input_tokens: sanitize_tokens(&self.input_raw),
            output_tokens: sanitize_tokens(&self.output_raw),
            period: Period::from_annual(self.annual),
            overlay: self
                .discount_enabled
                .then(|| DiscountOverlay::new(sanitize_percent(&self.discount_raw))),
        })
    }

    fn recalculate(&mut self) {
        let outcome = self
            .request()
            .and_then(|req| evaluate(&self.catalog, &req));
        self.display = match outcome {
            Ok(bundle) => Display::Result(bundle),
            Err(hint) => {
                debug!(hint = ?hint.kind, "calculation skipped");
                Display::Hint(hint)
            }
        };
    }

    /// Explicit calculate action. Cancels any pending automatic refresh.
    pub fn calculate(&mut self) -> &Display {
        if !self.has_calculated_once {
            debug!("first calculation, session is live");
            self.has_calculated_once = true;
        }
        self.debouncer.cancel();
        self.recalculate();
        &self.display
    }

    /// Run the scheduled refresh if it is due. Returns true if it ran.
    pub fn poll(&mut self, now: Duration) -> bool {
        if !self.debouncer.fire(now) {
            return false;
        }
        self.recalculate();
        true
    }
}
