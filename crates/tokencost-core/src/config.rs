use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TcError};

/// Token volumes a preset button fills in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preset {
    pub label: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CalculatorSection {
    debounce_ms: u64,
    discount_percent: f64,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    calculator: CalculatorSection,
    #[serde(default)]
    preset: BTreeMap<String, Preset>,
}

/// Calculator defaults from calculator.toml.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorConfig {
    pub debounce: Duration,
    /// Starting value of the discount field.
    pub discount_percent: f64,
    /// Presets keyed by name, e.g. "70-30".
    pub presets: BTreeMap<String, Preset>,
}

impl CalculatorConfig {
    pub fn preset(&self, name: &str) -> Result<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| TcError::UnknownPreset(name.to_string()))
    }
}

/// Parse calculator settings from a TOML string.
pub fn parse_config(toml_str: &str) -> Result<CalculatorConfig> {
    let file: ConfigFile =
        toml::from_str(toml_str).map_err(|e| TcError::Config(e.to_string()))?;
    let pct = file.calculator.discount_percent;
    if !(0.0..=100.0).contains(&pct) {
        return Err(TcError::Config(format!(
            "discount_percent must be within 0..=100, got {pct}"
        )));
    }
    Ok(CalculatorConfig {
        debounce: Duration::from_millis(file.calculator.debounce_ms),
        discount_percent: pct,
        presets: file.preset,
    })
}

/// Load calculator settings from a file.
pub fn load_config(path: &Path) -> Result<CalculatorConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TcError::Io(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&content)
}

/// Load the calculator.toml bundled from the data/ directory.
pub fn load_bundled_config() -> Result<CalculatorConfig> {
    parse_config(include_str!("../../../data/calculator.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bundled_config() {
        let cfg = load_bundled_config().expect("should parse bundled calculator.toml");
        assert_eq!(cfg.debounce, Duration::from_millis(650));
        assert_eq!(cfg.discount_percent, 20.0);

        let p = cfg.preset("70-30").unwrap();
        assert_eq!((p.input_tokens, p.output_tokens), (7_000_000, 3_000_000));
        let p = cfg.preset("50-50").unwrap();
        assert_eq!((p.input_tokens, p.output_tokens), (5_000_000, 5_000_000));
    }

    #[test]
    fn presets_share_one_total_volume() {
        let cfg = load_bundled_config().unwrap();
        let totals: Vec<u64> = cfg
            .presets
            .values()
            .map(|p| p.input_tokens + p.output_tokens)
            .collect();
        assert!(totals.windows(2).all(|w| w[0] == w[1]), "{totals:?}");
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[calculator]
debounce_ms = 200
discount_percent = 12.5
"#;
        let cfg = parse_config(toml).unwrap();
        assert_eq!(cfg.debounce, Duration::from_millis(200));
        assert!(cfg.presets.is_empty());
        assert!(matches!(cfg.preset("70-30"), Err(TcError::UnknownPreset(_))));
    }

    #[test]
    fn rejects_out_of_range_discount() {
        let toml = "[calculator]\ndebounce_ms = 650\ndiscount_percent = 120\n";
        assert!(matches!(parse_config(toml), Err(TcError::Config(_))));
    }

    #[test]
    fn rejects_missing_section() {
        assert!(matches!(parse_config(""), Err(TcError::Config(_))));
    }
}
