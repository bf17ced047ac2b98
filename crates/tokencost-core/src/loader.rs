use std::path::Path;

use tracing::{debug, info};

use crate::error::{FormatError, Result, TcError};
use crate::pricing::{PricingCatalog, PricingRecord, RecordId};

pub const COL_PROVIDER: &str = "Provider";
pub const COL_MODEL: &str = "Model";
pub const COL_INPUT: &str = "Input $/1M";
pub const COL_OUTPUT: &str = "Output $/1M";

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

struct Columns {
    provider: usize,
    model: usize,
    input: usize,
    output: usize,
}

impl Columns {
    fn locate(header: &str) -> std::result::Result<Self, FormatError> {
        let names: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|h| *h == name);

        match (
            find(COL_PROVIDER),
            find(COL_MODEL),
            find(COL_INPUT),
            find(COL_OUTPUT),
        ) {
            (Some(provider), Some(model), Some(input), Some(output)) => Ok(Self {
                provider,
                model,
                input,
                output,
            }),
            _ => {
                let missing = [COL_PROVIDER, COL_MODEL, COL_INPUT, COL_OUTPUT]
                    .iter()
                    .filter(|c| find(**c).is_none())
                    .map(|c| (*c).to_string())
                    .collect();
                Err(FormatError::MissingHeaders { missing })
            }
        }
    }
}

/// Parse a money cell like "$1,250.50" or "0.625".
/// Returns None for blank, unparsable, non-finite or negative values.
pub fn parse_rate(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s.strip_prefix(CURRENCY_SYMBOLS).unwrap_or(s).trim_start();
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let v: f64 = cleaned.parse().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

/// Parse a tab-separated pricing table.
///
/// The header must name `Provider`, `Model`, `Input $/1M` and `Output $/1M`
/// in any order; other columns are ignored. Rows with a blank name or an
/// unusable rate are skipped, and the load fails only if none survive.
pub fn load_catalog_str(raw: &str) -> Result<PricingCatalog> {
    let lines: Vec<&str> = raw.trim().lines().collect();
    if lines.len() < 2 {
        return Err(FormatError::TooShort.into());
    }

    let cols = Columns::locate(lines[0])?;

    let mut records = Vec::new();
    for (lineno, line) in lines.iter().enumerate().skip(1) {
        let cells: Vec<&str> = line.split('\t').map(str::trim).collect();
        let cell = |i: usize| cells.get(i).copied().unwrap_or("");

        let provider = cell(cols.provider);
        let model = cell(cols.model);
        if provider.is_empty() || model.is_empty() {
            debug!(line = lineno + 1, "skipping row without provider or model");
            continue;
        }

        let (Some(input_per_1m), Some(output_per_1m)) =
            (parse_rate(cell(cols.input)), parse_rate(cell(cols.output)))
        else {
            debug!(line = lineno + 1, provider, model, "skipping row with non-numeric rate");
            continue;
        };

        records.push(PricingRecord {
            id: RecordId(records.len() as u32),
            provider: provider.to_string(),
            model: model.to_string(),
            input_per_1m,
            output_per_1m,
        });
    }

    if records.is_empty() {
        return Err(FormatError::NoValidRows.into());
    }

    info!(count = records.len(), "loaded pricing table");
    Ok(PricingCatalog::new(records))
}

/// Load a pricing table from a TSV file.
pub fn load_catalog(path: &Path) -> Result<PricingCatalog> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TcError::Io(format!("cannot read {}: {e}", path.display())))?;
    load_catalog_str(&content)
}

/// Load the pricing table bundled from the data/ directory.
pub fn load_bundled_catalog() -> Result<PricingCatalog> {
    load_catalog_str(include_str!("../../../data/pricing.tsv"))
}
