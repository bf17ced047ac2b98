use serde::{Deserialize, Serialize};

/// Identifier assigned to a pricing row at load time.
///
/// Ids follow source-row order, so loading the same dataset twice yields
/// the same ids. They survive filtering and re-sorting, unlike positions in
/// a displayed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// List price of one model at one provider, in USD per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecord {
    pub id: RecordId,
    pub provider: String,
    pub model: String,
    pub input_per_1m: f64,
    pub output_per_1m: f64,
}

impl PricingRecord {
    /// Dropdown label, e.g. "OpenAI | gpt-5".
    pub fn label(&self) -> String {
        format!("{} | {}", self.provider, self.model)
    }

    fn haystack(&self) -> String {
        format!("{} {}", self.provider, self.model).to_lowercase()
    }
}

/// One entry of a selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub id: RecordId,
    pub label: String,
}

impl From<&PricingRecord> for SelectOption {
    fn from(r: &PricingRecord) -> Self {
        Self {
            id: r.id,
            label: r.label(),
        }
    }
}

/// All pricing rows of a dataset, sorted by provider then model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingCatalog {
    records: Vec<PricingRecord>,
}

impl PricingCatalog {
    /// Build a catalog, sorting by (provider, model). Ties keep input order.
    pub fn new(mut records: Vec<PricingRecord>) -> Self {
        records.sort_by(|a, b| {
            a.provider
                .cmp(&b.provider)
                .then_with(|| a.model.cmp(&b.model))
        });
        Self { records }
    }

    pub fn records(&self) -> &[PricingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve an id against the full catalog.
    pub fn get(&self, id: RecordId) -> Option<&PricingRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records whose "provider model" contains `query`, ignoring case.
    /// A blank query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&PricingRecord> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.records.iter().collect();
        }
        self.records
            .iter()
            .filter(|r| r.haystack().contains(&q))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: u32, provider: &str, model: &str) -> PricingRecord {
        PricingRecord {
            id: RecordId(id),
            provider: provider.to_string(),
            model: model.to_string(),
            input_per_1m: 1.0,
            output_per_1m: 2.0,
        }
    }

    #[test]
    fn sorts_by_provider_then_model_case_sensitive() {
        let catalog = PricingCatalog::new(vec![
            rec(0, "openai", "b"),
            rec(1, "OpenAI", "gpt-5"),
            rec(2, "Anthropic", "claude"),
            rec(3, "OpenAI", "gpt-4o"),
        ]);
        let labels: Vec<String> = catalog.records().iter().map(|r| r.label()).collect();
        // Uppercase sorts before lowercase in byte order.
        assert_eq!(
            labels,
            ["Anthropic | claude", "OpenAI | gpt-4o", "OpenAI | gpt-5", "openai | b"]
        );
    }

    #[test]
    fn duplicates_are_kept_in_input_order() {
        let catalog = PricingCatalog::new(vec![rec(0, "A", "m"), rec(1, "A", "m")]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].id, RecordId(0));
        assert_eq!(catalog.records()[1].id, RecordId(1));
    }

    #[test]
    fn filter_matches_provider_and_model_ignoring_case() {
        let catalog = PricingCatalog::new(vec![
            rec(0, "OpenAI", "gpt-5"),
            rec(1, "Google", "gemini-2.5-pro"),
            rec(2, "OpenAI", "gpt-4o"),
        ]);
        assert_eq!(catalog.filter("GPT").len(), 2);
        assert_eq!(catalog.filter("openai gpt-5").len(), 1);
        assert_eq!(catalog.filter("  gemini ").len(), 1);
        assert!(catalog.filter("llama").is_empty());
        assert_eq!(catalog.filter("").len(), 3);
    }

    #[test]
    fn get_resolves_against_full_catalog() {
        let catalog = PricingCatalog::new(vec![rec(7, "OpenAI", "gpt-5")]);
        assert_eq!(catalog.get(RecordId(7)).map(|r| r.model.as_str()), Some("gpt-5"));
        assert!(catalog.get(RecordId(8)).is_none());
    }
}
