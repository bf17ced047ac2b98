use serde::{Deserialize, Serialize};

use crate::pricing::PricingRecord;

const TOKENS_PER_UNIT: f64 = 1_000_000.0;

/// Billing period a cost is reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Monthly,
    Annual,
}

impl Period {
    pub fn from_annual(annual: bool) -> Self {
        if annual {
            Period::Annual
        } else {
            Period::Monthly
        }
    }

    /// Multiplier applied to a monthly cost.
    pub fn factor(self) -> f64 {
        match self {
            Period::Monthly => 1.0,
            Period::Annual => 12.0,
        }
    }

    /// Suffix appended to money values, e.g. "$6.25 / month".
    pub fn suffix(self) -> &'static str {
        match self {
            Period::Monthly => " / month",
            Period::Annual => " / year",
        }
    }

    /// Bare unit used in CSV exports.
    pub fn unit(self) -> &'static str {
        match self {
            Period::Monthly => "month",
            Period::Annual => "year",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Period::Monthly => "Monthly",
            Period::Annual => "Annual",
        }
    }
}

/// Dollar cost of one model at one token volume.
///
/// `total` is always the exact sum of the two components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total: f64,
}

impl CostBreakdown {
    fn from_parts(input_cost: f64, output_cost: f64) -> Self {
        Self {
            input_cost,
            output_cost,
            total: input_cost + output_cost,
        }
    }

    /// Multiply both components by `factor` and re-sum.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_parts(self.input_cost * factor, self.output_cost * factor)
    }
}

/// Monthly cost of `record` at the given token volumes. No rounding.
pub fn compute_monthly_cost(
    record: &PricingRecord,
    input_tokens: u64,
    output_tokens: u64,
) -> CostBreakdown {
    let input_cost = input_tokens as f64 / TOKENS_PER_UNIT * record.input_per_1m;
    let output_cost = output_tokens as f64 / TOKENS_PER_UNIT * record.output_per_1m;
    CostBreakdown::from_parts(input_cost, output_cost)
}

pub fn scale(breakdown: &CostBreakdown, factor: f64) -> CostBreakdown {
    breakdown.scaled(factor)
}

/// Cost for `period`, always computed fresh from the monthly figures.
pub fn estimate(
    record: &PricingRecord,
    input_tokens: u64,
    output_tokens: u64,
    period: Period,
) -> CostBreakdown {
    compute_monthly_cost(record, input_tokens, output_tokens).scaled(period.factor())
}

/// Two models priced at the same volume and period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub a: CostBreakdown,
    pub b: CostBreakdown,
    /// `b.total - a.total`; positive means B costs more.
    pub delta: f64,
}

pub fn compare(
    a: &PricingRecord,
    b: &PricingRecord,
    input_tokens: u64,
    output_tokens: u64,
    period: Period,
) -> Comparison {
    let a = estimate(a, input_tokens, output_tokens, period);
    let b = estimate(b, input_tokens, output_tokens, period);
    Comparison {
        a,
        b,
        delta: b.total - a.total,
    }
}

/// Illustrative discount on top of list price ("AIsa estimate").
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscountOverlay {
    /// Percent off list price, within [0, 100].
    pub percent: f64,
}

impl DiscountOverlay {
    pub fn new(percent: f64) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
        }
    }

    pub fn apply(&self, total: f64) -> f64 {
        total * (1.0 - self.percent / 100.0)
    }
}
