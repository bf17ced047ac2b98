//! Rendering a computed result as a display payload, plain text, markdown
//! and a CSV row.
//!
//! Renderers never compute costs. They format the numbers handed to them,
//! through the same helpers, so every representation shows the same figures.

use serde::Serialize;

use crate::cost::{Comparison, CostBreakdown, DiscountOverlay, Period};
use crate::input::fmt_thousands;
use crate::pricing::PricingRecord;

pub const SINGLE_CSV_HEADER: &str = "provider,model,input_tokens,output_tokens,input_per_1m,\
output_per_1m,input_cost,output_cost,total,discounted_total,discount_percent,period";

pub const COMPARE_CSV_HEADER: &str =
    "provider_a,model_a,total_a,provider_b,model_b,total_b,delta,period";

/// Header row matching the CSV line of a single or compare result.
pub fn csv_header(compare: bool) -> &'static str {
    if compare {
        COMPARE_CSV_HEADER
    } else {
        SINGLE_CSV_HEADER
    }
}

const DELTA_NOTE: &str = "Positive delta means B is costlier than A.";

/// One labelled value of the results panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub key: String,
    pub value: String,
    pub sub: String,
    /// Rendered larger than the others (the headline figure).
    pub emphasis: bool,
}

impl Tile {
    fn new(key: &str, value: String, sub: String) -> Self {
        Self {
            key: key.to_string(),
            value,
            sub,
            emphasis: false,
        }
    }

    fn emphasized(mut self) -> Self {
        self.emphasis = true;
        self
    }
}

/// Structured content for the results panel, ready for markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPayload {
    pub badge: String,
    pub tiles: Vec<Tile>,
}

/// The four synchronized renderings of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    pub display: DisplayPayload,
    pub text: String,
    pub markdown: String,
    pub csv: String,
}

/// A single-model estimate, already scaled to `period`.
#[derive(Debug, Clone)]
pub struct SingleResult<'a> {
    pub record: &'a PricingRecord,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub period: Period,
    pub costs: CostBreakdown,
    pub overlay: Option<DiscountOverlay>,
}

/// Two models at the same volume, already scaled to `period`.
#[derive(Debug, Clone)]
pub struct CompareResult<'a> {
    pub a: &'a PricingRecord,
    pub b: &'a PricingRecord,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub period: Period,
    pub comparison: Comparison,
}

// ── Number formatting ────────────────────────────────────────────────

fn fixed2(v: f64) -> String {
    format!("{v:.2}")
}

/// "$6.25"
pub fn money(v: f64) -> String {
    format!("${}", fixed2(v))
}

fn is_negative(delta: f64) -> bool {
    delta < 0.0
}

/// "+$2.75" or "-$2.75", never "$-2.75".
pub fn signed_money(delta: f64) -> String {
    if is_negative(delta) {
        format!("-{}", money(delta.abs()))
    } else {
        format!("+{}", money(delta.abs()))
    }
}

fn signed_fixed(delta: f64) -> String {
    if is_negative(delta) {
        format!("-{}", fixed2(delta.abs()))
    } else {
        fixed2(delta.abs())
    }
}

/// Shortest decimal form for rates and percentages: 10, 1.25, 12.5.
fn plain(v: f64) -> String {
    format!("{v}")
}

fn csv_text(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn title(kind: &str, period: Period) -> String {
    format!("{kind} ({})", period.title())
}

// ── Single model ─────────────────────────────────────────────────────

pub fn format_single(r: &SingleResult<'_>) -> ResultBundle {
    let rec = r.record;
    let sfx = r.period.suffix();
    let c = &r.costs;
    let in_tokens = fmt_thousands(r.input_tokens);
    let out_tokens = fmt_thousands(r.output_tokens);
    let in_cost = format!("{}{sfx}", money(c.input_cost));
    let out_cost = format!("{}{sfx}", money(c.output_cost));
    let total = format!("{}{sfx}", money(c.total));
    let heading = title("Model Cost Estimate", r.period);

    let discounted = r.overlay.map(|o| (o.apply(c.total), o.percent));

    // Plain text.
    let mut text = vec![
        heading.clone(),
        format!("Provider: {}", rec.provider),
        format!("Model: {}", rec.model),
        format!("Monthly input tokens: {in_tokens}"),
        format!("Monthly output tokens: {out_tokens}"),
        format!("Input cost: {in_cost}"),
        format!("Output cost: {out_cost}"),
        format!("Total: {total}"),
    ];

    // Markdown.
    let mut markdown = vec![
        format!("### {heading}"),
        format!("- **Provider**: {}", rec.provider),
        format!("- **Model**: {}", rec.model),
        format!("- **Monthly input tokens**: {in_tokens}"),
        format!("- **Monthly output tokens**: {out_tokens}"),
        format!("- **Input cost**: **{in_cost}**"),
        format!("- **Output cost**: **{out_cost}**"),
        format!("- **Total**: **{total}**"),
    ];

    // Display.
    let mut tiles = vec![
        Tile::new(
            "Input cost",
            in_cost,
            format!("{in_tokens} monthly tokens × ${}/1M", plain(rec.input_per_1m)),
        ),
        Tile::new(
            "Output cost",
            out_cost,
            format!("{out_tokens} monthly tokens × ${}/1M", plain(rec.output_per_1m)),
        ),
        Tile::new(
            "Total estimate",
            total,
            "Token-based estimate using official list pricing.".to_string(),
        )
        .emphasized(),
    ];

    // CSV. The overlay pair is always present so the column count is stable.
    let mut csv = vec![
        csv_text(&rec.provider),
        csv_text(&rec.model),
        r.input_tokens.to_string(),
        r.output_tokens.to_string(),
        plain(rec.input_per_1m),
        plain(rec.output_per_1m),
        fixed2(c.input_cost),
        fixed2(c.output_cost),
        fixed2(c.total),
    ];

    match discounted {
        Some((value, pct)) => {
            let pct = plain(pct);
            let shown = format!("{}{sfx}", money(value));
            text.push(format!("AIsa estimate (illustrative, {pct}%): {shown}"));
            markdown.push(format!("- **AIsa estimate (illustrative, {pct}%)**: {shown}"));
            tiles.push(Tile::new(
                "AIsa estimate",
                shown,
                format!("Illustrative only, assumes {pct}% discount."),
            ));
            csv.push(fixed2(value));
            csv.push(pct);
        }
        None => {
            csv.push(String::new());
            csv.push(String::new());
        }
    }
    csv.push(csv_text(r.period.unit()));

    ResultBundle {
        display: DisplayPayload {
            badge: rec.label(),
            tiles,
        },
        text: text.join("\n"),
        markdown: markdown.join("\n"),
        csv: csv.join(","),
    }
}

// ── Compare ──────────────────────────────────────────────────────────

pub fn format_compare(r: &CompareResult<'_>) -> ResultBundle {
    let sfx = r.period.suffix();
    let cmp = &r.comparison;
    let in_tokens = fmt_thousands(r.input_tokens);
    let out_tokens = fmt_thousands(r.output_tokens);
    let total_a = format!("{}{sfx}", money(cmp.a.total));
    let total_b = format!("{}{sfx}", money(cmp.b.total));
    let delta = format!("{}{sfx}", signed_money(cmp.delta));
    let heading = title("Model Compare", r.period);

    let text = [
        heading.clone(),
        format!("Monthly tokens: Input {in_tokens}, Output {out_tokens}"),
        String::new(),
        format!("A: {} => {total_a}", r.a.label()),
        format!("B: {} => {total_b}", r.b.label()),
        format!("Delta (B - A): {delta}"),
        DELTA_NOTE.to_string(),
    ]
    .join("\n");

    let markdown = [
        format!("### {heading}"),
        format!("- **Monthly tokens**: Input {in_tokens}, Output {out_tokens}"),
        format!("- **A**: {} = **{total_a}**", r.a.label()),
        format!("- **B**: {} = **{total_b}**", r.b.label()),
        format!("- **Delta (B - A)**: **{delta}**"),
        format!("- _{DELTA_NOTE}_"),
    ]
    .join("\n");

    let csv = [
        csv_text(&r.a.provider),
        csv_text(&r.a.model),
        fixed2(cmp.a.total),
        csv_text(&r.b.provider),
        csv_text(&r.b.model),
        fixed2(cmp.b.total),
        signed_fixed(cmp.delta),
        csv_text(r.period.unit()),
    ]
    .join(",");

    let tiles = vec![
        Tile::new("Model A", total_a, r.a.label()),
        Tile::new("Model B", total_b, r.b.label()),
        Tile::new("Delta (B - A)", delta, DELTA_NOTE.to_string()).emphasized(),
    ];

    ResultBundle {
        display: DisplayPayload {
            badge: "Compare Mode".to_string(),
            tiles,
        },
        text,
        markdown,
        csv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{compare, estimate};
    use crate::pricing::RecordId;

    fn rec(provider: &str, model: &str, input: f64, output: f64) -> PricingRecord {
        PricingRecord {
            id: RecordId(0),
            provider: provider.into(),
            model: model.into(),
            input_per_1m: input,
            output_per_1m: output,
        }
    }

    fn single<'a>(
        record: &'a PricingRecord,
        period: Period,
        overlay: Option<DiscountOverlay>,
    ) -> SingleResult<'a> {
        SingleResult {
            record,
            input_tokens: 1_000_000,
            output_tokens: 500_000,
            period,
            costs: estimate(record, 1_000_000, 500_000, period),
            overlay,
        }
    }

    fn csv_fields(row: &str) -> usize {
        // Test data never embeds commas inside quoted fields.
        row.split(',').count()
    }

    #[test]
    fn money_formatting() {
        assert_eq!(money(6.25), "$6.25");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1234.5), "$1234.50");
        assert_eq!(signed_money(2.75), "+$2.75");
        assert_eq!(signed_money(-2.75), "-$2.75");
        assert_eq!(signed_money(0.0), "+$0.00");
        assert_eq!(signed_money(-0.0), "+$0.00");
    }

    #[test]
    fn single_monthly_text() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let out = format_single(&single(&r, Period::Monthly, None));
        assert_eq!(
            out.text,
            "Model Cost Estimate (Monthly)\n\
             Provider: OpenAI\n\
             Model: gpt-5\n\
             Monthly input tokens: 1,000,000\n\
             Monthly output tokens: 500,000\n\
             Input cost: $1.25 / month\n\
             Output cost: $5.00 / month\n\
             Total: $6.25 / month"
        );
    }

    #[test]
    fn single_csv_without_overlay_keeps_columns() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let out = format_single(&single(&r, Period::Monthly, None));
        assert_eq!(
            out.csv,
            r#""OpenAI","gpt-5",1000000,500000,1.25,10,1.25,5.00,6.25,,,"month""#
        );
        assert_eq!(csv_fields(&out.csv), csv_fields(SINGLE_CSV_HEADER));
    }

    #[test]
    fn single_with_overlay() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let out = format_single(&single(&r, Period::Monthly, Some(DiscountOverlay::new(20.0))));
        assert!(out
            .text
            .ends_with("\nAIsa estimate (illustrative, 20%): $5.00 / month"));
        assert!(out
            .markdown
            .ends_with("\n- **AIsa estimate (illustrative, 20%)**: $5.00 / month"));
        assert!(out.csv.ends_with(",6.25,5.00,20,\"month\""), "{}", out.csv);
        assert_eq!(csv_fields(&out.csv), csv_fields(SINGLE_CSV_HEADER));

        let aisa = out.display.tiles.last().unwrap();
        assert_eq!(aisa.key, "AIsa estimate");
        assert_eq!(aisa.value, "$5.00 / month");
        assert_eq!(aisa.sub, "Illustrative only, assumes 20% discount.");
    }

    #[test]
    fn single_annual() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let out = format_single(&single(&r, Period::Annual, None));
        assert!(out.text.starts_with("Model Cost Estimate (Annual)\n"));
        assert!(out.text.ends_with("Total: $75.00 / year"));
        assert!(out.markdown.contains("- **Total**: **$75.00 / year**"));
        assert!(out.csv.ends_with(",75.00,,,\"year\""));
        assert_eq!(out.display.tiles[2].value, "$75.00 / year");
        assert!(out.display.tiles[2].emphasis);
    }

    #[test]
    fn single_markdown_layout() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let out = format_single(&single(&r, Period::Monthly, None));
        let lines: Vec<&str> = out.markdown.lines().collect();
        assert_eq!(lines[0], "### Model Cost Estimate (Monthly)");
        assert!(lines[1..].iter().all(|l| l.starts_with("- **")));
        assert_eq!(lines[5], "- **Input cost**: **$1.25 / month**");
    }

    #[test]
    fn display_payload() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let out = format_single(&single(&r, Period::Monthly, None));
        assert_eq!(out.display.badge, "OpenAI | gpt-5");
        assert_eq!(out.display.tiles.len(), 3);
        assert_eq!(
            out.display.tiles[0].sub,
            "1,000,000 monthly tokens × $1.25/1M"
        );
        assert_eq!(out.display.tiles[1].sub, "500,000 monthly tokens × $10/1M");
    }

    #[test]
    fn csv_quotes_text_fields() {
        let r = rec("Acme \"Labs\", Inc", "m,1", 1.0, 1.0);
        let out = format_single(&single(&r, Period::Monthly, None));
        assert!(out.csv.starts_with(r#""Acme ""Labs"", Inc","m,1",1000000"#), "{}", out.csv);
    }

    #[test]
    fn total_agrees_across_renderings() {
        let totals: &[(f64, f64)] = &[
            (0.0, 0.0),
            (0.005, 0.0),
            (1.125, 3.3),
            (2.675, 0.001),
            (0.333333, 0.666667),
            (15.0, 75.0),
            (1234.5678, 98.765),
        ];
        for &(ri, ro) in totals {
            for period in [Period::Monthly, Period::Annual] {
                let r = rec("P", "M", ri, ro);
                let s = single(&r, period, Some(DiscountOverlay::new(12.5)));
                let out = format_single(&s);
                let expected = fixed2(s.costs.total);

                let csv: Vec<&str> = out.csv.split(',').collect();
                assert_eq!(csv[8], expected);
                assert!(out.text.contains(&format!("Total: ${expected}")));
                assert!(out.markdown.contains(&format!("**Total**: **${expected}")));
                assert!(out.display.tiles[2].value.starts_with(&format!("${expected}")));

                let disc = fixed2(DiscountOverlay::new(12.5).apply(s.costs.total));
                assert_eq!(csv[9], disc);
                assert!(out.text.contains(&format!("): ${disc}")));
            }
        }
    }

    #[test]
    fn csv_header_matches_row_shape() {
        let r = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let single_row = format_single(&single(&r, Period::Monthly, None)).csv;
        assert_eq!(csv_header(false), SINGLE_CSV_HEADER);
        assert_eq!(csv_fields(csv_header(false)), csv_fields(&single_row));

        let cmp = CompareResult {
            a: &r,
            b: &r,
            input_tokens: 1,
            output_tokens: 1,
            period: Period::Monthly,
            comparison: compare(&r, &r, 1, 1, Period::Monthly),
        };
        let compare_row = format_compare(&cmp).csv;
        assert_eq!(csv_header(true), COMPARE_CSV_HEADER);
        assert_eq!(csv_fields(csv_header(true)), csv_fields(&compare_row));
        assert!(csv_header(true).starts_with("provider_a,"));
    }

    #[test]
    fn compare_positive_and_negative_delta() {
        let a = rec("OpenAI", "gpt-5", 1.25, 10.0);
        let b = rec("Anthropic", "claude-sonnet-4", 2.0, 14.0);

        let r = CompareResult {
            a: &a,
            b: &b,
            input_tokens: 1_000_000,
            output_tokens: 500_000,
            period: Period::Monthly,
            comparison: compare(&a, &b, 1_000_000, 500_000, Period::Monthly),
        };
        let out = format_compare(&r);
        assert_eq!(
            out.text,
            "Model Compare (Monthly)\n\
             Monthly tokens: Input 1,000,000, Output 500,000\n\
             \n\
             A: OpenAI | gpt-5 => $6.25 / month\n\
             B: Anthropic | claude-sonnet-4 => $9.00 / month\n\
             Delta (B - A): +$2.75 / month\n\
             Positive delta means B is costlier than A."
        );
        assert!(out.markdown.contains("- **Delta (B - A)**: **+$2.75 / month**"));
        assert!(out.markdown.contains(DELTA_NOTE));
        assert_eq!(
            out.csv,
            r#""OpenAI","gpt-5",6.25,"Anthropic","claude-sonnet-4",9.00,2.75,"month""#
        );
        assert_eq!(csv_fields(&out.csv), csv_fields(COMPARE_CSV_HEADER));
        assert_eq!(out.display.badge, "Compare Mode");
        assert_eq!(out.display.tiles[2].value, "+$2.75 / month");

        let rev = CompareResult {
            a: &b,
            b: &a,
            comparison: compare(&b, &a, 1_000_000, 500_000, Period::Monthly),
            ..r
        };
        let out = format_compare(&rev);
        assert!(out.text.contains("Delta (B - A): -$2.75 / month"));
        assert!(out.csv.ends_with(",-2.75,\"month\""));
        assert_eq!(out.display.tiles[2].value, "-$2.75 / month");
    }
}
