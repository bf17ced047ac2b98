use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::Style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tokencost_core::{
    config::{self, CalculatorConfig},
    format::{self, DisplayPayload},
    input::format_token_input,
    loader,
    session::{Hint, Mode},
    Display, PricingCatalog, PricingRecord, RecordId, ResultBundle, Session, SessionState, Slot,
};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_ok() -> Style     { Style::new().color256(114) }         // green
fn s_warn() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn on_off(v: bool) -> String {
    if v {
        s_ok().apply_to("on").to_string()
    } else {
        s_dim().apply_to("off").to_string()
    }
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "tokencost",
    about = "Estimate LLM API spend from per-million-token list prices",
    version,
    after_help = "examples:\n  \
        tokencost models claude\n  \
        tokencost cost gpt-5 --input 1,000,000 --output 500,000\n  \
        tokencost cost '#3' --preset 70-30 --annual --format markdown\n  \
        tokencost cost gemini-2.5-pro --preset 50-50 --discount-percent 15\n  \
        tokencost compare gpt-5 claude-sonnet-4 --preset 70-30 --format csv\n  \
        tokencost session                       (interactive calculator)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pricing table (TSV) to use instead of the bundled one
    #[arg(long, global = true, value_name = "PATH")]
    pricing: Option<PathBuf>,

    /// Calculator settings (TOML) to use instead of the bundled ones
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Download the pricing table from this URL
    #[cfg(feature = "network")]
    #[arg(long, global = true, conflicts_with = "pricing")]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List models, optionally filtered by provider or model name.
    Models {
        query: Option<String>,
        #[arg(long, short)]
        json: bool,
    },
    /// Estimate the cost of one model.
    Cost {
        /// `#id`, `provider | model`, model name, or a query with one match
        model: String,
        #[command(flatten)]
        usage: UsageArgs,
    },
    /// Compare two models at the same token volume.
    Compare {
        a: String,
        b: String,
        #[command(flatten)]
        usage: UsageArgs,
    },
    /// Interactive calculator with live recalculation.
    Session,
}

#[derive(Args, Debug, Clone)]
struct UsageArgs {
    /// Monthly input tokens, e.g. 1,000,000
    #[arg(long = "input", short = 'i', value_name = "N")]
    input: Option<String>,

    /// Monthly output tokens
    #[arg(long = "output", short = 'o', value_name = "N")]
    output: Option<String>,

    /// Fill both token counts from a preset, e.g. 70-30
    #[arg(long, short)]
    preset: Option<String>,

    /// Report yearly instead of monthly figures
    #[arg(long)]
    annual: bool,

    /// Add the illustrative discounted total
    #[arg(long)]
    discount: bool,

    /// Discount percent for the illustrative total (implies --discount)
    #[arg(long, value_name = "P")]
    discount_percent: Option<String>,

    #[arg(long, short, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pretty,
    Text,
    Markdown,
    Csv,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let catalog = load_pricing(&cli).await?;
    let config = load_settings(&cli)?;

    match cli.command {
        Commands::Models { query, json } => {
            cmd_models(&catalog, query.as_deref().unwrap_or(""), json)?;
        }
        Commands::Cost { model, usage } => {
            let id = resolve_model(&catalog, &model)?;
            cmd_estimate(catalog, config, &[(Slot::Single, id)], &usage)?;
        }
        Commands::Compare { a, b, usage } => {
            let a = resolve_model(&catalog, &a)?;
            let b = resolve_model(&catalog, &b)?;
            cmd_estimate(catalog, config, &[(Slot::A, a), (Slot::B, b)], &usage)?;
        }
        Commands::Session => {
            cmd_session(Session::new(catalog, config)).await?;
        }
    }
    Ok(())
}

// ── Loading ──────────────────────────────────────────────────────────

async fn load_pricing(cli: &Cli) -> anyhow::Result<PricingCatalog> {
    #[cfg(feature = "network")]
    if let Some(ref url) = cli.url {
        let term = console::Term::stderr();
        term.write_line(&format!("{}", s_dim().apply_to("downloading pricing table...")))?;
        let catalog = tokencost_core::fetch::fetch_catalog(url)
            .await
            .with_context(|| format!("fetching {url}"))?;
        term.clear_last_lines(1)?;
        tracing::info!(url = %url, models = catalog.len(), "downloaded pricing table");
        return Ok(catalog);
    }

    match cli.pricing {
        Some(ref path) => loader::load_catalog(path)
            .with_context(|| format!("loading {}", path.display())),
        None => loader::load_bundled_catalog().context("loading bundled pricing table"),
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<CalculatorConfig> {
    match cli.config {
        Some(ref path) => {
            config::load_config(path).with_context(|| format!("loading {}", path.display()))
        }
        None => config::load_bundled_config().context("loading bundled calculator settings"),
    }
}

// ── Model lookup ─────────────────────────────────────────────────────

/// Resolve `#3`, `OpenAI | gpt-5`, `gpt-5` or a query with exactly one match.
fn resolve_model(catalog: &PricingCatalog, raw: &str) -> anyhow::Result<RecordId> {
    let needle = raw.trim();

    if let Some(n) = needle.strip_prefix('#') {
        let id = RecordId(n.parse().with_context(|| format!("bad model id: {needle}"))?);
        return catalog
            .get(id)
            .map(|r| r.id)
            .ok_or_else(|| anyhow!("no model with id {needle}"));
    }

    let records = catalog.records();
    if let Some(r) = records.iter().find(|r| r.label().eq_ignore_ascii_case(needle)) {
        return Ok(r.id);
    }

    let by_name: Vec<&PricingRecord> = records
        .iter()
        .filter(|r| r.model.eq_ignore_ascii_case(needle))
        .collect();
    let hits = if by_name.is_empty() {
        catalog.filter(needle)
    } else {
        by_name
    };

    match hits.as_slice() {
        [one] => Ok(one.id),
        [] => bail!("no model matches '{needle}' (try `tokencost models`)"),
        many => {
            let shown: Vec<String> = many
                .iter()
                .take(6)
                .map(|r| format!("{} {}", r.id, r.label()))
                .collect();
            bail!(
                "'{needle}' matches {} models: {}{} (pick one by #id)",
                many.len(),
                shown.join(", "),
                if many.len() > shown.len() { ", ..." } else { "" }
            )
        }
    }
}

// ── Models ───────────────────────────────────────────────────────────

fn cmd_models(catalog: &PricingCatalog, query: &str, json: bool) -> anyhow::Result<()> {
    let hits = catalog.filter(query);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        eprintln!("{}", s_err().apply_to(format!("no models match '{query}'")));
        return Ok(());
    }

    println!();
    print_records(&hits);
    println!(
        "  {}",
        s_hint().apply_to(format!("{} of {} models", hits.len(), catalog.len()))
    );
    println!();
    Ok(())
}

fn print_records(records: &[&PricingRecord]) {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Id").fg(Color::AnsiValue(243)),
        Cell::new("Provider").fg(Color::AnsiValue(243)),
        Cell::new("Model").fg(Color::AnsiValue(243)),
        Cell::new("$/1M in").fg(Color::AnsiValue(243)),
        Cell::new("$/1M out").fg(Color::AnsiValue(243)),
    ]);
    for r in records {
        table.add_row(vec![
            Cell::new(format!("  {}", r.id)).fg(Color::AnsiValue(245)),
            Cell::new(&r.provider).fg(Color::AnsiValue(146)),
            Cell::new(&r.model).fg(Color::AnsiValue(252)),
            Cell::new(format!("${:.2}", r.input_per_1m)).fg(Color::AnsiValue(109)),
            Cell::new(format!("${:.2}", r.output_per_1m)).fg(Color::AnsiValue(109)),
        ]);
    }
    println!("{table}");
}

// ── Cost / Compare ───────────────────────────────────────────────────

fn cmd_estimate(
    catalog: PricingCatalog,
    config: CalculatorConfig,
    picks: &[(Slot, RecordId)],
    usage: &UsageArgs,
) -> anyhow::Result<()> {
    let compare = picks.iter().any(|(slot, _)| *slot != Slot::Single);
    let now = Duration::ZERO;

    let mut session = Session::new(catalog, config);
    session.set_compare_mode(compare, now);
    for &(slot, id) in picks {
        session.select_model(slot, Some(id), now);
    }
    if let Some(ref name) = usage.preset {
        session.apply_preset(name, now)?;
    }
    if let Some(ref n) = usage.input {
        session.set_input_tokens(n, now);
    }
    if let Some(ref n) = usage.output {
        session.set_output_tokens(n, now);
    }
    session.set_annual(usage.annual, now);
    if usage.discount || usage.discount_percent.is_some() {
        session.set_discount_enabled(true, now);
    }
    if let Some(ref pct) = usage.discount_percent {
        session.set_discount_percent(pct, now);
    }

    match session.calculate() {
        Display::Result(bundle) => {
            emit(bundle, usage.format, compare)?;
            Ok(())
        }
        Display::Hint(hint) => {
            eprintln!("{}", s_warn().apply_to(&hint.title));
            eprintln!("{}", s_hint().apply_to(&hint.body));
            std::process::exit(2);
        }
    }
}

fn emit(bundle: &ResultBundle, out: OutputFormat, compare: bool) -> anyhow::Result<()> {
    match out {
        OutputFormat::Pretty => print_payload(&bundle.display),
        OutputFormat::Text => println!("{}", bundle.text),
        OutputFormat::Markdown => println!("{}", bundle.markdown),
        OutputFormat::Csv => {
            println!("{}", format::csv_header(compare));
            println!("{}", bundle.csv);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(bundle)?),
    }
    Ok(())
}

// ── Display ──────────────────────────────────────────────────────────

fn print_payload(p: &DisplayPayload) {
    println!();
    println!("  {}", s_header().apply_to(&p.badge));
    println!("  {}", sep(48));
    for t in &p.tiles {
        let value = if t.emphasis {
            s_ok().bold().apply_to(&t.value)
        } else {
            s_price().apply_to(&t.value)
        };
        println!("  {:<16} {}", s_label().apply_to(&t.key), value);
        println!("  {:<16} {}", "", s_hint().apply_to(&t.sub));
    }
    println!();
}

fn print_hint(h: &Hint) {
    println!("  {}", s_warn().apply_to(&h.title));
    println!("  {}", s_hint().apply_to(&h.body));
}

fn print_display(d: &Display) {
    match d {
        Display::Result(bundle) => print_payload(&bundle.display),
        Display::Hint(h) => print_hint(h),
    }
}

// ── Session ──────────────────────────────────────────────────────────

const SESSION_HELP: &str = "\
  search [TEXT]        filter models (no text clears the filter)
  list                 show the models matching the filter
  pick [a|b] MODEL     select a model (slot a or b in compare mode)
  in N / out N         monthly input / output tokens
  preset [NAME]        fill both token counts (no name lists presets)
  annual on|off        yearly figures
  compare on|off       compare two models
  discount on|off|P    illustrative discounted total, or set its percent
  calc                 calculate now
  show                 current inputs and result
  copy text|md|csv     print an export of the current result
  help                 this text
  quit                 leave";

enum Flow {
    Continue,
    Quit,
}

async fn cmd_session(mut session: Session) -> anyhow::Result<()> {
    let origin = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!();
    println!("  {}", s_header().apply_to("tokencost session"));
    println!("  {}", sep(48));
    println!(
        "  {}",
        s_dim().apply_to(format!(
            "{} models loaded, type `help` for commands",
            session.catalog().len()
        ))
    );
    print_hint(&Hint::ready());
    prompt()?;

    loop {
        let deadline = session.pending_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match run_command(&mut session, line.trim(), origin.elapsed()) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("  {}", s_err().apply_to(format!("error: {e:#}"))),
                }
                prompt()?;
            }
            _ = tokio::time::sleep_until(origin + deadline.unwrap_or_default()), if deadline.is_some() => {
                if session.poll(origin.elapsed()) {
                    debug!("debounced refresh ran");
                    println!();
                    print_display(session.display());
                    prompt()?;
                }
            }
        }
    }
    println!();
    Ok(())
}

fn prompt() -> anyhow::Result<()> {
    print!("{} ", s_price().apply_to("\u{203a}"));
    std::io::stdout().flush()?;
    Ok(())
}

fn parse_toggle(arg: &str) -> anyhow::Result<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Ok(true),
        "off" | "no" | "false" | "0" => Ok(false),
        other => bail!("expected on or off, got '{other}'"),
    }
}

fn run_command(session: &mut Session, line: &str, now: Duration) -> anyhow::Result<Flow> {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    let live = session.state() == SessionState::Live;
    if !cmd.is_empty() {
        debug!(cmd, arg, "session command");
    }

    match cmd {
        "" => {}
        "help" | "?" => println!("{}", s_dim().apply_to(SESSION_HELP)),
        "quit" | "exit" | "q" => return Ok(Flow::Quit),
        "search" | "s" => {
            session.set_query(arg, now);
            if live {
                print_display(session.display());
            } else {
                let n = session.view().len();
                println!("  {}", s_dim().apply_to(format!("{n} models match")));
            }
            if let Some(id) = session.selection(Slot::Single) {
                if session.view().len() == 1 && session.mode() == Mode::Single {
                    println!("  {}", s_ok().apply_to(format!("selected {}", label_of(session, id))));
                }
            }
        }
        "list" | "ls" => {
            let view = session.view();
            if view.is_empty() {
                println!("  {}", s_dim().apply_to("no models match the current search"));
            } else {
                print_records(&view);
            }
        }
        "pick" | "p" => {
            let (slot, model) = pick_args(session.mode(), arg)?;
            let id = resolve_model(session.catalog(), model)?;
            if !session.view().iter().any(|r| r.id == id) {
                bail!("{} is hidden by the current search", label_of(session, id));
            }
            session.select_model(slot, Some(id), now);
            println!("  {}", s_ok().apply_to(format!("selected {}", label_of(session, id))));
        }
        "in" => {
            session.set_input_tokens(arg, now);
            println!("  {}", s_dim().apply_to(format!("input tokens {}", shown_tokens(arg))));
        }
        "out" => {
            session.set_output_tokens(arg, now);
            println!("  {}", s_dim().apply_to(format!("output tokens {}", shown_tokens(arg))));
        }
        "preset" => {
            if arg.is_empty() {
                for (name, p) in &session.config().presets {
                    println!(
                        "  {:<8} {}",
                        s_label().apply_to(name),
                        s_dim().apply_to(&p.label)
                    );
                }
            } else {
                session.apply_preset(arg, now)?;
                println!(
                    "  {}",
                    s_dim().apply_to(format!(
                        "input tokens {}, output tokens {}",
                        shown_tokens(session.input_tokens()),
                        shown_tokens(session.output_tokens())
                    ))
                );
            }
        }
        "annual" => session.set_annual(parse_toggle(arg)?, now),
        "compare" => session.set_compare_mode(parse_toggle(arg)?, now),
        "discount" => match parse_toggle(arg) {
            Ok(on) => session.set_discount_enabled(on, now),
            Err(_) if arg.chars().any(|c| c.is_ascii_digit()) => {
                session.set_discount_percent(arg, now);
                session.set_discount_enabled(true, now);
            }
            Err(e) => return Err(e),
        },
        "calc" | "c" => {
            session.calculate();
            print_display(session.display());
        }
        "show" => print_state(session),
        "copy" => {
            let d = session.display();
            let out = match arg {
                "" | "text" => d.copy_text(),
                "md" | "markdown" => d.copy_markdown(),
                "csv" => d.copy_csv(),
                other => bail!("unknown export '{other}', use text, md or csv"),
            };
            match out {
                Some(s) => println!("{s}"),
                None => println!("  {}", s_dim().apply_to("nothing to copy yet")),
            }
        }
        other => bail!("unknown command '{other}', type `help`"),
    }

    Ok(Flow::Continue)
}

/// Split `a gpt-5` into slot and model. Single mode takes the whole argument.
fn pick_args(mode: Mode, arg: &str) -> anyhow::Result<(Slot, &str)> {
    match mode {
        Mode::Single => {
            if arg.is_empty() {
                bail!("usage: pick MODEL");
            }
            Ok((Slot::Single, arg))
        }
        Mode::Compare => {
            let (slot, model) = arg
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: pick a|b MODEL"))?;
            let slot: Slot = slot.parse().map_err(|e: String| anyhow!(e))?;
            if slot == Slot::Single {
                bail!("compare mode uses slots a and b");
            }
            Ok((slot, model.trim()))
        }
    }
}

fn label_of(session: &Session, id: RecordId) -> String {
    session
        .catalog()
        .get(id)
        .map(PricingRecord::label)
        .unwrap_or_else(|| id.to_string())
}

fn shown_tokens(raw: &str) -> String {
    let s = format_token_input(raw);
    if s.is_empty() {
        "(empty)".to_string()
    } else {
        s
    }
}

fn print_state(session: &Session) {
    let slot_str = |slot: Slot| match session.selection(slot) {
        Some(id) => label_of(session, id),
        None => s_dim().apply_to("none").to_string(),
    };

    println!();
    println!("  {}", s_header().apply_to("inputs"));
    println!("  {}", sep(48));
    match session.mode() {
        Mode::Single => println!("  {:<16} {}", s_label().apply_to("model"), slot_str(Slot::Single)),
        Mode::Compare => {
            println!("  {:<16} {}", s_label().apply_to("model a"), slot_str(Slot::A));
            println!("  {:<16} {}", s_label().apply_to("model b"), slot_str(Slot::B));
        }
    }
    if !session.query().is_empty() {
        println!(
            "  {:<16} {} ({} matches)",
            s_label().apply_to("search"),
            session.query(),
            session.view().len()
        );
    }
    println!("  {:<16} {}", s_label().apply_to("input tokens"), shown_tokens(session.input_tokens()));
    println!("  {:<16} {}", s_label().apply_to("output tokens"), shown_tokens(session.output_tokens()));
    println!("  {:<16} {}", s_label().apply_to("annual"), on_off(session.is_annual()));
    println!(
        "  {:<16} {} ({}%)",
        s_label().apply_to("discount"),
        on_off(session.discount_enabled()),
        session.discount_percent()
    );
    print_display(session.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PricingCatalog {
        loader::load_catalog_str(
            "Provider\tModel\tInput $/1M\tOutput $/1M\n\
             OpenAI\tgpt-5\t1.25\t10\n\
             OpenAI\tgpt-5-mini\t0.25\t2\n\
             Anthropic\tclaude-sonnet-4\t3\t15\n\
             Google\tgemini-2.5-pro\t1.25\t10",
        )
        .unwrap()
    }

    fn model(c: &PricingCatalog, id: RecordId) -> &str {
        &c.get(id).unwrap().model
    }

    #[test]
    fn resolves_by_id_label_name_and_query() {
        let c = catalog();
        assert_eq!(model(&c, resolve_model(&c, "#0").unwrap()), "gpt-5");
        assert_eq!(model(&c, resolve_model(&c, "openai | gpt-5-mini").unwrap()), "gpt-5-mini");
        // exact name wins over the wider substring match
        assert_eq!(model(&c, resolve_model(&c, "gpt-5").unwrap()), "gpt-5");
        assert_eq!(model(&c, resolve_model(&c, "sonnet").unwrap()), "claude-sonnet-4");
    }

    #[test]
    fn rejects_ambiguous_and_unknown() {
        let c = catalog();
        let err = resolve_model(&c, "openai").unwrap_err().to_string();
        assert!(err.contains("matches 2 models"), "{err}");
        assert!(resolve_model(&c, "llama").is_err());
        assert!(resolve_model(&c, "#99").is_err());
        assert!(resolve_model(&c, "#x").is_err());
    }

    #[test]
    fn pick_arguments() {
        assert_eq!(pick_args(Mode::Single, "gpt-5").unwrap(), (Slot::Single, "gpt-5"));
        assert_eq!(pick_args(Mode::Compare, "b gpt-5").unwrap(), (Slot::B, "gpt-5"));
        assert!(pick_args(Mode::Compare, "gpt-5").is_err());
        assert!(pick_args(Mode::Compare, "single gpt-5").is_err());
        assert!(pick_args(Mode::Single, "").is_err());
    }

    #[test]
    fn session_commands_drive_the_calculator() {
        let mut s = Session::new(catalog(), config::load_bundled_config().unwrap());
        let t = Duration::ZERO;
        for line in ["pick gemini", "preset 70-30", "annual on"] {
            assert!(matches!(run_command(&mut s, line, t), Ok(Flow::Continue)), "{line}");
        }
        run_command(&mut s, "calc", t).unwrap();
        let text = s.display().copy_text().unwrap();
        assert!(text.contains("Total: $465.00 / year"), "{text}");

        assert!(run_command(&mut s, "annual maybe", t).is_err());
        assert!(run_command(&mut s, "frobnicate", t).is_err());
        assert!(matches!(run_command(&mut s, "quit", t), Ok(Flow::Quit)));
    }
}
