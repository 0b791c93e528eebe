//! trendsig CLI — run the signal pipeline and inspect the journal.
//!
//! Commands:
//! - `run` — fetch bars, compute indicators, apply a rule set, journal and chart
//! - `journal show` — print the journal rows

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use trendsig_core::data::{BinanceSource, CsvSource, MarketDataSource, SyntheticSource};
use trendsig_core::domain::Timeframe;
use trendsig_runner::{
    run, with_retry, ChartSurface, JournalWriter, JsonChartSurface, NullSurface, RuleSetKind,
    RunConfig, RunSummary,
};

#[derive(Parser)]
#[command(
    name = "trendsig",
    about = "trendsig CLI — indicator signals, journal and chart annotation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Binance public klines endpoint.
    Binance,
    /// Local CSV file (see --csv-path).
    Csv,
    /// Seeded random walk, no network.
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once over the most recent bars.
    Run {
        /// Path to a TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trading pair, e.g. BTC/USDT.
        #[arg(long)]
        symbol: Option<String>,

        /// Bar interval, e.g. 1h, 4h, 1d.
        #[arg(long)]
        timeframe: Option<Timeframe>,

        /// Number of most recent bars to fetch.
        #[arg(long)]
        limit: Option<usize>,

        /// Where bars come from.
        #[arg(long, value_enum, default_value = "binance")]
        source: SourceKind,

        /// CSV file (required with --source csv).
        #[arg(long)]
        csv_path: Option<PathBuf>,

        /// Seed for --source synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Journal file.
        #[arg(long)]
        journal: Option<PathBuf>,

        /// Chart document output path.
        #[arg(long)]
        chart_out: Option<PathBuf>,

        /// Skip writing the chart document.
        #[arg(long, default_value_t = false)]
        no_chart: bool,

        /// Rule set: crossover or threshold.
        #[arg(long)]
        rules: Option<RuleSetKind>,

        /// Annotate every journal entry, not only this run's signals.
        #[arg(long, default_value_t = false)]
        with_journal_history: bool,
    },
    /// Journal commands.
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
}

#[derive(Subcommand)]
enum JournalAction {
    /// Print every journal row.
    Show {
        /// Journal file. Defaults to the configured journal path.
        #[arg(long)]
        journal: Option<PathBuf>,
    },
}

fn init_logging() {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init()
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            symbol,
            timeframe,
            limit,
            source,
            csv_path,
            seed,
            journal,
            chart_out,
            no_chart,
            rules,
            with_journal_history,
        } => {
            let mut cfg = match config {
                Some(path) => RunConfig::from_file(&path)?,
                None => RunConfig::default(),
            };
            if let Some(symbol) = symbol {
                cfg.symbol = symbol;
            }
            if let Some(timeframe) = timeframe {
                cfg.timeframe = timeframe;
            }
            if let Some(limit) = limit {
                cfg.limit = limit;
            }
            if let Some(journal) = journal {
                cfg.journal.path = journal;
            }
            if let Some(chart_out) = chart_out {
                cfg.chart.output = chart_out;
            }
            if no_chart {
                cfg.chart.render = false;
            }
            if let Some(rules) = rules {
                cfg.rules = rules;
            }
            if with_journal_history {
                cfg.chart.journal_history = true;
            }
            cfg.validate()?;
            run_cmd(&cfg, source, csv_path, seed)
        }
        Commands::Journal { action } => match action {
            JournalAction::Show { journal } => {
                let path = journal.unwrap_or_else(|| RunConfig::default().journal.path);
                show_journal(&path)
            }
        },
    }
}

fn build_source(
    kind: SourceKind,
    csv_path: Option<PathBuf>,
    seed: u64,
) -> Result<Box<dyn MarketDataSource>> {
    Ok(match kind {
        SourceKind::Binance => Box::new(BinanceSource::new()?),
        SourceKind::Csv => {
            let path = csv_path.context("--csv-path is required with --source csv")?;
            Box::new(CsvSource::new(path))
        }
        SourceKind::Synthetic => Box::new(SyntheticSource::new(seed)),
    })
}

fn run_cmd(cfg: &RunConfig, kind: SourceKind, csv_path: Option<PathBuf>, seed: u64) -> Result<()> {
    let source = with_retry(build_source(kind, csv_path, seed)?, cfg);
    let journal = JournalWriter::new(&cfg.journal.path);
    let json_surface = JsonChartSurface::new(&cfg.chart.output);
    let surface: &dyn ChartSurface = if cfg.chart.render {
        &json_surface
    } else {
        &NullSurface
    };

    let summary = run(cfg, &source, &journal, surface)
        .with_context(|| format!("run failed for {} {}", cfg.symbol, cfg.timeframe))?;
    print_summary(&summary, journal.path());
    Ok(())
}

fn print_summary(summary: &RunSummary, journal_path: &Path) {
    println!(
        "{} {} | {} | {} bars",
        summary.symbol, summary.timeframe, summary.rule_set, summary.bar_count
    );
    println!(
        "Signals: {} ({} long, {} short)",
        summary.signal_count(),
        summary.long_count,
        summary.short_count
    );
    if summary.journal_rows > 0 {
        println!(
            "Journal: {} rows appended to {}",
            summary.journal_rows,
            journal_path.display()
        );
    }
    println!(
        "Markers: {} up, {} down",
        summary.up_markers, summary.down_markers
    );
    if let Some(chart) = &summary.chart_path {
        println!("Chart saved to: {}", chart.display());
    }
}

fn show_journal(path: &Path) -> Result<()> {
    let rows = JournalWriter::new(path).read_rows()?;
    if rows.is_empty() {
        println!("Journal is empty: {}", path.display());
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:<6} {:>12} {:>12} {:>12}",
        "Time", "Symbol", "Type", "Entry", "SL", "TP"
    );
    println!("{}", "-".repeat(79));
    for r in &rows {
        println!(
            "{:<20} {:<12} {:<6} {:>12.2} {:>12.2} {:>12.2}",
            r.time, r.symbol, r.kind, r.entry, r.stop_loss, r.take_profit
        );
    }
    println!("{} rows", rows.len());
    Ok(())
}
