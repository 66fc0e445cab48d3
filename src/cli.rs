//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{write_bars_csv, write_indicators_csv, write_signals_csv};
use crate::adapters::data_port_for;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::bar::{Bar, validate_bars};
use crate::domain::config::{AppConfig, DEFAULT_SEED, DEFAULT_SIMULATED_BARS, DataSource};
use crate::domain::config_validation::build_app_config;
use crate::domain::error::FxError;
use crate::domain::indicator::{IndicatorFrame, compute_all_indicators};
use crate::domain::risk::position_size;
use crate::domain::signal::{Signal, SignalRecord, generate_signals};
use crate::logging::init_logging;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "fxbracket", about = "Single-instrument FX signal research and backtesting")]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Debug-level logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// INI configuration file; built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured symbol
    #[arg(long, env = "SYMBOL", global = true)]
    pub symbol: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Simulated,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write a JSON report
    Backtest {
        #[arg(short, long, default_value = "backtest_report.json")]
        output: PathBuf,
        /// Also print the metrics as JSON to stdout
        #[arg(long)]
        print: bool,
    },
    /// Show the latest signal rows
    Signals {
        #[arg(long, default_value_t = 10)]
        tail: usize,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compute indicators
    Indicators {
        #[arg(long, default_value_t = 5)]
        tail: usize,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Position size for a hypothetical entry
    Size {
        #[arg(long, default_value_t = 10_000.0)]
        equity: f64,
        #[arg(long, default_value_t = 1.08)]
        price: f64,
        #[arg(long, default_value_t = 0.001)]
        atr: f64,
    },
    /// Preview or export bars
    Data {
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
        /// Bar count for the simulated source
        #[arg(long)]
        bars: Option<usize>,
        #[arg(long)]
        csv_path: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate the configuration and print the resolved values
    Validate,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.log_json, cli.verbose);

    let result = load_app_config(cli.config.as_deref(), cli.symbol.as_deref()).and_then(|config| {
        match cli.command {
            Command::Backtest { output, print } => run_backtest_cmd(&config, &output, print),
            Command::Signals { tail, out } => run_signals(&config, tail, out.as_deref()),
            Command::Indicators { tail, out } => run_indicators(&config, tail, out.as_deref()),
            Command::Size { equity, price, atr } => {
                run_size(&config, equity, price, atr);
                Ok(())
            }
            Command::Data {
                source,
                bars,
                csv_path,
                out,
            } => run_data(config, source, bars, csv_path, out.as_deref()),
            Command::Validate => run_validate(&config),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Built-in defaults, or the INI file when given. The symbol override wins
/// over both.
pub fn load_app_config(path: Option<&Path>, symbol: Option<&str>) -> Result<AppConfig, FxError> {
    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            build_app_config(&FileConfigAdapter::from_file(path)?)?
        }
        None => AppConfig::default(),
    };
    if let Some(symbol) = symbol.map(str::trim).filter(|s| !s.is_empty()) {
        config.symbol = symbol.to_string();
    }
    Ok(config)
}

fn load_bars(config: &AppConfig) -> Result<Vec<Bar>, FxError> {
    let port = data_port_for(config);
    info!(source = %port.describe(), "loading bars");
    let bars = port.fetch_bars()?;
    validate_bars(&bars)?;
    info!(bars = bars.len(), "bars loaded");
    Ok(bars)
}

fn compute_signals(config: &AppConfig) -> Result<(Vec<IndicatorFrame>, Vec<SignalRecord>), FxError> {
    let bars = load_bars(config)?;
    let frames = compute_all_indicators(&bars, &config.indicators);
    let records = generate_signals(&frames, &config.strategy, &config.risk);
    Ok((frames, records))
}

fn run_backtest_cmd(config: &AppConfig, output: &Path, print: bool) -> Result<(), FxError> {
    let bars = load_bars(config)?;
    let result = run_backtest(&bars, config)?;
    let m = &result.metrics;
    let s = &result.trade_stats;

    eprintln!("\n=== Backtest {} {} ===", config.symbol, config.timeframe);
    eprintln!("Bars:             {}", m.bars);
    eprintln!("Return:           {:.2}%", m.cagr * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino);
    eprintln!("Max Drawdown:     {:.2}%", m.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", s.total_trades);
    eprintln!("Win Rate:         {:.1}%", s.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", s.profit_factor);
    eprintln!("Last Equity:      {:.2}", m.last_equity);

    if print {
        let json = serde_json::to_string_pretty(m).map_err(|e| FxError::Report {
            reason: e.to_string(),
        })?;
        println!("{json}");
    }

    JsonReportAdapter.write(&result, &config.symbol, &output.display().to_string())?;
    eprintln!("\nReport written to: {}", output.display());
    Ok(())
}

fn signal_counts(records: &[SignalRecord]) -> (usize, usize, usize) {
    records
        .iter()
        .fold((0, 0, 0), |(long, flat, short), r| match r.signal {
            Signal::Long => (long + 1, flat, short),
            Signal::Flat => (long, flat + 1, short),
            Signal::Short => (long, flat, short + 1),
        })
}

fn run_signals(config: &AppConfig, tail: usize, out: Option<&Path>) -> Result<(), FxError> {
    let (_, records) = compute_signals(config)?;

    println!(
        "{:<22} {:>10} {:>6} {:>6} {:>10} {:>10}",
        "timestamp", "close", "signal", "score", "sl", "tp"
    );
    let start = records.len().saturating_sub(tail);
    for r in &records[start..] {
        let (sl, tp) = match r.bracket {
            Some(b) => (format!("{:.5}", b.stop_loss), format!("{:.5}", b.take_profit)),
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:<22} {:>10.5} {:>6} {:>6.2} {:>10} {:>10}",
            r.frame.timestamp().format("%Y-%m-%d %H:%M"),
            r.frame.close(),
            r.signal.as_i8(),
            r.score,
            sl,
            tp
        );
    }

    let (long, flat, short) = signal_counts(&records);
    println!("\nsignal counts: long={long} flat={flat} short={short}");

    if let Some(path) = out {
        write_signals_csv(path, &records)?;
        eprintln!("Signals written to: {}", path.display());
    }
    Ok(())
}

fn run_indicators(config: &AppConfig, tail: usize, out: Option<&Path>) -> Result<(), FxError> {
    let (frames, _) = compute_signals(config)?;

    println!(
        "{:<22} {:>10} {:>10} {:>10} {:>7} {:>10} {:>10}",
        "timestamp", "close", "ema_fast", "ema_slow", "rsi", "macd", "atr"
    );
    let start = frames.len().saturating_sub(tail);
    for f in &frames[start..] {
        println!(
            "{:<22} {:>10.5} {:>10.5} {:>10.5} {:>7.2} {:>10.6} {:>10.6}",
            f.timestamp().format("%Y-%m-%d %H:%M"),
            f.close(),
            f.ema_fast,
            f.ema_slow,
            f.rsi,
            f.macd,
            f.atr
        );
    }

    if let Some(path) = out {
        write_indicators_csv(path, &frames)?;
        eprintln!("Indicators written to: {}", path.display());
    }
    Ok(())
}

fn run_size(config: &AppConfig, equity: f64, price: f64, atr: f64) {
    let units = position_size(equity, price, atr, &config.risk);
    println!("Units: {units}");
}

fn run_data(
    mut config: AppConfig,
    source: Option<SourceKind>,
    bars: Option<usize>,
    csv_path: Option<String>,
    out: Option<&Path>,
) -> Result<(), FxError> {
    config.data = override_source(config.data, source, bars, csv_path)?;

    let bars = load_bars(&config)?;
    let preview = |slice: &[Bar]| {
        for b in slice {
            println!(
                "{}  o={:.5} h={:.5} l={:.5} c={:.5} v={}",
                b.timestamp.format("%Y-%m-%d %H:%M"),
                b.open,
                b.high,
                b.low,
                b.close,
                b.volume.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
            );
        }
    };
    preview(&bars[..bars.len().min(5)]);
    if bars.len() > 5 {
        println!("...");
        preview(&bars[bars.len().saturating_sub(3).max(5)..]);
    }

    if let Some(path) = out {
        write_bars_csv(path, &bars)?;
        eprintln!("Bars written to: {}", path.display());
    }
    Ok(())
}

/// Apply the `data` command's source flags on top of the configured source.
fn override_source(
    current: DataSource,
    source: Option<SourceKind>,
    bars: Option<usize>,
    csv_path: Option<String>,
) -> Result<DataSource, FxError> {
    let kind = source.unwrap_or(match current {
        DataSource::Simulated { .. } => SourceKind::Simulated,
        DataSource::Csv { .. } => SourceKind::Csv,
    });

    match (kind, current) {
        (SourceKind::Simulated, DataSource::Simulated { bars: n, seed }) => {
            Ok(DataSource::Simulated {
                bars: bars.unwrap_or(n),
                seed,
            })
        }
        (SourceKind::Simulated, DataSource::Csv { .. }) => Ok(DataSource::Simulated {
            bars: bars.unwrap_or(DEFAULT_SIMULATED_BARS),
            seed: DEFAULT_SEED,
        }),
        (SourceKind::Csv, DataSource::Csv { path }) => Ok(DataSource::Csv {
            path: csv_path.unwrap_or(path),
        }),
        (SourceKind::Csv, DataSource::Simulated { .. }) => csv_path
            .map(|path| DataSource::Csv { path })
            .ok_or_else(|| FxError::missing("data", "csv_path")),
    }
}

fn run_validate(config: &AppConfig) -> Result<(), FxError> {
    let json = serde_json::to_string_pretty(config).map_err(|e| FxError::Report {
        reason: e.to_string(),
    })?;
    println!("{json}");
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
