//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestResult, run_backtest};
use crate::domain::config_validation::{
    DEFAULT_DATA_DIR, DEFAULT_EPISODES, DEFAULT_FAST_PERIOD, DEFAULT_POLICY, DEFAULT_SLOW_PERIOD,
    DEFAULT_TIMEFRAME, validate_run_config,
};
use crate::domain::engine::SimulationConfig;
use crate::domain::environment::TradingEnv;
use crate::domain::error::TradesimError;
use crate::domain::evaluation::{EvaluationSummary, evaluate_policy};
use crate::domain::metrics::{DEFAULT_PERIODS_PER_YEAR, Metrics};
use crate::domain::policy::{HoldPolicy, RandomPolicy, SignalPolicy};
use crate::domain::risk::RiskParameters;
use crate::domain::series::PriceSeries;
use crate::domain::signal::{Signal, signals_from_column, sma_crossover};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::policy_port::Policy;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Trade execution simulator and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a signal column, or the SMA crossover, over a price series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Trade log CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
    },
    /// Play a policy through the interactive environment
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        episodes: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// hold, random or signal
        #[arg(long)]
        policy: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show available series and their ranges
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Where a run reads its series from.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub dir: PathBuf,
    pub symbol: String,
    pub timeframe: String,
}

/// Environment settings read from `[environment]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSettings {
    pub observation_width: Option<usize>,
    pub episodes: usize,
    pub seed: Option<u64>,
    pub policy: String,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            timeframe,
        } => run_backtest_command(&config, output, symbol.as_deref(), timeframe.as_deref()),
        Command::Evaluate {
            config,
            episodes,
            seed,
            policy,
        } => run_evaluate_command(&config, episodes, seed, policy),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradesimError> {
    FileConfigAdapter::from_file(path).map_err(|e| TradesimError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_simulation_config(
    adapter: &dyn ConfigPort,
) -> Result<SimulationConfig, TradesimError> {
    let defaults = SimulationConfig::default();
    Ok(SimulationConfig {
        initial_balance: adapter.double_or(
            "simulation",
            "initial_balance",
            defaults.initial_balance,
        )?,
        leverage: adapter.double_or("simulation", "leverage", defaults.leverage)?,
        risk: RiskParameters {
            risk_fraction: adapter.double_or(
                "simulation",
                "risk_fraction",
                defaults.risk.risk_fraction,
            )?,
            stop_loss_fraction: adapter.double_or(
                "simulation",
                "stop_loss_fraction",
                defaults.risk.stop_loss_fraction,
            )?,
            reward_risk_ratio: adapter.double_or(
                "simulation",
                "reward_risk_ratio",
                defaults.risk.reward_risk_ratio,
            )?,
        },
    })
}

pub fn resolve_data_source(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
    timeframe_override: Option<&str>,
) -> Result<DataSource, TradesimError> {
    let symbol = match symbol_override {
        Some(s) => s.to_string(),
        None => adapter
            .get_string("data", "symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TradesimError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            })?,
    };
    let timeframe = timeframe_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("data", "timeframe"))
        .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
    let dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

    Ok(DataSource {
        dir: PathBuf::from(dir),
        symbol,
        timeframe,
    })
}

pub fn strategy_periods(adapter: &dyn ConfigPort) -> Result<(usize, usize), TradesimError> {
    let fast = adapter.int_or("strategy", "fast_period", DEFAULT_FAST_PERIOD)?;
    let slow = adapter.int_or("strategy", "slow_period", DEFAULT_SLOW_PERIOD)?;
    Ok((fast.max(1) as usize, slow.max(1) as usize))
}

/// Signals from `[strategy] signal_column` when set, otherwise the SMA
/// crossover over `fast_period`/`slow_period`.
pub fn build_signals(
    adapter: &dyn ConfigPort,
    series: &PriceSeries,
) -> Result<Vec<Signal>, TradesimError> {
    match adapter
        .get_string("strategy", "signal_column")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
    {
        Some(column) => {
            info!(column = %column, "using precomputed signal column");
            signals_from_column(series, &column)
        }
        None => {
            let (fast, slow) = strategy_periods(adapter)?;
            info!(fast, slow, "using SMA crossover signal");
            Ok(sma_crossover(series, fast, slow))
        }
    }
}

pub fn build_environment_settings(
    adapter: &dyn ConfigPort,
) -> Result<EnvironmentSettings, TradesimError> {
    let observation_width = match adapter.get_int("environment", "observation_width")? {
        Some(width) => Some(usize::try_from(width).map_err(|_| TradesimError::ConfigInvalid {
            section: "environment".into(),
            key: "observation_width".into(),
            reason: "observation_width must be a positive integer".into(),
        })?),
        None => None,
    };
    Ok(EnvironmentSettings {
        observation_width,
        episodes: adapter
            .int_or("environment", "episodes", DEFAULT_EPISODES)?
            .max(1) as usize,
        seed: adapter.get_uint("environment", "seed")?,
        policy: adapter
            .get_string("environment", "policy")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| DEFAULT_POLICY.to_string()),
    })
}

fn run_validate(config_path: &Path) -> Result<(), TradesimError> {
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;
    eprintln!("{}: configuration is valid", config_path.display());
    Ok(())
}

fn run_info(config_path: &Path) -> Result<(), TradesimError> {
    let adapter = load_config(config_path)?;
    let dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    let data_port = CsvAdapter::new(PathBuf::from(&dir));

    let available = data_port.list_series()?;
    if available.is_empty() {
        eprintln!("No series found in {}", dir);
        return Ok(());
    }

    for (symbol, timeframe) in available {
        match data_port.get_data_range(&symbol, &timeframe) {
            Ok(Some((first, last, count))) => {
                eprintln!("{symbol} {timeframe}: {count} bars, {first} to {last}");
            }
            Ok(None) => eprintln!("{symbol} {timeframe}: no data"),
            Err(e) => eprintln!("{symbol} {timeframe}: {e}"),
        }
    }
    Ok(())
}

fn run_backtest_command(
    config_path: &Path,
    output: Option<PathBuf>,
    symbol: Option<&str>,
    timeframe: Option<&str>,
) -> Result<(), TradesimError> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;

    let source = resolve_data_source(&adapter, symbol, timeframe)?;
    let data_port = CsvAdapter::new(source.dir.clone());
    let output = output.or_else(|| adapter.get_string("report", "trade_log").map(PathBuf::from));

    run_backtest_pipeline(
        &data_port,
        &adapter,
        &source,
        output.as_deref(),
        &CsvReportAdapter,
    )
    .map(|_| ())
}

/// Load, signal, backtest, summarize, and optionally write the trade log.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    adapter: &dyn ConfigPort,
    source: &DataSource,
    output_path: Option<&Path>,
    report: &dyn ReportPort,
) -> Result<(BacktestResult, Metrics), TradesimError> {
    let series = data_port.fetch_series(&source.symbol, &source.timeframe)?;
    let config = build_simulation_config(adapter)?;
    let periods_per_year =
        adapter.double_or("report", "periods_per_year", DEFAULT_PERIODS_PER_YEAR)?;

    info!(
        symbol = %source.symbol,
        timeframe = %source.timeframe,
        bars = series.len(),
        "running backtest"
    );

    let signals = build_signals(adapter, &series)?;
    let result = run_backtest(&series, &signals, config)?;
    let metrics = Metrics::compute(&result.recorder, config.initial_balance, periods_per_year);

    print_backtest_summary(&result, &metrics);

    if let Some(path) = output_path {
        report.write(&result, &metrics, path)?;
        eprintln!("\nTrade log written to: {}", path.display());
    }

    Ok((result, metrics))
}

fn run_evaluate_command(
    config_path: &Path,
    episodes: Option<usize>,
    seed: Option<u64>,
    policy: Option<String>,
) -> Result<(), TradesimError> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;

    let source = resolve_data_source(&adapter, None, None)?;
    let data_port = CsvAdapter::new(source.dir.clone());

    let mut settings = build_environment_settings(&adapter)?;
    if let Some(n) = episodes {
        settings.episodes = n;
    }
    if seed.is_some() {
        settings.seed = seed;
    }
    if let Some(p) = policy {
        settings.policy = p.to_lowercase();
    }

    run_evaluation_pipeline(&data_port, &adapter, &source, &settings).map(|_| ())
}

/// Load the series, build the environment and policy, and play the episodes.
pub fn run_evaluation_pipeline(
    data_port: &dyn DataPort,
    adapter: &dyn ConfigPort,
    source: &DataSource,
    settings: &EnvironmentSettings,
) -> Result<EvaluationSummary, TradesimError> {
    let series = data_port.fetch_series(&source.symbol, &source.timeframe)?;
    let config = build_simulation_config(adapter)?;
    let mut env = TradingEnv::new(&series, config, settings.observation_width)?;

    let mut policy: Box<dyn Policy> = match settings.policy.as_str() {
        "hold" => Box::new(HoldPolicy),
        "random" => Box::new(RandomPolicy::new(settings.seed.unwrap_or_default())),
        "signal" => Box::new(SignalPolicy::new(build_signals(adapter, &series)?)),
        other => {
            return Err(TradesimError::ConfigInvalid {
                section: "environment".into(),
                key: "policy".into(),
                reason: format!("unknown policy '{other}'"),
            });
        }
    };

    info!(
        symbol = %source.symbol,
        policy = policy.name(),
        episodes = settings.episodes,
        width = env.observation_width(),
        "evaluating policy"
    );

    let summary = evaluate_policy(&mut env, policy.as_mut(), settings.episodes, settings.seed)?;
    info!("{}", env.status());
    print_evaluation_summary(&summary);
    Ok(summary)
}

fn print_backtest_summary(result: &BacktestResult, metrics: &Metrics) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Initial Balance:  {:.2}", result.initial_balance);
    eprintln!("Final Balance:    {:.2}", result.final_balance);
    if result.open_position.is_long() {
        eprintln!("Final Equity:     {:.2} (position still open)", result.final_equity);
    }
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);

    if !result.trades().is_empty() {
        eprintln!("\n=== Trade Log ===");
        for trade in result.trades() {
            eprintln!(
                "  {:>6}  {}  {:<4}  {:>12.4}  balance {:.2}",
                trade.step_index, trade.timestamp, trade.side, trade.price, trade.balance_after
            );
        }
    }
}

fn print_evaluation_summary(summary: &EvaluationSummary) {
    eprintln!("\n=== Evaluation ({}) ===", summary.policy);
    eprintln!("Episodes:         {}", summary.episodes.len());
    eprintln!("Mean Reward:      {:.2}", summary.mean_reward);
    eprintln!("Std Reward:       {:.2}", summary.std_reward);
    eprintln!("Sharpe Ratio:     {:.2}", summary.sharpe_ratio);
}
