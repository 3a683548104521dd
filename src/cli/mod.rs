//! Command-line interface definitions.

pub mod config;
pub mod output;
pub mod run;
pub mod solve;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::application::payment::Mechanism;
use crate::error::Result;
use crate::infrastructure::config::{Config, LogFormat, LoggingConfig};

/// Configuration file read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "corebid.toml";

/// Corebid - winner determination and core-selecting payments for
/// combinatorial auctions.
#[derive(Parser, Debug)]
#[command(name = "corebid")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare payment rules on random LLG auctions
    Run(RunArgs),

    /// Price a single auction read from a JSON file
    Solve(SolveArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `corebid config`
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show(ConfigArgs),
}

/// Configuration file selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to the TOML configuration file [default: corebid.toml if present]
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load the selected file. Without `--config`, a missing default file
    /// means built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or is
    /// invalid.
    pub fn load(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None if Path::new(DEFAULT_CONFIG).exists() => Config::load(DEFAULT_CONFIG),
            None => Ok(Config::default()),
        }
    }
}

/// Logging overrides shared by the commands that solve.
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Log filter directive, overriding the configuration
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl LogArgs {
    /// Apply the flags and the global verbosity to `logging`. An explicit
    /// `--log-level` wins over `-v`.
    pub fn apply(&self, logging: &mut LoggingConfig, verbose: u8) {
        if let Some(level) = &self.log_level {
            logging.level.clone_from(level);
        } else if verbose > 0 {
            logging.level = match verbose {
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
            .to_string();
        }
        if self.json_logs {
            logging.format = LogFormat::Json;
        }
    }
}

/// Arguments for `corebid run`
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub log: LogArgs,

    /// Number of random instances
    #[arg(long)]
    pub trials: Option<u64>,

    /// Base random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads [default: number of CPUs]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Comma-separated mechanisms, e.g. `vcg,core,ecr-core`
    #[arg(long, value_delimiter = ',')]
    pub mechanisms: Option<Vec<Mechanism>>,
}

/// Arguments for `corebid solve`
#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Auction description (JSON)
    pub auction: PathBuf,

    /// Mechanism to run, e.g. `core`, `vcg`, `ecr-core`
    #[arg(short, long, default_value = "core")]
    pub mechanism: Mechanism,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns the error of the executed command.
pub fn execute(cli: &Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    match &cli.command {
        Commands::Run(args) => run::execute(args),
        Commands::Solve(args) => solve::execute(args),
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::payment::PaymentRule;
    use crate::domain::AvailabilityMode;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["corebid", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run(_)));
        assert!(!cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["corebid", "run", "--json", "-q", "-vv"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_run_args_defaults() {
        let cli = Cli::try_parse_from(["corebid", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.config.config.is_none());
        assert!(args.trials.is_none());
        assert!(args.mechanisms.is_none());
        assert!(!args.log.json_logs);
    }

    #[test]
    fn test_run_args_overrides() {
        let cli = Cli::try_parse_from([
            "corebid",
            "run",
            "--config",
            "custom.toml",
            "--trials",
            "50",
            "--seed",
            "7",
            "--workers",
            "2",
            "--mechanisms",
            "vcg,ecr-core",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(args.trials, Some(50));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.workers, Some(2));
        let mechanisms = args.mechanisms.unwrap();
        assert_eq!(mechanisms.len(), 2);
        assert_eq!(mechanisms[1].rule, PaymentRule::Core);
        assert_eq!(mechanisms[1].availability, AvailabilityMode::Mixed);
    }

    #[test]
    fn test_run_rejects_unknown_mechanism() {
        let result = Cli::try_parse_from(["corebid", "run", "--mechanisms", "vcg,first-price"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_solve_command() {
        let cli = Cli::try_parse_from(["corebid", "solve", "auction.json"]).unwrap();
        let Commands::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.auction, PathBuf::from("auction.json"));
        assert_eq!(args.mechanism.to_string(), "core");
    }

    #[test]
    fn test_parse_solve_mechanism() {
        let cli =
            Cli::try_parse_from(["corebid", "solve", "auction.json", "-m", "ec-vcg"]).unwrap();
        let Commands::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.mechanism.rule, PaymentRule::Vcg);
        assert_eq!(args.mechanism.availability, AvailabilityMode::Realized);
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["corebid", "config", "show", "-c", "x.toml"]).unwrap();
        let Commands::Config(ConfigCommand::Show(args)) = cli.command else {
            panic!("expected config show");
        };
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_log_level_beats_verbosity() {
        let mut logging = LoggingConfig::default();
        let args = LogArgs {
            log_level: Some("corebid=trace".into()),
            json_logs: true,
        };
        args.apply(&mut logging, 2);
        assert_eq!(logging.level, "corebid=trace");
        assert_eq!(logging.format, LogFormat::Json);
    }

    #[test]
    fn test_verbosity_raises_level() {
        let mut logging = LoggingConfig::default();
        LogArgs::default().apply(&mut logging, 1);
        assert_eq!(logging.level, "info");
        LogArgs::default().apply(&mut logging, 2);
        assert_eq!(logging.level, "debug");
    }

    #[test]
    fn test_verbosity_zero_keeps_configured_level() {
        let mut logging = LoggingConfig::default();
        LogArgs::default().apply(&mut logging, 0);
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Pretty);
    }
}
