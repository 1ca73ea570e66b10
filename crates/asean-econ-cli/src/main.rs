mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analysis::DataArgs;
use commands::indicators::IndicatorsArgs;
use commands::simulate::SimulateArgs;

/// Econometric analysis of FDI and GDP growth across ASEAN members
#[derive(Parser)]
#[command(
    name = "aecon",
    version,
    about = "Econometric analysis of FDI and GDP growth across ASEAN members",
    long_about = "A CLI for the ASEAN FDI/GDP panel: loads World Bank extracts, winsorizes \
                  per country and runs correlation, Granger causality, VAR impulse \
                  responses, fixed-effects panel regression and policy projection."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the dashboard report
    Analyze(DataArgs),
    /// Per-country Pearson correlation with strength labels
    Correlation(DataArgs),
    /// Granger causality p-values per country and lag
    Granger(DataArgs),
    /// VAR lag selection and growth impulse responses
    Var(DataArgs),
    /// Panel regression of growth on investment share
    Panel(DataArgs),
    /// Headline KPIs, correlation overview and trends
    Summary(DataArgs),
    /// Project the growth effect of an investment-share shock
    Simulate(SimulateArgs),
    /// Pivot indicators from a combined WDI table
    Indicators(IndicatorsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Correlation(args) => commands::analysis::run_correlation(args),
        Commands::Granger(args) => commands::analysis::run_granger(args),
        Commands::Var(args) => commands::analysis::run_var(args),
        Commands::Panel(args) => commands::analysis::run_panel(args),
        Commands::Summary(args) => commands::analysis::run_summary(args),
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Indicators(args) => commands::indicators::run_indicators(args),
        Commands::Version => {
            println!("aecon {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
