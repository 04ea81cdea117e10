use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxwallet::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxwallet::AppCommand {
    fn from(cmd: Commands) -> fxwallet::AppCommand {
        match cmd {
            Commands::Deposit {
                user,
                currency,
                amount,
            } => fxwallet::AppCommand::Deposit {
                user,
                currency,
                amount,
            },
            Commands::Buy {
                user,
                currency,
                amount,
                force,
            } => fxwallet::AppCommand::Buy {
                user,
                currency,
                amount,
                force,
            },
            Commands::Sell {
                user,
                currency,
                amount,
                force,
            } => fxwallet::AppCommand::Sell {
                user,
                currency,
                amount,
                force,
            },
            Commands::ShowPortfolio { user, base } => {
                fxwallet::AppCommand::ShowPortfolio { user, base }
            }
            Commands::UpdateRates { source } => fxwallet::AppCommand::UpdateRates { source },
            Commands::ShowRates {
                currency,
                top,
                base,
            } => fxwallet::AppCommand::ShowRates {
                currency,
                top,
                base,
            },
            Commands::GetRate { from, to } => fxwallet::AppCommand::GetRate { from, to },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Credit external funds to a user's wallet
    Deposit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        amount: f64,
    },
    /// Buy a currency with the settlement balance
    Buy {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
        /// Amount of the settlement currency to spend
        #[arg(long)]
        amount: f64,
        /// Proceed even if the cached rates are stale
        #[arg(long)]
        force: bool,
    },
    /// Sell a currency back into the settlement balance
    Sell {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
        /// Amount of the traded currency to sell
        #[arg(long)]
        amount: f64,
        /// Proceed even if the cached rates are stale
        #[arg(long)]
        force: bool,
    },
    /// Display wallet balances valued in a base currency
    ShowPortfolio {
        #[arg(long)]
        user: String,
        /// Valuation currency (defaults to the configured base)
        #[arg(long)]
        base: Option<String>,
    },
    /// Fetch fresh rates and replace the cached snapshot
    UpdateRates {
        /// Rate source: coingecko or exchangerate
        #[arg(long)]
        source: Option<String>,
    },
    /// Display the cached exchange rates
    ShowRates {
        /// Show only this currency
        #[arg(long)]
        currency: Option<String>,
        /// Show only the N most valuable currencies
        #[arg(long)]
        top: Option<usize>,
        /// Express rates in this currency (defaults to the snapshot base)
        #[arg(long)]
        base: Option<String>,
    },
    /// Show the conversion rate between two currencies
    GetRate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxwallet::cli::setup::setup(),
        Some(cmd) => fxwallet::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
