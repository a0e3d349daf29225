use chrono::NaiveDateTime;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "wakeup", version, about = "Shake-to-dismiss alarm with snooze penalties")]
struct Cli {
    /// Act as if the local time were this (YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm control
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Snooze penalty settings and previews
    Penalty {
        #[command(subcommand)]
        action: commands::penalty::PenaltyAction,
    },
    /// Wake-up statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Shake detection tools
    Shake {
        #[command(subcommand)]
        action: commands::shake::ShakeAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Stored data management
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM[:SS]: {e}"))
}

/// Logs go to stderr so stdout stays machine-readable JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("WAKEUP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context { now: cli.now };

    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action, &ctx).await,
        Commands::Penalty { action } => commands::penalty::run(action, &ctx).await,
        Commands::Stats { action } => commands::stats::run(action, &ctx).await,
        Commands::Shake { action } => commands::shake::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Data { action } => commands::data::run(action, &ctx).await,
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
