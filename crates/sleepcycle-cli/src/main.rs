use clap::{Parser, Subcommand};
use sleepcycle_core::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod console;

#[derive(Parser)]
#[command(name = "sleepcycle-cli", version, about = "Sleep cycle calculator")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cycle-aligned bed and wake times
    Cycle {
        #[command(subcommand)]
        action: commands::cycle::CycleAction,
    },
    /// Sleep history and reports
    Sleeps {
        #[command(subcommand)]
        action: commands::sleeps::SleepsAction,
    },
    /// User settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(&config);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "config unreadable, using defaults");
    }

    let result = match cli.command {
        Commands::Cycle { action } => commands::cycle::run(action, &config).await,
        Commands::Sleeps { action } => commands::sleeps::run(action, &config).await,
        Commands::Settings { action } => commands::settings::run(action, &config).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
