use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

use zincite::application::errors::BotError;
use zincite::domain::traits::Bot;
use zincite::infrastructure::adapters::{ConsoleAdapter, ConsoleManager, ControlSignal, TelegramAdapter};
use zincite::infrastructure::config::ZinciteConfig;
use zincite::Zincite;

#[derive(Parser)]
#[command(name = "zincite")]
#[command(about = "A module-hosting bot runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config, cli.token),
        Commands::Version => {
            println!("zincite v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(config_path: &str) -> ZinciteConfig {
    if !Path::new(config_path).exists() {
        return ZinciteConfig::load_env();
    }
    match ZinciteConfig::load(config_path) {
        Ok(config) => config.with_env_overrides(|key| std::env::var(key).ok()),
        Err(e) => {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            ZinciteConfig::load_env()
        }
    }
}

fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let mut config = load_config(config_path);
    if token_override.is_some() {
        config.token = token_override;
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;

    // Select adapter
    let (bot, console_input) = match &config.token {
        Some(token) => {
            let bot: Arc<dyn Bot> = Arc::new(TelegramAdapter::new(token.clone(), config.poll_timeout_secs));
            (bot, None)
        }
        None => {
            // Run console bot (dev mode)
            let (lines_tx, lines_rx) = mpsc::unbounded_channel::<String>();
            let bot: Arc<dyn Bot> = Arc::new(ConsoleAdapter::new(lines_rx));
            (bot, Some(lines_tx))
        }
    };

    let read_console = config.enable_console_reader || console_input.is_some();
    let zincite = Zincite::new(config, bot);

    if read_console {
        let mut console = ConsoleManager::new(zincite.control());
        if let Some(lines) = console_input {
            console = console.with_forward(lines);
        }
        console.spawn_stdin();
    }

    runtime.block_on(async {
        let control = zincite.control();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted");
                let _ = control.send(ControlSignal::Stop);
            }
        });

        zincite.start().await
    })
}

fn init_config() -> Result<(), BotError> {
    let yaml = ZinciteConfig::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
