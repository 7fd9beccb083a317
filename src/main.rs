use std::fs::File;
use std::path::PathBuf;

use chatsim::cli::{self, RunOptions};
use chatsim::core::config::{self, CliOverrides};
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "chatsim", about = "Scripted chat assistant for the terminal")]
struct Args {
    /// Config file (default: ~/.chatsim/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lower bound of the simulated response delay
    #[arg(long)]
    min_delay_ms: Option<u64>,

    /// Upper bound of the simulated response delay
    #[arg(long)]
    max_delay_ms: Option<u64>,

    /// Mute the reply chime for this session
    #[arg(long)]
    no_sound: bool,

    /// Print formatted markup instead of plain message text
    #[arg(long)]
    markup: bool,

    /// Log level for chatsim.log (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chatsim.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    let level = args.log_level.parse().unwrap_or(LevelFilter::Debug);
    if let Ok(log_file) = File::create("chatsim.log") {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!("Chatsim starting up");

    let loaded = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    let file_config = loaded.unwrap_or_else(|e| {
        log::warn!("{}; falling back to defaults", e);
        eprintln!("warning: {e}; using defaults");
        config::ChatsimConfig::default()
    });

    let overrides = CliOverrides {
        min_delay_ms: args.min_delay_ms,
        max_delay_ms: args.max_delay_ms,
    };
    let resolved = config::resolve(&file_config, &overrides);
    log::debug!("Resolved config: {:?}", resolved);

    cli::run(
        resolved,
        RunOptions {
            no_sound: args.no_sound,
            show_markup: args.markup,
        },
    )
    .await
}
