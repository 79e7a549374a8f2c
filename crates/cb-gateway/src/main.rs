//! cb-gateway: calendar bot gateway binary
//!
//! Usage:
//!   cb-gateway                  - Start server mode (messenger webhook + HTTP API)
//!   cb-gateway --cli            - Start interactive CLI mode
//!   cb-gateway --execute "..."  - Run one chat command and print the reply
//!   cb-gateway --help           - Show help

mod cli;
mod store;

use cb_core::{CommandInterpreter, Config};
use cb_webhook::AppState;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Server mode (webhook + HTTP API)
    Server,
    /// Interactive CLI mode
    Cli,
    /// One-shot command
    Execute(String),
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1));

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("cb-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting cb-gateway...");
    tracing::info!(
        "Calendar: {} ({:?}), UTC offset {}",
        config.calendar.calendar_id,
        config.calendar.provider,
        config.calendar.utc_offset
    );

    let offset = config.calendar.offset()?;
    let calendar = store::build_store(&config)?;
    let interpreter = CommandInterpreter::new(calendar, config.locale_table(), config.interpreter_settings()?);

    match mode {
        RunMode::Cli => {
            tracing::info!("Running in CLI mode");
            cli::run_cli(interpreter, offset).await
        }
        RunMode::Execute(command) => cli::run_execute(interpreter, offset, &command).await,
        RunMode::Server => run_server(config, interpreter, offset).await,
        RunMode::Help | RunMode::Version => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> RunMode {
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cli" | "-c" => return RunMode::Cli,
            "--execute" | "-e" => {
                let command = args.collect::<Vec<_>>().join(" ");
                if command.trim().is_empty() {
                    return RunMode::Help;
                }
                return RunMode::Execute(command);
            }
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("cb-gateway - messenger bot to calendar gateway");
    println!();
    println!("Usage:");
    println!("  cb-gateway                   Start server mode (webhook + HTTP API)");
    println!("  cb-gateway --cli             Start interactive CLI mode");
    println!("  cb-gateway --execute <cmd>   Run one chat command and print the reply");
    println!("  cb-gateway --help            Show this help message");
    println!("  cb-gateway --version         Show version");
    println!();
    println!("Configuration is read from {} when present.", cb_core::config::CONFIG_FILE);
    println!();
    println!("Environment Variables:");
    println!("  CALENDAR_PROVIDER     caldav or memory (default: memory)");
    println!("  CALDAV_URL            CalDAV calendar home URL");
    println!("  CALDAV_USERNAME       CalDAV user name");
    println!("  CALDAV_PASSWORD       CalDAV password or app password");
    println!("  CALDAV_TIMEOUT_SECS   Request timeout (default: 15)");
    println!("  CALENDAR_ID           Calendar collection (default: primary)");
    println!("  CALENDAR_UTC_OFFSET   Fixed offset for dates and times (default: +09:00)");
    println!("  WORK_START_HOUR       Start of working hours (default: 9)");
    println!("  WORK_END_HOUR         End of working hours (default: 19)");
    println!("  DEFAULT_EVENT_MINUTES Length of added events (default: 60)");
    println!("  PREVIEW_LENGTH        Description preview length (default: 50)");
    println!("  API_KEY               Bearer key for /api/* (optional)");
    println!("  API_PORT              HTTP port (default: 9000)");
    println!("  API_ALLOWED_ORIGINS   Comma-separated CORS origins");
}

/// Run server mode
async fn run_server(config: Config, interpreter: CommandInterpreter, offset: chrono::FixedOffset) -> anyhow::Result<()> {
    let port = config.api.port;
    let state = AppState::new(config, interpreter, offset);

    tracing::info!("cb-gateway initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        tracing::info!("Shutting down...");
    };

    cb_webhook::start_server(state, port, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
