//! Automap CLI - Command-line interface for convention-based object mapping
//!
//! This is the main entry point for the Automap CLI application, providing
//! commands for mapping documents between declared shapes and inspecting the
//! mapping plans the engine derives.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Load configuration before logging so the file can configure it
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, cli.use_color()),
    };

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    let _guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    match run(cli, &config, use_color) {
        Ok(()) => process::exit(0),
        Err(e) => exit_with(&e, use_color),
    }
}

fn exit_with(error: &error::Error, use_color: bool) -> ! {
    eprintln!("{}", error::format_error(error, use_color));

    if error.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    process::exit(error.exit_code());
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
fn run(cli: Cli, config: &Config, use_color: bool) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet, cli.verbosity_level());

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Map(args) => handlers::handle_map(args, config, &mut output),
        Commands::Plan(args) => handlers::handle_plan(args, config, &mut output),
        Commands::Config(args) => handlers::handle_config(args, config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let mut logging_config: LoggingConfig = config.logging.clone();
    logging_config.apply_verbosity(cli.verbosity_level());

    // Apply environment overrides
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
