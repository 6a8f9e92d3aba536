//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Automap CLI - Convention-based mapping between declared shapes
///
/// Maps JSON and YAML documents between the classes of a shape document and
/// prints the mapping plans the engine derives for a pair of shapes.
#[derive(Parser, Debug)]
#[command(
    name = "automap",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "AUTOMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map a JSON or YAML document to a target shape
    Map(MapArgs),

    /// Show the mapping plan for a pair of shapes
    Plan(PlanArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the map command
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Path to the input document (JSON, YAML or TOML)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Shape document declaring classes and enums (defaults to paths.shapes)
    #[arg(short, long, value_name = "FILE")]
    pub shapes: Option<PathBuf>,

    /// Target shape: a class name, `map` or `dynamic`
    #[arg(short, long)]
    pub target: String,

    /// Lift the input into an instance of this class before mapping
    #[arg(long, value_name = "SHAPE")]
    pub source_shape: Option<String>,

    /// Restrict grouped members to these groups
    #[arg(short, long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Nesting budget for object members
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Do not write null results
    #[arg(long)]
    pub skip_null: bool,

    /// Override the date-time format for this call
    #[arg(long, value_name = "FORMAT")]
    pub datetime_format: Option<String>,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Shape document declaring classes and enums (defaults to paths.shapes)
    #[arg(short, long, value_name = "FILE")]
    pub shapes: Option<PathBuf>,

    /// Source shape: a class name, `map` or `dynamic`
    #[arg(long)]
    pub source: String,

    /// Target shape: a class name, `map` or `dynamic`
    #[arg(short, long)]
    pub target: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// List the configuration file locations that are searched
    Paths,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Initialize user config (~/.config/automap/config.toml) instead of .automap.toml
    #[arg(long)]
    pub user: bool,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_map_arguments() {
        let cli = Cli::parse_from([
            "automap",
            "map",
            "input.json",
            "--shapes",
            "shapes.yaml",
            "--target",
            "PersonDto",
            "-g",
            "admin",
            "--group",
            "public",
            "--max-depth",
            "2",
            "--skip-null",
        ]);
        match cli.command {
            Commands::Map(args) => {
                assert_eq!(args.input, PathBuf::from("input.json"));
                assert_eq!(args.target, "PersonDto");
                assert_eq!(args.groups, vec!["admin", "public"]);
                assert_eq!(args.max_depth, Some(2));
                assert!(args.skip_null);
                assert!(args.source_shape.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli {
            verbose: 2,
            quiet: false,
            config: None,
            output: OutputFormat::Human,
            no_color: false,
            command: Commands::Plan(PlanArgs {
                shapes: None,
                source: "Person".to_string(),
                target: "map".to_string(),
            }),
        };
        assert_eq!(cli.verbosity_level(), 2);

        let quiet_cli = Cli {
            verbose: 2,
            quiet: true,
            ..cli
        };
        assert_eq!(quiet_cli.verbosity_level(), 0);
    }
}
