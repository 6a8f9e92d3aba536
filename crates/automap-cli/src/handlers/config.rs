//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::{Config, FileFormat};
use crate::error::{Error, Result};
use crate::output::OutputWriter;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Paths => handle_config_paths(output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        Config::project_config_path()
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to customize settings for your environment.")?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let format = match args.format {
        ConfigFormat::Toml => FileFormat::Toml,
        ConfigFormat::Json => FileFormat::Json,
        ConfigFormat::Yaml => FileFormat::Yaml,
    };
    let content = config.render(format)?;
    output.write(&content)?;
    if !content.ends_with('\n') {
        output.writeln("")?;
    }
    Ok(())
}

/// Handle config paths subcommand
fn handle_config_paths(output: &mut OutputWriter) -> Result<()> {
    output.section("Configuration search order")?;
    for path in Config::default_config_paths() {
        let marker = if path.exists() { "✓" } else { " " };
        output.writeln(&format!("{} {}", marker, path.display()))?;
    }
    Ok(())
}
