//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with a dedicated
//! rendering for mapping plans.

use crate::cli::OutputFormat;
use crate::error::Result;
use automap_core::{MappingPlan, MemberMapping};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a mapping plan
    fn format_plan(&self, plan: &MappingPlan) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Pretty JSON reads well enough for people too
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_plan(&self, plan: &MappingPlan) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_plan_human(plan)),
            _ => self.format(plan),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self::with_writer(format, use_color, quiet, verbose, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            verbose,
            writer,
        }
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write debug information if verbose mode is enabled
    pub fn debug(&mut self, message: &str) -> Result<()> {
        if self.verbose == 0 || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "DEBUG:".dimmed(), message.dimmed()))
        } else {
            self.writeln(&format!("DEBUG: {}", message))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");
        self.write_block(&formatted)
    }

    /// Write a mapping plan
    pub fn plan(&mut self, plan: &MappingPlan) -> Result<()> {
        let formatted = self.format.format_plan(plan)?;
        self.write_block(&formatted)
    }

    fn write_block(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }
}

fn member_row(member: &MemberMapping) -> Vec<String> {
    let mut notes = Vec::new();
    if member.is_ignored() {
        notes.push("ignored".to_string());
    }
    let groups: Vec<&String> = member
        .source_groups
        .iter()
        .chain(member.target_groups.iter())
        .collect();
    if !groups.is_empty() {
        notes.push(format!(
            "groups: {}",
            groups.iter().map(|g| g.as_str()).collect::<Vec<_>>().join(", ")
        ));
    }
    if let Some(depth) = member.max_depth {
        notes.push(format!("max depth: {}", depth));
    }

    vec![
        member.target_member.clone(),
        member.read.to_string(),
        member.write.to_string(),
        member.transformer.to_string(),
        notes.join("; "),
    ]
}

/// Lay out a table as header, separator and rows, padded to column widths
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = *width),
                None => cell.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" │ ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Render a plan as plain text
fn format_plan_human(plan: &MappingPlan) -> String {
    let mut output = String::new();
    output.push_str(&format!("═══ {} -> {} ═══\n", plan.source, plan.target));
    output.push_str(&format!("Mapper: {}\n", plan.mapper_name));
    output.push_str(&format!("Extractor: {}\n", plan.extractor));

    if let Some(discriminator) = &plan.discriminator {
        output.push_str(&format!("Discriminator: {}\n", discriminator.property));
    }
    output.push('\n');

    let rows: Vec<Vec<String>> = plan.members.iter().map(member_row).collect();
    for line in render_table(&["Member", "Read", "Write", "Transformer", "Notes"], &rows) {
        output.push_str(&line);
        output.push('\n');
    }

    if !plan.dependencies.is_empty() {
        output.push_str("\nDependencies:\n");
        for dependency in &plan.dependencies {
            output.push_str(&format!("  • {} -> {}\n", dependency.source, dependency.target));
        }
    }
    output
}
