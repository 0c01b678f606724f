//! Everything a command writes to stdout goes through [`Printer`].
//!
//! Results are rendered in the `--output` format. Progress notes go to
//! stderr so that piped JSON/YAML stays clean.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// How a `watch` line should stand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Discovered,
    Refreshed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Printer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Printer {
    pub fn new(global: &GlobalOpts) -> Self {
        Self {
            format: global.output.clone(),
            color: color_enabled(&global.color),
            quiet: global.quiet,
        }
    }

    /// Render `items` in the selected format. `row` feeds the table,
    /// `plain` gives the one-line-per-item form; JSON and YAML serialize
    /// the items directly.
    pub fn list<T, R>(
        &self,
        items: &[T],
        row: impl Fn(&T) -> R,
        plain: impl Fn(&T) -> String,
    ) -> Result<(), CliError>
    where
        T: Serialize,
        R: Tabled,
    {
        let text = match self.format {
            OutputFormat::Table => {
                let mut table = Table::new(items.iter().map(row));
                table.with(Style::rounded());
                table.to_string()
            }
            OutputFormat::Plain => items.iter().map(plain).collect::<Vec<_>>().join("\n"),
            OutputFormat::Json => serde_json::to_string_pretty(items)?,
            OutputFormat::JsonCompact => serde_json::to_string(items)?,
            OutputFormat::Yaml => serde_yaml::to_string(items)
                .map_err(|e| CliError::Internal(format!("YAML output: {e}")))?,
        };
        self.line(&text);
        Ok(())
    }

    /// One raw line on stdout. Suppressed by `--quiet`.
    pub fn line(&self, text: &str) {
        if self.quiet || text.is_empty() {
            return;
        }
        // Broken pipe (`| head`) is ignored.
        let _ = writeln!(io::stdout().lock(), "{text}");
    }

    /// A `watch` event line, colored by tone when color is on.
    pub fn event(&self, tone: Tone, text: &str) {
        if !self.color {
            self.line(text);
            return;
        }
        let painted = match tone {
            Tone::Discovered => text.cyan().to_string(),
            Tone::Refreshed => text.green().to_string(),
            Tone::Failed => text.red().to_string(),
        };
        self.line(&painted);
    }

    /// Progress or confirmation on stderr. Suppressed by `--quiet`.
    pub fn note(&self, text: &str) {
        if !self.quiet {
            eprintln!("{text}");
        }
    }
}

fn color_enabled(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}
