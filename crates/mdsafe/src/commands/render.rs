//! `mdsafe render` command implementation.

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::Args;
use mdsafe_config::{CliSettings, Config};
use mdsafe_renderer::{Pipeline, RenderOptions};

use crate::error::CliError;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: stdin).
    file: Option<PathBuf>,

    /// Write the HTML and table of contents as JSON.
    #[arg(long)]
    json: bool,

    /// Prefix for generated heading ids (overrides config).
    #[arg(long)]
    id_prefix: Option<String>,

    /// Path to configuration file (default: auto-discover mdsafe.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input can't be read, the configuration is
    /// invalid, or rendering fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let markdown = match &self.file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };

        let cli_settings = CliSettings {
            id_prefix: self.id_prefix,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let rendered = render_to_string(&markdown, &config.render.id_prefix, self.json)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Render markdown to the command's output text.
fn render_to_string(markdown: &str, id_prefix: &str, json: bool) -> Result<String, CliError> {
    let pipeline = Pipeline::new(RenderOptions {
        id_prefix: id_prefix.to_owned(),
    });
    let output = pipeline.render(markdown)?;
    tracing::debug!(headings = output.toc_items.len(), "Rendered markdown");

    if json {
        Ok(serde_json::to_string_pretty(&output)?)
    } else {
        Ok(output.html_content)
    }
}
