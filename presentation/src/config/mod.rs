//! Presentation-level configuration
//!
//! How results and progress are shown, resolved from CLI flags and the
//! `[output]` config section.

use council_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Hide progress indicators
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Full,
            color: true,
            quiet: false,
        }
    }
}

impl OutputConfig {
    /// A format given on the command line wins over the configured one.
    pub fn resolve(
        cli_format: Option<OutputFormat>,
        configured_format: Option<OutputFormat>,
        color: bool,
        quiet: bool,
    ) -> Self {
        Self {
            format: cli_format.or(configured_format).unwrap_or_default(),
            color,
            quiet,
        }
    }

    /// Progress is hidden when quiet or when stdout carries JSON.
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.format != OutputFormat::Json
    }

    /// Apply the color setting process-wide.
    pub fn apply_color(&self) {
        if !self.color {
            colored::control::set_override(false);
        }
    }
}
