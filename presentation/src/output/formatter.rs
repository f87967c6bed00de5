//! Output formatter trait

use council_domain::{OutputFormat, RunState};

/// Trait for formatting council runs
pub trait OutputFormatter {
    /// Format the complete run
    fn format(&self, state: &RunState) -> String;

    /// Format as JSON
    fn format_json(&self, state: &RunState) -> String;

    /// Format the final answer only (concise output)
    fn format_answer_only(&self, state: &RunState) -> String;

    /// Format according to `format`
    fn render(&self, state: &RunState, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(state),
            OutputFormat::Answer => self.format_answer_only(state),
            OutputFormat::Json => self.format_json(state),
        }
    }
}
