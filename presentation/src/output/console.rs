//! Console output formatter for council runs

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use council_application::{ConversationSummary, ProviderStatus, StoredConversation};
use council_domain::{HIGH_CONFIDENCE_THRESHOLD, RunState, RunStatus, ScoredCluster};

/// Formats council runs for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete run
    pub fn format(state: &RunState) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("Council Consensus"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Query:".cyan().bold(),
            state.raw_input
        ));
        if let Some(ctx) = &state.locked_context {
            output.push_str(&format!(
                "{} {} / {} {}\n",
                "Intent:".cyan().bold(),
                ctx.normalized_query.intent,
                ctx.normalized_query.domain,
                format!("[constraints {}]", ctx.constraint_hash).dimmed()
            ));
        }

        // Final answer
        if let Some(consensus) = &state.consensus {
            output.push_str(&Self::section_header("Final Answer"));
            output.push_str(&format!(
                "\n{}\n\n{}\n",
                Self::confidence_badge(consensus.confidence),
                consensus.final_answer
            ));

            if !consensus.key_recommendations.is_empty() {
                output.push_str(&format!("\n{}\n", "Key Recommendations:".green().bold()));
                for item in &consensus.key_recommendations {
                    output.push_str(&format!("  * {}\n", item));
                }
            }

            if !consensus.uncertain_areas.is_empty() {
                output.push_str(&format!("\n{}\n", "Uncertain Areas:".yellow().bold()));
                for item in &consensus.uncertain_areas {
                    output.push_str(&format!("  * {}\n", item));
                }
            }
        }

        // Agreement map
        if let Some(scored) = state.scored_clusters.as_deref()
            && !scored.is_empty()
        {
            output.push_str(&Self::section_header("Agreement Map"));
            for cluster in scored {
                output.push_str(&Self::cluster_line(cluster));
            }
        }

        // Model responses
        if let Some(responses) = &state.model_responses {
            output.push_str(&Self::section_header("Model Responses"));
            for response in responses {
                if response.is_success() {
                    output.push_str(&format!(
                        "\n{}\n{}\n",
                        format!("── {} ──", response.model_id).yellow().bold(),
                        response.response_text
                    ));
                } else {
                    output.push_str(&format!(
                        "\n{}\n{}\n",
                        format!("── {} ──", response.model_id).red().bold(),
                        response.response_text
                    ));
                }
            }
        }

        // Peer reviews
        if let Some(reviews) = state.peer_reviews.as_deref()
            && !reviews.is_empty()
        {
            output.push_str(&Self::section_header("Peer Reviews"));
            for review in reviews {
                output.push_str(&format!(
                    "  {} -> {}: {} (accuracy {}, insight {}, constraints {})\n",
                    review.reviewer_model,
                    review.reviewed_model,
                    Self::review_score(review.average_score()),
                    review.accuracy_score,
                    review.insight_score,
                    review.constraint_adherence_score
                ));
            }
        }

        // Reasoning trace
        if let Some(consensus) = &state.consensus {
            output.push_str(&Self::section_header("Reasoning Trace"));
            for entry in &consensus.reasoning_trace {
                output.push_str(&format!("  {:<14} {}\n", entry.step.dimmed(), entry.details));
            }
        }

        if state.status == RunStatus::Aborted {
            output.push_str(&Self::section_header("Run Aborted"));
            for error in &state.errors {
                output.push_str(&format!("  {} {}\n", "x".red(), error));
            }
        }

        if let Some(id) = &state.conversation_id {
            output.push_str(&format!("\n{} {}\n", "Saved as".dimmed(), id));
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(state: &RunState) -> String {
        serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format a saved conversation as JSON
    pub fn format_conversation_json(conversation: &StoredConversation) -> String {
        serde_json::to_string_pretty(conversation).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the final answer only (concise output)
    pub fn format_answer_only(state: &RunState) -> String {
        match &state.consensus {
            Some(consensus) => format!("{}\n", consensus.final_answer),
            None => format!(
                "{} {}\n",
                "No answer:".red().bold(),
                state.errors.last().map_or("the run stopped early", String::as_str)
            ),
        }
    }

    /// Format a saved conversation with its id and timestamp
    pub fn format_conversation(conversation: &StoredConversation) -> String {
        format!(
            "{} {}\n{} {}\n{}",
            "Conversation:".cyan().bold(),
            conversation.id,
            "Saved:".cyan().bold(),
            conversation.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            Self::format(&conversation.state)
        )
    }

    /// Format the history listing, one conversation per line
    pub fn format_history(summaries: &[ConversationSummary]) -> String {
        if summaries.is_empty() {
            return format!("{}\n", "No saved conversations.".dimmed());
        }
        summaries
            .iter()
            .map(|s| {
                format!(
                    "{}  {}  {}\n",
                    s.id.yellow(),
                    s.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    s.query.replace('\n', " ")
                )
            })
            .collect()
    }

    /// Format provider availability and models
    pub fn format_providers(statuses: &[ProviderStatus]) -> String {
        let mut output = String::new();
        for status in statuses {
            let marker = if status.available {
                "available".green()
            } else {
                "no key".red()
            };
            let capabilities: Vec<&str> = status.capabilities.iter().map(|c| c.as_str()).collect();
            output.push_str(&format!(
                "{} ({}) [{}]\n",
                status.name.bold(),
                marker,
                capabilities.join(", ")
            ));
            for model in &status.models {
                output.push_str(&format!("  * {} {}\n", model.display_name, model.id.dimmed()));
            }
        }
        output
    }

    /// Confidence label with percentage, e.g. "72% Moderate Confidence"
    pub fn confidence_label(confidence: f64) -> String {
        let label = if confidence >= 0.8 {
            "High Confidence"
        } else if confidence >= 0.6 {
            "Moderate Confidence"
        } else if confidence >= 0.4 {
            "Low Confidence"
        } else {
            "Very Low Confidence"
        };
        format!("{:.0}% {}", confidence * 100.0, label)
    }

    fn confidence_badge(confidence: f64) -> ColoredString {
        let label = Self::confidence_label(confidence);
        if confidence >= 0.7 {
            label.green().bold()
        } else if confidence >= 0.5 {
            label.yellow().bold()
        } else {
            label.red().bold()
        }
    }

    fn review_score(score: f64) -> ColoredString {
        let text = format!("{:.1}/10", score);
        if score >= 8.0 {
            text.green()
        } else if score >= 6.0 {
            text.yellow()
        } else {
            text.red()
        }
    }

    fn cluster_line(scored: &ScoredCluster) -> String {
        let score = format!("{:>4.0}%", scored.confidence_score * 100.0);
        let score = if scored.confidence_score >= HIGH_CONFIDENCE_THRESHOLD {
            score.green()
        } else {
            score.red()
        };
        let supporters: Vec<&str> = scored
            .cluster
            .supporting_models
            .iter()
            .map(String::as_str)
            .collect();
        let mut line = format!(
            "  {} {} - {}\n",
            score,
            scored.cluster.canonical_label.bold(),
            supporters.join(", ")
        );
        if !scored.cluster.conflicting_models.is_empty() {
            let conflicts: Vec<&str> = scored
                .cluster
                .conflicting_models
                .iter()
                .map(String::as_str)
                .collect();
            line.push_str(&format!("       {} {}\n", "disputed by".red(), conflicts.join(", ")));
        }
        line
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, state: &RunState) -> String {
        Self::format(state)
    }

    fn format_json(&self, state: &RunState) -> String {
        Self::format_json(state)
    }

    fn format_answer_only(&self, state: &RunState) -> String {
        Self::format_answer_only(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{FinalConsensus, ModelResponse, OutputFormat, RawQuery};

    fn state() -> RunState {
        colored::control::set_override(false);
        let mut state = RunState::new(RawQuery::try_new("Build a React app").unwrap());
        state.model_responses = Some(vec![
            ModelResponse::success("GPT-4o (OR)", "Use Vite."),
            ModelResponse::failure("Llama 3.3 70B", "groq", "timeout"),
        ]);
        state.consensus = Some(FinalConsensus::synthesis_failed());
        state.complete();
        state
    }

    #[test]
    fn test_confidence_labels() {
        assert_eq!(ConsoleFormatter::confidence_label(0.85), "85% High Confidence");
        assert_eq!(ConsoleFormatter::confidence_label(0.6), "60% Moderate Confidence");
        assert_eq!(ConsoleFormatter::confidence_label(0.3), "30% Very Low Confidence");
    }

    #[test]
    fn test_full_output_sections() {
        let output = ConsoleFormatter::format(&state());
        assert!(output.contains("Build a React app"));
        assert!(output.contains("30% Very Low Confidence"));
        assert!(output.contains("Synthesis failed"));
        assert!(output.contains("Error (groq): timeout"));
        assert!(!output.contains("Run Aborted"));
    }

    #[test]
    fn test_aborted_run_lists_errors() {
        let mut s = state();
        s.abort("Saving the conversation failed: disk full");
        let output = ConsoleFormatter::format(&s);
        assert!(output.contains("Run Aborted"));
        assert!(output.contains("disk full"));
    }

    #[test]
    fn test_answer_only() {
        let s = state();
        assert_eq!(
            ConsoleFormatter.render(&s, OutputFormat::Answer),
            format!("{}\n", s.consensus.as_ref().unwrap().final_answer)
        );

        let mut empty = RunState::new(RawQuery::try_new("q").unwrap());
        empty.abort("Normalization panicked: boom");
        assert!(ConsoleFormatter::format_answer_only(&empty).contains("boom"));
    }

    #[test]
    fn test_json_is_the_run_state() {
        let s = state();
        let json = ConsoleFormatter.render(&s, OutputFormat::Json);
        let back: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_empty_history() {
        colored::control::set_override(false);
        assert!(ConsoleFormatter::format_history(&[]).contains("No saved conversations"));
    }
}
