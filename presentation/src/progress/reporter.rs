//! Progress reporting for council runs

use colored::Colorize;
use council_application::PipelineObserver;
use council_domain::{Stage, StageEvent};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress during a council run with fancy progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// "[3/9] Parallel Execution"
    pub fn stage_prefix(stage: Stage) -> String {
        format!(
            "[{}/{}] {}",
            stage.ordinal(),
            Stage::SEQUENCE.len(),
            stage.display_name()
        )
    }

    fn start_stage(&self, stage: Stage, total_tasks: usize) {
        let pb = if total_tasks > 1 {
            let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
            pb.set_style(Self::stage_style());
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };
        pb.set_prefix(Self::stage_prefix(stage));
        pb.set_message("Starting...");

        if let Ok(mut slot) = self.stage_bar.lock() {
            *slot = Some(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for ProgressReporter {
    fn on_event(&self, event: &StageEvent) {
        match event {
            StageEvent::StageStarted { stage, total_tasks } => {
                self.start_stage(*stage, *total_tasks);
            }
            StageEvent::TaskCompleted { label, success, .. } => {
                if let Ok(slot) = self.stage_bar.lock()
                    && let Some(pb) = slot.as_ref()
                {
                    let status = if *success {
                        format!("{} {}", "v".green(), label)
                    } else {
                        format!("{} {}", "x".red(), label)
                    };
                    pb.set_message(status);
                    pb.inc(1);
                }
            }
            StageEvent::StageCompleted { summary, .. } => {
                if let Ok(mut slot) = self.stage_bar.lock()
                    && let Some(pb) = slot.take()
                {
                    pb.finish_with_message(summary.green().to_string());
                }
            }
            StageEvent::RunAborted { error, .. } => {
                if let Ok(mut slot) = self.stage_bar.lock()
                    && let Some(pb) = slot.take()
                {
                    pb.abandon_with_message(error.red().to_string());
                }
            }
            StageEvent::RunCompleted { .. } => {}
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl PipelineObserver for SimpleProgress {
    fn on_event(&self, event: &StageEvent) {
        match event {
            StageEvent::StageStarted { stage, total_tasks } => {
                eprintln!(
                    "{} {} ({} tasks)",
                    "->".cyan(),
                    ProgressReporter::stage_prefix(*stage).bold(),
                    total_tasks
                );
            }
            StageEvent::TaskCompleted { label, success, .. } => {
                if *success {
                    eprintln!("  {} {}", "v".green(), label);
                } else {
                    eprintln!("  {} {} (failed)", "x".red(), label);
                }
            }
            StageEvent::StageCompleted { summary, .. } => {
                eprintln!("  {}", summary.dimmed());
            }
            StageEvent::RunAborted { stage, error } => {
                eprintln!("{} {} aborted: {}", "x".red(), stage, error);
            }
            StageEvent::RunCompleted { .. } => {
                eprintln!();
            }
        }
    }
}
