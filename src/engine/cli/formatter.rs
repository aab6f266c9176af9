//! CLI Output Formatting Module
//! Provides consistent, colorized output for terminal UX

use crate::engine::fetch::FetchError;
use crate::engine::merge::{MergeEvent, MergeOutcome, MergeReport};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.chars().count()).bright_black());
    }

    /// Print a key-value pair
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", key.bright_white().bold(), value);
    }

    /// Start a line that a later call finishes
    pub fn pending(message: &str) {
        print!("{} {}... ", "▶".bright_blue(), message);
        std::io::stdout().flush().ok();
    }

    /// Finish a `pending` line
    pub fn done(ok: bool, message: &str) {
        if ok {
            println!("{}", message.green());
        } else {
            println!("{}", message.red());
        }
    }

    /// Render one workflow event
    pub fn event(event: &MergeEvent) {
        match event {
            MergeEvent::BranchSelected { branch } => Self::kv("Branch", branch),
            MergeEvent::Downloading { component, .. } => {
                Self::pending(&format!("Downloading the template of {}", component));
            }
            MergeEvent::Downloaded { bytes, .. } => {
                Self::done(true, &format!("Success. ({})", format_size(*bytes)));
            }
            MergeEvent::Seeded { target } => {
                Self::success(&format!("Created {} from template", target.display()));
            }
            MergeEvent::BackedUp { backup, .. } => {
                Self::info(&format!("Backup saved to {}", backup.display()));
            }
            MergeEvent::Merging { target } => {
                Self::pending(&format!("Merging: {}", target.display()));
            }
            MergeEvent::Finished { target, outcome } => match outcome {
                MergeOutcome::Merged => Self::done(true, "Success."),
                MergeOutcome::Failed { code } => Self::done(false, &format!("Failed (exit code {}).", code)),
                MergeOutcome::ToolUnavailable { reason } => Self::done(false, &skipped_message(target, reason)),
                MergeOutcome::Seeded | MergeOutcome::ManualMergeRequired => {}
            },
            MergeEvent::ManualMerge { template, target } => {
                Self::info(&format!(
                    "You can merge {} manually, template file: {}",
                    target.display(),
                    template.display()
                ));
            }
        }
    }

    /// Per-file outcome table printed after a run
    pub fn summary(report: &MergeReport, seconds: u64) {
        Self::header("Summary");
        for file in &report.files {
            let name = file
                .target
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.target.display().to_string());
            Self::kv(&name, &outcome_label(&file.outcome));
        }
        println!();
        if report.is_success() {
            Self::success(&format!("Done in {}", format_duration(seconds)));
        } else {
            Self::warning(&format!(
                "{} file(s) need attention; backups end with `~`",
                report.failed().count()
            ));
        }
    }

    /// Fixed diagnostic for a failed download
    pub fn network_failure(err: &FetchError) {
        let text = network_diagnostic(&err.location(), &err.to_string());
        eprintln!("{}", text.as_str().red());
    }
}

pub fn outcome_label(outcome: &MergeOutcome) -> String {
    match outcome {
        MergeOutcome::Seeded => "created from template".to_string(),
        MergeOutcome::Merged => "merged".to_string(),
        MergeOutcome::Failed { code } => format!("merge failed (exit code {})", code),
        MergeOutcome::ToolUnavailable { reason } => format!("not merged ({})", reason),
        MergeOutcome::ManualMergeRequired => "merge manually".to_string(),
    }
}

/// Not preceded by a `Merging` line when the tool was missing up front, so it names the file itself
pub fn skipped_message(target: &Path, reason: &str) -> String {
    format!("Skipped {}: {}", target.display(), reason)
}

pub fn network_diagnostic(url: &str, detail: &str) -> String {
    format!(
        " Something went wrong!

The tool can't work properly because of one of:
  1) No internet connection.
  2) The connection was blocked by your
     country or the server.
  3) Wrong URL: {url}

If everything looks normal but you still can't use
this tool, please report this error and attach:
    {detail}
"
    )
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

/// Format duration in human-readable format
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
