//! CLI output formatting utilities.

use crate::evaluation::Evaluation;
use crate::text::{char_len, truncate_with_ellipsis};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Column at which answers and summaries are wrapped.
pub const WRAP_WIDTH: usize = 85;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a processed video.
    pub fn video_info(title: &str, key: &str, chunks: usize, duration: Option<f64>) {
        let duration_str = duration
            .map(format_duration)
            .unwrap_or_else(|| "unknown length".to_string());
        println!(
            "  {} {} ({}, {} chunks, {})",
            style("*").cyan(),
            style(title).bold(),
            style(key).dim(),
            chunks,
            duration_str
        );
    }

    /// Print a long block of text wrapped for the terminal.
    pub fn block(text: &str) {
        println!("\n{}\n", wrap_text(text, WRAP_WIDTH));
    }

    /// Print a matched transcript snippet.
    pub fn snippet(index: usize, content: &str) {
        println!("\n{} {}", style(format!("[{}]", index)).cyan(), style("Snippet").bold());
        println!("{}", wrap_text(&content_preview(content, 500), WRAP_WIDTH));
    }

    /// Print evaluation scores.
    pub fn evaluation(evaluation: &Evaluation) {
        Output::header("Evaluation");
        for score in &evaluation.scores {
            println!(
                "  {} {:.2} {}",
                style(format!("{:<18}", score.criterion)).bold(),
                score.score,
                style(&score.reasoning).dim()
            );
        }
        Output::kv("Mean", &format!("{:.2}", evaluation.mean));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Greedy word wrap at `width` columns. Existing line breaks are kept.
pub fn wrap_text(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| {
            let mut wrapped = String::new();
            let mut line_len = 0;
            for word in line.split_whitespace() {
                let word_len = char_len(word);
                if line_len > 0 && line_len + 1 + word_len > width {
                    wrapped.push('\n');
                    line_len = 0;
                } else if line_len > 0 {
                    wrapped.push(' ');
                    line_len += 1;
                }
                wrapped.push_str(word);
                line_len += word_len;
            }
            wrapped
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Single-line preview with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    truncate_with_ellipsis(&content.replace('\n', " "), max_len)
}
