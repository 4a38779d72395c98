//! Progress indicators for dotstrap.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with a message.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with a success line.
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    println!("{} {}", "✓".green(), msg);
}

/// Finish a spinner with an error line.
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}
