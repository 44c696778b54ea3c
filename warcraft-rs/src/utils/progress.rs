//! Progress bar utilities

use indicatif::{ProgressBar, ProgressStyle};

/// Create a standard progress bar. Hidden when `quiet` is set.
pub fn create_progress_bar(total: u64, message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let template = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message(message.to_string());
    pb
}
