//! Progress reporting for pipeline runs
//!
//! Progress bars are drawn only when enabled in the runtime configuration;
//! otherwise a hidden bar is returned so callers never branch on it.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for the stage progress bar
pub const DEFAULT_STAGE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// Create the bar that advances once per pipeline stage
///
/// # Arguments
/// * `stages` - Number of stages in the run
/// * `visible` - Whether to draw the bar at all
#[must_use]
pub fn create_stage_progress_bar(stages: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(stages);
    let style = ProgressStyle::default_bar()
        .template(DEFAULT_STAGE_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Finish a progress bar with an optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
