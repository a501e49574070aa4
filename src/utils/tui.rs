use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(80);

fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["◐", "◓", "◑", "◒", "●"]);

    let spinner = ProgressBar::new_spinner()
        .with_style(style)
        .with_message(message.to_string());
    spinner.enable_steady_tick(TICK);
    spinner
}

/// Run `task` behind a spinner on stderr, clearing it once the task finishes.
pub async fn with_spinner<T>(message: &str, task: impl Future<Output = T>) -> T {
    let spinner = spinner(message);
    let output = task.await;
    spinner.finish_and_clear();
    output
}
