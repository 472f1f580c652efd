use std::io::{IsTerminal as _, stderr, stdout};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use scenestac_core::IngestObserver;

/// Spaces out progress lines when nobody watches a terminal: 5s, 10s, 20s, ... up to 5120s.
struct LogBackoff {
    last_logged: Instant,
    iteration: u32,
}

impl LogBackoff {
    fn new(last_logged: Instant) -> Self {
        Self {
            last_logged,
            iteration: 0,
        }
    }

    fn should_log(&mut self) -> bool {
        let delay = Duration::from_secs(5u64 << self.iteration.min(10));
        if self.last_logged.elapsed() > delay {
            self.last_logged = Instant::now();
            self.iteration += 1;
            true
        } else {
            false
        }
    }
}

enum Output {
    Interactive(ProgressBar),
    Logged(LogBackoff),
}

/// Reports ingest progress as a progress bar, or as periodic log lines
/// when the output is not a terminal.
pub struct IngestProgress {
    output: Output,
    started_at: Instant,
    done: usize,
}

impl IngestProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        let started_at = Instant::now();
        let output = if is_interactive() {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{elapsed_precise} -> eta: {eta} [{bar:40.cyan/blue} {percent}%] {pos}/{human_len} ({per_sec}) | {msg}",
            ) {
                bar.set_style(style.progress_chars("█▓▒░ "));
            }
            Output::Interactive(bar)
        } else {
            Output::Logged(LogBackoff::new(started_at))
        };
        Self {
            output,
            started_at,
            done: 0,
        }
    }

    pub fn finish(&self) {
        if let Output::Interactive(bar) = &self.output {
            bar.finish_and_clear();
        }
        info!(
            "Ingested {} scenes in {:?}",
            self.done,
            self.started_at.elapsed()
        );
    }
}

impl IngestObserver for IngestProgress {
    fn on_record(&mut self, done: usize, total: usize) {
        self.done = done;
        match &mut self.output {
            Output::Interactive(bar) => bar.set_position(done as u64),
            Output::Logged(backoff) => {
                if backoff.should_log() {
                    let percent = done.saturating_mul(100) / total.max(1);
                    let elapsed = self.started_at.elapsed();
                    info!("Ingested {done}/{total} ({percent}%) scenes in {elapsed:?}");
                }
            }
        }
    }
}

/// Progress bars are only drawn when both output streams are terminals.
#[must_use]
pub fn is_interactive() -> bool {
    stdout().is_terminal() && stderr().is_terminal()
}
