//! Terminal feedback for the command-line front-end.
//!
//! Pretty mode draws an `indicatif` bar on stderr; plain mode prints `==>` lines.
//! stdout stays reserved for results.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    fn use_pretty(&self) -> bool {
        self.is_tty
            && match self.mode {
                UiMode::Pretty | UiMode::Auto => true,
                UiMode::Plain => false,
            }
    }

    /// Start tracking a batch of `total` inputs.
    pub fn batch(&self, name: &str, total: u64) -> BatchGuard {
        let bar = if self.use_pretty() {
            let bar = ProgressBar::new(total);
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg} [{pos}/{len}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.set_message(format!("{name}…"));
            Some(bar)
        } else {
            eprintln!("==> {} ({} input{})", name, total, if total == 1 { "" } else { "s" });
            None
        };
        BatchGuard {
            name: name.to_string(),
            start: Instant::now(),
            bar,
            failed: AtomicU64::new(0),
        }
    }
}

/// Progress for one batch. Shared by reference across worker threads.
pub struct BatchGuard {
    name: String,
    start: Instant,
    bar: Option<ProgressBar>,
    failed: AtomicU64,
}

impl BatchGuard {
    /// Record one finished input.
    pub fn finished(&self, source: &str, ok: bool) {
        if !ok {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                if !ok {
                    bar.println(format!("✘ {source}"));
                }
            }
            None => eprintln!("{} {}", if ok { "✔" } else { "✘" }, source),
        }
    }

    pub fn failures(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let failed = self.failures();
        let message = if failed == 0 {
            format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()))
        } else {
            format!(
                "✘ {} ({} failed, {})",
                self.name,
                failed,
                format_duration(self.start.elapsed())
            )
        };
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_switch_units_at_one_second() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn pretty_output_needs_a_terminal() {
        assert!(!Ui::new(UiMode::Pretty, false).use_pretty());
        assert!(!Ui::new(UiMode::Plain, true).use_pretty());
        assert!(Ui::new(UiMode::Auto, true).use_pretty());
    }

    #[test]
    fn batch_counts_failures_from_many_threads() {
        let batch = Ui::new(UiMode::Plain, false).batch("analyze", 4);
        std::thread::scope(|scope| {
            for (i, ok) in [true, false, true, false].into_iter().enumerate() {
                let batch = &batch;
                scope.spawn(move || batch.finished(&format!("input-{i}"), ok));
            }
        });
        assert_eq!(batch.failures(), 2);
    }
}
