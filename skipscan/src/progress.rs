use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Stderr progress indicator for a running scan.
///
/// The engine reports positions, not increments, so the indicator also
/// behaves when the cursor jumps backwards during a rewind.
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// Bar for a stream of known length
    pub fn new(total_bytes: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total_bytes), ProgressDrawTarget::stderr_with_hz(4));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap()
                .progress_chars("=>-"),
        );
        Self { bar }
    }

    /// Spinner for a stream of unknown length
    pub fn unbounded() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(4));
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {bytes} ({bytes_per_sec})")
                .unwrap(),
        );
        Self { bar }
    }

    /// Indicator that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, offset: u64) {
        self.bar.set_position(offset);
    }

    /// Removes the indicator from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
