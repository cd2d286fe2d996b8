use indicatif::{ProgressBar, ProgressBarIter, ProgressStyle};
use std::io::Read;

/// Byte progress for one input stream. The bar is finished when the
/// guard goes away, whichever way the job ends.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn start(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(
            "{bytes:>10}/{total_bytes:10} [{wide_bar}] {bytes_per_sec} {eta}",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    pub fn wrap<R: Read>(&self, inner: R) -> ProgressBarIter<R> {
        self.bar.wrap_read(inner)
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.bar.finish();
    }
}
