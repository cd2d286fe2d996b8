use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crossbeam::channel::Receiver;
use tracing::{debug, error, info, warn};

use crate::crypto::engine::{CipherEngine, Sealed};
use crate::error::Result;
use crate::job::{Job, Operation};
use crate::naming::{opened_name, sealed_name};
use crate::pool::observer::JobObserver;
use crate::pool::{Dispatch, PoolStats};
use crate::progress::Progress;
use crate::settings::Settings;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Direction {
    Seal,
    Open,
}

/// Removes `path` when dropped unless [`PendingRemoval::keep`] was called.
struct PendingRemoval {
    path: PathBuf,
    armed: bool,
    what: &'static str,
}

impl PendingRemoval {
    fn new(path: &Path, what: &'static str) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
            what,
        }
    }

    fn keep(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingRemoval {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(file = %self.path.display(), error = %e, "failed to remove {}", self.what);
            }
        }
    }
}

/// Output files are never reused: an existing target fails the job before
/// anything is written, so cleanup only touches files this job created.
fn create_output(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().write(true).create_new(true).open(path)?)
}

fn remove_source(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(file = %path.display(), error = %e, "failed to remove file");
    }
}

/// One engine binding plus the file-level procedures run on it.
pub struct Worker<E: CipherEngine> {
    name: String,
    engine: E,
    settings: Arc<Settings>,
}

impl<E: CipherEngine> Worker<E> {
    pub fn new(name: String, engine: E, settings: Arc<Settings>) -> Self {
        Self {
            name,
            engine,
            settings,
        }
    }

    pub fn process(&self, job: &Job) -> Result<Sealed> {
        match job.operation {
            Operation::Encrypt => self.encrypt(&job.path, job.show_progress),
            Operation::Decrypt => self.decrypt(&job.path, job.show_progress),
            Operation::Shred => self.shred(&job.path, job.show_progress),
        }
    }

    /// Seal `path` into `path + suffix`. A failed run leaves the partial
    /// output in place; the source is untouched either way.
    pub fn encrypt(&self, path: &Path, show_progress: bool) -> Result<Sealed> {
        let input = File::open(path)?;
        let output = create_output(&sealed_name(path, &self.settings.suffix))?;
        let sealed = self.transform(&input, output, show_progress, Direction::Seal)?;
        drop(input);
        if self.settings.remove_source {
            remove_source(path);
        }
        Ok(sealed)
    }

    /// Open `path` into its name minus the suffix. The output is removed
    /// again on any failure so no corrupt plaintext is left behind.
    pub fn decrypt(&self, path: &Path, show_progress: bool) -> Result<Sealed> {
        let input = File::open(path)?;
        let out_path = opened_name(path, &self.settings.suffix)?;
        let output = create_output(&out_path)?;
        let mut partial = PendingRemoval::new(&out_path, "partially decrypted file");
        let sealed = self.transform(&input, output, show_progress, Direction::Open)?;
        partial.keep();
        drop(input);
        if self.settings.remove_source {
            remove_source(path);
        }
        Ok(sealed)
    }

    /// Overwrite-then-delete: seal under the engine's throwaway key, then
    /// remove both the source and the ciphertext. The ciphertext is
    /// removed on failure too; the source then stays.
    pub fn shred(&self, path: &Path, show_progress: bool) -> Result<Sealed> {
        let input = File::open(path)?;
        let scratch = sealed_name(path, &self.settings.suffix);
        let output = create_output(&scratch)?;
        let _scratch = PendingRemoval::new(&scratch, "shred output");
        let sealed = self.transform(&input, output, show_progress, Direction::Seal)?;
        drop(input);
        remove_source(path);
        Ok(sealed)
    }

    fn transform(
        &self,
        input: &File,
        output: File,
        show_progress: bool,
        dir: Direction,
    ) -> Result<Sealed> {
        let progress = if show_progress && !self.settings.silent {
            match input.metadata() {
                Ok(m) => Some(Progress::start(m.len())),
                Err(e) => {
                    debug!(worker = %self.name, error = %e, "no progress bar, input size unknown");
                    None
                }
            }
        } else {
            None
        };
        let mut reader: Box<dyn Read + '_> = match &progress {
            Some(p) => Box::new(p.wrap(input)),
            None => Box::new(input),
        };
        let mut writer = BufWriter::new(output);
        let sealed = match dir {
            Direction::Seal => self.engine.encrypt_stream(&mut reader, &mut writer)?,
            Direction::Open => self.engine.decrypt_stream(&mut reader, &mut writer)?,
        };
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(sealed)
    }

    /// Consume jobs until the dispatch channel closes.
    pub(crate) fn run(
        self,
        jobs: Receiver<Dispatch>,
        observer: Arc<dyn JobObserver>,
        stats: Arc<PoolStats>,
    ) {
        debug!(worker = %self.name, "worker started");
        for (job, token) in jobs.iter() {
            observer.started(&self.name, &job);
            let result = self.process(&job);
            match &result {
                Ok(sealed) => {
                    stats.succeeded.fetch_add(1, Ordering::Relaxed);
                    info!(
                        worker = %self.name,
                        file = %job.path.display(),
                        cipher = %self.engine.suite(),
                        checksum = %sealed.checksum_hex(),
                        elapsed = ?sealed.duration,
                        "{} done",
                        job.operation
                    );
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        worker = %self.name,
                        file = %job.path.display(),
                        error = %e,
                        "{} failed",
                        job.operation
                    );
                }
            }
            observer.finished(&self.name, &job, &result);
            // releases the completion barrier for this job
            drop(token);
        }
        debug!(worker = %self.name, "worker stopped");
    }
}
