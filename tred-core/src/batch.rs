use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::job::{Job, Operation};
use crate::pool::Pool;
use crate::settings::WalkPolicy;
use crate::walk::filter::{Traversal, WalkEntry};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub walk_errors: u64,
    pub elapsed: Duration,
}

/// Feed `input` (a file or a directory root) through `pool` and wait for it.
///
/// A single file gets a progress bar; directory members don't. For shred,
/// every visited directory is removed afterwards, deepest first; failures
/// there are expected (skipped hidden entries) and ignored.
pub fn run(mut pool: Pool, input: &Path, op: Operation, policy: WalkPolicy) -> Result<BatchSummary> {
    let start = Instant::now();
    let meta = fs::metadata(input)?;
    let mut cleanup_dirs = Vec::new();
    let mut walk_errors = 0u64;

    if meta.is_dir() {
        for entry in Traversal::new(input, policy).entries() {
            match entry {
                Ok(WalkEntry::File(path)) => pool.submit(Job::new(path, op, false))?,
                Ok(WalkEntry::Dir(dir)) => {
                    if op == Operation::Shred {
                        cleanup_dirs.push(dir);
                    }
                }
                Err(e) => {
                    walk_errors += 1;
                    warn!(error = %e, "failed to traverse location");
                }
            }
        }
    } else {
        pool.submit(Job::new(input, op, true))?;
    }

    let summary = pool.wait();
    for dir in cleanup_dirs.iter().rev() {
        if let Err(e) = fs::remove_dir(dir) {
            debug!(location = %dir.display(), error = %e, "directory left in place");
        }
    }

    let elapsed = start.elapsed();
    info!(
        files = summary.submitted,
        failed = summary.failed,
        elapsed = ?elapsed,
        "operation completed"
    );
    Ok(BatchSummary {
        submitted: summary.submitted,
        succeeded: summary.succeeded,
        failed: summary.failed,
        walk_errors,
        elapsed,
    })
}
