use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, TredError};
use crate::settings::WalkPolicy;

pub const HIDDEN_MARKER: char = '.';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEntry {
    /// Regular file, becomes a job.
    File(PathBuf),
    /// Visited directory, root included. Only shred cares about these.
    Dir(PathBuf),
}

/// Expands a root path into candidate files, lazily.
#[derive(Clone, Debug)]
pub struct Traversal {
    root: PathBuf,
    policy: WalkPolicy,
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with(HIDDEN_MARKER))
        .unwrap_or(false)
}

fn keep(entry: &DirEntry, policy: WalkPolicy) -> bool {
    // the root was named explicitly, never filter it
    if entry.depth() == 0 {
        return true;
    }
    if !policy.include_hidden && is_hidden(entry.path()) {
        debug!(location = %entry.path().display(), "ignoring hidden entry");
        return false;
    }
    if entry.file_type().is_dir() && !policy.recursive {
        debug!(location = %entry.path().display(), "ignoring directory on non-recursive run");
        return false;
    }
    true
}

impl Traversal {
    pub fn new(root: impl Into<PathBuf>, policy: WalkPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    /// Entries in walk order. A failing entry is yielded as `Err` and
    /// the walk goes on; stopping is up to the caller.
    pub fn entries(&self) -> impl Iterator<Item = Result<WalkEntry>> + use<> {
        let policy = self.policy;
        let root = self.root.clone();
        WalkDir::new(&self.root)
            .follow_links(false)
            // sorting reads each directory fully before yielding from it,
            // so outputs written next to their inputs are never picked up
            .sort_by_file_name()
            .into_iter()
            // pruning: a rejected directory is never descended into
            .filter_entry(move |e| keep(e, policy))
            .filter_map(move |res| match res {
                Ok(e) if e.file_type().is_dir() => Some(Ok(WalkEntry::Dir(e.into_path()))),
                Ok(e) if e.file_type().is_file() => Some(Ok(WalkEntry::File(e.into_path()))),
                Ok(e) => {
                    debug!(location = %e.path().display(), "ignoring non-regular file");
                    None
                }
                Err(source) => Some(Err(TredError::Walk {
                    path: source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone()),
                    source,
                })),
            })
    }
}
