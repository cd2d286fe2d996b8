use std::fmt;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Encrypt,
    Decrypt,
    Shred,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
            Operation::Shred => "shred",
        })
    }
}

/// One file-level unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    pub operation: Operation,
    /// Only single-file runs draw a bar; directory members would interleave.
    pub show_progress: bool,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>, operation: Operation, show_progress: bool) -> Self {
        Self {
            path: path.into(),
            operation,
            show_progress,
        }
    }
}
