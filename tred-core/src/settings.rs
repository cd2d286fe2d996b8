/// Suffix appended to sealed files (and stripped again on decrypt).
pub const DEFAULT_SUFFIX: &str = "_enc";

/// Per-run behavior shared read-only by every worker of a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub suffix: String,
    /// Encrypt: remove the plaintext after sealing. Decrypt: remove the
    /// sealed file after opening. Ignored by shred.
    pub remove_source: bool,
    /// Suppresses progress bars.
    pub silent: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            remove_source: false,
            silent: false,
        }
    }
}

/// How a directory root is expanded into jobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkPolicy {
    pub recursive: bool,
    pub include_hidden: bool,
}
