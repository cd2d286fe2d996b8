use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;

use crate::crypto::engine::{CipherSuite, Sealed};
use crate::error::Result;
use crate::job::Job;
use crate::pool::observer::JobObserver;

/// JSON manifest of sealed files and their checksums.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub created: i64,
    pub cipher: String,
    /// path relative to the input root -> hex BLAKE3 of the sealed file
    pub files: BTreeMap<String, String>,
}

/// Collects successful jobs from the workers into a [`Report`].
pub struct ReportCollector {
    root: PathBuf,
    suite: CipherSuite,
    files: Mutex<BTreeMap<String, String>>,
}

impl ReportCollector {
    pub fn new(root: &Path, suite: CipherSuite) -> Self {
        Self {
            root: root.to_path_buf(),
            suite,
            files: Mutex::new(BTreeMap::new()),
        }
    }

    fn key_for(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().to_string(),
            // single-file run: root is the file itself
            _ => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    pub fn report(&self) -> Report {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner()).clone();
        Report {
            created: OffsetDateTime::now_utc().unix_timestamp(),
            cipher: self.suite.name().to_string(),
            files,
        }
    }

    pub fn write_json(&self, out: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(out)?);
        serde_json::to_writer_pretty(&mut w, &self.report())?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    }
}

impl JobObserver for ReportCollector {
    fn finished(&self, _worker: &str, job: &Job, result: &Result<Sealed>) {
        if let Ok(sealed) = result {
            let key = self.key_for(&job.path);
            self.files
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(key, sealed.checksum_hex());
        }
    }
}
