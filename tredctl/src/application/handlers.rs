use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::info;

use tred_core::crypto::keygen::{SHRED_KEY_LEN, random_key};
use tred_core::error::{Result, TredError};
use tred_core::pool::observer::NoopObserver;
use tred_core::{
    BatchSummary, CipherSuite, JobObserver, Operation, Pool, ReportCollector, Settings, TredEngine,
    WalkPolicy,
};

use super::secret::{self, Secret};

fn worker_count(requested: Option<usize>) -> usize {
    requested.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    })
}

/// Absolute path of an input that must exist before any key is asked for.
fn resolve_input(input: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(input)?;
    fs::metadata(&path)?;
    Ok(path)
}

fn obtain_key(key_file: Option<PathBuf>, confirm: bool) -> Result<Secret> {
    match key_file {
        Some(p) => secret::read_key_file(&p),
        None if confirm => secret::ask("Encryption Key: ", true),
        None => secret::ask("Decryption Key: ", false),
    }
}

fn finish(op: Operation, summary: &BatchSummary, silent: bool) -> ExitCode {
    if !silent {
        eprintln!(
            "=== {op}: {} files, {} ok, {} failed in {:.2?}",
            summary.submitted, summary.succeeded, summary.failed, summary.elapsed
        );
        if summary.walk_errors > 0 {
            eprintln!("=== {} entries could not be read", summary.walk_errors);
        }
    }
    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[allow(clippy::too_many_arguments)]
fn process(
    input: &Path,
    op: Operation,
    key: &[u8],
    suite: CipherSuite,
    settings: Settings,
    policy: WalkPolicy,
    workers: Option<usize>,
    observer: Arc<dyn JobObserver>,
) -> Result<BatchSummary> {
    let pool = Pool::build::<TredEngine>(worker_count(workers), key, suite, settings, observer)?;
    info!(workers = pool.size(), cipher = %suite, input = %input.display(), "starting {op}");
    tred_core::run(pool, input, op, policy)
}

#[allow(clippy::too_many_arguments)]
pub fn handle_encrypt(
    input: PathBuf,
    cipher: String,
    suffix: String,
    clean: bool,
    recursive: bool,
    all: bool,
    workers: Option<usize>,
    silent: bool,
    report: Option<PathBuf>,
    key_file: Option<PathBuf>,
) -> Result<ExitCode> {
    let suite: CipherSuite = cipher.parse()?;
    let input = resolve_input(&input)?;
    let key = obtain_key(key_file, true)?;

    let settings = Settings {
        suffix,
        remove_source: clean,
        silent,
    };
    let policy = WalkPolicy {
        recursive,
        include_hidden: all,
    };
    let collector = Arc::new(ReportCollector::new(&input, suite));
    let observer: Arc<dyn JobObserver> = match report {
        Some(_) => collector.clone(),
        None => Arc::new(NoopObserver),
    };

    let summary = process(
        &input,
        Operation::Encrypt,
        &key,
        suite,
        settings,
        policy,
        workers,
        observer,
    )?;
    drop(key);

    if let Some(out) = report {
        collector.write_json(&out)?;
        if !silent {
            eprintln!("=== report: {}", out.display());
        }
    }
    Ok(finish(Operation::Encrypt, &summary, silent))
}

#[allow(clippy::too_many_arguments)]
pub fn handle_decrypt(
    input: PathBuf,
    cipher: String,
    suffix: String,
    clean: bool,
    recursive: bool,
    all: bool,
    workers: Option<usize>,
    silent: bool,
    key_file: Option<PathBuf>,
) -> Result<ExitCode> {
    let suite: CipherSuite = cipher.parse()?;
    let input = resolve_input(&input)?;
    let key = obtain_key(key_file, false)?;

    let settings = Settings {
        suffix,
        remove_source: clean,
        silent,
    };
    let policy = WalkPolicy {
        recursive,
        include_hidden: all,
    };
    let summary = process(
        &input,
        Operation::Decrypt,
        &key,
        suite,
        settings,
        policy,
        workers,
        Arc::new(NoopObserver),
    )?;
    Ok(finish(Operation::Decrypt, &summary, silent))
}

pub fn handle_shred(
    input: PathBuf,
    recursive: bool,
    all: bool,
    workers: Option<usize>,
    silent: bool,
    suffix: String,
) -> Result<ExitCode> {
    let input = resolve_input(&input)?;
    // nobody ever learns this key
    let key = Secret::new(random_key(SHRED_KEY_LEN)?);

    let settings = Settings {
        suffix,
        remove_source: false,
        silent,
    };
    let policy = WalkPolicy {
        recursive,
        include_hidden: all,
    };
    let summary = process(
        &input,
        Operation::Shred,
        &key,
        CipherSuite::default(),
        settings,
        policy,
        workers,
        Arc::new(NoopObserver),
    )?;
    Ok(finish(Operation::Shred, &summary, silent))
}

/// Random key bytes, optionally base64 encoded.
pub fn render_key(size: usize, encode: bool) -> Result<Vec<u8>> {
    if size == 0 {
        return Err(TredError::InvalidKey("key size must be positive".into()));
    }
    let key = Secret::new(random_key(size)?);
    if encode {
        Ok(STANDARD.encode(&*key).into_bytes())
    } else {
        Ok(key.to_vec())
    }
}

pub fn handle_key(size: usize, encode: bool) -> Result<ExitCode> {
    let out = render_key(size, encode)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&out)?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

pub fn handle_version() -> Result<ExitCode> {
    println!("{:<10} {}", "Version:", env!("CARGO_PKG_VERSION"));
    println!(
        "{:<10} {}/{}",
        "OS/Arch:",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!(
        "{:<10} {}",
        "Ciphers:",
        [CipherSuite::XChaCha20Poly1305, CipherSuite::Aes256Gcm]
            .map(|s| s.name())
            .join(", ")
    );
    Ok(ExitCode::SUCCESS)
}
