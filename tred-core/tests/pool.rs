use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{Receiver, bounded};
use tred_core::{
    CipherEngine, CipherSuite, Job, JobObserver, Operation, Pool, Result, Sealed, Settings,
    TredEngine, TredError,
};

fn quiet() -> Settings {
    Settings {
        silent: true,
        ..Settings::default()
    }
}

fn sealed_of(bytes: u64) -> Sealed {
    Sealed {
        checksum: [0u8; 32],
        duration: Duration::ZERO,
        bytes,
    }
}

#[derive(Default)]
struct Counting {
    started: AtomicU64,
    finished: AtomicU64,
    failed: AtomicU64,
}

impl JobObserver for Counting {
    fn started(&self, _worker: &str, _job: &Job) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn finished(&self, _worker: &str, _job: &Job, result: &Result<Sealed>) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        if result.is_err() {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn write_files(dir: &Path, k: usize) -> Vec<std::path::PathBuf> {
    (0..k)
        .map(|i| {
            let p = dir.join(format!("f{i:03}.dat"));
            fs::write(&p, vec![i as u8; 1000 + i * 37]).unwrap();
            p
        })
        .collect()
}

#[test]
fn wait_returns_after_every_job_is_terminal() {
    for size in [1usize, 4] {
        for k in [0usize, 1, 7, 40] {
            let td = tempfile::tempdir().unwrap();
            let files = write_files(td.path(), k);
            let obs = Arc::new(Counting::default());
            let mut pool = Pool::build::<TredEngine>(
                size,
                b"pool key",
                CipherSuite::XChaCha20Poly1305,
                quiet(),
                obs.clone(),
            )
            .unwrap();
            assert_eq!(pool.size(), size);

            for f in &files {
                pool.submit(Job::new(f, Operation::Encrypt, false)).unwrap();
            }
            assert_eq!(pool.submitted(), k as u64);
            let summary = pool.wait();

            assert_eq!(summary.submitted, k as u64);
            assert_eq!(summary.succeeded, k as u64);
            assert_eq!(summary.failed, 0);
            assert_eq!(obs.finished.load(Ordering::SeqCst), k as u64);
            for f in &files {
                let mut sealed = f.clone().into_os_string();
                sealed.push("_enc");
                assert!(Path::new(&sealed).exists());
            }
        }
    }
}

#[test]
fn failures_are_counted_and_do_not_stop_the_pool() {
    let td = tempfile::tempdir().unwrap();
    let files = write_files(td.path(), 5);
    let obs = Arc::new(Counting::default());
    let mut pool =
        Pool::build::<TredEngine>(3, b"k", CipherSuite::Aes256Gcm, quiet(), obs.clone()).unwrap();
    // plaintext files have no suffix and aren't sealed: all fail
    for f in &files {
        pool.submit(Job::new(f, Operation::Decrypt, false)).unwrap();
    }
    pool.submit(Job::new(td.path().join("missing"), Operation::Encrypt, false))
        .unwrap();
    let summary = pool.wait();
    assert_eq!(summary.submitted, 6);
    assert_eq!(summary.failed, 6);
    assert_eq!(obs.failed.load(Ordering::SeqCst), 6);
    for f in &files {
        assert!(f.exists());
    }
}

#[test]
fn construction_errors_are_fatal() {
    assert!(matches!(
        Pool::new(0, b"k", CipherSuite::XChaCha20Poly1305, quiet()),
        Err(TredError::InvalidWorkerCount(0))
    ));
    assert!(matches!(
        Pool::new(4, b"", CipherSuite::XChaCha20Poly1305, quiet()),
        Err(TredError::InvalidKey(_))
    ));
}

/// Copies input to output slowly and tracks how many run at once.
struct SlowEngine {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl CipherEngine for SlowEngine {
    fn new(_key: &[u8], _suite: CipherSuite) -> Result<Self> {
        Ok(Self {
            in_flight: Arc::default(),
            peak: Arc::default(),
        })
    }
    fn suite(&self) -> CipherSuite {
        CipherSuite::XChaCha20Poly1305
    }
    fn encrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(25));
        let n = std::io::copy(src, dst)?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(sealed_of(n))
    }
    fn decrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        self.encrypt_stream(src, dst)
    }
}

#[test]
fn never_more_jobs_in_processing_than_workers() {
    let td = tempfile::tempdir().unwrap();
    let files = write_files(td.path(), 24);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let n = 3;
    let engines = (0..n)
        .map(|_| SlowEngine {
            in_flight: in_flight.clone(),
            peak: peak.clone(),
        })
        .collect();
    let mut pool = Pool::from_engines(engines, quiet(), Arc::new(Counting::default())).unwrap();
    for f in &files {
        pool.submit(Job::new(f, Operation::Encrypt, false)).unwrap();
    }
    let summary = pool.wait();
    assert_eq!(summary.succeeded, 24);
    assert!(peak.load(Ordering::SeqCst) <= n);
    assert!(peak.load(Ordering::SeqCst) >= 1);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

/// Blocks each job until the test lets it through.
struct GateEngine {
    gate: Receiver<()>,
}

impl CipherEngine for GateEngine {
    fn new(_key: &[u8], _suite: CipherSuite) -> Result<Self> {
        let (_tx, gate) = bounded(0);
        Ok(Self { gate })
    }
    fn suite(&self) -> CipherSuite {
        CipherSuite::XChaCha20Poly1305
    }
    fn encrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        let _ = self.gate.recv();
        Ok(sealed_of(std::io::copy(src, dst)?))
    }
    fn decrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        self.encrypt_stream(src, dst)
    }
}

#[test]
fn submit_blocks_while_the_only_worker_is_busy() {
    let td = tempfile::tempdir().unwrap();
    let files = write_files(td.path(), 2);
    let (open, gate) = bounded::<()>(0);
    let pool = Pool::from_engines(vec![GateEngine { gate }], quiet(), Arc::new(Counting::default()))
        .unwrap();

    let second_accepted = Arc::new(AtomicBool::new(false));
    let flag = second_accepted.clone();
    let producer = thread::spawn(move || {
        let mut pool = pool;
        pool.submit(Job::new(&files[0], Operation::Encrypt, false)).unwrap();
        pool.submit(Job::new(&files[1], Operation::Encrypt, false)).unwrap();
        flag.store(true, Ordering::SeqCst);
        pool.wait()
    });

    thread::sleep(Duration::from_millis(150));
    assert!(
        !second_accepted.load(Ordering::SeqCst),
        "second submit must wait for the busy worker"
    );

    open.send(()).unwrap(); // first job finishes, worker takes the second
    open.send(()).unwrap();
    let summary = producer.join().unwrap();
    assert!(second_accepted.load(Ordering::SeqCst));
    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.succeeded, 2);
}

/// Writes part of the output, then fails.
struct BrokenEngine;

impl CipherEngine for BrokenEngine {
    fn new(_key: &[u8], _suite: CipherSuite) -> Result<Self> {
        Ok(BrokenEngine)
    }
    fn suite(&self) -> CipherSuite {
        CipherSuite::XChaCha20Poly1305
    }
    fn encrypt_stream(&self, _src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        dst.write_all(b"partial ciphertext")?;
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into())
    }
    fn decrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        self.encrypt_stream(src, dst)
    }
}

#[test]
fn failed_shred_keeps_source_and_drops_partial_ciphertext() {
    let td = tempfile::tempdir().unwrap();
    let f = td.path().join("keep.me");
    fs::write(&f, b"still here").unwrap();

    let mut pool = Pool::build::<BrokenEngine>(
        1,
        b"k",
        CipherSuite::XChaCha20Poly1305,
        quiet(),
        Arc::new(Counting::default()),
    )
    .unwrap();
    pool.submit(Job::new(&f, Operation::Shred, false)).unwrap();
    let summary = pool.wait();

    assert_eq!(summary.failed, 1);
    assert_eq!(fs::read(&f).unwrap(), b"still here");
    assert!(!td.path().join("keep.me_enc").exists());
}

#[test]
fn failed_encrypt_leaves_partial_output_and_source() {
    let td = tempfile::tempdir().unwrap();
    let f = td.path().join("src.txt");
    fs::write(&f, b"original").unwrap();
    let settings = Settings {
        remove_source: true,
        ..quiet()
    };

    let mut pool = Pool::build::<BrokenEngine>(
        2,
        b"k",
        CipherSuite::XChaCha20Poly1305,
        settings,
        Arc::new(Counting::default()),
    )
    .unwrap();
    pool.submit(Job::new(&f, Operation::Encrypt, false)).unwrap();
    assert_eq!(pool.wait().failed, 1);

    assert_eq!(fs::read(&f).unwrap(), b"original");
    assert_eq!(
        fs::read(td.path().join("src.txt_enc")).unwrap(),
        b"partial ciphertext"
    );
}

#[test]
fn failed_decrypt_removes_partial_plaintext() {
    let td = tempfile::tempdir().unwrap();
    let f = td.path().join("a_enc");
    fs::write(&f, b"whatever").unwrap();
    let mut pool = Pool::build::<BrokenEngine>(
        1,
        b"k",
        CipherSuite::XChaCha20Poly1305,
        quiet(),
        Arc::new(Counting::default()),
    )
    .unwrap();
    pool.submit(Job::new(&f, Operation::Decrypt, false)).unwrap();
    assert_eq!(pool.wait().failed, 1);
    assert!(f.exists());
    assert!(!td.path().join("a").exists());
}
