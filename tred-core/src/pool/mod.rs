//! Fixed-size worker pool fed through a single rendezvous channel.
//!
//! `submit` blocks until an idle worker takes the job, so a fast producer
//! can never queue more than it hands off. `wait` is the completion
//! barrier: it returns once every submitted job reached a terminal state
//! and all workers have exited.

pub mod observer;
pub mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use crossbeam::sync::WaitGroup;
use tracing::{debug, error};

use crate::crypto::aead::TredEngine;
use crate::crypto::engine::{CipherEngine, CipherSuite};
use crate::error::{Result, TredError};
use crate::job::Job;
use crate::settings::Settings;
use observer::{JobObserver, NoopObserver};
use worker::Worker;

/// A job travelling with its completion token.
pub(crate) type Dispatch = (Job, WaitGroup);

#[derive(Debug, Default)]
pub struct PoolStats {
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

pub struct Pool {
    sink: Sender<Dispatch>,
    workers: Vec<JoinHandle<()>>,
    pending: WaitGroup,
    submitted: u64,
    stats: Arc<PoolStats>,
}

impl Pool {
    /// Pool of `size` workers, each with its own [`TredEngine`].
    pub fn new(size: usize, key: &[u8], suite: CipherSuite, settings: Settings) -> Result<Self> {
        Self::build::<TredEngine>(size, key, suite, settings, Arc::new(NoopObserver))
    }

    /// Like [`Pool::new`] for any engine type, with an observer.
    /// Fails before any worker starts if one engine can't be built.
    pub fn build<E: CipherEngine>(
        size: usize,
        key: &[u8],
        suite: CipherSuite,
        settings: Settings,
        observer: Arc<dyn JobObserver>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(TredError::InvalidWorkerCount(size));
        }
        let engines = (0..size)
            .map(|_| E::new(key, suite))
            .collect::<Result<Vec<_>>>()?;
        Self::from_engines(engines, settings, observer)
    }

    /// Starts one worker per engine.
    pub fn from_engines<E: CipherEngine>(
        engines: Vec<E>,
        settings: Settings,
        observer: Arc<dyn JobObserver>,
    ) -> Result<Self> {
        if engines.is_empty() {
            return Err(TredError::InvalidWorkerCount(0));
        }
        let settings = Arc::new(settings);
        let stats = Arc::new(PoolStats::default());
        let (sink, jobs) = channel::bounded::<Dispatch>(0);

        let mut workers = Vec::with_capacity(engines.len());
        for (i, engine) in engines.into_iter().enumerate() {
            let name = format!("worker-{}", i + 1);
            let w = Worker::new(name.clone(), engine, Arc::clone(&settings));
            let rx = jobs.clone();
            let obs = Arc::clone(&observer);
            let st = Arc::clone(&stats);
            match thread::Builder::new()
                .name(name)
                .spawn(move || w.run(rx, obs, st))
            {
                Ok(h) => workers.push(h),
                Err(e) => {
                    // closing the channel stops the workers already running
                    drop(sink);
                    drop(jobs);
                    for h in workers {
                        let _ = h.join();
                    }
                    return Err(e.into());
                }
            }
        }
        debug!(workers = workers.len(), "pool started");

        Ok(Self {
            sink,
            workers,
            pending: WaitGroup::new(),
            submitted: 0,
            stats,
        })
    }

    /// Hand `job` to the next idle worker, blocking until one accepts.
    pub fn submit(&mut self, job: Job) -> Result<()> {
        self.submitted += 1;
        let token = self.pending.clone();
        if self.sink.send((job, token)).is_err() {
            // every worker is gone; the token came back with the error and is dropped
            self.submitted -= 1;
            return Err(TredError::PoolClosed);
        }
        Ok(())
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Block until all submitted jobs are done, then shut the workers down.
    pub fn wait(self) -> PoolSummary {
        let Pool {
            sink,
            workers,
            pending,
            submitted,
            stats,
        } = self;

        pending.wait();
        drop(sink);
        for h in workers {
            let name = h.thread().name().unwrap_or("worker").to_string();
            if h.join().is_err() {
                error!(worker = %name, "worker panicked");
            }
        }

        PoolSummary {
            submitted,
            succeeded: stats.succeeded.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
        }
    }
}
