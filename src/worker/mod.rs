//! Worker threads
//!
//! [`ConcurrentRunner`] launches two kinds of workers against one shared
//! [`NumberGenerator`]:
//!
//! - **Generator workers** repeatedly draw a uniform value, map it through the
//!   current table and append the result to the shared history.
//! - **A persistence worker** repeatedly copies the newest history entry out
//!   under the history lock and writes it to a [`PersistenceSink`] after the
//!   lock is released.
//!
//! # Lifecycle
//!
//! Each worker moves `Created -> Running -> Completed | Failed` and never goes
//! back to `Running`. A failing worker (invalid table, sink error, panic) is
//! recorded against its own [`WorkerId`] only; siblings keep running.
//!
//! # Termination
//!
//! A positive iteration count bounds a worker. A count of zero or less runs
//! it until [`ConcurrentRunner::stop`]. Each launch (one `spawn_*` call) gets
//! its own stop flag: `stop` ends the launches made so far, and later
//! launches start unstopped.
//!
//! A persistence worker counts only entries it actually wrote toward its
//! bound. Reads of an empty history are reported as idle iterations.
//!
//! # Example
//!
//! ```
//! use cdfgen::diagnostics::TracingDiagnostics;
//! use cdfgen::generator::NumberGenerator;
//! use cdfgen::worker::ConcurrentRunner;
//! use std::sync::Arc;
//!
//! let generator = Arc::new(NumberGenerator::with_defaults(Arc::new(TracingDiagnostics)));
//! let runner = ConcurrentRunner::new(generator.clone());
//!
//! let report = runner.run_generators(4, 50).unwrap();
//! assert!(report.all_succeeded());
//! assert_eq!(generator.queue_length(), 100);
//! ```

use crate::distribution::sampler::Sampler;
use crate::error::{GeneratorError, SinkError};
use crate::generator::NumberGenerator;
use crate::output::sink::PersistenceSink;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Identifier of a worker, unique per runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// What a worker does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Generator,
    Persistence,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Generator => f.write_str("generator"),
            WorkerKind::Persistence => f.write_str("persistence"),
        }
    }
}

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    Completed,
    Failed,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Completed | WorkerState::Failed)
    }
}

/// Why a worker failed
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// How long a worker runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    Bounded(u64),
    /// Until the runner is stopped
    Indefinite,
}

impl Iterations {
    /// Positive counts bound the worker, anything else runs indefinitely
    pub fn from_count(count: i64) -> Self {
        if count > 0 {
            Iterations::Bounded(count as u64)
        } else {
            Iterations::Indefinite
        }
    }

    fn reached(&self, done: u64) -> bool {
        match self {
            Iterations::Bounded(n) => done >= *n,
            Iterations::Indefinite => false,
        }
    }
}

/// Outcome of one worker
#[derive(Debug)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub kind: WorkerKind,
    pub state: WorkerState,
    /// Draws made, or entries written for a persistence worker
    pub iterations: u64,
    /// Persistence iterations that found an empty history
    pub idle_iterations: u64,
    pub elapsed: Duration,
    pub error: Option<WorkerError>,
}

impl WorkerReport {
    pub fn succeeded(&self) -> bool {
        self.state == WorkerState::Completed
    }
}

/// The closed set of worker tasks
enum WorkerTask {
    Generate {
        sampler: Sampler,
    },
    Persist {
        sink: Box<dyn PersistenceSink>,
        interval: Duration,
    },
}

impl WorkerTask {
    fn kind(&self) -> WorkerKind {
        match self {
            WorkerTask::Generate { .. } => WorkerKind::Generator,
            WorkerTask::Persist { .. } => WorkerKind::Persistence,
        }
    }
}

/// One worker, owned by its thread
struct Worker {
    id: WorkerId,
    task: WorkerTask,
    state: WorkerState,
    iterations: Iterations,
    generator: Arc<NumberGenerator>,
    stop_flag: Arc<AtomicBool>,
    done: u64,
    idle: u64,
}

impl Worker {
    fn new(
        id: WorkerId,
        task: WorkerTask,
        iterations: Iterations,
        generator: Arc<NumberGenerator>,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            task,
            state: WorkerState::Created,
            iterations,
            generator,
            stop_flag,
            done: 0,
            idle: 0,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug_assert!(
            !self.state.is_terminal(),
            "{} left terminal state {:?}",
            self.id,
            self.state
        );
        self.state = next;
    }

    fn should_stop(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed) || self.iterations.reached(self.done)
    }

    fn run(mut self) -> WorkerReport {
        let kind = self.task.kind();
        let _span = tracing::debug_span!("worker", id = %self.id, kind = %kind).entered();
        let start = Instant::now();

        self.transition(WorkerState::Running);
        tracing::debug!(iterations = ?self.iterations, "worker started");

        let result = self.run_loop();
        let error = match result {
            Ok(()) => {
                self.transition(WorkerState::Completed);
                tracing::debug!(iterations = self.done, "worker completed");
                None
            }
            Err(e) => {
                self.transition(WorkerState::Failed);
                tracing::warn!(iterations = self.done, error = %e, "worker failed");
                Some(e)
            }
        };

        WorkerReport {
            id: self.id,
            kind,
            state: self.state,
            iterations: self.done,
            idle_iterations: self.idle,
            elapsed: start.elapsed(),
            error,
        }
    }

    fn run_loop(&mut self) -> Result<(), WorkerError> {
        while !self.should_stop() {
            match &mut self.task {
                WorkerTask::Generate { sampler } => {
                    self.generator.generate(sampler)?;
                }
                WorkerTask::Persist { sink, interval } => {
                    // Copy out under the history lock, write after it is released
                    let written = match self.generator.last_entry() {
                        Some(entry) => {
                            sink.write_entry(&entry)?;
                            true
                        }
                        None => {
                            self.idle += 1;
                            if interval.is_zero() {
                                thread::yield_now();
                            }
                            false
                        }
                    };
                    if !interval.is_zero() {
                        thread::sleep(*interval);
                    }
                    if !written {
                        continue;
                    }
                }
            }
            self.done += 1;
        }
        Ok(())
    }
}

/// Handle to a background worker
#[derive(Debug)]
pub struct WorkerHandle {
    id: WorkerId,
    kind: WorkerKind,
    handle: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and collect its report
    ///
    /// A panicked worker is reported as failed rather than propagated.
    pub fn join(self) -> WorkerReport {
        let (id, kind) = (self.id, self.kind);
        self.handle.join().unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(%id, %kind, "worker panicked: {}", message);
            WorkerReport {
                id,
                kind,
                state: WorkerState::Failed,
                iterations: 0,
                idle_iterations: 0,
                elapsed: Duration::ZERO,
                error: Some(WorkerError::Panicked(message)),
            }
        })
    }
}

/// Per-worker outcomes of a run
#[derive(Debug, Default)]
pub struct RunReport {
    reports: BTreeMap<WorkerId, WorkerReport>,
}

impl RunReport {
    /// Join every handle and collect the reports
    pub fn from_handles(handles: impl IntoIterator<Item = WorkerHandle>) -> Self {
        let mut report = Self::default();
        for handle in handles {
            report.insert(handle.join());
        }
        report
    }

    pub fn insert(&mut self, report: WorkerReport) {
        self.reports.insert(report.id, report);
    }

    /// Whether worker `id` completed, `None` if it is not part of this run
    pub fn succeeded(&self, id: WorkerId) -> Option<bool> {
        self.reports.get(&id).map(WorkerReport::succeeded)
    }

    pub fn all_succeeded(&self) -> bool {
        self.reports.values().all(WorkerReport::succeeded)
    }

    pub fn get(&self, id: WorkerId) -> Option<&WorkerReport> {
        self.reports.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerReport> {
        self.reports.values()
    }

    pub fn failures(&self) -> impl Iterator<Item = &WorkerReport> {
        self.iter().filter(|r| !r.succeeded())
    }

    /// Iterations summed over workers of `kind`
    pub fn total_iterations(&self, kind: WorkerKind) -> u64 {
        self.iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.iterations)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Launches workers against one shared generator
pub struct ConcurrentRunner {
    generator: Arc<NumberGenerator>,
    /// Stop flags of launches that may still be running
    launches: Mutex<Vec<Weak<AtomicBool>>>,
    next_id: AtomicUsize,
    seed: Option<u64>,
}

impl ConcurrentRunner {
    pub fn new(generator: Arc<NumberGenerator>) -> Self {
        Self {
            generator,
            launches: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
            seed: None,
        }
    }

    /// Seed generator workers deterministically (`seed + worker id`)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn generator(&self) -> &Arc<NumberGenerator> {
        &self.generator
    }

    /// Ask every worker launched so far to finish after its current iteration
    ///
    /// Workers launched afterwards are not affected.
    pub fn stop(&self) {
        let launches = std::mem::take(&mut *self.lock_launches());
        for flag in launches.iter().filter_map(Weak::upgrade) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    fn lock_launches(&self) -> MutexGuard<'_, Vec<Weak<AtomicBool>>> {
        self.launches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh stop flag for one launch
    fn new_launch(&self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        let mut launches = self.lock_launches();
        launches.retain(|w| w.strong_count() > 0);
        launches.push(Arc::downgrade(&flag));
        flag
    }

    fn allocate_id(&self) -> WorkerId {
        WorkerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn spawn(
        &self,
        id: WorkerId,
        task: WorkerTask,
        iterations: Iterations,
        stop_flag: &Arc<AtomicBool>,
    ) -> std::io::Result<WorkerHandle> {
        let kind = task.kind();
        let worker = Worker::new(
            id,
            task,
            iterations,
            self.generator.clone(),
            stop_flag.clone(),
        );
        let handle = thread::Builder::new()
            .name(format!("{}-{}", kind, id.0))
            .spawn(move || worker.run())?;
        Ok(WorkerHandle { id, kind, handle })
    }

    /// Start `workers` generator workers in the background
    ///
    /// `iterations <= 0` runs them until [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// Returns an error only if the OS refuses to create a thread. Workers
    /// of this launch that already started are stopped; workers from other
    /// launches keep running.
    pub fn spawn_generators(
        &self,
        workers: usize,
        iterations: i64,
    ) -> std::io::Result<Vec<WorkerHandle>> {
        let iterations = Iterations::from_count(iterations);
        tracing::info!(workers, ?iterations, "starting generator workers");

        let stop_flag = self.new_launch();
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let id = self.allocate_id();
            let sampler = match self.seed {
                Some(seed) => Sampler::with_seed(seed.wrapping_add(id.0 as u64)),
                None => Sampler::new(),
            };
            let task = WorkerTask::Generate { sampler };
            match self.spawn(id, task, iterations, &stop_flag) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop_flag.store(true, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }
        Ok(handles)
    }

    /// Run `workers` generator workers and wait for all of them
    pub fn run_generators(&self, workers: usize, iterations: i64) -> std::io::Result<RunReport> {
        let handles = self.spawn_generators(workers, iterations)?;
        let report = RunReport::from_handles(handles);
        tracing::info!(
            workers = report.len(),
            draws = report.total_iterations(WorkerKind::Generator),
            failed = report.failures().count(),
            "generator workers finished"
        );
        Ok(report)
    }

    /// Start the persistence worker in the background
    ///
    /// Every iteration forwards the newest history entry to `sink`, then
    /// sleeps for `interval` if it is non-zero. A bounded worker finishes
    /// after `iterations` entries were written; reads of an empty history do
    /// not count.
    pub fn spawn_persistence(
        &self,
        iterations: i64,
        sink: Box<dyn PersistenceSink>,
        interval: Duration,
    ) -> std::io::Result<WorkerHandle> {
        let iterations = Iterations::from_count(iterations);
        tracing::info!(?iterations, ?interval, "starting persistence worker");
        let stop_flag = self.new_launch();
        self.spawn(
            self.allocate_id(),
            WorkerTask::Persist { sink, interval },
            iterations,
            &stop_flag,
        )
    }
}
