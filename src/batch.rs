//! Background batch worker.
//!
//! A [`BatchWorker`] runs one batch at a time on its own thread and reports
//! progress through a callback. Its lifecycle:
//!
//! ```text
//!            init()              start()
//!   Idle ───────────▶ Initialized ───────▶ Running ──┐
//!    ▲                                               │ worker emits the
//!    │                 clean()                       │ terminal event
//!    └───────────────────────────────────────────────┘
//! ```
//!
//! - [`init`](BatchWorker::init) validates the config, creates the output
//!   directory, scans the input directory and loads the logo table.
//! - [`start`](BatchWorker::start) spawns the worker. The running flag is set
//!   before the thread exists, so no caller can observe a started batch as
//!   idle.
//! - [`clean`](BatchWorker::clean) joins the finished worker and returns to
//!   Idle. It is rejected while the worker is still running.
//!
//! Inside a run, images are composited on a rayon pool sized by
//! `processing.max_processes`. Counter updates and callback invocations are
//! serialized, so every event observes consistent counts: `current` counts
//! images started, `failed` counts images that failed before the event, and
//! exactly one final event carries `done = true`.
//!
//! A failing image is logged and counted; it never stops the batch.

use crate::compose::Compositor;
use crate::config::{ConfigError, RunConfig, effective_threads};
use crate::imaging::ImageBackend;
use crate::logos::LogoResolver;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("A batch is already running")]
    Busy,
    #[error("Operation not allowed while worker is {0:?}")]
    InvalidState(WorkerState),
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Worker thread panicked")]
    WorkerPanicked,
}

/// Lifecycle state of a [`BatchWorker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Initialized,
    Running,
}

/// One progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 1-based index of the image just started; equals `total` when done.
    pub current: usize,
    /// Images that failed so far.
    pub failed: usize,
    pub total: usize,
    /// Set on the final event only.
    pub done: bool,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    pub processed: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }
}

/// Receives progress events on the worker thread. A panic inside the
/// callback is caught and logged; the run and its terminal event go on.
pub type ProgressCallback = Box<dyn FnMut(ProgressEvent) + Send>;

/// Forward progress events into a channel. Send errors (receiver gone) are
/// ignored; the batch keeps running.
pub fn channel_callback(tx: Sender<ProgressEvent>) -> ProgressCallback {
    Box::new(move |event| {
        tx.send(event).ok();
    })
}

struct PreparedRun {
    config: RunConfig,
    files: Vec<PathBuf>,
    logos: LogoResolver,
    callback: ProgressCallback,
}

pub struct BatchWorker {
    backend: Arc<dyn ImageBackend>,
    logo_dir: PathBuf,
    state: WorkerState,
    running: Arc<AtomicBool>,
    prepared: Option<PreparedRun>,
    handle: Option<JoinHandle<BatchResult>>,
    last_result: Option<BatchResult>,
}

impl BatchWorker {
    pub fn new(backend: Arc<dyn ImageBackend>, logo_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            logo_dir: logo_dir.into(),
            state: WorkerState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            prepared: None,
            handle: None,
            last_result: None,
        }
    }

    /// True from `start()` until the terminal event has been delivered.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Validate and stage a run. Returns the number of images found.
    pub fn init(&mut self, config: RunConfig, callback: ProgressCallback) -> Result<usize, BatchError> {
        if self.is_running() {
            tracing::warn!("init rejected: a batch is running");
            return Err(BatchError::Busy);
        }
        if self.state != WorkerState::Idle {
            return Err(BatchError::InvalidState(self.state));
        }
        config.validate()?;
        let files = prepare_paths(&config)?;

        let logos = LogoResolver::from_dir(&self.logo_dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "logos unavailable, continuing without them");
            LogoResolver::default()
        });

        tracing::info!(
            input = %config.input_dir.display(),
            output = %config.output_dir.display(),
            images = files.len(),
            logos = logos.len(),
            "batch initialized"
        );
        let count = files.len();
        self.prepared = Some(PreparedRun {
            config,
            files,
            logos,
            callback,
        });
        self.state = WorkerState::Initialized;
        Ok(count)
    }

    /// Spawn the worker for the staged run.
    pub fn start(&mut self) -> Result<(), BatchError> {
        if self.is_running() {
            tracing::warn!("start rejected: a batch is running");
            return Err(BatchError::Busy);
        }
        if self.state != WorkerState::Initialized {
            return Err(BatchError::InvalidState(self.state));
        }
        let prepared = self
            .prepared
            .take()
            .ok_or(BatchError::InvalidState(self.state))?;
        if prepared.files.is_empty() {
            let input = prepared.config.input_dir.clone();
            self.state = WorkerState::Idle;
            return Err(ConfigError::NoImages(input).into());
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BatchError::Busy);
        }

        let backend = Arc::clone(&self.backend);
        let running = Arc::clone(&self.running);
        let spawned = std::thread::Builder::new()
            .name("frame-mark-batch".into())
            .spawn(move || {
                let _running = RunningGuard(running);
                run_batch(prepared, backend.as_ref())
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                self.last_result = None;
                self.state = WorkerState::Running;
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                self.state = WorkerState::Idle;
                Err(BatchError::Spawn(e))
            }
        }
    }

    /// Block until the current run finishes.
    pub fn wait(&mut self) -> Result<BatchResult, BatchError> {
        match self.handle.take() {
            Some(handle) => {
                let result = handle.join().map_err(|_| BatchError::WorkerPanicked)?;
                self.last_result = Some(result);
                Ok(result)
            }
            None => self.last_result.ok_or(BatchError::InvalidState(self.state)),
        }
    }

    /// Discard staged or finished state and return to Idle. Returns the
    /// result of the last run, if one ran.
    pub fn clean(&mut self) -> Result<Option<BatchResult>, BatchError> {
        if self.is_running() {
            tracing::warn!("clean rejected: a batch is running");
            return Err(BatchError::Busy);
        }
        let joined = self.handle.take().map(|h| h.join());
        let last = self.last_result.take();
        self.prepared = None;
        self.state = WorkerState::Idle;
        match joined {
            Some(Ok(result)) => Ok(Some(result)),
            Some(Err(_)) => Err(BatchError::WorkerPanicked),
            None => Ok(last),
        }
    }
}

impl Drop for BatchWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

/// Clears the running flag when the worker thread ends, panicking or not.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Check paths, create the output directory and list the input images.
pub fn prepare_paths(config: &RunConfig) -> Result<Vec<PathBuf>, ConfigError> {
    if config.input_dir.as_os_str().is_empty() || config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath);
    }
    if !config.input_dir.is_dir() {
        return Err(ConfigError::InputMissing(config.input_dir.clone()));
    }
    if !config.output_dir.is_dir() {
        std::fs::create_dir_all(&config.output_dir).map_err(|source| {
            ConfigError::OutputUncreatable {
                path: config.output_dir.clone(),
                source,
            }
        })?;
    }
    let files = scan_inputs(&config.input_dir)?;
    if files.is_empty() {
        return Err(ConfigError::NoImages(config.input_dir.clone()));
    }
    Ok(files)
}

/// Regular `.jpg`/`.jpeg` files directly inside `dir` (any case), sorted
/// by path and made absolute.
pub fn scan_inputs(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_jpeg(&path) {
            files.push(std::path::absolute(&path).unwrap_or(path));
        }
    }
    files.sort();
    Ok(files)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

// =============================================================================
// Worker
// =============================================================================

struct SinkState {
    current: usize,
    failed: usize,
    callback: ProgressCallback,
}

/// Serializes counter updates and callback invocations across pool threads.
struct ProgressSink {
    total: usize,
    inner: Mutex<SinkState>,
}

impl ProgressSink {
    fn new(total: usize, callback: ProgressCallback) -> Self {
        Self {
            total,
            inner: Mutex::new(SinkState {
                current: 0,
                failed: 0,
                callback,
            }),
        }
    }

    fn begin(&self) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.current += 1;
        let event = ProgressEvent {
            current: state.current,
            failed: state.failed,
            total: self.total,
            done: false,
        };
        notify(&mut state.callback, event);
    }

    fn fail(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failed += 1;
    }

    fn finish(self) -> BatchResult {
        let total = self.total;
        let mut state = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        let event = ProgressEvent {
            current: state.current,
            failed: state.failed,
            total,
            done: true,
        };
        notify(&mut state.callback, event);
        BatchResult {
            processed: state.current,
            failed: state.failed,
        }
    }
}

fn notify(callback: &mut ProgressCallback, event: ProgressEvent) {
    if panic::catch_unwind(AssertUnwindSafe(|| (*callback)(event))).is_err() {
        tracing::error!(current = event.current, done = event.done, "progress callback panicked");
    }
}

fn run_batch(prepared: PreparedRun, backend: &dyn ImageBackend) -> BatchResult {
    let PreparedRun {
        config,
        files,
        logos,
        callback,
    } = prepared;

    let sink = ProgressSink::new(files.len(), callback);
    let compositor = Compositor::new(&config, &logos, backend);
    let threads = effective_threads(&config.processing);
    tracing::info!(images = files.len(), threads, "batch started");

    let process_one = |path: &PathBuf| {
        sink.begin();
        match panic::catch_unwind(AssertUnwindSafe(|| compositor.process(path))) {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping image");
                sink.fail();
            }
            Err(_) => {
                tracing::error!(file = %path.display(), "image processing panicked");
                sink.fail();
            }
        }
    };

    if threads <= 1 {
        files.iter().for_each(&process_one);
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| files.par_iter().for_each(&process_one)),
            Err(e) => {
                tracing::warn!(error = %e, "thread pool unavailable, processing sequentially");
                files.iter().for_each(&process_one);
            }
        }
    }

    let result = sink.finish();
    tracing::info!(
        processed = result.processed,
        failed = result.failed,
        "batch finished"
    );
    result
}
