use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;

use crate::pipeline::batch_config::BatchConfig;
use crate::pipeline::media_processor::{BlurJob, MediaProcessor};
use crate::pipeline::process_error::ProcessError;
use crate::shared::media_item::MediaItem;

/// Called after each item finishes with `(completed, total)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

type ItemOutcome = (PathBuf, Result<PathBuf, ProcessError>);

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("worker pool needs at least one worker")]
    NoWorkers,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Outputs of the items that succeeded, in the order they finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    entries: Vec<(PathBuf, PathBuf)>,
}

impl BatchResult {
    /// `(input, output)` pairs in completion order.
    pub fn entries(&self) -> &[(PathBuf, PathBuf)] {
        &self.entries
    }

    pub fn output_for(&self, input: &Path) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(inp, _)| inp == input)
            .map(|(_, out)| out.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs a [`MediaProcessor`] over a batch on a fixed-size pool of threads.
///
/// Layout: `submitter → job channel → N workers → result channel → submitter`
///
/// A failing item is logged and left out of the result; it never fails the
/// batch. Only building the pool can.
pub struct BatchDispatcher {
    max_workers: usize,
    processor: Arc<dyn MediaProcessor>,
    on_progress: Option<ProgressCallback>,
}

impl BatchDispatcher {
    pub fn new(config: &BatchConfig, processor: Arc<dyn MediaProcessor>) -> Self {
        Self {
            max_workers: config.parallel_processing.max_workers,
            processor,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn run(&self, paths: &[PathBuf], job: &BlurJob) -> Result<BatchResult, PoolError> {
        if self.max_workers == 0 {
            return Err(PoolError::NoWorkers);
        }
        let total = paths.len();
        if total == 0 {
            return Ok(BatchResult::default());
        }

        let worker_count = self.max_workers.min(total);
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<MediaItem>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<ItemOutcome>();
        let job = Arc::new(job.clone());

        // Spawn before enqueueing so a spawn failure leaves no work behind.
        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            match spawn_worker(
                id,
                self.processor.clone(),
                job.clone(),
                job_rx.clone(),
                result_tx.clone(),
            ) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    drop(job_tx);
                    join_workers(handles);
                    return Err(PoolError::Spawn(e));
                }
            }
        }
        drop(job_rx);
        drop(result_tx);

        log::info!("Processing {total} items on {worker_count} workers");
        for path in paths {
            let item = MediaItem::new(path.clone(), job.window);
            if job_tx.send(item).is_err() {
                break;
            }
        }
        drop(job_tx);

        let result = self.collect(result_rx, total);
        join_workers(handles);
        Ok(result)
    }

    fn collect(
        &self,
        result_rx: crossbeam_channel::Receiver<ItemOutcome>,
        total: usize,
    ) -> BatchResult {
        let mut entries = Vec::with_capacity(total);
        let mut completed = 0;

        for (input, outcome) in result_rx {
            completed += 1;
            match outcome {
                Ok(output) => {
                    log::info!(
                        "[{completed}/{total}] {} -> {}",
                        input.display(),
                        output.display()
                    );
                    entries.push((input, output));
                }
                Err(e) => {
                    log::error!(
                        "[{completed}/{total}] failed to {} {}: {e}",
                        e.operation(),
                        e.path().display()
                    );
                }
            }
            if let Some(ref callback) = self.on_progress {
                callback(completed, total);
            }
        }

        if entries.len() < total {
            log::warn!("{} of {total} items failed", total - entries.len());
        }
        BatchResult { entries }
    }
}

fn spawn_worker(
    id: usize,
    processor: Arc<dyn MediaProcessor>,
    job: Arc<BlurJob>,
    job_rx: crossbeam_channel::Receiver<MediaItem>,
    result_tx: crossbeam_channel::Sender<ItemOutcome>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("blur-worker-{id}"))
        .spawn(move || {
            for item in job_rx {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    processor.process(&item, &job)
                }))
                .unwrap_or_else(|payload| {
                    Err(ProcessError::Panicked {
                        path: item.path.clone(),
                        message: panic_message(payload.as_ref()),
                    })
                });
                if result_tx.send((item.path, outcome)).is_err() {
                    break;
                }
            }
        })
}

fn join_workers(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            log::error!("Worker thread panicked outside of item processing");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
