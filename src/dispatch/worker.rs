use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::messages::{JobKind, JobRequest, JobResponse, JobResult};
use crate::engine::PredictionEngine;
use crate::predict::{ElevationSearch, SwathSearch, DEFAULT_TRANSITION_STEP_S};

struct Job {
    request: JobRequest,
    reply: oneshot::Sender<JobResponse>,
}

struct WorkerHandle {
    tx: mpsc::Sender<Job>,
    join: JoinHandle<()>,
}

/// Pool of long-lived workers, each owning an independent engine (and
/// therefore independent caches). Jobs are queued per worker and handled
/// in submission order; a running job is never interrupted, so completion
/// order across workers depends on job size.
pub struct Dispatcher {
    workers: Vec<WorkerHandle>,
    next_worker: AtomicUsize,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Spawn `worker_count` workers (at least one) on blocking tasks.
    /// Must be called from within a tokio runtime.
    pub fn new(worker_count: usize) -> Self {
        let workers = (0..worker_count.max(1))
            .map(|index| {
                let (tx, rx) = mpsc::channel();
                let join = tokio::task::spawn_blocking(move || worker_loop(index, rx));
                WorkerHandle { tx, join }
            })
            .collect();
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Fresh request id; callers may also correlate with their own ids.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Submit round-robin and await the matched response. The call only
    /// suspends the caller; the work runs on the worker's thread.
    pub async fn submit(&self, request: JobRequest) -> JobResponse {
        let index = self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        self.submit_to(index, request).await
    }

    /// Submit to one specific worker. `CLEAR_CACHE` only ever clears the
    /// worker that receives it, so cache management needs this.
    pub async fn submit_to(&self, worker: usize, request: JobRequest) -> JobResponse {
        let id = request.id;
        let job = request.kind.job_type();
        let Some(handle) = self.workers.get(worker) else {
            return JobResponse::failure(id, job, format!("no such worker: {worker}"));
        };

        let (reply, response) = oneshot::channel();
        if handle.tx.send(Job { request, reply }).is_err() {
            return JobResponse::failure(id, job, "worker unavailable");
        }
        match response.await {
            Ok(response) => response,
            Err(_) => JobResponse::failure(id, job, "worker dropped the job"),
        }
    }

    /// Drop the queues and wait for the workers to drain and exit.
    pub async fn shutdown(self) {
        let mut joins = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            drop(worker.tx);
            joins.push(worker.join);
        }
        for join in joins {
            let _ = join.await;
        }
    }
}

fn worker_loop(index: usize, rx: mpsc::Receiver<Job>) {
    log::debug!("pass worker {index} started");
    let mut engine = PredictionEngine::new();
    while let Ok(job) = rx.recv() {
        let id = job.request.id;
        let response = execute(&mut engine, job.request);
        if job.reply.send(response).is_err() {
            // Caller went away; superseded result, nothing to do.
            log::debug!("worker {index}: result for job {id} discarded");
        }
    }
    log::debug!("pass worker {index} stopped");
}

/// Run one job against an engine. This is the only handler: the worker
/// loop and the synchronous path both call it, so the two execution paths
/// cannot drift apart.
pub fn execute(engine: &mut PredictionEngine, request: JobRequest) -> JobResponse {
    let JobRequest { id, kind } = request;
    let job = kind.job_type();
    match run_job(engine, kind) {
        Ok(result) => JobResponse::ok(id, job, result),
        Err(error) => {
            log::debug!("job {id} failed: {error}");
            JobResponse::failure(id, job, error)
        }
    }
}

fn run_job(engine: &mut PredictionEngine, kind: JobKind) -> Result<JobResult, String> {
    match kind {
        JobKind::PropagatePositions { tle, timestamps_ms } => {
            let timestamps = timestamps_ms
                .iter()
                .map(|&ms| timestamp(ms))
                .collect::<Result<Vec<_>, _>>()?;
            let samples = engine
                .propagate_positions(&tle, &timestamps)
                .map_err(|e| e.to_string())?;
            Ok(JobResult::Positions(samples))
        }
        JobKind::PropagateGeodetic { tle, timestamp_ms } => {
            let sample = engine
                .propagate_geodetic(&tle, timestamp(timestamp_ms)?)
                .map_err(|e| e.to_string())?;
            Ok(JobResult::Geodetic(sample))
        }
        JobKind::ComputePassesElevation {
            tle,
            station,
            start_ms,
            end_ms,
            min_elevation_deg,
            max_passes,
            collect_stats,
        } => {
            let search = ElevationSearch {
                start: timestamp(start_ms)?,
                end: timestamp(end_ms)?,
                min_elevation_deg,
                max_passes,
                transition_step_s: DEFAULT_TRANSITION_STEP_S,
            };
            let outcome = engine
                .find_passes(&tle, &station, &search)
                .map_err(|e| e.to_string())?;
            Ok(JobResult::Passes {
                passes: outcome.passes,
                stats: collect_stats.then_some(outcome.stats),
            })
        }
        JobKind::ComputePassesSwath {
            tle,
            station,
            swath_km,
            start_ms,
            end_ms,
            max_passes,
            collect_stats,
        } => {
            let search = SwathSearch {
                start: timestamp(start_ms)?,
                end: timestamp(end_ms)?,
                swath_km,
                max_passes,
                transition_step_s: DEFAULT_TRANSITION_STEP_S,
            };
            let outcome = engine
                .find_swath_passes(&tle, &station, &search)
                .map_err(|e| e.to_string())?;
            Ok(JobResult::Passes {
                passes: outcome.passes,
                stats: collect_stats.then_some(outcome.stats),
            })
        }
        JobKind::ClearCache => {
            engine.clear_caches();
            Ok(JobResult::CacheCleared { cleared: true })
        }
    }
}

fn timestamp(ms: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| format!("invalid timestamp: {ms} ms"))
}
