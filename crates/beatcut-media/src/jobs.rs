// crates/beatcut-media/src/jobs.rs
//
// Export job records.
//
// The worker reports raw `ExportEvent`s; the host usually wants a durable
// per-job view — current state, last known progress, the stderr tail on
// failure, the output path on success. `JobTable::apply` folds events into
// that view. Progress percentages derive from the compiled duration, so a
// job created from a `CompiledExport` can drive a progress bar directly.

use std::collections::HashMap;
use std::path::PathBuf;

use uuid::Uuid;

use crate::driver::ExportEvent;

#[derive(Clone, Debug, PartialEq)]
pub enum JobState {
    Running,
    Done { path: PathBuf },
    Cancelled,
    Failed { code: Option<i32>, tail: Vec<String> },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

#[derive(Clone, Debug)]
pub struct JobRecord {
    pub job_id:   Uuid,
    pub output:   PathBuf,
    /// Total output duration in seconds (from the compiled export).
    pub duration: f64,
    pub state:    JobState,
    /// Last parsed progress: (frame, fps, output seconds reached).
    pub progress: Option<(u64, f64, f64)>,
}

impl JobRecord {
    pub fn new(job_id: Uuid, output: PathBuf, duration: f64) -> Self {
        Self {
            job_id,
            output,
            duration,
            state: JobState::Running,
            progress: None,
        }
    }

    /// Completion fraction in [0, 1], if any progress has been seen.
    pub fn fraction(&self) -> Option<f64> {
        if matches!(self.state, JobState::Done { .. }) {
            return Some(1.0);
        }
        let (_, _, time) = self.progress?;
        if self.duration <= 0.0 {
            return None;
        }
        Some((time / self.duration).clamp(0.0, 1.0))
    }
}

/// Host-side view over all export jobs, fed from the worker's event channel.
#[derive(Default)]
pub struct JobTable {
    jobs: HashMap<Uuid, JobRecord>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job at spawn time (before any event arrives).
    pub fn track(&mut self, record: JobRecord) {
        self.jobs.insert(record.job_id, record);
    }

    pub fn get(&self, job_id: Uuid) -> Option<&JobRecord> {
        self.jobs.get(&job_id)
    }

    /// Fold one worker event into the table. Events for unknown jobs are
    /// dropped (a cancelled-then-forgotten job may still flush events).
    pub fn apply(&mut self, event: ExportEvent) {
        match event {
            ExportEvent::Progress { job_id, frame, fps, time } => {
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.progress = Some((frame, fps, time));
                }
            }
            ExportEvent::Done { job_id, path } => {
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Done { path };
                }
            }
            ExportEvent::Cancelled { job_id } => {
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Cancelled;
                }
            }
            ExportEvent::Failed { job_id, code, tail } => {
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Failed { code, tail };
                }
            }
        }
    }

    /// Drop terminal jobs, returning how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, j| !j.state.is_terminal());
        before - self.jobs.len()
    }
}
