// crates/beatcut-media/src/worker.rs
//
// ExportWorker: owns the export job threads and their cancel flags.
// All public API a host calls to render lives here.
//
// One job = one thread running `driver::run_export`. Cancel flags are
// keyed by job id so cancellation is targeted; entries are removed when
// the job thread exits. Events drain over a bounded crossbeam channel the
// host polls.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use uuid::Uuid;

use beatcut_core::CompiledExport;

use crate::driver::{run_export, ExportEvent};

pub struct ExportWorker {
    /// Event channel: progress, done, cancelled, failed.
    pub rx: Receiver<ExportEvent>,
    tx:     Sender<ExportEvent>,
    /// Per-job cancel flags. Inserted by `start_export` before the thread
    /// spawns so a racing `cancel_export` never misses its flag.
    cancels:  Arc<Mutex<HashMap<Uuid, Arc<AtomicBool>>>>,
    shutdown: Arc<AtomicBool>,
}

impl ExportWorker {
    pub fn new() -> Self {
        let (tx, rx) = bounded(256);
        Self {
            rx,
            tx,
            cancels: Arc::new(Mutex::new(HashMap::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn a render job for `compiled`, writing to `output`.
    /// Returns the job id used in every subsequent event.
    pub fn start_export(&self, compiled: CompiledExport, output: PathBuf) -> Uuid {
        let job_id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancels.lock().unwrap().insert(job_id, Arc::clone(&cancel));

        let tx = self.tx.clone();
        let cancels = Arc::clone(&self.cancels);
        let shutdown = Arc::clone(&self.shutdown);
        thread::spawn(move || {
            if shutdown.load(Ordering::Relaxed) {
                let _ = tx.send(ExportEvent::Cancelled { job_id });
            } else {
                run_export(job_id, &compiled, &output, cancel, &tx);
            }
            cancels.lock().unwrap().remove(&job_id);
        });
        job_id
    }

    /// Signal `job_id` to stop. The job kills its ffmpeg child, removes
    /// the partial output and reports `Cancelled`.
    pub fn cancel_export(&self, job_id: Uuid) {
        if let Some(flag) = self.cancels.lock().unwrap().get(&job_id) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// Cancel everything; new jobs report `Cancelled` immediately.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for flag in self.cancels.lock().unwrap().values() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

impl Default for ExportWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcut_core::InputSpec;
    use std::time::Duration;

    fn compiled() -> CompiledExport {
        CompiledExport {
            inputs:         vec![InputSpec::Lavfi("anullsrc=r=44100:cl=stereo".into())],
            filter_complex: "color=c=black:s=16x16:d=0.1000[vout]".into(),
            video_out:      "vout".into(),
            audio_out:      "aout".into(),
            duration:       0.1,
        }
    }

    #[test]
    fn shutdown_cancels_new_jobs() {
        let worker = ExportWorker::new();
        worker.shutdown();
        let job_id = worker.start_export(compiled(), PathBuf::from("/tmp/never.mp4"));
        let event = worker.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, ExportEvent::Cancelled { job_id });
    }

    #[test]
    fn cancel_flag_is_registered_before_spawn() {
        let worker = ExportWorker::new();
        worker.shutdown(); // keep the thread from actually running ffmpeg
        let job_id = worker.start_export(compiled(), PathBuf::from("/tmp/never.mp4"));
        // Either the flag is still present or the job already drained it.
        worker.cancel_export(job_id); // must not panic on any interleaving
        let _ = worker.rx.recv_timeout(Duration::from_secs(5));
    }
}
