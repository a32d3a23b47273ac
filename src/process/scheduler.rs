/*!
 * Thread Scheduler
 *
 * Hosted stand-in for the kernel scheduler: every process runs on its own
 * OS thread and the host decides who runs. The scheduler only starts
 * threads, tracks their join handles and counts live processes.
 */

use super::object::Process;
use super::traits::{ProcessScheduler, ThreadEntry};
use crate::arch::TrapFrame;
use crate::core::errors::ScheduleError;
use crate::core::types::Pid;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Scheduler counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    pub scheduled: u64,
    pub exited: u64,
    pub running: usize,
}

/// Thread-per-process scheduler
#[derive(Debug, Default)]
pub struct ThreadScheduler {
    handles: Mutex<Vec<(Pid, JoinHandle<()>)>>,
    running: AtomicUsize,
    scheduled: AtomicU64,
    exited: AtomicU64,
    shutting_down: AtomicBool,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes started and not yet exited
    #[inline]
    pub fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            exited: self.exited.load(Ordering::Relaxed),
            running: self.running(),
        }
    }

    /// Join every process thread, including ones started while waiting
    ///
    /// Returns once no thread is left to join.
    pub fn wait_idle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.handles.lock());
            if batch.is_empty() {
                break;
            }
            join_all(batch);
        }
        debug!(running = self.running(), "Scheduler idle");
    }

    /// Join handles still held, finished or not
    pub fn tracked(&self) -> usize {
        self.handles.lock().len()
    }

    /// Refuse new processes and wait for the current ones
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        self.wait_idle();
        info!("Scheduler shut down");
    }
}

/// Split off the handles whose threads have already returned
fn take_finished(handles: &mut Vec<(Pid, JoinHandle<()>)>) -> Vec<(Pid, JoinHandle<()>)> {
    let (finished, live): (Vec<_>, Vec<_>) = std::mem::take(handles)
        .into_iter()
        .partition(|(_, handle)| handle.is_finished());
    *handles = live;
    finished
}

fn join_all(handles: Vec<(Pid, JoinHandle<()>)>) {
    for (pid, handle) in handles {
        if handle.join().is_err() {
            warn!(pid, "Process thread ended by panic");
        }
    }
}

impl ProcessScheduler for ThreadScheduler {
    fn schedule_new(
        &self,
        process: Arc<Process>,
        frame: TrapFrame,
        entry: ThreadEntry,
    ) -> Result<(), ScheduleError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(ScheduleError::ShuttingDown);
        }

        let pid = process.pid().unwrap_or_default();
        // Count first so a thread that exits at once never underflows
        self.running.fetch_add(1, Ordering::AcqRel);

        let spawned = thread::Builder::new()
            .name(format!("pid-{}", pid))
            .spawn(move || entry(process, frame));

        match spawned {
            Ok(handle) => {
                let finished = {
                    let mut handles = self.handles.lock();
                    let finished = take_finished(&mut handles);
                    handles.push((pid, handle));
                    finished
                };
                join_all(finished);
                self.scheduled.fetch_add(1, Ordering::Relaxed);
                debug!(pid, "Scheduled process thread");
                Ok(())
            }
            Err(e) => {
                self.running.fetch_sub(1, Ordering::AcqRel);
                Err(ScheduleError::SpawnFailed {
                    pid,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn process_exited(&self, pid: Pid) {
        let _ = self
            .running
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        self.exited.fetch_add(1, Ordering::Relaxed);
        debug!(pid, running = self.running(), "Process left the scheduler");
    }
}
