//! Background snapshot task.
//!
//! The task runs on its own thread and sleeps on a condvar between saves, so
//! cancelling it wakes it immediately. [`PeriodicSave::stop`] joins the
//! thread before running the final save: once it returns no save can start.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info};
use parking_lot::{Condvar, Mutex};

use crate::types::StoreResult;

/// The work performed on every tick.
pub type SaveJob = Arc<dyn Fn() -> StoreResult<()> + Send + Sync>;

#[derive(Default)]
struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Handle on a running periodic save.
pub struct PeriodicSave {
    path: PathBuf,
    tick: Duration,
    job: SaveJob,
    signal: Arc<Signal>,
    thread: Option<JoinHandle<()>>,
}

impl PeriodicSave {
    /// Spawn the save thread. The first save happens one `tick` from now.
    pub fn start(path: &Path, tick: Duration, job: SaveJob) -> StoreResult<Self> {
        let signal = Arc::new(Signal::default());
        let thread = {
            let signal = Arc::clone(&signal);
            let job = Arc::clone(&job);
            let path = path.to_path_buf();
            thread::Builder::new()
                .name("stdb-periodic-save".to_string())
                .spawn(move || save_loop(&signal, tick, &job, &path))?
        };
        info!(
            "Periodic save to {} every {:?} enabled",
            path.display(),
            tick
        );
        Ok(Self {
            path: path.to_path_buf(),
            tick,
            job,
            signal,
            thread: Some(thread),
        })
    }

    /// Snapshot destination.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interval between saves.
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Cancel the task, then save one last time.
    pub fn stop(mut self) -> StoreResult<()> {
        self.cancel();
        info!("Periodic save to {} disabled", self.path.display());
        (self.job)()
    }

    /// Wake the thread with the stop flag set and wait for it to exit.
    fn cancel(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Periodic save thread for {} panicked", self.path.display());
            }
        }
    }
}

impl Drop for PeriodicSave {
    fn drop(&mut self) {
        if self.thread.is_none() {
            return;
        }
        self.cancel();
        if let Err(e) = (self.job)() {
            error!("Final save to {} failed: {e}", self.path.display());
        }
    }
}

fn save_loop(signal: &Signal, tick: Duration, job: &SaveJob, path: &Path) {
    loop {
        let deadline = Instant::now() + tick;
        {
            let mut stopped = signal.stopped.lock();
            while !*stopped {
                if signal.wake.wait_until(&mut stopped, deadline).timed_out() {
                    break;
                }
            }
            // Checked under the lock: a cancel seen here is never followed by a save.
            if *stopped {
                return;
            }
        }
        if let Err(e) = job() {
            error!("Periodic save to {} failed: {e}", path.display());
        }
    }
}
