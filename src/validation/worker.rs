//! Background validation runs.
//!
//! A run executes on its own thread with its own copy of the model snapshot
//! and rule pack. It talks to the caller only through [`TaskEvent`] messages:
//! zero or more `Progress` events followed by exactly one terminal event, or
//! nothing at all once the task has been aborted.
//!
//! At most one run should be active per model; serialising runs is up to the
//! caller.

use super::engine;
use super::{ElementSnapshot, RulePack, ValidationResult};
use crate::error::TaskError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// Percentage of elements processed.
    Progress(u8),
    Completed(ValidationResult),
    Failed(String),
}

impl TaskEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskEvent::Progress(_))
    }
}

/// Handle to a running validation.
///
/// Dropping the handle aborts the run.
pub struct ValidationTask {
    events: Receiver<TaskEvent>,
    aborted: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Starts validating `elements` against `pack` on a worker thread.
#[must_use]
pub fn spawn_validation(
    elements: Vec<ElementSnapshot>,
    pack: RulePack,
    progress_interval: usize,
) -> ValidationTask {
    spawn_with(move |on_progress, keep_going| {
        engine::run(&elements, &pack, progress_interval, on_progress, keep_going)
    })
}

/// Runs `job` on a worker thread. The job reports progress through its first
/// argument and polls the second between units of work; `None` means it
/// stopped early.
fn spawn_with<F>(job: F) -> ValidationTask
where
    F: FnOnce(&mut dyn FnMut(u8), &dyn Fn() -> bool) -> Option<ValidationResult>
        + Send
        + 'static,
{
    let (tx, rx) = mpsc::channel();
    let aborted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&aborted);

    let worker = thread::spawn(move || {
        let progress_tx = tx.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            job(
                &mut |percent: u8| {
                    // receiver gone means nobody is listening any more
                    let _ = progress_tx.send(TaskEvent::Progress(percent));
                },
                &|| !flag.load(Ordering::Relaxed),
            )
        }));

        let event = match outcome {
            Ok(Some(result)) => TaskEvent::Completed(result),
            Ok(None) => return,
            Err(payload) => TaskEvent::Failed(panic_message(payload.as_ref())),
        };
        let _ = tx.send(event);
    });

    ValidationTask {
        events: rx,
        aborted,
        worker: Some(worker),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown worker panic".to_string()
    }
}

impl ValidationTask {
    /// Tears the run down. No result is produced afterwards.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Blocks for the next event. `None` once the worker is gone.
    #[must_use]
    pub fn next_event(&self) -> Option<TaskEvent> {
        if self.is_aborted() {
            return None;
        }
        self.events.recv().ok()
    }

    /// Waits for the terminal event, forwarding progress to `on_progress`.
    pub fn wait(mut self, mut on_progress: impl FnMut(u8)) -> Result<ValidationResult, TaskError> {
        let outcome = loop {
            if self.is_aborted() {
                break Err(TaskError::Aborted);
            }
            match self.events.recv() {
                Ok(TaskEvent::Progress(percent)) => on_progress(percent),
                Ok(TaskEvent::Completed(result)) => break Ok(result),
                Ok(TaskEvent::Failed(message)) => break Err(TaskError::WorkerFailed { message }),
                Err(_) if self.is_aborted() => break Err(TaskError::Aborted),
                Err(_) => break Err(TaskError::Disconnected),
            }
        };

        // A result that raced with abort() is discarded.
        if self.is_aborted() {
            return Err(TaskError::Aborted);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        outcome
    }
}

impl Drop for ValidationTask {
    fn drop(&mut self) {
        self.abort();
    }
}
