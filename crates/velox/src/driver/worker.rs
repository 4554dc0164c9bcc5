//! Background phases of a script run

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::Sender;
use parking_lot::Mutex;

use super::TaskId;
use crate::ast::Program;
use crate::error::InterpreterError;
use crate::frontend::{Frontend, ParseError, ScriptSource};
use crate::Interpreter;

/// Evaluation recurses on the native stack, so workers get a large one.
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Completion notice sent back to the driver.
pub(super) struct WorkerMessage {
    pub task_id: TaskId,
    pub duration: Duration,
    pub outcome: Outcome,
}

pub(super) enum Outcome {
    Parsed(Result<Program, ParseError>),
    /// Display text of the script's result
    Executed(Result<String, InterpreterError>),
    /// The phase panicked; carries the panic message
    Panicked(String),
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn spawn(task_id: TaskId, phase: &str, work: impl FnOnce() + Send + 'static) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("velox-{}-{}", phase, task_id))
        .stack_size(WORKER_STACK_SIZE)
        .spawn(work)
        .map(|_| ())
}

/// Read and parse `source` on a worker thread.
pub(super) fn spawn_parse(
    tx: Sender<WorkerMessage>,
    task_id: TaskId,
    frontend: Arc<dyn Frontend>,
    source: Box<dyn ScriptSource>,
) -> io::Result<()> {
    spawn(task_id, "parse", move || {
        let start = Instant::now();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| frontend.parse(source.as_ref()))) {
            Ok(result) => Outcome::Parsed(result),
            Err(payload) => Outcome::Panicked(panic_message(payload)),
        };
        // The driver may have been dropped; nobody is left to notify.
        let _ = tx.send(WorkerMessage {
            task_id,
            duration: start.elapsed(),
            outcome,
        });
    })
}

/// Execute `program` on a worker thread.
///
/// The worker holds the interpreter lock for the whole run and releases its
/// handle before reporting, so the driver owns it again once notified. A
/// panic inside the run is reported after the interpreter is put back into a
/// usable state.
pub(super) fn spawn_execute(
    tx: Sender<WorkerMessage>,
    task_id: TaskId,
    interpreter: Arc<Mutex<Interpreter>>,
    program: Program,
) -> io::Result<()> {
    spawn(task_id, "exec", move || {
        let start = Instant::now();
        let outcome = {
            let mut interp = interpreter.lock();
            let checkpoint = interp.registry().checkpoint();
            let run = panic::catch_unwind(AssertUnwindSafe(|| {
                interp.execute(&program).map(|item| item.to_string())
            }));
            match run {
                Ok(result) => Outcome::Executed(result),
                Err(payload) => {
                    interp.recover(checkpoint);
                    Outcome::Panicked(panic_message(payload))
                }
            }
        };
        drop(interpreter);
        let _ = tx.send(WorkerMessage {
            task_id,
            duration: start.elapsed(),
            outcome,
        });
    })
}
