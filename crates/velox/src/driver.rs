//! Asynchronous script driver
//!
//! A [`ScriptDriver`] owns one interpreter and runs queued scripts through it
//! one at a time. Parsing and execution each happen on a background worker;
//! the owning thread collects completions with [`ScriptDriver::poll`] or
//! [`ScriptDriver::wait`] and advances a small state machine:
//!
//! ```text
//!        execute_script           parsed              executed
//! Idle ─────────────────▶ Parsing ──────▶ Executing ─────────▶ Idle
//!                            │ parse error                        ▲
//!                            └────────────────────────────────────┘
//! ```
//!
//! Scripts queued while another one is in flight wait their turn (FIFO).
//! A failed script is logged, reported and discarded; the queue keeps
//! draining. Phases cannot be cancelled once started.

mod worker;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::ast::Program;
use crate::error::{InterpreterError, RegistrationError};
use crate::extension::ExtensionManager;
use crate::frontend::{Frontend, ParseError, ScriptSource};
use crate::Interpreter;

use worker::{Outcome, WorkerMessage};

/// Identifier of one queued script, increasing per driver.
pub type TaskId = u64;

// ═══════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════

/// Errors raised by the driver itself.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The operation needs the driver to be idle
    #[error("driver is busy ({0})")]
    Busy(DriverState),

    /// Rebuilding the extension layer failed
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A worker thread could not be started
    #[error("cannot start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a script did not complete.
#[derive(Error, Debug)]
pub enum ScriptFailure {
    /// Reading or parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Evaluation raised an error
    #[error(transparent)]
    Runtime(#[from] InterpreterError),

    /// The driver could not prepare the run
    #[error(transparent)]
    Setup(#[from] DriverError),

    /// A worker panicked; the script's phase was abandoned
    #[error("{phase} worker panicked: {message}")]
    Panicked {
        /// Phase that was in flight
        phase: DriverState,
        /// Panic payload, when it was a string
        message: String,
    },
}

impl ScriptFailure {
    /// Source line of the failure, `0` when unknown.
    pub fn line(&self) -> u32 {
        match self {
            ScriptFailure::Parse(e) => e.line(),
            ScriptFailure::Runtime(e) => e.line(),
            ScriptFailure::Setup(_) | ScriptFailure::Panicked { .. } => 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════

/// Phase of the driver's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Nothing in flight
    Idle,
    /// A worker is reading and parsing a script
    Parsing,
    /// A worker is executing a parsed script
    Executing,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Idle => "idle",
            DriverState::Parsing => "parsing",
            DriverState::Executing => "executing",
        };
        f.write_str(name)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Script the change belongs to
    pub task_id: TaskId,
    /// State left
    pub from: DriverState,
    /// State entered
    pub to: DriverState,
}

/// Result of one script, produced when it leaves the driver.
#[derive(Debug)]
pub struct ScriptReport {
    /// Source name
    pub name: String,
    /// Task id assigned when queued
    pub task_id: TaskId,
    /// Display text of the result value, or the failure
    pub outcome: Result<String, ScriptFailure>,
    /// Time spent parsing and executing
    pub duration: Duration,
}

impl ScriptReport {
    /// Whether the script completed without error.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

struct Queued {
    task_id: TaskId,
    source: Box<dyn ScriptSource>,
}

struct InFlight {
    task_id: TaskId,
    name: String,
    elapsed: Duration,
}

// ═══════════════════════════════════════════════════════════════════════
// DRIVER
// ═══════════════════════════════════════════════════════════════════════

/// Serializes script runs through a single interpreter.
pub struct ScriptDriver {
    interpreter: Arc<Mutex<Interpreter>>,
    frontend: Arc<dyn Frontend>,
    extensions: Option<Arc<ExtensionManager>>,
    queue: VecDeque<Queued>,
    current: Option<InFlight>,
    ready: VecDeque<ScriptReport>,
    state: DriverState,
    transitions: Vec<Transition>,
    next_task: TaskId,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
}

impl ScriptDriver {
    /// Drive `interpreter` with scripts parsed by `frontend`.
    pub fn new(interpreter: Interpreter, frontend: impl Frontend + 'static) -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            interpreter: Arc::new(Mutex::new(interpreter)),
            frontend: Arc::new(frontend),
            extensions: None,
            queue: VecDeque::new(),
            current: None,
            ready: VecDeque::new(),
            state: DriverState::Idle,
            transitions: Vec::new(),
            next_task: 1,
            tx,
            rx,
        }
    }

    /// Rebuild the extension layer from `manager` before every execution.
    pub fn with_extensions(mut self, manager: Arc<ExtensionManager>) -> Self {
        self.extensions = Some(manager);
        self
    }

    /// Current state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Number of scripts waiting behind the one in flight
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Every state change so far, oldest first
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Whether nothing is in flight or queued.
    pub fn is_idle(&self) -> bool {
        self.state == DriverState::Idle && self.queue.is_empty()
    }

    /// Run `f` against the interpreter, e.g. to register host bindings.
    ///
    /// # Errors
    ///
    /// `Busy` unless the driver is idle.
    pub fn with_interpreter<R>(&self, f: impl FnOnce(&mut Interpreter) -> R) -> Result<R, DriverError> {
        if self.state != DriverState::Idle {
            return Err(DriverError::Busy(self.state));
        }
        Ok(f(&mut self.interpreter.lock()))
    }

    /// Take the interpreter back.
    ///
    /// # Errors
    ///
    /// `Busy` unless the driver is idle.
    pub fn into_interpreter(self) -> Result<Interpreter, DriverError> {
        if self.state != DriverState::Idle {
            return Err(DriverError::Busy(self.state));
        }
        Arc::try_unwrap(self.interpreter)
            .map(Mutex::into_inner)
            .map_err(|_| DriverError::Busy(self.state))
    }

    /// Queue a script. It starts at once when the driver is idle.
    pub fn execute_script(&mut self, source: impl ScriptSource + 'static) -> TaskId {
        let task_id = self.next_task;
        self.next_task += 1;
        debug!(target: "velox", task = task_id, script = source.name(), "script queued");
        self.queue.push_back(Queued {
            task_id,
            source: Box::new(source),
        });
        self.start_next();
        task_id
    }

    /// Process one worker message if one is ready, without blocking.
    ///
    /// Returns the report of a script that finished, if any. The next queued
    /// script starts as soon as the previous one completes.
    pub fn poll(&mut self) -> Option<ScriptReport> {
        if self.ready.is_empty() {
            if let Ok(message) = self.rx.try_recv() {
                self.handle(message);
            }
        }
        self.ready.pop_front()
    }

    /// Block until the next script finishes.
    ///
    /// Returns `None` when nothing is in flight or queued.
    pub fn wait(&mut self) -> Option<ScriptReport> {
        loop {
            if let Some(report) = self.ready.pop_front() {
                return Some(report);
            }
            if self.state == DriverState::Idle {
                if self.queue.is_empty() {
                    return None;
                }
                self.start_next();
                continue;
            }
            let message = self.rx.recv().ok()?;
            self.handle(message);
        }
    }

    /// Run everything queued, returning the reports in completion order.
    pub fn run_until_idle(&mut self) -> Vec<ScriptReport> {
        let mut reports = Vec::new();
        while let Some(report) = self.wait() {
            reports.push(report);
        }
        reports
    }

    // ═══════════════════════════════════════════════════════════════════
    // State machine
    // ═══════════════════════════════════════════════════════════════════

    fn set_state(&mut self, task_id: TaskId, to: DriverState) {
        self.transitions.push(Transition {
            task_id,
            from: self.state,
            to,
        });
        self.state = to;
    }

    /// Start parsing queued scripts until one is in flight.
    ///
    /// A script whose worker cannot be spawned completes with a failure and
    /// the next one is tried.
    fn start_next(&mut self) {
        while self.state == DriverState::Idle {
            let Some(Queued { task_id, source }) = self.queue.pop_front() else {
                return;
            };
            let name = source.name().to_string();
            self.current = Some(InFlight {
                task_id,
                name: name.clone(),
                elapsed: Duration::ZERO,
            });
            self.set_state(task_id, DriverState::Parsing);
            debug!(target: "velox", task = task_id, script = %name, "parsing");

            let spawned =
                worker::spawn_parse(self.tx.clone(), task_id, Arc::clone(&self.frontend), source);
            if let Err(e) = spawned {
                self.finish(Err(DriverError::from(e).into()));
            }
        }
    }

    fn handle(&mut self, message: WorkerMessage) {
        let task_id = match &self.current {
            Some(current) if current.task_id == message.task_id => current.task_id,
            _ => {
                warn!(target: "velox", task = message.task_id, "ignoring stale worker message");
                return;
            }
        };
        if let Some(current) = &mut self.current {
            current.elapsed += message.duration;
        }

        match message.outcome {
            Outcome::Parsed(Err(e)) => self.finish(Err(e.into())),
            Outcome::Parsed(Ok(program)) => {
                info!(
                    target: "velox",
                    task = task_id,
                    duration_ms = message.duration.as_millis() as u64,
                    "parsed"
                );
                match self.refresh_extensions() {
                    Ok(()) => self.start_execution(task_id, program),
                    Err(e) => self.finish(Err(e.into())),
                }
            }
            Outcome::Executed(result) => self.finish(result.map_err(ScriptFailure::from)),
            Outcome::Panicked(message) => {
                let phase = self.state;
                self.finish(Err(ScriptFailure::Panicked { phase, message }));
            }
        }
        self.start_next();
    }

    fn start_execution(&mut self, task_id: TaskId, program: Program) {
        self.set_state(task_id, DriverState::Executing);
        debug!(target: "velox", task = task_id, "executing");
        let spawned =
            worker::spawn_execute(self.tx.clone(), task_id, Arc::clone(&self.interpreter), program);
        if let Err(e) = spawned {
            self.finish(Err(DriverError::from(e).into()));
        }
    }

    fn refresh_extensions(&mut self) -> Result<(), DriverError> {
        let Some(manager) = &self.extensions else {
            return Ok(());
        };
        let mut interp = self.interpreter.lock();
        interp.reset_extensions();
        manager.inject_all(&mut interp)?;
        Ok(())
    }

    /// Queue the in-flight script's report and return to Idle.
    fn finish(&mut self, outcome: Result<String, ScriptFailure>) {
        let (task_id, name, duration) = match self.current.take() {
            Some(c) => (c.task_id, c.name, c.elapsed),
            None => (0, String::new(), Duration::ZERO),
        };
        match &outcome {
            Ok(_) => info!(
                target: "velox",
                task = task_id,
                script = %name,
                duration_ms = duration.as_millis() as u64,
                "script completed"
            ),
            Err(e) => error!(
                target: "velox",
                task = task_id,
                script = %name,
                line = e.line(),
                "script failed: {}",
                e
            ),
        }
        self.set_state(task_id, DriverState::Idle);
        self.ready.push_back(ScriptReport {
            name,
            task_id,
            outcome,
            duration,
        });
    }
}

impl fmt::Debug for ScriptDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDriver")
            .field("frontend", &self.frontend.name())
            .field("state", &self.state)
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::TextSource;
    use crate::frontends::VeloxFrontend;
    use pretty_assertions::assert_eq;

    fn driver() -> ScriptDriver {
        ScriptDriver::new(Interpreter::new(), VeloxFrontend::new())
    }

    #[test]
    fn test_starts_idle() {
        let mut driver = driver();
        assert_eq!(driver.state(), DriverState::Idle);
        assert!(driver.wait().is_none());
        assert!(driver.poll().is_none());
    }

    #[test]
    fn test_runs_a_script() {
        let mut driver = driver();
        let id = driver.execute_script(TextSource::new("sum", "1 + 2;"));
        assert_eq!(driver.state(), DriverState::Parsing);

        let report = driver.wait().unwrap();
        assert_eq!(report.task_id, id);
        assert_eq!(report.name, "sum");
        assert_eq!(report.outcome.unwrap(), "3");
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[test]
    fn test_parse_failure_skips_execution() {
        let mut driver = driver();
        driver.execute_script(TextSource::new("broken", "var = ;"));
        let report = driver.wait().unwrap();
        assert!(matches!(report.outcome, Err(ScriptFailure::Parse(_))));

        let states: Vec<_> = driver.transitions().iter().map(|t| t.to).collect();
        assert_eq!(states, vec![DriverState::Parsing, DriverState::Idle]);
    }

    #[test]
    fn test_busy_while_in_flight() {
        let mut driver = driver();
        driver.execute_script(TextSource::new("s", "1;"));
        assert!(matches!(
            driver.with_interpreter(|_| ()),
            Err(DriverError::Busy(DriverState::Parsing))
        ));
        driver.run_until_idle();
        assert!(driver.with_interpreter(|_| ()).is_ok());
        assert!(driver.into_interpreter().is_ok());
    }

    #[test]
    fn test_stale_message_is_ignored() {
        let mut driver = driver();
        let stale = WorkerMessage {
            task_id: 99,
            duration: Duration::ZERO,
            outcome: Outcome::Executed(Ok("x".to_string())),
        };
        driver.handle(stale);
        assert!(driver.poll().is_none());
        assert_eq!(driver.state(), DriverState::Idle);
    }

    #[test]
    fn test_setup_failure_is_handed_back() {
        let mut driver = driver();
        driver.current = Some(InFlight {
            task_id: 7,
            name: "unlucky".to_string(),
            elapsed: Duration::ZERO,
        });
        driver.state = DriverState::Parsing;
        let spawn = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        driver.finish(Err(DriverError::from(spawn).into()));

        let report = driver.poll().unwrap();
        assert_eq!(report.task_id, 7);
        assert!(matches!(
            report.outcome,
            Err(ScriptFailure::Setup(DriverError::Spawn(_)))
        ));
        assert_eq!(driver.state(), DriverState::Idle);
        assert!(driver.wait().is_none());
    }
}
