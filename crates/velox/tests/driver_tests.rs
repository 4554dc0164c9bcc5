//! Asynchronous script driver

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::ImageExtension;
use pretty_assertions::assert_eq;
use velox::{
    DriverError, DriverState, ExtensionManager, FileSource, Frontend, Interpreter,
    InterpreterError, Item, NativeFunction, ParseError, Program, ScriptDriver, ScriptFailure,
    TextSource, VeloxFrontend,
};

fn driver() -> ScriptDriver {
    ScriptDriver::new(Interpreter::new(), VeloxFrontend::new())
}

#[test]
fn test_reports_success_with_value() {
    let mut driver = driver();
    driver.execute_script(TextSource::new("answer", "var x = 40; x + 2;"));
    let reports = driver.run_until_idle();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_success());
    assert_eq!(reports[0].outcome.as_ref().unwrap(), "42");
}

#[test]
fn test_runtime_failure_carries_line() {
    let mut driver = driver();
    driver.execute_script(TextSource::new("bad", "var x = 1;\nx();"));
    let report = driver.wait().unwrap();
    match report.outcome {
        Err(ScriptFailure::Runtime(ref e)) => {
            assert!(matches!(e, InterpreterError::NotCallable { .. }));
        }
        ref other => panic!("expected runtime failure, got {:?}", other),
    }
    assert_eq!(report.outcome.unwrap_err().line(), 2);
}

#[test]
fn test_parse_failure_carries_line() {
    let mut driver = driver();
    driver.execute_script(TextSource::new("syntax", "var a = 1;\nvar = 2;"));
    let report = driver.wait().unwrap();
    let failure = report.outcome.unwrap_err();
    assert!(matches!(failure, ScriptFailure::Parse(_)));
    assert_eq!(failure.line(), 2);
}

#[test]
fn test_failure_does_not_stop_the_queue() {
    let mut driver = driver();
    driver.execute_script(TextSource::new("one", "1;"));
    driver.execute_script(TextSource::new("two", "missing;"));
    driver.execute_script(TextSource::new("three", "3;"));
    assert_eq!(driver.pending(), 2);

    let reports = driver.run_until_idle();
    let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["one", "two", "three"]);
    let ok: Vec<_> = reports.iter().map(|r| r.is_success()).collect();
    assert_eq!(ok, vec![true, false, true]);
    assert!(driver.is_idle());
}

#[test]
fn test_task_ids_increase() {
    let mut driver = driver();
    let a = driver.execute_script(TextSource::new("a", "1;"));
    let b = driver.execute_script(TextSource::new("b", "2;"));
    assert!(b > a);
    let ids: Vec<_> = driver.run_until_idle().iter().map(|r| r.task_id).collect();
    assert_eq!(ids, vec![a, b]);
}

#[test]
fn test_poll_eventually_completes() {
    let mut driver = driver();
    driver.execute_script(TextSource::new("polled", "2 * 21;"));
    let deadline = Instant::now() + Duration::from_secs(10);
    let report = loop {
        if let Some(report) = driver.poll() {
            break report;
        }
        assert!(Instant::now() < deadline, "script did not finish");
        std::thread::sleep(Duration::from_millis(1));
    };
    assert_eq!(report.outcome.unwrap(), "42");
    assert_eq!(driver.state(), DriverState::Idle);
}

#[test]
fn test_missing_file_is_a_failed_completion() {
    let mut driver = driver();
    driver.execute_script(FileSource::new("/no/such/script.vx"));
    let report = driver.wait().unwrap();
    let failure = report.outcome.unwrap_err();
    assert!(failure.to_string().contains("cannot read"));
}

#[test]
fn test_runs_script_files() {
    let path = std::env::temp_dir().join(format!("velox-driver-{}.vx", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "function sq(n) {{ return n * n; }}").unwrap();
    writeln!(file, "sq(12);").unwrap();
    drop(file);

    let mut driver = driver();
    driver.execute_script(FileSource::new(&path));
    let report = driver.wait().unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(report.outcome.unwrap(), "144");
}

#[test]
fn test_extensions_are_rebuilt_for_every_script() {
    let manager = Arc::new(ExtensionManager::new());
    manager.register(ImageExtension).unwrap();
    let mut driver = driver().with_extensions(manager);

    driver.execute_script(TextSource::new("first", "var i = Image(1, 1); TypeOf(i);"));
    driver.execute_script(TextSource::new("second", "Image(2, 2); Red;"));
    let reports = driver.run_until_idle();
    assert_eq!(reports[0].outcome.as_ref().unwrap(), "Image");
    assert_eq!(reports[1].outcome.as_ref().unwrap(), &common::RED.to_string());
}

#[test]
fn test_interpreter_access_only_when_idle() {
    let mut driver = driver();
    driver
        .with_interpreter(|interp| interp.add_global_constant("Seven", Item::integer(7)))
        .unwrap();
    driver.execute_script(TextSource::new("uses", "Seven * 6;"));
    assert!(matches!(
        driver.with_interpreter(|_| ()),
        Err(DriverError::Busy(_))
    ));
    let report = driver.wait().unwrap();
    assert_eq!(report.outcome.unwrap(), "42");

    let interp = driver.into_interpreter().unwrap();
    assert!(interp.extensions_scope().contains_local("Seven"));
}

#[test]
fn test_deep_recursion_runs_on_worker_stack() {
    let mut driver = driver();
    driver.execute_script(TextSource::new(
        "deep",
        "function down(n) { if (n == 0) { return 0; } return 1 + down(n - 1); } down(200);",
    ));
    let report = driver.wait().unwrap();
    assert_eq!(report.outcome.unwrap(), "200");
}

#[test]
fn test_polling_alone_drains_the_queue() {
    let mut driver = driver();
    let first = driver.execute_script(TextSource::new("first", "1;"));
    let second = driver.execute_script(TextSource::new("second", "2;"));
    let third = driver.execute_script(TextSource::new("third", "3;"));

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut reports = Vec::new();
    while reports.len() < 3 {
        assert!(Instant::now() < deadline, "queue stalled after {} scripts", reports.len());
        match driver.poll() {
            Some(report) => reports.push(report),
            None => std::thread::sleep(Duration::from_millis(1)),
        }
    }

    let ids: Vec<_> = reports.iter().map(|r| r.task_id).collect();
    assert_eq!(ids, vec![first, second, third]);
    let values: Vec<_> = reports.iter().map(|r| r.outcome.as_ref().unwrap().clone()).collect();
    assert_eq!(values, vec!["1", "2", "3"]);
    assert!(driver.is_idle());
    assert!(driver.poll().is_none());
}

#[test]
fn test_panicking_native_fails_the_script_only() {
    let mut interp = Interpreter::new();
    interp
        .add_global_function(NativeFunction::new("Boom", &[], |_, _| panic!("boom")))
        .unwrap();
    let mut driver = ScriptDriver::new(interp, VeloxFrontend::new());

    driver.execute_script(TextSource::new("explodes", "function f() { return Boom(); } f();"));
    driver.execute_script(TextSource::new("after", "6 * 7;"));
    let reports = driver.run_until_idle();
    assert_eq!(reports.len(), 2);

    match &reports[0].outcome {
        Err(ScriptFailure::Panicked { phase, message }) => {
            assert_eq!(*phase, DriverState::Executing);
            assert_eq!(message, "boom");
        }
        other => panic!("expected a panic report, got {:?}", other),
    }
    assert_eq!(reports[1].outcome.as_ref().unwrap(), "42");

    let interp = driver.into_interpreter().unwrap();
    assert_eq!(interp.call_depth(), 0);
    assert_eq!(interp.scope_depth(), 0);
}

struct PanickingFrontend;

impl Frontend for PanickingFrontend {
    fn parse_str(&self, name: &str, _text: &str) -> Result<Program, ParseError> {
        panic!("cannot parse {}", name)
    }

    fn name(&self) -> &str {
        "Panicking"
    }

    fn file_extension(&self) -> &str {
        "px"
    }
}

#[test]
fn test_panicking_frontend_fails_the_script() {
    let mut driver = ScriptDriver::new(Interpreter::new(), PanickingFrontend);
    driver.execute_script(TextSource::new("one", "1;"));
    driver.execute_script(TextSource::new("two", "2;"));
    let reports = driver.run_until_idle();

    let messages: Vec<_> = reports
        .iter()
        .map(|r| r.outcome.as_ref().unwrap_err().to_string())
        .collect();
    assert_eq!(
        messages,
        vec![
            "parsing worker panicked: cannot parse one",
            "parsing worker panicked: cannot parse two",
        ]
    );
    assert_eq!(driver.state(), DriverState::Idle);
}
