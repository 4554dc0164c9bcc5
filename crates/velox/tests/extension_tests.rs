//! Extension catalogue, injection and the logging natives

mod common;

use std::sync::Arc;

use common::{parse, run_logged, ImageExtension};
use pretty_assertions::assert_eq;
use velox::{
    EvalContext, Extension, ExtensionManager, Interpreter, InterpreterError, LogLevel, LogRecorder,
    LoggingExtension, NativeFunction, RegistrationError,
};

struct Greeter;

impl Extension for Greeter {
    fn name(&self) -> &str {
        "Greeter"
    }

    fn inject(&self, interp: &mut Interpreter) -> Result<(), RegistrationError> {
        interp.add_global_function(NativeFunction::new("Greet", &["who"], |scope, _| {
            let who = scope.resolve("who")?.get_string_value()?;
            Ok(velox::Item::string(format!("hello, {}", who)))
        }))
    }
}

struct Broken;

impl Extension for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    fn inject(&self, _interp: &mut Interpreter) -> Result<(), RegistrationError> {
        Err(RegistrationError::Extension {
            name: "Broken".to_string(),
            message: "missing device".to_string(),
        })
    }
}

#[test]
fn test_manager_rejects_duplicate_names() {
    let manager = ExtensionManager::new();
    manager.register(Greeter).unwrap();
    assert_eq!(
        manager.register(Greeter).unwrap_err(),
        RegistrationError::DuplicateExtension("Greeter".to_string())
    );
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_manager_injects_in_registration_order() {
    let manager = ExtensionManager::new();
    manager.register(ImageExtension).unwrap();
    manager.register(Greeter).unwrap();
    manager.register(LoggingExtension::new()).unwrap();
    assert_eq!(manager.names(), vec!["Image", "Greeter", "Logging"]);

    let mut interp = manager.build_interpreter(EvalContext::default()).unwrap();
    let result = interp.execute(&parse("Greet(\"velox\");")).unwrap();
    assert_eq!(result.to_string(), "hello, velox");
}

#[test]
fn test_unregister() {
    let manager = ExtensionManager::new();
    manager.register(Greeter).unwrap();
    assert!(manager.unregister("Greeter"));
    assert!(!manager.unregister("Greeter"));
    assert!(manager.is_empty());
}

#[test]
fn test_failed_injection_surfaces() {
    let manager = ExtensionManager::new();
    manager.register(Broken).unwrap();
    let err = manager.build_interpreter(EvalContext::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "extension `Broken` failed to inject: missing device"
    );
}

#[test]
fn test_registration_from_many_threads() {
    let manager = Arc::new(ExtensionManager::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || manager.register(Greeter).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
}

#[test]
fn test_duplicate_global_function() {
    let mut interp = Interpreter::new();
    Greeter.inject(&mut interp).unwrap();
    assert_eq!(
        Greeter.inject(&mut interp).unwrap_err(),
        RegistrationError::DuplicateFunction("Greet".to_string())
    );
}

#[test]
fn test_extension_functions_are_read_only() {
    let mut interp = Interpreter::new();
    Greeter.inject(&mut interp).unwrap();
    let err = interp.execute(&parse("Greet = 1;")).unwrap_err();
    assert!(matches!(err, InterpreterError::ReadOnly { ref name, .. } if name == "Greet"));
}

#[test]
fn test_logging_natives_record_every_level() {
    let recorder = LogRecorder::new();
    let mut interp = Interpreter::new();
    LoggingExtension::with_recorder(recorder.clone())
        .inject(&mut interp)
        .unwrap();
    let source = r#"
        LogVerbose("v");
        LogDebug(1);
        LogInfo(2.5);
        LogWarn(true);
        LogError([1]);
        LogFatal("f");
    "#;
    interp.execute(&parse(source)).unwrap();

    let levels: Vec<_> = recorder.records().iter().map(|r| r.level).collect();
    assert_eq!(levels, LogLevel::ALL.to_vec());
    assert_eq!(recorder.messages(), vec!["v", "1", "2.5", "true", "[1]", "f"]);
    assert_eq!(recorder.records()[2].line, 4);
}

#[test]
fn test_logging_requires_one_argument() {
    let err = run_logged("LogInfo();").unwrap_err();
    assert!(matches!(err, InterpreterError::Arity { ref name, .. } if name == "LogInfo"));
}
