//! Scope chains, layering and closure capture

mod common;

use common::{parse, run, run_display};
use pretty_assertions::assert_eq;
use velox::{Interpreter, InterpreterError, Item, Scope, ScopeKind};

#[test]
fn test_define_and_resolve_through_parents() {
    let root = Scope::new(ScopeKind::Standard);
    root.define("x", Item::integer(1));
    let child = Scope::child(ScopeKind::Block, &root);
    child.define("y", Item::integer(2));

    assert_eq!(child.resolve("x").unwrap().get_integer_value().unwrap(), 1);
    assert_eq!(child.resolve("y").unwrap().get_integer_value().unwrap(), 2);
    assert!(root.lookup("y").is_none());
    assert_eq!(child.depth(), 1);
    assert!(child.descends_from(&root));
}

#[test]
fn test_redefine_replaces_local_slot_only() {
    let root = Scope::new(ScopeKind::Script);
    root.define("x", Item::integer(1));
    let child = Scope::child(ScopeKind::Block, &root);
    child.define("x", Item::integer(2));
    child.define("x", Item::integer(3));

    assert_eq!(child.resolve("x").unwrap().get_integer_value().unwrap(), 3);
    assert_eq!(root.resolve("x").unwrap().get_integer_value().unwrap(), 1);
    assert_eq!(child.len(), 1);
}

#[test]
fn test_unresolved_identifier() {
    let scope = Scope::new(ScopeKind::Script);
    assert!(matches!(
        scope.resolve("missing"),
        Err(InterpreterError::UnresolvedIdentifier { ref name, .. }) if name == "missing"
    ));
}

#[test]
fn test_block_scope_shadows_and_ends() {
    let source = r#"
        var x = 1;
        {
            var x = 2;
            x = 3;
        }
        x;
    "#;
    assert_eq!(run_display(source), "1");
}

#[test]
fn test_block_locals_are_not_visible_after_the_block() {
    let err = run("{ var inner = 1; } inner;").unwrap_err();
    assert!(matches!(
        err,
        InterpreterError::UnresolvedIdentifier { ref name, line: 1 } if name == "inner"
    ));
}

#[test]
fn test_assignment_to_undeclared_name_fails() {
    assert!(matches!(
        run("undeclared = 1;").unwrap_err(),
        InterpreterError::UnresolvedIdentifier { .. }
    ));
}

#[test]
fn test_closure_outlives_its_defining_block() {
    let source = r#"
        var f;
        {
            var x = 5;
            f = function () { return x; };
        }
        var total = 0;
        for (var i = 0; i < 1000; i += 1) {
            total += f();
        }
        total;
    "#;
    assert_eq!(run_display(source), "5000");
}

#[test]
fn test_closure_sees_later_updates_of_captured_variable() {
    let source = r#"
        function counter() {
            var n = 0;
            return function () { n += 1; return n; };
        }
        var next = counter();
        next();
        next();
        next();
    "#;
    assert_eq!(run_display(source), "3");
}

#[test]
fn test_independent_closures_do_not_share_state() {
    let source = r#"
        function counter() {
            var n = 0;
            return function () { n += 1; return n; };
        }
        var a = counter();
        var b = counter();
        a(); a();
        b();
    "#;
    assert_eq!(run_display(source), "1");
}

#[test]
fn test_scope_stack_is_balanced_after_errors() {
    let mut interp = Interpreter::new();
    let before = interp.scope_depth();
    let program = parse("function f() { { return missing; } } f();");
    assert!(interp.execute(&program).is_err());
    assert_eq!(interp.scope_depth(), before);
    assert_eq!(interp.call_depth(), 0);
}

#[test]
fn test_script_globals_do_not_leak_between_executions() {
    let mut interp = Interpreter::new();
    interp.execute(&parse("var leaked = 1;")).unwrap();
    let err = interp.execute(&parse("leaked;")).unwrap_err();
    assert!(matches!(err, InterpreterError::UnresolvedIdentifier { .. }));
}

#[test]
fn test_session_scope_persists_bindings() {
    let mut interp = Interpreter::new();
    let session = interp.new_session_scope();
    interp
        .execute_in(&parse("var x = 40; function add2(n) { return n + 2; }"), &session)
        .unwrap();
    let result = interp.execute_in(&parse("add2(x);"), &session).unwrap();
    assert_eq!(result.get_integer_value().unwrap(), 42);
    assert_eq!(session.kind(), ScopeKind::Session);
    session.clear();
}

#[test]
fn test_script_scope_is_layered_over_extensions() {
    let mut interp = Interpreter::new();
    interp.add_global_constant("Answer", Item::integer(42));
    let result = interp.execute(&parse("var Answer = 1; Answer;")).unwrap();
    assert_eq!(result.get_integer_value().unwrap(), 1);

    // The extension layer is untouched.
    let result = interp.execute(&parse("Answer;")).unwrap();
    assert_eq!(result.get_integer_value().unwrap(), 42);
}
