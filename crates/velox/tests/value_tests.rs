//! Item value model: accessors, aliasing, duplication, payloads

mod common;

use common::{run, run_display};
use pretty_assertions::assert_eq;
use velox::{InterpreterError, Item, ItemState};

// ═══════════════════════════════════════════════════════════════════════
// Accessor Contract
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_integer_accessor_on_string_is_type_mismatch() {
    let err = Item::string("42").get_integer_value().unwrap_err();
    assert!(matches!(
        err,
        InterpreterError::TypeMismatch { ref expected, ref found, .. }
            if expected == "Integer" && found == "String"
    ));
}

#[test]
fn test_integer_accessor_on_real_does_not_truncate() {
    let err = Item::real(3.0).get_integer_value().unwrap_err();
    assert!(matches!(err, InterpreterError::TypeMismatch { .. }));
}

#[test]
fn test_real_accessor_promotes_integer() {
    assert_eq!(Item::integer(3).get_real_value().unwrap(), 3.0);
    assert_eq!(Item::real(2.5).get_real_value().unwrap(), 2.5);
    assert!(Item::boolean(true).get_real_value().is_err());
}

#[test]
fn test_is_undefined_never_fails() {
    assert!(Item::undefined().is_undefined());
    assert!(!Item::integer(0).is_undefined());
    assert!(!Item::array(vec![]).is_undefined());
}

#[test]
fn test_string_and_array_accessors() {
    assert_eq!(&*Item::string("hi").get_string_value().unwrap(), "hi");
    let items = Item::array(vec![Item::integer(1), Item::integer(2)])
        .get_array_value()
        .unwrap();
    assert_eq!(items.len(), 2);
    assert!(Item::integer(1).get_array_value().is_err());
    assert!(Item::integer(1).get_function_value().is_err());
    assert!(Item::integer(1).get_object_value().is_err());
}

// ═══════════════════════════════════════════════════════════════════════
// Aliasing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_clone_shares_the_cell() {
    let a = Item::integer(1);
    let b = a.clone();
    a.set(ItemState::Integer(2)).unwrap();
    assert_eq!(b.get_integer_value().unwrap(), 2);
    assert!(a.ptr_eq(&b));
}

#[test]
fn test_duplicate_is_independent() {
    let a = Item::integer(1);
    let b = a.duplicate();
    a.set(ItemState::Integer(2)).unwrap();
    assert_eq!(b.get_integer_value().unwrap(), 1);
    assert!(!a.ptr_eq(&b));
}

#[test]
fn test_array_element_aliases_in_scripts() {
    let source = r#"
        var arr = [1, 2, 3];
        var first = arr[0];
        var again = arr[0];
        first = 10;
        again;
    "#;
    assert_eq!(run_display(source), "10");
}

#[test]
fn test_array_element_mutation_is_seen_by_the_array() {
    assert_eq!(run_display("var a = [1, 2]; var e = a[1]; e += 5; a;"), "[1, 7]");
}

#[test]
fn test_clone_builtin_breaks_aliasing() {
    let source = r#"
        var a = 1;
        var b = Clone(a);
        b = 2;
        a;
    "#;
    assert_eq!(run_display(source), "1");
}

#[test]
fn test_var_binding_aliases_source_cell() {
    assert_eq!(run_display("var a = 1; var b = a; b = 5; a;"), "5");
}

#[test]
fn test_frozen_cells_reject_writes() {
    let item = Item::integer(1);
    item.freeze();
    assert!(matches!(
        item.set(ItemState::Integer(2)),
        Err(InterpreterError::ReadOnly { .. })
    ));
    let copy = item.duplicate();
    assert!(!copy.is_frozen());
    copy.set(ItemState::Integer(3)).unwrap();
}

#[test]
fn test_scripts_cannot_corrupt_constants() {
    // `var p = PI` binds a copy, so assigning to it leaves PI intact.
    assert_eq!(run_display("var p = PI; p = 3; PI > 3.1;"), "true");
    assert!(matches!(
        run("PI = 3;").unwrap_err(),
        InterpreterError::ReadOnly { ref name, line: 1 } if name == "PI"
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Foreign Payload
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_foreign_payload_round_trip() {
    let item = Item::undefined();
    assert!(!item.has_foreign());
    item.set_foreign(vec![1u8, 2, 3]);
    assert_eq!(*item.foreign::<Vec<u8>>().unwrap(), vec![1, 2, 3]);
    assert!(item.foreign::<String>().is_none());
}

#[test]
fn test_assignment_copies_foreign_payload() {
    let source = Item::integer(1);
    source.set_foreign(String::from("payload"));
    let target = Item::undefined();
    target.assign_from(&source).unwrap();
    assert_eq!(target.get_integer_value().unwrap(), 1);
    assert_eq!(target.foreign::<String>().unwrap().as_str(), "payload");
}

// ═══════════════════════════════════════════════════════════════════════
// Display
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_display_of_script_values() {
    assert_eq!(run_display("1 + 1;"), "2");
    assert_eq!(run_display("4.0 / 2;"), "2.0");
    assert_eq!(run_display("\"a\" + 1;"), "a1");
    assert_eq!(run_display("[1, [true, undefined]];"), "[1, [true, undefined]]");
    assert_eq!(run_display("function f() {} f;"), "<function f>");
}
