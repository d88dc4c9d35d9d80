//! Scope stack tests
//!
//! Shadowing, redeclaration, reserved names, loop counters and LIFO discipline.

use pretty_assertions::assert_eq;

use ember::interp::{GLOBAL_SCOPE, Name, ScopeStack, Value, Variable};
use ember::types::Flag;
use ember::{DataType, ErrorKind, RuntimeError};

fn name(s: &str) -> Name {
    Name::new(s).unwrap()
}

fn declare(stack: &mut ScopeStack, n: &str, ty: DataType, value: Value) {
    let mut var = Variable::new(name(n), ty);
    var.set_value(value).unwrap();
    stack.declare(var).unwrap();
}

fn read(stack: &ScopeStack, n: &str) -> Value {
    stack.lookup(n).unwrap().get_value()
}

// ==================== SHADOWING ====================

#[test]
fn test_innermost_declaration_wins() {
    let mut stack = ScopeStack::new(8);
    declare(&mut stack, "x", DataType::INT, Value::Int(1));
    let a = stack.push("a");
    declare(&mut stack, "x", DataType::TEXT, Value::text("two"));
    let b = stack.push("b");
    assert_eq!(read(&stack, "x"), Value::text("two"));
    declare(&mut stack, "x", DataType::BOOL, Value::Bool(true));
    assert_eq!(read(&stack, "x"), Value::Bool(true));

    stack.pop(b);
    assert_eq!(read(&stack, "x"), Value::text("two"));
    stack.pop(a);
    assert_eq!(read(&stack, "x"), Value::Int(1));
}

#[test]
fn test_assignment_reaches_outer_frame() {
    let mut stack = ScopeStack::new(8);
    declare(&mut stack, "total", DataType::NUMBER, Value::Int(0));
    let inner = stack.push("inner");
    stack
        .lookup_mut("total")
        .unwrap()
        .set_value(Value::Int(10))
        .unwrap();
    stack.pop(inner);
    assert_eq!(read(&stack, "total"), Value::Number(10.0));
}

#[test]
fn test_inner_names_vanish_on_pop() {
    let mut stack = ScopeStack::new(8);
    let frame = stack.push("if3");
    declare(&mut stack, "tmp", DataType::DYNAMIC, Value::Int(3));
    assert!(stack.contains("tmp"));
    stack.pop(frame);
    let err = stack.lookup("tmp").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedName);
}

// ==================== DECLARATION RULES ====================

#[test]
fn test_redeclaration_reports_scope() {
    let mut stack = ScopeStack::new(8);
    let frame = stack.push("while7");
    declare(&mut stack, "x", DataType::INT, Value::Int(1));
    let err = stack
        .declare(Variable::new(name("x"), DataType::INT))
        .unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Redeclaration {
            name: "x".to_string(),
            scope: "while7".to_string()
        }
    );
    stack.pop(frame);
}

#[test]
fn test_every_counter_name_is_reserved() {
    let mut stack = ScopeStack::new(8);
    for c in 'i'..='p' {
        let err = stack
            .declare(Variable::new(name(&c.to_string()), DataType::INT))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Declaration, "{c} should be reserved");
    }
    declare(&mut stack, "h", DataType::INT, Value::Int(0));
    declare(&mut stack, "q", DataType::INT, Value::Int(0));
}

#[test]
fn test_final_variable_in_frame() {
    let mut stack = ScopeStack::new(8);
    let mut var = Variable::with_flags(name("limit"), DataType::INT, &[Flag::Final]).unwrap();
    var.set_value(Value::Int(3)).unwrap();
    stack.declare(var).unwrap();

    let err = stack
        .lookup_mut("limit")
        .unwrap()
        .set_value(Value::Int(4))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Declaration);
    assert_eq!(read(&stack, "limit"), Value::Int(3));
}

// ==================== LOOP COUNTERS ====================

#[test]
fn test_counters_follow_nesting() {
    let mut stack = ScopeStack::new(8);
    let mut handles = Vec::new();
    for depth in 0..8 {
        let handle = stack.push_loop(format!("repeat{depth}"), depth);
        handles.push(handle);
    }
    let names: Vec<_> = handles
        .iter()
        .map(|h| stack.counter(h).unwrap().to_string())
        .collect();
    assert_eq!(names, ["i", "j", "k", "l", "m", "n", "o", "p"]);
    assert_eq!(read(&stack, "m"), Value::Int(4));

    while let Some(handle) = handles.pop() {
        stack.pop(handle);
    }
    assert_eq!(stack.counters().in_use(), 0);
}

#[test]
fn test_counter_name_is_reused_after_exit() {
    let mut stack = ScopeStack::new(8);
    let first = stack.push_loop("repeat1", 0);
    stack.pop(first);
    let second = stack.push_loop("repeat2", 0);
    assert_eq!(stack.counter(&second).map(Name::as_str), Some("i"));
    stack.pop(second);
}

#[test]
fn test_exhausted_budget_runs_without_counter() {
    let mut stack = ScopeStack::new(2);
    let a = stack.push_loop("a", 0);
    let b = stack.push_loop("b", 0);
    let c = stack.push_loop("c", 0);
    assert!(stack.counter(&c).is_none());
    assert!(!stack.contains("k"));

    stack.pop(c);
    stack.pop(b);
    // The freed name goes to the next loop
    let d = stack.push_loop("d", 0);
    assert_eq!(stack.counter(&d).map(Name::as_str), Some("j"));
    stack.pop(d);
    stack.pop(a);
}

// ==================== LIFO DISCIPLINE ====================

#[test]
#[should_panic(expected = "non-top scope")]
fn test_popping_below_top_panics() {
    let mut stack = ScopeStack::new(8);
    let outer = stack.push("outer");
    let _inner = stack.push("inner");
    stack.pop(outer);
}

#[test]
fn test_height_tracks_pushes() {
    let mut stack = ScopeStack::new(8);
    assert_eq!(stack.top_label(), GLOBAL_SCOPE);
    let a = stack.push("a");
    let b = stack.push("b");
    assert_eq!(stack.height(), 3);
    assert_eq!(b.depth(), 2);
    assert_eq!(stack.top_label(), "b");
    stack.pop(b);
    stack.pop(a);
    assert_eq!(stack.height(), 1);
}
