//! Invocation engine tests
//!
//! Arity, parameter binding, return contracts, native functions and the call
//! depth limit, driven through `Runtime::call` with small test executors.

use pretty_assertions::assert_eq;

use ember::interp::natives::Output;
use ember::interp::{
    BodyId, Executor, FunctionBody, FunctionDescriptor, Name, NativeTable, Param, Runtime, Value,
    Variable,
};
use ember::{DataType, ErrorKind, RuntimeConfig, RuntimeError};

/// Executor whose single body returns a fixed result
struct Scripted {
    result: Result<Option<Value>, RuntimeError>,
    runs: usize,
    /// Frame label and stack height seen by the last run
    seen: Option<(String, usize)>,
}

impl Scripted {
    fn returning(value: Option<Value>) -> Self {
        Scripted {
            result: Ok(value),
            runs: 0,
            seen: None,
        }
    }

    fn failing(error: RuntimeError) -> Self {
        Scripted {
            result: Err(error),
            runs: 0,
            seen: None,
        }
    }
}

impl Executor for Scripted {
    fn execute_body(
        &mut self,
        runtime: &mut Runtime,
        _body: BodyId,
    ) -> Result<Option<Value>, RuntimeError> {
        self.runs += 1;
        let scopes = runtime.scopes();
        self.seen = Some((scopes.top_label().to_string(), scopes.height()));
        self.result.clone()
    }
}

/// Executor whose body calls the same function again
struct Recursing {
    function: FunctionDescriptor,
    deepest: usize,
}

impl Executor for Recursing {
    fn execute_body(
        &mut self,
        runtime: &mut Runtime,
        _body: BodyId,
    ) -> Result<Option<Value>, RuntimeError> {
        self.deepest = self.deepest.max(runtime.call_depth());
        let function = self.function.clone();
        runtime.call(self, &function, &[] as &[Value])
    }
}

fn name(s: &str) -> Name {
    Name::new(s).unwrap()
}

fn user_fn(
    fn_name: &str,
    params: &[(&str, Option<DataType>)],
    return_type: Option<DataType>,
) -> FunctionDescriptor {
    FunctionDescriptor {
        name: name(fn_name),
        params: params
            .iter()
            .map(|(n, ty)| Param {
                name: name(n),
                ty: *ty,
            })
            .collect(),
        return_type,
        body: FunctionBody::User(BodyId(0)),
    }
}

fn runtime() -> Runtime {
    Runtime::new(RuntimeConfig::quiet())
}

// ==================== ARITY ====================

#[test]
fn test_arity_mismatch_changes_nothing() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let add = user_fn(
        "add",
        &[("a", Some(DataType::NUMBER)), ("b", Some(DataType::NUMBER))],
        Some(DataType::NUMBER),
    );

    let err = rt.call(&mut exec, &add, &[Value::Int(1)]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::IllegalCall {
            function: "add".to_string(),
            expected: 2,
            found: 1
        }
    );
    assert_eq!(rt.scopes().height(), 1);
    assert_eq!(exec.runs, 0);

    let err = rt
        .call(&mut exec, &add, &[Value::Int(1), Value::Int(2), Value::Int(3)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalCall);
    assert_eq!(exec.runs, 0);
}

// ==================== BINDING ====================

#[test]
fn test_body_runs_in_function_frame() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let f = user_fn("greet", &[], None);
    rt.call(&mut exec, &f, &[] as &[Value]).unwrap();
    assert_eq!(exec.seen, Some(("greet".to_string(), 2)));
    assert_eq!(rt.scopes().height(), 1);
}

#[test]
fn test_variables_as_arguments() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(Some(Value::Int(1)));
    let mut arg = Variable::new(name("count"), DataType::INT);
    arg.set_value(Value::Int(9)).unwrap();
    let f = user_fn("f", &[("n", Some(DataType::TEXT))], Some(DataType::INT));
    assert_eq!(rt.call(&mut exec, &f, &[&arg]).unwrap(), Some(Value::Int(1)));
}

#[test]
fn test_argument_cast_failure() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let f = user_fn("f", &[("flag", Some(DataType::BOOL))], None);
    let err = rt.call(&mut exec, &f, &[Value::text("maybe")]).unwrap_err();
    assert!(matches!(
        &err,
        RuntimeError::WrongArgumentKind { function, param, .. } if function == "f" && param == "flag"
    ));
    assert_eq!(err.kind(), ErrorKind::Declaration);
    assert_eq!(exec.runs, 0);
    assert_eq!(rt.scopes().height(), 1);
}

#[test]
fn test_counter_name_as_parameter() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let f = user_fn("f", &[("i", None)], None);
    let err = rt.call(&mut exec, &f, &[Value::Int(0)]).unwrap_err();
    assert!(matches!(err, RuntimeError::ReservedCounterName { .. }));
    assert_eq!(rt.scopes().height(), 1);
}

#[test]
fn test_duplicate_parameter_names() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let f = user_fn("f", &[("a", None), ("a", None)], None);
    let err = rt
        .call(&mut exec, &f, &[Value::Int(0), Value::Int(1)])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Redeclaration { .. }));
    assert_eq!(rt.scopes().height(), 1);
}

// ==================== RETURN CONTRACT ====================

#[test]
fn test_return_value_is_cast() {
    let mut rt = runtime();
    let f = user_fn("whole", &[], Some(DataType::INT));

    let mut exec = Scripted::returning(Some(Value::Number(5.0)));
    assert_eq!(
        rt.call(&mut exec, &f, &[] as &[Value]).unwrap(),
        Some(Value::Int(5))
    );

    let mut exec = Scripted::returning(Some(Value::Number(5.5)));
    let err = rt.call(&mut exec, &f, &[] as &[Value]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Casting);
    assert_eq!(rt.scopes().height(), 1);
}

#[test]
fn test_missing_return_value() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let f = user_fn("f", &[], Some(DataType::TEXT));
    let err = rt.call(&mut exec, &f, &[] as &[Value]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::IllegalReturn {
            function: "f".to_string(),
            expected: DataType::TEXT
        }
    );
}

#[test]
fn test_value_without_return_type() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(Some(Value::Int(1)));
    let f = user_fn("f", &[], None);
    let err = rt.call(&mut exec, &f, &[] as &[Value]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalCodeFormat);
}

#[test]
fn test_procedure_returns_nothing() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let f = user_fn("f", &[], None);
    assert_eq!(rt.call(&mut exec, &f, &[] as &[Value]).unwrap(), None);
}

#[test]
fn test_body_error_pops_frame() {
    let mut rt = runtime();
    let mut exec = Scripted::failing(RuntimeError::UnresolvedName {
        name: "ghost".to_string(),
    });
    let f = user_fn("f", &[("a", None)], None);
    let err = rt.call(&mut exec, &f, &[Value::Int(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedName);
    assert_eq!(rt.scopes().height(), 1);
    assert_eq!(rt.call_depth(), 0);
}

// ==================== NATIVES ====================

fn returns_nothing(_: &mut Output, _: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(None)
}

fn returns_seven(_: &mut Output, _: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Int(7)))
}

fn echo(out: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    out.write(format!("{:?}", args[0]));
    Ok(Some(args[0].clone()))
}

fn native_runtime() -> Runtime {
    let mut table = NativeTable::empty();
    table
        .register("silent", &[], Some(DataType::NUMBER), returns_nothing)
        .unwrap();
    table.register("chatty", &[], None, returns_seven).unwrap();
    table
        .register("echo", &[DataType::NUMBER], Some(DataType::TEXT), echo)
        .unwrap();
    Runtime::with_natives(RuntimeConfig::quiet(), table)
}

#[test]
fn test_native_missing_value_is_code_format() {
    let mut rt = native_runtime();
    let silent = rt.natives().descriptor("silent").unwrap();
    let mut exec = Scripted::returning(None);
    let err = rt.call(&mut exec, &silent, &[] as &[Value]).unwrap_err();
    assert!(matches!(err, RuntimeError::MissingReturnValue { .. }));
    assert_eq!(err.kind(), ErrorKind::IllegalCodeFormat);
}

#[test]
fn test_native_value_without_type_is_code_format() {
    let mut rt = native_runtime();
    let chatty = rt.natives().descriptor("chatty").unwrap();
    let mut exec = Scripted::returning(None);
    let err = rt.call(&mut exec, &chatty, &[] as &[Value]).unwrap_err();
    assert!(matches!(err, RuntimeError::MissingReturnType { .. }));
}

#[test]
fn test_native_args_and_result_are_cast() {
    let mut rt = native_runtime();
    let echo = rt.natives().descriptor("echo").unwrap();
    let mut exec = Scripted::returning(None);
    let result = rt.call(&mut exec, &echo, &[Value::Int(3)]).unwrap();
    assert_eq!(result, Some(Value::text("3")));
    assert_eq!(rt.output(), ["Number(3.0)".to_string()]);
    assert_eq!(exec.runs, 0);
    assert_eq!(rt.scopes().height(), 1);
}

#[test]
fn test_native_arity() {
    let mut rt = native_runtime();
    let echo = rt.natives().descriptor("echo").unwrap();
    let mut exec = Scripted::returning(None);
    let err = rt.call(&mut exec, &echo, &[] as &[Value]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalCall);
    assert!(rt.output().is_empty());
}

#[test]
fn test_native_descriptor_disagreeing_with_table() {
    let mut rt = native_runtime();
    let mut echo = rt.natives().descriptor("echo").unwrap();
    echo.params.clear();
    let mut exec = Scripted::returning(None);
    let err = rt.call(&mut exec, &echo, &[] as &[Value]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::IllegalCall {
            function: "echo".to_string(),
            expected: 1,
            found: 0
        }
    );
    assert!(rt.output().is_empty());
}

#[test]
fn test_standard_natives() {
    let mut rt = runtime();
    let mut exec = Scripted::returning(None);
    let round = rt.natives().descriptor("round").unwrap();
    assert_eq!(
        rt.call(&mut exec, &round, &[Value::Number(2.6)]).unwrap(),
        Some(Value::Int(3))
    );
    let max = rt.natives().descriptor("max").unwrap();
    assert_eq!(
        rt.call(&mut exec, &max, &[Value::Int(2), Value::text("10")])
            .unwrap(),
        Some(Value::Number(10.0))
    );
    let print = rt.natives().descriptor("print").unwrap();
    assert_eq!(rt.call(&mut exec, &print, &[Value::text("hi")]).unwrap(), None);
    assert_eq!(rt.take_output(), vec!["hi".to_string()]);
}

// ==================== CALL DEPTH ====================

#[test]
fn test_runaway_recursion_is_an_error() {
    let config = RuntimeConfig {
        max_call_depth: 16,
        ..RuntimeConfig::quiet()
    };
    let mut rt = Runtime::new(config);
    let function = user_fn("forever", &[], None);
    let mut exec = Recursing {
        function: function.clone(),
        deepest: 0,
    };
    let err = rt.call(&mut exec, &function, &[] as &[Value]).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::CallDepth {
            function: "forever".to_string(),
            limit: 16
        }
    );
    assert_eq!(exec.deepest, 16);
    assert_eq!(rt.scopes().height(), 1);
    assert_eq!(rt.call_depth(), 0);
}
