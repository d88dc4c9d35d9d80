//! Function invocation
//!
//! A call runs in four steps:
//!
//! 1. the argument count is checked against the parameter list, before any
//!    state changes
//! 2. a frame is pushed and each argument is cast to its parameter type and
//!    declared in it (natives get the cast values directly, without a frame)
//! 3. the body runs
//! 4. the produced value is checked against the return type and the frame is
//!    popped, whether or not an earlier step failed

use super::name::Name;
use super::natives::NativeKey;
use super::runtime::Runtime;
use super::stack::ensure_sufficient_stack;
use super::value::Value;
use super::variable::Variable;
use crate::diagnostics::{CastError, RuntimeError};
use crate::types::DataType;

/// Index of a user function body inside its executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u32);

/// What runs when a function is called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionBody {
    /// A body in the program, run by an `Executor`
    User(BodyId),
    /// An entry of the native table
    Native(NativeKey),
}

/// A declared parameter. Untyped parameters accept any value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Name,
    pub ty: Option<DataType>,
}

impl Param {
    pub fn contract(&self) -> DataType {
        self.ty.unwrap_or(DataType::DYNAMIC)
    }
}

/// Everything needed to invoke a function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub name: Name,
    pub params: Vec<Param>,
    pub return_type: Option<DataType>,
    pub body: FunctionBody,
}

impl FunctionDescriptor {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::Native(_))
    }
}

/// Anything an argument value can be read from
pub trait ValueHolder {
    fn get_value(&self) -> Value;
}

impl ValueHolder for Value {
    fn get_value(&self) -> Value {
        self.clone()
    }
}

impl ValueHolder for Variable {
    fn get_value(&self) -> Value {
        Variable::get_value(self)
    }
}

impl<T: ValueHolder + ?Sized> ValueHolder for &T {
    fn get_value(&self) -> Value {
        (**self).get_value()
    }
}

/// Runs user function bodies
pub trait Executor {
    /// Execute `body` in the frame the call just pushed. `Ok(None)` means the
    /// body finished without returning a value.
    fn execute_body(
        &mut self,
        runtime: &mut Runtime,
        body: BodyId,
    ) -> Result<Option<Value>, RuntimeError>;
}

impl Runtime {
    /// Invoke `function` with `args`
    pub fn call<E, A>(
        &mut self,
        exec: &mut E,
        function: &FunctionDescriptor,
        args: &[A],
    ) -> Result<Option<Value>, RuntimeError>
    where
        E: Executor + ?Sized,
        A: ValueHolder,
    {
        if args.len() != function.arity() {
            return Err(RuntimeError::IllegalCall {
                function: function.name.to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::CallDepth {
                function: function.name.to_string(),
                limit: self.config.max_call_depth,
            });
        }

        tracing::debug!(
            function = %function.name,
            args = args.len(),
            depth = self.call_depth,
            "call"
        );
        let result = ensure_sufficient_stack(|| match function.body {
            FunctionBody::User(body) => self.call_user(exec, function, body, args),
            FunctionBody::Native(key) => self.call_native(function, key, args),
        });
        match &result {
            Ok(Some(value)) => tracing::debug!(function = %function.name, %value, "returned"),
            Ok(None) => tracing::debug!(function = %function.name, "returned nothing"),
            Err(e) => tracing::debug!(function = %function.name, error = %e, "failed"),
        }
        result
    }

    fn call_user<E, A>(
        &mut self,
        exec: &mut E,
        function: &FunctionDescriptor,
        body: BodyId,
        args: &[A],
    ) -> Result<Option<Value>, RuntimeError>
    where
        E: Executor + ?Sized,
        A: ValueHolder,
    {
        let frame = self.scopes.push(function.name.as_str());
        self.call_depth += 1;

        let result = self
            .bind_params(function, args)
            .and_then(|()| exec.execute_body(self, body))
            .and_then(|produced| user_return(function, produced));

        self.call_depth -= 1;
        self.scopes.pop(frame);
        result
    }

    fn bind_params<A: ValueHolder>(
        &mut self,
        function: &FunctionDescriptor,
        args: &[A],
    ) -> Result<(), RuntimeError> {
        for (param, arg) in function.params.iter().zip(args) {
            let value = cast_argument(function, param, arg)?;
            let mut var = Variable::new(param.name.clone(), param.contract());
            var.set_value(value)?;
            self.scopes.declare(var)?;
        }
        Ok(())
    }

    fn call_native<A: ValueHolder>(
        &mut self,
        function: &FunctionDescriptor,
        key: NativeKey,
        args: &[A],
    ) -> Result<Option<Value>, RuntimeError> {
        let bound = function
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| cast_argument(function, param, arg))
            .collect::<Result<Vec<_>, _>>()?;
        let entry = self.natives.get(key);
        if bound.len() != entry.params.len() {
            return Err(RuntimeError::IllegalCall {
                function: function.name.to_string(),
                expected: entry.params.len(),
                found: bound.len(),
            });
        }
        let produced = (entry.imp)(&mut self.output, &bound)?;
        native_return(function, produced)
    }
}

fn cast_argument<A: ValueHolder>(
    function: &FunctionDescriptor,
    param: &Param,
    arg: &A,
) -> Result<Value, RuntimeError> {
    arg.get_value()
        .cast_to(param.contract())
        .map_err(|cause: CastError| RuntimeError::WrongArgumentKind {
            function: function.name.to_string(),
            param: param.name.to_string(),
            cause,
        })
}

/// A returned `null` counts as no value
fn present(produced: Option<Value>) -> Option<Value> {
    produced.filter(|v| !v.is_null())
}

fn user_return(
    function: &FunctionDescriptor,
    produced: Option<Value>,
) -> Result<Option<Value>, RuntimeError> {
    match (present(produced), function.return_type) {
        (None, None) => Ok(None),
        (None, Some(expected)) => Err(RuntimeError::IllegalReturn {
            function: function.name.to_string(),
            expected,
        }),
        (Some(value), Some(ty)) => Ok(Some(value.cast_to(ty)?)),
        (Some(_), None) => Err(RuntimeError::MissingReturnType {
            function: function.name.to_string(),
        }),
    }
}

fn native_return(
    function: &FunctionDescriptor,
    produced: Option<Value>,
) -> Result<Option<Value>, RuntimeError> {
    match (present(produced), function.return_type) {
        (None, None) => Ok(None),
        (None, Some(declared)) => Err(RuntimeError::MissingReturnValue {
            function: function.name.to_string(),
            declared,
        }),
        (Some(value), Some(ty)) => Ok(Some(value.cast_to(ty)?)),
        (Some(_), None) => Err(RuntimeError::MissingReturnType {
            function: function.name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::diagnostics::ErrorKind;

    /// Returns a fixed value and records what the frame looked like
    struct Fixed {
        value: Option<Value>,
        seen: Vec<(String, Value)>,
    }

    impl Executor for Fixed {
        fn execute_body(
            &mut self,
            runtime: &mut Runtime,
            _body: BodyId,
        ) -> Result<Option<Value>, RuntimeError> {
            let frame = runtime.scopes().frames().last().unwrap();
            self.seen = frame
                .variables()
                .map(|v| (v.name().to_string(), v.get_value()))
                .collect();
            Ok(self.value.clone())
        }
    }

    fn fixed(value: Option<Value>) -> Fixed {
        Fixed {
            value,
            seen: Vec::new(),
        }
    }

    fn user(name: &str, params: &[(&str, Option<DataType>)], ret: Option<DataType>) -> FunctionDescriptor {
        FunctionDescriptor {
            name: Name::new(name).unwrap(),
            params: params
                .iter()
                .map(|(n, ty)| Param {
                    name: Name::new(n).unwrap(),
                    ty: *ty,
                })
                .collect(),
            return_type: ret,
            body: FunctionBody::User(BodyId(0)),
        }
    }

    #[test]
    fn test_params_are_bound_and_cast() {
        let mut rt = Runtime::new(RuntimeConfig::quiet());
        let mut exec = fixed(None);
        let f = user("f", &[("a", Some(DataType::NUMBER)), ("b", None)], None);
        rt.call(&mut exec, &f, &[Value::Int(2), Value::text("x")]).unwrap();
        assert_eq!(
            exec.seen,
            vec![
                ("a".to_string(), Value::Number(2.0)),
                ("b".to_string(), Value::text("x"))
            ]
        );
        assert_eq!(rt.scopes().height(), 1);
    }

    #[test]
    fn test_arity_checked_before_push() {
        let mut rt = Runtime::new(RuntimeConfig::quiet());
        let mut exec = fixed(None);
        let f = user("f", &[("a", None)], None);
        let err = rt.call::<_, Value>(&mut exec, &f, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalCall);
        assert_eq!(rt.scopes().height(), 1);
    }

    #[test]
    fn test_null_return_counts_as_absent() {
        let mut rt = Runtime::new(RuntimeConfig::quiet());
        let mut exec = fixed(Some(Value::Null));
        let f = user("f", &[], Some(DataType::OBJECT));
        let err = rt.call::<_, Value>(&mut exec, &f, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalReturn);
    }

    #[test]
    fn test_value_holders() {
        let mut var = Variable::new(Name::new("v").unwrap(), DataType::INT);
        var.set_value(Value::Int(4)).unwrap();
        assert_eq!(ValueHolder::get_value(&var), Value::Int(4));
        assert_eq!(ValueHolder::get_value(&&var), Value::Int(4));
    }
}
