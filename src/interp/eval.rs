//! Tree-walking interpreter for HIR
//!
//! Runs the statements of `main` and of user function bodies. Calls go
//! through `Runtime::call`; every block runs in its own labelled frame.

use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::diagnostics::{CastError, RuntimeError};
use crate::hir::*;
use crate::types::{DataType, Flag, MAIN, ScalarType};

use super::call::{BodyId, Executor, FunctionBody, FunctionDescriptor, Param};
use super::name::Name;
use super::natives::NativeTable;
use super::runtime::Runtime;
use super::stack::ensure_sufficient_stack;
use super::value::{ControlFlow, Value};
use super::variable::Variable;

/// Scope named when a function is declared twice
const FUNCTIONS_SCOPE: &str = "functions";

/// Tree-walking interpreter
#[derive(Debug)]
pub struct Interpreter {
    /// Hoisted function declarations (by name)
    functions: IndexMap<Name, FunctionDescriptor>,
    /// User function bodies, indexed by `BodyId`
    bodies: Vec<Rc<HirBlock>>,
    main: Rc<HirBlock>,
}

impl Interpreter {
    /// Hoist every function of `hir`. Functions flagged `native` bind to the
    /// entry of the same name in `natives`.
    pub fn new(hir: &Hir, natives: &NativeTable) -> Result<Self, RuntimeError> {
        let mut interp = Interpreter {
            functions: IndexMap::new(),
            bodies: Vec::new(),
            main: Rc::new(hir.main.clone()),
        };
        for func in &hir.functions {
            interp
                .declare_function(func, natives)
                .map_err(|e| locate(e, func.line))?;
        }
        tracing::debug!(functions = interp.functions.len(), "hoisted functions");
        Ok(interp)
    }

    fn declare_function(&mut self, func: &HirFn, natives: &NativeTable) -> Result<(), RuntimeError> {
        if let Some(flag) = func.flags.iter().find(|f| **f != Flag::Native) {
            return Err(RuntimeError::UnexpectedFlag {
                flag: flag.to_string(),
                target: format!("the function `{}`", func.name),
            });
        }
        if self.functions.contains_key(&func.name) {
            return Err(RuntimeError::Redeclaration {
                name: func.name.to_string(),
                scope: FUNCTIONS_SCOPE.to_string(),
            });
        }

        let mut params: Vec<Param> = func
            .params
            .iter()
            .map(|p| Param {
                name: p.name.clone(),
                ty: p.ty,
            })
            .collect();

        let body = if func.flags.contains(&Flag::Native) {
            let key = natives
                .key(func.name.as_str())
                .ok_or_else(|| RuntimeError::UnresolvedName {
                    name: func.name.to_string(),
                })?;
            let entry = natives.get(key);
            if entry.params.len() != params.len() {
                return Err(RuntimeError::NativeSignature {
                    function: func.name.to_string(),
                    expected: entry.params.len(),
                    declared: params.len(),
                });
            }
            // Untyped parameters take the native's own types
            for (param, ty) in params.iter_mut().zip(&entry.params) {
                if param.ty.is_none() {
                    param.ty = Some(*ty);
                }
            }
            FunctionBody::Native(key)
        } else {
            let id = BodyId(self.bodies.len() as u32);
            self.bodies.push(Rc::new(func.body.clone()));
            FunctionBody::User(id)
        };

        let descriptor = FunctionDescriptor {
            name: func.name.clone(),
            params,
            return_type: func.return_type,
            body,
        };
        self.functions.insert(func.name.clone(), descriptor);
        Ok(())
    }

    /// Hoisted function called `name`
    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.values()
    }

    /// Run `main` in its own frame. Returns what `main` returned, if anything.
    pub fn interpret(&mut self, rt: &mut Runtime) -> Result<Option<Value>, RuntimeError> {
        let main = Rc::clone(&self.main);
        let frame = rt.scopes_mut().push(MAIN);
        let result = self
            .exec_stmts(rt, &main.stmts)
            .and_then(finish_body);
        rt.scopes_mut().pop(frame);
        result
    }

    /// Execute statements in the current frame
    fn exec_stmts(
        &mut self,
        rt: &mut Runtime,
        stmts: &[HirStmt],
    ) -> Result<Option<ControlFlow>, RuntimeError> {
        for stmt in stmts {
            let flow = self
                .exec_stmt(rt, stmt)
                .map_err(|e| locate(e, stmt.line))?;
            if flow.is_some() {
                return Ok(flow);
            }
        }
        Ok(None)
    }

    /// Execute a block in a fresh frame
    fn exec_block(
        &mut self,
        rt: &mut Runtime,
        block: &HirBlock,
        label: String,
    ) -> Result<Option<ControlFlow>, RuntimeError> {
        let frame = rt.scopes_mut().push(label);
        let result = self.exec_stmts(rt, &block.stmts);
        rt.scopes_mut().pop(frame);
        result
    }

    fn exec_stmt(
        &mut self,
        rt: &mut Runtime,
        stmt: &HirStmt,
    ) -> Result<Option<ControlFlow>, RuntimeError> {
        ensure_sufficient_stack(|| self.exec_stmt_inner(rt, stmt))
    }

    fn exec_stmt_inner(
        &mut self,
        rt: &mut Runtime,
        stmt: &HirStmt,
    ) -> Result<Option<ControlFlow>, RuntimeError> {
        match &stmt.kind {
            HirStmtKind::Declare {
                flags,
                ty,
                name,
                value,
            } => {
                let mut var =
                    Variable::with_flags(name.clone(), ty.unwrap_or(DataType::DYNAMIC), flags)?;
                if let Some(init) = value {
                    let value = self.eval_expr(rt, init)?;
                    var.set_value(value)?;
                }
                rt.scopes_mut().declare(var)?;
                Ok(None)
            }

            HirStmtKind::Assign { name, value } => {
                let value = self.eval_expr(rt, value)?;
                rt.scopes_mut().lookup_mut(name.as_str())?.set_value(value)?;
                Ok(None)
            }

            HirStmtKind::Expr { value } => {
                self.eval_expr(rt, value)?;
                Ok(None)
            }

            HirStmtKind::If {
                condition,
                then,
                otherwise,
            } => {
                if self.eval_condition(rt, condition)? {
                    self.exec_block(rt, then, format!("if{}", stmt.line))
                } else if let Some(otherwise) = otherwise {
                    self.exec_block(rt, otherwise, format!("else{}", stmt.line))
                } else {
                    Ok(None)
                }
            }

            HirStmtKind::While { condition, body } => {
                while self.eval_condition(rt, condition)? {
                    match self.exec_block(rt, body, format!("while{}", stmt.line))? {
                        Some(ControlFlow::Break) => break,
                        Some(ControlFlow::Continue) | None => {}
                        Some(flow @ ControlFlow::Return(_)) => return Ok(Some(flow)),
                    }
                }
                Ok(None)
            }

            HirStmtKind::Repeat { from, to, body } => {
                let from = self.eval_expr(rt, from)?.cast_int()?;
                let to = self.eval_expr(rt, to)?.cast_int()?;
                let label = format!("repeat{}", stmt.line);
                let frame = rt.scopes_mut().push_loop(label.as_str(), from);
                let counter = rt.scopes().counter(&frame).cloned();
                let result = self.exec_repeat(rt, from, to, counter.as_ref(), body, &label);
                rt.scopes_mut().pop(frame);
                result
            }

            HirStmtKind::Return { value } => {
                let value = match value {
                    Some(expr) => Some(self.eval_expr(rt, expr)?),
                    None => None,
                };
                Ok(Some(ControlFlow::Return(value)))
            }

            HirStmtKind::Break => Ok(Some(ControlFlow::Break)),
            HirStmtKind::Continue => Ok(Some(ControlFlow::Continue)),

            HirStmtKind::Block { body } => self.exec_block(rt, body, format!("block{}", stmt.line)),
        }
    }

    /// Body of a counted loop. The loop frame is already pushed.
    fn exec_repeat(
        &mut self,
        rt: &mut Runtime,
        from: i64,
        to: i64,
        counter: Option<&Name>,
        body: &HirBlock,
        label: &str,
    ) -> Result<Option<ControlFlow>, RuntimeError> {
        let mut current = from;
        while current <= to {
            match self.exec_block(rt, body, format!("{}-body", label))? {
                Some(ControlFlow::Break) => break,
                Some(ControlFlow::Continue) | None => {}
                Some(flow @ ControlFlow::Return(_)) => return Ok(Some(flow)),
            }
            current = match current.checked_add(1) {
                Some(next) => next,
                None => break,
            };
            if let Some(counter) = counter {
                rt.scopes_mut()
                    .lookup_mut(counter.as_str())?
                    .set_value(Value::Int(current))?;
            }
        }
        Ok(None)
    }

    fn eval_condition(&mut self, rt: &mut Runtime, expr: &HirExpr) -> Result<bool, RuntimeError> {
        Ok(self.eval_expr(rt, expr)?.cast_bool()?)
    }

    /// Evaluate an expression
    fn eval_expr(&mut self, rt: &mut Runtime, expr: &HirExpr) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_expr_inner(rt, expr))
    }

    fn eval_expr_inner(&mut self, rt: &mut Runtime, expr: &HirExpr) -> Result<Value, RuntimeError> {
        match expr {
            HirExpr::Literal { value } => Ok(eval_literal(value)),

            HirExpr::Name { name } => self.read_name(rt, name),

            HirExpr::Array { items } => {
                let items = items
                    .iter()
                    .map(|item| self.eval_expr(rt, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(array_literal(items))
            }

            HirExpr::Unary { op, operand } => {
                let value = self.eval_expr(rt, operand)?;
                eval_unary(*op, value)
            }

            // Short-circuit
            HirExpr::Binary {
                op: op @ (HirBinaryOp::And | HirBinaryOp::Or),
                left,
                right,
            } => {
                let lhs = self.eval_expr(rt, left)?.cast_bool()?;
                let decided = match op {
                    HirBinaryOp::And => !lhs,
                    _ => lhs,
                };
                if decided {
                    return Ok(Value::Bool(lhs));
                }
                Ok(Value::Bool(self.eval_expr(rt, right)?.cast_bool()?))
            }

            HirExpr::Binary { op, left, right } => {
                let lhs = self.eval_expr(rt, left)?;
                let rhs = self.eval_expr(rt, right)?;
                eval_binary(*op, lhs, rhs)
            }

            HirExpr::Call { callee, args } => self.eval_call(rt, callee, args),
        }
    }

    /// A variable's value, or a reference to the function of that name
    fn read_name(&self, rt: &Runtime, name: &Name) -> Result<Value, RuntimeError> {
        match rt.scopes().lookup(name.as_str()) {
            Ok(var) => Ok(var.get_value()),
            Err(_) if self.is_function(rt, name.as_str()) => Ok(Value::Def(name.clone())),
            Err(e) => Err(e),
        }
    }

    fn is_function(&self, rt: &Runtime, name: &str) -> bool {
        self.functions.contains_key(name) || rt.natives().key(name).is_some()
    }

    /// Find what `callee` refers to. A `def` variable of that name wins over
    /// a function of that name.
    fn resolve_callee(&self, rt: &Runtime, callee: &Name) -> Result<FunctionDescriptor, RuntimeError> {
        let target = match rt.scopes().lookup(callee.as_str()) {
            Ok(var) => match var.get_value() {
                Value::Def(target) => target,
                _ => {
                    return Err(RuntimeError::NotCallable {
                        name: callee.to_string(),
                    });
                }
            },
            Err(_) => callee.clone(),
        };
        self.functions
            .get(&target)
            .cloned()
            .or_else(|| rt.natives().descriptor(target.as_str()))
            .ok_or_else(|| RuntimeError::UnresolvedName {
                name: target.to_string(),
            })
    }

    fn eval_call(
        &mut self,
        rt: &mut Runtime,
        callee: &Name,
        args: &[HirExpr],
    ) -> Result<Value, RuntimeError> {
        let function = self.resolve_callee(rt, callee)?;
        let args = args
            .iter()
            .map(|arg| self.eval_expr(rt, arg))
            .collect::<Result<Vec<_>, _>>()?;
        let value = rt.call(self, &function, &args)?;
        Ok(value.unwrap_or(Value::Null))
    }
}

impl Executor for Interpreter {
    fn execute_body(
        &mut self,
        rt: &mut Runtime,
        body: BodyId,
    ) -> Result<Option<Value>, RuntimeError> {
        let block = Rc::clone(&self.bodies[body.0 as usize]);
        self.exec_stmts(rt, &block.stmts).and_then(finish_body)
    }
}

/// What a finished body produced
fn finish_body(flow: Option<ControlFlow>) -> Result<Option<Value>, RuntimeError> {
    match flow {
        None => Ok(None),
        Some(ControlFlow::Return(value)) => Ok(value),
        Some(ControlFlow::Break) => Err(RuntimeError::StrayControl { keyword: "break" }),
        Some(ControlFlow::Continue) => Err(RuntimeError::StrayControl {
            keyword: "continue",
        }),
    }
}

fn locate(error: RuntimeError, line: u32) -> RuntimeError {
    if line == 0 { error } else { error.at_line(line) }
}

fn eval_literal(lit: &HirLiteral) -> Value {
    match lit {
        HirLiteral::Null => Value::Null,
        HirLiteral::Bool(b) => Value::Bool(*b),
        HirLiteral::Int(n) => Value::Int(*n),
        HirLiteral::Number(n) => Value::Number(*n),
        HirLiteral::Char(c) => Value::Char(*c),
        HirLiteral::Text(s) => Value::text(s.as_str()),
    }
}

/// Array of the items' common scalar kind, or a `var[]` for mixed items
fn array_literal(items: Vec<Value>) -> Value {
    let elem = match items.first().map(Value::data_type) {
        Some(DataType::Scalar(first))
            if items.iter().all(|v| v.data_type() == DataType::Scalar(first)) =>
        {
            first
        }
        _ => ScalarType::Dynamic,
    };
    Value::array(elem, items)
}

/// Evaluate a binary operation
fn eval_binary(op: HirBinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match op {
        HirBinaryOp::Add if matches!(lhs, Value::Text(_)) || matches!(rhs, Value::Text(_)) => {
            Ok(Value::text(format!("{}{}", lhs.cast_text(), rhs.cast_text())))
        }
        HirBinaryOp::Add => Ok(arithmetic(&lhs, &rhs, i64::checked_add, |a, b| a + b)),
        HirBinaryOp::Sub => Ok(arithmetic(&lhs, &rhs, i64::checked_sub, |a, b| a - b)),
        HirBinaryOp::Mul => Ok(arithmetic(&lhs, &rhs, i64::checked_mul, |a, b| a * b)),
        HirBinaryOp::Rem => Ok(arithmetic(&lhs, &rhs, i64::checked_rem, |a, b| a % b)),
        // Always a number, even for two ints
        HirBinaryOp::Div => Ok(Value::Number(lhs.cast_number() / rhs.cast_number())),
        HirBinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        HirBinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        HirBinaryOp::Lt => compare(&lhs, &rhs, Ordering::is_lt),
        HirBinaryOp::Le => compare(&lhs, &rhs, Ordering::is_le),
        HirBinaryOp::Gt => compare(&lhs, &rhs, Ordering::is_gt),
        HirBinaryOp::Ge => compare(&lhs, &rhs, Ordering::is_ge),
        HirBinaryOp::And => Ok(Value::Bool(lhs.cast_bool()? && rhs.cast_bool()?)),
        HirBinaryOp::Or => Ok(Value::Bool(lhs.cast_bool()? || rhs.cast_bool()?)),
    }
}

/// Exact on two ints that do not overflow, otherwise on their numeric readings
fn arithmetic(
    lhs: &Value,
    rhs: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    num_op: fn(f64, f64) -> f64,
) -> Value {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        if let Some(n) = int_op(*a, *b) {
            return Value::Int(n);
        }
    }
    Value::Number(num_op(lhs.cast_number(), rhs.cast_number()))
}

fn compare(lhs: &Value, rhs: &Value, holds: fn(Ordering) -> bool) -> Result<Value, RuntimeError> {
    let numeric = |v: &Value| matches!(v, Value::Int(_) | Value::Number(_));
    let ordering = match lhs.partial_cmp(rhs) {
        Some(ordering) => Some(ordering),
        // NaN is unordered, not an error
        None if numeric(lhs) && numeric(rhs) => None,
        None => {
            return Err(CastError::Unsupported {
                from: rhs.data_type(),
                to: lhs.data_type(),
            }
            .into());
        }
    };
    Ok(Value::Bool(ordering.is_some_and(holds)))
}

/// Evaluate a unary operation
fn eval_unary(op: HirUnaryOp, value: Value) -> Result<Value, RuntimeError> {
    match op {
        HirUnaryOp::Not => Ok(Value::Bool(!value.cast_bool()?)),
        HirUnaryOp::Neg => match value {
            Value::Int(n) => Ok(n
                .checked_neg()
                .map_or(Value::Number(-(n as f64)), Value::Int)),
            other => Ok(Value::Number(-other.cast_number())),
        },
    }
}
