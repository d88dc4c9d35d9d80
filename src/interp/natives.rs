//! Native functions
//!
//! The table is assembled before a run starts and only read afterwards. Native
//! implementations receive arguments already cast to their parameter types.

use rustc_hash::FxHashMap;

use super::call::{FunctionBody, FunctionDescriptor, Param};
use super::name::Name;
use super::value::Value;
use crate::diagnostics::RuntimeError;
use crate::types::DataType;

/// Signature of a native implementation
pub type NativeFn = fn(&mut Output, &[Value]) -> Result<Option<Value>, RuntimeError>;

/// Dispatch key into a `NativeTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeKey(usize);

/// One native function
#[derive(Debug, Clone)]
pub struct NativeEntry {
    pub name: Name,
    pub params: Vec<DataType>,
    pub return_type: Option<DataType>,
    pub imp: NativeFn,
}

/// Captured program output
#[derive(Debug, Default)]
pub struct Output {
    lines: Vec<String>,
    echo: bool,
}

impl Output {
    pub fn new(echo: bool) -> Self {
        Output {
            lines: Vec::new(),
            echo,
        }
    }

    pub fn write(&mut self, line: String) {
        if self.echo {
            println!("{}", line);
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

/// Fixed mapping from function name to native implementation
#[derive(Debug, Default)]
pub struct NativeTable {
    entries: Vec<NativeEntry>,
    index: FxHashMap<Name, NativeKey>,
}

impl NativeTable {
    /// A table without any natives
    pub fn empty() -> Self {
        Self::default()
    }

    /// The natives every program can call
    pub fn standard() -> Self {
        let n = DataType::NUMBER;
        let entries: [(&str, &[DataType], Option<DataType>, NativeFn); 8] = [
            ("print", &[DataType::DYNAMIC], None, native_print),
            ("len", &[DataType::DYNAMIC], Some(DataType::INT), native_len),
            ("type", &[DataType::DYNAMIC], Some(DataType::TEXT), native_type),
            ("sqrt", &[n], Some(n), native_sqrt),
            ("abs", &[n], Some(n), native_abs),
            ("round", &[n], Some(DataType::INT), native_round),
            ("max", &[n, n], Some(n), native_max),
            ("min", &[n, n], Some(n), native_min),
        ];
        let mut table = Self::empty();
        for (name, params, return_type, imp) in entries {
            match table.register(name, params, return_type, imp) {
                Ok(()) => {}
                Err(e) => unreachable!("standard native `{}` is malformed: {}", name, e),
            }
        }
        table
    }

    /// Add a native. Fails if `name` is not a valid name.
    pub fn register(
        &mut self,
        name: &str,
        params: &[DataType],
        return_type: Option<DataType>,
        imp: NativeFn,
    ) -> Result<(), RuntimeError> {
        let name = Name::new(name)?;
        let key = NativeKey(self.entries.len());
        self.entries.push(NativeEntry {
            name: name.clone(),
            params: params.to_vec(),
            return_type,
            imp,
        });
        self.index.insert(name, key);
        Ok(())
    }

    pub fn key(&self, name: &str) -> Option<NativeKey> {
        self.index.get(name).copied()
    }

    pub fn get(&self, key: NativeKey) -> &NativeEntry {
        &self.entries[key.0]
    }

    /// Call descriptor for the native called `name`
    pub fn descriptor(&self, name: &str) -> Option<FunctionDescriptor> {
        let key = self.key(name)?;
        let entry = self.get(key);
        let params = entry
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                Name::new(format!("arg{}", i)).map(|name| Param {
                    name,
                    ty: Some(*ty),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        Some(FunctionDescriptor {
            name: entry.name.clone(),
            params,
            return_type: entry.return_type,
            body: FunctionBody::Native(key),
        })
    }

    pub fn entries(&self) -> &[NativeEntry] {
        &self.entries
    }
}

fn native_print(out: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    out.write(line);
    Ok(None)
}

fn native_len(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    let len = match &args[0] {
        Value::Array(arr) => arr.len(),
        Value::Text(t) => t.chars().count(),
        other => other.to_string().chars().count(),
    };
    Ok(Some(Value::Int(len as i64)))
}

fn native_type(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::text(args[0].data_type().to_string())))
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        other => other.cast_number(),
    }
}

fn native_sqrt(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(&args[0]).sqrt())))
}

fn native_abs(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(&args[0]).abs())))
}

fn native_round(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(&args[0]).round())))
}

fn native_max(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(&args[0]).max(number(&args[1])))))
}

fn native_min(_: &mut Output, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
    Ok(Some(Value::Number(number(&args[0]).min(number(&args[1])))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = NativeTable::standard();
        for name in ["print", "len", "type", "sqrt", "abs", "round", "max", "min"] {
            assert!(table.key(name).is_some(), "missing native {name}");
        }
        assert!(table.key("exit").is_none());
    }

    #[test]
    fn test_descriptor_shape() {
        let table = NativeTable::standard();
        let max = table.descriptor("max").unwrap();
        assert_eq!(max.params.len(), 2);
        assert_eq!(max.params[0].ty, Some(DataType::NUMBER));
        assert_eq!(max.return_type, Some(DataType::NUMBER));
        assert!(matches!(max.body, FunctionBody::Native(_)));
    }

    #[test]
    fn test_print_captures() {
        let mut out = Output::new(false);
        native_print(&mut out, &[Value::text("hi")]).unwrap();
        assert_eq!(out.lines(), ["hi".to_string()]);
    }

    #[test]
    fn test_len() {
        let mut out = Output::new(false);
        let len = native_len(&mut out, &[Value::text("héllo")]).unwrap();
        assert_eq!(len, Some(Value::Int(5)));
    }

    #[test]
    fn test_invalid_native_name() {
        let mut table = NativeTable::empty();
        assert!(table.register("if", &[], None, native_print).is_err());
    }
}
