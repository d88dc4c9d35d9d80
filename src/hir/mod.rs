//! High-level Intermediate Representation (HIR)
//!
//! HIR is the executable node tree a parser hands to the runtime. It contains:
//! - Function declarations with their parameter and return contracts
//! - The statements of `main`
//! - The source line of every statement, for error reporting
//!
//! Programs are read from JSON:
//!
//! ```json
//! {
//!   "functions": [{
//!     "name": "add",
//!     "params": [{ "name": "a", "ty": "number" }, { "name": "b", "ty": "number" }],
//!     "return_type": "number",
//!     "body": [{ "stmt": "return", "line": 2, "value": {
//!       "expr": "binary", "op": "add",
//!       "left": { "expr": "name", "name": "a" },
//!       "right": { "expr": "name", "name": "b" }
//!     }}]
//!   }],
//!   "main": [{ "stmt": "return", "line": 5, "value": {
//!     "expr": "call", "callee": "add",
//!     "args": [{ "expr": "literal", "value": { "int": 2 } }, { "expr": "literal", "value": { "int": 3 } }]
//!   }}]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::interp::name::Name;
use crate::types::{DataType, Flag};

/// HIR root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hir {
    #[serde(default)]
    pub functions: Vec<HirFn>,
    #[serde(default)]
    pub main: HirBlock,
}

impl Hir {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

// ==================== FUNCTIONS ====================

/// HIR function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirFn {
    pub name: Name,
    /// `native` binds the declaration to the runtime's native table
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(default)]
    pub params: Vec<HirParam>,
    #[serde(default)]
    pub return_type: Option<DataType>,
    #[serde(default)]
    pub body: HirBlock,
    #[serde(default)]
    pub line: u32,
}

/// HIR parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirParam {
    pub name: Name,
    #[serde(default)]
    pub ty: Option<DataType>,
}

// ==================== BLOCKS & STATEMENTS ====================

/// HIR block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HirBlock {
    pub stmts: Vec<HirStmt>,
}

impl HirBlock {
    pub fn new(stmts: Vec<HirStmt>) -> Self {
        HirBlock { stmts }
    }
}

/// HIR statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HirStmt {
    #[serde(default)]
    pub line: u32,
    #[serde(flatten)]
    pub kind: HirStmtKind,
}

impl HirStmt {
    pub fn new(line: u32, kind: HirStmtKind) -> Self {
        HirStmt { line, kind }
    }
}

/// HIR statement kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum HirStmtKind {
    /// Variable declaration; an absent type means `var`
    Declare {
        #[serde(default)]
        flags: Vec<Flag>,
        #[serde(default)]
        ty: Option<DataType>,
        name: Name,
        #[serde(default)]
        value: Option<HirExpr>,
    },
    /// Assignment to the innermost variable of that name
    Assign { name: Name, value: HirExpr },
    /// Expression evaluated for its effects
    Expr { value: HirExpr },
    /// Conditional; each branch runs in its own frame
    If {
        condition: HirExpr,
        then: HirBlock,
        #[serde(default, rename = "else")]
        otherwise: Option<HirBlock>,
    },
    /// Loop while the condition holds
    While { condition: HirExpr, body: HirBlock },
    /// Counted loop from `from` to `to`, both inclusive, with a loop counter
    Repeat {
        from: HirExpr,
        to: HirExpr,
        body: HirBlock,
    },
    /// Return
    Return {
        #[serde(default)]
        value: Option<HirExpr>,
    },
    /// Break
    Break,
    /// Continue
    Continue,
    /// Nested block
    Block { body: HirBlock },
}

// ==================== EXPRESSIONS ====================

/// HIR expression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum HirExpr {
    /// Literal value
    Literal { value: HirLiteral },
    /// Variable read, or a reference to a function
    Name { name: Name },
    /// Array literal; the element kind is the items' common kind
    Array { items: Vec<HirExpr> },
    /// Unary operation
    Unary { op: HirUnaryOp, operand: Box<HirExpr> },
    /// Binary operation
    Binary {
        op: HirBinaryOp,
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    /// Function call through a function name or a `def` variable
    Call { callee: Name, args: Vec<HirExpr> },
}

impl HirExpr {
    pub fn literal(value: HirLiteral) -> Self {
        HirExpr::Literal { value }
    }

    pub fn name(name: Name) -> Self {
        HirExpr::Name { name }
    }

    pub fn binary(op: HirBinaryOp, left: HirExpr, right: HirExpr) -> Self {
        HirExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Name, args: Vec<HirExpr>) -> Self {
        HirExpr::Call { callee, args }
    }
}

/// HIR literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HirLiteral {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Char(char),
    Text(String),
}

/// HIR binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HirBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// HIR unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HirUnaryOp {
    Neg,
    Not,
}
