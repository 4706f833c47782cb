//! The serialized IR document.
//!
//! A [`Document`] is the unit exchanged between an elaborator and a backend:
//! a flat JSON object with `ports`, `nets`, `regs`, `processes`, `gates`, and
//! optional `memories`. Every key except the expression `type` discriminant
//! maps one-to-one onto the structs here; [`Document::from_json`] only checks
//! the schema, leaving reference resolution and semantic validation to
//! [`Netlist::parse`](crate::Netlist::parse).

use serde::{Deserialize, Serialize};

use crate::error::IrError;

/// The direction of a port, from the perspective of the simulated design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Driven from outside the design via `poke`.
    #[serde(rename = "in")]
    In,
    /// Driven by the design, observed via `peek`.
    #[serde(rename = "out")]
    Out,
}

/// A port declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDecl {
    /// Scope-qualified port name, unique within the document.
    pub name: String,
    /// Port direction.
    pub direction: Direction,
    /// Bit width, in `[1, 64]`.
    pub width: u32,
}

/// An internal net (wire) declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetDecl {
    /// Scope-qualified net name.
    pub name: String,
    /// Bit width, in `[1, 64]`.
    pub width: u32,
}

/// A register declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegDecl {
    /// Scope-qualified register name.
    pub name: String,
    /// Bit width, in `[1, 64]`.
    pub width: u32,
    /// Value the register holds at construction and after a reset.
    #[serde(default)]
    pub reset_value: u64,
}

/// One assignment inside a process body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// Name of the driven signal.
    pub target: String,
    /// The driving expression.
    pub expr: Expr,
}

/// A process: a named group of assignments sharing one clock domain.
///
/// When `clocked` is true the statements are sequential: each target samples
/// its expression on the rising edge of `clock`. When false the statements
/// are ordinary combinational assignments and `clock` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDecl {
    /// Process name, unique within the document.
    pub name: String,
    /// Name of the clock signal for a clocked process.
    pub clock: String,
    /// Whether the statements commit on clock edges.
    pub clocked: bool,
    /// The assignments in this process.
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// A continuous combinational assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecl {
    /// Name of the driven signal.
    pub target: String,
    /// The driving expression.
    pub expr: Expr,
}

/// A memory declaration: `depth` words of `width` bits each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDecl {
    /// Scope-qualified memory name.
    pub name: String,
    /// Number of addressable words, at least 1.
    pub depth: usize,
    /// Word width, in `[1, 64]`.
    pub width: u32,
    /// Initial contents, starting at address 0; the remainder is zero.
    #[serde(default)]
    pub initial_data: Vec<u64>,
}

/// A serialized expression tree node.
///
/// Operators are carried as strings in the wire format (`"&"`, `"<<"`,
/// `"reduce_xor"`, ...) and mapped onto typed operators during linking, so an
/// unknown operator is a validation error rather than a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    /// The current value of a named signal.
    Signal {
        /// The referenced signal name.
        name: String,
        /// Width of the reference.
        width: u32,
    },
    /// A constant.
    Literal {
        /// The constant value, masked to `width` bits.
        value: i64,
        /// Width of the constant.
        width: u32,
    },
    /// A unary operator application.
    UnaryOp {
        /// Operator: `~`, `reduce_and`, `reduce_or`, or `reduce_xor`.
        op: String,
        /// The operand.
        operand: Box<Expr>,
        /// Result width.
        width: u32,
    },
    /// A binary operator application.
    BinaryOp {
        /// Operator: one of `& | ^ + - * / % << >> == != < > <= >=`.
        op: String,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Result width.
        width: u32,
    },
    /// A two-way select.
    Mux {
        /// Select condition; nonzero chooses `when_true`.
        condition: Box<Expr>,
        /// Value when the condition is nonzero.
        when_true: Box<Expr>,
        /// Value when the condition is zero.
        when_false: Box<Expr>,
        /// Result width.
        width: u32,
    },
    /// A bit slice `base[high:low]`.
    Slice {
        /// The expression being sliced.
        base: Box<Expr>,
        /// Low bit index, inclusive.
        low: u32,
        /// High bit index, inclusive.
        high: u32,
        /// Result width, `high - low + 1`.
        width: u32,
    },
    /// Bit concatenation, parts listed most-significant first.
    Concat {
        /// The concatenated parts.
        parts: Vec<Expr>,
        /// Total result width.
        width: u32,
    },
    /// Width adjustment: truncate or zero-extend to `width` bits.
    Resize {
        /// The resized expression.
        expr: Box<Expr>,
        /// Target width.
        width: u32,
    },
    /// An asynchronous memory read.
    MemRead {
        /// The referenced memory name.
        memory: String,
        /// Word address; taken modulo the memory depth.
        addr: Box<Expr>,
        /// Result width.
        width: u32,
    },
}

impl Expr {
    /// Returns the declared width of this node.
    pub fn width(&self) -> u32 {
        match self {
            Expr::Signal { width, .. }
            | Expr::Literal { width, .. }
            | Expr::UnaryOp { width, .. }
            | Expr::BinaryOp { width, .. }
            | Expr::Mux { width, .. }
            | Expr::Slice { width, .. }
            | Expr::Concat { width, .. }
            | Expr::Resize { width, .. }
            | Expr::MemRead { width, .. } => *width,
        }
    }
}

/// The top-level IR document.
///
/// Every section defaults to empty so minimal documents stay minimal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Externally visible ports.
    #[serde(default)]
    pub ports: Vec<PortDecl>,
    /// Internal nets.
    #[serde(default)]
    pub nets: Vec<NetDecl>,
    /// Registers.
    #[serde(default)]
    pub regs: Vec<RegDecl>,
    /// Processes.
    #[serde(default)]
    pub processes: Vec<ProcessDecl>,
    /// Continuous assignments.
    #[serde(default)]
    pub gates: Vec<GateDecl>,
    /// Memories.
    #[serde(default)]
    pub memories: Vec<MemoryDecl>,
}

impl Document {
    /// Parses a JSON document.
    ///
    /// Elaborated expression trees can nest far beyond serde_json's default
    /// recursion limit, so the limit is lifted here; linking enforces its own
    /// depth bound instead.
    pub fn from_json(bytes: &[u8]) -> Result<Document, IrError> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        de.disable_recursion_limit();
        Document::deserialize(&mut de).map_err(|e| IrError::MalformedIr {
            reason: e.to_string(),
        })
    }
}
