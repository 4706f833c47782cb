//! Linked expression trees.
//!
//! [`Node`] is the typed, name-resolved form of [`Expr`](crate::doc::Expr)
//! produced by linking. Operator strings become [`UnaryOp`]/[`BinaryOp`],
//! signal and memory names become dense IDs, literals are pre-masked, and
//! `resize` folds into a zero-based [`Node::Slice`].
//!
//! The value semantics documented on [`Node`] are normative for every
//! backend: the interpreter implements them directly and the JIT and AOT
//! code generators emit instruction-for-instruction equivalents.

use crate::ids::{MemoryId, SignalId};

/// Returns the value mask for a signal of the given bit width.
///
/// Widths of 64 or more cover the whole word.
pub fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Bitwise NOT (`~`), masked to the result width.
    Not,
    /// Reduction AND: 1 iff every operand bit is set.
    RedAnd,
    /// Reduction OR: 1 iff any operand bit is set.
    RedOr,
    /// Reduction XOR: operand population count modulo 2.
    RedXor,
}

impl UnaryOp {
    /// Maps a wire-format operator string onto an operator.
    pub fn from_symbol(op: &str) -> Option<UnaryOp> {
        match op {
            "~" => Some(UnaryOp::Not),
            "reduce_and" => Some(UnaryOp::RedAnd),
            "reduce_or" => Some(UnaryOp::RedOr),
            "reduce_xor" => Some(UnaryOp::RedXor),
            _ => None,
        }
    }
}

/// A binary operator.
///
/// Arithmetic wraps at 64 bits before masking; division and modulo by zero
/// yield 0; shift amounts are clamped to 63; comparisons yield 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Bitwise AND (`&`).
    And,
    /// Bitwise OR (`|`).
    Or,
    /// Bitwise XOR (`^`).
    Xor,
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Unsigned division (`/`).
    Div,
    /// Unsigned modulo (`%`).
    Mod,
    /// Left shift (`<<`).
    Shl,
    /// Logical right shift (`>>`).
    Shr,
    /// Equality (`==`).
    Eq,
    /// Inequality (`!=`).
    Ne,
    /// Unsigned less-than (`<`).
    Lt,
    /// Unsigned greater-than (`>`).
    Gt,
    /// Unsigned less-or-equal (`<=`).
    Le,
    /// Unsigned greater-or-equal (`>=`).
    Ge,
}

impl BinaryOp {
    /// Maps a wire-format operator string onto an operator.
    pub fn from_symbol(op: &str) -> Option<BinaryOp> {
        match op {
            "&" => Some(BinaryOp::And),
            "|" => Some(BinaryOp::Or),
            "^" => Some(BinaryOp::Xor),
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            "%" => Some(BinaryOp::Mod),
            "<<" => Some(BinaryOp::Shl),
            ">>" => Some(BinaryOp::Shr),
            "==" => Some(BinaryOp::Eq),
            "!=" => Some(BinaryOp::Ne),
            "<" => Some(BinaryOp::Lt),
            ">" => Some(BinaryOp::Gt),
            "<=" => Some(BinaryOp::Le),
            ">=" => Some(BinaryOp::Ge),
            _ => None,
        }
    }
}

/// One part of a concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatPart {
    /// The part's expression.
    pub node: Node,
    /// The part's width in the result.
    pub width: u32,
}

/// A linked, typed expression tree node.
///
/// Every node's result is masked to its `width`; signal loads are exempt
/// because stored signal values are already masked at commit/poke time.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The current value of a signal.
    Signal(SignalId),
    /// A pre-masked constant.
    Const(u64),
    /// A unary operator application.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Node>,
        /// The operand's width, needed by the reductions.
        operand_width: u32,
        /// Result width.
        width: u32,
    },
    /// A binary operator application.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Node>,
        /// Right operand.
        rhs: Box<Node>,
        /// Result width.
        width: u32,
    },
    /// A two-way select: nonzero condition picks `when_true`.
    Mux {
        /// Select condition.
        cond: Box<Node>,
        /// Value when the condition is nonzero.
        when_true: Box<Node>,
        /// Value when the condition is zero.
        when_false: Box<Node>,
        /// Result width.
        width: u32,
    },
    /// `(base >> low) & mask(width)`; also the linked form of `resize`
    /// (with `low == 0`).
    Slice {
        /// The sliced expression.
        base: Box<Node>,
        /// Low bit index.
        low: u32,
        /// Result width.
        width: u32,
    },
    /// Concatenation, parts most-significant first:
    /// `acc = (acc << part.width) | (part & mask(part.width))`.
    Concat {
        /// The concatenated parts.
        parts: Vec<ConcatPart>,
        /// Total result width.
        width: u32,
    },
    /// A memory word read at `addr % depth`.
    MemRead {
        /// The memory.
        memory: MemoryId,
        /// Word address expression.
        addr: Box<Node>,
        /// Result width.
        width: u32,
    },
}

impl Node {
    /// Calls `f` for every signal this expression reads, including reads
    /// nested in address and select sub-expressions.
    pub fn for_each_signal(&self, f: &mut impl FnMut(SignalId)) {
        match self {
            Node::Signal(id) => f(*id),
            Node::Const(_) => {}
            Node::Unary { operand, .. } => operand.for_each_signal(f),
            Node::Binary { lhs, rhs, .. } => {
                lhs.for_each_signal(f);
                rhs.for_each_signal(f);
            }
            Node::Mux {
                cond,
                when_true,
                when_false,
                ..
            } => {
                cond.for_each_signal(f);
                when_true.for_each_signal(f);
                when_false.for_each_signal(f);
            }
            Node::Slice { base, .. } => base.for_each_signal(f),
            Node::Concat { parts, .. } => {
                for part in parts {
                    part.node.for_each_signal(f);
                }
            }
            Node::MemRead { addr, .. } => addr.for_each_signal(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_widths() {
        assert_eq!(mask(1), 0x1);
        assert_eq!(mask(8), 0xFF);
        assert_eq!(mask(63), u64::MAX >> 1);
        assert_eq!(mask(64), u64::MAX);
        assert_eq!(mask(65), u64::MAX);
    }

    #[test]
    fn unary_symbols() {
        assert_eq!(UnaryOp::from_symbol("~"), Some(UnaryOp::Not));
        assert_eq!(UnaryOp::from_symbol("reduce_xor"), Some(UnaryOp::RedXor));
        assert_eq!(UnaryOp::from_symbol("!"), None);
    }

    #[test]
    fn binary_symbols() {
        assert_eq!(BinaryOp::from_symbol("<<"), Some(BinaryOp::Shl));
        assert_eq!(BinaryOp::from_symbol(">="), Some(BinaryOp::Ge));
        assert_eq!(BinaryOp::from_symbol("**"), None);
    }

    #[test]
    fn collects_nested_signal_reads() {
        let a = SignalId::from_raw(0);
        let b = SignalId::from_raw(1);
        let node = Node::Mux {
            cond: Box::new(Node::Signal(a)),
            when_true: Box::new(Node::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Node::Signal(b)),
                rhs: Box::new(Node::Const(1)),
                width: 8,
            }),
            when_false: Box::new(Node::Const(0)),
            width: 8,
        };
        let mut seen = Vec::new();
        node.for_each_signal(&mut |id| seen.push(id.as_raw()));
        assert_eq!(seen, vec![0, 1]);
    }
}
