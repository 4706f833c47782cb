//! The tree-walking expression evaluator.
//!
//! This is the reference realization of the netlist value semantics: every
//! node masks its result to its declared width, arithmetic wraps, division
//! and modulo by zero yield 0, shift amounts clamp to 63, and memory reads
//! index modulo the memory depth. The JIT and AOT code generators emit
//! equivalents of exactly these formulas.

use relay_ir::{mask, BinaryOp, Node, UnaryOp};

/// Evaluates `node` against the given signal values and memory contents.
pub fn eval(node: &Node, values: &[u64], memories: &[Vec<u64>]) -> u64 {
    match node {
        Node::Signal(id) => values[id.index()],
        Node::Const(v) => *v,
        Node::Unary {
            op,
            operand,
            operand_width,
            width,
        } => {
            let x = eval(operand, values, memories);
            match op {
                UnaryOp::Not => !x & mask(*width),
                UnaryOp::RedAnd => u64::from(x & mask(*operand_width) == mask(*operand_width)),
                UnaryOp::RedOr => u64::from(x != 0),
                UnaryOp::RedXor => u64::from(x.count_ones() & 1 == 1),
            }
        }
        Node::Binary {
            op,
            lhs,
            rhs,
            width,
        } => {
            let l = eval(lhs, values, memories);
            let r = eval(rhs, values, memories);
            let raw = match op {
                BinaryOp::And => l & r,
                BinaryOp::Or => l | r,
                BinaryOp::Xor => l ^ r,
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::Div => {
                    if r == 0 {
                        0
                    } else {
                        l / r
                    }
                }
                BinaryOp::Mod => {
                    if r == 0 {
                        0
                    } else {
                        l % r
                    }
                }
                BinaryOp::Shl => l << r.min(63),
                BinaryOp::Shr => l >> r.min(63),
                BinaryOp::Eq => u64::from(l == r),
                BinaryOp::Ne => u64::from(l != r),
                BinaryOp::Lt => u64::from(l < r),
                BinaryOp::Gt => u64::from(l > r),
                BinaryOp::Le => u64::from(l <= r),
                BinaryOp::Ge => u64::from(l >= r),
            };
            raw & mask(*width)
        }
        Node::Mux {
            cond,
            when_true,
            when_false,
            width,
        } => {
            let picked = if eval(cond, values, memories) != 0 {
                eval(when_true, values, memories)
            } else {
                eval(when_false, values, memories)
            };
            picked & mask(*width)
        }
        Node::Slice { base, low, width } => {
            (eval(base, values, memories) >> low) & mask(*width)
        }
        Node::Concat { parts, width } => {
            let mut acc = 0u64;
            for part in parts {
                let v = eval(&part.node, values, memories) & mask(part.width);
                acc = if part.width >= 64 {
                    v
                } else {
                    (acc << part.width) | v
                };
            }
            acc & mask(*width)
        }
        Node::MemRead {
            memory,
            addr,
            width,
        } => {
            let words = &memories[memory.index()];
            let a = eval(addr, values, memories) as usize % words.len();
            words[a] & mask(*width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_ir::{ConcatPart, SignalId};

    fn signal(i: u32) -> Box<Node> {
        Box::new(Node::Signal(SignalId::from_raw(i)))
    }

    fn binary(op: BinaryOp, l: Box<Node>, r: Box<Node>, width: u32) -> Node {
        Node::Binary {
            op,
            lhs: l,
            rhs: r,
            width,
        }
    }

    #[test]
    fn arithmetic_wraps_then_masks() {
        let node = binary(BinaryOp::Add, signal(0), signal(1), 8);
        assert_eq!(eval(&node, &[0xFF, 0x02], &[]), 0x01);
    }

    #[test]
    fn division_by_zero_is_zero() {
        let div = binary(BinaryOp::Div, signal(0), signal(1), 8);
        let rem = binary(BinaryOp::Mod, signal(0), signal(1), 8);
        assert_eq!(eval(&div, &[42, 0], &[]), 0);
        assert_eq!(eval(&rem, &[42, 0], &[]), 0);
        assert_eq!(eval(&div, &[42, 5], &[]), 8);
        assert_eq!(eval(&rem, &[42, 5], &[]), 2);
    }

    #[test]
    fn oversized_shift_clamps() {
        let shl = binary(BinaryOp::Shl, signal(0), signal(1), 64);
        assert_eq!(eval(&shl, &[1, 200], &[]), 1u64 << 63);
        let shr = binary(BinaryOp::Shr, signal(0), signal(1), 64);
        assert_eq!(eval(&shr, &[u64::MAX, 200], &[]), 1);
    }

    #[test]
    fn comparisons_yield_bits() {
        let lt = binary(BinaryOp::Lt, signal(0), signal(1), 1);
        assert_eq!(eval(&lt, &[3, 5], &[]), 1);
        assert_eq!(eval(&lt, &[5, 3], &[]), 0);
    }

    #[test]
    fn reductions() {
        let red = |op, ow| Node::Unary {
            op,
            operand: signal(0),
            operand_width: ow,
            width: 1,
        };
        assert_eq!(eval(&red(UnaryOp::RedAnd, 4), &[0xF], &[]), 1);
        assert_eq!(eval(&red(UnaryOp::RedAnd, 4), &[0xE], &[]), 0);
        assert_eq!(eval(&red(UnaryOp::RedOr, 4), &[0x0], &[]), 0);
        assert_eq!(eval(&red(UnaryOp::RedOr, 4), &[0x8], &[]), 1);
        assert_eq!(eval(&red(UnaryOp::RedXor, 4), &[0x7], &[]), 1);
        assert_eq!(eval(&red(UnaryOp::RedXor, 4), &[0x5], &[]), 0);
    }

    #[test]
    fn mux_selects_on_nonzero() {
        let node = Node::Mux {
            cond: signal(0),
            when_true: Box::new(Node::Const(0xAA)),
            when_false: Box::new(Node::Const(0x55)),
            width: 8,
        };
        assert_eq!(eval(&node, &[2], &[]), 0xAA);
        assert_eq!(eval(&node, &[0], &[]), 0x55);
    }

    #[test]
    fn slice_extracts_field() {
        let node = Node::Slice {
            base: signal(0),
            low: 4,
            width: 4,
        };
        assert_eq!(eval(&node, &[0xA5], &[]), 0xA);
    }

    #[test]
    fn concat_is_msb_first() {
        let node = Node::Concat {
            parts: vec![
                ConcatPart {
                    node: Node::Signal(SignalId::from_raw(0)),
                    width: 4,
                },
                ConcatPart {
                    node: Node::Signal(SignalId::from_raw(1)),
                    width: 4,
                },
            ],
            width: 8,
        };
        assert_eq!(eval(&node, &[0xA, 0x5], &[]), 0xA5);
    }

    #[test]
    fn mem_read_wraps_address() {
        let node = Node::MemRead {
            memory: relay_ir::MemoryId::from_raw(0),
            addr: signal(0),
            width: 8,
        };
        let mems = vec![vec![10, 20, 30, 40]];
        assert_eq!(eval(&node, &[1], &mems), 20);
        assert_eq!(eval(&node, &[5], &mems), 20);
    }
}
