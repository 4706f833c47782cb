//! The linked netlist.
//!
//! [`Netlist::parse`] turns a serialized [`Document`] into the dense form the
//! execution backends consume: signals become array indices, expression trees
//! become typed [`Node`]s, combinational assignments are topologically
//! ordered, and clocked process statements are grouped into clock domains.
//! Every fatal document defect (duplicates, dangling references, width
//! violations, combinational cycles) is rejected here, before any backend
//! builds execution state.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::doc::{Direction, Document, Expr};
use crate::error::IrError;
use crate::ids::{MemoryId, SignalId};
use crate::node::{mask, BinaryOp, ConcatPart, Node, UnaryOp};

/// Maximum expression nesting accepted by the linker.
const MAX_EXPR_DEPTH: usize = 4096;

/// The storage class of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// An input port, driven externally via `poke`.
    Input,
    /// An output port.
    Output,
    /// An internal net.
    Net,
    /// A register; commits on clock edges and carries a reset value.
    Register,
}

/// A linked signal.
#[derive(Debug, Clone)]
pub struct SignalInfo {
    /// Scope-qualified name.
    pub name: String,
    /// Bit width, in `[1, 64]`.
    pub width: u32,
    /// Storage class.
    pub kind: SignalKind,
    /// Construction/reset value; zero for everything but registers.
    pub reset_value: u64,
}

/// A combinational assignment, in topological evaluation order.
#[derive(Debug, Clone)]
pub struct Assign {
    /// The driven signal.
    pub target: SignalId,
    /// The driving expression.
    pub node: Node,
}

/// A clocked assignment: `target` samples `node` on its domain's rising edge.
#[derive(Debug, Clone)]
pub struct SeqAssign {
    /// The driven register.
    pub target: SignalId,
    /// Index into [`Netlist::domains`].
    pub domain: usize,
    /// The sampled expression.
    pub node: Node,
}

/// A clock domain: the set of registers committing on one clock signal.
#[derive(Debug, Clone)]
pub struct ClockDomain {
    /// The clock signal.
    pub clock: SignalId,
}

/// A linked memory.
#[derive(Debug, Clone)]
pub struct Memory {
    /// Scope-qualified name.
    pub name: String,
    /// Number of addressable words.
    pub depth: usize,
    /// Word width, in `[1, 64]`.
    pub width: u32,
    /// Initial contents, padded to `depth` words and masked to `width`.
    pub initial: Vec<u64>,
}

/// A resolved peek/poke target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPath {
    /// A plain signal.
    Signal(SignalId),
    /// One word of a memory, named `"memory[addr]"`.
    MemCell {
        /// The memory.
        memory: MemoryId,
        /// The word address, already bounds-checked against the depth.
        addr: usize,
    },
}

/// A validated, linked netlist.
///
/// Immutable for the lifetime of every simulator built from it; backends keep
/// it behind shared ownership and own their mutable execution state
/// separately.
#[derive(Debug, Clone)]
pub struct Netlist {
    signals: Vec<SignalInfo>,
    index: HashMap<String, SignalId>,
    assigns: Vec<Assign>,
    seq: Vec<SeqAssign>,
    domains: Vec<ClockDomain>,
    memories: Vec<Memory>,
    mem_index: HashMap<String, MemoryId>,
}

impl Netlist {
    /// Parses and links a JSON IR document.
    pub fn parse(bytes: &[u8]) -> Result<Netlist, IrError> {
        Netlist::link(&Document::from_json(bytes)?)
    }

    /// Links an already-parsed document.
    pub fn link(doc: &Document) -> Result<Netlist, IrError> {
        let mut signals: Vec<SignalInfo> = Vec::new();
        let mut index: HashMap<String, SignalId> = HashMap::new();

        for port in &doc.ports {
            let kind = match port.direction {
                Direction::In => SignalKind::Input,
                Direction::Out => SignalKind::Output,
            };
            declare(&mut signals, &mut index, &port.name, port.width, kind, 0)?;
        }
        for net in &doc.nets {
            declare(&mut signals, &mut index, &net.name, net.width, SignalKind::Net, 0)?;
        }
        for reg in &doc.regs {
            let reset = reg.reset_value & mask(reg.width);
            declare(
                &mut signals,
                &mut index,
                &reg.name,
                reg.width,
                SignalKind::Register,
                reset,
            )?;
        }

        let mut memories: Vec<Memory> = Vec::new();
        let mut mem_index: HashMap<String, MemoryId> = HashMap::new();
        for decl in &doc.memories {
            if decl.depth == 0 {
                return Err(IrError::malformed(format!(
                    "memory `{}` has depth 0",
                    decl.name
                )));
            }
            if decl.width < 1 || decl.width > 64 {
                return Err(IrError::malformed(format!(
                    "memory `{}` has width {} outside 1..=64",
                    decl.name, decl.width
                )));
            }
            if decl.initial_data.len() > decl.depth {
                return Err(IrError::malformed(format!(
                    "memory `{}` has {} initial words but depth {}",
                    decl.name,
                    decl.initial_data.len(),
                    decl.depth
                )));
            }
            if index.contains_key(&decl.name) || mem_index.contains_key(&decl.name) {
                return Err(IrError::DuplicateName {
                    name: decl.name.clone(),
                });
            }
            let word_mask = mask(decl.width);
            let mut initial: Vec<u64> =
                decl.initial_data.iter().map(|w| w & word_mask).collect();
            initial.resize(decl.depth, 0);
            let id = MemoryId::from_raw(memories.len() as u32);
            mem_index.insert(decl.name.clone(), id);
            memories.push(Memory {
                name: decl.name.clone(),
                depth: decl.depth,
                width: decl.width,
                initial,
            });
        }

        let linker = Linker {
            signals: &signals,
            index: &index,
            mem_index: &mem_index,
        };

        // Continuous assignments plus the statements of non-clocked
        // processes form one combinational assignment list.
        let mut assigns: Vec<Assign> = Vec::new();
        let mut driver: HashMap<SignalId, usize> = HashMap::new();
        let mut push_assign = |assigns: &mut Vec<Assign>,
                               driver: &mut HashMap<SignalId, usize>,
                               owner: &str,
                               target_name: &str,
                               expr: &Expr|
         -> Result<(), IrError> {
            let target = linker.lookup(target_name, owner)?;
            if signals[target.index()].kind == SignalKind::Register {
                return Err(IrError::malformed(format!(
                    "combinational assignment drives register `{target_name}`"
                )));
            }
            let node = linker.link_expr(expr, owner, 0)?;
            if driver.insert(target, assigns.len()).is_some() {
                return Err(IrError::malformed(format!(
                    "signal `{target_name}` has multiple combinational drivers"
                )));
            }
            assigns.push(Assign { target, node });
            Ok(())
        };
        for gate in &doc.gates {
            let owner = format!("gate `{}`", gate.target);
            push_assign(&mut assigns, &mut driver, &owner, &gate.target, &gate.expr)?;
        }
        for process in doc.processes.iter().filter(|p| !p.clocked) {
            for stmt in &process.statements {
                push_assign(&mut assigns, &mut driver, &process.name, &stmt.target, &stmt.expr)?;
            }
        }
        let assigns = topo_order(assigns, &driver, &signals)?;

        let mut seq: Vec<SeqAssign> = Vec::new();
        let mut domains: Vec<ClockDomain> = Vec::new();
        for process in doc.processes.iter().filter(|p| p.clocked) {
            let clock = linker.lookup(&process.clock, &process.name)?;
            let domain = match domains.iter().position(|d| d.clock == clock) {
                Some(i) => i,
                None => {
                    domains.push(ClockDomain { clock });
                    domains.len() - 1
                }
            };
            for stmt in &process.statements {
                let target = linker.lookup(&stmt.target, &process.name)?;
                if signals[target.index()].kind != SignalKind::Register {
                    return Err(IrError::malformed(format!(
                        "clocked assignment in `{}` drives non-register `{}`",
                        process.name, stmt.target
                    )));
                }
                let node = linker.link_expr(&stmt.expr, &process.name, 0)?;
                seq.push(SeqAssign {
                    target,
                    domain,
                    node,
                });
            }
        }

        Ok(Netlist {
            signals,
            index,
            assigns,
            seq,
            domains,
            memories,
            mem_index,
        })
    }

    /// Resolves a name to a peek/poke target.
    ///
    /// Plain signal names resolve directly; `"name[addr]"` resolves to a
    /// memory word when `name` is a declared memory and `addr` is within its
    /// depth.
    pub fn resolve(&self, name: &str) -> Option<SignalPath> {
        if let Some(&id) = self.index.get(name) {
            return Some(SignalPath::Signal(id));
        }
        let (mem, rest) = name.split_once('[')?;
        let addr: usize = rest.strip_suffix(']')?.parse().ok()?;
        let &memory = self.mem_index.get(mem)?;
        if addr < self.memories[memory.index()].depth {
            Some(SignalPath::MemCell { memory, addr })
        } else {
            None
        }
    }

    /// Looks up a plain signal by name.
    pub fn lookup(&self, name: &str) -> Option<SignalId> {
        self.index.get(name).copied()
    }

    /// Returns the signal table entry for `id`.
    pub fn signal(&self, id: SignalId) -> &SignalInfo {
        &self.signals[id.index()]
    }

    /// Returns all signals in declaration order.
    pub fn signals(&self) -> &[SignalInfo] {
        &self.signals
    }

    /// Returns the number of signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns the combinational assignments in evaluation order.
    pub fn assigns(&self) -> &[Assign] {
        &self.assigns
    }

    /// Returns the clocked assignments.
    pub fn seq_assigns(&self) -> &[SeqAssign] {
        &self.seq
    }

    /// Returns the clock domains.
    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    /// Returns the memory table entry for `id`.
    pub fn memory(&self, id: MemoryId) -> &Memory {
        &self.memories[id.index()]
    }

    /// Returns all memories in declaration order.
    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    /// Builds the construction-time signal value array: registers hold their
    /// reset values, everything else holds zero.
    pub fn initial_values(&self) -> Vec<u64> {
        self.signals.iter().map(|s| s.reset_value).collect()
    }
}

fn declare(
    signals: &mut Vec<SignalInfo>,
    index: &mut HashMap<String, SignalId>,
    name: &str,
    width: u32,
    kind: SignalKind,
    reset_value: u64,
) -> Result<SignalId, IrError> {
    if width < 1 || width > 64 {
        return Err(IrError::malformed(format!(
            "signal `{name}` has width {width} outside 1..=64"
        )));
    }
    let id = SignalId::from_raw(signals.len() as u32);
    if index.insert(name.to_owned(), id).is_some() {
        return Err(IrError::DuplicateName {
            name: name.to_owned(),
        });
    }
    signals.push(SignalInfo {
        name: name.to_owned(),
        width,
        kind,
        reset_value,
    });
    Ok(id)
}

struct Linker<'a> {
    signals: &'a [SignalInfo],
    index: &'a HashMap<String, SignalId>,
    mem_index: &'a HashMap<String, MemoryId>,
}

impl Linker<'_> {
    fn lookup(&self, name: &str, owner: &str) -> Result<SignalId, IrError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| IrError::DanglingReference {
                name: name.to_owned(),
                referenced_by: owner.to_owned(),
            })
    }

    fn link_expr(&self, expr: &Expr, owner: &str, depth: usize) -> Result<Node, IrError> {
        if depth > MAX_EXPR_DEPTH {
            return Err(IrError::malformed(format!(
                "expression in `{owner}` nests deeper than {MAX_EXPR_DEPTH}"
            )));
        }
        let width = expr.width();
        if width < 1 || width > 64 {
            return Err(IrError::malformed(format!(
                "expression in `{owner}` has width {width} outside 1..=64"
            )));
        }
        match expr {
            Expr::Signal { name, .. } => Ok(Node::Signal(self.lookup(name, owner)?)),
            Expr::Literal { value, width } => Ok(Node::Const((*value as u64) & mask(*width))),
            Expr::UnaryOp { op, operand, width } => {
                let op = UnaryOp::from_symbol(op).ok_or_else(|| {
                    IrError::malformed(format!("unknown unary operator `{op}` in `{owner}`"))
                })?;
                Ok(Node::Unary {
                    op,
                    operand_width: operand.width(),
                    operand: Box::new(self.link_expr(operand, owner, depth + 1)?),
                    width: *width,
                })
            }
            Expr::BinaryOp {
                op,
                left,
                right,
                width,
            } => {
                let op = BinaryOp::from_symbol(op).ok_or_else(|| {
                    IrError::malformed(format!("unknown binary operator `{op}` in `{owner}`"))
                })?;
                Ok(Node::Binary {
                    op,
                    lhs: Box::new(self.link_expr(left, owner, depth + 1)?),
                    rhs: Box::new(self.link_expr(right, owner, depth + 1)?),
                    width: *width,
                })
            }
            Expr::Mux {
                condition,
                when_true,
                when_false,
                width,
            } => Ok(Node::Mux {
                cond: Box::new(self.link_expr(condition, owner, depth + 1)?),
                when_true: Box::new(self.link_expr(when_true, owner, depth + 1)?),
                when_false: Box::new(self.link_expr(when_false, owner, depth + 1)?),
                width: *width,
            }),
            Expr::Slice {
                base,
                low,
                high,
                width,
            } => {
                if high < low {
                    return Err(IrError::malformed(format!(
                        "slice in `{owner}` has high {high} below low {low}"
                    )));
                }
                if *high >= 64 {
                    return Err(IrError::malformed(format!(
                        "slice in `{owner}` has high {high} outside 0..=63"
                    )));
                }
                Ok(Node::Slice {
                    base: Box::new(self.link_expr(base, owner, depth + 1)?),
                    low: *low,
                    width: *width,
                })
            }
            Expr::Concat { parts, width } => {
                let parts = parts
                    .iter()
                    .map(|part| {
                        Ok(ConcatPart {
                            width: part.width(),
                            node: self.link_expr(part, owner, depth + 1)?,
                        })
                    })
                    .collect::<Result<Vec<_>, IrError>>()?;
                Ok(Node::Concat {
                    parts,
                    width: *width,
                })
            }
            Expr::Resize { expr, width } => Ok(Node::Slice {
                base: Box::new(self.link_expr(expr, owner, depth + 1)?),
                low: 0,
                width: *width,
            }),
            Expr::MemRead {
                memory,
                addr,
                width,
            } => {
                let memory =
                    self.mem_index
                        .get(memory)
                        .copied()
                        .ok_or_else(|| IrError::DanglingReference {
                            name: memory.clone(),
                            referenced_by: owner.to_owned(),
                        })?;
                Ok(Node::MemRead {
                    memory,
                    addr: Box::new(self.link_expr(addr, owner, depth + 1)?),
                    width: *width,
                })
            }
        }
    }
}

/// Orders the combinational assignments so every driver evaluates before its
/// readers. Registers never appear as combinational targets, so they break
/// cycles implicitly; any remaining cycle is a validation error.
fn topo_order(
    assigns: Vec<Assign>,
    driver: &HashMap<SignalId, usize>,
    signals: &[SignalInfo],
) -> Result<Vec<Assign>, IrError> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<_> = (0..assigns.len()).map(|i| graph.add_node(i)).collect();
    for (i, assign) in assigns.iter().enumerate() {
        assign.node.for_each_signal(&mut |read| {
            if let Some(&j) = driver.get(&read) {
                graph.add_edge(nodes[j], nodes[i], ());
            }
        });
    }
    match toposort(&graph, None) {
        Ok(order) => {
            let mut slots: Vec<Option<Assign>> = assigns.into_iter().map(Some).collect();
            let mut ordered = Vec::with_capacity(slots.len());
            for node in order {
                if let Some(assign) = slots[graph[node]].take() {
                    ordered.push(assign);
                }
            }
            Ok(ordered)
        }
        Err(cycle) => {
            let target = assigns[graph[cycle.node_id()]].target;
            Err(IrError::CombinationalCycle {
                signal: signals[target.index()].name.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Netlist, IrError> {
        Netlist::parse(json.as_bytes())
    }

    #[test]
    fn links_ports_nets_regs() {
        let nl = parse(
            r#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "nets": [ { "name": "n1", "width": 8 } ],
                "regs": [ { "name": "pc", "width": 16, "reset_value": 512 } ]
            }"#,
        )
        .unwrap();
        assert_eq!(nl.signal_count(), 3);
        let pc = nl.lookup("pc").unwrap();
        assert_eq!(nl.signal(pc).kind, SignalKind::Register);
        assert_eq!(nl.signal(pc).reset_value, 512);
        assert_eq!(nl.initial_values(), vec![0, 0, 512]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let err = parse(
            r#"{
                "ports": [ { "name": "x", "direction": "in", "width": 1 } ],
                "nets": [ { "name": "x", "width": 1 } ]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err, IrError::DuplicateName { name: "x".into() });
    }

    #[test]
    fn zero_width_rejected() {
        let err = parse(r#"{ "nets": [ { "name": "w", "width": 0 } ] }"#).unwrap_err();
        assert!(matches!(err, IrError::MalformedIr { .. }));
    }

    #[test]
    fn dangling_gate_operand() {
        let err = parse(
            r#"{
                "nets": [ { "name": "y", "width": 1 } ],
                "gates": [ { "target": "y", "expr":
                    { "type": "signal", "name": "ghost", "width": 1 } } ]
            }"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            IrError::DanglingReference {
                name: "ghost".into(),
                referenced_by: "gate `y`".into()
            }
        );
    }

    #[test]
    fn dangling_process_clock() {
        let err = parse(
            r#"{
                "regs": [ { "name": "q", "width": 1 } ],
                "processes": [ { "name": "p0", "clock": "clk", "clocked": true,
                    "statements": [ { "target": "q", "expr":
                        { "type": "signal", "name": "q", "width": 1 } } ] } ]
            }"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            IrError::DanglingReference {
                name: "clk".into(),
                referenced_by: "p0".into()
            }
        );
    }

    #[test]
    fn unknown_operator_rejected() {
        let err = parse(
            r#"{
                "nets": [ { "name": "y", "width": 8 } ],
                "gates": [ { "target": "y", "expr":
                    { "type": "binary_op", "op": "**",
                      "left": { "type": "literal", "value": 2, "width": 8 },
                      "right": { "type": "literal", "value": 3, "width": 8 },
                      "width": 8 } } ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::MalformedIr { .. }));
    }

    #[test]
    fn combinational_cycle_rejected() {
        let err = parse(
            r#"{
                "nets": [ { "name": "a", "width": 1 }, { "name": "b", "width": 1 } ],
                "gates": [
                    { "target": "a", "expr": { "type": "unary_op", "op": "~",
                        "operand": { "type": "signal", "name": "b", "width": 1 },
                        "width": 1 } },
                    { "target": "b", "expr": { "type": "unary_op", "op": "~",
                        "operand": { "type": "signal", "name": "a", "width": 1 },
                        "width": 1 } }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::CombinationalCycle { .. }));
    }

    #[test]
    fn register_breaks_cycle() {
        // Feedback through a register is the normal sequential case.
        let nl = parse(
            r#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "regs": [ { "name": "q", "width": 8 } ],
                "nets": [ { "name": "next", "width": 8 } ],
                "gates": [ { "target": "next", "expr": { "type": "unary_op", "op": "~",
                    "operand": { "type": "signal", "name": "q", "width": 8 },
                    "width": 8 } } ],
                "processes": [ { "name": "p0", "clock": "clk", "clocked": true,
                    "statements": [ { "target": "q", "expr":
                        { "type": "signal", "name": "next", "width": 8 } } ] } ]
            }"#,
        )
        .unwrap();
        assert_eq!(nl.assigns().len(), 1);
        assert_eq!(nl.seq_assigns().len(), 1);
        assert_eq!(nl.domains().len(), 1);
    }

    #[test]
    fn assigns_reordered_topologically() {
        // `y` is declared before the `mid` gate it depends on.
        let nl = parse(
            r#"{
                "ports": [ { "name": "a", "direction": "in", "width": 1 },
                           { "name": "y", "direction": "out", "width": 1 } ],
                "nets": [ { "name": "mid", "width": 1 } ],
                "gates": [
                    { "target": "y", "expr": { "type": "signal", "name": "mid", "width": 1 } },
                    { "target": "mid", "expr": { "type": "signal", "name": "a", "width": 1 } }
                ]
            }"#,
        )
        .unwrap();
        let order: Vec<&str> = nl
            .assigns()
            .iter()
            .map(|a| nl.signal(a.target).name.as_str())
            .collect();
        assert_eq!(order, vec!["mid", "y"]);
    }

    #[test]
    fn non_clocked_process_is_combinational() {
        let nl = parse(
            r#"{
                "ports": [ { "name": "a", "direction": "in", "width": 4 } ],
                "nets": [ { "name": "y", "width": 4 } ],
                "processes": [ { "name": "comb", "clock": "", "clocked": false,
                    "statements": [ { "target": "y", "expr":
                        { "type": "signal", "name": "a", "width": 4 } } ] } ]
            }"#,
        )
        .unwrap();
        assert_eq!(nl.assigns().len(), 1);
        assert!(nl.seq_assigns().is_empty());
    }

    #[test]
    fn processes_sharing_a_clock_share_a_domain() {
        let nl = parse(
            r#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "regs": [ { "name": "q0", "width": 1 }, { "name": "q1", "width": 1 } ],
                "processes": [
                    { "name": "p0", "clock": "clk", "clocked": true,
                      "statements": [ { "target": "q0", "expr":
                          { "type": "signal", "name": "q1", "width": 1 } } ] },
                    { "name": "p1", "clock": "clk", "clocked": true,
                      "statements": [ { "target": "q1", "expr":
                          { "type": "signal", "name": "q0", "width": 1 } } ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(nl.domains().len(), 1);
        assert_eq!(nl.seq_assigns().len(), 2);
    }

    #[test]
    fn multiple_drivers_rejected() {
        let err = parse(
            r#"{
                "nets": [ { "name": "y", "width": 1 } ],
                "gates": [
                    { "target": "y", "expr": { "type": "literal", "value": 0, "width": 1 } },
                    { "target": "y", "expr": { "type": "literal", "value": 1, "width": 1 } }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::MalformedIr { .. }));
    }

    #[test]
    fn memory_declaration_and_cell_resolution() {
        let nl = parse(
            r#"{ "memories": [ { "name": "rom", "depth": 4, "width": 8,
                 "initial_data": [1, 2] } ] }"#,
        )
        .unwrap();
        let mem = nl.memories()[0].clone();
        assert_eq!(mem.initial, vec![1, 2, 0, 0]);
        assert!(matches!(
            nl.resolve("rom[3]"),
            Some(SignalPath::MemCell { addr: 3, .. })
        ));
        assert_eq!(nl.resolve("rom[4]"), None);
        assert_eq!(nl.resolve("rom[x]"), None);
    }

    #[test]
    fn resize_links_as_zero_based_slice() {
        let nl = parse(
            r#"{
                "ports": [ { "name": "a", "direction": "in", "width": 16 } ],
                "nets": [ { "name": "y", "width": 8 } ],
                "gates": [ { "target": "y", "expr": { "type": "resize",
                    "expr": { "type": "signal", "name": "a", "width": 16 },
                    "width": 8 } } ]
            }"#,
        )
        .unwrap();
        match &nl.assigns()[0].node {
            Node::Slice { low, width, .. } => {
                assert_eq!(*low, 0);
                assert_eq!(*width, 8);
            }
            other => panic!("expected slice, got {other:?}"),
        }
    }

    #[test]
    fn clocked_assignment_to_net_rejected() {
        let err = parse(
            r#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "nets": [ { "name": "w", "width": 1 } ],
                "processes": [ { "name": "p0", "clock": "clk", "clocked": true,
                    "statements": [ { "target": "w", "expr":
                        { "type": "literal", "value": 1, "width": 1 } } ] } ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, IrError::MalformedIr { .. }));
    }
}
