//! RelayIR — the flat netlist intermediate representation for the Relay
//! simulation engine.
//!
//! An elaborator (external to this workspace) flattens a hierarchical design
//! into a single [`Document`]: ports, nets, registers, clocked processes,
//! continuous assignments, and optional memories, serialized as JSON. This
//! crate parses and validates that document and links it into a [`Netlist`],
//! the dense, index-based form every execution backend consumes.
//!
//! Validation happens entirely up front: duplicate names, dangling
//! references, out-of-range widths, and combinational cycles are all rejected
//! by [`Netlist::parse`] before any backend builds execution state.

#![warn(missing_docs)]

pub mod doc;
pub mod error;
pub mod ids;
pub mod netlist;
pub mod node;

pub use doc::{Direction, Document, Expr};
pub use error::IrError;
pub use ids::{MemoryId, SignalId};
pub use netlist::{
    Assign, ClockDomain, Memory, Netlist, SeqAssign, SignalInfo, SignalKind, SignalPath,
};
pub use node::{mask, BinaryOp, ConcatPart, Node, UnaryOp};
