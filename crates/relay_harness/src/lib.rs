//! RelayHarness — the backend-independent execution surface.
//!
//! Every backend implements the [`Simulator`] trait: named signal access
//! (`peek`/`poke`), single micro-steps (`tick`), and batched nominal cycles
//! (`run_cycles`). The shared [`ExecState`] owns all mutable execution state
//! (signal values, memories, clock-edge history) and drives the micro-step
//! algorithm through the [`Engine`] seam, so the interpreter and JIT differ
//! only in how one combinational sweep and one sequential sample are
//! computed — their step-for-step equivalence is structural, not tested-for.
//!
//! Domain conveniences (bulk memory loads, reset pulses) live in the
//! [`SystemBus`] extension trait, layered purely on the core surface.

#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod ext;
pub mod options;
pub mod simulator;
pub mod state;

pub use backend::{Backend, BackendCapabilities};
pub use error::SimError;
pub use ext::SystemBus;
pub use options::{BatchResult, SimOptions, SUB_CYCLES_MAX, SUB_CYCLES_MIN};
pub use simulator::Simulator;
pub use state::{Engine, ExecState};
