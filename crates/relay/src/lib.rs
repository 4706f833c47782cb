//! Relay — a multi-backend simulation engine for flat netlist IR.
//!
//! An external elaborator flattens a hierarchical design into a JSON
//! netlist; this crate selects one of three interchangeable execution
//! backends for it — the tree-walking [`Interpreter`], the Cranelift
//! [`JitSimulator`], or the ahead-of-time [`AotSimulator`] — and hands back
//! the uniform [`Simulator`] surface.
//!
//! ```no_run
//! use relay::{build, probe, Backend, SimOptions, Simulator};
//!
//! # fn main() -> Result<(), relay::SimError> {
//! let ir = std::fs::read("design.json").unwrap();
//! let caps = probe();
//! let backend = if caps.jit { Backend::Jit } else { Backend::Interpreter };
//! let mut sim = build(backend, &ir, &SimOptions::default(), &caps)?;
//! sim.poke("reset", 1)?;
//! sim.run_cycles(1, 0, false)?;
//! sim.poke("reset", 0)?;
//! sim.run_cycles(1_000_000, 0, false)?;
//! println!("pc = {:#06x}", sim.peek("cpu__pc")?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub use relay_aot::AotSimulator;
pub use relay_harness::{
    Backend, BackendCapabilities, BatchResult, SimError, SimOptions, Simulator, SystemBus,
    SUB_CYCLES_MAX, SUB_CYCLES_MIN,
};
pub use relay_interp::Interpreter;
pub use relay_ir::{Document, IrError, Netlist};
pub use relay_jit::JitSimulator;

/// Probes the current system once and reports which backends are usable.
///
/// The result is an explicit value to be passed to [`build`]; callers that
/// cache it should probe once at startup.
pub fn probe() -> BackendCapabilities {
    BackendCapabilities {
        interpreter: true,
        jit: relay_jit::available(),
        aot: relay_aot::toolchain_available(),
    }
}

/// Builds a simulator for `backend` over the given IR document.
///
/// Fails with `BackendUnavailable` when the capability flag for `backend` is
/// false; all parse, validation, and compilation errors surface directly.
pub fn build(
    backend: Backend,
    json: &[u8],
    options: &SimOptions,
    caps: &BackendCapabilities,
) -> Result<Box<dyn Simulator>, SimError> {
    if !caps.supports(backend) {
        return Err(SimError::BackendUnavailable { backend });
    }
    Ok(match backend {
        Backend::Interpreter => Box::new(Interpreter::new(json, options)?),
        Backend::Jit => Box::new(JitSimulator::new(json, options)?),
        Backend::Aot => Box::new(AotSimulator::new(json, options)?),
    })
}
