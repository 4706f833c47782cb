//! The uniform backend surface.

use relay_ir::Netlist;

use crate::backend::Backend;
use crate::error::SimError;
use crate::options::BatchResult;

/// The execution surface every backend implements identically.
///
/// Backends are opaque and interchangeable behind this trait: callers drive
/// simulation through batched stepping and named signal access, and two
/// backends given the same netlist, options, and input sequence answer
/// `peek` identically at every micro-step boundary.
pub trait Simulator {
    /// Which execution strategy this instance uses.
    fn backend(&self) -> Backend;

    /// The netlist this instance executes.
    fn netlist(&self) -> &Netlist;

    /// The clamped effective `sub_cycles` this instance was built with.
    fn sub_cycles(&self) -> u32;

    /// Reads the last-committed value of a named signal or memory cell.
    /// Never evaluates anything as a side effect.
    fn peek(&self, name: &str) -> Result<u64, SimError>;

    /// Injects a value onto an input port or memory cell, masked to the
    /// declared width.
    fn poke(&mut self, name: &str, value: u64) -> Result<(), SimError>;

    /// Advances one micro-step. Atomic from the caller's point of view.
    fn tick(&mut self) -> Result<(), SimError>;

    /// Runs `count × sub_cycles` micro-steps as nominal master-clock pulses,
    /// holding the sideband value on its input for the whole batch.
    ///
    /// Returns the micro-steps actually advanced, which is less than
    /// `count × sub_cycles` only when the halt signal ended the batch early.
    fn run_cycles(
        &mut self,
        count: u64,
        sideband_value: u64,
        sideband_active: bool,
    ) -> Result<BatchResult, SimError>;

    /// Restores construction-time state.
    fn reset(&mut self);
}

impl std::fmt::Debug for dyn Simulator + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}
