//! Domain-extension conveniences layered over the core surface.

use crate::error::SimError;
use crate::simulator::Simulator;

/// Bulk memory and reset conveniences for system-level designs.
///
/// Everything here is expressed purely through [`Simulator::peek`],
/// [`Simulator::poke`], [`Simulator::run_cycles`] and the `"memory[addr]"`
/// cell naming, so new peripheral domains can layer their own extension
/// traits the same way without touching backend internals.
pub trait SystemBus: Simulator {
    /// Writes `words` into the named memory region starting at `base`.
    ///
    /// Typical use: loading a ROM image or seeding RAM before a run.
    fn load_region(&mut self, region: &str, base: usize, words: &[u64]) -> Result<(), SimError> {
        for (i, word) in words.iter().enumerate() {
            self.poke(&format!("{region}[{}]", base + i), *word)?;
        }
        Ok(())
    }

    /// Reads `len` words from the named memory region starting at `base`.
    fn read_region(&self, region: &str, base: usize, len: usize) -> Result<Vec<u64>, SimError> {
        (base..base + len)
            .map(|addr| self.peek(&format!("{region}[{addr}]")))
            .collect()
    }

    /// Pokes a reset input high for one nominal cycle, then low.
    fn pulse_reset(&mut self, reset: &str) -> Result<(), SimError> {
        self.poke(reset, 1)?;
        self.run_cycles(1, 0, false)?;
        self.poke(reset, 0)?;
        Ok(())
    }
}

impl<S: Simulator + ?Sized> SystemBus for S {}
