//! Construction options and batch results.

/// Minimum effective `sub_cycles` value.
pub const SUB_CYCLES_MIN: u32 = 1;

/// Maximum effective `sub_cycles` value: one nominal cycle of the reference
/// multi-phase clock systems spans 14 master-clock micro-steps at full
/// fidelity.
pub const SUB_CYCLES_MAX: u32 = 14;

/// Options recognized at simulator construction.
///
/// Out-of-range `sub_cycles` values are clamped to
/// `[SUB_CYCLES_MIN, SUB_CYCLES_MAX]`, never rejected. The named signal
/// bindings must resolve in the loaded netlist or construction fails with
/// `UnknownSignal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimOptions {
    /// Micro-steps folded into one externally visible nominal cycle.
    pub sub_cycles: u32,
    /// The clock pulsed once per micro-step by `run_cycles`. Defaults to the
    /// first clocked domain's clock when that clock is an input port.
    pub master_clock: Option<String>,
    /// The input that receives the standing sideband value during
    /// `run_cycles` batches.
    pub sideband_input: Option<String>,
    /// A signal that, when nonzero after a micro-step, ends a `run_cycles`
    /// batch early.
    pub halt_signal: Option<String>,
}

impl Default for SimOptions {
    fn default() -> Self {
        SimOptions {
            sub_cycles: SUB_CYCLES_MAX,
            master_clock: None,
            sideband_input: None,
            halt_signal: None,
        }
    }
}

impl SimOptions {
    /// Returns the clamped effective `sub_cycles`.
    pub fn effective_sub_cycles(&self) -> u32 {
        self.sub_cycles.clamp(SUB_CYCLES_MIN, SUB_CYCLES_MAX)
    }
}

/// The outcome of a `run_cycles` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    /// Micro-steps actually advanced; less than `count × sub_cycles` only
    /// when a halt condition ended the batch early.
    pub cycles_run: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_full_fidelity() {
        assert_eq!(SimOptions::default().sub_cycles, 14);
    }

    #[test]
    fn sub_cycles_clamped_low() {
        let opts = SimOptions {
            sub_cycles: 0,
            ..SimOptions::default()
        };
        assert_eq!(opts.effective_sub_cycles(), 1);
    }

    #[test]
    fn sub_cycles_clamped_high() {
        let opts = SimOptions {
            sub_cycles: 100,
            ..SimOptions::default()
        };
        assert_eq!(opts.effective_sub_cycles(), 14);
    }

    #[test]
    fn in_range_passes_through() {
        for n in 1..=14 {
            let opts = SimOptions {
                sub_cycles: n,
                ..SimOptions::default()
            };
            assert_eq!(opts.effective_sub_cycles(), n);
        }
    }
}
