//! Shared execution state and the micro-step driver.
//!
//! [`ExecState`] owns everything mutable about a running simulation: the flat
//! signal value array, memory contents, the staging array for sequential
//! commits, and per-domain clock-edge history. Backends supply an [`Engine`]
//! (one combinational sweep, one sequential sample) and the state drives the
//! full micro-step algorithm around it:
//!
//! 1. settle combinational logic to a fixpoint (bounded iteration);
//! 2. sample every clocked assignment's settled value into the staging array;
//! 3. commit staged values for every clock domain that saw a rising edge,
//!    atomically per domain, with a committed flag preventing any register
//!    from committing twice in one micro-step;
//! 4. re-settle and repeat edge detection a bounded number of times so edges
//!    on derived (gate-driven) clocks produced by the commit are honored;
//! 5. record settled clock levels as the next micro-step's edge history.
//!
//! Clock levels persist across micro-steps, so a rising edge produced by two
//! consecutive `poke`s of an input clock is observed like any other.

use std::sync::Arc;

use relay_ir::{mask, Netlist, SignalId, SignalKind, SignalPath};

use crate::error::SimError;
use crate::options::{BatchResult, SimOptions};

/// Bound on fixpoint iterations in one settle pass.
pub const MAX_SETTLE_ITERS: u32 = 16;

/// Bound on derived-clock edge iterations in one micro-step.
pub const MAX_EDGE_ITERS: u32 = 10;

/// A backend's computational core: one combinational sweep and one
/// sequential sample, both over the shared [`ExecState`].
pub trait Engine {
    /// Evaluates every combinational assignment once, in the netlist's
    /// topological order, writing results into the state's value array.
    fn evaluate(&mut self, state: &mut ExecState);

    /// Evaluates every clocked assignment's expression against the current
    /// (settled) values and writes the results, masked to the target
    /// register's width, into the state's staging array.
    fn sample(&mut self, state: &mut ExecState);
}

/// The mutable execution state of one simulator instance.
///
/// Exclusively owned by its backend; nothing is shared between concurrently
/// live instances.
#[derive(Debug)]
pub struct ExecState {
    netlist: Arc<Netlist>,
    values: Vec<u64>,
    staged: Vec<u64>,
    committed: Vec<bool>,
    memories: Vec<Vec<u64>>,
    prev_clocks: Vec<u64>,
    sub_cycles: u32,
    master_clock: Option<SignalId>,
    sideband: Option<SignalId>,
    halt: Option<SignalId>,
    poisoned: bool,
}

impl ExecState {
    /// Builds execution state for `netlist` with the given options.
    ///
    /// Named option bindings that do not resolve fail with `UnknownSignal`.
    pub fn new(netlist: Arc<Netlist>, options: &SimOptions) -> Result<ExecState, SimError> {
        let resolve = |name: &Option<String>| -> Result<Option<SignalId>, SimError> {
            match name {
                Some(n) => netlist
                    .lookup(n)
                    .ok_or_else(|| SimError::UnknownSignal { name: n.clone() })
                    .map(Some),
                None => Ok(None),
            }
        };
        let master_clock = match resolve(&options.master_clock)? {
            Some(id) => Some(id),
            None => netlist
                .domains()
                .first()
                .map(|d| d.clock)
                .filter(|&clock| netlist.signal(clock).kind == SignalKind::Input),
        };
        let sideband = resolve(&options.sideband_input)?;
        let halt = resolve(&options.halt_signal)?;
        let seq_len = netlist.seq_assigns().len();
        Ok(ExecState {
            values: netlist.initial_values(),
            staged: vec![0; seq_len],
            committed: vec![false; seq_len],
            memories: netlist.memories().iter().map(|m| m.initial.clone()).collect(),
            prev_clocks: vec![0; netlist.domains().len()],
            sub_cycles: options.effective_sub_cycles(),
            master_clock,
            sideband,
            halt,
            poisoned: false,
            netlist,
        })
    }

    /// The netlist this state executes.
    pub fn netlist(&self) -> &Arc<Netlist> {
        &self.netlist
    }

    /// The clamped effective `sub_cycles`.
    pub fn sub_cycles(&self) -> u32 {
        self.sub_cycles
    }

    /// The resolved master clock, if any.
    pub fn master_clock(&self) -> Option<SignalId> {
        self.master_clock
    }

    /// The resolved sideband input, if any.
    pub fn sideband_input(&self) -> Option<SignalId> {
        self.sideband
    }

    /// The resolved halt signal, if any.
    pub fn halt_signal(&self) -> Option<SignalId> {
        self.halt
    }

    /// The flat signal value array.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Mutable access to the signal value array, for engines.
    pub fn values_mut(&mut self) -> &mut [u64] {
        &mut self.values
    }

    /// The sequential staging array.
    pub fn staged(&self) -> &[u64] {
        &self.staged
    }

    /// Mutable access to the staging array, for engines.
    pub fn staged_mut(&mut self) -> &mut [u64] {
        &mut self.staged
    }

    /// The live memory contents, one word vector per declared memory.
    pub fn memories(&self) -> &[Vec<u64>] {
        &self.memories
    }

    /// Mutable access to memory contents.
    pub fn memories_mut(&mut self) -> &mut [Vec<u64>] {
        &mut self.memories
    }

    /// Per-domain clock levels recorded at the end of the last micro-step.
    pub fn prev_clocks(&self) -> &[u64] {
        &self.prev_clocks
    }

    /// Mutable access to the clock-edge history, for backends that step
    /// outside the shared driver.
    pub fn prev_clocks_mut(&mut self) -> &mut [u64] {
        &mut self.prev_clocks
    }

    /// Reads one signal by ID.
    pub fn value(&self, id: SignalId) -> u64 {
        self.values[id.index()]
    }

    /// Writes one signal by ID, masked to its width. No input check: this is
    /// the path backends use to pulse clocks.
    pub fn write(&mut self, id: SignalId, value: u64) {
        let width = self.netlist.signal(id).width;
        self.values[id.index()] = value & mask(width);
    }

    /// Reads the last-committed value of a named signal or memory cell.
    pub fn peek(&self, name: &str) -> Result<u64, SimError> {
        match self.netlist.resolve(name) {
            Some(SignalPath::Signal(id)) => Ok(self.values[id.index()]),
            Some(SignalPath::MemCell { memory, addr }) => Ok(self.memories[memory.index()][addr]),
            None => Err(SimError::UnknownSignal {
                name: name.to_owned(),
            }),
        }
    }

    /// Injects a value onto an input port or memory cell, masked to the
    /// declared width.
    pub fn poke(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        match self.netlist.resolve(name) {
            Some(SignalPath::Signal(id)) => {
                if self.netlist.signal(id).kind != SignalKind::Input {
                    return Err(SimError::NotAnInput {
                        name: name.to_owned(),
                    });
                }
                self.write(id, value);
                Ok(())
            }
            Some(SignalPath::MemCell { memory, addr }) => {
                let width = self.netlist.memory(memory).width;
                self.memories[memory.index()][addr] = value & mask(width);
                Ok(())
            }
            None => Err(SimError::UnknownSignal {
                name: name.to_owned(),
            }),
        }
    }

    /// Restores construction-time state: registers to reset values, memories
    /// to initial contents, every other signal to zero.
    pub fn reset(&mut self) {
        self.values = self.netlist.initial_values();
        for v in &mut self.staged {
            *v = 0;
        }
        for (mem, decl) in self.memories.iter_mut().zip(self.netlist.memories()) {
            mem.copy_from_slice(&decl.initial);
        }
        for c in &mut self.prev_clocks {
            *c = 0;
        }
        self.poisoned = false;
    }

    /// Settles combinational logic to a fixpoint.
    pub fn settle<E: Engine>(&mut self, engine: &mut E) -> Result<(), SimError> {
        engine.evaluate(self);
        for _ in 1..MAX_SETTLE_ITERS {
            let before = self.values.clone();
            engine.evaluate(self);
            if self.values == before {
                return Ok(());
            }
        }
        Err(SimError::NonConvergentSettle {
            iterations: MAX_SETTLE_ITERS,
        })
    }

    /// Advances one micro-step: settle, sample, edge-detect, commit.
    ///
    /// A settle failure poisons the instance; every later step returns the
    /// same error.
    pub fn tick_with<E: Engine>(&mut self, engine: &mut E) -> Result<(), SimError> {
        self.check_poisoned()?;
        let result = self.step(engine);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    /// Runs `count × sub_cycles` nominal master-clock pulses with a standing
    /// sideband value, stopping early when the halt signal goes nonzero.
    pub fn run_cycles_with<E: Engine>(
        &mut self,
        engine: &mut E,
        count: u64,
        sideband_value: u64,
        sideband_active: bool,
    ) -> Result<BatchResult, SimError> {
        self.check_poisoned()?;
        self.apply_sideband(sideband_value, sideband_active);
        let total = count.saturating_mul(u64::from(self.sub_cycles));
        let mut cycles_run = 0;
        for _ in 0..total {
            if let Err(e) = self.pulse(engine) {
                self.poisoned = true;
                return Err(e);
            }
            cycles_run += 1;
            if let Some(halt) = self.halt {
                if self.values[halt.index()] != 0 {
                    break;
                }
            }
        }
        Ok(BatchResult { cycles_run })
    }

    /// Drives the sideband input for a batch: the value is masked to the
    /// input's width, with the input's top bit set while `active` holds.
    pub fn apply_sideband(&mut self, value: u64, active: bool) {
        if let Some(id) = self.sideband {
            let width = self.netlist.signal(id).width;
            let v = if active {
                value | (1u64 << (width - 1))
            } else {
                value
            };
            self.values[id.index()] = v & mask(width);
        }
    }

    /// One nominal pulse: master clock low, settle, record levels, master
    /// clock high, full micro-step. Without a master clock this is a plain
    /// micro-step.
    fn pulse<E: Engine>(&mut self, engine: &mut E) -> Result<(), SimError> {
        if let Some(clk) = self.master_clock {
            self.write(clk, 0);
            self.settle(engine)?;
            self.prev_clocks = self.clock_levels();
            self.write(clk, 1);
        }
        self.step(engine)
    }

    fn check_poisoned(&self) -> Result<(), SimError> {
        if self.poisoned {
            Err(SimError::NonConvergentSettle {
                iterations: MAX_SETTLE_ITERS,
            })
        } else {
            Ok(())
        }
    }

    fn step<E: Engine>(&mut self, engine: &mut E) -> Result<(), SimError> {
        self.settle(engine)?;
        engine.sample(self);
        for flag in &mut self.committed {
            *flag = false;
        }
        let prev = self.prev_clocks.clone();
        let mut edges = self.rising_edges(&prev);
        let mut iters = 0;
        while edges.iter().any(|&e| e) {
            self.commit(&edges);
            let before = self.clock_levels();
            self.settle(engine)?;
            edges = self.rising_edges(&before);
            iters += 1;
            if iters >= MAX_EDGE_ITERS {
                break;
            }
        }
        self.prev_clocks = self.clock_levels();
        Ok(())
    }

    fn clock_levels(&self) -> Vec<u64> {
        self.netlist
            .domains()
            .iter()
            .map(|d| self.values[d.clock.index()])
            .collect()
    }

    fn rising_edges(&self, before: &[u64]) -> Vec<bool> {
        self.netlist
            .domains()
            .iter()
            .enumerate()
            .map(|(i, d)| before[i] == 0 && self.values[d.clock.index()] != 0)
            .collect()
    }

    /// Commits staged values for every not-yet-committed register whose
    /// domain saw a rising edge. Staged values were sampled before any
    /// commit, so no register's new value is observed by another register's
    /// same-edge update.
    fn commit(&mut self, edges: &[bool]) {
        let netlist = Arc::clone(&self.netlist);
        for (i, sa) in netlist.seq_assigns().iter().enumerate() {
            if edges[sa.domain] && !self.committed[i] {
                self.values[sa.target.index()] = self.staged[i];
                self.committed[i] = true;
            }
        }
    }
}
