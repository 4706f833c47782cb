//! RelayJit — the Cranelift runtime-compilation backend.
//!
//! Same observable contract as the interpreter, with the per-step tree walk
//! replaced by machine code generated once at construction. The surrounding
//! micro-step algorithm is the harness driver shared with the interpreter,
//! so the two backends commit identical register sequences at every
//! micro-step boundary.
//!
//! Compilation failures surface as `CompileFailure` from the constructor;
//! there is no silent fallback to interpretation.

#![warn(missing_docs)]

pub mod compile;

use std::sync::Arc;

use cranelift_jit::JITModule;

use relay_harness::{Backend, BatchResult, Engine, ExecState, SimError, SimOptions, Simulator};
use relay_ir::Netlist;

use crate::compile::{EvaluateFn, SampleFn};

/// Returns whether Cranelift supports the host ISA.
pub fn available() -> bool {
    cranelift_native::builder().is_ok()
}

/// The compiled engine: two function pointers into the module's code.
///
/// The module must outlive the pointers; it is held here and never exposed.
struct JitEngine {
    _module: JITModule,
    evaluate_fn: EvaluateFn,
    sample_fn: SampleFn,
}

impl Engine for JitEngine {
    fn evaluate(&mut self, state: &mut ExecState) {
        let mem_ptrs: Vec<*const u64> = state.memories().iter().map(|m| m.as_ptr()).collect();
        let signals = state.values_mut().as_mut_ptr();
        unsafe { (self.evaluate_fn)(signals, mem_ptrs.as_ptr()) }
    }

    fn sample(&mut self, state: &mut ExecState) {
        let mem_ptrs: Vec<*const u64> = state.memories().iter().map(|m| m.as_ptr()).collect();
        let signals = state.values_mut().as_mut_ptr();
        let staged = state.staged_mut().as_mut_ptr();
        unsafe { (self.sample_fn)(signals, staged, mem_ptrs.as_ptr()) }
    }
}

/// The runtime-compilation backend.
pub struct JitSimulator {
    state: ExecState,
    engine: JitEngine,
}

impl JitSimulator {
    /// Builds a JIT simulator from a serialized IR document. The whole
    /// netlist is compiled here, before the first step.
    pub fn new(json: &[u8], options: &SimOptions) -> Result<JitSimulator, SimError> {
        JitSimulator::from_netlist(Arc::new(Netlist::parse(json)?), options)
    }

    /// Builds a JIT simulator from an already-linked netlist.
    pub fn from_netlist(
        netlist: Arc<Netlist>,
        options: &SimOptions,
    ) -> Result<JitSimulator, SimError> {
        let (module, evaluate_fn, sample_fn) = compile::compile(&netlist)?;
        let state = ExecState::new(netlist, options)?;
        Ok(JitSimulator {
            state,
            engine: JitEngine {
                _module: module,
                evaluate_fn,
                sample_fn,
            },
        })
    }
}

impl Simulator for JitSimulator {
    fn backend(&self) -> Backend {
        Backend::Jit
    }

    fn netlist(&self) -> &Netlist {
        self.state.netlist()
    }

    fn sub_cycles(&self) -> u32 {
        self.state.sub_cycles()
    }

    fn peek(&self, name: &str) -> Result<u64, SimError> {
        self.state.peek(name)
    }

    fn poke(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        self.state.poke(name, value)
    }

    fn tick(&mut self) -> Result<(), SimError> {
        self.state.tick_with(&mut self.engine)
    }

    fn run_cycles(
        &mut self,
        count: u64,
        sideband_value: u64,
        sideband_active: bool,
    ) -> Result<BatchResult, SimError> {
        self.state
            .run_cycles_with(&mut self.engine, count, sideband_value, sideband_active)
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_interp::Interpreter;

    const ALU: &[u8] = br#"{
        "ports": [ { "name": "a", "direction": "in", "width": 16 },
                   { "name": "b", "direction": "in", "width": 16 },
                   { "name": "op", "direction": "in", "width": 2 },
                   { "name": "y", "direction": "out", "width": 16 } ],
        "gates": [ { "target": "y", "expr": { "type": "mux",
            "condition": { "type": "binary_op", "op": "==",
                "left": { "type": "signal", "name": "op", "width": 2 },
                "right": { "type": "literal", "value": 0, "width": 2 }, "width": 1 },
            "when_true": { "type": "binary_op", "op": "+",
                "left": { "type": "signal", "name": "a", "width": 16 },
                "right": { "type": "signal", "name": "b", "width": 16 }, "width": 16 },
            "when_false": { "type": "mux",
                "condition": { "type": "binary_op", "op": "==",
                    "left": { "type": "signal", "name": "op", "width": 2 },
                    "right": { "type": "literal", "value": 1, "width": 2 }, "width": 1 },
                "when_true": { "type": "binary_op", "op": "/",
                    "left": { "type": "signal", "name": "a", "width": 16 },
                    "right": { "type": "signal", "name": "b", "width": 16 }, "width": 16 },
                "when_false": { "type": "binary_op", "op": "<<",
                    "left": { "type": "signal", "name": "a", "width": 16 },
                    "right": { "type": "signal", "name": "b", "width": 16 }, "width": 16 },
                "width": 16 },
            "width": 16 } } ]
    }"#;

    #[test]
    fn compiled_alu_matches_interpreter() {
        if !available() {
            return;
        }
        let mut jit = JitSimulator::new(ALU, &SimOptions::default()).unwrap();
        let mut interp = Interpreter::new(ALU, &SimOptions::default()).unwrap();
        for (a, b, op) in [
            (0xFFFFu64, 0x0001u64, 0u64), // wrapping add
            (42, 0, 1),                   // division by zero
            (42, 5, 1),
            (1, 200, 2), // oversized shift
            (0x1234, 4, 2),
        ] {
            for sim in [&mut jit as &mut dyn Simulator, &mut interp] {
                sim.poke("a", a).unwrap();
                sim.poke("b", b).unwrap();
                sim.poke("op", op).unwrap();
                sim.tick().unwrap();
            }
            assert_eq!(
                jit.peek("y").unwrap(),
                interp.peek("y").unwrap(),
                "a={a:#x} b={b:#x} op={op}"
            );
        }
    }

    #[test]
    fn compiled_counter_runs_batches() {
        if !available() {
            return;
        }
        let mut sim = JitSimulator::new(
            br#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "regs": [ { "name": "counter", "width": 8 } ],
                "processes": [ { "name": "p0", "clock": "clk", "clocked": true,
                    "statements": [ { "target": "counter", "expr":
                        { "type": "binary_op", "op": "+",
                          "left": { "type": "signal", "name": "counter", "width": 8 },
                          "right": { "type": "literal", "value": 1, "width": 8 },
                          "width": 8 } } ] } ]
            }"#,
            &SimOptions {
                sub_cycles: 1,
                ..SimOptions::default()
            },
        )
        .unwrap();
        assert_eq!(sim.peek("counter").unwrap(), 0);
        let result = sim.run_cycles(100, 0, false).unwrap();
        assert_eq!(result.cycles_run, 100);
        assert_eq!(sim.peek("counter").unwrap(), 100);
    }

    #[test]
    fn memory_reads_reach_live_contents() {
        if !available() {
            return;
        }
        let mut sim = JitSimulator::new(
            br#"{
                "ports": [ { "name": "addr", "direction": "in", "width": 4 },
                           { "name": "data", "direction": "out", "width": 8 } ],
                "memories": [ { "name": "ram", "depth": 16, "width": 8 } ],
                "gates": [ { "target": "data", "expr": { "type": "mem_read",
                    "memory": "ram",
                    "addr": { "type": "signal", "name": "addr", "width": 4 },
                    "width": 8 } } ]
            }"#,
            &SimOptions::default(),
        )
        .unwrap();
        sim.poke("ram[7]", 0xAB).unwrap();
        sim.poke("addr", 7).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("data").unwrap(), 0xAB);
    }
}
