//! RelayInterp — the tree-walking reference backend.
//!
//! Executes the netlist by direct structural evaluation each micro-step.
//! Slowest of the three backends; it is the oracle the native backends are
//! validated against and the fallback when neither is available.

#![warn(missing_docs)]

pub mod eval;

use std::sync::Arc;

use relay_harness::{Backend, BatchResult, Engine, ExecState, SimError, SimOptions, Simulator};
use relay_ir::{mask, Netlist};

use crate::eval::eval;

/// The interpreter's [`Engine`]: walks the linked expression trees directly.
struct InterpEngine {
    netlist: Arc<Netlist>,
}

impl Engine for InterpEngine {
    fn evaluate(&mut self, state: &mut ExecState) {
        for assign in self.netlist.assigns() {
            let v = eval(&assign.node, state.values(), state.memories());
            state.values_mut()[assign.target.index()] =
                v & mask(self.netlist.signal(assign.target).width);
        }
    }

    fn sample(&mut self, state: &mut ExecState) {
        for (i, sa) in self.netlist.seq_assigns().iter().enumerate() {
            let v = eval(&sa.node, state.values(), state.memories());
            state.staged_mut()[i] = v & mask(self.netlist.signal(sa.target).width);
        }
    }
}

/// The tree-walking backend.
pub struct Interpreter {
    state: ExecState,
    engine: InterpEngine,
}

impl Interpreter {
    /// Builds an interpreter from a serialized IR document.
    pub fn new(json: &[u8], options: &SimOptions) -> Result<Interpreter, SimError> {
        Interpreter::from_netlist(Arc::new(Netlist::parse(json)?), options)
    }

    /// Builds an interpreter from an already-linked netlist.
    pub fn from_netlist(
        netlist: Arc<Netlist>,
        options: &SimOptions,
    ) -> Result<Interpreter, SimError> {
        let state = ExecState::new(Arc::clone(&netlist), options)?;
        Ok(Interpreter {
            state,
            engine: InterpEngine { netlist },
        })
    }
}

impl Simulator for Interpreter {
    fn backend(&self) -> Backend {
        Backend::Interpreter
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

    fn inverter_reg() -> Interpreter {
        // One 8-bit register clocked by `clk`, data_in = ~q.
        Interpreter::new(
            br#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "regs": [ { "name": "q", "width": 8, "reset_value": 0 } ],
                "nets": [ { "name": "next", "width": 8 } ],
                "gates": [ { "target": "next", "expr": { "type": "unary_op", "op": "~",
                    "operand": { "type": "signal", "name": "q", "width": 8 },
                    "width": 8 } } ],
                "processes": [ { "name": "p0", "clock": "clk", "clocked": true,
                    "statements": [ { "target": "q", "expr":
                        { "type": "signal", "name": "next", "width": 8 } } ] } ]
            }"#,
            &SimOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn reset_value_visible_before_any_tick() {
        let sim = inverter_reg();
        assert_eq!(sim.peek("q").unwrap(), 0);
    }

    #[test]
    fn clock_pulse_commits_inverted_value() {
        let mut sim = inverter_reg();
        sim.poke("clk", 0).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("q").unwrap(), 0);
        sim.poke("clk", 1).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("q").unwrap(), 0xFF);
    }

    #[test]
    fn combinational_and_gate_tracks_inputs() {
        let mut sim = Interpreter::new(
            br#"{
                "ports": [ { "name": "a", "direction": "in", "width": 1 },
                           { "name": "b", "direction": "in", "width": 1 },
                           { "name": "y", "direction": "out", "width": 1 } ],
                "gates": [ { "target": "y", "expr": { "type": "binary_op", "op": "&",
                    "left": { "type": "signal", "name": "a", "width": 1 },
                    "right": { "type": "signal", "name": "b", "width": 1 },
                    "width": 1 } } ]
            }"#,
            &SimOptions::default(),
        )
        .unwrap();
        sim.poke("a", 1).unwrap();
        sim.poke("b", 1).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("y").unwrap(), 1);
        sim.poke("b", 0).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("y").unwrap(), 0);
    }

    #[test]
    fn free_running_counter_advances_one_per_pulse() {
        let mut sim = Interpreter::new(
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
        let result = sim.run_cycles(100, 0, false).unwrap();
        assert_eq!(result.cycles_run, 100);
        assert_eq!(sim.peek("counter").unwrap(), 100);

        // 300 total pulses wraps the 8-bit counter.
        sim.run_cycles(200, 0, false).unwrap();
        assert_eq!(sim.peek("counter").unwrap(), 300 % 256);
    }

    #[test]
    fn poke_round_trips_masked() {
        let mut sim = Interpreter::new(
            br#"{ "ports": [ { "name": "a", "direction": "in", "width": 4 } ] }"#,
            &SimOptions::default(),
        )
        .unwrap();
        sim.poke("a", 0x1F).unwrap();
        assert_eq!(sim.peek("a").unwrap(), 0xF);
        // Idempotent without intervening pokes or ticks.
        assert_eq!(sim.peek("a").unwrap(), 0xF);
    }

    #[test]
    fn derived_clock_divides_commit_rate() {
        // `slow` toggles on every `clk` rise; `count` is clocked by the
        // gate-derived `slow_clk`, so it advances once per two pulses.
        let mut sim = Interpreter::new(
            br#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "regs": [ { "name": "slow", "width": 1 },
                          { "name": "count", "width": 8 } ],
                "nets": [ { "name": "slow_clk", "width": 1 } ],
                "gates": [ { "target": "slow_clk", "expr":
                    { "type": "signal", "name": "slow", "width": 1 } } ],
                "processes": [
                    { "name": "toggler", "clock": "clk", "clocked": true,
                      "statements": [ { "target": "slow", "expr":
                          { "type": "unary_op", "op": "~",
                            "operand": { "type": "signal", "name": "slow", "width": 1 },
                            "width": 1 } } ] },
                    { "name": "counter", "clock": "slow_clk", "clocked": true,
                      "statements": [ { "target": "count", "expr":
                          { "type": "binary_op", "op": "+",
                            "left": { "type": "signal", "name": "count", "width": 8 },
                            "right": { "type": "literal", "value": 1, "width": 8 },
                            "width": 8 } } ] }
                ]
            }"#,
            &SimOptions {
                sub_cycles: 1,
                ..SimOptions::default()
            },
        )
        .unwrap();
        sim.run_cycles(20, 0, false).unwrap();
        assert_eq!(sim.peek("count").unwrap(), 10);
    }

    #[test]
    fn halt_signal_ends_batch_early() {
        // Counter halts the batch when it reaches 10.
        let mut sim = Interpreter::new(
            br#"{
                "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
                "regs": [ { "name": "counter", "width": 8 } ],
                "nets": [ { "name": "done", "width": 1 } ],
                "gates": [ { "target": "done", "expr": { "type": "binary_op", "op": "==",
                    "left": { "type": "signal", "name": "counter", "width": 8 },
                    "right": { "type": "literal", "value": 10, "width": 8 },
                    "width": 1 } } ],
                "processes": [ { "name": "p0", "clock": "clk", "clocked": true,
                    "statements": [ { "target": "counter", "expr":
                        { "type": "binary_op", "op": "+",
                          "left": { "type": "signal", "name": "counter", "width": 8 },
                          "right": { "type": "literal", "value": 1, "width": 8 },
                          "width": 8 } } ] } ]
            }"#,
            &SimOptions {
                sub_cycles: 1,
                halt_signal: Some("done".into()),
                ..SimOptions::default()
            },
        )
        .unwrap();
        let result = sim.run_cycles(100, 0, false).unwrap();
        assert_eq!(result.cycles_run, 10);
        assert_eq!(sim.peek("counter").unwrap(), 10);
    }

    #[test]
    fn memory_read_follows_address_register() {
        let mut sim = Interpreter::new(
            br#"{
                "ports": [ { "name": "addr", "direction": "in", "width": 2 },
                           { "name": "data", "direction": "out", "width": 8 } ],
                "memories": [ { "name": "rom", "depth": 4, "width": 8,
                    "initial_data": [11, 22, 33, 44] } ],
                "gates": [ { "target": "data", "expr": { "type": "mem_read",
                    "memory": "rom",
                    "addr": { "type": "signal", "name": "addr", "width": 2 },
                    "width": 8 } } ]
            }"#,
            &SimOptions::default(),
        )
        .unwrap();
        sim.poke("addr", 2).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("data").unwrap(), 33);
        // Cells are poke-addressable and feed the next evaluation.
        sim.poke("rom[2]", 99).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.peek("data").unwrap(), 99);
    }
}
