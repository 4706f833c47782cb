//! Conformance test helpers for the Relay simulation backends.
//!
//! Provides shared fixture documents (small but representative netlists) and
//! builders that construct the same design on every backend available on the
//! host, so integration tests can assert one contract across the interpreter,
//! the JIT, and the AOT path.

#![warn(missing_docs)]

use relay::{build, probe, Backend, SimOptions, Simulator};

/// An 8-bit register whose next value is always its own complement.
///
/// Two half-ticks (clock low, then high) commit `!0 = 0xFF`.
pub fn inverter_reg() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
        "regs": [ { "name": "q", "width": 8 } ],
        "nets": [ { "name": "next", "width": 8 } ],
        "gates": [ { "target": "next", "expr": { "type": "unary_op", "op": "~",
            "operand": { "type": "signal", "name": "q", "width": 8 },
            "width": 8 } } ],
        "processes": [ { "name": "p_q", "clock": "clk", "clocked": true,
            "statements": [ { "target": "q", "expr":
                { "type": "signal", "name": "next", "width": 8 } } ] } ]
    }"#
}

/// A free-running 8-bit counter clocked on `clk`.
pub fn counter8() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
        "regs": [ { "name": "counter", "width": 8 } ],
        "processes": [ { "name": "p_count", "clock": "clk", "clocked": true,
            "statements": [ { "target": "counter", "expr":
                { "type": "binary_op", "op": "+",
                  "left": { "type": "signal", "name": "counter", "width": 8 },
                  "right": { "type": "literal", "value": 1, "width": 8 },
                  "width": 8 } } ] } ]
    }"#
}

/// A purely combinational AND of two 4-bit inputs.
pub fn and_gate() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "a", "direction": "in", "width": 4 },
                   { "name": "b", "direction": "in", "width": 4 },
                   { "name": "y", "direction": "out", "width": 4 } ],
        "gates": [ { "target": "y", "expr": { "type": "binary_op", "op": "&",
            "left": { "type": "signal", "name": "a", "width": 4 },
            "right": { "type": "signal", "name": "b", "width": 4 },
            "width": 4 } } ]
    }"#
}

/// A 16-bit combinational mixer exercising every operator class: arithmetic,
/// shifts, comparisons, mux, slice, concat, and reductions.
pub fn op_mixer() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "a", "direction": "in", "width": 16 },
                   { "name": "b", "direction": "in", "width": 16 },
                   { "name": "sum", "direction": "out", "width": 16 },
                   { "name": "quot", "direction": "out", "width": 16 },
                   { "name": "shifted", "direction": "out", "width": 16 },
                   { "name": "picked", "direction": "out", "width": 16 },
                   { "name": "packed", "direction": "out", "width": 16 },
                   { "name": "parity", "direction": "out", "width": 1 } ],
        "gates": [
            { "target": "sum", "expr": { "type": "binary_op", "op": "+",
                "left": { "type": "signal", "name": "a", "width": 16 },
                "right": { "type": "signal", "name": "b", "width": 16 },
                "width": 16 } },
            { "target": "quot", "expr": { "type": "binary_op", "op": "/",
                "left": { "type": "signal", "name": "a", "width": 16 },
                "right": { "type": "signal", "name": "b", "width": 16 },
                "width": 16 } },
            { "target": "shifted", "expr": { "type": "binary_op", "op": "<<",
                "left": { "type": "signal", "name": "a", "width": 16 },
                "right": { "type": "slice",
                    "base": { "type": "signal", "name": "b", "width": 16 },
                    "low": 0, "high": 7, "width": 8 },
                "width": 16 } },
            { "target": "picked", "expr": { "type": "mux",
                "condition": { "type": "binary_op", "op": "<",
                    "left": { "type": "signal", "name": "a", "width": 16 },
                    "right": { "type": "signal", "name": "b", "width": 16 },
                    "width": 1 },
                "when_true": { "type": "signal", "name": "a", "width": 16 },
                "when_false": { "type": "signal", "name": "b", "width": 16 },
                "width": 16 } },
            { "target": "packed", "expr": { "type": "concat", "parts": [
                { "type": "slice",
                    "base": { "type": "signal", "name": "a", "width": 16 },
                    "low": 0, "high": 7, "width": 8 },
                { "type": "slice",
                    "base": { "type": "signal", "name": "b", "width": 16 },
                    "low": 8, "high": 15, "width": 8 } ],
                "width": 16 } },
            { "target": "parity", "expr": { "type": "unary_op",
                "op": "reduce_xor",
                "operand": { "type": "signal", "name": "a", "width": 16 },
                "width": 1 } }
        ]
    }"#
}

/// A design with a derived clock: `slow` toggles on `clk`, and `count`
/// advances on rising edges of `slow`, at half the master rate.
pub fn derived_clock() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "clk", "direction": "in", "width": 1 } ],
        "regs": [ { "name": "slow", "width": 1 },
                  { "name": "count", "width": 8 } ],
        "processes": [
            { "name": "p_slow", "clock": "clk", "clocked": true,
              "statements": [ { "target": "slow", "expr":
                  { "type": "unary_op", "op": "~",
                    "operand": { "type": "signal", "name": "slow", "width": 1 },
                    "width": 1 } } ] },
            { "name": "p_count", "clock": "slow", "clocked": true,
              "statements": [ { "target": "count", "expr":
                  { "type": "binary_op", "op": "+",
                    "left": { "type": "signal", "name": "count", "width": 8 },
                    "right": { "type": "literal", "value": 1, "width": 8 },
                    "width": 8 } } ] } ]
    }"#
}

/// A 16-word ROM read combinationally through a 4-bit address input, plus an
/// 8-bit accumulator that sums the addressed word each cycle. `rst` clears
/// the accumulator synchronously.
pub fn memory_system() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "clk", "direction": "in", "width": 1 },
                   { "name": "rst", "direction": "in", "width": 1 },
                   { "name": "addr", "direction": "in", "width": 4 },
                   { "name": "data", "direction": "out", "width": 8 } ],
        "regs": [ { "name": "acc", "width": 8 } ],
        "memories": [ { "name": "rom", "depth": 16, "width": 8,
            "initial_data": [1, 2, 3, 4] } ],
        "gates": [ { "target": "data", "expr": { "type": "mem_read",
            "memory": "rom",
            "addr": { "type": "signal", "name": "addr", "width": 4 },
            "width": 8 } } ],
        "processes": [ { "name": "p_acc", "clock": "clk", "clocked": true,
            "statements": [ { "target": "acc", "expr": { "type": "mux",
                "condition": { "type": "signal", "name": "rst", "width": 1 },
                "when_true": { "type": "literal", "value": 0, "width": 8 },
                "when_false": { "type": "binary_op", "op": "+",
                    "left": { "type": "signal", "name": "acc", "width": 8 },
                    "right": { "type": "signal", "name": "data", "width": 8 },
                    "width": 8 },
                "width": 8 } } ] } ]
    }"#
}

/// A counter with a `done` comparator net suitable as a halt signal, and a
/// `ctrl` input suitable as a sideband binding.
pub fn halting_counter() -> &'static [u8] {
    br#"{
        "ports": [ { "name": "clk", "direction": "in", "width": 1 },
                   { "name": "ctrl", "direction": "in", "width": 8 } ],
        "regs": [ { "name": "counter", "width": 8 } ],
        "nets": [ { "name": "done", "width": 1 } ],
        "gates": [ { "target": "done", "expr": { "type": "binary_op", "op": "==",
            "left": { "type": "signal", "name": "counter", "width": 8 },
            "right": { "type": "literal", "value": 10, "width": 8 },
            "width": 1 } } ],
        "processes": [ { "name": "p_count", "clock": "clk", "clocked": true,
            "statements": [ { "target": "counter", "expr":
                { "type": "binary_op", "op": "+",
                  "left": { "type": "signal", "name": "counter", "width": 8 },
                  "right": { "type": "literal", "value": 1, "width": 8 },
                  "width": 8 } } ] } ]
    }"#
}

/// Backends usable on this host, always including the interpreter.
pub fn available_backends() -> Vec<Backend> {
    let caps = probe();
    [Backend::Interpreter, Backend::Jit, Backend::Aot]
        .into_iter()
        .filter(|b| caps.supports(*b))
        .collect()
}

/// Builds `json` on one backend, panicking on failure (fixtures are valid).
pub fn build_fixture(backend: Backend, json: &[u8], options: &SimOptions) -> Box<dyn Simulator> {
    match build(backend, json, options, &probe()) {
        Ok(sim) => sim,
        Err(e) => panic!("fixture failed to build on {backend}: {e}"),
    }
}

/// Builds `json` on every available backend with the same options.
pub fn build_everywhere(json: &[u8], options: &SimOptions) -> Vec<Box<dyn Simulator>> {
    available_backends()
        .into_iter()
        .map(|backend| build_fixture(backend, json, options))
        .collect()
}

/// Peeks every declared signal, in declaration order.
pub fn snapshot(sim: &dyn Simulator) -> Vec<(String, u64)> {
    sim.netlist()
        .signals()
        .iter()
        .map(|info| {
            let value = match sim.peek(&info.name) {
                Ok(v) => v,
                Err(e) => panic!("peek of `{}` failed: {e}", info.name),
            };
            (info.name.clone(), value)
        })
        .collect()
}

/// Asserts that every backend in `sims` holds identical signal state.
pub fn assert_states_match(sims: &[Box<dyn Simulator>], context: &str) {
    let reference = snapshot(sims[0].as_ref());
    for sim in &sims[1..] {
        let other = snapshot(sim.as_ref());
        for ((name, expected), (_, actual)) in reference.iter().zip(&other) {
            assert_eq!(
                actual, expected,
                "{context}: `{name}` diverged on {} (reference {})",
                sim.backend(),
                sims[0].backend(),
            );
        }
    }
}
