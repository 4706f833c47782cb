//! RelayAot — the ahead-of-time native-compilation backend.
//!
//! The entire flattened netlist is translated to Rust source, built into a
//! shared object by one blocking `rustc` invocation at construction, and
//! loaded with `libloading`. Construction is the slow path (seconds, unless
//! the artifact cache hits); steady-state stepping is the fastest of the
//! three backends, which callers amortize over long runs.
//!
//! `sub_cycles` and the master-clock/sideband/halt bindings are baked into
//! the generated code at build time. IR validation happens before any
//! source is generated, so a malformed document never reaches the
//! toolchain.

#![warn(missing_docs)]

pub mod codegen;
pub mod toolchain;

use std::sync::Arc;

use libloading::Library;

use relay_harness::{Backend, BatchResult, ExecState, SimError, SimOptions, Simulator};
use relay_ir::Netlist;

use crate::codegen::BakedOptions;

pub use toolchain::toolchain_available;

type TickFn = unsafe extern "C" fn(*mut u64, *mut u64, *mut u64, *const *const u64);
type RunBatchFn =
    unsafe extern "C" fn(*mut u64, *mut u64, *mut u64, *const *const u64, u64, u64, u8) -> u64;

fn load_error(e: impl ToString) -> SimError {
    SimError::CompileFailure {
        backend: Backend::Aot,
        reason: e.to_string(),
    }
}

/// The ahead-of-time compiled backend.
pub struct AotSimulator {
    state: ExecState,
    tick_fn: TickFn,
    run_batch_fn: RunBatchFn,
    // Owns the mapped code the function pointers point into.
    _library: Library,
}

impl AotSimulator {
    /// Builds an AOT simulator from a serialized IR document.
    ///
    /// Validation errors surface before the toolchain is ever invoked;
    /// toolchain failures surface as `CompileFailure`, never as a partially
    /// usable simulator.
    pub fn new(json: &[u8], options: &SimOptions) -> Result<AotSimulator, SimError> {
        AotSimulator::from_netlist(Arc::new(Netlist::parse(json)?), options)
    }

    /// Builds an AOT simulator from an already-linked netlist.
    pub fn from_netlist(
        netlist: Arc<Netlist>,
        options: &SimOptions,
    ) -> Result<AotSimulator, SimError> {
        let state = ExecState::new(Arc::clone(&netlist), options)?;
        let baked = BakedOptions {
            sub_cycles: state.sub_cycles(),
            master_clock: state.master_clock(),
            sideband: state.sideband_input(),
            halt: state.halt_signal(),
        };
        let source = codegen::generate(&netlist, &baked);
        let lib_path = toolchain::build(&source)?;
        let library = unsafe { Library::new(&lib_path) }.map_err(load_error)?;
        let tick_fn = unsafe { *library.get::<TickFn>(b"tick").map_err(load_error)? };
        let run_batch_fn =
            unsafe { *library.get::<RunBatchFn>(b"run_batch").map_err(load_error)? };
        Ok(AotSimulator {
            state,
            tick_fn,
            run_batch_fn,
            _library: library,
        })
    }

    fn mem_ptrs(&self) -> Vec<*const u64> {
        self.state.memories().iter().map(|m| m.as_ptr()).collect()
    }
}

impl Simulator for AotSimulator {
    fn backend(&self) -> Backend {
        Backend::Aot
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
        let mem_ptrs = self.mem_ptrs();
        let signals = self.state.values_mut().as_mut_ptr();
        let staged = self.state.staged_mut().as_mut_ptr();
        let prev = self.state.prev_clocks_mut().as_mut_ptr();
        unsafe { (self.tick_fn)(signals, staged, prev, mem_ptrs.as_ptr()) };
        Ok(())
    }

    fn run_cycles(
        &mut self,
        count: u64,
        sideband_value: u64,
        sideband_active: bool,
    ) -> Result<BatchResult, SimError> {
        let mem_ptrs = self.mem_ptrs();
        let signals = self.state.values_mut().as_mut_ptr();
        let staged = self.state.staged_mut().as_mut_ptr();
        let prev = self.state.prev_clocks_mut().as_mut_ptr();
        let cycles_run = unsafe {
            (self.run_batch_fn)(
                signals,
                staged,
                prev,
                mem_ptrs.as_ptr(),
                count,
                sideband_value,
                u8::from(sideband_active),
            )
        };
        Ok(BatchResult { cycles_run })
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}
