//! The simulation error taxonomy.

use thiserror::Error;

use crate::backend::Backend;
use relay_ir::IrError;

/// An error raised by simulator construction or stepping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The IR document failed parsing or validation.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// A `peek`/`poke` name did not resolve in the loaded netlist.
    ///
    /// Local to the call; simulator state is untouched and the call is safe
    /// to retry with a corrected name.
    #[error("unknown signal `{name}`")]
    UnknownSignal {
        /// The unresolved name.
        name: String,
    },

    /// `poke` was applied to a signal that is not an input port.
    #[error("signal `{name}` is not an input")]
    NotAnInput {
        /// The poked name.
        name: String,
    },

    /// The requested backend's native support is absent on this system.
    ///
    /// Callers should check [`BackendCapabilities`](crate::BackendCapabilities)
    /// first and pick a fallback instead of relying on this as control flow.
    #[error("backend `{backend}` is unavailable on this system")]
    BackendUnavailable {
        /// The requested backend.
        backend: Backend,
    },

    /// Runtime or ahead-of-time code generation failed.
    ///
    /// Fatal at construction; never degrades silently to another backend.
    #[error("{backend} compilation failed: {reason}")]
    CompileFailure {
        /// The backend whose compilation failed.
        backend: Backend,
        /// Toolchain or code generator diagnostics.
        reason: String,
    },

    /// Combinational evaluation did not reach a fixpoint within the
    /// iteration bound.
    ///
    /// Fatal to the simulator instance: every further step returns this same
    /// error, and callers must rebuild rather than continue stepping.
    #[error("combinational logic failed to settle after {iterations} iterations")]
    NonConvergentSettle {
        /// The iteration bound that was exhausted.
        iterations: u32,
    },
}
