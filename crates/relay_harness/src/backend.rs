//! Backend identity and capability discovery.

use std::fmt;

/// The three interchangeable execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Tree-walking reference interpreter; always available.
    Interpreter,
    /// Cranelift runtime code generation.
    Jit,
    /// Ahead-of-time native compilation via an external toolchain.
    Aot,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Interpreter => "interpreter",
            Backend::Jit => "jit",
            Backend::Aot => "aot",
        })
    }
}

/// Which backends are usable on the current system.
///
/// Populated once by probing (the facade crate's `probe()`) and passed
/// explicitly to whatever selects a backend; never read as ambient global
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// The interpreter needs no native support.
    pub interpreter: bool,
    /// Whether the Cranelift JIT supports the host ISA.
    pub jit: bool,
    /// Whether the native toolchain for AOT compilation is installed.
    pub aot: bool,
}

impl BackendCapabilities {
    /// Returns whether `backend` is usable.
    pub fn supports(&self, backend: Backend) -> bool {
        match backend {
            Backend::Interpreter => self.interpreter,
            Backend::Jit => self.jit,
            Backend::Aot => self.aot,
        }
    }
}
