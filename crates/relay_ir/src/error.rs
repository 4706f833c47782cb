//! Error types for IR parsing and validation.

use thiserror::Error;

/// An error produced while parsing or validating an IR document.
///
/// All variants are fatal to the construction call that produced them: a
/// document that fails validation never reaches a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    /// The document violates the IR schema (bad JSON, unknown operator,
    /// out-of-range width, conflicting drivers, and so on).
    #[error("malformed IR: {reason}")]
    MalformedIr {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// An expression, register clock, or memory read refers to a name that
    /// no declaration provides.
    #[error("dangling reference: `{referenced_by}` refers to undeclared `{name}`")]
    DanglingReference {
        /// The undeclared name.
        name: String,
        /// The declaration whose body contains the reference.
        referenced_by: String,
    },

    /// Two declarations share one name.
    #[error("duplicate declaration name `{name}`")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// The combinational assignment graph contains a cycle that does not
    /// pass through a register.
    #[error("combinational cycle through signal `{signal}`")]
    CombinationalCycle {
        /// A signal on the detected cycle.
        signal: String,
    },
}

impl IrError {
    /// Shorthand for a [`IrError::MalformedIr`] with a formatted reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        IrError::MalformedIr {
            reason: reason.into(),
        }
    }
}
