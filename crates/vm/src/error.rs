//! Error types for the intcode VM

use crate::core::vm::State;

/// Error type for the intcode VM.
///
/// Runtime errors raised while executing an instruction are surfaced by [`crate::core::vm::Vm`]
/// wrapped in [`Error::Faulted`], which records where execution stopped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Program text is not a comma-separated list of integers.
    #[error("malformed program: token {index} ({token:?}) is not a valid integer")]
    MalformedProgram {
        /// Zero-based position of the offending token.
        index: usize,
        /// The offending token.
        token: String,
    },

    /// A computed address is negative.
    #[error("negative address {0}")]
    NegativeAddress(i64),

    /// A computed address lies beyond the configured memory limit.
    #[error("address {address} exceeds the memory limit of {limit} words")]
    AddressOutOfRange {
        /// The requested address.
        address: i64,
        /// The configured memory limit.
        limit: usize,
    },

    /// A write-position parameter uses immediate mode.
    #[error("parameter {parameter} is a write target but uses immediate mode")]
    InvalidWriteMode {
        /// Zero-based parameter index.
        parameter: usize,
    },

    /// An operation without a write target was asked for one.
    #[error("{operation} does not write to memory")]
    NoWriteTarget {
        /// The name of the operation.
        operation: &'static str,
    },

    /// A parameter mode digit is not 0, 1 or 2.
    #[error("parameter {parameter} has unsupported mode {mode}")]
    InvalidParameterMode {
        /// Zero-based parameter index.
        parameter: usize,
        /// The offending mode digit.
        mode: i64,
    },

    /// The decoded opcode is not part of the instruction set.
    #[error("unknown opcode {opcode} at ip {ip}")]
    UnknownOpcode {
        /// The decoded opcode (`word mod 100`).
        opcode: i64,
        /// The instruction pointer of the offending word.
        ip: i64,
    },

    /// An arithmetic instruction overflowed the 64-bit word.
    #[error("{operation} overflowed at ip {ip}")]
    Overflow {
        /// The name of the overflowing operation.
        operation: &'static str,
        /// The instruction pointer of the overflowing instruction.
        ip: i64,
    },

    /// An instruction failed; the VM is now [`State::Faulted`].
    #[error("vm faulted at ip {ip} (opcode {opcode})")]
    Faulted {
        /// The instruction pointer of the failing instruction.
        ip: i64,
        /// The decoded opcode of the failing instruction.
        opcode: i64,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// The VM cannot make progress from its current state.
    #[error("vm is not runnable in state {state:?}")]
    NotRunnable {
        /// The state the VM was in.
        state: State,
    },
}

impl Error {
    /// Returns the underlying error of a [`Error::Faulted`], or `self` otherwise.
    pub fn root(&self) -> &Error {
        match self {
            Error::Faulted { source, .. } => source.root(),
            other => other,
        }
    }
}
