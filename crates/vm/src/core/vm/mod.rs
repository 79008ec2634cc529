//! Virtual Machine implementation for intcode execution.
//!
//! This module provides the core VM struct and its execution logic,
//! organized into submodules for better maintainability.

mod core;
mod execution;

/// Instruction handlers organized by category.
pub mod handlers;

pub use self::core::Vm;
pub use execution::{ExecutionResult, Instruction, State};
