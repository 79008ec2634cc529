//! Intcode instruction handlers organized by category.
//!
//! Each submodule contains handler functions for related instructions. A handler either fully
//! applies its instruction or returns an error before mutating any state.

/// Arithmetic operations: ADD, MUL
pub mod arithmetic;

/// Comparison operations: LESS_THAN, EQUALS
pub mod comparison;

/// Control flow: JUMP_IF_TRUE, JUMP_IF_FALSE, ADJUST_RELATIVE_BASE, HALT
pub mod control;

/// Input and output: INPUT, OUTPUT
pub mod io;
