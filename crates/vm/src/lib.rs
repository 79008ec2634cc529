//! Intcode Virtual Machine implementation
//!
//! This crate provides an asynchronous intcode VM, including the core VM components and extension
//! modules that wire many VMs together into pipelines and networks.

/// Core VM implementation, including memory, opcodes, channels and the execution engine
pub mod core;

/// Extensions to the core VM: amplifier pipelines, NIC networks and ASCII helpers
pub mod ext;

/// Error types returned by the VM
pub mod error;

pub use error::Error;
