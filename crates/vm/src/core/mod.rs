/// Channels connecting VMs to each other and to external drivers
pub mod channel;

/// Constants used throughout the VM implementation
pub mod constants;

/// Input sources: blocking channels and polling functions
pub mod input;

/// Memory implementation for VM memory management
pub mod memory;

/// Opcode definitions and instruction word decoding
pub mod opcodes;

/// Program text parsing
pub mod program;

/// Core virtual machine implementation
pub mod vm;
