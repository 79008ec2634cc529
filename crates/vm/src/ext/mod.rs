/// Amplifier chains: VMs wired output-to-input, optionally closed into a feedback ring
pub mod pipeline;

/// NIC networks: many VMs exchanging packets through a supervising router
pub mod network;

/// Helpers for programs that speak ASCII over their channels
pub mod ascii;
