pub use intcode_config::{
    DEFAULT_IDLE_INPUT, DEFAULT_MEMORY_LIMIT, DEFAULT_POLL_INTERVAL_MS, DEFAULT_YIELD_INTERVAL,
};

/// A packet addressed here stops a network instead of being delivered.
pub const DEFAULT_STOP_ADDRESS: i64 = 255;

/// The number of words in a network packet: destination, x and y.
pub const PACKET_SIZE: usize = 3;

/// The line terminator of ASCII-speaking programs.
pub const NEWLINE: i64 = 10;
