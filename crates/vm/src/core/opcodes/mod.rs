//! Intcode opcodes and instruction word decoding.
//!
//! This module provides:
//! - Opcode information (names, parameter counts, word sizes)
//! - The [`Operation`] enum, one variant per instruction of the closed instruction set
//! - Decoding of an instruction word into its opcode and per-parameter [`ParameterMode`]s

use std::fmt;

use crate::error::Error;

/// Information about an opcode, such as its name and how many words it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpCodeInfo {
    /// Name
    name: &'static str,
    /// Number of parameter words following the opcode word.
    parameters: u8,
    /// Index of the parameter written to, if any.
    writes: Option<u8>,
}

impl OpCodeInfo {
    /// Creates a new opcode info with the given name and default values.
    pub const fn new(name: &'static str) -> Self {
        Self { name, parameters: 0, writes: None }
    }

    /// Returns the name of the opcode.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the number of parameters.
    #[inline]
    pub const fn parameters(&self) -> u8 {
        self.parameters
    }

    /// Returns the index of the parameter this opcode writes to.
    #[inline]
    pub const fn writes(&self) -> Option<u8> {
        self.writes
    }

    /// Returns the total number of words consumed, including the opcode word.
    #[inline]
    pub const fn size(&self) -> i64 {
        self.parameters() as i64 + 1
    }
}

/// Sets the number of parameters.
#[inline]
pub const fn params(mut op: OpCodeInfo, parameters: u8) -> OpCodeInfo {
    op.parameters = parameters;
    op
}

/// Marks the given parameter as a write target.
#[inline]
pub const fn writes(mut op: OpCodeInfo, parameter: u8) -> OpCodeInfo {
    op.writes = Some(parameter);
    op
}

macro_rules! opcodes {
    ($($val:literal => $name:ident => $variant:ident $(=> $($modifier:ident $(( $($modifier_arg:expr),* ))?),*)?);* $(;)?) => {
        // create a constant for each opcode
        $(
            #[doc = concat!("The `", stringify!($val), "` (\"", stringify!($name),"\") opcode.")]
            pub const $name: i64 = $val;
        )*

        /// An instruction of the intcode instruction set.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $(
                #[doc = concat!("`", stringify!($name), "` (opcode ", stringify!($val), ")")]
                $variant,
            )*
        }

        impl Operation {
            /// Every operation of the instruction set, in ascending opcode order.
            pub const ALL: &'static [Operation] = &[$(Operation::$variant),*];

            /// Returns the numeric opcode of this operation.
            #[inline]
            pub const fn opcode(&self) -> i64 {
                match self {
                    $(Operation::$variant => $val,)*
                }
            }

            /// Returns the [`OpCodeInfo`] of this operation.
            pub const fn info(&self) -> OpCodeInfo {
                match self {
                    $(
                        Operation::$variant => {
                            let info = OpCodeInfo::new(stringify!($name));
                            $($(
                            let info = $modifier(info, $($($modifier_arg),*)?);
                            )*)?
                            info
                        }
                    )*
                }
            }
        }

        impl TryFrom<i64> for Operation {
            type Error = i64;

            /// Looks up the operation for a decoded opcode, returning the opcode back if it is
            /// not part of the instruction set.
            fn try_from(opcode: i64) -> Result<Self, Self::Error> {
                match opcode {
                    $($val => Ok(Operation::$variant),)*
                    other => Err(other),
                }
            }
        }
    }
}

opcodes! {
    1 => ADD => Add => params(3), writes(2);
    2 => MUL => Multiply => params(3), writes(2);
    3 => INPUT => Input => params(1), writes(0);
    4 => OUTPUT => Output => params(1);
    5 => JUMP_IF_TRUE => JumpIfTrue => params(2);
    6 => JUMP_IF_FALSE => JumpIfFalse => params(2);
    7 => LESS_THAN => LessThan => params(3), writes(2);
    8 => EQUALS => Equals => params(3), writes(2);
    9 => ADJUST_RELATIVE_BASE => AdjustRelativeBase => params(1);
    99 => HALT => Halt;
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name())
    }
}

/// Get the name of an opcode.
#[inline]
pub fn opcode_name(opcode: i64) -> &'static str {
    Operation::try_from(opcode).map(|op| op.info().name()).unwrap_or("unknown")
}

/// The addressing mode of a single instruction parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterMode {
    /// The parameter is an address to dereference.
    #[default]
    Position,

    /// The parameter is a literal value. Cannot be written to.
    Immediate,

    /// The parameter is an offset from the relative base, then dereferenced.
    Relative,
}

impl TryFrom<i64> for ParameterMode {
    type Error = i64;

    fn try_from(digit: i64) -> Result<Self, Self::Error> {
        match digit {
            0 => Ok(ParameterMode::Position),
            1 => Ok(ParameterMode::Immediate),
            2 => Ok(ParameterMode::Relative),
            other => Err(other),
        }
    }
}

/// A decoded instruction word: the opcode plus the parameter mode digits.
///
/// ```
/// use intcode_vm::core::opcodes::{Opcode, ParameterMode};
///
/// let opcode = Opcode::decode(1002);
/// assert_eq!(opcode.opcode, 2);
/// assert_eq!(opcode.mode_digit(0), 0);
/// assert_eq!(opcode.mode_digit(1), 1);
/// assert_eq!(opcode.parameter_mode(2).expect("invalid mode"), ParameterMode::Position);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    /// The raw instruction word.
    pub word: i64,

    /// The opcode, `word mod 100`.
    pub opcode: i64,

    /// The mode digits, `word / 100`. The least significant digit belongs to the first parameter.
    modes: i64,
}

impl Opcode {
    /// Decodes an instruction word.
    pub fn decode(word: i64) -> Self {
        Self { word, opcode: word.rem_euclid(100), modes: word.div_euclid(100) }
    }

    /// Returns the mode digit of the `parameter`-th parameter (0-indexed). Digits past the
    /// encoded ones are 0.
    pub fn mode_digit(&self, parameter: usize) -> i64 {
        let mut modes = self.modes;
        for _ in 0..parameter {
            if modes == 0 {
                return 0;
            }
            modes = modes.div_euclid(10);
        }
        modes.rem_euclid(10)
    }

    /// Returns the [`ParameterMode`] of the `parameter`-th parameter (0-indexed).
    pub fn parameter_mode(&self, parameter: usize) -> Result<ParameterMode, Error> {
        let mode = self.mode_digit(parameter);
        ParameterMode::try_from(mode).map_err(|mode| Error::InvalidParameterMode { parameter, mode })
    }

    /// Looks up the [`Operation`] for this word.
    pub fn operation(&self, ip: i64) -> Result<Operation, Error> {
        Operation::try_from(self.opcode)
            .map_err(|opcode| Error::UnknownOpcode { opcode, ip })
    }
}
