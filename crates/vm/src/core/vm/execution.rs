use crate::core::opcodes::Operation;

/// [`ExecutionResult`] is the result of running a VM until it halts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// The instruction pointer of the halt instruction.
    pub instruction: i64,

    /// The relative base when the VM halted.
    pub relative_base: i64,

    /// The number of instructions executed by this run, including the halt.
    pub steps: u64,
}

/// The lifecycle state of a VM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// Executing instructions.
    #[default]
    Running,

    /// Suspended in an Input instruction until a value is available.
    WaitingOnInput,

    /// Executed the halt instruction. This is the only normal terminal state.
    Halted,

    /// An instruction failed. The VM cannot continue until it is reset.
    Faulted,
}

/// [`Instruction`] is a single executed intcode instruction. It is returned by the
/// [`super::Vm::step`] function for tracing execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The position of this instruction in memory.
    pub instruction: i64,

    /// The raw instruction word, including parameter modes.
    pub word: i64,

    /// The operation that was executed.
    pub operation: Operation,
}
