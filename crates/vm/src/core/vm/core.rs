use intcode_config::{Configuration, DEFAULT_YIELD_INTERVAL};
use tracing::{debug, warn};

#[cfg(feature = "step-tracing")]
use tracing::trace;

use crate::{
    core::opcodes::{opcode_name, Opcode, Operation},
    error::Error,
};

use super::super::{channel::Channel, input::InputSource, memory::Memory};

use super::{
    execution::{ExecutionResult, Instruction, State},
    handlers,
};

/// The [`Vm`] struct represents an intcode machine instance. \
/// It owns its [`Memory`], instruction pointer and relative base, and shares only its input
/// source and output [`Channel`] with the outside world.
#[derive(Debug)]
pub struct Vm {
    /// The VM memory. Writing to it before [`Vm::run`] alters the program, e.g. flipping a
    /// mode flag stored in cell 0.
    pub memory: Memory,

    /// The current instruction pointer.
    pub instruction: i64,

    /// The relative base register used by relative-mode parameters.
    pub relative_base: i64,

    /// The lifecycle state of the VM.
    pub state: State,

    /// The program the VM was built from, kept for [`Vm::reset`].
    program: Vec<i64>,

    /// Where Input instructions acquire their values.
    input: Box<dyn InputSource>,

    /// Where Output instructions emit their values.
    output: Channel,

    /// The value consumed by an Input instruction when the input source has nothing ready. When
    /// unset, the VM keeps waiting instead.
    idle_input: Option<i64>,

    /// Yield to the scheduler after this many steps without suspending. 0 disables yielding.
    yield_interval: u64,

    /// The total number of instructions executed since construction or the last reset.
    steps: u64,
}

impl Vm {
    /// Creates a new [`Vm`] with an independent copy of `program` as its memory.
    ///
    /// ```
    /// use intcode_vm::core::{channel::Channel, vm::{State, Vm}};
    ///
    /// let vm = Vm::new(&[99], Channel::new(), Channel::new());
    /// assert_eq!(vm.instruction, 0);
    /// assert_eq!(vm.state, State::Running);
    /// ```
    pub fn new(program: &[i64], input: impl InputSource + 'static, output: Channel) -> Vm {
        Vm {
            memory: Memory::new(program),
            instruction: 0,
            relative_base: 0,
            state: State::Running,
            program: program.to_vec(),
            input: Box::new(input),
            output,
            idle_input: None,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            steps: 0,
        }
    }

    /// Applies the memory limit and yield interval of `config`.
    pub fn with_config(mut self, config: &Configuration) -> Self {
        self.memory.set_limit(config.memory_limit);
        self.yield_interval = config.yield_interval;
        self
    }

    /// Sets the value an Input instruction consumes when its source reports nothing ready.
    pub fn with_idle_input(mut self, idle_input: Option<i64>) -> Self {
        self.idle_input = idle_input;
        self
    }

    /// The channel Output instructions emit to.
    pub fn output(&self) -> &Channel {
        &self.output
    }

    /// The total number of instructions executed since construction or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Whether the VM has executed its halt instruction.
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Resolves the value of parameter `parameter` of the current instruction.
    pub(crate) fn read_parameter(&mut self, opcode: &Opcode, parameter: usize) -> Result<i64, Error> {
        let mode = opcode.parameter_mode(parameter)?;
        self.memory.resolve_read(self.instruction, parameter, mode, self.relative_base)
    }

    /// Resolves and validates the address the current instruction writes to, as given by the
    /// write parameter of `operation`. A returned address is guaranteed to be writable.
    pub(crate) fn write_address(
        &mut self,
        opcode: &Opcode,
        operation: Operation,
    ) -> Result<i64, Error> {
        let info = operation.info();
        let parameter =
            info.writes().ok_or(Error::NoWriteTarget { operation: info.name() })? as usize;
        let mode = opcode.parameter_mode(parameter)?;
        let address =
            self.memory.resolve_write_address(self.instruction, parameter, mode, self.relative_base)?;
        self.memory.check(address)?;
        Ok(address)
    }

    /// Moves the instruction pointer past the current instruction.
    pub(crate) fn advance(&mut self, operation: Operation) {
        self.instruction += operation.info().size();
    }

    /// Acquires the next input value, suspending in [`State::WaitingOnInput`] until one is
    /// available.
    pub(crate) async fn acquire_input(&mut self) -> i64 {
        self.state = State::WaitingOnInput;
        let value = loop {
            match self.input.acquire().await {
                Some(value) => break value,
                None => match self.idle_input {
                    Some(idle) => break idle,
                    None => tokio::task::yield_now().await,
                },
            }
        };
        self.state = State::Running;
        value
    }

    /// Emits a value to the output channel.
    pub(crate) fn emit(&mut self, value: i64) {
        self.output.send(value);
    }

    /// Fetches, decodes and executes the instruction at the instruction pointer.
    async fn _step(&mut self) -> Result<Instruction, Error> {
        let last_instruction = self.instruction;
        let opcode = Opcode::decode(self.memory.read(last_instruction)?);
        let operation = opcode.operation(last_instruction)?;

        // if step-tracing feature is enabled, print the current operation
        #[cfg(feature = "step-tracing")]
        trace!(
            ip = last_instruction,
            word = opcode.word,
            opcode = operation.info().name(),
            relative_base = self.relative_base,
            "executing instruction"
        );

        match operation {
            Operation::Add => handlers::arithmetic::add(self, &opcode)?,
            Operation::Multiply => handlers::arithmetic::mul(self, &opcode)?,
            Operation::Input => handlers::io::input(self, &opcode).await?,
            Operation::Output => handlers::io::output(self, &opcode)?,
            Operation::JumpIfTrue => handlers::control::jump_if_true(self, &opcode)?,
            Operation::JumpIfFalse => handlers::control::jump_if_false(self, &opcode)?,
            Operation::LessThan => handlers::comparison::less_than(self, &opcode)?,
            Operation::Equals => handlers::comparison::equals(self, &opcode)?,
            Operation::AdjustRelativeBase => {
                handlers::control::adjust_relative_base(self, &opcode)?
            }
            Operation::Halt => handlers::control::halt(self),
        }

        self.steps += 1;
        Ok(Instruction { instruction: last_instruction, word: opcode.word, operation })
    }

    /// Executes the next instruction. Returns information about the instruction executed.
    ///
    /// Any error moves the VM to [`State::Faulted`] and is returned wrapped in
    /// [`Error::Faulted`], recording the instruction pointer and opcode that failed.
    ///
    /// ```
    /// use intcode_vm::core::{channel::Channel, opcodes::Operation, vm::{State, Vm}};
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let mut vm = Vm::new(&[1101, 2, 3, 0, 99], Channel::new(), Channel::new());
    ///
    /// let instruction = vm.step().await.expect("step failed");
    /// assert_eq!(instruction.operation, Operation::Add);
    /// assert_eq!(vm.memory.memory[0], 5);
    /// assert_eq!(vm.instruction, 4);
    ///
    /// vm.step().await.expect("step failed");
    /// assert_eq!(vm.state, State::Halted);
    /// # }
    /// ```
    pub async fn step(&mut self) -> Result<Instruction, Error> {
        if matches!(self.state, State::Halted | State::Faulted) {
            return Err(Error::NotRunnable { state: self.state });
        }

        let ip = self.instruction;
        match self._step().await {
            Ok(instruction) => Ok(instruction),
            Err(source) => {
                let opcode = Opcode::decode(self.memory.get(ip)).opcode;
                self.state = State::Faulted;
                warn!(ip, opcode, name = opcode_name(opcode), error = %source, "vm faulted");
                Err(Error::Faulted { ip, opcode, source: Box::new(source) })
            }
        }
    }

    /// Decodes the instruction at the instruction pointer without executing it.
    pub fn peek(&self) -> Result<Instruction, Error> {
        let ip = self.instruction;
        self.memory.check(ip)?;
        let opcode = Opcode::decode(self.memory.get(ip));
        let operation = opcode.operation(ip)?;
        Ok(Instruction { instruction: ip, word: opcode.word, operation })
    }

    /// Restores the VM to its initial state: memory is rebuilt from the initial program and
    /// the registers are cleared. The input source and output channel are left untouched.
    ///
    /// ```
    /// use intcode_vm::core::{channel::Channel, vm::{State, Vm}};
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let mut vm = Vm::new(&[1, 0, 0, 0, 99], Channel::new(), Channel::new());
    /// vm.run().await.expect("run failed");
    /// assert_eq!(vm.memory.memory[0], 2);
    ///
    /// vm.reset();
    /// assert_eq!(vm.memory.memory[0], 1);
    /// assert_eq!(vm.state, State::Running);
    /// # }
    /// ```
    pub fn reset(&mut self) {
        let limit = self.memory.limit();
        self.memory = Memory::with_limit(&self.program, limit);
        self.instruction = 0;
        self.relative_base = 0;
        self.state = State::Running;
        self.steps = 0;
    }

    /// Executes the program until it halts, suspending whenever an Input instruction has to wait.
    ///
    /// ```
    /// use intcode_vm::core::{channel::Channel, vm::Vm};
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let input = Channel::with_values([8]);
    /// let output = Channel::new();
    ///
    /// // outputs 1 if the input equals 8, 0 otherwise
    /// let mut vm = Vm::new(&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], input, output.clone());
    /// let result = vm.run().await.expect("run failed");
    ///
    /// assert_eq!(output.drain_all(), vec![1]);
    /// assert_eq!(result.instruction, 8);
    /// # }
    /// ```
    pub async fn run(&mut self) -> Result<ExecutionResult, Error> {
        let mut steps = 0u64;
        let mut since_yield = 0u64;

        while !self.is_halted() {
            self.step().await?;
            steps += 1;
            since_yield += 1;

            // long input-free stretches would otherwise starve other VMs on the same worker
            if self.yield_interval > 0 && since_yield >= self.yield_interval {
                since_yield = 0;
                tokio::task::yield_now().await;
            }
        }

        debug!(ip = self.instruction, steps, "vm halted");
        Ok(ExecutionResult { instruction: self.instruction, relative_base: self.relative_base, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::Polling;
    use std::time::Duration;

    fn vm(program: &[i64]) -> (Vm, Channel, Channel) {
        let input = Channel::new();
        let output = Channel::new();
        (Vm::new(program, input.clone(), output.clone()), input, output)
    }

    #[tokio::test]
    async fn test_add_self() {
        let (mut vm, _, _) = vm(&[1, 0, 0, 0, 99]);
        vm.run().await.expect("run failed");
        assert_eq!(vm.memory.memory, vec![2, 0, 0, 0, 99]);
    }

    #[tokio::test]
    async fn test_immediate_arithmetic() {
        let (mut vm, _, _) = vm(&[1101, 100, -1, 4, 0]);
        vm.run().await.expect("run failed");
        assert_eq!(vm.memory.memory[4], 99);
    }

    #[tokio::test]
    async fn test_multiply() {
        let (mut vm, _, _) = vm(&[2, 4, 4, 5, 99, 0]);
        vm.run().await.expect("run failed");
        assert_eq!(vm.memory.memory, vec![2, 4, 4, 5, 99, 9801]);
    }

    #[tokio::test]
    async fn test_large_immediate_output() {
        let (mut vm, _, output) = vm(&[104, 1125899906842624, 99]);
        vm.run().await.expect("run failed");
        assert_eq!(output.drain_all(), vec![1125899906842624]);
    }

    #[tokio::test]
    async fn test_large_multiplication() {
        let (mut vm, _, output) = vm(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0]);
        vm.run().await.expect("run failed");
        assert_eq!(output.drain_all(), vec![1219070632396864]);
    }

    #[tokio::test]
    async fn test_quine() {
        let program = [109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99];
        let (mut vm, _, output) = vm(&program);
        vm.run().await.expect("run failed");
        assert_eq!(output.drain_all(), program.to_vec());
    }

    #[tokio::test]
    async fn test_relative_mode_write() {
        // adjust base to 10, read input into [base + 2], output it
        let (mut vm, input, output) = vm(&[109, 10, 203, 2, 204, 2, 99]);
        input.send(-31);
        vm.run().await.expect("run failed");
        assert_eq!(vm.memory.memory[12], -31);
        assert_eq!(output.drain_all(), vec![-31]);
        assert_eq!(vm.relative_base, 10);
    }

    #[tokio::test]
    async fn test_program_snapshot_is_independent() {
        let program = vec![1, 0, 0, 0, 99];
        let (mut vm, _, _) = vm(&program);
        vm.run().await.expect("run failed");
        assert_eq!(program, vec![1, 0, 0, 0, 99]);
    }

    #[tokio::test]
    async fn test_memory_poke_before_run() {
        // turns the add in cell 0 into a multiply
        let (mut vm, _, output) = vm(&[1, 7, 8, 9, 4, 9, 99, 6, 7, 0]);
        vm.memory.write(0, 2).expect("write failed");
        vm.run().await.expect("run failed");
        assert_eq!(output.drain_all(), vec![42]);
    }

    #[tokio::test]
    async fn test_unknown_opcode() {
        let (mut vm, _, _) = vm(&[1101, 1, 1, 5, 42]);
        vm.step().await.expect("first step failed");
        let err = vm.run().await.unwrap_err();

        match err {
            Error::Faulted { ip, opcode, source } => {
                assert_eq!(ip, 4);
                assert_eq!(opcode, 42);
                assert!(matches!(*source, Error::UnknownOpcode { opcode: 42, ip: 4 }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(vm.state, State::Faulted);
    }

    #[tokio::test]
    async fn test_faulted_vm_is_not_runnable() {
        let (mut vm, _, _) = vm(&[0]);
        assert!(vm.run().await.is_err());
        assert!(matches!(
            vm.step().await,
            Err(Error::NotRunnable { state: State::Faulted })
        ));

        vm.reset();
        assert_eq!(vm.state, State::Running);
    }

    #[tokio::test]
    async fn test_immediate_write_target_faults() {
        let (mut vm, _, _) = vm(&[11101, 1, 1, 5, 99]);
        let err = vm.run().await.unwrap_err();
        assert!(matches!(err.root(), Error::InvalidWriteMode { parameter: 2 }));
        assert_eq!(vm.memory.memory, vec![11101, 1, 1, 5, 99]);
    }

    #[tokio::test]
    async fn test_negative_address_faults() {
        let (mut vm, _, _) = vm(&[1, -1, 0, 0, 99]);
        let err = vm.run().await.unwrap_err();
        assert!(matches!(err, Error::Faulted { ip: 0, opcode: 1, .. }));
        assert!(matches!(err.root(), Error::NegativeAddress(-1)));
    }

    #[tokio::test]
    async fn test_negative_jump_target_faults_on_fetch() {
        let (mut vm, _, _) = vm(&[1105, 1, -4]);
        let err = vm.run().await.unwrap_err();
        assert!(matches!(err, Error::Faulted { ip: -4, .. }));
        assert!(matches!(err.root(), Error::NegativeAddress(-4)));
    }

    #[tokio::test]
    async fn test_overflow_faults() {
        let (mut vm, _, _) = vm(&[1101, i64::MAX, 1, 0, 99]);
        let err = vm.run().await.unwrap_err();
        assert!(matches!(err.root(), Error::Overflow { operation: "ADD", ip: 0 }));
        assert_eq!(vm.memory.memory[0], 1101);
    }

    #[tokio::test]
    async fn test_memory_limit_from_config() {
        let mut config = Configuration::default();
        config.memory_limit = 16;
        let (vm, _, _) = vm(&[1101, 1, 1, 100, 99]);
        let mut vm = vm.with_config(&config);

        let err = vm.run().await.unwrap_err();
        assert!(matches!(err.root(), Error::AddressOutOfRange { address: 100, limit: 16 }));
    }

    #[tokio::test]
    async fn test_input_suspends_until_fed() {
        let (mut vm, input, output) = vm(&[3, 0, 4, 0, 99]);

        let handle = tokio::spawn(async move {
            vm.run().await.expect("run failed");
            vm
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        assert!(output.is_empty());

        input.send(77);
        let vm = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("vm never resumed")
            .expect("task panicked");
        assert_eq!(output.drain_all(), vec![77]);
        assert!(vm.is_halted());
    }

    #[tokio::test]
    async fn test_state_while_waiting() {
        let (mut vm, input, _) = vm(&[3, 0, 99]);

        let pending = tokio::time::timeout(Duration::from_millis(10), vm.step()).await;
        assert!(pending.is_err());
        assert_eq!(vm.state, State::WaitingOnInput);
        assert_eq!(vm.instruction, 0);
        assert_eq!(vm.memory.memory, vec![3, 0, 99]);

        // the interrupted instruction is retried from scratch
        input.send(5);
        vm.run().await.expect("run failed");
        assert_eq!(vm.memory.memory[0], 5);
    }

    #[tokio::test]
    async fn test_idle_input_from_polling_source() {
        let output = Channel::new();
        let source = Polling::new(|| None, Duration::from_millis(1));
        let mut vm = Vm::new(&[3, 5, 4, 5, 99, 0], source, output.clone()).with_idle_input(Some(-1));

        vm.run().await.expect("run failed");
        assert_eq!(output.drain_all(), vec![-1]);
    }

    #[tokio::test]
    async fn test_polling_without_idle_input_waits() {
        let queue = Channel::new();
        let output = Channel::new();
        let source = Polling::channel(queue.clone(), Duration::from_millis(1));
        let mut vm = Vm::new(&[3, 5, 4, 5, 99, 0], source, output.clone());

        let handle = tokio::spawn(async move { vm.run().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        queue.send(12);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("vm never resumed")
            .expect("task panicked")
            .expect("run failed");
        assert_eq!(output.drain_all(), vec![12]);
    }

    #[tokio::test]
    async fn test_peek_does_not_execute() {
        let (vm, _, _) = vm(&[1002, 4, 3, 4, 33]);
        let instruction = vm.peek().expect("peek failed");
        assert_eq!(instruction.operation, Operation::Multiply);
        assert_eq!(instruction.word, 1002);
        assert_eq!(vm.steps(), 0);
        assert_eq!(vm.memory.memory[4], 33);
    }

    #[tokio::test]
    async fn test_run_reports_steps() {
        let (mut vm, _, _) = vm(&[1002, 4, 3, 4, 33]);
        let result = vm.run().await.expect("run failed");
        assert_eq!(result, ExecutionResult { instruction: 4, relative_base: 0, steps: 2 });
        assert_eq!(vm.steps(), 2);

        // running a halted vm is a no-op
        let again = vm.run().await.expect("run failed");
        assert_eq!(again.steps, 0);
    }

    #[test]
    fn test_write_address_follows_opcode_table() {
        let (mut vm, _, _) = vm(&[1, 5, 6, 7, 99, 0, 0, 0]);
        let opcode = Opcode::decode(1);

        // three-parameter writers target their last parameter, INPUT its only one
        for operation in [Operation::Add, Operation::Multiply, Operation::LessThan, Operation::Equals] {
            assert_eq!(vm.write_address(&opcode, operation).expect("!"), 7);
        }
        assert_eq!(vm.write_address(&opcode, Operation::Input).expect("!"), 5);

        assert!(matches!(
            vm.write_address(&opcode, Operation::Output),
            Err(Error::NoWriteTarget { operation: "OUTPUT" })
        ));
    }
}
