use tracing::debug;

use crate::{
    core::opcodes::{Opcode, Operation},
    error::Error,
};

use super::super::core::Vm;

/// INPUT - Read a value from the input source into memory
///
/// The destination is resolved and validated before suspending, so a faulting INPUT never
/// consumes a value, and a cancelled one leaves the VM exactly as it was.
pub async fn input(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let destination = vm.write_address(opcode, Operation::Input)?;
    let value = vm.acquire_input().await;
    debug!(ip = vm.instruction, destination, value, "input");

    vm.memory.write(destination, value)?;
    vm.advance(Operation::Input);
    Ok(())
}

/// OUTPUT - Emit a value to the output channel
pub fn output(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let value = vm.read_parameter(opcode, 0)?;
    debug!(ip = vm.instruction, value, "output");

    vm.emit(value);
    vm.advance(Operation::Output);
    Ok(())
}
