use crate::{
    core::opcodes::{Opcode, Operation},
    error::Error,
};

use super::super::core::Vm;

/// ADD - Addition operation
pub fn add(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let a = vm.read_parameter(opcode, 0)?;
    let b = vm.read_parameter(opcode, 1)?;
    let destination = vm.write_address(opcode, Operation::Add)?;
    let result =
        a.checked_add(b).ok_or(Error::Overflow { operation: "ADD", ip: vm.instruction })?;

    vm.memory.write(destination, result)?;
    vm.advance(Operation::Add);
    Ok(())
}

/// MUL - Multiplication operation
pub fn mul(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let a = vm.read_parameter(opcode, 0)?;
    let b = vm.read_parameter(opcode, 1)?;
    let destination = vm.write_address(opcode, Operation::Multiply)?;
    let result =
        a.checked_mul(b).ok_or(Error::Overflow { operation: "MUL", ip: vm.instruction })?;

    vm.memory.write(destination, result)?;
    vm.advance(Operation::Multiply);
    Ok(())
}
