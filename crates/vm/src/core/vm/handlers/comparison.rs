use crate::{
    core::opcodes::{Opcode, Operation},
    error::Error,
};

use super::super::core::Vm;

/// LESS_THAN - Less-than comparison
pub fn less_than(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let a = vm.read_parameter(opcode, 0)?;
    let b = vm.read_parameter(opcode, 1)?;
    let destination = vm.write_address(opcode, Operation::LessThan)?;

    vm.memory.write(destination, (a < b) as i64)?;
    vm.advance(Operation::LessThan);
    Ok(())
}

/// EQUALS - Equality comparison
pub fn equals(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let a = vm.read_parameter(opcode, 0)?;
    let b = vm.read_parameter(opcode, 1)?;
    let destination = vm.write_address(opcode, Operation::Equals)?;

    vm.memory.write(destination, (a == b) as i64)?;
    vm.advance(Operation::Equals);
    Ok(())
}
