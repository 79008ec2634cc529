use tracing::debug;

use crate::{
    core::opcodes::{Opcode, Operation},
    error::Error,
};

use super::super::{core::Vm, execution::State};

/// JUMP_IF_TRUE - Alter the instruction pointer if the condition is non-zero
pub fn jump_if_true(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let condition = vm.read_parameter(opcode, 0)?;
    let target = vm.read_parameter(opcode, 1)?;

    if condition != 0 {
        vm.instruction = target;
    } else {
        vm.advance(Operation::JumpIfTrue);
    }
    Ok(())
}

/// JUMP_IF_FALSE - Alter the instruction pointer if the condition is zero
pub fn jump_if_false(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let condition = vm.read_parameter(opcode, 0)?;
    let target = vm.read_parameter(opcode, 1)?;

    if condition == 0 {
        vm.instruction = target;
    } else {
        vm.advance(Operation::JumpIfFalse);
    }
    Ok(())
}

/// ADJUST_RELATIVE_BASE - Add to the relative base register
pub fn adjust_relative_base(vm: &mut Vm, opcode: &Opcode) -> Result<(), Error> {
    let offset = vm.read_parameter(opcode, 0)?;
    vm.relative_base = vm
        .relative_base
        .checked_add(offset)
        .ok_or(Error::Overflow { operation: "ADJUST_RELATIVE_BASE", ip: vm.instruction })?;

    vm.advance(Operation::AdjustRelativeBase);
    Ok(())
}

/// HALT - Halts execution. The instruction pointer stays on the halt word.
pub fn halt(vm: &mut Vm) {
    debug!(ip = vm.instruction, "halt");
    vm.state = State::Halted;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::Channel;

    fn vm(program: &[i64]) -> Vm {
        Vm::new(program, Channel::new(), Channel::new())
    }

    #[test]
    fn test_jump_if_true() {
        let mut vm = vm(&[1105, 1, 9]);
        jump_if_true(&mut vm, &Opcode::decode(1105)).expect("jump failed");
        assert_eq!(vm.instruction, 9);

        let mut vm = self::vm(&[1105, 0, 9]);
        jump_if_true(&mut vm, &Opcode::decode(1105)).expect("jump failed");
        assert_eq!(vm.instruction, 3);
    }

    #[test]
    fn test_jump_if_false() {
        let mut vm = vm(&[1106, 0, 7]);
        jump_if_false(&mut vm, &Opcode::decode(1106)).expect("jump failed");
        assert_eq!(vm.instruction, 7);

        let mut vm = self::vm(&[1106, -2, 7]);
        jump_if_false(&mut vm, &Opcode::decode(1106)).expect("jump failed");
        assert_eq!(vm.instruction, 3);
    }

    #[test]
    fn test_adjust_relative_base() {
        let mut vm = vm(&[109, -7]);
        vm.relative_base = 10;
        adjust_relative_base(&mut vm, &Opcode::decode(109)).expect("adjust failed");
        assert_eq!(vm.relative_base, 3);
        assert_eq!(vm.instruction, 2);
    }

    #[test]
    fn test_adjust_relative_base_overflow() {
        let mut vm = vm(&[109, 1]);
        vm.relative_base = i64::MAX;
        assert!(matches!(
            adjust_relative_base(&mut vm, &Opcode::decode(109)),
            Err(Error::Overflow { operation: "ADJUST_RELATIVE_BASE", ip: 0 })
        ));
        assert_eq!(vm.relative_base, i64::MAX);
    }

    #[test]
    fn test_halt() {
        let mut vm = vm(&[99]);
        halt(&mut vm);
        assert_eq!(vm.state, State::Halted);
        assert_eq!(vm.instruction, 0);
    }
}
