use core::cmp::{max, min};

use super::immediate_size;
use crate::Opcode;

/// Stack shape of a code section as seen by one straight pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StackBounds {
	/// Items the section needs on entry.
	pub inputs: usize,
	/// Items left over at the end, never negative.
	pub outputs: usize,
	/// Highest stack reached, counting the inputs.
	pub max_stack_height: usize,
}

/// Estimates the type of a code section by walking it once, front to back.
///
/// Jumps are not followed and undefined bytes are skipped as if they were
/// no-ops. The walk stops at an instruction whose immediate runs past the
/// end. Invalid code still gets an answer, which is what negative cases are
/// built from.
#[must_use]
pub fn stack_bounds(code: &[u8]) -> StackBounds {
	let mut height: isize = 0;
	let mut lowest: isize = 0;
	let mut highest: isize = 0;

	let mut position = 0;
	while position < code.len() {
		let Some(info) = Opcode(code[position]).info() else {
			position += 1;
			continue;
		};
		let Some(immediate) = immediate_size(info, code, position) else {
			break;
		};

		lowest = min(lowest, height - info.minimum_stack_height() as isize);
		height += info.stack_io();
		highest = max(highest, height);

		position += 1 + immediate;
	}

	let inputs = lowest.unsigned_abs();
	StackBounds {
		inputs,
		outputs: max(height, 0) as usize,
		max_stack_height: inputs + highest as usize,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn bounds(code: impl Into<crate::Bytecode>) -> (usize, usize, usize) {
		let b = stack_bounds(code.into().as_slice());
		(b.inputs, b.outputs, b.max_stack_height)
	}

	#[test]
	fn straight_line() {
		assert_eq!(bounds(Opcode::STOP), (0, 0, 0));
		assert_eq!(bounds(Opcode::POP + Opcode::STOP), (1, 0, 1));
		assert_eq!(bounds(Opcode::PUSH0 + Opcode::PUSH0 + Opcode::ADD + Opcode::STOP), (0, 1, 2));
		assert_eq!(bounds(Opcode::PUSH1.with(&[0]) * 1024), (0, 1024, 1024));
	}

	#[test]
	fn deep_reach_counts_as_inputs() {
		assert_eq!(bounds(Opcode::DUP16 + Opcode::STOP), (16, 1, 17));
		assert_eq!(bounds(Opcode::SWAP1 + Opcode::STOP), (2, 0, 2));
		assert_eq!(bounds(Opcode::PUSH0 + Opcode::SWAP1 + Opcode::POP), (1, 0, 2));
	}

	#[test]
	fn jumps_are_not_followed() {
		let code = Opcode::ORIGIN + Opcode::RJUMPI.with(&[-5]) + Opcode::RETF;
		assert_eq!(bounds(code), (0, 0, 1));
		let code = Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[1, 2]) + Opcode::STOP;
		assert_eq!(bounds(code), (0, 0, 1));
	}

	#[test]
	fn invalid_code_still_has_bounds() {
		assert_eq!(bounds([0x0cu8, 0x0d]), (0, 0, 0));
		assert_eq!(bounds(Opcode::PUSH0 + Opcode::PUSH2.with_bytes(&[0x01])), (0, 1, 1));
		assert_eq!(bounds(Opcode::RJUMPV.with_bytes(&[0x03, 0x00])), (0, 0, 0));
	}
}
