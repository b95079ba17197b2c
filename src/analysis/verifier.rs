use core::cmp::{max, min};

use evm_eof_core::utils::{read_i16, read_u16};

use crate::{EofException, Immediate, Opcode, MAX_STACK_HEIGHT};

/// Decoded type section entry of one code section.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TypeEntry {
	pub inputs: u8,
	pub outputs: u8,
	pub max_stack_height: u16,
}

impl TypeEntry {
	#[must_use]
	pub const fn new(inputs: u8, outputs: u8, max_stack_height: u16) -> Self {
		Self {
			inputs,
			outputs,
			max_stack_height,
		}
	}

	/// Net stack change of calling the section.
	#[must_use]
	pub const fn io_diff(&self) -> i32 {
		self.outputs as i32 - self.inputs as i32
	}
}

#[derive(Clone, Copy, Debug)]
struct ByteInfo {
	/// Part of an immediate, never a valid jump target.
	is_immediate: bool,
	/// Target of some jump seen so far.
	is_jumpdest: bool,
	/// Lowest stack height any path reaches this byte with.
	smallest: i32,
	/// Highest stack height any path reaches this byte with.
	biggest: i32,
}

impl Default for ByteInfo {
	fn default() -> Self {
		Self {
			is_immediate: false,
			is_jumpdest: false,
			smallest: i32::MAX,
			biggest: i32::MIN,
		}
	}
}

impl ByteInfo {
	fn mark_as_immediate(&mut self) -> Result<(), EofException> {
		if self.is_jumpdest {
			return Err(EofException::InvalidRelativeOffset);
		}
		self.is_immediate = true;
		Ok(())
	}
}

/// Verifies code section `index` against the decoded `types` and returns its
/// max stack height.
///
/// Heights are tracked per byte as a range in one forward pass. Forward jumps
/// widen the range at their target. Backward jumps must arrive with exactly
/// the range the target already has, so a loop can neither grow nor shrink
/// the stack.
pub fn verify_code(code: &[u8], index: usize, types: &[TypeEntry]) -> Result<u16, EofException> {
	let result = verify(code, index, types);
	if let Err(err) = &result {
		log::trace!(target: "eof", "code section {} rejected: {}", index, err);
	}
	result
}

fn verify(code: &[u8], index: usize, types: &[TypeEntry]) -> Result<u16, EofException> {
	let this_type = types
		.get(index)
		.ok_or(EofException::InvalidCodeSectionIndex)?;
	let len = code.len();

	let mut bytes = vec![ByteInfo::default(); len];
	let mut after_termination = false;
	let mut next_smallest = this_type.inputs as i32;
	let mut next_biggest = this_type.inputs as i32;

	let mut i = 0;
	while i < len {
		let opcode = Opcode(code[i]);
		let info = opcode
			.info()
			.ok_or(EofException::UndefinedInstruction)?;

		let immediate = match info.immediate {
			Immediate::Fixed(size) => size,
			Immediate::JumpTable => {
				let count = *code
					.get(i + 1)
					.ok_or(EofException::TruncatedImmediate)? as usize;
				if count == 0 {
					return Err(EofException::InvalidJumpTableCount);
				}
				1 + count * info.immediate_length_of(1)
			}
		};
		if immediate != 0 {
			if i + immediate >= len {
				return Err(EofException::TruncatedImmediate);
			}
			for byte in &mut bytes[i + 1..=i + immediate] {
				byte.mark_as_immediate()?;
			}
		}

		let this = &mut bytes[i];
		if !after_termination {
			this.smallest = min(this.smallest, next_smallest);
			this.biggest = max(this.biggest, next_biggest);
		}
		let this = *this;

		if after_termination && !this.is_jumpdest {
			return Err(EofException::UnreachableCode);
		}
		after_termination = info.terminating;

		let mut requirement = info.minimum_stack_height() as i32;
		let mut io_diff = info.stack_io() as i32;
		let next = i + 1 + immediate;
		let mut targets = Vec::new();
		match opcode {
			Opcode::RJUMP | Opcode::RJUMPI => {
				let offset = read_i16(code, i + 1).ok_or(EofException::TruncatedImmediate)?;
				targets.push(next as isize + offset as isize);
			}
			Opcode::RJUMPV => {
				for branch in 0..(immediate - 1) / 2 {
					let offset = read_i16(code, i + 2 + 2 * branch)
						.ok_or(EofException::TruncatedImmediate)?;
					targets.push(next as isize + offset as isize);
				}
			}
			Opcode::CALLF => {
				let section = read_u16(code, i + 1).ok_or(EofException::TruncatedImmediate)?;
				let target = types
					.get(section as usize)
					.ok_or(EofException::InvalidCodeSectionIndex)?;
				requirement = target.inputs as i32;
				io_diff = target.io_diff();
			}
			Opcode::RETF => {
				requirement = this_type.outputs as i32;
				if this.biggest > requirement {
					return Err(EofException::StackHigherThanOutputs);
				}
			}
			_ => {}
		}

		if requirement > this.smallest {
			return Err(EofException::StackUnderflow);
		}
		next_smallest = this.smallest + io_diff;
		next_biggest = this.biggest + io_diff;

		for target in targets {
			if target < 0 || target >= len as isize {
				return Err(EofException::InvalidRelativeOffset);
			}
			let target = target as usize;
			let jumpdest = &mut bytes[target];
			if jumpdest.is_immediate {
				return Err(EofException::InvalidRelativeOffset);
			}
			jumpdest.is_jumpdest = true;

			if target <= i {
				if jumpdest.biggest != next_biggest || jumpdest.smallest != next_smallest {
					return Err(EofException::InvalidControlFlow);
				}
			} else {
				jumpdest.smallest = min(jumpdest.smallest, next_smallest);
				jumpdest.biggest = max(jumpdest.biggest, next_biggest);
			}
		}

		i = next;
	}

	if !after_termination {
		return Err(EofException::MissingStopOpcode);
	}

	let computed = bytes.iter().map(|byte| byte.biggest).fold(0, max);
	if computed > MAX_STACK_HEIGHT as i32 {
		return Err(EofException::MaxStackHeightAboveLimit);
	}
	if computed != this_type.max_stack_height as i32 {
		return Err(EofException::InvalidMaxStackHeight);
	}
	Ok(computed as u16)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{analysis::stack_bounds, Bytecode};

	/// Verifies `code` as the only section, typed by the straight pass.
	fn check(code: impl Into<Bytecode>) -> Result<u16, EofException> {
		let code = code.into();
		let bounds = stack_bounds(code.as_slice());
		let entry = TypeEntry::new(
			bounds.inputs as u8,
			bounds.outputs as u8,
			bounds.max_stack_height as u16,
		);
		verify_code(code.as_slice(), 0, &[entry])
	}

	fn check_typed(code: impl Into<Bytecode>, max_stack_height: u16) -> Result<u16, EofException> {
		verify_code(code.into().as_slice(), 0, &[TypeEntry::new(0, 0, max_stack_height)])
	}

	#[test]
	fn valid_sections() {
		assert_eq!(check(Opcode::STOP), Ok(0));
		assert_eq!(check(Opcode::PUSH0 + Opcode::PUSH0 + Opcode::RETURN), Ok(2));
		assert_eq!(check(Opcode::RJUMP.with(&[-3])), Ok(0));
		assert_eq!(check(Opcode::PUSH0 + Opcode::RJUMPI.with(&[-4]) + Opcode::STOP), Ok(1));
		assert_eq!(check(Opcode::ORIGIN + Opcode::RJUMPI.with(&[-4]) + Opcode::RETF), Ok(1));
		assert_eq!(
			check(Opcode::PUSH0 + Opcode::RJUMPI.with(&[1]) + Opcode::STOP + Opcode::STOP),
			Ok(1)
		);
	}

	#[test]
	fn forward_jump_reaches_code_after_terminator() {
		let code = Opcode::RJUMP.with(&[0]) + Opcode::STOP;
		assert_eq!(check(code), Ok(0));
		let code = Opcode::PUSH0
			+ Opcode::RJUMPI.with(&[1])
			+ Opcode::STOP
			+ Opcode::JUMPDEST
			+ Opcode::STOP;
		assert_eq!(check(code), Ok(1));
	}

	#[test]
	fn unreachable_after_jump() {
		let code = Opcode::RJUMP.with(&[1]) + Opcode::JUMPDEST + Opcode::RETF;
		assert_eq!(check(code), Err(EofException::UnreachableCode));
	}

	#[test]
	fn underflow() {
		assert_eq!(
			verify_code(&[0x50, 0x00], 0, &[TypeEntry::default()]),
			Err(EofException::StackUnderflow)
		);
		assert_eq!(
			check_typed(Opcode::RJUMPI.with(&[0]) + Opcode::STOP, 0),
			Err(EofException::StackUnderflow)
		);
	}

	#[test]
	fn jump_targets() {
		assert_eq!(
			check(Opcode::RJUMP.with(&[1]) + Opcode::STOP),
			Err(EofException::InvalidRelativeOffset)
		);
		assert_eq!(
			check(Opcode::RJUMP.with(&[-4])),
			Err(EofException::InvalidRelativeOffset)
		);
		assert_eq!(
			check(Opcode::RJUMP.with(&[-1])),
			Err(EofException::InvalidRelativeOffset)
		);
		assert_eq!(
			check(Opcode::RJUMP.with(&[1]) + Opcode::PUSH1.with(&[0]) + Opcode::STOP),
			Err(EofException::InvalidRelativeOffset)
		);
		assert_eq!(
			check(Opcode::PUSH1.with(&[0]) + Opcode::RJUMP.with(&[-4])),
			Err(EofException::InvalidRelativeOffset)
		);
		assert_eq!(
			check(Opcode::ORIGIN + Opcode::RJUMPI.with(&[-5]) + Opcode::RETF),
			Err(EofException::InvalidRelativeOffset)
		);
	}

	#[test]
	fn jump_tables() {
		assert_eq!(
			check(Opcode::PUSH0 + Opcode::RJUMPV.with_bytes(&[0x00]) + Opcode::STOP),
			Err(EofException::InvalidJumpTableCount)
		);
		assert_eq!(
			check(Opcode::PUSH0 + Opcode::RJUMPV.with_bytes(&[0x02, 0x00, 0x00])),
			Err(EofException::TruncatedImmediate)
		);
		let code = Opcode::PUSH0
			+ Opcode::RJUMPV.jump_table(&[1, 2])
			+ Opcode::STOP
			+ Opcode::STOP
			+ Opcode::STOP;
		assert_eq!(check(code), Ok(1));
		let code = Opcode::PUSH0
			+ Opcode::RJUMPV.jump_table(&[1])
			+ Opcode::STOP
			+ Opcode::POP
			+ Opcode::STOP;
		assert_eq!(check_typed(code, 1), Err(EofException::StackUnderflow));
	}

	#[test]
	fn loops_keep_the_stack_height() {
		assert_eq!(
			check(Opcode::PUSH0 + Opcode::RJUMP.with(&[-4])),
			Err(EofException::InvalidControlFlow)
		);
		assert_eq!(
			check(Opcode::PUSH0 + Opcode::RJUMPI.with(&[-3]) + Opcode::STOP),
			Err(EofException::InvalidControlFlow)
		);
		assert_eq!(
			check(Opcode::PUSH0 + Opcode::PUSH0 + Opcode::POP + Opcode::RJUMP.with(&[-4])),
			Err(EofException::InvalidControlFlow)
		);
	}

	#[test]
	fn termination() {
		assert_eq!(check(Opcode::PUSH0), Err(EofException::MissingStopOpcode));
		assert_eq!(check(Opcode::PUSH1.with(&[])), Err(EofException::TruncatedImmediate));
		assert_eq!(check([0x0cu8]), Err(EofException::UndefinedInstruction));
		assert_eq!(check(Opcode::JUMP * 1), Err(EofException::UndefinedInstruction));
	}

	#[test]
	fn declared_types() {
		let types = [TypeEntry::new(0, 0, 1)];
		assert_eq!(
			verify_code(&[0x00], 0, &types),
			Err(EofException::InvalidMaxStackHeight)
		);
		assert_eq!(
			verify_code(&[0x5f, 0xe4], 0, &types),
			Err(EofException::StackHigherThanOutputs)
		);
		assert_eq!(
			verify_code(&[0xe3, 0x00, 0x01, 0x00], 0, &[TypeEntry::default()]),
			Err(EofException::InvalidCodeSectionIndex)
		);

		let types = [TypeEntry::new(0, 0, 2), TypeEntry::new(2, 1, 2)];
		let caller = Opcode::PUSH0 + Opcode::PUSH0 + Opcode::CALLF.with(&[1]) + Opcode::POP + Opcode::STOP;
		assert_eq!(verify_code(caller.as_slice(), 0, &types), Ok(2));
		assert_eq!(verify_code(&[0x01, 0xe4], 1, &types), Ok(2));
	}

	#[test]
	fn computed_height_above_limit() {
		let code = Opcode::PUSH0 * 1024 + Opcode::STOP;
		let types = [TypeEntry::new(0, 0, 1024)];
		assert_eq!(
			verify_code(code.as_slice(), 0, &types),
			Err(EofException::MaxStackHeightAboveLimit)
		);
	}
}
