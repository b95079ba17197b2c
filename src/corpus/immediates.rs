use super::{entry_container, TestCase};
use crate::{defined_opcodes, Bytecode, EofException, Immediate, Opcode};

/// Jumps that can land inside another instruction.
const JUMPS: [Opcode; 3] = [Opcode::RJUMP, Opcode::RJUMPI, Opcode::RJUMPV];

/// Pushes needed before `opcode` can execute.
fn setup(opcode: Opcode) -> Bytecode {
	match opcode {
		Opcode::RJUMPI | Opcode::RJUMPV => Opcode::PUSH0.into(),
		_ => Bytecode::new(),
	}
}

/// Complete immediate of `opcode` that targets or calls something harmless.
fn full_immediate(opcode: Opcode, size: usize) -> Vec<u8> {
	match opcode {
		Opcode::RJUMPV => vec![0x01, 0x00, 0x00],
		_ => vec![0x00; size],
	}
}

fn jump(opcode: Opcode, offset: i16) -> Bytecode {
	match opcode {
		Opcode::RJUMPV => opcode.jump_table(&[offset]),
		_ => opcode.with(&[offset as i128]),
	}
}

fn jump_len(opcode: Opcode) -> usize {
	jump(opcode, 0).len()
}

pub(super) fn cases() -> Vec<TestCase> {
	let mut cases = Vec::new();

	let targets: Vec<(Opcode, Vec<u8>)> = defined_opcodes()
		.filter_map(|info| {
			let size = match info.immediate {
				Immediate::Fixed(0) => return None,
				Immediate::Fixed(size) => size,
				Immediate::JumpTable => 3,
			};
			Some((info.opcode, full_immediate(info.opcode, size)))
		})
		.collect();

	for (opcode, immediate) in &targets {
		let n = immediate.len();
		let mut kept = vec![0, 1, n - 1];
		kept.retain(|&keep| keep < n);
		kept.dedup();
		for keep in kept {
			cases.push(TestCase::invalid(
				format!("truncated_0x{:02x}_{}_keep_{}", opcode.as_u8(), opcode, keep),
				entry_container(opcode.with_bytes(&immediate[..keep])),
				EofException::TruncatedImmediate,
			));
		}
	}

	for (target, immediate) in &targets {
		let n = immediate.len();
		let instruction = target.with_bytes(immediate);
		let mut landings = vec![("first", 1)];
		if n > 1 {
			landings.push(("last", n));
		}

		for jumper in JUMPS {
			for &(landing, offset) in &landings {
				// Target after the jump. The jump is the last thing executed
				// before the target is read.
				let code = setup(*target)
					+ setup(jumper)
					+ jump(jumper, offset as i16)
					+ instruction.clone()
					+ Opcode::STOP;
				cases.push(TestCase::invalid(
					format!("{}_forward_into_{}_immediate_of_{}", jumper, landing, target),
					entry_container(code),
					EofException::InvalidRelativeOffset,
				));

				// Target before the jump.
				let distance = instruction.len() + setup(jumper).len() + jump_len(jumper);
				let offset = offset as isize - distance as isize;
				let code = setup(*target)
					+ instruction.clone()
					+ setup(jumper)
					+ jump(jumper, offset as i16)
					+ Opcode::STOP;
				cases.push(TestCase::invalid(
					format!("{}_backward_into_{}_immediate_of_{}", jumper, landing, target),
					entry_container(code),
					EofException::InvalidRelativeOffset,
				));
			}
		}
	}

	cases
}
