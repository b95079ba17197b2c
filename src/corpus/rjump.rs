use super::{entry_container, TestCase};
use crate::{Bytecode, EofException, Opcode};

/// Jump table over `blocks` where block `bad` pops from an empty stack and
/// every other block stops. `None` makes every branch valid.
fn jump_table_with_blocks(blocks: usize, bad: Option<usize>) -> Bytecode {
	let block = |index: usize| -> Bytecode {
		if Some(index) == bad {
			Opcode::POP + Opcode::STOP
		} else {
			Opcode::STOP.into()
		}
	};

	let mut offsets = Vec::with_capacity(blocks);
	let mut offset = 1;
	for index in 0..blocks {
		offsets.push(offset as i16);
		offset += block(index).len();
	}

	let mut code = Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&offsets) + Opcode::STOP;
	for index in 0..blocks {
		code = code + block(index);
	}
	code
}

fn valid(cases: &mut Vec<TestCase>) {
	let shapes: [(&str, Bytecode); 7] = [
		("rjump_zero_offset", Opcode::RJUMP.with(&[0]) + Opcode::STOP),
		("rjump_self_loop", Opcode::RJUMP.with(&[-3])),
		(
			"rjumpi_forward",
			Opcode::PUSH0 + Opcode::RJUMPI.with(&[1]) + Opcode::STOP + Opcode::STOP,
		),
		(
			"rjumpi_backward_loop",
			Opcode::PUSH0 + Opcode::RJUMPI.with(&[-4]) + Opcode::STOP,
		),
		(
			"rjumpi_backward_loop_retf",
			Opcode::ORIGIN + Opcode::RJUMPI.with(&[-4]) + Opcode::RETF,
		),
		(
			"rjumpv_single_branch",
			Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[0]) + Opcode::STOP,
		),
		("rjumpv_eight_branches", jump_table_with_blocks(8, None)),
	];
	for (name, code) in shapes {
		cases.push(TestCase::valid(name, entry_container(code)));
	}
}

fn out_of_bounds(cases: &mut Vec<TestCase>) {
	let mut shapes: Vec<(String, Bytecode)> = vec![
		("rjump_after_end".into(), Opcode::RJUMP.with(&[1]) + Opcode::STOP),
		("rjump_before_start".into(), Opcode::RJUMP.with(&[-4])),
		(
			"rjumpi_after_end".into(),
			Opcode::PUSH0 + Opcode::RJUMPI.with(&[1]) + Opcode::STOP,
		),
		(
			"rjumpi_before_start".into(),
			Opcode::PUSH0 + Opcode::RJUMPI.with(&[-5]) + Opcode::STOP,
		),
		(
			"rjumpv_after_end".into(),
			Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[1]) + Opcode::STOP,
		),
		(
			"rjumpv_before_start".into(),
			Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[-6]) + Opcode::STOP,
		),
	];
	for (label, offset) in [("max", i16::MAX), ("min", i16::MIN)] {
		shapes.push((
			format!("rjump_offset_{}", label),
			Opcode::RJUMP.with(&[offset as i128]) + Opcode::STOP,
		));
		shapes.push((
			format!("rjumpi_offset_{}", label),
			Opcode::PUSH0 + Opcode::RJUMPI.with(&[offset as i128]) + Opcode::STOP,
		));
		shapes.push((
			format!("rjumpv_offset_{}", label),
			Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[0, offset]) + Opcode::STOP,
		));
	}

	for (name, code) in shapes {
		cases.push(TestCase::invalid(
			name,
			entry_container(code),
			EofException::InvalidRelativeOffset,
		));
	}
}

fn into_own_immediate(cases: &mut Vec<TestCase>) {
	for offset in [-1, -2] {
		cases.push(TestCase::invalid(
			format!("rjump_into_own_immediate_{}", offset),
			entry_container(Opcode::RJUMP.with(&[offset])),
			EofException::InvalidRelativeOffset,
		));
		cases.push(TestCase::invalid(
			format!("rjumpi_into_own_immediate_{}", offset),
			entry_container(Opcode::PUSH0 + Opcode::RJUMPI.with(&[offset]) + Opcode::STOP),
			EofException::InvalidRelativeOffset,
		));
	}
	for offset in [-1i16, -2, -3] {
		cases.push(TestCase::invalid(
			format!("rjumpv_into_own_immediate_{}", offset),
			entry_container(Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[offset]) + Opcode::STOP),
			EofException::InvalidRelativeOffset,
		));
	}
}

fn jump_tables(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"rjumpv_zero_count",
		entry_container(Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[]) + Opcode::STOP),
		EofException::InvalidJumpTableCount,
	));
	cases.push(TestCase::invalid(
		"rjumpv_truncated_table",
		entry_container(Opcode::PUSH0 + Opcode::RJUMPV.with_bytes(&[0x02, 0x00, 0x00]) + Opcode::STOP),
		EofException::TruncatedImmediate,
	));
}

fn underflow(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"rjumpi_without_condition",
		entry_container(Opcode::RJUMPI.with(&[0]) + Opcode::STOP),
		EofException::StackUnderflow,
	));
	cases.push(TestCase::invalid(
		"rjumpi_branch_underflow",
		entry_container(
			Opcode::PUSH0 + Opcode::RJUMPI.with(&[1]) + Opcode::STOP + Opcode::POP + Opcode::STOP,
		),
		EofException::StackUnderflow,
	));
	cases.push(TestCase::invalid(
		"rjumpv_without_case",
		entry_container(Opcode::RJUMPV.jump_table(&[0]) + Opcode::STOP),
		EofException::StackUnderflow,
	));

	for bad in 0..8 {
		cases.push(TestCase::invalid(
			format!("rjumpv_underflow_branch_{}_of_8", bad),
			entry_container(jump_table_with_blocks(8, Some(bad))),
			EofException::StackUnderflow,
		));
	}
	for blocks in [2, 3, 255] {
		let mut positions = vec![0, blocks / 2, blocks - 1];
		positions.dedup();
		for bad in positions {
			cases.push(TestCase::invalid(
				format!("rjumpv_underflow_branch_{}_of_{}", bad, blocks),
				entry_container(jump_table_with_blocks(blocks, Some(bad))),
				EofException::StackUnderflow,
			));
		}
	}
}

fn loops(cases: &mut Vec<TestCase>) {
	let shapes: [(&str, Bytecode); 4] = [
		("rjump_loop_grows_stack", Opcode::PUSH0 + Opcode::RJUMP.with(&[-4])),
		(
			"rjumpi_loop_grows_stack",
			Opcode::PUSH0 + Opcode::PUSH0 + Opcode::RJUMPI.with(&[-5]) + Opcode::STOP,
		),
		(
			"rjumpv_loop_grows_stack",
			Opcode::PUSH0 + Opcode::PUSH0 + Opcode::RJUMPV.jump_table(&[-6]) + Opcode::STOP,
		),
		(
			"rjump_loop_shrinks_stack",
			Opcode::PUSH0 + Opcode::PUSH0 + Opcode::POP + Opcode::RJUMP.with(&[-4]),
		),
	];
	for (name, code) in shapes {
		cases.push(TestCase::invalid(
			name,
			entry_container(code),
			EofException::InvalidControlFlow,
		));
	}
	cases.push(TestCase::invalid(
		"rjumpi_self_loop_pops",
		entry_container(Opcode::PUSH0 + Opcode::RJUMPI.with(&[-3]) + Opcode::STOP),
		EofException::InvalidControlFlow,
	));
}

fn unreachable(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"rjump_over_jumpdest",
		entry_container(Opcode::RJUMP.with(&[1]) + Opcode::JUMPDEST + Opcode::RETF),
		EofException::UnreachableCode,
	));
	cases.push(TestCase::invalid(
		"code_after_stop",
		entry_container(Opcode::STOP + Opcode::STOP),
		EofException::UnreachableCode,
	));
	cases.push(TestCase::invalid(
		"rjump_skips_first_of_two",
		entry_container(Opcode::RJUMP.with(&[1]) + Opcode::STOP + Opcode::STOP),
		EofException::UnreachableCode,
	));
}

pub(super) fn cases() -> Vec<TestCase> {
	let mut cases = Vec::new();
	valid(&mut cases);
	out_of_bounds(&mut cases);
	into_own_immediate(&mut cases);
	jump_tables(&mut cases);
	underflow(&mut cases);
	loops(&mut cases);
	unreachable(&mut cases);
	cases
}
