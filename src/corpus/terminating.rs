use super::{entry_container, entry_section, TestCase};
use crate::{
	defined_opcodes, undefined_opcodes, Bytecode, Container, EofException, Immediate, Opcode,
	Section, VALID_TERMINATING_OPCODES,
};

/// `opcode` preceded by enough pushes to satisfy its stack requirement.
fn with_stack(opcode: Opcode) -> Bytecode {
	let height = opcode
		.info()
		.map_or(0, |info| info.minimum_stack_height());
	Opcode::PUSH1.with(&[0]) * height + opcode
}

pub(super) fn cases() -> Vec<TestCase> {
	let mut cases = Vec::new();

	for opcode in VALID_TERMINATING_OPCODES {
		cases.push(TestCase::valid(
			format!("valid_terminating_{}", opcode),
			entry_container(with_stack(opcode)),
		));
		cases.push(TestCase::valid(
			format!("valid_terminating_{}_second_section", opcode),
			Container::new(vec![
				entry_section(Opcode::CALLF.with(&[1]) + Opcode::STOP),
				Section::code(with_stack(opcode)),
			]),
		));
	}

	for opcode in undefined_opcodes() {
		cases.push(TestCase::invalid(
			format!("undefined_terminating_0x{:02x}", opcode.as_u8()),
			entry_container(opcode),
			EofException::UndefinedInstruction,
		));
		cases.push(TestCase::invalid(
			format!("undefined_terminating_0x{:02x}_second_section", opcode.as_u8()),
			Container::new(vec![
				entry_section(Opcode::CALLF.with(&[1]) + Opcode::STOP),
				Section::code(opcode),
			]),
			EofException::UndefinedInstruction,
		));
	}

	for info in defined_opcodes() {
		if info.terminating || info.immediate != Immediate::Fixed(0) {
			continue;
		}
		cases.push(TestCase::invalid(
			format!("non_terminating_{}", info.opcode),
			entry_container(with_stack(info.opcode)),
			EofException::MissingStopOpcode,
		));
	}

	cases
}
