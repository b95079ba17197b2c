use bytes::Bytes;

use super::{entry_container, entry_section, TestCase};
use crate::{
	Container, EofException, Opcode, Section, MAX_CODE_SECTIONS, MAX_CONTAINER_SECTIONS,
	MAX_STACK_HEIGHT,
};

fn raw(bytes: &[u8]) -> Container {
	Container::raw(Bytes::copy_from_slice(bytes))
}

fn stop_sections(count: usize) -> Vec<Section> {
	let mut sections = vec![entry_section(Opcode::STOP)];
	sections.extend((1..count).map(|_| Section::code(Opcode::STOP)));
	sections
}

fn with_sub_containers(count: usize) -> Container {
	let mut sections = vec![entry_section(Opcode::STOP)];
	sections.extend((0..count).map(|_| Section::container(entry_container(Opcode::INVALID))));
	Container::new(sections)
}

fn section_counts(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::valid(
		"max_code_sections",
		Container::new(stop_sections(MAX_CODE_SECTIONS)),
	));
	cases.push(TestCase::invalid(
		"too_many_code_sections",
		Container::new(stop_sections(MAX_CODE_SECTIONS + 1)),
		EofException::TooManyCodeSections,
	));
	cases.push(TestCase::valid(
		"max_container_sections",
		with_sub_containers(MAX_CONTAINER_SECTIONS),
	));
	cases.push(TestCase::invalid(
		"too_many_container_sections",
		with_sub_containers(MAX_CONTAINER_SECTIONS + 1),
		EofException::TooManyContainerSections,
	));
}

fn prefix(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"invalid_magic",
		entry_container(Opcode::STOP).with_magic(0x01),
		EofException::InvalidMagic,
	));
	for version in [0x00, 0x02] {
		cases.push(TestCase::invalid(
			format!("invalid_version_{}", version),
			entry_container(Opcode::STOP).with_version(version),
			EofException::InvalidVersion,
		));
	}

	let truncated: [(&str, &[u8], EofException); 7] = [
		("prefix_only", &[0xef], EofException::InvalidMagic),
		("no_version", &[0xef, 0x00], EofException::InvalidVersion),
		("no_sections", &[0xef, 0x00, 0x01], EofException::MissingHeaderTerminator),
		(
			"truncated_type_size",
			&[0xef, 0x00, 0x01, 0x01, 0x00],
			EofException::IncompleteSectionSize,
		),
		(
			"truncated_code_count",
			&[0xef, 0x00, 0x01, 0x01, 0x00, 0x04, 0x02, 0x00],
			EofException::IncompleteSectionCount,
		),
		(
			"truncated_code_size",
			&[0xef, 0x00, 0x01, 0x01, 0x00, 0x04, 0x02, 0x00, 0x01, 0x00],
			EofException::IncompleteSectionSize,
		),
		(
			"zero_code_sections",
			&[0xef, 0x00, 0x01, 0x01, 0x00, 0x04, 0x02, 0x00, 0x00],
			EofException::EmptySection,
		),
	];
	for (name, bytes, error) in truncated {
		cases.push(TestCase::invalid(format!("header_{}", name), raw(bytes), error));
	}
}

fn header_terminator(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"wrong_header_terminator",
		entry_container(Opcode::STOP).with_header_terminator(vec![0x01]),
		EofException::MissingHeaderTerminator,
	));
	cases.push(TestCase::invalid(
		"no_header_terminator_no_body",
		Container::new(vec![
			Section::types([0u8, 0, 0, 0]).skip_body_listing(),
			entry_section(Opcode::STOP).skip_body_listing(),
		])
		.with_header_terminator(vec![]),
		EofException::MissingHeaderTerminator,
	));
	// The first type byte is read as the terminator.
	cases.push(TestCase::invalid(
		"no_header_terminator",
		entry_container(Opcode::STOP).with_header_terminator(vec![]),
		EofException::InvalidSectionBodiesSize,
	));
}

fn section_sizes(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"trailing_bytes",
		entry_container(Opcode::STOP).with_extra(vec![0x00]),
		EofException::InvalidSectionBodiesSize,
	));
	cases.push(TestCase::invalid(
		"code_size_too_large",
		Container::new(vec![entry_section(Opcode::STOP).with_custom_size(2)]),
		EofException::InvalidSectionBodiesSize,
	));
	cases.push(TestCase::invalid(
		"code_size_zero",
		Container::new(vec![entry_section(Opcode::STOP).with_custom_size(0)]),
		EofException::ZeroSectionSize,
	));
	cases.push(TestCase::invalid(
		"sub_container_empty",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::container(Container::raw(Bytes::new())),
		]),
		EofException::ZeroSectionSize,
	));
	cases.push(TestCase::invalid(
		"type_size_too_large",
		Container::new(vec![
			Section::types([0u8, 0, 0, 0]).with_custom_size(8),
			entry_section(Opcode::STOP),
		]),
		EofException::InvalidTypeSectionSize,
	));
	cases.push(TestCase::invalid(
		"data_listed_in_types",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::data([0xaau8]).force_type_listing(),
		]),
		EofException::InvalidTypeSectionSize,
	));
}

fn missing_sections(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"no_code_section",
		Container::new(vec![Section::data([0x01u8])]),
		EofException::MissingCodeSection,
	));
	cases.push(TestCase::invalid(
		"no_type_section",
		entry_container(Opcode::STOP).without_auto_type_section(),
		EofException::MissingTypeSection,
	));
	cases.push(TestCase::invalid(
		"no_data_section",
		entry_container(Opcode::STOP).without_auto_data_section(),
		EofException::MissingDataSection,
	));
	cases.push(TestCase::invalid(
		"code_after_data",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::data([0u8; 0]),
			Section::code(Opcode::STOP),
		])
		.without_sorting(),
		EofException::MissingHeaderTerminator,
	));
}

fn sub_containers(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::valid(
		"sub_container",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::container(entry_container(Opcode::INVALID)),
		]),
	));
	cases.push(TestCase::valid(
		"sub_container_with_data",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::container(entry_container(Opcode::INVALID)),
			Section::data([0xdeu8, 0xad, 0xbe, 0xef]),
		]),
	));
	cases.push(TestCase::invalid(
		"sub_container_underflow",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::container(Container::new(vec![
				Section::code(Opcode::POP + Opcode::STOP).with_type(0, 0, 0),
			])),
		]),
		EofException::StackUnderflow,
	));
}

fn type_entries(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"entry_section_with_inputs",
		Container::code(Opcode::POP + Opcode::STOP),
		EofException::InvalidFirstSectionType,
	));
	cases.push(TestCase::invalid(
		"entry_section_with_outputs",
		Container::new(vec![Section::code(Opcode::STOP).with_type(0, 1, 0)]),
		EofException::InvalidFirstSectionType,
	));
	cases.push(TestCase::invalid(
		"inputs_above_limit",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::code(Opcode::RETF).with_type(128, 0, 128),
		]),
		EofException::InputsOutputsNumAboveLimit,
	));
	cases.push(TestCase::invalid(
		"outputs_above_limit",
		Container::new(vec![
			entry_section(Opcode::STOP),
			Section::code(Opcode::RETF).with_type(0, 128, 0),
		]),
		EofException::InputsOutputsNumAboveLimit,
	));
	cases.push(TestCase::invalid(
		"declared_max_stack_height_above_limit",
		Container::new(vec![
			entry_section(Opcode::STOP).with_max_stack_height(MAX_STACK_HEIGHT as u16 + 1),
		]),
		EofException::MaxStackHeightAboveLimit,
	));
	cases.push(TestCase::invalid(
		"computed_max_stack_height_above_limit",
		Container::new(vec![entry_section(
			Opcode::PUSH0 * (MAX_STACK_HEIGHT + 1) + Opcode::STOP,
		)
		.with_max_stack_height(MAX_STACK_HEIGHT as u16)]),
		EofException::MaxStackHeightAboveLimit,
	));
	cases.push(TestCase::valid(
		"max_stack_height_at_limit",
		entry_container(Opcode::PUSH0 * MAX_STACK_HEIGHT + Opcode::STOP),
	));
	cases.push(TestCase::invalid(
		"wrong_max_stack_height",
		Container::new(vec![entry_section(Opcode::STOP).with_max_stack_height(1)]),
		EofException::InvalidMaxStackHeight,
	));
}

fn calls(cases: &mut Vec<TestCase>) {
	cases.push(TestCase::invalid(
		"callf_missing_section",
		entry_container(Opcode::CALLF.with(&[1]) + Opcode::STOP),
		EofException::InvalidCodeSectionIndex,
	));
	cases.push(TestCase::invalid(
		"retf_with_extra_stack",
		entry_container(Opcode::PUSH0 + Opcode::RETF),
		EofException::StackHigherThanOutputs,
	));
	cases.push(TestCase::valid(
		"callf_consumes_and_returns",
		Container::new(vec![
			Section::code(
				Opcode::PUSH0 + Opcode::PUSH0 + Opcode::CALLF.with(&[1]) + Opcode::POP + Opcode::STOP,
			)
			.with_type(0, 0, 2),
			Section::code(Opcode::ADD + Opcode::RETF).with_type(2, 1, 2),
		]),
	));
	cases.push(TestCase::invalid(
		"callf_underflow",
		Container::new(vec![
			Section::code(Opcode::PUSH0 + Opcode::CALLF.with(&[1]) + Opcode::STOP).with_type(0, 0, 1),
			Section::code(Opcode::ADD + Opcode::RETF).with_type(2, 1, 2),
		]),
		EofException::StackUnderflow,
	));
}

pub(super) fn cases() -> Vec<TestCase> {
	let mut cases = Vec::new();
	section_counts(&mut cases);
	prefix(&mut cases);
	header_terminator(&mut cases);
	section_sizes(&mut cases);
	missing_sections(&mut cases);
	sub_containers(&mut cases);
	type_entries(&mut cases);
	calls(&mut cases);
	cases
}
