use evm_eof::{validate, Container, EofException, Opcode, Section, SectionKind, MAX_CODE_SECTIONS};

fn encoded(container: &Container) -> String {
	hex::encode(container.serialize())
}

#[test]
fn single_stop_container() {
	let container = Container::code(Opcode::STOP);
	assert_eq!(encoded(&container), "ef00010100040200010001040000000000000000");
	assert_eq!(validate(container.serialize()), Ok(()));
	assert_eq!(container.to_string(), "0xef00010100040200010001040000000000000000");
}

#[test]
fn serialization_is_deterministic() {
	let build = || {
		Container::new(vec![
			Section::code(Opcode::PUSH0 + Opcode::PUSH0 + Opcode::CALLF.with(&[1]) + Opcode::POP + Opcode::STOP)
				.with_type(0, 0, 2),
			Section::code(Opcode::ADD + Opcode::RETF).with_type(2, 1, 2),
			Section::data([0x01u8, 0x02, 0x03]),
		])
	};
	let first = build();
	let second = build();
	assert_eq!(first.serialize(), first.serialize());
	assert_eq!(first.serialize(), second.serialize());
	assert_eq!(first.hash(), second.hash());
	assert_eq!(validate(first.serialize()), Ok(()));
}

#[test]
fn two_code_sections_share_one_header_entry() {
	let container = Container::new(vec![
		Section::code(Opcode::CALLF.with(&[1]) + Opcode::STOP),
		Section::code(Opcode::RETF),
	]);
	assert_eq!(
		encoded(&container),
		concat!(
			"ef0001",
			"010008",
			"02000200040001",
			"040000",
			"00",
			"00000000",
			"00000000",
			"e3000100",
			"e4"
		)
	);
}

#[test]
fn type_section_for_every_code_section() {
	let sections = (0..MAX_CODE_SECTIONS)
		.map(|_| Section::code(Opcode::STOP))
		.collect();
	let container = Container::new(sections);
	let bytes = container.serialize();

	assert_eq!(&bytes[3..6], &[SectionKind::Type.as_u8(), 0x10, 0x00]);
	assert_eq!(&bytes[6..9], &[SectionKind::Code.as_u8(), 0x04, 0x00]);
	// prefix, type entry, code count, sizes, data entry, terminator
	let header_len = 3 + 3 + 3 + 2 * MAX_CODE_SECTIONS + 3 + 1;
	assert_eq!(bytes.len(), header_len + 4 * MAX_CODE_SECTIONS + MAX_CODE_SECTIONS);
	assert_eq!(validate(bytes), Ok(()));
}

#[test]
fn explicit_sections_replace_synthesized_ones() {
	let container = Container::new(vec![
		Section::types([0u8, 0, 0, 0]),
		Section::code(Opcode::STOP),
		Section::data([0xffu8]),
	]);
	assert_eq!(
		encoded(&container),
		concat!("ef0001", "010004", "0200010001", "040001", "00", "00000000", "00", "ff")
	);
}

#[test]
fn malformed_levers_are_not_corrected() {
	let container = Container::code(Opcode::STOP)
		.with_magic(0xff)
		.with_version(0x07)
		.with_header_terminator(vec![0xaa, 0xbb])
		.with_extra(vec![0xcc]);
	assert_eq!(encoded(&container), "efff070100040200010001040000aabb0000000000cc");
	assert_eq!(validate(container.serialize()), Err(EofException::InvalidMagic));

	let container = Container::new(vec![Section::code(Opcode::STOP).skip_header_listing()]);
	assert_eq!(encoded(&container), "ef0001010004040000000000000000");
}

#[test]
fn sub_container_serialization_is_embedded() {
	let sub = Container::code(Opcode::INVALID);
	let container = Container::new(vec![Section::code(Opcode::STOP), Section::container(sub.clone())]);
	let bytes = container.serialize();
	assert!(bytes.ends_with(sub.serialize()));
	assert_eq!(validate(bytes), Ok(()));
}
