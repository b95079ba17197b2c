use std::collections::HashSet;

use evm_eof::{corpus, validate, EofException, Opcode, TestCase};

fn check_group(cases: &[TestCase]) {
	assert!(!cases.is_empty());
	for case in cases {
		assert_eq!(
			validate(case.bytes()),
			case.expected().map_or(Ok(()), Err),
			"{}: {}",
			case.name,
			case.container
		);
	}
}

#[test]
fn terminating_cases_match_the_validator() {
	check_group(&corpus::terminating());
}

#[test]
fn immediate_cases_match_the_validator() {
	check_group(&corpus::immediates());
}

#[test]
fn rjump_cases_match_the_validator() {
	check_group(&corpus::rjump());
}

#[test]
fn container_cases_match_the_validator() {
	check_group(&corpus::containers());
}

#[test]
fn names_are_unique() {
	let cases = corpus::all();
	let mut names = HashSet::new();
	for case in &cases {
		assert!(names.insert(case.name.as_str()), "duplicate {}", case.name);
		assert_eq!(case.container.name(), Some(case.name.as_str()));
	}
}

#[test]
fn generation_is_deterministic() {
	let first = corpus::all();
	let second = corpus::all();
	assert_eq!(first.len(), second.len());
	for (a, b) in first.iter().zip(&second) {
		assert_eq!(a.name, b.name);
		assert_eq!(a.bytes(), b.bytes());
		assert_eq!(a.expected(), b.expected());
	}
}

#[test]
fn groups_cover_both_verdicts() {
	for cases in [
		corpus::terminating(),
		corpus::rjump(),
		corpus::containers(),
	] {
		assert!(cases.iter().any(|case| case.expected().is_none()));
		assert!(cases.iter().any(|case| case.expected().is_some()));
	}
	assert!(corpus::immediates()
		.iter()
		.all(|case| case.expected().is_some()));
}

#[test]
fn every_immediate_is_truncated() {
	let cases = corpus::immediates();
	for opcode in [Opcode::PUSH1, Opcode::PUSH32, Opcode::RJUMP, Opcode::RJUMPV, Opcode::CALLF] {
		let prefix = format!("truncated_0x{:02x}_", opcode.as_u8());
		let truncated = cases
			.iter()
			.filter(|case| case.name.starts_with(&prefix))
			.count();
		assert!(truncated >= 1, "{} has no truncated case", opcode);
		assert!(cases
			.iter()
			.filter(|case| case.name.starts_with(&prefix))
			.all(|case| case.expected() == Some(EofException::TruncatedImmediate)));
	}
}

#[test]
fn undefined_opcodes_are_rejected() {
	let cases = corpus::terminating();
	let case = cases
		.iter()
		.find(|case| case.name == "undefined_terminating_0x0c")
		.unwrap();
	assert_eq!(case.expected(), Some(EofException::UndefinedInstruction));
	assert!(cases
		.iter()
		.any(|case| case.name == "undefined_terminating_0x56"));
}

#[test]
fn undefined_opcodes_are_rejected_outside_the_entry_section() {
	let cases = corpus::terminating();
	let case = cases
		.iter()
		.find(|case| case.name == "undefined_terminating_0x0c_second_section")
		.unwrap();
	assert_eq!(case.container.code_section_count(), 2);
	assert_eq!(case.expected(), Some(EofException::UndefinedInstruction));
	assert_eq!(validate(case.bytes()), Err(EofException::UndefinedInstruction));
}
