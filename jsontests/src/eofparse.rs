//! Cross-checking against the `evmone-eofparse` binary.
//!
//! The binary reads one hex container per line on stdin and answers each
//! with `OK <sections>` or `err: <message>` on stdout.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use evm_eof::{EofException, TestCase};
use lazy_static::lazy_static;

use crate::error::{Error, TestError};

lazy_static! {
	/// Message `evmone-eofparse` prints for each rejection kind.
	static ref MESSAGES: BTreeMap<EofException, &'static str> = {
		use EofException::*;

		let mut messages = BTreeMap::new();
		for (kind, message) in [
			(InvalidMagic, "invalid_prefix"),
			(InvalidVersion, "eof_version_unknown"),
			(MissingHeaderTerminator, "header_terminator_missing"),
			(IncompleteSectionSize, "incomplete_section_size"),
			(IncompleteSectionCount, "incomplete_section_number"),
			(ZeroSectionSize, "zero_section_size"),
			(EmptySection, "zero_section_size"),
			(TooManyCodeSections, "too_many_code_sections"),
			(TooManyContainerSections, "too_many_container_sections"),
			(MissingCodeSection, "code_section_missing"),
			(MissingTypeSection, "type_section_missing"),
			(MissingDataSection, "data_section_missing"),
			(InvalidTypeSectionSize, "invalid_type_section_size"),
			(InvalidSectionBodiesSize, "invalid_section_bodies_size"),
			(InvalidFirstSectionType, "invalid_first_section_type"),
			(InputsOutputsNumAboveLimit, "inputs_outputs_num_above_limit"),
			(MaxStackHeightAboveLimit, "max_stack_height_above_limit"),
			(InvalidMaxStackHeight, "invalid_max_stack_height"),
			(UndefinedInstruction, "undefined_instruction"),
			(TruncatedImmediate, "truncated_instruction"),
			(MissingStopOpcode, "no_terminating_instruction"),
			(UnreachableCode, "unreachable_instructions"),
			(InvalidRelativeOffset, "invalid_rjump_destination"),
			(InvalidJumpTableCount, "invalid_rjumpv_count"),
			(InvalidCodeSectionIndex, "invalid_code_section_index"),
			(StackUnderflow, "stack_underflow"),
			(InvalidControlFlow, "stack_height_mismatch"),
			(StackHigherThanOutputs, "stack_higher_than_outputs_required"),
		] {
			messages.insert(kind, message);
		}
		messages
	};
}

/// Message the binary prints for `kind`.
pub fn message(kind: EofException) -> &'static str {
	MESSAGES.get(&kind).copied().unwrap_or("unknown")
}

/// Verdict read from one output line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
	Valid,
	Invalid(String),
}

impl Verdict {
	/// Parses one output line. Anything that is not an error counts as valid.
	pub fn parse(line: &str) -> Self {
		match line.trim().strip_prefix("err:") {
			Some(message) => Self::Invalid(message.trim().to_owned()),
			None => Self::Valid,
		}
	}

	fn describe(&self) -> String {
		match self {
			Self::Valid => "valid".to_owned(),
			Self::Invalid(message) => message.clone(),
		}
	}
}

/// Shortens long hex so mismatch reports stay readable.
pub fn elide(hex: &str) -> String {
	const HEAD: usize = 32;
	const TAIL: usize = 16;

	if hex.len() <= HEAD + TAIL + 2 {
		hex.to_owned()
	} else {
		format!("{}..{}", &hex[..HEAD], &hex[hex.len() - TAIL..])
	}
}

/// Compares each case with the verdict at the same position.
pub fn compare(cases: &[TestCase], verdicts: &[Verdict]) -> Result<Vec<TestError>, Error> {
	if cases.len() != verdicts.len() {
		return Err(Error::Process(format!(
			"{} containers sent, {} verdicts received",
			cases.len(),
			verdicts.len()
		)));
	}

	let mut mismatches = Vec::new();
	for (case, verdict) in cases.iter().zip(verdicts) {
		let expected = match case.expected() {
			None => Verdict::Valid,
			Some(kind) => Verdict::Invalid(message(kind).to_owned()),
		};
		if &expected != verdict {
			mismatches.push(TestError::Mismatch {
				name: case.name.clone(),
				expected: expected.describe(),
				actual: verdict.describe(),
				code: elide(&hex::encode(case.bytes())),
			});
		}
	}
	Ok(mismatches)
}

/// Runs `binary` over every case and returns the verdicts in order.
pub fn run(binary: &Path, cases: &[TestCase]) -> Result<Vec<Verdict>, Error> {
	let mut child = Command::new(binary)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::inherit())
		.spawn()?;

	let mut stdin = child
		.stdin
		.take()
		.ok_or_else(|| Error::Process("stdin not captured".into()))?;
	let input: Vec<String> = cases
		.iter()
		.map(|case| hex::encode(case.bytes()))
		.collect();
	let writer = thread::spawn(move || -> std::io::Result<()> {
		for line in input {
			writeln!(stdin, "{}", line)?;
		}
		Ok(())
	});

	let output = child.wait_with_output()?;
	writer
		.join()
		.map_err(|_| Error::Process("stdin writer panicked".into()))??;
	if !output.status.success() {
		return Err(Error::Process(format!("exited with {}", output.status)));
	}

	let stdout = String::from_utf8_lossy(&output.stdout);
	log::debug!(target: "eof", "{} lines from {}", stdout.lines().count(), binary.display());
	Ok(stdout.lines().map(Verdict::parse).collect())
}

/// Runs `binary` over `cases` and fails on any disagreement.
pub fn verify(binary: &Path, cases: &[TestCase]) -> Result<(), Error> {
	let verdicts = run(binary, cases)?;
	let mismatches = compare(cases, &verdicts)?;
	for mismatch in &mismatches {
		log::error!(target: "eof", "{}", mismatch);
	}
	if mismatches.is_empty() {
		Ok(())
	} else {
		Err(TestError::Failed(mismatches.len()).into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use evm_eof::{Container, Opcode};

	#[test]
	fn every_kind_has_a_message() {
		for kind in EofException::ALL {
			assert_ne!(message(kind), "unknown", "{}", kind);
		}
	}

	#[test]
	fn output_lines() {
		assert_eq!(Verdict::parse("OK 00"), Verdict::Valid);
		assert_eq!(
			Verdict::parse("err: stack_underflow\n"),
			Verdict::Invalid("stack_underflow".into())
		);
	}

	#[test]
	fn long_hex_is_elided() {
		assert_eq!(elide("ef00"), "ef00");
		let long = "ab".repeat(40);
		let short = elide(&long);
		assert_eq!(short.len(), 32 + 2 + 16);
		assert!(short.contains(".."));
	}

	#[test]
	fn mismatches_are_reported() {
		let cases = vec![
			TestCase::valid("stop", Container::code(Opcode::STOP)),
			TestCase::invalid(
				"pop",
				Container::new(vec![evm_eof::Section::code(Opcode::POP + Opcode::STOP).with_type(0, 0, 0)]),
				EofException::StackUnderflow,
			),
		];

		let verdicts = [Verdict::Valid, Verdict::Invalid("stack_underflow".into())];
		assert!(compare(&cases, &verdicts).unwrap().is_empty());

		let verdicts = [Verdict::Invalid("stack_underflow".into()), Verdict::Valid];
		let mismatches = compare(&cases, &verdicts).unwrap();
		assert_eq!(mismatches.len(), 2);
		assert!(matches!(
			&mismatches[1],
			TestError::Mismatch { name, expected, actual, .. }
				if name == "pop" && expected == "stack_underflow" && actual == "valid"
		));

		assert!(matches!(compare(&cases, &verdicts[..1]), Err(Error::Process(_))));
	}
}
