use std::{
	collections::BTreeMap,
	fs::{self, File},
	io::{BufReader, BufWriter},
	path::{Path, PathBuf},
};

use evm_eof::{corpus, validate, EofException, TestCase};

use crate::{
	error::{Error, TestError},
	types::{EofFixture, TestCompletionStatus},
};

fn check_vector(name: &str, code: &[u8], expected: Option<EofException>) -> Result<(), TestError> {
	let actual = validate(code).err();
	if actual == expected {
		return Ok(());
	}
	let describe = |verdict: Option<EofException>| verdict.map_or("valid".to_owned(), |err| err.tag());
	Err(TestError::Mismatch {
		name: name.to_owned(),
		expected: describe(expected),
		actual: describe(actual),
		code: crate::eofparse::elide(&hex::encode(code)),
	})
}

fn record(status: &mut TestCompletionStatus, result: Result<(), TestError>) {
	match result {
		Ok(()) => status.inc_passed(),
		Err(err) => {
			log::error!(target: "eof", "{}", err);
			status.inc_failed();
		}
	}
}

/// Writes one fixture file per corpus group into `output` and returns the
/// written paths.
pub fn fill(output: &Path, fork: &str) -> Result<Vec<PathBuf>, Error> {
	fs::create_dir_all(output)?;

	let mut written = Vec::new();
	for (group, cases) in corpus::groups() {
		let fixtures: BTreeMap<String, EofFixture> = cases
			.iter()
			.map(|case| (case.name.clone(), EofFixture::from_case(case, fork)))
			.collect();

		let path = output.join(format!("{group}.json"));
		let writer = BufWriter::new(File::create(&path)?);
		serde_json::to_writer_pretty(writer, &fixtures)?;
		log::info!(target: "eof", "wrote {} fixtures to {}", fixtures.len(), path.display());
		written.push(path);
	}

	Ok(written)
}

/// Checks the generated corpus against the validator.
pub fn check_corpus(cases: &[TestCase]) -> TestCompletionStatus {
	let mut status = TestCompletionStatus::default();
	for case in cases {
		record(&mut status, check_vector(&case.name, case.bytes(), case.expected()));
	}
	status
}

/// Checks every vector of a fixture file against the validator.
pub fn check_file(filename: &Path, fork: &str) -> Result<TestCompletionStatus, Error> {
	let fixtures: BTreeMap<String, EofFixture> =
		serde_json::from_reader(BufReader::new(File::open(filename)?))?;

	let mut status = TestCompletionStatus::default();
	for (name, fixture) in fixtures {
		for (index, vector) in &fixture.vectors {
			let expected = vector.expected(fork)?;
			let name = format!("{name}/{index}");
			record(&mut status, check_vector(&name, &vector.code.0, expected));
		}
	}
	Ok(status)
}

/// Checks a fixture file, or every `.json` file under a directory.
pub fn check_path(path: &Path, fork: &str) -> Result<TestCompletionStatus, Error> {
	if !fs::metadata(path)?.is_dir() {
		return check_file(path, fork);
	}

	let mut status = TestCompletionStatus::default();
	let mut entries: Vec<PathBuf> = fs::read_dir(path)?
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<Result<_, _>>()?;
	entries.sort();
	for entry in entries {
		let name = entry.to_str().ok_or(Error::NonUtf8Filename)?;
		if entry.is_dir() || name.ends_with(".json") {
			log::info!(target: "eof", "checking {}", name);
			status += check_path(&entry, fork)?;
		}
	}
	Ok(status)
}

#[cfg(test)]
mod tests {
	use super::*;
	use evm_eof::{Container, Opcode};

	#[test]
	fn mismatch_names_both_verdicts() {
		let err = check_vector("case", &[0xef, 0x00, 0x01], None).unwrap_err();
		let TestError::Mismatch { expected, actual, .. } = err else {
			panic!("expected a mismatch");
		};
		assert_eq!(expected, "valid");
		assert_eq!(actual, "EOFException.MISSING_HEADERS_TERMINATOR");
	}

	#[test]
	fn wrong_expectations_are_counted() {
		let cases = vec![
			TestCase::valid("stop", Container::code(Opcode::STOP)),
			TestCase::invalid("also_stop", Container::code(Opcode::STOP), EofException::StackUnderflow),
		];
		let status = check_corpus(&cases);
		assert_eq!(status.passed, 1);
		assert_eq!(status.failed, 1);
	}
}
