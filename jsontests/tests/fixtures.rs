use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use evm_eof::corpus;
use evm_eof_jsontests::{run, EofFixture, DEFAULT_FORK};

fn scratch_dir(name: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("evm-eof-jsontests-{}-{}", name, std::process::id()));
	let _ = fs::remove_dir_all(&dir);
	dir
}

#[test]
fn filled_fixtures_pass_the_checker() {
	let _ = env_logger::try_init();
	let dir = scratch_dir("fill");

	let written = run::fill(&dir, DEFAULT_FORK).unwrap();
	assert_eq!(written.len(), corpus::groups().len());

	let status = run::check_path(&dir, DEFAULT_FORK).unwrap();
	assert_eq!(status.failed, 0);
	assert_eq!(status.passed, corpus::all().len());

	fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn fixture_files_hold_every_case_of_their_group() {
	let dir = scratch_dir("groups");
	run::fill(&dir, "Prague").unwrap();

	for (group, cases) in corpus::groups() {
		let file = File::open(dir.join(format!("{group}.json"))).unwrap();
		let fixtures: BTreeMap<String, EofFixture> =
			serde_json::from_reader(BufReader::new(file)).unwrap();
		assert_eq!(fixtures.len(), cases.len());

		for case in &cases {
			let vector = &fixtures[&case.name].vectors["0"];
			assert_eq!(&vector.code.0[..], &case.bytes()[..]);
			assert_eq!(vector.expected("Prague").unwrap(), case.expected());
		}
	}

	assert!(run::check_path(&dir, "Cancun").is_err());
	fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn generated_corpus_passes_the_checker() {
	let cases = corpus::all();
	let status = run::check_corpus(&cases);
	assert_eq!(status.failed, 0);
	assert_eq!(status.get_total(), cases.len());
}
