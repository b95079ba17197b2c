use std::collections::BTreeMap;

use evm_eof::{EofException, TestCase};
use hex::FromHex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Results key the fixtures are filled under unless told otherwise. The
/// containers follow a draft of EOF v1 that no released fork ships, so the
/// key names the format rather than a fork.
pub const DEFAULT_FORK: &str = "EOFv1";

/// Written to `_info.comment` of every filled fixture.
pub const DRAFT_NOTE: &str =
	"EOF v1 draft: RJUMPV carries a branch count, JUMPF and stack validation are absent";

/// Statistic type to gather check completion status
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct TestCompletionStatus {
	pub passed: usize,
	pub failed: usize,
}

impl std::ops::AddAssign for TestCompletionStatus {
	fn add_assign(&mut self, rhs: Self) {
		self.passed += rhs.passed;
		self.failed += rhs.failed;
	}
}

impl TestCompletionStatus {
	pub fn inc_passed(&mut self) {
		self.passed += 1
	}

	pub fn inc_failed(&mut self) {
		self.failed += 1
	}

	pub fn get_total(&self) -> usize {
		self.passed + self.failed
	}

	pub fn print_total(&self) {
		println!(
			"\nTOTAL: {} vectors\n\tPASSED: {}\n\tFAILED: {}",
			self.get_total(),
			self.passed,
			self.failed
		);
	}
}

/// One fixture in an EOF test file, keyed by case name in the file.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct EofFixture {
	#[serde(rename = "_info")]
	pub info: FixtureInfo,
	pub vectors: BTreeMap<String, Vector>,
}

impl EofFixture {
	/// Fixture with a single vector holding the case's container.
	pub fn from_case(case: &TestCase, fork: &str) -> Self {
		let mut results = BTreeMap::new();
		results.insert(fork.to_owned(), VectorResult::from_expected(case.expected()));

		let mut vectors = BTreeMap::new();
		vectors.insert(
			"0".to_owned(),
			Vector {
				code: HexBytes(case.bytes().to_vec()),
				results,
			},
		);

		Self {
			info: FixtureInfo {
				hash: format!("0x{}", hex::encode(case.container.hash())),
				description: case.name.clone(),
				comment: DRAFT_NOTE.to_owned(),
			},
			vectors,
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct FixtureInfo {
	pub hash: String,
	pub description: String,
	#[serde(default)]
	pub comment: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Vector {
	pub code: HexBytes,
	pub results: BTreeMap<String, VectorResult>,
}

impl Vector {
	/// Expected verdict for `fork`, `None` for a valid container.
	pub fn expected(&self, fork: &str) -> Result<Option<EofException>, Error> {
		self.results
			.get(fork)
			.ok_or_else(|| Error::UnsupportedFork(fork.to_owned()))?
			.expected()
	}
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct VectorResult {
	pub result: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<String>,
}

impl VectorResult {
	pub fn from_expected(expected: Option<EofException>) -> Self {
		Self {
			result: expected.is_none(),
			exception: expected.map(|err| err.tag()),
		}
	}

	pub fn expected(&self) -> Result<Option<EofException>, Error> {
		match (&self.exception, self.result) {
			(None, true) => Ok(None),
			(Some(tag), false) => EofException::from_tag(tag)
				.map(Some)
				.ok_or_else(|| Error::UnknownException(tag.clone())),
			(Some(tag), true) => Err(Error::UnknownException(tag.clone())),
			(None, false) => Err(Error::UnknownException(String::new())),
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct HexBytes(
	#[serde(
		deserialize_with = "deserialize_hex_bytes",
		serialize_with = "serialize_hex_bytes"
	)]
	pub Vec<u8>,
);

fn deserialize_hex_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	let data = String::deserialize(deserializer)?;
	let Some(data) = data.strip_prefix("0x") else {
		return Err(de::Error::custom("should start with 0x"));
	};
	FromHex::from_hex(data).map_err(de::Error::custom)
}

fn serialize_hex_bytes<S>(value: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let mut s = "0x".to_string();
	s.push_str(&hex::encode(value));
	s.serialize(serializer)
}

#[cfg(test)]
mod tests {
	use super::*;
	use evm_eof::{Container, Opcode};

	#[test]
	fn fixture_shape() {
		let case = TestCase::invalid(
			"no_stop",
			Container::code(Opcode::PUSH0 + Opcode::POP),
			EofException::MissingStopOpcode,
		);
		let fixture = EofFixture::from_case(&case, DEFAULT_FORK);
		let json = serde_json::to_value(&fixture).unwrap();

		assert_eq!(json["_info"]["description"], "no_stop");
		assert_eq!(json["_info"]["comment"], DRAFT_NOTE);
		assert!(json["_info"]["hash"].as_str().unwrap().starts_with("0x"));
		assert_eq!(
			json["vectors"]["0"]["code"],
			concat!("0x", "ef0001", "010004", "0200010002", "040000", "00", "00000001", "5f50")
		);
		assert_eq!(json["vectors"]["0"]["results"]["EOFv1"]["result"], false);
		assert_eq!(
			json["vectors"]["0"]["results"]["EOFv1"]["exception"],
			"EOFException.MISSING_STOP_OPCODE"
		);
	}

	#[test]
	fn valid_vector_has_no_exception() {
		let case = TestCase::valid("stop", Container::code(Opcode::STOP));
		let fixture = EofFixture::from_case(&case, "Prague");
		let json = serde_json::to_string(&fixture).unwrap();
		assert!(!json.contains("exception"));

		let parsed: EofFixture = serde_json::from_str(&json).unwrap();
		assert_eq!(parsed, fixture);
		assert_eq!(parsed.vectors["0"].expected("Prague").unwrap(), None);
		assert!(matches!(
			parsed.vectors["0"].expected(DEFAULT_FORK),
			Err(Error::UnsupportedFork(_))
		));
	}

	#[test]
	fn info_without_comment_is_accepted() {
		let info: FixtureInfo =
			serde_json::from_str(r#"{ "hash": "0x00", "description": "stop" }"#).unwrap();
		assert_eq!(info.comment, "");
	}

	#[test]
	fn unknown_exception_is_an_error() {
		let result = VectorResult {
			result: false,
			exception: Some("EOFException.NOT_A_THING".into()),
		};
		assert!(matches!(result.expected(), Err(Error::UnknownException(_))));
		assert!(serde_json::from_str::<HexBytes>("\"ef00\"").is_err());
	}
}
