use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
	#[error("{name}: expected {expected}, got {actual} for {code}")]
	Mismatch {
		name: String,
		expected: String,
		actual: String,
		code: String,
	},
	#[error("{0} mismatches")]
	Failed(usize),
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("io error")]
	IO(#[from] std::io::Error),
	#[error("json error")]
	JSON(#[from] serde_json::Error),
	#[error("non-utf8 filename")]
	NonUtf8Filename,
	#[error("unknown exception {0}")]
	UnknownException(String),
	#[error("no result for fork {0}")]
	UnsupportedFork(String),
	#[error("external parser: {0}")]
	Process(String),
	#[error("test error")]
	Test(#[from] TestError),
}
