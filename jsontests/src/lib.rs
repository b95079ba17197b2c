//! EOF v1 validation fixtures: filling, re-checking and cross-checking
//! against `evmone-eofparse`.

pub mod eofparse;
pub mod error;
pub mod run;
pub mod types;

pub use crate::error::{Error, TestError};
pub use crate::types::{EofFixture, TestCompletionStatus, DEFAULT_FORK, DRAFT_NOTE};
