//! EOF v1 container encoding, code verification and validation test corpus.

#![forbid(unsafe_code, unused_variables)]

pub use evm_eof_core::*;

pub mod analysis;
pub mod corpus;
mod container;
mod section;
mod validation;

pub use crate::analysis::{stack_bounds, verify_code, StackBounds, TypeEntry};
pub use crate::container::{Container, EOF_MAGIC, EOF_PREFIX, EOF_VERSION};
pub use crate::corpus::TestCase;
pub use crate::section::{Section, SectionData, SectionKind};
pub use crate::validation::{validate, Header};

/// Most code sections a container may declare.
pub const MAX_CODE_SECTIONS: usize = 1024;
/// Most sub-containers a container may declare.
pub const MAX_CONTAINER_SECTIONS: usize = 256;
/// Most inputs or outputs of a code section.
pub const MAX_CODE_INPUTS_OUTPUTS: usize = 127;
/// Highest stack a code section may reach.
pub const MAX_STACK_HEIGHT: usize = 1023;
