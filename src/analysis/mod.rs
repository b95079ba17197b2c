//! Stack height and control flow analysis of code sections.

mod bounds;
mod verifier;

pub use self::bounds::{stack_bounds, StackBounds};
pub use self::verifier::{verify_code, TypeEntry};

use crate::{Immediate, OpcodeInfo};

/// Total immediate length of the instruction at `position`, `None` when it
/// runs past the end of `code`.
pub(crate) fn immediate_size(info: &OpcodeInfo, code: &[u8], position: usize) -> Option<usize> {
	let size = match info.immediate {
		Immediate::Fixed(size) => size,
		Immediate::JumpTable => {
			let count = *code.get(position + 1)? as usize;
			1 + count * info.immediate_length_of(1)
		}
	};
	if size != 0 && position + size >= code.len() {
		return None;
	}
	Some(size)
}
