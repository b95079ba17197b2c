//! Decoding and validation of serialized containers.

use evm_eof_core::utils::read_u16;

use crate::analysis::{verify_code, TypeEntry};
use crate::container::{EOF_MAGIC, EOF_PREFIX, EOF_VERSION};
use crate::{
	EofException, SectionKind, MAX_CODE_INPUTS_OUTPUTS, MAX_CODE_SECTIONS, MAX_CONTAINER_SECTIONS,
	MAX_STACK_HEIGHT,
};

/// Section sizes declared by a container header.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
	pub type_size: u16,
	pub code_sizes: Vec<u16>,
	pub container_sizes: Vec<u16>,
	pub data_size: u16,
	/// Header length including the terminator.
	pub len: usize,
}

impl Header {
	/// Total body length the header declares.
	#[must_use]
	pub fn body_size(&self) -> usize {
		self.type_size as usize
			+ self.code_sizes.iter().map(|&size| size as usize).sum::<usize>()
			+ self.data_size as usize
			+ self.container_sizes.iter().map(|&size| size as usize).sum::<usize>()
	}

	/// Parses the header at the start of `raw`.
	pub fn decode(raw: &[u8]) -> Result<Self, EofException> {
		if raw.len() < 2 || raw[0] != EOF_PREFIX || raw[1] != EOF_MAGIC {
			return Err(EofException::InvalidMagic);
		}
		if raw.get(2) != Some(&EOF_VERSION) {
			return Err(EofException::InvalidVersion);
		}

		let mut header = Self::default();
		let mut position = 3;

		match raw.get(position) {
			None => return Err(EofException::MissingHeaderTerminator),
			Some(&kind) if kind == SectionKind::Type.as_u8() => {}
			Some(_) => return Err(EofException::MissingTypeSection),
		}
		header.type_size =
			read_u16(raw, position + 1).ok_or(EofException::IncompleteSectionSize)?;
		position += 3;

		if raw.get(position) != Some(&SectionKind::Code.as_u8()) {
			return Err(EofException::MissingCodeSection);
		}
		let (sizes, next) = read_sizes(
			raw,
			position + 1,
			MAX_CODE_SECTIONS,
			EofException::TooManyCodeSections,
		)?;
		header.code_sizes = sizes;
		position = next;

		if raw.get(position) == Some(&SectionKind::Container.as_u8()) {
			let (sizes, next) = read_sizes(
				raw,
				position + 1,
				MAX_CONTAINER_SECTIONS,
				EofException::TooManyContainerSections,
			)?;
			header.container_sizes = sizes;
			position = next;
		}

		match raw.get(position) {
			None => return Err(EofException::MissingHeaderTerminator),
			Some(&kind) if kind == SectionKind::Data.as_u8() => {}
			Some(_) => return Err(EofException::MissingDataSection),
		}
		header.data_size =
			read_u16(raw, position + 1).ok_or(EofException::IncompleteSectionSize)?;
		position += 3;

		if raw.get(position) != Some(&0x00) {
			return Err(EofException::MissingHeaderTerminator);
		}
		header.len = position + 1;

		Ok(header)
	}
}

/// Reads a list header body: section count then one size per section.
fn read_sizes(
	raw: &[u8],
	position: usize,
	limit: usize,
	too_many: EofException,
) -> Result<(Vec<u16>, usize), EofException> {
	let count = read_u16(raw, position).ok_or(EofException::IncompleteSectionCount)? as usize;
	if count == 0 {
		return Err(EofException::EmptySection);
	}
	if count > limit {
		return Err(too_many);
	}

	let mut sizes = Vec::with_capacity(count);
	let mut position = position + 2;
	for _ in 0..count {
		let size = read_u16(raw, position).ok_or(EofException::IncompleteSectionSize)?;
		if size == 0 {
			return Err(EofException::ZeroSectionSize);
		}
		sizes.push(size);
		position += 2;
	}
	Ok((sizes, position))
}

/// Judges `raw` the way a conforming EOF v1 parser does.
///
/// Header first, then body sizes and the type section, then every code
/// section, then every sub-container, recursively.
pub fn validate(raw: &[u8]) -> Result<(), EofException> {
	let header = Header::decode(raw)?;

	if header.type_size as usize != header.code_sizes.len() * 4 {
		return Err(EofException::InvalidTypeSectionSize);
	}
	if raw.len() - header.len != header.body_size() {
		return Err(EofException::InvalidSectionBodiesSize);
	}

	let mut position = header.len;
	let types: Vec<TypeEntry> = raw[position..position + header.type_size as usize]
		.chunks_exact(4)
		.map(|entry| TypeEntry::new(entry[0], entry[1], u16::from_be_bytes([entry[2], entry[3]])))
		.collect();
	position += header.type_size as usize;

	for (index, entry) in types.iter().enumerate() {
		if index == 0 && (entry.inputs != 0 || entry.outputs != 0) {
			return Err(EofException::InvalidFirstSectionType);
		}
		if entry.inputs as usize > MAX_CODE_INPUTS_OUTPUTS
			|| entry.outputs as usize > MAX_CODE_INPUTS_OUTPUTS
		{
			return Err(EofException::InputsOutputsNumAboveLimit);
		}
		if entry.max_stack_height as usize > MAX_STACK_HEIGHT {
			return Err(EofException::MaxStackHeightAboveLimit);
		}
	}

	for (index, &size) in header.code_sizes.iter().enumerate() {
		let code = &raw[position..position + size as usize];
		verify_code(code, index, &types)?;
		position += size as usize;
	}

	position += header.data_size as usize;
	for &size in &header.container_sizes {
		validate(&raw[position..position + size as usize])?;
		position += size as usize;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn check(hex: &str) -> Result<(), EofException> {
		validate(&hex::decode(hex).unwrap())
	}

	#[test]
	fn header_prefix() {
		assert_eq!(check(""), Err(EofException::InvalidMagic));
		assert_eq!(check("ef"), Err(EofException::InvalidMagic));
		assert_eq!(check("ef01"), Err(EofException::InvalidMagic));
		assert_eq!(check("ef00"), Err(EofException::InvalidVersion));
		assert_eq!(check("ef0002"), Err(EofException::InvalidVersion));
		assert_eq!(check("ef0001"), Err(EofException::MissingHeaderTerminator));
	}

	#[test]
	fn header_sections() {
		assert_eq!(check("ef000101"), Err(EofException::IncompleteSectionSize));
		assert_eq!(check("ef00010100"), Err(EofException::IncompleteSectionSize));
		assert_eq!(check("ef000102"), Err(EofException::MissingTypeSection));
		assert_eq!(check("ef000101000404"), Err(EofException::MissingCodeSection));
		assert_eq!(check("ef00010100040200"), Err(EofException::IncompleteSectionCount));
		assert_eq!(check("ef0001010004020000"), Err(EofException::EmptySection));
		assert_eq!(check("ef000101000402000100"), Err(EofException::IncompleteSectionSize));
		assert_eq!(check("ef00010100040200010000"), Err(EofException::ZeroSectionSize));
		assert_eq!(check("ef00010100040200010001"), Err(EofException::MissingHeaderTerminator));
		assert_eq!(check("ef0001010004020001000100"), Err(EofException::MissingDataSection));
		assert_eq!(check("ef000101000402000100010400"), Err(EofException::IncompleteSectionSize));
		assert_eq!(check("ef00010100040200010001040000000000000000"), Ok(()));
		assert_eq!(
			check("ef000101000402000100010400000100000000000000"),
			Err(EofException::MissingHeaderTerminator)
		);
	}

	#[test]
	fn section_counts() {
		assert_eq!(check("ef0001011004020401"), Err(EofException::TooManyCodeSections));
		assert_eq!(
			check("ef00010100040200010001030101"),
			Err(EofException::TooManyContainerSections)
		);
	}

	#[test]
	fn body() {
		assert_eq!(
			check("ef000101000802000100010400000000000000"),
			Err(EofException::InvalidTypeSectionSize)
		);
		assert_eq!(
			check("ef000101000402000100010400000000000000"),
			Err(EofException::InvalidSectionBodiesSize)
		);
		assert_eq!(
			check("ef00010100040200010001040000000000000000ff"),
			Err(EofException::InvalidSectionBodiesSize)
		);
		assert_eq!(
			check("ef00010100040200010002040000000100000150fe"),
			Err(EofException::InvalidFirstSectionType)
		);
	}

	#[test]
	fn sub_containers_are_validated() {
		let good = concat!(
			"ef0001",
			"010004",
			"0200010001",
			"0300010014",
			"040000",
			"00",
			"00000000",
			"00",
			"ef00010100040200010001040000000000000000"
		);
		assert_eq!(check(good), Ok(()));

		let bad = concat!(
			"ef0001",
			"010004",
			"0200010001",
			"0300010015",
			"040000",
			"00",
			"00000000",
			"00",
			"ef00010100040200010002040000",
			"00",
			"00000000",
			"5000"
		);
		assert_eq!(check(bad), Err(EofException::StackUnderflow));
	}
}
