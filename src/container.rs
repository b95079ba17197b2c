use std::fmt;
use std::sync::OnceLock;

use bytes::{BufMut, Bytes, BytesMut};
use sha3::{Digest, Keccak256};

use crate::{Bytecode, EofException, Section, SectionKind};

/// First byte of every EOF container.
pub const EOF_PREFIX: u8 = 0xef;
/// Default magic byte following the prefix.
pub const EOF_MAGIC: u8 = 0x00;
/// Default version byte.
pub const EOF_VERSION: u8 = 0x01;

/// EOF v1 container under construction, together with the verdict a
/// conforming parser is expected to reach on it.
///
/// The serialization is computed once, on first access. All setters consume
/// the container and hand back a fresh one, so cached bytes never go stale.
#[derive(Clone, Debug)]
pub struct Container {
	name: Option<String>,
	sections: Vec<Section>,
	magic: u8,
	version: u8,
	auto_type_section: bool,
	auto_data_section: bool,
	auto_sort_sections: bool,
	header_terminator: Vec<u8>,
	extra: Vec<u8>,
	raw_bytes: Option<Bytes>,
	validity_error: Option<EofException>,
	serialized: OnceLock<Bytes>,
}

impl Default for Container {
	fn default() -> Self {
		Self {
			name: None,
			sections: Vec::new(),
			magic: EOF_MAGIC,
			version: EOF_VERSION,
			auto_type_section: true,
			auto_data_section: true,
			auto_sort_sections: true,
			header_terminator: vec![0x00],
			extra: Vec::new(),
			raw_bytes: None,
			validity_error: None,
			serialized: OnceLock::new(),
		}
	}
}

impl Container {
	/// Container over `sections`.
	#[must_use]
	pub fn new(sections: Vec<Section>) -> Self {
		Self {
			sections,
			..Self::default()
		}
	}

	/// Container with a single code section.
	#[must_use]
	pub fn code(code: impl Into<Bytecode>) -> Self {
		Self::new(vec![Section::code(code)])
	}

	/// Container whose serialization is exactly `bytes`.
	#[must_use]
	pub fn raw(bytes: impl Into<Bytes>) -> Self {
		Self {
			raw_bytes: Some(bytes.into()),
			..Self::default()
		}
	}

	fn modified(mut self, f: impl FnOnce(&mut Self)) -> Self {
		f(&mut self);
		self.serialized = OnceLock::new();
		self
	}

	/// Label used as the fixture name.
	#[must_use]
	pub fn named(self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.modified(|c| c.name = Some(name))
	}

	/// Magic byte written after the prefix.
	#[must_use]
	pub fn with_magic(self, magic: u8) -> Self {
		self.modified(|c| c.magic = magic)
	}

	/// Version byte.
	#[must_use]
	pub fn with_version(self, version: u8) -> Self {
		self.modified(|c| c.version = version)
	}

	/// Stops a type section from being synthesized.
	#[must_use]
	pub fn without_auto_type_section(self) -> Self {
		self.modified(|c| c.auto_type_section = false)
	}

	/// Stops an empty data section from being appended.
	#[must_use]
	pub fn without_auto_data_section(self) -> Self {
		self.modified(|c| c.auto_data_section = false)
	}

	/// Keeps the declared section order in both header and body.
	#[must_use]
	pub fn without_sorting(self) -> Self {
		self.modified(|c| c.auto_sort_sections = false)
	}

	/// Bytes written in place of the single zero ending the header.
	#[must_use]
	pub fn with_header_terminator(self, terminator: impl Into<Vec<u8>>) -> Self {
		let terminator = terminator.into();
		self.modified(|c| c.header_terminator = terminator)
	}

	/// Bytes appended after the last body.
	#[must_use]
	pub fn with_extra(self, extra: impl Into<Vec<u8>>) -> Self {
		let extra = extra.into();
		self.modified(|c| c.extra = extra)
	}

	/// Marks the container as invalid with `error`.
	#[must_use]
	pub fn expect(self, error: EofException) -> Self {
		self.with_validity_error(Some(error))
	}

	/// Sets or clears the expected parser error.
	#[must_use]
	pub fn with_validity_error(self, error: Option<EofException>) -> Self {
		self.modified(|c| c.validity_error = error)
	}

	/// Fixture name, if one was given.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Sections as declared, without the synthesized type and data
	/// sections.
	pub fn sections(&self) -> &[Section] {
		&self.sections
	}

	/// Error a conforming parser reports, `None` for a valid container.
	pub fn validity_error(&self) -> Option<EofException> {
		self.validity_error
	}

	/// Number of code sections declared, before any synthesis.
	#[must_use]
	pub fn code_section_count(&self) -> usize {
		self.sections
			.iter()
			.filter(|section| section.kind() == SectionKind::Code)
			.count()
	}

	/// EOF bytes of the container.
	///
	/// # Panics
	///
	/// When a run of list sections or a section body outgrows the two-byte
	/// header fields.
	pub fn serialize(&self) -> &Bytes {
		self.serialized.get_or_init(|| self.encode())
	}

	/// Keccak-256 of the serialized bytes.
	#[must_use]
	pub fn hash(&self) -> [u8; 32] {
		let mut hash = [0u8; 32];
		hash.copy_from_slice(&Keccak256::digest(self.serialize()));
		hash
	}

	fn encode(&self) -> Bytes {
		if let Some(raw) = &self.raw_bytes {
			return raw.clone();
		}

		let type_section;
		let data_section;
		let mut sections: Vec<&Section> = self.sections.iter().collect();

		if self.auto_type_section && !self.has_kind(SectionKind::Type) {
			let entries: Vec<u8> = self
				.sections
				.iter()
				.filter(|section| section.is_type_listed())
				.flat_map(|section| section.type_entry())
				.collect();
			type_section = Section::types(entries);
			sections.insert(0, &type_section);
		}
		if self.auto_data_section && !self.has_kind(SectionKind::Data) {
			data_section = Section::data([0u8; 0]);
			sections.push(&data_section);
		}

		let mut header_order = sections.clone();
		let mut body_order = sections;
		if self.auto_sort_sections {
			header_order.sort_by_key(|section| section.kind().as_u8());
			body_order.sort_by_key(|section| section.kind().body_rank());
		}

		let mut out = BytesMut::new();
		out.put_u8(EOF_PREFIX);
		out.put_u8(self.magic);
		out.put_u8(self.version);

		let listed: Vec<&Section> = header_order
			.into_iter()
			.filter(|section| section.is_header_listed())
			.collect();
		let mut start = 0;
		while start < listed.len() {
			let kind = listed[start].kind();
			if kind.is_list() {
				let run = listed[start..]
					.iter()
					.take_while(|section| section.kind() == kind)
					.count();
				let count = u16::try_from(run).unwrap_or_else(|_| {
					panic!("{} consecutive {:?} sections do not fit a two-byte count", run, kind)
				});
				out.put_u8(kind.as_u8());
				out.put_u16(count);
				for section in &listed[start..start + run] {
					out.put_u16(section.header_size());
				}
				start += run;
			} else {
				out.put_u8(kind.as_u8());
				out.put_u16(listed[start].header_size());
				start += 1;
			}
		}

		out.put_slice(&self.header_terminator);
		for section in body_order.into_iter().filter(|section| section.is_body_listed()) {
			out.put_slice(&section.body());
		}
		out.put_slice(&self.extra);

		out.freeze()
	}

	fn has_kind(&self, kind: SectionKind) -> bool {
		self.sections.iter().any(|section| section.kind() == kind)
	}
}

impl fmt::Display for Container {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.serialize()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Opcode;

	#[test]
	fn minimal_container() {
		let container = Container::code(Opcode::STOP);
		assert_eq!(
			hex::encode(container.serialize()),
			"ef00010100040200010001040000000000000000"
		);
	}

	#[test]
	fn cached_bytes_follow_changes() {
		let container = Container::code(Opcode::STOP);
		let before = container.serialize().clone();
		let after = container.with_version(0x02);
		assert_ne!(&before, after.serialize());
		assert_eq!(after.serialize()[2], 0x02);
	}

	#[test]
	fn body_places_data_before_containers() {
		let sub = Container::code(Opcode::INVALID);
		let container = Container::new(vec![
			Section::code(Opcode::STOP),
			Section::container(sub.clone()),
			Section::data([0xaau8, 0xbb]),
		]);
		let bytes = container.serialize();
		let sub_bytes = sub.serialize();
		// type, code list, container list, data, terminator
		let header_len = 3 + 3 + 5 + 5 + 3 + 1;
		assert_eq!(bytes[3 + 3 + 5], 0x03);
		assert_eq!(bytes[3 + 3 + 5 + 5], 0x04);
		let body = &bytes[header_len..];
		assert_eq!(&body[..4], &[0, 0, 0, 0]);
		assert_eq!(body[4], 0x00);
		assert_eq!(&body[5..7], &[0xaa, 0xbb]);
		assert_eq!(&body[7..], &sub_bytes[..]);
	}

	#[test]
	fn non_contiguous_runs_split_the_header() {
		let container = Container::new(vec![
			Section::code(Opcode::STOP),
			Section::data([0u8; 0]),
			Section::code(Opcode::STOP),
		])
		.without_sorting();
		assert_eq!(
			hex::encode(container.serialize()),
			concat!(
				"ef0001",
				"010008",
				"0200010001",
				"040000",
				"0200010001",
				"00",
				"0000000000000000",
				"00",
				"00"
			)
		);
	}

	#[test]
	#[should_panic(expected = "do not fit a two-byte count")]
	fn oversized_code_run_has_no_header_count() {
		let sections = (0..0x10000).map(|_| Section::code(Opcode::STOP)).collect();
		let container = Container::new(sections).without_auto_type_section();
		let _ = container.serialize();
	}

	#[test]
	fn raw_bytes_are_passed_through() {
		let container = Container::raw(vec![0xef, 0x00]);
		assert_eq!(&container.serialize()[..], &[0xef, 0x00]);
		assert_eq!(container.code_section_count(), 0);
	}
}
