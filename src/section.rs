use bytes::Bytes;

use crate::analysis::stack_bounds;
use crate::{Bytecode, Container};

/// Section kind byte as written in the header.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionKind {
	/// Per code section inputs, outputs and max stack height.
	Type = 0x01,
	/// Executable instructions.
	Code = 0x02,
	/// Embedded sub-container.
	Container = 0x03,
	/// Arbitrary trailing data.
	Data = 0x04,
}

impl SectionKind {
	/// Kind byte.
	#[must_use]
	pub const fn as_u8(&self) -> u8 {
		*self as u8
	}

	/// Whether consecutive sections of this kind share one header entry with a
	/// count and a list of sizes.
	#[must_use]
	pub const fn is_list(&self) -> bool {
		matches!(self, Self::Code | Self::Container)
	}

	/// Position in the body, which places data before sub-containers.
	pub(crate) const fn body_rank(&self) -> u8 {
		match self {
			Self::Type => 0,
			Self::Code => 1,
			Self::Data => 2,
			Self::Container => 3,
		}
	}
}

/// Section contents.
#[derive(Clone, Debug)]
pub enum SectionData {
	/// Bytes written verbatim.
	Bytes(Bytes),
	/// Nested container, written as its serialization.
	Container(Box<Container>),
}

/// One region of an EOF container.
///
/// Nothing here is checked for consistency. A section may declare a size it
/// does not have, list itself in the type section while not being code, or
/// disappear from the header or body, so that malformed containers can be
/// built on purpose.
#[derive(Clone, Debug)]
pub struct Section {
	kind: SectionKind,
	data: SectionData,
	custom_size: Option<u16>,
	code_inputs: u8,
	code_outputs: u8,
	max_stack_height: u16,
	force_type_listing: bool,
	skip_header_listing: bool,
	skip_body_listing: bool,
}

impl Section {
	fn new(kind: SectionKind, data: SectionData) -> Self {
		Self {
			kind,
			data,
			custom_size: None,
			code_inputs: 0,
			code_outputs: 0,
			max_stack_height: 0,
			force_type_listing: false,
			skip_header_listing: false,
			skip_body_listing: false,
		}
	}

	/// Code section with inputs, outputs and max stack height computed from
	/// the instructions.
	#[must_use]
	pub fn code(code: impl Into<Bytecode>) -> Self {
		let code = code.into();
		let bounds = stack_bounds(code.as_slice());
		let mut section = Self::new(SectionKind::Code, SectionData::Bytes(code.into_vec().into()));
		section.code_inputs = u8::try_from(bounds.inputs).unwrap_or(u8::MAX);
		section.code_outputs = u8::try_from(bounds.outputs).unwrap_or(u8::MAX);
		section.max_stack_height = u16::try_from(bounds.max_stack_height).unwrap_or(u16::MAX);
		section
	}

	/// Data section.
	#[must_use]
	pub fn data(data: impl AsRef<[u8]>) -> Self {
		Self::new(
			SectionKind::Data,
			SectionData::Bytes(Bytes::copy_from_slice(data.as_ref())),
		)
	}

	/// Explicit type section, which disables the synthesized one.
	#[must_use]
	pub fn types(data: impl AsRef<[u8]>) -> Self {
		Self::new(
			SectionKind::Type,
			SectionData::Bytes(Bytes::copy_from_slice(data.as_ref())),
		)
	}

	/// Sub-container section.
	#[must_use]
	pub fn container(container: Container) -> Self {
		Self::new(SectionKind::Container, SectionData::Container(Box::new(container)))
	}

	/// Overrides the declared inputs.
	#[must_use]
	pub fn with_inputs(mut self, inputs: u8) -> Self {
		self.code_inputs = inputs;
		self
	}

	/// Overrides the declared outputs.
	#[must_use]
	pub fn with_outputs(mut self, outputs: u8) -> Self {
		self.code_outputs = outputs;
		self
	}

	/// Overrides the declared max stack height.
	#[must_use]
	pub fn with_max_stack_height(mut self, max_stack_height: u16) -> Self {
		self.max_stack_height = max_stack_height;
		self
	}

	/// Sets inputs, outputs and max stack height at once.
	#[must_use]
	pub fn with_type(self, inputs: u8, outputs: u8, max_stack_height: u16) -> Self {
		self.with_inputs(inputs)
			.with_outputs(outputs)
			.with_max_stack_height(max_stack_height)
	}

	/// Size written in the header instead of the body length.
	#[must_use]
	pub fn with_custom_size(mut self, size: u16) -> Self {
		self.custom_size = Some(size);
		self
	}

	/// Lists the section in the synthesized type section whatever its kind.
	#[must_use]
	pub fn force_type_listing(mut self) -> Self {
		self.force_type_listing = true;
		self
	}

	/// Leaves the section out of the header.
	#[must_use]
	pub fn skip_header_listing(mut self) -> Self {
		self.skip_header_listing = true;
		self
	}

	/// Leaves the section body out of the container.
	#[must_use]
	pub fn skip_body_listing(mut self) -> Self {
		self.skip_body_listing = true;
		self
	}

	/// Kind byte listed in the header.
	pub fn kind(&self) -> SectionKind {
		self.kind
	}

	/// Contents before serialization.
	pub fn contents(&self) -> &SectionData {
		&self.data
	}

	/// Inputs written in the type entry.
	pub fn code_inputs(&self) -> u8 {
		self.code_inputs
	}

	/// Outputs written in the type entry.
	pub fn code_outputs(&self) -> u8 {
		self.code_outputs
	}

	/// Max stack height written in the type entry.
	pub fn max_stack_height(&self) -> u16 {
		self.max_stack_height
	}

	/// Header size override, if any.
	pub fn custom_size(&self) -> Option<u16> {
		self.custom_size
	}

	pub(crate) fn is_type_listed(&self) -> bool {
		self.kind == SectionKind::Code || self.force_type_listing
	}

	pub(crate) fn is_header_listed(&self) -> bool {
		!self.skip_header_listing
	}

	pub(crate) fn is_body_listed(&self) -> bool {
		!self.skip_body_listing
	}

	/// Body bytes. A sub-container contributes its serialization.
	#[must_use]
	pub fn body(&self) -> Bytes {
		match &self.data {
			SectionData::Bytes(bytes) => bytes.clone(),
			SectionData::Container(container) => container.serialize().clone(),
		}
	}

	/// Size declared in the header.
	///
	/// # Panics
	///
	/// When the body is longer than a two-byte size can declare and no
	/// custom size is set.
	#[must_use]
	pub fn header_size(&self) -> u16 {
		if let Some(size) = self.custom_size {
			return size;
		}
		let len = self.body().len();
		u16::try_from(len).unwrap_or_else(|_| {
			panic!("section body of {} bytes does not fit a two-byte size", len)
		})
	}

	/// Four-byte type section entry.
	#[must_use]
	pub fn type_entry(&self) -> [u8; 4] {
		let [high, low] = self.max_stack_height.to_be_bytes();
		[self.code_inputs, self.code_outputs, high, low]
	}
}
