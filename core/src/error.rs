use core::fmt;

use crate::Opcode;

/// Reason a conforming parser rejects an EOF container.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EofException {
	/// Bytes following `0xEF` are not the EOF magic.
	InvalidMagic,
	/// Unsupported or missing version byte.
	InvalidVersion,
	/// Header ends without the terminator byte.
	MissingHeaderTerminator,
	/// Header ends in the middle of a section size.
	IncompleteSectionSize,
	/// Header ends in the middle of a section count.
	IncompleteSectionCount,
	/// A code or container section declares zero bytes.
	ZeroSectionSize,
	/// A list header declares zero sections.
	EmptySection,
	/// More than 1024 code sections.
	TooManyCodeSections,
	/// More than 256 container sections.
	TooManyContainerSections,
	/// No code section header.
	MissingCodeSection,
	/// No type section header.
	MissingTypeSection,
	/// No data section header.
	MissingDataSection,
	/// Type section size is not four bytes per code section.
	InvalidTypeSectionSize,
	/// Body length differs from what the header declares.
	InvalidSectionBodiesSize,
	/// First code section does not take zero inputs and return zero outputs.
	InvalidFirstSectionType,
	/// Inputs or outputs above 127.
	InputsOutputsNumAboveLimit,
	/// Max stack height above 1023.
	MaxStackHeightAboveLimit,
	/// Declared max stack height differs from the computed one.
	InvalidMaxStackHeight,
	/// Opcode byte has no registered instruction.
	UndefinedInstruction,
	/// Immediate operand runs past the section end.
	TruncatedImmediate,
	/// Last instruction of the section is not terminating.
	MissingStopOpcode,
	/// Code is never reached by any control-flow path.
	UnreachableCode,
	/// Jump target out of bounds or inside immediate data.
	InvalidRelativeOffset,
	/// Jump table with zero branches.
	InvalidJumpTableCount,
	/// `CALLF` to a section that does not exist.
	InvalidCodeSectionIndex,
	/// Not enough stack items for an instruction.
	StackUnderflow,
	/// Converging paths disagree on stack height.
	InvalidControlFlow,
	/// Stack higher than the declared outputs at `RETF`.
	StackHigherThanOutputs,
}

impl EofException {
	/// All kinds, in declaration order.
	pub const ALL: [EofException; 28] = [
		Self::InvalidMagic,
		Self::InvalidVersion,
		Self::MissingHeaderTerminator,
		Self::IncompleteSectionSize,
		Self::IncompleteSectionCount,
		Self::ZeroSectionSize,
		Self::EmptySection,
		Self::TooManyCodeSections,
		Self::TooManyContainerSections,
		Self::MissingCodeSection,
		Self::MissingTypeSection,
		Self::MissingDataSection,
		Self::InvalidTypeSectionSize,
		Self::InvalidSectionBodiesSize,
		Self::InvalidFirstSectionType,
		Self::InputsOutputsNumAboveLimit,
		Self::MaxStackHeightAboveLimit,
		Self::InvalidMaxStackHeight,
		Self::UndefinedInstruction,
		Self::TruncatedImmediate,
		Self::MissingStopOpcode,
		Self::UnreachableCode,
		Self::InvalidRelativeOffset,
		Self::InvalidJumpTableCount,
		Self::InvalidCodeSectionIndex,
		Self::StackUnderflow,
		Self::InvalidControlFlow,
		Self::StackHigherThanOutputs,
	];

	/// Screaming-case name used in fixture files.
	#[must_use]
	pub const fn name(&self) -> &'static str {
		match self {
			Self::InvalidMagic => "INVALID_MAGIC",
			Self::InvalidVersion => "INVALID_VERSION",
			Self::MissingHeaderTerminator => "MISSING_HEADERS_TERMINATOR",
			Self::IncompleteSectionSize => "INCOMPLETE_SECTION_SIZE",
			Self::IncompleteSectionCount => "INCOMPLETE_SECTION_NUMBER",
			Self::ZeroSectionSize => "ZERO_SECTION_SIZE",
			Self::EmptySection => "EMPTY_SECTION",
			Self::TooManyCodeSections => "TOO_MANY_CODE_SECTIONS",
			Self::TooManyContainerSections => "TOO_MANY_CONTAINERS",
			Self::MissingCodeSection => "MISSING_CODE_HEADER",
			Self::MissingTypeSection => "MISSING_TYPE_HEADER",
			Self::MissingDataSection => "MISSING_DATA_SECTION",
			Self::InvalidTypeSectionSize => "INVALID_TYPE_SECTION_SIZE",
			Self::InvalidSectionBodiesSize => "INVALID_SECTION_BODIES_SIZE",
			Self::InvalidFirstSectionType => "INVALID_FIRST_SECTION_TYPE",
			Self::InputsOutputsNumAboveLimit => "INPUTS_OUTPUTS_NUM_ABOVE_LIMIT",
			Self::MaxStackHeightAboveLimit => "MAX_STACK_HEIGHT_ABOVE_LIMIT",
			Self::InvalidMaxStackHeight => "INVALID_MAX_STACK_HEIGHT",
			Self::UndefinedInstruction => "UNDEFINED_INSTRUCTION",
			Self::TruncatedImmediate => "TRUNCATED_INSTRUCTION",
			Self::MissingStopOpcode => "MISSING_STOP_OPCODE",
			Self::UnreachableCode => "UNREACHABLE_INSTRUCTIONS",
			Self::InvalidRelativeOffset => "INVALID_RJUMP_DESTINATION",
			Self::InvalidJumpTableCount => "INVALID_RJUMPV_COUNT",
			Self::InvalidCodeSectionIndex => "INVALID_CODE_SECTION_INDEX",
			Self::StackUnderflow => "STACK_UNDERFLOW",
			Self::InvalidControlFlow => "STACK_HEIGHT_MISMATCH",
			Self::StackHigherThanOutputs => "STACK_HIGHER_THAN_OUTPUTS",
		}
	}

	/// Fully qualified tag, e.g. `EOFException.INVALID_MAGIC`.
	#[must_use]
	pub fn tag(&self) -> alloc::string::String {
		alloc::format!("EOFException.{}", self.name())
	}

	/// Parse a tag produced by [`EofException::tag`] or a bare name.
	#[must_use]
	pub fn from_tag(tag: &str) -> Option<Self> {
		let name = tag.strip_prefix("EOFException.").unwrap_or(tag);
		Self::ALL.iter().copied().find(|kind| kind.name() == name)
	}
}

impl fmt::Display for EofException {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::InvalidMagic => "invalid magic",
			Self::InvalidVersion => "invalid version",
			Self::MissingHeaderTerminator => "missing header terminator",
			Self::IncompleteSectionSize => "incomplete section size",
			Self::IncompleteSectionCount => "incomplete section count",
			Self::ZeroSectionSize => "zero section size",
			Self::EmptySection => "empty section list",
			Self::TooManyCodeSections => "too many code sections",
			Self::TooManyContainerSections => "too many container sections",
			Self::MissingCodeSection => "missing code section",
			Self::MissingTypeSection => "missing type section",
			Self::MissingDataSection => "missing data section",
			Self::InvalidTypeSectionSize => "invalid type section size",
			Self::InvalidSectionBodiesSize => "invalid section bodies size",
			Self::InvalidFirstSectionType => "invalid first section type",
			Self::InputsOutputsNumAboveLimit => "inputs or outputs above limit",
			Self::MaxStackHeightAboveLimit => "max stack height above limit",
			Self::InvalidMaxStackHeight => "invalid max stack height",
			Self::UndefinedInstruction => "undefined instruction",
			Self::TruncatedImmediate => "truncated immediate",
			Self::MissingStopOpcode => "missing terminating instruction",
			Self::UnreachableCode => "unreachable code",
			Self::InvalidRelativeOffset => "invalid relative jump destination",
			Self::InvalidJumpTableCount => "invalid jump table count",
			Self::InvalidCodeSectionIndex => "invalid code section index",
			Self::StackUnderflow => "stack underflow",
			Self::InvalidControlFlow => "stack height mismatch",
			Self::StackHigherThanOutputs => "stack higher than outputs",
		};
		f.write_str(s)
	}
}

#[cfg(feature = "std")]
impl std::error::Error for EofException {}

/// Programmer error while encoding an instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImmediateError {
	/// Operands given to an opcode without immediate.
	NoImmediate(Opcode),
	/// Operands given to a byte with no instruction.
	Undefined(Opcode),
	/// Operand does not fit its immediate width.
	Overflow { value: i128, width: usize },
	/// Jump table with more than 255 branches.
	TooManyBranches(usize),
}

impl fmt::Display for ImmediateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoImmediate(opcode) => write!(
				f,
				"attempted to attach data to a no-immediate opcode {}",
				opcode
			),
			Self::Undefined(opcode) => write!(f, "undefined opcode {}", opcode),
			Self::Overflow { value, width } => {
				write!(f, "value {} does not fit in {} bytes", value, width)
			}
			Self::TooManyBranches(count) => {
				write!(f, "jump table with {} branches, at most 255", count)
			}
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ImmediateError {}
