//! Static instruction table for EOF v1 code.

use crate::opcode::Opcode;

/// Shape of the immediate operand following an opcode byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Immediate {
	/// Fixed number of bytes, possibly zero.
	Fixed(usize),
	/// One count byte followed by `count` signed 2-byte offsets.
	JumpTable,
}

/// Width of one jump table offset.
pub const JUMP_TABLE_OFFSET_SIZE: usize = 2;

/// Instruction metadata.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OpcodeInfo {
	/// Mnemonic.
	pub name: &'static str,
	/// Opcode byte.
	pub opcode: Opcode,
	/// Stack items consumed.
	pub popped: usize,
	/// Stack items produced.
	pub pushed: usize,
	/// Stack depth the instruction reaches, beyond what it pops.
	pub min_stack_height: usize,
	/// Immediate operand shape.
	pub immediate: Immediate,
	/// Control never falls through to the next instruction.
	pub terminating: bool,
}

impl OpcodeInfo {
	const fn with_immediate(mut self, len: usize) -> Self {
		self.immediate = Immediate::Fixed(len);
		self
	}

	const fn with_jump_table(mut self) -> Self {
		self.immediate = Immediate::JumpTable;
		self
	}

	const fn requires(mut self, height: usize) -> Self {
		self.min_stack_height = height;
		self
	}

	const fn terminates(mut self) -> Self {
		self.terminating = true;
		self
	}

	/// Byte length of the immediate operand at `index`.
	///
	/// For the jump table the first item is the one byte branch count, all
	/// following items are 2-byte offsets.
	#[must_use]
	pub const fn immediate_length_of(&self, index: usize) -> usize {
		match self.immediate {
			Immediate::Fixed(len) => len,
			Immediate::JumpTable => {
				if index == 0 {
					1
				} else {
					JUMP_TABLE_OFFSET_SIZE
				}
			}
		}
	}

	/// Whether any immediate bytes follow the opcode.
	#[must_use]
	pub const fn has_immediate(&self) -> bool {
		!matches!(self.immediate, Immediate::Fixed(0))
	}

	/// Stack items that must be present before execution.
	#[must_use]
	pub const fn minimum_stack_height(&self) -> usize {
		if self.min_stack_height > self.popped {
			self.min_stack_height
		} else {
			self.popped
		}
	}

	/// Net stack change.
	#[must_use]
	pub const fn stack_io(&self) -> isize {
		self.pushed as isize - self.popped as isize
	}
}

const fn info(opcode: u8, name: &'static str, popped: usize, pushed: usize) -> OpcodeInfo {
	OpcodeInfo {
		name,
		opcode: Opcode(opcode),
		popped,
		pushed,
		min_stack_height: 0,
		immediate: Immediate::Fixed(0),
		terminating: false,
	}
}

/// Instruction table indexed by opcode byte. `None` marks an undefined byte.
pub static OPCODE_INFO: [Option<OpcodeInfo>; 256] = opcode_table();

const fn opcode_table() -> [Option<OpcodeInfo>; 256] {
	let mut table: [Option<OpcodeInfo>; 256] = [None; 256];

	table[0x00] = Some(info(0x00, "STOP", 0, 0).terminates());
	table[0x01] = Some(info(0x01, "ADD", 2, 1));
	table[0x02] = Some(info(0x02, "MUL", 2, 1));
	table[0x03] = Some(info(0x03, "SUB", 2, 1));
	table[0x04] = Some(info(0x04, "DIV", 2, 1));
	table[0x05] = Some(info(0x05, "SDIV", 2, 1));
	table[0x06] = Some(info(0x06, "MOD", 2, 1));
	table[0x07] = Some(info(0x07, "SMOD", 2, 1));
	table[0x08] = Some(info(0x08, "ADDMOD", 3, 1));
	table[0x09] = Some(info(0x09, "MULMOD", 3, 1));
	table[0x0a] = Some(info(0x0a, "EXP", 2, 1));
	table[0x0b] = Some(info(0x0b, "SIGNEXTEND", 2, 1));

	table[0x10] = Some(info(0x10, "LT", 2, 1));
	table[0x11] = Some(info(0x11, "GT", 2, 1));
	table[0x12] = Some(info(0x12, "SLT", 2, 1));
	table[0x13] = Some(info(0x13, "SGT", 2, 1));
	table[0x14] = Some(info(0x14, "EQ", 2, 1));
	table[0x15] = Some(info(0x15, "ISZERO", 1, 1));
	table[0x16] = Some(info(0x16, "AND", 2, 1));
	table[0x17] = Some(info(0x17, "OR", 2, 1));
	table[0x18] = Some(info(0x18, "XOR", 2, 1));
	table[0x19] = Some(info(0x19, "NOT", 1, 1));
	table[0x1a] = Some(info(0x1a, "BYTE", 2, 1));
	table[0x1b] = Some(info(0x1b, "SHL", 2, 1));
	table[0x1c] = Some(info(0x1c, "SHR", 2, 1));
	table[0x1d] = Some(info(0x1d, "SAR", 2, 1));

	table[0x20] = Some(info(0x20, "SHA3", 2, 1));

	table[0x30] = Some(info(0x30, "ADDRESS", 0, 1));
	table[0x31] = Some(info(0x31, "BALANCE", 1, 1));
	table[0x32] = Some(info(0x32, "ORIGIN", 0, 1));
	table[0x33] = Some(info(0x33, "CALLER", 0, 1));
	table[0x34] = Some(info(0x34, "CALLVALUE", 0, 1));
	table[0x35] = Some(info(0x35, "CALLDATALOAD", 1, 1));
	table[0x36] = Some(info(0x36, "CALLDATASIZE", 0, 1));
	table[0x37] = Some(info(0x37, "CALLDATACOPY", 3, 0));
	table[0x38] = Some(info(0x38, "CODESIZE", 0, 1));
	table[0x39] = Some(info(0x39, "CODECOPY", 3, 0));
	table[0x3a] = Some(info(0x3a, "GASPRICE", 0, 1));
	table[0x3b] = Some(info(0x3b, "EXTCODESIZE", 1, 1));
	table[0x3c] = Some(info(0x3c, "EXTCODECOPY", 4, 0));
	table[0x3d] = Some(info(0x3d, "RETURNDATASIZE", 0, 1));
	table[0x3e] = Some(info(0x3e, "RETURNDATACOPY", 3, 0));
	table[0x3f] = Some(info(0x3f, "EXTCODEHASH", 1, 1));

	table[0x40] = Some(info(0x40, "BLOCKHASH", 1, 1));
	table[0x41] = Some(info(0x41, "COINBASE", 0, 1));
	table[0x42] = Some(info(0x42, "TIMESTAMP", 0, 1));
	table[0x43] = Some(info(0x43, "NUMBER", 0, 1));
	table[0x44] = Some(info(0x44, "DIFFICULTY", 0, 1));
	table[0x45] = Some(info(0x45, "GASLIMIT", 0, 1));
	table[0x46] = Some(info(0x46, "CHAINID", 0, 1));
	table[0x47] = Some(info(0x47, "SELFBALANCE", 0, 1));
	table[0x48] = Some(info(0x48, "BASEFEE", 0, 1));
	table[0x49] = Some(info(0x49, "BLOBHASH", 1, 1));
	table[0x4a] = Some(info(0x4a, "BLOBBASEFEE", 0, 1));

	table[0x50] = Some(info(0x50, "POP", 1, 0));
	table[0x51] = Some(info(0x51, "MLOAD", 1, 1));
	table[0x52] = Some(info(0x52, "MSTORE", 2, 0));
	table[0x53] = Some(info(0x53, "MSTORE8", 2, 0));
	table[0x54] = Some(info(0x54, "SLOAD", 1, 1));
	table[0x55] = Some(info(0x55, "SSTORE", 2, 0));
	// JUMP, JUMPI and PC are rejected inside EOF code.
	table[0x59] = Some(info(0x59, "MSIZE", 0, 1));
	table[0x5a] = Some(info(0x5a, "GAS", 0, 1));
	table[0x5b] = Some(info(0x5b, "JUMPDEST", 0, 0));
	table[0x5c] = Some(info(0x5c, "TLOAD", 1, 1));
	table[0x5d] = Some(info(0x5d, "TSTORE", 2, 0));
	table[0x5e] = Some(info(0x5e, "MCOPY", 3, 0));
	table[0x5f] = Some(info(0x5f, "PUSH0", 0, 1));

	table[0x60] = Some(info(0x60, "PUSH1", 0, 1).with_immediate(1));
	table[0x61] = Some(info(0x61, "PUSH2", 0, 1).with_immediate(2));
	table[0x62] = Some(info(0x62, "PUSH3", 0, 1).with_immediate(3));
	table[0x63] = Some(info(0x63, "PUSH4", 0, 1).with_immediate(4));
	table[0x64] = Some(info(0x64, "PUSH5", 0, 1).with_immediate(5));
	table[0x65] = Some(info(0x65, "PUSH6", 0, 1).with_immediate(6));
	table[0x66] = Some(info(0x66, "PUSH7", 0, 1).with_immediate(7));
	table[0x67] = Some(info(0x67, "PUSH8", 0, 1).with_immediate(8));
	table[0x68] = Some(info(0x68, "PUSH9", 0, 1).with_immediate(9));
	table[0x69] = Some(info(0x69, "PUSH10", 0, 1).with_immediate(10));
	table[0x6a] = Some(info(0x6a, "PUSH11", 0, 1).with_immediate(11));
	table[0x6b] = Some(info(0x6b, "PUSH12", 0, 1).with_immediate(12));
	table[0x6c] = Some(info(0x6c, "PUSH13", 0, 1).with_immediate(13));
	table[0x6d] = Some(info(0x6d, "PUSH14", 0, 1).with_immediate(14));
	table[0x6e] = Some(info(0x6e, "PUSH15", 0, 1).with_immediate(15));
	table[0x6f] = Some(info(0x6f, "PUSH16", 0, 1).with_immediate(16));
	table[0x70] = Some(info(0x70, "PUSH17", 0, 1).with_immediate(17));
	table[0x71] = Some(info(0x71, "PUSH18", 0, 1).with_immediate(18));
	table[0x72] = Some(info(0x72, "PUSH19", 0, 1).with_immediate(19));
	table[0x73] = Some(info(0x73, "PUSH20", 0, 1).with_immediate(20));
	table[0x74] = Some(info(0x74, "PUSH21", 0, 1).with_immediate(21));
	table[0x75] = Some(info(0x75, "PUSH22", 0, 1).with_immediate(22));
	table[0x76] = Some(info(0x76, "PUSH23", 0, 1).with_immediate(23));
	table[0x77] = Some(info(0x77, "PUSH24", 0, 1).with_immediate(24));
	table[0x78] = Some(info(0x78, "PUSH25", 0, 1).with_immediate(25));
	table[0x79] = Some(info(0x79, "PUSH26", 0, 1).with_immediate(26));
	table[0x7a] = Some(info(0x7a, "PUSH27", 0, 1).with_immediate(27));
	table[0x7b] = Some(info(0x7b, "PUSH28", 0, 1).with_immediate(28));
	table[0x7c] = Some(info(0x7c, "PUSH29", 0, 1).with_immediate(29));
	table[0x7d] = Some(info(0x7d, "PUSH30", 0, 1).with_immediate(30));
	table[0x7e] = Some(info(0x7e, "PUSH31", 0, 1).with_immediate(31));
	table[0x7f] = Some(info(0x7f, "PUSH32", 0, 1).with_immediate(32));

	table[0x80] = Some(info(0x80, "DUP1", 0, 1).requires(1));
	table[0x81] = Some(info(0x81, "DUP2", 0, 1).requires(2));
	table[0x82] = Some(info(0x82, "DUP3", 0, 1).requires(3));
	table[0x83] = Some(info(0x83, "DUP4", 0, 1).requires(4));
	table[0x84] = Some(info(0x84, "DUP5", 0, 1).requires(5));
	table[0x85] = Some(info(0x85, "DUP6", 0, 1).requires(6));
	table[0x86] = Some(info(0x86, "DUP7", 0, 1).requires(7));
	table[0x87] = Some(info(0x87, "DUP8", 0, 1).requires(8));
	table[0x88] = Some(info(0x88, "DUP9", 0, 1).requires(9));
	table[0x89] = Some(info(0x89, "DUP10", 0, 1).requires(10));
	table[0x8a] = Some(info(0x8a, "DUP11", 0, 1).requires(11));
	table[0x8b] = Some(info(0x8b, "DUP12", 0, 1).requires(12));
	table[0x8c] = Some(info(0x8c, "DUP13", 0, 1).requires(13));
	table[0x8d] = Some(info(0x8d, "DUP14", 0, 1).requires(14));
	table[0x8e] = Some(info(0x8e, "DUP15", 0, 1).requires(15));
	table[0x8f] = Some(info(0x8f, "DUP16", 0, 1).requires(16));

	table[0x90] = Some(info(0x90, "SWAP1", 0, 0).requires(2));
	table[0x91] = Some(info(0x91, "SWAP2", 0, 0).requires(3));
	table[0x92] = Some(info(0x92, "SWAP3", 0, 0).requires(4));
	table[0x93] = Some(info(0x93, "SWAP4", 0, 0).requires(5));
	table[0x94] = Some(info(0x94, "SWAP5", 0, 0).requires(6));
	table[0x95] = Some(info(0x95, "SWAP6", 0, 0).requires(7));
	table[0x96] = Some(info(0x96, "SWAP7", 0, 0).requires(8));
	table[0x97] = Some(info(0x97, "SWAP8", 0, 0).requires(9));
	table[0x98] = Some(info(0x98, "SWAP9", 0, 0).requires(10));
	table[0x99] = Some(info(0x99, "SWAP10", 0, 0).requires(11));
	table[0x9a] = Some(info(0x9a, "SWAP11", 0, 0).requires(12));
	table[0x9b] = Some(info(0x9b, "SWAP12", 0, 0).requires(13));
	table[0x9c] = Some(info(0x9c, "SWAP13", 0, 0).requires(14));
	table[0x9d] = Some(info(0x9d, "SWAP14", 0, 0).requires(15));
	table[0x9e] = Some(info(0x9e, "SWAP15", 0, 0).requires(16));
	table[0x9f] = Some(info(0x9f, "SWAP16", 0, 0).requires(17));

	table[0xa0] = Some(info(0xa0, "LOG0", 2, 0));
	table[0xa1] = Some(info(0xa1, "LOG1", 3, 0));
	table[0xa2] = Some(info(0xa2, "LOG2", 4, 0));
	table[0xa3] = Some(info(0xa3, "LOG3", 5, 0));
	table[0xa4] = Some(info(0xa4, "LOG4", 6, 0));

	table[0xe0] = Some(info(0xe0, "RJUMP", 0, 0).with_immediate(2).terminates());
	table[0xe1] = Some(info(0xe1, "RJUMPI", 1, 0).with_immediate(2));
	table[0xe2] = Some(info(0xe2, "RJUMPV", 1, 0).with_jump_table());
	// Stack effect of CALLF comes from the type section of the callee.
	table[0xe3] = Some(info(0xe3, "CALLF", 0, 0).with_immediate(2));
	table[0xe4] = Some(info(0xe4, "RETF", 0, 0).terminates());

	table[0xf0] = Some(info(0xf0, "CREATE", 3, 1));
	table[0xf1] = Some(info(0xf1, "CALL", 7, 1));
	table[0xf2] = Some(info(0xf2, "CALLCODE", 7, 1));
	table[0xf3] = Some(info(0xf3, "RETURN", 2, 0).terminates());
	table[0xf4] = Some(info(0xf4, "DELEGATECALL", 6, 1));
	table[0xf5] = Some(info(0xf5, "CREATE2", 4, 1));
	table[0xfa] = Some(info(0xfa, "STATICCALL", 6, 1));
	table[0xfd] = Some(info(0xfd, "REVERT", 2, 0).terminates());
	table[0xfe] = Some(info(0xfe, "INVALID", 0, 0).terminates());
	table[0xff] = Some(info(0xff, "SELFDESTRUCT", 1, 0));

	table
}

/// Terminating instructions that form a valid end of a code section on
/// their own.
pub const VALID_TERMINATING_OPCODES: [Opcode; 5] = [
	Opcode::STOP,
	Opcode::RETURN,
	Opcode::REVERT,
	Opcode::INVALID,
	Opcode::RETF,
];

/// All defined instructions, ordered by opcode byte.
pub fn defined_opcodes() -> impl Iterator<Item = &'static OpcodeInfo> {
	OPCODE_INFO.iter().flatten()
}

/// All bytes without an instruction, ordered.
pub fn undefined_opcodes() -> impl Iterator<Item = Opcode> {
	(0..=u8::MAX).map(Opcode).filter(|opcode| opcode.info().is_none())
}

/// `immediate_length_of` as a free function over an opcode.
///
/// Undefined opcodes have no immediate.
#[must_use]
pub fn immediate_length_of(opcode: Opcode, index: usize) -> usize {
	opcode
		.info()
		.map_or(0, |info| info.immediate_length_of(index))
}
