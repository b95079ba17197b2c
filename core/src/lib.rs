//! Instruction set and bytecode builder for EOF v1 code.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
extern crate core;

mod bytecode;
mod error;
mod info;
mod opcode;
pub mod utils;

pub use crate::bytecode::{encode_immediate, encode_jump_table, Bytecode};
pub use crate::error::{EofException, ImmediateError};
pub use crate::info::{
	defined_opcodes, immediate_length_of, undefined_opcodes, Immediate, OpcodeInfo,
	JUMP_TABLE_OFFSET_SIZE, OPCODE_INFO, VALID_TERMINATING_OPCODES,
};
pub use crate::opcode::Opcode;
