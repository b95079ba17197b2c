//! Composable bytecode.

use alloc::vec::Vec;
use core::{
	fmt,
	ops::{Add, Mul},
};

use crate::{info::OpcodeInfo, utils::to_twos_complement, ImmediateError, Opcode};

/// Encodes `operands` as the immediate of `info`, without the opcode byte.
///
/// Each operand takes the width of its position: the fixed immediate length,
/// or for the jump table one byte for the count followed by 2-byte offsets.
/// No operands yields no bytes so the caller can attach raw immediate data.
pub fn encode_immediate(info: &OpcodeInfo, operands: &[i128]) -> Result<Vec<u8>, ImmediateError> {
	if operands.is_empty() {
		return Ok(Vec::new());
	}
	if !info.has_immediate() {
		return Err(ImmediateError::NoImmediate(info.opcode));
	}

	let mut out = Vec::new();
	for (index, value) in operands.iter().enumerate() {
		out.extend(to_twos_complement(*value, info.immediate_length_of(index))?);
	}
	Ok(out)
}

/// Encodes a jump table immediate: branch count, then each offset as a
/// signed 2-byte big-endian integer.
pub fn encode_jump_table(offsets: &[i16]) -> Result<Vec<u8>, ImmediateError> {
	let count =
		u8::try_from(offsets.len()).map_err(|_| ImmediateError::TooManyBranches(offsets.len()))?;

	let mut out = Vec::with_capacity(1 + offsets.len() * 2);
	out.push(count);
	for offset in offsets {
		out.extend_from_slice(&offset.to_be_bytes());
	}
	Ok(out)
}

/// Byte string of instructions. Concatenation and repetition never mutate
/// their inputs.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Bytecode(Vec<u8>);

impl Bytecode {
	/// Empty bytecode.
	#[must_use]
	pub const fn new() -> Self {
		Self(Vec::new())
	}

	/// Wraps raw bytes.
	#[must_use]
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Self(bytes.into())
	}

	/// Bytes of the code.
	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	/// Consumes the code into its bytes.
	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Length in bytes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the code is empty.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The code repeated `n` times.
	#[must_use]
	pub fn repeat(&self, n: usize) -> Self {
		Self(self.0.repeat(n))
	}
}

impl Opcode {
	/// Instruction with encoded operands.
	///
	/// # Panics
	///
	/// Attaching operands to an opcode that cannot carry them is a bug in the
	/// caller and panics.
	#[must_use]
	pub fn with(self, operands: &[i128]) -> Bytecode {
		match self.try_with(operands) {
			Ok(code) => code,
			Err(err) => panic!("{}", err),
		}
	}

	/// Instruction with encoded operands.
	pub fn try_with(self, operands: &[i128]) -> Result<Bytecode, ImmediateError> {
		let immediate = match self.info() {
			Some(info) => encode_immediate(info, operands)?,
			None if operands.is_empty() => Vec::new(),
			None => return Err(ImmediateError::Undefined(self)),
		};
		let mut out = Vec::with_capacity(1 + immediate.len());
		out.push(self.0);
		out.extend(immediate);
		Ok(Bytecode(out))
	}

	/// Instruction followed by raw immediate bytes, which may be short or
	/// long on purpose.
	#[must_use]
	pub fn with_bytes(self, immediate: &[u8]) -> Bytecode {
		let mut out = Vec::with_capacity(1 + immediate.len());
		out.push(self.0);
		out.extend_from_slice(immediate);
		Bytecode(out)
	}

	/// Jump table instruction over `offsets`.
	///
	/// # Panics
	///
	/// Panics with more than 255 offsets.
	#[must_use]
	pub fn jump_table(self, offsets: &[i16]) -> Bytecode {
		match encode_jump_table(offsets) {
			Ok(immediate) => self.with_bytes(&immediate),
			Err(err) => panic!("{}", err),
		}
	}
}

impl From<Opcode> for Bytecode {
	fn from(opcode: Opcode) -> Self {
		Self(alloc::vec![opcode.0])
	}
}

impl From<Vec<u8>> for Bytecode {
	fn from(bytes: Vec<u8>) -> Self {
		Self(bytes)
	}
}

impl From<&[u8]> for Bytecode {
	fn from(bytes: &[u8]) -> Self {
		Self(bytes.to_vec())
	}
}

impl<const N: usize> From<[u8; N]> for Bytecode {
	fn from(bytes: [u8; N]) -> Self {
		Self(bytes.to_vec())
	}
}

impl AsRef<[u8]> for Bytecode {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl<T: Into<Bytecode>> Add<T> for Bytecode {
	type Output = Bytecode;

	fn add(self, rhs: T) -> Bytecode {
		let mut out = self.0;
		out.extend(rhs.into().0);
		Bytecode(out)
	}
}

impl<T: Into<Bytecode>> Add<T> for Opcode {
	type Output = Bytecode;

	fn add(self, rhs: T) -> Bytecode {
		Bytecode::from(self) + rhs
	}
}

impl Mul<usize> for Bytecode {
	type Output = Bytecode;

	fn mul(self, rhs: usize) -> Bytecode {
		self.repeat(rhs)
	}
}

impl Mul<usize> for Opcode {
	type Output = Bytecode;

	fn mul(self, rhs: usize) -> Bytecode {
		Bytecode::from(self).repeat(rhs)
	}
}

impl fmt::Display for Bytecode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(&self.0))
	}
}

impl fmt::Debug for Bytecode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Bytecode({})", self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn info(opcode: Opcode) -> &'static OpcodeInfo {
		opcode.info().unwrap()
	}

	#[test]
	fn immediate_twos_complement() {
		assert_eq!(encode_immediate(info(Opcode::PUSH1), &[-1]).unwrap(), vec![0xff]);
		assert_eq!(encode_immediate(info(Opcode::PUSH1), &[1]).unwrap(), vec![0x01]);
		assert_eq!(
			encode_immediate(info(Opcode::RJUMP), &[-1]).unwrap(),
			vec![0xff, 0xff]
		);
		assert_eq!(
			encode_immediate(info(Opcode::RJUMPV), &[2, 1, -3]).unwrap(),
			vec![0x02, 0x00, 0x01, 0xff, 0xfd]
		);
	}

	#[test]
	fn no_operands_leaves_immediate_to_caller() {
		assert!(encode_immediate(info(Opcode::PUSH2), &[]).unwrap().is_empty());
		assert_eq!(Opcode::PUSH2.with(&[]).as_slice(), &[0x61]);
	}

	#[test]
	fn operand_on_plain_opcode_is_rejected() {
		assert_eq!(
			encode_immediate(info(Opcode::ADD), &[1]),
			Err(ImmediateError::NoImmediate(Opcode::ADD))
		);
		assert_eq!(
			Opcode(0x0c).try_with(&[1]),
			Err(ImmediateError::Undefined(Opcode(0x0c)))
		);
	}

	#[test]
	#[should_panic(expected = "attempted to attach data to a no-immediate opcode")]
	fn with_panics_on_programmer_error() {
		let _ = Opcode::STOP.with(&[0]);
	}

	#[test]
	fn jump_tables() {
		assert_eq!(encode_jump_table(&[]).unwrap(), vec![0x00]);
		assert_eq!(encode_jump_table(&[2]).unwrap(), vec![0x01, 0x00, 0x02]);
		assert_eq!(
			encode_jump_table(&[1, 2]).unwrap(),
			vec![0x02, 0x00, 0x01, 0x00, 0x02]
		);
		assert_eq!(
			encode_jump_table(&[0; 256]),
			Err(ImmediateError::TooManyBranches(256))
		);
		assert_eq!(
			Opcode::RJUMPV.jump_table(&[-1]).as_slice(),
			&[0xe2, 0x01, 0xff, 0xff]
		);
	}

	#[test]
	fn composition() {
		let code = Opcode::PUSH1.with(&[1]) + Opcode::POP + Opcode::STOP;
		assert_eq!(code.as_slice(), &[0x60, 0x01, 0x50, 0x00]);

		let a = Bytecode::from(Opcode::ADD);
		let b = Opcode::MUL * 2;
		let c = Opcode::PUSH0.with(&[]);
		assert_eq!((a.clone() + b.clone()) + c.clone(), a.clone() + (b.clone() + c));
		assert_eq!(a.as_slice(), &[0x01]);
		assert_eq!((Opcode::JUMPDEST + Opcode::STOP) * 3, Bytecode::from(vec![0x5b, 0x00].repeat(3)));
		assert_eq!(format!("{}", Opcode::ORIGIN + Opcode::RETF), "0x32e4");
	}
}
