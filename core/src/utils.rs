//! Byte helpers shared by the builder and the analyzer.

use alloc::vec::Vec;

use crate::ImmediateError;

/// Reads a big-endian `u16` at `position`, `None` if it runs past the end.
#[inline]
#[must_use]
pub fn read_u16(code: &[u8], position: usize) -> Option<u16> {
	let bytes = code.get(position..position.checked_add(2)?)?;
	Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Reads a big-endian `i16` at `position`, `None` if it runs past the end.
#[inline]
#[must_use]
pub fn read_i16(code: &[u8], position: usize) -> Option<i16> {
	read_u16(code, position).map(|value| value as i16)
}

/// Big-endian two's complement of `value` in exactly `width` bytes.
///
/// Accepts the signed and the unsigned range of the width, so `-1` and
/// `0xff` both encode to `[0xff]` in one byte.
pub fn to_twos_complement(value: i128, width: usize) -> Result<Vec<u8>, ImmediateError> {
	const FULL: usize = core::mem::size_of::<i128>();

	if width == 0 {
		return Err(ImmediateError::Overflow { value, width });
	}
	if width < FULL {
		let bits = 8 * width as u32;
		let min = -(1i128 << (bits - 1));
		let max = (1i128 << bits) - 1;
		if value < min || value > max {
			return Err(ImmediateError::Overflow { value, width });
		}
	}

	let be = value.to_be_bytes();
	if width <= FULL {
		Ok(be[FULL - width..].to_vec())
	} else {
		let fill = if value < 0 { 0xff } else { 0x00 };
		let mut out = alloc::vec![fill; width - FULL];
		out.extend_from_slice(&be);
		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_past_end() {
		assert_eq!(read_u16(&[0x01, 0x02], 0), Some(0x0102));
		assert_eq!(read_u16(&[0x01, 0x02], 1), None);
		assert_eq!(read_i16(&[0xff, 0xfd], 0), Some(-3));
		assert_eq!(read_u16(&[], usize::MAX), None);
	}

	#[test]
	fn twos_complement_widths() {
		assert_eq!(to_twos_complement(-1, 1).unwrap(), vec![0xff]);
		assert_eq!(to_twos_complement(255, 1).unwrap(), vec![0xff]);
		assert_eq!(to_twos_complement(-1, 2).unwrap(), vec![0xff, 0xff]);
		assert_eq!(to_twos_complement(-32768, 2).unwrap(), vec![0x80, 0x00]);
		assert_eq!(to_twos_complement(1, 3).unwrap(), vec![0x00, 0x00, 0x01]);
		assert_eq!(to_twos_complement(-2, 20).unwrap().len(), 20);
		assert_eq!(to_twos_complement(-2, 20).unwrap()[0], 0xff);
		assert_eq!(to_twos_complement(-2, 20).unwrap()[19], 0xfe);
		assert_eq!(to_twos_complement(7, 32).unwrap()[31], 0x07);
		assert_eq!(to_twos_complement(7, 32).unwrap()[0], 0x00);
	}

	#[test]
	fn twos_complement_overflow() {
		assert_eq!(
			to_twos_complement(256, 1),
			Err(ImmediateError::Overflow {
				value: 256,
				width: 1
			})
		);
		assert!(to_twos_complement(-129, 1).is_err());
		assert!(to_twos_complement(65536, 2).is_err());
	}
}
