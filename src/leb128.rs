//! Little-Endian Base 128 encoding of the integers in the binary format.

use std::io::Write;
use thiserror::Error;

/// The number of payload bits per LEB128 encoding group.
const GROUP_BITS: u32 = 7;

/// The continuation flag on every group except the last.
const CONTINUATION: u8 = 0x80;

/// The sign bit within the final encoding group.
const SIGN: u8 = 0x40;

/// An error encoding an LEB128 integer.
#[derive(Error, Debug)]
pub enum Leb128Error {
    #[error("failed to write to the given output")]
    Write(#[from] std::io::Error),
}

/// Encodes an unsigned integer using LEB128 encoding.
/// Returns the number of bytes written.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub fn encode_unsigned<O: Write + ?Sized>(
    value: u64,
    output: &mut O,
) -> Result<usize, Leb128Error> {
    let mut value = value;
    let mut written = 0;

    loop {
        let mut byte = (value as u8) & !CONTINUATION;
        value >>= GROUP_BITS;

        if value != 0 {
            byte |= CONTINUATION;
        }

        output.write_all(&[byte])?;
        written += 1;

        if value == 0 {
            break;
        }
    }

    Ok(written)
}

/// Encodes a signed integer using LEB128 encoding.
/// Returns the number of bytes written.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub fn encode_signed<O: Write + ?Sized>(value: i64, output: &mut O) -> Result<usize, Leb128Error> {
    let mut value = value;
    let mut written = 0;

    loop {
        let byte = (value as u8) & !CONTINUATION;
        value >>= GROUP_BITS;

        let done = (value == 0 && byte & SIGN == 0) || (value == -1 && byte & SIGN != 0);
        let byte = if done { byte } else { byte | CONTINUATION };

        output.write_all(&[byte])?;
        written += 1;

        if done {
            break;
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    /// Reference decoder used only to check the encoders.
    fn decode(input: &[u8]) -> (u64, usize) {
        let mut result = 0u64;
        for (index, byte) in input.iter().enumerate() {
            result |= u64::from(byte & !CONTINUATION) << (index as u32 * GROUP_BITS);
            if byte & CONTINUATION == 0 {
                return (result, index + 1);
            }
        }
        panic!("missing terminal group");
    }

    fn decode_signed(input: &[u8]) -> (i64, usize) {
        let (raw, length) = decode(input);
        let shift = length as u32 * GROUP_BITS;
        let mut value = raw as i64;

        if shift < 64 && input[length - 1] & SIGN != 0 {
            value |= -1i64 << shift;
        }

        (value, length)
    }

    #[test]
    fn encode_unsigned_large() {
        let mut output = Vec::new();
        let written = encode_unsigned(624485, &mut output).unwrap();

        assert_eq!(written, 3);
        assert_eq!(output, vec![0xE5, 0x8E, 0x26]);
    }

    #[test]
    fn encode_unsigned_zero() {
        let mut output = Vec::new();
        let written = encode_unsigned(0, &mut output).unwrap();

        assert_eq!(written, 1);
        assert_eq!(output, vec![0x00]);
    }

    #[test]
    fn encode_signed_negative() {
        let mut output = Vec::new();
        let written = encode_signed(-123456, &mut output).unwrap();

        assert_eq!(written, 3);
        assert_eq!(output, vec![0xC0, 0xBB, 0x78]);
    }

    #[test]
    fn encode_signed_sign_boundary() {
        // 64 needs an extra group so the sign bit is not misread.
        let mut output = Vec::new();
        let written = encode_signed(64, &mut output).unwrap();

        assert_eq!(written, 2);
        assert_eq!(output, vec![0xC0, 0x00]);
    }

    #[quickcheck]
    fn unsigned_round_trips(value: u64) -> bool {
        let mut output = Vec::new();
        let written = encode_unsigned(value, &mut output).unwrap();

        decode(&output) == (value, written)
    }

    #[quickcheck]
    fn signed_round_trips(value: i64) -> bool {
        let mut output = Vec::new();
        let written = encode_signed(value, &mut output).unwrap();

        decode_signed(&output) == (value, written)
    }
}
