//! Emission of the primitive values of the binary format.

use crate::emitter::EmitError;
use crate::leb128;
use std::io::Write;

/// Emits a single byte to the output.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#bytes>
pub(crate) fn emit_byte<O: Write + ?Sized>(byte: u8, output: &mut O) -> Result<usize, EmitError> {
    output.write_all(&[byte])?;

    Ok(1)
}

/// Emits a slice of bytes to the output, optionally prefixed by its length.
///
/// See <https://webassembly.github.io/spec/core/binary/conventions.html#vectors>
pub(crate) fn emit_bytes<O: Write + ?Sized>(
    value: &[u8],
    output: &mut O,
    include_length: bool,
) -> Result<usize, EmitError> {
    let prefix = if include_length {
        emit_usize(value.len(), output)?
    } else {
        0
    };

    output.write_all(value)?;

    Ok(prefix + value.len())
}

/// Emits a name as a length-prefixed UTF-8 byte sequence.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#names>
pub(crate) fn emit_name<O: Write + ?Sized>(value: &str, output: &mut O) -> Result<usize, EmitError> {
    emit_bytes(value.as_bytes(), output, true)
}

/// Emits an unsigned 32-bit integer to the output.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn emit_u32<O: Write + ?Sized>(value: u32, output: &mut O) -> Result<usize, EmitError> {
    Ok(leb128::encode_unsigned(u64::from(value), output)?)
}

/// Emits an unsigned platform-sized integer to the output.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn emit_usize<O: Write + ?Sized>(
    value: usize,
    output: &mut O,
) -> Result<usize, EmitError> {
    Ok(leb128::encode_unsigned(value as u64, output)?)
}

/// Emits a signed 32-bit integer to the output.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn emit_i32<O: Write + ?Sized>(value: i32, output: &mut O) -> Result<usize, EmitError> {
    Ok(leb128::encode_signed(i64::from(value), output)?)
}

/// Emits a signed 64-bit integer to the output.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#integers>
pub(crate) fn emit_i64<O: Write + ?Sized>(value: i64, output: &mut O) -> Result<usize, EmitError> {
    Ok(leb128::encode_signed(value, output)?)
}

/// Emits a 32-bit float in little-endian byte order.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#floating-point>
pub(crate) fn emit_f32<O: Write + ?Sized>(value: f32, output: &mut O) -> Result<usize, EmitError> {
    let bytes = value.to_le_bytes();
    output.write_all(&bytes)?;

    Ok(bytes.len())
}

/// Emits a 64-bit float in little-endian byte order.
///
/// See <https://webassembly.github.io/spec/core/binary/values.html#floating-point>
pub(crate) fn emit_f64<O: Write + ?Sized>(value: f64, output: &mut O) -> Result<usize, EmitError> {
    let bytes = value.to_le_bytes();
    output.write_all(&bytes)?;

    Ok(bytes.len())
}

/// Emits each item with the given function, prefixed by the item count.
///
/// See <https://webassembly.github.io/spec/core/binary/conventions.html#vectors>
pub(crate) fn emit_vector<'items, I, E, O>(
    items: &'items [I],
    output: &mut O,
    emit: E,
) -> Result<usize, EmitError>
where
    O: Write + ?Sized,
    E: Fn(&'items I, &mut O) -> Result<usize, EmitError>,
{
    let mut bytes = 0;

    bytes += emit_usize(items.len(), output)?;
    bytes += emit_repeated(items, output, emit)?;

    Ok(bytes)
}

/// Emits each item with the given function, without a count prefix.
pub(crate) fn emit_repeated<'items, I, E, O>(
    items: &'items [I],
    output: &mut O,
    emit: E,
) -> Result<usize, EmitError>
where
    O: Write + ?Sized,
    E: Fn(&'items I, &mut O) -> Result<usize, EmitError>,
{
    let mut bytes = 0;

    for item in items {
        bytes += emit(item, output)?;
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_length_prefixed() {
        let bytes: [u8; 4] = [1, 2, 3, 4];
        let mut buffer: Vec<u8> = Vec::new();

        let emitted = emit_vector(&bytes, &mut buffer, |b, o| emit_byte(*b, o)).unwrap();

        assert_eq!(emitted, 1 + bytes.len());
        assert_eq!(buffer[0] as usize, bytes.len());
        assert_eq!(&bytes[..], &buffer[1..]);
    }

    #[test]
    fn names_use_utf8() {
        let mut buffer = Vec::new();

        emit_name("ab", &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x02, b'a', b'b']);
    }

    #[test]
    fn floats_use_little_endian() {
        let mut buffer = Vec::new();

        emit_f32(1.0, &mut buffer).unwrap();

        assert_eq!(buffer, 1.0f32.to_le_bytes());
    }
}
