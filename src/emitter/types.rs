//! Emission of the type constructs of the binary format.

use crate::emitter::{emit_byte, emit_usize, emit_vector, EmitError};
use crate::wasm::{FunctionType, GlobalType, Limit, ValueType};
use std::io::Write;

/// Emits a value type as its single-byte encoding.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#value-types>
pub(crate) fn emit_value_type<O: Write + ?Sized>(
    kind: &ValueType,
    output: &mut O,
) -> Result<usize, EmitError> {
    let value: u8 = match kind {
        ValueType::I32 => 0x7F,
        ValueType::I64 => 0x7E,
        ValueType::F32 => 0x7D,
        ValueType::F64 => 0x7C,
    };

    emit_byte(value, output)
}

/// Emits a function type as parameter and result vectors.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#function-types>
pub(crate) fn emit_function_type<O: Write + ?Sized>(
    kind: &FunctionType,
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_byte(0x60, output)?;
    bytes += emit_vector(kind.parameters(), output, emit_value_type)?;
    bytes += emit_vector(kind.results(), output, emit_value_type)?;

    Ok(bytes)
}

/// Emits limits with the flag byte selecting the bounded encoding.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#limits>
pub(crate) fn emit_limit<O: Write + ?Sized>(
    limits: &Limit,
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    match limits.max() {
        Some(max) => {
            bytes += emit_byte(0x01, output)?;
            bytes += emit_usize(limits.min() as usize, output)?;
            bytes += emit_usize(max as usize, output)?;
        }
        None => {
            bytes += emit_byte(0x00, output)?;
            bytes += emit_usize(limits.min() as usize, output)?;
        }
    }

    Ok(bytes)
}

/// Emits a global type as a value type followed by the mutability flag.
///
/// See <https://webassembly.github.io/spec/core/binary/types.html#global-types>
pub(crate) fn emit_global_type<O: Write + ?Sized>(
    kind: &GlobalType,
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_value_type(&kind.kind(), output)?;
    bytes += emit_byte(kind.is_mutable() as u8, output)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_type_encoding() {
        let mut buffer = Vec::new();
        let kind = FunctionType::new(vec![ValueType::I32, ValueType::I64], vec![ValueType::F64]);

        emit_function_type(&kind, &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x60, 0x02, 0x7F, 0x7E, 0x01, 0x7C]);
    }

    #[test]
    fn limit_encoding_selects_flag() {
        let mut unbounded = Vec::new();
        emit_limit(&Limit::unbounded(2), &mut unbounded).unwrap();
        assert_eq!(unbounded, vec![0x00, 0x02]);

        let mut bounded = Vec::new();
        emit_limit(&Limit::bounded(1, 3), &mut bounded).unwrap();
        assert_eq!(bounded, vec![0x01, 0x01, 0x03]);
    }
}
