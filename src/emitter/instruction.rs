//! Emission of instruction sequences.

use crate::emitter::{
    emit_byte, emit_f32, emit_f64, emit_i32, emit_i64, emit_u32, emit_value_type, EmitError,
};
use crate::wasm::{
    ControlInstruction, Expression, FloatType, Instruction, IntegerType, MemArg,
    MemoryInstruction, NumericInstruction, SignExtension, ValueType, VariableInstruction,
};
use std::io::Write;

/// The marker closing every expression and structured instruction.
const END: u8 = 0x0B;

/// The encoding of the empty block type.
const EMPTY_BLOCK: u8 = 0x40;

/// Emits an expression: its instructions followed by the `end` marker.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html#expressions>
pub(crate) fn emit_expression<O: Write + ?Sized>(
    expression: &Expression,
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    for instruction in expression.instructions() {
        bytes += emit_instruction(instruction, output)?;
    }

    bytes += emit_byte(END, output)?;

    Ok(bytes)
}

/// Emits a single instruction, recursing through structured bodies.
///
/// See <https://webassembly.github.io/spec/core/binary/instructions.html>
pub(crate) fn emit_instruction<O: Write + ?Sized>(
    instruction: &Instruction,
    output: &mut O,
) -> Result<usize, EmitError> {
    match instruction {
        Instruction::Numeric(instruction) => emit_numeric(instruction, output),
        Instruction::Variable(instruction) => emit_variable(instruction, output),
        Instruction::Memory(instruction) => emit_memory(instruction, output),
        Instruction::Control(instruction) => emit_control(instruction, output),
    }
}

fn emit_block_kind<O: Write + ?Sized>(
    kind: &Option<ValueType>,
    output: &mut O,
) -> Result<usize, EmitError> {
    match kind {
        Some(kind) => emit_value_type(kind, output),
        None => emit_byte(EMPTY_BLOCK, output),
    }
}

fn emit_body<O: Write + ?Sized>(
    body: &[Instruction],
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    for instruction in body {
        bytes += emit_instruction(instruction, output)?;
    }

    Ok(bytes)
}

fn emit_control<O: Write + ?Sized>(
    instruction: &ControlInstruction,
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    match instruction {
        ControlInstruction::Unreachable => bytes += emit_byte(0x00, output)?,
        ControlInstruction::Nop => bytes += emit_byte(0x01, output)?,
        ControlInstruction::Block { kind, body } => {
            bytes += emit_byte(0x02, output)?;
            bytes += emit_block_kind(kind, output)?;
            bytes += emit_body(body, output)?;
            bytes += emit_byte(END, output)?;
        }
        ControlInstruction::Loop { kind, body } => {
            bytes += emit_byte(0x03, output)?;
            bytes += emit_block_kind(kind, output)?;
            bytes += emit_body(body, output)?;
            bytes += emit_byte(END, output)?;
        }
        ControlInstruction::If {
            kind,
            then,
            otherwise,
        } => {
            bytes += emit_byte(0x04, output)?;
            bytes += emit_block_kind(kind, output)?;
            bytes += emit_body(then, output)?;

            if !otherwise.is_empty() {
                bytes += emit_byte(0x05, output)?;
                bytes += emit_body(otherwise, output)?;
            }

            bytes += emit_byte(END, output)?;
        }
        ControlInstruction::Branch(label) => {
            bytes += emit_byte(0x0C, output)?;
            bytes += emit_u32(*label, output)?;
        }
        ControlInstruction::BranchIf(label) => {
            bytes += emit_byte(0x0D, output)?;
            bytes += emit_u32(*label, output)?;
        }
        ControlInstruction::Return => bytes += emit_byte(0x0F, output)?,
        ControlInstruction::Call(function) => {
            bytes += emit_byte(0x10, output)?;
            bytes += emit_u32(*function, output)?;
        }
        ControlInstruction::Drop => bytes += emit_byte(0x1A, output)?,
        ControlInstruction::Select => bytes += emit_byte(0x1B, output)?,
    }

    Ok(bytes)
}

fn emit_variable<O: Write + ?Sized>(
    instruction: &VariableInstruction,
    output: &mut O,
) -> Result<usize, EmitError> {
    let (opcode, index) = match instruction {
        VariableInstruction::LocalGet(index) => (0x20, *index),
        VariableInstruction::LocalSet(index) => (0x21, *index),
        VariableInstruction::LocalTee(index) => (0x22, *index),
        VariableInstruction::GlobalGet(index) => (0x23, *index),
        VariableInstruction::GlobalSet(index) => (0x24, *index),
    };

    let mut bytes = 0;

    bytes += emit_byte(opcode, output)?;
    bytes += emit_u32(index, output)?;

    Ok(bytes)
}

fn emit_mem_arg<O: Write + ?Sized>(arg: &MemArg, output: &mut O) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_u32(arg.align, output)?;
    bytes += emit_u32(arg.offset, output)?;

    Ok(bytes)
}

fn emit_memory<O: Write + ?Sized>(
    instruction: &MemoryInstruction,
    output: &mut O,
) -> Result<usize, EmitError> {
    let mut bytes = 0;

    match instruction {
        MemoryInstruction::Load(kind, arg) => {
            let opcode = match kind {
                ValueType::I32 => 0x28,
                ValueType::I64 => 0x29,
                ValueType::F32 => 0x2A,
                ValueType::F64 => 0x2B,
            };

            bytes += emit_byte(opcode, output)?;
            bytes += emit_mem_arg(arg, output)?;
        }
        MemoryInstruction::Store(kind, arg) => {
            let opcode = match kind {
                ValueType::I32 => 0x36,
                ValueType::I64 => 0x37,
                ValueType::F32 => 0x38,
                ValueType::F64 => 0x39,
            };

            bytes += emit_byte(opcode, output)?;
            bytes += emit_mem_arg(arg, output)?;
        }
        MemoryInstruction::Size => {
            bytes += emit_byte(0x3F, output)?;
            bytes += emit_byte(0x00, output)?;
        }
        MemoryInstruction::Grow => {
            bytes += emit_byte(0x40, output)?;
            bytes += emit_byte(0x00, output)?;
        }
    }

    Ok(bytes)
}

fn emit_numeric<O: Write + ?Sized>(
    instruction: &NumericInstruction,
    output: &mut O,
) -> Result<usize, EmitError> {
    use NumericInstruction::*;
    use SignExtension::*;

    match instruction {
        I32Constant(value) => {
            let mut bytes = emit_byte(0x41, output)?;
            bytes += emit_i32(*value, output)?;
            return Ok(bytes);
        }
        I64Constant(value) => {
            let mut bytes = emit_byte(0x42, output)?;
            bytes += emit_i64(*value, output)?;
            return Ok(bytes);
        }
        F32Constant(value) => {
            let mut bytes = emit_byte(0x43, output)?;
            bytes += emit_f32(*value, output)?;
            return Ok(bytes);
        }
        F64Constant(value) => {
            let mut bytes = emit_byte(0x44, output)?;
            bytes += emit_f64(*value, output)?;
            return Ok(bytes);
        }
        _ => {}
    }

    let opcode: u8 = match instruction {
        EqualZero(IntegerType::I32) => 0x45,
        EqualZero(IntegerType::I64) => 0x50,
        Equal(ValueType::I32) => 0x46,
        Equal(ValueType::I64) => 0x51,
        Equal(ValueType::F32) => 0x5B,
        Equal(ValueType::F64) => 0x61,
        NotEqual(ValueType::I32) => 0x47,
        NotEqual(ValueType::I64) => 0x52,
        NotEqual(ValueType::F32) => 0x5C,
        NotEqual(ValueType::F64) => 0x62,
        LessThanInteger(IntegerType::I32, Signed) => 0x48,
        LessThanInteger(IntegerType::I32, Unsigned) => 0x49,
        LessThanInteger(IntegerType::I64, Signed) => 0x53,
        LessThanInteger(IntegerType::I64, Unsigned) => 0x54,
        GreaterThanInteger(IntegerType::I32, Signed) => 0x4A,
        GreaterThanInteger(IntegerType::I32, Unsigned) => 0x4B,
        GreaterThanInteger(IntegerType::I64, Signed) => 0x55,
        GreaterThanInteger(IntegerType::I64, Unsigned) => 0x56,
        LessThanOrEqualInteger(IntegerType::I32, Signed) => 0x4C,
        LessThanOrEqualInteger(IntegerType::I32, Unsigned) => 0x4D,
        LessThanOrEqualInteger(IntegerType::I64, Signed) => 0x57,
        LessThanOrEqualInteger(IntegerType::I64, Unsigned) => 0x58,
        GreaterThanOrEqualInteger(IntegerType::I32, Signed) => 0x4E,
        GreaterThanOrEqualInteger(IntegerType::I32, Unsigned) => 0x4F,
        GreaterThanOrEqualInteger(IntegerType::I64, Signed) => 0x59,
        GreaterThanOrEqualInteger(IntegerType::I64, Unsigned) => 0x5A,
        LessThanFloat(FloatType::F32) => 0x5D,
        LessThanFloat(FloatType::F64) => 0x63,
        GreaterThanFloat(FloatType::F32) => 0x5E,
        GreaterThanFloat(FloatType::F64) => 0x64,
        LessThanOrEqualFloat(FloatType::F32) => 0x5F,
        LessThanOrEqualFloat(FloatType::F64) => 0x65,
        GreaterThanOrEqualFloat(FloatType::F32) => 0x60,
        GreaterThanOrEqualFloat(FloatType::F64) => 0x66,
        Add(ValueType::I32) => 0x6A,
        Add(ValueType::I64) => 0x7C,
        Add(ValueType::F32) => 0x92,
        Add(ValueType::F64) => 0xA0,
        Subtract(ValueType::I32) => 0x6B,
        Subtract(ValueType::I64) => 0x7D,
        Subtract(ValueType::F32) => 0x93,
        Subtract(ValueType::F64) => 0xA1,
        Multiply(ValueType::I32) => 0x6C,
        Multiply(ValueType::I64) => 0x7E,
        Multiply(ValueType::F32) => 0x94,
        Multiply(ValueType::F64) => 0xA2,
        DivideInteger(IntegerType::I32, Signed) => 0x6D,
        DivideInteger(IntegerType::I32, Unsigned) => 0x6E,
        DivideInteger(IntegerType::I64, Signed) => 0x7F,
        DivideInteger(IntegerType::I64, Unsigned) => 0x80,
        DivideFloat(FloatType::F32) => 0x95,
        DivideFloat(FloatType::F64) => 0xA3,
        Remainder(IntegerType::I32, Signed) => 0x6F,
        Remainder(IntegerType::I32, Unsigned) => 0x70,
        Remainder(IntegerType::I64, Signed) => 0x81,
        Remainder(IntegerType::I64, Unsigned) => 0x82,
        And(IntegerType::I32) => 0x71,
        And(IntegerType::I64) => 0x83,
        Or(IntegerType::I32) => 0x72,
        Or(IntegerType::I64) => 0x84,
        Xor(IntegerType::I32) => 0x73,
        Xor(IntegerType::I64) => 0x85,
        ShiftLeft(IntegerType::I32) => 0x74,
        ShiftLeft(IntegerType::I64) => 0x86,
        ShiftRight(IntegerType::I32, Signed) => 0x75,
        ShiftRight(IntegerType::I32, Unsigned) => 0x76,
        ShiftRight(IntegerType::I64, Signed) => 0x87,
        ShiftRight(IntegerType::I64, Unsigned) => 0x88,
        Negate(FloatType::F32) => 0x8C,
        Negate(FloatType::F64) => 0x9A,
        Wrap => 0xA7,
        Extend(Signed) => 0xAC,
        Extend(Unsigned) => 0xAD,
        I32Constant(_) | I64Constant(_) | F32Constant(_) | F64Constant(_) => unreachable!(),
    };

    emit_byte(opcode, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_encoding() {
        let mut buffer = Vec::new();

        emit_instruction(&NumericInstruction::I32Constant(-1).into(), &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x41, 0x7F]);
    }

    #[test]
    fn nested_if_encoding() {
        let mut buffer = Vec::new();
        let instruction: Instruction = ControlInstruction::If {
            kind: None,
            then: vec![ControlInstruction::Nop.into()],
            otherwise: vec![],
        }
        .into();

        emit_instruction(&instruction, &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x04, 0x40, 0x01, 0x0B]);
    }

    #[test]
    fn expression_is_end_terminated() {
        let mut buffer = Vec::new();
        let expression: Expression = vec![NumericInstruction::I32Constant(7).into()].into();

        emit_expression(&expression, &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x41, 0x07, 0x0B]);
    }

    #[test]
    fn store_carries_alignment_and_offset() {
        let mut buffer = Vec::new();
        let instruction: Instruction =
            MemoryInstruction::Store(ValueType::I64, MemArg::natural(ValueType::I64, 16)).into();

        emit_instruction(&instruction, &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x37, 0x03, 0x10]);
    }
}
