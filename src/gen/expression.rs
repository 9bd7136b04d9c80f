//! Expression emission over the byte-addressed linear-memory model.

use crate::ast::{BinaryOp, CallTarget, Expression, UnaryOp, Value};
use crate::gen::FunctionGen;
use crate::host::HostFn;
use crate::ir::CONTRACT_ADDRESS;
use crate::types::TypeKind;
use crate::wasm::{
    ControlInstruction, FloatType, Instruction, IntegerType, MemArg, MemoryInstruction,
    NumericInstruction, SignExtension, ValueType, VariableInstruction,
};

impl FunctionGen<'_> {
    /// Emits an expression, leaving its value (or, in lvalue context, its
    /// address) on the operand stack.
    pub(crate) fn expression(&mut self, expression: &Expression, code: &mut Vec<Instruction>) {
        match expression {
            Expression::Literal { value, meta, .. } => self.literal(value, meta.kind(), code),
            Expression::Global { name, .. } => {
                let index = self.generator.global_indices[name];
                code.push(VariableInstruction::GlobalGet(index).into());
            }
            Expression::Local { index, .. } => {
                code.push(VariableInstruction::LocalGet(*index).into());
            }
            Expression::Stack {
                base,
                addend,
                offset,
                meta,
            } => {
                let aggregate = matches!(meta.kind(), TypeKind::Struct | TypeKind::Tuple)
                    || meta.is_array();

                code.push(VariableInstruction::LocalGet(*base).into());

                if self.is_lvalue || aggregate {
                    // the slot itself is the value: produce its address.
                    let displacement = addend + offset;
                    if displacement > 0 {
                        code.push(NumericInstruction::I32Constant(displacement as i32).into());
                        code.push(NumericInstruction::Add(ValueType::I32).into());
                    }
                } else {
                    if *addend > 0 {
                        code.push(NumericInstruction::I32Constant(*addend as i32).into());
                        code.push(NumericInstruction::Add(ValueType::I32).into());
                    }

                    let kind = meta.value_type().expect("loaded values have a width");
                    code.push(MemoryInstruction::Load(kind, MemArg::natural(kind, *offset)).into());
                }
            }
            Expression::Index {
                value,
                index,
                meta,
                ..
            } => {
                let lvalue = self.is_lvalue;

                // the base in address mode, then the scaled index.
                self.is_lvalue = true;
                self.expression(value, code);
                self.is_lvalue = false;
                self.expression(index, code);

                if index.meta().value_type() == Some(ValueType::I64) {
                    code.push(NumericInstruction::Wrap.into());
                }

                code.push(NumericInstruction::I32Constant(meta.memory_size() as i32).into());
                code.push(NumericInstruction::Multiply(ValueType::I32).into());
                code.push(NumericInstruction::Add(ValueType::I32).into());

                self.is_lvalue = lvalue;

                let aggregate = matches!(meta.kind(), TypeKind::Struct | TypeKind::Tuple)
                    || meta.is_array();

                if !lvalue && !aggregate {
                    let kind = meta.value_type().expect("loaded values have a width");
                    code.push(MemoryInstruction::Load(kind, MemArg::natural(kind, 0)).into());
                }
            }
            Expression::Unary { op, operand, .. } => self.unary(*op, operand, code),
            Expression::Binary { op, lhs, rhs, .. } => self.binary(*op, lhs, rhs, code),
            Expression::Call {
                target,
                arguments,
                meta,
                ..
            } => self.call(target, arguments, meta.kind(), code),
            expression => panic!("expression survived lowering: {expression:?}"),
        }
    }

    /// Emits an expression as an `i32` condition, comparing wider types
    /// against zero.
    pub(crate) fn condition(&mut self, expression: &Expression, code: &mut Vec<Instruction>) {
        self.expression(expression, code);

        match expression.meta().value_type() {
            Some(ValueType::I32) | None => {}
            Some(ValueType::I64) => {
                code.push(NumericInstruction::I64Constant(0).into());
                code.push(NumericInstruction::NotEqual(ValueType::I64).into());
            }
            Some(ValueType::F32) => {
                code.push(NumericInstruction::F32Constant(0.0).into());
                code.push(NumericInstruction::NotEqual(ValueType::F32).into());
            }
            Some(ValueType::F64) => {
                code.push(NumericInstruction::F64Constant(0.0).into());
                code.push(NumericInstruction::NotEqual(ValueType::F64).into());
            }
        }
    }

    fn literal(&mut self, value: &Value, kind: TypeKind, code: &mut Vec<Instruction>) {
        match (value, kind) {
            (Value::Bool(value), _) => {
                code.push(NumericInstruction::I32Constant(*value as i32).into());
            }
            (Value::Int(value), TypeKind::Int64) => {
                code.push(NumericInstruction::I64Constant(*value).into());
            }
            (Value::Int(value), _) => {
                code.push(NumericInstruction::I32Constant(*value as i32).into());
            }
            (Value::Float(value), TypeKind::Double) => {
                code.push(NumericInstruction::F64Constant(*value).into());
            }
            (Value::Float(value), _) => {
                code.push(NumericInstruction::F32Constant(*value as f32).into());
            }
            (Value::Text(text), kind) if kind.is_big_integer() => {
                // the digits live in the literal pool; the host parses them.
                let address = self.generator.intern(text);
                code.push(NumericInstruction::I32Constant(address as i32).into());
                code.push(
                    ControlInstruction::Call(
                        self.generator.host_indices[&HostFn::BigIntFromString],
                    )
                    .into(),
                );
            }
            (Value::Text(text), _) => {
                let address = self.generator.intern(text);
                code.push(NumericInstruction::I32Constant(address as i32).into());
            }
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expression, code: &mut Vec<Instruction>) {
        let kind = operand
            .meta()
            .value_type()
            .expect("unary operands have a width");

        match (op, kind) {
            (UnaryOp::Not, _) => {
                self.expression(operand, code);
                code.push(NumericInstruction::EqualZero(IntegerType::I32).into());
            }
            (UnaryOp::Neg, ValueType::F32) => {
                self.expression(operand, code);
                code.push(NumericInstruction::Negate(FloatType::F32).into());
            }
            (UnaryOp::Neg, ValueType::F64) => {
                self.expression(operand, code);
                code.push(NumericInstruction::Negate(FloatType::F64).into());
            }
            (UnaryOp::Neg, ValueType::I32) => {
                code.push(NumericInstruction::I32Constant(0).into());
                self.expression(operand, code);
                code.push(NumericInstruction::Subtract(ValueType::I32).into());
            }
            (UnaryOp::Neg, ValueType::I64) => {
                code.push(NumericInstruction::I64Constant(0).into());
                self.expression(operand, code);
                code.push(NumericInstruction::Subtract(ValueType::I64).into());
            }
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
        code: &mut Vec<Instruction>,
    ) {
        let operand = lhs.meta().kind();
        let kind = operand.value_type().expect("operands have a width");

        self.expression(lhs, code);
        self.expression(rhs, code);

        let sign = if operand.is_unsigned() {
            SignExtension::Unsigned
        } else {
            SignExtension::Signed
        };
        let integer = match kind {
            ValueType::I32 => Some(IntegerType::I32),
            ValueType::I64 => Some(IntegerType::I64),
            _ => None,
        };
        let float = match kind {
            ValueType::F32 => Some(FloatType::F32),
            ValueType::F64 => Some(FloatType::F64),
            _ => None,
        };

        let instruction: NumericInstruction = match op {
            BinaryOp::Add => NumericInstruction::Add(kind),
            BinaryOp::Sub => NumericInstruction::Subtract(kind),
            BinaryOp::Mul => NumericInstruction::Multiply(kind),
            BinaryOp::Div => match (integer, float) {
                (Some(integer), _) => NumericInstruction::DivideInteger(integer, sign),
                (_, Some(float)) => NumericInstruction::DivideFloat(float),
                _ => unreachable!(),
            },
            BinaryOp::Mod => {
                NumericInstruction::Remainder(integer.expect("remainder of an integer"), sign)
            }
            BinaryOp::BitAnd | BinaryOp::And => {
                NumericInstruction::And(integer.expect("conjunction of an integer"))
            }
            BinaryOp::BitOr | BinaryOp::Or => {
                NumericInstruction::Or(integer.expect("disjunction of an integer"))
            }
            BinaryOp::BitXor => NumericInstruction::Xor(integer.expect("xor of an integer")),
            BinaryOp::Shl => NumericInstruction::ShiftLeft(integer.expect("shift of an integer")),
            BinaryOp::Shr => {
                NumericInstruction::ShiftRight(integer.expect("shift of an integer"), sign)
            }
            BinaryOp::Eq => NumericInstruction::Equal(kind),
            BinaryOp::Ne => NumericInstruction::NotEqual(kind),
            BinaryOp::Lt => match (integer, float) {
                (Some(integer), _) => NumericInstruction::LessThanInteger(integer, sign),
                (_, Some(float)) => NumericInstruction::LessThanFloat(float),
                _ => unreachable!(),
            },
            BinaryOp::Le => match (integer, float) {
                (Some(integer), _) => NumericInstruction::LessThanOrEqualInteger(integer, sign),
                (_, Some(float)) => NumericInstruction::LessThanOrEqualFloat(float),
                _ => unreachable!(),
            },
            BinaryOp::Gt => match (integer, float) {
                (Some(integer), _) => NumericInstruction::GreaterThanInteger(integer, sign),
                (_, Some(float)) => NumericInstruction::GreaterThanFloat(float),
                _ => unreachable!(),
            },
            BinaryOp::Ge => match (integer, float) {
                (Some(integer), _) => NumericInstruction::GreaterThanOrEqualInteger(integer, sign),
                (_, Some(float)) => NumericInstruction::GreaterThanOrEqualFloat(float),
                _ => unreachable!(),
            },
        };

        code.push(instruction.into());
    }

    /// Emits a call. Host callees get their arguments coerced to the import
    /// signature; contract callees get the four frame arguments prepended.
    fn call(
        &mut self,
        target: &CallTarget,
        arguments: &[Expression],
        result: TypeKind,
        code: &mut Vec<Instruction>,
    ) {
        match target {
            CallTarget::Host(host) => {
                for (argument, parameter) in arguments.iter().zip(host.parameters()) {
                    self.expression(argument, code);
                    coerce(argument.meta().kind(), *parameter, code);
                }

                code.push(ControlInstruction::Call(self.generator.host_indices[host]).into());

                if let (Some(produced), Some(expected)) = (host.result(), result.value_type()) {
                    coerce_result(produced, expected, code);
                }
            }
            CallTarget::Function(name) => {
                let heap_usage = self.generator.frames[name];

                code.push(VariableInstruction::LocalGet(CONTRACT_ADDRESS).into());
                code.push(VariableInstruction::GlobalGet(self.generator.heap_ptr()).into());
                code.push(VariableInstruction::GlobalGet(self.generator.heap_ptr()).into());
                code.push(NumericInstruction::I32Constant(heap_usage as i32).into());
                code.push(NumericInstruction::Add(ValueType::I32).into());
                code.push(NumericInstruction::I32Constant(0).into());

                for argument in arguments {
                    self.expression(argument, code);
                }

                code.push(
                    ControlInstruction::Call(self.generator.function_indices[name]).into(),
                );
            }
        }
    }
}

/// Widens or narrows a host-call argument to the import's parameter type.
fn coerce(from: TypeKind, to: ValueType, code: &mut Vec<Instruction>) {
    let from_kind = from.value_type().expect("arguments have a width");

    match (from_kind, to) {
        (ValueType::I32, ValueType::I64) => {
            let sign = if from.is_unsigned() || from.is_by_address() {
                SignExtension::Unsigned
            } else {
                SignExtension::Signed
            };
            code.push(NumericInstruction::Extend(sign).into());
        }
        (ValueType::I64, ValueType::I32) => code.push(NumericInstruction::Wrap.into()),
        (from, to) => debug_assert_eq!(from, to, "host argument width mismatch"),
    }
}

/// Narrows or widens a host-call result back to the expression's type.
fn coerce_result(produced: ValueType, expected: ValueType, code: &mut Vec<Instruction>) {
    match (produced, expected) {
        (ValueType::I64, ValueType::I32) => code.push(NumericInstruction::Wrap.into()),
        (ValueType::I32, ValueType::I64) => {
            code.push(NumericInstruction::Extend(SignExtension::Signed).into());
        }
        (produced, expected) => {
            debug_assert_eq!(produced, expected, "host result width mismatch");
        }
    }
}
