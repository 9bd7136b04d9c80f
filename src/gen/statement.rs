//! Statement emission against the layout's address forms.

use crate::ast::Expression;
use crate::gen::FunctionGen;
use crate::ir;
use crate::wasm::{
    ControlInstruction, Instruction, MemArg, MemoryInstruction, NumericInstruction, ValueType,
    VariableInstruction,
};

impl FunctionGen<'_> {
    /// Emits one simple statement into the instruction stream.
    pub(crate) fn statement(&mut self, statement: &ir::Statement, code: &mut Vec<Instruction>) {
        match statement {
            ir::Statement::Expression(expression) => {
                self.expression(expression, code);

                // a retained call with a result at statement level is dropped.
                if expression.meta().value_type().is_some() {
                    code.push(ControlInstruction::Drop.into());
                }
            }
            ir::Statement::Assign { target, value } => self.assign(target, value, code),
            ir::Statement::Return(value) => self.ret(value.as_ref(), code),
            // awaiting host runtime semantics.
            ir::Statement::Ddl(_) => {}
        }
    }

    fn assign(&mut self, target: &Expression, value: &Expression, code: &mut Vec<Instruction>) {
        match target {
            Expression::Global { name, .. } => {
                self.expression(value, code);

                let index = self.generator.global_indices[name];
                code.push(VariableInstruction::GlobalSet(index).into());
            }
            Expression::Local { index, .. } => {
                self.expression(value, code);
                code.push(VariableInstruction::LocalSet(*index).into());
            }
            Expression::Stack {
                base,
                addend,
                offset,
                meta,
            } => {
                code.push(VariableInstruction::LocalGet(*base).into());
                if *addend > 0 {
                    code.push(NumericInstruction::I32Constant(*addend as i32).into());
                    code.push(NumericInstruction::Add(ValueType::I32).into());
                }

                self.expression(value, code);

                let kind = meta.value_type().expect("stored values have a width");
                code.push(MemoryInstruction::Store(kind, MemArg::natural(kind, *offset)).into());
            }
            Expression::Index { meta, .. } => {
                // runtime-indexed element: resolve the address in lvalue
                // mode, then store through it.
                let saved = self.is_lvalue;
                self.is_lvalue = true;
                self.expression(target, code);
                self.is_lvalue = saved;

                self.expression(value, code);

                let kind = meta.value_type().expect("stored values have a width");
                code.push(MemoryInstruction::Store(kind, MemArg::natural(kind, 0)).into());
            }
            target => panic!("assignment target survived lowering: {target:?}"),
        }
    }

    /// Return releases the frame, then yields the value. A value-returning
    /// function that reaches its epilogue without one cannot continue.
    fn ret(&mut self, value: Option<&Expression>, code: &mut Vec<Instruction>) {
        self.epilogue(code);

        match (value, self.function.abi().result()) {
            (Some(value), Some(_)) => {
                self.expression(value, code);
                code.push(ControlInstruction::Return.into());
            }
            (None, None) => code.push(ControlInstruction::Return.into()),
            (None, Some(_)) => code.push(ControlInstruction::Unreachable.into()),
            (Some(value), None) => panic!("returned a value from a void function: {value:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{
        BinaryOp, Block, Expression, Function as AstFunction, Meta, Modifiers, Position, Value,
    };
    use crate::gen::{FunctionGen, Generator};
    use crate::ir;
    use crate::types::TypeKind;
    use crate::wasm::{Instruction, NumericInstruction, ValueType, VariableInstruction};

    fn empty_ir_function() -> ir::Function {
        let source = AstFunction::new("f", Modifiers::default(), vec![], vec![], Block::default());
        ir::Function::new("c", &source)
    }

    /// `a = b + 1` with `a`, `b` as `int32` locals at indices 5 and 6.
    #[test]
    fn assignment_emits_a_single_local_store() {
        let mut function = empty_ir_function();
        function.add_register(ValueType::I32);
        function.add_register(ValueType::I32);
        function.add_register(ValueType::I32);

        let int32 = Meta::scalar(TypeKind::Int32);
        let statement = ir::Statement::Assign {
            target: Expression::Local {
                index: 5,
                meta: int32.clone(),
            },
            value: Expression::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expression::Local {
                    index: 6,
                    meta: int32.clone(),
                }),
                rhs: Box::new(Expression::Literal {
                    value: Value::Int(1),
                    meta: int32,
                    position: Position::default(),
                }),
                meta: Meta::scalar(TypeKind::Int32),
                position: Position::default(),
            },
        };

        let mut generator = Generator::new();
        let mut gen = FunctionGen::new(&mut generator, &function);
        let mut code = Vec::new();
        gen.statement(&statement, &mut code);

        let expected: Vec<Instruction> = vec![
            VariableInstruction::LocalGet(6).into(),
            NumericInstruction::I32Constant(1).into(),
            NumericInstruction::Add(ValueType::I32).into(),
            VariableInstruction::LocalSet(5).into(),
        ];

        assert_eq!(code, expected);
    }

    #[test]
    fn frame_stores_use_the_static_offset() {
        let function = empty_ir_function();
        let statement = ir::Statement::Assign {
            target: Expression::Stack {
                base: ir::HEAP_BASE,
                addend: 8,
                offset: 4,
                meta: Meta::scalar(TypeKind::Int32),
            },
            value: Expression::Literal {
                value: Value::Int(7),
                meta: Meta::scalar(TypeKind::Int32),
                position: Position::default(),
            },
        };

        let mut generator = Generator::new();
        let mut gen = FunctionGen::new(&mut generator, &function);
        let mut code = Vec::new();
        gen.statement(&statement, &mut code);

        use crate::wasm::{MemArg, MemoryInstruction};
        let expected: Vec<Instruction> = vec![
            VariableInstruction::LocalGet(ir::HEAP_BASE).into(),
            NumericInstruction::I32Constant(8).into(),
            NumericInstruction::Add(ValueType::I32).into(),
            NumericInstruction::I32Constant(7).into(),
            MemoryInstruction::Store(ValueType::I32, MemArg::natural(ValueType::I32, 4)).into(),
        ];

        assert_eq!(code, expected);
    }
}
