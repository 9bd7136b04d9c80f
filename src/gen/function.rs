//! Per-function emission: prologue, relooped body, locals.

use crate::gen::{relooper, Generator};
use crate::ir;
use crate::ir::{HEAP_BASE, STACK_BASE};
use crate::wasm::{Function, Instruction, NumericInstruction, ValueType, VariableInstruction};

/// Emission state for one function body.
pub(crate) struct FunctionGen<'a> {
    pub(crate) generator: &'a mut Generator,
    pub(crate) function: &'a ir::Function,
    /// Expression context: addresses instead of loads for memory forms.
    pub(crate) is_lvalue: bool,
}

impl<'a> FunctionGen<'a> {
    pub(crate) fn new(generator: &'a mut Generator, function: &'a ir::Function) -> Self {
        FunctionGen {
            generator,
            function,
            is_lvalue: false,
        }
    }

    /// Emits the function: the frame prologue, then the relooped graph.
    pub(crate) fn emit(mut self) -> Function {
        log::trace!("emitting `{}`", self.function.name());

        let mut code = self.prologue();
        code.extend(relooper::reloop(&mut self));

        let kind = self
            .generator
            .builder
            .add_function_type(self.function.abi().signature().clone());

        Function::new(kind, self.function.registers().to_vec(), code.into())
    }

    /// Advances the allocator cursor past this frame. The caller passed the
    /// frame's heap and stack bases; every return resets the cursor to the
    /// heap base.
    fn prologue(&self) -> Vec<Instruction> {
        vec![
            VariableInstruction::LocalGet(STACK_BASE).into(),
            NumericInstruction::I32Constant(self.function.stack_usage() as i32).into(),
            NumericInstruction::Add(ValueType::I32).into(),
            VariableInstruction::GlobalSet(self.generator.heap_ptr()).into(),
        ]
    }

    /// The frame-release sequence emitted before every return.
    pub(crate) fn epilogue(&self, code: &mut Vec<Instruction>) {
        code.push(VariableInstruction::LocalGet(HEAP_BASE).into());
        code.push(VariableInstruction::GlobalSet(self.generator.heap_ptr()).into());
    }
}
