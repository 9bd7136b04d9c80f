//! The subset of the WebAssembly instruction set the back end emits.

use crate::wasm::{FloatType, FunctionIndex, GlobalIndex, IntegerType, ValueType};

/// A function body or initializer: an instruction sequence terminated by an
/// `end` marker in the binary format.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#expressions>
///
/// # Examples
/// ```rust
/// use contractc::wasm::{Expression, Instruction, NumericInstruction};
///
/// let expression: Expression = vec![NumericInstruction::I32Constant(42).into()].into();
///
/// assert_eq!(expression.instructions().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Expression {
    instructions: Vec<Instruction>,
}

impl Expression {
    /// Creates a new expression from the given instruction sequence.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Expression { instructions }
    }

    /// The instructions of this expression, in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl From<Vec<Instruction>> for Expression {
    fn from(instructions: Vec<Instruction>) -> Self {
        Expression { instructions }
    }
}

/// WebAssembly code consists of sequences of instructions manipulating an
/// implicit operand stack.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html>
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Numeric(NumericInstruction),
    Variable(VariableInstruction),
    Memory(MemoryInstruction),
    Control(ControlInstruction),
}

impl From<NumericInstruction> for Instruction {
    fn from(instruction: NumericInstruction) -> Self {
        Instruction::Numeric(instruction)
    }
}

impl From<VariableInstruction> for Instruction {
    fn from(instruction: VariableInstruction) -> Self {
        Instruction::Variable(instruction)
    }
}

impl From<MemoryInstruction> for Instruction {
    fn from(instruction: MemoryInstruction) -> Self {
        Instruction::Memory(instruction)
    }
}

impl From<ControlInstruction> for Instruction {
    fn from(instruction: ControlInstruction) -> Self {
        Instruction::Control(instruction)
    }
}

/// Whether an integer operand is interpreted as signed or unsigned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignExtension {
    Signed,
    Unsigned,
}

/// Numeric instructions provide basic operations over numeric values of a
/// specific type.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#numeric-instructions>
#[derive(Clone, Debug, PartialEq)]
pub enum NumericInstruction {
    I32Constant(i32),
    I64Constant(i64),
    F32Constant(f32),
    F64Constant(f64),
    /// Unary test against zero; yields an `i32` boolean.
    EqualZero(IntegerType),
    Equal(ValueType),
    NotEqual(ValueType),
    LessThanInteger(IntegerType, SignExtension),
    GreaterThanInteger(IntegerType, SignExtension),
    LessThanOrEqualInteger(IntegerType, SignExtension),
    GreaterThanOrEqualInteger(IntegerType, SignExtension),
    LessThanFloat(FloatType),
    GreaterThanFloat(FloatType),
    LessThanOrEqualFloat(FloatType),
    GreaterThanOrEqualFloat(FloatType),
    Add(ValueType),
    Subtract(ValueType),
    Multiply(ValueType),
    DivideInteger(IntegerType, SignExtension),
    DivideFloat(FloatType),
    Remainder(IntegerType, SignExtension),
    And(IntegerType),
    Or(IntegerType),
    Xor(IntegerType),
    ShiftLeft(IntegerType),
    ShiftRight(IntegerType, SignExtension),
    Negate(FloatType),
    /// `i32.wrap_i64`.
    Wrap,
    /// `i64.extend_i32_s` / `i64.extend_i32_u`.
    Extend(SignExtension),
}

/// Variable instructions access function locals and module globals.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#variable-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VariableInstruction {
    LocalGet(u32),
    LocalSet(u32),
    LocalTee(u32),
    GlobalGet(GlobalIndex),
    GlobalSet(GlobalIndex),
}

/// The static offset and alignment exponent attached to every memory access.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemArg {
    pub align: u32,
    pub offset: u32,
}

impl MemArg {
    /// The natural alignment and a static offset for an access of the given
    /// value type.
    pub fn natural(kind: ValueType, offset: u32) -> Self {
        let align = match kind {
            ValueType::I32 | ValueType::F32 => 2,
            ValueType::I64 | ValueType::F64 => 3,
        };

        MemArg { align, offset }
    }
}

/// Memory instructions move full-width values between the operand stack and
/// linear memory. Sub-width accesses never occur: the layout tables widen
/// every scalar to at least one word.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#memory-instructions>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemoryInstruction {
    Load(ValueType, MemArg),
    Store(ValueType, MemArg),
    Size,
    Grow,
}

/// Control instructions steer execution: structured blocks, branches, calls,
/// and the operand-stack bookkeeping instructions.
///
/// See <https://webassembly.github.io/spec/core/syntax/instructions.html#control-instructions>
#[derive(Clone, Debug, PartialEq)]
pub enum ControlInstruction {
    Unreachable,
    Nop,
    Block {
        kind: Option<ValueType>,
        body: Vec<Instruction>,
    },
    Loop {
        kind: Option<ValueType>,
        body: Vec<Instruction>,
    },
    If {
        kind: Option<ValueType>,
        then: Vec<Instruction>,
        otherwise: Vec<Instruction>,
    },
    Branch(u32),
    BranchIf(u32),
    Return,
    Call(FunctionIndex),
    Drop,
    Select,
}
