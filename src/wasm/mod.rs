//! A model of the WebAssembly constructs the back end emits.
//!
//! The compiler core only touches this surface; any builder exposing
//! equivalent modules, signatures, and instruction sequences could be
//! substituted without changing the lowering stages.

mod instruction;
mod module;
mod types;

pub use instruction::{
    ControlInstruction, Expression, Instruction, MemArg, MemoryInstruction, NumericInstruction,
    SignExtension, VariableInstruction,
};
pub use module::{
    Data, Export, ExportDescription, Function, FunctionIndex, Global, GlobalIndex, Import, Memory,
    Module, ModuleBuilder, TypeIndex,
};
pub use types::{FloatType, FunctionType, GlobalType, IntegerType, Limit, MemoryType, ValueType};
