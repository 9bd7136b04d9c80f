//! The intermediate representation between lowering and code generation:
//! functions of basic blocks with guarded branches.

mod abi;
mod block;
mod function;

pub use abi::Abi;
pub use block::{BasicBlock, BlockId, Branch};
pub use function::{
    Function, CONTRACT_ADDRESS, HEAP_BASE, MANGLED_NAME_MAX, RELOOPER, RESERVED_LOCALS, STACK_BASE,
};
pub(crate) use function::mangle;

use crate::ast::Expression;
use crate::wasm::ValueType;

/// The statement universe that survives lowering.
/// Structured statements become control-flow edges; only these four kinds
/// appear inside basic blocks.
#[derive(Clone, Debug)]
pub enum Statement {
    /// An expression evaluated for its side effects; only calls are kept.
    Expression(Expression),
    /// A store through one of the lowered address forms.
    Assign {
        target: Expression,
        value: Expression,
    },
    /// Function return, with the value already lowered.
    Return(Option<Expression>),
    /// Data-definition statement; currently emits nothing.
    Ddl(String),
}

/// One lowered contract: everything code generation needs to assemble a
/// module.
#[derive(Debug)]
pub struct Module {
    pub contract: String,
    pub globals: Vec<GlobalVariable>,
    pub functions: Vec<Function>,
    /// Index into `functions` of the synthetic constructor, if the contract
    /// declares state.
    pub constructor: Option<usize>,
}

/// A contract global destined for an exported module global.
#[derive(Debug)]
pub struct GlobalVariable {
    pub name: String,
    pub kind: ValueType,
}
