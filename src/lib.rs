//! Middle end and back end of a compiler for a statically-typed smart-contract
//! language targeting WebAssembly.
//!
//! The crate consumes a type-checked, resolver-annotated abstract syntax tree
//! ([`ast`]) and produces a WebAssembly binary. The pipeline is strictly
//! staged: [`trans`] rewrites structured statements into a per-function
//! control-flow graph ([`ir`]), and [`gen`] renders the graph into a
//! [`wasm::Module`] which the [`emitter`] serializes.
//!
//! Parsing, type checking, name resolution, the command-line driver, and the
//! host runtime behind the `env` imports are external collaborators.

pub mod ast;
pub mod emitter;
pub mod error;
pub mod gen;
pub mod host;
pub mod ir;
pub mod leb128;
pub mod trans;
pub mod types;
pub mod wasm;

pub use error::CompileError;

/// Compiles a resolved contract into a WebAssembly binary.
///
/// Lowering continues past recoverable source errors so that as many
/// diagnostics as possible are gathered; the accumulated diagnostics are
/// returned once the whole contract has been visited.
pub fn compile(contract: &ast::Contract) -> Result<Vec<u8>, CompileError> {
    log::debug!("compiling contract `{}`", contract.name);

    let ir = trans::contract(contract)?;
    let module = gen::generate(&ir);

    let mut binary = Vec::new();
    emitter::emit_binary(&module, &mut binary)?;

    log::debug!(
        "contract `{}` compiled to {} bytes",
        contract.name,
        binary.len()
    );

    Ok(binary)
}
