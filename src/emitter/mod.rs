//! Emit WebAssembly binary format.

mod instruction;
mod module;
mod types;
mod values;

pub(crate) use instruction::emit_expression;
pub(crate) use types::{emit_function_type, emit_global_type, emit_limit, emit_value_type};
pub(crate) use values::{
    emit_byte, emit_bytes, emit_f32, emit_f64, emit_i32, emit_i64, emit_name, emit_u32, emit_usize,
    emit_vector,
};

use crate::wasm::Module;
use std::io::Write;
use thiserror::Error;

/// An error emitting a WebAssembly module in the binary format.
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),
    #[error("an error occurred encoding a number into LEB-128")]
    Encode(#[from] crate::leb128::Leb128Error),
}

/// Emits a binary representation of a WebAssembly module to a `Write` output.
///
/// See <https://webassembly.github.io/spec/core/binary/index.html>
///
/// # Examples
/// ```rust
/// use contractc::emitter::emit_binary;
/// use contractc::wasm::Module;
///
/// let mut buffer = Vec::new();
/// emit_binary(&Module::builder().build(), &mut buffer).unwrap();
///
/// assert_eq!(buffer, vec![0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
/// ```
pub fn emit_binary<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    module::emit_module(module, output)
}

/// Counts the number of bytes written, but does nothing else with them.
/// Used to size a section before emitting it for real.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct CountingWrite {
    bytes: usize,
}

impl CountingWrite {
    pub fn new() -> Self {
        CountingWrite::default()
    }

    /// The number of bytes written so far.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Write for CountingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes += buf.len();

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.bytes += buf.len();

        Ok(())
    }
}
