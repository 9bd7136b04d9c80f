//! Emission of modules and their sections.

use crate::emitter::{
    emit_byte, emit_bytes, emit_expression, emit_function_type, emit_global_type, emit_limit,
    emit_name, emit_u32, emit_usize, emit_value_type, emit_vector, CountingWrite, EmitError,
};
use crate::wasm::{
    Data, Export, ExportDescription, Expression, Function, Global, Import, Memory, Module,
    NumericInstruction, ValueType,
};
use std::io::Write;

/// A magic constant identifying WebAssembly binary contents.
const PREAMBLE: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// The version of the binary format emitted.
const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Section identifiers of the binary format.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#sections>
#[derive(Copy, Clone)]
enum SectionId {
    Type = 1,
    Import = 2,
    Function = 3,
    Memory = 5,
    Global = 6,
    Export = 7,
    Start = 8,
    Code = 10,
    Data = 11,
}

/// Emits a module: preamble, version, then every non-empty section in order.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html>
pub(crate) fn emit_module<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_bytes(&PREAMBLE, output, false)?;
    bytes += emit_bytes(&VERSION, output, false)?;
    bytes += emit_type_section(module, output)?;
    bytes += emit_import_section(module, output)?;
    bytes += emit_function_section(module, output)?;
    bytes += emit_memory_section(module, output)?;
    bytes += emit_global_section(module, output)?;
    bytes += emit_export_section(module, output)?;
    bytes += emit_start_section(module, output)?;
    bytes += emit_code_section(module, output)?;
    bytes += emit_data_section(module, output)?;

    Ok(bytes)
}

fn emit_type_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.function_types().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Type, output, |o| {
            emit_vector(module.function_types(), o, emit_function_type)
        })
    }
}

fn emit_import_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.imports().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Import, output, |o| {
            emit_vector(module.imports(), o, emit_import)
        })
    }
}

fn emit_import<O: Write + ?Sized>(import: &Import, output: &mut O) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_name(import.module(), output)?;
    bytes += emit_name(import.name(), output)?;
    bytes += emit_byte(0x00, output)?;
    bytes += emit_u32(import.kind(), output)?;

    Ok(bytes)
}

fn emit_function_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.functions().is_empty() {
        Ok(0)
    } else {
        let kinds: Vec<u32> = module.functions().iter().map(Function::kind).collect();

        emit_section(SectionId::Function, output, move |o| {
            emit_vector(kinds.as_slice(), o, |kind, o| emit_u32(*kind, o))
        })
    }
}

fn emit_memory_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.memories().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Memory, output, |o| {
            emit_vector(module.memories(), o, |memory: &Memory, o| {
                emit_limit(memory.kind().limits(), o)
            })
        })
    }
}

fn emit_global_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.globals().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Global, output, |o| {
            emit_vector(module.globals(), o, emit_global)
        })
    }
}

fn emit_global<O: Write + ?Sized>(global: &Global, output: &mut O) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_global_type(global.kind(), output)?;
    bytes += emit_expression(global.initializer(), output)?;

    Ok(bytes)
}

fn emit_export_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.exports().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Export, output, |o| {
            emit_vector(module.exports(), o, emit_export)
        })
    }
}

fn emit_export<O: Write + ?Sized>(export: &Export, output: &mut O) -> Result<usize, EmitError> {
    let mut bytes = 0;

    bytes += emit_name(export.name(), output)?;

    let (kind, index) = match export.description() {
        ExportDescription::Function(index) => (0x00, index),
        ExportDescription::Memory(index) => (0x02, index),
        ExportDescription::Global(index) => (0x03, index),
    };

    bytes += emit_byte(kind, output)?;
    bytes += emit_u32(index, output)?;

    Ok(bytes)
}

fn emit_start_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    match module.start() {
        Some(start) => emit_section(SectionId::Start, output, |o| emit_u32(start, o)),
        None => Ok(0),
    }
}

fn emit_code_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.functions().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Code, output, |o| {
            emit_vector(module.functions(), o, emit_code)
        })
    }
}

/// Emits a code entry: the body size in bytes, compressed local
/// declarations, then the body expression.
///
/// See <https://webassembly.github.io/spec/core/binary/modules.html#code-section>
fn emit_code<O: Write + ?Sized>(function: &Function, output: &mut O) -> Result<usize, EmitError> {
    fn emit_contents<O: Write + ?Sized>(
        locals: &[(u32, ValueType)],
        function: &Function,
        o: &mut O,
    ) -> Result<usize, EmitError> {
        let mut bytes = 0;

        bytes += emit_vector(locals, o, |&(count, kind), o| {
            let mut bytes = emit_u32(count, o)?;
            bytes += emit_value_type(&kind, o)?;
            Ok(bytes)
        })?;
        bytes += emit_expression(function.body(), o)?;

        Ok(bytes)
    }

    let locals = compress_locals(function.locals());

    let mut counter = CountingWrite::new();
    emit_contents(&locals, function, &mut counter)?;

    let mut bytes = 0;
    bytes += emit_usize(counter.bytes(), output)?;
    bytes += emit_contents(&locals, function, output)?;

    Ok(bytes)
}

/// Collapses runs of equal local types into `(count, type)` pairs.
fn compress_locals(locals: &[ValueType]) -> Vec<(u32, ValueType)> {
    let mut compressed: Vec<(u32, ValueType)> = Vec::new();

    for kind in locals {
        match compressed.last_mut() {
            Some((count, last)) if last == kind => *count += 1,
            _ => compressed.push((1, *kind)),
        }
    }

    compressed
}

fn emit_data_section<O: Write>(module: &Module, output: &mut O) -> Result<usize, EmitError> {
    if module.data().is_empty() {
        Ok(0)
    } else {
        emit_section(SectionId::Data, output, |o| {
            emit_vector(module.data(), o, emit_data)
        })
    }
}

fn emit_data<O: Write + ?Sized>(data: &Data, output: &mut O) -> Result<usize, EmitError> {
    let offset: Expression =
        vec![NumericInstruction::I32Constant(data.offset() as i32).into()].into();

    let mut bytes = 0;

    bytes += emit_byte(0x00, output)?;
    bytes += emit_expression(&offset, output)?;
    bytes += emit_bytes(data.bytes(), output, true)?;

    Ok(bytes)
}

/// Emits a section prefixed by its identifier and length.
/// The contents are emitted twice: once against a counter to learn the
/// length, then against the real output.
fn emit_section<E, O>(section: SectionId, output: &mut O, emit: E) -> Result<usize, EmitError>
where
    O: Write,
    E: Fn(&mut dyn Write) -> Result<usize, EmitError>,
{
    let mut counter = CountingWrite::new();
    emit(&mut counter)?;

    let mut bytes = 0;

    bytes += emit_byte(section as u8, output)?;
    bytes += emit_usize(counter.bytes(), output)?;
    bytes += emit(output)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wasm::{FunctionType, GlobalType, Limit, MemoryType};

    #[test]
    fn empty_module_is_preamble_only() {
        let mut buffer = Vec::new();

        emit_module(&Module::builder().build(), &mut buffer).unwrap();

        assert_eq!(buffer, vec![0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn locals_compress_into_runs() {
        let locals = vec![
            ValueType::I32,
            ValueType::I32,
            ValueType::I64,
            ValueType::I32,
        ];

        assert_eq!(
            compress_locals(&locals),
            vec![(2, ValueType::I32), (1, ValueType::I64), (1, ValueType::I32)]
        );
    }

    #[test]
    fn sections_are_length_prefixed() {
        let mut builder = Module::builder();
        builder.add_memory(Memory::new(MemoryType::new(Limit::unbounded(1))));

        let mut buffer = Vec::new();
        emit_module(&builder.build(), &mut buffer).unwrap();

        // preamble + version, then section 5 of length 3: vector of one
        // unbounded limit with minimum 1.
        assert_eq!(&buffer[8..], &[0x05, 0x03, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn full_module_emits_every_section() {
        let mut builder = Module::builder();
        let kind = builder.add_function_type(FunctionType::new(vec![], vec![]));

        builder.add_import(Import::function("env", "abort", kind));
        let function = builder.add_function(Function::new(
            kind,
            vec![ValueType::I32],
            Expression::default(),
        ));
        builder.add_memory(Memory::new(MemoryType::new(Limit::unbounded(1))));
        builder.add_global(Global::new(
            GlobalType::mutable(ValueType::I32),
            vec![NumericInstruction::I32Constant(8).into()].into(),
        ));
        builder.add_export(Export::new("run", ExportDescription::Function(function)));
        builder.set_start(Some(function));
        builder.add_data(Data::new(8, b"hi\0".to_vec()));

        let mut buffer = Vec::new();
        let emitted = emit_module(&builder.build(), &mut buffer).unwrap();

        assert_eq!(emitted, buffer.len());

        let ids: Vec<u8> = vec![1, 2, 3, 5, 6, 7, 8, 10, 11];
        let mut cursor = 8;
        let mut seen = Vec::new();

        while cursor < buffer.len() {
            seen.push(buffer[cursor]);
            let length = buffer[cursor + 1] as usize;
            cursor += 2 + length;
        }

        assert_eq!(seen, ids);
    }
}
