//! Code generation: rendering the lowered IR into a WebAssembly module.
//!
//! Each internal function receives four leading `i32` frame parameters
//! (contract address, heap base, stack base, relooper scratch). The exported
//! `$heap_ptr` global is a bump allocator over the frame region: a callee's
//! prologue advances it past its own frame and every return restores it.
//! Public functions get exported wrappers that bridge from the host calling
//! convention; the synthetic constructor runs from the start section.

mod expression;
mod function;
mod relooper;
mod statement;

pub(crate) use function::FunctionGen;

use crate::ast::align_up;
use crate::host::{HostFn, MODULE};
use crate::ir;
use crate::ir::RESERVED_LOCALS;
use crate::wasm::{
    ControlInstruction, Export, ExportDescription, Function, FunctionIndex, FunctionType, Global,
    GlobalIndex, GlobalType, Import, Instruction, Limit, Memory, MemoryType, Module,
    NumericInstruction, ValueType, VariableInstruction,
};
use std::collections::HashMap;

/// The WebAssembly page size.
const PAGE_SIZE: u32 = 65536;

/// Linear memory reserved past the static frame estimate for host-side
/// allocations.
const RUNTIME_RESERVE: u32 = 65536;

/// Literal data starts past a small guard region so address zero stays
/// distinguishable from real data.
const DATA_BASE: u32 = 8;

/// The export name of the bump-allocator cursor.
const HEAP_PTR: &str = "$heap_ptr";

/// Generates the WebAssembly module for one lowered contract.
pub fn generate(ir: &ir::Module) -> Module {
    log::debug!(
        "generating module for `{}`: {} function(s), {} global(s)",
        ir.contract,
        ir.functions.len(),
        ir.globals.len()
    );

    let mut generator = Generator::new();

    for host in HostFn::ALL {
        let kind = generator.builder.add_function_type(FunctionType::new(
            host.parameters().to_vec(),
            host.result().into_iter().collect(),
        ));
        let index = generator
            .builder
            .add_import(Import::function(MODULE, host.name(), kind));
        generator.host_indices.insert(host, index);
    }

    // function and global indices are fixed up front so bodies can refer to
    // them in any order.
    let imports = generator.builder.import_count();
    for (position, function) in ir.functions.iter().enumerate() {
        generator
            .function_indices
            .insert(function.name().to_string(), imports + position as u32);
        generator
            .frames
            .insert(function.name().to_string(), function.heap_usage());
    }

    for (position, global) in ir.globals.iter().enumerate() {
        generator
            .global_indices
            .insert(global.name.clone(), 1 + position as GlobalIndex);
    }

    for function in &ir.functions {
        let emitted = FunctionGen::new(&mut generator, function).emit();
        generator.builder.add_function(emitted);
    }

    let mut exports = Vec::new();
    for function in &ir.functions {
        if let Some(name) = function.export_name() {
            let index = generator.wrapper(function);
            exports.push((name.to_string(), index));
        }
    }

    let start = ir
        .constructor
        .map(|position| generator.start_wrapper(&ir.functions[position]));

    generator.assemble(ir, exports, start)
}

/// Module-wide emission state: the builder, the symbol resolvers from names
/// to emitter indices, and the literal pool.
pub(crate) struct Generator {
    pub(crate) builder: crate::wasm::ModuleBuilder,
    pub(crate) host_indices: HashMap<HostFn, FunctionIndex>,
    pub(crate) function_indices: HashMap<String, FunctionIndex>,
    pub(crate) global_indices: HashMap<String, GlobalIndex>,
    /// Heap usage per internal function, for carving callee frames.
    pub(crate) frames: HashMap<String, u32>,
    data: Vec<u8>,
    strings: HashMap<String, u32>,
}

impl Generator {
    fn new() -> Self {
        Generator {
            builder: Module::builder(),
            host_indices: HashMap::new(),
            function_indices: HashMap::new(),
            global_indices: HashMap::new(),
            frames: HashMap::new(),
            data: Vec::new(),
            strings: HashMap::new(),
        }
    }

    /// The global index of the bump-allocator cursor.
    pub(crate) fn heap_ptr(&self) -> GlobalIndex {
        0
    }

    /// Interns a NUL-terminated literal into the data segment; returns its
    /// address.
    pub(crate) fn intern(&mut self, text: &str) -> u32 {
        if let Some(offset) = self.strings.get(text) {
            return *offset;
        }

        let offset = DATA_BASE + self.data.len() as u32;
        self.data.extend_from_slice(text.as_bytes());
        self.data.push(0);
        self.strings.insert(text.to_string(), offset);

        offset
    }

    /// Builds the exported wrapper bridging a public function to the host
    /// calling convention: it fetches the contract address, carves the
    /// callee frame off `$heap_ptr`, forwards the declared parameters, and
    /// yields the scalar result or the return-buffer pointer.
    fn wrapper(&mut self, function: &ir::Function) -> FunctionIndex {
        let abi = function.abi();
        let reserved = RESERVED_LOCALS as usize;
        let pointer = abi.returns_by_pointer();
        let parameters: Vec<ValueType> = if pointer {
            abi.parameters()[reserved..abi.parameters().len() - 1].to_vec()
        } else {
            abi.parameters()[reserved..].to_vec()
        };
        let result = if pointer {
            Some(ValueType::I32)
        } else {
            abi.result()
        };

        let buffer_local = parameters.len() as u32;
        let mut code: Vec<Instruction> = Vec::new();

        if pointer {
            // reserve the return buffer below the callee frame.
            code.push(VariableInstruction::GlobalGet(self.heap_ptr()).into());
            code.push(VariableInstruction::LocalSet(buffer_local).into());
            code.push(VariableInstruction::GlobalGet(self.heap_ptr()).into());
            code.push(NumericInstruction::I32Constant(function.return_size() as i32).into());
            code.push(NumericInstruction::Add(ValueType::I32).into());
            code.push(VariableInstruction::GlobalSet(self.heap_ptr()).into());
        }

        code.push(ControlInstruction::Call(self.host_indices[&HostFn::ContractAddress]).into());
        code.push(VariableInstruction::GlobalGet(self.heap_ptr()).into());
        code.push(VariableInstruction::GlobalGet(self.heap_ptr()).into());
        code.push(NumericInstruction::I32Constant(function.heap_usage() as i32).into());
        code.push(NumericInstruction::Add(ValueType::I32).into());
        code.push(NumericInstruction::I32Constant(0).into());

        for index in 0..parameters.len() as u32 {
            code.push(VariableInstruction::LocalGet(index).into());
        }

        if pointer {
            code.push(VariableInstruction::LocalGet(buffer_local).into());
        }

        code.push(ControlInstruction::Call(self.function_indices[function.name()]).into());

        if pointer {
            code.push(VariableInstruction::LocalGet(buffer_local).into());
        }

        let kind = self.builder.add_function_type(FunctionType::new(
            parameters,
            result.into_iter().collect(),
        ));
        let locals = if pointer {
            vec![ValueType::I32]
        } else {
            Vec::new()
        };

        self.builder.add_function(Function::new(kind, locals, code.into()))
    }

    /// The `()->()` start-section wrapper invoking the constructor with a
    /// frame of its own.
    fn start_wrapper(&mut self, constructor: &ir::Function) -> FunctionIndex {
        let code: Vec<Instruction> = vec![
            ControlInstruction::Call(self.host_indices[&HostFn::ContractAddress]).into(),
            VariableInstruction::GlobalGet(self.heap_ptr()).into(),
            VariableInstruction::GlobalGet(self.heap_ptr()).into(),
            NumericInstruction::I32Constant(constructor.heap_usage() as i32).into(),
            NumericInstruction::Add(ValueType::I32).into(),
            NumericInstruction::I32Constant(0).into(),
            ControlInstruction::Call(self.function_indices[constructor.name()]).into(),
        ];

        let kind = self
            .builder
            .add_function_type(FunctionType::new(vec![], vec![]));

        self.builder.add_function(Function::new(kind, vec![], code.into()))
    }

    /// Assembles memory, globals, data, and exports around the emitted
    /// functions.
    fn assemble(
        mut self,
        ir: &ir::Module,
        exports: Vec<(String, FunctionIndex)>,
        start: Option<FunctionIndex>,
    ) -> Module {
        let data_end = align_up(DATA_BASE + self.data.len() as u32, 8);
        let frames: u32 = ir.functions.iter().map(ir::Function::frame_size).sum();
        let pages = (data_end + frames + RUNTIME_RESERVE).div_ceil(PAGE_SIZE);

        self.builder
            .add_memory(Memory::new(MemoryType::new(Limit::unbounded(pages))));

        // global zero is the allocator cursor, starting past the literals.
        self.builder.add_global(Global::new(
            GlobalType::mutable(ValueType::I32),
            vec![NumericInstruction::I32Constant(data_end as i32).into()].into(),
        ));

        for global in &ir.globals {
            let zero: Instruction = match global.kind {
                ValueType::I32 => NumericInstruction::I32Constant(0).into(),
                ValueType::I64 => NumericInstruction::I64Constant(0).into(),
                ValueType::F32 => NumericInstruction::F32Constant(0.0).into(),
                ValueType::F64 => NumericInstruction::F64Constant(0.0).into(),
            };

            self.builder
                .add_global(Global::new(GlobalType::mutable(global.kind), vec![zero].into()));
        }

        if !self.data.is_empty() {
            let data = std::mem::take(&mut self.data);
            self.builder
                .add_data(crate::wasm::Data::new(DATA_BASE, data));
        }

        self.builder
            .add_export(Export::new("memory", ExportDescription::Memory(0)));
        self.builder
            .add_export(Export::new(HEAP_PTR, ExportDescription::Global(0)));

        for (position, global) in ir.globals.iter().enumerate() {
            self.builder.add_export(Export::new(
                &global.name,
                ExportDescription::Global(1 + position as GlobalIndex),
            ));
        }

        for (name, index) in exports {
            self.builder
                .add_export(Export::new(&name, ExportDescription::Function(index)));
        }

        self.builder.set_start(start);

        self.builder.build()
    }
}
