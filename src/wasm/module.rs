//! WebAssembly modules and their segments.

use crate::wasm::{Expression, FunctionType, GlobalType, MemoryType, ValueType};

pub type TypeIndex = u32;
pub type FunctionIndex = u32;
pub type GlobalIndex = u32;

/// A WebAssembly module: the unit of deployment, loading, and compilation.
/// The back end produces exactly one per contract.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#modules>
///
/// # Examples
/// ```rust
/// use contractc::wasm::Module;
///
/// let module = Module::builder().build();
///
/// assert!(module.functions().is_empty());
/// assert!(module.imports().is_empty());
/// assert_eq!(module.start(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Module {
    function_types: Vec<FunctionType>,
    imports: Vec<Import>,
    functions: Vec<Function>,
    memories: Vec<Memory>,
    globals: Vec<Global>,
    exports: Vec<Export>,
    start: Option<FunctionIndex>,
    data: Vec<Data>,
}

impl Module {
    /// Creates a builder for WebAssembly modules.
    pub fn builder() -> ModuleBuilder {
        ModuleBuilder::default()
    }

    /// The 𝗍𝗒𝗉𝖾𝗌 component of the module.
    pub fn function_types(&self) -> &[FunctionType] {
        &self.function_types
    }

    /// The 𝗂𝗆𝗉𝗈𝗋𝗍𝗌 component of the module.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// The 𝖿𝗎𝗇𝖼𝗌 component of the module.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// The 𝗆𝖾𝗆𝗌 component of the module.
    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    /// The 𝗀𝗅𝗈𝖻𝖺𝗅𝗌 component of the module.
    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    /// The 𝖾𝗑𝗉𝗈𝗋𝗍𝗌 component of the module.
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    /// The index of the function run when the module is instantiated.
    pub fn start(&self) -> Option<FunctionIndex> {
        self.start
    }

    /// The 𝖽𝖺𝗍𝖺𝗌 component of the module.
    pub fn data(&self) -> &[Data] {
        &self.data
    }
}

/// An incremental builder of [`Module`]s.
///
/// The builder tracks the function index space (imports first, then defined
/// functions) and interns structurally equal function types, so callers can
/// register signatures freely without duplicating the type section.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Interns the function type and returns its index.
    /// Structurally equal types share one entry.
    pub fn add_function_type(&mut self, function_type: FunctionType) -> TypeIndex {
        let types = &mut self.module.function_types;

        match types.iter().position(|existing| *existing == function_type) {
            Some(index) => index as TypeIndex,
            None => {
                types.push(function_type);
                (types.len() - 1) as TypeIndex
            }
        }
    }

    /// Adds a function import.
    /// Returns the imported function's index in the function index space.
    ///
    /// All imports must be added before the first defined function so the
    /// index space stays dense.
    pub fn add_import(&mut self, import: Import) -> FunctionIndex {
        debug_assert!(
            self.module.functions.is_empty(),
            "imports precede defined functions"
        );

        self.module.imports.push(import);
        (self.module.imports.len() - 1) as FunctionIndex
    }

    /// Adds a defined function and returns its index in the function index
    /// space (offset by the imports).
    pub fn add_function(&mut self, function: Function) -> FunctionIndex {
        self.module.functions.push(function);
        (self.module.imports.len() + self.module.functions.len() - 1) as FunctionIndex
    }

    /// Adds a linear memory.
    pub fn add_memory(&mut self, memory: Memory) {
        self.module.memories.push(memory);
    }

    /// Adds a global variable and returns its index.
    pub fn add_global(&mut self, global: Global) -> GlobalIndex {
        self.module.globals.push(global);
        (self.module.globals.len() - 1) as GlobalIndex
    }

    /// Adds an export.
    pub fn add_export(&mut self, export: Export) {
        self.module.exports.push(export);
    }

    /// Sets the start function invoked at instantiation.
    pub fn set_start(&mut self, start: Option<FunctionIndex>) {
        self.module.start = start;
    }

    /// Adds an active data segment.
    pub fn add_data(&mut self, data: Data) {
        self.module.data.push(data);
    }

    /// The number of function imports added so far.
    pub fn import_count(&self) -> u32 {
        self.module.imports.len() as u32
    }

    /// Builds the accumulated segments into a module.
    pub fn build(self) -> Module {
        self.module
    }
}

/// A defined function: a signature reference, its local declarations, and a
/// body expression.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#functions>
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    kind: TypeIndex,
    locals: Vec<ValueType>,
    body: Expression,
}

impl Function {
    pub fn new(kind: TypeIndex, locals: Vec<ValueType>, body: Expression) -> Self {
        Function { kind, locals, body }
    }

    /// The index of this function's type definition.
    pub fn kind(&self) -> TypeIndex {
        self.kind
    }

    /// The local variable types, excluding parameters.
    pub fn locals(&self) -> &[ValueType] {
        &self.locals
    }

    /// The code of this function.
    pub fn body(&self) -> &Expression {
        &self.body
    }
}

/// A function imported from the host.
/// The back end imports nothing but functions, all under one module name.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#imports>
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    module: String,
    name: String,
    kind: TypeIndex,
}

impl Import {
    pub fn function(module: &str, name: &str, kind: TypeIndex) -> Self {
        Import {
            module: module.to_string(),
            name: name.to_string(),
            kind,
        }
    }

    /// The module namespace of the import.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The name of the import within its module namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The index of the imported function's type definition.
    pub fn kind(&self) -> TypeIndex {
        self.kind
    }
}

/// A linear memory, described by its page-count limits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Memory {
    kind: MemoryType,
}

impl Memory {
    pub fn new(kind: MemoryType) -> Self {
        Memory { kind }
    }

    /// The type descriptor of this memory.
    pub fn kind(&self) -> &MemoryType {
        &self.kind
    }
}

/// A global variable with a constant initializer expression.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#globals>
#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    kind: GlobalType,
    initializer: Expression,
}

impl Global {
    pub fn new(kind: GlobalType, initializer: Expression) -> Self {
        Global { kind, initializer }
    }

    /// The type descriptor of this global variable.
    pub fn kind(&self) -> &GlobalType {
        &self.kind
    }

    /// The constant expression computing the initial value.
    pub fn initializer(&self) -> &Expression {
        &self.initializer
    }
}

/// What an export exposes to the host environment.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExportDescription {
    Function(FunctionIndex),
    Memory(u32),
    Global(GlobalIndex),
}

/// A named export.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#exports>
#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    name: String,
    description: ExportDescription,
}

impl Export {
    pub fn new(name: &str, description: ExportDescription) -> Self {
        Export {
            name: name.to_string(),
            description,
        }
    }

    /// The name the export is visible under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The exported definition.
    pub fn description(&self) -> ExportDescription {
        self.description
    }
}

/// An active data segment copied into memory zero at instantiation.
///
/// See <https://webassembly.github.io/spec/core/syntax/modules.html#data-segments>
#[derive(Clone, Debug, PartialEq)]
pub struct Data {
    offset: u32,
    bytes: Vec<u8>,
}

impl Data {
    pub fn new(offset: u32, bytes: Vec<u8>) -> Self {
        Data { offset, bytes }
    }

    /// The byte offset within the memory the segment initializes.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The contents of the segment.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_types_are_interned() {
        let mut builder = Module::builder();

        let first = builder.add_function_type(FunctionType::new(vec![ValueType::I32], vec![]));
        let second = builder.add_function_type(FunctionType::new(vec![], vec![ValueType::I64]));
        let third = builder.add_function_type(FunctionType::new(vec![ValueType::I32], vec![]));

        assert_eq!(first, third);
        assert_ne!(first, second);
        assert_eq!(builder.build().function_types().len(), 2);
    }

    #[test]
    fn function_indices_follow_imports() {
        let mut builder = Module::builder();
        let kind = builder.add_function_type(FunctionType::new(vec![], vec![]));

        let imported = builder.add_import(Import::function("env", "abort", kind));
        let defined = builder.add_function(Function::new(kind, vec![], Expression::default()));

        assert_eq!(imported, 0);
        assert_eq!(defined, 1);
    }
}
