//! Types in the WebAssembly syntax.

/// Value types classify the individual values WebAssembly code computes with.
/// Only number types appear here; the back end never emits references.
///
/// See <https://webassembly.github.io/spec/core/syntax/types.html#value-types>
///
/// # Examples
/// ```rust
/// use contractc::wasm::{FloatType, IntegerType, ValueType};
///
/// assert_eq!(ValueType::I32, IntegerType::I32.into());
/// assert_eq!(ValueType::F64, FloatType::F64.into());
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

/// The integer subset of the value types.
/// Integers are not inherently signed; interpretation is per instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IntegerType {
    I32,
    I64,
}

/// The floating-point subset of the value types, as defined by IEEE 754-2019.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FloatType {
    F32,
    F64,
}

impl From<IntegerType> for ValueType {
    fn from(kind: IntegerType) -> Self {
        match kind {
            IntegerType::I32 => ValueType::I32,
            IntegerType::I64 => ValueType::I64,
        }
    }
}

impl From<FloatType> for ValueType {
    fn from(kind: FloatType) -> Self {
        match kind {
            FloatType::F32 => ValueType::F32,
            FloatType::F64 => ValueType::F64,
        }
    }
}

/// Function types classify functions, mapping parameters to results.
///
/// See <https://webassembly.github.io/spec/core/syntax/types.html#function-types>
///
/// # Examples
/// ```rust
/// use contractc::wasm::{FunctionType, ValueType};
///
/// let signature = FunctionType::new(vec![ValueType::I32], vec![ValueType::I64]);
///
/// assert_eq!(signature.parameters(), &[ValueType::I32]);
/// assert_eq!(signature.results(), &[ValueType::I64]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionType {
    parameters: Vec<ValueType>,
    results: Vec<ValueType>,
}

impl FunctionType {
    /// Creates a new function signature with the given parameter and result
    /// types.
    pub fn new(parameters: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        FunctionType {
            parameters,
            results,
        }
    }

    /// The parameter types of this signature.
    pub fn parameters(&self) -> &[ValueType] {
        &self.parameters
    }

    /// The result types of this signature.
    pub fn results(&self) -> &[ValueType] {
        &self.results
    }
}

/// Limits classify the size range of a linear memory, in units of page size.
///
/// See <https://webassembly.github.io/spec/core/syntax/types.html#limits>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Limit {
    min: u32,
    max: Option<u32>,
}

impl Limit {
    /// Creates a new limit with a required minimum and no maximum.
    pub fn unbounded(min: u32) -> Self {
        Limit { min, max: None }
    }

    /// Creates a new limit with a required minimum and maximum.
    pub fn bounded(min: u32, max: u32) -> Self {
        Limit {
            min,
            max: Some(max),
        }
    }

    /// The minimum value of the limit.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// The optional maximum value of the limit.
    pub fn max(&self) -> Option<u32> {
        self.max
    }
}

/// Memory types classify linear memories and their size range.
///
/// See <https://webassembly.github.io/spec/core/syntax/types.html#memory-types>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryType {
    limits: Limit,
}

impl MemoryType {
    /// Creates a new memory type from the given limits.
    pub fn new(limits: Limit) -> Self {
        MemoryType { limits }
    }

    /// The page-count limits of this memory type.
    pub fn limits(&self) -> &Limit {
        &self.limits
    }
}

/// Global types classify global variables, which hold a value and can either
/// be mutable or immutable.
///
/// See <https://webassembly.github.io/spec/core/syntax/types.html#global-types>
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GlobalType {
    kind: ValueType,
    mutable: bool,
}

impl GlobalType {
    /// Creates a new type for a mutable global variable.
    pub fn mutable(kind: ValueType) -> Self {
        GlobalType { kind, mutable: true }
    }

    /// Creates a new type for an immutable global variable.
    pub fn immutable(kind: ValueType) -> Self {
        GlobalType {
            kind,
            mutable: false,
        }
    }

    /// The value type of the global variable.
    pub fn kind(&self) -> ValueType {
        self.kind
    }

    /// Whether the global variable can be re-assigned.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}
