//! The closed universe of source types and their size tables.

use crate::wasm::ValueType;

/// Type tags of the contract language.
///
/// The universe is closed: every expression, identifier, and storage slot in
/// the compiler carries exactly one of these tags. Aggregate shape (tuple
/// members, struct fields, array dimensions) lives in [`crate::ast::Meta`];
/// the tag alone decides register width and linear-memory footprint.
///
/// # Examples
/// ```rust
/// use contractc::types::TypeKind;
/// use contractc::wasm::ValueType;
///
/// assert_eq!(TypeKind::Int32.name(), "int32");
/// assert_eq!(TypeKind::Int32.memory_size(), 4);
/// assert_eq!(TypeKind::Map.value_type(), Some(ValueType::I64));
/// assert_eq!(TypeKind::String.value_type(), Some(ValueType::I32));
/// assert_eq!(TypeKind::Void.value_type(), None);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeKind {
    None,
    Bool,
    Byte,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    Float,
    Double,
    String,
    Account,
    Struct,
    Map,
    Object,
    Cursor,
    Void,
    Tuple,
}

impl TypeKind {
    /// Every tag, in declaration order.
    pub const ALL: [TypeKind; 19] = [
        TypeKind::None,
        TypeKind::Bool,
        TypeKind::Byte,
        TypeKind::Int8,
        TypeKind::Int16,
        TypeKind::Int32,
        TypeKind::Int64,
        TypeKind::Int128,
        TypeKind::Int256,
        TypeKind::Float,
        TypeKind::Double,
        TypeKind::String,
        TypeKind::Account,
        TypeKind::Struct,
        TypeKind::Map,
        TypeKind::Object,
        TypeKind::Cursor,
        TypeKind::Void,
        TypeKind::Tuple,
    ];

    /// The display name of the tag.
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::None => "none",
            TypeKind::Bool => "bool",
            TypeKind::Byte => "byte",
            TypeKind::Int8 => "int8",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int32",
            TypeKind::Int64 => "int64",
            TypeKind::Int128 => "int128",
            TypeKind::Int256 => "int256",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::String => "string",
            TypeKind::Account => "account",
            TypeKind::Struct => "struct",
            TypeKind::Map => "map",
            TypeKind::Object => "object",
            TypeKind::Cursor => "cursor",
            TypeKind::Void => "void",
            TypeKind::Tuple => "tuple",
        }
    }

    /// Bytes a value of this tag occupies in linear memory.
    ///
    /// Sub-word integers widen to a full word; everything passed by address
    /// occupies one pointer.
    pub fn memory_size(self) -> u32 {
        match self {
            TypeKind::None | TypeKind::Void => 0,
            TypeKind::Bool
            | TypeKind::Byte
            | TypeKind::Int8
            | TypeKind::Int16
            | TypeKind::Int32
            | TypeKind::Float => 4,
            TypeKind::Int64 | TypeKind::Double | TypeKind::Map => 8,
            TypeKind::Int128
            | TypeKind::Int256
            | TypeKind::String
            | TypeKind::Account
            | TypeKind::Struct
            | TypeKind::Object
            | TypeKind::Cursor
            | TypeKind::Tuple => 4,
        }
    }

    /// Bytes the compiler's host representation of a value uses.
    pub fn host_size(self) -> u32 {
        match self {
            TypeKind::None | TypeKind::Void | TypeKind::Tuple => 0,
            TypeKind::Bool | TypeKind::Byte | TypeKind::Int8 => 1,
            TypeKind::Int16 => 2,
            TypeKind::Int32 | TypeKind::Float => 4,
            TypeKind::Int64 | TypeKind::Double => 8,
            TypeKind::Int128
            | TypeKind::Int256
            | TypeKind::String
            | TypeKind::Account
            | TypeKind::Struct
            | TypeKind::Map
            | TypeKind::Object
            | TypeKind::Cursor => 4,
        }
    }

    /// The WebAssembly register type a value of this tag travels in, or
    /// `None` for the empty types.
    ///
    /// Scalars wider than 64 bits and all aggregates travel as `i32`
    /// pointers; map handles are opaque `i64` values.
    pub fn value_type(self) -> Option<ValueType> {
        match self {
            TypeKind::None | TypeKind::Void => None,
            TypeKind::Bool
            | TypeKind::Byte
            | TypeKind::Int8
            | TypeKind::Int16
            | TypeKind::Int32 => Some(ValueType::I32),
            TypeKind::Int64 | TypeKind::Map => Some(ValueType::I64),
            TypeKind::Float => Some(ValueType::F32),
            TypeKind::Double => Some(ValueType::F64),
            TypeKind::Int128
            | TypeKind::Int256
            | TypeKind::String
            | TypeKind::Account
            | TypeKind::Struct
            | TypeKind::Object
            | TypeKind::Cursor
            | TypeKind::Tuple => Some(ValueType::I32),
        }
    }

    /// Whether values of this tag are represented by a linear-memory or host
    /// pointer rather than an immediate register value.
    pub fn is_by_address(self) -> bool {
        matches!(
            self,
            TypeKind::Int128
                | TypeKind::Int256
                | TypeKind::String
                | TypeKind::Account
                | TypeKind::Struct
                | TypeKind::Object
                | TypeKind::Cursor
                | TypeKind::Tuple
        )
    }

    /// Whether arithmetic on this tag lowers to host big-integer calls.
    pub fn is_big_integer(self) -> bool {
        matches!(self, TypeKind::Int128 | TypeKind::Int256)
    }

    /// Whether the unsigned flavor of division, remainder, shift, and
    /// comparison applies.
    pub fn is_unsigned(self) -> bool {
        matches!(self, TypeKind::Bool | TypeKind::Byte)
    }

    /// The linear-memory alignment of the tag, 4 or 8.
    pub fn alignment(self) -> u32 {
        match self.memory_size() {
            8 => 8,
            _ => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every lookup is total and stable over the whole tag universe.
    #[test]
    fn lookups_are_total() {
        for kind in TypeKind::ALL {
            assert!(!kind.name().is_empty());
            assert_eq!(kind.memory_size(), kind.memory_size());
            assert_eq!(kind.host_size(), kind.host_size());
            assert_eq!(kind.value_type(), kind.value_type());
            assert!(matches!(kind.alignment(), 4 | 8));
        }
    }

    #[test]
    fn register_widths_match_the_abi() {
        assert_eq!(TypeKind::Bool.value_type(), Some(ValueType::I32));
        assert_eq!(TypeKind::Int64.value_type(), Some(ValueType::I64));
        assert_eq!(TypeKind::Float.value_type(), Some(ValueType::F32));
        assert_eq!(TypeKind::Double.value_type(), Some(ValueType::F64));
        assert_eq!(TypeKind::Map.value_type(), Some(ValueType::I64));
        assert_eq!(TypeKind::Int256.value_type(), Some(ValueType::I32));
        assert_eq!(TypeKind::None.value_type(), None);
    }

    #[test]
    fn by_address_types_occupy_one_pointer() {
        for kind in TypeKind::ALL.into_iter().filter(|k| k.is_by_address()) {
            assert_eq!(kind.memory_size(), 4, "{}", kind.name());
            assert_eq!(kind.value_type(), Some(ValueType::I32), "{}", kind.name());
        }
    }

    #[test]
    fn memory_sizes_are_bit_exact() {
        let table = [
            (TypeKind::Bool, 4),
            (TypeKind::Byte, 4),
            (TypeKind::Int8, 4),
            (TypeKind::Int16, 4),
            (TypeKind::Int32, 4),
            (TypeKind::Int64, 8),
            (TypeKind::Map, 8),
            (TypeKind::Float, 4),
            (TypeKind::Double, 8),
            (TypeKind::Int128, 4),
            (TypeKind::Int256, 4),
            (TypeKind::String, 4),
            (TypeKind::Account, 4),
            (TypeKind::Struct, 4),
            (TypeKind::Object, 4),
            (TypeKind::Cursor, 4),
            (TypeKind::Tuple, 4),
            (TypeKind::Void, 0),
            (TypeKind::None, 0),
        ];

        for (kind, size) in table {
            assert_eq!(kind.memory_size(), size, "{}", kind.name());
        }
    }
}
