//! The `env` import vocabulary: host primitives every emitted module links
//! against.
//!
//! Maps, big integers, strings, and accounts live behind opaque handles owned
//! by the host runtime; the compiler only moves the handles around. Map keys
//! and values travel widened to `i64` so a single signature covers every
//! register-width key/value type.

use crate::wasm::ValueType;

/// The import module namespace.
pub const MODULE: &str = "env";

/// A host primitive callable from generated code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HostFn {
    MapNew,
    MapGet,
    MapSet,
    MapDel,
    BigIntAdd,
    BigIntSub,
    BigIntMul,
    BigIntDiv,
    BigIntMod,
    BigIntNeg,
    BigIntCmp,
    BigIntFromString,
    StringConcat,
    StringCmp,
    AccountBalance,
    ContractAddress,
    HeapAlloc,
    Abort,
    Assert,
}

impl HostFn {
    /// Every host primitive, in import order.
    pub const ALL: [HostFn; 19] = [
        HostFn::MapNew,
        HostFn::MapGet,
        HostFn::MapSet,
        HostFn::MapDel,
        HostFn::BigIntAdd,
        HostFn::BigIntSub,
        HostFn::BigIntMul,
        HostFn::BigIntDiv,
        HostFn::BigIntMod,
        HostFn::BigIntNeg,
        HostFn::BigIntCmp,
        HostFn::BigIntFromString,
        HostFn::StringConcat,
        HostFn::StringCmp,
        HostFn::AccountBalance,
        HostFn::ContractAddress,
        HostFn::HeapAlloc,
        HostFn::Abort,
        HostFn::Assert,
    ];

    /// The import name within the `env` namespace.
    pub fn name(self) -> &'static str {
        match self {
            HostFn::MapNew => "map.new",
            HostFn::MapGet => "map.get",
            HostFn::MapSet => "map.set",
            HostFn::MapDel => "map.del",
            HostFn::BigIntAdd => "bigint.add",
            HostFn::BigIntSub => "bigint.sub",
            HostFn::BigIntMul => "bigint.mul",
            HostFn::BigIntDiv => "bigint.div",
            HostFn::BigIntMod => "bigint.mod",
            HostFn::BigIntNeg => "bigint.neg",
            HostFn::BigIntCmp => "bigint.cmp",
            HostFn::BigIntFromString => "bigint.from_string",
            HostFn::StringConcat => "string.concat",
            HostFn::StringCmp => "string.cmp",
            HostFn::AccountBalance => "account.balance",
            HostFn::ContractAddress => "contract.address",
            HostFn::HeapAlloc => "heap.alloc",
            HostFn::Abort => "abort",
            HostFn::Assert => "assert",
        }
    }

    /// The parameter types of the import's signature.
    pub fn parameters(self) -> &'static [ValueType] {
        use ValueType::{I32, I64};

        match self {
            HostFn::MapNew => &[I32, I32],
            HostFn::MapGet | HostFn::MapDel => &[I64, I64],
            HostFn::MapSet => &[I64, I64, I64],
            HostFn::BigIntAdd
            | HostFn::BigIntSub
            | HostFn::BigIntMul
            | HostFn::BigIntDiv
            | HostFn::BigIntMod
            | HostFn::BigIntCmp
            | HostFn::StringConcat
            | HostFn::StringCmp => &[I32, I32],
            HostFn::BigIntNeg | HostFn::BigIntFromString => &[I32],
            HostFn::AccountBalance => &[I32],
            HostFn::ContractAddress => &[],
            HostFn::HeapAlloc => &[I32],
            HostFn::Abort => &[I32],
            HostFn::Assert => &[I32, I32],
        }
    }

    /// The result type of the import's signature, if any.
    pub fn result(self) -> Option<ValueType> {
        use ValueType::{I32, I64};

        match self {
            HostFn::MapNew => Some(I64),
            HostFn::MapGet => Some(I64),
            HostFn::MapSet | HostFn::MapDel => None,
            HostFn::BigIntAdd
            | HostFn::BigIntSub
            | HostFn::BigIntMul
            | HostFn::BigIntDiv
            | HostFn::BigIntMod
            | HostFn::BigIntNeg
            | HostFn::BigIntFromString => Some(I32),
            HostFn::BigIntCmp | HostFn::StringCmp => Some(I32),
            HostFn::StringConcat => Some(I32),
            HostFn::AccountBalance => Some(I64),
            HostFn::ContractAddress => Some(I32),
            HostFn::HeapAlloc => Some(I32),
            HostFn::Abort | HostFn::Assert => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_names_are_unique() {
        for (index, host) in HostFn::ALL.iter().enumerate() {
            for other in &HostFn::ALL[index + 1..] {
                assert_ne!(host.name(), other.name());
            }
        }
    }

    #[test]
    fn map_primitives_use_widened_values() {
        assert_eq!(HostFn::MapSet.parameters(), &[ValueType::I64; 3]);
        assert_eq!(HostFn::MapGet.result(), Some(ValueType::I64));
    }
}
