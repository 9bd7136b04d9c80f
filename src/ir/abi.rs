//! Function signature descriptors.

use crate::ast;
use crate::ir::RESERVED_LOCALS;
use crate::wasm::{FunctionType, ValueType};

/// The WebAssembly-level signature of a function.
///
/// Internal functions prepend four `i32` frame parameters (contract address,
/// heap base, stack base, relooper scratch). A function returning a tuple or
/// a by-address value takes a trailing `i32` pointer to a caller-owned
/// return buffer and yields no direct result.
#[derive(Clone, Debug)]
pub struct Abi {
    module: Option<String>,
    name: String,
    parameters: Vec<ValueType>,
    result: Option<ValueType>,
    returns_by_pointer: bool,
    signature: FunctionType,
}

impl Abi {
    /// Builds the descriptor for an internal contract function.
    pub fn internal(name: &str, function: &ast::Function) -> Self {
        let mut parameters = vec![ValueType::I32; RESERVED_LOCALS as usize];

        for parameter in &function.parameters {
            let kind = parameter
                .meta
                .value_type()
                .expect("parameters have a register type");
            parameters.push(kind);
        }

        let mut result = None;
        let mut returns_by_pointer = false;

        match function.returns.as_slice() {
            [] => {}
            [single] if !single.meta.kind().is_by_address() && !single.meta.is_array() => {
                result = single.meta.value_type();
            }
            _ => {
                returns_by_pointer = true;
                parameters.push(ValueType::I32);
            }
        }

        let results = result.into_iter().collect();
        let signature = FunctionType::new(parameters.clone(), results);

        Abi {
            module: None,
            name: name.to_string(),
            parameters,
            result,
            returns_by_pointer,
            signature,
        }
    }

    /// The import namespace, or `None` for functions defined in the module.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types, including the frame parameters and any trailing
    /// return pointer.
    pub fn parameters(&self) -> &[ValueType] {
        &self.parameters
    }

    /// The single direct result, if any.
    pub fn result(&self) -> Option<ValueType> {
        self.result
    }

    /// Whether the caller passes a return-buffer pointer as the last
    /// parameter.
    pub fn returns_by_pointer(&self) -> bool {
        self.returns_by_pointer
    }

    /// The local index of the return-buffer pointer parameter.
    pub fn return_pointer(&self) -> Option<u32> {
        if self.returns_by_pointer {
            Some(self.parameters.len() as u32 - 1)
        } else {
            None
        }
    }

    /// The constructed WebAssembly signature.
    pub fn signature(&self) -> &FunctionType {
        &self.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Function, Identifier, Meta, Modifiers, StorageClass};
    use crate::types::TypeKind;
    use std::rc::Rc;

    fn param(uid: u32, kind: TypeKind) -> Rc<Identifier> {
        Rc::new(Identifier::new(
            uid,
            "p",
            Meta::scalar(kind),
            StorageClass::Param,
        ))
    }

    fn ret(uid: u32, kind: TypeKind) -> Rc<Identifier> {
        Rc::new(Identifier::new(
            uid,
            "r",
            Meta::scalar(kind),
            StorageClass::Return,
        ))
    }

    #[test]
    fn scalar_returns_are_direct() {
        let function = Function::new(
            "f",
            Modifiers::default(),
            vec![param(1, TypeKind::Int32), param(2, TypeKind::Int64)],
            vec![ret(3, TypeKind::Int32)],
            Block::default(),
        );
        let abi = Abi::internal("c$f", &function);

        assert_eq!(
            abi.parameters(),
            &[
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I32,
                ValueType::I64,
            ]
        );
        assert_eq!(abi.result(), Some(ValueType::I32));
        assert!(!abi.returns_by_pointer());
    }

    #[test]
    fn tuple_returns_take_a_pointer() {
        let function = Function::new(
            "f",
            Modifiers::default(),
            vec![],
            vec![ret(1, TypeKind::Int32), ret(2, TypeKind::Int32)],
            Block::default(),
        );
        let abi = Abi::internal("c$f", &function);

        assert_eq!(abi.parameters().len(), RESERVED_LOCALS as usize + 1);
        assert_eq!(abi.result(), None);
        assert_eq!(abi.return_pointer(), Some(4));
    }

    #[test]
    fn by_address_returns_take_a_pointer() {
        let function = Function::new(
            "f",
            Modifiers::default(),
            vec![],
            vec![ret(1, TypeKind::String)],
            Block::default(),
        );
        let abi = Abi::internal("c$f", &function);

        assert!(abi.returns_by_pointer());
        assert_eq!(abi.result(), None);
    }
}
