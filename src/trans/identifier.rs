//! The layout policy: where each identifier lives at runtime.

use crate::ast::{Expression, Identifier};
use crate::ir::HEAP_BASE;
use crate::trans::{Location, Transformer};

impl Transformer<'_> {
    /// Assigns a concrete slot to a function-scoped identifier.
    ///
    /// Register-width values get a WebAssembly local; arrays and structs get
    /// addressable memory in the function's frame heap.
    pub(crate) fn place(&mut self, identifier: &Identifier) {
        let location = if identifier.meta.fits_register() {
            let kind = identifier
                .meta
                .value_type()
                .expect("locals have a register type");

            Location::Local(self.function.add_register(kind))
        } else {
            let offset = self
                .function
                .add_heap(identifier.meta.memory_size(), identifier.meta.alignment());

            Location::Frame { offset }
        };

        self.locations.insert(identifier.uid, location);
    }

    /// The address-carrying form of an identifier reference.
    pub(crate) fn reference(&mut self, identifier: &Identifier) -> Expression {
        let location = self
            .locations
            .get(&identifier.uid)
            .unwrap_or_else(|| panic!("unresolved identifier `{}`", identifier.name));

        match location {
            Location::Global(name) => Expression::Global {
                name: name.clone(),
                meta: identifier.meta.clone(),
            },
            Location::Local(index) => Expression::Local {
                index: *index,
                meta: identifier.meta.clone(),
            },
            Location::Frame { offset } => Expression::Stack {
                base: HEAP_BASE,
                addend: *offset,
                offset: 0,
                meta: identifier.meta.clone(),
            },
        }
    }
}
