//! Per-function frame: registers, basic blocks, heap and stack slots.

use crate::ast;
use crate::ast::align_up;
use crate::ir::{Abi, BasicBlock, BlockId};
use crate::wasm::ValueType;

/// Local index of the contract address parameter.
pub const CONTRACT_ADDRESS: u32 = 0;
/// Local index of the frame's heap base address.
pub const HEAP_BASE: u32 = 1;
/// Local index of the frame's scratch-stack base address.
pub const STACK_BASE: u32 = 2;
/// Local index of the relooper state variable.
pub const RELOOPER: u32 = 3;
/// User-visible allocation starts past the reserved slots.
pub const RESERVED_LOCALS: u32 = 4;

/// The bounded length of a mangled internal function name.
pub const MANGLED_NAME_MAX: usize = 258;

/// A function under construction: its ABI, block arena, and frame counters.
///
/// Blocks live in an arena addressed by [`BlockId`]; `commit_block`
/// establishes the emission order and is idempotent, so lowering can close a
/// block wherever control last touches it.
#[derive(Debug)]
pub struct Function {
    name: String,
    export_name: Option<String>,
    abi: Abi,
    blocks: Vec<BasicBlock>,
    order: Vec<BlockId>,
    entry: BlockId,
    exit: BlockId,
    registers: Vec<ValueType>,
    heap_usage: u32,
    stack_usage: u32,
    return_size: u32,
}

impl Function {
    /// Creates an empty function for the given source function: entry and
    /// exit blocks, reserved locals, and the mangled internal name
    /// `"<contract>$<function>"` truncated to the bounded length.
    pub fn new(contract: &str, function: &ast::Function) -> Self {
        let abi = Abi::internal(&mangle(contract, &function.name), function);
        let export_name = function
            .modifiers
            .is_public()
            .then(|| function.name.clone());
        let return_size = if abi.returns_by_pointer() {
            let returns = function.returns.iter().map(|r| r.meta.clone()).collect();
            crate::ast::Meta::tuple(returns).memory_size()
        } else {
            0
        };

        let mut this = Function {
            name: abi.name().to_string(),
            export_name,
            abi,
            blocks: Vec::new(),
            order: Vec::new(),
            entry: BlockId(0),
            exit: BlockId(0),
            registers: Vec::new(),
            heap_usage: 0,
            stack_usage: 0,
            return_size,
        };

        this.entry = this.new_block();
        this.exit = this.new_block();
        this.commit_block(this.entry);

        this
    }

    /// Allocates a fresh block in the arena.
    /// The block is not part of the emission order until committed.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id));
        id
    }

    /// Appends the block to the emission order; re-adding is a no-op.
    pub fn commit_block(&mut self, id: BlockId) {
        if !self.order.contains(&id) {
            self.order.push(id);
        }
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    /// Appends a register of the given type; returns its local index.
    /// Indices continue after the function's parameters.
    pub fn add_register(&mut self, kind: ValueType) -> u32 {
        self.registers.push(kind);
        self.abi.parameters().len() as u32 + self.registers.len() as u32 - 1
    }

    /// Advances the heap high-water mark by `size` rounded up to
    /// `alignment` and returns the pre-increment offset.
    pub fn add_heap(&mut self, size: u32, alignment: u32) -> u32 {
        let offset = self.heap_usage;
        self.heap_usage += align_up(size, alignment);
        offset
    }

    /// Advances the scratch-stack high-water mark by `size` rounded up to
    /// `alignment` and returns the pre-increment offset.
    pub fn add_stack(&mut self, size: u32, alignment: u32) -> u32 {
        let offset = self.stack_usage;
        self.stack_usage += align_up(size, alignment);
        offset
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unmangled name the function is exported under, if public.
    pub fn export_name(&self) -> Option<&str> {
        self.export_name.as_deref()
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    /// Committed blocks in emission order.
    pub fn order(&self) -> &[BlockId] {
        &self.order
    }

    /// Register types beyond the parameters.
    pub fn registers(&self) -> &[ValueType] {
        &self.registers
    }

    pub fn heap_usage(&self) -> u32 {
        self.heap_usage
    }

    pub fn stack_usage(&self) -> u32 {
        self.stack_usage
    }

    /// The whole frame: per-call heap plus scratch stack.
    pub fn frame_size(&self) -> u32 {
        self.heap_usage + self.stack_usage
    }

    /// Bytes of the caller-owned return buffer, when returning by pointer.
    pub fn return_size(&self) -> u32 {
        self.return_size
    }

    /// Drops committed blocks unreachable from the entry.
    /// Lowering leaves continuation blocks behind unconditional breaks and
    /// gotos; they carry no code a caller could reach. The exit block is
    /// always kept.
    pub(crate) fn prune_unreachable(&mut self) {
        let mut reachable = vec![false; self.blocks.len()];
        let mut worklist = vec![self.entry];

        while let Some(id) = worklist.pop() {
            if std::mem::replace(&mut reachable[id.index()], true) {
                continue;
            }

            for branch in self.block(id).branches() {
                worklist.push(branch.target);
            }
        }

        let exit = self.exit;
        self.order
            .retain(|id| reachable[id.index()] || *id == exit);
    }
}

/// Mangles `"<contract>$<function>"`, truncated to the bounded name length.
pub(crate) fn mangle(contract: &str, function: &str) -> String {
    let mut name = format!("{contract}${function}");

    if name.len() > MANGLED_NAME_MAX {
        let mut end = MANGLED_NAME_MAX;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Identifier, Meta, Modifiers, StorageClass};
    use crate::types::TypeKind;
    use quickcheck_macros::quickcheck;
    use std::rc::Rc;

    fn empty_function(name: &str) -> ast::Function {
        ast::Function::new(name, Modifiers::default(), vec![], vec![], Block::default())
    }

    fn function_with_params(count: usize) -> ast::Function {
        let parameters = (0..count)
            .map(|uid| {
                Rc::new(Identifier::new(
                    uid as u32 + 1,
                    "p",
                    Meta::scalar(TypeKind::Int32),
                    StorageClass::Param,
                ))
            })
            .collect();

        ast::Function::new("f", Modifiers::default(), parameters, vec![], Block::default())
    }

    #[test]
    fn names_are_mangled_and_bounded() {
        let function = Function::new("counter", &empty_function("add"));
        assert_eq!(function.name(), "counter$add");

        let long = "x".repeat(MANGLED_NAME_MAX * 2);
        let function = Function::new(&long, &empty_function("add"));
        assert_eq!(function.name().len(), MANGLED_NAME_MAX);
    }

    #[test]
    fn local_functions_are_not_exported() {
        let mut source = empty_function("helper");
        source.modifiers = Modifiers::LOCAL;

        assert_eq!(Function::new("c", &source).export_name(), None);
        assert_eq!(
            Function::new("c", &empty_function("run")).export_name(),
            Some("run")
        );
    }

    #[test]
    fn registers_continue_after_parameters() {
        let mut function = Function::new("c", &function_with_params(1));

        // four reserved slots, one parameter, then allocated registers.
        assert_eq!(function.add_register(ValueType::I32), 5);
        assert_eq!(function.add_register(ValueType::I64), 6);
        assert_eq!(function.registers(), &[ValueType::I32, ValueType::I64]);
    }

    #[test]
    fn committing_a_block_twice_is_a_no_op() {
        let mut function = Function::new("c", &empty_function("f"));
        let block = function.new_block();

        function.commit_block(block);
        function.commit_block(block);
        function.commit_block(function.exit());

        assert_eq!(function.order().len(), 3);
    }

    #[test]
    fn slot_offsets_are_pre_increment_and_aligned() {
        let mut function = Function::new("c", &empty_function("f"));

        assert_eq!(function.add_heap(6, 4), 0);
        assert_eq!(function.add_heap(8, 8), 8);
        assert_eq!(function.heap_usage(), 16);

        assert_eq!(function.add_stack(4, 4), 0);
        assert_eq!(function.add_stack(12, 8), 4);
        assert_eq!(function.stack_usage(), 20);
    }

    /// Usage counters never decrease and equal the sum of aligned sizes.
    #[quickcheck]
    fn slot_usage_is_monotonic(sizes: Vec<(u16, bool)>) -> bool {
        let mut function = Function::new("c", &empty_function("f"));
        let mut previous = 0;
        let mut total = 0u32;

        for (size, wide) in sizes {
            let alignment = if wide { 8 } else { 4 };
            function.add_heap(u32::from(size), alignment);
            total += align_up(u32::from(size), alignment);

            if function.heap_usage() < previous {
                return false;
            }
            previous = function.heap_usage();
        }

        function.heap_usage() == total
    }
}
