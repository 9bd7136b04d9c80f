//! Lowering from the resolved AST to the control-flow-graph IR.
//!
//! Each function is rewritten into basic blocks with guarded branches; every
//! identifier reference becomes one of the address-carrying expression forms.
//! Lowering never mutates the AST: blocks own their lowered statements.

mod expression;
mod identifier;
mod statement;

use crate::ast;
use crate::ast::{Block, Identifier, Meta, Modifiers, StorageClass};
use crate::error::{CompileError, Diagnostics, ErrorKind};
use crate::ir;
use crate::ir::{mangle, BlockId, RESERVED_LOCALS};
use std::collections::HashMap;
use std::rc::Rc;

/// The internal name of the synthetic constructor holding global
/// initializers. The leading dot keeps it out of the source namespace.
const CONSTRUCTOR: &str = ".ctor";

/// Where lowering placed a variable.
#[derive(Clone, Debug)]
pub(crate) enum Location {
    /// A module global, by exported name.
    Global(String),
    /// A WebAssembly local, by index.
    Local(u32),
    /// A slot in the function's frame heap, addressed off the heap base.
    Frame { offset: u32 },
}

/// Lowers a whole contract: every function plus the synthetic constructor
/// for its state variables.
pub fn contract(source: &ast::Contract) -> Result<ir::Module, CompileError> {
    let mut diagnostics = Diagnostics::new();
    let mut global_locations = HashMap::new();
    let mut globals = Vec::new();
    let mut constructor_statements = Vec::new();

    for global in &source.globals {
        if !global.meta.fits_register() {
            // aggregate contract state would need static placement; only
            // register-width state (scalars, strings, maps) is accepted.
            diagnostics.report(ErrorKind::NotSupported, global.position);
            continue;
        }

        let kind = global
            .meta
            .value_type()
            .expect("globals have a register type");

        globals.push(ir::GlobalVariable {
            name: global.name.clone(),
            kind,
        });
        global_locations.insert(global.uid, Location::Global(global.name.clone()));

        let initializer = match &global.initializer {
            Some(initializer) => Some(initializer.clone()),
            None if global.meta.is_map() => Some(expression::map_new(&global.meta)),
            None => None,
        };

        if let Some(initializer) = initializer {
            constructor_statements.push(ast::Statement::new(
                ast::StatementKind::Assign {
                    lhs: ast::Expression::Id {
                        id: Rc::clone(global),
                        position: global.position,
                    },
                    rhs: initializer,
                },
                global.position,
            ));
        }
    }

    let mut functions = Vec::new();
    let mut positions = Vec::new();

    for function in &source.functions {
        log::trace!("lowering function `{}`", function.name);

        functions.push(
            Transformer::new(&source.name, function, &global_locations, &mut diagnostics)
                .run(function),
        );
        positions.push(function.position);
    }

    let constructor = if constructor_statements.is_empty() {
        None
    } else {
        let body = Block::of(constructor_statements);
        let function = ast::Function::new(CONSTRUCTOR, Modifiers::LOCAL, vec![], vec![], body);

        functions.push(
            Transformer::new(&source.name, &function, &global_locations, &mut diagnostics)
                .run(&function),
        );
        positions.push(source.position);

        Some(functions.len() - 1)
    };

    // internal names must stay injective after truncation.
    for (index, function) in functions.iter().enumerate() {
        let collides = functions[..index]
            .iter()
            .any(|earlier| earlier.name() == function.name());

        if collides {
            diagnostics.report(ErrorKind::DuplicateFunctionName, positions[index]);
        }
    }

    diagnostics.finish()?;

    Ok(ir::Module {
        contract: source.name.clone(),
        globals,
        functions,
        constructor,
    })
}

/// Per-function lowering context.
pub(crate) struct Transformer<'a> {
    contract: &'a str,
    function: ir::Function,
    /// The block statements are currently appended to; `None` right after a
    /// terminator.
    block: Option<BlockId>,
    /// Branch target of `continue`, inside a loop.
    continue_block: Option<BlockId>,
    /// Branch target of `break`, inside a loop or switch.
    break_block: Option<BlockId>,
    locations: HashMap<u32, Location>,
    labels: HashMap<String, BlockId>,
    /// Return slot metas, for the return-area layout.
    returns: Vec<Meta>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Transformer<'a> {
    pub(crate) fn new(
        contract: &'a str,
        function: &ast::Function,
        globals: &HashMap<u32, Location>,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        let lowered = ir::Function::new(contract, function);
        let mut locations = globals.clone();

        for (index, parameter) in function.parameters.iter().enumerate() {
            locations.insert(
                parameter.uid,
                Location::Local(RESERVED_LOCALS + index as u32),
            );
        }

        Transformer {
            contract,
            block: Some(lowered.entry()),
            continue_block: None,
            break_block: None,
            locations,
            labels: HashMap::new(),
            returns: function.returns.iter().map(|r| r.meta.clone()).collect(),
            diagnostics,
            function: lowered,
        }
    }

    /// Lowers the function body and finalizes the graph.
    pub(crate) fn run(mut self, source: &ast::Function) -> ir::Function {
        self.collect_labels(&source.body);
        self.block(&source.body);

        // fall-through path into the epilogue.
        if let Some(block) = self.block {
            let exit = self.function.exit();
            self.function.block_mut(block).add_branch(None, exit);
            self.function.commit_block(block);
        }

        let exit = self.function.exit();
        self.function
            .block_mut(exit)
            .add_statement(ir::Statement::Return(None));
        self.function.commit_block(exit);

        self.function.prune_unreachable();

        log::trace!(
            "function `{}`: {} blocks, heap {} bytes, stack {} bytes",
            self.function.name(),
            self.function.order().len(),
            self.function.heap_usage(),
            self.function.stack_usage()
        );

        self.function
    }

    /// Lowers a block: declared identifiers first, then statements.
    pub(crate) fn block(&mut self, block: &Block) {
        for identifier in &block.identifiers {
            self.declare(identifier);
        }

        for statement in &block.statements {
            self.statement(statement);
        }
    }

    /// The mangled internal name of a contract function.
    pub(crate) fn mangled(&self, function: &str) -> String {
        mangle(self.contract, function)
    }

    /// Pre-allocates a block for every labeled statement so `goto` can
    /// branch forward.
    fn collect_labels(&mut self, block: &Block) {
        for statement in &block.statements {
            self.collect_statement_labels(statement);
        }
    }

    fn collect_statement_labels(&mut self, statement: &ast::Statement) {
        if let Some(label) = &statement.label {
            let block = self.function.new_block();
            self.labels.insert(label.clone(), block);
        }

        match &statement.kind {
            ast::StatementKind::If {
                then,
                elifs,
                otherwise,
                ..
            } => {
                self.collect_labels(then);
                for (_, block) in elifs {
                    self.collect_labels(block);
                }
                if let Some(block) = otherwise {
                    self.collect_labels(block);
                }
            }
            ast::StatementKind::Loop { init, body, .. } => {
                if let Some(init) = init {
                    self.collect_statement_labels(init);
                }
                self.collect_labels(body);
            }
            ast::StatementKind::Switch { cases } => {
                for case in cases {
                    for statement in &case.statements {
                        self.collect_statement_labels(statement);
                    }
                }
            }
            ast::StatementKind::Block(block) => self.collect_labels(block),
            _ => {}
        }
    }

    /// The block statements are currently flowing into, creating one if the
    /// previous statement terminated.
    pub(crate) fn current(&mut self) -> BlockId {
        match self.block {
            Some(block) => block,
            None => {
                let block = self.function.new_block();
                self.block = Some(block);
                block
            }
        }
    }

    /// Appends a lowered statement to the current block, flushing any
    /// deferred piggyback statements first.
    pub(crate) fn emit(&mut self, statement: ir::Statement) {
        self.flush_piggybacks();

        let block = self.current();
        self.function.block_mut(block).add_statement(statement);
    }

    /// Flushes piggyback statements produced by expression lowering into the
    /// current block, in order.
    pub(crate) fn flush_piggybacks(&mut self) {
        let block = self.current();
        let block = self.function.block_mut(block);

        if block.has_piggyback() {
            for statement in block.take_piggybacks() {
                block.add_statement(statement);
            }
        }
    }

    /// Defers a statement until the enclosing statement completes.
    pub(crate) fn piggyback(&mut self, statement: ir::Statement) {
        let block = self.current();
        self.function.block_mut(block).piggyback(statement);
    }

    pub(crate) fn report(&mut self, kind: ErrorKind, position: ast::Position) {
        self.diagnostics.report(kind, position);
    }

    /// Allocates a slot for a block-scoped identifier and lowers its
    /// initializer.
    fn declare(&mut self, identifier: &Rc<Identifier>) {
        debug_assert_eq!(identifier.storage, StorageClass::Local);

        self.place(identifier);

        let initializer = match &identifier.initializer {
            Some(initializer) => Some(initializer.clone()),
            None if identifier.meta.is_map() => Some(expression::map_new(&identifier.meta)),
            None => None,
        };

        if let Some(initializer) = initializer {
            let target = self.reference(identifier);
            let value = self.rvalue(&initializer);
            self.emit(ir::Statement::Assign { target, value });
        }
    }
}
