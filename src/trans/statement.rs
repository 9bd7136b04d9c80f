//! Statement lowering: structured control flow into blocks and branches.

use crate::ast::{Case, Expression, LoopKind, Statement, StatementKind};
use crate::error::ErrorKind;
use crate::host::HostFn;
use crate::ir;
use crate::ast::{CallTarget, Meta, Position};
use crate::trans::Transformer;
use crate::types::TypeKind;

impl Transformer<'_> {
    /// Lowers one statement into the current block.
    ///
    /// A labeled statement first closes the current block into the label's
    /// pre-allocated block so `goto` edges land on a block boundary.
    pub(crate) fn statement(&mut self, statement: &Statement) {
        if let Some(label) = &statement.label {
            let target = *self
                .labels
                .get(label)
                .unwrap_or_else(|| panic!("unresolved label `{label}`"));

            if let Some(block) = self.block {
                self.function.block_mut(block).add_branch(None, target);
                self.function.commit_block(block);
            }

            self.block = Some(target);
        } else {
            self.current();
        }

        match &statement.kind {
            StatementKind::Null => {}
            StatementKind::Expression(expression) => self.expression_statement(expression),
            StatementKind::Assign { lhs, rhs } => self.assign(lhs, rhs, statement.position),
            StatementKind::If {
                condition,
                then,
                elifs,
                otherwise,
            } => self.branch(condition, then, elifs, otherwise.as_ref()),
            StatementKind::Loop { kind, init, body } => match kind {
                LoopKind::For => self.for_loop(init.as_deref(), body),
                LoopKind::Array => self.report(ErrorKind::NotSupported, statement.position),
            },
            StatementKind::Switch { cases } => self.switch(cases),
            StatementKind::Return { value } => self.ret(value.as_ref()),
            StatementKind::Continue => self.cont(),
            StatementKind::Break { condition } => self.brk(condition.as_ref()),
            StatementKind::Goto { label } => self.goto(label),
            StatementKind::Ddl { text } => self.emit(ir::Statement::Ddl(text.clone())),
            StatementKind::Block(block) => self.block(block),
        }
    }

    /// Only calls carry observable effects worth keeping; anything else just
    /// flushes the statements its lowering piggybacked.
    fn expression_statement(&mut self, expression: &Expression) {
        let lowered = self.rvalue(expression);

        if lowered.is_call() {
            self.emit(ir::Statement::Expression(lowered));
        } else {
            self.flush_piggybacks();
        }
    }

    fn assign(&mut self, lhs: &Expression, rhs: &Expression, position: Position) {
        // a map write folds the target and value into one host call.
        if let Expression::Index { value, index, .. } = lhs {
            if value.meta().is_map() {
                self.check_map(value.meta(), position);

                let map = self.rvalue(value);
                let key = self.rvalue(index);
                let stored = self.rvalue(rhs);

                let call = Expression::Call {
                    target: CallTarget::Host(HostFn::MapSet),
                    arguments: vec![map, key, stored],
                    meta: Meta::scalar(TypeKind::Void),
                    position,
                };
                self.emit(ir::Statement::Expression(call));
                return;
            }
        }

        // whole-struct and whole-array assignment would need a member-wise
        // copy.
        if lhs.meta().is_array() || lhs.meta().kind() == TypeKind::Struct {
            self.report(ErrorKind::NotSupported, position);
            return;
        }

        let target = self.lvalue(lhs);
        let value = self.rvalue(rhs);

        match target {
            Expression::Tuple {
                elements: targets, ..
            } => {
                let Expression::Tuple {
                    elements: values, ..
                } = value
                else {
                    panic!("tuple assignment from a non-tuple value");
                };

                self.destructure(targets, values);
            }
            target => self.emit(ir::Statement::Assign { target, value }),
        }
    }

    /// Pairwise tuple assignment. With fewer values than targets, each
    /// tuple-typed value is flattened one level and consumed element for
    /// element; every target consumes exactly one value slot.
    fn destructure(&mut self, targets: Vec<Expression>, values: Vec<Expression>) {
        if targets.len() == values.len() {
            for (target, value) in targets.into_iter().zip(values) {
                debug_assert_eq!(target.meta().kind(), value.meta().kind());
                self.emit(ir::Statement::Assign { target, value });
            }
            return;
        }

        assert!(
            targets.len() > values.len(),
            "more values than targets in tuple assignment"
        );

        let mut targets = targets.into_iter();

        for value in values {
            if let Expression::Tuple { elements, .. } = value {
                for element in elements {
                    let target = targets.next().expect("a target per flattened element");
                    debug_assert_eq!(target.meta().kind(), element.meta().kind());
                    self.emit(ir::Statement::Assign {
                        target,
                        value: element,
                    });
                }
            } else {
                let target = targets.next().expect("a target per value");
                debug_assert_eq!(target.meta().kind(), value.meta().kind());
                self.emit(ir::Statement::Assign { target, value });
            }
        }

        assert!(
            targets.next().is_none(),
            "tuple assignment left targets unconsumed"
        );
    }

    /// The if/else-if/else diamond:
    ///
    /// ```text
    ///         .---------------------------.
    ///         |         previous          |
    ///         '---------------------------'
    ///         /           / \              \
    ///  .------. .---------. .---------.     .------.
    ///  |  if  | | else if | | else if | ... | else |
    ///  '------' '---------' '---------'     '------'
    ///         \           \ /              /
    ///         .---------------------------.
    ///         |           next            |
    ///         '---------------------------'
    /// ```
    fn branch(
        &mut self,
        condition: &Expression,
        then: &crate::ast::Block,
        elifs: &[(Expression, crate::ast::Block)],
        otherwise: Option<&crate::ast::Block>,
    ) {
        let previous = self.current();
        let next = self.function.new_block();

        self.function.commit_block(previous);

        let guard = self.rvalue(condition);
        self.flush_piggybacks();

        let arm = self.function.new_block();
        self.function
            .block_mut(previous)
            .add_branch(Some(guard), arm);
        self.block = Some(arm);
        self.block(then);
        self.close_into(next);

        for (condition, block) in elifs {
            self.block = Some(previous);
            let guard = self.rvalue(condition);
            self.flush_piggybacks();

            let arm = self.function.new_block();
            self.function
                .block_mut(previous)
                .add_branch(Some(guard), arm);
            self.block = Some(arm);
            self.block(block);
            self.close_into(next);
        }

        match otherwise {
            Some(block) => {
                let arm = self.function.new_block();
                self.function.block_mut(previous).add_branch(None, arm);
                self.block = Some(arm);
                self.block(block);
                self.close_into(next);
            }
            None => self.function.block_mut(previous).add_branch(None, next),
        }

        self.block = Some(next);
    }

    /// Closes the current block into `target`, if an arm did not already
    /// transfer control away.
    fn close_into(&mut self, target: ir::BlockId) {
        if let Some(block) = self.block {
            self.function.block_mut(block).add_branch(None, target);
            self.function.commit_block(block);
        }
    }

    /// The header-style loop:
    ///
    /// ```text
    ///         .---------------------.
    ///         | previous + init     |
    ///         '---------------------'
    ///                    |
    ///              .-----------.
    ///              |  header   |<---------.
    ///              '-----------'          |
    ///                  /   \              |
    ///       .-----------. .------------.  |
    ///       |   next    | |  loop body |--'
    ///       '-----------' '------------'
    /// ```
    ///
    /// The exit condition is a conditional break inside the body, so the
    /// body flows straight out of the header block.
    fn for_loop(&mut self, init: Option<&Statement>, body: &crate::ast::Block) {
        if let Some(init) = init {
            self.statement(init);
        }

        let previous = self.current();
        let header = self.function.new_block();
        let next = self.function.new_block();

        self.function.block_mut(previous).add_branch(None, header);
        self.function.commit_block(previous);
        self.block = Some(header);

        let saved = (self.continue_block, self.break_block);
        self.continue_block = Some(header);
        self.break_block = Some(next);

        self.block(body);

        (self.continue_block, self.break_block) = saved;

        match self.block {
            Some(block) => {
                // the back edge.
                self.function.block_mut(block).add_branch(None, header);
                self.function.commit_block(block);
            }
            // an empty loop keeps spinning on its own header.
            None => self.function.block_mut(header).add_branch(None, header),
        }

        self.block = Some(next);
    }

    /// Each case is a sibling block off the predecessor, guarded by the
    /// case's value expression; the unguarded default comes last. A case
    /// block still live after its statements falls through to the next
    /// case's block.
    fn switch(&mut self, cases: &[Case]) {
        let previous = self.current();
        let next = self.function.new_block();

        self.function.commit_block(previous);

        let saved_break = self.break_block;
        self.break_block = Some(next);

        self.block = Some(self.function.new_block());

        let mut has_default = false;

        for (position, case) in cases.iter().enumerate() {
            let last = position == cases.len() - 1;
            has_default |= case.value.is_none();

            let guard = case.value.as_ref().map(|value| self.rvalue(value));
            let arm = self.current();
            self.function.block_mut(previous).add_branch(guard, arm);

            for statement in &case.statements {
                self.statement(statement);
            }

            match self.block {
                Some(block) if last => {
                    self.function.block_mut(block).add_branch(None, next);
                    self.function.commit_block(block);
                }
                Some(block) => {
                    let fall = self.function.new_block();
                    self.function.block_mut(block).add_branch(None, fall);
                    self.function.commit_block(block);
                    self.block = Some(fall);
                }
                None if !last => self.block = Some(self.function.new_block()),
                None => {}
            }
        }

        if !has_default {
            self.function.block_mut(previous).add_branch(None, next);
        }

        self.break_block = saved_break;
        self.block = Some(next);
    }

    /// Return stores by-pointer results through the return area, then
    /// branches to the function epilogue.
    fn ret(&mut self, value: Option<&Expression>) {
        match self.function.abi().return_pointer() {
            Some(pointer) => {
                if let Some(value) = value {
                    let area = Meta::tuple(self.returns.clone());
                    let lowered = self.rvalue(value);

                    // one store per return slot, flattening nested tuples
                    // the same way the area was laid out.
                    let mut flattened = Vec::new();
                    match lowered {
                        Expression::Tuple { elements, .. } => {
                            for element in elements {
                                if let Expression::Tuple { elements: inner, .. } = element {
                                    flattened.extend(inner);
                                } else {
                                    flattened.push(element);
                                }
                            }
                        }
                        single => flattened.push(single),
                    }

                    for (index, element) in flattened.into_iter().enumerate() {
                        let target = Expression::Stack {
                            base: pointer,
                            addend: 0,
                            offset: area.offset_of(index),
                            meta: element.meta().clone(),
                        };
                        self.emit(ir::Statement::Assign {
                            target,
                            value: element,
                        });
                    }
                }

                self.emit(ir::Statement::Return(None));
            }
            None => {
                let lowered = value.map(|value| self.rvalue(value));
                self.emit(ir::Statement::Return(lowered));
            }
        }

        let block = self.current();
        let exit = self.function.exit();
        self.function.block_mut(block).add_branch(None, exit);
        self.function.commit_block(block);
        self.block = None;
    }

    fn cont(&mut self) {
        let target = self.continue_block.expect("continue outside of a loop");
        let block = self.current();

        self.function.block_mut(block).add_branch(None, target);
        self.function.commit_block(block);
        self.block = None;
    }

    /// An unconditional break transfers control; a conditional one guards
    /// the edge and keeps lowering in a fresh continuation block.
    fn brk(&mut self, condition: Option<&Expression>) {
        let target = self.break_block.expect("break outside of a loop or switch");
        let next = self.function.new_block();

        match condition {
            Some(condition) => {
                let guard = self.rvalue(condition);
                let block = self.current();
                self.function.block_mut(block).add_branch(Some(guard), target);
                self.function.block_mut(block).add_branch(None, next);
                self.function.commit_block(block);
            }
            None => {
                let block = self.current();
                self.function.block_mut(block).add_branch(None, target);
                self.function.commit_block(block);
            }
        }

        self.block = Some(next);
    }

    fn goto(&mut self, label: &str) {
        let target = *self
            .labels
            .get(label)
            .unwrap_or_else(|| panic!("unresolved label `{label}`"));
        let block = self.current();

        self.function.block_mut(block).add_branch(None, target);
        self.function.commit_block(block);
        self.block = None;
    }
}
