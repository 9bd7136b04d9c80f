//! Shared builders for assembling resolver-shaped ASTs in tests.

#![allow(dead_code)]

use contractc::ast::{
    BinaryOp, Block, CallTarget, Contract, Expression, Function, Identifier, Meta, Modifiers,
    Position, Statement, StatementKind, StorageClass, Value,
};
use contractc::types::TypeKind;
use std::cell::Cell;
use std::rc::Rc;

thread_local! {
    static NEXT_UID: Cell<u32> = const { Cell::new(1) };
}

fn fresh_uid() -> u32 {
    NEXT_UID.with(|uid| {
        let next = uid.get();
        uid.set(next + 1);
        next
    })
}

pub fn pos() -> Position {
    Position::default()
}

pub fn scalar(kind: TypeKind) -> Meta {
    Meta::scalar(kind)
}

pub fn local(name: &str, meta: Meta) -> Rc<Identifier> {
    Rc::new(Identifier::new(fresh_uid(), name, meta, StorageClass::Local))
}

pub fn local_init(name: &str, meta: Meta, initializer: Expression) -> Rc<Identifier> {
    Rc::new(
        Identifier::new(fresh_uid(), name, meta, StorageClass::Local)
            .with_initializer(initializer),
    )
}

pub fn global_init(name: &str, meta: Meta, initializer: Expression) -> Rc<Identifier> {
    Rc::new(
        Identifier::new(fresh_uid(), name, meta, StorageClass::Global)
            .with_initializer(initializer),
    )
}

pub fn param(name: &str, meta: Meta) -> Rc<Identifier> {
    Rc::new(Identifier::new(fresh_uid(), name, meta, StorageClass::Param))
}

pub fn ret_slot(meta: Meta) -> Rc<Identifier> {
    Rc::new(Identifier::new(fresh_uid(), "", meta, StorageClass::Return))
}

pub fn global(name: &str, meta: Meta) -> Rc<Identifier> {
    Rc::new(Identifier::new(fresh_uid(), name, meta, StorageClass::Global))
}

pub fn id(identifier: &Rc<Identifier>) -> Expression {
    Expression::Id {
        id: Rc::clone(identifier),
        position: pos(),
    }
}

pub fn int(value: i64) -> Expression {
    Expression::Literal {
        value: Value::Int(value),
        meta: scalar(TypeKind::Int32),
        position: pos(),
    }
}

pub fn boolean(value: bool) -> Expression {
    Expression::Literal {
        value: Value::Bool(value),
        meta: scalar(TypeKind::Bool),
        position: pos(),
    }
}

pub fn text(value: &str) -> Expression {
    Expression::Literal {
        value: Value::Text(value.to_string()),
        meta: scalar(TypeKind::String),
        position: pos(),
    }
}

pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression, kind: TypeKind) -> Expression {
    Expression::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        meta: scalar(kind),
        position: pos(),
    }
}

pub fn call(function: &str, arguments: Vec<Expression>, meta: Meta) -> Expression {
    Expression::Call {
        target: CallTarget::Function(function.to_string()),
        arguments,
        meta,
        position: pos(),
    }
}

pub fn index(value: Expression, at: Expression, meta: Meta) -> Expression {
    Expression::Index {
        value: Box::new(value),
        index: Box::new(at),
        meta,
        position: pos(),
    }
}

pub fn tuple(elements: Vec<Expression>) -> Expression {
    let meta = Meta::tuple(elements.iter().map(|e| e.meta().clone()).collect());

    Expression::Tuple {
        elements,
        meta,
        position: pos(),
    }
}

pub fn assign(lhs: Expression, rhs: Expression) -> Statement {
    Statement::new(StatementKind::Assign { lhs, rhs }, pos())
}

pub fn expression(value: Expression) -> Statement {
    Statement::new(StatementKind::Expression(value), pos())
}

pub fn ret(value: Option<Expression>) -> Statement {
    Statement::new(StatementKind::Return { value }, pos())
}

pub fn brk(condition: Option<Expression>) -> Statement {
    Statement::new(StatementKind::Break { condition }, pos())
}

pub fn cont() -> Statement {
    Statement::new(StatementKind::Continue, pos())
}

pub fn goto(label: &str) -> Statement {
    Statement::new(StatementKind::Goto { label: label.to_string() }, pos())
}

pub fn branch(condition: Expression, then: Block, otherwise: Option<Block>) -> Statement {
    Statement::new(
        StatementKind::If {
            condition,
            then,
            elifs: vec![],
            otherwise,
        },
        pos(),
    )
}

pub fn for_loop(body: Block) -> Statement {
    Statement::new(
        StatementKind::Loop {
            kind: contractc::ast::LoopKind::For,
            init: None,
            body,
        },
        pos(),
    )
}

pub fn function(
    name: &str,
    parameters: Vec<Rc<Identifier>>,
    returns: Vec<Rc<Identifier>>,
    body: Block,
) -> Function {
    Function::new(name, Modifiers::default(), parameters, returns, body)
}

pub fn contract(name: &str, globals: Vec<Rc<Identifier>>, functions: Vec<Function>) -> Contract {
    Contract::new(name, globals, functions)
}

/// Checks the well-formedness guarantees lowering makes about a function's
/// graph: entry and exit are present, every branch target exists, the exit
/// has no outgoing branches, the entry has no predecessors, and every
/// committed block is reachable.
pub fn assert_well_formed(function: &contractc::ir::Function) {
    let order = function.order();

    assert!(order.contains(&function.entry()), "entry not committed");
    assert!(order.contains(&function.exit()), "exit not committed");
    assert!(
        function.block(function.exit()).branches().is_empty(),
        "exit has outgoing branches"
    );

    for id in order {
        for branch in function.block(*id).branches() {
            assert!(
                order.contains(&branch.target),
                "branch from {id} to uncommitted {}",
                branch.target
            );
            assert_ne!(branch.target, function.entry(), "entry has a predecessor");
        }
    }

    let mut reachable = vec![function.entry()];
    let mut visited = std::collections::HashSet::new();

    while let Some(id) = reachable.pop() {
        if visited.insert(id) {
            for branch in function.block(id).branches() {
                reachable.push(branch.target);
            }
        }
    }

    for id in order {
        assert!(
            visited.contains(id) || *id == function.exit(),
            "{id} is unreachable"
        );
    }
}
