use contractc::ast::{
    BinaryOp, Block, Contract, Expression, Function, Identifier, Meta, Modifiers, Position,
    Statement, StatementKind, StorageClass, Value,
};
use contractc::types::TypeKind;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::rc::Rc;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("empty", |b| {
        let contract = Contract::new("empty", vec![], vec![]);

        b.iter(|| black_box(contractc::compile(&contract).expect("the contract compiles")))
    });
    c.bench_function("arithmetic", |b| {
        let contract = new_arithmetic_contract();

        b.iter(|| black_box(contractc::compile(&contract).expect("the contract compiles")))
    });
}

/// A contract with one exported function per arithmetic operator.
fn new_arithmetic_contract() -> Contract {
    let operators = [
        ("add", BinaryOp::Add),
        ("sub", BinaryOp::Sub),
        ("mul", BinaryOp::Mul),
        ("div", BinaryOp::Div),
    ];

    let mut uid = 1;
    let mut functions = Vec::new();

    for (name, op) in operators {
        let lhs = Rc::new(Identifier::new(
            uid,
            "a",
            Meta::scalar(TypeKind::Int32),
            StorageClass::Param,
        ));
        let rhs = Rc::new(Identifier::new(
            uid + 1,
            "b",
            Meta::scalar(TypeKind::Int32),
            StorageClass::Param,
        ));
        let result = Rc::new(Identifier::new(
            uid + 2,
            "",
            Meta::scalar(TypeKind::Int32),
            StorageClass::Return,
        ));
        uid += 3;

        let value = Expression::Binary {
            op,
            lhs: Box::new(Expression::Id {
                id: Rc::clone(&lhs),
                position: Position::default(),
            }),
            rhs: Box::new(Expression::Id {
                id: Rc::clone(&rhs),
                position: Position::default(),
            }),
            meta: Meta::scalar(TypeKind::Int32),
            position: Position::default(),
        };
        let body = Block::of(vec![Statement::new(
            StatementKind::Return { value: Some(value) },
            Position::default(),
        )]);

        functions.push(Function::new(
            name,
            Modifiers::default(),
            vec![lhs, rhs],
            vec![result],
            body,
        ));
    }

    let counter = Rc::new(
        Identifier::new(
            uid,
            "calls",
            Meta::scalar(TypeKind::Int64),
            StorageClass::Global,
        )
        .with_initializer(Expression::Literal {
            value: Value::Int(0),
            meta: Meta::scalar(TypeKind::Int64),
            position: Position::default(),
        }),
    );

    Contract::new("arithmetic", vec![counter], functions)
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
