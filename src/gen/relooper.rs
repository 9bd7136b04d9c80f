//! Control-flow reconstruction: rendering the block graph as structured
//! WebAssembly.
//!
//! The graph is reduced to a single dispatch loop over the reserved relooper
//! local. Each committed block becomes one guarded arm of the loop body;
//! resolving a block's branch list assigns the successor id to the state
//! variable and re-enters the loop. Every block therefore emits exactly one
//! terminator: the branch back to the dispatch loop, or a return.

use crate::gen::FunctionGen;
use crate::ir::{BlockId, Branch, RELOOPER};
use crate::wasm::{
    ControlInstruction, Instruction, NumericInstruction, ValueType, VariableInstruction,
};

/// Renders the function's committed blocks into a dispatch loop.
pub(crate) fn reloop(gen: &mut FunctionGen) -> Vec<Instruction> {
    let function = gen.function;
    let mut body: Vec<Instruction> = Vec::new();

    for id in function.order() {
        let block = function.block(*id);
        let mut arm: Vec<Instruction> = Vec::new();

        for statement in block.statements() {
            gen.statement(statement, &mut arm);
        }

        let returned = matches!(
            block.statements().last(),
            Some(crate::ir::Statement::Return(_))
        );

        if returned {
            // the return above is the block's terminator; the recorded edge
            // to the exit block is graph bookkeeping only.
        } else if block.branches().is_empty() {
            arm.push(ControlInstruction::Unreachable.into());
        } else {
            resolve(gen, block.branches(), &mut arm);
            arm.push(ControlInstruction::Branch(1).into());
        }

        body.push(VariableInstruction::LocalGet(RELOOPER).into());
        body.push(state(*id));
        body.push(NumericInstruction::Equal(ValueType::I32).into());
        body.push(
            ControlInstruction::If {
                kind: None,
                then: arm,
                otherwise: vec![],
            }
            .into(),
        );
    }

    // an unknown state is a compiler bug.
    body.push(ControlInstruction::Unreachable.into());

    vec![
        state(function.entry()),
        VariableInstruction::LocalSet(RELOOPER).into(),
        ControlInstruction::Loop { kind: None, body }.into(),
    ]
}

/// Selects the successor: guards are evaluated in order, and the first
/// truthy (or absent) guard assigns its target to the state variable.
fn resolve(gen: &mut FunctionGen, branches: &[Branch], code: &mut Vec<Instruction>) {
    match branches {
        [] => code.push(ControlInstruction::Unreachable.into()),
        [first, ..] if first.guard.is_none() => {
            code.push(state(first.target));
            code.push(VariableInstruction::LocalSet(RELOOPER).into());
        }
        [first, rest @ ..] => {
            let guard = first.guard.as_ref().expect("guarded branch");
            gen.condition(guard, code);

            let mut otherwise = Vec::new();
            resolve(gen, rest, &mut otherwise);

            code.push(
                ControlInstruction::If {
                    kind: None,
                    then: vec![
                        state(first.target),
                        VariableInstruction::LocalSet(RELOOPER).into(),
                    ],
                    otherwise,
                }
                .into(),
            );
        }
    }
}

fn state(id: BlockId) -> Instruction {
    NumericInstruction::I32Constant(id.index() as i32).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Expression, Function as AstFunction, Meta, Modifiers, Position, Value};
    use crate::gen::Generator;
    use crate::ir;
    use crate::types::TypeKind;

    fn truthy() -> Expression {
        Expression::Literal {
            value: Value::Bool(true),
            meta: Meta::scalar(TypeKind::Bool),
            position: Position::default(),
        }
    }

    /// Counts terminators at the top level of one dispatch arm.
    fn terminators(arm: &[Instruction]) -> usize {
        arm.iter()
            .filter(|instruction| {
                matches!(
                    instruction,
                    Instruction::Control(ControlInstruction::Branch(_))
                        | Instruction::Control(ControlInstruction::Return)
                        | Instruction::Control(ControlInstruction::Unreachable)
                )
            })
            .count()
    }

    /// Every rendered block re-enters the dispatch loop or returns, exactly
    /// once.
    #[test]
    fn each_block_emits_one_terminator() {
        let source = AstFunction::new("f", Modifiers::default(), vec![], vec![], Block::default());
        let mut function = ir::Function::new("c", &source);

        let fork = function.new_block();
        let join = function.new_block();
        let entry = function.entry();
        let exit = function.exit();

        function.block_mut(entry).add_branch(Some(truthy()), fork);
        function.block_mut(entry).add_branch(None, join);
        function.block_mut(fork).add_branch(None, join);
        function.block_mut(join).add_branch(None, exit);
        function
            .block_mut(exit)
            .add_statement(ir::Statement::Return(None));

        function.commit_block(fork);
        function.commit_block(join);
        function.commit_block(exit);

        let mut generator = Generator::new();
        let mut gen = crate::gen::FunctionGen::new(&mut generator, &function);
        let code = reloop(&mut gen);

        // state init, then the dispatch loop.
        assert_eq!(code.len(), 3);

        let Instruction::Control(ControlInstruction::Loop { body, .. }) = &code[2] else {
            panic!("expected the dispatch loop");
        };

        let arms: Vec<&Vec<Instruction>> = body
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Control(ControlInstruction::If { then, .. }) => Some(then),
                _ => None,
            })
            .collect();

        assert_eq!(arms.len(), function.order().len());

        for arm in arms {
            assert_eq!(terminators(arm), 1, "arm: {arm:?}");
        }
    }
}
