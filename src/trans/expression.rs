//! Expression lowering to rvalue and lvalue form.

use crate::ast::{BinaryOp, CallTarget, Expression, Meta, Position, UnaryOp, Value};
use crate::host::HostFn;
use crate::ir;
use crate::ir::STACK_BASE;
use crate::trans::Transformer;
use crate::types::TypeKind;

/// A synthesized `env.map.new` call carrying the map's key and value tags.
pub(crate) fn map_new(meta: &Meta) -> Expression {
    let key = meta.elements()[0].kind();
    let value = meta.elements()[1].kind();

    Expression::Call {
        target: CallTarget::Host(HostFn::MapNew),
        arguments: vec![literal_i32(key as i64), literal_i32(value as i64)],
        meta: meta.clone(),
        position: Position::default(),
    }
}

fn literal_i32(value: i64) -> Expression {
    Expression::Literal {
        value: Value::Int(value),
        meta: Meta::scalar(TypeKind::Int32),
        position: Position::default(),
    }
}

fn host_call(host: HostFn, arguments: Vec<Expression>, meta: Meta, position: Position) -> Expression {
    Expression::Call {
        target: CallTarget::Host(host),
        arguments,
        meta,
        position,
    }
}

impl Transformer<'_> {
    /// Map keys and values travel widened to `i64`, which rules the float
    /// types out.
    pub(crate) fn check_map(&mut self, meta: &Meta, position: Position) {
        let unsupported = meta.elements().iter().any(|element| {
            matches!(element.kind(), TypeKind::Float | TypeKind::Double)
        });

        if unsupported {
            self.report(crate::error::ErrorKind::NotSupported, position);
        }
    }

    /// Lowers an expression for its value.
    pub(crate) fn rvalue(&mut self, expression: &Expression) -> Expression {
        match expression {
            Expression::Literal { .. }
            | Expression::Global { .. }
            | Expression::Local { .. }
            | Expression::Stack { .. } => expression.clone(),
            Expression::Id { id, .. } => self.reference(id),
            Expression::Unary {
                op,
                operand,
                meta,
                position,
            } => {
                let lowered = self.rvalue(operand);

                if *op == UnaryOp::Neg && meta.kind().is_big_integer() {
                    host_call(HostFn::BigIntNeg, vec![lowered], meta.clone(), *position)
                } else {
                    Expression::Unary {
                        op: *op,
                        operand: Box::new(lowered),
                        meta: meta.clone(),
                        position: *position,
                    }
                }
            }
            Expression::Binary {
                op,
                lhs,
                rhs,
                meta,
                position,
            } => self.binary(*op, lhs, rhs, meta, *position),
            Expression::Call {
                target,
                arguments,
                meta,
                position,
            } => self.call(target, arguments, meta, *position),
            Expression::Index {
                value,
                index,
                meta,
                position,
            } => {
                if value.meta().is_map() {
                    self.check_map(value.meta(), *position);

                    let map = self.rvalue(value);
                    let key = self.rvalue(index);

                    host_call(HostFn::MapGet, vec![map, key], meta.clone(), *position)
                } else {
                    self.element(value, index, meta)
                }
            }
            Expression::Field {
                value,
                field,
                meta,
                position,
            } => self.member(value, *field, meta, *position),
            Expression::Tuple {
                elements,
                meta,
                position,
            } => Expression::Tuple {
                elements: elements.iter().map(|element| self.rvalue(element)).collect(),
                meta: meta.clone(),
                position: *position,
            },
        }
    }

    /// Lowers an expression in assignment-target position.
    /// Map writes never reach this: assignment intercepts them.
    pub(crate) fn lvalue(&mut self, expression: &Expression) -> Expression {
        match expression {
            Expression::Id { id, .. } => self.reference(id),
            Expression::Index { value, index, meta, .. } => self.element(value, index, meta),
            Expression::Field {
                value,
                field,
                meta,
                position,
            } => self.member(value, *field, meta, *position),
            Expression::Tuple {
                elements,
                meta,
                position,
            } => Expression::Tuple {
                elements: elements.iter().map(|element| self.lvalue(element)).collect(),
                meta: meta.clone(),
                position: *position,
            },
            Expression::Global { .. } | Expression::Local { .. } | Expression::Stack { .. } => {
                expression.clone()
            }
            other => panic!("expression is not assignable: {other:?}"),
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
        meta: &Meta,
        position: Position,
    ) -> Expression {
        let operand_kind = lhs.meta().kind();
        let lowered_lhs = self.rvalue(lhs);
        let lowered_rhs = self.rvalue(rhs);

        if operand_kind.is_big_integer() {
            return self.big_integer(op, lowered_lhs, lowered_rhs, meta, position);
        }

        if operand_kind == TypeKind::String {
            return self.string(op, lowered_lhs, lowered_rhs, meta, position);
        }

        Expression::Binary {
            op,
            lhs: Box::new(lowered_lhs),
            rhs: Box::new(lowered_rhs),
            meta: meta.clone(),
            position,
        }
    }

    /// Arithmetic on `int128`/`int256` becomes host calls; comparisons go
    /// through `bigint.cmp` against zero.
    fn big_integer(
        &mut self,
        op: BinaryOp,
        lhs: Expression,
        rhs: Expression,
        meta: &Meta,
        position: Position,
    ) -> Expression {
        let host = match op {
            BinaryOp::Add => HostFn::BigIntAdd,
            BinaryOp::Sub => HostFn::BigIntSub,
            BinaryOp::Mul => HostFn::BigIntMul,
            BinaryOp::Div => HostFn::BigIntDiv,
            BinaryOp::Mod => HostFn::BigIntMod,
            op if op.is_comparison() => {
                let compared = host_call(
                    HostFn::BigIntCmp,
                    vec![lhs, rhs],
                    Meta::scalar(TypeKind::Int32),
                    position,
                );

                return Expression::Binary {
                    op,
                    lhs: Box::new(compared),
                    rhs: Box::new(literal_i32(0)),
                    meta: meta.clone(),
                    position,
                };
            }
            op => panic!("operator {op:?} is not defined on big integers"),
        };

        host_call(host, vec![lhs, rhs], meta.clone(), position)
    }

    /// String concatenation and comparison become host calls.
    fn string(
        &mut self,
        op: BinaryOp,
        lhs: Expression,
        rhs: Expression,
        meta: &Meta,
        position: Position,
    ) -> Expression {
        match op {
            BinaryOp::Add => host_call(
                HostFn::StringConcat,
                vec![lhs, rhs],
                meta.clone(),
                position,
            ),
            op if op.is_comparison() => {
                let compared = host_call(
                    HostFn::StringCmp,
                    vec![lhs, rhs],
                    Meta::scalar(TypeKind::Int32),
                    position,
                );

                Expression::Binary {
                    op,
                    lhs: Box::new(compared),
                    rhs: Box::new(literal_i32(0)),
                    meta: meta.clone(),
                    position,
                }
            }
            op => panic!("operator {op:?} is not defined on strings"),
        }
    }

    /// Lowers a call, rewriting contract callees to their mangled names and
    /// by-address results to return-by-pointer through a scratch-stack area.
    fn call(
        &mut self,
        target: &CallTarget,
        arguments: &[Expression],
        meta: &Meta,
        position: Position,
    ) -> Expression {
        let mut lowered: Vec<Expression> = arguments
            .iter()
            .map(|argument| self.rvalue(argument))
            .collect();

        let target = match target {
            CallTarget::Host(host) => CallTarget::Host(*host),
            CallTarget::Function(name) => CallTarget::Function(self.mangled(name)),
        };

        let indirect = matches!(target, CallTarget::Function(_))
            && (meta.is_tuple() || meta.kind().is_by_address() || meta.is_array());

        if !indirect {
            return Expression::Call {
                target,
                arguments: lowered,
                meta: meta.clone(),
                position,
            };
        }

        // the callee stores its results through a trailing pointer into a
        // caller-owned scratch area; the call itself is deferred and the
        // value is read back out of the area.
        let elements = if meta.is_tuple() {
            meta.elements().to_vec()
        } else {
            vec![meta.clone()]
        };
        let area = Meta::tuple(elements.clone());
        let base = self.function.add_stack(area.memory_size(), area.alignment());

        lowered.push(Expression::Stack {
            base: STACK_BASE,
            addend: base,
            offset: 0,
            meta: area.clone(),
        });

        self.piggyback(ir::Statement::Expression(Expression::Call {
            target,
            arguments: lowered,
            meta: Meta::scalar(TypeKind::Void),
            position,
        }));

        if meta.is_tuple() {
            let reads = elements
                .iter()
                .enumerate()
                .map(|(index, element)| Expression::Stack {
                    base: STACK_BASE,
                    addend: base,
                    offset: area.offset_of(index),
                    meta: element.clone(),
                })
                .collect();

            Expression::Tuple {
                elements: reads,
                meta: meta.clone(),
                position,
            }
        } else {
            Expression::Stack {
                base: STACK_BASE,
                addend: base,
                offset: 0,
                meta: meta.clone(),
            }
        }
    }

    /// Addresses one array element. Constant indices fold into the static
    /// offset; runtime indices survive as an `Index` the back end resolves
    /// in lvalue mode.
    fn element(&mut self, value: &Expression, index: &Expression, meta: &Meta) -> Expression {
        let element_size = value.meta().element().memory_size();
        let base = self.lvalue(value);

        if let Expression::Literal {
            value: Value::Int(constant),
            ..
        } = index
        {
            let displacement = *constant as u32 * element_size;

            return match base {
                Expression::Stack {
                    base,
                    addend,
                    offset,
                    ..
                } => Expression::Stack {
                    base,
                    addend,
                    offset: offset + displacement,
                    meta: meta.clone(),
                },
                // the pointer parameter itself is the array base address.
                Expression::Local { index, .. } => Expression::Stack {
                    base: index,
                    addend: 0,
                    offset: displacement,
                    meta: meta.clone(),
                },
                base => panic!("array base is not addressable: {base:?}"),
            };
        }

        let lowered_index = self.rvalue(index);

        Expression::Index {
            value: Box::new(base),
            index: Box::new(lowered_index),
            meta: meta.clone(),
            position: Position::default(),
        }
    }

    /// Addresses one struct field by folding its offset into the base form.
    fn member(
        &mut self,
        value: &Expression,
        field: usize,
        meta: &Meta,
        position: Position,
    ) -> Expression {
        let displacement = value.meta().offset_of(field);
        let base = self.lvalue(value);

        match base {
            Expression::Stack {
                base,
                addend,
                offset,
                ..
            } => Expression::Stack {
                base,
                addend,
                offset: offset + displacement,
                meta: meta.clone(),
            },
            // struct behind a pointer parameter.
            Expression::Local { index, .. } => Expression::Stack {
                base: index,
                addend: 0,
                offset: displacement,
                meta: meta.clone(),
            },
            base => {
                // member access through a runtime-computed element address
                // has no static base register.
                self.report(crate::error::ErrorKind::NotSupported, position);
                base
            }
        }
    }
}
