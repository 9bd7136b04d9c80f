//! Functions and the contract that owns them.

use crate::ast::{Block, Identifier, Modifiers, Position};
use std::rc::Rc;

/// A contract function: name, modifiers, parameters, return slots, and a
/// body block.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub modifiers: Modifiers,
    pub parameters: Vec<Rc<Identifier>>,
    pub returns: Vec<Rc<Identifier>>,
    pub body: Block,
    pub position: Position,
}

impl Function {
    pub fn new(
        name: &str,
        modifiers: Modifiers,
        parameters: Vec<Rc<Identifier>>,
        returns: Vec<Rc<Identifier>>,
        body: Block,
    ) -> Self {
        Function {
            name: name.to_string(),
            modifiers,
            parameters,
            returns,
            body,
            position: Position::default(),
        }
    }
}

/// One compilation unit: a contract with its state variables and functions.
/// Every contract compiles to exactly one WebAssembly module.
#[derive(Clone, Debug)]
pub struct Contract {
    pub name: String,
    pub globals: Vec<Rc<Identifier>>,
    pub functions: Vec<Function>,
    pub position: Position,
}

impl Contract {
    pub fn new(name: &str, globals: Vec<Rc<Identifier>>, functions: Vec<Function>) -> Self {
        Contract {
            name: name.to_string(),
            globals,
            functions,
            position: Position::default(),
        }
    }
}
