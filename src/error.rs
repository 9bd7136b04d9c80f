//! Error types and source diagnostics.

use crate::ast::Position;
use std::fmt;
use thiserror::Error;

/// An error compiling a contract.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The source program was rejected; lowering collected one or more
    /// diagnostics before giving up at the end of the pipeline.
    #[error("the contract was rejected with {} error(s)", .0.len())]
    Rejected(Vec<Diagnostic>),
    /// Serializing the finished module failed.
    #[error("failed to emit the WebAssembly binary")]
    Emit(#[from] crate::emitter::EmitError),
}

impl CompileError {
    /// The diagnostics recorded against the source program, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Rejected(diagnostics) => diagnostics,
            CompileError::Emit(_) => &[],
        }
    }
}

/// The kinds of source errors the middle end can raise on its own.
/// Everything else (unknown names, type mismatches, arity errors) is caught
/// by the resolver before lowering starts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A recognized construct with no lowering (array loops, whole-struct
    /// assignment, aggregate contract globals, floats in maps).
    NotSupported,
    /// Two functions mangle to the same internal name once the bounded
    /// name length truncates them.
    DuplicateFunctionName,
}

impl ErrorKind {
    fn message(self) -> &'static str {
        match self {
            ErrorKind::NotSupported => "not supported",
            ErrorKind::DuplicateFunctionName => {
                "function name is not unique after truncation"
            }
        }
    }
}

/// A single `(error kind, source position)` pair destined for the
/// diagnostics formatter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub position: Position,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.kind.message())
    }
}

/// Collects diagnostics while lowering continues, so a single run reports
/// as many source errors as possible.
#[derive(Debug, Default)]
pub struct Diagnostics {
    recorded: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report(&mut self, kind: ErrorKind, position: Position) {
        log::debug!("diagnostic at {}: {:?}", position, kind);
        self.recorded.push(Diagnostic { kind, position });
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    /// Consumes the sink; `Err` if anything was recorded.
    pub fn finish(self) -> Result<(), CompileError> {
        if self.recorded.is_empty() {
            Ok(())
        } else {
            Err(CompileError::Rejected(self.recorded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink_finishes_clean() {
        assert!(Diagnostics::new().finish().is_ok());
    }

    #[test]
    fn recorded_diagnostics_reject_the_contract() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(ErrorKind::NotSupported, Position::new(3, 7));

        match diagnostics.finish() {
            Err(CompileError::Rejected(recorded)) => {
                assert_eq!(recorded.len(), 1);
                assert_eq!(recorded[0].kind, ErrorKind::NotSupported);
                assert_eq!(recorded[0].to_string(), "3:7: not supported");
            }
            other => panic!("expected rejection, got {:?}", other.err()),
        }
    }
}
