//! Tree-walking evaluator.
//!
//! Executes the parsed block directly against a single flat environment of
//! bindings. Function calls snapshot the environment, rebind parameters,
//! execute the shared body and restore the snapshot on exit; return, break
//! and continue travel as explicit control-flow signals.

use std::collections::HashMap;
use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ast::Block;

mod builtins;
mod error;
mod runtime;
mod value;

pub use error::RuntimeError;
pub use value::Value;

use runtime::Flow;

pub struct Interpreter<'a> {
    globals: HashMap<String, Value>,
    output: &'a mut dyn Write,
    rng: StdRng,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        Self {
            globals: HashMap::new(),
            output,
            rng: StdRng::from_entropy(),
        }
    }

    /// Executes the program in the global environment.
    ///
    /// A top-level `return` stops execution silently; `break` and `continue`
    /// that reach the top level are runtime errors.
    pub fn run(&mut self, program: &Block) -> Result<(), RuntimeError> {
        match self.exec_block(program)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Break => Err(RuntimeError::BreakOutsideLoop),
            Flow::Continue => Err(RuntimeError::ContinueOutsideLoop),
        }
    }
}
