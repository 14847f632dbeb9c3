pub mod ast;
pub mod derivative;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod grammar;
mod helpers;
pub mod lexer;
pub mod parser;
pub mod sampling;
pub mod token;

pub use ast::Expression;
pub use error::{EvalError, LexError, ParseError, SampleError};
pub use evaluator::{evaluate, Bindings};
pub use lexer::tokenize;
pub use parser::parse;
