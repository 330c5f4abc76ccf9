pub mod ast;
pub mod env;
pub mod error;
pub mod eval;
pub mod lex;
pub mod object;
pub mod parse;
pub mod repl;
pub mod system;

pub use env::Environment;
pub use error::RuntimeError;
pub use eval::{Interpreter, eval};
pub use lex::Lexer;
pub use object::Object;
pub use parse::{Parser, SyntaxError, parse};
