pub mod cmdline;
pub mod core;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod printer;
pub mod reader;
pub mod special_forms;

#[macro_use]
extern crate lazy_static;

mod strings;
mod tokens;
mod types;

pub use evaluator::{Error, ErrorKind, Evaluator};
pub use reader::{parse_all, parse_one};
pub use tokens::{tokenize, Location, Token, TokenKind};
pub use types::{List, Symbol, Value};
