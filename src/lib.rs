pub mod ast;
pub mod backend;
pub mod config;
pub mod debugger;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repair;
pub mod token;
pub mod transpiler;
