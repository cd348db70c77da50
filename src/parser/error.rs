use thiserror::Error;

use crate::lexer::LexError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Sintaxa pentru \"{construct}\" este invalida (linia {line})")]
    InvalidSyntax { construct: &'static str, line: usize },
    #[error("Sintaxa pentru \"{construct}\": lipseste conditia (linia {line})")]
    MissingCondition { construct: &'static str, line: usize },
    #[error("Sintaxa pentru \"{construct}\": lipseste blocul de instructiuni (linia {line})")]
    MissingBody { construct: &'static str, line: usize },
    #[error("Variabila invalida in citeste (linia {line})")]
    InvalidVariable { line: usize },
    #[error("Expresie invalida la scriere (linia {line})")]
    InvalidOutputExpression { line: usize },
    #[error("Cuvant cheie neasteptat \"{keyword}\" (linia {line})")]
    UnexpectedKeyword { keyword: String, line: usize },
    #[error("Simbol neasteptat \"{text}\" in expresie (linia {line})")]
    UnexpectedToken { text: String, line: usize },
    #[error("Simbol neasteptat \"{text}\" dupa instructiune (linia {line})")]
    TrailingToken { text: String, line: usize },
    #[error("Acolada neinchisa! (linia {line})")]
    UnclosedBrace { line: usize },
    #[error("Paranteza patrata nepereche (linia {line})")]
    UnmatchedBracket { line: usize },
    #[error("Paranteza rotunda nepereche (linia {line})")]
    UnmatchedParen { line: usize },
    #[error("Se astepta '{{' pentru initializarea vectorului \"{name}\" (linia {line})")]
    ExpectedVectorInit { name: String, line: usize },
    #[error("Programul nu contine instructiuni")]
    EmptyProgram,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Anything that can go wrong before a program tree exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontendError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
