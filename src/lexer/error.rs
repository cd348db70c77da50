use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Caracter invalid: '{character}', ASCII: {code} (linia {line}, coloana {column})")]
    UnexpectedCharacter {
        character: char,
        code: u32,
        line: usize,
        column: usize,
    },
    #[error("Sir de caractere neinchis (linia {line}, coloana {column})")]
    UnterminatedString { line: usize, column: usize },
}

pub type LexResult<T> = Result<T, LexError>;
