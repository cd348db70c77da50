use std::fmt;

use thiserror::Error;

/// Loop construct named in an infinite-loop report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    While,
    For,
    DoWhile,
}

impl fmt::Display for LoopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopKind::While => "cat timp",
            LoopKind::For => "pentru",
            LoopKind::DoWhile => "repeta",
        })
    }
}

/// Typed errors raised while executing a program, shared by the batch
/// evaluator and the step debugger.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Variabila \"{name}\" nu a fost definita!")]
    UndefinedVariable { name: String },
    #[error("Indexul negativ {index} nu este permis pentru vectori")]
    NegativeIndex { index: i64 },
    #[error("Indexul {index} depaseste lungimea sirului \"{value}\"")]
    StringIndexOutOfBounds { index: i64, value: String },
    #[error("Indexul {index} este prea mare")]
    IndexTooLarge { index: i64 },
    #[error("Dimensiune invalida pentru vectorul \"{name}\": {size}")]
    InvalidSize { name: String, size: String },
    #[error("Bucla infinita in \"{kind}\"")]
    InfiniteLoop { kind: LoopKind },
    #[error("Expresie invalida")]
    MalformedExpression,
    #[error("Operatorul \"{operator}\" nu se poate aplica pe {operands}")]
    TypeMismatch {
        operator: &'static str,
        operands: String,
    },
    #[error("Vectorul \"{name}\" poate contine doar numere")]
    ArrayElementType { name: String },
    #[error("Nu se poate atribui un element in sirul \"{name}\"")]
    StringElementAssignment { name: String },
    #[error("Valoarea introdusa pentru variabila \"{name}\" nu este un numar valid!")]
    InvalidInput { name: String },
    #[error("Nu exista nicio valoare de intrare pentru variabila \"{name}\"")]
    MissingInput { name: String },
    #[error("Nu se asteapta nicio valoare pentru variabila \"{name}\"")]
    NoPendingInput { name: String },
    #[error("Se astepta valoarea pentru \"{expected}\", nu pentru \"{got}\"")]
    UnexpectedInput { expected: String, got: String },
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
