//! Statement tree shared by every consumer.
//!
//! The parser builds these nodes once; the interpreter and the step debugger
//! execute them through the same execution core, while the transpiler walks
//! them to emit C++. Expressions are stored in postfix order.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Not,
    /// `int`: integer part, written `[expr]` in operand position.
    IntPart,
    /// `index`: `base[i]`.
    Index,
}

impl Operator {
    pub fn from_word(word: &str) -> Option<Self> {
        let op = match word {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "<" => Self::Less,
            ">" => Self::Greater,
            "<=" => Self::LessEqual,
            ">=" => Self::GreaterEqual,
            "egal" => Self::Equal,
            "diferit" => Self::NotEqual,
            "si" => Self::And,
            "sau" => Self::Or,
            "not" => Self::Not,
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength used by the expression compiler, low to high.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Equal | Self::NotEqual => 0,
            Self::Or => 1,
            Self::And => 2,
            Self::Less | Self::Greater | Self::LessEqual | Self::GreaterEqual => 3,
            Self::Add | Self::Sub => 4,
            Self::Mul | Self::Div | Self::Mod => 5,
            Self::Not => 6,
            Self::IntPart | Self::Index => 7,
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Self::Not | Self::IntPart)
    }

    pub fn is_relational_or_logical(self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::Greater
                | Self::LessEqual
                | Self::GreaterEqual
                | Self::Equal
                | Self::NotEqual
                | Self::And
                | Self::Or
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "egal",
            Self::NotEqual => "diferit",
            Self::And => "si",
            Self::Or => "sau",
            Self::Not => "not",
            Self::IntPart => "int",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One element of a postfix expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Numeric literal; `literal` keeps the source spelling.
    Number { value: f64, literal: String },
    Identifier(String),
    String(String),
    Operator(Operator),
}

impl Term {
    pub fn number(literal: &str) -> Self {
        Term::Number {
            value: literal.parse().unwrap_or(0.0),
            literal: literal.to_string(),
        }
    }

    pub fn identifier(name: &str) -> Self {
        Term::Identifier(name.to_string())
    }
}

/// Expression in Reverse Polish order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Postfix(pub Vec<Term>);

impl Postfix {
    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Postfix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|term| match term {
                Term::Number { literal, .. } => literal.clone(),
                Term::Identifier(name) => name.clone(),
                Term::String(value) => format!("{value:?}"),
                Term::Operator(op) => op.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&rendered)
    }
}

/// Assignment target forms accepted by the parser.
#[derive(Debug, PartialEq, Clone)]
pub enum AssignTarget {
    Name(String),
    Element { name: String, index: Postfix },
}

impl AssignTarget {
    pub fn name(&self) -> &str {
        match self {
            AssignTarget::Name(name) | AssignTarget::Element { name, .. } => name,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StatementKind {
    Input(String),
    Output(String),
    OutputStr(String),
    OutputExpr(Postfix),
    /// Forced line break closing a `scrie` statement.
    Newline,
    Assign {
        target: AssignTarget,
        value: Postfix,
    },
    If {
        condition: Postfix,
        then_body: Program,
        else_body: Option<Program>,
    },
    While {
        condition: Postfix,
        body: Program,
    },
    For {
        init: Box<Statement>,
        condition: Postfix,
        step: Box<Statement>,
        body: Program,
    },
    /// `repeta ... pana cand`: runs the body until the condition holds.
    DoWhile {
        condition: Postfix,
        body: Program,
    },
    VectorAlloc {
        name: String,
        size: Postfix,
    },
    VectorInit {
        name: String,
        size: Postfix,
        elements: Vec<Postfix>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct Statement {
    /// Source line the statement starts on.
    pub line: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(line: usize, kind: StatementKind) -> Self {
        Self { line, kind }
    }

    pub fn is_output(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::Output(_) | StatementKind::OutputStr(_) | StatementKind::OutputExpr(_)
        )
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
