/// Position of a token in the source text. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Structural
    Newline,
    EOF,

    // Operators
    Operator, // + - * / % < > <= >= si sau not egal diferit
    Assign,   // = and <-

    // Delimiters
    Comma,    // ,
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]

    // Literals and names
    Number,
    Identifier,
    String,
    Keyword,
}

/// A lexeme together with its kind. `text` holds the operator symbol, the
/// identifier name, the numeric text, the string contents or the keyword
/// spelling (including the two-word keywords `cat timp` and `pana cand`).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is(TokenKind::Keyword, keyword)
    }
}

pub const KEYWORDS: [&str; 10] = [
    "citeste",
    "scrie",
    "daca",
    "atunci",
    "altfel",
    "cat timp",
    "pentru",
    "executa",
    "repeta",
    "pana cand",
];

pub const WORD_OPERATORS: [&str; 5] = ["si", "sau", "not", "egal", "diferit"];
