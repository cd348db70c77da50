use std::{iter::Peekable, str::CharIndices};

use tracing::debug;

use crate::token::{KEYWORDS, Span, Token, TokenKind, WORD_OPERATORS};

mod error;

pub use error::{LexError, LexResult};

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    tokens: Vec<Token>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            tokens: Vec::new(),
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        while let Some(&(start, ch)) = self.chars.peek() {
            let span = self.span();
            match ch {
                '\n' | ';' => {
                    self.advance_char();
                    self.push(TokenKind::Newline, ch.to_string(), span);
                }
                ' ' | '\t' | '\r' => {
                    self.advance_char();
                }
                '+' | '*' | '%' => {
                    self.advance_char();
                    self.push(TokenKind::Operator, ch.to_string(), span);
                }
                '-' => self.read_minus(span),
                '/' => {
                    self.advance_char();
                    if self.next_is('/') {
                        self.skip_comment();
                    } else {
                        self.push(TokenKind::Operator, "/", span);
                    }
                }
                '=' => {
                    self.advance_char();
                    if self.next_is('=') {
                        self.advance_char();
                        self.push(TokenKind::Operator, "egal", span);
                    } else {
                        self.push(TokenKind::Assign, "=", span);
                    }
                }
                '<' => {
                    self.advance_char();
                    if self.next_is('-') {
                        self.advance_char();
                        self.push(TokenKind::Assign, "=", span);
                    } else if self.next_is('=') {
                        self.advance_char();
                        self.push(TokenKind::Operator, "<=", span);
                    } else {
                        self.push(TokenKind::Operator, "<", span);
                    }
                }
                '>' => {
                    self.advance_char();
                    if self.next_is('=') {
                        self.advance_char();
                        self.push(TokenKind::Operator, ">=", span);
                    } else {
                        self.push(TokenKind::Operator, ">", span);
                    }
                }
                '!' => {
                    self.advance_char();
                    if self.next_is('=') {
                        self.advance_char();
                        self.push(TokenKind::Operator, "diferit", span);
                    } else {
                        self.push(TokenKind::Operator, "not", span);
                    }
                }
                '&' | '|' => {
                    self.advance_char();
                    if !self.next_is(ch) {
                        return Err(unexpected(ch, span));
                    }
                    self.advance_char();
                    let word = if ch == '&' { "si" } else { "sau" };
                    self.push(TokenKind::Operator, word, span);
                }
                ',' => self.single(TokenKind::Comma, ch, span),
                '(' => self.single(TokenKind::LParen, ch, span),
                ')' => self.single(TokenKind::RParen, ch, span),
                '{' => self.single(TokenKind::LBrace, ch, span),
                '}' => self.single(TokenKind::RBrace, ch, span),
                '[' => self.single(TokenKind::LBracket, ch, span),
                ']' => self.single(TokenKind::RBracket, ch, span),
                '"' => self.read_string(span)?,
                c if c.is_ascii_digit() => {
                    self.advance_char();
                    let number = self.read_number(start, start + 1);
                    self.push(TokenKind::Number, number, span);
                }
                c if c.is_ascii_alphabetic() || c == '_' => self.read_word(start, span),
                _ => return Err(unexpected(ch, span)),
            }
        }

        let span = self.span();
        self.push(TokenKind::EOF, "", span);
        debug!(tokens = self.tokens.len(), "tokenized source");
        Ok(self.tokens)
    }

    fn single(&mut self, kind: TokenKind, ch: char, span: Span) {
        self.advance_char();
        self.push(kind, ch.to_string(), span);
    }

    /// `-` is binary only after something that ends an operand. Elsewhere it
    /// either starts a negative literal or becomes `-1 *`.
    fn read_minus(&mut self, span: Span) {
        let binary = matches!(
            self.tokens.last().map(|token| token.kind),
            Some(TokenKind::Number | TokenKind::Identifier | TokenKind::RBracket)
        );
        let Some((start, _)) = self.advance_char() else {
            return;
        };
        if binary {
            self.push(TokenKind::Operator, "-", span);
            return;
        }

        let literal = self.read_number(start, start + 1);
        if literal == "-" {
            self.push(TokenKind::Number, "-1", span);
            self.push(TokenKind::Operator, "*", span);
        } else {
            self.push(TokenKind::Number, literal, span);
        }
    }

    /// Consumes digits and at most one decimal point; `start..end` is the
    /// already consumed prefix.
    fn read_number(&mut self, start: usize, mut end: usize) -> String {
        let mut seen_point = false;
        while let Some(&(idx, c)) = self.chars.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_point) {
                seen_point |= c == '.';
                self.advance_char();
                end = idx + c.len_utf8();
            } else {
                break;
            }
        }
        self.input[start..end].to_string()
    }

    fn read_word(&mut self, start: usize, span: Span) {
        self.advance_char();
        while let Some(&(_, c)) = self.chars.peek() {
            if is_word_char(c) {
                self.advance_char();
            } else {
                break;
            }
        }
        let end = self.current_index();
        let mut word = self.input[start..end].to_string();

        for (first, second) in [("cat", " timp"), ("pana", " cand")] {
            if word == first && self.lookahead_is(second) {
                for _ in 0..second.len() {
                    self.advance_char();
                }
                word.push_str(second);
            }
        }

        let kind = if KEYWORDS.contains(&word.as_str()) {
            TokenKind::Keyword
        } else if WORD_OPERATORS.contains(&word.as_str()) {
            TokenKind::Operator
        } else {
            TokenKind::Identifier
        };
        self.push(kind, word, span);
    }

    fn read_string(&mut self, span: Span) -> LexResult<()> {
        self.advance_char(); // Consume opening quote
        let mut content = String::new();
        while let Some((_, c)) = self.advance_char() {
            if c == '"' {
                self.push(TokenKind::String, content, span);
                return Ok(());
            }
            content.push(c);
        }
        Err(LexError::UnterminatedString {
            line: span.line,
            column: span.column,
        })
    }

    fn skip_comment(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn lookahead_is(&self, expected: &str) -> bool {
        let mut ahead = self.chars.clone();
        for expected_char in expected.chars() {
            match ahead.next() {
                Some((_, c)) if c == expected_char => {}
                _ => return false,
            }
        }
        !matches!(ahead.peek(), Some(&(_, c)) if is_word_char(c))
    }

    fn next_is(&mut self, expected: char) -> bool {
        matches!(self.chars.peek(), Some(&(_, c)) if c == expected)
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, span: Span) {
        self.tokens.push(Token::new(kind, text, span));
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn unexpected(character: char, span: Span) -> LexError {
    LexError::UnexpectedCharacter {
        character,
        code: character as u32,
        line: span.line,
        column: span.column,
    }
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn lexemes(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .expect("tokenize should succeed")
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    fn lexeme(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_string())
    }

    #[test]
    fn test_simple_program() {
        let input = indoc! {r#"
            citeste n
            cat timp n != 0 executa s = s + n % 10; n = [n / 10]
            scrie "s = ", s
        "#};
        let expected = vec![
            lexeme(TokenKind::Keyword, "citeste"),
            lexeme(TokenKind::Identifier, "n"),
            lexeme(TokenKind::Newline, "\n"),
            lexeme(TokenKind::Keyword, "cat timp"),
            lexeme(TokenKind::Identifier, "n"),
            lexeme(TokenKind::Operator, "diferit"),
            lexeme(TokenKind::Number, "0"),
            lexeme(TokenKind::Keyword, "executa"),
            lexeme(TokenKind::Identifier, "s"),
            lexeme(TokenKind::Assign, "="),
            lexeme(TokenKind::Identifier, "s"),
            lexeme(TokenKind::Operator, "+"),
            lexeme(TokenKind::Identifier, "n"),
            lexeme(TokenKind::Operator, "%"),
            lexeme(TokenKind::Number, "10"),
            lexeme(TokenKind::Newline, ";"),
            lexeme(TokenKind::Identifier, "n"),
            lexeme(TokenKind::Assign, "="),
            lexeme(TokenKind::LBracket, "["),
            lexeme(TokenKind::Identifier, "n"),
            lexeme(TokenKind::Operator, "/"),
            lexeme(TokenKind::Number, "10"),
            lexeme(TokenKind::RBracket, "]"),
            lexeme(TokenKind::Newline, "\n"),
            lexeme(TokenKind::Keyword, "scrie"),
            lexeme(TokenKind::String, "s = "),
            lexeme(TokenKind::Comma, ","),
            lexeme(TokenKind::Identifier, "s"),
            lexeme(TokenKind::Newline, "\n"),
            lexeme(TokenKind::EOF, ""),
        ];
        assert_eq!(lexemes(input), expected);
    }

    #[test]
    fn rewrites_symbolic_operators_to_words() {
        let kinds = lexemes("a <- b == c && !d || e");
        let expected = vec![
            lexeme(TokenKind::Identifier, "a"),
            lexeme(TokenKind::Assign, "="),
            lexeme(TokenKind::Identifier, "b"),
            lexeme(TokenKind::Operator, "egal"),
            lexeme(TokenKind::Identifier, "c"),
            lexeme(TokenKind::Operator, "si"),
            lexeme(TokenKind::Operator, "not"),
            lexeme(TokenKind::Identifier, "d"),
            lexeme(TokenKind::Operator, "sau"),
            lexeme(TokenKind::Identifier, "e"),
            lexeme(TokenKind::EOF, ""),
        ];
        assert_eq!(kinds, expected);
    }

    #[test]
    fn minus_depends_on_previous_token() {
        let kinds = lexemes("x = a - 3 * -2 + v[1] - -y");
        let expected = vec![
            lexeme(TokenKind::Identifier, "x"),
            lexeme(TokenKind::Assign, "="),
            lexeme(TokenKind::Identifier, "a"),
            lexeme(TokenKind::Operator, "-"),
            lexeme(TokenKind::Number, "3"),
            lexeme(TokenKind::Operator, "*"),
            lexeme(TokenKind::Number, "-2"),
            lexeme(TokenKind::Operator, "+"),
            lexeme(TokenKind::Identifier, "v"),
            lexeme(TokenKind::LBracket, "["),
            lexeme(TokenKind::Number, "1"),
            lexeme(TokenKind::RBracket, "]"),
            lexeme(TokenKind::Operator, "-"),
            lexeme(TokenKind::Number, "-1"),
            lexeme(TokenKind::Operator, "*"),
            lexeme(TokenKind::Identifier, "y"),
            lexeme(TokenKind::EOF, ""),
        ];
        assert_eq!(kinds, expected);
    }

    #[test]
    fn merges_two_word_keywords_only_on_exact_lookahead() {
        let kinds = lexemes("pana cand cat timpul");
        let expected = vec![
            lexeme(TokenKind::Keyword, "pana cand"),
            lexeme(TokenKind::Identifier, "cat"),
            lexeme(TokenKind::Identifier, "timpul"),
            lexeme(TokenKind::EOF, ""),
        ];
        assert_eq!(kinds, expected);
    }

    #[test]
    fn discards_line_comments_and_reads_decimals() {
        let kinds = lexemes("x = 3.14 // pi\n");
        let expected = vec![
            lexeme(TokenKind::Identifier, "x"),
            lexeme(TokenKind::Assign, "="),
            lexeme(TokenKind::Number, "3.14"),
            lexeme(TokenKind::Newline, "\n"),
            lexeme(TokenKind::EOF, ""),
        ];
        assert_eq!(kinds, expected);
    }

    #[test]
    fn tracks_token_positions() {
        let tokens = tokenize("a = 1\n  scrie a").expect("tokenize should succeed");
        let scrie = tokens
            .iter()
            .find(|token| token.is_keyword("scrie"))
            .expect("scrie token");
        assert_eq!(scrie.span, Span { line: 2, column: 3 });
    }

    #[test]
    fn errors_on_invalid_character() {
        let err = tokenize("x = 1 @ 2\n").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                character: '@',
                code: 64,
                line: 1,
                column: 7,
            }
        );
        assert!(err.to_string().contains("Caracter invalid: '@', ASCII: 64"));
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = tokenize("scrie \"abc\n").expect_err("expected lexing failure");
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 7 });
    }
}
