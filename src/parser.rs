use tracing::debug;

use crate::ast::{AssignTarget, Operator, Postfix, Program, Statement, StatementKind, Term};
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

mod blocks;
mod error;
mod postfix;

use blocks::{matching_close, matching_until, significant, split_top_level, statement_end};
pub use error::{FrontendError, ParseError, ParseResult};
pub use postfix::to_postfix;

const COMPOUND_KEYWORDS: [&str; 4] = ["daca", "cat timp", "pentru", "repeta"];

/// Cursor over an immutable token slice. Nested blocks are parsed by a fresh
/// parser over the sub-slice that makes up the block.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_end() {
                break;
            }
            self.parse_statement(&mut statements)?;
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self, out: &mut Vec<Statement>) -> ParseResult<()> {
        let Some(token) = self.current() else {
            return Ok(());
        };
        let line = token.span.line;
        match token.kind {
            TokenKind::Keyword => match token.text.as_str() {
                "citeste" => self.parse_input(line, out),
                "scrie" => self.parse_output(line, out),
                "daca" => {
                    let statement = self.parse_if(line)?;
                    out.push(statement);
                    Ok(())
                }
                "cat timp" => {
                    let statement = self.parse_while(line)?;
                    out.push(statement);
                    Ok(())
                }
                "pentru" => {
                    let statement = self.parse_for(line)?;
                    out.push(statement);
                    Ok(())
                }
                "repeta" => {
                    let statement = self.parse_repeat(line)?;
                    out.push(statement);
                    Ok(())
                }
                keyword => Err(ParseError::UnexpectedKeyword {
                    keyword: keyword.to_string(),
                    line,
                }),
            },
            TokenKind::Identifier => self.parse_identifier_statement(line, out),
            TokenKind::LBrace => {
                let body = self.parse_braced(line)?;
                out.extend(body.statements);
                Ok(())
            }
            _ => {
                debug!(token = %token.text, line, "skipping stray token");
                self.pos += 1;
                Ok(())
            }
        }
    }

    fn parse_input(&mut self, line: usize, out: &mut Vec<Statement>) -> ParseResult<()> {
        self.pos += 1; // citeste
        let end = statement_end(self.tokens, self.pos);
        let mut names = 0;
        for token in &self.tokens[self.pos..end] {
            match token.kind {
                TokenKind::Identifier => {
                    out.push(Statement::new(line, StatementKind::Input(token.text.clone())));
                    names += 1;
                }
                TokenKind::Comma => {}
                _ => return Err(ParseError::InvalidVariable { line }),
            }
        }
        if names == 0 {
            return Err(ParseError::InvalidVariable { line });
        }
        self.pos = end;
        Ok(())
    }

    fn parse_output(&mut self, line: usize, out: &mut Vec<Statement>) -> ParseResult<()> {
        self.pos += 1; // scrie
        let end = statement_end(self.tokens, self.pos);
        for item in split_top_level(&self.tokens[self.pos..end], usize::MAX) {
            let kind = match item {
                [] => continue,
                [token] if token.kind == TokenKind::Identifier => {
                    StatementKind::Output(token.text.clone())
                }
                [token] if token.kind == TokenKind::String => {
                    StatementKind::OutputStr(token.text.clone())
                }
                _ => {
                    let expression = to_postfix(item)?;
                    if expression.is_empty() {
                        return Err(ParseError::InvalidOutputExpression { line });
                    }
                    StatementKind::OutputExpr(expression)
                }
            };
            out.push(Statement::new(line, kind));
        }
        out.push(Statement::new(line, StatementKind::Newline));
        self.pos = end;
        Ok(())
    }

    fn parse_if(&mut self, line: usize) -> ParseResult<Statement> {
        self.pos += 1; // daca
        let condition = self.parse_header("daca", "atunci", line)?;
        let then_body = self
            .parse_body()?
            .ok_or(ParseError::MissingBody {
                construct: "daca",
                line,
            })?;

        let before_else = self.pos;
        self.skip_newlines();
        let else_body = if self.current_is_keyword("altfel") {
            self.pos += 1;
            let body = self.parse_body()?.ok_or(ParseError::MissingBody {
                construct: "altfel",
                line,
            })?;
            Some(body)
        } else {
            self.pos = before_else;
            None
        };

        Ok(Statement::new(
            line,
            StatementKind::If {
                condition,
                then_body,
                else_body,
            },
        ))
    }

    fn parse_while(&mut self, line: usize) -> ParseResult<Statement> {
        self.pos += 1; // cat timp
        let condition = self.parse_header("cat timp", "executa", line)?;
        let body = self.parse_body()?.ok_or(ParseError::MissingBody {
            construct: "cat timp",
            line,
        })?;
        Ok(Statement::new(line, StatementKind::While { condition, body }))
    }

    fn parse_for(&mut self, line: usize) -> ParseResult<Statement> {
        self.pos += 1; // pentru
        self.skip_newlines();
        let header = self.take_header("executa");
        if significant(header).is_empty() {
            return Err(ParseError::MissingCondition {
                construct: "pentru",
                line,
            });
        }
        let body = self.parse_body()?.ok_or(ParseError::MissingBody {
            construct: "pentru",
            line,
        })?;

        let invalid = ParseError::InvalidSyntax {
            construct: "pentru",
            line,
        };
        let pieces = split_top_level(header, 3);
        let init = significant(pieces[0]);
        let bound = pieces.get(1).map(|piece| significant(piece)).unwrap_or_default();
        let step = pieces.get(2).map(|piece| significant(piece)).unwrap_or_default();
        if bound.is_empty() {
            return Err(invalid);
        }

        let (var, init_value) = match init.as_slice() {
            [name, assign, value @ ..]
                if name.kind == TokenKind::Identifier
                    && assign.kind == TokenKind::Assign
                    && !value.is_empty() =>
            {
                (name.text.clone(), to_postfix(value)?)
            }
            _ => return Err(invalid),
        };

        let mut descending = false;
        let step = match step.as_slice() {
            [] => increment(&var, Term::number("1"), line),
            [amount] => {
                if amount.kind == TokenKind::Number
                    && amount.text.parse::<f64>().is_ok_and(|value| value < 0.0)
                {
                    descending = true;
                }
                increment(&var, operand(amount).ok_or(invalid.clone())?, line)
            }
            tokens => {
                let mut parsed = Vec::new();
                Parser::new(tokens).parse_statement(&mut parsed)?;
                match parsed.pop() {
                    Some(statement)
                        if parsed.is_empty()
                            && matches!(statement.kind, StatementKind::Assign { .. }) =>
                    {
                        statement
                    }
                    _ => return Err(invalid),
                }
            }
        };

        // A bare bound such as `n` or `n - 1` means `var <= bound`, or
        // `var >= bound` when counting down.
        let bound = to_postfix(&bound)?;
        let is_comparison = bound.terms().iter().any(
            |term| matches!(term, Term::Operator(op) if op.is_relational_or_logical()),
        );
        let condition = if is_comparison {
            bound
        } else {
            let comparison = if descending {
                Operator::GreaterEqual
            } else {
                Operator::LessEqual
            };
            let mut terms = vec![Term::identifier(&var)];
            terms.extend(bound.0);
            terms.push(Term::Operator(comparison));
            Postfix(terms)
        };

        let init = Statement::new(
            line,
            StatementKind::Assign {
                target: AssignTarget::Name(var),
                value: init_value,
            },
        );
        Ok(Statement::new(
            line,
            StatementKind::For {
                init: Box::new(init),
                condition,
                step: Box::new(step),
                body,
            },
        ))
    }

    fn parse_repeat(&mut self, line: usize) -> ParseResult<Statement> {
        self.pos += 1; // repeta
        let invalid = ParseError::InvalidSyntax {
            construct: "repeta",
            line,
        };
        let until = matching_until(self.tokens, self.pos).ok_or(invalid)?;
        let body = Parser::new(&self.tokens[self.pos..until]).parse_program()?;
        if body.is_empty() {
            return Err(ParseError::MissingBody {
                construct: "repeta",
                line,
            });
        }

        self.pos = until + 1;
        let end = self.tokens[self.pos..]
            .iter()
            .position(|token| {
                matches!(
                    token.kind,
                    TokenKind::Newline | TokenKind::EOF | TokenKind::RBrace | TokenKind::Keyword
                )
            })
            .map(|offset| self.pos + offset)
            .unwrap_or(self.tokens.len());
        let condition = to_postfix(&self.tokens[self.pos..end])?;
        if condition.is_empty() {
            return Err(ParseError::MissingCondition {
                construct: "repeta",
                line,
            });
        }
        self.pos = end;
        Ok(Statement::new(line, StatementKind::DoWhile { condition, body }))
    }

    fn parse_identifier_statement(
        &mut self,
        line: usize,
        out: &mut Vec<Statement>,
    ) -> ParseResult<()> {
        let name = self.tokens[self.pos].text.clone();
        self.pos += 1;

        match self.current().map(|token| token.kind) {
            Some(TokenKind::Assign) => {
                self.pos += 1;
                let value = self.parse_rest_of_statement("atribuire", line)?;
                out.push(Statement::new(
                    line,
                    StatementKind::Assign {
                        target: AssignTarget::Name(name),
                        value,
                    },
                ));
            }
            Some(TokenKind::LBracket) => {
                let close = matching_close(self.tokens, self.pos)
                    .ok_or(ParseError::UnmatchedBracket { line })?;
                let index = to_postfix(&self.tokens[self.pos + 1..close])?;
                self.pos = close + 1;
                let kind = if self.current().map(|token| token.kind) == Some(TokenKind::Assign) {
                    self.pos += 1;
                    if self.current().map(|token| token.kind) == Some(TokenKind::LBrace) {
                        let elements = self.parse_vector_elements(line)?;
                        StatementKind::VectorInit {
                            name,
                            size: index,
                            elements,
                        }
                    } else if self.at_statement_end() {
                        return Err(ParseError::ExpectedVectorInit { name, line });
                    } else {
                        let value = self.parse_rest_of_statement("atribuire", line)?;
                        StatementKind::Assign {
                            target: AssignTarget::Element { name, index },
                            value,
                        }
                    }
                } else {
                    StatementKind::VectorAlloc { name, size: index }
                };
                self.expect_statement_end(line)?;
                out.push(Statement::new(line, kind));
            }
            _ => {
                self.expect_statement_end(line)?;
                debug!(name = %name, line, "skipping bare identifier");
            }
        }
        Ok(())
    }

    fn expect_statement_end(&self, line: usize) -> ParseResult<()> {
        match self.current() {
            Some(token) if !self.at_statement_end() => Err(ParseError::TrailingToken {
                text: token.text.clone(),
                line,
            }),
            _ => Ok(()),
        }
    }

    fn parse_vector_elements(&mut self, line: usize) -> ParseResult<Vec<Postfix>> {
        let close =
            matching_close(self.tokens, self.pos).ok_or(ParseError::UnclosedBrace { line })?;
        let inner = &self.tokens[self.pos + 1..close];
        let mut elements = Vec::new();
        for piece in split_top_level(inner, usize::MAX) {
            if significant(piece).is_empty() {
                continue;
            }
            elements.push(to_postfix(piece)?);
        }
        self.pos = close + 1;
        Ok(elements)
    }

    fn parse_rest_of_statement(
        &mut self,
        construct: &'static str,
        line: usize,
    ) -> ParseResult<Postfix> {
        let end = statement_end(self.tokens, self.pos);
        let value = to_postfix(&self.tokens[self.pos..end])?;
        if value.is_empty() {
            return Err(ParseError::InvalidSyntax { construct, line });
        }
        self.pos = end;
        Ok(value)
    }

    /// Reads a condition up to `keyword` or an opening brace, consuming the
    /// keyword if present.
    fn parse_header(
        &mut self,
        construct: &'static str,
        keyword: &str,
        line: usize,
    ) -> ParseResult<Postfix> {
        self.skip_newlines();
        let header = self.take_header(keyword);
        let condition = to_postfix(header)?;
        if condition.is_empty() {
            return Err(ParseError::MissingCondition { construct, line });
        }
        Ok(condition)
    }

    fn take_header(&mut self, keyword: &str) -> &'t [Token] {
        let start = self.pos;
        while let Some(token) = self.current() {
            if token.is_keyword(keyword) || token.kind == TokenKind::LBrace {
                break;
            }
            self.pos += 1;
        }
        let header = &self.tokens[start..self.pos];
        if self.current_is_keyword(keyword) {
            self.pos += 1;
        }
        header
    }

    /// Either a brace-delimited block or an inline body. An inline body is a
    /// single compound statement, or simple statements chained with `;` up to
    /// the end of the line. `None` when no body is present at all.
    fn parse_body(&mut self) -> ParseResult<Option<Program>> {
        self.skip_newlines();
        let Some(token) = self.current() else {
            return Ok(None);
        };
        let line = token.span.line;
        if token.kind == TokenKind::LBrace {
            return self.parse_braced(line).map(Some);
        }

        let mut statements = Vec::new();
        if COMPOUND_KEYWORDS.contains(&token.text.as_str()) && token.kind == TokenKind::Keyword {
            self.parse_statement(&mut statements)?;
        } else {
            while self.current().is_some_and(starts_statement) {
                self.parse_statement(&mut statements)?;
                let chained = self
                    .current()
                    .is_some_and(|token| token.is(TokenKind::Newline, ";"))
                    && self.tokens.get(self.pos + 1).is_some_and(starts_statement);
                if !chained {
                    break;
                }
                self.pos += 1;
            }
        }

        if statements.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Program::new(statements)))
        }
    }

    fn parse_braced(&mut self, line: usize) -> ParseResult<Program> {
        let close =
            matching_close(self.tokens, self.pos).ok_or(ParseError::UnclosedBrace { line })?;
        let body = Parser::new(&self.tokens[self.pos + 1..close]).parse_program()?;
        self.pos = close + 1;
        Ok(body)
    }

    fn skip_newlines(&mut self) {
        while self
            .current()
            .is_some_and(|token| token.kind == TokenKind::Newline)
        {
            self.pos += 1;
        }
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens
            .get(self.pos)
            .filter(|token| token.kind != TokenKind::EOF)
    }

    fn current_is_keyword(&self, keyword: &str) -> bool {
        self.current().is_some_and(|token| token.is_keyword(keyword))
    }

    fn at_statement_end(&self) -> bool {
        statement_end(self.tokens, self.pos) == self.pos
    }

    fn at_end(&self) -> bool {
        self.current().is_none()
    }
}

fn starts_statement(token: &Token) -> bool {
    match token.kind {
        TokenKind::Identifier | TokenKind::LBrace => true,
        TokenKind::Keyword => matches!(
            token.text.as_str(),
            "citeste" | "scrie" | "daca" | "cat timp" | "pentru" | "repeta"
        ),
        _ => false,
    }
}

fn operand(token: &Token) -> Option<Term> {
    match token.kind {
        TokenKind::Number => Some(Term::number(&token.text)),
        TokenKind::Identifier => Some(Term::identifier(&token.text)),
        _ => None,
    }
}

/// `var = var + amount`
fn increment(var: &str, amount: Term, line: usize) -> Statement {
    Statement::new(
        line,
        StatementKind::Assign {
            target: AssignTarget::Name(var.to_string()),
            value: Postfix(vec![
                Term::identifier(var),
                amount,
                Term::Operator(Operator::Add),
            ]),
        },
    )
}

pub fn parse_tokens(tokens: Vec<Token>) -> ParseResult<Program> {
    let program = Parser::new(&tokens).parse_program()?;
    let has_code = tokens
        .iter()
        .any(|token| !matches!(token.kind, TokenKind::Newline | TokenKind::EOF));
    if program.is_empty() && has_code {
        return Err(ParseError::EmptyProgram);
    }
    debug!(statements = program.statements.len(), "parsed program");
    Ok(program)
}

/// Tokenizes and parses `source` in one go.
pub fn parse(source: &str) -> Result<Program, FrontendError> {
    let tokens = tokenize(source)?;
    Ok(parse_tokens(tokens)?)
}
