//! Infix to postfix conversion (shunting-yard).
//!
//! Square brackets play two roles: after an operand they index it (`v[i]`
//! becomes `v i index`), anywhere else they take the integer part
//! (`[x / 10]` becomes `x 10 / int`).

use crate::ast::{Operator, Postfix, Term};
use crate::token::{Token, TokenKind};

use super::error::{ParseError, ParseResult};

enum Pending {
    Op(Operator),
    Paren,
    Bracket { int_part: bool },
}

pub fn to_postfix(tokens: &[Token]) -> ParseResult<Postfix> {
    let mut output = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();
    let mut after_operand = false;
    let mut line = tokens.first().map(|token| token.span.line).unwrap_or(0);

    for token in tokens {
        line = token.span.line;
        match token.kind {
            TokenKind::Newline => continue,
            TokenKind::Number => {
                output.push(Term::number(&token.text));
                after_operand = true;
            }
            TokenKind::Identifier => {
                output.push(Term::identifier(&token.text));
                after_operand = true;
            }
            TokenKind::String => {
                output.push(Term::String(token.text.clone()));
                after_operand = true;
            }
            TokenKind::Operator | TokenKind::Assign => {
                let op = if token.kind == TokenKind::Assign {
                    Operator::Equal
                } else {
                    Operator::from_word(&token.text).ok_or_else(|| unexpected(token))?
                };
                if !op.is_unary() {
                    while let Some(Pending::Op(top)) = stack.last() {
                        if top.precedence() >= op.precedence() {
                            output.push(Term::Operator(*top));
                            stack.pop();
                        } else {
                            break;
                        }
                    }
                }
                stack.push(Pending::Op(op));
                after_operand = false;
            }
            TokenKind::LParen => {
                stack.push(Pending::Paren);
                after_operand = false;
            }
            TokenKind::LBracket => {
                stack.push(Pending::Bracket {
                    int_part: !after_operand,
                });
                after_operand = false;
            }
            TokenKind::RParen => {
                loop {
                    match stack.pop() {
                        Some(Pending::Op(op)) => output.push(Term::Operator(op)),
                        Some(Pending::Paren) => break,
                        Some(Pending::Bracket { .. }) | None => {
                            return Err(ParseError::UnmatchedParen { line });
                        }
                    }
                }
                after_operand = true;
            }
            TokenKind::RBracket => {
                loop {
                    match stack.pop() {
                        Some(Pending::Op(op)) => output.push(Term::Operator(op)),
                        Some(Pending::Bracket { int_part }) => {
                            let op = if int_part {
                                Operator::IntPart
                            } else {
                                Operator::Index
                            };
                            output.push(Term::Operator(op));
                            break;
                        }
                        Some(Pending::Paren) | None => {
                            return Err(ParseError::UnmatchedBracket { line });
                        }
                    }
                }
                after_operand = true;
            }
            TokenKind::Comma
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::Keyword
            | TokenKind::EOF => return Err(unexpected(token)),
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Op(op) => output.push(Term::Operator(op)),
            Pending::Paren => return Err(ParseError::UnmatchedParen { line }),
            Pending::Bracket { .. } => return Err(ParseError::UnmatchedBracket { line }),
        }
    }

    Ok(Postfix(output))
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        text: token.text.clone(),
        line: token.span.line,
    }
}
