//! Block boundary detection over a token slice. None of these functions know
//! anything about statement semantics.

use crate::token::{Token, TokenKind};

/// Index of the token closing the group opened at `open`, honoring nesting.
pub(super) fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let open_kind = tokens.get(open)?.kind;
    let close_kind = match open_kind {
        TokenKind::LBrace => TokenKind::RBrace,
        TokenKind::LBracket => TokenKind::RBracket,
        TokenKind::LParen => TokenKind::RParen,
        _ => return None,
    };
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        if token.kind == open_kind {
            depth += 1;
        } else if token.kind == close_kind {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Index of the `pana cand` that balances a `repeta` whose body starts at
/// `start`. Nested `repeta` loops claim their own `pana cand`.
pub(super) fn matching_until(tokens: &[Token], start: usize) -> Option<usize> {
    let mut pending = 1usize;
    for (idx, token) in tokens.iter().enumerate().skip(start) {
        if token.is_keyword("repeta") {
            pending += 1;
        } else if token.is_keyword("pana cand") {
            pending -= 1;
            if pending == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// First index at or after `from` that cannot belong to a simple statement.
pub(super) fn statement_end(tokens: &[Token], from: usize) -> usize {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, token)| {
            matches!(
                token.kind,
                TokenKind::Newline | TokenKind::EOF | TokenKind::RBrace | TokenKind::Keyword
            )
        })
        .map(|(idx, _)| idx)
        .unwrap_or(tokens.len())
}

/// Splits on commas that are not nested inside (), [] or {}. At most
/// `limit` pieces are produced; the last one keeps any remaining commas.
pub(super) fn split_top_level(tokens: &[Token], limit: usize) -> Vec<&[Token]> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
            TokenKind::Comma if depth == 0 && pieces.len() + 1 < limit => {
                pieces.push(&tokens[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&tokens[start..]);
    pieces
}

/// Drops line breaks so that header pieces can be measured by token count.
pub(super) fn significant(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::Newline)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn finds_nested_closing_brace() {
        let tokens = tokenize("{ a = 1 { b = 2 } } c").expect("tokenize should succeed");
        assert_eq!(matching_close(&tokens, 0), Some(9));
        assert_eq!(matching_close(&tokens, 4), Some(8));
        assert_eq!(matching_close(&tokens, 1), None);
    }

    #[test]
    fn balances_nested_repeat_loops() {
        let tokens = tokenize("repeta repeta x = 1 pana cand x pana cand y")
            .expect("tokenize should succeed");
        // Body of the outer loop starts after the first `repeta`.
        assert_eq!(matching_until(&tokens, 1), Some(7));
    }

    #[test]
    fn splits_only_on_top_level_commas() {
        let tokens = tokenize("i = v[1, 2], n, i = i + 1, x").expect("tokenize should succeed");
        let pieces = split_top_level(&tokens[..tokens.len() - 1], 3);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].len(), 8);
        assert_eq!(pieces[1].len(), 1);
        assert_eq!(pieces[2].len(), 7);
    }
}
