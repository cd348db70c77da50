//! Postfix to C++ infix rendering.
//!
//! Comparisons and logical operators are parenthesized whenever they are
//! nested; arithmetic gets parentheses only where C++ precedence would
//! otherwise regroup the operands. `[x]` floors like the evaluator does and
//! `%` on a `double` operand becomes `fmod`, both of which pull in `<cmath>`.

use crate::ast::{Operator, Postfix, Term};

use super::TranspileError;
use super::types::{CppType, VariableTypes};

/// How tightly a rendered fragment holds together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Binding {
    Comparison,
    Additive,
    Multiplicative,
    Atom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Fragment {
    pub(super) text: String,
    binding: Binding,
    kind: CppType,
    pub(super) needs_cmath: bool,
}

impl Fragment {
    fn atom(text: String, kind: CppType) -> Self {
        Self {
            text,
            binding: Binding::Atom,
            kind,
            needs_cmath: false,
        }
    }

    fn with_cmath(mut self, needs_cmath: bool) -> Self {
        self.needs_cmath |= needs_cmath;
        self
    }

    fn operand_of(&self, parent: Binding, right: bool) -> String {
        let wrap = match self.binding {
            Binding::Comparison => true,
            binding => binding < parent || (right && binding == parent),
        };
        if wrap {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    /// Form usable between `<<` operators, which bind tighter than any
    /// comparison.
    pub(super) fn stream_operand(&self) -> String {
        self.operand_of(Binding::Additive, false)
    }
}

pub(super) fn render(
    expression: &Postfix,
    types: &VariableTypes,
) -> Result<Fragment, TranspileError> {
    let malformed = || TranspileError::MalformedExpression {
        expression: expression.to_string(),
    };
    let mut stack: Vec<Fragment> = Vec::new();

    for term in expression.terms() {
        let fragment = match term {
            Term::Number { literal, .. } => {
                let kind = if literal.contains('.') {
                    CppType::Double
                } else {
                    CppType::Int
                };
                Fragment::atom(literal.clone(), kind)
            }
            Term::Identifier(name) => Fragment::atom(name.clone(), types.scalar_type(name)),
            Term::String(text) => Fragment::atom(quote(text), CppType::String),
            Term::Operator(op) if op.is_unary() => {
                let operand = stack.pop().ok_or_else(malformed)?;
                match op {
                    Operator::Not => Fragment::atom(format!("!({})", operand.text), CppType::Int)
                        .with_cmath(operand.needs_cmath),
                    _ => Fragment::atom(format!("(int)floor({})", operand.text), CppType::Int)
                        .with_cmath(true),
                }
            }
            Term::Operator(Operator::Index) => {
                let index = stack.pop().ok_or_else(malformed)?;
                let base = stack.pop().ok_or_else(malformed)?;
                let kind = match types.vector_type(&base.text) {
                    Some(element) => element,
                    None if base.kind == CppType::String => CppType::String,
                    None => CppType::Int,
                };
                Fragment::atom(
                    format!("{}[{}]", base.operand_of(Binding::Atom, false), index.text),
                    kind,
                )
                .with_cmath(base.needs_cmath || index.needs_cmath)
            }
            Term::Operator(Operator::Mod) => {
                let right = stack.pop().ok_or_else(malformed)?;
                let left = stack.pop().ok_or_else(malformed)?;
                let needs_cmath = left.needs_cmath || right.needs_cmath;
                if left.kind == CppType::Double || right.kind == CppType::Double {
                    Fragment::atom(
                        format!("fmod({}, {})", left.text, right.text),
                        CppType::Double,
                    )
                    .with_cmath(true)
                } else {
                    binary(Operator::Mod, left, right).with_cmath(needs_cmath)
                }
            }
            Term::Operator(op) => {
                let right = stack.pop().ok_or_else(malformed)?;
                let left = stack.pop().ok_or_else(malformed)?;
                binary(*op, left, right)
            }
        };
        stack.push(fragment);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(fragment), true) => Ok(fragment),
        _ => Err(malformed()),
    }
}

fn binary(op: Operator, left: Fragment, right: Fragment) -> Fragment {
    let binding = binding(op);
    let kind = match binding {
        Binding::Comparison => CppType::Int,
        _ => left.kind.max(right.kind),
    };
    Fragment {
        text: format!(
            "{} {} {}",
            left.operand_of(binding, false),
            cpp_operator(op),
            right.operand_of(binding, true)
        ),
        binding,
        kind,
        needs_cmath: left.needs_cmath || right.needs_cmath,
    }
}

/// C++ string literal for `text`.
pub(super) fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn binding(op: Operator) -> Binding {
    match op {
        Operator::Add | Operator::Sub => Binding::Additive,
        Operator::Mul | Operator::Div | Operator::Mod => Binding::Multiplicative,
        Operator::Not | Operator::IntPart | Operator::Index => Binding::Atom,
        _ => Binding::Comparison,
    }
}

fn cpp_operator(op: Operator) -> &'static str {
    match op {
        Operator::Equal => "==",
        Operator::NotEqual => "!=",
        Operator::And => "&&",
        Operator::Or => "||",
        other => other.symbol(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::{parse, to_postfix};

    fn typed(declarations: &str, source: &str) -> Fragment {
        let types = VariableTypes::infer(&parse(declarations).expect("parse failed"));
        let mut tokens = tokenize(source).expect("tokenize failed");
        tokens.pop();
        let expression = to_postfix(&tokens).expect("postfix failed");
        render(&expression, &types).expect("render failed")
    }

    fn cpp(source: &str) -> String {
        typed("", source).text
    }

    #[test]
    fn keeps_arithmetic_grouping() {
        assert_eq!(cpp("a - b - c"), "a - b - c");
        assert_eq!(cpp("a - (b - c)"), "a - (b - c)");
        assert_eq!(cpp("(a + b) * c"), "(a + b) * c");
        assert_eq!(cpp("a + b * c"), "a + b * c");
        assert_eq!(cpp("-x + 1"), "-1 * x + 1");
    }

    #[test]
    fn wraps_nested_comparisons() {
        assert_eq!(cpp("a < b"), "a < b");
        assert_eq!(cpp("a < b si c egal d"), "(a < b) && (c == d)");
        assert_eq!(cpp("a = b sau c"), "a == (b || c)");
        assert_eq!(cpp("not (a diferit 0)"), "!(a != 0)");
    }

    #[test]
    fn renders_pseudo_operators() {
        assert_eq!(cpp("[x / 10]"), "(int)floor(x / 10)");
        assert_eq!(cpp("[x] * 2"), "(int)floor(x) * 2");
        assert_eq!(cpp("v[i + 1] * 2"), "v[i + 1] * 2");
        assert_eq!(cpp("m[v[0]]"), "m[v[0]]");
    }

    #[test]
    fn floors_and_takes_double_remainders_through_cmath() {
        assert!(typed("", "[0 - 7 / 2]").needs_cmath);
        assert!(!typed("", "a % 2 + 1").needs_cmath);

        let declarations = "x = 2.5\nn = 3\nv[0] = 1.5";
        let fragment = typed(declarations, "x % 2 + n % 2");
        assert_eq!(fragment.text, "fmod(x, 2) + n % 2");
        assert!(fragment.needs_cmath);
        assert_eq!(typed(declarations, "v[1] % n").text, "fmod(v[1], n)");
        assert_eq!(typed(declarations, "(n + 0.5) % 2").text, "fmod(n + 0.5, 2)");
        assert_eq!(typed(declarations, "n % 2 = 0").text, "n % 2 == 0");
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(quote("a \"b\"\\"), "\"a \\\"b\\\"\\\\\"");
        assert_eq!(cpp("\"x\" + 1"), "\"x\" + 1");
    }

    #[test]
    fn rejects_unbalanced_postfix() {
        let expression = Postfix(vec![Term::number("1"), Term::number("2")]);
        assert_eq!(
            render(&expression, &VariableTypes::default()),
            Err(TranspileError::MalformedExpression {
                expression: "1 2".to_string()
            })
        );
        let expression = Postfix(vec![Term::Operator(Operator::Add)]);
        assert!(render(&expression, &VariableTypes::default()).is_err());
    }
}
