use std::slice;

use crate::ast::{AssignTarget, Postfix, Program, Statement, StatementKind, Term};

/// C++ storage chosen for a pseudocode variable. Ordered so that a wider
/// type wins when a variable is assigned several kinds of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum CppType {
    Int,
    Double,
    String,
}

impl CppType {
    pub(super) fn name(self) -> &'static str {
        match self {
            CppType::Int => "int",
            CppType::Double => "double",
            CppType::String => "string",
        }
    }

    fn of_expression(expression: &Postfix) -> Self {
        expression
            .terms()
            .iter()
            .map(|term| match term {
                Term::String(_) => CppType::String,
                Term::Number { literal, .. } if literal.contains('.') => CppType::Double,
                _ => CppType::Int,
            })
            .max()
            .unwrap_or(CppType::Int)
    }
}

/// Declared types in first-seen order, split into scalars and vectors.
#[derive(Debug, Default)]
pub(super) struct VariableTypes {
    scalars: Vec<(String, CppType)>,
    vectors: Vec<(String, CppType)>,
}

impl VariableTypes {
    pub(super) fn infer(program: &Program) -> Self {
        let mut types = Self::default();
        types.visit(&program.statements);
        let vectors = std::mem::take(&mut types.vectors);
        types
            .scalars
            .retain(|(name, _)| !vectors.iter().any(|(vector, _)| vector == name));
        types.vectors = vectors;
        types
    }

    fn visit(&mut self, statements: &[Statement]) {
        for statement in statements {
            match &statement.kind {
                StatementKind::Input(name) => widen(&mut self.scalars, name, CppType::Int),
                StatementKind::Assign {
                    target: AssignTarget::Name(name),
                    value,
                } => widen(&mut self.scalars, name, CppType::of_expression(value)),
                StatementKind::Assign {
                    target: AssignTarget::Element { name, .. },
                    value,
                } => widen(&mut self.vectors, name, CppType::of_expression(value)),
                StatementKind::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.visit(&then_body.statements);
                    if let Some(else_body) = else_body {
                        self.visit(&else_body.statements);
                    }
                }
                StatementKind::While { body, .. } | StatementKind::DoWhile { body, .. } => {
                    self.visit(&body.statements)
                }
                StatementKind::For {
                    init, step, body, ..
                } => {
                    self.visit(slice::from_ref(init.as_ref()));
                    self.visit(slice::from_ref(step.as_ref()));
                    self.visit(&body.statements);
                }
                StatementKind::VectorAlloc { name, .. } => {
                    widen(&mut self.vectors, name, CppType::Int)
                }
                StatementKind::VectorInit { name, elements, .. } => {
                    let element_type = elements
                        .iter()
                        .map(CppType::of_expression)
                        .max()
                        .unwrap_or(CppType::Int);
                    widen(&mut self.vectors, name, element_type)
                }
                StatementKind::Output(_)
                | StatementKind::OutputStr(_)
                | StatementKind::OutputExpr(_)
                | StatementKind::Newline => {}
            }
        }
    }

    /// Scalar declarations of `kind`, in first-seen order.
    pub(super) fn scalars_of(&self, kind: CppType) -> impl Iterator<Item = &str> {
        self.scalars
            .iter()
            .filter(move |(_, declared)| *declared == kind)
            .map(|(name, _)| name.as_str())
    }

    pub(super) fn element_type(&self, vector: &str) -> CppType {
        self.vector_type(vector).unwrap_or(CppType::Int)
    }

    pub(super) fn vector_type(&self, vector: &str) -> Option<CppType> {
        self.vectors
            .iter()
            .find(|(name, _)| name == vector)
            .map(|(_, kind)| *kind)
    }

    /// Declared type of a scalar; names never assigned count as `int`.
    pub(super) fn scalar_type(&self, scalar: &str) -> CppType {
        self.scalars
            .iter()
            .find(|(name, _)| name == scalar)
            .map_or(CppType::Int, |(_, kind)| *kind)
    }

    pub(super) fn uses_strings(&self) -> bool {
        self.scalars
            .iter()
            .chain(&self.vectors)
            .any(|(_, kind)| *kind == CppType::String)
    }

    pub(super) fn uses_vectors(&self) -> bool {
        !self.vectors.is_empty()
    }
}

fn widen(types: &mut Vec<(String, CppType)>, name: &str, kind: CppType) {
    match types.iter_mut().find(|(declared, _)| declared == name) {
        Some((_, declared)) => *declared = (*declared).max(kind),
        None => types.push((name.to_string(), kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn infer(source: &str) -> VariableTypes {
        VariableTypes::infer(&parse(source).expect("parse failed"))
    }

    #[test]
    fn widens_without_narrowing() {
        let types = infer("x = 1\nx = 2.5\nx = 3\ns = 1\ns = \"a\" + s\nciteste n");
        assert_eq!(types.scalars_of(CppType::Int).collect::<Vec<_>>(), ["n"]);
        assert_eq!(types.scalars_of(CppType::Double).collect::<Vec<_>>(), ["x"]);
        assert_eq!(types.scalars_of(CppType::String).collect::<Vec<_>>(), ["s"]);
        assert!(types.uses_strings());
        assert!(!types.uses_vectors());
    }

    #[test]
    fn looks_inside_nested_bodies() {
        let types = infer(
            "pentru i = 0.5, 3 {\ndaca i > 1 atunci t = \"mare\"\naltfel u = 1\n}",
        );
        assert_eq!(types.scalars_of(CppType::Double).collect::<Vec<_>>(), ["i"]);
        assert_eq!(types.scalars_of(CppType::String).collect::<Vec<_>>(), ["t"]);
        assert_eq!(types.scalars_of(CppType::Int).collect::<Vec<_>>(), ["u"]);
    }

    #[test]
    fn keeps_vectors_out_of_scalar_declarations() {
        let types = infer("v[3]\nv[0] = 1.5\nw[2] = {1, 2}\nv = 1");
        assert_eq!(types.scalars_of(CppType::Int).count(), 0);
        assert_eq!(types.element_type("v"), CppType::Double);
        assert_eq!(types.element_type("w"), CppType::Int);
        assert!(types.uses_vectors());
    }
}
