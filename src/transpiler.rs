//! C++ source generation.
//!
//! The output is one `main` function: scalar declarations inferred from the
//! assignments, followed by the statements in order. Statements that cannot
//! be expressed degrade to a `// Eroare:` comment instead of failing the
//! whole translation.

use std::slice;

use thiserror::Error;
use tracing::{debug, warn};

use self::expression::{Fragment, quote, render};
use self::types::{CppType, VariableTypes};
use crate::ast::{AssignTarget, Postfix, Program, Statement, StatementKind, Term};
use crate::parser::{FrontendError, parse};

mod expression;
mod types;

const INDENT: &str = "    ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranspileError {
    #[error("expresie invalida \"{expression}\"")]
    MalformedExpression { expression: String },
    #[error("pasul buclei \"pentru\" de pe linia {line} nu este o atribuire")]
    UnsupportedStep { line: usize },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transpiler;

impl Transpiler {
    pub fn new() -> Self {
        Self
    }

    pub fn transpile(&self, program: &Program) -> String {
        let types = VariableTypes::infer(program);
        let mut emitter = Emitter {
            types: &types,
            output: String::new(),
            needs_cmath: false,
        };
        emitter.block(&program.statements, 1);

        let mut output = String::from("#include <iostream>\n");
        if emitter.needs_cmath {
            output.push_str("#include <cmath>\n");
        }
        if types.uses_strings() {
            output.push_str("#include <string>\n");
        }
        if types.uses_vectors() {
            output.push_str("#include <vector>\n");
        }
        output.push_str("\nusing namespace std;\n\nint main() {\n");

        let mut declared = false;
        for kind in [CppType::String, CppType::Int, CppType::Double] {
            for name in types.scalars_of(kind) {
                output.push_str(&format!("{INDENT}{} {name};\n", kind.name()));
                declared = true;
            }
        }
        if declared {
            output.push('\n');
        }

        output.push_str(&emitter.output);
        output.push_str(INDENT);
        output.push_str("return 0;\n}\n");
        debug!(bytes = output.len(), "transpiled program");
        output
    }
}

pub fn transpile(program: &Program) -> String {
    Transpiler::new().transpile(program)
}

/// Parses `source` and translates it; only the front end can fail.
pub fn transpile_source(source: &str) -> Result<String, FrontendError> {
    let program = parse(source)?;
    Ok(transpile(&program))
}

struct Emitter<'a> {
    types: &'a VariableTypes,
    output: String,
    needs_cmath: bool,
}

impl Emitter<'_> {
    fn render(&mut self, expression: &Postfix) -> Result<Fragment, TranspileError> {
        let fragment = render(expression, self.types)?;
        self.needs_cmath |= fragment.needs_cmath;
        Ok(fragment)
    }

    fn block(&mut self, statements: &[Statement], depth: usize) {
        let mut pos = 0;
        while pos < statements.len() {
            if !statements[pos].is_output() {
                self.statement(&statements[pos], depth);
                pos += 1;
                continue;
            }

            let start = pos;
            while statements.get(pos).is_some_and(Statement::is_output) {
                pos += 1;
            }
            let group = &statements[start..pos];
            let line_break = statements
                .get(pos)
                .is_some_and(|statement| statement.kind == StatementKind::Newline);
            if line_break {
                pos += 1;
            }
            self.output_group(group, line_break, depth);
        }
    }

    /// Consecutive output items share one `cout` chain; the `scrie` line
    /// break that follows them becomes `endl`.
    fn output_group(&mut self, group: &[Statement], line_break: bool, depth: usize) {
        let mut parts = Vec::with_capacity(group.len() + 1);
        for statement in group {
            match &statement.kind {
                StatementKind::Output(name) => parts.push(name.clone()),
                StatementKind::OutputStr(text) => parts.push(quote(text)),
                StatementKind::OutputExpr(expression) => match self.render(expression) {
                    Ok(fragment) => parts.push(fragment.stream_operand()),
                    Err(error) => self.degrade(&error, depth),
                },
                _ => {}
            }
        }
        if line_break {
            parts.push("endl".to_string());
        }
        if !parts.is_empty() {
            self.line(depth, &format!("cout << {};", parts.join(" << ")));
        }
    }

    fn statement(&mut self, statement: &Statement, depth: usize) {
        if let Err(error) = self.try_statement(statement, depth) {
            self.degrade(&error, depth);
        }
    }

    /// Every fallible rendering happens before the first line is written, so
    /// a failed statement leaves no partial output behind.
    fn try_statement(&mut self, statement: &Statement, depth: usize) -> Result<(), TranspileError> {
        match &statement.kind {
            StatementKind::Input(name) => self.line(depth, &format!("cin >> {name};")),
            StatementKind::Output(_) | StatementKind::OutputStr(_) | StatementKind::OutputExpr(_) => {
                self.output_group(slice::from_ref(statement), false, depth)
            }
            StatementKind::Newline => self.line(depth, "cout << endl;"),
            StatementKind::Assign { .. } => {
                let assignment = self.assignment(statement)?;
                self.line(depth, &format!("{assignment};"));
            }
            StatementKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let condition = self.render(condition)?.text;
                self.line(depth, &format!("if ({condition}) {{"));
                self.block(&then_body.statements, depth + 1);
                if let Some(else_body) = else_body {
                    self.line(depth, "} else {");
                    self.block(&else_body.statements, depth + 1);
                }
                self.line(depth, "}");
            }
            StatementKind::While { condition, body } => {
                let condition = self.render(condition)?.text;
                self.line(depth, &format!("while ({condition}) {{"));
                self.block(&body.statements, depth + 1);
                self.line(depth, "}");
            }
            StatementKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let init = self.assignment(init)?;
                let condition = self.render(condition)?.text;
                let step = self.assignment(step)?;
                self.line(depth, &format!("for ({init}; {condition}; {step}) {{"));
                self.block(&body.statements, depth + 1);
                self.line(depth, "}");
            }
            StatementKind::DoWhile { condition, body } => {
                let condition = self.render(condition)?.text;
                self.line(depth, "do {");
                self.block(&body.statements, depth + 1);
                self.line(depth, &format!("}} while (!({condition}));"));
            }
            StatementKind::VectorAlloc { name, size } => {
                let size = self.render(size)?.text;
                let element = self.types.element_type(name).name();
                self.line(depth, &format!("vector<{element}> {name}({size});"));
            }
            StatementKind::VectorInit {
                name,
                size,
                elements,
            } => {
                let rendered_size = self.render(size)?.text;
                let elements = elements
                    .iter()
                    .map(|element| self.render(element).map(|fragment| fragment.text))
                    .collect::<Result<Vec<_>, _>>()?;
                let element = self.types.element_type(name).name();
                if elements.is_empty() {
                    self.line(depth, &format!("vector<{element}> {name}({rendered_size});"));
                    return Ok(());
                }
                self.line(
                    depth,
                    &format!("vector<{element}> {name} = {{ {} }};", elements.join(", ")),
                );
                if !is_literal_count(size, elements.len()) {
                    self.line(depth, &format!("{name}.resize({rendered_size});"));
                }
            }
        }
        Ok(())
    }

    fn assignment(&mut self, statement: &Statement) -> Result<String, TranspileError> {
        let StatementKind::Assign { target, value } = &statement.kind else {
            return Err(TranspileError::UnsupportedStep {
                line: statement.line,
            });
        };
        let target = match target {
            AssignTarget::Name(name) => name.clone(),
            AssignTarget::Element { name, index } => {
                format!("{name}[{}]", self.render(index)?.text)
            }
        };
        Ok(format!("{target} = {}", self.render(value)?.text))
    }

    fn degrade(&mut self, error: &TranspileError, depth: usize) {
        warn!(%error, "statement left untranslated");
        self.line(depth, &format!("// Eroare: {error}"));
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.output.push_str(INDENT);
        }
        self.output.push_str(text);
        self.output.push('\n');
    }
}

fn is_literal_count(size: &Postfix, count: usize) -> bool {
    matches!(size.terms(), [Term::Number { value, .. }] if *value == count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn cpp(source: &str) -> String {
        transpile_source(source).expect("transpile failed")
    }

    #[test]
    fn translates_input_loop_and_grouped_output() {
        let source = indoc! {r#"
            citeste n
            s = 0
            pentru i = 1, n executa s = s + i
            scrie "suma = ", s
        "#};
        let expected = indoc! {r#"
            #include <iostream>

            using namespace std;

            int main() {
                int n;
                int s;
                int i;

                cin >> n;
                s = 0;
                for (i = 1; i <= n; i = i + 1) {
                    s = s + i;
                }
                cout << "suma = " << s << endl;
                return 0;
            }
        "#};
        assert_eq!(cpp(source), expected);
    }

    #[test]
    fn infers_types_and_translates_control_flow() {
        let source = indoc! {r#"
            nume = "Ana"
            x = 2.5
            x = 3
            v[3] = {1, 2, 3}
            daca x > 2 si not (x = 3) atunci scrie nume, x * (2 + 1)
            altfel scrie x > 2
            repeta x = x - 1 pana cand x <= 0
        "#};
        let expected = indoc! {r#"
            #include <iostream>
            #include <string>
            #include <vector>

            using namespace std;

            int main() {
                string nume;
                double x;

                nume = "Ana";
                x = 2.5;
                x = 3;
                vector<int> v = { 1, 2, 3 };
                if ((x > 2) && !(x == 3)) {
                    cout << nume << x * (2 + 1) << endl;
                } else {
                    cout << (x > 2) << endl;
                }
                do {
                    x = x - 1;
                } while (!(x <= 0));
                return 0;
            }
        "#};
        assert_eq!(cpp(source), expected);
    }

    #[test]
    fn translates_while_with_integer_part() {
        let output = cpp("citeste n\ncnt = 0\ncat timp n != 0 executa cnt = cnt + 1; n = [n / 10]\nscrie cnt");
        assert!(output.contains(indoc! {"
                while (n != 0) {
                    cnt = cnt + 1;
                    n = (int)floor(n / 10);
                }
                cout << cnt << endl;
        "}));
        assert!(output.starts_with("#include <iostream>\n#include <cmath>\n\n"));
    }

    #[test]
    fn keeps_cmath_out_of_programs_without_it() {
        let output = cpp("n = 7\nscrie n % 2");
        assert!(!output.contains("<cmath>"));
        assert!(output.contains("cout << n % 2 << endl;"));
    }

    #[test]
    fn takes_remainders_of_doubles_with_fmod() {
        let output = cpp("x = 7.5\ndaca x % 2 > 1 atunci scrie [x]");
        assert!(output.contains("#include <cmath>\n"));
        assert!(output.contains(indoc! {"
                if (fmod(x, 2) > 1) {
                    cout << (int)floor(x) << endl;
                }
        "}), "{output}");
    }

    #[test]
    fn translates_vector_forms() {
        let output = cpp("citeste n\nv[n] = {4, 5}\nw[5]\nw[0] = 1.5\nscrie\nscrie w[0]");
        assert!(output.contains("    vector<int> v = { 4, 5 };\n    v.resize(n);\n"));
        assert!(output.contains("    vector<double> w(5);\n    w[0] = 1.5;\n"));
        assert!(output.contains("    cout << endl;\n    cout << w[0] << endl;\n"));
        assert!(!output.contains("int v;"));
    }

    #[test]
    fn escapes_output_strings() {
        let output = cpp("scrie \"x\\y\ttab\"");
        assert!(output.contains(r#"cout << "x\\y\ttab" << endl;"#), "{output}");
    }

    #[test]
    fn degrades_untranslatable_statements_to_comments() {
        let program = Program::new(vec![
            Statement::new(
                1,
                StatementKind::Assign {
                    target: AssignTarget::Name("x".to_string()),
                    value: Postfix(vec![Term::number("1"), Term::number("2")]),
                },
            ),
            Statement::new(2, StatementKind::OutputStr("ok".to_string())),
            Statement::new(2, StatementKind::Newline),
        ]);
        let output = transpile(&program);
        assert!(output.contains("    // Eroare: expresie invalida \"1 2\"\n    cout << \"ok\" << endl;\n"));
    }

    #[test]
    fn reports_front_end_failures() {
        assert!(matches!(
            transpile_source("x = @"),
            Err(FrontendError::Lex(_))
        ));
        assert!(matches!(
            transpile_source("daca x > 1 atunci"),
            Err(FrontendError::Parse(_))
        ));
    }
}
