use anyhow::Result;
use tracing::debug;

use crate::ast::Program;
use crate::backend::{Backend, PreparedBackend};
use crate::config::Config;

mod error;
mod io;
pub(crate) mod machine;
mod value;

pub use error::{LoopKind, RuntimeError, RuntimeResult};
pub use io::{InputSource, LineBuffer, OutputSink};
pub(crate) use io::{parse_lenient, parse_strict};
use machine::{Machine, Step};
pub use value::{Environment, Value, format_number};

/// Runs `program` to completion against `environment`.
///
/// Every `citeste` asks `input` for raw text, which must parse as a number.
/// The environment keeps whatever state the program reached, including when
/// it fails part way.
pub fn evaluate(
    program: &Program,
    environment: &mut Environment,
    out: &mut dyn OutputSink,
    input: &mut dyn InputSource,
    max_iterations: usize,
) -> RuntimeResult<()> {
    let mut machine = Machine::new(program, std::mem::take(environment), max_iterations);
    let result = loop {
        match machine.step(out) {
            Ok(Step::Finished) => break Ok(()),
            Ok(Step::Executed { .. }) => {}
            Ok(Step::Input { name, .. }) => {
                let Some(raw) = input.read(&name) else {
                    break Err(RuntimeError::MissingInput { name });
                };
                match parse_strict(&raw) {
                    Some(value) => machine.store_input(&name, value),
                    None => break Err(RuntimeError::InvalidInput { name }),
                }
            }
            Err(error) => break Err(error),
        }
    };
    *environment = machine.into_environment();
    result
}

/// Batch-runs `program` with queued input values, returning the console
/// output with lines joined by `\n`.
pub fn run_to_string(program: &Program, input: &[String], config: &Config) -> RuntimeResult<String> {
    let mut environment = Environment::new();
    let mut output = LineBuffer::new();
    let mut queue = input.iter();
    let mut next_input = |_: &str| queue.next().cloned();
    evaluate(
        program,
        &mut environment,
        &mut output,
        &mut next_input,
        config.max_iterations,
    )?;
    debug!(variables = environment.len(), "program finished");
    Ok(output.finish())
}

/// Tree-walking backend: executes the statement tree directly.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: Config,
    input: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            input: Vec::new(),
        }
    }

    /// Values handed out, in order, to `citeste` statements.
    pub fn with_input(mut self, input: Vec<String>) -> Self {
        self.input = input;
        self
    }
}

pub struct PreparedInterpreter {
    program: Program,
    config: Config,
    input: Vec<String>,
}

impl PreparedBackend for PreparedInterpreter {
    fn run(&self) -> Result<String> {
        Ok(run_to_string(&self.program, &self.input, &self.config)?)
    }
}

impl Backend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedInterpreter {
            program: program.clone(),
            config: self.config,
            input: self.input.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn run(source: &str, input: &[&str]) -> RuntimeResult<String> {
        let program = parse(source).expect("parse failed");
        let input: Vec<String> = input.iter().map(|value| value.to_string()).collect();
        run_to_string(&program, &input, &Config::default())
    }

    fn expect_runtime_error(error: anyhow::Error) -> RuntimeError {
        error
            .downcast::<RuntimeError>()
            .expect("expected RuntimeError")
    }

    #[test]
    fn counts_digits_with_inline_loop_body() {
        let output = run(
            indoc! {"
                citeste n
                cnt = 0
                cat timp n != 0 executa cnt = cnt + 1; n = [n / 10]
                scrie cnt
            "},
            &["12345"],
        )
        .expect("run failed");
        assert_eq!(output, "5");
    }

    #[test]
    fn buffers_items_of_one_scrie_on_one_line() {
        let output = run(
            indoc! {r#"
                a = 5
                b <- 3.14
                scrie "a = ", a, ", b = ", b
                scrie a / 2, " ", a % 2 = 1
                scrie
                scrie "gata"
            "#},
            &[],
        )
        .expect("run failed");
        assert_eq!(output, "a = 5, b = 3.14\n2.5 1\n\ngata");
    }

    #[test]
    fn runs_every_loop_shape() {
        let output = run(
            indoc! {r#"
                pentru i = 5, -5, -2 {
                    scrie i
                }
                x = 3
                repeta scrie x, " "; x = x - 1 pana cand x = 0
                daca x % 2 = 0 atunci scrie x, " e par"
                altfel scrie x, " e impar"
            "#},
            &[],
        )
        .expect("run failed");
        assert_eq!(output, "5\n3\n1\n-1\n-3\n-5\n3 \n2 \n1 \n0 e par");
    }

    #[test]
    fn sums_vector_elements() {
        let output = run(
            indoc! {r#"
                citeste n
                pentru i = 0, i < n, i = i + 1 executa
                    v[i] = i * i
                s = 0
                pentru i = 0, n - 1 executa s = s + v[i]
                scrie "suma: ", s
                scrie v
            "#},
            &["4"],
        )
        .expect("run failed");
        assert_eq!(output, "suma: 14\n0,1,4,9");
    }

    #[test]
    fn rejects_non_numeric_input() {
        let error = run("citeste a\nscrie a", &["abc"]).expect_err("expected failure");
        assert_eq!(
            error,
            RuntimeError::InvalidInput {
                name: "a".to_string()
            }
        );
        assert_eq!(
            error.to_string(),
            "Valoarea introdusa pentru variabila \"a\" nu este un numar valid!"
        );
    }

    #[test]
    fn rejects_nan_and_infinity_spellings() {
        for spelling in ["nan", "NaN", "inf", "infinity", "-Infinity"] {
            let error = run("citeste a\nscrie a", &[spelling]).expect_err("expected failure");
            assert_eq!(
                error,
                RuntimeError::InvalidInput {
                    name: "a".to_string()
                },
                "accepted {spelling:?}"
            );
        }
    }

    #[test]
    fn counts_down_with_negative_unit_step() {
        let output = run("pentru i = 5, -5, -1 executa scrie i", &[]).expect("run failed");
        assert_eq!(output, "5\n4\n3\n2\n1\n0\n-1\n-2\n-3\n-4\n-5");
    }

    #[test]
    fn reading_a_fresh_vector_creates_it() {
        let program = parse("scrie v[3]").expect("parse failed");
        let mut environment = Environment::new();
        let mut output = LineBuffer::new();
        let mut no_input = |_: &str| None;
        evaluate(&program, &mut environment, &mut output, &mut no_input, 10).expect("run failed");
        assert_eq!(output.finish(), "0");
        assert_eq!(
            environment.get("v"),
            Some(&Value::Array(vec![0.0; 4]))
        );
    }

    #[test]
    fn repeated_runs_give_identical_output() {
        let source = indoc! {r#"
            citeste n
            pentru i = 1, n executa v[i] = i * 3 % 7
            s = 0
            pentru i = 1, n executa s = s + v[i]
            scrie s, " ", v
        "#};
        let first = run(source, &["6"]).expect("first run failed");
        let second = run(source, &["6"]).expect("second run failed");
        assert_eq!(first, second);
        assert_eq!(first, "21 0,3,6,2,5,1,4");
    }

    #[test]
    fn reports_missing_input() {
        let error = run("citeste a, b", &["1"]).expect_err("expected failure");
        assert_eq!(
            error,
            RuntimeError::MissingInput {
                name: "b".to_string()
            }
        );
    }

    #[test]
    fn keeps_environment_after_failure() {
        let program = parse("a = 1\nscrie b\na = 2").expect("parse failed");
        let mut environment = Environment::new();
        let mut output = LineBuffer::new();
        let mut no_input = |_: &str| None;
        let error = evaluate(&program, &mut environment, &mut output, &mut no_input, 10)
            .expect_err("expected failure");
        assert_eq!(
            error.to_string(),
            "Variabila \"b\" nu a fost definita!"
        );
        assert_eq!(environment.get("a"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn fails_runaway_loops_through_backend() {
        let program = parse("x = 1\ncat timp x > 0 executa x = x + 1").expect("parse failed");
        let interpreter = Interpreter::with_config(Config::with_max_iterations(50));
        let error = interpreter
            .run(&program)
            .expect_err("expected infinite loop");
        assert_eq!(
            expect_runtime_error(error),
            RuntimeError::InfiniteLoop {
                kind: LoopKind::While
            }
        );
    }

    #[test]
    fn backend_feeds_queued_input() {
        let program = parse("citeste a, b\nscrie a + b").expect("parse failed");
        let interpreter = Interpreter::new().with_input(vec!["2".to_string(), "3".to_string()]);
        assert_eq!(interpreter.run(&program).expect("run failed"), "5");
    }
}
