use anyhow::Result;

use crate::ast::Program;

pub use crate::debugger;
pub use crate::interpreter;

/// Runnable artifact produced by a backend `prepare` step.
///
/// Preparing once and running later lets benchmarks time the two phases
/// separately.
pub trait PreparedBackend {
    fn run(&self) -> Result<String>;
}

/// Common interface of the execution engines.
///
/// Both engines share one execution core: the interpreter drives it to the
/// end in one go, the debugger one statement at a time. For the same program
/// and numeric input they produce the same console text, up to the final
/// line break.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>>;

    fn run(&self, program: &Program) -> Result<String> {
        self.prepare(program)?.run()
    }
}

/// Every engine with default settings, each fed the same queued `input`.
pub fn backends(input: &[String]) -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(interpreter::Interpreter::new().with_input(input.to_vec())),
        Box::new(debugger::DebuggerBackend::new().with_input(input.to_vec())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn engines_agree_on_output() {
        let program =
            parse("citeste n\npentru i = 1, n executa scrie i * i, \"!\"").expect("parse failed");
        let outputs: Vec<(&str, String)> = backends(&["3".to_string()])
            .iter()
            .map(|backend| {
                let output = backend.run(&program).expect("run failed");
                (backend.name(), output.trim_end().to_string())
            })
            .collect();
        assert_eq!(
            outputs,
            [
                ("interpreter", "1!\n4!\n9!".to_string()),
                ("debugger", "1!\n4!\n9!".to_string()),
            ]
        );
    }
}
