use std::fmt;

use anyhow::Result;
use tracing::debug;

use crate::ast::Program;
use crate::backend::{Backend, PreparedBackend};
use crate::config::Config;
use crate::interpreter::machine::{Machine, Step};
use crate::interpreter::{Environment, OutputSink, RuntimeError, Value, parse_lenient};

/// Display type of a variable in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Integer,
    Real,
    String,
    Array,
}

impl VariableKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Number(number) if number.fract() == 0.0 => VariableKind::Integer,
            Value::Number(_) => VariableKind::Real,
            Value::Str(_) => VariableKind::String,
            Value::Array(_) => VariableKind::Array,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariableKind::Integer => "int",
            VariableKind::Real => "double",
            VariableKind::String => "string",
            VariableKind::Array => "vector",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSnapshot {
    pub name: String,
    pub value: Value,
    pub kind: VariableKind,
}

/// State visible to the caller between two steps.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub finished: bool,
    pub variables: Vec<VariableSnapshot>,
    /// Whole transcript so far, including echoed input.
    pub output: String,
    /// Source line of the last executed unit; 0 before the first step.
    pub line: usize,
    /// Variable waiting for `provide_input`.
    pub pending_input: Option<String>,
    pub error: Option<RuntimeError>,
}

/// Console transcript. `console` holds program output only, `all` also
/// holds the input prompts and the echoed values.
#[derive(Debug, Default)]
struct Transcript {
    all: String,
    console: String,
}

impl Transcript {
    fn echo(&mut self, text: &str) {
        self.all.push_str(text);
    }
}

impl OutputSink for Transcript {
    fn text(&mut self, text: &str) {
        self.all.push_str(text);
        self.console.push_str(text);
    }

    fn line_break(&mut self) {
        self.text("\n");
    }
}

/// Single-step debugging session over a parsed program.
///
/// Each `step` performs exactly one atomic unit of work: a simple statement,
/// entering a compound statement, or closing one pass of a loop (for `pentru`
/// this includes the increment and the condition recheck). A `citeste`
/// suspends the session until `provide_input` is called.
pub struct Debugger<'p> {
    program: &'p Program,
    config: Config,
    machine: Machine<'p>,
    transcript: Transcript,
    pending_input: Option<String>,
    finished: bool,
    error: Option<RuntimeError>,
    line: usize,
}

impl<'p> Debugger<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_config(program, Config::default())
    }

    pub fn with_config(program: &'p Program, config: Config) -> Self {
        Self {
            program,
            config,
            machine: Machine::new(program, Environment::new(), config.max_iterations),
            transcript: Transcript::default(),
            pending_input: None,
            finished: false,
            error: None,
            line: 0,
        }
    }

    pub fn step(&mut self) -> StepReport {
        self.advance();
        self.report()
    }

    /// Stores the value typed for the pending `citeste` and resumes. Text
    /// that is not a number is read as its numeric prefix, or 0.
    pub fn provide_input(&mut self, name: &str, raw: &str) -> StepReport {
        match self.pending_input.as_deref() {
            Some(expected) if expected == name => {
                self.machine.store_input(name, parse_lenient(raw));
                self.transcript.echo(raw);
                self.transcript.echo("\n");
                self.pending_input = None;
                self.report()
            }
            Some(expected) => {
                let error = RuntimeError::UnexpectedInput {
                    expected: expected.to_string(),
                    got: name.to_string(),
                };
                self.report_with(Some(error))
            }
            None => self.report_with(Some(RuntimeError::NoPendingInput {
                name: name.to_string(),
            })),
        }
    }

    /// Restarts the session on the same program with a fresh environment.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.program, self.config);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn pending_input(&self) -> Option<&str> {
        self.pending_input.as_deref()
    }

    pub fn variables(&self) -> Vec<VariableSnapshot> {
        self.machine
            .environment()
            .iter()
            .map(|(name, value)| VariableSnapshot {
                name: name.to_string(),
                value: value.clone(),
                kind: VariableKind::of(value),
            })
            .collect()
    }

    pub fn report(&self) -> StepReport {
        self.report_with(self.error.clone())
    }

    fn report_with(&self, error: Option<RuntimeError>) -> StepReport {
        StepReport {
            finished: self.finished,
            variables: self.variables(),
            output: self.transcript.all.clone(),
            line: self.line,
            pending_input: self.pending_input.clone(),
            error,
        }
    }

    fn advance(&mut self) {
        if self.finished || self.pending_input.is_some() {
            return;
        }
        match self.machine.step(&mut self.transcript) {
            Ok(Step::Executed { line }) => self.line = line,
            Ok(Step::Input { name, line }) => {
                self.line = line;
                self.transcript.echo(&format!("Citeste {name}: "));
                self.pending_input = Some(name);
            }
            Ok(Step::Finished) => {
                debug!(line = self.line, "debug session finished");
                self.finished = true;
            }
            Err(error) => {
                debug!(%error, line = self.line, "debug session failed");
                self.error = Some(error);
                self.finished = true;
            }
        }
    }
}

/// Backend that executes a program through the debugger, one step at a
/// time, answering `citeste` from a queue.
#[derive(Debug, Clone, Default)]
pub struct DebuggerBackend {
    config: Config,
    input: Vec<String>,
}

impl DebuggerBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            input: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: Vec<String>) -> Self {
        self.input = input;
        self
    }
}

pub struct PreparedDebugger {
    program: Program,
    config: Config,
    input: Vec<String>,
}

impl PreparedBackend for PreparedDebugger {
    fn run(&self) -> Result<String> {
        let mut debugger = Debugger::with_config(&self.program, self.config);
        let mut queue = self.input.iter();
        loop {
            debugger.advance();
            if let Some(error) = debugger.error.take() {
                return Err(error.into());
            }
            if debugger.finished {
                break;
            }
            if let Some(name) = debugger.pending_input.clone() {
                let raw = queue
                    .next()
                    .ok_or_else(|| RuntimeError::MissingInput { name: name.clone() })?;
                debugger.provide_input(&name, raw);
            }
        }
        Ok(debugger.transcript.console)
    }
}

impl Backend for DebuggerBackend {
    fn name(&self) -> &'static str {
        "debugger"
    }

    fn prepare(&self, program: &Program) -> Result<Box<dyn PreparedBackend>> {
        Ok(Box::new(PreparedDebugger {
            program: program.clone(),
            config: self.config,
            input: self.input.clone(),
        }))
    }
}
