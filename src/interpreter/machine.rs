//! Resumable execution core.
//!
//! Compound statements are reified as frames on an explicit stack so that
//! execution can stop after any atomic unit of work. The batch evaluator
//! drives `step` to completion; the debugger surfaces every step.

use tracing::trace;

use crate::ast::{AssignTarget, Operator, Postfix, Program, Statement, StatementKind, Term};

use super::error::{LoopKind, RuntimeError, RuntimeResult};
use super::io::OutputSink;
use super::value::{Environment, Value};

/// Upper bound on array growth through indexing or allocation.
const MAX_ARRAY_LEN: usize = 1 << 24;

#[derive(Debug, Clone, Copy)]
enum FrameKind<'p> {
    /// Chosen branch of a `daca`.
    Branch,
    While { condition: &'p Postfix },
    For {
        condition: &'p Postfix,
        step: &'p Statement,
    },
    DoWhile { condition: &'p Postfix },
}

#[derive(Debug)]
struct Frame<'p> {
    kind: FrameKind<'p>,
    body: &'p [Statement],
    cursor: usize,
    passes: usize,
    line: usize,
}

/// Outcome of one atomic unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Executed { line: usize },
    /// A `citeste` is waiting for a value; resume with `store_input`.
    Input { name: String, line: usize },
    Finished,
}

pub struct Machine<'p> {
    program: &'p Program,
    environment: Environment,
    frames: Vec<Frame<'p>>,
    cursor: usize,
    max_iterations: usize,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p Program, environment: Environment, max_iterations: usize) -> Self {
        Self {
            program,
            environment,
            frames: Vec::new(),
            cursor: 0,
            max_iterations,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn into_environment(self) -> Environment {
        self.environment
    }

    pub fn store_input(&mut self, name: &str, value: f64) {
        self.environment.insert(name, Value::Number(value));
    }

    pub fn step(&mut self, out: &mut dyn OutputSink) -> RuntimeResult<Step> {
        let next = match self.frames.last_mut() {
            Some(frame) if frame.cursor < frame.body.len() => {
                let body = frame.body;
                let statement = &body[frame.cursor];
                frame.cursor += 1;
                Some(statement)
            }
            Some(_) => None,
            None => {
                let statement = self.program.statements.get(self.cursor);
                if statement.is_none() {
                    return Ok(Step::Finished);
                }
                self.cursor += 1;
                statement
            }
        };

        let step = match next {
            Some(statement) => self.execute(statement, out)?,
            None => self.finish_pass(out)?,
        };
        trace!(?step, depth = self.frames.len(), "step");
        Ok(step)
    }

    fn execute(
        &mut self,
        statement: &'p Statement,
        out: &mut dyn OutputSink,
    ) -> RuntimeResult<Step> {
        let line = statement.line;
        match &statement.kind {
            StatementKind::Input(name) => {
                return Ok(Step::Input {
                    name: name.clone(),
                    line,
                });
            }
            StatementKind::Output(name) => {
                let value = self
                    .environment
                    .get(name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
                out.text(&value.to_string());
            }
            StatementKind::OutputStr(text) => out.text(text),
            StatementKind::OutputExpr(expression) => {
                let value = self.evaluate(expression)?;
                out.text(&value.to_string());
            }
            StatementKind::Newline => out.line_break(),
            StatementKind::Assign { target, value } => self.assign(target, value)?,
            StatementKind::If {
                condition,
                then_body,
                else_body,
            } => {
                let body = if self.evaluate(condition)?.is_truthy() {
                    Some(then_body)
                } else {
                    else_body.as_ref()
                };
                if let Some(body) = body.filter(|body| !body.is_empty()) {
                    self.push(FrameKind::Branch, body, line);
                }
            }
            StatementKind::While { condition, body } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.push(FrameKind::While { condition }, body, line);
                }
            }
            StatementKind::For {
                init,
                condition,
                step,
                body,
            } => {
                self.execute(init, out)?;
                if self.evaluate(condition)?.is_truthy() {
                    let step = step.as_ref();
                    self.push(FrameKind::For { condition, step }, body, line);
                }
            }
            StatementKind::DoWhile { condition, body } => {
                self.push(FrameKind::DoWhile { condition }, body, line);
            }
            StatementKind::VectorAlloc { name, size } => {
                let len = self.vector_size(name, size)?;
                self.environment.insert(name.clone(), Value::Array(vec![0.0; len]));
            }
            StatementKind::VectorInit {
                name,
                size,
                elements,
            } => {
                let len = self.vector_size(name, size)?;
                let mut values = vec![0.0; len];
                for (slot, element) in values.iter_mut().zip(elements) {
                    *slot = self
                        .evaluate(element)?
                        .as_number()
                        .ok_or_else(|| RuntimeError::ArrayElementType { name: name.clone() })?;
                }
                self.environment.insert(name.clone(), Value::Array(values));
            }
        }
        Ok(Step::Executed { line })
    }

    fn push(&mut self, kind: FrameKind<'p>, body: &'p Program, line: usize) {
        self.frames.push(Frame {
            kind,
            body: &body.statements,
            cursor: 0,
            passes: 0,
            line,
        });
    }

    /// The top frame's body is exhausted: close a branch, or count a loop
    /// pass and decide whether to go around again.
    fn finish_pass(&mut self, out: &mut dyn OutputSink) -> RuntimeResult<Step> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(Step::Finished);
        };
        let (kind, line) = (frame.kind, frame.line);
        frame.passes += 1;
        let passes = frame.passes;

        let (again, loop_kind) = match kind {
            FrameKind::Branch => (false, None),
            FrameKind::While { condition } => {
                (self.evaluate(condition)?.is_truthy(), Some(LoopKind::While))
            }
            FrameKind::For { condition, step } => {
                self.execute(step, out)?;
                (self.evaluate(condition)?.is_truthy(), Some(LoopKind::For))
            }
            FrameKind::DoWhile { condition } => {
                (!self.evaluate(condition)?.is_truthy(), Some(LoopKind::DoWhile))
            }
        };

        if !again {
            self.frames.pop();
            return Ok(Step::Executed { line });
        }
        // A loop may run `max_iterations` passes; asking for one more fails.
        if let Some(kind) = loop_kind
            && passes >= self.max_iterations
        {
            return Err(RuntimeError::InfiniteLoop { kind });
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.cursor = 0;
        }
        Ok(Step::Executed { line })
    }

    fn assign(&mut self, target: &AssignTarget, value: &Postfix) -> RuntimeResult<()> {
        match target {
            AssignTarget::Name(name) => {
                let value = self.evaluate(value)?;
                self.environment.insert(name.clone(), value);
            }
            AssignTarget::Element { name, index } => {
                let index = self.evaluate(index).and_then(|index| to_index(&index))?;
                let value = self
                    .evaluate(value)?
                    .as_number()
                    .ok_or_else(|| RuntimeError::ArrayElementType { name: name.clone() })?;
                match self.environment.get_mut(name) {
                    Some(Value::Array(values)) => {
                        grow(values, index)?;
                        values[index] = value;
                    }
                    Some(Value::Str(_)) => {
                        return Err(RuntimeError::StringElementAssignment {
                            name: name.clone(),
                        });
                    }
                    Some(Value::Number(_)) | None => {
                        let mut values = Vec::new();
                        grow(&mut values, index)?;
                        values[index] = value;
                        self.environment.insert(name.clone(), Value::Array(values));
                    }
                }
            }
        }
        Ok(())
    }

    fn vector_size(&mut self, name: &str, size: &Postfix) -> RuntimeResult<usize> {
        let value = self.evaluate(size)?;
        let invalid = || RuntimeError::InvalidSize {
            name: name.to_string(),
            size: value.to_string(),
        };
        let Some(len) = value.as_number() else {
            return Err(invalid());
        };
        if !(0.0..=MAX_ARRAY_LEN as f64).contains(&len) || len.fract() != 0.0 {
            return Err(invalid());
        }
        Ok(len as usize)
    }

    /// Runs a postfix expression on an operand stack.
    pub fn evaluate(&mut self, expression: &Postfix) -> RuntimeResult<Value> {
        let mut stack: Vec<Operand> = Vec::new();
        for term in expression.terms() {
            match term {
                Term::Number { value, .. } => stack.push(Operand::value(Value::Number(*value))),
                Term::String(text) => stack.push(Operand::value(Value::Str(text.clone()))),
                Term::Identifier(name) => stack.push(Operand {
                    value: self.environment.get(name).cloned(),
                    origin: Some(name.clone()),
                }),
                Term::Operator(Operator::Index) => {
                    let index = pop(&mut stack)?.resolve()?;
                    let base = pop(&mut stack)?;
                    let element = self.index(base, &index)?;
                    stack.push(Operand::value(element));
                }
                Term::Operator(op) if op.is_unary() => {
                    let operand = pop(&mut stack)?.resolve()?;
                    stack.push(Operand::value(unary(*op, operand)?));
                }
                Term::Operator(op) => {
                    let right = pop(&mut stack)?.resolve()?;
                    let left = pop(&mut stack)?.resolve()?;
                    stack.push(Operand::value(binary(*op, left, right)?));
                }
            }
        }

        if stack.len() > 1 {
            return Err(RuntimeError::MalformedExpression);
        }
        pop(&mut stack)?.resolve()
    }

    /// `base[index]`. Arrays named by a variable are created or extended in
    /// place; a plain number indexes like `[n, 0, 0, ...]`.
    fn index(&mut self, base: Operand, index: &Value) -> RuntimeResult<Value> {
        let index = to_index(index)?;
        if let Some(name) = &base.origin {
            match self.environment.get_mut(name) {
                Some(Value::Array(values)) => {
                    grow(values, index)?;
                    return Ok(Value::Number(values[index]));
                }
                None => {
                    let mut values = Vec::new();
                    grow(&mut values, index)?;
                    self.environment.insert(name.clone(), Value::Array(values));
                    return Ok(Value::Number(0.0));
                }
                Some(_) => {}
            }
        }

        match base.value {
            Some(Value::Array(values)) => {
                Ok(Value::Number(values.get(index).copied().unwrap_or(0.0)))
            }
            Some(Value::Str(text)) => text
                .chars()
                .nth(index)
                .map(|ch| Value::Str(ch.to_string()))
                .ok_or_else(|| RuntimeError::StringIndexOutOfBounds {
                    index: index as i64,
                    value: text.clone(),
                }),
            Some(Value::Number(value)) => Ok(Value::Number(if index == 0 { value } else { 0.0 })),
            None => Err(RuntimeError::MalformedExpression),
        }
    }
}

/// Stack slot. Undefined variables stay unresolved so that indexing can
/// still create them; any other use reports them.
struct Operand {
    value: Option<Value>,
    origin: Option<String>,
}

impl Operand {
    fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            origin: None,
        }
    }

    fn resolve(self) -> RuntimeResult<Value> {
        match (self.value, self.origin) {
            (Some(value), _) => Ok(value),
            (None, Some(name)) => Err(RuntimeError::UndefinedVariable { name }),
            (None, None) => Err(RuntimeError::MalformedExpression),
        }
    }
}

fn pop(stack: &mut Vec<Operand>) -> RuntimeResult<Operand> {
    stack.pop().ok_or(RuntimeError::MalformedExpression)
}

fn to_index(value: &Value) -> RuntimeResult<usize> {
    let number = value.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
        operator: "index",
        operands: value.type_name().to_string(),
    })?;
    let index = number.floor();
    if index < 0.0 {
        return Err(RuntimeError::NegativeIndex {
            index: index as i64,
        });
    }
    if index >= MAX_ARRAY_LEN as f64 {
        return Err(RuntimeError::IndexTooLarge {
            index: index as i64,
        });
    }
    // NaN lands on slot 0.
    Ok(index as usize)
}

fn grow(values: &mut Vec<f64>, index: usize) -> RuntimeResult<()> {
    if index >= MAX_ARRAY_LEN {
        return Err(RuntimeError::IndexTooLarge {
            index: index as i64,
        });
    }
    if index >= values.len() {
        values.resize(index + 1, 0.0);
    }
    Ok(())
}

fn unary(op: Operator, operand: Value) -> RuntimeResult<Value> {
    match op {
        Operator::Not => Ok(Value::from(!operand.is_truthy())),
        Operator::IntPart => match operand {
            Value::Number(value) => Ok(Value::Number(value.floor())),
            other => Err(mismatch(op, &[&other])),
        },
        _ => Err(RuntimeError::MalformedExpression),
    }
}

fn binary(op: Operator, left: Value, right: Value) -> RuntimeResult<Value> {
    use Value::{Number, Str};

    let value = match (op, &left, &right) {
        (Operator::Add, Number(a), Number(b)) => Number(a + b),
        (Operator::Add, Str(_), _) | (Operator::Add, _, Str(_)) => Str(format!("{left}{right}")),
        (Operator::Sub, Number(a), Number(b)) => Number(a - b),
        (Operator::Mul, Number(a), Number(b)) => Number(a * b),
        (Operator::Div, Number(a), Number(b)) => Number(a / b),
        (Operator::Mod, Number(a), Number(b)) => Number(a % b),
        (Operator::Less, Number(a), Number(b)) => Value::from(a < b),
        (Operator::Greater, Number(a), Number(b)) => Value::from(a > b),
        (Operator::LessEqual, Number(a), Number(b)) => Value::from(a <= b),
        (Operator::GreaterEqual, Number(a), Number(b)) => Value::from(a >= b),
        (Operator::Less, Str(a), Str(b)) => Value::from(a < b),
        (Operator::Greater, Str(a), Str(b)) => Value::from(a > b),
        (Operator::LessEqual, Str(a), Str(b)) => Value::from(a <= b),
        (Operator::GreaterEqual, Str(a), Str(b)) => Value::from(a >= b),
        (Operator::Equal, _, _) => Value::from(left == right),
        (Operator::NotEqual, _, _) => Value::from(left != right),
        (Operator::And, _, _) => Value::from(left.is_truthy() && right.is_truthy()),
        (Operator::Or, _, _) => Value::from(left.is_truthy() || right.is_truthy()),
        _ => return Err(mismatch(op, &[&left, &right])),
    };
    Ok(value)
}

fn mismatch(op: Operator, operands: &[&Value]) -> RuntimeError {
    RuntimeError::TypeMismatch {
        operator: op.symbol(),
        operands: operands
            .iter()
            .map(|value| value.type_name())
            .collect::<Vec<_>>()
            .join(" si "),
    }
}
