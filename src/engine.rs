//! Execution engine: operand stack, dictionary stack, and the trampoline
//! that drives the execution stack.
//!
//! Loop constructs (`for`, `repeat`, `loop`, `forall`) are resumable state
//! pushed onto the execution stack rather than host recursion, with a
//! `Stopped` marker frame so `stop`/`stopped` can be modeled as a signal
//! that unwinds the execution stack instead of a host exception.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{InterpreterError, PostScriptError};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::{ArrayRef, DictRef, Value};

/// Non-local control transfer: a regular error, or the `exit`/`stop`
/// signals used by loop constructs and `stopped`.
#[derive(Debug)]
pub enum Flow {
    Error(InterpreterError),
    Exit,
    Stop,
}

impl From<InterpreterError> for Flow {
    fn from(e: InterpreterError) -> Self {
        Flow::Error(e)
    }
}

pub type OpResult = Result<(), Flow>;

/// A pending unit of work on the execution stack.
enum Frame {
    Value(Value),
    ForLoop { current: f64, step: f64, limit: f64, all_int: bool, proc: ArrayRef },
    RepeatLoop { remaining: i64, proc: ArrayRef },
    Loop { proc: ArrayRef },
    Forall { pending: Vec<Vec<Value>>, proc: ArrayRef },
    /// Marks the boundary `stopped` installed. Popped normally once its
    /// procedure finishes without stopping (pushes `false`); if a `Stop`
    /// signal unwinds to it, it's consumed there instead (pushes `true`).
    Stopped,
}

fn is_loop_frame(frame: &Frame) -> bool {
    matches!(frame, Frame::ForLoop { .. } | Frame::RepeatLoop { .. } | Frame::Loop { .. } | Frame::Forall { .. })
}

pub struct Interpreter {
    operand_stack: Vec<Value>,
    dict_stack: Vec<DictRef>,
    exec_stack: Vec<Frame>,
    out: Box<dyn Write>,
}

impl Interpreter {
    /// Builds a fresh interpreter: a system dictionary of operators at the
    /// bottom of the dictionary stack plus one user dictionary above it, so
    /// `end` always has at least the system dict left beneath.
    pub fn new(out: Box<dyn Write>) -> Self {
        let system_dict = Rc::new(RefCell::new(crate::operators::system_dict()));
        let user_dict = Rc::new(RefCell::new(IndexMap::new()));
        Interpreter {
            operand_stack: Vec::new(),
            dict_stack: vec![system_dict, user_dict],
            exec_stack: Vec::new(),
            out,
        }
    }

    /// Parses and runs a complete program, top to bottom.
    pub fn run(&mut self, source: &str) -> Result<(), PostScriptError> {
        let tokens = Lexer::new(source).tokenize().inspect_err(|e| {
            tracing::warn!(error = %e, "lexer failed");
        })?;
        tracing::trace!(token_count = tokens.len(), "lexed source");
        let program = Parser::new(tokens).parse().inspect_err(|e| {
            tracing::warn!(error = %e, "parser failed");
        })?;
        tracing::debug!(object_count = program.len(), "parsed program, beginning execution");
        for value in program {
            self.exec_stack.push(Frame::Value(value));
        }
        self.pump().inspect_err(|e| {
            tracing::warn!(error = %e, "execution failed");
        })?;
        Ok(())
    }

    /// Drains the execution stack, running every frame to completion.
    /// Unwinds `Flow::Exit`/`Flow::Stop` against the nearest matching
    /// frame instead of propagating them as a fatal error.
    fn pump(&mut self) -> Result<(), PostScriptError> {
        while let Some(frame) = self.exec_stack.pop() {
            if let Err(flow) = self.step(frame) {
                match flow {
                    Flow::Error(e) => return Err(e.into()),
                    Flow::Exit => self.unwind_exit(),
                    Flow::Stop => self.unwind_stop(),
                }
            }
        }
        Ok(())
    }

    fn unwind_exit(&mut self) {
        while let Some(frame) = self.exec_stack.pop() {
            if is_loop_frame(&frame) {
                return;
            }
        }
    }

    fn unwind_stop(&mut self) {
        while let Some(frame) = self.exec_stack.pop() {
            if matches!(frame, Frame::Stopped) {
                self.operand_stack.push(Value::Bool(true));
                return;
            }
        }
    }

    fn step(&mut self, frame: Frame) -> OpResult {
        match frame {
            Frame::Value(v) => self.execute_value(v),
            Frame::Stopped => {
                self.operand_stack.push(Value::Bool(false));
                Ok(())
            }
            Frame::ForLoop { current, step, limit, all_int, proc } => {
                let keep_going = if step > 0.0 { current <= limit } else { current >= limit };
                if keep_going {
                    self.exec_stack.push(Frame::ForLoop {
                        current: current + step,
                        step,
                        limit,
                        all_int,
                        proc: proc.clone(),
                    });
                    let v = if all_int { Value::Int(current as i64) } else { Value::Real(current) };
                    self.operand_stack.push(v);
                    self.push_body(&proc);
                }
                Ok(())
            }
            Frame::RepeatLoop { remaining, proc } => {
                if remaining > 0 {
                    self.exec_stack.push(Frame::RepeatLoop { remaining: remaining - 1, proc: proc.clone() });
                    self.push_body(&proc);
                }
                Ok(())
            }
            Frame::Loop { proc } => {
                self.exec_stack.push(Frame::Loop { proc: proc.clone() });
                self.push_body(&proc);
                Ok(())
            }
            Frame::Forall { mut pending, proc } => {
                if let Some(group) = pending.pop() {
                    self.exec_stack.push(Frame::Forall { pending, proc: proc.clone() });
                    for item in group {
                        self.operand_stack.push(item);
                    }
                    self.push_body(&proc);
                }
                Ok(())
            }
        }
    }

    fn push_body(&mut self, proc: &ArrayRef) {
        for item in proc.to_vec().into_iter().rev() {
            self.exec_stack.push(Frame::Value(item));
        }
    }

    /// Executes a single already-parsed value: literals push themselves,
    /// executable names are looked up and dispatched, everything else
    /// (arrays, literal procedures encountered directly, literal names,
    /// ...) is data and goes straight to the operand stack.
    pub fn execute_value(&mut self, value: Value) -> OpResult {
        match value {
            Value::ExecutableName(name) => {
                let looked_up = self.lookup(&name).ok_or_else(|| {
                    tracing::debug!(%name, "undefined name");
                    Flow::Error(InterpreterError::Undefined { name: name.to_string() })
                })?;
                self.dispatch(looked_up)
            }
            other => {
                self.operand_stack.push(other);
                Ok(())
            }
        }
    }

    /// Runs an arbitrary popped value the way `exec` requires: executable
    /// names are resolved and dispatched same as top-level execution, but
    /// anything else (notably a `Procedure` popped straight off the operand
    /// stack) is dispatched directly rather than merely pushed back — unlike
    /// `execute_value`, which only ever sees freshly parsed literals and
    /// pushes procedures encountered that way as plain data.
    pub fn exec_value(&mut self, value: Value) -> OpResult {
        match value {
            Value::ExecutableName(name) => {
                let looked_up = self
                    .lookup(&name)
                    .ok_or_else(|| Flow::Error(InterpreterError::Undefined { name: name.to_string() }))?;
                self.dispatch(looked_up)
            }
            other => self.dispatch(other),
        }
    }

    /// Runs a value found via name lookup or `exec`: operators are called,
    /// procedures have their bodies run, anything else is pushed as data.
    fn dispatch(&mut self, value: Value) -> OpResult {
        match value {
            Value::Operator(op) => (op.func)(self),
            Value::Procedure(body) => {
                self.push_body(&body);
                Ok(())
            }
            other => {
                self.operand_stack.push(other);
                Ok(())
            }
        }
    }

    // -- stack/dictionary primitives shared by the operator table --

    pub fn push(&mut self, v: Value) {
        self.operand_stack.push(v);
    }

    pub fn pop(&mut self, op: &'static str) -> Result<Value, Flow> {
        self.operand_stack.pop().ok_or_else(|| InterpreterError::StackUnderflow { op }.into())
    }

    pub fn peek(&self, op: &'static str) -> Result<&Value, Flow> {
        self.operand_stack.last().ok_or_else(|| InterpreterError::StackUnderflow { op }.into())
    }

    pub fn stack_len(&self) -> usize {
        self.operand_stack.len()
    }

    pub fn stack_slice(&self) -> &[Value] {
        &self.operand_stack
    }

    /// Snapshot of the operand stack, bottom-first (top-last).
    pub fn get_stack(&self) -> Vec<Value> {
        self.operand_stack.clone()
    }

    pub fn stack_slice_mut(&mut self) -> &mut Vec<Value> {
        &mut self.operand_stack
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    pub fn push_forloop(&mut self, current: f64, step: f64, limit: f64, all_int: bool, proc: ArrayRef) {
        self.exec_stack.push(Frame::ForLoop { current, step, limit, all_int, proc });
    }

    pub fn push_repeatloop(&mut self, remaining: i64, proc: ArrayRef) {
        self.exec_stack.push(Frame::RepeatLoop { remaining, proc });
    }

    pub fn push_loop(&mut self, proc: ArrayRef) {
        self.exec_stack.push(Frame::Loop { proc });
    }

    pub fn push_forall(&mut self, pending: Vec<Vec<Value>>, proc: ArrayRef) {
        self.exec_stack.push(Frame::Forall { pending, proc });
    }

    /// Runs `proc`'s body to completion immediately (used by `if`/`ifelse`
    /// to push a body onto the execution stack for the trampoline to pick
    /// up next, rather than recursing on the host stack).
    pub fn run_body(&mut self, proc: &ArrayRef) {
        self.push_body(proc);
    }

    pub fn install_stopped_marker(&mut self) {
        self.exec_stack.push(Frame::Stopped);
    }

    pub fn exec_later(&mut self, value: Value) {
        self.exec_stack.push(Frame::Value(value));
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        for dict in self.dict_stack.iter().rev() {
            if let Some(v) = dict.borrow().get(name) {
                return Some(v.clone());
            }
        }
        None
    }

    pub fn define(&mut self, key: String, value: Value) {
        self.dict_stack.last().expect("dict stack never empties").borrow_mut().insert(key, value);
    }

    /// `store`: writes into the nearest dictionary (searching from the top)
    /// that already defines `key`, falling back to the current dictionary.
    pub fn store(&mut self, key: String, value: Value) {
        for dict in self.dict_stack.iter().rev() {
            if dict.borrow().contains_key(&key) {
                dict.borrow_mut().insert(key, value);
                return;
            }
        }
        self.define(key, value);
    }

    pub fn begin(&mut self, dict: DictRef) {
        self.dict_stack.push(dict);
    }

    pub fn end(&mut self, op: &'static str) -> Result<(), Flow> {
        if self.dict_stack.len() <= 2 {
            return Err(InterpreterError::DictStackUnderflow { op }.into());
        }
        self.dict_stack.pop();
        Ok(())
    }

    pub fn current_dict(&self) -> DictRef {
        self.dict_stack.last().expect("dict stack never empties").clone()
    }
}
