//! Primitive operator table and implementations: one Rust function per
//! operator, registered into the system dictionary by `system_dict`.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::engine::{Flow, Interpreter, OpResult};
use crate::error::InterpreterError;
use crate::value::{format_short, format_verbose, Operator, Value};

macro_rules! op {
    ($map:expr, $name:expr, $func:expr) => {
        $map.insert($name.to_string(), Value::Operator(Operator { name: $name, func: $func }));
    };
}

/// Builds the system dictionary: every primitive operator plus the
/// `true`/`false` boolean constants (registered as plain values, not
/// operators).
pub fn system_dict() -> IndexMap<String, Value> {
    let mut d = IndexMap::new();

    // Arithmetic
    op!(d, "add", add);
    op!(d, "sub", sub);
    op!(d, "mul", mul);
    op!(d, "div", div);
    op!(d, "idiv", idiv);
    op!(d, "mod", mod_op);
    op!(d, "neg", neg);
    op!(d, "abs", abs);
    op!(d, "ceiling", ceiling);
    op!(d, "floor", floor);
    op!(d, "round", round);
    op!(d, "truncate", truncate);
    op!(d, "sqrt", sqrt);

    // Stack manipulation
    op!(d, "pop", pop_op);
    op!(d, "exch", exch);
    op!(d, "dup", dup);
    op!(d, "copy", copy);
    op!(d, "index", index_op);
    op!(d, "roll", roll);
    op!(d, "clear", clear);
    op!(d, "count", count);
    op!(d, "mark", mark);
    op!(d, "cleartomark", cleartomark);

    // Comparison
    op!(d, "eq", eq);
    op!(d, "ne", ne);
    op!(d, "lt", lt);
    op!(d, "le", le);
    op!(d, "gt", gt);
    op!(d, "ge", ge);

    // Boolean/bitwise
    op!(d, "and", and);
    op!(d, "or", or);
    op!(d, "not", not_op);
    op!(d, "xor", xor);
    d.insert("true".to_string(), Value::Bool(true));
    d.insert("false".to_string(), Value::Bool(false));

    // Control flow
    op!(d, "if", if_op);
    op!(d, "ifelse", ifelse);
    op!(d, "for", for_op);
    op!(d, "repeat", repeat);
    op!(d, "loop", loop_op);
    op!(d, "exit", exit_op);
    op!(d, "exec", exec_op);
    op!(d, "stopped", stopped);
    op!(d, "stop", stop_op);

    // Dictionaries
    op!(d, "def", def);
    op!(d, "load", load);
    op!(d, "store", store);
    op!(d, "begin", begin);
    op!(d, "end", end);
    op!(d, "dict", dict_op);
    op!(d, "currentdict", currentdict);

    // Arrays
    op!(d, "array", array_op);
    op!(d, "length", length);
    op!(d, "get", get);
    op!(d, "put", put);
    op!(d, "getinterval", getinterval);
    op!(d, "putinterval", putinterval);
    op!(d, "forall", forall);
    op!(d, "aload", aload);
    op!(d, "astore", astore);

    // Strings
    op!(d, "string", string_op);
    op!(d, "cvs", cvs);

    // Type checking / conversion
    op!(d, "type", type_op);
    op!(d, "cvx", cvx);
    op!(d, "cvlit", cvlit);

    // I/O
    op!(d, "print", print_op);
    op!(d, "=", equals);
    op!(d, "==", equals_equals);
    op!(d, "pstack", pstack);

    d
}

fn type_check(op: &'static str, expected: &'static str) -> Flow {
    InterpreterError::TypeCheck { op, expected }.into()
}

fn numeric_pair(interp: &mut Interpreter, op: &'static str) -> Result<(Value, Value), Flow> {
    let b = interp.pop(op)?;
    let a = interp.pop(op)?;
    if !a.is_number() || !b.is_number() {
        return Err(type_check(op, "number"));
    }
    Ok((a, b))
}

macro_rules! arith_op {
    ($name:ident, $op_name:expr, $int_op:expr, $real_op:expr) => {
        fn $name(interp: &mut Interpreter) -> OpResult {
            let (a, b) = numeric_pair(interp, $op_name)?;
            let result = match (a, b) {
                (Value::Int(x), Value::Int(y)) => Value::Int(($int_op)(x, y)),
                (x, y) => Value::Real(($real_op)(x.as_f64().unwrap(), y.as_f64().unwrap())),
            };
            interp.push(result);
            Ok(())
        }
    };
}

arith_op!(add, "add", |x: i64, y: i64| x.wrapping_add(y), |x: f64, y: f64| x + y);
arith_op!(sub, "sub", |x: i64, y: i64| x.wrapping_sub(y), |x: f64, y: f64| x - y);
arith_op!(mul, "mul", |x: i64, y: i64| x.wrapping_mul(y), |x: f64, y: f64| x * y);

fn div(interp: &mut Interpreter) -> OpResult {
    let (a, b) = numeric_pair(interp, "div")?;
    let bf = b.as_f64().unwrap();
    if bf == 0.0 {
        return Err(InterpreterError::DivideByZero { op: "div" }.into());
    }
    interp.push(Value::Real(a.as_f64().unwrap() / bf));
    Ok(())
}

fn pop_int(interp: &mut Interpreter, op: &'static str) -> Result<i64, Flow> {
    match interp.pop(op)? {
        Value::Int(i) => Ok(i),
        Value::Real(r) if r == r.trunc() => Ok(r as i64),
        _ => Err(type_check(op, "integer")),
    }
}

fn idiv(interp: &mut Interpreter) -> OpResult {
    let b = pop_int(interp, "idiv")?;
    let a = pop_int(interp, "idiv")?;
    if b == 0 {
        return Err(InterpreterError::DivideByZero { op: "idiv" }.into());
    }
    interp.push(Value::Int(a / b));
    Ok(())
}

fn mod_op(interp: &mut Interpreter) -> OpResult {
    let b = pop_int(interp, "mod")?;
    let a = pop_int(interp, "mod")?;
    if b == 0 {
        return Err(InterpreterError::DivideByZero { op: "mod" }.into());
    }
    interp.push(Value::Int(a % b));
    Ok(())
}

fn neg(interp: &mut Interpreter) -> OpResult {
    match interp.pop("neg")? {
        Value::Int(i) => interp.push(Value::Int(-i)),
        Value::Real(r) => interp.push(Value::Real(-r)),
        _ => return Err(type_check("neg", "number")),
    }
    Ok(())
}

fn abs(interp: &mut Interpreter) -> OpResult {
    match interp.pop("abs")? {
        Value::Int(i) => interp.push(Value::Int(i.abs())),
        Value::Real(r) => interp.push(Value::Real(r.abs())),
        _ => return Err(type_check("abs", "number")),
    }
    Ok(())
}

fn pop_number(interp: &mut Interpreter, op: &'static str) -> Result<f64, Flow> {
    let v = interp.pop(op)?;
    v.as_f64().ok_or_else(|| type_check(op, "number"))
}

fn ceiling(interp: &mut Interpreter) -> OpResult {
    let a = pop_number(interp, "ceiling")?;
    interp.push(Value::Real(a.ceil()));
    Ok(())
}

fn floor(interp: &mut Interpreter) -> OpResult {
    let a = pop_number(interp, "floor")?;
    interp.push(Value::Real(a.floor()));
    Ok(())
}

/// Rounds half away from zero, matching the host's native `f64::round`.
fn round(interp: &mut Interpreter) -> OpResult {
    let a = pop_number(interp, "round")?;
    interp.push(Value::Real(a.round()));
    Ok(())
}

fn truncate(interp: &mut Interpreter) -> OpResult {
    let a = pop_number(interp, "truncate")?;
    interp.push(Value::Real(a.trunc()));
    Ok(())
}

fn sqrt(interp: &mut Interpreter) -> OpResult {
    let a = pop_number(interp, "sqrt")?;
    if a < 0.0 {
        return Err(InterpreterError::RangeCheck { op: "sqrt" }.into());
    }
    interp.push(Value::Real(a.sqrt()));
    Ok(())
}

// -- Stack manipulation --

fn pop_op(interp: &mut Interpreter) -> OpResult {
    interp.pop("pop")?;
    Ok(())
}

fn exch(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop("exch")?;
    let a = interp.pop("exch")?;
    interp.push(b);
    interp.push(a);
    Ok(())
}

fn dup(interp: &mut Interpreter) -> OpResult {
    let v = interp.peek("dup")?.clone();
    interp.push(v);
    Ok(())
}

fn copy(interp: &mut Interpreter) -> OpResult {
    let n = pop_int(interp, "copy")?;
    if n < 0 {
        return Err(InterpreterError::NegativeSize { op: "copy" }.into());
    }
    let n = n as usize;
    let len = interp.stack_len();
    if n > len {
        return Err(InterpreterError::StackUnderflow { op: "copy" }.into());
    }
    let items: Vec<Value> = interp.stack_slice()[len - n..].to_vec();
    for item in items {
        interp.push(item);
    }
    Ok(())
}

fn index_op(interp: &mut Interpreter) -> OpResult {
    let n = pop_int(interp, "index")?;
    let len = interp.stack_len();
    if n < 0 || n as usize >= len {
        return Err(InterpreterError::RangeCheck { op: "index" }.into());
    }
    let v = interp.stack_slice()[len - 1 - n as usize].clone();
    interp.push(v);
    Ok(())
}

fn roll(interp: &mut Interpreter) -> OpResult {
    let j = pop_int(interp, "roll")?;
    let n = pop_int(interp, "roll")?;
    if n < 0 {
        return Err(InterpreterError::NegativeSize { op: "roll" }.into());
    }
    let n = n as usize;
    if n == 0 || j == 0 {
        return Ok(());
    }
    let len = interp.stack_len();
    if n > len {
        return Err(InterpreterError::StackUnderflow { op: "roll" }.into());
    }
    let j = j.rem_euclid(n as i64) as usize;
    let stack = interp.stack_slice_mut();
    let start = stack.len() - n;
    stack[start..].rotate_right(j);
    Ok(())
}

fn clear(interp: &mut Interpreter) -> OpResult {
    interp.stack_slice_mut().clear();
    Ok(())
}

fn count(interp: &mut Interpreter) -> OpResult {
    interp.push(Value::Int(interp.stack_len() as i64));
    Ok(())
}

fn mark(interp: &mut Interpreter) -> OpResult {
    interp.push(Value::Mark);
    Ok(())
}

fn cleartomark(interp: &mut Interpreter) -> OpResult {
    loop {
        match interp.stack_slice_mut().pop() {
            Some(Value::Mark) => return Ok(()),
            Some(_) => continue,
            None => return Err(InterpreterError::MarkNotFound { op: "cleartomark" }.into()),
        }
    }
}

// -- Comparison --

fn values_ord(a: &Value, b: &Value, op: &'static str) -> Result<std::cmp::Ordering, Flow> {
    match (a, b) {
        (Value::Int(_), Value::Int(_)) | (Value::Real(_), Value::Int(_)) | (Value::Int(_), Value::Real(_))
        | (Value::Real(_), Value::Real(_)) => {
            let af = a.as_f64().unwrap();
            let bf = b.as_f64().unwrap();
            af.partial_cmp(&bf).ok_or_else(|| type_check(op, "number"))
        }
        (Value::String(x), Value::String(y)) => Ok(x.borrow().cmp(&y.borrow())),
        _ => Err(type_check(op, "number or string")),
    }
}

fn eq(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop("eq")?;
    let a = interp.pop("eq")?;
    interp.push(Value::Bool(a == b));
    Ok(())
}

fn ne(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop("ne")?;
    let a = interp.pop("ne")?;
    interp.push(Value::Bool(a != b));
    Ok(())
}

macro_rules! ord_op {
    ($name:ident, $op_name:expr, $test:expr) => {
        fn $name(interp: &mut Interpreter) -> OpResult {
            let b = interp.pop($op_name)?;
            let a = interp.pop($op_name)?;
            let ord = values_ord(&a, &b, $op_name)?;
            interp.push(Value::Bool(($test)(ord)));
            Ok(())
        }
    };
}

ord_op!(lt, "lt", |o: std::cmp::Ordering| o.is_lt());
ord_op!(le, "le", |o: std::cmp::Ordering| o.is_le());
ord_op!(gt, "gt", |o: std::cmp::Ordering| o.is_gt());
ord_op!(ge, "ge", |o: std::cmp::Ordering| o.is_ge());

// -- Boolean/bitwise --

fn and(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop("and")?;
    let a = interp.pop("and")?;
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => interp.push(Value::Bool(x && y)),
        (Value::Int(x), Value::Int(y)) => interp.push(Value::Int(x & y)),
        _ => return Err(type_check("and", "bool or integer")),
    }
    Ok(())
}

fn or(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop("or")?;
    let a = interp.pop("or")?;
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => interp.push(Value::Bool(x || y)),
        (Value::Int(x), Value::Int(y)) => interp.push(Value::Int(x | y)),
        _ => return Err(type_check("or", "bool or integer")),
    }
    Ok(())
}

fn not_op(interp: &mut Interpreter) -> OpResult {
    match interp.pop("not")? {
        Value::Bool(b) => interp.push(Value::Bool(!b)),
        Value::Int(i) => interp.push(Value::Int(!i)),
        _ => return Err(type_check("not", "bool or integer")),
    }
    Ok(())
}

fn xor(interp: &mut Interpreter) -> OpResult {
    let b = interp.pop("xor")?;
    let a = interp.pop("xor")?;
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => interp.push(Value::Bool(x != y)),
        (Value::Int(x), Value::Int(y)) => interp.push(Value::Int(x ^ y)),
        _ => return Err(type_check("xor", "bool or integer")),
    }
    Ok(())
}

// -- Control flow --

fn pop_procedure_body(interp: &mut Interpreter, op: &'static str) -> Result<crate::value::ArrayRef, Flow> {
    match interp.pop(op)? {
        Value::Procedure(body) => Ok(body),
        _ => Err(type_check(op, "procedure")),
    }
}

fn pop_bool(interp: &mut Interpreter, op: &'static str) -> Result<bool, Flow> {
    match interp.pop(op)? {
        Value::Bool(b) => Ok(b),
        _ => Err(type_check(op, "boolean")),
    }
}

fn if_op(interp: &mut Interpreter) -> OpResult {
    let proc = pop_procedure_body(interp, "if")?;
    let cond = pop_bool(interp, "if")?;
    if cond {
        interp.run_body(&proc);
    }
    Ok(())
}

fn ifelse(interp: &mut Interpreter) -> OpResult {
    let false_proc = pop_procedure_body(interp, "ifelse")?;
    let true_proc = pop_procedure_body(interp, "ifelse")?;
    let cond = pop_bool(interp, "ifelse")?;
    interp.run_body(if cond { &true_proc } else { &false_proc });
    Ok(())
}

fn for_op(interp: &mut Interpreter) -> OpResult {
    let proc = pop_procedure_body(interp, "for")?;
    let limit = interp.pop("for")?;
    let step = interp.pop("for")?;
    let initial = interp.pop("for")?;
    let all_int =
        matches!((&initial, &step, &limit), (Value::Int(_), Value::Int(_), Value::Int(_)));
    let (current, step_f, limit_f) = (
        initial.as_f64().ok_or_else(|| type_check("for", "number"))?,
        step.as_f64().ok_or_else(|| type_check("for", "number"))?,
        limit.as_f64().ok_or_else(|| type_check("for", "number"))?,
    );
    interp.push_forloop(current, step_f, limit_f, all_int, proc);
    Ok(())
}

fn repeat(interp: &mut Interpreter) -> OpResult {
    let proc = pop_procedure_body(interp, "repeat")?;
    let n = pop_int(interp, "repeat")?;
    if n < 0 {
        return Err(InterpreterError::NegativeSize { op: "repeat" }.into());
    }
    interp.push_repeatloop(n, proc);
    Ok(())
}

fn loop_op(interp: &mut Interpreter) -> OpResult {
    let proc = pop_procedure_body(interp, "loop")?;
    interp.push_loop(proc);
    Ok(())
}

fn exit_op(_interp: &mut Interpreter) -> OpResult {
    Err(Flow::Exit)
}

fn exec_op(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("exec")?;
    interp.exec_value(v)
}

fn stopped(interp: &mut Interpreter) -> OpResult {
    let proc = pop_procedure_body(interp, "stopped")?;
    interp.install_stopped_marker();
    interp.run_body(&proc);
    Ok(())
}

fn stop_op(_interp: &mut Interpreter) -> OpResult {
    Err(Flow::Stop)
}

// -- Dictionaries --

fn def(interp: &mut Interpreter) -> OpResult {
    let value = interp.pop("def")?;
    let key = pop_name(interp, "def")?;
    interp.define(key, value);
    Ok(())
}

fn pop_name(interp: &mut Interpreter, op: &'static str) -> Result<String, Flow> {
    match interp.pop(op)? {
        Value::LiteralName(n) | Value::ExecutableName(n) => Ok(n.to_string()),
        _ => Err(type_check(op, "name")),
    }
}

fn load(interp: &mut Interpreter) -> OpResult {
    let key = pop_name(interp, "load")?;
    let value = interp.lookup(&key).ok_or_else(|| Flow::Error(InterpreterError::Undefined { name: key }))?;
    interp.push(value);
    Ok(())
}

fn store(interp: &mut Interpreter) -> OpResult {
    let value = interp.pop("store")?;
    let key = pop_name(interp, "store")?;
    interp.store(key, value);
    Ok(())
}

fn begin(interp: &mut Interpreter) -> OpResult {
    match interp.pop("begin")? {
        Value::Dict(d) => {
            interp.begin(d);
            Ok(())
        }
        _ => Err(type_check("begin", "dictionary")),
    }
}

fn end(interp: &mut Interpreter) -> OpResult {
    interp.end("end")
}

fn dict_op(interp: &mut Interpreter) -> OpResult {
    let _capacity = pop_int(interp, "dict")?;
    interp.push(Value::Dict(Rc::new(RefCell::new(IndexMap::new()))));
    Ok(())
}

fn currentdict(interp: &mut Interpreter) -> OpResult {
    interp.push(Value::Dict(interp.current_dict()));
    Ok(())
}

// -- Arrays --

fn array_op(interp: &mut Interpreter) -> OpResult {
    let n = pop_int(interp, "array")?;
    if n < 0 {
        return Err(InterpreterError::NegativeSize { op: "array" }.into());
    }
    interp.push(Value::array_from(vec![Value::Null; n as usize]));
    Ok(())
}

fn length(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("length")?;
    let n = match &v {
        Value::Array(a) | Value::Procedure(a) => a.len(),
        Value::String(s) => s.borrow().len(),
        Value::Dict(d) => d.borrow().len(),
        _ => return Err(type_check("length", "array, string, or dictionary")),
    };
    interp.push(Value::Int(n as i64));
    Ok(())
}

fn get(interp: &mut Interpreter) -> OpResult {
    let index = interp.pop("get")?;
    let container = interp.pop("get")?;
    match container {
        Value::Array(a) | Value::Procedure(a) => {
            let i = expect_index(index, "get")?;
            let item = a.get(i).ok_or_else(|| InterpreterError::RangeCheck { op: "get" })?;
            interp.push(item);
        }
        Value::String(s) => {
            let i = expect_index(index, "get")?;
            let bytes = s.borrow();
            let byte = *bytes.get(i).ok_or_else(|| InterpreterError::RangeCheck { op: "get" })?;
            interp.push(Value::Int(byte as i64));
        }
        Value::Dict(d) => {
            let key = match index {
                Value::LiteralName(n) | Value::ExecutableName(n) => n.to_string(),
                Value::String(s) => String::from_utf8_lossy(&s.borrow()).into_owned(),
                _ => return Err(type_check("get", "name or string key")),
            };
            let value =
                d.borrow().get(&key).cloned().ok_or_else(|| InterpreterError::Undefined { name: key })?;
            interp.push(value);
        }
        _ => return Err(type_check("get", "array, string, or dictionary")),
    }
    Ok(())
}

fn expect_index(v: Value, op: &'static str) -> Result<usize, Flow> {
    match v {
        Value::Int(i) if i >= 0 => Ok(i as usize),
        Value::Int(_) => Err(InterpreterError::RangeCheck { op }.into()),
        _ => Err(type_check(op, "integer")),
    }
}

fn put(interp: &mut Interpreter) -> OpResult {
    let value = interp.pop("put")?;
    let index = interp.pop("put")?;
    let container = interp.pop("put")?;
    match container {
        Value::Array(a) | Value::Procedure(a) => {
            let i = expect_index(index, "put")?;
            if !a.set(i, value) {
                return Err(InterpreterError::RangeCheck { op: "put" }.into());
            }
        }
        Value::Dict(d) => {
            let key = match index {
                Value::LiteralName(n) | Value::ExecutableName(n) => n.to_string(),
                Value::String(s) => String::from_utf8_lossy(&s.borrow()).into_owned(),
                _ => return Err(type_check("put", "name or string key")),
            };
            d.borrow_mut().insert(key, value);
        }
        _ => return Err(type_check("put", "array or dictionary")),
    }
    Ok(())
}

fn getinterval(interp: &mut Interpreter) -> OpResult {
    let count = pop_int(interp, "getinterval")?;
    let index = pop_int(interp, "getinterval")?;
    let container = interp.pop("getinterval")?;
    if count < 0 || index < 0 {
        return Err(InterpreterError::RangeCheck { op: "getinterval" }.into());
    }
    let (index, count) = (index as usize, count as usize);
    match container {
        Value::Array(a) => {
            if index + count > a.len() {
                return Err(InterpreterError::RangeCheck { op: "getinterval" }.into());
            }
            interp.push(Value::Array(Rc::new(a.slice(index, count))));
        }
        Value::String(s) => {
            let bytes = s.borrow();
            if index + count > bytes.len() {
                return Err(InterpreterError::RangeCheck { op: "getinterval" }.into());
            }
            interp.push(Value::String(Rc::new(RefCell::new(bytes[index..index + count].to_vec()))));
        }
        _ => return Err(type_check("getinterval", "array or string")),
    }
    Ok(())
}

fn putinterval(interp: &mut Interpreter) -> OpResult {
    let source = interp.pop("putinterval")?;
    let index = pop_int(interp, "putinterval")?;
    let dest = interp.pop("putinterval")?;
    if index < 0 {
        return Err(InterpreterError::RangeCheck { op: "putinterval" }.into());
    }
    let index = index as usize;
    match (dest, source) {
        (Value::Array(d), Value::Array(s)) => {
            let s_items = s.to_vec();
            if index + s_items.len() > d.len() {
                return Err(InterpreterError::RangeCheck { op: "putinterval" }.into());
            }
            for (offset, item) in s_items.into_iter().enumerate() {
                d.set(index + offset, item);
            }
        }
        (Value::String(d), Value::String(s)) => {
            let s_bytes = s.borrow().clone();
            let mut d_bytes = d.borrow_mut();
            if index + s_bytes.len() > d_bytes.len() {
                return Err(InterpreterError::RangeCheck { op: "putinterval" }.into());
            }
            d_bytes[index..index + s_bytes.len()].copy_from_slice(&s_bytes);
        }
        _ => return Err(type_check("putinterval", "matching array or string pair")),
    }
    Ok(())
}

fn forall(interp: &mut Interpreter) -> OpResult {
    let proc = pop_procedure_body(interp, "forall")?;
    let container = interp.pop("forall")?;
    let mut groups: Vec<Vec<Value>> = match container {
        Value::Array(a) => a.to_vec().into_iter().map(|v| vec![v]).collect(),
        Value::String(s) => s.borrow().iter().map(|&b| vec![Value::Int(b as i64)]).collect(),
        Value::Dict(d) => d
            .borrow()
            .iter()
            .map(|(k, v)| vec![Value::LiteralName(Rc::from(k.as_str())), v.clone()])
            .collect(),
        _ => return Err(type_check("forall", "array, string, or dictionary")),
    };
    groups.reverse();
    interp.push_forall(groups, proc);
    Ok(())
}

fn aload(interp: &mut Interpreter) -> OpResult {
    match interp.pop("aload")? {
        Value::Array(a) => {
            for item in a.to_vec() {
                interp.push(item);
            }
            interp.push(Value::Array(a));
            Ok(())
        }
        _ => Err(type_check("aload", "array")),
    }
}

fn astore(interp: &mut Interpreter) -> OpResult {
    match interp.pop("astore")? {
        Value::Array(a) => {
            let n = a.len();
            if interp.stack_len() < n {
                return Err(InterpreterError::StackUnderflow { op: "astore" }.into());
            }
            for i in (0..n).rev() {
                let v = interp.stack_slice_mut().pop().expect("length checked above");
                a.set(i, v);
            }
            interp.push(Value::Array(a));
            Ok(())
        }
        _ => Err(type_check("astore", "array")),
    }
}

// -- Strings --

fn string_op(interp: &mut Interpreter) -> OpResult {
    let n = pop_int(interp, "string")?;
    if n < 0 {
        return Err(InterpreterError::NegativeSize { op: "string" }.into());
    }
    interp.push(Value::String(Rc::new(RefCell::new(vec![0u8; n as usize]))));
    Ok(())
}

fn cvs(interp: &mut Interpreter) -> OpResult {
    let _buffer = interp.pop("cvs")?;
    let obj = interp.pop("cvs")?;
    interp.push(Value::string_from(&format_short(&obj)));
    Ok(())
}

// -- Type checking / conversion --

fn type_op(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("type")?;
    interp.push(Value::string_from(v.type_name()));
    Ok(())
}

fn cvx(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("cvx")?;
    let converted = match v {
        Value::LiteralName(n) => Value::ExecutableName(n),
        Value::Array(a) => Value::Procedure(a),
        other => other,
    };
    interp.push(converted);
    Ok(())
}

fn cvlit(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("cvlit")?;
    let converted = match v {
        Value::ExecutableName(n) => Value::LiteralName(n),
        Value::Procedure(a) => Value::Array(a),
        other => other,
    };
    interp.push(converted);
    Ok(())
}

// -- I/O --

fn print_op(interp: &mut Interpreter) -> OpResult {
    match interp.pop("print")? {
        Value::String(s) => {
            let bytes = s.borrow().clone();
            let _ = interp.writer().write_all(&bytes);
            Ok(())
        }
        _ => Err(type_check("print", "string")),
    }
}

fn equals(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("=")?;
    let _ = writeln!(interp.writer(), "{}", format_short(&v));
    Ok(())
}

fn equals_equals(interp: &mut Interpreter) -> OpResult {
    let v = interp.pop("==")?;
    let _ = writeln!(interp.writer(), "{}", format_verbose(&v));
    Ok(())
}

fn pstack(interp: &mut Interpreter) -> OpResult {
    let items: Vec<String> = interp.stack_slice().iter().rev().map(format_verbose).collect();
    for line in items {
        let _ = writeln!(interp.writer(), "{}", line);
    }
    Ok(())
}
