//! Core object model for the PostScript-family runtime.
//!
//! Composites (String, Array, Procedure, Dictionary) get reference semantics
//! via `Rc<RefCell<_>>` so that two stack slots can alias the same
//! underlying object and mutation through either is observable through the
//! other.
//!
//! Array and Procedure intentionally share one representation
//! (`ArrayRef`, an `Rc<ArrayData>` windowed view over a backing `Vec`): in
//! this language a procedure *is* an executable array, so `cvx`/`cvlit`
//! just re-tag the same allocation instead of copying it, which is what
//! makes the `cvx cvlit` round-trip an identity operation for free. The
//! windowing additionally lets `getinterval` produce a distinct array
//! object that still shares storage with its source.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::engine::{Interpreter, OpResult};

/// Backing storage for an array/procedure body, plus the `(start, len)`
/// window a particular array *object* views into it.
///
/// `getinterval` on an array must share storage with its source while
/// still being a distinct object for `eq`/identity purposes — real
/// PostScript sub-arrays alias storage but are not `eq` to their parent.
/// Modeling that as an owning `Rc<Vec<Value>>` window (rather than
/// cloning elements) makes the aliasing fall out for free: two `ArrayRef`s
/// with the same `storage` but different windows still mutate the same
/// underlying `Vec` through `put`/`putinterval`.
#[derive(Debug)]
pub struct ArrayData {
    storage: Rc<RefCell<Vec<Value>>>,
    start: usize,
    len: usize,
}

impl ArrayData {
    pub fn whole(items: Vec<Value>) -> Self {
        let len = items.len();
        ArrayData { storage: Rc::new(RefCell::new(items)), start: 0, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Option<Value> {
        if i < self.len { Some(self.storage.borrow()[self.start + i].clone()) } else { None }
    }

    /// Writes `v` at window-relative index `i`. Returns `false` if out of
    /// range (the caller is expected to have already range-checked).
    pub fn set(&self, i: usize, v: Value) -> bool {
        if i >= self.len {
            return false;
        }
        self.storage.borrow_mut()[self.start + i] = v;
        true
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.storage.borrow()[self.start..self.start + self.len].to_vec()
    }

    /// A new array object sharing this array's storage, windowed to
    /// `[start, start + len)` relative to this array's own window.
    pub fn slice(&self, start: usize, len: usize) -> ArrayData {
        ArrayData { storage: self.storage.clone(), start: self.start + start, len }
    }
}

pub type ArrayRef = Rc<ArrayData>;
pub type StringRef = Rc<RefCell<Vec<u8>>>;
pub type DictRef = Rc<RefCell<IndexMap<String, Value>>>;

/// A native operator: a function bound to a name in the system dictionary.
#[derive(Clone, Copy)]
pub struct Operator {
    pub name: &'static str,
    pub func: fn(&mut Interpreter) -> OpResult,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operator({})", self.name)
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::eq(self.func as *const (), other.func as *const ())
    }
}

/// The full object universe.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Real(f64),
    Bool(bool),
    String(StringRef),
    LiteralName(Rc<str>),
    ExecutableName(Rc<str>),
    Array(ArrayRef),
    Procedure(ArrayRef),
    Dict(DictRef),
    Mark,
    Operator(Operator),
    /// Placeholder stored by `n array`'s initial fill; distinct from every
    /// other variant.
    Null,
}

impl Value {
    pub fn string_from(s: &str) -> Value {
        Value::String(Rc::new(RefCell::new(s.as_bytes().to_vec())))
    }

    pub fn array_from(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(ArrayData::whole(items)))
    }

    pub fn procedure_from(items: Vec<Value>) -> Value {
        Value::Procedure(Rc::new(ArrayData::whole(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integertype",
            Value::Real(_) => "realtype",
            Value::Bool(_) => "booleantype",
            Value::String(_) => "stringtype",
            Value::LiteralName(_) => "nametype",
            Value::ExecutableName(_) => "nametype",
            Value::Array(_) => "arraytype",
            Value::Procedure(_) => "arraytype",
            Value::Dict(_) => "dicttype",
            Value::Mark => "marktype",
            Value::Operator(_) => "operatortype",
            Value::Null => "nulltype",
        }
    }

    /// Numeric value as f64, if this is Int or Real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Real(_))
    }
}

/// Equality by value across compatible types: numbers cross-compare,
/// strings compare by content, composites compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Int(a), Value::Real(b)) | (Value::Real(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => *a.borrow() == *b.borrow(),
            (Value::LiteralName(a), Value::LiteralName(b)) => a == b,
            (Value::ExecutableName(a), Value::ExecutableName(b)) => a == b,
            (Value::LiteralName(a), Value::ExecutableName(b))
            | (Value::ExecutableName(b), Value::LiteralName(a)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Procedure(b)) | (Value::Procedure(b), Value::Array(a)) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Mark, Value::Mark) => true,
            (Value::Null, Value::Null) => true,
            (Value::Operator(a), Value::Operator(b)) => a == b,
            _ => false,
        }
    }
}

fn bytes_to_display(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Short form used by `=`.
pub fn format_short(v: &Value) -> String {
    match v {
        Value::Int(i) => i.to_string(),
        Value::Real(r) => format_real(*r),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => bytes_to_display(&s.borrow()),
        Value::LiteralName(n) => format!("/{n}"),
        Value::ExecutableName(n) => n.to_string(),
        Value::Array(_) => format_verbose(v),
        Value::Procedure(_) => "--nostringval--".to_string(),
        Value::Dict(_) => "-dict-".to_string(),
        Value::Mark => "-mark-".to_string(),
        Value::Operator(op) => format!("--{}--", op.name),
        Value::Null => "null".to_string(),
    }
}

/// Verbose form used by `==` (arrays/procedures expand their contents).
pub fn format_verbose(v: &Value) -> String {
    match v {
        Value::Array(arr) => {
            let items: Vec<String> = arr.to_vec().iter().map(format_verbose).collect();
            format!("[ {} ]", items.join(" "))
        }
        Value::Procedure(body) => {
            let items: Vec<String> = body.to_vec().iter().map(format_verbose).collect();
            format!("{{ {} }}", items.join(" "))
        }
        Value::String(s) => format!("({})", bytes_to_display(&s.borrow())),
        _ => format_short(v),
    }
}

fn format_real(r: f64) -> String {
    if r == r.trunc() && r.is_finite() {
        format!("{r:.1}")
    } else {
        format!("{r}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_short(self))
    }
}
