//! Run-time values.

use crate::error::BindError;
use crate::host::HostObject;
use std::fmt;
use std::sync::{Arc, Weak};

/// Handle of a host class. Also used as the requesting-type context of a
/// dispatch, and as the target of a static query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeToken(pub u32);

/// Native code behind a method, property accessor or bound function.
///
/// Receives the receiver (`this`, or the class token for statics) and the
/// arguments.
pub type NativeFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, BindError> + Send + Sync>;

/// A callable value: a native function, optionally bound to a receiver.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    receiver: Option<Box<Value>>,
    native: NativeFn,
}

impl Function {
    pub fn new(name: &str, native: NativeFn) -> Self {
        Function {
            name: Arc::from(name),
            receiver: None,
            native,
        }
    }

    /// Bind to `receiver`; calls then see it as `this`.
    #[must_use]
    pub fn bind(&self, receiver: Value) -> Self {
        Function {
            name: self.name.clone(),
            receiver: Some(Box::new(receiver)),
            native: self.native.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, BindError> {
        let this = self.receiver.as_deref().unwrap_or(&Value::Undefined);
        (self.native)(this, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// Strong reference to a host object.
///
/// Equality is identity: two handles are equal only when they point at the
/// same object.
#[derive(Clone)]
pub struct ObjectRef(Arc<HostObject>);

impl ObjectRef {
    pub(crate) fn new(object: HostObject) -> Self {
        ObjectRef(Arc::new(object))
    }

    pub fn class(&self) -> TypeToken {
        self.0.class()
    }

    pub(crate) fn object(&self) -> &HostObject {
        &self.0
    }

    /// Identity of the object, stable for as long as any handle (strong or
    /// weak) to it exists.
    #[inline]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn downgrade(&self) -> Weak<HostObject> {
        Arc::downgrade(&self.0)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object#{:x}(class {})", self.identity(), self.class().0)
    }
}

/// A dynamically typed value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    Object(ObjectRef),
    /// A class used as a value: the target of static member access.
    Class(TypeToken),
    Function(Function),
}

impl Value {
    /// `null` or `undefined`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value's type for primitives and functions. Objects and
    /// classes are named by the binder that knows their classes.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::Str(_) => "String",
            Value::Object(_) => "Object",
            Value::Class(_) => "Class",
            Value::Function(_) => "Function",
        }
    }

    /// Textual form of a member name, or `None` for `null`/`undefined`.
    pub fn to_member_name(&self) -> Option<String> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Str(s) => Some(s.to_string()),
            other => Some(other.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.native, &b.native),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => format_number(*n, f),
            Value::Str(s) => f.write_str(s),
            Value::Object(obj) => write!(f, "[object #{:x}]", obj.identity()),
            Value::Class(token) => write!(f, "[class {}]", token.0),
            Value::Function(func) => write!(f, "function {}()", func.name()),
        }
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Integral numbers print without a fraction (`1`, not `1.0`).
fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
