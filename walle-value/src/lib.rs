pub mod builtin;
pub mod color;

pub use builtin::Builtin;
pub use color::Color;

use std::fmt;

/// The language's only non-string scalar. Remembers whether it was produced as an integer or
/// a boolean, but converts freely between both interpretations.
#[derive(Debug, Clone, Copy)]
pub enum IntOrBool {
    Int(i64),
    Bool(bool),
}

impl IntOrBool {
    /// Integer interpretation. `false` is `0` and `true` is `1`.
    pub fn as_int(self) -> i64 {
        match self {
            IntOrBool::Int(val) => val,
            IntOrBool::Bool(val) => val as i64,
        }
    }

    /// Boolean interpretation. Any non-zero integer is `true`.
    pub fn as_bool(self) -> bool {
        match self {
            IntOrBool::Int(val) => val != 0,
            IntOrBool::Bool(val) => val,
        }
    }
}

impl PartialEq for IntOrBool {
    fn eq(&self, other: &Self) -> bool {
        self.as_int() == other.as_int()
    }
}

impl Eq for IntOrBool {}

impl From<i64> for IntOrBool {
    fn from(val: i64) -> Self {
        IntOrBool::Int(val)
    }
}

impl From<bool> for IntOrBool {
    fn from(val: bool) -> Self {
        IntOrBool::Bool(val)
    }
}

impl fmt::Display for IntOrBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrBool::Int(val) => write!(f, "{}", val),
            IntOrBool::Bool(val) => write!(f, "{}", val),
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    IntOrBool(IntOrBool),
    Str(String),
}

impl Value {
    pub fn int(val: i64) -> Self {
        Value::IntOrBool(IntOrBool::Int(val))
    }

    pub fn bool(val: bool) -> Self {
        Value::IntOrBool(IntOrBool::Bool(val))
    }

    /// Returns the static type of the value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::IntOrBool(_) => ValueType::IntOrBool,
            Value::Str(_) => ValueType::Str,
        }
    }

    /// Attempts to cast the `Value` into an [`IntOrBool`] or `None` if wrong type.
    pub fn cast_to_int_or_bool(&self) -> Option<IntOrBool> {
        match self {
            Value::IntOrBool(val) => Some(*val),
            Value::Str(_) => None,
        }
    }

    /// Attempts to cast the `Value` into a `&str` or `None` if wrong type.
    pub fn cast_to_str(&self) -> Option<&str> {
        match self {
            Value::Str(val) => Some(val),
            Value::IntOrBool(_) => None,
        }
    }
}

impl From<IntOrBool> for Value {
    fn from(val: IntOrBool) -> Self {
        Value::IntOrBool(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::Str(val)
    }
}

/// Textual form used by string concatenation: decimal integers, `true`/`false`, raw strings.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::IntOrBool(val) => write!(f, "{}", val),
            Value::Str(val) => write!(f, "{}", val),
        }
    }
}

/// Static type of an expression as seen by the semantic checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    IntOrBool,
    Str,
    /// Only statements are void. No expression should ever have this type.
    Void,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::IntOrBool => "IntOrBool",
            ValueType::Str => "String",
            ValueType::Void => "Void",
        };
        f.write_str(name)
    }
}
