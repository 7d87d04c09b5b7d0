//! Runtime value model.
//!
//! Values dispatch by pattern match rather than the original's visitor
//! hierarchy — a tagged enum is the idiomatic Rust shape for a closed set of
//! kinds (`Int`/`Float`/`Char`/`String`/`Reference`/`Void`).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;

/// A scope-owned storage slot. Cloning a `Cell` clones the handle, not the
/// contents — the same discipline the scope manager relies on for aliasing.
pub type Cell = Rc<RefCell<Value>>;

pub fn new_cell(value: Value) -> Cell {
    Rc::new(RefCell::new(value))
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Char(u8),
    String(String),
    /// Internal r-value category: a handle to a cell, produced by identifier
    /// evaluation and consumed by dereferencing at every use site. Never
    /// constructed directly by a `Literal` node.
    Reference(Cell),
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    Int,
    Float,
    Char,
    String,
}

impl CastTarget {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "char" => Some(Self::Char),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Gt,
    Leq,
    Geq,
    And,
    Or,
}

impl Value {
    /// Follows a `Reference` to the current contents of its cell, cloning
    /// the value out. Non-reference values are returned unchanged.
    pub fn deref(&self) -> Value {
        match self {
            Value::Reference(cell) => cell.borrow().deref(),
            other => other.clone(),
        }
    }

    pub fn is_truthy(&self) -> Result<bool, RuntimeError> {
        match self.deref() {
            Value::Int(n) => Ok(n != 0),
            Value::Float(f) => Ok(f != 0.0),
            Value::Char(c) => Ok(c != 0),
            Value::String(_) => Err(RuntimeError::new("Cannot use string as a condition")),
            Value::Void => Err(RuntimeError::new("Value is void")),
            Value::Reference(_) => unreachable!("deref() never returns a Reference"),
        }
    }

    pub fn cast(&self, target: CastTarget) -> Result<Value, RuntimeError> {
        use CastTarget::*;
        match self.deref() {
            Value::Void => Err(RuntimeError::new("Value is void")),
            Value::Int(n) => Ok(match target {
                Int => Value::Int(n),
                Float => Value::Float(n as f64),
                Char => Value::Char(n as u8),
                String => Value::String(n.to_string()),
            }),
            Value::Float(f) => Ok(match target {
                Int => Value::Int(f.trunc() as i64),
                Float => Value::Float(f),
                Char => Value::Char(f.trunc() as i64 as u8),
                String => Value::String(f.to_string()),
            }),
            Value::Char(c) => Ok(match target {
                Int => Value::Int(c as i64),
                Float => Value::Float(c as f64),
                Char => Value::Char(c),
                String => Value::String((c as char).to_string()),
            }),
            Value::String(s) => match target {
                String => Ok(Value::String(s)),
                Int => s
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| RuntimeError::new("String is not a valid number")),
                Float => s
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| RuntimeError::new("String is not a valid number")),
                Char => Err(RuntimeError::new("Cannot cast string to char")),
            },
            Value::Reference(_) => unreachable!("deref() never returns a Reference"),
        }
    }

    pub fn negate(&self) -> Result<Value, RuntimeError> {
        match self.deref() {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Char(c) => Ok(Value::Int(-(c as i64))),
            Value::String(_) => Err(RuntimeError::new("Cannot perform unary operation on string")),
            Value::Void => Err(RuntimeError::new("Value is void")),
            Value::Reference(_) => unreachable!("deref() never returns a Reference"),
        }
    }

    /// The decimal/textual form used by `print`. Errors on `Void`.
    pub fn display_repr(&self) -> Result<String, RuntimeError> {
        match self.deref() {
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Char(c) => Ok((c as char).to_string()),
            Value::String(s) => Ok(s),
            Value::Void => Err(RuntimeError::new("Value is void")),
            Value::Reference(_) => unreachable!("deref() never returns a Reference"),
        }
    }

    /// Binary operation on two already-evaluated operands (not necessarily
    /// dereferenced yet — this dereferences both). The right operand is
    /// coerced to the left operand's numeric kind before combining, per the
    /// left-driven coercion rule; this is the source of the documented
    /// `0.9 && 1` / `1 && 0.9` asymmetry.
    pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
        let lhs = lhs.deref();
        let rhs = rhs.deref();

        if matches!(lhs, Value::Void) || matches!(rhs, Value::Void) {
            return Err(RuntimeError::new("Value is void"));
        }

        match &lhs {
            Value::String(l) => Self::string_binary(op, l, &rhs),
            Value::Int(_) => Self::numeric_binary(op, &lhs, &rhs, CastTarget::Int),
            Value::Float(_) => Self::numeric_binary(op, &lhs, &rhs, CastTarget::Float),
            Value::Char(_) => Self::numeric_binary(op, &lhs, &rhs, CastTarget::Char),
            Value::Void | Value::Reference(_) => unreachable!("handled above / by deref()"),
        }
    }

    fn string_binary(op: BinaryOp, lhs: &str, rhs: &Value) -> Result<Value, RuntimeError> {
        let Value::String(rhs) = rhs else {
            return Err(RuntimeError::new("Types are not compatible in binary operation"));
        };
        match op {
            BinaryOp::Add => Ok(Value::String(format!("{lhs}{rhs}"))),
            BinaryOp::Eq => Ok(Value::Int((lhs == rhs) as i64)),
            _ => Err(RuntimeError::new("Binary operator is not supported on string")),
        }
    }

    fn numeric_binary(
        op: BinaryOp,
        lhs: &Value,
        rhs: &Value,
        target: CastTarget,
    ) -> Result<Value, RuntimeError> {
        let rhs = rhs
            .cast(target)
            .map_err(|_| RuntimeError::new("Types are not compatible in binary operation"))?;

        match (lhs, &rhs, target) {
            (Value::Int(l), Value::Int(r), CastTarget::Int) => Self::numeric_op(op, *l, *r),
            (Value::Float(l), Value::Float(r), CastTarget::Float) => Self::numeric_op(op, *l, *r),
            (Value::Char(l), Value::Char(r), CastTarget::Char) => {
                Self::numeric_op(op, *l as i64, *r as i64).map(|v| match v {
                    Value::Int(n) if !matches!(op, BinaryOp::Eq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Leq | BinaryOp::Geq | BinaryOp::And | BinaryOp::Or) => {
                        Value::Char(n as u8)
                    }
                    other => other,
                })
            }
            _ => Err(RuntimeError::new("Types are not compatible in binary operation")),
        }
    }

    fn numeric_op<T>(op: BinaryOp, l: T, r: T) -> Result<Value, RuntimeError>
    where
        T: PartialOrd + PartialEq + Copy + Default + Into<NumericResult>,
        T: std::ops::Add<Output = T>
            + std::ops::Sub<Output = T>
            + std::ops::Mul<Output = T>
            + DivOrError,
    {
        let value = match op {
            BinaryOp::Add => (l + r).into(),
            BinaryOp::Sub => (l - r).into(),
            BinaryOp::Mul => (l * r).into(),
            BinaryOp::Div => l.checked_div(r)?.into(),
            BinaryOp::Eq => NumericResult::Int((l == r) as i64),
            BinaryOp::Lt => NumericResult::Int((l < r) as i64),
            BinaryOp::Gt => NumericResult::Int((l > r) as i64),
            BinaryOp::Leq => NumericResult::Int((l <= r) as i64),
            BinaryOp::Geq => NumericResult::Int((l >= r) as i64),
            BinaryOp::And => NumericResult::Int((is_nonzero(l) && is_nonzero(r)) as i64),
            BinaryOp::Or => NumericResult::Int((is_nonzero(l) || is_nonzero(r)) as i64),
        };
        Ok(value.into_value())
    }
}

fn is_nonzero<T: PartialEq + Default>(v: T) -> bool {
    v != T::default()
}

/// Carries the numeric result of an operation before it's wrapped back into
/// the `Value` variant the caller expects.
enum NumericResult {
    Int(i64),
    Float(f64),
}

impl NumericResult {
    fn into_value(self) -> Value {
        match self {
            NumericResult::Int(n) => Value::Int(n),
            NumericResult::Float(f) => Value::Float(f),
        }
    }
}

impl From<i64> for NumericResult {
    fn from(n: i64) -> Self {
        NumericResult::Int(n)
    }
}

impl From<f64> for NumericResult {
    fn from(f: f64) -> Self {
        NumericResult::Float(f)
    }
}

trait DivOrError: Sized {
    fn checked_div(self, rhs: Self) -> Result<Self, RuntimeError>;
}

impl DivOrError for i64 {
    fn checked_div(self, rhs: Self) -> Result<Self, RuntimeError> {
        self.checked_div(rhs)
            .ok_or_else(|| RuntimeError::new("Division by zero"))
    }
}

impl DivOrError for f64 {
    fn checked_div(self, rhs: Self) -> Result<Self, RuntimeError> {
        Ok(self / rhs)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Char(c) => write!(f, "{}", *c as char),
            Value::String(s) => write!(f, "{s}"),
            Value::Reference(cell) => write!(f, "{}", cell.borrow()),
            Value::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_driven_coercion_is_asymmetric() {
        let a = Value::binary(BinaryOp::And, &Value::Float(0.9), &Value::Int(1)).unwrap();
        let b = Value::binary(BinaryOp::And, &Value::Int(1), &Value::Float(0.9)).unwrap();
        assert!(matches!(a, Value::Int(1)));
        assert!(matches!(b, Value::Int(0)));
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        let v = Value::binary(BinaryOp::Div, &Value::Int(7), &Value::Int(2)).unwrap();
        assert!(matches!(v, Value::Int(3)));
    }

    #[test]
    fn integer_division_by_zero_errors() {
        let err = Value::binary(BinaryOp::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.message, "Division by zero");
    }

    #[test]
    fn float_division_by_zero_yields_infinity() {
        let v = Value::binary(BinaryOp::Div, &Value::Float(1.0), &Value::Float(0.0)).unwrap();
        assert!(matches!(v, Value::Float(f) if f.is_infinite()));
    }

    #[test]
    fn string_concat_and_equality() {
        let s = Value::binary(
            BinaryOp::Add,
            &Value::String("ab".into()),
            &Value::String("cd".into()),
        )
        .unwrap();
        assert!(matches!(&s, Value::String(v) if v == "abcd"));

        let eq = Value::binary(BinaryOp::Eq, &s, &Value::String("abcd".into())).unwrap();
        assert!(matches!(eq, Value::Int(1)));
    }

    #[test]
    fn string_minus_is_unsupported() {
        let err = Value::binary(
            BinaryOp::Sub,
            &Value::String("a".into()),
            &Value::String("b".into()),
        )
        .unwrap_err();
        assert_eq!(err.message, "Binary operator is not supported on string");
    }

    #[test]
    fn mismatched_kinds_error() {
        let err = Value::binary(BinaryOp::Add, &Value::Int(1), &Value::String("x".into())).unwrap_err();
        assert_eq!(err.message, "Types are not compatible in binary operation");
    }

    #[test]
    fn cast_round_trips_int_through_float() {
        let n = Value::Int(42);
        let back = n.cast(CastTarget::Float).unwrap().cast(CastTarget::Int).unwrap();
        assert!(matches!(back, Value::Int(42)));
    }

    #[test]
    fn cast_string_to_int_reports_parse_failure() {
        let err = Value::String("abc".into()).cast(CastTarget::Int).unwrap_err();
        assert_eq!(err.message, "String is not a valid number");
    }

    #[test]
    fn deref_follows_reference_chain() {
        let cell = new_cell(Value::Int(5));
        let r = Value::Reference(cell);
        assert!(matches!(r.deref(), Value::Int(5)));
    }
}
