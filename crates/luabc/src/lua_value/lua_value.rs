// Lua 5.1 value representation
// A closed set of tagged variants; numbers are a single IEEE f64 and
// "integer printing" is a property of stringification only.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::lua_value::{CFunction, LuaFunction, LuaString, LuaTable};
use crate::lua_vm::{LuaError, LuaResult};

#[derive(Clone)]
pub enum LuaValue {
    Nil,
    Boolean(bool),
    Number(f64),
    /// Immutable, reference counted
    String(Rc<LuaString>),
    /// Shared by reference, identity semantics
    Table(Rc<RefCell<LuaTable>>),
    /// Closure: prototype plus bound upvalues
    Function(Rc<LuaFunction>),
    /// Host-provided callable
    CFunction(CFunction),
}

impl LuaValue {
    pub fn nil() -> Self {
        LuaValue::Nil
    }

    pub fn boolean(b: bool) -> Self {
        LuaValue::Boolean(b)
    }

    pub fn number(n: f64) -> Self {
        LuaValue::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        LuaValue::String(Rc::new(LuaString::new(s.into())))
    }

    pub fn table(t: LuaTable) -> Self {
        LuaValue::Table(Rc::new(RefCell::new(t)))
    }

    pub fn function(f: LuaFunction) -> Self {
        LuaValue::Function(Rc::new(f))
    }

    pub fn cfunction(f: CFunction) -> Self {
        LuaValue::CFunction(f)
    }

    // Type checks
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, LuaValue::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, LuaValue::String(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, LuaValue::Table(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, LuaValue::Function(_) | LuaValue::CFunction(_))
    }

    // Extractors
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<Rc<LuaString>> {
        match self {
            LuaValue::String(s) => Some(Rc::clone(s)),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<Rc<RefCell<LuaTable>>> {
        match self {
            LuaValue::Table(t) => Some(Rc::clone(t)),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<Rc<LuaFunction>> {
        match self {
            LuaValue::Function(f) => Some(Rc::clone(f)),
            _ => None,
        }
    }

    /// Lua type name, as reported by `type()` and used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Boolean(_) => "boolean",
            LuaValue::Number(_) => "number",
            LuaValue::String(_) => "string",
            LuaValue::Table(_) => "table",
            LuaValue::Function(_) | LuaValue::CFunction(_) => "function",
        }
    }

    /// Lua truthiness: only nil and false are falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    /// Canonical decimal for a number: integer-valued numbers print without
    /// a decimal point
    pub fn number_to_string(n: f64) -> String {
        if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
            itoa::Buffer::new().format(n as i64).to_string()
        } else {
            format!("{n}")
        }
    }

    /// Lua-style string representation, as produced by `tostring` and `print`
    pub fn to_string_repr(&self) -> String {
        match self {
            LuaValue::Nil => "nil".to_string(),
            LuaValue::Boolean(b) => b.to_string(),
            LuaValue::Number(n) => Self::number_to_string(*n),
            LuaValue::String(s) => s.as_str().to_string(),
            LuaValue::Table(t) => format!("table: {:p}", Rc::as_ptr(t)),
            LuaValue::Function(f) => format!("function: {:p}", Rc::as_ptr(f)),
            LuaValue::CFunction(f) => format!("function: 0x{:x}", *f as usize),
        }
    }

    /// `tonumber` coercion: numbers pass through, strings parse (decimal or
    /// 0x hex) and anything else yields nil
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            LuaValue::String(s) => {
                let text = s.as_str().trim();
                if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    i64::from_str_radix(hex, 16).ok().map(|i| i as f64)
                } else {
                    text.parse::<f64>().ok()
                }
            }
            _ => None,
        }
    }

    fn arith_operand(&self) -> LuaResult<f64> {
        self.as_number().ok_or_else(|| {
            LuaError::TypeError(format!(
                "attempt to perform arithmetic on a {} value",
                self.type_name()
            ))
        })
    }

    pub fn op_add(&self, other: &LuaValue) -> LuaResult<LuaValue> {
        Ok(LuaValue::Number(self.arith_operand()? + other.arith_operand()?))
    }

    pub fn op_sub(&self, other: &LuaValue) -> LuaResult<LuaValue> {
        Ok(LuaValue::Number(self.arith_operand()? - other.arith_operand()?))
    }

    pub fn op_mul(&self, other: &LuaValue) -> LuaResult<LuaValue> {
        Ok(LuaValue::Number(self.arith_operand()? * other.arith_operand()?))
    }

    pub fn op_div(&self, other: &LuaValue) -> LuaResult<LuaValue> {
        // division by zero follows IEEE (inf/nan), never an error
        Ok(LuaValue::Number(self.arith_operand()? / other.arith_operand()?))
    }

    /// Floored modulus: the result takes the sign of the divisor
    pub fn op_mod(&self, other: &LuaValue) -> LuaResult<LuaValue> {
        let a = self.arith_operand()?;
        let b = other.arith_operand()?;
        Ok(LuaValue::Number(a - (a / b).floor() * b))
    }

    pub fn op_pow(&self, other: &LuaValue) -> LuaResult<LuaValue> {
        Ok(LuaValue::Number(self.arith_operand()?.powf(other.arith_operand()?)))
    }

    pub fn op_unm(&self) -> LuaResult<LuaValue> {
        Ok(LuaValue::Number(-self.arith_operand()?))
    }

    /// Concatenation operand: strings pass through, numbers stringify
    pub fn concat_operand(&self) -> LuaResult<String> {
        match self {
            LuaValue::String(s) => Ok(s.as_str().to_string()),
            LuaValue::Number(n) => Ok(Self::number_to_string(*n)),
            other => Err(LuaError::TypeError(format!(
                "attempt to concatenate a {} value",
                other.type_name()
            ))),
        }
    }

    /// `#` operator: byte length of strings, border length of tables
    pub fn op_len(&self) -> LuaResult<LuaValue> {
        match self {
            LuaValue::String(s) => Ok(LuaValue::Number(s.len() as f64)),
            LuaValue::Table(t) => Ok(LuaValue::Number(t.borrow().len() as f64)),
            other => Err(LuaError::TypeError(format!(
                "attempt to get length of a {} value",
                other.type_name()
            ))),
        }
    }

    pub fn op_lt(&self, other: &LuaValue) -> LuaResult<bool> {
        match (self, other) {
            (LuaValue::Number(a), LuaValue::Number(b)) => Ok(a < b),
            (LuaValue::String(a), LuaValue::String(b)) => Ok(a.as_bytes() < b.as_bytes()),
            _ => Err(self.compare_error(other)),
        }
    }

    pub fn op_le(&self, other: &LuaValue) -> LuaResult<bool> {
        match (self, other) {
            (LuaValue::Number(a), LuaValue::Number(b)) => Ok(a <= b),
            (LuaValue::String(a), LuaValue::String(b)) => Ok(a.as_bytes() <= b.as_bytes()),
            _ => Err(self.compare_error(other)),
        }
    }

    fn compare_error(&self, other: &LuaValue) -> LuaError {
        let (a, b) = (self.type_name(), other.type_name());
        if a == b {
            LuaError::TypeError(format!("attempt to compare two {a} values"))
        } else {
            LuaError::TypeError(format!("attempt to compare {a} with {b}"))
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            other => write!(f, "{}", other.to_string_repr()),
        }
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            // IEEE equality: NaN != NaN
            (LuaValue::Number(a), LuaValue::Number(b)) => a == b,
            (LuaValue::String(a), LuaValue::String(b)) => a.as_bytes() == b.as_bytes(),
            // Reference types compare by identity
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => Rc::ptr_eq(a, b),
            (LuaValue::CFunction(a), LuaValue::CFunction(b)) => {
                std::ptr::fn_addr_eq(*a, *b)
            }
            _ => false,
        }
    }
}

impl Eq for LuaValue {}

impl std::hash::Hash for LuaValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            LuaValue::Nil => 0u8.hash(state),
            LuaValue::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            LuaValue::Number(n) => {
                2u8.hash(state);
                n.to_bits().hash(state);
            }
            LuaValue::String(s) => {
                3u8.hash(state);
                s.as_bytes().hash(state);
            }
            LuaValue::Table(t) => {
                4u8.hash(state);
                Rc::as_ptr(t).hash(state);
            }
            LuaValue::Function(f) => {
                5u8.hash(state);
                Rc::as_ptr(f).hash(state);
            }
            LuaValue::CFunction(f) => {
                6u8.hash(state);
                (*f as usize).hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!LuaValue::Nil.is_truthy());
        assert!(!LuaValue::Boolean(false).is_truthy());
        assert!(LuaValue::Boolean(true).is_truthy());
        assert!(LuaValue::Number(0.0).is_truthy());
        assert!(LuaValue::string("").is_truthy());
    }

    #[test]
    fn test_number_stringification() {
        assert_eq!(LuaValue::Number(55.0).to_string_repr(), "55");
        assert_eq!(LuaValue::Number(-3.0).to_string_repr(), "-3");
        assert_eq!(LuaValue::Number(0.5).to_string_repr(), "0.5");
        assert_eq!(LuaValue::Number(f64::INFINITY).to_string_repr(), "inf");
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(LuaValue::string("42").coerce_number(), Some(42.0));
        assert_eq!(LuaValue::string(" 3.5 ").coerce_number(), Some(3.5));
        assert_eq!(LuaValue::string("0x10").coerce_number(), Some(16.0));
        assert_eq!(LuaValue::string("spam").coerce_number(), None);
        assert_eq!(LuaValue::Boolean(true).coerce_number(), None);
        assert_eq!(LuaValue::Nil.coerce_number(), None);
    }

    #[test]
    fn test_arithmetic_is_number_only() {
        let err = LuaValue::string("1").op_add(&LuaValue::Number(1.0)).unwrap_err();
        assert_eq!(
            err,
            LuaError::TypeError("attempt to perform arithmetic on a string value".to_string())
        );
        assert!(LuaValue::Nil.op_unm().is_err());
    }

    #[test]
    fn test_mod_sign_follows_divisor() {
        let m = |a: f64, b: f64| {
            LuaValue::Number(a)
                .op_mod(&LuaValue::Number(b))
                .unwrap()
                .as_number()
                .unwrap()
        };
        assert_eq!(m(5.0, 3.0), 2.0);
        assert_eq!(m(-5.0, 3.0), 1.0);
        assert_eq!(m(5.0, -3.0), -1.0);
        assert!(m(1.0, 0.0).is_nan());
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        let v = LuaValue::Number(1.0).op_div(&LuaValue::Number(0.0)).unwrap();
        assert_eq!(v.as_number(), Some(f64::INFINITY));
    }

    #[test]
    fn test_equality() {
        assert_eq!(LuaValue::string("a"), LuaValue::string("a"));
        assert_ne!(LuaValue::Number(1.0), LuaValue::string("1"));
        assert_ne!(LuaValue::Number(f64::NAN), LuaValue::Number(f64::NAN));

        let t = LuaValue::table(LuaTable::new());
        assert_eq!(t, t.clone());
        assert_ne!(t, LuaValue::table(LuaTable::new()));
    }

    #[test]
    fn test_ordering_errors() {
        let err = LuaValue::Number(1.0).op_lt(&LuaValue::string("2")).unwrap_err();
        assert_eq!(
            err,
            LuaError::TypeError("attempt to compare number with string".to_string())
        );
        let err = LuaValue::Nil.op_le(&LuaValue::Nil).unwrap_err();
        assert_eq!(
            err,
            LuaError::TypeError("attempt to compare two nil values".to_string())
        );
    }

    #[test]
    fn test_string_ordering() {
        assert!(LuaValue::string("abc").op_lt(&LuaValue::string("abd")).unwrap());
        assert!(LuaValue::string("ab").op_le(&LuaValue::string("ab")).unwrap());
    }

    #[test]
    fn test_len() {
        assert_eq!(
            LuaValue::string("hello").op_len().unwrap().as_number(),
            Some(5.0)
        );
        assert!(LuaValue::Boolean(true).op_len().is_err());
    }
}
