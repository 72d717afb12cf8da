extern crate derive_more;
use crate::environment::Environment;
use crate::evaluator;
use chrono::NaiveDateTime;
use derive_more::Deref;
use itertools::Itertools;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{self, Formatter};
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;
use std::str::FromStr;

#[derive(Deref, Debug, PartialEq)]
pub struct List(pub Vec<Value>);

#[derive(Deref, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Symbol(pub String);

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets environments look names up by &str. Symbol hashes exactly like its String.
impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol(name.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: String,
    expected: Arity,
    got: usize,
}

impl BadArgCount {
    #[cfg(test)]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn got(&self) -> usize {
        self.got
    }
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name: name.to_string(),
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&[Value]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "primitive function #<{}>", self.name)
    }
}

pub struct Closure {
    pub name: Symbol,
    pub parameters: Vec<Symbol>,
    pub body: Vec<Value>,
    pub parent: Rc<Environment>,
}

impl Closure {
    pub fn arity(&self) -> Arity {
        Arity::exactly(self.parameters.len())
    }
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{name: {}, parameters: ({}), body: {:?}}}",
            self.name,
            self.parameters.iter().join(" "),
            self.body
        )
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(BigInt),
    Decimal(Decimal),
    String(String),
    Symbol(Symbol),
    Date(NaiveDateTime),
    List(Rc<List>),
    Primitive(&'static PrimitiveFn),
    Closure(Rc<Closure>),
}

pub(crate) fn truthy(obj: &Value) -> bool {
    use Value::*;
    match obj {
        Integer(_) | Decimal(_) | String(_) | Symbol(_) | Date(_) | List(_) | Primitive(_)
        | Closure(_) => true,
        Bool(t) => *t,
        Nil => false,
    }
}

pub(crate) fn callable(obj: &Value) -> bool {
    use Value::*;
    match obj {
        Primitive(_) | Closure(_) => true,
        Nil => false,
        Bool(_) => false,
        Integer(_) => false,
        Decimal(_) => false,
        String(_) => false,
        Symbol(_) => false,
        Date(_) => false,
        List(_) => false,
    }
}

#[derive(Debug)]
pub enum TypeMismatch {
    NotANumber(&'static str),
    NotAString(&'static str),
    NotAList(&'static str),
    NotADate(&'static str),
    NotASymbol(&'static str),
    NotCallable(&'static str),
    Incomparable(&'static str, &'static str),
    UnparsableNumber(String),
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use TypeMismatch::*;
        match self {
            NotANumber(got) => write!(f, "expected a number, got {}", got),
            NotAString(got) => write!(f, "expected a string, got {}", got),
            NotAList(got) => write!(f, "expected a list, got {}", got),
            NotADate(got) => write!(f, "expected a date, got {}", got),
            NotASymbol(got) => write!(f, "expected a symbol, got {}", got),
            NotCallable(got) => write!(f, "cannot call {} as a function", got),
            Incomparable(a, b) => write!(f, "cannot compare {} and {}", a, b),
            UnparsableNumber(text) => write!(f, "cannot convert '{}' to number", text),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Primitive(_) | Value::Closure(_) => "function",
        }
    }

    pub(crate) fn as_string(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(TypeMismatch::NotAString(self.type_name())),
        }
    }

    pub(crate) fn as_list(&self) -> Result<&List, TypeMismatch> {
        match self {
            Value::List(x) => Ok(x),
            _ => Err(TypeMismatch::NotAList(self.type_name())),
        }
    }

    pub(crate) fn as_symbol(&self) -> Result<&Symbol, TypeMismatch> {
        match self {
            Value::Symbol(s) => Ok(s),
            _ => Err(TypeMismatch::NotASymbol(self.type_name())),
        }
    }

    pub(crate) fn as_date(&self) -> Result<&NaiveDateTime, TypeMismatch> {
        match self {
            Value::Date(d) => Ok(d),
            _ => Err(TypeMismatch::NotADate(self.type_name())),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::Decimal(_))
    }
}

impl Value {
    pub fn new_list() -> Self {
        Self::List(Rc::new(List(Vec::new())))
    }
    pub fn wrap_list(elements: Vec<Value>) -> Self {
        Self::List(Rc::new(List(elements)))
    }
    pub fn new_symbol(name: &str) -> Self {
        Self::Symbol(Symbol::from(name))
    }
    pub fn integer<T: Into<BigInt>>(n: T) -> Self {
        Self::Integer(n.into())
    }
}

// The numeric tower. Nil counts as zero wherever a number is expected.
impl Value {
    pub(crate) fn to_decimal(&self) -> evaluator::Result<Decimal> {
        match self {
            Value::Nil => Ok(Decimal::ZERO),
            Value::Decimal(d) => Ok(*d),
            Value::Integer(i) => {
                integer_to_decimal(i).ok_or(evaluator::Error::Overflow("integer too large for a decimal"))
            }
            _ => Err(TypeMismatch::NotANumber(self.type_name()).into()),
        }
    }

    pub(crate) fn to_integer(&self) -> evaluator::Result<BigInt> {
        match self {
            Value::Nil => Ok(BigInt::zero()),
            Value::Integer(i) => Ok(i.clone()),
            Value::Decimal(d) => decimal_to_integer(d),
            _ => Err(TypeMismatch::NotANumber(self.type_name()).into()),
        }
    }

    /// Truncates any number to a machine index, for string and list positions.
    pub(crate) fn to_index(&self) -> evaluator::Result<i64> {
        let index = match self {
            Value::Integer(i) => i.to_i64(),
            Value::Decimal(d) => d.trunc().to_i64(),
            _ => return Err(TypeMismatch::NotANumber(self.type_name()).into()),
        };
        index.ok_or(evaluator::Error::Overflow("index out of range"))
    }
}

pub(crate) fn integer_to_decimal(i: &BigInt) -> Option<Decimal> {
    i.to_i128()
        .and_then(|n| Decimal::try_from_i128_with_scale(n, 0).ok())
}

fn decimal_to_integer(d: &Decimal) -> evaluator::Result<BigInt> {
    BigInt::from_str(&d.trunc().normalize().to_string())
        .map_err(|_| evaluator::Error::Overflow("decimal has no integer value"))
}

/// Orders an integer against a decimal without losing precision. Integers
/// beyond the decimal range sit beyond every decimal.
pub(crate) fn compare_mixed(i: &BigInt, d: &Decimal) -> Ordering {
    match integer_to_decimal(i) {
        Some(converted) => converted.cmp(d),
        None if i.is_negative() => Ordering::Less,
        None => Ordering::Greater,
    }
}

pub(crate) fn numeric_order(a: &Value, b: &Value) -> Option<Ordering> {
    use Value::{Decimal, Integer};
    match (a, b) {
        (Integer(x), Integer(y)) => Some(x.cmp(y)),
        (Decimal(x), Decimal(y)) => Some(x.cmp(y)),
        (Integer(x), Decimal(y)) => Some(compare_mixed(x, y)),
        (Decimal(x), Integer(y)) => Some(compare_mixed(y, x).reverse()),
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match [self, other] {
            [Integer(x), Integer(y)] => x == y,
            [Decimal(x), Decimal(y)] => x == y,
            [Bool(x), Bool(y)] => x == y,
            [String(x), String(y)] => x == y,
            [Symbol(x), Symbol(y)] => x == y,
            [Date(x), Date(y)] => x == y,
            [List(x), List(y)] => x == y,
            [Primitive(x), Primitive(y)] => x.name == y.name,
            [Closure(x), Closure(y)] => Rc::ptr_eq(x, y),
            [Nil, Nil] => true,
            [_, _] => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert!(!truthy(&Value::Nil));
        assert!(!truthy(&Value::Bool(false)));
        assert!(truthy(&Value::Bool(true)));
        assert!(truthy(&Value::integer(0)));
        assert!(truthy(&Value::String(String::new())));
        assert!(truthy(&Value::new_list()));
    }

    #[test]
    fn nil_and_false_are_distinct() {
        assert_ne!(Value::Nil, Value::Bool(false));
    }

    #[test]
    fn mixed_comparison_handles_integers_beyond_decimal_range() {
        let huge: BigInt = BigInt::from(10).pow(40);
        assert_eq!(compare_mixed(&huge, &Decimal::MAX), Ordering::Greater);
        assert_eq!(compare_mixed(&-huge, &Decimal::MIN), Ordering::Less);
        assert_eq!(
            compare_mixed(&BigInt::from(2), &Decimal::new(25, 1)),
            Ordering::Less
        );
    }

    #[test]
    fn decimals_truncate_towards_zero() {
        let value = Value::Decimal(Decimal::new(-275, 2));
        assert_eq!(value.to_integer().unwrap(), BigInt::from(-2));
        assert_eq!(value.to_index().unwrap(), -2);
    }

    #[test]
    fn arity_reports_its_range() {
        assert!(Arity::exactly(2).contains(2));
        assert!(!Arity::exactly(2).contains(3));
        assert!(Arity::at_least(1).contains(10));
        let err = Arity::Between(1..=2).validate_for(3, "log").unwrap_err();
        assert_eq!(err.name(), "log");
        assert_eq!(err.got(), 3);
    }
}
