use crate::environment::Environment;
use crate::printer::{self, PrintMode};
use crate::types::{numeric_order, truthy, Arity, PrimitiveFn, TypeMismatch, Value};
use crate::{evaluator, reader};
use chrono::Datelike;
use itertools::Itertools;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::convert::TryFrom;

fn any_decimal(args: &[Value]) -> bool {
    args.iter().any(Value::is_decimal)
}

fn grab_decimals(args: &[Value]) -> evaluator::Result<Vec<Decimal>> {
    args.iter().map(Value::to_decimal).collect()
}

fn grab_integers(args: &[Value]) -> evaluator::Result<Vec<BigInt>> {
    args.iter().map(Value::to_integer).collect()
}

fn overflow(name: &'static str) -> evaluator::Error {
    evaluator::Error::Overflow(name)
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: sum_,
    arity: Arity::at_least(0),
};

fn sum_(args: &[Value]) -> evaluator::Result {
    if any_decimal(args) {
        let mut total = Decimal::ZERO;
        for x in grab_decimals(args)? {
            total = total.checked_add(x).ok_or_else(|| overflow("+"))?;
        }
        Ok(Value::Decimal(total))
    } else {
        let total = grab_integers(args)?
            .into_iter()
            .fold(BigInt::zero(), |acc, x| acc + x);
        Ok(Value::Integer(total))
    }
}

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: sub_,
    arity: Arity::at_least(1),
};

fn sub_(args: &[Value]) -> evaluator::Result {
    if any_decimal(args) {
        let values = grab_decimals(args)?;
        let (first, rest) = match values.split_first() {
            Some(parts) => parts,
            None => unreachable!("arity checked by PrimitiveFn"),
        };
        if rest.is_empty() {
            return Ok(Value::Decimal(-*first));
        }
        let mut result = *first;
        for x in rest {
            result = result.checked_sub(*x).ok_or_else(|| overflow("-"))?;
        }
        Ok(Value::Decimal(result))
    } else {
        let mut values = grab_integers(args)?.into_iter();
        let first = values.next().unwrap_or_else(BigInt::zero);
        if args.len() == 1 {
            return Ok(Value::Integer(-first));
        }
        Ok(Value::Integer(values.fold(first, |acc, x| acc - x)))
    }
}

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: mul_,
    arity: Arity::at_least(0),
};

fn mul_(args: &[Value]) -> evaluator::Result {
    if any_decimal(args) {
        let mut product = Decimal::ONE;
        for x in grab_decimals(args)? {
            product = product.checked_mul(x).ok_or_else(|| overflow("*"))?;
        }
        Ok(Value::Decimal(product))
    } else {
        let product = grab_integers(args)?
            .into_iter()
            .fold(BigInt::one(), |acc, x| acc * x);
        Ok(Value::Integer(product))
    }
}

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: div_,
    arity: Arity::at_least(1),
};

// Division is always decimal, even between integers that divide exactly.
fn div_(args: &[Value]) -> evaluator::Result {
    let values = grab_decimals(args)?;
    let (first, rest) = match values.split_first() {
        Some((first, [])) => (&Decimal::ONE, std::slice::from_ref(first)),
        Some(parts) => parts,
        None => unreachable!("arity checked by PrimitiveFn"),
    };
    let mut result = *first;
    for divisor in rest {
        if divisor.is_zero() {
            return Err(evaluator::Error::DivideByZero);
        }
        result = result.checked_div(*divisor).ok_or_else(|| overflow("/"))?;
    }
    Ok(Value::Decimal(result))
}

/// Equality never fails: values of unrelated kinds are simply unequal.
pub(crate) fn equal(a: &Value, b: &Value) -> bool {
    match numeric_order(a, b) {
        Some(order) => order == Ordering::Equal,
        None => a == b,
    }
}

/// Nil sorts below everything else, so list predicates such as a recursive
/// min over a possibly-empty list can compare against it.
pub(crate) fn less_than(a: &Value, b: &Value) -> evaluator::Result<bool> {
    use Value::*;
    match (a, b) {
        (Nil, Nil) => Ok(false),
        (Nil, _) => Ok(true),
        (_, Nil) => Ok(false),
        (String(x), String(y)) => Ok(x < y),
        (Date(x), Date(y)) => Ok(x < y),
        _ => numeric_order(a, b)
            .map(|order| order == Ordering::Less)
            .ok_or_else(|| TypeMismatch::Incomparable(a.type_name(), b.type_name()).into()),
    }
}

fn eq(a: &Value, b: &Value) -> evaluator::Result<bool> {
    Ok(equal(a, b))
}

fn lt(a: &Value, b: &Value) -> evaluator::Result<bool> {
    less_than(a, b)
}

fn gt(a: &Value, b: &Value) -> evaluator::Result<bool> {
    less_than(b, a)
}

fn le(a: &Value, b: &Value) -> evaluator::Result<bool> {
    Ok(!less_than(b, a)? || equal(a, b))
}

fn ge(a: &Value, b: &Value) -> evaluator::Result<bool> {
    Ok(!less_than(a, b)? || equal(a, b))
}

// Every adjacent pair must satisfy the relation.
fn comparison_(
    args: &[Value],
    holds: fn(&Value, &Value) -> evaluator::Result<bool>,
) -> evaluator::Result {
    for pair in args.windows(2) {
        if !holds(&pair[0], &pair[1])? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |args: &[Value]| comparison_(args, [<$NAME:lower>]),
                arity: Arity::at_least(2),
            };
        }
    };
}

comparison_primitive!(=, EQ);
comparison_primitive!(<, LT);
comparison_primitive!(>, GT);
comparison_primitive!(<=, LE);
comparison_primitive!(>=, GE);

const CONCAT: PrimitiveFn = PrimitiveFn {
    name: "concat",
    fn_ptr: |args| {
        Ok(Value::String(
            args.iter()
                .map(|arg| printer::pr_str(arg, PrintMode::Directly))
                .join(""),
        ))
    },
    arity: Arity::at_least(0),
};

const STR_LENGTH: PrimitiveFn = PrimitiveFn {
    name: "str-length",
    fn_ptr: str_length_,
    arity: Arity::exactly(1),
};

fn str_length_(args: &[Value]) -> evaluator::Result {
    let s = args[0].as_string()?;
    Ok(Value::integer(s.chars().count()))
}

const SUBSTR: PrimitiveFn = PrimitiveFn {
    name: "substr",
    fn_ptr: substr_,
    arity: Arity::exactly(3),
};

// (substr s start length). Out of range yields "", an overlong length is clipped.
fn substr_(args: &[Value]) -> evaluator::Result {
    let s = args[0].as_string()?;
    let start = args[1].to_index()?;
    let length = args[2].to_index()?;
    let char_count = s.chars().count() as i64;
    if start < 0 || length < 0 || start > char_count {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(
        s.chars().skip(start as usize).take(length as usize).collect(),
    ))
}

const INDEX_OF: PrimitiveFn = PrimitiveFn {
    name: "index-of",
    fn_ptr: index_of_,
    arity: Arity::exactly(2),
};

fn index_of_(args: &[Value]) -> evaluator::Result {
    let haystack = args[0].as_string()?;
    let needle = args[1].as_string()?;
    let index = match haystack.find(needle) {
        Some(byte_index) => haystack[..byte_index].chars().count() as i64,
        None => -1,
    };
    Ok(Value::integer(index))
}

const TO_LOWER: PrimitiveFn = PrimitiveFn {
    name: "to-lower",
    fn_ptr: |args| Ok(Value::String(args[0].as_string()?.to_lowercase())),
    arity: Arity::exactly(1),
};

const NOW: PrimitiveFn = PrimitiveFn {
    name: "now",
    fn_ptr: |_args| Ok(Value::Date(chrono::Local::now().naive_local())),
    arity: Arity::exactly(0),
};

const DATE_YEAR: PrimitiveFn = PrimitiveFn {
    name: "date-year",
    fn_ptr: |args| Ok(Value::integer(args[0].as_date()?.year())),
    arity: Arity::exactly(1),
};

const DATE_MONTH: PrimitiveFn = PrimitiveFn {
    name: "date-month",
    fn_ptr: |args| Ok(Value::integer(args[0].as_date()?.month())),
    arity: Arity::exactly(1),
};

const DATE_DAY: PrimitiveFn = PrimitiveFn {
    name: "date-day",
    fn_ptr: |args| Ok(Value::integer(args[0].as_date()?.day())),
    arity: Arity::exactly(1),
};

const LIST: PrimitiveFn = PrimitiveFn {
    name: "list",
    fn_ptr: list_,
    arity: Arity::at_least(0),
};

fn list_(args: &[Value]) -> evaluator::Result {
    Ok(Value::wrap_list(args.to_vec()))
}

const CAR: PrimitiveFn = PrimitiveFn {
    name: "car",
    fn_ptr: car_,
    arity: Arity::exactly(1),
};

fn car_(args: &[Value]) -> evaluator::Result {
    let list = args[0].as_list()?;
    Ok(list.first().cloned().unwrap_or(Value::Nil))
}

const CDR: PrimitiveFn = PrimitiveFn {
    name: "cdr",
    fn_ptr: cdr_,
    arity: Arity::exactly(1),
};

fn cdr_(args: &[Value]) -> evaluator::Result {
    let list = args[0].as_list()?;
    if list.is_empty() {
        return Ok(Value::Nil);
    }
    Ok(Value::wrap_list(list[1..].to_vec()))
}

const CONS: PrimitiveFn = PrimitiveFn {
    name: "cons",
    fn_ptr: cons_,
    arity: Arity::exactly(2),
};

// Onto a list, cons prepends. Onto anything else it pairs the two values up in
// a two-element list.
fn cons_(args: &[Value]) -> evaluator::Result {
    let head = &args[0];
    let mut elements = vec![head.clone()];
    match &args[1] {
        Value::List(tail) => elements.extend(tail.iter().cloned()),
        other => elements.push(other.clone()),
    }
    Ok(Value::wrap_list(elements))
}

const NTH: PrimitiveFn = PrimitiveFn {
    name: "nth",
    fn_ptr: nth_,
    arity: Arity::exactly(2),
};

fn nth_(args: &[Value]) -> evaluator::Result {
    let list = args[0].as_list()?;
    let index = args[1].to_index()?;
    let value = usize::try_from(index)
        .ok()
        .and_then(|index| list.get(index))
        .cloned();
    Ok(value.unwrap_or(Value::Nil))
}

const EMPTY_TEST: PrimitiveFn = PrimitiveFn {
    name: "empty?",
    fn_ptr: empty_test_,
    arity: Arity::exactly(1),
};

fn empty_test_(args: &[Value]) -> evaluator::Result {
    let empty = match &args[0] {
        Value::Nil => true,
        Value::List(list) => list.is_empty(),
        _ => false,
    };
    Ok(Value::Bool(empty))
}

const LIST_TEST: PrimitiveFn = PrimitiveFn {
    name: "list?",
    fn_ptr: |args| Ok(Value::Bool(args[0].is_list())),
    arity: Arity::exactly(1),
};

const NUMBER_TEST: PrimitiveFn = PrimitiveFn {
    name: "number?",
    fn_ptr: |args| Ok(Value::Bool(args[0].is_number())),
    arity: Arity::exactly(1),
};

const PRINT: PrimitiveFn = PrimitiveFn {
    name: "print",
    fn_ptr: print_,
    arity: Arity::at_least(0),
};

fn print_(args: &[Value]) -> evaluator::Result {
    println!("{}", args.iter().join(""));
    Ok(Value::Nil)
}

const NOT: PrimitiveFn = PrimitiveFn {
    name: "not",
    fn_ptr: |args| Ok(Value::Bool(!truthy(&args[0]))),
    arity: Arity::exactly(1),
};

const XOR: PrimitiveFn = PrimitiveFn {
    name: "xor",
    fn_ptr: |args| Ok(Value::Bool(truthy(&args[0]) ^ truthy(&args[1]))),
    arity: Arity::exactly(2),
};

const NUMBER: PrimitiveFn = PrimitiveFn {
    name: "number",
    fn_ptr: number_,
    arity: Arity::exactly(1),
};

fn number_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => reader::parse_number(s.trim())
            .ok_or_else(|| TypeMismatch::UnparsableNumber(s.clone()).into()),
        Value::Integer(_) | Value::Decimal(_) => Ok(args[0].clone()),
        other => Err(TypeMismatch::NotAString(other.type_name()).into()),
    }
}

const SYMBOL: PrimitiveFn = PrimitiveFn {
    name: "symbol",
    fn_ptr: symbol_,
    arity: Arity::exactly(1),
};

fn symbol_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::String(s) => Ok(Value::new_symbol(s)),
        Value::Symbol(_) => Ok(args[0].clone()),
        other => Err(TypeMismatch::NotAString(other.type_name()).into()),
    }
}

// Transcendental functions go through f64 and come back as decimals.
fn float_arg(arg: &Value, name: &'static str) -> evaluator::Result<f64> {
    arg.to_decimal()?.to_f64().ok_or_else(|| overflow(name))
}

fn from_float(x: f64, name: &'static str) -> evaluator::Result {
    Decimal::from_f64(x)
        .map(Value::Decimal)
        .ok_or_else(|| overflow(name))
}

macro_rules! float_primitive {
    ($NAME:ident, $FUNC:ident) => {
        paste::item! {
            const [<$NAME:upper>]: PrimitiveFn = PrimitiveFn {
                name: stringify!($NAME),
                fn_ptr: |args: &[Value]| {
                    from_float(float_arg(&args[0], stringify!($NAME))?.$FUNC(), stringify!($NAME))
                },
                arity: Arity::exactly(1),
            };
        }
    };
}

float_primitive!(sin, sin);
float_primitive!(cos, cos);
float_primitive!(tan, tan);
float_primitive!(exp, exp);

const SQRT: PrimitiveFn = PrimitiveFn {
    name: "sqrt",
    fn_ptr: sqrt_,
    arity: Arity::exactly(1),
};

fn sqrt_(args: &[Value]) -> evaluator::Result {
    if args[0].to_decimal()? < Decimal::ZERO {
        return Err(evaluator::Error::Domain("sqrt of a negative number"));
    }
    from_float(float_arg(&args[0], "sqrt")?.sqrt(), "sqrt")
}

const LOG: PrimitiveFn = PrimitiveFn {
    name: "log",
    fn_ptr: log_,
    arity: Arity::Between(1..=2),
};

// (log x) is the natural logarithm, (log x base) any other.
fn log_(args: &[Value]) -> evaluator::Result {
    let x = args[0].to_decimal()?;
    if x <= Decimal::ZERO {
        return Err(evaluator::Error::Domain("log of a non-positive number"));
    }
    let x = float_arg(&args[0], "log")?;
    match args.get(1) {
        None => from_float(x.ln(), "log"),
        Some(base) => {
            let b = base.to_decimal()?;
            if b <= Decimal::ZERO || b == Decimal::ONE {
                return Err(evaluator::Error::Domain("log base must be positive and not 1"));
            }
            from_float(x.log(float_arg(base, "log")?), "log")
        }
    }
}

fn extremum(args: &[Value], keep: Ordering) -> evaluator::Result {
    if any_decimal(args) {
        let values = grab_decimals(args)?;
        let best = values
            .into_iter()
            .fold1(|best, x| if x.cmp(&best) == keep { x } else { best });
        Ok(Value::Decimal(best.unwrap_or(Decimal::ZERO)))
    } else {
        let values = grab_integers(args)?;
        let best = values
            .into_iter()
            .fold1(|best, x| if x.cmp(&best) == keep { x } else { best });
        Ok(Value::Integer(best.unwrap_or_else(BigInt::zero)))
    }
}

const MIN: PrimitiveFn = PrimitiveFn {
    name: "min",
    fn_ptr: |args| extremum(args, Ordering::Less),
    arity: Arity::at_least(1),
};

const MAX: PrimitiveFn = PrimitiveFn {
    name: "max",
    fn_ptr: |args| extremum(args, Ordering::Greater),
    arity: Arity::at_least(1),
};

static CORE: &[PrimitiveFn] = &[
    // Arithmetic
    SUM,
    SUB,
    MUL,
    DIV,
    // Comparisons
    EQ,
    LT,
    GT,
    LE,
    GE,
    // Working with strings
    CONCAT,
    STR_LENGTH,
    SUBSTR,
    INDEX_OF,
    TO_LOWER,
    // Working with dates
    NOW,
    DATE_YEAR,
    DATE_MONTH,
    DATE_DAY,
    // Working with lists
    LIST,
    CAR,
    CDR,
    CONS,
    NTH,
    // Casting and testing
    EMPTY_TEST,
    LIST_TEST,
    NUMBER_TEST,
    NUMBER,
    SYMBOL,
    // Logic
    NOT,
    XOR,
    // Maths
    SIN,
    COS,
    TAN,
    EXP,
    SQRT,
    LOG,
    MIN,
    MAX,
    // Other
    PRINT,
];

/// Binds every builtin into `env`, normally a fresh global environment.
pub fn install(env: &Environment) {
    for func in CORE {
        env.define(func.name, Value::Primitive(func));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::integer(n)
    }

    #[test]
    fn every_builtin_has_a_unique_name() {
        let names: Vec<_> = CORE.iter().map(|f| f.name).collect();
        assert_eq!(names.iter().unique().count(), names.len());
    }

    #[test]
    fn nil_sorts_first() {
        assert!(less_than(&Value::Nil, &int(-100)).unwrap());
        assert!(!less_than(&int(-100), &Value::Nil).unwrap());
        assert!(!less_than(&Value::Nil, &Value::Nil).unwrap());
    }

    #[test]
    fn equality_crosses_the_numeric_tower() {
        assert!(equal(&int(5), &Value::Decimal(Decimal::from(5))));
        assert!(!equal(&int(5), &Value::String("5".into())));
    }

    #[test]
    fn incompatible_kinds_cannot_be_ordered() {
        let err = less_than(&Value::String("a".into()), &int(1)).unwrap_err();
        assert_eq!(err.kind(), evaluator::ErrorKind::Type);
    }

    #[test]
    fn min_and_max_pick_extremes() {
        assert_eq!(extremum(&[int(3), int(1), int(2)], Ordering::Less).unwrap(), int(1));
        assert_eq!(
            extremum(&[int(3), Value::Decimal(Decimal::new(35, 1))], Ordering::Greater).unwrap(),
            Value::Decimal(Decimal::new(35, 1))
        );
    }
}
