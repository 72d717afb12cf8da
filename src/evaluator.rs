use crate::environment::{Environment, UndefinedVariable};
use crate::special_forms::{self, FormError};
use crate::types::{callable, BadArgCount, Closure, List, PrimitiveFn, Symbol, TypeMismatch, Value};
use crate::{core, reader};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Read(reader::ReadError),
    UnknownSymbol(Symbol),
    UndefinedVariable(UndefinedVariable),
    TypeMismatch(TypeMismatch),
    BadArgCount(BadArgCount),
    BadForm(&'static str, FormError),
    DivideByZero,
    Domain(&'static str),
    Overflow(&'static str),
    IOError(std::io::Error),
}

/// The broad family an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    UndefinedSymbol,
    UndefinedVariable,
    Type,
    Arity,
    DivisionByZero,
    Domain,
    Overflow,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Read(_) => ErrorKind::Syntax,
            Error::UnknownSymbol(_) => ErrorKind::UndefinedSymbol,
            Error::UndefinedVariable(_) => ErrorKind::UndefinedVariable,
            Error::TypeMismatch(_) | Error::BadForm(..) => ErrorKind::Type,
            Error::BadArgCount(_) => ErrorKind::Arity,
            Error::DivideByZero => ErrorKind::DivisionByZero,
            Error::Domain(_) => ErrorKind::Domain,
            Error::Overflow(_) => ErrorKind::Overflow,
            Error::IOError(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read(e) => write!(f, "syntax error: {}", e),
            Error::UnknownSymbol(s) => write!(f, "undefined symbol: {}", s),
            Error::UndefinedVariable(UndefinedVariable(s)) => {
                write!(f, "undefined variable: {}", s)
            }
            Error::TypeMismatch(e) => write!(f, "type mismatch: {}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::BadForm(form, e) => write!(f, "{}: {}", form, e),
            Error::DivideByZero => write!(f, "division by zero"),
            Error::Domain(e) => write!(f, "domain error: {}", e),
            Error::Overflow(e) => write!(f, "overflow: {}", e),
            Error::IOError(e) => write!(f, "io error: {}", e),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

impl From<BadArgCount> for Error {
    fn from(e: BadArgCount) -> Self {
        Self::BadArgCount(e)
    }
}

impl From<reader::ReadError> for Error {
    fn from(e: reader::ReadError) -> Self {
        Self::Read(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

/// An interpreter instance: a global environment holding the builtins.
/// Instances are independent of one another.
pub struct Evaluator {
    global: Rc<Environment>,
}

impl Evaluator {
    pub fn new() -> Self {
        let global = Environment::root();
        core::install(&global);
        Self { global }
    }

    pub fn global_env(&self) -> &Rc<Environment> {
        &self.global
    }

    /// Evaluates one form in the global environment.
    pub fn eval(&self, ast: &Value) -> Result {
        eval(ast, &self.global)
    }

    pub fn eval_in(&self, ast: &Value, env: &Rc<Environment>) -> Result {
        eval(ast, env)
    }

    /// Reads every form in `source` and evaluates them in order, returning the
    /// value of the last one (nil if there were none). Stops at the first error.
    pub fn eval_str(&self, source: &str) -> Result {
        let mut last = Value::Nil;
        for form in reader::read_all(source)? {
            last = self.eval(&form)?;
        }
        Ok(last)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn eval(ast: &Value, env: &Rc<Environment>) -> Result {
    log::trace!("eval {}", ast);
    let result = match ast {
        Value::Symbol(s) => env
            .lookup(s)
            .ok_or_else(|| Error::UnknownSymbol(s.clone())),
        Value::List(list) if list.is_empty() => Ok(ast.clone()),
        Value::List(list) => eval_list(list, env),
        _ => Ok(ast.clone()),
    };
    match &result {
        Ok(value) => log::trace!("{} => {}", ast, value),
        Err(e) => log::trace!("{} failed: {}", ast, e),
    }
    result
}

fn eval_list(list: &List, env: &Rc<Environment>) -> Result {
    let (head, operands) = match list.split_first() {
        Some(parts) => parts,
        None => return Ok(Value::new_list()),
    };
    if let Value::Symbol(name) = head {
        match name.as_str() {
            "quote" => return special_forms::apply_quote(operands),
            "if" => return special_forms::apply_if(operands, env),
            "and" => return special_forms::apply_and(operands, env),
            "or" => return special_forms::apply_or(operands, env),
            "define" => {
                let result = special_forms::apply_define(operands, env);
                if let Ok(value) = &result {
                    log::debug!("define {} as {}", operands[0], value);
                }
                return result;
            }
            "set!" => return special_forms::apply_set(operands, env),
            "lambda" => return special_forms::apply_lambda(operands, env),
            "cond" => return special_forms::apply_cond(operands, env),
            "let" => return special_forms::apply_let(operands, env),
            "let*" => return special_forms::apply_let_star(operands, env),
            "letrec" => return special_forms::apply_letrec(operands, env),
            // Any other initial symbol will be interpreted as a function call and
            // handled below
            _ => (),
        };
    }
    let function = eval(head, env)?;
    if !callable(&function) {
        return Err(TypeMismatch::NotCallable(function.type_name()).into());
    }
    let args = evaluate_sequence_elementwise(operands, env)?;
    apply(&function, &args)
}

pub fn evaluate_sequence_elementwise(seq: &[Value], env: &Rc<Environment>) -> Result<Vec<Value>> {
    seq.iter().map(|obj| eval(obj, env)).collect()
}

/// Evaluates each expression in turn, returning the last value (nil if empty).
pub(crate) fn evaluate_body(body: &[Value], env: &Rc<Environment>) -> Result {
    let mut result = Value::Nil;
    for expr in body {
        result = eval(expr, env)?;
    }
    Ok(result)
}

pub fn apply(callable: &Value, args: &[Value]) -> Result {
    match callable {
        Value::Primitive(f) => call_primitive(f, args),
        Value::Closure(f) => call_closure(f, args),
        _ => Err(TypeMismatch::NotCallable(callable.type_name()).into()),
    }
}

pub(crate) fn pretty_print_args(args: &[Value]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_primitive(func: &PrimitiveFn, args: &[Value]) -> Result {
    func.arity.validate_for(args.len(), func.name)?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = (func.fn_ptr)(args);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}

fn call_closure(func: &Closure, args: &[Value]) -> Result {
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let env = make_closure_env(func, args)?;
    evaluate_body(&func.body, &env)
}

fn make_closure_env(func: &Closure, args: &[Value]) -> Result<Rc<Environment>> {
    func.arity().validate_for(args.len(), &func.name)?;
    let env = Environment::spawn_from(&func.parent);
    for (key, value) in func.parameters.iter().zip(args) {
        env.define(key.clone(), value.clone());
    }
    Ok(env)
}
