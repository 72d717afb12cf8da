use crate::types::{truthy, Arity, Closure, Symbol, Value};

use crate::environment::Environment;
use crate::evaluator::{eval, evaluate_body, Error, Result};
use std::fmt;
use std::rc::Rc;

/// A special form whose operands have the wrong shape.
#[derive(Debug)]
pub enum FormError {
    TargetNotASymbol,
    ParametersNotGivenAsList,
    ParameterNotASymbol,
    BindingsNotAList,
    BindingNotAPair,
    BindToNonSymbol,
    ClauseNotAList,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FormError::TargetNotASymbol => "expected a symbol to bind",
            FormError::ParametersNotGivenAsList => "expected a parameter list",
            FormError::ParameterNotASymbol => "parameters must be symbols",
            FormError::BindingsNotAList => "expected a list of bindings",
            FormError::BindingNotAPair => "bindings must be lists of the form (name value)",
            FormError::BindToNonSymbol => "binding name must be a symbol",
            FormError::ClauseNotAList => "clauses must be non-empty lists",
        };
        write!(f, "{}", text)
    }
}

pub fn apply_quote(args: &[Value]) -> Result {
    Arity::exactly(1).validate_for(args.len(), "quote")?;
    Ok(args[0].clone())
}

pub fn apply_if(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::Between(2..=3).validate_for(args.len(), "if")?;
    let condition = eval(&args[0], env)?;
    if truthy(&condition) {
        eval(&args[1], env)
    } else if args.len() == 3 {
        eval(&args[2], env)
    } else {
        Ok(Value::Nil)
    }
}

pub fn apply_and(args: &[Value], env: &Rc<Environment>) -> Result {
    let mut result = Value::Bool(true);
    for arg in args {
        result = eval(arg, env)?;
        if !truthy(&result) {
            return Ok(Value::Nil);
        }
    }
    Ok(result)
}

pub fn apply_or(args: &[Value], env: &Rc<Environment>) -> Result {
    for arg in args {
        let result = eval(arg, env)?;
        if truthy(&result) {
            return Ok(result);
        }
    }
    Ok(Value::Nil)
}

// Three shapes:
//   (define name value)
//   (define name (params...) body...)
//   (define (name params...) body...)
pub fn apply_define(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::at_least(2).validate_for(args.len(), "define")?;
    match (&args[0], &args[1]) {
        (Value::List(signature), _) => match signature.split_first() {
            Some((Value::Symbol(name), parameters)) => {
                define_function(name, parameters, &args[1..], env)
            }
            _ => Err(Error::BadForm("define", FormError::TargetNotASymbol)),
        },
        (Value::Symbol(name), Value::List(parameters))
            if args.len() > 2 && parameters.iter().all(|p| p.as_symbol().is_ok()) =>
        {
            define_function(name, parameters, &args[2..], env)
        }
        (Value::Symbol(name), value) => {
            Arity::exactly(2).validate_for(args.len(), "define")?;
            let value = eval(value, env)?;
            env.define(name.clone(), value.clone());
            Ok(value)
        }
        _ => Err(Error::BadForm("define", FormError::TargetNotASymbol)),
    }
}

fn define_function(
    name: &Symbol,
    parameters: &[Value],
    body: &[Value],
    env: &Rc<Environment>,
) -> Result {
    let closure = make_closure(name.clone(), parameters, body, env, "define")?;
    env.define(name.clone(), closure.clone());
    Ok(closure)
}

pub fn apply_set(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::exactly(2).validate_for(args.len(), "set!")?;
    let name = match &args[0] {
        Value::Symbol(s) => Ok(s),
        _ => Err(Error::BadForm("set!", FormError::TargetNotASymbol)),
    }?;
    let value = eval(&args[1], env)?;
    env.set(name, value.clone())
        .map_err(Error::UndefinedVariable)?;
    Ok(value)
}

pub fn apply_lambda(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::at_least(2).validate_for(args.len(), "lambda")?;
    let parameters = match &args[0] {
        Value::List(parameters) => Ok(parameters),
        _ => Err(Error::BadForm("lambda", FormError::ParametersNotGivenAsList)),
    }?;
    make_closure(Symbol::from("lambda"), parameters, &args[1..], env, "lambda")
}

fn make_closure(
    name: Symbol,
    parameters: &[Value],
    body: &[Value],
    env: &Rc<Environment>,
    form: &'static str,
) -> Result {
    let parameters = parameters
        .iter()
        .map(|p| p.as_symbol().map(Symbol::clone))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::BadForm(form, FormError::ParameterNotASymbol))?;
    let closure = Closure {
        name,
        parameters,
        body: body.to_vec(),
        parent: env.clone(),
    };
    Ok(Value::Closure(Rc::new(closure)))
}

pub fn apply_cond(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::at_least(1).validate_for(args.len(), "cond")?;
    for clause in args {
        let clause = match clause {
            Value::List(clause) if !clause.is_empty() => Ok(clause),
            _ => Err(Error::BadForm("cond", FormError::ClauseNotAList)),
        }?;
        let (test, body) = (&clause[0], &clause[1..]);
        let test_value = match test {
            Value::Symbol(s) if s.as_str() == "else" => Value::Bool(true),
            _ => eval(test, env)?,
        };
        if truthy(&test_value) {
            return match body.is_empty() {
                true => Ok(test_value),
                false => evaluate_body(body, env),
            };
        }
    }
    Ok(Value::Nil)
}

fn parse_bindings<'a>(
    form: &'static str,
    bindings: &'a Value,
) -> Result<Vec<(&'a Symbol, &'a Value)>> {
    let bindings = match bindings {
        Value::List(bindings) => Ok(bindings),
        _ => Err(Error::BadForm(form, FormError::BindingsNotAList)),
    }?;
    bindings
        .iter()
        .map(|binding| match binding {
            Value::List(pair) if pair.len() == 2 => match &pair[0] {
                Value::Symbol(name) => Ok((name, &pair[1])),
                _ => Err(Error::BadForm(form, FormError::BindToNonSymbol)),
            },
            _ => Err(Error::BadForm(form, FormError::BindingNotAPair)),
        })
        .collect()
}

/// Every value is computed in the outer environment; the body then sees all of
/// them in one new frame.
pub fn apply_let(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::at_least(2).validate_for(args.len(), "let")?;
    let bindings = parse_bindings("let", &args[0])?;
    let child = Environment::spawn_from(env);
    for (name, value) in bindings {
        let value = eval(value, env)?;
        child.define(name.clone(), value);
    }
    evaluate_body(&args[1..], &child)
}

/// Each value sees the bindings made before it.
pub fn apply_let_star(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::at_least(2).validate_for(args.len(), "let*")?;
    let bindings = parse_bindings("let*", &args[0])?;
    let child = Environment::spawn_from(env);
    for (name, value) in bindings {
        // Note: evaluate in the child so that later bindings can refer to earlier ones
        let value = eval(value, &child)?;
        child.define(name.clone(), value);
    }
    evaluate_body(&args[1..], &child)
}

/// Every name is bound to nil first, so that the values (typically lambdas)
/// can refer to each other.
pub fn apply_letrec(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::at_least(2).validate_for(args.len(), "letrec")?;
    let bindings = parse_bindings("letrec", &args[0])?;
    let child = Environment::spawn_from(env);
    for (name, _) in &bindings {
        child.define((*name).clone(), Value::Nil);
    }
    for (name, value) in bindings {
        let value = eval(value, &child)?;
        child.set(name, value).map_err(Error::UndefinedVariable)?;
    }
    evaluate_body(&args[1..], &child)
}
