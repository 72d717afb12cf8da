use crate::evaluator::{Error, Evaluator, Result};
use crate::reader;
use crate::types::Value;
use std::fs;
use std::path::Path;

/// Read, evaluate and print the first form of one line of input.
pub fn rep(line: &str, evaluator: &Evaluator) -> std::result::Result<String, Error> {
    let form = reader::read_str(line)?;
    log::debug!("read {}", form);
    let value = evaluator.eval(&form)?;
    Ok(format!("=> {}", value))
}

/// Evaluates every form of a script in order. The first error abandons the
/// rest of the script, but definitions made before it are kept.
pub fn load_source(source: &str, evaluator: &Evaluator) -> Result {
    let mut last = Value::Nil;
    for form in reader::read_all(source)? {
        log::debug!("read {}", form);
        last = evaluator.eval(&form)?;
    }
    Ok(last)
}

pub fn load_file(path: &Path, evaluator: &Evaluator) -> Result {
    log::info!("loading {}", path.display());
    let source = fs::read_to_string(path).map_err(Error::IOError)?;
    load_source(&source, evaluator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ErrorKind;

    #[test]
    fn rep_prints_the_value() {
        let evaluator = Evaluator::new();
        assert_eq!(rep("(+ 1 2)", &evaluator).unwrap(), "=> 3");
        assert_eq!(rep("\"hi\"", &evaluator).unwrap(), "=> \"hi\"");
        assert_eq!(rep("", &evaluator).unwrap(), "=> nil");
    }

    #[test]
    fn rep_reports_errors() {
        let evaluator = Evaluator::new();
        let err = rep("(undefined-thing)", &evaluator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedSymbol);
        let err = rep("(+ 1", &evaluator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn load_source_returns_the_last_value() {
        let evaluator = Evaluator::new();
        let value = load_source("(define x 4)\n; comment\n(* x x)\n", &evaluator).unwrap();
        assert_eq!(value, Value::integer(16));
        assert_eq!(load_source("", &evaluator).unwrap(), Value::Nil);
    }

    #[test]
    fn a_failing_script_keeps_earlier_definitions() {
        let evaluator = Evaluator::new();
        let err = load_source("(define a 1) (car 5) (define b 2)", &evaluator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(evaluator.eval_str("a").unwrap(), Value::integer(1));
        assert!(evaluator.eval_str("b").is_err());
    }

    #[test]
    fn missing_files_are_io_errors() {
        let evaluator = Evaluator::new();
        let err = load_file(Path::new("/no/such/script.al"), &evaluator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
