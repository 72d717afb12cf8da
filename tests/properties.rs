use atto_lisp::environment::Environment;
use atto_lisp::{parse_all, parse_one, tokenize, ErrorKind, Evaluator, TokenKind, Value};
use pretty_assertions::assert_eq;

#[test]
fn comparison_chains_are_conjunctive() {
    let evaluator = Evaluator::new();
    assert_eq!(evaluator.eval_str("(< 1 2 3 4)").unwrap(), Value::Bool(true));
    assert_eq!(evaluator.eval_str("(< 1 2 2)").unwrap(), Value::Bool(false));
    assert_eq!(evaluator.eval_str("(<= 1 2 2)").unwrap(), Value::Bool(true));
}

#[test]
fn short_circuiting_is_observable() {
    let evaluator = Evaluator::new();
    evaluator.eval_str("(define x nil)").unwrap();
    assert_eq!(evaluator.eval_str("(and nil (set! x t))").unwrap(), Value::Nil);
    assert_eq!(evaluator.eval_str("x").unwrap(), Value::Nil);
    assert_eq!(evaluator.eval_str("(or t (/ 1 0))").unwrap(), Value::Bool(true));
}

#[test]
fn let_bindings_are_not_visible_to_each_other() {
    let evaluator = Evaluator::new();
    let err = evaluator
        .eval_str("(let ((x 1) (y (+ x 1))) y)")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedSymbol);
    assert_eq!(
        evaluator.eval_str("(let* ((x 1) (y (+ x 1))) y)").unwrap(),
        Value::integer(2)
    );
}

#[test]
fn letrec_even_and_odd() {
    let evaluator = Evaluator::new();
    let source = "
        (letrec ((even (lambda (n) (if (= n 0) t (odd (- n 1)))))
                 (odd (lambda (n) (if (= n 0) nil (even (- n 1))))))
          (and (even 4) (odd 3)))";
    assert_eq!(evaluator.eval_str(source).unwrap(), Value::Bool(true));
}

#[test]
fn a_failing_argument_prevents_the_call() {
    let evaluator = Evaluator::new();
    evaluator.eval_str("(define calls 0)").unwrap();
    evaluator
        .eval_str("(define (count x) (set! calls (+ calls 1)) x)")
        .unwrap();
    let err = evaluator.eval_str("(count (car 1))").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(evaluator.eval_str("calls").unwrap(), Value::integer(0));
}

#[test]
fn eval_in_a_child_environment() {
    let evaluator = Evaluator::new();
    let child = Environment::spawn_from(evaluator.global_env());
    child.define("local", Value::integer(5));
    let form = parse_one(&tokenize("(+ local 1)")).unwrap();
    assert_eq!(evaluator.eval_in(&form, &child).unwrap(), Value::integer(6));
    assert_eq!(
        evaluator.eval(&form).unwrap_err().kind(),
        ErrorKind::UndefinedSymbol
    );
}

#[test]
fn front_end_entry_points() {
    let tokens = tokenize("(print 'a) ; done");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::LeftParen,
            TokenKind::Symbol("print"),
            TokenKind::Quote,
            TokenKind::Symbol("a"),
            TokenKind::RightParen,
            TokenKind::EndOfInput,
        ]
    );
    let forms = parse_all(&tokenize("(define a 1)\n(define b 2)\n  ; trailing")).unwrap();
    assert_eq!(forms.len(), 2);
    assert_eq!(parse_one(&tokenize("")).unwrap(), Value::Nil);
}
