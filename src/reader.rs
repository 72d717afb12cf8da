use crate::tokens::{tokenize, Location, Token, TokenKind};
use crate::types::Value;
use chrono::{NaiveDate, NaiveDateTime};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::fmt;
use std::iter::Peekable;
use std::slice;
use std::str::FromStr;

type Reader<'a> = Peekable<slice::Iter<'a, Token<'a>>>;

pub type Result<T = Value> = std::result::Result<T, ReadError>;

/// Syntax errors. Each carries the location of the offending token.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    UnclosedList(Location),
    UnexpectedCloseParen(Location),
    BadNumber(String, Location),
    BadDate(String, Location),
}

impl ReadError {
    pub fn location(&self) -> Location {
        match self {
            ReadError::UnclosedList(at)
            | ReadError::UnexpectedCloseParen(at)
            | ReadError::BadNumber(_, at)
            | ReadError::BadDate(_, at) => *at,
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UnclosedList(at) => write!(f, "expected ')' at end of list ({})", at),
            ReadError::UnexpectedCloseParen(at) => write!(f, "unexpected ')' ({})", at),
            ReadError::BadNumber(text, at) => write!(f, "invalid number: {} ({})", text, at),
            ReadError::BadDate(text, at) => write!(f, "invalid date format: {} ({})", text, at),
        }
    }
}

/// Reads the first form of `input`. Empty input reads as nil.
pub fn read_str(input: &str) -> Result {
    parse_one(&tokenize(input))
}

pub fn read_all(input: &str) -> Result<Vec<Value>> {
    parse_all(&tokenize(input))
}

pub fn parse_one(tokens: &[Token]) -> Result {
    let mut reader = tokens.iter().peekable();
    read_form(&mut reader)
}

pub fn parse_all(tokens: &[Token]) -> Result<Vec<Value>> {
    let mut reader = tokens.iter().peekable();
    let mut forms = Vec::new();
    loop {
        match reader.peek() {
            None
            | Some(Token {
                kind: TokenKind::EndOfInput,
                ..
            }) => break,
            Some(_) => forms.push(read_form(&mut reader)?),
        }
    }
    Ok(forms)
}

fn read_form(reader: &mut Reader) -> Result {
    let token = match reader.next() {
        Some(token) => token,
        None => return Ok(Value::Nil),
    };
    let at = token.location;
    match &token.kind {
        TokenKind::EndOfInput => Ok(Value::Nil),
        TokenKind::LeftParen => read_list(reader, at),
        TokenKind::RightParen => Err(ReadError::UnexpectedCloseParen(at)),
        TokenKind::Quote => {
            let quoted = read_form(reader)?;
            Ok(Value::wrap_list(vec![Value::new_symbol("quote"), quoted]))
        }
        TokenKind::Number(text) => {
            parse_number(text).ok_or_else(|| ReadError::BadNumber(text.to_string(), at))
        }
        TokenKind::String(s) => Ok(Value::String(s.clone())),
        TokenKind::Date(text) => parse_date(text)
            .map(Value::Date)
            .ok_or_else(|| ReadError::BadDate(text.to_string(), at)),
        TokenKind::Symbol(text) => Ok(read_symbol(text)),
    }
}

fn read_list(reader: &mut Reader, opened_at: Location) -> Result {
    let mut elements = Vec::new();
    loop {
        match reader.peek() {
            Some(Token {
                kind: TokenKind::RightParen,
                ..
            }) => {
                reader.next();
                break;
            }
            Some(Token {
                kind: TokenKind::EndOfInput,
                location,
            }) => return Err(ReadError::UnclosedList(*location)),
            None => return Err(ReadError::UnclosedList(opened_at)),
            Some(_) => elements.push(read_form(reader)?),
        }
    }
    Ok(Value::wrap_list(elements))
}

fn read_symbol(text: &str) -> Value {
    if text.eq_ignore_ascii_case("nil") {
        Value::Nil
    } else if text.eq_ignore_ascii_case("t") {
        Value::Bool(true)
    } else {
        Value::new_symbol(text)
    }
}

/// Integer unless the text has a decimal point. Shared with the `number` builtin.
pub(crate) fn parse_number(text: &str) -> Option<Value> {
    if text.contains('.') {
        let text = match text.ends_with('.') {
            true => format!("{}0", text),
            false => text.to_string(),
        };
        Decimal::from_str(&text).ok().map(Value::Decimal)
    } else {
        BigInt::from_str(text).ok().map(Value::Integer)
    }
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDateTime> {
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(n: i64) -> Value {
        Value::integer(n)
    }

    fn sym(name: &str) -> Value {
        Value::new_symbol(name)
    }

    #[test]
    fn reads_atoms() {
        assert_eq!(read_str("42").unwrap(), int(42));
        assert_eq!(read_str("-7").unwrap(), int(-7));
        assert_eq!(
            read_str("3.25").unwrap(),
            Value::Decimal(Decimal::new(325, 2))
        );
        assert_eq!(read_str("\"hi\"").unwrap(), Value::String("hi".into()));
        assert_eq!(read_str("Foo").unwrap(), sym("Foo"));
    }

    #[test]
    fn integers_are_arbitrary_precision() {
        let text = "123456789012345678901234567890123456789";
        assert_eq!(
            read_str(text).unwrap(),
            Value::Integer(BigInt::from_str(text).unwrap())
        );
    }

    #[test]
    fn nil_and_t_ignore_case() {
        assert_eq!(read_str("NIL").unwrap(), Value::Nil);
        assert_eq!(read_str("nil").unwrap(), Value::Nil);
        assert_eq!(read_str("T").unwrap(), Value::Bool(true));
        assert_eq!(read_str("true").unwrap(), sym("true"));
    }

    #[test]
    fn reads_nested_lists() {
        assert_eq!(
            read_str("(a (b 1) ())").unwrap(),
            Value::wrap_list(vec![
                sym("a"),
                Value::wrap_list(vec![sym("b"), int(1)]),
                Value::new_list()
            ])
        );
    }

    #[test]
    fn quote_mark_is_sugar() {
        assert_eq!(
            read_str("'(1 2)").unwrap(),
            read_str("(quote (1 2))").unwrap()
        );
    }

    #[test]
    fn reads_date_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            read_str("#d\"2024-01-15\"").unwrap(),
            Value::Date(date.and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(
            read_str("#d\"2024-01-15 10:30:05\"").unwrap(),
            Value::Date(date.and_hms_opt(10, 30, 5).unwrap())
        );
    }

    #[test]
    fn bad_dates_are_syntax_errors() {
        match read_str("#d\"not a date\"") {
            Err(ReadError::BadDate(text, _)) => assert_eq!(text, "not a date"),
            other => panic!("expected a bad date, got {:?}", other),
        }
    }

    #[test]
    fn unclosed_list_reports_where_input_ran_out() {
        let err = read_str("(define (f x)\n  (+ x 1)").unwrap_err();
        match err {
            ReadError::UnclosedList(at) => {
                assert_eq!(at.line, 2);
                assert_eq!(at.column, 10);
            }
            other => panic!("expected an unclosed list, got {:?}", other),
        }
    }

    #[test]
    fn stray_close_paren_is_an_error() {
        assert!(matches!(
            read_str(")"),
            Err(ReadError::UnexpectedCloseParen(_))
        ));
    }

    #[test]
    fn empty_input_reads_as_nil() {
        assert_eq!(read_str("").unwrap(), Value::Nil);
        assert_eq!(read_str("  ; nothing here").unwrap(), Value::Nil);
    }

    #[test]
    fn parse_all_reads_every_form() {
        let forms = read_all("(define x 1)\n; comment\nx nil\n").unwrap();
        assert_eq!(forms.len(), 3);
        assert_eq!(forms[1], sym("x"));
        assert_eq!(forms[2], Value::Nil);
        assert!(read_all("  ; just a comment\n").unwrap().is_empty());
    }

    #[test]
    fn trailing_point_reads_as_decimal() {
        assert_eq!(read_str("5.").unwrap(), Value::Decimal(Decimal::from(5)));
    }
}
