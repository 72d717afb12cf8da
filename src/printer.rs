use crate::strings::string_repr;
use crate::types::Value;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Strings quoted and escaped, so the reader can take the text back.
    ReadableRepresentation,
    /// A top-level string printed as its raw contents.
    Directly,
}

pub fn pr_str(object: &Value, mode: PrintMode) -> String {
    match object {
        Value::Nil => String::from("nil"),
        Value::Bool(true) => String::from("t"),
        // There is no literal for false; it reads back as nil.
        Value::Bool(false) => String::from("nil"),
        Value::Integer(value) => value.to_string(),
        Value::Decimal(value) => value.to_string(),
        Value::String(s) => match mode {
            PrintMode::ReadableRepresentation => string_repr(s),
            PrintMode::Directly => s.clone(),
        },
        Value::Symbol(name) => name.to_string(),
        Value::Date(date) => format!("#d\"{}\"", date.format("%Y-%m-%d %H:%M:%S")),
        Value::List(elements) => format!(
            "({})",
            elements
                .iter()
                .map(|e| pr_str(e, PrintMode::ReadableRepresentation))
                .join(" ")
        ),
        Value::Primitive(f) => format!("#<function:{}>", f.name),
        Value::Closure(c) => format!("#<function:{}>", c.name),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self, PrintMode::ReadableRepresentation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    #[test]
    fn prints_nested_lists() {
        let value = read_str("(a \"b\" (1 2.5) nil t)").unwrap();
        assert_eq!(value.to_string(), "(a \"b\" (1 2.5) nil t)");
    }

    #[test]
    fn strings_print_escaped_or_raw() {
        let value = Value::String("line\n\"quoted\"".into());
        assert_eq!(
            pr_str(&value, PrintMode::ReadableRepresentation),
            r#""line\n\"quoted\"""#
        );
        assert_eq!(pr_str(&value, PrintMode::Directly), "line\n\"quoted\"");
    }

    #[test]
    fn dates_print_as_literals() {
        let value = read_str("#d\"2024-03-09\"").unwrap();
        assert_eq!(value.to_string(), "#d\"2024-03-09 00:00:00\"");
        assert_eq!(read_str(&value.to_string()).unwrap(), value);
    }

    #[test]
    fn atoms_read_back_as_equal_values() {
        for text in &["0", "-12", "98765432109876543210", "3.14", "-0.5", "\"a\\tb\"", "sym", "t", "nil"] {
            let value = read_str(text).unwrap();
            assert_eq!(read_str(&value.to_string()).unwrap(), value, "{}", text);
        }
    }
}
