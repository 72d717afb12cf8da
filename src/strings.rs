// String literals recognise the escapes \n, \t, \r, \\ and \". Any other
// escaped character stands for itself, and nothing is ever rejected: an
// unterminated literal simply runs to the end of the input.

use bimap::BiMap;
use std::str::Chars;

lazy_static! {
    static ref ESCAPES: BiMap<char, char> = {
        let mut m = BiMap::new();
        m.insert('\\', '\\');
        m.insert('"', '"');
        m.insert('n', '\n');
        m.insert('t', '\t');
        m.insert('r', '\r');
        m
    };
}

struct StringBuilder<'a> {
    chars: Chars<'a>,
}

impl<'a> StringBuilder<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars() }
    }
}

impl Iterator for StringBuilder<'_> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.chars.next()? {
            '\\' => match self.chars.next() {
                None => '\\',
                Some(c) => ESCAPES.get_by_left(&c).copied().unwrap_or(c),
            },
            c => c,
        };
        Some(result)
    }
}

/// Decodes the body of a string literal, without its quotes.
pub(crate) fn build_string(src: &str) -> String {
    StringBuilder::new(src).collect()
}

struct StringPrinter<'a> {
    chars: Chars<'a>,
}

impl<'a> StringPrinter<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars() }
    }
}

impl Iterator for StringPrinter<'_> {
    type Item = (char, Option<char>);

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.chars.next()?;
        let charseq = match ESCAPES.get_by_right(&next) {
            Some(&l) => ('\\', Some(l)),
            None => (next, None),
        };
        Some(charseq)
    }
}

pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::new();
    output.push('"');
    for (char1, char2) in StringPrinter::new(src) {
        output.push(char1);
        if let Some(char2) = char2 {
            output.push(char2)
        };
    }
    output.push('"');
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_escapes_are_decoded() {
        assert_eq!(build_string(r#"a\nb\tc\rd\\e\"f"#), "a\nb\tc\rd\\e\"f");
    }

    #[test]
    fn unknown_escapes_pass_the_character_through() {
        assert_eq!(build_string(r"\q\x"), "qx");
    }

    #[test]
    fn a_trailing_backslash_is_kept() {
        assert_eq!(build_string(r"abc\"), "abc\\");
    }

    #[test]
    fn repr_reverses_build() {
        let text = "say \"hi\"\n\tand\\leave";
        let printed = string_repr(text);
        assert_eq!(build_string(&printed[1..printed.len() - 1]), text);
    }
}
