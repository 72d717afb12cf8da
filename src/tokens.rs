use crate::strings;
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    LeftParen,
    RightParen,
    /// Literal text; the reader decides between integer and decimal.
    Number(&'a str),
    /// Already escape-processed.
    String(String),
    Symbol(&'a str),
    /// The text between the quotes of `#d"..."`.
    Date(&'a str),
    Quote,
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset into the source.
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub location: Location,
}

struct Cursor {
    position: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn start() -> Self {
        Self {
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance_over(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += text.len();
    }

    fn location(&self) -> Location {
        Location {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }
}

fn create_token(captured: &str) -> Option<TokenKind<'_>> {
    let bytes = captured.as_bytes();
    match bytes.first()? {
        b'(' => Some(TokenKind::LeftParen),
        b')' => Some(TokenKind::RightParen),
        b'\'' => Some(TokenKind::Quote),
        b'"' => Some(TokenKind::String(strings::build_string(
            string_body(captured),
        ))),
        // Comments produce no token.
        b';' => None,
        b'#' if captured.starts_with("#d\"") => {
            let body = &captured[3..];
            Some(TokenKind::Date(body.strip_suffix('"').unwrap_or(body)))
        }
        b'0'..=b'9' => Some(TokenKind::Number(captured)),
        b'-' if bytes.get(1).map_or(false, u8::is_ascii_digit) => {
            Some(TokenKind::Number(captured))
        }
        _ => Some(TokenKind::Symbol(captured)),
    }
}

// The literal's contents without its quotes. The closing quote may be
// missing, or may itself be escaped, in which case the literal ran to the end
// of the input.
fn string_body(captured: &str) -> &str {
    let bytes = captured.as_bytes();
    if bytes.len() == 1 || bytes[bytes.len() - 1] != b'"' {
        return &captured[1..];
    }
    let trailing_backslashes = bytes
        .iter()
        .rev()
        .skip(1)
        .take_while(|&&byte| byte == b'\\')
        .count();
    if trailing_backslashes % 2 == 1 {
        return &captured[1..];
    }
    // " is ASCII so slicing it off by bytes is safe.
    &captured[1..captured.len() - 1]
}

/// Splits source text into tokens. Never fails: anything unrecognised becomes
/// a symbol, and the result always ends with an `EndOfInput` token.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    lazy_static! {
        static ref TOKEN_RE: Regex = Regex::new(
            r#"(?xs)                         # ignore whitespace in this pattern; . matches newlines
                ^\s*                         # whitespace, ignored
                (                            # token capture group
                    [()']                    # parens and the quote mark
                    |\#d"[^"]*"?             # date literal, possibly missing a closing quote
                    |"(?:                    # string literal. its contents, not captured, include:
                        \\.                  #    escapes
                        |\\$                 #    a lone backslash ending the input
                        |[^\\"]              #    anything which isn't a backslash or a quote
                      )*
                      "?                     #    possibly missing a closing quote
                    |;[^\n]*                 # comments, up to the end of the line
                    |-?[0-9]+(?:\.[0-9]*)?   # numbers: optional minus, at most one point
                    |[^\s();]+               # everything else is a symbol
                )
            "#
        )
        .unwrap();
    }
    let mut cursor = Cursor::start();
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some(caps) = TOKEN_RE.captures(rest) {
        let token = match caps.get(1) {
            Some(token) => token,
            None => break,
        };
        cursor.advance_over(&rest[..token.start()]);
        let location = cursor.location();
        if let Some(kind) = create_token(token.as_str()) {
            tokens.push(Token { kind, location });
        }
        cursor.advance_over(token.as_str());
        rest = &rest[token.end()..];
    }
    cursor.advance_over(rest);
    tokens.push(Token {
        kind: TokenKind::EndOfInput,
        location: cursor.location(),
    });
    tokens
}
