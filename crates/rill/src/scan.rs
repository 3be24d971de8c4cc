//! Tokens and the scanner.
//!
//! The scanner turns source text into a vector of [`Token`]s terminated by a
//! single [`TokenKind::Eof`]. Identifier and string payloads are interned as
//! they are scanned; the raw source is not needed afterwards.

use std::borrow::Cow;

use crate::{
    diagnostics::DiagnosticSink,
    intern::{Interner, StringId},
    value::num_repr,
};

/// The kind of a token, carrying the decoded payload for literal kinds.
///
/// The `strum` serializations are the source lexemes, used when diagnostics
/// quote the offending token.
#[derive(Debug, Clone, Copy, PartialEq, strum::IntoStaticStr)]
pub enum TokenKind {
    // single-character punctuation
    #[strum(serialize = "(")]
    LeftParen,
    #[strum(serialize = ")")]
    RightParen,
    #[strum(serialize = "{")]
    LeftBrace,
    #[strum(serialize = "}")]
    RightBrace,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ".")]
    Dot,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = ";")]
    Semicolon,
    #[strum(serialize = "/")]
    Slash,
    #[strum(serialize = "*")]
    Star,
    #[strum(serialize = "?")]
    Question,
    #[strum(serialize = ":")]
    Colon,
    // one or two character operators
    #[strum(serialize = "!")]
    Bang,
    #[strum(serialize = "!=")]
    BangEqual,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "==")]
    EqualEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    // literals
    Identifier(StringId),
    Str(StringId),
    Number(f64),
    // keywords
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "break")]
    Break,
    #[strum(serialize = "class")]
    Class,
    #[strum(serialize = "else")]
    Else,
    #[strum(serialize = "false")]
    False,
    #[strum(serialize = "for")]
    For,
    #[strum(serialize = "fun")]
    Fun,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "nil")]
    Nil,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "print")]
    Print,
    #[strum(serialize = "return")]
    Return,
    #[strum(serialize = "true")]
    True,
    #[strum(serialize = "var")]
    Var,
    #[strum(serialize = "while")]
    While,
    Eof,
}

/// A scanned token with its 1-based source line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl Token {
    /// Returns the source lexeme of this token, for quoting in diagnostics.
    pub(crate) fn lexeme<'a>(&self, interner: &'a Interner) -> Cow<'a, str> {
        match self.kind {
            TokenKind::Identifier(id) => Cow::Borrowed(interner.get(id)),
            TokenKind::Str(id) => Cow::Owned(format!("\"{}\"", interner.get(id))),
            TokenKind::Number(value) => Cow::Owned(num_repr(value)),
            TokenKind::Eof => Cow::Borrowed("end"),
            other => Cow::Borrowed(<&'static str>::from(other)),
        }
    }
}

/// Scans `source` into tokens, reporting scan errors to `sink`.
///
/// Always returns a token vector ending in `Eof`, even when errors were
/// reported; the parser produces further diagnostics from whatever tokens
/// survive.
pub(crate) fn scan(source: &str, interner: &mut Interner, sink: &mut impl DiagnosticSink) -> Vec<Token> {
    let mut scanner = Scanner {
        source,
        bytes: source.as_bytes(),
        interner,
        sink,
        tokens: Vec::new(),
        start: 0,
        current: 0,
        line: 1,
    };
    scanner.scan_tokens();
    scanner.tokens
}

struct Scanner<'a, S: DiagnosticSink> {
    source: &'a str,
    bytes: &'a [u8],
    interner: &'a mut Interner,
    sink: &'a mut S,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
}

impl<S: DiagnosticSink> Scanner<'_, S> {
    fn scan_tokens(&mut self) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            line: self.line,
        });
    }

    fn scan_token(&mut self) {
        let byte = self.advance();
        match byte {
            b'(' => self.add_token(TokenKind::LeftParen),
            b')' => self.add_token(TokenKind::RightParen),
            b'{' => self.add_token(TokenKind::LeftBrace),
            b'}' => self.add_token(TokenKind::RightBrace),
            b',' => self.add_token(TokenKind::Comma),
            b'.' => self.add_token(TokenKind::Dot),
            b'-' => self.add_token(TokenKind::Minus),
            b'+' => self.add_token(TokenKind::Plus),
            b';' => self.add_token(TokenKind::Semicolon),
            b'*' => self.add_token(TokenKind::Star),
            b'?' => self.add_token(TokenKind::Question),
            b':' => self.add_token(TokenKind::Colon),
            b'!' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            b'=' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            b'<' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            b'>' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            b'/' => {
                if self.match_byte(b'/') {
                    // line comment, runs to end of line
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.current += 1;
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            b' ' | b'\r' | b'\t' => {}
            b'\n' => self.line += 1,
            b'"' => self.string(),
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),
            _ => {
                // skip any UTF-8 continuation bytes so we stay on char boundaries
                while !self.is_at_end() && self.bytes[self.current] & 0xC0 == 0x80 {
                    self.current += 1;
                }
                self.sink.report(self.line, "Error: Unexpected character.");
            }
        }
    }

    fn string(&mut self) {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }
        if self.is_at_end() {
            self.sink.report(self.line, "Error: Unterminated string.");
            return;
        }
        // closing quote
        self.current += 1;
        let content = &self.source[self.start + 1..self.current - 1];
        let id = self.interner.intern(content);
        self.add_token(TokenKind::Str(id));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }
        // a fractional part needs at least one digit after the dot
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.current += 1;
            while self.peek().is_ascii_digit() {
                self.current += 1;
            }
        }
        let text = &self.source[self.start..self.current];
        let value = text.parse().expect("scanned number literal is a valid f64");
        self.add_token(TokenKind::Number(value));
    }

    fn identifier(&mut self) {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.current += 1;
        }
        let text = &self.source[self.start..self.current];
        let kind = match text {
            "and" => TokenKind::And,
            "break" => TokenKind::Break,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => TokenKind::Identifier(self.interner.intern(text)),
        };
        self.add_token(kind);
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.tokens.push(Token { kind, line: self.line });
    }

    fn advance(&mut self) -> u8 {
        let byte = self.bytes[self.current];
        self.current += 1;
        byte
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.bytes[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.bytes[self.current] }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.bytes.len() {
            0
        } else {
            self.bytes[self.current + 1]
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectDiagnostics;

    fn scan_kinds(source: &str) -> (Vec<TokenKind>, CollectDiagnostics) {
        let mut interner = Interner::new();
        let mut sink = CollectDiagnostics::new();
        let tokens = scan(source, &mut interner, &mut sink);
        (tokens.into_iter().map(|t| t.kind).collect(), sink)
    }

    #[test]
    fn scans_operators_and_keywords() {
        let (kinds, sink) = scan_kinds("var x = 1 <= 2;");
        assert!(!sink.had_error());
        assert!(matches!(kinds[0], TokenKind::Var));
        assert!(matches!(kinds[1], TokenKind::Identifier(_)));
        assert!(matches!(kinds[2], TokenKind::Equal));
        assert!(matches!(kinds[3], TokenKind::Number(n) if n == 1.0));
        assert!(matches!(kinds[4], TokenKind::LessEqual));
        assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn multi_line_string_tracks_lines() {
        let mut interner = Interner::new();
        let mut sink = CollectDiagnostics::new();
        let tokens = scan("\"a\nb\" x", &mut interner, &mut sink);
        assert!(!sink.had_error());
        assert!(matches!(tokens[0].kind, TokenKind::Str(id) if interner.get(id) == "a\nb"));
        assert_eq!(tokens[1].line, 2, "identifier after the string is on line 2");
    }

    #[test]
    fn unterminated_string_reports_an_error() {
        let (_, sink) = scan_kinds("\"oops");
        assert!(sink.had_error());
        assert!(sink.diagnostics()[0].message.contains("Unterminated string"));
    }

    #[test]
    fn unexpected_character_reports_and_continues() {
        let (kinds, sink) = scan_kinds("@ 1");
        assert!(sink.had_error());
        assert!(matches!(kinds[0], TokenKind::Number(_)), "scanning continues after the error");
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        let (kinds, _) = scan_kinds("12.;");
        assert!(matches!(kinds[0], TokenKind::Number(n) if n == 12.0));
        assert_eq!(kinds[1], TokenKind::Dot);
    }
}
