//! Module `scanner` implements a one‑pass, streaming lexer for the Jasper language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, JasperError>` on each `.next()`, where `Ok(token)` is a
//!   scanned token and `Err` reports a lexing error with line information.  An
//!   error never ends the stream: the offending character is skipped and
//!   scanning resumes.
//!
//! - `Scanner::scan_all(self)`
//!   Drain the iterator into the token list plus every lexical error seen.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `/`.
//! - `|` and `&` are shorthands for `or` and `and`.
//! - Two‑character operators (maximal munch): `!=`, `==`, `<=`, `>=`.
//! - Line comments: `//` and `#` to end‑of‑line, skipped with `memchr`.
//! - Paragraph comments: `"""` … `"""`.
//! - String literals: `"` … `"`, multi‑line, no escape processing.
//! - Numeric literals: integer and optional fractional part, stored as `f64`.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! # Example
//!
//! ```rust
//! use jasper::scanner::Scanner;
//!
//! let (tokens, errors) = Scanner::new("print 123; // example").scan_all();
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 4);
//! ```

use crate::error::{JasperError, Result};
use crate::token::{Token, TokenType};
use log::{info, trace};
use memchr::{memchr, memchr_iter, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"for"    => TokenType::FOR,
    b"func"   => TokenType::FUNC,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** over a source string.
pub struct Scanner<'a> {
    text: &'a str,              // source, for lexeme slicing
    src: &'a [u8],              // same source viewed as bytes
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `text`.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            src: text.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
        }
    }

    /// Scan the whole input, splitting tokens from lexical errors.
    /// The token list always ends with `EOF`.
    pub fn scan_all(self) -> (Vec<Token>, Vec<JasperError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<JasperError> = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Scanned {} token(s) with {} error(s)",
            tokens.len(),
            errors.len()
        );

        (tokens, errors)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.peek_at(1)
    }

    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.src.get(self.curr + offset).copied().unwrap_or(0)
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_line_comment(&mut self) {
        match memchr(b'\n', &self.src[self.curr..]) {
            Some(pos) => self.curr += pos,
            None => self.curr = self.len(),
        }
    }

    /// `matched` if the next byte is `second` (consuming it), else `single`.
    #[inline]
    fn either(&mut self, second: u8, matched: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(second) {
            matched
        } else {
            single
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan one lexeme starting at `self.start`.  Whitespace and comments
    /// produce no token kind.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind: TokenType = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'|' => TokenType::OR,
            b'&' => TokenType::AND,

            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'#' => {
                self.skip_line_comment();
                return Ok(None);
            }

            b'/' => {
                if self.match_byte(b'/') {
                    self.skip_line_comment();
                    return Ok(None);
                }
                TokenType::SLASH
            }

            b'"' if self.peek() == b'"' && self.peek_next() == b'"' => {
                return self.skip_paragraph_comment().map(|()| None);
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => return Err(self.unexpected_character()),
        };

        Ok(Some(kind))
    }

    /// Report the character at `self.start` and step over all of its bytes,
    /// so a multi-byte character yields one error.
    fn unexpected_character(&mut self) -> JasperError {
        let ch: char = self.text[self.start..].chars().next().unwrap_or('\u{FFFD}');
        self.curr = self.start + ch.len_utf8();

        JasperError::lex(self.line, format!("Unexpected character: {}", ch))
    }

    /// Skip a `"""` paragraph comment.  `self.curr` sits just past the first `"`.
    fn skip_paragraph_comment(&mut self) -> Result<()> {
        self.curr += 2;

        let rest: &[u8] = &self.src[self.curr..];
        let found: Option<usize> = memmem::find(rest, b"\"\"\"");
        let body: &[u8] = &rest[..found.unwrap_or(rest.len())];

        self.line += memchr_iter(b'\n', body).count();

        match found {
            Some(pos) => {
                self.curr += pos + 3;
                Ok(())
            }

            None => {
                self.curr = self.len();
                Err(JasperError::lex(self.line, "Unterminated paragraph comment."))
            }
        }
    }

    /// String literal body; the opening `"` is already consumed.
    /// Newlines are allowed and counted.  No escapes.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(JasperError::lex(self.line, "Unterminated string."));
        }

        self.advance();

        // Quotes are ASCII, so both ends are char boundaries.
        let contents: &str = &self.text[self.start + 1..self.curr - 1];

        Ok(TokenType::STRING(contents.to_owned()))
    }

    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    /// `123` or `3.14`; a trailing `.` is left for the next token.
    fn number(&mut self) -> TokenType {
        self.digits();

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            self.digits();
        }

        // Only ASCII digits and one dot were consumed.
        let value: f64 = self.text[self.start..self.curr].parse().unwrap_or(0.0);

        TokenType::NUMBER(value)
    }

    /// Identifier, or keyword if the perfect-hash table knows it.
    fn identifier(&mut self) -> TokenType {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.advance();
        }

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Scan one lexeme.
            self.start = self.curr;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(Some(tt)) => {
                    let lex: &str = &self.text[self.start..self.curr];
                    trace!("Scanned token ({:?}) on line {}", tt, self.line);

                    return Some(Ok(Token::new(tt, lex, self.line)));
                }

                Ok(None) => {}
            }
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
