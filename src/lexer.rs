//! Source text to token list.
//!
//! The matching discipline mirrors `examples/original_source/src/Lexer.cpp`:
//! at each cursor position, try patterns in a fixed priority order and take
//! the first one that matches (each pattern is itself matched greedily, but
//! there is no search for the overall longest match across competing
//! patterns). Whitespace and comments are discarded; everything else becomes
//! a [`Token`].

use log::{debug, trace};

use crate::error::LexError;
use crate::token::{Literal, Token, TokenKind, KEYWORDS, TYPES};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, LexError> {
        Self::new(source).run()
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        std::str::from_utf8(&self.source[start..end]).unwrap_or("")
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        'outer: while self.pos < self.source.len() {
            if self.try_whitespace() {
                continue;
            }
            if self.try_comment()? {
                continue;
            }
            if self.try_number() {
                continue;
            }
            if self.try_identifier() {
                continue;
            }
            if self.try_char_literal()? {
                continue;
            }
            if self.try_string_literal()? {
                continue;
            }
            if self.try_operator() {
                continue;
            }
            if self.try_special() {
                continue;
            }

            let offset = self.pos;
            debug!("lexer failed to match any pattern at offset {offset}");
            return Err(LexError {
                message: "Lexer error".into(),
                offset,
            });
        }

        self.tokens.push(Token::eof(self.pos));
        debug!("lexed {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn try_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn try_comment(&mut self) -> Result<bool, LexError> {
        if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'/') {
            self.pos += 2;
            while !matches!(self.peek(), None | Some(b'\n')) {
                self.pos += 1;
            }
            if self.peek() == Some(b'\n') {
                self.pos += 1;
            }
            return Ok(true);
        }

        if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
            let start = self.pos;
            let mut cursor = self.pos + 2;
            loop {
                if cursor + 1 >= self.source.len() + 1 && cursor >= self.source.len() {
                    // unterminated block comment: the pattern never matches,
                    // fall through and let other patterns try this position.
                    return Ok(false);
                }
                if self.source.get(cursor) == Some(&b'*') && self.source.get(cursor + 1) == Some(&b'/') {
                    self.pos = cursor + 2;
                    trace!("discarded block comment at {start}..{}", self.pos);
                    return Ok(true);
                }
                if cursor >= self.source.len() {
                    return Ok(false);
                }
                cursor += 1;
            }
        }

        Ok(false)
    }

    fn try_number(&mut self) -> bool {
        let start = self.pos;
        let mut cursor = self.pos;
        while matches!(self.source.get(cursor), Some(b) if b.is_ascii_digit()) {
            cursor += 1;
        }
        let int_digits = cursor - start;

        let mut is_float = false;
        let mut end = cursor;
        if self.source.get(cursor) == Some(&b'.') {
            let mut frac_end = cursor + 1;
            while matches!(self.source.get(frac_end), Some(b) if b.is_ascii_digit()) {
                frac_end += 1;
            }
            if frac_end > cursor + 1 {
                is_float = true;
                end = frac_end;
            }
        }

        if end == start || (end - start == 0 && int_digits == 0) {
            return false;
        }
        if !is_float && int_digits == 0 {
            return false;
        }

        let text = self.slice(start, end).to_owned();
        let literal = if is_float {
            Literal::Float(text.parse::<f64>().unwrap_or(0.0))
        } else {
            Literal::Integer(text.parse::<i64>().unwrap_or(0))
        };

        self.pos = end;
        self.tokens
            .push(Token::literal(TokenKind::Literal, text, literal, start));
        true
    }

    fn try_identifier(&mut self) -> bool {
        let start = self.pos;
        let first = match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => b,
            _ => return false,
        };
        let _ = first;
        self.pos += 1;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }

        let text = self.slice(start, self.pos).to_owned();
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else if TYPES.contains(&text.as_str()) {
            TokenKind::Type
        } else {
            TokenKind::Identifier
        };

        self.tokens.push(Token::new(kind, text, start));
        true
    }

    fn try_char_literal(&mut self) -> Result<bool, LexError> {
        if self.peek() != Some(b'\'') {
            return Ok(false);
        }
        let start = self.pos;
        let inner = match self.peek_at(1) {
            Some(b) if b != b'\n' => b,
            _ => return Ok(false),
        };
        if self.peek_at(2) != Some(b'\'') {
            return Ok(false);
        }
        self.pos += 3;
        self.tokens.push(Token::literal(
            TokenKind::Literal,
            self.slice(start, self.pos),
            Literal::Char(inner),
            start,
        ));
        Ok(true)
    }

    fn try_string_literal(&mut self) -> Result<bool, LexError> {
        if self.peek() != Some(b'"') {
            return Ok(false);
        }
        let start = self.pos;
        let mut cursor = self.pos + 1;
        loop {
            match self.source.get(cursor) {
                Some(b'"') => {
                    let value = self.slice(start + 1, cursor).to_owned();
                    self.pos = cursor + 1;
                    self.tokens.push(Token::literal(
                        TokenKind::Literal,
                        self.slice(start, self.pos),
                        Literal::Str(value),
                        start,
                    ));
                    return Ok(true);
                }
                Some(_) => cursor += 1,
                None => return Ok(false),
            }
        }
    }

    const OPERATORS: &'static [&'static str] =
        &[":=", "&&", "||", ">=", "<=", "==", "+", "-", "*", "/", "<", ">"];

    fn try_operator(&mut self) -> bool {
        let start = self.pos;
        for op in Self::OPERATORS {
            let end = start + op.len();
            if end <= self.source.len() && self.slice(start, end) == *op {
                self.pos = end;
                self.tokens
                    .push(Token::new(TokenKind::Operator, *op, start));
                return true;
            }
        }
        false
    }

    const SPECIALS: &'static [u8] = b";()[]{}";

    fn try_special(&mut self) -> bool {
        let Some(b) = self.peek() else { return false };
        if Self::SPECIALS.contains(&b) {
            let start = self.pos;
            self.pos += 1;
            self.tokens.push(Token::new(
                TokenKind::Special,
                (b as char).to_string(),
                start,
            ));
            true
        } else {
            false
        }
    }
}
