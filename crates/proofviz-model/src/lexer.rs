use serde_json::Number;

use crate::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Number(Number),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Equals,
    Semicolon,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            len: input.len(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let bytes = self.input.as_bytes();
        if self.pos >= self.len {
            return Ok(Token {
                kind: TokenKind::Eof,
                start: self.pos,
                end: self.pos,
            });
        }

        let start = self.pos;
        let b = bytes[self.pos];
        let punct = match b {
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            b':' => Some(TokenKind::Colon),
            b',' => Some(TokenKind::Comma),
            b'=' => Some(TokenKind::Equals),
            b';' => Some(TokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = punct {
            self.pos += 1;
            return Ok(Token {
                kind,
                start,
                end: self.pos,
            });
        }

        if b == b'"' || b == b'\'' {
            return self.read_string(b);
        }

        if b == b'-' || b.is_ascii_digit() || (b == b'.' && self.peek_is_digit(1)) {
            return self.read_number();
        }

        if is_ident_start(b) {
            return self.read_ident();
        }

        let ch = self.input[self.pos..].chars().next().unwrap_or('?');
        Err(ParseError::new(format!("unexpected character '{ch}'"), self.pos))
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        let bytes = self.input.as_bytes();
        while self.pos < self.len {
            let b = bytes[self.pos];
            if b.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }

            if b == b'/' && self.pos + 1 < self.len && bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                while self.pos < self.len && bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if b == b'/' && self.pos + 1 < self.len && bytes[self.pos + 1] == b'*' {
                let start = self.pos;
                match self.input[self.pos + 2..].find("*/") {
                    Some(end_rel) => {
                        self.pos += 2 + end_rel + 2;
                        continue;
                    }
                    None => {
                        return Err(ParseError::new("unterminated block comment".to_string(), start));
                    }
                }
            }

            // Byte-order mark.
            if self.input[self.pos..].starts_with('\u{feff}') {
                self.pos += '\u{feff}'.len_utf8();
                continue;
            }

            break;
        }
        Ok(())
    }

    fn read_ident(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        self.pos += 1;
        while self.pos < self.len && is_ident_continue(bytes[self.pos]) {
            self.pos += 1;
        }
        Ok(Token {
            kind: TokenKind::Ident(self.input[start..self.pos].to_string()),
            start,
            end: self.pos,
        })
    }

    fn read_string(&mut self, quote: u8) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        loop {
            let Some(ch) = self.input[self.pos..].chars().next() else {
                return Err(ParseError::new("unterminated string".to_string(), start));
            };
            match ch {
                '\n' => {
                    return Err(ParseError::new("unterminated string".to_string(), start));
                }
                '\\' => {
                    self.pos += 1;
                    let escaped = self.read_escape()?;
                    text.push(escaped);
                }
                _ if ch as u32 == quote as u32 => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    self.pos += ch.len_utf8();
                    text.push(ch);
                }
            }
        }
        Ok(Token {
            kind: TokenKind::Str(text),
            start,
            end: self.pos,
        })
    }

    fn read_escape(&mut self) -> Result<char, ParseError> {
        let escape_start = self.pos - 1;
        let Some(ch) = self.input[self.pos..].chars().next() else {
            return Err(ParseError::new("unterminated escape".to_string(), escape_start));
        };
        self.pos += ch.len_utf8();
        let decoded = match ch {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'u' => return self.read_unicode_escape(escape_start),
            // Quotes, backslash, slash and any other escaped character stand for themselves.
            other => other,
        };
        Ok(decoded)
    }

    fn read_unicode_escape(&mut self, escape_start: usize) -> Result<char, ParseError> {
        let high = self.read_hex4(escape_start)?;
        if (0xD800..0xDC00).contains(&high) {
            if !self.input[self.pos..].starts_with("\\u") {
                return Err(ParseError::new(
                    "unpaired surrogate in unicode escape".to_string(),
                    escape_start,
                ));
            }
            self.pos += 2;
            let low = self.read_hex4(escape_start)?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(ParseError::new(
                    "invalid low surrogate in unicode escape".to_string(),
                    escape_start,
                ));
            }
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(code).ok_or_else(|| {
                ParseError::new("invalid unicode escape".to_string(), escape_start)
            });
        }
        char::from_u32(high)
            .ok_or_else(|| ParseError::new("invalid unicode escape".to_string(), escape_start))
    }

    fn read_hex4(&mut self, escape_start: usize) -> Result<u32, ParseError> {
        let end = self.pos + 4;
        let digits = self
            .input
            .get(self.pos..end)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| {
                ParseError::new("expected four hex digits in unicode escape".to_string(), escape_start)
            })?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| {
            ParseError::new("expected four hex digits in unicode escape".to_string(), escape_start)
        })?;
        self.pos = end;
        Ok(value)
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        if bytes[self.pos] == b'-' {
            self.pos += 1;
        }
        let mut is_integer = true;
        while self.pos < self.len && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos < self.len && bytes[self.pos] == b'.' {
            is_integer = false;
            self.pos += 1;
            while self.pos < self.len && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if self.pos < self.len && (bytes[self.pos] == b'e' || bytes[self.pos] == b'E') {
            is_integer = false;
            self.pos += 1;
            if self.pos < self.len && (bytes[self.pos] == b'+' || bytes[self.pos] == b'-') {
                self.pos += 1;
            }
            while self.pos < self.len && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }

        let text = &self.input[start..self.pos];
        let number = if is_integer {
            text.parse::<i64>()
                .map(Number::from)
                .or_else(|_| text.parse::<u64>().map(Number::from))
                .ok()
        } else {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        };
        let number =
            number.ok_or_else(|| ParseError::new(format!("invalid number '{text}'"), start))?;
        Ok(Token {
            kind: TokenKind::Number(number),
            start,
            end: self.pos,
        })
    }

    fn peek_is_digit(&self, offset: usize) -> bool {
        self.input
            .as_bytes()
            .get(self.pos + offset)
            .is_some_and(|b| b.is_ascii_digit())
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
