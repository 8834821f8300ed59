//! Tokenizer for rule expressions.

use super::EvalError;

/// Lexer token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(String),
    Str(String),
    Ident(String),
    /// `#this` / `#root` style variable.
    Var(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Matches,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    SafeDot,
    Question,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

impl Token {
    /// Short rendering for diagnostics.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.clone(),
            Token::Str(s) => format!("'{s}'"),
            Token::Ident(name) => name.clone(),
            Token::Var(name) => format!("#{name}"),
            Token::True => "true".into(),
            Token::False => "false".into(),
            Token::Null => "null".into(),
            Token::And => "&&".into(),
            Token::Or => "||".into(),
            Token::Not => "!".into(),
            Token::Matches => "matches".into(),
            Token::Eq => "==".into(),
            Token::Ne => "!=".into(),
            Token::Lt => "<".into(),
            Token::Le => "<=".into(),
            Token::Gt => ">".into(),
            Token::Ge => ">=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::Dot => ".".into(),
            Token::SafeDot => "?.".into(),
            Token::Question => "?".into(),
            Token::Colon => ":".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),
            Token::Comma => ",".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

/// Token paired with its byte offset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    pub(crate) fn lex(mut self) -> Result<Vec<SpannedToken>, EvalError> {
        let mut tokens = Vec::new();
        let input = self.input;
        let bytes = input.as_bytes();

        while self.offset < bytes.len() {
            let start = self.offset;
            let ch = bytes[self.offset];
            let token = match ch {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                    continue;
                }
                b'(' => self.single(Token::LParen),
                b')' => self.single(Token::RParen),
                b'[' => self.single(Token::LBracket),
                b']' => self.single(Token::RBracket),
                b',' => self.single(Token::Comma),
                b'+' => self.single(Token::Plus),
                b'-' => self.single(Token::Minus),
                b'*' => self.single(Token::Star),
                b'/' => self.single(Token::Slash),
                b'%' => self.single(Token::Percent),
                b':' => self.single(Token::Colon),
                b'.' => self.single(Token::Dot),
                b'?' => {
                    if self.peek(bytes) == Some(b'.') {
                        self.double(Token::SafeDot)
                    } else {
                        self.single(Token::Question)
                    }
                }
                b'!' => {
                    if self.peek(bytes) == Some(b'=') {
                        self.double(Token::Ne)
                    } else {
                        self.single(Token::Not)
                    }
                }
                b'=' => {
                    if self.peek(bytes) == Some(b'=') {
                        self.double(Token::Eq)
                    } else {
                        return Err(self.unexpected("==", "="));
                    }
                }
                b'<' => {
                    if self.peek(bytes) == Some(b'=') {
                        self.double(Token::Le)
                    } else {
                        self.single(Token::Lt)
                    }
                }
                b'>' => {
                    if self.peek(bytes) == Some(b'=') {
                        self.double(Token::Ge)
                    } else {
                        self.single(Token::Gt)
                    }
                }
                b'&' => {
                    if self.peek(bytes) == Some(b'&') {
                        self.double(Token::And)
                    } else {
                        return Err(self.unexpected("&&", "&"));
                    }
                }
                b'|' => {
                    if self.peek(bytes) == Some(b'|') {
                        self.double(Token::Or)
                    } else {
                        return Err(self.unexpected("||", "|"));
                    }
                }
                b'\'' | b'"' => self.string(ch)?,
                b'0'..=b'9' => self.number(bytes),
                b'#' => {
                    self.offset += 1;
                    let name = self.identifier(bytes);
                    if name.is_empty() {
                        return Err(self.unexpected("variable name after #", "#"));
                    }
                    Token::Var(name.to_string())
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                    let ident = self.identifier(bytes);
                    keyword_or_ident(ident)
                }
                _ => {
                    let found = input[self.offset..].chars().next().unwrap_or('?');
                    return Err(self.unexpected("identifier, literal, or operator", &found.to_string()));
                }
            };
            tokens.push(SpannedToken {
                token,
                position: start,
            });
        }

        if tokens.is_empty() {
            return Err(EvalError::Parse {
                position: 0,
                message: "expression is empty".to_string(),
            });
        }

        tokens.push(SpannedToken {
            token: Token::Eof,
            position: self.offset,
        });
        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.offset += 1;
        token
    }

    fn double(&mut self, token: Token) -> Token {
        self.offset += 2;
        token
    }

    fn peek(&self, bytes: &[u8]) -> Option<u8> {
        bytes.get(self.offset + 1).copied()
    }

    fn unexpected(&self, expected: &str, found: &str) -> EvalError {
        EvalError::Parse {
            position: self.offset,
            message: format!("unexpected `{found}`, expected {expected}"),
        }
    }

    fn identifier(&mut self, bytes: &[u8]) -> &'a str {
        let input = self.input;
        let start = self.offset;
        while let Some(&b) = bytes.get(self.offset) {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.offset += 1;
            } else {
                break;
            }
        }
        &input[start..self.offset]
    }

    fn number(&mut self, bytes: &[u8]) -> Token {
        let start = self.offset;
        while bytes.get(self.offset).is_some_and(u8::is_ascii_digit) {
            self.offset += 1;
        }
        // A fraction needs a digit after the dot, otherwise the dot is member access.
        if bytes.get(self.offset) == Some(&b'.')
            && bytes.get(self.offset + 1).is_some_and(u8::is_ascii_digit)
        {
            self.offset += 1;
            while bytes.get(self.offset).is_some_and(u8::is_ascii_digit) {
                self.offset += 1;
            }
        }
        Token::Number(self.input[start..self.offset].to_string())
    }

    fn string(&mut self, quote: u8) -> Result<Token, EvalError> {
        let input = self.input;
        let start = self.offset;
        self.offset += 1;
        let mut value = String::new();
        let mut chars = input[self.offset..].char_indices();

        while let Some((idx, c)) = chars.next() {
            match c {
                '\\' => {
                    let (_, escaped) = chars.next().ok_or_else(|| EvalError::Parse {
                        position: start,
                        message: "unterminated string literal".to_string(),
                    })?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' | '\'' | '"' => value.push(escaped),
                        // Unknown escapes are kept verbatim so regex classes like `\d` survive.
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                c if c as u32 == u32::from(quote) => {
                    self.offset += idx + 1;
                    return Ok(Token::Str(value));
                }
                c => value.push(c),
            }
        }

        Err(EvalError::Parse {
            position: start,
            message: "unterminated string literal".to_string(),
        })
    }
}

fn keyword_or_ident(slice: &str) -> Token {
    match slice {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        "matches" => Token::Matches,
        _ => Token::Ident(slice.to_string()),
    }
}
