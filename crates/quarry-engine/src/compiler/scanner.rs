// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from module source text.

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword
    Identifier(String),
    /// String literal (escapes already decoded)
    String(String),
    /// Numeric literal
    Number(f64),
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `*`
    Star,
    /// `=`
    Equal,
    /// `-`
    Minus,
    /// Anything the scanner could not make sense of
    Invalid(String),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Returns true if this is the identifier `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, TokenKind::Identifier(id) if id == word)
    }
}

/// A token with the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token type
    pub kind: TokenKind,
    /// 1-based source line
    pub line: usize,
}

/// A scanner that tokenizes module source code.
pub struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    /// Scans the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::Invalid(_));
            tokens.push(token);
            if done {
                if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        line: self.line,
                    });
                }
                return tokens;
            }
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let line = self.line;

        let Some(ch) = self.advance() else {
            return Token {
                kind: TokenKind::Eof,
                line,
            };
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '=' => TokenKind::Equal,
            '-' => TokenKind::Minus,
            '"' | '\'' => self.scan_string(ch),
            '0'..='9' => self.scan_number(ch),
            _ if is_id_start(ch) => self.scan_identifier(ch),
            _ => TokenKind::Invalid(format!("unexpected character '{}'", ch)),
        };

        Token { kind, line }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = '\0';
                        while let Some(c) = self.advance() {
                            if prev == '*' && c == '/' {
                                break;
                            }
                            prev = c;
                        }
                    }
                    _ => return,
                },
                _ => return,
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();
        loop {
            let Some(ch) = self.advance() else {
                return TokenKind::Invalid("unterminated string literal".to_string());
            };
            match ch {
                c if c == quote => return TokenKind::String(value),
                '\n' => return TokenKind::Invalid("unterminated string literal".to_string()),
                '\\' => match self.scan_escape() {
                    Ok(c) => value.push(c),
                    Err(kind) => return kind,
                },
                c => value.push(c),
            }
        }
    }

    fn scan_escape(&mut self) -> Result<char, TokenKind> {
        let invalid = || TokenKind::Invalid("invalid escape sequence".to_string());
        match self.advance().ok_or_else(invalid)? {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'b' => Ok('\u{8}'),
            'f' => Ok('\u{c}'),
            '0' => Ok('\0'),
            'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self.advance().and_then(|c| c.to_digit(16)).ok_or_else(invalid)?;
                    code = code * 16 + digit;
                }
                char::from_u32(code).ok_or_else(invalid)
            }
            c => Ok(c),
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid(format!("invalid number '{}'", text)),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if is_id_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Identifier(name)
    }
}

fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

fn is_id_continue(ch: char) -> bool {
    is_id_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scans_import_declaration() {
        assert_eq!(
            kinds("import x from './x.js';"),
            vec![
                TokenKind::Identifier("import".into()),
                TokenKind::Identifier("x".into()),
                TokenKind::Identifier("from".into()),
                TokenKind::String("./x.js".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_skips_comments_and_counts_lines() {
        let tokens = Scanner::new("// one\n/* two\n */ three").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Identifier("three".into()));
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\"bA""#)[0],
            TokenKind::String("a\n\"bA".into())
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1.5e3")[0], TokenKind::Number(1500.0));
        assert_eq!(kinds("2E-1")[0], TokenKind::Number(0.2));
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        assert!(matches!(kinds("'abc")[0], TokenKind::Invalid(_)));
    }
}
