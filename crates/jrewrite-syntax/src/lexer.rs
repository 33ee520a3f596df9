//! Token-level scanner for the structural parser.
//!
//! Whitespace and comments are dropped; every token keeps its byte range so
//! the parser can slice the original text.

use jrewrite_core::{range_of, TextRange};

use crate::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Number,
    StringLiteral,
    CharLiteral,
    TextBlock,
    At,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Star,
    Lt,
    Gt,
    Minus,
    /// Any other operator or separator character.
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) range: TextRange,
}

impl Token {
    pub(crate) fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.range]
    }
}

pub(crate) fn lex(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer { text, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: &str, start: usize) -> ParseError {
        ParseError::new(message, range_of(start, self.pos))
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.bump_char();
            }

            let rem = self.remaining();
            if rem.starts_with("//") {
                while let Some(c) = self.bump_char() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if rem.starts_with("/*") {
                let start = self.pos;
                match rem[2..].find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => {
                        self.pos = self.text.len();
                        return Err(self.error("unterminated block comment", start));
                    }
                }
                continue;
            }

            return Ok(());
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while matches!(self.peek_char(), Some(c) if pred(c)) {
            self.bump_char();
        }
    }

    /// Consume a quoted literal whose opening `quote` was already consumed.
    fn lex_quoted(&mut self, quote: char, start: usize) -> Result<(), ParseError> {
        while let Some(c) = self.bump_char() {
            match c {
                '\\' => {
                    self.bump_char();
                }
                '\n' => break,
                c if c == quote => return Ok(()),
                _ => {}
            }
        }
        let what = if quote == '"' {
            "unterminated string literal"
        } else {
            "unterminated character literal"
        };
        Err(self.error(what, start))
    }

    fn lex_text_block(&mut self, start: usize) -> Result<(), ParseError> {
        // Opening `"""` already consumed.
        while !self.remaining().is_empty() {
            if self.remaining().starts_with("\"\"\"") {
                self.pos += 3;
                return Ok(());
            }
            if self.bump_char() == Some('\\') {
                self.bump_char();
            }
        }
        Err(self.error("unterminated text block", start))
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_whitespace_and_comments()?;
        let start = self.pos;
        let Some(ch) = self.bump_char() else {
            return Ok(None);
        };

        let kind = match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '-' => TokenKind::Minus,
            '@' => TokenKind::At,
            '"' if self.remaining().starts_with("\"\"") => {
                self.pos += 2;
                self.lex_text_block(start)?;
                TokenKind::TextBlock
            }
            '"' => {
                self.lex_quoted('"', start)?;
                TokenKind::StringLiteral
            }
            '\'' => {
                self.lex_quoted('\'', start)?;
                TokenKind::CharLiteral
            }
            c if c.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                self.eat_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                TokenKind::Ident
            }
            _ => TokenKind::Punct,
        };

        Ok(Some(Token {
            kind,
            range: range_of(start, self.pos),
        }))
    }
}
