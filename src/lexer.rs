use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Keywords
    Table,
    Enum,
    Ref,
    TableGroup,
    As,
    Note,
    Indexes,

    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )
    Comma,    // ,
    Colon,    // :
    Dot,      // .

    RelOneToOne,   // -
    RelOneToMany,  // <
    RelManyToOne,  // >
    RelManyToMany, // <>

    Identifier,
    String,
    Number,

    Newline,
    Eof,
    Unknown,
}

impl TokenKind {
    /// Keywords double as plain words wherever the grammar expects a name,
    /// so `note text` is still a column named `note`.
    pub fn is_word(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::Table
                | Self::Enum
                | Self::Ref
                | Self::TableGroup
                | Self::As
                | Self::Note
                | Self::Indexes
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Table => "'Table'",
            Self::Enum => "'Enum'",
            Self::Ref => "'Ref'",
            Self::TableGroup => "'TableGroup'",
            Self::As => "'as'",
            Self::Note => "'Note'",
            Self::Indexes => "'indexes'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
            Self::Colon => "':'",
            Self::Dot => "'.'",
            Self::RelOneToOne => "'-'",
            Self::RelOneToMany => "'<'",
            Self::RelManyToOne => "'>'",
            Self::RelManyToMany => "'<>'",
            Self::Identifier => "identifier",
            Self::String => "string",
            Self::Number => "number",
            Self::Newline => "newline",
            Self::Eof => "end of input",
            Self::Unknown => "unknown character",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A lexeme with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            column,
        }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "table" | "Table" | "TABLE" => TokenKind::Table,
        "enum" | "Enum" | "ENUM" => TokenKind::Enum,
        "ref" | "Ref" | "REF" => TokenKind::Ref,
        "tablegroup" | "TableGroup" => TokenKind::TableGroup,
        "as" => TokenKind::As,
        "note" | "Note" => TokenKind::Note,
        "indexes" | "Indexes" => TokenKind::Indexes,
        _ => return None,
    };
    Some(kind)
}

/// Single-pass scanner. Never fails: anything it cannot classify becomes
/// an `Unknown` token and the parser reports it with a position.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Peeks one character past the current lookahead.
    fn peek_second(&self) -> Option<char> {
        let mut rest = self.chars.clone();
        rest.next();
        rest.next()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.chars.peek().copied() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while self.chars.peek().is_some_and(|&c| c != '\n') {
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    self.bump();
                    self.bump();
                    let mut prev = '\0';
                    while let Some(c) = self.bump() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    /// Backslash escapes the next character verbatim; `\n` yields `n`.
    /// An unterminated literal runs to end of input.
    fn read_string(&mut self, quote: char) -> String {
        let mut s = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        s.push(escaped);
                    }
                }
                c if c == quote => break,
                c => s.push(c),
            }
        }
        s
    }

    fn read_number(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let fraction_follows = self.chars.peek() == Some(&'.')
            && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if fraction_follows {
            s.push('.');
            self.bump();
            while let Some(&c) = self.chars.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        s
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let (line, column) = (self.line, self.column);
        let c = match self.bump() {
            Some(c) => c,
            None => return Token::new(TokenKind::Eof, "", line, column),
        };

        let (kind, value) = match c {
            '\n' => (TokenKind::Newline, "\n".to_string()),
            '{' => (TokenKind::LBrace, c.to_string()),
            '}' => (TokenKind::RBrace, c.to_string()),
            '[' => (TokenKind::LBracket, c.to_string()),
            ']' => (TokenKind::RBracket, c.to_string()),
            '(' => (TokenKind::LParen, c.to_string()),
            ')' => (TokenKind::RParen, c.to_string()),
            ',' => (TokenKind::Comma, c.to_string()),
            ':' => (TokenKind::Colon, c.to_string()),
            '.' => (TokenKind::Dot, c.to_string()),
            '-' => (TokenKind::RelOneToOne, c.to_string()),
            '>' => (TokenKind::RelManyToOne, c.to_string()),
            '<' => {
                if self.chars.peek() == Some(&'>') {
                    self.bump();
                    (TokenKind::RelManyToMany, "<>".to_string())
                } else {
                    (TokenKind::RelOneToMany, c.to_string())
                }
            }
            '\'' | '"' | '`' => (TokenKind::String, self.read_string(c)),
            c if c.is_ascii_digit() => (TokenKind::Number, self.read_number(c)),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.read_ident(c);
                (keyword(&ident).unwrap_or(TokenKind::Identifier), ident)
            }
            _ => (TokenKind::Unknown, c.to_string()),
        };

        Token::new(kind, value, line, column)
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }
}

/// Tokenizes DSL source, always ending with an `Eof` token.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
