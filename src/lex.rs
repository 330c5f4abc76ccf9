use std::fmt::Display;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("Unexpected character '{token}'")]
#[diagnostic(code(lex::unexpected_character), help("remove or correct the character: `{token}`"))]
pub struct SingleTokenError {
    #[label("this character")]
    pub bad_bit: SourceSpan,

    pub token: char,
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("unterminated double quote string")]
#[diagnostic(code(lex::unterminated_string))]
pub struct StringTerminationError {
    #[label("missing trailing `\"` to terminate the string literal")]
    pub bad_line: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    /// Source text of the token. For strings this is the raw text between the quotes.
    pub literal: &'de str,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Minus,
    Plus,
    Star,
    Slash,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,
    String,
    Ident,
    Int,
    Var,
    Func,
    Return,
    If,
    Else,
    True,
    False,
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::LeftBracket => "LEFT_BRACKET",
            TokenKind::RightBracket => "RIGHT_BRACKET",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Colon => "COLON",
            TokenKind::Minus => "MINUS",
            TokenKind::Plus => "PLUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Bang => "BANG",
            TokenKind::BangEqual => "BANG_EQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::EqualEqual => "EQUAL_EQUAL",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::String => "STRING",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Int => "INT",
            TokenKind::Var => "VAR",
            TokenKind::Func => "FUNC",
            TokenKind::Return => "RETURN",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::String => write!(f, "STRING \"{lit}\""),
            TokenKind::Eof => write!(f, "EOF"),
            kind => write!(f, "{kind} {lit}"),
        }
    }
}

/// Errors the lexer can hand to the parser.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum LexError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    SingleToken(#[from] SingleTokenError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    StringTermination(#[from] StringTerminationError),
}

pub struct Lexer<'de> {
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            whole: input,
            rest: input,
            byte: 0,
        }
    }

    /// The `EOF` token, positioned at the end of the input.
    pub fn eof(&self) -> Token<'de> {
        Token {
            kind: TokenKind::Eof,
            literal: "",
            span: SourceSpan::from(self.whole.len()..self.whole.len()),
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let literal = &self.rest[..c.len_utf8()];
            let cur = self.rest;
            let start = self.byte;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            enum Start {
                String,
                Slash,
                Ident,
                Number,
                IfEqualElse(TokenKind, TokenKind),
                Doubled(TokenKind),
            }

            let process = |kind: TokenKind| {
                Some(Ok(Token {
                    kind,
                    literal,
                    span: SourceSpan::from(start..start + literal.len()),
                }))
            };

            let started = match c {
                '(' => return process(TokenKind::LeftParen),
                ')' => return process(TokenKind::RightParen),
                '{' => return process(TokenKind::LeftBrace),
                '}' => return process(TokenKind::RightBrace),
                '[' => return process(TokenKind::LeftBracket),
                ']' => return process(TokenKind::RightBracket),
                ',' => return process(TokenKind::Comma),
                ';' => return process(TokenKind::Semicolon),
                ':' => return process(TokenKind::Colon),
                '-' => return process(TokenKind::Minus),
                '+' => return process(TokenKind::Plus),
                '*' => return process(TokenKind::Star),
                '/' => Start::Slash,
                '!' => Start::IfEqualElse(TokenKind::BangEqual, TokenKind::Bang),
                '=' => Start::IfEqualElse(TokenKind::EqualEqual, TokenKind::Equal),
                '>' => Start::IfEqualElse(TokenKind::GreaterEqual, TokenKind::Greater),
                '<' => Start::IfEqualElse(TokenKind::LessEqual, TokenKind::Less),
                '&' => Start::Doubled(TokenKind::And),
                '|' => Start::Doubled(TokenKind::Or),
                'a'..='z' | 'A'..='Z' | '_' => Start::Ident,
                '0'..='9' => Start::Number,
                '"' => Start::String,
                c if c.is_whitespace() => continue,
                c => {
                    return Some(Err(SingleTokenError {
                        bad_bit: SourceSpan::from(start..self.byte),
                        token: c,
                    }
                    .into()));
                }
            };

            match started {
                Start::String => {
                    // a backslash always swallows the character after it
                    let mut escaped = false;
                    let end = self.rest.char_indices().find_map(|(i, ch)| {
                        if escaped {
                            escaped = false;
                            None
                        } else if ch == '\\' {
                            escaped = true;
                            None
                        } else if ch == '"' {
                            Some(i)
                        } else {
                            None
                        }
                    });

                    let Some(end) = end else {
                        self.byte += self.rest.len();
                        self.rest = "";
                        return Some(Err(StringTerminationError {
                            bad_line: SourceSpan::from(start..self.whole.len()),
                        }
                        .into()));
                    };

                    let literal = &self.rest[..end];
                    self.byte += end + 1;
                    self.rest = &self.rest[end + 1..];
                    return Some(Ok(Token {
                        kind: TokenKind::String,
                        literal,
                        span: SourceSpan::from(start..self.byte),
                    }));
                }
                Start::Slash => {
                    if self.rest.starts_with('/') {
                        let new_line = self.rest.find('\n').unwrap_or(self.rest.len());
                        self.byte += new_line;
                        self.rest = &self.rest[new_line..];
                        continue;
                    }
                    return process(TokenKind::Slash);
                }
                Start::Ident => {
                    let first_non_ident = cur
                        .find(|c| !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_'))
                        .unwrap_or(cur.len());

                    let literal = &cur[..first_non_ident];

                    let extra_bytes = literal.len() - c.len_utf8();
                    self.byte += extra_bytes;
                    self.rest = &self.rest[extra_bytes..];

                    let kind = match literal {
                        "var" => TokenKind::Var,
                        "func" => TokenKind::Func,
                        "return" => TokenKind::Return,
                        "if" => TokenKind::If,
                        "else" => TokenKind::Else,
                        "true" => TokenKind::True,
                        "false" => TokenKind::False,
                        _ => TokenKind::Ident,
                    };

                    return Some(Ok(Token {
                        kind,
                        literal,
                        span: SourceSpan::from(start..self.byte),
                    }));
                }
                Start::Number => {
                    let first_non_digit = cur
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(cur.len());

                    let literal = &cur[..first_non_digit];

                    let extra_bytes = literal.len() - c.len_utf8();
                    self.byte += extra_bytes;
                    self.rest = &self.rest[extra_bytes..];

                    return Some(Ok(Token {
                        kind: TokenKind::Int,
                        literal,
                        span: SourceSpan::from(start..self.byte),
                    }));
                }
                Start::IfEqualElse(yes, no) => {
                    if self.rest.starts_with('=') {
                        let literal = &cur[..c.len_utf8() + 1];
                        self.rest = &self.rest[1..];
                        self.byte += 1;
                        return Some(Ok(Token {
                            kind: yes,
                            literal,
                            span: SourceSpan::from(start..self.byte),
                        }));
                    }
                    return process(no);
                }
                Start::Doubled(kind) => {
                    if self.rest.starts_with(c) {
                        let literal = &cur[..2];
                        self.rest = &self.rest[1..];
                        self.byte += 1;
                        return Some(Ok(Token {
                            kind,
                            literal,
                            span: SourceSpan::from(start..self.byte),
                        }));
                    }
                    return Some(Err(SingleTokenError {
                        bad_bit: SourceSpan::from(start..self.byte),
                        token: c,
                    }
                    .into()));
                }
            }
        }
    }
}
