use std::num::ParseIntError;
use std::rc::Rc;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::{
    Lexer,
    ast::{
        BlockStatement, Expression, FunctionLiteral, Identifier, InfixOperator, PrefixOperator,
        Program, Statement,
    },
    lex::{LexError, Token, TokenKind},
};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SyntaxError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error("expected next token to be {expected}, got {found} instead")]
    #[diagnostic(code(parse::unexpected_token), help("use `{expected}` here instead"))]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("no prefix parse rule for {found}")]
    #[diagnostic(code(parse::no_prefix_rule), help("an expression cannot start with this token"))]
    NoPrefixRule {
        found: TokenKind,
        #[label("expected an expression")]
        span: SourceSpan,
    },

    #[error("could not parse `{literal}` as integer")]
    #[diagnostic(code(parse::invalid_integer))]
    InvalidInteger {
        literal: String,
        #[label("this numeric literal")]
        span: SourceSpan,
        #[source]
        source: ParseIntError,
    },

    #[error("expression nested deeper than {} levels", MAX_NESTING)]
    #[diagnostic(code(parse::too_deeply_nested))]
    TooDeeplyNested {
        #[label("nesting limit reached here")]
        span: SourceSpan,
    },
}

/// How many expressions may enclose one another before parsing gives up.
pub const MAX_NESTING: usize = 128;

/// Binding strength of an operator token, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Logic,
    Equality,
    Relational,
    Sum,
    Product,
    Prefix,
    Call,
}

#[derive(Debug, Clone, Copy)]
enum InfixRule {
    Binary(InfixOperator),
    Call,
    Index,
}

/// The infix table: which tokens may continue an expression, and how tightly they bind.
fn infix_rule(kind: TokenKind) -> Option<(Precedence, InfixRule)> {
    use InfixOperator as Op;
    let binary = |precedence, operator| Some((precedence, InfixRule::Binary(operator)));
    match kind {
        TokenKind::And => binary(Precedence::Logic, Op::And),
        TokenKind::Or => binary(Precedence::Logic, Op::Or),
        TokenKind::EqualEqual => binary(Precedence::Equality, Op::EqualEqual),
        TokenKind::BangEqual => binary(Precedence::Equality, Op::BangEqual),
        TokenKind::Less => binary(Precedence::Relational, Op::Less),
        TokenKind::Greater => binary(Precedence::Relational, Op::Greater),
        TokenKind::LessEqual => binary(Precedence::Relational, Op::LessEqual),
        TokenKind::GreaterEqual => binary(Precedence::Relational, Op::GreaterEqual),
        TokenKind::Plus => binary(Precedence::Sum, Op::Plus),
        TokenKind::Minus => binary(Precedence::Sum, Op::Minus),
        TokenKind::Star => binary(Precedence::Product, Op::Star),
        TokenKind::Slash => binary(Precedence::Product, Op::Slash),
        TokenKind::LeftParen => Some((Precedence::Call, InfixRule::Call)),
        TokenKind::LeftBracket => Some((Precedence::Call, InfixRule::Index)),
        _ => None,
    }
}

/// Parses a whole source text, returning the program together with every syntax
/// error found. The program must not be evaluated unless the error list is empty.
pub fn parse(source: &str) -> (Program, Vec<SyntaxError>) {
    Parser::new(source).parse_program()
}

pub struct Parser<'de> {
    lexer: Lexer<'de>,
    current: Token<'de>,
    peek: Token<'de>,
    errors: Vec<SyntaxError>,
    depth: usize,
}

impl<'de> Parser<'de> {
    pub fn new(source: &'de str) -> Self {
        let lexer = Lexer::new(source);
        let eof = lexer.eof();
        let mut parser = Parser {
            lexer,
            current: eof,
            peek: eof,
            errors: Vec::new(),
            depth: 0,
        };
        parser.advance();
        parser.advance();
        parser
    }

    pub fn parse_program(mut self) -> (Program, Vec<SyntaxError>) {
        let mut program = Program::default();

        while self.current.kind != TokenKind::Eof {
            match self.parse_statement() {
                Some(statement) => program.statements.push(statement),
                None => self.synchronize(),
            }
            self.advance();
        }

        tracing::debug!(
            statements = program.statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        (program, self.errors)
    }

    fn advance(&mut self) {
        self.current = self.peek;
        self.peek = loop {
            match self.lexer.next() {
                Some(Ok(token)) => break token,
                Some(Err(e)) => self.errors.push(e.into()),
                None => break self.lexer.eof(),
            }
        };
    }

    /// Skips the rest of a broken statement so the next one starts cleanly.
    /// Never steps over a `}`: it stops on one, or just before one.
    fn synchronize(&mut self) {
        while !matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) && !matches!(self.peek.kind, TokenKind::RightBrace | TokenKind::Eof)
        {
            self.advance();
        }
    }

    fn expect_peek(&mut self, expected: TokenKind) -> Option<()> {
        if self.peek.kind == expected {
            self.advance();
            Some(())
        } else {
            self.errors.push(SyntaxError::UnexpectedToken {
                expected,
                found: self.peek.kind,
                span: self.peek.span,
            });
            None
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek.kind == TokenKind::Semicolon {
            self.advance();
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Var => self.parse_var_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_var_statement(&mut self) -> Option<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier(self.current.literal.to_string());

        self.expect_peek(TokenKind::Equal)?;
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement::Var { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.advance();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement::Expression(expression))
    }

    pub fn parse_expression(&mut self, min: Precedence) -> Option<Expression> {
        if self.depth == MAX_NESTING {
            self.errors.push(SyntaxError::TooDeeplyNested {
                span: self.current.span,
            });
            return None;
        }
        self.depth += 1;
        let expression = self.parse_operators(min);
        self.depth -= 1;
        expression
    }

    fn parse_operators(&mut self, min: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while let Some((precedence, rule)) = infix_rule(self.peek.kind) {
            if precedence <= min {
                break;
            }
            self.advance();
            left = match rule {
                InfixRule::Binary(operator) => self.parse_infix(operator, precedence, left)?,
                InfixRule::Call => self.parse_call(left)?,
                InfixRule::Index => self.parse_index(left)?,
            };
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let token = self.current;
        match token.kind {
            TokenKind::Ident => Some(Expression::Identifier(Identifier(token.literal.to_string()))),
            TokenKind::Int => match token.literal.parse() {
                Ok(value) => Some(Expression::Integer(value)),
                Err(source) => {
                    self.errors.push(SyntaxError::InvalidInteger {
                        literal: token.literal.to_string(),
                        span: token.span,
                        source,
                    });
                    None
                }
            },
            TokenKind::String => Some(Expression::String(unescape(token.literal))),
            TokenKind::True => Some(Expression::Boolean(true)),
            TokenKind::False => Some(Expression::Boolean(false)),
            TokenKind::Bang => self.parse_prefix_operator(PrefixOperator::Bang),
            TokenKind::Minus => self.parse_prefix_operator(PrefixOperator::Minus),
            TokenKind::Plus => self.parse_prefix_operator(PrefixOperator::Plus),
            TokenKind::LeftParen => self.parse_grouped(),
            TokenKind::If => self.parse_if(),
            TokenKind::Func => self.parse_function(),
            TokenKind::LeftBracket => {
                let items = self.parse_expression_list(TokenKind::RightBracket)?;
                Some(Expression::Array(items))
            }
            TokenKind::LeftBrace => self.parse_hash(),
            found => {
                self.errors.push(SyntaxError::NoPrefixRule {
                    found,
                    span: token.span,
                });
                None
            }
        }
    }

    fn parse_prefix_operator(&mut self, operator: PrefixOperator) -> Option<Expression> {
        self.advance();
        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_infix(
        &mut self,
        operator: InfixOperator,
        precedence: Precedence,
        left: Expression,
    ) -> Option<Expression> {
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self, callee: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;
        Some(Expression::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_index(&mut self, collection: Expression) -> Option<Expression> {
        self.advance();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;
        Some(Expression::Index {
            collection: Box::new(collection),
            index: Box::new(index),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expression> {
        self.advance();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        Some(expression)
    }

    fn parse_if(&mut self) -> Option<Expression> {
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block()?;

        let alternative = if self.peek.kind == TokenKind::Else {
            self.advance();
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function(&mut self) -> Option<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        let params = self.parse_params()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block()?;

        Some(Expression::Function(FunctionLiteral {
            params: params.into(),
            body: Rc::new(body),
        }))
    }

    fn parse_params(&mut self) -> Option<Vec<Identifier>> {
        let mut params = Vec::new();
        if self.peek.kind == TokenKind::RightParen {
            self.advance();
            return Some(params);
        }

        self.expect_peek(TokenKind::Ident)?;
        params.push(Identifier(self.current.literal.to_string()));
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            self.expect_peek(TokenKind::Ident)?;
            params.push(Identifier(self.current.literal.to_string()));
        }

        self.expect_peek(TokenKind::RightParen)?;
        Some(params)
    }

    /// Parses `{ statement* }` starting on the opening brace; leaves `current` on the closing one.
    fn parse_block(&mut self) -> Option<BlockStatement> {
        let mut block = BlockStatement::default();
        self.advance();

        while self.current.kind != TokenKind::RightBrace {
            if self.current.kind == TokenKind::Eof {
                self.errors.push(SyntaxError::UnexpectedToken {
                    expected: TokenKind::RightBrace,
                    found: TokenKind::Eof,
                    span: self.current.span,
                });
                return None;
            }
            match self.parse_statement() {
                Some(statement) => block.statements.push(statement),
                None => {
                    self.synchronize();
                    if self.current.kind == TokenKind::RightBrace {
                        continue;
                    }
                }
            }
            self.advance();
        }

        Some(block)
    }

    /// Comma-separated expressions up to `end`, shared by call arguments and array items.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut items = Vec::new();
        if self.peek.kind == end {
            self.advance();
            return Some(items);
        }

        self.advance();
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.advance();
            self.advance();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Some(items)
    }

    fn parse_hash(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();
        if self.peek.kind == TokenKind::RightBrace {
            self.advance();
            return Some(Expression::Hash(pairs));
        }

        loop {
            self.advance();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek.kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }

        self.expect_peek(TokenKind::RightBrace)?;
        Some(Expression::Hash(pairs))
    }
}

/// Drops each escaping backslash, keeping the character after it.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}
