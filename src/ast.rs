//! Syntax tree produced by [`crate::parse`] and walked by [`crate::eval`].
//!
//! Every node prints in a canonical form that parses back to the same tree.
//! Prefix, infix and index expressions are fully parenthesised so precedence
//! is explicit in the printed text.

use std::fmt::{self, Display};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `var name = value;`
    Var { name: Identifier, value: Expression },
    Return(Expression),
    Expression(Expression),
}

/// Body of an `if` branch or a function literal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Integer(i64),
    String(String),
    Boolean(bool),
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function(FunctionLiteral),
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        collection: Box<Expression>,
        index: Box<Expression>,
    },
    /// Key/value pairs in source order.
    Hash(Vec<(Expression, Expression)>),
}

/// Parameters and body are shared with every closure created from this literal,
/// so a function value outlives the program text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub params: Rc<[Identifier]>,
    pub body: Rc<BlockStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Bang,
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    And,
    Or,
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOperator::Bang => "!",
            PrefixOperator::Minus => "-",
            PrefixOperator::Plus => "+",
        })
    }
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Star => "*",
            InfixOperator::Slash => "/",
            InfixOperator::Less => "<",
            InfixOperator::Greater => ">",
            InfixOperator::LessEqual => "<=",
            InfixOperator::GreaterEqual => ">=",
            InfixOperator::EqualEqual => "==",
            InfixOperator::BangEqual => "!=",
            InfixOperator::And => "&&",
            InfixOperator::Or => "||",
        })
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Var { name, value } => write!(f, "var {name} = {value};"),
            Statement::Return(value) => write!(f, "return {value};"),
            Statement::Expression(expression) => write!(f, "{expression};"),
        }
    }
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for statement in &self.statements {
            write!(f, "{statement} ")?;
        }
        f.write_str("}")
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("func(")?;
        write_separated(f, self.params.iter())?;
        write!(f, ") {}", self.body)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(identifier) => write!(f, "{identifier}"),
            Expression::Integer(value) => write!(f, "{value}"),
            Expression::String(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Expression::Boolean(value) => write!(f, "{value}"),
            Expression::Prefix { operator, operand } => write!(f, "({operator}{operand})"),
            Expression::Infix {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {condition} {consequence}")?;
                if let Some(alternative) = alternative {
                    write!(f, " else {alternative}")?;
                }
                Ok(())
            }
            Expression::Function(function) => write!(f, "{function}"),
            Expression::Call { callee, arguments } => {
                write!(f, "{callee}(")?;
                write_separated(f, arguments.iter())?;
                f.write_str(")")
            }
            Expression::Array(items) => {
                f.write_str("[")?;
                write_separated(f, items.iter())?;
                f.write_str("]")
            }
            Expression::Index { collection, index } => write!(f, "({collection}[{index}])"),
            Expression::Hash(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

pub(crate) fn write_separated<T: Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
