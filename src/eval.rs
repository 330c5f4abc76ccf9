use std::{collections::HashMap, rc::Rc};

use crate::{
    Environment, RuntimeError,
    ast::{
        BlockStatement, Expression, FunctionLiteral, InfixOperator, PrefixOperator, Program,
        Statement,
    },
    object::{Function, HashPair, Object},
    system,
};

/// Why evaluation stopped early. `Return` is caught at the nearest function call
/// (or program) boundary; `Error` travels all the way out.
enum Unwind {
    Return(Object),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

type Flow = Result<Object, Unwind>;

/// Owns the global scope, so bindings persist from one program to the next.
#[derive(Debug, Default)]
pub struct Interpreter {
    environment: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn eval(&self, program: &Program) -> Result<Object, RuntimeError> {
        eval(program, &self.environment)
    }
}

/// Runs every statement in order. The result is the value of the last statement,
/// or the value of the first top-level `return`.
pub fn eval(program: &Program, env: &Environment) -> Result<Object, RuntimeError> {
    let mut result = Object::Null;
    for statement in &program.statements {
        match eval_statement(statement, env) {
            Ok(value) => result = value,
            Err(Unwind::Return(value)) => return Ok(value),
            Err(Unwind::Error(error)) => {
                tracing::debug!(%error, "evaluation failed");
                return Err(error);
            }
        }
    }
    Ok(result)
}

fn eval_statement(statement: &Statement, env: &Environment) -> Flow {
    match statement {
        Statement::Var { name, value } => {
            let value = eval_expression(value, env)?;
            env.define(&name.0, value)?;
            Ok(Object::Null)
        }
        Statement::Return(value) => Err(Unwind::Return(eval_expression(value, env)?)),
        Statement::Expression(expression) => eval_expression(expression, env),
    }
}

fn eval_block(block: &BlockStatement, env: &Environment) -> Flow {
    let mut result = Object::Null;
    for statement in &block.statements {
        result = eval_statement(statement, env)?;
    }
    Ok(result)
}

fn eval_expression(expression: &Expression, env: &Environment) -> Flow {
    Ok(match expression {
        Expression::Identifier(identifier) => env
            .get(&identifier.0)
            .or_else(|| system::lookup(&identifier.0))
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: identifier.0.clone(),
            })?,
        Expression::Integer(value) => Object::Integer(*value),
        Expression::String(value) => Object::String(value.clone()),
        Expression::Boolean(value) => Object::Boolean(*value),
        Expression::Prefix { operator, operand } => {
            let operand = eval_expression(operand, env)?;
            eval_prefix(*operator, operand)?
        }
        Expression::Infix {
            operator,
            left,
            right,
        } => {
            let left = eval_expression(left, env)?;
            let right = eval_expression(right, env)?;
            eval_infix(*operator, left, right)?
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => match eval_expression(condition, env)? {
            Object::Boolean(true) => eval_block(consequence, env)?,
            Object::Boolean(false) => match alternative {
                Some(alternative) => eval_block(alternative, env)?,
                None => Object::Null,
            },
            other => {
                return Err(RuntimeError::NonBooleanCondition {
                    value: other.to_string(),
                    value_type: other.type_name(),
                }
                .into());
            }
        },
        Expression::Function(FunctionLiteral { params, body }) => {
            Object::Function(Rc::new(Function {
                params: Rc::clone(params),
                body: Rc::clone(body),
                env: env.clone(),
            }))
        }
        Expression::Call { callee, arguments } => {
            match eval_expression(callee, env)? {
                Object::Builtin(builtin) => {
                    let args = eval_expressions(arguments, env)?;
                    (builtin.func)(&args)?
                }
                Object::Function(function) => {
                    if function.params.len() != arguments.len() {
                        return Err(RuntimeError::ArityMismatch {
                            expected: function.params.len(),
                            got: arguments.len(),
                        }
                        .into());
                    }
                    let args = eval_expressions(arguments, env)?;
                    call_function(&function, args)?
                }
                other => {
                    return Err(RuntimeError::NotCallable {
                        value: other.to_string(),
                        value_type: other.type_name(),
                    }
                    .into());
                }
            }
        }
        Expression::Array(items) => Object::Array(Rc::new(eval_expressions(items, env)?)),
        Expression::Index { collection, index } => {
            let collection = eval_expression(collection, env)?;
            let index = eval_expression(index, env)?;
            eval_index(&collection, &index)?
        }
        Expression::Hash(pairs) => {
            let mut entries = HashMap::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = eval_expression(key, env)?;
                let hash_key = key.hash_key()?;
                let value = eval_expression(value, env)?;
                entries.insert(hash_key, HashPair { key, value });
            }
            Object::Hash(Rc::new(entries))
        }
    })
}

/// Evaluates left to right, stopping at the first failure.
fn eval_expressions(
    expressions: &[Expression],
    env: &Environment,
) -> Result<Vec<Object>, Unwind> {
    expressions
        .iter()
        .map(|expression| eval_expression(expression, env))
        .collect()
}

#[tracing::instrument(level = "trace", skip_all, fields(arity = function.params.len()))]
fn call_function(function: &Function, args: Vec<Object>) -> Result<Object, RuntimeError> {
    let call_env = Environment::enclosed(&function.env);
    for (param, arg) in function.params.iter().zip(args) {
        call_env.define(&param.0, arg)?;
    }

    match eval_block(&function.body, &call_env) {
        Ok(_) => Ok(Object::Null),
        Err(Unwind::Return(value)) => Ok(value),
        Err(Unwind::Error(error)) => Err(error),
    }
}

fn eval_prefix(operator: PrefixOperator, operand: Object) -> Result<Object, RuntimeError> {
    match (operator, &operand) {
        (PrefixOperator::Bang, Object::Boolean(value)) => Ok(Object::Boolean(!value)),
        (PrefixOperator::Bang, Object::Null) => Ok(Object::Boolean(true)),
        (PrefixOperator::Minus, Object::Integer(value)) => value
            .checked_neg()
            .map(Object::Integer)
            .ok_or_else(|| RuntimeError::IntegerOverflow {
                expression: format!("-{value}"),
            }),
        (PrefixOperator::Plus, Object::Integer(value)) => Ok(Object::Integer(*value)),
        _ => Err(RuntimeError::UnknownPrefixOperator {
            operator,
            operand: operand.to_string(),
            operand_type: operand.type_name(),
        }),
    }
}

fn eval_infix(
    operator: InfixOperator,
    left: Object,
    right: Object,
) -> Result<Object, RuntimeError> {
    let unknown_operator = |left: &Object, right: &Object| RuntimeError::UnknownInfixOperator {
        left: left.to_string(),
        operator,
        right: right.to_string(),
        operand_type: left.type_name(),
    };

    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r)
            .ok_or_else(|| unknown_operator(&left, &right))?,
        (Object::Boolean(l), Object::Boolean(r)) => eval_boolean_infix(operator, *l, *r)
            .ok_or_else(|| unknown_operator(&left, &right)),
        (Object::String(l), Object::String(r)) if operator == InfixOperator::Plus => {
            Ok(Object::String(format!("{l}{r}")))
        }
        _ if left.type_name() != right.type_name() => Err(RuntimeError::TypeMismatch {
            left: left.to_string(),
            operator,
            right: right.to_string(),
            left_type: left.type_name(),
            right_type: right.type_name(),
        }),
        _ => Err(unknown_operator(&left, &right)),
    }
}

/// `None` when the operator does not apply to integers.
fn eval_integer_infix(
    operator: InfixOperator,
    l: i64,
    r: i64,
) -> Option<Result<Object, RuntimeError>> {
    let overflow = || RuntimeError::IntegerOverflow {
        expression: format!("{l} {operator} {r}"),
    };
    let arithmetic = |value: Option<i64>| Some(value.map(Object::Integer).ok_or_else(overflow));

    match operator {
        InfixOperator::Plus => arithmetic(l.checked_add(r)),
        InfixOperator::Minus => arithmetic(l.checked_sub(r)),
        InfixOperator::Star => arithmetic(l.checked_mul(r)),
        InfixOperator::Slash if r == 0 => Some(Err(RuntimeError::DivisionByZero { left: l })),
        // truncates toward zero
        InfixOperator::Slash => arithmetic(l.checked_div(r)),
        InfixOperator::Less => Some(Ok(Object::Boolean(l < r))),
        InfixOperator::Greater => Some(Ok(Object::Boolean(l > r))),
        InfixOperator::LessEqual => Some(Ok(Object::Boolean(l <= r))),
        InfixOperator::GreaterEqual => Some(Ok(Object::Boolean(l >= r))),
        InfixOperator::EqualEqual => Some(Ok(Object::Boolean(l == r))),
        InfixOperator::BangEqual => Some(Ok(Object::Boolean(l != r))),
        InfixOperator::And | InfixOperator::Or => None,
    }
}

fn eval_boolean_infix(operator: InfixOperator, l: bool, r: bool) -> Option<Object> {
    let value = match operator {
        InfixOperator::And => l && r,
        InfixOperator::Or => l || r,
        InfixOperator::EqualEqual => l == r,
        InfixOperator::BangEqual => l != r,
        _ => return None,
    };
    Some(Object::Boolean(value))
}

fn eval_index(collection: &Object, index: &Object) -> Result<Object, RuntimeError> {
    match (collection, index) {
        (Object::Array(items), Object::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|position| items.get(position))
            .cloned()
            .ok_or(RuntimeError::IndexOutOfRange {
                index: *i,
                length: items.len(),
            }),
        (Object::Hash(pairs), key) => pairs
            .get(&key.hash_key()?)
            .map(|pair| pair.value.clone())
            .ok_or_else(|| RuntimeError::MissingKey {
                key: key.to_string(),
            }),
        _ => Err(RuntimeError::IndexNotSupported {
            collection_type: collection.type_name(),
            index_type: index.type_name(),
        }),
    }
}
