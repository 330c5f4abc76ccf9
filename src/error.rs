use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{InfixOperator, PrefixOperator};

/// Every way evaluation can fail. The first error raised stops the program.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("identifier not found: {name}")]
    #[diagnostic(
        code(eval::unknown_identifier),
        help("declare it first with `var {name} = ...;`")
    )]
    UnknownIdentifier { name: String },

    #[error(
        "invalid operation: {left} {operator} {right} (mismatched types {left_type} and {right_type})"
    )]
    #[diagnostic(code(eval::type_mismatch))]
    TypeMismatch {
        left: String,
        operator: InfixOperator,
        right: String,
        left_type: &'static str,
        right_type: &'static str,
    },

    #[error(
        "invalid operation: {operator}{operand} (operator \"{operator}\" not defined on {operand_type})"
    )]
    #[diagnostic(code(eval::unknown_operator))]
    UnknownPrefixOperator {
        operator: PrefixOperator,
        operand: String,
        operand_type: &'static str,
    },

    #[error(
        "invalid operation: {left} {operator} {right} (operator \"{operator}\" not defined on {operand_type})"
    )]
    #[diagnostic(code(eval::unknown_operator))]
    UnknownInfixOperator {
        left: String,
        operator: InfixOperator,
        right: String,
        operand_type: &'static str,
    },

    #[error("non-boolean condition in if expression: {value} ({value_type})")]
    #[diagnostic(
        code(eval::non_boolean_condition),
        help("conditions are never coerced; compare explicitly, e.g. `x != 0`")
    )]
    NonBooleanCondition {
        value: String,
        value_type: &'static str,
    },

    #[error("wrong number of arguments: expected {expected}, got {got}")]
    #[diagnostic(code(eval::arity_mismatch))]
    ArityMismatch { expected: usize, got: usize },

    #[error("not a function: {value} ({value_type})")]
    #[diagnostic(code(eval::not_callable))]
    NotCallable {
        value: String,
        value_type: &'static str,
    },

    #[error("index operator not supported: {collection_type}[{index_type}]")]
    #[diagnostic(code(eval::index_not_supported))]
    IndexNotSupported {
        collection_type: &'static str,
        index_type: &'static str,
    },

    #[error("index out of range [{index}] with length {length}")]
    #[diagnostic(code(eval::index_out_of_range))]
    IndexOutOfRange { index: i64, length: usize },

    #[error("unusable as hash key: {key_type}")]
    #[diagnostic(
        code(eval::unhashable_key),
        help("only INTEGER, BOOLEAN and STRING values can be hash keys")
    )]
    UnhashableKey { key_type: &'static str },

    #[error("key not found in hash: {key}")]
    #[diagnostic(code(eval::missing_key))]
    MissingKey { key: String },

    #[error("`{name}` is already defined in this scope")]
    #[diagnostic(code(eval::already_defined))]
    AlreadyDefined { name: String },

    #[error("integer division by zero: {left} / 0")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero { left: i64 },

    #[error("integer overflow: {expression}")]
    #[diagnostic(code(eval::integer_overflow))]
    IntegerOverflow { expression: String },

    #[error("wrong number of arguments to `{name}`: expected {expected}, got {got}")]
    #[diagnostic(code(eval::builtin_arity))]
    BuiltinArgumentCount {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("argument to `{name}` not supported, got {got}")]
    #[diagnostic(code(eval::builtin_argument))]
    BuiltinArgumentType { name: &'static str, got: &'static str },
}
