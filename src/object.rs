use std::{collections::HashMap, fmt, fmt::Display, rc::Rc};

use crate::{
    Environment, RuntimeError,
    ast::{BlockStatement, Identifier, write_separated},
};

pub type BuiltinFunction = fn(&[Object]) -> Result<Object, RuntimeError>;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,
    Function(Rc<Function>),
    Builtin(Builtin),
    /// Append-only; `push` builds a new array.
    Array(Rc<Vec<Object>>),
    Hash(Rc<HashMap<HashKey, HashPair>>),
}

/// A closure: parameters and body together with the environment it was created in.
pub struct Function {
    pub params: Rc<[Identifier]>,
    pub body: Rc<BlockStatement>,
    pub env: Environment,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    Integer,
    Boolean,
    String,
}

/// Type-tagged key of a hash entry. Equal iff the source values have the same
/// kind and the same content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: HashKind,
    pub value: u64,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::String(_) => "STRING",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
        }
    }

    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        let (kind, value) = match self {
            Object::Integer(value) => (HashKind::Integer, *value as u64),
            Object::Boolean(value) => (HashKind::Boolean, u64::from(*value)),
            Object::String(value) => (HashKind::String, fnv1a(value.as_bytes())),
            other => {
                return Err(RuntimeError::UnhashableKey {
                    key_type: other.type_name(),
                });
            }
        };
        Ok(HashKey { kind, value })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null) => true,
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            (Object::Array(a), Object::Array(b)) => a == b,
            (Object::Hash(a), Object::Hash(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{n}"),
            Object::String(s) => write!(f, "{s}"),
            Object::Boolean(b) => write!(f, "{b}"),
            Object::Null => write!(f, "NULL"),
            Object::Function(function) => {
                f.write_str("func(")?;
                write_separated(f, function.params.iter())?;
                write!(f, ") {}", function.body)
            }
            Object::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Object::Array(items) => {
                f.write_str("[")?;
                write_separated(f, items.iter())?;
                f.write_str("]")
            }
            Object::Hash(pairs) => {
                f.write_str("{")?;
                write_separated(
                    f,
                    pairs
                        .values()
                        .map(|pair| format!("{}: {}", pair.key, pair.value)),
                )?;
                f.write_str("}")
            }
        }
    }
}

// Closures and the scopes holding them can refer to each other, so neither
// side prints the other.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Builtin").field(&self.name).finish()
    }
}
