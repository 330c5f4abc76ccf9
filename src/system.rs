//! Native functions visible from every scope unless shadowed by a binding.

use std::{
    io::{Write, stdout},
    rc::Rc,
};

use crate::{
    RuntimeError,
    object::{Builtin, Object},
};

const BUILTINS: &[Builtin] = &[
    Builtin { name: "len", func: len },
    Builtin { name: "first", func: first },
    Builtin { name: "last", func: last },
    Builtin { name: "rest", func: rest },
    Builtin { name: "push", func: push },
    Builtin { name: "puts", func: puts },
];

pub fn lookup(name: &str) -> Option<Object> {
    BUILTINS
        .iter()
        .find(|builtin| builtin.name == name)
        .map(|builtin| Object::Builtin(*builtin))
}

fn expect_args<'a, const N: usize>(
    name: &'static str,
    args: &'a [Object],
) -> Result<&'a [Object; N], RuntimeError> {
    args.try_into().map_err(|_| RuntimeError::BuiltinArgumentCount {
        name,
        expected: N,
        got: args.len(),
    })
}

fn expect_array<'a>(
    name: &'static str,
    value: &'a Object,
) -> Result<&'a Rc<Vec<Object>>, RuntimeError> {
    match value {
        Object::Array(items) => Ok(items),
        other => Err(RuntimeError::BuiltinArgumentType {
            name,
            got: other.type_name(),
        }),
    }
}

fn len(args: &[Object]) -> Result<Object, RuntimeError> {
    let [value] = expect_args::<1>("len", args)?;
    let length = match value {
        Object::String(s) => s.len(),
        Object::Array(items) => items.len(),
        Object::Hash(pairs) => pairs.len(),
        other => {
            return Err(RuntimeError::BuiltinArgumentType {
                name: "len",
                got: other.type_name(),
            });
        }
    };
    // a Vec or String never holds more than isize::MAX elements
    Ok(Object::Integer(length as i64))
}

fn first(args: &[Object]) -> Result<Object, RuntimeError> {
    let [value] = expect_args::<1>("first", args)?;
    let items = expect_array("first", value)?;
    Ok(items.first().cloned().unwrap_or(Object::Null))
}

fn last(args: &[Object]) -> Result<Object, RuntimeError> {
    let [value] = expect_args::<1>("last", args)?;
    let items = expect_array("last", value)?;
    Ok(items.last().cloned().unwrap_or(Object::Null))
}

fn rest(args: &[Object]) -> Result<Object, RuntimeError> {
    let [value] = expect_args::<1>("rest", args)?;
    let items = expect_array("rest", value)?;
    Ok(match items.split_first() {
        Some((_, tail)) => Object::Array(Rc::new(tail.to_vec())),
        None => Object::Null,
    })
}

fn push(args: &[Object]) -> Result<Object, RuntimeError> {
    let [array, value] = expect_args::<2>("push", args)?;
    let items = expect_array("push", array)?;
    let mut pushed = Vec::with_capacity(items.len() + 1);
    pushed.extend(items.iter().cloned());
    pushed.push(value.clone());
    Ok(Object::Array(Rc::new(pushed)))
}

fn puts(args: &[Object]) -> Result<Object, RuntimeError> {
    let mut out = stdout().lock();
    for arg in args {
        // write failures are ignored
        let _ = writeln!(out, "{arg}");
    }
    Ok(Object::Null)
}
