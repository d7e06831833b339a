//! Runtime value types
//!
//! `Val` is the host-side image of a Lua value: scalars, composites (tables
//! split into an array part and a map part), and an opaque case for values
//! with no data form.

use mlua::{Table, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Nesting depth after which tables are no longer descended into.
pub const MAX_DEPTH: usize = 64;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Nil,
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    Composite(Composite),
    /// Functions, userdata, threads: carried by their `tostring` text.
    Opaque(String),
}

/// A table split into its two regions.
///
/// `array` holds keys `1..=N` where N is the largest k such that every key in
/// `1..=k` is present; every other entry lives in `map`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composite {
    pub array: Vec<Val>,
    pub map: Vec<(Val, Val)>,
}

impl Val {
    pub fn str(s: impl Into<String>) -> Self {
        Val::Str(s.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Val::Nil)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Val::Composite(_))
    }

    /// Integral floats become integers, as Lua does for table keys.
    fn normalized_key(self) -> Val {
        match self {
            Val::Num(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
                Val::Int(n as i64)
            }
            other => other,
        }
    }
}

impl Composite {
    /// Build a composite from arbitrary key/value entries.
    ///
    /// Entries with nil keys or nil values are dropped (Lua tables cannot
    /// hold them). The map part is kept in canonical key order.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Val, Val)>,
    {
        let mut indexed: HashMap<i64, Val> = HashMap::new();
        let mut map = Vec::new();

        for (key, value) in entries {
            if key.is_nil() || value.is_nil() {
                continue;
            }
            match key.normalized_key() {
                Val::Int(i) if i >= 1 => {
                    indexed.insert(i, value);
                }
                other => map.push((other, value)),
            }
        }

        let mut array = Vec::new();
        let mut next = 1i64;
        while let Some(value) = indexed.remove(&next) {
            array.push(value);
            next += 1;
        }
        map.extend(indexed.into_iter().map(|(k, v)| (Val::Int(k), v)));
        map.sort_by(|(a, _), (b, _)| key_order(a, b));

        Composite { array, map }
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.array.len() + self.map.len()
    }
}

impl From<Vec<Val>> for Composite {
    fn from(array: Vec<Val>) -> Self {
        Composite::from_entries(
            array
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Val::Int(i as i64 + 1), v)),
        )
    }
}

/* ===================== Key Ordering ===================== */

/// Canonical map-part order: numbers ascending, then strings, then
/// booleans, then everything else by text.
pub fn key_order(a: &Val, b: &Val) -> Ordering {
    fn rank(v: &Val) -> u8 {
        match v {
            Val::Int(_) | Val::Num(_) => 0,
            Val::Str(_) => 1,
            Val::Bool(_) => 2,
            _ => 3,
        }
    }

    match (a, b) {
        (Val::Int(x), Val::Int(y)) => x.cmp(y),
        (Val::Int(x), Val::Num(y)) => (*x as f64).total_cmp(y),
        (Val::Num(x), Val::Int(y)) => x.total_cmp(&(*y as f64)),
        (Val::Num(x), Val::Num(y)) => x.total_cmp(y),
        (Val::Str(x), Val::Str(y)) => x.cmp(y),
        (Val::Bool(x), Val::Bool(y)) => x.cmp(y),
        (Val::Opaque(x), Val::Opaque(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/* ===================== Conversion From Lua ===================== */

/// Convert a live Lua value into a `Val`.
///
/// Tables nested deeper than [`MAX_DEPTH`] are recorded as opaque, which also
/// bounds self-referential tables.
pub fn from_lua(value: &Value) -> mlua::Result<Val> {
    convert(value, 0)
}

fn convert(value: &Value, depth: usize) -> mlua::Result<Val> {
    Ok(match value {
        Value::Nil => Val::Nil,
        Value::Boolean(b) => Val::Bool(*b),
        Value::Integer(i) => Val::Int(*i),
        Value::Number(n) => Val::Num(*n),
        Value::String(s) => Val::Str(s.to_string_lossy().to_string()),
        Value::Table(t) if depth < MAX_DEPTH => Val::Composite(convert_table(t, depth)?),
        other => Val::Opaque(opaque_text(other)),
    })
}

fn convert_table(table: &Table, depth: usize) -> mlua::Result<Composite> {
    let mut entries = Vec::new();
    for pair in table.clone().pairs::<Value, Value>() {
        let (k, v) = pair?;
        entries.push((convert_key(&k)?, convert(&v, depth + 1)?));
    }
    Ok(Composite::from_entries(entries))
}

/// Keys keep their identity: table keys are never expanded.
fn convert_key(key: &Value) -> mlua::Result<Val> {
    match key {
        Value::Table(_) => Ok(Val::Opaque(opaque_text(key))),
        other => convert(other, 0),
    }
}

/// `typename: 0x...`, matching what Lua's `tostring` shows for reference types.
fn opaque_text(value: &Value) -> String {
    format!("{}: {:p}", value.type_name(), value.to_pointer())
}
