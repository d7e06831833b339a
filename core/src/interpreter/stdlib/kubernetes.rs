//! Kubernetes manifest helpers
//!
//! Pure helpers for resource quantities and object metadata. Nothing here
//! talks to a cluster.

use super::time::parse_timestamp;
use super::ModuleError;
use mlua::{Lua, Table, Value};

pub fn load(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "parse_cpu",
        lua.create_function(|_, quantity: String| Ok(parse_cpu(&quantity)?))?,
    )?;
    module.set(
        "parse_memory",
        lua.create_function(|_, quantity: String| Ok(parse_memory(&quantity)?))?,
    )?;
    module.set(
        "parse_time",
        lua.create_function(|_, text: String| Ok(parse_timestamp(&text, None)?))?,
    )?;
    module.set(
        "ensure_metadata",
        lua.create_function(|lua, obj: Table| {
            ensure_metadata(lua, &obj)?;
            Ok(obj)
        })?,
    )?;
    module.set(
        "add_labels",
        lua.create_function(|lua, (obj, labels): (Table, Table)| {
            merge_into(lua, &obj, "labels", &labels)?;
            Ok(obj)
        })?,
    )?;
    module.set(
        "add_annotations",
        lua.create_function(|lua, (obj, annotations): (Table, Table)| {
            merge_into(lua, &obj, "annotations", &annotations)?;
            Ok(obj)
        })?,
    )?;
    module.set(
        "has_label",
        lua.create_function(|_, (obj, key): (Table, String)| {
            let Value::Table(metadata) = obj.get::<Value>("metadata")? else {
                return Ok(false);
            };
            let Value::Table(labels) = metadata.get::<Value>("labels")? else {
                return Ok(false);
            };
            Ok(!labels.get::<Value>(key)?.is_nil())
        })?,
    )?;

    Ok(module)
}

/* ===================== Metadata ===================== */

/// Make sure `obj.metadata.labels` and `obj.metadata.annotations` exist.
fn ensure_metadata(lua: &Lua, obj: &Table) -> mlua::Result<Table> {
    let metadata = child_table(lua, obj, "metadata")?;
    child_table(lua, &metadata, "labels")?;
    child_table(lua, &metadata, "annotations")?;
    Ok(metadata)
}

fn child_table(lua: &Lua, parent: &Table, key: &str) -> mlua::Result<Table> {
    match parent.get::<Value>(key)? {
        Value::Table(t) => Ok(t),
        _ => {
            let t = lua.create_table()?;
            parent.set(key, t.clone())?;
            Ok(t)
        }
    }
}

fn merge_into(lua: &Lua, obj: &Table, section: &str, entries: &Table) -> mlua::Result<()> {
    let metadata = ensure_metadata(lua, obj)?;
    let target: Table = metadata.get(section)?;
    for pair in entries.clone().pairs::<Value, Value>() {
        let (k, v) = pair?;
        target.set(k, v)?;
    }
    Ok(())
}

/* ===================== Quantities ===================== */

/// CPU quantity in millicores, rounded up (`"250m"` → 250, `"1"` → 1000).
pub fn parse_cpu(quantity: &str) -> Result<i64, ModuleError> {
    let cores = parse_quantity(quantity)?;
    Ok(ceil_units(cores * 1000.0))
}

/// Memory quantity in bytes, rounded up (`"256Mi"` → 268435456).
pub fn parse_memory(quantity: &str) -> Result<i64, ModuleError> {
    Ok(ceil_units(parse_quantity(quantity)?))
}

/// Round up, ignoring float noise below a millionth of a unit.
fn ceil_units(value: f64) -> i64 {
    ((value * 1e6).round() / 1e6).ceil() as i64
}

/// Parse a resource quantity into base units.
///
/// Accepts binary suffixes (`Ki`..`Ei`), decimal suffixes (`n`, `u`, `m`,
/// `k`, `M`..`E`) and decimal exponents (`1e3`).
pub fn parse_quantity(quantity: &str) -> Result<f64, ModuleError> {
    let invalid = || ModuleError::Quantity(quantity.to_string());
    let q = quantity.trim();

    let split = q
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(q.len());
    let (number, suffix) = q.split_at(split);
    let value: f64 = number.parse().map_err(|_| invalid())?;

    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        exp if exp.starts_with(|c| c == 'e' || c == 'E') => {
            let power: i32 = exp[1..].parse().map_err(|_| invalid())?;
            10f64.powi(power)
        }
        _ => return Err(invalid()),
    };

    if value < 0.0 {
        return Err(invalid());
    }
    Ok(value * multiplier)
}
