//! Time helpers working in UTC unix seconds

use super::ModuleError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mlua::{Lua, Table};

pub fn load(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "now",
        lua.create_function(|_, ()| Ok(Utc::now().timestamp_millis() as f64 / 1000.0))?,
    )?;
    module.set(
        "unix",
        lua.create_function(|_, ()| Ok(Utc::now().timestamp()))?,
    )?;
    module.set(
        "format",
        lua.create_function(|_, (ts, layout): (f64, Option<String>)| {
            Ok(format_timestamp(ts, layout.as_deref())?)
        })?,
    )?;
    module.set(
        "parse",
        lua.create_function(|_, (text, layout): (String, Option<String>)| {
            Ok(parse_timestamp(&text, layout.as_deref())?)
        })?,
    )?;

    Ok(module)
}

/// Format unix seconds; RFC 3339 unless a strftime layout is given.
pub fn format_timestamp(ts: f64, layout: Option<&str>) -> Result<String, ModuleError> {
    let secs = ts.floor() as i64;
    let nanos = ((ts - ts.floor()) * 1e9).round().min(999_999_999.0) as u32;
    let dt = DateTime::<Utc>::from_timestamp(secs, nanos)
        .ok_or_else(|| ModuleError::Time(format!("timestamp {ts} out of range")))?;

    match layout {
        None => Ok(dt.to_rfc3339()),
        Some(layout) => {
            let items: Vec<Item> = StrftimeItems::new(layout).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return Err(ModuleError::Time(format!("invalid layout '{layout}'")));
            }
            Ok(dt.format_with_items(items.into_iter()).to_string())
        }
    }
}

/// Parse into unix seconds; RFC 3339 unless a strftime layout is given.
///
/// Layouts without an offset are read as UTC; date-only layouts as midnight.
pub fn parse_timestamp(text: &str, layout: Option<&str>) -> Result<i64, ModuleError> {
    let text = text.trim();
    let Some(layout) = layout else {
        return DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.timestamp())
            .map_err(|e| ModuleError::Time(format!("cannot parse '{text}': {e}")));
    };

    if let Ok(dt) = DateTime::parse_from_str(text, layout) {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
        return Ok(naive.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(text, layout)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp())
        .ok_or_else(|| ModuleError::Time(format!("cannot parse '{text}' with layout '{layout}'")))
}
