//! Exact literal forms for constants.
//!
//! Every form here must survive a round trip through the wire parser
//! unchanged, so formatting is explicit per type rather than delegated to
//! a value's `Display`.

use chrono::{Datelike, NaiveDateTime, Timelike};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::ast::ExpressionType;
use crate::value::Value;

const NANOS_PER_TICK: u32 = 100;

/// Formats `value` as a literal of type `ty`.
///
/// # Panics
///
/// When the value does not inhabit `ty`. Constant construction rejects such
/// pairs, so reaching that arm is a defect.
pub fn format_literal(value: &Value, ty: ExpressionType) -> String {
    match (ty, value) {
        (_, Value::Null) => "null".to_string(),
        (ExpressionType::Boolean, Value::Boolean(b)) => if *b { "true" } else { "false" }.to_string(),
        (ExpressionType::Byte, Value::Byte(b)) => format!("{b:02x}"),
        (ExpressionType::DateTime, Value::DateTime(dt)) => format_datetime(dt),
        (ExpressionType::Decimal, Value::Decimal(d)) => format!("{d}M"),
        (ExpressionType::Double, Value::Double(n)) => format_double(*n),
        (ExpressionType::Guid, Value::Guid(g)) => format!("guid'{g}'"),
        (ExpressionType::Int16, Value::Int16(n)) => n.to_string(),
        (ExpressionType::Int32, Value::Int32(n)) => n.to_string(),
        (ExpressionType::Int64, Value::Int64(n)) => format!("{n}L"),
        (ExpressionType::Single, Value::Single(n)) => format_single(*n),
        (ExpressionType::String, Value::String(s)) => format!("'{}'", s.replace('\'', "''")),
        (ExpressionType::Binary, Value::Binary(bytes)) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
        (ExpressionType::Type, Value::Type(ty)) => ty.to_literal(),
        (ty, value) => unreachable!("unexpected case: {value:?} as literal of type {ty}"),
    }
}

/// `datetime'YYYY-MM-DDTHH:MM[:SS[.fffffff]]'`
///
/// Seconds are written only when the time has a non-zero seconds component,
/// and the fraction only when it has sub-second ticks.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    let mut out = format!(
        "datetime'{:04}-{:02}-{:02}T{:02}:{:02}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute()
    );
    // leap-second nanos run past 1e9
    let ticks = (dt.nanosecond() % 1_000_000_000) / NANOS_PER_TICK;
    if dt.second() > 0 || ticks > 0 {
        out.push_str(&format!(":{:02}", dt.second()));
        if ticks > 0 {
            out.push_str(&format!(".{ticks:07}"));
        }
    }
    out.push('\'');
    out
}

fn format_double(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        n.to_string()
    }
}

fn format_single(n: f32) -> String {
    if n.is_nan() {
        "NaNf".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "INFf" } else { "-INFf" }.to_string()
    } else {
        // one decimal place, midpoints rounded away from zero
        match Decimal::from_f32_retain(n) {
            Some(d) => {
                let rounded = d.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
                format!("{rounded:.1}f")
            }
            // beyond Decimal's range there is no fraction left to round
            None => format!("{n:.1}f"),
        }
    }
}
