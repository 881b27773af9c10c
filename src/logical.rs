//! Logical types layer semantic meaning over a primitive backing encoding:
//! dates, times, timestamps, UUIDs and decimals all ride on top of `int`,
//! `long`, `string`, `bytes` or `fixed` wire representations.
//!
//! Plugins are looked up by a `<backing>-<logicalType>` key in a process-wide
//! registry, mirroring the fingerprint table in `schema::canonical`: a
//! `once_cell::sync::Lazy` built once, read many times.

use crate::error::AvrowErr;
use crate::value::Value;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Identifies a logical type by its backing primitive/fixed constructor and
/// its `logicalType` attribute name, e.g. `"long-timestamp-millis"`.
pub type LogicalKey = &'static str;

/// Extra parameters a logical type needs beyond its backing schema, e.g. a
/// decimal's `(precision, scale)`.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalParams {
    /// No extra parameters beyond the backing schema.
    None,
    /// Parameters carried by the `decimal` logical type.
    Decimal {
        /// Total number of base-10 digits the value can hold.
        precision: usize,
        /// Number of digits to the right of the decimal point.
        scale: usize,
        /// Backing `fixed` size in bytes, when not `bytes`-backed.
        fixed_size: Option<usize>,
    },
}

/// A writer-side conversion from an application-level logical value to its
/// backing primitive representation.
pub type PrepareFn = fn(&Value, &LogicalParams) -> Result<Value, AvrowErr>;
/// A reader-side conversion from a decoded backing primitive to its
/// application-level logical value.
pub type InterpretFn = fn(&Value, &LogicalParams) -> Result<Value, AvrowErr>;

struct Plugin {
    prepare: PrepareFn,
    interpret: InterpretFn,
}

static REGISTRY: Lazy<RwLock<HashMap<&'static str, Plugin>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        "int-date",
        Plugin {
            prepare: prepare_date,
            interpret: interpret_date,
        },
    );
    m.insert(
        "int-time-millis",
        Plugin {
            prepare: prepare_time_millis,
            interpret: interpret_time_millis,
        },
    );
    m.insert(
        "long-time-micros",
        Plugin {
            prepare: prepare_time_micros,
            interpret: interpret_time_micros,
        },
    );
    m.insert(
        "long-timestamp-millis",
        Plugin {
            prepare: prepare_timestamp_millis,
            interpret: interpret_timestamp_millis,
        },
    );
    m.insert(
        "long-timestamp-micros",
        Plugin {
            prepare: prepare_timestamp_micros,
            interpret: interpret_timestamp_micros,
        },
    );
    m.insert(
        "long-local-timestamp-millis",
        Plugin {
            prepare: prepare_local_timestamp_millis,
            interpret: interpret_local_timestamp_millis,
        },
    );
    m.insert(
        "long-local-timestamp-micros",
        Plugin {
            prepare: prepare_local_timestamp_micros,
            interpret: interpret_local_timestamp_micros,
        },
    );
    m.insert(
        "string-uuid",
        Plugin {
            prepare: prepare_uuid,
            interpret: interpret_uuid,
        },
    );
    m.insert(
        "bytes-decimal",
        Plugin {
            prepare: prepare_decimal_bytes,
            interpret: interpret_decimal_bytes,
        },
    );
    m.insert(
        "fixed-decimal",
        Plugin {
            prepare: prepare_decimal_fixed,
            interpret: interpret_decimal_fixed,
        },
    );
    m.insert(
        "fixed-duration",
        Plugin {
            prepare: prepare_duration,
            interpret: interpret_duration,
        },
    );
    RwLock::new(m)
});

/// Registers (or overrides) the writer/reader conversion pair for a logical
/// type key. Unknown keys encountered during encode/decode simply pass the
/// backing value through untouched.
pub fn register(key: &'static str, prepare: PrepareFn, interpret: InterpretFn) {
    REGISTRY
        .write()
        .unwrap()
        .insert(key, Plugin { prepare, interpret });
}

/// Converts an application-level logical value into its backing primitive
/// representation before it is handed to the binary encoder. A no-op (and
/// `Ok`) if `key` is not registered.
pub(crate) fn prepare(key: &str, value: &Value, params: &LogicalParams) -> Result<Value, AvrowErr> {
    match REGISTRY.read().unwrap().get(key) {
        Some(p) => (p.prepare)(value, params),
        None => Ok(value.clone()),
    }
}

/// Converts a decoded backing primitive into its application-level logical
/// value. A no-op (and `Ok`) if `key` is not registered.
pub(crate) fn interpret(
    key: &str,
    value: &Value,
    params: &LogicalParams,
) -> Result<Value, AvrowErr> {
    match REGISTRY.read().unwrap().get(key) {
        Some(p) => (p.interpret)(value, params),
        None => Ok(value.clone()),
    }
}

pub(crate) fn is_registered(key: &str) -> bool {
    REGISTRY.read().unwrap().contains_key(key)
}

const UNIX_EPOCH_DATE: (i32, u32, u32) = (1970, 1, 1);

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd(UNIX_EPOCH_DATE.0, UNIX_EPOCH_DATE.1, UNIX_EPOCH_DATE.2)
}

fn conv_err(logical_type: &str, reason: impl Into<String>) -> AvrowErr {
    AvrowErr::LogicalTypeConversionFailed {
        logical_type: logical_type.to_string(),
        reason: reason.into(),
    }
}

// ---- date (int, days since epoch) ----

fn prepare_date(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Int(_) => Ok(value.clone()),
        Value::Str(s) => {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| conv_err("date", e.to_string()))?;
            let days = (date - epoch_date()).num_days();
            Ok(Value::Int(days as i32))
        }
        other => Err(conv_err("date", format!("unsupported value {:?}", other))),
    }
}

fn interpret_date(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Int(days) => {
            let date = epoch_date() + chrono::Duration::days(*days as i64);
            Ok(Value::Str(date.format("%Y-%m-%d").to_string()))
        }
        other => Err(conv_err("date", format!("expected int, got {:?}", other))),
    }
}

// ---- time-millis (int, millis since midnight) ----

fn prepare_time_millis(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Int(_) => Ok(value.clone()),
        Value::Str(s) => {
            let t = NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|e| conv_err("time-millis", e.to_string()))?;
            let millis = t.num_seconds_from_midnight() as i64 * 1000 + t.nanosecond() as i64 / 1_000_000;
            Ok(Value::Int(millis as i32))
        }
        other => Err(conv_err("time-millis", format!("unsupported value {:?}", other))),
    }
}

fn interpret_time_millis(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Int(millis) => {
            let secs = *millis / 1000;
            let nanos = (*millis % 1000) * 1_000_000;
            let t = NaiveTime::from_num_seconds_from_midnight(secs as u32, nanos as u32);
            Ok(Value::Str(t.format("%H:%M:%S%.3f").to_string()))
        }
        other => Err(conv_err("time-millis", format!("expected int, got {:?}", other))),
    }
}

// ---- time-micros (long, micros since midnight) ----

fn prepare_time_micros(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(_) => Ok(value.clone()),
        Value::Str(s) => {
            let t = NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|e| conv_err("time-micros", e.to_string()))?;
            let micros = t.num_seconds_from_midnight() as i64 * 1_000_000 + t.nanosecond() as i64 / 1000;
            Ok(Value::Long(micros))
        }
        other => Err(conv_err("time-micros", format!("unsupported value {:?}", other))),
    }
}

fn interpret_time_micros(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(micros) => {
            let secs = micros / 1_000_000;
            let nanos = (micros % 1_000_000) * 1000;
            let t = NaiveTime::from_num_seconds_from_midnight(secs as u32, nanos as u32);
            Ok(Value::Str(t.format("%H:%M:%S%.6f").to_string()))
        }
        other => Err(conv_err("time-micros", format!("expected long, got {:?}", other))),
    }
}

// ---- timestamp-millis / micros (long, since UTC epoch) ----

fn prepare_timestamp_millis(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(_) => Ok(value.clone()),
        Value::Str(s) => {
            let dt = chrono::DateTime::parse_from_rfc3339(s)
                .map_err(|e| conv_err("timestamp-millis", e.to_string()))?;
            Ok(Value::Long(dt.timestamp_millis()))
        }
        other => Err(conv_err(
            "timestamp-millis",
            format!("unsupported value {:?}", other),
        )),
    }
}

fn interpret_timestamp_millis(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(millis) => {
            let secs = millis.div_euclid(1000);
            let nanos = millis.rem_euclid(1000) * 1_000_000;
            let dt = Utc.timestamp(secs, nanos as u32);
            Ok(Value::Str(dt.to_rfc3339()))
        }
        other => Err(conv_err(
            "timestamp-millis",
            format!("expected long, got {:?}", other),
        )),
    }
}

fn prepare_timestamp_micros(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(_) => Ok(value.clone()),
        Value::Str(s) => {
            let dt = chrono::DateTime::parse_from_rfc3339(s)
                .map_err(|e| conv_err("timestamp-micros", e.to_string()))?;
            Ok(Value::Long(dt.timestamp_nanos() / 1000))
        }
        other => Err(conv_err(
            "timestamp-micros",
            format!("unsupported value {:?}", other),
        )),
    }
}

fn interpret_timestamp_micros(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(micros) => {
            let secs = micros.div_euclid(1_000_000);
            let nanos = micros.rem_euclid(1_000_000) * 1000;
            let dt = Utc.timestamp(secs, nanos as u32);
            Ok(Value::Str(dt.to_rfc3339()))
        }
        other => Err(conv_err(
            "timestamp-micros",
            format!("expected long, got {:?}", other),
        )),
    }
}

// ---- local-timestamp-millis / micros (long, naive local datetime) ----

fn prepare_local_timestamp_millis(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(_) => Ok(value.clone()),
        Value::Str(s) => {
            let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|e| conv_err("local-timestamp-millis", e.to_string()))?;
            Ok(Value::Long(dt.timestamp_millis()))
        }
        other => Err(conv_err(
            "local-timestamp-millis",
            format!("unsupported value {:?}", other),
        )),
    }
}

fn interpret_local_timestamp_millis(
    value: &Value,
    _params: &LogicalParams,
) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(millis) => {
            let secs = millis.div_euclid(1000);
            let nanos = millis.rem_euclid(1000) * 1_000_000;
            let dt = NaiveDateTime::from_timestamp(secs, nanos as u32);
            Ok(Value::Str(dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()))
        }
        other => Err(conv_err(
            "local-timestamp-millis",
            format!("expected long, got {:?}", other),
        )),
    }
}

fn prepare_local_timestamp_micros(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(_) => Ok(value.clone()),
        Value::Str(s) => {
            let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|e| conv_err("local-timestamp-micros", e.to_string()))?;
            Ok(Value::Long(dt.timestamp_nanos() / 1000))
        }
        other => Err(conv_err(
            "local-timestamp-micros",
            format!("unsupported value {:?}", other),
        )),
    }
}

fn interpret_local_timestamp_micros(
    value: &Value,
    _params: &LogicalParams,
) -> Result<Value, AvrowErr> {
    match value {
        Value::Long(micros) => {
            let secs = micros.div_euclid(1_000_000);
            let nanos = micros.rem_euclid(1_000_000) * 1000;
            let dt = NaiveDateTime::from_timestamp(secs, nanos as u32);
            Ok(Value::Str(dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()))
        }
        other => Err(conv_err(
            "local-timestamp-micros",
            format!("expected long, got {:?}", other),
        )),
    }
}

// ---- uuid (string, canonical textual form) ----

fn prepare_uuid(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Str(s) => {
            Uuid::parse_str(s).map_err(|e| AvrowErr::InvalidUuid(e.to_string()))?;
            Ok(value.clone())
        }
        other => Err(conv_err("uuid", format!("expected string, got {:?}", other))),
    }
}

fn interpret_uuid(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Str(s) => {
            let uuid = Uuid::parse_str(s).map_err(|e| AvrowErr::InvalidUuid(e.to_string()))?;
            Ok(Value::Str(uuid.to_hyphenated().to_string()))
        }
        other => Err(conv_err("uuid", format!("expected string, got {:?}", other))),
    }
}

// ---- decimal (bytes / fixed backing, two's complement unscaled integer) ----

fn decimal_to_unscaled_bytes(d: &Decimal, scale: usize) -> Vec<u8> {
    let mut scaled = *d;
    scaled.rescale(scale as u32);
    let unscaled: i128 = scaled.mantissa();
    let bytes = unscaled.to_be_bytes();
    // strip redundant leading sign-extension bytes, keeping at least one byte.
    let mut start = 0;
    while start < bytes.len() - 1 {
        let b = bytes[start];
        let next_b = bytes[start + 1];
        let is_sign_extension = (b == 0x00 && next_b & 0x80 == 0) || (b == 0xff && next_b & 0x80 != 0);
        if is_sign_extension {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

fn unscaled_bytes_to_decimal(bytes: &[u8], scale: usize) -> Result<Decimal, AvrowErr> {
    if bytes.is_empty() {
        return Err(conv_err("decimal", "empty unscaled value"));
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = [if negative { 0xffu8 } else { 0x00u8 }; 16];
    let start = 16 - bytes.len();
    buf[start..].copy_from_slice(bytes);
    let unscaled = i128::from_be_bytes(buf);
    Ok(Decimal::from_i128_with_scale(unscaled, scale as u32))
}

fn decimal_params(params: &LogicalParams) -> Result<(usize, usize), AvrowErr> {
    match params {
        LogicalParams::Decimal { precision, scale, .. } => Ok((*precision, *scale)),
        _ => Err(conv_err("decimal", "missing precision/scale parameters")),
    }
}

fn decimal_fixed_size(params: &LogicalParams) -> Option<usize> {
    match params {
        LogicalParams::Decimal { fixed_size, .. } => *fixed_size,
        _ => None,
    }
}

fn prepare_decimal_bytes(value: &Value, params: &LogicalParams) -> Result<Value, AvrowErr> {
    let (_precision, scale) = decimal_params(params)?;
    match value {
        Value::Bytes(_) => Ok(value.clone()),
        Value::Str(s) => {
            let d: Decimal = s.parse().map_err(|_| conv_err("decimal", "invalid decimal string"))?;
            Ok(Value::Bytes(decimal_to_unscaled_bytes(&d, scale)))
        }
        other => Err(conv_err("decimal", format!("unsupported value {:?}", other))),
    }
}

fn interpret_decimal_bytes(value: &Value, params: &LogicalParams) -> Result<Value, AvrowErr> {
    let (_precision, scale) = decimal_params(params)?;
    match value {
        Value::Bytes(b) => {
            let d = unscaled_bytes_to_decimal(b, scale)?;
            Ok(Value::Str(d.to_string()))
        }
        other => Err(conv_err("decimal", format!("expected bytes, got {:?}", other))),
    }
}

fn prepare_decimal_fixed(value: &Value, params: &LogicalParams) -> Result<Value, AvrowErr> {
    let (precision, scale) = decimal_params(params)?;
    let size = decimal_fixed_size(params);
    prepare_decimal_fixed_sized(value, precision, scale, size)
}

fn prepare_decimal_fixed_sized(
    value: &Value,
    _precision: usize,
    scale: usize,
    size: Option<usize>,
) -> Result<Value, AvrowErr> {
    match value {
        Value::Fixed(_) => Ok(value.clone()),
        Value::Str(s) => {
            let d: Decimal = s.parse().map_err(|_| conv_err("decimal", "invalid decimal string"))?;
            let mut unscaled = decimal_to_unscaled_bytes(&d, scale);
            if let Some(size) = size {
                if unscaled.len() > size {
                    return Err(AvrowErr::DecimalDoesNotFitFixedSize {
                        size,
                        precision: _precision,
                    });
                }
                let pad = if unscaled[0] & 0x80 != 0 { 0xff } else { 0x00 };
                let mut padded = vec![pad; size - unscaled.len()];
                padded.append(&mut unscaled);
                unscaled = padded;
            }
            Ok(Value::Fixed(unscaled))
        }
        other => Err(conv_err("decimal", format!("unsupported value {:?}", other))),
    }
}

fn interpret_decimal_fixed(value: &Value, params: &LogicalParams) -> Result<Value, AvrowErr> {
    let (_precision, scale) = decimal_params(params)?;
    match value {
        Value::Fixed(b) => {
            let d = unscaled_bytes_to_decimal(b, scale)?;
            Ok(Value::Str(d.to_string()))
        }
        other => Err(conv_err("decimal", format!("expected fixed, got {:?}", other))),
    }
}

// ---- duration (fixed-12, three little-endian u32 counters) ----

fn prepare_duration(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Fixed(_) => Ok(value.clone()),
        Value::Array(parts) if parts.len() == 3 => {
            let mut bytes = Vec::with_capacity(12);
            for part in parts {
                let n = match part {
                    Value::Int(n) => *n as u32,
                    Value::Long(n) => *n as u32,
                    other => {
                        return Err(conv_err("duration", format!("unsupported component {:?}", other)))
                    }
                };
                bytes.extend_from_slice(&n.to_le_bytes());
            }
            Ok(Value::Fixed(bytes))
        }
        other => Err(conv_err(
            "duration",
            format!("expected [months, days, millis], got {:?}", other),
        )),
    }
}

fn interpret_duration(value: &Value, _params: &LogicalParams) -> Result<Value, AvrowErr> {
    match value {
        Value::Fixed(bytes) if bytes.len() == 12 => {
            let months = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
            let days = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
            let millis = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
            Ok(Value::Array(vec![
                Value::Int(months as i32),
                Value::Int(days as i32),
                Value::Int(millis as i32),
            ]))
        }
        other => Err(conv_err("duration", format!("expected fixed-12, got {:?}", other))),
    }
}

/// Validates a `decimal` logical type's parameters against the Avro spec
/// invariants, optionally against a backing `fixed` size.
pub(crate) fn validate_decimal_params(
    precision: usize,
    scale: usize,
    fixed_size: Option<usize>,
) -> Result<(), AvrowErr> {
    if precision == 0 || scale > precision {
        return Err(AvrowErr::InvalidDecimalParams { precision, scale });
    }
    if let Some(size) = fixed_size {
        let max_precision = ((8 * size - 1) as f64 * std::f64::consts::LOG10_2).floor() as usize;
        if precision > max_precision {
            return Err(AvrowErr::DecimalDoesNotFitFixedSize { size, precision });
        }
    }
    Ok(())
}
