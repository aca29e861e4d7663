use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::{FromSql, FromSqlOwned, Type};
use tokio_postgres::Column;

use tusker_core::{BoxDynError, Error, Fields, Result, Row, Value};

use crate::type_parsers::TypeParserRegistry;

/// Decodes one wire row into the normalized row model.
///
/// Columns with an installed type parser are decoded through it from their
/// wire text; all other columns go through the default per-OID decoding.
pub(crate) fn decode_row(
    registry: &TypeParserRegistry,
    fields: &Arc<Fields>,
    row: &tokio_postgres::Row,
) -> Result<Row> {
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        values.push(decode_column(registry, row, index, column)?);
    }

    Ok(Row::new(Arc::clone(fields), values))
}

fn decode_column(
    registry: &TypeParserRegistry,
    row: &tokio_postgres::Row,
    index: usize,
    column: &Column,
) -> Result<Value> {
    if let Some(decoder) = registry.get(column.type_().oid()) {
        return match get::<RawText>(row, index, column)? {
            None => Ok(Value::Null),
            Some(RawText(text)) => decoder
                .apply(&text)
                .map_err(|source| Error::Decode { column: column.name().to_owned(), source }),
        };
    }

    default_decode(row, index, column)
}

/// The built-in decoding for OIDs without an installed parser.
///
/// Unrecognized types fall back to their UTF-8 wire text.
fn default_decode(row: &tokio_postgres::Row, index: usize, column: &Column) -> Result<Value> {
    let ty = column.type_();

    let value = if *ty == Type::BOOL {
        get::<bool>(row, index, column)?.map(Value::Bool)
    } else if *ty == Type::CHAR {
        get::<i8>(row, index, column)?.map(Value::from)
    } else if *ty == Type::INT2 {
        get::<i16>(row, index, column)?.map(Value::from)
    } else if *ty == Type::INT4 {
        get::<i32>(row, index, column)?.map(Value::from)
    } else if *ty == Type::INT8 {
        get::<i64>(row, index, column)?.map(Value::from)
    } else if *ty == Type::OID {
        get::<u32>(row, index, column)?.map(Value::from)
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, index, column)?.map(|float| float_value(f64::from(float)))
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, index, column)?.map(float_value)
    } else if *ty == Type::NUMERIC {
        get::<PgNumeric>(row, index, column)?.map(|numeric| Value::String(numeric.0))
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        get::<String>(row, index, column)?.map(Value::String)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get::<Value>(row, index, column)?
    } else if *ty == Type::UUID {
        get::<uuid::Uuid>(row, index, column)?.map(|id| Value::String(id.to_string()))
    } else if *ty == Type::TIMESTAMPTZ {
        get::<DateTime<Utc>>(row, index, column)?
            .map(|timestamp| Value::String(timestamp.to_rfc3339()))
    } else if *ty == Type::TIMESTAMP {
        get::<NaiveDateTime>(row, index, column)?
            .map(|timestamp| Value::String(timestamp.to_string()))
    } else if *ty == Type::DATE {
        get::<NaiveDate>(row, index, column)?.map(|date| Value::String(date.to_string()))
    } else if *ty == Type::TIME {
        get::<NaiveTime>(row, index, column)?.map(|time| Value::String(time.to_string()))
    } else if *ty == Type::BYTEA {
        get::<Vec<u8>>(row, index, column)?.map(|bytes| Value::String(hex_literal(&bytes)))
    } else if *ty == Type::BOOL_ARRAY {
        array(row, index, column, Value::Bool)?
    } else if *ty == Type::INT2_ARRAY {
        array(row, index, column, |int: i16| Value::from(int))?
    } else if *ty == Type::INT4_ARRAY {
        array(row, index, column, |int: i32| Value::from(int))?
    } else if *ty == Type::INT8_ARRAY {
        array(row, index, column, |int: i64| Value::from(int))?
    } else if *ty == Type::FLOAT4_ARRAY {
        array(row, index, column, |float: f32| float_value(f64::from(float)))?
    } else if *ty == Type::FLOAT8_ARRAY {
        array(row, index, column, float_value)?
    } else if *ty == Type::TEXT_ARRAY || *ty == Type::VARCHAR_ARRAY {
        array(row, index, column, Value::String)?
    } else {
        get::<RawText>(row, index, column)?.map(|RawText(text)| Value::String(text))
    };

    Ok(value.unwrap_or(Value::Null))
}

fn get<T: FromSqlOwned>(
    row: &tokio_postgres::Row,
    index: usize,
    column: &Column,
) -> Result<Option<T>> {
    row.try_get(index)
        .map_err(|error| Error::Decode { column: column.name().to_owned(), source: Box::new(error) })
}

fn array<T: FromSqlOwned>(
    row: &tokio_postgres::Row,
    index: usize,
    column: &Column,
    element: impl Fn(T) -> Value,
) -> Result<Option<Value>> {
    Ok(get::<Vec<Option<T>>>(row, index, column)?.map(|items| {
        Value::Array(
            items.into_iter().map(|item| item.map(&element).unwrap_or(Value::Null)).collect(),
        )
    }))
}

fn float_value(float: f64) -> Value {
    // JSON has no NaN or infinities
    serde_json::Number::from_f64(float).map(Value::Number).unwrap_or(Value::Null)
}

fn hex_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");

    for byte in bytes {
        write!(out, "{byte:02x}").ok();
    }

    out
}

/// Captures a value's raw wire bytes as UTF-8 text, for any column type.
pub(crate) struct RawText(pub(crate) String);

impl<'a> FromSql<'a> for RawText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxDynError> {
        Ok(Self(std::str::from_utf8(raw)?.to_owned()))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// The decimal text of a binary-format `numeric` value.
///
/// Rendered to text rather than a JSON number so no precision is lost;
/// callers wanting numbers can install a type parser for `numeric`.
struct PgNumeric(String);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxDynError> {
        numeric_to_string(raw).map(Self)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

const NUMERIC_POSITIVE: u16 = 0x0000;
const NUMERIC_NEGATIVE: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

/// Renders the backend's base-10000 numeric wire format as decimal text.
fn numeric_to_string(raw: &[u8]) -> std::result::Result<String, BoxDynError> {
    let ndigits = read_u16(raw, 0)? as usize;
    let weight = read_u16(raw, 2)? as i16 as i32;
    let sign = read_u16(raw, 4)?;
    let dscale = read_u16(raw, 6)?;

    let mut digits = Vec::with_capacity(ndigits);
    for index in 0..ndigits {
        digits.push(read_u16(raw, 8 + index * 2)? as i32);
    }

    let mut out = String::new();

    match sign {
        NUMERIC_POSITIVE => {}
        NUMERIC_NEGATIVE => out.push('-'),
        NUMERIC_NAN => return Ok("NaN".to_owned()),
        _ => return Err("unknown numeric sign".into()),
    }

    if weight < 0 {
        out.push('0');
    } else {
        for position in 0..=weight {
            let digit = digits.get(position as usize).copied().unwrap_or(0);

            if position == 0 {
                write!(out, "{digit}")?;
            } else {
                write!(out, "{digit:04}")?;
            }
        }
    }

    if dscale > 0 {
        out.push('.');

        for place in 0..i32::from(dscale) {
            let position = weight + 1 + place / 4;
            let group = if position >= 0 {
                digits.get(position as usize).copied().unwrap_or(0)
            } else {
                0
            };
            let digit = (group / 10_i32.pow(3 - (place % 4) as u32)) % 10;

            write!(out, "{digit}")?;
        }
    }

    Ok(out)
}

fn read_u16(raw: &[u8], at: usize) -> std::result::Result<u16, BoxDynError> {
    raw.get(at..at + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
        .ok_or_else(|| "malformed numeric value".into())
}
