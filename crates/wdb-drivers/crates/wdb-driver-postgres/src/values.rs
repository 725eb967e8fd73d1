//! Value conversion between `wdb_core::Value` and tokio-postgres

use bytes::{BufMut, BytesMut};
use postgres_types::{FromSql, IsNull, Kind, ToSql, Type, WrongType};
use tokio_postgres::Row as PgRow;
use wdb_core::Value;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

/// Owned parameter handed to tokio-postgres
#[derive(Debug)]
pub(crate) enum PgValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Numeric(PgNumeric),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    DateTimeUtc(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    DateTime(chrono::NaiveDateTime),
}

fn is_text(ty: &Type) -> bool {
    matches!(*ty, Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME)
}

impl PgValue {
    /// Convert for a prepared parameter of type `target`. Numbers are
    /// written in the encoding of the target type; a value that still does
    /// not fit is rejected when the statement is bound.
    pub(crate) fn for_type(value: &Value, target: &Type) -> Self {
        match value {
            Value::Null => PgValue::Null,
            Value::Bool(v) if is_text(target) => PgValue::String(v.to_string()),
            Value::Bool(v) => PgValue::Bool(*v),
            Value::Int8(v) => Self::int(*v as i64, target),
            Value::Int16(v) => Self::int(*v as i64, target),
            Value::Int32(v) => Self::int(*v as i64, target),
            Value::Int64(v) => Self::int(*v, target),
            Value::UInt64(v) => match i64::try_from(*v) {
                Ok(v) => Self::int(v, target),
                Err(_) => Self::text(v.to_string(), target),
            },
            Value::Float32(v) => Self::float(*v as f64, v.to_string(), target),
            Value::Float64(v) => Self::float(*v, v.to_string(), target),
            Value::String(v) if matches!(*target, Type::JSON | Type::JSONB) => {
                serde_json::from_str(v)
                    .map(PgValue::Json)
                    .unwrap_or_else(|_| PgValue::String(v.clone()))
            }
            Value::Decimal(v) => match *target {
                Type::FLOAT4 | Type::FLOAT8 => v
                    .parse::<f64>()
                    .map(|f| Self::float(f, v.clone(), target))
                    .unwrap_or_else(|_| PgValue::String(v.clone())),
                Type::INT2 | Type::INT4 | Type::INT8 => v
                    .parse::<i64>()
                    .map(|i| Self::int(i, target))
                    .unwrap_or_else(|_| PgValue::String(v.clone())),
                _ => Self::text(v.clone(), target),
            },
            Value::String(v) => Self::text(v.clone(), target),
            Value::Bytes(v) => PgValue::Bytes(v.clone()),
            Value::Uuid(v) if is_text(target) => PgValue::String(v.to_string()),
            Value::Uuid(v) => PgValue::Uuid(*v),
            Value::Json(v) if is_text(target) => PgValue::String(v.to_string()),
            Value::Json(v) => PgValue::Json(v.clone()),
            Value::DateTimeUtc(v) if *target == Type::TIMESTAMP => PgValue::DateTime(v.naive_utc()),
            Value::DateTimeUtc(v) => PgValue::DateTimeUtc(*v),
            Value::Date(v) => PgValue::Date(*v),
            Value::Time(v) => PgValue::Time(*v),
            Value::DateTime(v) if *target == Type::TIMESTAMPTZ => PgValue::DateTimeUtc(v.and_utc()),
            Value::DateTime(v) => PgValue::DateTime(*v),
            Value::Array(_) => PgValue::String(value.to_string()),
        }
    }

    fn int(value: i64, target: &Type) -> Self {
        match *target {
            Type::INT2 => i16::try_from(value)
                .map(PgValue::Int16)
                .unwrap_or(PgValue::Int64(value)),
            Type::INT4 => i32::try_from(value)
                .map(PgValue::Int32)
                .unwrap_or(PgValue::Int64(value)),
            Type::FLOAT4 => PgValue::Float32(value as f32),
            Type::FLOAT8 => PgValue::Float64(value as f64),
            Type::NUMERIC => PgValue::Numeric(PgNumeric(value.to_string())),
            ref ty if is_text(ty) => PgValue::String(value.to_string()),
            _ => PgValue::Int64(value),
        }
    }

    /// `text` is the shortest decimal form of `value`
    fn float(value: f64, text: String, target: &Type) -> Self {
        match *target {
            Type::FLOAT4 => PgValue::Float32(value as f32),
            Type::FLOAT8 => PgValue::Float64(value),
            Type::INT2 | Type::INT4 | Type::INT8
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 =>
            {
                Self::int(value as i64, target)
            }
            Type::NUMERIC if value.is_nan() => PgValue::Numeric(PgNumeric("NaN".into())),
            _ => Self::text(text, target),
        }
    }

    fn text(text: String, target: &Type) -> Self {
        if *target == Type::NUMERIC {
            PgValue::Numeric(PgNumeric(text))
        } else {
            PgValue::String(text)
        }
    }
}

impl ToSql for PgValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            PgValue::Null => Ok(IsNull::Yes),
            PgValue::Bool(v) => v.to_sql_checked(ty, out),
            PgValue::Int16(v) => v.to_sql_checked(ty, out),
            PgValue::Int32(v) => v.to_sql_checked(ty, out),
            PgValue::Int64(v) => v.to_sql_checked(ty, out),
            PgValue::Float32(v) => v.to_sql_checked(ty, out),
            PgValue::Float64(v) => v.to_sql_checked(ty, out),
            PgValue::Numeric(v) => v.to_sql_checked(ty, out),
            // Enum labels travel as their text in binary format too
            PgValue::String(v) if matches!(ty.kind(), Kind::Enum(_)) => {
                out.put_slice(v.as_bytes());
                Ok(IsNull::No)
            }
            PgValue::String(v) => v.to_sql_checked(ty, out),
            PgValue::Bytes(v) => v.to_sql_checked(ty, out),
            PgValue::Uuid(v) => v.to_sql_checked(ty, out),
            PgValue::Json(v) => v.to_sql_checked(ty, out),
            PgValue::DateTimeUtc(v) => v.to_sql_checked(ty, out),
            PgValue::Date(v) => v.to_sql_checked(ty, out),
            PgValue::Time(v) => v.to_sql_checked(ty, out),
            PgValue::DateTime(v) => v.to_sql_checked(ty, out),
        }
    }

    // Each variant checks the concrete type itself
    fn accepts(_: &Type) -> bool {
        true
    }

    postgres_types::to_sql_checked!();
}

/// NUMERIC rendered as its exact decimal text
#[derive(Debug)]
pub(crate) struct PgNumeric(pub(crate) String);

impl PgNumeric {
    /// Decode the binary NUMERIC layout: digit count, weight, sign and
    /// display scale, then base-10000 digit groups.
    pub(crate) fn decode(raw: &[u8]) -> Result<String, BoxError> {
        if raw.len() < 8 {
            return Err("invalid NUMERIC payload: too short".into());
        }
        let word = |offset: usize| u16::from_be_bytes([raw[offset], raw[offset + 1]]);

        let ndigits = word(0) as usize;
        let weight = word(2) as i16 as i32;
        let sign = word(4);
        let dscale = word(6) as usize;

        if sign == NUMERIC_NAN {
            return Ok("NaN".to_string());
        }
        if raw.len() < 8 + ndigits * 2 {
            return Err("invalid NUMERIC payload: truncated digits".into());
        }
        let groups: Vec<u16> = (0..ndigits).map(|i| word(8 + i * 2)).collect();
        let group_at = |index: i32| {
            usize::try_from(index)
                .ok()
                .and_then(|i| groups.get(i).copied())
                .unwrap_or(0)
        };

        let mut integer = String::new();
        for index in 0..=weight {
            if integer.is_empty() {
                integer = group_at(index).to_string();
            } else {
                integer.push_str(&format!("{:04}", group_at(index)));
            }
        }
        if integer.is_empty() {
            integer.push('0');
        }

        let mut fraction = String::new();
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", group_at(index)));
            index += 1;
        }
        fraction.truncate(dscale);

        let mut out = String::new();
        if sign == NUMERIC_NEG {
            out.push('-');
        }
        out.push_str(&integer);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        Ok(out)
    }

    /// Encode decimal text such as `-12.50` or `NaN` in the binary layout,
    /// keeping the number of fraction digits as the display scale.
    pub(crate) fn encode(text: &str, out: &mut BytesMut) -> Result<(), BoxError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("nan") {
            out.put_u16(0);
            out.put_i16(0);
            out.put_u16(NUMERIC_NAN);
            out.put_u16(0);
            return Ok(());
        }

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(format!("invalid NUMERIC value: {:?}", text).into());
        }
        let dscale = u16::try_from(frac_part.len()).map_err(|_| "NUMERIC scale out of range")?;

        // Align both halves on base-10000 group boundaries around the point
        let int_part = int_part.trim_start_matches('0');
        let int_pad = (4 - int_part.len() % 4) % 4;
        let frac_pad = (4 - frac_part.len() % 4) % 4;
        let digits: Vec<u8> = std::iter::repeat_n(b'0', int_pad)
            .chain(int_part.bytes())
            .chain(frac_part.bytes())
            .chain(std::iter::repeat_n(b'0', frac_pad))
            .collect();
        let mut groups: Vec<u16> = digits
            .chunks(4)
            .map(|chunk| chunk.iter().fold(0u16, |acc, d| acc * 10 + (d - b'0') as u16))
            .collect();
        let mut weight = ((int_pad + int_part.len()) / 4) as i64 - 1;

        let leading = groups.iter().take_while(|g| **g == 0).count();
        groups.drain(..leading);
        weight -= leading as i64;
        while groups.last() == Some(&0) {
            groups.pop();
        }
        if groups.is_empty() {
            weight = 0;
        }

        let ndigits = u16::try_from(groups.len()).map_err(|_| "NUMERIC value too long")?;
        let weight = i16::try_from(weight).map_err(|_| "NUMERIC value out of range")?;
        let sign = if negative && !groups.is_empty() {
            NUMERIC_NEG
        } else {
            NUMERIC_POS
        };

        out.put_u16(ndigits);
        out.put_i16(weight);
        out.put_u16(sign);
        out.put_u16(dscale);
        for group in groups {
            out.put_u16(group);
        }
        Ok(())
    }
}

impl ToSql for PgNumeric {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if *ty != Type::NUMERIC {
            return Err(Box::new(WrongType::new::<PgNumeric>(ty.clone())));
        }
        Self::encode(&self.0, out)?;
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }

    postgres_types::to_sql_checked!();
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Self::decode(raw).map(Self)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Raw UTF-8 payload of types without a dedicated mapping (enums, citext)
#[derive(Debug)]
struct PgText(String);

impl<'a> FromSql<'a> for PgText {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(Self(String::from_utf8(raw.to_vec())?))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize) -> Option<T> {
    row.try_get::<_, Option<T>>(idx).ok().flatten()
}

fn array<'a, T: FromSql<'a>>(row: &'a PgRow, idx: usize, f: fn(T) -> Value) -> Option<Value> {
    get::<Vec<T>>(row, idx).map(|items| Value::Array(items.into_iter().map(f).collect()))
}

/// Read column `idx` of a row. Undecodable values come back as NULL.
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Value {
    let ty = row.columns()[idx].type_().clone();
    let value = match ty {
        Type::BOOL => get(row, idx).map(Value::Bool),
        Type::INT2 => get(row, idx).map(Value::Int16),
        Type::INT4 => get(row, idx).map(Value::Int32),
        Type::INT8 => get(row, idx).map(Value::Int64),
        Type::OID => get::<u32>(row, idx).map(|v| Value::Int64(v as i64)),
        Type::FLOAT4 => get(row, idx).map(Value::Float32),
        Type::FLOAT8 => get(row, idx).map(Value::Float64),
        Type::NUMERIC => get::<PgNumeric>(row, idx).map(|n| Value::Decimal(n.0)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get(row, idx).map(Value::String),
        Type::BYTEA => get(row, idx).map(Value::Bytes),
        Type::UUID => get(row, idx).map(Value::Uuid),
        Type::JSON | Type::JSONB => get(row, idx).map(Value::Json),
        Type::DATE => get(row, idx).map(Value::Date),
        Type::TIME => get(row, idx).map(Value::Time),
        Type::TIMESTAMP => get(row, idx).map(Value::DateTime),
        Type::TIMESTAMPTZ => get(row, idx).map(Value::DateTimeUtc),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => array(row, idx, Value::String),
        Type::INT2_ARRAY => array(row, idx, Value::Int16),
        Type::INT4_ARRAY => array(row, idx, Value::Int32),
        Type::INT8_ARRAY => array(row, idx, Value::Int64),
        _ => get::<PgText>(row, idx).map(|text| Value::String(text.0)),
    };
    value.unwrap_or(Value::Null)
}
