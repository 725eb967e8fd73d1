//! Decoding rows and values into Rust types
//!
//! `FromValue` converts a single column value, `FromRow` converts a whole row.
//! Structs implement `FromRow` by hand with [`Row::try_get`]:
//!
//! ```
//! use wdb_core::{FromRow, Result, Row, Value};
//!
//! struct Post {
//!     id: i64,
//!     title: String,
//! }
//!
//! impl FromRow for Post {
//!     fn from_row(row: &Row) -> Result<Self> {
//!         Ok(Self {
//!             id: row.try_get("id")?,
//!             title: row.try_get("title")?,
//!         })
//!     }
//! }
//!
//! let row = Row::new(
//!     vec!["id".to_string(), "title".to_string()],
//!     vec![Value::Int64(1), Value::String("one".into())],
//! );
//! let post = Post::from_row(&row).unwrap();
//! assert_eq!(post.id, 1);
//! assert_eq!(post.title, "one");
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{Result, Row, Value, WdbError};

/// Conversion from a single SQL value
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

/// Conversion from a whole result row
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

fn mismatch<T>(value: &Value, target: &str) -> Result<T> {
    Err(WdbError::Decode(format!(
        "cannot decode {} value into {}",
        value.type_name(),
        target
    )))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    let wide: Option<i128> = match value {
                        Value::UInt64(v) => Some(*v as i128),
                        other => other.as_i64().map(|v| v as i128),
                    };
                    match wide {
                        Some(v) => <$ty>::try_from(v).map_err(|_| {
                            WdbError::Decode(format!(
                                "{} out of range for {}",
                                v,
                                stringify!($ty)
                            ))
                        }),
                        None => mismatch(value, stringify!($ty)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().map_or_else(|| mismatch(value, "f64"), Ok)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float32(v) => Ok(*v),
            other => other
                .as_f64()
                .map_or_else(|| mismatch(value, "f32"), |v| Ok(v as f32)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int16(v) => Ok(*v != 0),
            Value::Int32(v) => Ok(*v != 0),
            Value::String(s) => match s.as_str() {
                "1" | "t" | "true" => Ok(true),
                "0" | "f" | "false" => Ok(false),
                _ => mismatch(value, "bool"),
            },
            other => other.as_bool().map_or_else(|| mismatch(value, "bool"), Ok),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null | Value::Bytes(_) | Value::Array(_) => mismatch(value, "String"),
            Value::String(s) | Value::Decimal(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::String(s) => Ok(s.clone().into_bytes()),
            _ => mismatch(value, "Vec<u8>"),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::String(s) => Uuid::parse_str(s)
                .map_err(|e| WdbError::Decode(format!("invalid uuid {:?}: {}", s, e))),
            _ => mismatch(value, "Uuid"),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::String(s) => serde_json::from_str(s)
                .map_err(|e| WdbError::Decode(format!("invalid json: {}", e))),
            _ => mismatch(value, "serde_json::Value"),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::DateTime(dt) => Ok(dt.date()),
            Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| WdbError::Decode(format!("invalid date {:?}: {}", s, e))),
            _ => mismatch(value, "NaiveDate"),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Time(t) => Ok(*t),
            Value::String(s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|e| WdbError::Decode(format!("invalid time {:?}: {}", s, e))),
            _ => mismatch(value, "NaiveTime"),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::DateTimeUtc(dt) => Ok(dt.naive_utc()),
            Value::Date(d) => Ok(d.and_time(NaiveTime::default())),
            Value::String(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|e| WdbError::Decode(format!("invalid datetime {:?}: {}", s, e))),
            _ => mismatch(value, "NaiveDateTime"),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::DateTimeUtc(dt) => Ok(*dt),
            Value::DateTime(dt) => Ok(dt.and_utc()),
            _ => mismatch(value, "DateTime<Utc>"),
        }
    }
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

impl FromRow for HashMap<String, Value> {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.to_map())
    }
}

macro_rules! impl_from_row_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row) -> Result<Self> {
                let expected = [$($idx),+].len();
                if row.len() < expected {
                    return Err(WdbError::Decode(format!(
                        "row has {} columns, expected at least {}",
                        row.len(),
                        expected
                    )));
                }
                Ok(($(row.try_get::<$name>($idx as usize)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(A: 0);
impl_from_row_tuple!(A: 0, B: 1);
impl_from_row_tuple!(A: 0, B: 1, C: 2);
impl_from_row_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_from_row_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_from_row_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::int8(Value::Int8(7), 7)]
    #[case::int32(Value::Int32(7), 7)]
    #[case::uint64(Value::UInt64(7), 7)]
    #[case::text_protocol(Value::String("7".into()), 7)]
    fn test_integer_decoding(#[case] value: Value, #[case] expected: i64) {
        assert_eq!(i64::from_value(&value).unwrap(), expected);
    }

    #[test]
    fn test_integer_range_checked() {
        let err = i8::from_value(&Value::Int64(300)).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);
        assert!(u32::from_value(&Value::Int64(-1)).is_err());
        assert_eq!(u64::from_value(&Value::UInt64(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(&Value::Int64(3)).unwrap(),
            Some(3)
        );
        assert!(i64::from_value(&Value::Null).is_err());
        assert!(String::from_value(&Value::Null).is_err());
    }

    #[rstest]
    #[case::native(Value::Bool(true), true)]
    #[case::tinyint(Value::Int8(0), false)]
    #[case::text(Value::String("t".into()), true)]
    fn test_bool_decoding(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(bool::from_value(&value).unwrap(), expected);
    }

    #[test]
    fn test_string_and_temporal_decoding() {
        assert_eq!(
            String::from_value(&Value::Int64(12)).unwrap(),
            "12".to_string()
        );
        let date = NaiveDate::from_value(&Value::String("2024-02-29".into())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let dt = NaiveDateTime::from_value(&Value::String("2024-02-29 10:11:12".into())).unwrap();
        assert_eq!(dt.date(), date);
    }

    #[test]
    fn test_tuple_rows() {
        let row = Row::new(
            vec!["id".to_string(), "title".to_string()],
            vec![Value::Int64(2), Value::String("two".into())],
        );
        let (id, title): (i64, String) = FromRow::from_row(&row).unwrap();
        assert_eq!((id, title.as_str()), (2, "two"));

        let err = <(i64, String, bool)>::from_row(&row).unwrap_err();
        assert!(err.to_string().contains("expected at least 3"), "{}", err);
    }
}
