use super::*;
use crate::driver::quote_value;
use crate::error::is_lost_sqlstate;
use crate::values::{PgNumeric, PgValue};
use bytes::BytesMut;
use postgres_types::{ToSql, Type};
use pretty_assertions::assert_eq;
use rstest::rstest;
use wdb_core::{BindStyle, DatabaseDriver, Endpoint, Value, WdbError};

#[test]
fn test_driver_metadata() {
    let driver = PostgresDriver::new();
    assert_eq!(driver.name(), "postgresql");
    assert!(driver.aliases().contains(&"postgres"));
    assert_eq!(driver.default_port(), Some(5432));
    assert_eq!(driver.bind_style(), BindStyle::Dollar);
}

#[test]
fn test_connection_string_full() {
    let endpoint = Endpoint::new_postgres("pg.internal", 5433, "app", "reader")
        .with_password("secret");
    let conn_str = PostgresDriver::new().build_connection_string(&endpoint).unwrap();
    assert_eq!(
        conn_str,
        "host=pg.internal port=5433 user=reader password=secret dbname=app sslmode=disable"
    );
}

#[test]
fn test_connection_string_defaults() {
    let conn_str = PostgresDriver::new()
        .build_connection_string(&Endpoint::new("postgresql"))
        .unwrap();
    assert_eq!(conn_str, "host=localhost port=5432 sslmode=disable");
}

#[test]
fn test_connection_string_forwards_params() {
    let endpoint = Endpoint::new("postgresql")
        .with_param("sslmode", "prefer")
        .with_param("connect_timeout", 5)
        .with_param("application_name", "my app")
        .with_param("max_open_conns", 10);
    let conn_str = PostgresDriver::new().build_connection_string(&endpoint).unwrap();
    assert_eq!(
        conn_str,
        "host=localhost port=5432 sslmode=prefer application_name='my app' connect_timeout=5"
    );
}

#[rstest]
#[case::require("require")]
#[case::verify_full("verify-full")]
#[case::nonsense("sometimes")]
fn test_unsupported_sslmode(#[case] mode: &str) {
    let endpoint = Endpoint::new("postgresql").with_param("sslmode", mode);
    let err = PostgresDriver::new().build_connection_string(&endpoint).unwrap_err();
    assert!(matches!(err, WdbError::Configuration(_)), "{:?}", err);
}

#[rstest]
#[case::plain("secret", "secret")]
#[case::empty("", "''")]
#[case::space("two words", "'two words'")]
#[case::quote("it's", r"'it\'s'")]
#[case::backslash(r"a\b", r"'a\\b'")]
fn test_quote_value(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(quote_value(raw), expected);
}

#[test]
fn test_quoted_password_parses() {
    let endpoint = Endpoint::new("postgresql").with_password("p a'ss");
    let conn_str = PostgresDriver::new().build_connection_string(&endpoint).unwrap();
    let config: tokio_postgres::Config = conn_str.parse().unwrap();
    assert_eq!(config.get_password(), Some("p a'ss".as_bytes()));
}

#[rstest]
#[case::connection_exception("08006", true)]
#[case::connection_failure("08001", true)]
#[case::admin_shutdown("57P01", true)]
#[case::crash_shutdown("57P02", true)]
#[case::cannot_connect_now("57P03", true)]
#[case::unique_violation("23505", false)]
#[case::syntax_error("42601", false)]
#[case::query_canceled("57014", false)]
fn test_sqlstate_classification(#[case] code: &str, #[case] lost: bool) {
    assert_eq!(is_lost_sqlstate(code), lost);
}

#[tokio::test]
async fn test_connect_unknown_option_is_configuration_error() {
    let endpoint = Endpoint::new("postgresql").with_param("bogus_option", "1");
    let err = PostgresDriver::new().connect(&endpoint).await.err().unwrap();
    assert!(matches!(err, WdbError::Configuration(_)), "{:?}", err);
}

#[tokio::test]
async fn test_connect_refused_is_connection_error() {
    let endpoint = Endpoint::new("postgresql").with_host("127.0.0.1", 1);
    let err = PostgresDriver::new().connect(&endpoint).await.err().unwrap();
    assert!(matches!(err, WdbError::Connection(_)), "{:?}", err);
}

#[test]
fn test_numeric_decoding() {
    // 12345.678: 3 groups, weight 1, positive, scale 3
    let raw = [0, 3, 0, 1, 0, 0, 0, 3, 0, 1, 0x09, 0x29, 0x1A, 0x7C];
    assert_eq!(PgNumeric::decode(&raw).unwrap(), "12345.678");

    // -0.05: 1 group, weight -1, negative, scale 2
    let raw = [0, 1, 0xFF, 0xFF, 0x40, 0, 0, 2, 0x01, 0xF4];
    assert_eq!(PgNumeric::decode(&raw).unwrap(), "-0.05");

    let nan = [0, 0, 0, 0, 0xC0, 0, 0, 0];
    assert_eq!(PgNumeric::decode(&nan).unwrap(), "NaN");

    assert!(PgNumeric::decode(&[0, 1]).is_err());
}

#[test]
fn test_param_width_follows_target_type() {
    assert!(matches!(PgValue::for_type(&Value::Int64(7), &Type::INT4), PgValue::Int32(7)));
    assert!(matches!(PgValue::for_type(&Value::Int32(7), &Type::INT8), PgValue::Int64(7)));
    assert!(matches!(
        PgValue::for_type(&Value::Int64(i64::MAX), &Type::INT2),
        PgValue::Int64(_)
    ));
    assert!(matches!(
        PgValue::for_type(&Value::Float64(1.5), &Type::FLOAT4),
        PgValue::Float32(_)
    ));
    assert!(matches!(
        PgValue::for_type(&Value::from("{\"a\":1}"), &Type::JSONB),
        PgValue::Json(_)
    ));
}

/// Bind `value` to a parameter of type `target` the way a prepared
/// statement does and return the wire bytes
fn bind(value: Value, target: Type) -> Result<Vec<u8>, Box<dyn std::error::Error + Sync + Send>> {
    let mut out = BytesMut::new();
    PgValue::for_type(&value, &target).to_sql_checked(&target, &mut out)?;
    Ok(out.to_vec())
}

#[rstest]
#[case::int_to_numeric(Value::Int64(7), Type::NUMERIC, vec![0, 1, 0, 0, 0, 0, 0, 0, 0, 7])]
#[case::decimal_to_numeric(
    Value::Decimal("12.50".into()),
    Type::NUMERIC,
    vec![0, 2, 0, 0, 0, 0, 0, 2, 0, 12, 0x13, 0x88]
)]
#[case::negative_fraction(
    Value::Decimal("-0.05".into()),
    Type::NUMERIC,
    vec![0, 1, 0xFF, 0xFF, 0x40, 0, 0, 2, 0x01, 0xF4]
)]
#[case::large_decimal(
    Value::Decimal("12345.678".into()),
    Type::NUMERIC,
    vec![0, 3, 0, 1, 0, 0, 0, 3, 0, 1, 0x09, 0x29, 0x1A, 0x7C]
)]
#[case::zero(Value::Decimal("0.00".into()), Type::NUMERIC, vec![0, 0, 0, 0, 0, 0, 0, 2])]
#[case::float_to_numeric(
    Value::Float64(1.5),
    Type::NUMERIC,
    vec![0, 2, 0, 0, 0, 0, 0, 1, 0, 1, 0x13, 0x88]
)]
#[case::nan_to_numeric(Value::Float64(f64::NAN), Type::NUMERIC, vec![0, 0, 0, 0, 0xC0, 0, 0, 0])]
#[case::int_to_float8(Value::Int32(3), Type::FLOAT8, vec![0x40, 0x08, 0, 0, 0, 0, 0, 0])]
#[case::int_to_float4(Value::Int64(2), Type::FLOAT4, vec![0x40, 0, 0, 0])]
#[case::decimal_to_float8(Value::Decimal("2.5".into()), Type::FLOAT8, vec![0x40, 0x04, 0, 0, 0, 0, 0, 0])]
#[case::whole_float_to_int8(Value::Float64(5.0), Type::INT8, vec![0, 0, 0, 0, 0, 0, 0, 5])]
#[case::int_to_int2(Value::Int64(7), Type::INT2, vec![0, 7])]
#[case::int_to_text(Value::Int64(42), Type::TEXT, b"42".to_vec())]
#[case::bool_to_text(Value::Bool(true), Type::VARCHAR, b"true".to_vec())]
fn test_param_encoding_follows_target_type(
    #[case] value: Value,
    #[case] target: Type,
    #[case] expected: Vec<u8>,
) {
    assert_eq!(bind(value, target).unwrap(), expected);
}

#[rstest]
#[case::malformed_decimal(Value::Decimal("12.5.0".into()), Type::NUMERIC)]
#[case::exponent(Value::Decimal("1e5".into()), Type::NUMERIC)]
#[case::infinity(Value::Float64(f64::INFINITY), Type::NUMERIC)]
#[case::int_overflows_int2(Value::Int64(i64::MAX), Type::INT2)]
#[case::fractional_float_to_int(Value::Float64(1.5), Type::INT4)]
#[case::text_to_int(Value::from("abc"), Type::INT8)]
#[case::bytes_to_text(Value::Bytes(vec![1, 2]), Type::TEXT)]
fn test_param_mismatch_is_rejected(#[case] value: Value, #[case] target: Type) {
    assert!(bind(value, target).is_err());
}

#[test]
fn test_numeric_encoding_keeps_value_and_scale() {
    for text in ["12.50", "-0.00001", "10000", "0.1000", "99999999.99"] {
        let mut out = BytesMut::new();
        PgNumeric::encode(text, &mut out).unwrap();
        assert_eq!(PgNumeric::decode(&out).unwrap(), text);
    }
}
