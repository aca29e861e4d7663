use bytes::BytesMut;
use postgres_types::{to_sql_checked, IsNull, Json, ToSql, Type};

use tusker_core::{BoxDynError, Value};

/// A bound statement parameter, bridged from a dynamic [`Value`].
///
/// The concrete wire encoding is chosen against the type the backend
/// inferred for the parameter; strings sent to non-text types fall back to
/// the text representation, which covers enums, domains, and extension
/// types.
#[derive(Debug)]
pub(crate) enum PgParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

pub(crate) fn to_params(values: &[Value]) -> Vec<PgParam> {
    values.iter().map(PgParam::from_value).collect()
}

impl PgParam {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(*value),
            Value::Number(value) => {
                if let Some(int) = value.as_i64() {
                    Self::Int(int)
                } else if let Some(float) = value.as_f64() {
                    Self::Float(float)
                } else {
                    Self::Text(value.to_string())
                }
            }
            Value::String(value) => Self::Text(value.clone()),
            composite @ (Value::Array(_) | Value::Object(_)) => Self::Json(composite.clone()),
        }
    }
}

impl ToSql for PgParam {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, BoxDynError> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(value) => value.to_sql(ty, out),
            Self::Int(value) => {
                if *ty == Type::INT2 {
                    i16::try_from(*value)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*value)?.to_sql(ty, out)
                } else if *ty == Type::OID {
                    u32::try_from(*value)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
                    (*value as f64).to_sql(ty, out)
                } else {
                    value.to_sql(ty, out)
                }
            }
            Self::Float(value) => {
                if *ty == Type::FLOAT4 {
                    (*value as f32).to_sql(ty, out)
                } else {
                    value.to_sql(ty, out)
                }
            }
            Self::Text(value) => value.to_sql(ty, out),
            Self::Json(value) => Json(value).to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn values_map_onto_their_wire_shapes() {
        let params = to_params(&[
            json!(null),
            json!(true),
            json!(42),
            json!(1.5),
            json!("ada"),
            json!([1, 2]),
            json!({"k": "v"}),
        ]);

        assert!(matches!(params[0], PgParam::Null));
        assert!(matches!(params[1], PgParam::Bool(true)));
        assert!(matches!(params[2], PgParam::Int(42)));
        assert!(matches!(params[3], PgParam::Float(f) if f == 1.5));
        assert!(matches!(&params[4], PgParam::Text(s) if s == "ada"));
        assert!(matches!(params[5], PgParam::Json(_)));
        assert!(matches!(params[6], PgParam::Json(_)));
    }

    #[test]
    fn integers_narrow_to_the_inferred_parameter_type() {
        let mut out = BytesMut::new();

        PgParam::Int(7).to_sql(&Type::INT2, &mut out).unwrap();
        assert_eq!(out.len(), 2);

        out.clear();
        PgParam::Int(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(out.len(), 4);

        out.clear();
        PgParam::Int(7).to_sql(&Type::INT8, &mut out).unwrap();
        assert_eq!(out.len(), 8);

        // out-of-range narrowing is an error, not a truncation
        out.clear();
        assert!(PgParam::Int(1 << 40).to_sql(&Type::INT4, &mut out).is_err());
    }

    #[test]
    fn floats_narrow_to_float4_when_inferred() {
        let mut out = BytesMut::new();

        PgParam::Float(1.5).to_sql(&Type::FLOAT4, &mut out).unwrap();
        assert_eq!(out.len(), 4);

        out.clear();
        PgParam::Float(1.5).to_sql(&Type::FLOAT8, &mut out).unwrap();
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn null_encodes_as_null_for_any_type() {
        let mut out = BytesMut::new();
        let is_null = PgParam::Null.to_sql(&Type::TIMESTAMPTZ, &mut out).unwrap();

        assert!(matches!(is_null, IsNull::Yes));
        assert!(out.is_empty());
    }
}
