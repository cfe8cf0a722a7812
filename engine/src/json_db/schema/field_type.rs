// FICHIER : engine/src/json_db/schema/field_type.rs

//! Types sémantiques des champs et table de conversion des valeurs stockées.
//!
//! `unconvertible_filter` s'évalue avec `convert_value` : une valeur non
//! signalée est toujours convertible.

use crate::json_db::query::Filter;
use crate::utils::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

// Forme décimale stricte : exclut "inf" et "NaN", acceptés par `f64::from_str`
const FLOAT_PATTERN: &str = r"^[-+]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    DateTime,
    List,
    Dict,
    Reference,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime",
            FieldType::List => "list",
            FieldType::Dict => "dict",
            FieldType::Reference => "reference",
        };
        write!(f, "{}", name)
    }
}

impl FieldType {
    /// Convertit une valeur stockée vers ce type. `None` si impossible.
    /// Une valeur déjà du bon type est renvoyée telle quelle.
    pub fn convert_value(&self, value: &Value) -> Option<Value> {
        match self {
            FieldType::String => match value {
                Value::String(_) => Some(value.clone()),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                Value::Number(n) => Some(Value::String(n.to_string())),
                _ => None,
            },
            FieldType::Int => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
                Value::Number(n) => {
                    let f = n.as_f64()?.trunc();
                    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        Some(json!(f as i64))
                    } else {
                        None
                    }
                }
                Value::Bool(b) => Some(json!(i64::from(*b))),
                Value::String(s) => s.trim().parse::<i64>().ok().map(|i| json!(i)),
                _ => None,
            },
            FieldType::Float => match value {
                Value::Number(n) if n.is_f64() => Some(value.clone()),
                Value::Number(n) => n.as_f64().map(|f| json!(f)),
                Value::Bool(b) => Some(json!(if *b { 1.0 } else { 0.0 })),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if !matches_pattern(FLOAT_PATTERN, trimmed) {
                        return None;
                    }
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                }
                _ => None,
            },
            FieldType::Bool => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::Number(n) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::DateTime => match value {
                Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339())),
                Value::Number(n) => {
                    let ms = n.as_i64()?;
                    Utc.timestamp_millis_opt(ms)
                        .single()
                        .map(|dt| Value::String(dt.to_rfc3339()))
                }
                _ => None,
            },
            FieldType::List => match value {
                Value::Array(_) => Some(value.clone()),
                other => Some(Value::Array(vec![other.clone()])),
            },
            FieldType::Dict => match value {
                Value::Object(_) => Some(value.clone()),
                _ => None,
            },
            FieldType::Reference => match value {
                Value::String(_) => Some(value.clone()),
                _ => None,
            },
        }
    }

    /// Filtre des documents dont la valeur (non nulle) ne peut pas être
    /// convertie vers ce type. `None` si toute valeur est convertible.
    pub fn unconvertible_filter(&self, db_field: &str) -> Option<Filter> {
        match self {
            FieldType::List => None,
            other => Some(Filter::unconvertible(db_field, *other)),
        }
    }
}

fn matches_pattern(pattern: &str, s: &str) -> bool {
    regex::Regex::new(pattern).is_ok_and(|re| re.is_match(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_conversions() {
        let t = FieldType::Int;
        assert_eq!(t.convert_value(&json!("42")), Some(json!(42)));
        assert_eq!(t.convert_value(&json!(" -7 ")), Some(json!(-7)));
        assert_eq!(t.convert_value(&json!(3.9)), Some(json!(3)));
        assert_eq!(t.convert_value(&json!(true)), Some(json!(1)));
        assert_eq!(t.convert_value(&json!("abc")), None);
        assert_eq!(t.convert_value(&json!([1])), None);
        assert_eq!(t.convert_value(&json!("99999999999999999999")), None);
        assert_eq!(t.convert_value(&json!(1e300)), None);
    }

    #[test]
    fn test_string_and_float_round_trip() {
        let as_string = FieldType::String.convert_value(&json!(1.5)).unwrap();
        assert_eq!(as_string, json!("1.5"));
        assert_eq!(FieldType::Float.convert_value(&as_string), Some(json!(1.5)));
        assert_eq!(FieldType::Float.convert_value(&json!("inf")), None);
    }

    #[test]
    fn test_datetime_conversions() {
        let t = FieldType::DateTime;
        assert_eq!(
            t.convert_value(&json!("2024-01-02T03:04:05+02:00")),
            Some(json!("2024-01-02T01:04:05+00:00"))
        );
        assert_eq!(t.convert_value(&json!(0)), Some(json!("1970-01-01T00:00:00+00:00")));
        assert_eq!(t.convert_value(&json!("hier")), None);
        assert_eq!(t.convert_value(&json!("2024-02-30T00:00:00Z")), None);
    }

    #[test]
    fn test_unconvertible_filter_matches_conversion_table() {
        let samples = vec![
            json!("42"),
            json!("abc"),
            json!(1.25),
            json!(true),
            json!("TRUE"),
            json!([1, 2]),
            json!({ "a": 1 }),
            json!("2024-01-02T03:04:05Z"),
            json!(null),
            // Cas limites : dépassement, chiffres non ASCII, dates impossibles
            json!("99999999999999999999"),
            json!("١٢٣"),
            json!("2024-02-30T00:00:00Z"),
            json!("1e999"),
            json!(1e300),
            json!(u64::MAX),
            json!("nan"),
        ];
        let types = [
            FieldType::String,
            FieldType::Int,
            FieldType::Float,
            FieldType::Bool,
            FieldType::DateTime,
            FieldType::List,
            FieldType::Dict,
            FieldType::Reference,
        ];

        for t in types {
            for sample in &samples {
                let doc = json!({ "f": sample });
                let flagged = t
                    .unconvertible_filter("f")
                    .is_some_and(|f| f.evaluate(&doc));
                let convertible = sample.is_null() || t.convert_value(sample).is_some();
                assert_eq!(
                    flagged, !convertible,
                    "type {} / valeur {} : filtre et conversion divergent",
                    t, sample
                );
            }
        }
    }

    #[test]
    fn test_missing_field_is_never_flagged() {
        let filter = FieldType::Int.unconvertible_filter("age").unwrap();
        assert!(!filter.evaluate(&json!({ "_id": "1" })));
    }
}
