// FICHIER : engine/src/json_db/query/filter.rs

use crate::json_db::schema::FieldType;
use crate::utils::json::get_path;
use crate::utils::prelude::*;
use regex::Regex;

/// Catégorie de stockage d'une valeur JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueKind::Int,
            Value::Number(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

/// Expression de filtre sur les documents (chemins de champs pointés).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Filter {
    All,
    Exists { field: String, exists: bool },
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    TypeIs { field: String, kinds: Vec<ValueKind> },
    Matches { field: String, pattern: String },
    /// Valeur présente, non nulle, et refusée par la table de conversion vers `to`.
    Unconvertible { field: String, to: FieldType },
    And { filters: Vec<Filter> },
    Or { filters: Vec<Filter> },
    Not { filter: Box<Filter> },
}

impl Filter {
    pub fn exists(field: &str) -> Self {
        Filter::Exists {
            field: field.to_string(),
            exists: true,
        }
    }

    pub fn missing(field: &str) -> Self {
        Filter::Exists {
            field: field.to_string(),
            exists: false,
        }
    }

    pub fn eq(field: &str, value: Value) -> Self {
        Filter::Eq {
            field: field.to_string(),
            value,
        }
    }

    pub fn one_of(field: &str, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.to_string(),
            values,
        }
    }

    pub fn type_is(field: &str, kinds: &[ValueKind]) -> Self {
        Filter::TypeIs {
            field: field.to_string(),
            kinds: kinds.to_vec(),
        }
    }

    pub fn matches(field: &str, pattern: &str) -> Self {
        Filter::Matches {
            field: field.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn unconvertible(field: &str, to: FieldType) -> Self {
        Filter::Unconvertible {
            field: field.to_string(),
            to,
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    pub fn negate(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }

    /// Vérifie que toutes les expressions régulières compilent.
    pub fn validate(&self) -> Result<()> {
        match self {
            Filter::Matches { pattern, .. } => Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| AppError::Database(format!("Regex invalide '{}' : {}", pattern, e))),
            Filter::And { filters } | Filter::Or { filters } => {
                filters.iter().try_for_each(Filter::validate)
            }
            Filter::Not { filter } => filter.validate(),
            _ => Ok(()),
        }
    }

    /// Évalue le filtre sur un document.
    pub fn evaluate(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Exists { field, exists } => get_path(doc, field).is_some() == *exists,
            Filter::Eq { field, value } => get_path(doc, field) == Some(value),
            Filter::Ne { field, value } => get_path(doc, field) != Some(value),
            Filter::In { field, values } => {
                get_path(doc, field).is_some_and(|v| values.contains(v))
            }
            Filter::TypeIs { field, kinds } => {
                get_path(doc, field).is_some_and(|v| kinds.contains(&ValueKind::of(v)))
            }
            Filter::Matches { field, pattern } => match get_path(doc, field) {
                Some(Value::String(s)) => Regex::new(pattern).is_ok_and(|re| re.is_match(s)),
                _ => false,
            },
            Filter::Unconvertible { field, to } => match get_path(doc, field) {
                None | Some(Value::Null) => false,
                Some(v) => to.convert_value(v).is_none(),
            },
            Filter::And { filters } => filters.iter().all(|f| f.evaluate(doc)),
            Filter::Or { filters } => filters.iter().any(|f| f.evaluate(doc)),
            Filter::Not { filter } => !filter.evaluate(doc),
        }
    }
}
