// FICHIER : engine/src/json_db/migrations/expr.rs

//! Forme déclarative rejouable des actions : `Kind("Doc", pos.., kw=value)`.

use crate::json_db::schema::{FieldSchema, FieldType};
use crate::utils::prelude::*;

/// Représentation des valeurs non sérialisables (fonctions, handles...).
pub const OPAQUE: &str = "<opaque>";

pub trait ToExpr {
    fn to_expr(&self) -> String {
        OPAQUE.to_string()
    }
}

impl ToExpr for str {
    fn to_expr(&self) -> String {
        // Échappement identique au JSON
        Value::String(self.to_string()).to_string()
    }
}

impl ToExpr for String {
    fn to_expr(&self) -> String {
        self.as_str().to_expr()
    }
}

impl ToExpr for bool {
    fn to_expr(&self) -> String {
        self.to_string()
    }
}

macro_rules! impl_to_expr_number {
    ($($t:ty),*) => {
        $(impl ToExpr for $t {
            fn to_expr(&self) -> String {
                self.to_string()
            }
        })*
    };
}

impl_to_expr_number!(i32, i64, u32, u64, usize, f64);

impl<T: ToExpr> ToExpr for Option<T> {
    fn to_expr(&self) -> String {
        match self {
            Some(v) => v.to_expr(),
            None => "None".to_string(),
        }
    }
}

impl<T: ToExpr> ToExpr for Vec<T> {
    fn to_expr(&self) -> String {
        let items: Vec<String> = self.iter().map(ToExpr::to_expr).collect();
        format!("[{}]", items.join(", "))
    }
}

impl ToExpr for Value {
    fn to_expr(&self) -> String {
        self.to_string()
    }
}

impl ToExpr for FieldType {
    fn to_expr(&self) -> String {
        self.to_string()
    }
}

impl ToExpr for FieldSchema {
    fn to_expr(&self) -> String {
        let mut expr = ExprBuilder::new("Field").kwarg("type", &self.field_type);
        if let Some(db_field) = &self.db_field {
            expr = expr.kwarg("db_field", db_field);
        }
        if !self.nullable {
            expr = expr.kwarg("nullable", &false);
        }
        if let Some(default) = &self.default {
            expr = expr.kwarg("default", default);
        }
        if let Some(choices) = &self.choices {
            expr = expr.kwarg("choices", choices);
        }
        if let Some(reference) = &self.reference {
            expr = expr.kwarg("reference", reference);
        }
        for (key, value) in &self.params {
            expr = expr.kwarg(key, value);
        }
        expr.build()
    }
}

/// Assemble `Kind(arg, .., key=value, ..)` ; les kwargs sont triés par nom.
#[derive(Debug, Clone)]
pub struct ExprBuilder {
    kind: String,
    args: Vec<String>,
    kwargs: Vec<(String, String)>,
}

impl ExprBuilder {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            args: Vec::new(),
            kwargs: Vec::new(),
        }
    }

    pub fn arg<T: ToExpr + ?Sized>(mut self, value: &T) -> Self {
        self.args.push(value.to_expr());
        self
    }

    pub fn kwarg<T: ToExpr + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.kwargs.push((name.to_string(), value.to_expr()));
        self
    }

    /// Comme [`kwarg`](Self::kwarg), mais omis quand la valeur est absente.
    pub fn kwarg_opt<T: ToExpr>(self, name: &str, value: Option<&T>) -> Self {
        match value {
            Some(v) => self.kwarg(name, v),
            None => self,
        }
    }

    pub fn build(mut self) -> String {
        self.kwargs.sort_by(|a, b| a.0.cmp(&b.0));
        let parts: Vec<String> = self
            .args
            .into_iter()
            .chain(self.kwargs.into_iter().map(|(k, v)| format!("{}={}", k, v)))
            .collect();
        format!("{}({})", self.kind, parts.join(", "))
    }
}
