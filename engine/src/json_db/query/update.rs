// FICHIER : engine/src/json_db/query/update.rs

//! Opérateurs de mise à jour natifs du store (équivalents `$set`, `$unset`,
//! `$rename`, `$convert`).

use crate::json_db::schema::FieldType;
use crate::utils::json::{get_path, remove_path, set_path};
use crate::utils::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum UpdateOp {
    Set { field: String, value: Value },
    Unset { field: String },
    Rename { from: String, to: String },
    Convert { field: String, to: FieldType },
}

impl UpdateOp {
    /// Applique l'opérateur sur un document. Renvoie `true` si le document a changé.
    pub fn apply(&self, doc: &mut Value) -> Result<bool> {
        match self {
            UpdateOp::Set { field, value } => Ok(set_path(doc, field, value.clone())),
            UpdateOp::Unset { field } => Ok(remove_path(doc, field).is_some()),
            UpdateOp::Rename { from, to } => match remove_path(doc, from) {
                Some(value) => {
                    set_path(doc, to, value);
                    Ok(true)
                }
                None => Ok(false),
            },
            UpdateOp::Convert { field, to } => {
                let Some(current) = get_path(doc, field) else {
                    return Ok(false);
                };
                if current.is_null() {
                    return Ok(false);
                }
                match to.convert_value(current) {
                    Some(converted) => Ok(set_path(doc, field, converted)),
                    None => Err(AppError::Database(format!(
                        "Conversion impossible de '{}' en {} : {}",
                        field, to, current
                    ))),
                }
            }
        }
    }

    pub fn apply_all(ops: &[UpdateOp], doc: &mut Value) -> Result<bool> {
        let mut changed = false;
        for op in ops {
            changed |= op.apply(doc)?;
        }
        Ok(changed)
    }
}
