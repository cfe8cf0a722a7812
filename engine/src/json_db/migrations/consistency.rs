// FICHIER : engine/src/json_db/migrations/consistency.rs

use crate::json_db::collections::Collection;
use crate::json_db::query::Filter;
use crate::utils::json::{get_path, id_of};
use crate::utils::prelude::*;

/// Nombre maximum d'exemples cités dans le rapport d'incohérence.
pub const MAX_EXAMPLES: usize = 3;

const UNKNOWN: &str = "unknown";

/// Échoue si au moins un document correspond à `filter`.
/// Appelé avant toute mutation : la base n'est pas modifiée en cas d'échec.
#[instrument(level = "debug", skip(collection, filter), fields(collection = %collection.name()))]
pub async fn check_empty_result(collection: &Collection, db_field: &str, filter: &Filter) -> Result<()> {
    let offenders = collection.find(filter, Some(MAX_EXAMPLES)).await?;
    if offenders.is_empty() {
        return Ok(());
    }

    let examples: Vec<String> = offenders
        .iter()
        .map(|doc| format_example(doc, db_field))
        .collect();

    warn!(
        "❌ {} document(s) incohérent(s) dans '{}' (champ '{}')",
        offenders.len(),
        collection.name(),
        db_field
    );

    Err(AppError::Inconsistency(format!(
        "Le champ {}.{} contient des valeurs invalides dans certains documents. Premiers exemples : {}",
        collection.name(),
        db_field,
        examples.join(", ")
    )))
}

fn format_example(doc: &Value, db_field: &str) -> String {
    let id = id_of(doc).unwrap_or_else(|| UNKNOWN.to_string());
    let value = get_path(doc, db_field)
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    format!("{{{}: {},...{}: {}}}", ID_FIELD, id, db_field, value)
}
