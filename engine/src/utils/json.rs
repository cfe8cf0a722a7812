// FICHIER : engine/src/utils/json.rs

//! Accès aux champs de documents JSON par chemin pointé (`a.b.c`).

// --- RE-EXPORTS (Single Source of Truth pour le JSON) ---
pub use serde_json::{json, Map, Value};

/// Clé d'identifiant des documents.
pub const ID_FIELD: &str = "_id";

/// Lit la valeur à un chemin pointé.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Écrit une valeur à un chemin pointé en créant les objets intermédiaires.
/// Renvoie `true` si le document a changé.
pub fn set_path(doc: &mut Value, path: &str, value: Value) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    let (last, parents) = match parts.split_last() {
        Some(split) => split,
        None => return false,
    };

    let mut current = doc;
    for part in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(obj) = current.as_object_mut() else {
            return false;
        };
        current = obj
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    match current.as_object_mut() {
        Some(obj) => {
            if obj.get(*last) == Some(&value) {
                return false;
            }
            obj.insert(last.to_string(), value);
            true
        }
        None => false,
    }
}

/// Retire la valeur à un chemin pointé et la renvoie.
pub fn remove_path(doc: &mut Value, path: &str) -> Option<Value> {
    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };

    let parent = match parents {
        Some(p) => get_path_mut(doc, p)?,
        None => doc,
    };
    parent.as_object_mut()?.remove(last)
}

fn get_path_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = doc;
    for part in path.split('.') {
        current = current.as_object_mut()?.get_mut(part)?;
    }
    Some(current)
}

/// Identifiant d'un document, sous forme textuelle (chaîne ou nombre).
pub fn id_of(doc: &Value) -> Option<String> {
    match doc.get(ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
