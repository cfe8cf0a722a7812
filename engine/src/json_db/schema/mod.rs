// FICHIER : engine/src/json_db/schema/mod.rs

//! Modèle de schéma abstrait : documents -> champs -> descripteurs.
//! Un snapshot n'est jamais muté en place ; chaque action en dérive un nouveau.

pub mod field_type;
pub mod patch;

pub use field_type::FieldType;
pub use patch::{SchemaEdit, SchemaPatch};

use crate::utils::prelude::*;
use std::collections::BTreeMap;

/// Descripteur d'un champ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Clé de stockage ; par défaut le nom du champ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_field: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
    /// Type de document cible (champs `reference`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

fn default_nullable() -> bool {
    true
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            db_field: None,
            nullable: true,
            default: None,
            choices: None,
            reference: None,
            params: BTreeMap::new(),
        }
    }

    pub fn reference_to(document_type: &str) -> Self {
        Self {
            reference: Some(document_type.to_string()),
            ..Self::new(FieldType::Reference)
        }
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_db_field(mut self, db_field: &str) -> Self {
        self.db_field = Some(db_field.to_string());
        self
    }

    pub fn with_choices(mut self, choices: Vec<Value>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Clé effectivement utilisée dans les documents stockés.
    pub fn db_field_for<'a>(&'a self, field_name: &'a str) -> &'a str {
        self.db_field.as_deref().unwrap_or(field_name)
    }
}

/// Schéma d'un type de document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSchema {
    /// Collection de stockage (métadonnée de routage)
    pub collection: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,
}

impl DocumentSchema {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, field: FieldSchema) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }
}

/// Snapshot complet du schéma déclaré.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    documents: BTreeMap<String, DocumentSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, document: DocumentSchema) -> Self {
        self.documents.insert(name.to_string(), document);
        self
    }

    pub fn contains(&self, document: &str) -> bool {
        self.documents.contains_key(document)
    }

    pub fn get(&self, document: &str) -> Option<&DocumentSchema> {
        self.documents.get(document)
    }

    pub fn document(&self, document: &str) -> Result<&DocumentSchema> {
        self.documents.get(document).ok_or_else(|| {
            AppError::Schema(format!("Document '{}' absent du schéma", document))
        })
    }

    pub fn field(&self, document: &str, field: &str) -> Result<&FieldSchema> {
        self.document(document)?.fields.get(field).ok_or_else(|| {
            AppError::Schema(format!("Champ '{}.{}' absent du schéma", document, field))
        })
    }

    /// Type de document routé vers une collection donnée.
    pub fn document_for_collection(&self, collection: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|(_, d)| d.collection == collection)
            .map(|(name, _)| name.as_str())
    }

    pub fn documents(&self) -> impl Iterator<Item = (&String, &DocumentSchema)> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub(crate) fn documents_mut(&mut self) -> &mut BTreeMap<String, DocumentSchema> {
        &mut self.documents
    }
}
