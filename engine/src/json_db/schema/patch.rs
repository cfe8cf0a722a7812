// FICHIER : engine/src/json_db/schema/patch.rs

//! Patchs de schéma : suites ordonnées d'éditions primitives.
//! Chaque édition porte l'état qu'elle remplace, ce qui rend l'inverse calculable.

use super::{DocumentSchema, FieldSchema, Schema};
use crate::utils::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "edit")]
pub enum SchemaEdit {
    AddDocument {
        document: String,
        schema: DocumentSchema,
    },
    RemoveDocument {
        document: String,
        schema: DocumentSchema,
    },
    RenameDocument {
        from: String,
        to: String,
    },
    AlterDocument {
        document: String,
        from_collection: String,
        to_collection: String,
    },
    AddField {
        document: String,
        field: String,
        descriptor: FieldSchema,
    },
    RemoveField {
        document: String,
        field: String,
        descriptor: FieldSchema,
    },
    RenameField {
        document: String,
        from: String,
        to: String,
    },
    AlterField {
        document: String,
        field: String,
        from: FieldSchema,
        to: FieldSchema,
    },
}

impl SchemaEdit {
    pub fn inverse(&self) -> SchemaEdit {
        match self.clone() {
            SchemaEdit::AddDocument { document, schema } => {
                SchemaEdit::RemoveDocument { document, schema }
            }
            SchemaEdit::RemoveDocument { document, schema } => {
                SchemaEdit::AddDocument { document, schema }
            }
            SchemaEdit::RenameDocument { from, to } => SchemaEdit::RenameDocument { from: to, to: from },
            SchemaEdit::AlterDocument {
                document,
                from_collection,
                to_collection,
            } => SchemaEdit::AlterDocument {
                document,
                from_collection: to_collection,
                to_collection: from_collection,
            },
            SchemaEdit::AddField {
                document,
                field,
                descriptor,
            } => SchemaEdit::RemoveField {
                document,
                field,
                descriptor,
            },
            SchemaEdit::RemoveField {
                document,
                field,
                descriptor,
            } => SchemaEdit::AddField {
                document,
                field,
                descriptor,
            },
            SchemaEdit::RenameField { document, from, to } => SchemaEdit::RenameField {
                document,
                from: to,
                to: from,
            },
            SchemaEdit::AlterField {
                document,
                field,
                from,
                to,
            } => SchemaEdit::AlterField {
                document,
                field,
                from: to,
                to: from,
            },
        }
    }

    /// Applique l'édition sur un schéma (déjà cloné par l'appelant).
    fn apply(&self, schema: &mut Schema) -> Result<()> {
        let docs = schema.documents_mut();
        match self {
            SchemaEdit::AddDocument { document, schema } => {
                if docs.contains_key(document) {
                    return Err(AppError::Schema(format!(
                        "Document '{}' déjà présent dans le schéma",
                        document
                    )));
                }
                docs.insert(document.clone(), schema.clone());
            }
            SchemaEdit::RemoveDocument { document, .. } => {
                if docs.remove(document).is_none() {
                    return Err(missing_document(document));
                }
            }
            SchemaEdit::RenameDocument { from, to } => {
                if docs.contains_key(to) {
                    return Err(AppError::Schema(format!(
                        "Renommage impossible : '{}' existe déjà",
                        to
                    )));
                }
                let doc = docs.remove(from).ok_or_else(|| missing_document(from))?;
                docs.insert(to.clone(), doc);
            }
            SchemaEdit::AlterDocument {
                document,
                from_collection,
                to_collection,
            } => {
                let doc = docs.get_mut(document).ok_or_else(|| missing_document(document))?;
                if &doc.collection != from_collection {
                    return Err(AppError::Schema(format!(
                        "Collection de '{}' inattendue : '{}' au lieu de '{}'",
                        document, doc.collection, from_collection
                    )));
                }
                doc.collection = to_collection.clone();
            }
            SchemaEdit::AddField {
                document,
                field,
                descriptor,
            } => {
                let doc = docs.get_mut(document).ok_or_else(|| missing_document(document))?;
                if doc.fields.contains_key(field) {
                    return Err(AppError::Schema(format!(
                        "Champ '{}.{}' déjà présent dans le schéma",
                        document, field
                    )));
                }
                doc.fields.insert(field.clone(), descriptor.clone());
            }
            SchemaEdit::RemoveField { document, field, .. } => {
                let doc = docs.get_mut(document).ok_or_else(|| missing_document(document))?;
                if doc.fields.remove(field).is_none() {
                    return Err(missing_field(document, field));
                }
            }
            SchemaEdit::RenameField { document, from, to } => {
                let doc = docs.get_mut(document).ok_or_else(|| missing_document(document))?;
                if doc.fields.contains_key(to) {
                    return Err(AppError::Schema(format!(
                        "Renommage impossible : champ '{}.{}' existe déjà",
                        document, to
                    )));
                }
                let descriptor = doc
                    .fields
                    .remove(from)
                    .ok_or_else(|| missing_field(document, from))?;
                doc.fields.insert(to.clone(), descriptor);
            }
            SchemaEdit::AlterField {
                document, field, to, ..
            } => {
                let doc = docs.get_mut(document).ok_or_else(|| missing_document(document))?;
                let slot = doc
                    .fields
                    .get_mut(field)
                    .ok_or_else(|| missing_field(document, field))?;
                *slot = to.clone();
            }
        }
        Ok(())
    }
}

fn missing_document(document: &str) -> AppError {
    AppError::Schema(format!("Document '{}' absent du schéma", document))
}

fn missing_field(document: &str, field: &str) -> AppError {
    AppError::Schema(format!("Champ '{}.{}' absent du schéma", document, field))
}

/// Suite ordonnée d'éditions transformant un snapshot en le suivant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaPatch(Vec<SchemaEdit>);

impl SchemaPatch {
    pub fn new(edits: Vec<SchemaEdit>) -> Self {
        Self(edits)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(edit: SchemaEdit) -> Self {
        Self(vec![edit])
    }

    pub fn edits(&self) -> &[SchemaEdit] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Produit le snapshot suivant. L'entrée n'est jamais modifiée.
    pub fn apply_to(&self, schema: &Schema) -> Result<Schema> {
        let mut next = schema.clone();
        for edit in &self.0 {
            edit.apply(&mut next)?;
        }
        Ok(next)
    }

    pub fn inverse(&self) -> SchemaPatch {
        SchemaPatch(self.0.iter().rev().map(SchemaEdit::inverse).collect())
    }
}
