// FICHIER : engine/src/json_db/migrations/actions/mod.rs

//! Actions de migration : une étape atomique, nominalement réversible.
//!
//! Cycle de vie : `to_schema_patch` (pur) -> `prepare` (validation + liaison du
//! contexte, sans toucher au store) -> `run_forward` / `run_backward`.
//!
//! Un [`RunContext`] ne se construit que via [`BoundAction::bind`] : les
//! méthodes `run_*` ne sont donc appelables qu'après une préparation réussie.

pub mod document;
pub mod field;
pub mod run_code;

pub use document::{CreateDocument, DropDocument, RenameCollection, RenameDocument};
pub use field::{AlterFieldType, CreateField, DropField, RenameField};
pub use run_code::{RunCode, UserCode};

use crate::json_db::collections::{Collection, Database};
use crate::json_db::schema::{Schema, SchemaPatch};
use crate::utils::prelude::*;
use async_trait::async_trait;
use std::fmt;

/// Contexte transitoire lié à une action pendant son exécution.
pub struct RunContext {
    db: Database,
    collection: Collection,
    left_schema: Schema,
}

impl RunContext {
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Schéma avant application de l'action.
    pub fn left_schema(&self) -> &Schema {
        &self.left_schema
    }
}

#[async_trait]
pub trait Action: Send + Sync + fmt::Debug {
    fn kind(&self) -> &'static str;

    fn document_type(&self) -> &str;

    /// Préconditions sur le schéma de gauche. Échec : `AppError::Schema`.
    fn validate(&self, schema: &Schema) -> Result<()>;

    /// Collection de stockage ciblée.
    fn collection_name(&self, schema: &Schema) -> Result<String> {
        Ok(schema.document(self.document_type())?.collection.clone())
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()>;

    async fn run_backward(&self, ctx: &RunContext) -> Result<()>;

    fn to_schema_patch(&self, schema: &Schema) -> Result<SchemaPatch>;

    fn to_expr(&self) -> String;

    fn prepare(&self, db: &Database, schema: &Schema) -> Result<BoundAction<'_>>
    where
        Self: Sized,
    {
        BoundAction::bind(self, db, schema)
    }
}

/// Action validée et liée à son contexte d'exécution.
pub struct BoundAction<'a> {
    action: &'a dyn Action,
    ctx: RunContext,
}

impl<'a> BoundAction<'a> {
    pub fn bind(action: &'a dyn Action, db: &Database, schema: &Schema) -> Result<Self> {
        action.validate(schema)?;
        let collection = db.collection(&action.collection_name(schema)?);
        Ok(Self {
            action,
            ctx: RunContext {
                db: db.clone(),
                collection,
                left_schema: schema.clone(),
            },
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub async fn run_forward(&self) -> Result<()> {
        self.action.run_forward(&self.ctx).await
    }

    pub async fn run_backward(&self) -> Result<()> {
        self.action.run_backward(&self.ctx).await
    }

    pub async fn run(&self, direction: Direction) -> Result<()> {
        match direction {
            Direction::Forward => self.run_forward().await,
            Direction::Backward => self.run_backward().await,
        }
    }
}

// --- HELPERS DE VALIDATION ---

pub(crate) fn require_document(schema: &Schema, document: &str) -> Result<()> {
    schema.document(document).map(|_| ())
}

pub(crate) fn require_absent_document(schema: &Schema, document: &str) -> Result<()> {
    if schema.contains(document) {
        return Err(AppError::Schema(format!(
            "Document '{}' déjà présent dans le schéma",
            document
        )));
    }
    Ok(())
}

pub(crate) fn require_field(schema: &Schema, document: &str, field: &str) -> Result<()> {
    schema.field(document, field).map(|_| ())
}

pub(crate) fn require_absent_field(schema: &Schema, document: &str, field: &str) -> Result<()> {
    if schema.document(document)?.fields.contains_key(field) {
        return Err(AppError::Schema(format!(
            "Champ '{}.{}' déjà présent dans le schéma",
            document, field
        )));
    }
    Ok(())
}
