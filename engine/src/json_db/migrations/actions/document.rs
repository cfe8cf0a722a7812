// FICHIER : engine/src/json_db/migrations/actions/document.rs

//! Actions au niveau du type de document.

use super::{require_absent_document, require_document, Action, RunContext};
use crate::json_db::migrations::expr::ExprBuilder;
use crate::json_db::schema::{DocumentSchema, Schema, SchemaEdit, SchemaPatch};
use crate::utils::prelude::*;
use async_trait::async_trait;

// --- CREATE DOCUMENT ---

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub document: String,
    pub collection: String,
}

impl CreateDocument {
    pub fn new(document: &str, collection: &str) -> Self {
        Self {
            document: document.to_string(),
            collection: collection.to_string(),
        }
    }
}

#[async_trait]
impl Action for CreateDocument {
    fn kind(&self) -> &'static str {
        "CreateDocument"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_absent_document(schema, &self.document)
    }

    // Le document n'existe pas encore dans le schéma de gauche
    fn collection_name(&self, _schema: &Schema) -> Result<String> {
        Ok(self.collection.clone())
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        ctx.collection().create().await?;
        info!("📁 Collection '{}' prête pour '{}'", self.collection, self.document);
        Ok(())
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        let collection = ctx.collection();
        if collection.is_empty().await? {
            collection.drop().await?;
            info!("🗑️ Collection vide '{}' supprimée", self.collection);
        } else {
            warn!(
                "⚠️ Collection '{}' non vide : conservée malgré l'annulation de '{}'",
                self.collection, self.document
            );
        }
        Ok(())
    }

    fn to_schema_patch(&self, _schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::AddDocument {
            document: self.document.clone(),
            schema: DocumentSchema::new(&self.collection),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .kwarg("collection", &self.collection)
            .build()
    }
}

// --- DROP DOCUMENT ---

/// Destructif : les documents supprimés ne sont pas restaurés en arrière.
#[derive(Debug, Clone)]
pub struct DropDocument {
    pub document: String,
}

impl DropDocument {
    pub fn new(document: &str) -> Self {
        Self {
            document: document.to_string(),
        }
    }
}

#[async_trait]
impl Action for DropDocument {
    fn kind(&self) -> &'static str {
        "DropDocument"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_document(schema, &self.document)
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        let name = ctx.collection().name();
        let shared = ctx
            .left_schema()
            .documents()
            .any(|(doc, s)| doc != &self.document && s.collection == name);
        if shared {
            warn!(
                "⚠️ Collection '{}' partagée avec un autre type : non supprimée",
                name
            );
            return Ok(());
        }
        warn!("🗑️ Suppression de la collection '{}' (irréversible)", name);
        ctx.collection().drop().await
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        warn!(
            "⚠️ Annulation de DropDocument('{}') : les données de '{}' ne sont pas restaurées",
            self.document,
            ctx.collection().name()
        );
        Ok(())
    }

    fn to_schema_patch(&self, schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::RemoveDocument {
            document: self.document.clone(),
            schema: schema.document(&self.document)?.clone(),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind()).arg(&self.document).build()
    }
}

// --- RENAME DOCUMENT ---

/// Renomme le type de document ; la collection et les données restent inchangées.
#[derive(Debug, Clone)]
pub struct RenameDocument {
    pub document: String,
    pub new_name: String,
}

impl RenameDocument {
    pub fn new(document: &str, new_name: &str) -> Self {
        Self {
            document: document.to_string(),
            new_name: new_name.to_string(),
        }
    }
}

#[async_trait]
impl Action for RenameDocument {
    fn kind(&self) -> &'static str {
        "RenameDocument"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_document(schema, &self.document)?;
        require_absent_document(schema, &self.new_name)
    }

    async fn run_forward(&self, _ctx: &RunContext) -> Result<()> {
        debug!("{} -> {} : aucune donnée modifiée", self.document, self.new_name);
        Ok(())
    }

    async fn run_backward(&self, _ctx: &RunContext) -> Result<()> {
        debug!("{} <- {} : aucune donnée modifiée", self.document, self.new_name);
        Ok(())
    }

    fn to_schema_patch(&self, _schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::RenameDocument {
            from: self.document.clone(),
            to: self.new_name.clone(),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .kwarg("new_name", &self.new_name)
            .build()
    }
}

// --- RENAME COLLECTION ---

#[derive(Debug, Clone)]
pub struct RenameCollection {
    pub document: String,
    pub new_collection: String,
}

impl RenameCollection {
    pub fn new(document: &str, new_collection: &str) -> Self {
        Self {
            document: document.to_string(),
            new_collection: new_collection.to_string(),
        }
    }
}

#[async_trait]
impl Action for RenameCollection {
    fn kind(&self) -> &'static str {
        "RenameCollection"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_document(schema, &self.document)?;
        if let Some(owner) = schema.document_for_collection(&self.new_collection) {
            return Err(AppError::Schema(format!(
                "Collection '{}' déjà utilisée par '{}'",
                self.new_collection, owner
            )));
        }
        Ok(())
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        let current = ctx.collection();
        if ctx.db().has_collection(current.name()).await? {
            current.rename(&self.new_collection).await?;
            info!("🔀 Collection '{}' renommée en '{}'", current.name(), self.new_collection);
        }
        Ok(())
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        let original = ctx.collection().name();
        if ctx.db().has_collection(&self.new_collection).await? {
            ctx.db()
                .collection(&self.new_collection)
                .rename(original)
                .await?;
            info!("🔀 Collection '{}' restaurée en '{}'", self.new_collection, original);
        }
        Ok(())
    }

    fn to_schema_patch(&self, schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::AlterDocument {
            document: self.document.clone(),
            from_collection: schema.document(&self.document)?.collection.clone(),
            to_collection: self.new_collection.clone(),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .kwarg("new_collection", &self.new_collection)
            .build()
    }
}
